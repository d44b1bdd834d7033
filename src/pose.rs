// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Pose pre-analysis and the transient IK state of a pose transform.
//!
//! Before pose channels are converted, the pose is analysed to find which bones actually take
//! part: a selected bone whose parent also moves is carried along by the parent and is not
//! converted itself, unless it is hinged or the transform works around individual origins.

use crate::settings::{PivotMode, TransformMode, TransformSettings};
use crate::trans_data::{ContainerCustom, TransDataContainer};
use scene::armature::{
    Armature, BoneFlags, Constraint, ConstraintKind, IkConstraint, PoseChannel, TransformLocks,
};
use scene::{ObjectId, ObjectMode, Scene};

bitflags::bitflags! {
    /// Per-bone result of [`count_set_pose_transflags`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct BoneTransFlags: u8 {
        const TRANSFORM             = 1 << 0;
        /// A connected, hinged child of a transformed bone: its head moves with the parent but
        /// it keeps its own rotation.
        const HINGE_CHILD_TRANSFORM = 1 << 1;
        /// A transformed child of a transformed bone, rotated around its own origin.
        const TRANSFORM_CHILD       = 1 << 2;
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoseTransAnalysis {
    /// One entry per pose channel.
    pub flags: Vec<BoneTransFlags>,
    pub total: usize,
    pub has_translate_rotate: [bool; 2],
}

impl PoseTransAnalysis {
    pub fn is_transformed(&self, channel: usize) -> bool {
        self.flags
            .get(channel)
            .is_some_and(|f| f.contains(BoneTransFlags::TRANSFORM))
    }
}

fn channel_visible(arm: &Armature, index: usize) -> bool {
    let bone_visible = arm.bones.get(index).is_some_and(|b| b.is_visible());
    let channel_visible = arm.pose.channels.get(index).is_some_and(|c| !c.hidden);
    bone_visible && channel_visible
}

fn bone_children_clear_transflag(
    arm: &Armature,
    mode: TransformMode,
    pivot: PivotMode,
    root: usize,
    flags: &mut [BoneTransFlags],
) {
    let mut stack: Vec<usize> = arm.children(root).collect();
    let mut visited = vec![false; flags.len()];
    while let Some(child) = stack.pop() {
        if child >= flags.len() || std::mem::replace(&mut visited[child], true) {
            continue;
        }
        let bone = &arm.bones[child];
        if bone.flags.contains(BoneFlags::HINGE | BoneFlags::CONNECTED) {
            flags[child] |= BoneTransFlags::HINGE_CHILD_TRANSFORM;
        } else if flags[child].contains(BoneTransFlags::TRANSFORM)
            && mode.is_rotation()
            && pivot == PivotMode::IndividualOrigins
        {
            flags[child] |= BoneTransFlags::TRANSFORM_CHILD;
        } else {
            flags[child].remove(BoneTransFlags::TRANSFORM);
        }
        stack.extend(arm.children(child));
    }
}

/// Decides which channels are transformed and counts them.  `has_translate_rotate` reports
/// whether any of them can be translated and whether any can be rotated, so a translation
/// with nothing translatable can turn into a rotation.
pub fn count_set_pose_transflags(
    arm: &Armature,
    mode: TransformMode,
    pivot: PivotMode,
) -> PoseTransAnalysis {
    let len = arm.pose.channels.len().min(arm.bones.len());
    let mut flags: Vec<BoneTransFlags> = (0..len)
        .map(|i| {
            if channel_visible(arm, i) && arm.pose.channels[i].selected {
                BoneTransFlags::TRANSFORM
            } else {
                BoneTransFlags::empty()
            }
        })
        .collect();

    // Parents come first, so a transformed parent is seen before its children.
    if !matches!(
        mode,
        TransformMode::BoneSize | TransformMode::BoneEnvelopeDist
    ) {
        for i in 0..len {
            if flags[i].contains(BoneTransFlags::TRANSFORM) {
                bone_children_clear_transflag(arm, mode, pivot, i, &mut flags);
            }
        }
    }

    let mut total = 0;
    let mut has_translate_rotate = [false; 2];
    for (i, f) in flags.iter().enumerate() {
        if !f.contains(BoneTransFlags::TRANSFORM) {
            continue;
        }
        total += 1;
        let channel = &arm.pose.channels[i];
        if has_targetless_ik(channel).is_some() {
            has_translate_rotate[0] = true;
            continue;
        }
        let bone = &arm.bones[i];
        if bone.parent.is_some() && bone.flags.contains(BoneFlags::CONNECTED) {
            if f.contains(BoneTransFlags::HINGE_CHILD_TRANSFORM) {
                has_translate_rotate[0] = true;
            }
        } else if !channel.locks.contains(TransformLocks::LOC) {
            has_translate_rotate[0] = true;
        }
        if !channel.locks.contains(TransformLocks::ROT) {
            has_translate_rotate[1] = true;
        }
    }

    log::debug!(
        "Pose analysis: {} of {} bones transformed, translate/rotate {:?}",
        total,
        len,
        has_translate_rotate
    );
    PoseTransAnalysis {
        flags,
        total,
        has_translate_rotate,
    }
}

/// Whether the constraint stack makes the channel's final transform depend on its
/// unconstrained transform in a way that needs a correction matrix for interactive deltas.
pub fn constraints_list_needinv(mode: TransformMode, constraints: &[Constraint]) -> bool {
    constraints
        .iter()
        .filter(|con| con.is_active())
        .any(|con| match &con.kind {
            ConstraintKind::FollowPath
            | ConstraintKind::ClampTo
            | ConstraintKind::Armature
            | ConstraintKind::ObjectSolver
            | ConstraintKind::FollowTrack => true,
            // Only when all location axes are inherited.
            ConstraintKind::ChildOf { use_loc } => use_loc.iter().all(|&axis| axis),
            ConstraintKind::CopyRotation { offset } => *offset && mode == TransformMode::Rotation,
            ConstraintKind::Transform {
                to_rotation,
                mix_add,
            } => *to_rotation && *mix_add && mode == TransformMode::Rotation,
            ConstraintKind::Kinematic(_)
            | ConstraintKind::LimitRotation
            | ConstraintKind::CopyLocation => false,
        })
}

/// The first active IK constraint on the channel that has no target to solve toward.
pub fn has_targetless_ik(channel: &PoseChannel) -> Option<&IkConstraint> {
    channel
        .constraints
        .iter()
        .filter(|con| con.is_active())
        .find_map(|con| match &con.kind {
            ConstraintKind::Kinematic(ik) => match &ik.target {
                None => Some(ik),
                Some(target) if target.is_armature && target.subtarget.is_empty() => Some(ik),
                Some(_) => None,
            },
            _ => None,
        })
}

#[derive(Clone, Debug, PartialEq)]
struct IkSave {
    object: ObjectId,
    /// `(channel, constraint, solve_disabled before the transform)`.
    disabled: Vec<(usize, usize, bool)>,
    /// Channels that received a temporary auto-IK constraint.
    added: Vec<usize>,
}

/// The IK state a pose transform changes for its own duration: solving is switched off on
/// chains that are rotated or scaled directly, and auto IK adds temporary targetless
/// constraints to dragged bones.  [`restore`](Self::restore) undoes both and may be called any
/// number of times.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IkSolverScope {
    saves: Vec<IkSave>,
    restored: bool,
}

impl IkSolverScope {
    pub fn acquire(scene: &mut Scene, mode: TransformMode, settings: &TransformSettings) -> Self {
        let mut saves = Vec::new();
        for object in scene.objects_mut() {
            if object.mode != ObjectMode::Pose {
                continue;
            }
            let id = object.id;
            let Some(arm) = object.armature_mut() else {
                continue;
            };
            let mut save = IkSave {
                object: id,
                disabled: Vec::new(),
                added: Vec::new(),
            };
            if mode == TransformMode::Translation {
                if settings.auto_ik {
                    add_auto_ik(arm, settings.auto_ik_chain_len, &mut save);
                }
            } else {
                disable_direct_chains(arm, &mut save);
            }
            if !save.disabled.is_empty() || !save.added.is_empty() {
                saves.push(save);
            }
        }
        Self {
            saves,
            restored: false,
        }
    }

    /// Whether this scope added temporary auto-IK constraints.
    pub fn has_auto_ik(&self) -> bool {
        self.saves.iter().any(|save| !save.added.is_empty())
    }

    pub fn restore(&mut self, scene: &mut Scene) {
        if self.restored {
            return;
        }
        for save in &self.saves {
            let Some(arm) = scene.object_mut(save.object).and_then(|ob| ob.armature_mut()) else {
                log::warn!("Armature {} vanished before its IK state was restored", save.object);
                continue;
            };
            for &(channel, constraint, previous) in &save.disabled {
                if let Some(ConstraintKind::Kinematic(ik)) = arm
                    .pose
                    .channels
                    .get_mut(channel)
                    .and_then(|c| c.constraints.get_mut(constraint))
                    .map(|con| &mut con.kind)
                {
                    ik.solve_disabled = previous;
                }
            }
            for &channel in &save.added {
                if let Some(c) = arm.pose.channels.get_mut(channel) {
                    c.constraints.retain(
                        |con| !matches!(&con.kind, ConstraintKind::Kinematic(ik) if ik.temporary),
                    );
                }
            }
        }
        self.restored = true;
    }
}

fn add_auto_ik(arm: &mut Armature, chain_len: u32, save: &mut IkSave) {
    for i in 0..arm.pose.channels.len().min(arm.bones.len()) {
        if !channel_visible(arm, i) || arm.bones[i].parent.is_none() {
            continue;
        }
        let channel = &mut arm.pose.channels[i];
        let has_ik = channel
            .constraints
            .iter()
            .any(|con| con.is_active() && matches!(con.kind, ConstraintKind::Kinematic(_)));
        if !channel.selected || has_ik {
            continue;
        }
        let mut ik = IkConstraint::targetless(chain_len);
        ik.temporary = true;
        channel
            .constraints
            .push(Constraint::new(ConstraintKind::Kinematic(ik)));
        save.added.push(i);
    }
}

fn disable_direct_chains(arm: &mut Armature, save: &mut IkSave) {
    let selected: Vec<bool> = (0..arm.pose.channels.len())
        .map(|i| channel_visible(arm, i) && arm.pose.channels[i].selected)
        .collect();
    for i in 0..arm.pose.channels.len().min(arm.bones.len()) {
        for (c, con) in arm.pose.channels[i].constraints.iter().enumerate() {
            let ConstraintKind::Kinematic(ik) = &con.kind else {
                continue;
            };
            if !con.is_active() {
                continue;
            }
            let chain = arm.ik_chain(i, ik.chain_len);
            if chain.iter().any(|&b| selected.get(b).copied().unwrap_or(false)) {
                save.disabled.push((i, c, ik.solve_disabled));
            }
        }
    }
    for &(i, c, _) in &save.disabled {
        if let ConstraintKind::Kinematic(ik) = &mut arm.pose.channels[i].constraints[c].kind {
            ik.solve_disabled = true;
        }
    }
}

/// Grows or shrinks the chains of the temporary auto-IK constraints by `delta` bones, clamped
/// between the whole path to the root (zero) and the bone's depth.  Returns whether anything
/// changed.
pub fn transform_autoik_update(scope: &mut IkSolverScope, scene: &mut Scene, delta: i32) -> bool {
    if scope.restored || delta == 0 {
        return false;
    }
    let mut changed = false;
    for save in &scope.saves {
        let Some(arm) = scene.object_mut(save.object).and_then(|ob| ob.armature_mut()) else {
            continue;
        };
        for &channel in &save.added {
            let max = arm.depth(channel) as i64 + 1;
            let Some(c) = arm.pose.channels.get_mut(channel) else {
                continue;
            };
            for con in &mut c.constraints {
                if let ConstraintKind::Kinematic(ik) = &mut con.kind {
                    if ik.temporary {
                        let len = (ik.chain_len as i64 + delta as i64).clamp(0, max) as u32;
                        changed |= len != ik.chain_len;
                        ik.chain_len = len;
                    }
                }
            }
        }
    }
    changed
}

/// Puts the channels that followed a mirrored edit back to their snapshots.
pub fn restore_mirror_pose_bones(tc: &TransDataContainer, arm: &mut Armature) {
    let ContainerCustom::Pose(custom) = &tc.custom else {
        return;
    };
    for init in &custom.mirror {
        if let Some(channel) = arm.pose.channels.get_mut(init.channel) {
            channel.loc = init.loc;
            channel.rot = init.rot;
            channel.scale = init.scale;
        }
    }
}


// End of File
