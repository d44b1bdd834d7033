// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Armatures: the rest (edit) bones, and the pose channels that animate them.  Bones and
//! channels share an index and are stored parent first, so a single forward pass sees every
//! parent before its children.

use common::math::{bone_basis, pseudo_inverse, scale_matrix};
use common::ids::ObjectId;
use ultraviolet::{Mat3, Rotor3, Vec3};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct BoneFlags: u16 {
        /// The head is attached to the tail of the parent.
        const CONNECTED = 1 << 0;
        /// The bone does not inherit the rotation of its parent.
        const HINGE     = 1 << 1;
        const SELECTED  = 1 << 2;
        const ROOTSEL   = 1 << 3;
        const TIPSEL    = 1 << 4;
        const HIDDEN    = 1 << 5;
    }
}

bitflags::bitflags! {
    /// Per-axis transform locks of a pose channel.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TransformLocks: u16 {
        const LOC_X   = 1 << 0;
        const LOC_Y   = 1 << 1;
        const LOC_Z   = 1 << 2;
        const ROT_X   = 1 << 3;
        const ROT_Y   = 1 << 4;
        const ROT_Z   = 1 << 5;
        const SCALE_X = 1 << 6;
        const SCALE_Y = 1 << 7;
        const SCALE_Z = 1 << 8;

        const LOC   = Self::LOC_X.bits() | Self::LOC_Y.bits() | Self::LOC_Z.bits();
        const ROT   = Self::ROT_X.bits() | Self::ROT_Y.bits() | Self::ROT_Z.bits();
        const SCALE = Self::SCALE_X.bits() | Self::SCALE_Y.bits() | Self::SCALE_Z.bits();
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EditBone {
    pub name: String,
    pub head: Vec3,
    pub tail: Vec3,
    pub roll: f32,
    pub parent: Option<usize>,
    pub flags: BoneFlags,
    pub rad_head: f32,
    pub rad_tail: f32,
    /// Envelope distance.
    pub dist: f32,
}

impl EditBone {
    pub fn new(name: impl Into<String>, head: Vec3, tail: Vec3) -> Self {
        Self {
            name: name.into(),
            head,
            tail,
            roll: 0.0,
            parent: None,
            flags: BoneFlags::empty(),
            rad_head: 0.1,
            rad_tail: 0.05,
            dist: 0.25,
        }
    }

    pub fn with_parent(mut self, parent: usize, connected: bool) -> Self {
        self.parent = Some(parent);
        self.flags.set(BoneFlags::CONNECTED, connected);
        self
    }

    pub fn with_flags(mut self, flags: BoneFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        !self.flags.contains(BoneFlags::HIDDEN)
    }

    pub fn length(&self) -> f32 {
        (self.tail - self.head).mag()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IkTarget {
    pub object: ObjectId,
    pub is_armature: bool,
    /// Bone name inside an armature target; empty when the target is the object itself.
    pub subtarget: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IkConstraint {
    pub target: Option<IkTarget>,
    /// Number of bones in the chain, counting the owner; zero reaches the root.
    pub chain_len: u32,
    /// Added for the duration of a transform (auto IK).
    pub temporary: bool,
    pub solve_disabled: bool,
}

impl IkConstraint {
    pub fn targetless(chain_len: u32) -> Self {
        Self {
            target: None,
            chain_len,
            temporary: false,
            solve_disabled: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintKind {
    Kinematic(IkConstraint),
    FollowPath,
    ClampTo,
    Armature,
    ObjectSolver,
    FollowTrack,
    ChildOf { use_loc: [bool; 3] },
    CopyRotation { offset: bool },
    LimitRotation,
    Transform { to_rotation: bool, mix_add: bool },
    CopyLocation,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub disabled: bool,
    pub muted: bool,
    pub influence: f32,
}

impl Constraint {
    pub fn new(kind: ConstraintKind) -> Self {
        Self {
            kind,
            disabled: false,
            muted: false,
            influence: 1.0,
        }
    }

    /// Whether the constraint takes part in evaluation at all.
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.disabled && !self.muted && self.influence != 0.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PoseChannel {
    pub name: String,
    pub loc: Vec3,
    pub rot: Rotor3,
    pub scale: Vec3,
    pub locks: TransformLocks,
    pub constraints: Vec<Constraint>,
    /// Correction from the constrained space back into the channel's own space, maintained by
    /// the constraint evaluator.
    pub constraint_inverse: Mat3,
    /// The rotation last produced by the IK solver, when the channel belongs to a solved chain.
    pub ik_solution: Option<Rotor3>,
    pub selected: bool,
    pub hidden: bool,
}

impl PoseChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            loc: Vec3::zero(),
            rot: Rotor3::identity(),
            scale: Vec3::one(),
            locks: TransformLocks::empty(),
            constraints: Vec::new(),
            constraint_inverse: Mat3::identity(),
            ik_solution: None,
            selected: false,
            hidden: false,
        }
    }

    pub fn ik_constraints(&self) -> impl Iterator<Item = &IkConstraint> {
        self.constraints.iter().filter_map(|con| match &con.kind {
            ConstraintKind::Kinematic(ik) => Some(ik),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pose {
    pub channels: Vec<PoseChannel>,
}

/// The evaluated armature-space placement of one pose channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseTransform {
    pub head: Vec3,
    pub basis: Mat3,
    /// Maps the channel's local location into armature space, ignoring constraints.
    pub loc_space: Mat3,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Armature {
    pub bones: Vec<EditBone>,
    pub pose: Pose,
    /// Edits are mirrored onto the bone with the flipped side name.
    pub mirror_x: bool,
    pub active: Option<usize>,
}

impl Armature {
    /// Builds an armature from rest bones, with one unposed channel per bone.
    pub fn new(bones: Vec<EditBone>) -> Self {
        let channels = bones.iter().map(|b| PoseChannel::new(b.name.clone())).collect();
        Self {
            bones,
            pose: Pose { channels },
            mirror_x: false,
            active: None,
        }
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.bones.get(index)?.parent
    }

    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(move |(_, b)| b.parent == Some(index))
            .map(|(i, _)| i)
    }

    /// Number of ancestors above the bone.
    pub fn depth(&self, index: usize) -> u32 {
        let mut depth = 0;
        let mut cur = self.parent(index);
        while let Some(p) = cur {
            if depth as usize > self.bones.len() {
                break;
            }
            depth += 1;
            cur = self.parent(p);
        }
        depth
    }

    /// The bone itself and up to `chain_len - 1` ancestors; the whole path to the root when
    /// `chain_len` is zero.
    pub fn ik_chain(&self, index: usize, chain_len: u32) -> Vec<usize> {
        let mut chain = vec![index];
        let mut cur = self.parent(index);
        while let Some(p) = cur {
            let at_limit = chain_len != 0 && chain.len() >= chain_len as usize;
            if at_limit || chain.len() > self.bones.len() {
                break;
            }
            chain.push(p);
            cur = self.parent(p);
        }
        chain
    }

    /// The counterpart of a bone across the X axis, found by flipping the side of its name.
    pub fn mirror_bone(&self, index: usize) -> Option<usize> {
        let name = flip_side_name(&self.bones.get(index)?.name)?;
        self.bone_index(&name).filter(|&i| i != index)
    }

    /// Evaluates the pose in armature space, parents first.  Hinged bones do not pick up the
    /// rotation of their parent.
    pub fn pose_transforms(&self) -> Vec<PoseTransform> {
        let mut out: Vec<PoseTransform> = Vec::with_capacity(self.bones.len());
        for (i, bone) in self.bones.iter().enumerate() {
            let rest = bone_basis(bone.head, bone.tail, bone.roll);
            let parent = bone.parent.filter(|&p| p < i).map(|p| (p, out[p]));
            let (origin, delta) = match parent {
                Some((p, parent_pose)) => {
                    let prest = &self.bones[p];
                    let pdelta = parent_pose.basis
                        * pseudo_inverse(bone_basis(prest.head, prest.tail, prest.roll));
                    let origin = parent_pose.head + pdelta * (bone.head - prest.head);
                    if bone.flags.contains(BoneFlags::HINGE) {
                        (origin, Mat3::identity())
                    } else {
                        (origin, pdelta)
                    }
                }
                None => (bone.head, Mat3::identity()),
            };
            let channel = self.pose.channels.get(i);
            let (loc, rot, scale) = channel
                .map(|c| (c.loc, c.rot.into_matrix(), c.scale))
                .unwrap_or((Vec3::zero(), Mat3::identity(), Vec3::one()));
            let loc_space = delta * rest;
            let local = rot * scale_matrix(scale);
            out.push(PoseTransform {
                head: origin + loc_space * loc,
                basis: loc_space * local,
                loc_space,
            });
        }
        out
    }
}

/// Flips the side marker of a bone name: `.L`/`.R`, `_L`/`_R`, `-L`/`-R` suffixes and
/// prefixes, and `Left`/`Right` anywhere in the name.
pub fn flip_side_name(name: &str) -> Option<String> {
    const SEPARATORS: [char; 4] = ['.', '_', '-', ' '];
    let swap = |c: char| match c {
        'L' => Some('R'),
        'R' => Some('L'),
        'l' => Some('r'),
        'r' => Some('l'),
        _ => None,
    };
    let chars: Vec<char> = name.chars().collect();
    let n = chars.len();
    if n >= 2 && SEPARATORS.contains(&chars[n - 2]) {
        if let Some(flipped) = swap(chars[n - 1]) {
            let mut out: String = chars[..n - 1].iter().collect();
            out.push(flipped);
            return Some(out);
        }
    }
    if n >= 2 && SEPARATORS.contains(&chars[1]) {
        if let Some(flipped) = swap(chars[0]) {
            let mut out = String::with_capacity(name.len());
            out.push(flipped);
            out.extend(&chars[1..]);
            return Some(out);
        }
    }
    for (from, to) in [
        ("Left", "Right"),
        ("Right", "Left"),
        ("left", "right"),
        ("right", "left"),
        ("LEFT", "RIGHT"),
        ("RIGHT", "LEFT"),
    ] {
        if let Some(pos) = name.find(from) {
            let mut out = String::with_capacity(name.len() + 1);
            out.push_str(&name[..pos]);
            out.push_str(to);
            out.push_str(&name[pos + from.len()..]);
            return Some(out);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_names_flip() {
        assert_eq!(flip_side_name("arm.L").as_deref(), Some("arm.R"));
        assert_eq!(flip_side_name("hand_r").as_deref(), Some("hand_l"));
        assert_eq!(flip_side_name("L_foot").as_deref(), Some("R_foot"));
        assert_eq!(flip_side_name("LeftEye").as_deref(), Some("RightEye"));
        assert_eq!(flip_side_name("spine"), None);
    }

    #[test]
    fn ik_chain_stops_at_length() {
        let arm = Armature::new(vec![
            EditBone::new("a", Vec3::zero(), Vec3::unit_y()),
            EditBone::new("b", Vec3::unit_y(), Vec3::unit_y() * 2.0).with_parent(0, true),
            EditBone::new("c", Vec3::unit_y() * 2.0, Vec3::unit_y() * 3.0).with_parent(1, true),
        ]);
        assert_eq!(arm.ik_chain(2, 2), vec![2, 1]);
        assert_eq!(arm.ik_chain(2, 0), vec![2, 1, 0]);
        assert_eq!(arm.depth(2), 2);
    }

    #[test]
    fn rest_pose_evaluates_to_rest_heads() {
        let arm = Armature::new(vec![
            EditBone::new("a", Vec3::zero(), Vec3::unit_y()),
            EditBone::new("b", Vec3::unit_y(), Vec3::new(1.0, 1.0, 0.0)).with_parent(0, true),
        ]);
        let pose = arm.pose_transforms();
        assert!((pose[1].head - Vec3::unit_y()).mag() < 1e-5);
        assert!((pose[1].basis.cols[1] - Vec3::unit_x()).mag() < 1e-5);
    }
}

// End of File
