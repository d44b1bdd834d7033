// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Pose channels.  Only the channels the pre-analysis marks as transformed get a record; the
//! location lives in channel space and `space` maps it into armature space.

use super::{object, object_mut, write};
use crate::error::TransformError;
use crate::pose::{
    constraints_list_needinv, count_set_pose_transflags, has_targetless_ik,
    restore_mirror_pose_bones, PoseTransAnalysis,
};
use crate::session::{FlushReport, TransContext, TransConvert, TransDomain, TransInfo};
use crate::settings::TransformMode;
use crate::trans_data::{
    ContainerCustom, ExtraData, OwnerRef, PoseCustom, PoseExtra, PoseMirrorInit, TdFlags,
    TransData, TransDataContainer, TransDataExt,
};
use common::math::{mirror_rotor_x, mirror_x};
use scene::armature::{Armature, BoneFlags, TransformLocks};
use scene::{DataSource, ObjectMode, Scene};
use ultraviolet::{Rotor3, Vec3};

pub(crate) struct PoseConverter;

fn create_trans_pose(
    t: &TransInfo,
    source: DataSource,
    arm: &Armature,
    analysis: &PoseTransAnalysis,
) -> TransDataContainer {
    let mode = t.context.mode;
    let mirror = arm.mirror_x || t.context.settings.mirror_x;
    let poses = arm.pose_transforms();
    let mut tc = TransDataContainer::new(source, TransDomain::Pose);
    let mut custom = PoseCustom {
        mirror: Vec::new(),
        has_translate_rotate: analysis.has_translate_rotate,
    };

    for (i, channel) in arm.pose.channels.iter().enumerate() {
        if !analysis.is_transformed(i) {
            continue;
        }
        let (Some(bone), Some(pose)) = (arm.bones.get(i), poses.get(i)) else {
            continue;
        };

        let mut flags = TdFlags::SELECTED | TdFlags::USE_ROTATE | TdFlags::USE_SCALE;
        let mut protect = channel.locks;
        if has_targetless_ik(channel).is_some() {
            flags |= TdFlags::TARGETLESS_IK;
        } else if bone.parent.is_some() && bone.flags.contains(BoneFlags::CONNECTED) {
            // The head is pinned to the parent's tail.
            protect |= TransformLocks::LOC;
        }

        let constraint_inverse = constraints_list_needinv(mode, &channel.constraints)
            .then_some(channel.constraint_inverse);
        let space = match constraint_inverse {
            Some(inv) => pose.loc_space * inv,
            None => pose.loc_space,
        };

        let mirror_channel = mirror
            .then(|| arm.mirror_bone(i))
            .flatten()
            .filter(|&m| !analysis.is_transformed(m));
        if let Some(m) = mirror_channel {
            if let Some(mc) = arm.pose.channels.get(m) {
                custom.mirror.push(PoseMirrorInit {
                    channel: m,
                    loc: mc.loc,
                    rot: mc.rot,
                    scale: mc.scale,
                });
                flags |= TdFlags::MIRRORED;
            }
        }

        let mut td = TransData::new(OwnerRef::PoseChannel(i), channel.loc)
            .with_center(pose.head)
            .with_flags(flags)
            .with_space(space)
            .with_ext(TransDataExt::new(channel.rot, channel.scale))
            .with_extra(ExtraData::Pose(PoseExtra {
                constraint_inverse,
                mirror: mirror_channel,
            }));
        td.axis_matrix = pose.basis;
        td.protect = protect;
        if arm.active == Some(i) {
            tc.active = Some(tc.data.len());
        }
        tc.data.push(td);
    }

    tc.custom = ContainerCustom::Pose(custom);
    tc
}

/// Keeps the components of `value` that `locks` allows to change.
fn apply_locks(value: Vec3, original: Vec3, locks: TransformLocks, x: TransformLocks) -> Vec3 {
    let bits = x.bits();
    let pick = |axis: u16, v: f32, o: f32| {
        if locks.bits() & (bits << axis) != 0 {
            o
        } else {
            v
        }
    };
    Vec3::new(
        pick(0, value.x, original.x),
        pick(1, value.y, original.y),
        pick(2, value.z, original.z),
    )
}

fn write_back(tc: &TransDataContainer, arm: &mut Armature, report: &mut FlushReport) {
    let snapshots = match &tc.custom {
        ContainerCustom::Pose(custom) => custom.mirror.as_slice(),
        _ => &[],
    };
    for td in tc.data() {
        let OwnerRef::PoseChannel(i) = td.owner else {
            continue;
        };
        let Some(ext) = td.ext else {
            continue;
        };
        let changed = td.is_changed();
        let (loc, rot, scale) = if changed {
            let loc = apply_locks(
                td.working_location,
                td.original_location(),
                td.protect,
                TransformLocks::LOC_X,
            );
            let rot = if td.protect.contains(TransformLocks::ROT) {
                ext.original_rotation()
            } else {
                ext.rot
            };
            let scale = apply_locks(
                ext.scale,
                ext.original_scale(),
                td.protect,
                TransformLocks::SCALE_X,
            );
            (loc, rot, scale)
        } else {
            (td.original_location(), ext.original_rotation(), ext.original_scale())
        };

        if let Some(channel) = arm.pose.channels.get_mut(i) {
            write(&mut channel.loc, loc, report);
            write(&mut channel.rot, rot, report);
            write(&mut channel.scale, scale, report);
        }

        let ExtraData::Pose(PoseExtra {
            mirror: Some(m), ..
        }) = td.extra
        else {
            continue;
        };
        let target = if changed {
            Some((mirror_x(loc), mirror_rotor_x(rot), scale))
        } else {
            snapshots
                .iter()
                .find(|init| init.channel == m)
                .map(|init| (init.loc, init.rot, init.scale))
        };
        if let (Some((loc, rot, scale)), Some(channel)) = (target, arm.pose.channels.get_mut(m)) {
            write(&mut channel.loc, loc, report);
            write(&mut channel.rot, rot, report);
            write(&mut channel.scale, scale, report);
        }
    }
}

/// Bakes the IK solution of every chain dragged by a targetless constraint into the pose.
/// Channels the user rotated directly keep the rotation the flush gave them; the others take
/// the solver's last result.  The transient solutions are dropped afterwards.
fn bake_targetless_ik(tc: &TransDataContainer, arm: &mut Armature, report: &mut FlushReport) {
    let rotated: Vec<usize> = tc
        .data()
        .iter()
        .filter(|td| td.ext.is_some_and(|ext| ext.is_changed()))
        .filter_map(|td| match td.owner {
            OwnerRef::PoseChannel(i) => Some(i),
            _ => None,
        })
        .collect();

    for td in tc.data() {
        let OwnerRef::PoseChannel(i) = td.owner else {
            continue;
        };
        if !td.flags.contains(TdFlags::TARGETLESS_IK) || !td.is_changed() {
            continue;
        }
        let Some(chain_len) = arm
            .pose
            .channels
            .get(i)
            .and_then(has_targetless_ik)
            .map(|ik| ik.chain_len)
        else {
            continue;
        };
        for member in arm.ik_chain(i, chain_len) {
            let Some(channel) = arm.pose.channels.get_mut(member) else {
                continue;
            };
            if !rotated.contains(&member) {
                if let Some(solution) = channel.ik_solution {
                    write(&mut channel.rot, solution, report);
                }
            }
            write(&mut channel.ik_solution, None::<Rotor3>, report);
        }
    }
}

fn armature_of(scene: &mut Scene, source: DataSource) -> Result<&mut Armature, TransformError> {
    object_mut(scene, source)?
        .armature_mut()
        .ok_or(TransformError::MissingSource(source))
}

impl TransConvert for PoseConverter {
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
        let mut analysed = Vec::new();
        for ob in scene.objects_in_mode(ObjectMode::Pose) {
            let arm = ob
                .armature()
                .ok_or(TransformError::NoTransformableBones(ob.id))?;
            let analysis = count_set_pose_transflags(arm, t.context.mode, t.context.pivot);
            analysed.push((ob, arm, analysis));
        }

        // A translation of bones that can only rotate becomes a rotation.
        let translate = analysed.iter().any(|(.., a)| a.has_translate_rotate[0]);
        let rotate = analysed.iter().any(|(.., a)| a.has_translate_rotate[1]);
        if t.context.mode == TransformMode::Translation && !translate && rotate {
            log::info!("No translatable bones, rotating instead");
            t.context.mode = TransformMode::Rotation;
        }

        let containers: Vec<_> = analysed
            .iter()
            .map(|(ob, arm, analysis)| {
                create_trans_pose(t, DataSource::Object(ob.id), arm, analysis)
                    .with_matrix(ob.matrix, ob.location)
            })
            .collect();
        t.containers.extend(containers);
        Ok(())
    }

    fn validate(&self, tc: &TransDataContainer, scene: &Scene) -> Result<(), TransformError> {
        let arm = object(scene, tc.source)?
            .armature()
            .ok_or(TransformError::MissingSource(tc.source))?;
        let len = arm.pose.channels.len();
        tc.check_owners(|owner| match owner {
            OwnerRef::PoseChannel(i) => i < len,
            _ => false,
        })?;
        if let ContainerCustom::Pose(custom) = &tc.custom {
            if let Some(init) = custom.mirror.iter().find(|init| init.channel >= len) {
                return Err(TransformError::StaleReference {
                    data: tc.source,
                    owner: OwnerRef::PoseChannel(init.channel),
                });
            }
        }
        Ok(())
    }

    fn flush(
        &self,
        _ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        write_back(tc, armature_of(scene, tc.source)?, report);
        Ok(())
    }

    fn restore(
        &self,
        _ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError> {
        let arm = armature_of(scene, tc.source)?;
        write_back(tc, arm, &mut FlushReport::default());
        restore_mirror_pose_bones(tc, arm);
        Ok(())
    }

    fn finish(
        &self,
        _ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        bake_targetless_ik(tc, armature_of(scene, tc.source)?, report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{PivotMode, TransformSettings};
    use scene::armature::EditBone;

    fn info() -> TransInfo {
        TransInfo::new(
            TransContext {
                mode: TransformMode::Rotation,
                pivot: PivotMode::MedianPoint,
                settings: TransformSettings::default(),
            },
            Vec3::zero(),
        )
    }

    #[test]
    fn locked_axes_keep_their_value() {
        let mut arm = Armature::new(vec![EditBone::new("bone", Vec3::zero(), Vec3::unit_y())]);
        arm.pose.channels[0].selected = true;
        arm.pose.channels[0].locks = TransformLocks::LOC_Y | TransformLocks::SCALE_Z;
        let t = info();
        let analysis = count_set_pose_transflags(&arm, t.context.mode, t.context.pivot);
        let mut tc = create_trans_pose(&t, DataSource::Cursor3D, &arm, &analysis);
        assert_eq!(tc.len(), 1);

        let td = &mut tc.data_mut()[0];
        td.working_location = Vec3::one();
        td.ext.as_mut().unwrap().scale = Vec3::new(2.0, 2.0, 2.0);
        write_back(&tc, &mut arm, &mut FlushReport::default());
        assert_eq!(arm.pose.channels[0].loc, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(arm.pose.channels[0].scale, Vec3::new(2.0, 2.0, 1.0));
    }

    #[test]
    fn mirrored_channel_follows_and_restores() {
        let mut arm = Armature::new(vec![
            EditBone::new("arm.L", Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)),
            EditBone::new("arm.R", Vec3::new(-1.0, 0.0, 0.0), Vec3::new(-2.0, 0.0, 0.0)),
        ]);
        arm.mirror_x = true;
        arm.pose.channels[0].selected = true;
        let t = info();
        let analysis = count_set_pose_transflags(&arm, t.context.mode, t.context.pivot);
        let mut tc = create_trans_pose(&t, DataSource::Cursor3D, &arm, &analysis);
        tc.data_mut()[0].working_location = Vec3::new(0.5, 0.25, 0.0);

        let mut report = FlushReport::default();
        write_back(&tc, &mut arm, &mut report);
        assert_eq!(arm.pose.channels[1].loc, Vec3::new(-0.5, 0.25, 0.0));

        tc.reset();
        write_back(&tc, &mut arm, &mut FlushReport::default());
        restore_mirror_pose_bones(&tc, &mut arm);
        assert_eq!(arm.pose.channels[0].loc, Vec3::zero());
        assert_eq!(arm.pose.channels[1].loc, Vec3::zero());
    }
}

// End of File
