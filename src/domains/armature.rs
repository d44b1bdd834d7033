// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Edit bones.  Heads and tails are separate records; the roll rides on the first record of
//! each bone.  Bones that only follow (connected neighbours, X-mirror counterparts) are
//! snapshotted so they can be put back by [`restore_bones`].

use super::{object, object_mut, write};
use crate::error::TransformError;
use crate::session::{FlushReport, TransContext, TransConvert, TransDomain, TransInfo};
use crate::settings::TransformMode;
use crate::trans_data::{
    BoneEnd, BoneExtra, BoneInitData, ContainerCustom, ExtraData, OwnerRef, TdFlags, TransData,
    TransDataContainer, TransDataExt, TransValue,
};
use common::math::{bone_basis, mirror_x};
use scene::armature::{Armature, BoneFlags, EditBone};
use scene::{DataSource, ObjectMode, Scene};
use std::collections::BTreeMap;
use ultraviolet::{Rotor3, Vec3};

pub(crate) struct EditArmatureConverter;

fn init_data(bone: usize, ebo: &EditBone) -> BoneInitData {
    BoneInitData {
        bone,
        head: ebo.head,
        tail: ebo.tail,
        roll: ebo.roll,
        rad_head: ebo.rad_head,
        rad_tail: ebo.rad_tail,
        dist: ebo.dist,
    }
}

fn create_trans_armature_verts(
    t: &TransInfo,
    source: DataSource,
    arm: &Armature,
) -> TransDataContainer {
    let mode = t.context.mode;
    let mirror = arm.mirror_x || t.context.settings.mirror_x;
    let mut tc = TransDataContainer::new(source, TransDomain::EditArmature);
    let mut snapshot: BTreeMap<usize, BoneInitData> = BTreeMap::new();

    let selected = |i: usize| {
        let b = &arm.bones[i];
        b.is_visible()
            && b.flags
                .intersects(BoneFlags::SELECTED | BoneFlags::ROOTSEL | BoneFlags::TIPSEL)
    };

    for (i, ebo) in arm.bones.iter().enumerate() {
        if !ebo.is_visible() {
            continue;
        }
        let basis = bone_basis(ebo.head, ebo.tail, ebo.roll);
        let mirror_bone = mirror
            .then(|| arm.mirror_bone(i))
            .flatten()
            .filter(|&m| !selected(m));
        let connected_children: Vec<usize> = arm
            .children(i)
            .filter(|&c| arm.bones[c].flags.contains(BoneFlags::CONNECTED))
            .collect();
        let extra = |children: Vec<usize>| {
            ExtraData::Bone(BoneExtra {
                connected_children: children,
                mirror: mirror_bone,
            })
        };
        let start = tc.data.len();

        match mode {
            TransformMode::BoneRoll
            | TransformMode::BoneSize
            | TransformMode::BoneEnvelopeDist
            | TransformMode::ShrinkFatten => {
                if !ebo.flags.contains(BoneFlags::SELECTED) {
                    continue;
                }
                let owner = OwnerRef::BoneEnd {
                    bone: i,
                    end: BoneEnd::Head,
                };
                let mut td = TransData::new(owner, ebo.head)
                    .with_flags(TdFlags::SELECTED)
                    .with_extra(extra(Vec::new()));
                td.axis_matrix = basis;
                td = match mode {
                    TransformMode::BoneRoll => td.with_value(ebo.roll),
                    TransformMode::BoneEnvelopeDist => td.with_value(ebo.dist),
                    TransformMode::ShrinkFatten => td.with_value(ebo.rad_head),
                    _ => td.with_ext(TransDataExt::new(Rotor3::identity(), Vec3::one())),
                };
                tc.data.push(td);
            }
            _ => {
                let parent_tip_selected = ebo.flags.contains(BoneFlags::CONNECTED)
                    && ebo
                        .parent
                        .is_some_and(|p| arm.bones[p].flags.contains(BoneFlags::TIPSEL));
                if ebo.flags.contains(BoneFlags::ROOTSEL) && !parent_tip_selected {
                    let owner = OwnerRef::BoneEnd {
                        bone: i,
                        end: BoneEnd::Head,
                    };
                    let mut td = TransData::new(owner, ebo.head)
                        .with_flags(TdFlags::SELECTED | TdFlags::USE_ROTATE | TdFlags::USE_SCALE)
                        .with_extra(extra(Vec::new()));
                    td.axis_matrix = basis;
                    tc.data.push(td);
                    if ebo.flags.contains(BoneFlags::CONNECTED) {
                        if let Some(p) = ebo.parent {
                            snapshot.insert(p, init_data(p, &arm.bones[p]));
                        }
                    }
                }
                if ebo.flags.contains(BoneFlags::TIPSEL) {
                    let owner = OwnerRef::BoneEnd {
                        bone: i,
                        end: BoneEnd::Tail,
                    };
                    for &c in &connected_children {
                        snapshot.insert(c, init_data(c, &arm.bones[c]));
                    }
                    let mut td = TransData::new(owner, ebo.tail)
                        .with_center(ebo.head)
                        .with_flags(TdFlags::SELECTED | TdFlags::USE_ROTATE | TdFlags::USE_SCALE)
                        .with_extra(extra(connected_children));
                    td.axis_matrix = basis;
                    tc.data.push(td);
                }
                if let Some(td) = tc.data.get_mut(start) {
                    td.value = Some(TransValue::new(ebo.roll));
                }
            }
        }

        if tc.data.len() > start {
            snapshot.insert(i, init_data(i, ebo));
            if let Some(m) = mirror_bone {
                snapshot.insert(m, init_data(m, &arm.bones[m]));
                for td in &mut tc.data[start..] {
                    td.flags |= TdFlags::MIRRORED;
                }
            }
            if arm.active == Some(i) {
                tc.active = Some(start);
            }
        }
    }

    tc.custom = ContainerCustom::Armature(snapshot.into_values().collect());
    tc
}

/// Computes the bones a flush should leave behind: the snapshot, with changed records applied,
/// connected neighbours following and mirror counterparts copied.
fn stage_bones(mode: TransformMode, tc: &TransDataContainer) -> BTreeMap<usize, BoneInitData> {
    let ContainerCustom::Armature(snapshot) = &tc.custom else {
        return BTreeMap::new();
    };
    let mut staged: BTreeMap<usize, BoneInitData> =
        snapshot.iter().map(|init| (init.bone, *init)).collect();

    for td in tc.data() {
        let OwnerRef::BoneEnd { bone, end } = td.owner else {
            continue;
        };
        if !td.is_changed() {
            continue;
        }
        let Some(b) = staged.get_mut(&bone) else {
            continue;
        };
        match mode {
            TransformMode::BoneRoll => {
                if let Some(v) = td.value {
                    b.roll = v.val;
                }
            }
            TransformMode::BoneEnvelopeDist => {
                if let Some(v) = td.value {
                    b.dist = v.val.max(0.0);
                }
            }
            TransformMode::ShrinkFatten => {
                if let Some(v) = td.value {
                    let ratio = if v.original() != 0.0 {
                        v.val.max(0.0) / v.original()
                    } else {
                        1.0
                    };
                    b.rad_head *= ratio;
                    b.rad_tail *= ratio;
                }
            }
            TransformMode::BoneSize => {
                if let Some(ext) = td.ext {
                    let s = ext.scale;
                    b.tail = b.head + (b.tail - b.head) * s.y;
                    b.rad_head *= s.x.abs();
                    b.rad_tail *= s.z.abs();
                }
            }
            _ => {
                match end {
                    BoneEnd::Head => b.head = td.working_location,
                    BoneEnd::Tail => b.tail = td.working_location,
                }
                if let Some(v) = td.value {
                    b.roll = v.val;
                }
            }
        }
    }

    // Connected neighbours follow.
    for td in tc.data() {
        let (OwnerRef::BoneEnd { bone, end }, ExtraData::Bone(extra)) = (td.owner, &td.extra) else {
            continue;
        };
        if !td.is_changed() {
            continue;
        }
        let Some(moved) = staged.get(&bone).copied() else {
            continue;
        };
        match end {
            BoneEnd::Tail => {
                for c in &extra.connected_children {
                    if let Some(child) = staged.get_mut(c) {
                        child.head = moved.tail;
                    }
                }
            }
            BoneEnd::Head => {}
        }
    }

    // Mirror counterparts copy their source.
    for td in tc.data() {
        let (OwnerRef::BoneEnd { bone, .. }, ExtraData::Bone(extra)) = (td.owner, &td.extra) else {
            continue;
        };
        let (Some(m), true) = (extra.mirror, td.is_changed()) else {
            continue;
        };
        let Some(src) = staged.get(&bone).copied() else {
            continue;
        };
        if let Some(dst) = staged.get_mut(&m) {
            dst.head = mirror_x(src.head);
            dst.tail = mirror_x(src.tail);
            dst.roll = -src.roll;
            dst.rad_head = src.rad_head;
            dst.rad_tail = src.rad_tail;
            dst.dist = src.dist;
        }
    }
    staged
}

fn apply_init(ebo: &mut EditBone, init: &BoneInitData, report: &mut FlushReport) {
    write(&mut ebo.head, init.head, report);
    write(&mut ebo.tail, init.tail, report);
    write(&mut ebo.roll, init.roll, report);
    write(&mut ebo.rad_head, init.rad_head, report);
    write(&mut ebo.rad_tail, init.rad_tail, report);
    write(&mut ebo.dist, init.dist, report);
}

fn write_back(
    mode: TransformMode,
    tc: &TransDataContainer,
    arm: &mut Armature,
    report: &mut FlushReport,
) {
    let mut staged = stage_bones(mode, tc);
    // Connected heads and the tails they hang from must agree.
    for td in tc.data() {
        if let OwnerRef::BoneEnd {
            bone,
            end: BoneEnd::Head,
        } = td.owner
        {
            if !td.is_changed() {
                continue;
            }
            let head = staged.get(&bone).map(|b| b.head);
            let parent = arm
                .bones
                .get(bone)
                .filter(|b| b.flags.contains(BoneFlags::CONNECTED))
                .and_then(|b| b.parent);
            if let (Some(head), Some(p)) = (head, parent) {
                if let Some(pb) = staged.get_mut(&p) {
                    pb.tail = head;
                }
            }
        }
    }
    for (bone, init) in &staged {
        if let Some(ebo) = arm.bones.get_mut(*bone) {
            apply_init(ebo, init, report);
        }
    }
}

/// Puts every bone the transform touched, directly or through a connection or the X mirror,
/// back to its snapshot.
pub fn restore_bones(tc: &TransDataContainer, arm: &mut Armature) {
    let ContainerCustom::Armature(snapshot) = &tc.custom else {
        return;
    };
    let mut report = FlushReport::default();
    for init in snapshot {
        if let Some(ebo) = arm.bones.get_mut(init.bone) {
            apply_init(ebo, init, &mut report);
        }
    }
}

fn armature_of(scene: &mut Scene, source: DataSource) -> Result<&mut Armature, TransformError> {
    object_mut(scene, source)?
        .armature_mut()
        .ok_or(TransformError::MissingSource(source))
}

impl TransConvert for EditArmatureConverter {
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
        let mut containers = Vec::new();
        for ob in scene.objects_in_mode(ObjectMode::Edit) {
            if let Some(arm) = ob.armature() {
                let tc = create_trans_armature_verts(t, DataSource::Object(ob.id), arm)
                    .with_matrix(ob.matrix, ob.location);
                log::debug!("{}: {} bone records", ob.name, tc.len());
                containers.push(tc);
            }
        }
        t.containers.extend(containers);
        Ok(())
    }

    fn validate(&self, tc: &TransDataContainer, scene: &Scene) -> Result<(), TransformError> {
        let arm = object(scene, tc.source)?
            .armature()
            .ok_or(TransformError::MissingSource(tc.source))?;
        tc.check_owners(
            |owner| matches!(owner, OwnerRef::BoneEnd { bone, .. } if bone < arm.bones.len()),
        )?;
        if let ContainerCustom::Armature(snapshot) = &tc.custom {
            if let Some(init) = snapshot.iter().find(|init| init.bone >= arm.bones.len()) {
                return Err(TransformError::StaleReference {
                    data: tc.source,
                    owner: OwnerRef::BoneEnd {
                        bone: init.bone,
                        end: BoneEnd::Head,
                    },
                });
            }
        }
        Ok(())
    }

    fn flush(
        &self,
        ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        write_back(ctx.mode, tc, armature_of(scene, tc.source)?, report);
        Ok(())
    }

    fn restore(
        &self,
        _ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError> {
        restore_bones(tc, armature_of(scene, tc.source)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TransContext;
    use crate::settings::{PivotMode, TransformSettings};

    fn two_bones() -> Armature {
        let mut arm = Armature::new(vec![
            EditBone::new("upper", Vec3::zero(), Vec3::unit_y()),
            EditBone::new("lower", Vec3::unit_y(), Vec3::unit_y() * 2.0).with_parent(0, true),
        ]);
        arm.bones[0].flags |= BoneFlags::TIPSEL;
        arm
    }

    fn info(mode: TransformMode) -> TransInfo {
        TransInfo::new(
            TransContext {
                mode,
                pivot: PivotMode::MedianPoint,
                settings: TransformSettings::default(),
            },
            Vec3::zero(),
        )
    }

    #[test]
    fn moving_a_tip_drags_connected_heads() {
        let mut arm = two_bones();
        let t = info(TransformMode::Translation);
        let mut tc = create_trans_armature_verts(&t, DataSource::Cursor3D, &arm);
        assert_eq!(tc.len(), 1);
        tc.data_mut()[0].working_location = Vec3::new(1.0, 1.0, 0.0);

        let mut report = FlushReport::default();
        write_back(TransformMode::Translation, &tc, &mut arm, &mut report);
        assert_eq!(arm.bones[0].tail, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(arm.bones[1].head, Vec3::new(1.0, 1.0, 0.0));

        restore_bones(&tc, &mut arm);
        assert_eq!(arm.bones, two_bones().bones);
    }

    #[test]
    fn roll_mode_only_touches_roll() {
        let mut arm = two_bones();
        arm.bones[1].flags |= BoneFlags::SELECTED;
        let t = info(TransformMode::BoneRoll);
        let mut tc = create_trans_armature_verts(&t, DataSource::Cursor3D, &arm);
        assert_eq!(tc.len(), 1);
        tc.data_mut()[0].value.as_mut().unwrap().val = 0.5;
        write_back(TransformMode::BoneRoll, &tc, &mut arm, &mut FlushReport::default());
        assert_eq!(arm.bones[1].roll, 0.5);
        assert_eq!(arm.bones[1].head, Vec3::unit_y());
    }
}

// End of File
