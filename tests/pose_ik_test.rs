// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

mod common;

use common::*;
use scene::armature::{Constraint, ConstraintKind, IkConstraint};
use scene::mesh::Mesh;
use scene::{Object, ObjectData, ObjectMode, Rotor3, Scene, Vec3};
use transconv::{
    PivotMode, TdFlags, TransDomain, TransformError, TransformMode, TransformSession,
    TransformSettings,
};

fn auto_ik_settings() -> TransformSettings {
    TransformSettings {
        auto_ik: true,
        auto_ik_chain_len: 2,
        ..Default::default()
    }
}

fn temporary_constraints(scene: &Scene, id: scene::ObjectId) -> usize {
    armature(scene, id)
        .pose
        .channels
        .iter()
        .flat_map(|c| c.ik_constraints())
        .filter(|ik| ik.temporary)
        .count()
}

#[test]
fn test_auto_ik_bakes_solution_on_confirm() {
    init_logging();
    let mut scene = Scene::new();
    let mut arm = chain_armature();
    select_bone(&mut arm, 2);
    let id = add_armature(&mut scene, arm, ObjectMode::Pose);

    let mut session = TransformSession::convert(
        &mut scene,
        TransDomain::Pose,
        TransformMode::Translation,
        PivotMode::MedianPoint,
        auto_ik_settings(),
    )
    .unwrap();
    assert_eq!(temporary_constraints(&scene, id), 1);
    let td = &mut session.containers_mut()[0].data_mut()[0];
    assert!(td.flags.contains(TdFlags::TARGETLESS_IK));
    td.working_location += Vec3::new(0.5, 0.0, 0.0);

    // What the solver would have produced while dragging.
    let solution = Rotor3::from_rotation_xy(0.3);
    scene.object_mut(id).unwrap().armature_mut().unwrap().pose.channels[1].ik_solution =
        Some(solution);

    let mut notifier = RecordingNotifier::default();
    session.flush(&mut scene, &mut notifier).unwrap();
    session.confirm(&mut scene, &mut notifier).unwrap();

    let pose = &armature(&scene, id).pose;
    assert_eq!(pose.channels[1].rot, solution);
    assert!(pose.channels.iter().all(|c| c.ik_solution.is_none()));
    assert_eq!(pose.channels[2].loc, Vec3::new(0.5, 0.0, 0.0));
    assert_eq!(temporary_constraints(&scene, id), 0);
}

#[test]
fn test_cancel_restores_ik_state() {
    init_logging();
    let mut scene = Scene::new();
    let mut arm = chain_armature();
    arm.pose.channels[2]
        .constraints
        .push(Constraint::new(ConstraintKind::Kinematic(IkConstraint::targetless(2))));
    select_bone(&mut arm, 1);
    let id = add_armature(&mut scene, arm, ObjectMode::Pose);
    let before = armature(&scene, id).clone();

    let mut session = TransformSession::convert(
        &mut scene,
        TransDomain::Pose,
        TransformMode::Rotation,
        PivotMode::MedianPoint,
        TransformSettings::default(),
    )
    .unwrap();
    let solving_disabled = armature(&scene, id).pose.channels[2]
        .ik_constraints()
        .all(|ik| ik.solve_disabled);
    assert!(solving_disabled);

    for td in session.containers_mut()[0].data_mut() {
        if let Some(ext) = &mut td.ext {
            ext.rot = Rotor3::from_rotation_yz(0.5);
        }
    }
    session.flush(&mut scene, &mut ()).unwrap();
    assert_ne!(armature(&scene, id).pose, before.pose);

    session.cancel(&mut scene, &mut ()).unwrap();
    assert_eq!(armature(&scene, id), &before);
}

#[test]
fn test_cancel_removes_auto_ik() {
    init_logging();
    let mut scene = Scene::new();
    let mut arm = chain_armature();
    select_bone(&mut arm, 2);
    let id = add_armature(&mut scene, arm, ObjectMode::Pose);
    let before = armature(&scene, id).clone();

    let mut session = TransformSession::convert(
        &mut scene,
        TransDomain::Pose,
        TransformMode::Translation,
        PivotMode::MedianPoint,
        auto_ik_settings(),
    )
    .unwrap();
    session.containers_mut()[0].data_mut()[0].working_location = Vec3::one();
    session.flush(&mut scene, &mut ()).unwrap();
    session.cancel(&mut scene, &mut ()).unwrap();

    assert_eq!(armature(&scene, id), &before);
}

#[test]
fn test_translation_of_connected_bone_becomes_rotation() {
    let mut scene = Scene::new();
    let mut arm = chain_armature();
    select_bone(&mut arm, 1);
    add_armature(&mut scene, arm, ObjectMode::Pose);

    let session = TransformSession::convert(
        &mut scene,
        TransDomain::Pose,
        TransformMode::Translation,
        PivotMode::MedianPoint,
        TransformSettings::default(),
    )
    .unwrap();
    assert_eq!(session.mode(), TransformMode::Rotation);
    session.abort(&mut scene);
}

#[test]
fn test_pose_without_armature_fails_cleanly() {
    let mut scene = Scene::new();
    let mut arm = chain_armature();
    select_bone(&mut arm, 2);
    let arm_id = add_armature(&mut scene, arm, ObjectMode::Pose);
    let mesh_id = scene.add_object(
        Object::new("Mesh", ObjectData::Mesh(Mesh::new())).with_mode(ObjectMode::Pose),
    );

    let result = TransformSession::convert(
        &mut scene,
        TransDomain::Pose,
        TransformMode::Translation,
        PivotMode::MedianPoint,
        auto_ik_settings(),
    );
    assert!(matches!(result, Err(TransformError::NoTransformableBones(id)) if id == mesh_id));
    assert_eq!(temporary_constraints(&scene, arm_id), 0);
}

// End of File
