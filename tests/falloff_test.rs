// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

mod common;

use common::*;
use scene::{Scene, Vec3};
use transconv::{
    DisconnectedFalloff, PivotMode, TdFlags, TransDomain, TransformMode, TransformSession,
    TransformSettings,
};

fn falloffs(scene: &mut Scene, settings: TransformSettings) -> Vec<f32> {
    let session = TransformSession::convert(
        scene,
        TransDomain::Mesh,
        TransformMode::Translation,
        PivotMode::MedianPoint,
        settings,
    )
    .unwrap();
    let distances = session.containers()[0]
        .data()
        .iter()
        .map(|td| td.falloff_distance)
        .collect();
    session.abort(scene);
    distances
}

fn connected() -> TransformSettings {
    TransformSettings {
        proportional: true,
        proportional_connected: true,
        ..Default::default()
    }
}

#[test]
fn test_line_with_selected_ends() {
    init_logging();
    let mut scene = Scene::new();
    let (mesh, _) = line_mesh(&[true, false, false, true]);
    let id = add_edit_mesh(&mut scene, mesh);
    let before = mesh_coords(&scene, id);

    let mut session = TransformSession::convert(
        &mut scene,
        TransDomain::Mesh,
        TransformMode::Translation,
        PivotMode::MedianPoint,
        connected(),
    )
    .unwrap();
    let data = session.containers()[0].data();
    assert_eq!(data.len(), 4);
    let distances: Vec<f32> = data.iter().map(|td| td.falloff_distance).collect();
    assert_eq!(distances, vec![0.0, 1.0, 1.0, 0.0]);
    assert!(data[0].is_selected() && data[3].is_selected());
    assert!(!data[1].is_selected() && !data[2].is_selected());
    assert_eq!(session.center(), Vec3::new(1.5, 0.0, 0.0));

    let report = session.flush(&mut scene, &mut ()).unwrap();
    assert_eq!(report.written, 0);
    assert_eq!(mesh_coords(&scene, id), before);
    session.confirm(&mut scene, &mut ()).unwrap();
}

#[test]
fn test_falloff_grows_with_distance() {
    let mut scene = Scene::new();
    let (mesh, _) = line_mesh(&[true, false, false, false, false]);
    add_edit_mesh(&mut scene, mesh);

    for proportional_connected in [false, true] {
        let settings = TransformSettings {
            proportional: true,
            proportional_connected,
            ..Default::default()
        };
        let distances = falloffs(&mut scene, settings);
        assert_eq!(distances[0], 0.0);
        assert!(distances.windows(2).all(|w| w[0] <= w[1]), "{:?}", distances);
    }
}

#[test]
fn test_disconnected_policy() {
    let mut scene = Scene::new();
    let (mut mesh, _) = line_mesh(&[true, false]);
    mesh.add_vertex(vertex(Vec3::new(5.0, 0.0, 0.0), false));
    add_edit_mesh(&mut scene, mesh);

    let distances = falloffs(&mut scene, connected());
    assert_eq!(distances[0], 0.0);
    assert_eq!(distances[1], 1.0);
    assert_eq!(distances[2], f32::MAX);

    let settings = TransformSettings {
        disconnected_falloff: DisconnectedFalloff::Distance(2.5),
        ..connected()
    };
    let session = TransformSession::convert(
        &mut scene,
        TransDomain::Mesh,
        TransformMode::Translation,
        PivotMode::MedianPoint,
        settings,
    )
    .unwrap();
    let loose = &session.containers()[0].data()[2];
    assert_eq!(loose.falloff_distance, 2.5);
    assert!(loose.flags.contains(TdFlags::NOT_CONNECTED));
    session.abort(&mut scene);
}

#[test]
fn test_single_selection_pivots_on_itself() {
    let mut scene = Scene::new();
    let (mesh, _) = line_mesh(&[false, false, true]);
    add_edit_mesh(&mut scene, mesh);
    scene.cursor.location = Vec3::new(0.0, 9.0, 0.0);

    for pivot in [PivotMode::Cursor, PivotMode::BoundingBoxCenter] {
        let session = TransformSession::convert(
            &mut scene,
            TransDomain::Mesh,
            TransformMode::Rotation,
            pivot,
            TransformSettings::default(),
        )
        .unwrap();
        assert_eq!(session.center(), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(session.info().context.pivot, PivotMode::IndividualOrigins);
        session.abort(&mut scene);
    }
}

// End of File
