// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

mod common;

use common::*;
use scene::mesh::{Mesh, UvLayer, UvLoop};
use scene::{ObjectId, Scene, Vec2, Vec3};
use transconv::{
    clip_uv_data, PivotMode, TransDomain, TransformMode, TransformSession, TransformSettings,
    UvClipMode,
};

fn convert_uvs(scene: &mut Scene, settings: TransformSettings) -> TransformSession {
    TransformSession::convert(
        scene,
        TransDomain::Uv,
        TransformMode::Translation,
        PivotMode::MedianPoint,
        settings,
    )
    .unwrap()
}

fn move_selected(session: &mut TransformSession, by: Vec3) {
    for td in session.containers_mut()[0].data_mut() {
        td.working_location += by;
    }
}

/// Two triangles with separate UV islands; the first one is selected.
fn two_islands() -> (Scene, ObjectId) {
    let mut mesh = Mesh::new();
    let verts: Vec<_> = (0..6)
        .map(|i| mesh.add_vertex(vertex(Vec3::new(i as f32, 0.0, 0.0), false)))
        .collect();
    let uvs = [
        Vec2::new(0.2, 0.2),
        Vec2::new(0.6, 0.2),
        Vec2::new(0.4, 0.6),
        Vec2::new(0.7, 0.7),
        Vec2::new(0.9, 0.7),
        Vec2::new(0.8, 0.9),
    ];
    let loops = uvs
        .iter()
        .zip(&verts)
        .enumerate()
        .map(|(i, (&uv, &vert))| UvLoop {
            uv,
            vert,
            face: i / 3,
            selected: i < 3,
        })
        .collect();
    mesh.uv = Some(UvLayer { loops });
    let mut scene = Scene::new();
    let id = add_edit_mesh(&mut scene, mesh);
    (scene, id)
}

fn uvs(scene: &Scene, id: ObjectId) -> Vec<Vec2> {
    let mesh = scene.object(id).and_then(|ob| ob.mesh()).unwrap();
    mesh.uv.as_ref().unwrap().loops.iter().map(|l| l.uv).collect()
}

fn assert_close(a: Vec2, b: Vec2) {
    assert!((a - b).mag() < 1e-5, "{:?} != {:?}", a, b);
}

#[test]
fn test_clipped_island_keeps_its_shape() {
    init_logging();
    let (mut scene, id) = two_islands();
    let mut session = TransformSession::convert(
        &mut scene,
        TransDomain::Uv,
        TransformMode::Translation,
        PivotMode::MedianPoint,
        TransformSettings::default(),
    )
    .unwrap();
    let islands = session.containers()[0].islands().to_vec();
    assert_eq!(session.containers()[0].len(), 3);

    let tc = &mut session.containers_mut()[0];
    for td in tc.data_mut() {
        td.working_location += Vec3::new(0.5, 0.0, 0.0);
    }
    assert!(clip_uv_data(tc, UvClipMode::Clamp));
    assert!(!clip_uv_data(tc, UvClipMode::Clamp));

    session.flush(&mut scene, &mut ()).unwrap();
    assert_eq!(session.containers()[0].islands(), islands.as_slice());

    let after = uvs(&scene, id);
    assert_close(after[0], Vec2::new(0.6, 0.2));
    assert_close(after[1], Vec2::new(1.0, 0.2));
    assert_close(after[2], Vec2::new(0.8, 0.6));
    // The unselected island is untouched.
    assert_eq!(after[3], Vec2::new(0.7, 0.7));
    assert_eq!(after[5], Vec2::new(0.8, 0.9));
    session.confirm(&mut scene, &mut ()).unwrap();
}

#[test]
fn test_flush_clips_to_bounds() {
    let (mut scene, id) = two_islands();
    let settings = TransformSettings {
        uv_clip_to_bounds: true,
        ..Default::default()
    };
    let mut session = TransformSession::convert(
        &mut scene,
        TransDomain::Uv,
        TransformMode::Translation,
        PivotMode::MedianPoint,
        settings,
    )
    .unwrap();
    session.containers_mut()[0].data_mut()[0].working_location = Vec3::new(-0.5, 0.3, 0.0);
    let report = session.flush(&mut scene, &mut ()).unwrap();
    assert_eq!(report.clamped, 1);
    assert_eq!(uvs(&scene, id)[0], Vec2::new(0.0, 0.3));
    session.confirm(&mut scene, &mut ()).unwrap();
}

#[test]
fn test_flush_shifts_whole_island_into_bounds() {
    let (mut scene, id) = two_islands();
    let settings = TransformSettings {
        uv_clip_to_bounds: true,
        ..Default::default()
    };
    let mut session = convert_uvs(&mut scene, settings);
    move_selected(&mut session, Vec3::new(0.6, 0.0, 0.0));
    let report = session.flush(&mut scene, &mut ()).unwrap();
    assert_eq!(report.clamped, 3);

    let after = uvs(&scene, id);
    assert_close(after[0], Vec2::new(0.6, 0.2));
    assert_close(after[1], Vec2::new(1.0, 0.2));
    assert_close(after[2], Vec2::new(0.8, 0.6));
    session.cancel(&mut scene, &mut ()).unwrap();
}

#[test]
fn test_wrapped_island_stays_in_one_piece() {
    let (mut scene, id) = two_islands();
    let before = uvs(&scene, id);

    let mut session = convert_uvs(&mut scene, TransformSettings::default());
    move_selected(&mut session, Vec3::new(0.7, 0.0, 0.0));
    assert!(clip_uv_data(&mut session.containers_mut()[0], UvClipMode::Wrap));
    let xs: Vec<f32> = session.containers()[0]
        .data()
        .iter()
        .map(|td| td.working_location.x)
        .collect();
    assert!((xs[1] - xs[0] - 0.4).abs() < 1e-5, "{:?}", xs);
    assert!((xs[2] - xs[0] - 0.2).abs() < 1e-5, "{:?}", xs);
    session.cancel(&mut scene, &mut ()).unwrap();

    let settings = TransformSettings {
        uv_clip_to_bounds: true,
        uv_clip_mode: UvClipMode::Wrap,
        ..Default::default()
    };
    let mut session = convert_uvs(&mut scene, settings);
    move_selected(&mut session, Vec3::new(0.85, 0.0, 0.0));
    session.flush(&mut scene, &mut ()).unwrap();
    let after = uvs(&scene, id);
    assert_close(after[0], Vec2::new(0.05, 0.2));
    assert_close(after[1], Vec2::new(0.45, 0.2));
    assert_close(after[2], Vec2::new(0.25, 0.6));
    session.cancel(&mut scene, &mut ()).unwrap();
    assert_eq!(uvs(&scene, id), before);
}

#[test]
fn test_wide_image_scales_records() {
    let (mut scene, id) = two_islands();
    scene.image_size = [200, 100];
    let before = uvs(&scene, id);
    let mut session = TransformSession::convert(
        &mut scene,
        TransDomain::Uv,
        TransformMode::Translation,
        PivotMode::MedianPoint,
        TransformSettings::default(),
    )
    .unwrap();
    let first = session.containers()[0].data()[0].working_location;
    assert_eq!(first, Vec3::new(0.2, 0.1, 0.0));

    session.containers_mut()[0].data_mut()[0].working_location = Vec3::new(0.4, 0.1, 0.0);
    session.flush(&mut scene, &mut ()).unwrap();
    assert_close(uvs(&scene, id)[0], Vec2::new(0.4, 0.2));
    session.cancel(&mut scene, &mut ()).unwrap();
    assert_eq!(uvs(&scene, id), before);
}

// End of File
