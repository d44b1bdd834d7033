// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

#![allow(dead_code)]

use scene::armature::{Armature, BoneFlags, EditBone};
use scene::mesh::{ElemFlags, Mesh, VertIndex, Vertex};
use scene::{DataSource, Object, ObjectData, ObjectId, ObjectMode, Scene, Vec3};
use transconv::UpdateNotifier;

pub fn init_logging() {
    logging::Logging::new(vec!["transconv"])
        .with_level(log::LevelFilter::Debug)
        .init();
}

/// Remembers every invalidation it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub tagged: Vec<DataSource>,
    pub particles: Vec<ObjectId>,
}

impl UpdateNotifier for RecordingNotifier {
    fn tag_update(&mut self, source: DataSource) {
        self.tagged.push(source);
    }

    fn particles_stale(&mut self, object: ObjectId) {
        self.particles.push(object);
    }
}

pub fn vertex(co: Vec3, selected: bool) -> Vertex {
    let mut v = Vertex::new(co);
    v.flags.set(ElemFlags::SELECTED, selected);
    v
}

/// A chain of vertices one unit apart along X, joined by edges, with the given selection.
pub fn line_mesh(selection: &[bool]) -> (Mesh, Vec<VertIndex>) {
    let mut mesh = Mesh::new();
    let verts: Vec<VertIndex> = selection
        .iter()
        .enumerate()
        .map(|(i, &selected)| mesh.add_vertex(vertex(Vec3::new(i as f32, 0.0, 0.0), selected)))
        .collect();
    for pair in verts.windows(2) {
        mesh.add_edge(pair[0], pair[1]);
    }
    (mesh, verts)
}

pub fn add_edit_mesh(scene: &mut Scene, mesh: Mesh) -> ObjectId {
    scene.add_object(Object::new("Mesh", ObjectData::Mesh(mesh)).with_mode(ObjectMode::Edit))
}

pub fn mesh_coords(scene: &Scene, id: ObjectId) -> Vec<Vec3> {
    let mesh = scene.object(id).and_then(|ob| ob.mesh()).expect("mesh object");
    mesh.graph.node_indices().map(|v| mesh.graph[v].co).collect()
}

/// Root, a connected child and a connected grandchild pointing up the Y axis.
pub fn chain_armature() -> Armature {
    Armature::new(vec![
        EditBone::new("Root", Vec3::zero(), Vec3::new(0.0, 1.0, 0.0)),
        EditBone::new("Mid", Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 2.0, 0.0))
            .with_parent(0, true),
        EditBone::new("Tip", Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 3.0, 0.0))
            .with_parent(1, true),
    ])
}

pub fn add_armature(scene: &mut Scene, arm: Armature, mode: ObjectMode) -> ObjectId {
    scene.add_object(Object::new("Armature", ObjectData::Armature(arm)).with_mode(mode))
}

pub fn armature(scene: &Scene, id: ObjectId) -> &Armature {
    scene.object(id).and_then(|ob| ob.armature()).expect("armature object")
}

pub fn select_bone(arm: &mut Armature, index: usize) {
    arm.bones[index].flags |= BoneFlags::SELECTED | BoneFlags::ROOTSEL | BoneFlags::TIPSEL;
    arm.pose.channels[index].selected = true;
}

// End of File
