// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! The native storage that interactive transforms read from and write back into.  Each editable
//! domain keeps its own shape here (a vertex graph for meshes, Bezier triples for curves, pose
//! channels for armatures, ...); the transform conversion layer never stores pointers into this
//! data, only indices that it re-validates before writing.

pub use common::ids::{BezPart, ObjectId};
pub use ultraviolet::{Mat3, Rotor3, Vec2, Vec3};

pub mod animation;
pub mod armature;
pub mod bezier;
pub mod curve;
pub mod lattice;
pub mod mask;
pub mod mesh;
pub mod metaball;
pub mod nodes;
pub mod paint_curve;
pub mod particles;
pub mod sequencer;
pub mod tracking;

use animation::Animation;
use armature::Armature;
use curve::Curve;
use lattice::Lattice;
use mask::Mask;
use mesh::Mesh;
use metaball::MetaBall;
use nodes::NodeTree;
use paint_curve::PaintCurve;
use particles::ParticleSystem;
use sequencer::Sequencer;
use tracking::Tracking;

/// The interaction mode an object is in.  Only objects in a matching mode take part in a
/// transform of their element data.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ObjectMode {
    #[default]
    Object,
    Edit,
    Pose,
    ParticleEdit,
}

/// The element data an object carries.
#[derive(Clone, Debug)]
pub enum ObjectData {
    Empty,
    Mesh(Mesh),
    Curve(Curve),
    Lattice(Lattice),
    MetaBall(MetaBall),
    Armature(Armature),
}

#[derive(Clone, Debug)]
pub struct Object {
    pub id: ObjectId,
    pub name: String,
    pub mode: ObjectMode,
    /// Rotation and scale of the object, mapping local coordinates to world space.
    pub matrix: Mat3,
    pub location: Vec3,
    pub data: ObjectData,
    /// Particle systems are edited in `ObjectMode::ParticleEdit` independent of `data`.
    pub particles: Option<ParticleSystem>,
}

impl Object {
    pub fn new(name: impl Into<String>, data: ObjectData) -> Self {
        Self {
            id: ObjectId(0),
            name: name.into(),
            mode: ObjectMode::Object,
            matrix: Mat3::identity(),
            location: Vec3::zero(),
            data,
            particles: None,
        }
    }

    pub fn with_mode(mut self, mode: ObjectMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.data {
            ObjectData::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.data {
            ObjectData::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn curve(&self) -> Option<&Curve> {
        match &self.data {
            ObjectData::Curve(curve) => Some(curve),
            _ => None,
        }
    }

    pub fn curve_mut(&mut self) -> Option<&mut Curve> {
        match &mut self.data {
            ObjectData::Curve(curve) => Some(curve),
            _ => None,
        }
    }

    pub fn lattice(&self) -> Option<&Lattice> {
        match &self.data {
            ObjectData::Lattice(lattice) => Some(lattice),
            _ => None,
        }
    }

    pub fn lattice_mut(&mut self) -> Option<&mut Lattice> {
        match &mut self.data {
            ObjectData::Lattice(lattice) => Some(lattice),
            _ => None,
        }
    }

    pub fn metaball(&self) -> Option<&MetaBall> {
        match &self.data {
            ObjectData::MetaBall(mball) => Some(mball),
            _ => None,
        }
    }

    pub fn metaball_mut(&mut self) -> Option<&mut MetaBall> {
        match &mut self.data {
            ObjectData::MetaBall(mball) => Some(mball),
            _ => None,
        }
    }

    pub fn armature(&self) -> Option<&Armature> {
        match &self.data {
            ObjectData::Armature(arm) => Some(arm),
            _ => None,
        }
    }

    pub fn armature_mut(&mut self) -> Option<&mut Armature> {
        match &mut self.data {
            ObjectData::Armature(arm) => Some(arm),
            _ => None,
        }
    }
}

/// The 3D cursor: a pivot object that is not part of any selection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor3D {
    pub location: Vec3,
    pub rotation: Rotor3,
}

impl Default for Cursor3D {
    fn default() -> Self {
        Self {
            location: Vec3::zero(),
            rotation: Rotor3::identity(),
        }
    }
}

/// Where the data behind one transform container lives.  Object data is addressed by id; the
/// 2D editors each edit a single scene-level data block.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DataSource {
    Object(ObjectId),
    Cursor3D,
    ImageCursor,
    NodeTree,
    Sequencer,
    Tracking,
    Mask,
    PaintCurve,
    Animation,
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    objects: Vec<Object>,
    next_object_id: u32,
    pub current_frame: i32,
    pub cursor: Cursor3D,
    /// The 2D cursor of the image editor, in normalized image coordinates.
    pub image_cursor: Vec2,
    /// Size in pixels of the image shown in the image editor.
    pub image_size: [u32; 2],
    pub node_tree: NodeTree,
    pub sequencer: Sequencer,
    pub tracking: Tracking,
    pub mask: Mask,
    pub paint_curve: PaintCurve,
    pub animation: Animation,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object to the scene, assigning it a fresh identifier.
    pub fn add_object(&mut self, mut object: Object) -> ObjectId {
        let id = ObjectId(self.next_object_id);
        self.next_object_id += 1;
        object.id = id;
        self.objects.push(object);
        id
    }

    /// Removes an object.  Any transform still referring to it will fail to flush.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<Object> {
        let index = self.objects.iter().position(|ob| ob.id == id)?;
        Some(self.objects.remove(index))
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.iter().find(|ob| ob.id == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.iter_mut().find(|ob| ob.id == id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.iter()
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.objects.iter_mut()
    }

    /// Width and height of the edited image relative to its larger side.  UVs are multiplied by
    /// this so that transforms work in square units.
    pub fn image_aspect(&self) -> Vec2 {
        let [w, h] = self.image_size;
        if w == 0 || h == 0 {
            return Vec2::one();
        }
        let max = w.max(h) as f32;
        Vec2::new(w as f32 / max, h as f32 / max)
    }

    /// Objects in `mode`, in scene order.  Multi-object editing converts each of them.
    pub fn objects_in_mode(&self, mode: ObjectMode) -> impl Iterator<Item = &Object> {
        self.objects.iter().filter(move |ob| ob.mode == mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ids_are_not_reused() {
        let mut scene = Scene::new();
        let a = scene.add_object(Object::new("a", ObjectData::Empty));
        scene.remove_object(a);
        let b = scene.add_object(Object::new("b", ObjectData::Empty));
        assert_ne!(a, b);
        assert!(scene.object(a).is_none());
        assert_eq!(scene.object(b).map(|ob| ob.name.as_str()), Some("b"));
    }

    #[test]
    fn image_aspect_of_wide_image() {
        let mut scene = Scene::new();
        assert_eq!(scene.image_aspect(), Vec2::one());
        scene.image_size = [512, 256];
        assert_eq!(scene.image_aspect(), Vec2::new(1.0, 0.5));
    }
}

// End of File
