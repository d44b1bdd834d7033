// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! The generic record every converter produces and every flusher consumes.

use crate::curve_handles::CurveHandleSnapshot;
use crate::islands::IslandData;
use crate::session::TransDomain;
use common::ids::BezPart;
use common::math::pseudo_inverse;
use scene::{
    animation::FCurve, armature::TransformLocks, curve::Spline, mask::MaskSpline,
    mesh::VertIndex, paint_curve::PaintCurvePoint, tracking::Marker, DataSource,
};
use ultraviolet::{Mat3, Rotor3, Vec2, Vec3};

/// Index of an [`IslandData`] in its container.
pub type IslandIndex = usize;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TdFlags: u16 {
        /// Directly selected, as opposed to pulled in by proportional editing.
        const SELECTED          = 1 << 0;
        /// No selected element reaches this one through the topology.
        const NOT_CONNECTED     = 1 << 1;
        const USE_TRANSLATE     = 1 << 2;
        const USE_ROTATE        = 1 << 3;
        const USE_SCALE         = 1 << 4;
        /// The record also drives a mirrored counterpart.
        const MIRRORED          = 1 << 5;
        /// Lies on the mirror plane and must stay there.
        const MIRROR_EDGE_X     = 1 << 6;
        /// Locked or hidden: the engine must not move it.
        const SKIP              = 1 << 7;
        /// Moves only as a side effect (handles following their knot).
        const NO_ACTION         = 1 << 8;
        const TARGETLESS_IK     = 1 << 9;
        /// A curve handle, as opposed to a knot.
        const HANDLE_ONLY       = 1 << 10;
        /// Transforms around its own center rather than the shared pivot.
        const INDIVIDUAL_ORIGIN = 1 << 11;
    }
}

/// Rotation and scale channels, with the values they had at conversion time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransDataExt {
    pub rot: Rotor3,
    pub scale: Vec3,
    irot: Rotor3,
    iscale: Vec3,
}

impl TransDataExt {
    pub fn new(rot: Rotor3, scale: Vec3) -> Self {
        Self {
            rot,
            scale,
            irot: rot,
            iscale: scale,
        }
    }

    pub fn original_rotation(&self) -> Rotor3 {
        self.irot
    }

    pub fn original_scale(&self) -> Vec3 {
        self.iscale
    }

    pub fn is_changed(&self) -> bool {
        self.rot != self.irot || self.scale != self.iscale
    }
}

/// A scalar channel (bone roll, metaball stiffness, keyframe value) and its original.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransValue {
    pub val: f32,
    ival: f32,
}

impl TransValue {
    pub fn new(val: f32) -> Self {
        Self { val, ival: val }
    }

    pub fn original(&self) -> f32 {
        self.ival
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BoneEnd {
    Head,
    Tail,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StripSide {
    Whole,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MarkerPart {
    Position,
    PatternCorner(u8),
    SearchMin,
    SearchMax,
}

/// Where a record writes back to: an index into the native storage of the container's source.
/// Indices are re-validated before every write.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OwnerRef {
    /// Not backed by native data; never written.
    Inert,
    Vertex(VertIndex),
    BezierPoint { spline: usize, point: usize, part: BezPart },
    Point { spline: usize, point: usize },
    LatticePoint(usize),
    MetaElem(usize),
    BoneEnd { bone: usize, end: BoneEnd },
    PoseChannel(usize),
    ParticleKey { particle: usize, key: usize },
    Cursor,
    UvLoop(usize),
    Node(usize),
    Strip { strip: usize, side: StripSide },
    Marker { track: usize, marker: usize, part: MarkerPart },
    MaskPoint { spline: usize, point: usize, part: BezPart },
    PaintCurvePoint { point: usize, part: BezPart },
    Keyframe { curve: usize, key: usize, part: BezPart },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoneExtra {
    /// Children whose head is attached to this bone's tail.
    pub connected_children: Vec<usize>,
    /// The bone mirrored across X that follows this one.
    pub mirror: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PoseExtra {
    /// Set when the constraint stack needs its deltas corrected.
    pub constraint_inverse: Option<Mat3>,
    pub mirror: Option<usize>,
}

/// Per-domain payload of a record.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ExtraData {
    #[default]
    None,
    CurveHandles(CurveHandleSnapshot),
    /// A mirrored element that follows this record, with its original position.
    Mirror { counterpart: OwnerRef, original: Vec3 },
    Bone(BoneExtra),
    Pose(PoseExtra),
    /// Hair space of the particle the key belongs to.
    Particle { hair_matrix: Mat3, hair_offset: Vec3, original: Vec3 },
    /// The native 2D value before conversion, in native units.
    Native2D(Vec2),
}

/// One transformable element.
#[derive(Clone, Debug, PartialEq)]
pub struct TransData {
    iloc: Vec3,
    /// Mutated by the transform engine.
    pub working_location: Vec3,
    /// The element's own pivot.
    pub center: Vec3,
    pub owner: OwnerRef,
    pub falloff_distance: f32,
    pub flags: TdFlags,
    pub island: Option<IslandIndex>,
    pub axis_matrix: Mat3,
    /// Maps the element's own space into container space.
    pub space: Mat3,
    /// Pseudo-inverse of `space`.
    pub space_inverse: Mat3,
    pub ext: Option<TransDataExt>,
    pub value: Option<TransValue>,
    pub protect: TransformLocks,
    pub extra: ExtraData,
}

impl TransData {
    pub fn new(owner: OwnerRef, location: Vec3) -> Self {
        Self {
            iloc: location,
            working_location: location,
            center: location,
            owner,
            falloff_distance: 0.0,
            flags: TdFlags::USE_TRANSLATE,
            island: None,
            axis_matrix: Mat3::identity(),
            space: Mat3::identity(),
            space_inverse: Mat3::identity(),
            ext: None,
            value: None,
            protect: TransformLocks::empty(),
            extra: ExtraData::None,
        }
    }

    pub fn with_flags(mut self, flags: TdFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_center(mut self, center: Vec3) -> Self {
        self.center = center;
        self
    }

    pub fn with_space(mut self, space: Mat3) -> Self {
        self.space = space;
        self.space_inverse = pseudo_inverse(space);
        self
    }

    pub fn with_ext(mut self, ext: TransDataExt) -> Self {
        self.ext = Some(ext);
        self
    }

    pub fn with_value(mut self, val: f32) -> Self {
        self.value = Some(TransValue::new(val));
        self
    }

    pub fn with_extra(mut self, extra: ExtraData) -> Self {
        self.extra = extra;
        self
    }

    #[inline]
    pub fn original_location(&self) -> Vec3 {
        self.iloc
    }

    #[inline]
    pub fn is_selected(&self) -> bool {
        self.flags.contains(TdFlags::SELECTED)
    }

    /// Whether the engine changed anything since conversion.
    pub fn is_changed(&self) -> bool {
        self.working_location != self.iloc
            || self.ext.is_some_and(|ext| ext.is_changed())
            || self.value.is_some_and(|v| v.val != v.ival)
    }

    /// Puts every working value back to its original.
    pub fn reset(&mut self) {
        self.working_location = self.iloc;
        if let Some(ext) = &mut self.ext {
            ext.rot = ext.irot;
            ext.scale = ext.iscale;
        }
        if let Some(value) = &mut self.value {
            value.val = value.ival;
        }
    }
}

/// Snapshot of a mirrored pose channel, for
/// [`restore_mirror_pose_bones`](crate::pose::restore_mirror_pose_bones).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseMirrorInit {
    pub channel: usize,
    pub loc: Vec3,
    pub rot: Rotor3,
    pub scale: Vec3,
}

/// Snapshot of an edit bone touched indirectly (mirror or connection), for
/// [`restore_bones`](crate::restore_bones).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneInitData {
    pub bone: usize,
    pub head: Vec3,
    pub tail: Vec3,
    pub roll: f32,
    pub rad_head: f32,
    pub rad_tail: f32,
    pub dist: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoseCustom {
    pub mirror: Vec<PoseMirrorInit>,
    /// Whether any bone takes part in translation and in rotation.
    pub has_translate_rotate: [bool; 2],
}

/// Container-level state a domain keeps for flushing and restoring.  Spline snapshots hold
/// every spline that has a record, so that handles recomputed on neighbouring points can be
/// put back exactly.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ContainerCustom {
    #[default]
    None,
    Curve(Vec<(usize, Spline)>),
    Mask(Vec<(usize, MaskSpline)>),
    PaintCurve(Vec<PaintCurvePoint>),
    Keyframes(Vec<(usize, FCurve)>),
    /// `(track, marker)` with the marker as converted.
    Markers(Vec<((usize, usize), Marker)>),
    Armature(Vec<BoneInitData>),
    Pose(PoseCustom),
}

/// All records of one edited source.
#[derive(Clone, Debug)]
pub struct TransDataContainer {
    pub source: DataSource,
    pub domain: TransDomain,
    pub(crate) data: Vec<TransData>,
    islands: Vec<IslandData>,
    /// Rotation and scale from container space to world space.
    pub matrix: Mat3,
    pub offset: Vec3,
    /// Scale applied to 2D data so that the engine works in square units.
    pub aspect: Vec2,
    /// Index of the record of the active element.
    pub active: Option<usize>,
    pub(crate) custom: ContainerCustom,
}

impl TransDataContainer {
    pub fn new(source: DataSource, domain: TransDomain) -> Self {
        Self {
            source,
            domain,
            data: Vec::new(),
            islands: Vec::new(),
            matrix: Mat3::identity(),
            offset: Vec3::zero(),
            aspect: Vec2::one(),
            active: None,
            custom: ContainerCustom::None,
        }
    }

    pub fn with_matrix(mut self, matrix: Mat3, offset: Vec3) -> Self {
        self.matrix = matrix;
        self.offset = offset;
        self
    }

    pub fn data(&self) -> &[TransData] {
        &self.data
    }

    /// The records, for the engine to mutate.  The slice keeps the record count fixed.
    pub fn data_mut(&mut self) -> &mut [TransData] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn islands(&self) -> &[IslandData] {
        &self.islands
    }

    pub(crate) fn set_islands(&mut self, islands: Vec<IslandData>) {
        self.islands = islands;
    }

    pub fn to_world(&self, co: Vec3) -> Vec3 {
        self.matrix * co + self.offset
    }

    pub(crate) fn reset(&mut self) {
        for td in &mut self.data {
            td.reset();
        }
    }

    /// Fails on the first owner `exists` rejects.  Inert records always pass.
    pub(crate) fn check_owners(
        &self,
        mut exists: impl FnMut(OwnerRef) -> bool,
    ) -> Result<(), crate::TransformError> {
        for td in &self.data {
            if td.owner != OwnerRef::Inert && !exists(td.owner) {
                log::error!("{:?} refers to missing {:?}", self.source, td.owner);
                return Err(crate::TransformError::StaleReference {
                    data: self.source,
                    owner: td.owner,
                });
            }
        }
        Ok(())
    }
}


// End of File
