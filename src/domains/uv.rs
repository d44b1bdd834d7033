// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! UV coordinates of edit meshes, one record per face corner.
//!
//! Records hold UVs multiplied by the image aspect, so the engine moves them in square units
//! and the image occupies `[0, aspect]` instead of the unit square.

use super::{object, object_mut, write};
use crate::error::TransformError;
use crate::falloff::euclidean_falloff;
use crate::islands::build_islands;
use crate::session::{FlushReport, TransContext, TransConvert, TransDomain, TransInfo};
use crate::settings::UvClipMode;
use crate::trans_data::{ExtraData, OwnerRef, TdFlags, TransData, TransDataContainer};
use common::math::{flatten, lift};
use scene::mesh::{Mesh, UvLayer};
use scene::{DataSource, ObjectMode, Scene};
use ultraviolet::{Vec2, Vec3};

pub(crate) struct UvConverter;

fn create_trans_uvs(
    t: &TransInfo,
    source: DataSource,
    mesh: &Mesh,
    layer: &UvLayer,
    aspect: Vec2,
) -> TransDataContainer {
    let settings = &t.context.settings;
    let mut tc = TransDataContainer::new(source, TransDomain::Uv);
    tc.aspect = aspect;

    let labels = layer.islands();
    let mut island_of_record = Vec::new();
    for (i, l) in layer.loops.iter().enumerate() {
        let visible = mesh.vertex(l.vert).is_some_and(|v| !v.is_hidden());
        if !visible || !(l.selected || settings.proportional) {
            continue;
        }
        let mut td = TransData::new(OwnerRef::UvLoop(i), lift(l.uv * aspect))
            .with_extra(ExtraData::Native2D(l.uv));
        if l.selected {
            td.flags |= TdFlags::SELECTED;
        }
        tc.data.push(td);
        island_of_record.push(labels.get(i).copied().unwrap_or(i));
    }

    // Chain the records of each UV island together.
    let mut last_in_island = std::collections::HashMap::new();
    let mut links = Vec::new();
    for (record, label) in island_of_record.iter().enumerate() {
        if let Some(prev) = last_in_island.insert(*label, record) {
            links.push((prev, record));
        }
    }
    let normals = vec![Vec3::unit_z(); tc.data.len()];
    let islands = build_islands(&mut tc.data, links, &normals, None, t.context.pivot);
    tc.set_islands(islands);

    if settings.proportional {
        euclidean_falloff(&mut tc.data, settings.disconnected_falloff);
    }
    tc
}

/// Shift that brings the box `[min, max]` inside `[0, bounds]`, or `None` when the box is too
/// large to fit on some axis.
fn fit_shift(min: Vec2, max: Vec2, bounds: Vec2) -> Option<Vec2> {
    let axis = |lo: f32, hi: f32, b: f32| {
        if hi - lo > b {
            None
        } else if lo < 0.0 {
            Some(-lo)
        } else if hi > b {
            Some(b - hi)
        } else {
            Some(0.0)
        }
    };
    Some(Vec2::new(
        axis(min.x, max.x, bounds.x)?,
        axis(min.y, max.y, bounds.y)?,
    ))
}

/// Whole image tiles to subtract so that `center` lands in `[0, bounds)`.
fn wrap_shift(center: Vec2, bounds: Vec2) -> Vec2 {
    let tiles = |c: f32, b: f32| if b > 0.0 { (c / b).floor() * b } else { 0.0 };
    -Vec2::new(tiles(center.x, bounds.x), tiles(center.y, bounds.y))
}

/// Clips the points `members` of one island as a single piece.  Clamp shifts the island into
/// `[0, bounds]` and falls back to per-point clamping only when the island is larger than the
/// image; Wrap moves it by whole tiles until its center is inside.
fn clip_island(points: &mut [Vec2], members: &[usize], bounds: Vec2, mode: UvClipMode) -> bool {
    if members.is_empty() {
        return false;
    }
    let mut min = Vec2::broadcast(f32::MAX);
    let mut max = Vec2::broadcast(f32::MIN);
    for &i in members {
        min = min.min_by_component(points[i]);
        max = max.max_by_component(points[i]);
    }
    match mode {
        UvClipMode::Clamp => match fit_shift(min, max, bounds) {
            Some(shift) if shift == Vec2::zero() => false,
            Some(shift) => {
                // Clamped as well, so rounding in the shift cannot leave a point just outside.
                for &i in members {
                    points[i] = (points[i] + shift).clamped(Vec2::zero(), bounds);
                }
                true
            }
            None => {
                let mut changed = false;
                for &i in members {
                    let clamped = points[i].clamped(Vec2::zero(), bounds);
                    changed |= clamped != points[i];
                    points[i] = clamped;
                }
                changed
            }
        },
        UvClipMode::Wrap => {
            let shift = wrap_shift((min + max) * 0.5, bounds);
            if shift == Vec2::zero() {
                return false;
            }
            for &i in members {
                points[i] += shift;
            }
            true
        }
    }
}

/// Record indices per island; records outside every island form groups of their own.
fn island_groups(tc: &TransDataContainer) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); tc.islands().len()];
    let mut loose = Vec::new();
    for (i, td) in tc.data().iter().enumerate() {
        match td.island.and_then(|island| groups.get_mut(island)) {
            Some(group) => group.push(i),
            None => loose.push(vec![i]),
        }
    }
    groups.extend(loose);
    groups
}

fn clip_working(tc: &mut TransDataContainer, groups: &[Vec<usize>], mode: UvClipMode) -> bool {
    let bounds = tc.aspect;
    let mut points: Vec<Vec2> = tc.data().iter().map(|td| flatten(td.working_location)).collect();
    let mut changed = false;
    for group in groups {
        changed |= clip_island(&mut points, group, bounds, mode);
    }
    if changed {
        for (td, p) in tc.data.iter_mut().zip(points) {
            let z = td.working_location.z;
            td.working_location = Vec3::new(p.x, p.y, z);
        }
    }
    changed
}

/// Keeps the working UVs of a whole container inside the image while dragging, moving the
/// selection as one piece.  Returns whether anything moved.
pub fn clip_uv_transform(tc: &mut TransDataContainer, mode: UvClipMode) -> bool {
    if tc.domain != TransDomain::Uv {
        return false;
    }
    let members: Vec<usize> = (0..tc.len()).collect();
    clip_working(tc, &[members], mode)
}

/// Clips the working UVs island by island: each island is shifted rigidly into the image, so
/// its shape survives.  Unselected records are clipped on their own.  Applying it twice is the
/// same as applying it once.
pub fn clip_uv_data(tc: &mut TransDataContainer, mode: UvClipMode) -> bool {
    if tc.domain != TransDomain::Uv {
        return false;
    }
    let groups = island_groups(tc);
    clip_working(tc, &groups, mode)
}

/// Resolves every record to a normalized UV.  With `clip`, islands holding a moved record are
/// clipped to the unit square as a whole before anything is written.
fn write_back(
    ctx: &TransContext,
    tc: &TransDataContainer,
    layer: &mut UvLayer,
    image_size: [u32; 2],
    clip: bool,
    report: &mut FlushReport,
) {
    let settings = &ctx.settings;
    let pixels = Vec2::new(image_size[0] as f32, image_size[1] as f32);
    let snap = settings.uv_pixel_snap && image_size[0] > 0 && image_size[1] > 0;

    let mut uvs: Vec<Vec2> = tc
        .data()
        .iter()
        .map(|td| match &td.extra {
            &ExtraData::Native2D(original) if !td.is_changed() => original,
            _ => {
                let uv = flatten(td.working_location) / tc.aspect;
                if snap {
                    Vec2::new((uv.x * pixels.x).round(), (uv.y * pixels.y).round()) / pixels
                } else {
                    uv
                }
            }
        })
        .collect();

    if clip && settings.uv_clip_to_bounds {
        for group in island_groups(tc) {
            if !group.iter().any(|&i| tc.data[i].is_changed()) {
                continue;
            }
            let before: Vec<Vec2> = group.iter().map(|&i| uvs[i]).collect();
            if clip_island(&mut uvs, &group, Vec2::one(), settings.uv_clip_mode) {
                report.clamped += group
                    .iter()
                    .zip(before)
                    .filter(|&(&i, old)| uvs[i] != old)
                    .count();
            }
        }
    }

    for (td, uv) in tc.data().iter().zip(uvs) {
        let OwnerRef::UvLoop(i) = td.owner else {
            continue;
        };
        if let Some(l) = layer.loops.get_mut(i) {
            write(&mut l.uv, uv, report);
        }
    }
}

fn layer_of(scene: &mut Scene, source: DataSource) -> Result<&mut UvLayer, TransformError> {
    object_mut(scene, source)?
        .mesh_mut()
        .and_then(|mesh| mesh.uv.as_mut())
        .ok_or(TransformError::MissingSource(source))
}

impl TransConvert for UvConverter {
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
        let aspect = scene.image_aspect();
        let mut containers = Vec::new();
        for ob in scene.objects_in_mode(ObjectMode::Edit) {
            let Some(mesh) = ob.mesh() else {
                continue;
            };
            if let Some(layer) = &mesh.uv {
                let source = DataSource::Object(ob.id);
                containers.push(create_trans_uvs(t, source, mesh, layer, aspect));
            }
        }
        t.containers.extend(containers);
        Ok(())
    }

    fn validate(&self, tc: &TransDataContainer, scene: &Scene) -> Result<(), TransformError> {
        let layer = object(scene, tc.source)?
            .mesh()
            .and_then(|mesh| mesh.uv.as_ref())
            .ok_or(TransformError::MissingSource(tc.source))?;
        tc.check_owners(|owner| matches!(owner, OwnerRef::UvLoop(i) if i < layer.loops.len()))
    }

    fn flush(
        &self,
        ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        let image_size = scene.image_size;
        write_back(ctx, tc, layer_of(scene, tc.source)?, image_size, true, report);
        Ok(())
    }

    fn restore(
        &self,
        ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError> {
        let image_size = scene.image_size;
        let layer = layer_of(scene, tc.source)?;
        write_back(ctx, tc, layer, image_size, false, &mut FlushReport::default());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{PivotMode, TransformSettings};
    use scene::mesh::{UvLoop, Vertex};

    fn square_island() -> (Mesh, TransDataContainer) {
        let mut mesh = Mesh::new();
        let verts: Vec<_> = (0..4).map(|_| mesh.add_vertex(Vertex::new(Vec3::zero()))).collect();
        let corners = [(0.1, 0.1), (0.3, 0.1), (0.3, 0.3), (0.1, 0.3)];
        let loops = corners
            .iter()
            .zip(&verts)
            .map(|(&(x, y), &vert)| UvLoop {
                uv: Vec2::new(x, y),
                vert,
                face: 0,
                selected: true,
            })
            .collect();
        mesh.uv = Some(UvLayer { loops });
        let t = TransInfo::new(
            TransContext {
                mode: Default::default(),
                pivot: PivotMode::IndividualOrigins,
                settings: TransformSettings::default(),
            },
            Vec3::zero(),
        );
        let layer = mesh.uv.clone().unwrap();
        let tc = create_trans_uvs(&t, DataSource::Cursor3D, &mesh, &layer, Vec2::one());
        (mesh, tc)
    }

    #[test]
    fn island_is_shifted_rigidly_and_idempotently() {
        let (_, mut tc) = square_island();
        assert_eq!(tc.islands().len(), 1);
        for td in tc.data_mut() {
            td.working_location -= Vec3::new(0.5, 0.0, 0.0);
        }
        assert!(clip_uv_data(&mut tc, UvClipMode::Clamp));
        let once: Vec<Vec3> = tc.data().iter().map(|td| td.working_location).collect();
        assert!(!clip_uv_data(&mut tc, UvClipMode::Clamp));
        let twice: Vec<Vec3> = tc.data().iter().map(|td| td.working_location).collect();
        assert_eq!(once, twice);
        // The island keeps its width and now touches the left edge.
        assert!((once[0].x - 0.0).abs() < 1e-6);
        assert!((once[1].x - 0.2).abs() < 1e-6);
    }

    #[test]
    fn wrap_mode_moves_the_selection_by_whole_tiles() {
        let (_, mut tc) = square_island();
        for td in tc.data_mut() {
            td.working_location += Vec3::new(1.0, -2.0, 0.0);
        }
        assert!(clip_uv_transform(&mut tc, UvClipMode::Wrap));
        assert!((tc.data()[0].working_location.x - 0.1).abs() < 1e-5);
        assert!((tc.data()[0].working_location.y - 0.1).abs() < 1e-5);
        assert!((tc.data()[2].working_location.x - 0.3).abs() < 1e-5);
        assert!(!clip_uv_transform(&mut tc, UvClipMode::Wrap));
    }

    #[test]
    fn wrapped_island_is_not_torn_at_the_border() {
        let (_, mut tc) = square_island();
        for td in tc.data_mut() {
            td.working_location += Vec3::new(0.85, 0.0, 0.0);
        }
        // Corners now span x = 0.95..1.15, across the right edge.
        assert!(clip_uv_data(&mut tc, UvClipMode::Wrap));
        let xs: Vec<f32> = tc.data().iter().map(|td| td.working_location.x).collect();
        assert!((xs[1] - xs[0] - 0.2).abs() < 1e-5);
        assert!((xs[0] + 0.05).abs() < 1e-5);
        assert!(!clip_uv_data(&mut tc, UvClipMode::Wrap));
    }

    #[test]
    fn flush_snaps_to_pixels() {
        let (mut mesh, mut tc) = square_island();
        tc.data_mut()[0].working_location = Vec3::new(0.26, 0.0, 0.0);
        let mut ctx = TransContext {
            mode: Default::default(),
            pivot: PivotMode::MedianPoint,
            settings: TransformSettings::default(),
        };
        ctx.settings.uv_pixel_snap = true;
        let layer = mesh.uv.as_mut().unwrap();
        let mut report = FlushReport::default();
        write_back(&ctx, &tc, layer, [4, 4], true, &mut report);
        assert_eq!(layer.loops[0].uv, Vec2::new(0.25, 0.0));
        assert_eq!(report.written, 1);
    }
}

// End of File
