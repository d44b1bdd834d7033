// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Edit-mode curves: Bezier triples and poly points.

use super::{object, object_mut, write};
use crate::curve_handles::{init_trans_data_curve_handles, stage_bezier};
use crate::error::TransformError;
use crate::falloff::calc_distance_curve_verts;
use crate::islands::build_islands;
use crate::session::{FlushReport, TransContext, TransConvert, TransDomain, TransInfo};
use crate::settings::TransformSettings;
use crate::trans_data::{ContainerCustom, OwnerRef, TdFlags, TransData, TransDataContainer};
use common::ids::BezPart;
use scene::bezier::BezSelect;
use scene::curve::{Curve, SplineKind};
use scene::{DataSource, ObjectMode, Scene};
use ultraviolet::Vec3;

pub(crate) struct CurveConverter;

fn create_trans_curve_verts(
    t: &TransInfo,
    source: DataSource,
    curve: &Curve,
) -> TransDataContainer {
    let settings = &t.context.settings;
    let mut tc = TransDataContainer::new(source, TransDomain::Curve);
    let mut snapshots = Vec::new();
    let mut links = Vec::new();

    for (s, spline) in curve.splines.iter().enumerate() {
        if spline.hidden {
            continue;
        }
        let first = tc.data.len();
        match &spline.kind {
            SplineKind::Bezier(points) => {
                // One distance per triple, shared by its records.
                let mut knots = Vec::new();
                let mut ranges = Vec::new();
                for (p, bezt) in points.iter().enumerate() {
                    if bezt.hidden {
                        continue;
                    }
                    let knot_selected = bezt.select.contains(BezSelect::KNOT);
                    let any_selected = !bezt.select.is_empty();
                    let start = tc.data.len();
                    let parts: &[BezPart] = if settings.curve_hide_handles {
                        &[BezPart::Knot]
                    } else {
                        &BezPart::ALL
                    };
                    for &part in parts {
                        let part_selected = if settings.curve_hide_handles {
                            any_selected
                        } else {
                            knot_selected || bezt.select.contains(BezSelect::from_part(part))
                        };
                        if !part_selected && !settings.proportional {
                            continue;
                        }
                        let owner = OwnerRef::BezierPoint {
                            spline: s,
                            point: p,
                            part,
                        };
                        let mut td = TransData::new(owner, bezt.point(part))
                            .with_center(bezt.knot())
                            .with_flags(TdFlags::USE_ROTATE | TdFlags::USE_SCALE);
                        if part_selected {
                            td.flags |= TdFlags::SELECTED;
                        }
                        if part != BezPart::Knot {
                            td.flags |= TdFlags::HANDLE_ONLY;
                        }
                        if start == tc.data.len() {
                            init_trans_data_curve_handles(&mut td, bezt);
                        }
                        tc.data.push(td);
                    }
                    if tc.data.len() > start {
                        let mut knot = TransData::new(OwnerRef::Inert, bezt.knot());
                        if any_selected {
                            knot.flags |= TdFlags::SELECTED;
                        }
                        knots.push(knot);
                        ranges.push(start..tc.data.len());
                    }
                }
                if settings.proportional {
                    calc_distance_curve_verts(
                        &mut knots,
                        spline.cyclic,
                        settings.disconnected_falloff,
                    );
                    for (knot, range) in knots.iter().zip(ranges) {
                        for td in &mut tc.data[range] {
                            td.falloff_distance = if td.is_selected() {
                                0.0
                            } else {
                                knot.falloff_distance
                            };
                            td.flags.set(
                                TdFlags::NOT_CONNECTED,
                                knot.flags.contains(TdFlags::NOT_CONNECTED),
                            );
                        }
                    }
                }
            }
            SplineKind::Poly(points) => {
                for (p, bp) in points.iter().enumerate() {
                    if bp.hidden || !(bp.selected || settings.proportional) {
                        continue;
                    }
                    let owner = OwnerRef::Point { spline: s, point: p };
                    let mut td = TransData::new(owner, bp.co)
                        .with_flags(TdFlags::USE_ROTATE | TdFlags::USE_SCALE);
                    if bp.selected {
                        td.flags |= TdFlags::SELECTED;
                    }
                    tc.data.push(td);
                }
                if settings.proportional {
                    calc_distance_curve_verts(
                        &mut tc.data[first..],
                        spline.cyclic,
                        settings.disconnected_falloff,
                    );
                }
            }
        }
        if tc.data.len() > first {
            links.extend((first + 1..tc.data.len()).map(|i| (i - 1, i)));
            snapshots.push((s, spline.clone()));
        }
    }

    let islands = build_islands(&mut tc.data, links, &[], None, t.context.pivot);
    tc.set_islands(islands);
    tc.custom = ContainerCustom::Curve(snapshots);
    tc
}

fn target(td: &TransData) -> Vec3 {
    if td.is_changed() {
        td.working_location
    } else {
        td.original_location()
    }
}

/// Rebuilds every converted spline from its snapshot, applies the records, re-runs the handle
/// rules for the points that moved and writes whatever differs from native storage.
fn write_back(
    settings: &TransformSettings,
    tc: &TransDataContainer,
    curve: &mut Curve,
    report: &mut FlushReport,
) {
    let ContainerCustom::Curve(snapshots) = &tc.custom else {
        return;
    };
    for (s, snapshot) in snapshots {
        let Some(spline) = curve.splines.get_mut(*s) else {
            continue;
        };
        match (&snapshot.kind, &mut spline.kind) {
            (SplineKind::Bezier(orig), SplineKind::Bezier(points)) => {
                let records = tc.data().iter().filter_map(|td| match td.owner {
                    OwnerRef::BezierPoint { spline, point, part } if spline == *s => {
                        Some((point, part, td))
                    }
                    _ => None,
                });
                let staged = stage_bezier(
                    orig,
                    snapshot.cyclic,
                    records,
                    settings.curve_hide_handles,
                    |td, _| td.working_location,
                );
                if points.len() != staged.len() {
                    log::warn!("Spline {} changed length during the transform", s);
                    continue;
                }
                for (dst, src) in points.iter_mut().zip(staged) {
                    write(dst, src, report);
                }
            }
            (SplineKind::Poly(_), SplineKind::Poly(points)) => {
                for td in tc.data() {
                    let OwnerRef::Point { spline, point } = td.owner else {
                        continue;
                    };
                    if spline != *s {
                        continue;
                    }
                    if let Some(bp) = points.get_mut(point) {
                        write(&mut bp.co, target(td), report);
                    }
                }
            }
            _ => log::warn!("Spline {} changed type during the transform", s),
        }
    }
}

fn curve_of(scene: &mut Scene, source: DataSource) -> Result<&mut Curve, TransformError> {
    object_mut(scene, source)?
        .curve_mut()
        .ok_or(TransformError::MissingSource(source))
}

impl TransConvert for CurveConverter {
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
        let mut containers = Vec::new();
        for ob in scene.objects_in_mode(ObjectMode::Edit) {
            if let Some(curve) = ob.curve() {
                let tc = create_trans_curve_verts(t, DataSource::Object(ob.id), curve)
                    .with_matrix(ob.matrix, ob.location);
                log::debug!("{}: {} curve records", ob.name, tc.len());
                containers.push(tc);
            }
        }
        t.containers.extend(containers);
        Ok(())
    }

    fn validate(&self, tc: &TransDataContainer, scene: &Scene) -> Result<(), TransformError> {
        let curve = object(scene, tc.source)?
            .curve()
            .ok_or(TransformError::MissingSource(tc.source))?;
        tc.check_owners(|owner| match owner {
            OwnerRef::BezierPoint { spline, point, .. } => {
                curve.bezier_point(spline, point).is_some()
            }
            OwnerRef::Point { spline, point } => curve.poly_point(spline, point).is_some(),
            _ => false,
        })
    }

    fn flush(
        &self,
        ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        write_back(&ctx.settings, tc, curve_of(scene, tc.source)?, report);
        Ok(())
    }

    fn restore(
        &self,
        ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError> {
        write_back(
            &ctx.settings,
            tc,
            curve_of(scene, tc.source)?,
            &mut FlushReport::default(),
        );
        Ok(())
    }
}

// End of File
