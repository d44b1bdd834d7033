// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Mask splines.  Points convert like Bezier curve points, in normalized 2D space scaled by
//! the image aspect.  A flush never leaves a mask unusable: non-finite positions fall back to
//! their original, and a spline whose knots collapse onto one spot is left as it was.

use super::write;
use crate::curve_handles::{init_trans_data_curve_handles, stage_bezier};
use crate::error::TransformError;
use crate::falloff::euclidean_falloff;
use crate::session::{FlushReport, TransContext, TransConvert, TransDomain, TransInfo};
use crate::trans_data::{ContainerCustom, OwnerRef, TdFlags, TransData, TransDataContainer};
use common::ids::BezPart;
use common::math::{flatten, is_finite3, lift};
use scene::bezier::{BezSelect, BezTriple};
use scene::mask::Mask;
use scene::{DataSource, Scene};
use ultraviolet::{Vec2, Vec3};

pub(crate) struct MaskConverter;

/// Distance below which two knots count as the same spot.
const COLLAPSE_EPSILON: f32 = 1e-6;

fn to_trans(co: Vec3, aspect: Vec2) -> Vec3 {
    lift(flatten(co) * aspect)
}

fn create_trans_masking_data(t: &TransInfo, mask: &Mask, aspect: Vec2) -> TransDataContainer {
    let settings = &t.context.settings;
    let mut tc = TransDataContainer::new(DataSource::Mask, TransDomain::Mask);
    tc.aspect = aspect;
    let mut snapshots = Vec::new();

    for (s, spline) in mask.splines.iter().enumerate() {
        let first = tc.data.len();
        for (p, point) in spline.points.iter().enumerate() {
            let bezt = &point.bezt;
            if bezt.hidden {
                continue;
            }
            let knot_selected = bezt.select.contains(BezSelect::KNOT);
            let start = tc.data.len();
            for part in BezPart::ALL {
                let selected = knot_selected || bezt.select.contains(BezSelect::from_part(part));
                if !selected && !settings.proportional {
                    continue;
                }
                let owner = OwnerRef::MaskPoint {
                    spline: s,
                    point: p,
                    part,
                };
                let mut td = TransData::new(owner, to_trans(bezt.point(part), aspect))
                    .with_center(to_trans(bezt.knot(), aspect))
                    .with_flags(TdFlags::USE_ROTATE | TdFlags::USE_SCALE);
                if selected {
                    td.flags |= TdFlags::SELECTED;
                }
                if part != BezPart::Knot {
                    td.flags |= TdFlags::HANDLE_ONLY;
                }
                if tc.data.len() == start {
                    init_trans_data_curve_handles(&mut td, bezt);
                }
                tc.data.push(td);
            }
        }
        if tc.data.len() > first {
            snapshots.push((s, spline.clone()));
        }
    }
    if settings.proportional {
        euclidean_falloff(&mut tc.data, settings.disconnected_falloff);
    }
    tc.custom = ContainerCustom::Mask(snapshots);
    tc
}

fn is_collapsed(points: &[BezTriple]) -> bool {
    let Some(first) = points.first() else {
        return false;
    };
    points.len() > 1
        && points
            .iter()
            .all(|b| (b.knot() - first.knot()).mag() < COLLAPSE_EPSILON)
}

fn write_back(tc: &TransDataContainer, mask: &mut Mask, report: &mut FlushReport) {
    let ContainerCustom::Mask(snapshots) = &tc.custom else {
        return;
    };
    for (s, snapshot) in snapshots {
        let Some(spline) = mask.splines.get_mut(*s) else {
            continue;
        };
        let orig: Vec<BezTriple> = snapshot.points.iter().map(|p| p.bezt).collect();
        let records = tc.data().iter().filter_map(|td| match td.owner {
            OwnerRef::MaskPoint { spline, point, part } if spline == *s => {
                Some((point, part, td))
            }
            _ => None,
        });
        let mut clamped = 0;
        let mut staged = stage_bezier(&orig, snapshot.cyclic, records, false, |td, original| {
            let co = lift(flatten(td.working_location) / tc.aspect);
            if is_finite3(co) {
                Vec3::new(co.x, co.y, original.z)
            } else {
                clamped += 1;
                original
            }
        });
        report.clamped += clamped;

        if staged != orig && is_collapsed(&staged) {
            log::warn!("Mask spline {} would collapse to a point; keeping it", s);
            report.rejected += 1;
            staged = orig;
        }
        if spline.points.len() != staged.len() {
            log::warn!("Mask spline {} changed length during the transform", s);
            continue;
        }
        for (dst, src) in spline.points.iter_mut().zip(staged) {
            write(&mut dst.bezt, src, report);
        }
    }
}

impl TransConvert for MaskConverter {
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
        let tc = create_trans_masking_data(t, &scene.mask, scene.image_aspect());
        t.containers.push(tc);
        Ok(())
    }

    fn validate(&self, tc: &TransDataContainer, scene: &Scene) -> Result<(), TransformError> {
        tc.check_owners(|owner| match owner {
            OwnerRef::MaskPoint { spline, point, .. } => scene
                .mask
                .splines
                .get(spline)
                .is_some_and(|s| point < s.points.len()),
            _ => false,
        })
    }

    fn flush(
        &self,
        _ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        write_back(tc, &mut scene.mask, report);
        Ok(())
    }

    fn restore(
        &self,
        _ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError> {
        write_back(tc, &mut scene.mask, &mut FlushReport::default());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{PivotMode, TransformSettings};
    use scene::mask::{MaskPoint, MaskSpline};

    fn triangle(select: BezSelect) -> Mask {
        let point = |x: f32, y: f32| MaskPoint {
            bezt: BezTriple::new(Vec3::new(x, y, 0.0)).selected(select),
        };
        Mask {
            splines: vec![MaskSpline::new(vec![
                point(0.2, 0.2),
                point(0.8, 0.2),
                point(0.5, 0.8),
            ])],
        }
    }

    fn info() -> TransInfo {
        TransInfo::new(
            TransContext {
                mode: Default::default(),
                pivot: PivotMode::MedianPoint,
                settings: TransformSettings::default(),
            },
            Vec3::zero(),
        )
    }

    #[test]
    fn non_finite_points_are_clamped_back() {
        let mut mask = triangle(BezSelect::KNOT);
        let original = mask.clone();
        let mut tc = create_trans_masking_data(&info(), &mask, Vec2::one());
        assert_eq!(tc.len(), 9);
        tc.data_mut()[1].working_location = Vec3::new(f32::NAN, 0.0, 0.0);
        let mut report = FlushReport::default();
        write_back(&tc, &mut mask, &mut report);
        assert_eq!(report.clamped, 1);
        assert_eq!(mask, original);
    }

    #[test]
    fn collapsing_a_spline_is_rejected() {
        let mut mask = triangle(BezSelect::KNOT);
        let original = mask.clone();
        let mut tc = create_trans_masking_data(&info(), &mask, Vec2::one());
        for td in tc.data_mut() {
            td.working_location = Vec3::new(0.5, 0.5, 0.0);
        }
        let mut report = FlushReport::default();
        write_back(&tc, &mut mask, &mut report);
        assert_eq!(report.rejected, 1);
        assert_eq!(mask, original);
    }
}

// End of File
