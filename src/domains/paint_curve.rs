// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Paint curve points, in screen space.

use super::write;
use crate::curve_handles::{init_trans_data_curve_handles, stage_bezier};
use crate::error::TransformError;
use crate::session::{FlushReport, TransContext, TransConvert, TransDomain, TransInfo};
use crate::trans_data::{ContainerCustom, OwnerRef, TdFlags, TransData, TransDataContainer};
use common::ids::BezPart;
use scene::bezier::{BezSelect, BezTriple};
use scene::paint_curve::PaintCurve;
use scene::{DataSource, Scene};
use ultraviolet::Vec3;

pub(crate) struct PaintCurveConverter;

fn create_trans_paint_curve_verts(pc: &PaintCurve) -> TransDataContainer {
    let mut tc = TransDataContainer::new(DataSource::PaintCurve, TransDomain::PaintCurve);
    for (p, point) in pc.points.iter().enumerate() {
        let bezt = &point.bezt;
        if bezt.hidden {
            continue;
        }
        let knot_selected = bezt.select.contains(BezSelect::KNOT);
        let start = tc.data.len();
        for part in BezPart::ALL {
            if !knot_selected && !bezt.select.contains(BezSelect::from_part(part)) {
                continue;
            }
            let mut td = TransData::new(
                OwnerRef::PaintCurvePoint { point: p, part },
                bezt.point(part),
            )
            .with_center(bezt.knot())
            .with_flags(TdFlags::SELECTED | TdFlags::USE_ROTATE | TdFlags::USE_SCALE);
            if part != BezPart::Knot {
                td.flags |= TdFlags::HANDLE_ONLY;
            }
            if tc.data.len() == start {
                init_trans_data_curve_handles(&mut td, bezt);
            }
            tc.data.push(td);
        }
    }
    if !tc.is_empty() {
        tc.custom = ContainerCustom::PaintCurve(pc.points.clone());
    }
    tc
}

fn write_back(tc: &TransDataContainer, pc: &mut PaintCurve, report: &mut FlushReport) {
    let ContainerCustom::PaintCurve(snapshot) = &tc.custom else {
        return;
    };
    let orig: Vec<BezTriple> = snapshot.iter().map(|p| p.bezt).collect();
    let records = tc.data().iter().filter_map(|td| match td.owner {
        OwnerRef::PaintCurvePoint { point, part } => Some((point, part, td)),
        _ => None,
    });
    // Screen space is flat.
    let staged = stage_bezier(&orig, false, records, false, |td, original| {
        Vec3::new(td.working_location.x, td.working_location.y, original.z)
    });
    if pc.points.len() != staged.len() {
        log::warn!("Paint curve changed length during the transform");
        return;
    }
    for (dst, src) in pc.points.iter_mut().zip(staged) {
        write(&mut dst.bezt, src, report);
    }
}

impl TransConvert for PaintCurveConverter {
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
        t.containers
            .push(create_trans_paint_curve_verts(&scene.paint_curve));
        Ok(())
    }

    fn validate(&self, tc: &TransDataContainer, scene: &Scene) -> Result<(), TransformError> {
        let len = scene.paint_curve.points.len();
        tc.check_owners(
            |owner| matches!(owner, OwnerRef::PaintCurvePoint { point, .. } if point < len),
        )
    }

    fn flush(
        &self,
        _ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        write_back(tc, &mut scene.paint_curve, report);
        Ok(())
    }

    fn restore(
        &self,
        _ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError> {
        write_back(tc, &mut scene.paint_curve, &mut FlushReport::default());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::bezier::HandleType;
    use scene::paint_curve::PaintCurvePoint;

    #[test]
    fn moving_one_handle_keeps_the_other_aligned() {
        let bezt = BezTriple::with_handles(
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::zero(),
            Vec3::new(2.0, 0.0, 0.0),
        )
        .with_types(HandleType::Align, HandleType::Align)
        .selected(BezSelect::HANDLE1);
        let mut pc = PaintCurve {
            points: vec![PaintCurvePoint { bezt }],
        };
        let mut tc = create_trans_paint_curve_verts(&pc);
        assert_eq!(tc.len(), 1);
        tc.data_mut()[0].working_location = Vec3::new(0.0, -1.0, 0.0);
        write_back(&tc, &mut pc, &mut FlushReport::default());
        let moved = pc.points[0].bezt;
        assert_eq!(moved.vec[0], Vec3::new(0.0, -1.0, 0.0));
        assert!((moved.vec[2] - Vec3::new(0.0, 2.0, 0.0)).mag() < 1e-6);

        tc.reset();
        write_back(&tc, &mut pc, &mut FlushReport::default());
        assert_eq!(pc.points[0].bezt, bezt);
    }
}

// End of File
