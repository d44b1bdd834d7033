// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Animation keyframes, for the graph editor (frame and value, with handles) and the action
//! editor (frame only, handles carried along).

use super::write;
use crate::curve_handles::{init_trans_data_curve_handles, stage_bezier};
use crate::error::TransformError;
use crate::session::{FlushReport, TransContext, TransConvert, TransDomain, TransInfo};
use crate::trans_data::{ContainerCustom, OwnerRef, TdFlags, TransData, TransDataContainer};
use common::ids::BezPart;
use scene::animation::Animation;
use scene::bezier::{calc_handles, BezSelect, BezTriple};
use scene::{DataSource, Scene};
use ultraviolet::Vec3;

pub(crate) struct GraphConverter;
pub(crate) struct ActionConverter;

fn create_trans_keyframes(anim: &Animation, domain: TransDomain) -> TransDataContainer {
    let mut tc = TransDataContainer::new(DataSource::Animation, domain);
    let mut snapshots = Vec::new();
    for (c, fcu) in anim.curves.iter().enumerate() {
        if fcu.hidden || fcu.locked {
            continue;
        }
        let first = tc.data.len();
        for (k, bezt) in fcu.keyframes.iter().enumerate() {
            let parts: Vec<BezPart> = match domain {
                TransDomain::Action if !bezt.select.is_empty() => vec![BezPart::Knot],
                TransDomain::Action => Vec::new(),
                _ if bezt.select.contains(BezSelect::KNOT) => BezPart::ALL.to_vec(),
                _ => BezPart::ALL
                    .into_iter()
                    .filter(|&part| bezt.select.contains(BezSelect::from_part(part)))
                    .collect(),
            };
            let start = tc.data.len();
            for part in parts {
                let mut td = TransData::new(
                    OwnerRef::Keyframe { curve: c, key: k, part },
                    bezt.point(part),
                )
                .with_center(bezt.knot())
                .with_flags(TdFlags::SELECTED);
                if domain == TransDomain::Graph {
                    td.flags |= TdFlags::USE_ROTATE | TdFlags::USE_SCALE;
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
            snapshots.push((c, fcu.clone()));
        }
    }
    tc.custom = ContainerCustom::Keyframes(snapshots);
    tc
}

fn write_back(
    ctx: &TransContext,
    tc: &TransDataContainer,
    anim: &mut Animation,
    report: &mut FlushReport,
) {
    let ContainerCustom::Keyframes(snapshots) = &tc.custom else {
        return;
    };
    let action = tc.domain == TransDomain::Action;
    let snap = ctx.settings.snap_frames;
    for (c, snapshot) in snapshots {
        let Some(fcu) = anim.curves.get_mut(*c) else {
            continue;
        };
        let records = tc.data().iter().filter_map(|td| match td.owner {
            OwnerRef::Keyframe { curve, key, part } if curve == *c => Some((key, part, td)),
            _ => None,
        });
        let staged = stage_bezier(&snapshot.keyframes, false, records, action, |td, original| {
            let knot = matches!(td.owner, OwnerRef::Keyframe { part: BezPart::Knot, .. });
            let mut frame = td.working_location.x;
            if snap && knot {
                frame = frame.round();
            }
            let value = if action { original.y } else { td.working_location.y };
            Vec3::new(frame, value, original.z)
        });
        if fcu.keyframes.len() != staged.len() {
            log::warn!("Curve {} changed its keyframe count during the transform", fcu.path);
            continue;
        }
        for (dst, src) in fcu.keyframes.iter_mut().zip(staged) {
            write(dst, src, report);
        }
    }
}

/// Re-sorts the keyframes of every transformed curve by frame, recomputes their automatic
/// handles and remaps the records to the new keyframe order.  Returns whether any curve was
/// reordered.
pub(crate) fn remake_graph_transdata(
    tc: &mut TransDataContainer,
    anim: &mut Animation,
    report: &mut FlushReport,
) -> bool {
    let ContainerCustom::Keyframes(snapshots) = &mut tc.custom else {
        return false;
    };
    let mut reordered = false;
    for (c, snapshot) in snapshots.iter_mut() {
        let Some(fcu) = anim.curves.get_mut(*c) else {
            continue;
        };
        let order = fcu.sort_keyframes();
        if order.iter().enumerate().all(|(new, &old)| new == old) {
            continue;
        }
        reordered = true;
        report.written += order.iter().enumerate().filter(|&(new, &old)| new != old).count();
        for i in 0..fcu.keyframes.len() {
            calc_handles(&mut fcu.keyframes, false, i);
        }

        let mut new_of_old = vec![0; order.len()];
        for (new, &old) in order.iter().enumerate() {
            new_of_old[old] = new;
        }
        let sorted: Vec<BezTriple> = order.iter().map(|&old| snapshot.keyframes[old]).collect();
        snapshot.keyframes = sorted;
        for td in &mut tc.data {
            if let OwnerRef::Keyframe { curve, key, .. } = &mut td.owner {
                if *curve == *c {
                    if let Some(&new) = new_of_old.get(*key) {
                        *key = new;
                    }
                }
            }
        }
        log::debug!("Re-sorted keyframes of {}", fcu.path);
    }
    reordered
}

fn validate_keyframes(tc: &TransDataContainer, scene: &Scene) -> Result<(), TransformError> {
    tc.check_owners(|owner| match owner {
        OwnerRef::Keyframe { curve, key, .. } => scene
            .animation
            .curves
            .get(curve)
            .is_some_and(|fcu| key < fcu.keyframes.len()),
        _ => false,
    })
}

macro_rules! keyframe_converter {
    ($converter:ident, $domain:expr) => {
        impl TransConvert for $converter {
            fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
                t.containers
                    .push(create_trans_keyframes(&scene.animation, $domain));
                Ok(())
            }

            fn validate(
                &self,
                tc: &TransDataContainer,
                scene: &Scene,
            ) -> Result<(), TransformError> {
                validate_keyframes(tc, scene)
            }

            fn flush(
                &self,
                ctx: &TransContext,
                tc: &mut TransDataContainer,
                scene: &mut Scene,
                report: &mut FlushReport,
            ) -> Result<(), TransformError> {
                write_back(ctx, tc, &mut scene.animation, report);
                Ok(())
            }

            fn restore(
                &self,
                ctx: &TransContext,
                tc: &TransDataContainer,
                scene: &mut Scene,
            ) -> Result<(), TransformError> {
                write_back(ctx, tc, &mut scene.animation, &mut FlushReport::default());
                Ok(())
            }

            fn finish(
                &self,
                _ctx: &TransContext,
                tc: &mut TransDataContainer,
                scene: &mut Scene,
                report: &mut FlushReport,
            ) -> Result<(), TransformError> {
                remake_graph_transdata(tc, &mut scene.animation, report);
                Ok(())
            }
        }
    };
}

keyframe_converter!(GraphConverter, TransDomain::Graph);
keyframe_converter!(ActionConverter, TransDomain::Action);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{PivotMode, TransformSettings};
    use scene::animation::FCurve;
    use scene::bezier::HandleType;

    fn key(frame: f32, value: f32) -> BezTriple {
        BezTriple::with_handles(
            Vec3::new(frame - 1.0, value, 0.0),
            Vec3::new(frame, value, 0.0),
            Vec3::new(frame + 1.0, value, 0.0),
        )
        .with_types(HandleType::Free, HandleType::Free)
    }

    fn ctx(snap_frames: bool) -> TransContext {
        let mut settings = TransformSettings::default();
        settings.snap_frames = snap_frames;
        TransContext {
            mode: Default::default(),
            pivot: PivotMode::MedianPoint,
            settings,
        }
    }

    #[test]
    fn action_editor_moves_time_only() {
        let mut anim = Animation {
            curves: vec![FCurve::new(
                "location",
                vec![key(1.0, 5.0).selected(BezSelect::KNOT), key(10.0, 0.0)],
            )],
        };
        let mut tc = create_trans_keyframes(&anim, TransDomain::Action);
        assert_eq!(tc.len(), 1);
        tc.data_mut()[0].working_location = Vec3::new(3.4, 99.0, 0.0);
        write_back(&ctx(true), &tc, &mut anim, &mut FlushReport::default());
        let moved = anim.curves[0].keyframes[0];
        assert_eq!(moved.knot(), Vec3::new(3.0, 5.0, 0.0));
        assert_eq!(moved.vec[0], Vec3::new(2.0, 5.0, 0.0));
    }

    #[test]
    fn confirm_resorts_and_remaps_owners() {
        let mut anim = Animation {
            curves: vec![FCurve::new(
                "location",
                vec![key(1.0, 0.0).selected(BezSelect::KNOT), key(10.0, 0.0)],
            )],
        };
        let mut tc = create_trans_keyframes(&anim, TransDomain::Graph);
        assert_eq!(tc.len(), 3);
        for td in tc.data_mut() {
            td.working_location.x += 20.0;
        }
        let mut report = FlushReport::default();
        write_back(&ctx(false), &tc, &mut anim, &mut report);
        assert!(remake_graph_transdata(&mut tc, &mut anim, &mut report));

        let frames: Vec<f32> = anim.curves[0].keyframes.iter().map(|k| k.knot().x).collect();
        assert_eq!(frames, vec![10.0, 21.0]);
        assert!(tc
            .data()
            .iter()
            .all(|td| matches!(td.owner, OwnerRef::Keyframe { key: 1, .. })));
    }
}

// End of File
