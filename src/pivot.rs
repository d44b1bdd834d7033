// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::session::TransInfo;
use crate::settings::PivotMode;
use crate::trans_data::{TdFlags, TransData};
use common::BoundingBox;
use ultraviolet::{Mat3, Vec3};

/// Records that define the pivot: selected and not skipped.
fn is_eligible(td: &TransData) -> bool {
    td.is_selected() && !td.flags.contains(TdFlags::SKIP)
}

/// Computes the shared pivot of the operation in world space.
pub fn calculate_center(t: &mut TransInfo) {
    t.axis = Mat3::identity();
    let centers: Vec<Vec3> = t
        .containers
        .iter()
        .flat_map(|tc| {
            tc.data()
                .iter()
                .filter(|td| is_eligible(td))
                .map(move |td| tc.to_world(td.center))
        })
        .collect();
    let median = || {
        if centers.is_empty() {
            Vec3::zero()
        } else {
            centers.iter().fold(Vec3::zero(), |acc, c| acc + *c) / centers.len() as f32
        }
    };

    t.center = match t.context.pivot {
        PivotMode::Cursor => t.cursor,
        PivotMode::BoundingBoxCenter => BoundingBox::from_points(centers.iter().copied())
            .center()
            .unwrap_or_else(Vec3::zero),
        PivotMode::MedianPoint | PivotMode::IndividualOrigins => median(),
        PivotMode::ActiveElement => t
            .containers
            .iter()
            .find_map(|tc| {
                let td = tc.data().get(tc.active?)?;
                Some(tc.to_world(td.center))
            })
            .unwrap_or_else(median),
    };

    transform_around_single_fallback(t);
}

/// With exactly one eligible record in the whole operation, pivots around that record: its own
/// center and axes, whatever pivot mode was asked for.  Returns whether the fallback applied.
pub fn transform_around_single_fallback(t: &mut TransInfo) -> bool {
    let mut eligible = t.containers.iter().flat_map(|tc| {
        tc.data()
            .iter()
            .filter(|td| is_eligible(td))
            .map(move |td| (tc, td))
    });
    let (Some((tc, td)), None) = (eligible.next(), eligible.next()) else {
        return false;
    };
    let center = tc.to_world(td.center);
    let axis = tc.matrix * td.axis_matrix;
    log::debug!("Single element: pivoting around {:?}", center);
    t.context.pivot = PivotMode::IndividualOrigins;
    t.center = center;
    t.axis = axis;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{TransContext, TransDomain};
    use crate::settings::{TransformMode, TransformSettings};
    use crate::trans_data::{OwnerRef, TransDataContainer};
    use scene::DataSource;

    fn info(pivot: PivotMode, points: &[(f32, bool)]) -> TransInfo {
        let mut t = TransInfo::new(
            TransContext {
                mode: TransformMode::Rotation,
                pivot,
                settings: TransformSettings::default(),
            },
            Vec3::new(0.0, 0.0, 5.0),
        );
        let mut tc = TransDataContainer::new(DataSource::Cursor3D, TransDomain::Cursor3D);
        for &(x, selected) in points {
            let mut td = TransData::new(OwnerRef::Inert, Vec3::new(x, 0.0, 0.0));
            td.flags.set(TdFlags::SELECTED, selected);
            tc.data.push(td);
        }
        t.containers.push(tc);
        t
    }

    #[test]
    fn bounds_and_median_differ() {
        let mut t = info(PivotMode::BoundingBoxCenter, &[(0.0, true), (1.0, true), (4.0, true)]);
        calculate_center(&mut t);
        assert_eq!(t.center, Vec3::new(2.0, 0.0, 0.0));

        let mut t = info(PivotMode::MedianPoint, &[(0.0, true), (1.0, true), (5.0, true)]);
        calculate_center(&mut t);
        assert_eq!(t.center, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn single_element_wins_for_every_pivot() {
        for pivot in [
            PivotMode::BoundingBoxCenter,
            PivotMode::Cursor,
            PivotMode::IndividualOrigins,
            PivotMode::MedianPoint,
            PivotMode::ActiveElement,
        ] {
            let mut t = info(pivot, &[(3.0, true), (9.0, false)]);
            calculate_center(&mut t);
            assert_eq!(t.center, Vec3::new(3.0, 0.0, 0.0), "{:?}", pivot);
            assert_eq!(t.axis, Mat3::identity());
        }
    }

    #[test]
    fn single_element_axes_follow_the_object_matrix() {
        let mut t = info(PivotMode::MedianPoint, &[(3.0, true)]);
        let matrix = common::math::scale_matrix(Vec3::new(2.0, 1.0, 1.0));
        t.containers[0].matrix = matrix;
        assert!(transform_around_single_fallback(&mut t));
        assert_eq!(t.center, Vec3::new(6.0, 0.0, 0.0));
        assert_eq!(t.axis, matrix);
    }

    #[test]
    fn two_elements_keep_the_cursor() {
        let mut t = info(PivotMode::Cursor, &[(3.0, true), (9.0, true)]);
        calculate_center(&mut t);
        assert_eq!(t.center, Vec3::new(0.0, 0.0, 5.0));
        assert!(!transform_around_single_fallback(&mut t));
    }
}

// End of File
