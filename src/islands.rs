// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Connected groups of selected records, each with its own pivot and axes for individual-origin
//! transforms.

use crate::settings::PivotMode;
use crate::trans_data::TransData;
use common::math::basis_from_normal;
use petgraph::unionfind::UnionFind;
use ultraviolet::{Mat3, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IslandData {
    pub center: Vec3,
    pub basis: Mat3,
}

/// Partitions the selected records into islands and labels each selected record with its
/// island.  `links` are pairs of record indices the domain considers adjacent; links touching
/// an unselected record are ignored.  `normals` holds one (possibly zero) normal per record.
///
/// Island labels are dense and follow record order.
pub fn build_islands(
    data: &mut [TransData],
    links: impl IntoIterator<Item = (usize, usize)>,
    normals: &[Vec3],
    active: Option<usize>,
    pivot: PivotMode,
) -> Vec<IslandData> {
    let mut union_find = UnionFind::<usize>::new(data.len());
    for (a, b) in links {
        if a < data.len() && b < data.len() && data[a].is_selected() && data[b].is_selected() {
            union_find.union(a, b);
        }
    }

    let mut label_of_root = std::collections::HashMap::new();
    let mut sums: Vec<(Vec3, Vec3, usize)> = Vec::new();
    for (i, td) in data.iter_mut().enumerate() {
        if !td.is_selected() {
            td.island = None;
            continue;
        }
        let root = union_find.find_mut(i);
        let next = label_of_root.len();
        let label = *label_of_root.entry(root).or_insert(next);
        if label == sums.len() {
            sums.push((Vec3::zero(), Vec3::zero(), 0));
        }
        let normal = normals.get(i).copied().unwrap_or_else(Vec3::zero);
        let (sum, normal_sum, count) = &mut sums[label];
        *sum += td.original_location();
        *normal_sum += normal;
        *count += 1;
        td.island = Some(label);
    }

    let mut islands: Vec<IslandData> = sums
        .into_iter()
        .map(|(sum, normal_sum, count)| IslandData {
            center: sum / count.max(1) as f32,
            basis: basis_from_normal(normal_sum).unwrap_or_else(Mat3::identity),
        })
        .collect();

    if pivot == PivotMode::ActiveElement {
        if let Some(td) = active.and_then(|a| data.get(a)) {
            if let Some(island) = td.island.and_then(|i| islands.get_mut(i)) {
                island.center = td.original_location();
            }
        }
    }
    log::debug!("Built {} islands over {} records", islands.len(), data.len());
    islands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trans_data::{OwnerRef, TdFlags};

    fn selected(x: f32) -> TransData {
        TransData::new(OwnerRef::Inert, Vec3::new(x, 0.0, 0.0)).with_flags(TdFlags::SELECTED)
    }

    #[test]
    fn islands_split_on_missing_links() {
        let mut data = vec![selected(0.0), selected(2.0), selected(10.0)];
        let islands = build_islands(&mut data, [(0, 1)], &[], None, PivotMode::MedianPoint);
        assert_eq!(islands.len(), 2);
        assert_eq!(islands[0].center, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(islands[0].basis, Mat3::identity());
        assert_eq!(data[2].island, Some(1));
    }

    #[test]
    fn active_element_overrides_center() {
        let mut data = vec![selected(0.0), selected(2.0)];
        let islands = build_islands(&mut data, [(0, 1)], &[], Some(1), PivotMode::ActiveElement);
        assert_eq!(islands[0].center, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn unselected_records_have_no_island() {
        let mut data = vec![selected(0.0), TransData::new(OwnerRef::Inert, Vec3::zero())];
        let islands = build_islands(&mut data, [(0, 1)], &[], None, PivotMode::MedianPoint);
        assert_eq!(islands.len(), 1);
        assert_eq!(data[1].island, None);
    }

    #[test]
    fn normals_orient_the_basis() {
        let mut data = vec![selected(0.0), selected(1.0)];
        let normals = [Vec3::unit_x(), Vec3::unit_x()];
        let islands = build_islands(&mut data, [(0, 1)], &normals, None, PivotMode::MedianPoint);
        assert!((islands[0].basis.cols[2] - Vec3::unit_x()).mag() < 1e-6);
    }
}

// End of File
