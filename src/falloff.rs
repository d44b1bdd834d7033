// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Proportional-editing distances.  Selected records sit at distance zero; every other record
//! gets the distance to the nearest selected one, measured along the topology where the domain
//! has one and in a straight line otherwise.

use crate::settings::DisconnectedFalloff;
use crate::trans_data::{TdFlags, TransData};
use petgraph::algo::dijkstra;
use scene::mesh::{Mesh, VertIndex};
use std::collections::HashMap;

/// Gives every record that no selected record reaches the falloff `policy` asks for, and marks
/// it `NOT_CONNECTED`.
pub fn apply_disconnected_policy(td: &mut TransData, policy: DisconnectedFalloff) {
    td.flags |= TdFlags::NOT_CONNECTED;
    td.falloff_distance = match policy {
        DisconnectedFalloff::Unreachable => f32::MAX,
        DisconnectedFalloff::Distance(d) => d.max(0.0),
    };
}

/// Falloff along a chain of records, such as the points of one spline in order.  Distances
/// spread outward from every selected record in both directions and never decrease away from
/// it: each record is at least as far as its predecessor on the path.  Cyclic chains wrap
/// around.
pub fn calc_distance_curve_verts(
    data: &mut [TransData],
    cyclic: bool,
    policy: DisconnectedFalloff,
) {
    let n = data.len();
    if n == 0 {
        return;
    }
    let laps = if cyclic { 2 } else { 1 };

    // Forward.
    let mut near: Option<usize> = None;
    for step in 0..n * laps {
        let i = step % n;
        if data[i].is_selected() {
            near = Some(i);
            data[i].falloff_distance = 0.0;
            data[i].flags.remove(TdFlags::NOT_CONNECTED);
        } else if let Some(anchor) = near {
            let dist = (data[anchor].center - data[i].center).mag();
            let prev = data[(i + n - 1) % n].falloff_distance;
            data[i].falloff_distance = dist.max(prev);
            data[i].flags.remove(TdFlags::NOT_CONNECTED);
        } else if step < n {
            data[i].falloff_distance = f32::MAX;
            data[i].flags.insert(TdFlags::NOT_CONNECTED);
        }
    }

    // Backward, keeping whichever side is closer.
    near = None;
    for step in 0..n * laps {
        let i = n - 1 - step % n;
        if data[i].is_selected() {
            near = Some(i);
            data[i].falloff_distance = 0.0;
        } else if let Some(anchor) = near {
            let dist = (data[anchor].center - data[i].center).mag();
            let next = data[(i + 1) % n].falloff_distance;
            let candidate = dist.max(next);
            if data[i].flags.contains(TdFlags::NOT_CONNECTED)
                || candidate < data[i].falloff_distance
            {
                data[i].flags.remove(TdFlags::NOT_CONNECTED);
                data[i].falloff_distance = candidate;
            }
        }
    }

    if near.is_none() {
        for td in data.iter_mut() {
            apply_disconnected_policy(td, policy);
        }
    }
}

/// Shortest-path falloff over the edges of a mesh.  `record_of` maps vertices to their
/// records; vertices without a record still carry paths.
pub fn geodesic_falloff(
    mesh: &Mesh,
    data: &mut [TransData],
    record_of: &HashMap<VertIndex, usize>,
    policy: DisconnectedFalloff,
) {
    let mut best = vec![f32::INFINITY; data.len()];
    for (&vert, &index) in record_of {
        if !data[index].is_selected() {
            continue;
        }
        let costs = dijkstra(&mesh.graph, vert, None, |edge| mesh.edge_length(edge));
        for (reached, cost) in costs {
            if let Some(&r) = record_of.get(&reached) {
                best[r] = best[r].min(cost);
            }
        }
    }
    finish(data, &best, policy);
}

/// Straight-line falloff to the nearest selected record.
pub fn euclidean_falloff(data: &mut [TransData], policy: DisconnectedFalloff) {
    let anchors: Vec<_> = data
        .iter()
        .filter(|td| td.is_selected())
        .map(|td| td.center)
        .collect();
    let best: Vec<f32> = data
        .iter()
        .map(|td| {
            anchors
                .iter()
                .map(|a| (*a - td.center).mag())
                .fold(f32::INFINITY, f32::min)
        })
        .collect();
    finish(data, &best, policy);
}

fn finish(data: &mut [TransData], best: &[f32], policy: DisconnectedFalloff) {
    for (td, &dist) in data.iter_mut().zip(best) {
        if td.is_selected() {
            td.falloff_distance = 0.0;
            td.flags.remove(TdFlags::NOT_CONNECTED);
        } else if dist.is_finite() {
            td.falloff_distance = dist;
            td.flags.remove(TdFlags::NOT_CONNECTED);
        } else {
            apply_disconnected_policy(td, policy);
        }
    }
}


// End of File
