// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::curve::BPoint;
use ultraviolet::Vec3;

/// A regular grid of control points, `pnts_u * pnts_v * pnts_w` of them, stored u-fastest.
#[derive(Clone, Debug, PartialEq)]
pub struct Lattice {
    pub pnts_u: usize,
    pub pnts_v: usize,
    pub pnts_w: usize,
    pub points: Vec<BPoint>,
    /// Only the points on the outer shell can be edited.
    pub outside_only: bool,
}

impl Default for Lattice {
    fn default() -> Self {
        Self::grid(2, 2, 2, 1.0)
    }
}

impl Lattice {
    /// A grid spanning `[-size / 2, size / 2]` on every axis.
    pub fn grid(pnts_u: usize, pnts_v: usize, pnts_w: usize, size: f32) -> Self {
        let coord = |i: usize, n: usize| {
            if n <= 1 {
                0.0
            } else {
                size * (i as f32 / (n - 1) as f32 - 0.5)
            }
        };
        let mut points = Vec::with_capacity(pnts_u * pnts_v * pnts_w);
        for w in 0..pnts_w {
            for v in 0..pnts_v {
                for u in 0..pnts_u {
                    points.push(BPoint::new(Vec3::new(
                        coord(u, pnts_u),
                        coord(v, pnts_v),
                        coord(w, pnts_w),
                    )));
                }
            }
        }
        Self {
            pnts_u,
            pnts_v,
            pnts_w,
            points,
            outside_only: false,
        }
    }

    /// Whether the point at `index` lies on the outer shell of the grid.
    pub fn is_outside(&self, index: usize) -> bool {
        let u = index % self.pnts_u.max(1);
        let v = (index / self.pnts_u.max(1)) % self.pnts_v.max(1);
        let w = index / (self.pnts_u * self.pnts_v).max(1);
        let edge = |i: usize, n: usize| i == 0 || i + 1 >= n;
        edge(u, self.pnts_u) || edge(v, self.pnts_v) || edge(w, self.pnts_w)
    }
}


// End of File
