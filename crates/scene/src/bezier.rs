// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Bezier triples and the handle rules shared by curves, masks, paint curves and animation
//! keyframes.

use common::ids::BezPart;
use ultraviolet::Vec3;

/// How a handle is positioned.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum HandleType {
    /// Positioned freely by the user.
    Free,
    /// Computed from the neighbouring knots.
    #[default]
    Auto,
    /// Points a third of the way toward the neighbouring knot.
    Vector,
    /// Positioned by the user, but kept collinear with the opposite handle.
    Align,
}

bitflags::bitflags! {
    /// Which points of a triple are selected (or, during a flush, which ones moved).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct BezSelect: u8 {
        const HANDLE1 = 1 << 0;
        const KNOT    = 1 << 1;
        const HANDLE2 = 1 << 2;
    }
}

impl BezSelect {
    pub fn from_part(part: BezPart) -> Self {
        match part {
            BezPart::Handle1 => BezSelect::HANDLE1,
            BezPart::Knot => BezSelect::KNOT,
            BezPart::Handle2 => BezSelect::HANDLE2,
        }
    }
}

/// A curve knot with its two handles.  `vec[0]` is the first handle, `vec[1]` the knot and
/// `vec[2]` the second handle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezTriple {
    pub vec: [Vec3; 3],
    pub h1: HandleType,
    pub h2: HandleType,
    pub select: BezSelect,
    pub hidden: bool,
    pub radius: f32,
}

impl BezTriple {
    /// A knot with both handles collapsed onto it.
    pub fn new(knot: Vec3) -> Self {
        Self::with_handles(knot, knot, knot)
    }

    pub fn with_handles(h1: Vec3, knot: Vec3, h2: Vec3) -> Self {
        Self {
            vec: [h1, knot, h2],
            h1: HandleType::Auto,
            h2: HandleType::Auto,
            select: BezSelect::empty(),
            hidden: false,
            radius: 1.0,
        }
    }

    pub fn with_types(mut self, h1: HandleType, h2: HandleType) -> Self {
        self.h1 = h1;
        self.h2 = h2;
        self
    }

    pub fn selected(mut self, select: BezSelect) -> Self {
        self.select = select;
        self
    }

    #[inline]
    pub fn knot(&self) -> Vec3 {
        self.vec[1]
    }

    #[inline]
    pub fn point(&self, part: BezPart) -> Vec3 {
        self.vec[part.index()]
    }

    #[inline]
    pub fn set_point(&mut self, part: BezPart, co: Vec3) {
        self.vec[part.index()] = co;
    }

    /// Re-tests handle types after some of the three points moved independently of the others.
    /// Moving part of a triple demotes automatic handles to aligned ones, and a vector handle
    /// becomes free once it no longer moves together with its knot.
    pub fn test_handles(&mut self, moved: BezSelect) {
        if moved.is_empty() || moved == BezSelect::all() {
            return;
        }
        if self.h1 == HandleType::Auto {
            self.h1 = HandleType::Align;
        }
        if self.h2 == HandleType::Auto {
            self.h2 = HandleType::Align;
        }
        let knot = moved.contains(BezSelect::KNOT);
        if self.h1 == HandleType::Vector && moved.contains(BezSelect::HANDLE1) != knot {
            self.h1 = HandleType::Free;
        }
        if self.h2 == HandleType::Vector && moved.contains(BezSelect::HANDLE2) != knot {
            self.h2 = HandleType::Free;
        }
    }

    /// Keeps aligned handles collinear: the handle that did not move is turned to point away
    /// from the one that did, keeping its own length.
    pub fn align_handles(&mut self, moved: BezSelect) {
        if self.h1 != HandleType::Align || self.h2 != HandleType::Align {
            return;
        }
        let knot = self.vec[1];
        let (leader, follower) = match (
            moved.contains(BezSelect::HANDLE1),
            moved.contains(BezSelect::HANDLE2),
        ) {
            (true, false) => (0, 2),
            (false, true) => (2, 0),
            _ => return,
        };
        let dir = knot - self.vec[leader];
        let len = (self.vec[follower] - knot).mag();
        if dir.mag_sq() > 1e-12 {
            self.vec[follower] = knot + dir.normalized() * len;
        }
    }
}

/// Recomputes automatic and vector handles of the triple at `index` from its neighbours.
/// End points of open curves mirror their only neighbour.
pub fn calc_handles(points: &mut [BezTriple], cyclic: bool, index: usize) {
    let len = points.len();
    if index >= len {
        return;
    }
    let knot = points[index].vec[1];
    let prev = if index > 0 {
        Some(points[index - 1].vec[1])
    } else if cyclic && len > 1 {
        Some(points[len - 1].vec[1])
    } else {
        None
    };
    let next = if index + 1 < len {
        Some(points[index + 1].vec[1])
    } else if cyclic && len > 1 {
        Some(points[0].vec[1])
    } else {
        None
    };
    let (prev, next) = match (prev, next) {
        (Some(p), Some(n)) => (p, n),
        (Some(p), None) => (p, knot * 2.0 - p),
        (None, Some(n)) => (knot * 2.0 - n, n),
        (None, None) => return,
    };

    let bezt = &mut points[index];
    if bezt.h1 == HandleType::Auto || bezt.h2 == HandleType::Auto {
        let dvec_a = knot - prev;
        let dvec_b = next - knot;
        let len_a = nonzero(dvec_a.mag());
        let len_b = nonzero(dvec_b.mag());
        let tangent = dvec_a / len_a + dvec_b / len_b;
        let scale = tangent.mag() * 2.5614;
        if scale != 0.0 {
            if bezt.h1 == HandleType::Auto {
                bezt.vec[0] = knot - tangent * (len_a / scale);
            }
            if bezt.h2 == HandleType::Auto {
                bezt.vec[2] = knot + tangent * (len_b / scale);
            }
        }
    }
    if bezt.h1 == HandleType::Vector {
        bezt.vec[0] = knot + (prev - knot) / 3.0;
    }
    if bezt.h2 == HandleType::Vector {
        bezt.vec[2] = knot + (next - knot) / 3.0;
    }
}

fn nonzero(len: f32) -> f32 {
    if len == 0.0 {
        1.0
    } else {
        len
    }
}

/// Applies the handle rules to every triple marked in `moved`, then refreshes the computed
/// handles of those triples and of their neighbours, whose automatic handles depend on them.
pub fn update_moved_handles(points: &mut [BezTriple], cyclic: bool, moved: &[BezSelect]) {
    let len = points.len().min(moved.len());
    let mut dirty = vec![false; points.len()];
    for i in 0..len {
        if moved[i].is_empty() {
            continue;
        }
        points[i].test_handles(moved[i]);
        points[i].align_handles(moved[i]);
        dirty[i] = true;
        if i > 0 {
            dirty[i - 1] = true;
        } else if cyclic {
            dirty[points.len() - 1] = true;
        }
        if i + 1 < points.len() {
            dirty[i + 1] = true;
        } else if cyclic {
            dirty[0] = true;
        }
    }
    for (i, is_dirty) in dirty.into_iter().enumerate() {
        if is_dirty {
            calc_handles(points, cyclic, i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_one_handle_makes_auto_handles_aligned() {
        let mut bezt = BezTriple::new(Vec3::zero());
        bezt.test_handles(BezSelect::HANDLE1);
        assert_eq!((bezt.h1, bezt.h2), (HandleType::Align, HandleType::Align));
    }

    #[test]
    fn moving_the_whole_triple_keeps_handle_types() {
        let mut bezt =
            BezTriple::new(Vec3::zero()).with_types(HandleType::Vector, HandleType::Auto);
        bezt.test_handles(BezSelect::all());
        assert_eq!((bezt.h1, bezt.h2), (HandleType::Vector, HandleType::Auto));
    }

    #[test]
    fn vector_handle_moved_alone_becomes_free() {
        let mut bezt =
            BezTriple::new(Vec3::zero()).with_types(HandleType::Vector, HandleType::Vector);
        bezt.test_handles(BezSelect::HANDLE2);
        assert_eq!((bezt.h1, bezt.h2), (HandleType::Vector, HandleType::Free));
    }

    #[test]
    fn aligned_follower_keeps_its_length() {
        let mut bezt = BezTriple::with_handles(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::zero(),
            Vec3::new(2.0, 0.0, 0.0),
        )
        .with_types(HandleType::Align, HandleType::Align);
        bezt.align_handles(BezSelect::HANDLE1);
        assert!((bezt.vec[2] - Vec3::new(0.0, -2.0, 0.0)).mag() < 1e-6);
    }

    #[test]
    fn vector_handles_point_at_neighbours() {
        let mut points = vec![
            BezTriple::new(Vec3::zero()),
            BezTriple::new(Vec3::new(3.0, 0.0, 0.0))
                .with_types(HandleType::Vector, HandleType::Vector),
            BezTriple::new(Vec3::new(3.0, 3.0, 0.0)),
        ];
        calc_handles(&mut points, false, 1);
        assert!((points[1].vec[0] - Vec3::new(2.0, 0.0, 0.0)).mag() < 1e-6);
        assert!((points[1].vec[2] - Vec3::new(3.0, 1.0, 0.0)).mag() < 1e-6);
    }
}

// End of File
