// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::bezier::BezTriple;
use ultraviolet::Vec3;

/// A non-Bezier control point (poly and NURBS splines).  `weight` is the NURBS weight and is
/// not touched by transforms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BPoint {
    pub co: Vec3,
    pub weight: f32,
    pub selected: bool,
    pub hidden: bool,
}

impl BPoint {
    pub fn new(co: Vec3) -> Self {
        Self {
            co,
            weight: 1.0,
            selected: false,
            hidden: false,
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SplineKind {
    Bezier(Vec<BezTriple>),
    Poly(Vec<BPoint>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Spline {
    pub kind: SplineKind,
    pub cyclic: bool,
    pub hidden: bool,
}

impl Spline {
    pub fn bezier(points: Vec<BezTriple>) -> Self {
        Self {
            kind: SplineKind::Bezier(points),
            cyclic: false,
            hidden: false,
        }
    }

    pub fn poly(points: Vec<BPoint>) -> Self {
        Self {
            kind: SplineKind::Poly(points),
            cyclic: false,
            hidden: false,
        }
    }

    pub fn cyclic(mut self, cyclic: bool) -> Self {
        self.cyclic = cyclic;
        self
    }

    pub fn len(&self) -> usize {
        match &self.kind {
            SplineKind::Bezier(points) => points.len(),
            SplineKind::Poly(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Curve {
    pub splines: Vec<Spline>,
}

impl Curve {
    pub fn new(splines: Vec<Spline>) -> Self {
        Self { splines }
    }

    pub fn bezier_point(&self, spline: usize, point: usize) -> Option<&BezTriple> {
        match &self.splines.get(spline)?.kind {
            SplineKind::Bezier(points) => points.get(point),
            SplineKind::Poly(_) => None,
        }
    }

    pub fn poly_point(&self, spline: usize, point: usize) -> Option<&BPoint> {
        match &self.splines.get(spline)?.kind {
            SplineKind::Poly(points) => points.get(point),
            SplineKind::Bezier(_) => None,
        }
    }
}

// End of File
