// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::bezier::BezTriple;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskPoint {
    pub bezt: BezTriple,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaskSpline {
    pub points: Vec<MaskPoint>,
    pub cyclic: bool,
}

impl MaskSpline {
    pub fn new(points: Vec<MaskPoint>) -> Self {
        Self {
            points,
            cyclic: true,
        }
    }
}

/// A mask: closed Bezier outlines in normalized 2D space (z unused).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mask {
    pub splines: Vec<MaskSpline>,
}

// End of File
