// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::bezier::BezTriple;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaintCurvePoint {
    pub bezt: BezTriple,
}

/// A stroke path in screen space (z unused).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaintCurve {
    pub points: Vec<PaintCurvePoint>,
}

// End of File
