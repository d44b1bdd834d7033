// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::bezier::BezTriple;

/// An animation curve.  Keyframes are Bezier triples with `x` as the frame and `y` as the
/// value, kept sorted by frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FCurve {
    pub path: String,
    pub keyframes: Vec<BezTriple>,
    pub hidden: bool,
    pub locked: bool,
}

impl FCurve {
    pub fn new(path: impl Into<String>, keyframes: Vec<BezTriple>) -> Self {
        Self {
            path: path.into(),
            keyframes,
            hidden: false,
            locked: false,
        }
    }

    /// Stable sort of the keyframes by frame.  Returns the permutation applied: entry `i` is the
    /// old index of the keyframe now at `i`.
    pub fn sort_keyframes(&mut self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.keyframes.len()).collect();
        order.sort_by(|&a, &b| self.keyframes[a].vec[1].x.total_cmp(&self.keyframes[b].vec[1].x));
        let sorted = order.iter().map(|&i| self.keyframes[i]).collect();
        self.keyframes = sorted;
        order
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Animation {
    pub curves: Vec<FCurve>,
}


// End of File
