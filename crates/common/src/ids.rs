// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use serde::{Deserialize, Serialize};

/// The identifier of an object in a scene.  Identifiers are assigned by the scene when an object
/// is added and are never reused, so a stale `ObjectId` fails to resolve rather than silently
/// aliasing a newer object.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ObjectId(pub u32);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OB{}", self.0)
    }
}

/// Which of the three points of a Bezier triple a record refers to.  The knot is the point the
/// curve passes through; the two handles control the tangent on either side of it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum BezPart {
    Handle1,
    Knot,
    Handle2,
}

impl BezPart {
    pub const ALL: [BezPart; 3] = [BezPart::Handle1, BezPart::Knot, BezPart::Handle2];

    /// The index of this part inside `BezTriple::vec`.
    pub fn index(self) -> usize {
        match self {
            BezPart::Handle1 => 0,
            BezPart::Knot => 1,
            BezPart::Handle2 => 2,
        }
    }
}

// End of File
