// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Small shared pieces used by the scene model and the transform conversion layer: identifiers,
//! an axis-aligned bounding box, and a handful of matrix helpers that `ultraviolet` does not
//! provide directly.

mod bounding_box;
pub mod ids;
pub mod math;

pub use bounding_box::BoundingBox;

// End of File
