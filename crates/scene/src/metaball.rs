// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use ultraviolet::{Rotor3, Vec3};

/// One primitive of a metaball object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetaElem {
    pub co: Vec3,
    pub rot: Rotor3,
    /// Per-axis extent for the non-spherical primitive types.
    pub size: Vec3,
    pub radius: f32,
    pub stiffness: f32,
    /// Scaling the element scales `radius` along with `size`.
    pub scale_radius: bool,
    pub selected: bool,
    pub hidden: bool,
}

impl MetaElem {
    pub fn new(co: Vec3) -> Self {
        Self {
            co,
            rot: Rotor3::identity(),
            size: Vec3::one(),
            radius: 2.0,
            stiffness: 2.0,
            scale_radius: true,
            selected: false,
            hidden: false,
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetaBall {
    pub elems: Vec<MetaElem>,
    pub active: Option<usize>,
}

// End of File
