// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use ultraviolet::{Mat3, Vec3};

/// One point along a particle's path, stored in hair space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleKey {
    pub co: Vec3,
    pub time: f32,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub keys: Vec<ParticleKey>,
    pub hidden: bool,
    /// Maps hair space to object space: `object = hair_matrix * co + hair_offset`.
    pub hair_matrix: Mat3,
    pub hair_offset: Vec3,
}

impl Particle {
    pub fn new(keys: Vec<ParticleKey>) -> Self {
        Self {
            keys,
            hidden: false,
            hair_matrix: Mat3::identity(),
            hair_offset: Vec3::zero(),
        }
    }
}

/// Editable particle paths.  The simulation caches derived from them are owned elsewhere and
/// are only told when the paths change.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticleSystem {
    pub particles: Vec<Particle>,
    /// Hair roots are attached to the emitter surface.
    pub is_hair: bool,
}

// End of File
