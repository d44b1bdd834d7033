// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Motion tracking tracks.  All marker coordinates are in normalized clip space; pattern
//! corners and the search area are relative to the marker position.

use ultraviolet::Vec2;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TrackSelect: u8 {
        const MARKER  = 1 << 0;
        const PATTERN = 1 << 1;
        const SEARCH  = 1 << 2;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    pub frame: i32,
    pub pos: Vec2,
    pub pattern_corners: [Vec2; 4],
    pub search_min: Vec2,
    pub search_max: Vec2,
    pub disabled: bool,
}

impl Marker {
    pub fn new(frame: i32, pos: Vec2) -> Self {
        let p = 0.02;
        let s = 0.05;
        Self {
            frame,
            pos,
            pattern_corners: [
                Vec2::new(-p, -p),
                Vec2::new(p, -p),
                Vec2::new(p, p),
                Vec2::new(-p, p),
            ],
            search_min: Vec2::new(-s, -s),
            search_max: Vec2::new(s, s),
            disabled: false,
        }
    }

    /// The bounding box of the pattern corners, relative to the marker position.
    pub fn pattern_bounds(&self) -> (Vec2, Vec2) {
        let mut min = self.pattern_corners[0];
        let mut max = self.pattern_corners[0];
        for c in &self.pattern_corners[1..] {
            min = min.min_by_component(*c);
            max = max.max_by_component(*c);
        }
        (min, max)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub name: String,
    pub markers: Vec<Marker>,
    pub select: TrackSelect,
    pub hidden: bool,
    pub locked: bool,
}

impl Track {
    pub fn new(name: impl Into<String>, markers: Vec<Marker>) -> Self {
        Self {
            name: name.into(),
            markers,
            select: TrackSelect::empty(),
            hidden: false,
            locked: false,
        }
    }

    /// The marker in effect at `frame`: the exact one if present, else the latest one before.
    pub fn marker_at(&self, frame: i32) -> Option<usize> {
        self.markers
            .iter()
            .enumerate()
            .filter(|(_, m)| m.frame <= frame)
            .max_by_key(|(_, m)| m.frame)
            .map(|(i, _)| i)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tracking {
    pub tracks: Vec<Track>,
    /// Clip size in pixels, used for aspect correction.
    pub clip_size: [u32; 2],
}

// End of File
