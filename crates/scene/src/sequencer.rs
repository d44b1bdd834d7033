// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct StripSelect: u8 {
        const STRIP = 1 << 0;
        const LEFT  = 1 << 1;
        const RIGHT = 1 << 2;
    }
}

/// A strip occupying frames `start..end` on one channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Strip {
    pub name: String,
    pub start: i32,
    pub end: i32,
    pub channel: i32,
    pub select: StripSelect,
    pub locked: bool,
}

impl Strip {
    pub fn new(name: impl Into<String>, start: i32, end: i32, channel: i32) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            channel,
            select: StripSelect::empty(),
            locked: false,
        }
    }

    pub fn selected(mut self, select: StripSelect) -> Self {
        self.select = select;
        self
    }

    pub fn len(&self) -> i32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }

    pub fn overlaps(&self, other: &Strip) -> bool {
        self.channel == other.channel && self.start < other.end && other.start < self.end
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sequencer {
    pub strips: Vec<Strip>,
}

// End of File
