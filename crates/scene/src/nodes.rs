// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use ultraviolet::Vec2;

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    /// Offset from the parent frame, or the absolute position for top-level nodes.
    pub location: Vec2,
    pub parent: Option<usize>,
    pub selected: bool,
}

impl Node {
    pub fn new(name: impl Into<String>, location: Vec2) -> Self {
        Self {
            name: name.into(),
            location,
            parent: None,
            selected: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeTree {
    pub nodes: Vec<Node>,
}

impl NodeTree {
    /// The position of the parent frame a node's location is relative to.  A parent cycle is
    /// broken at the first repeated node.
    pub fn parent_offset(&self, index: usize) -> Vec2 {
        let mut offset = Vec2::zero();
        let mut cur = self.nodes.get(index).and_then(|n| n.parent);
        let mut steps = 0;
        while let Some(p) = cur {
            if steps > self.nodes.len() {
                break;
            }
            let Some(parent) = self.nodes.get(p) else {
                break;
            };
            offset += parent.location;
            cur = parent.parent;
            steps += 1;
        }
        offset
    }

    pub fn absolute_location(&self, index: usize) -> Option<Vec2> {
        Some(self.nodes.get(index)?.location + self.parent_offset(index))
    }

    /// Whether any ancestor of the node is selected.  Such nodes move with their frame.
    pub fn has_selected_ancestor(&self, index: usize) -> bool {
        let mut cur = self.nodes.get(index).and_then(|n| n.parent);
        let mut steps = 0;
        while let Some(p) = cur {
            if steps > self.nodes.len() {
                return false;
            }
            match self.nodes.get(p) {
                Some(parent) if parent.selected => return true,
                Some(parent) => cur = parent.parent,
                None => return false,
            }
            steps += 1;
        }
        false
    }
}


// End of File
