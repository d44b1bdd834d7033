// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use ultraviolet::Vec3;

/// An axis-aligned bounding box defined by two opposite corners (`min` and `max`).
/// `min.x <= max.x`, `min.y <= max.y`, `min.z <= max.z` once at least one point is enclosed.
#[derive(Copy, Clone, Debug)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    /// An empty box: it encloses nothing, and enclosing any point makes it exactly that point.
    fn default() -> Self {
        Self {
            min: Vec3::broadcast(f32::INFINITY),
            max: Vec3::broadcast(f32::NEG_INFINITY),
        }
    }
}

impl BoundingBox {
    /// Returns the smallest `BoundingBox` containing every point yielded by `points`.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut bounds = Self::default();
        for point in points {
            bounds.enclose_point(point);
        }
        bounds
    }

    /// Returns true if no point has been enclosed yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Returns the smallest `BoundingBox` that would contain both `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Vec3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Vec3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Returns true if the provided `point` is inside this `BoundingBox`.
    /// Otherwise returns false.
    pub fn contains(&self, point: Vec3) -> bool {
        self.min.x <= point.x
            && point.x <= self.max.x
            && self.min.y <= point.y
            && point.y <= self.max.y
            && self.min.z <= point.z
            && point.z <= self.max.z
    }

    /// Grows this `BoundingBox` in-place to ensure that it will contain a given `point`.
    pub fn enclose_point(&mut self, point: Vec3) {
        self.min.x = f32::min(self.min.x, point.x);
        self.min.y = f32::min(self.min.y, point.y);
        self.min.z = f32::min(self.min.z, point.z);

        self.max.x = f32::max(self.max.x, point.x);
        self.max.y = f32::max(self.max.y, point.y);
        self.max.z = f32::max(self.max.z, point.z);
    }

    /// The midpoint between the two corners, or `None` for an empty box.
    pub fn center(&self) -> Option<Vec3> {
        if self.is_empty() {
            None
        } else {
            Some((self.min + self.max) * 0.5)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_has_no_center() {
        let bounds = BoundingBox::default();
        assert!(bounds.is_empty());
        assert_eq!(bounds.center(), None);
    }

    #[test]
    fn center_of_enclosed_points() {
        let bounds = BoundingBox::from_points([
            Vec3::new(-1.0, 0.0, 2.0),
            Vec3::new(3.0, 4.0, 2.0),
            Vec3::new(1.0, 1.0, 2.0),
        ]);
        assert_eq!(bounds.center(), Some(Vec3::new(1.0, 2.0, 2.0)));
        assert!(bounds.contains(Vec3::new(0.0, 3.0, 2.0)));
        assert!(!bounds.contains(Vec3::new(0.0, 3.0, 2.5)));
    }
}

// End of File
