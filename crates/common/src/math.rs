// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use ultraviolet::{Bivec3, Mat3, Rotor3, Vec2, Vec3};

/// Determinants smaller than this are treated as singular.
pub const PSEUDOINVERSE_EPSILON: f32 = 1e-8;

/// Lifts a 2D point into the z = 0 plane.
#[inline]
pub fn lift(v: Vec2) -> Vec3 {
    Vec3::new(v.x, v.y, 0.0)
}

/// Drops the z component of a point.
#[inline]
pub fn flatten(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.y)
}

#[inline]
pub fn is_finite3(v: Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

#[inline]
pub fn is_finite2(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

/// Reflects a point through the YZ plane.
#[inline]
pub fn mirror_x(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.y, v.z)
}

/// Reflects a rotation through the YZ plane.  Conjugating a rotor by the reflection
/// `x -> -x` negates the two bivector components that contain the x axis.
#[inline]
pub fn mirror_rotor_x(r: Rotor3) -> Rotor3 {
    Rotor3::new(r.s, Bivec3::new(-r.bv.xy, -r.bv.xz, r.bv.yz))
}

/// A diagonal matrix scaling each axis independently.
#[inline]
pub fn scale_matrix(s: Vec3) -> Mat3 {
    Mat3::new(Vec3::unit_x() * s.x, Vec3::unit_y() * s.y, Vec3::unit_z() * s.z)
}

/// Builds an orthonormal basis whose z axis points along `normal`.  Returns `None` when the
/// normal is too short to define a direction, in which case callers fall back to global axes.
pub fn basis_from_normal(normal: Vec3) -> Option<Mat3> {
    if !is_finite3(normal) || normal.mag_sq() < 1e-12 {
        return None;
    }
    let z = normal.normalized();
    let helper = if z.z.abs() < 0.999 {
        Vec3::unit_z()
    } else {
        Vec3::unit_y()
    };
    let x = helper.cross(z).normalized();
    let y = z.cross(x);
    Some(Mat3::new(x, y, z))
}

/// Builds the rest orientation of a bone from its head, tail and roll.  The y axis points from
/// head to tail; the roll spins the x and z axes around it.  Zero-length bones get the identity.
pub fn bone_basis(head: Vec3, tail: Vec3, roll: f32) -> Mat3 {
    let dir = tail - head;
    if !is_finite3(dir) || dir.mag_sq() < 1e-12 {
        return Mat3::identity();
    }
    let y = dir.normalized();
    let helper = if y.z.abs() < 0.999 {
        Vec3::unit_z()
    } else {
        Vec3::unit_x()
    };
    let x0 = y.cross(helper).normalized();
    let z0 = x0.cross(y);
    let (s, c) = roll.sin_cos();
    let x = x0 * c - z0 * s;
    let z = x0 * s + z0 * c;
    Mat3::new(x, y, z)
}

/// Inverts `m`, regularizing singular matrices instead of failing.  Space matrices of flattened
/// objects (a zero scale on one axis) are singular, yet interactive deltas still need to be
/// mapped back through them.
pub fn pseudo_inverse(m: Mat3) -> Mat3 {
    if m.determinant().abs() > PSEUDOINVERSE_EPSILON {
        return m.inversed();
    }
    let eps = PSEUDOINVERSE_EPSILON.sqrt();
    let regularized = Mat3::new(
        m.cols[0] + Vec3::unit_x() * eps,
        m.cols[1] + Vec3::unit_y() * eps,
        m.cols[2] + Vec3::unit_z() * eps,
    );
    if regularized.determinant().abs() > PSEUDOINVERSE_EPSILON {
        regularized.inversed()
    } else {
        Mat3::identity()
    }
}


// End of File
