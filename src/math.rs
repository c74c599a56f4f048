//! Vector and matrix helpers used by the camera and the renderer.
//!
//! Matrices are written down row-major (the way they appear on paper) with
//! [`mat4_from_rows`] and stored column-major by `glam`. Uploading a matrix with
//! [`Mat4::to_cols_array_2d`] is therefore the transpose-on-upload step: the
//! shader sees the same matrix that was written here, multiplied as `M * v`.

use glam::{Mat4, Vec3, Vec4};

/// World up axis used to build the camera basis.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Unit vector in the direction of `v`.
///
/// A zero vector stays zero instead of turning into NaNs.
#[inline]
pub fn normalize(v: Vec3) -> Vec3 {
    let len = v.length();
    if len > 0.0 {
        v / len
    } else {
        Vec3::ZERO
    }
}

#[inline]
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    a.cross(b)
}

#[inline]
pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a.dot(b)
}

/// Spherical-to-Cartesian conversion of a yaw/pitch pair given in degrees.
///
/// Yaw rotates around the world Y axis starting at +X, pitch lifts the
/// direction towards +Y. The result is normalized.
pub fn direction_from_yaw_pitch(yaw_degrees: f32, pitch_degrees: f32) -> Vec3 {
    let yaw = yaw_degrees.to_radians();
    let pitch = pitch_degrees.to_radians();
    normalize(Vec3::new(
        yaw.cos() * pitch.cos(),
        pitch.sin(),
        yaw.sin() * pitch.cos(),
    ))
}

/// Build a matrix from row-major data.
pub fn mat4_from_rows(rows: [[f32; 4]; 4]) -> Mat4 {
    Mat4::from_cols_array_2d(&rows).transpose()
}

/// Row-major view of a matrix, the inverse of [`mat4_from_rows`].
pub fn mat4_rows(m: &Mat4) -> [[f32; 4]; 4] {
    m.transpose().to_cols_array_2d()
}

/// Homogeneous translation by `offset`.
pub fn translation(offset: Vec3) -> Mat4 {
    mat4_from_rows([
        [1.0, 0.0, 0.0, offset.x],
        [0.0, 1.0, 0.0, offset.y],
        [0.0, 0.0, 1.0, offset.z],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Rotation block whose rows are the given basis vectors.
///
/// Multiplying a world-space direction by this matrix expresses it in the
/// basis `(right, up, front)`.
pub fn rotation_from_axes(right: Vec3, up: Vec3, front: Vec3) -> Mat4 {
    mat4_from_rows([
        [right.x, right.y, right.z, 0.0],
        [up.x, up.y, up.z, 0.0],
        [front.x, front.y, front.z, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Matrix product `a * b` (apply `b` first).
#[inline]
pub fn compose(a: Mat4, b: Mat4) -> Mat4 {
    a * b
}

#[inline]
pub fn inverse(m: Mat4) -> Mat4 {
    m.inverse()
}

/// Transform a homogeneous point or direction.
#[inline]
pub fn transform(m: Mat4, v: Vec4) -> Vec4 {
    m * v
}
