//! Free-flying camera driven by yaw/pitch edits.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::math::{
    compose, cross, direction_from_yaw_pitch, inverse, normalize, rotation_from_axes, translation,
    WORLD_UP,
};

/// Pitch limits in degrees; the camera never looks straight up or down.
pub const PITCH_LIMIT: f32 = 89.0;

/// Local basis of the camera.
///
/// `front` points from the look target back to the eye (the negative look
/// direction), so the basis is right-handed with the camera looking down `-front`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraAxes {
    pub right: Vec3,
    pub up: Vec3,
    pub front: Vec3,
}

/// Camera state: a position plus yaw/pitch in degrees.
///
/// Everything else (look direction, local axes, matrices) is derived on
/// demand so there is no stored basis that could drift.
#[derive(Debug, Clone)]
pub struct Camera {
    /// World-space eye position. Moved directly by held-key input.
    pub position: Vec3,
    yaw: f32,
    pitch: f32,
}

impl Camera {
    /// Camera at (0, 0, 5) looking down -Z.
    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            yaw: -90.0,
            pitch: 0.0,
        }
    }

    /// Horizontal angle in degrees.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Vertical angle in degrees, always within `[-89, 89]`.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Add yaw/pitch deltas (degrees), clamping pitch at the poles.
    pub fn apply_orientation_delta(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch = (self.pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Unit look direction.
    pub fn front(&self) -> Vec3 {
        direction_from_yaw_pitch(self.yaw, self.pitch)
    }

    /// Local right/up/front axes for the current orientation.
    pub fn axes(&self) -> CameraAxes {
        let target = self.position + self.front();
        let front = normalize(self.position - target);
        let right = normalize(cross(WORLD_UP, front));
        let up = cross(front, right);
        CameraAxes { right, up, front }
    }

    /// Rotation-only block of the view transform.
    pub fn rotation_matrix(&self) -> Mat4 {
        let axes = self.axes();
        rotation_from_axes(axes.right, axes.up, axes.front)
    }

    /// World-to-camera transform: translate by `-position`, then rotate.
    pub fn view_matrix(&self) -> Mat4 {
        compose(self.rotation_matrix(), translation(-self.position))
    }

    /// Move the eye by a world-space offset.
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// World-space point under the pointer at `distance` from the eye.
    ///
    /// `ndc` is the pointer in normalized device coordinates. The camera-space
    /// ray `(x / 2, y / 2, -1)` is rotated back into world space.
    pub fn unproject(&self, ndc: Vec2, distance: f32) -> Vec3 {
        let camera_space = Vec4::new(ndc.x / 2.0, ndc.y / 2.0, -1.0, 1.0);
        let world = inverse(self.rotation_matrix()) * camera_space;
        let ray = normalize(world.truncate());
        self.position + ray * distance
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
