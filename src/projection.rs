//! Perspective and orthographic projections, fixed at startup.

use glam::Mat4;

use crate::math::mat4_from_rows;

pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 100.0;

/// Half extent of the orthographic view volume in world units.
pub const ORTHO_EXTENT: f32 = 3.0;

/// Which of the two precomputed projections is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

impl ProjectionMode {
    pub fn toggled(self) -> Self {
        match self {
            ProjectionMode::Perspective => ProjectionMode::Orthographic,
            ProjectionMode::Orthographic => ProjectionMode::Perspective,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProjectionMode::Perspective => "Perspective",
            ProjectionMode::Orthographic => "Orthographic",
        }
    }
}

/// OpenGL-style perspective matrix (clip z in `[-w, w]`).
pub fn perspective(fov_degrees: f32, aspect_ratio: f32, near: f32, far: f32) -> Mat4 {
    let tan_half = (fov_degrees.to_radians() / 2.0).tan();
    mat4_from_rows([
        [1.0 / (aspect_ratio * tan_half), 0.0, 0.0, 0.0],
        [0.0, 1.0 / tan_half, 0.0, 0.0],
        [0.0, 0.0, -(far + near) / (far - near), -2.0 * far * near / (far - near)],
        [0.0, 0.0, -1.0, 0.0],
    ])
}

/// Orthographic matrix for a symmetric `[-ORTHO_EXTENT, ORTHO_EXTENT]` box.
pub fn orthographic(near: f32, far: f32) -> Mat4 {
    let (left, right) = (-ORTHO_EXTENT, ORTHO_EXTENT);
    let (bottom, top) = (-ORTHO_EXTENT, ORTHO_EXTENT);
    mat4_from_rows([
        [2.0 / (right - left), 0.0, 0.0, -(right + left) / (right - left)],
        [0.0, 2.0 / (top - bottom), 0.0, -(top + bottom) / (top - bottom)],
        [0.0, 0.0, -2.0 / (far - near), -(far + near) / (far - near)],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Both projection matrices plus the active selection.
#[derive(Debug, Clone)]
pub struct Projection {
    perspective: Mat4,
    orthographic: Mat4,
    mode: ProjectionMode,
}

impl Projection {
    /// Both matrices for a vertical field of view in degrees, with the
    /// default near and far planes.
    pub fn new(fov_degrees: f32, aspect_ratio: f32) -> Self {
        Self {
            perspective: perspective(fov_degrees, aspect_ratio, DEFAULT_NEAR, DEFAULT_FAR),
            orthographic: orthographic(DEFAULT_NEAR, DEFAULT_FAR),
            mode: ProjectionMode::Perspective,
        }
    }

    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ProjectionMode) {
        self.mode = mode;
    }

    /// The matrix for the active mode.
    pub fn matrix(&self) -> Mat4 {
        match self.mode {
            ProjectionMode::Perspective => self.perspective,
            ProjectionMode::Orthographic => self.orthographic,
        }
    }

    pub fn perspective_matrix(&self) -> Mat4 {
        self.perspective
    }

    pub fn orthographic_matrix(&self) -> Mat4 {
        self.orthographic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::mat4_rows;
    use glam::Vec4;

    #[test]
    fn test_projection_is_deterministic() {
        let a = Projection::new(54.0, 1.0);
        let b = Projection::new(54.0, 1.0);
        let bits = |m: Mat4| m.to_cols_array().map(f32::to_bits);
        assert_eq!(bits(a.perspective_matrix()), bits(b.perspective_matrix()));
        assert_eq!(bits(a.orthographic_matrix()), bits(b.orthographic_matrix()));
    }

    #[test]
    fn test_perspective_layout() {
        let m = perspective(90.0, 2.0, 0.1, 100.0);
        let rows = mat4_rows(&m);
        assert!((rows[0][0] - 0.5).abs() < 1e-6);
        assert!((rows[1][1] - 1.0).abs() < 1e-6);
        assert_eq!(rows[3], [0.0, 0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_perspective_maps_planes_to_unit_depth() {
        let m = perspective(54.0, 1.0, 0.1, 100.0);
        let near = m * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = m * Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert!((near.z / near.w + 1.0).abs() < 1e-4);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_orthographic_maps_box_corners() {
        let m = orthographic(0.1, 100.0);
        let p = m * Vec4::new(3.0, -3.0, -0.1, 1.0);
        assert!((p.x - 1.0).abs() < 1e-6);
        assert!((p.y + 1.0).abs() < 1e-6);
        assert!((p.z + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_mode_selects_matrix() {
        let mut projection = Projection::new(54.0, 1.0);
        assert_eq!(projection.matrix(), projection.perspective_matrix());
        projection.set_mode(projection.mode().toggled());
        assert_eq!(projection.mode(), ProjectionMode::Orthographic);
        assert_eq!(projection.matrix(), projection.orthographic_matrix());
    }
}
