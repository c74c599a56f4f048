//! Uniform block consumed by the particle render shader.
//!
//! Matrices are built row-major in [`crate::math`] and stored column-major in
//! `glam`; `to_cols_array_2d` produces exactly the `mat4x4<f32>` layout WGSL
//! expects, so no further transpose happens on upload.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

use crate::controls::SimulationContext;
use crate::kernel::LIFETIME_MAX;

/// Matches `struct Uniforms` in `render.wgsl` (240 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RenderUniforms {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub point_size: f32,
    pub is_shrinking: u32,
    pub is_texture: u32,
    pub mouse_x: f32,
    pub mouse_y: f32,
    pub _padding0: f32,
    pub viewport: [f32; 2],
    pub lifetime_max: f32,
    pub _padding1: [f32; 3],
}

impl RenderUniforms {
    /// Snapshot the context for one draw.
    ///
    /// `pointer_ndc` is the pointer in normalized device coordinates and
    /// `viewport` the surface size in pixels.
    pub fn from_context(ctx: &SimulationContext, pointer_ndc: Vec2, viewport: Vec2) -> Self {
        Self {
            projection: ctx.projection().matrix().to_cols_array_2d(),
            view: ctx.camera.view_matrix().to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            point_size: ctx.point_size() as f32,
            is_shrinking: ctx.is_shrinking() as u32,
            is_texture: ctx.is_texture() as u32,
            mouse_x: pointer_ndc.x,
            mouse_y: pointer_ndc.y,
            _padding0: 0.0,
            viewport: viewport.to_array(),
            lifetime_max: LIFETIME_MAX,
            _padding1: [0.0; 3],
        }
    }
}
