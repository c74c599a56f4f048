//! # Particle Interop
//!
//! An interactive particle system whose particles never leave the GPU: a
//! compute kernel advances them and the rasterizer draws them straight from
//! the same buffers.
//!
//! ## Quick Start
//!
//! ```ignore
//! use particle_interop::prelude::*;
//!
//! fn main() -> Result<(), ParticleSystemError> {
//!     ParticleSystem::new(100_000).run()
//! }
//! ```
//!
//! ## Frame Structure
//!
//! Each frame the [`RenderLoop`] applies the input snapshot to the
//! [`SimulationContext`], runs the kernel inside an acquire/release bracket
//! on the [`SharedBufferSet`], and then draws. The bracket is what keeps the
//! two engines apart:
//!
//! ```text
//! acquire_for_compute ─► dispatch ─► release_to_graphics (submit + finish) ─► draw
//! ```
//!
//! ## Particle Modes and Color Profiles
//!
//! | Tab cycles | C cycles |
//! |------------|----------|
//! | Stationary | Confetti |
//! | Falling Down | Monochrome |
//! | Gravity Fountain | Red and White |
//! | Radial Explosion | Cyan Magenta Yellow |
//! | Chaos Nova | Rainbow Dash |
//! | Vortex Attractor | |
//!
//! The [`CpuKernel`] implements the same entry points as the WGSL kernel and
//! is what the tests check behavior against.

mod app;
pub mod camera;
pub mod config;
pub mod controls;
pub mod error;
pub mod gpu;
pub mod input;
pub mod interop;
pub mod kernel;
pub mod math;
pub mod projection;
pub mod render_loop;
pub mod shader_validate;
pub mod textures;
pub mod time;
pub mod uniforms;

pub use bytemuck;
pub use glam::{Mat4, Vec2, Vec3, Vec4};

pub use camera::Camera;
pub use config::{parse_args, CliError, ParticleSystem};
pub use controls::{ColorProfile, GeneratorState, ParticleMode, SimulationContext};
pub use error::{ContextError, InteropError, ParticleSystemError};
pub use interop::{ComputeLease, InteropLedger, Ownership, SharedBufferSet, SharedBuffers};
pub use kernel::{CpuKernel, CpuParticles, GpuKernel, KernelParams, ParticleKernel};
pub use projection::{Projection, ProjectionMode};
pub use render_loop::{apply_input, FrameRenderer, LoopState, RenderLoop};
pub use textures::SpriteTexture;
pub use time::Time;
pub use uniforms::RenderUniforms;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use particle_interop::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::Camera;
    pub use crate::config::ParticleSystem;
    pub use crate::controls::{ColorProfile, ParticleMode, SimulationContext};
    pub use crate::error::ParticleSystemError;
    pub use crate::input::{FrameInput, Input, KeyCode, PointerState};
    pub use crate::interop::{SharedBufferSet, SharedBuffers};
    pub use crate::kernel::{CpuKernel, CpuParticles, KernelParams, ParticleKernel};
    pub use crate::projection::Projection;
    pub use crate::render_loop::{FrameRenderer, RenderLoop};
    pub use crate::textures::SpriteTexture;
    pub use crate::time::Time;
    pub use crate::{Vec2, Vec3, Vec4};
}
