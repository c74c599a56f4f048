//! The particle simulation kernel.
//!
//! Three entry points operate on the shared particle buffers:
//!
//! - `init`: seed every stream, spawn every particle around the generator
//! - `update`: advance one frame (velocity rule, gravity, integration, decay
//!   and respawn, color)
//! - `change_color`: recolor in place after the profile changed
//!
//! Two implementations exist: [`GpuKernel`] runs the WGSL program in
//! `kernel.wgsl` with one invocation per particle, [`CpuKernel`] is the
//! reference used by tests and benches. Both consume every particle's random
//! stream in the same order:
//!
//! | Step | Draws |
//! |------|-------|
//! | spawn offset | 3 |
//! | spawn velocity | 3 (used or not) |
//! | lifetime | 1 |
//! | color | 3 (used or not) |
//! | Chaos Nova kick, per update | 3 |
//!
//! # Parameter block
//!
//! Scalars reach the kernel through [`KernelParams`], bound at binding 5
//! after the five particle buffers:
//!
//! | Binding | Buffer | Element |
//! |---------|--------|---------|
//! | 0 | position | `vec4<f32>` |
//! | 1 | color | `vec4<f32>` |
//! | 2 | lifetime | `f32` |
//! | 3 | velocity | `vec4<f32>` |
//! | 4 | seed | `vec2<u32>` |
//! | 5 | params | [`KernelParams`] |

pub mod cpu;
pub mod gpu;
pub mod rng;

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use crate::controls::{ColorProfile, GeneratorState, ParticleMode};
use crate::interop::{ComputeLease, SharedBuffers};

pub use cpu::{CpuKernel, CpuParticles};
pub use gpu::GpuKernel;

/// WGSL source of the built-in kernel.
pub const KERNEL_SOURCE: &str = include_str!("kernel.wgsl");
/// Name used in diagnostics for the built-in kernel.
pub const KERNEL_SOURCE_NAME: &str = "kernel.wgsl";
/// Entry points every kernel program must export.
pub const ENTRY_POINTS: [&str; 3] = ["init", "update", "change_color"];

pub const WORKGROUP_SIZE: u32 = 256;

/// Half edge length of the spawn cube, also the spawn ball radius.
pub const SPAWN_EXTENT: f32 = 0.5;
pub const LIFETIME_MIN: f32 = 0.5;
pub const LIFETIME_MAX: f32 = 3.0;
/// Period of the Rainbow Dash hue cycle in seconds of lifetime.
pub const RAINBOW_PERIOD: f32 = 3.0;

pub const FALLING_ACCELERATION: f32 = 1.5;
pub const FOUNTAIN_GRAVITY: f32 = 4.0;
pub const EXPLOSION_DRAG: f32 = 0.9;
pub const NOVA_KICK: f32 = 3.0;
pub const VORTEX_SWIRL: f32 = 1.5;
pub const VORTEX_PULL: f32 = 0.6;
/// Extra downward acceleration when the gravity modifier is on.
pub const GRAVITY_MODIFIER: f32 = 2.5;

/// Scalar parameters of one dispatch, laid out as the WGSL `Params` struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct KernelParams {
    pub generator_position: [f32; 4],
    pub spawn_in_cube: i32,
    pub is_decaying: i32,
    pub is_gravity_on: i32,
    pub particle_mode: i32,
    pub color_profile: i32,
    pub delta_time: f32,
    pub _padding: [u32; 2],
}

impl KernelParams {
    /// Parameters for the one-time `init` dispatch.
    pub fn for_init(generator: &GeneratorState) -> Self {
        Self {
            generator_position: generator.position.to_array(),
            spawn_in_cube: generator.spawn_in_cube as i32,
            is_decaying: 0,
            is_gravity_on: 0,
            particle_mode: generator.particle_mode.id(),
            color_profile: generator.color_profile.id(),
            delta_time: 0.0,
            _padding: [0; 2],
        }
    }

    /// Parameters for one frame of `update`.
    pub fn for_update(
        generator: &GeneratorState,
        is_decaying: bool,
        is_gravity_on: bool,
        delta_time: f32,
    ) -> Self {
        Self {
            is_decaying: is_decaying as i32,
            is_gravity_on: is_gravity_on as i32,
            delta_time,
            ..Self::for_init(generator)
        }
    }

    /// Parameters for `change_color`; only the profile is read.
    pub fn for_change_color(color_profile: ColorProfile) -> Self {
        Self {
            color_profile: color_profile.id(),
            ..Self::zeroed()
        }
    }

    pub fn generator_point(&self) -> Vec3 {
        Vec4::from_array(self.generator_position).truncate()
    }

    pub fn particle_mode(&self) -> ParticleMode {
        ParticleMode::from_id(self.particle_mode)
    }

    pub fn color_profile(&self) -> ColorProfile {
        ColorProfile::from_id(self.color_profile)
    }
}

/// Number of workgroups covering `particle_count` invocations.
pub fn workgroup_count(particle_count: u32) -> u32 {
    particle_count.div_ceil(WORKGROUP_SIZE)
}

/// A kernel implementation. Every entry point records work through a lease,
/// so it can only run while compute owns the buffers.
pub trait ParticleKernel {
    type Buffers: SharedBuffers;

    fn init(&mut self, lease: &mut ComputeLease<'_, Self::Buffers>, params: &KernelParams);

    fn update(&mut self, lease: &mut ComputeLease<'_, Self::Buffers>, params: &KernelParams);

    fn change_color(&mut self, lease: &mut ComputeLease<'_, Self::Buffers>, params: &KernelParams);
}
