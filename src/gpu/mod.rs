//! wgpu backend: device setup, the shared particle buffers and the renderer.

mod buffers;
mod context;
mod renderer;

pub use buffers::{DeviceLostFlag, GpuParticleBuffers};
pub use context::GpuContext;
pub use renderer::{Renderer, RENDER_SOURCE, RENDER_SOURCE_NAME};
