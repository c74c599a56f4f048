//! Error types.
//!
//! Every error here is fatal: it is reported once at the top of `main` with a
//! category and terminates the process. Nothing is retried.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while creating the window, the GPU context or the device.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a Vulkan, Metal, DX12 or GL capable device is required")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reports no usable format or present mode.
    #[error("surface is not supported by the selected adapter")]
    UnsupportedSurface,
    /// The surface failed in a way reconfiguring cannot fix.
    #[error("surface error: {0}")]
    Surface(wgpu::SurfaceError),
}

/// Violations of the compute/graphics ownership protocol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InteropError {
    /// `acquire_for_compute` while the set is already compute-owned.
    #[error("shared buffers are already owned by compute; a previous lease was never released")]
    AlreadyAcquired,
    /// Graphics access requested while compute still owns the buffers.
    #[error("shared buffers are still owned by compute; release them before drawing")]
    ComputeOwned,
    /// The device failed to complete submitted compute work.
    #[error("device could not synchronize compute work: {0}")]
    Synchronization(String),
}

/// Top-level error of the particle system.
#[derive(Debug, Error)]
pub enum ParticleSystemError {
    #[error(transparent)]
    ContextInit(#[from] ContextError),

    #[error("error compiling {source_name}\n{diagnostic}")]
    KernelCompile {
        source_name: String,
        diagnostic: String,
    },

    #[error("error building {source_name}\n{diagnostic}")]
    ShaderBuild {
        source_name: String,
        diagnostic: String,
    },

    #[error("cannot read {}: {source}", .path.display())]
    ResourceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode texture {}: {source}", .path.display())]
    TextureDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Interop(#[from] InteropError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ParticleSystemError {
    /// Human-readable category used when reporting the error.
    pub fn category(&self) -> &'static str {
        match self {
            ParticleSystemError::ContextInit(_) => "Context initialization error",
            ParticleSystemError::KernelCompile { .. } => "Kernel compile error",
            ParticleSystemError::ShaderBuild { .. } => "Shader build error",
            ParticleSystemError::ResourceIo { .. } | ParticleSystemError::TextureDecode { .. } => {
                "I/O error"
            }
            ParticleSystemError::Interop(_) => "Interop error",
            ParticleSystemError::InvalidConfig(_) => "Configuration error",
        }
    }
}

impl From<winit::error::EventLoopError> for ParticleSystemError {
    fn from(e: winit::error::EventLoopError) -> Self {
        ParticleSystemError::ContextInit(ContextError::EventLoop(e))
    }
}

impl From<winit::error::OsError> for ParticleSystemError {
    fn from(e: winit::error::OsError) -> Self {
        ParticleSystemError::ContextInit(ContextError::Window(e))
    }
}

pub type Result<T, E = ParticleSystemError> = std::result::Result<T, E>;
