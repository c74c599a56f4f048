//! Particle buffers shared by the compute kernel and the rasterizer.

use std::sync::{Arc, Mutex};

use crate::error::InteropError;
use crate::kernel::WORKGROUP_SIZE;
use crate::interop::SharedBuffers;

/// Description of the device loss reported by wgpu, if any.
pub type DeviceLostFlag = Arc<Mutex<Option<String>>>;

/// The five per-particle buffers, all `N` elements long.
///
/// Position, color and lifetime are also bound as instance vertex buffers;
/// velocity and seed are only visible to the kernel.
pub struct GpuParticleBuffers {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    device_lost: DeviceLostFlag,
    last_submission: Option<wgpu::SubmissionIndex>,
    count: u32,
    pub positions: wgpu::Buffer,
    pub colors: wgpu::Buffer,
    pub lifetimes: wgpu::Buffer,
    pub velocities: wgpu::Buffer,
    pub seeds: wgpu::Buffer,
}

impl GpuParticleBuffers {
    pub const POSITION_STRIDE: u64 = 16;
    pub const COLOR_STRIDE: u64 = 16;
    pub const LIFETIME_STRIDE: u64 = 4;
    pub const VELOCITY_STRIDE: u64 = 16;
    pub const SEED_STRIDE: u64 = 8;

    /// Largest particle count a device with `limits` can hold and dispatch:
    /// one workgroup row of `WORKGROUP_SIZE` invocations, and every buffer
    /// bindable as a whole.
    pub fn max_particles(limits: &wgpu::Limits) -> u32 {
        let largest_stride = Self::POSITION_STRIDE
            .max(Self::COLOR_STRIDE)
            .max(Self::VELOCITY_STRIDE)
            .max(Self::SEED_STRIDE);
        let by_dispatch =
            u64::from(limits.max_compute_workgroups_per_dimension) * u64::from(WORKGROUP_SIZE);
        let by_binding = u64::from(limits.max_storage_buffer_binding_size) / largest_stride;
        let by_buffer = limits.max_buffer_size / largest_stride;
        by_dispatch
            .min(by_binding)
            .min(by_buffer)
            .min(u64::from(u32::MAX)) as u32
    }

    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        device_lost: DeviceLostFlag,
        count: u32,
    ) -> Self {
        let shared = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::VERTEX;
        let compute_only = wgpu::BufferUsages::STORAGE;
        let n = count as u64;

        let create = |label: &str, stride: u64, usage: wgpu::BufferUsages| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: stride * n,
                usage,
                mapped_at_creation: false,
            })
        };

        let positions = create("Position Buffer", Self::POSITION_STRIDE, shared);
        let colors = create("Color Buffer", Self::COLOR_STRIDE, shared);
        let lifetimes = create("Lifetime Buffer", Self::LIFETIME_STRIDE, shared);
        let velocities = create("Velocity Buffer", Self::VELOCITY_STRIDE, compute_only);
        let seeds = create("Seed Buffer", Self::SEED_STRIDE, compute_only);

        log::debug!(
            "Allocated {} bytes of particle storage for {count} particles",
            n * (Self::POSITION_STRIDE
                + Self::COLOR_STRIDE
                + Self::LIFETIME_STRIDE
                + Self::VELOCITY_STRIDE
                + Self::SEED_STRIDE)
        );

        Self {
            device,
            queue,
            device_lost,
            last_submission: None,
            count,
            positions,
            colors,
            lifetimes,
            velocities,
            seeds,
        }
    }

    fn check_device(&self) -> Result<(), InteropError> {
        let lost = self
            .device_lost
            .lock()
            .map_err(|_| InteropError::Synchronization("device-lost flag poisoned".into()))?;
        match lost.as_ref() {
            Some(reason) => Err(InteropError::Synchronization(format!("device lost: {reason}"))),
            None => Ok(()),
        }
    }
}

impl SharedBuffers for GpuParticleBuffers {
    type Work = wgpu::CommandBuffer;

    fn particle_count(&self) -> u32 {
        self.count
    }

    fn submit(&mut self, work: Vec<wgpu::CommandBuffer>) -> Result<(), InteropError> {
        self.check_device()?;
        self.last_submission = Some(self.queue.submit(work));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), InteropError> {
        let maintain = match self.last_submission.take() {
            Some(index) => wgpu::Maintain::wait_for(index),
            None => wgpu::Maintain::Wait,
        };
        let _ = self.device.poll(maintain);
        self.check_device()
    }
}
