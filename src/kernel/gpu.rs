//! wgpu implementation of the kernel.
//!
//! All three entry points live in one WGSL module and share one bind group:
//! the five particle buffers plus the parameter block. Each dispatch records
//! its own command buffer, which first copies that dispatch's parameters into
//! the uniform and then runs the pass, so several dispatches in one submission
//! never see each other's parameters.

use std::sync::Arc;

use wgpu::util::DeviceExt;

use super::{workgroup_count, KernelParams, ParticleKernel, ENTRY_POINTS};
use crate::error::Result;
use crate::gpu::GpuParticleBuffers;
use crate::interop::{ComputeLease, SharedBuffers};
use crate::shader_validate::{require_entry_points, validate_wgsl, ShaderStage};

pub struct GpuKernel {
    device: Arc<wgpu::Device>,
    init_pipeline: wgpu::ComputePipeline,
    update_pipeline: wgpu::ComputePipeline,
    change_color_pipeline: wgpu::ComputePipeline,
    params_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuKernel {
    /// Validate `source` and build the three compute pipelines over `buffers`.
    pub fn new(
        device: Arc<wgpu::Device>,
        buffers: &GpuParticleBuffers,
        source: &str,
        source_name: &str,
    ) -> Result<Self> {
        let module = validate_wgsl(source, source_name, ShaderStage::Kernel)?;
        require_entry_points(&module, &ENTRY_POINTS, source_name, ShaderStage::Kernel)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Kernel Params"),
            size: std::mem::size_of::<KernelParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let storage_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Kernel Bind Group Layout"),
            entries: &[
                storage_entry(0),
                storage_entry(1),
                storage_entry(2),
                storage_entry(3),
                storage_entry(4),
                wgpu::BindGroupLayoutEntry {
                    binding: 5,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Kernel Bind Group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffers.positions.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buffers.colors.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffers.lifetimes.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: buffers.velocities.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: buffers.seeds.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source_name),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Kernel Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = |entry_point: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry_point),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(entry_point),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        let init_pipeline = pipeline("init");
        let update_pipeline = pipeline("update");
        let change_color_pipeline = pipeline("change_color");

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderStage::Kernel.error(source_name, err.to_string()));
        }

        log::debug!("Built kernel pipelines from {source_name}");

        Ok(Self {
            device,
            init_pipeline,
            update_pipeline,
            change_color_pipeline,
            params_buffer,
            bind_group,
        })
    }

    fn dispatch(
        &self,
        lease: &mut ComputeLease<'_, GpuParticleBuffers>,
        pipeline: &wgpu::ComputePipeline,
        params: &KernelParams,
        label: &str,
    ) {
        let staging = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Kernel Params Staging"),
                contents: bytemuck::bytes_of(params),
                usage: wgpu::BufferUsages::COPY_SRC,
            });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        encoder.copy_buffer_to_buffer(
            &staging,
            0,
            &self.params_buffer,
            0,
            std::mem::size_of::<KernelParams>() as u64,
        );

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(label),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.dispatch_workgroups(workgroup_count(lease.buffers().particle_count()), 1, 1);
        }

        lease.enqueue(encoder.finish());
    }
}

impl ParticleKernel for GpuKernel {
    type Buffers = GpuParticleBuffers;

    fn init(&mut self, lease: &mut ComputeLease<'_, GpuParticleBuffers>, params: &KernelParams) {
        self.dispatch(lease, &self.init_pipeline, params, "Kernel init");
    }

    fn update(&mut self, lease: &mut ComputeLease<'_, GpuParticleBuffers>, params: &KernelParams) {
        self.dispatch(lease, &self.update_pipeline, params, "Kernel update");
    }

    fn change_color(
        &mut self,
        lease: &mut ComputeLease<'_, GpuParticleBuffers>,
        params: &KernelParams,
    ) {
        self.dispatch(lease, &self.change_color_pipeline, params, "Kernel change_color");
    }
}
