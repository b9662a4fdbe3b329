use std::process::ExitCode;

use raycount::{
    GpuContext, GpuRayCounter, RayCountAggregator, RayCountConfig, RayCountOverlay,
};
use tracing_subscriber::{EnvFilter, fmt};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const FRAMES: u32 = 240;
const REPORT_EVERY: u32 = 60;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameParams {
    frame: u32,
    width: u32,
    height: u32,
    _pad: u32,
}

/// Synthetic ray tracing pass that increments the counters.
struct TracePass {
    pipeline: wgpu::ComputePipeline,
    params: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl TracePass {
    fn new(gpu: &GpuContext, counter: &GpuRayCounter) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Trace Rays Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/trace_rays.wgsl").into()),
        });

        let params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Trace Rays Params"),
            size: std::mem::size_of::<FrameParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Trace Rays Bind Group Layout"),
            entries: &[
                GpuRayCounter::layout_entry(0, wgpu::ShaderStages::COMPUTE),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
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
            label: Some("Trace Rays Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                counter.binding(0),
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Trace Rays Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Trace Rays Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            pipeline,
            params,
            bind_group,
        }
    }

    fn dispatch(&self, gpu: &GpuContext, frame: u32) {
        let params = FrameParams {
            frame,
            width: WIDTH,
            height: HEIGHT,
            _pad: 0,
        };
        gpu.queue
            .write_buffer(&self.params, 0, bytemuck::bytes_of(&params));

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Trace Rays Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Trace Rays Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.dispatch_workgroups(WIDTH.div_ceil(8), HEIGHT.div_ceil(8), 1);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

fn main() -> ExitCode {
    init_logger();

    let gpu = match GpuContext::headless() {
        Ok(gpu) => gpu,
        Err(e) => {
            tracing::error!(error = %e, "could not initialize GPU");
            return ExitCode::FAILURE;
        }
    };

    let config = RayCountConfig::new().label("Demo Ray Counts").max_pending(8);
    let counter = GpuRayCounter::new(&gpu, &config);
    let pass = TracePass::new(&gpu, &counter);
    let mut rays = RayCountAggregator::new(counter, config);

    for frame in 0..FRAMES {
        // toggle counting off for one stretch to exercise the inactive path
        let counting = !(120..150).contains(&frame);

        rays.activate(counting);
        pass.dispatch(&gpu, frame);
        rays.submit_request();

        if frame % REPORT_EVERY == REPORT_EVERY - 1 {
            tracing::info!(frame, pending = rays.pending_len(), "ray count report");
            for line in RayCountOverlay::lines(&mut rays) {
                tracing::info!("  {line}");
            }
        }

        gpu.poll();
    }

    ExitCode::SUCCESS
}
