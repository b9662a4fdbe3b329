//! Core GPU context and device management.
//!
//! This module provides [`GpuContext`], which holds the wgpu device and queue
//! that the ray counter buffers and readbacks are created on.
//!
//! # Initialization
//!
//! A renderer that already owns a device can wrap it with
//! [`GpuContext::from_parts`]. Tools and tests without a window use
//! [`GpuContext::headless`], which handles instance creation, adapter
//! selection, and device/queue creation.
//!
//! # Example
//!
//! ```no_run
//! use raycount::GpuContext;
//!
//! let gpu = GpuContext::headless().expect("no GPU available");
//!
//! let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
//!     label: Some("My Buffer"),
//!     size: 1024,
//!     usage: wgpu::BufferUsages::STORAGE,
//!     mapped_at_creation: false,
//! });
//! ```

use crate::error::RayCountError;

/// Core GPU context holding the wgpu device and queue.
///
/// Both fields are public to allow direct access to wgpu APIs when needed.
/// wgpu devices and queues are reference counted, so cloning the context is
/// cheap and every clone talks to the same device.
#[derive(Clone, Debug)]
pub struct GpuContext {
    /// The logical GPU device for creating resources and pipelines.
    pub device: wgpu::Device,
    /// The command queue for submitting work to the GPU.
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Create a GPU context without a presentation surface.
    ///
    /// This performs all wgpu initialization:
    /// 1. Creates a wgpu instance with primary backends (Vulkan, Metal, DX12)
    /// 2. Requests a suitable GPU adapter
    /// 3. Creates the logical device and command queue
    pub fn headless() -> Result<Self, RayCountError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;

        let info = adapter.get_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, "GPU adapter selected");

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Ray Count Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))?;

        Ok(Self { device, queue })
    }

    /// Wrap a device and queue owned by an existing renderer.
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    /// Process finished GPU work without waiting.
    ///
    /// This is what fires `map_async` callbacks on native backends.
    pub fn poll(&self) {
        if let Err(e) = self.device.poll(wgpu::PollType::Poll) {
            tracing::warn!(error = %e, "device poll failed");
        }
    }
}
