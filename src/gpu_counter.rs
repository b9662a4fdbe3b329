//! GPU-resident ray counters and their asynchronous readback.
//!
//! [`GpuRayCounter`] owns a small storage buffer with one `u32` per
//! [`RayCountValue`](crate::RayCountValue) category. Ray tracing shaders bind
//! it and bump the slots with `atomicAdd`. Each readback copies the buffer
//! into a `MAP_READ` staging buffer and maps it with `map_async`; the returned
//! [`GpuReadback`] reports completion without ever waiting on the GPU.
//!
//! # Shader side
//!
//! ```wgsl
//! @group(0) @binding(0) var<storage, read_write> ray_counts: array<atomic<u32>, 5>;
//!
//! // in a ray generation / compute shader
//! atomicAdd(&ray_counts[1], 1u); // one shadow ray
//! ```
//!
//! # Staging buffers
//!
//! A staging buffer is taken from a small free list when a readback starts and
//! returned once the readback has been read and unmapped. Readbacks dropped
//! while still in flight take their staging buffer with them.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::category::COUNTER_BUFFER_SIZE;
use crate::config::RayCountConfig;
use crate::error::RayCountError;
use crate::gpu::GpuContext;
use crate::readback::{PendingReadback, ReadbackProducer, ReadbackStatus};

const STATUS_PENDING: u8 = 0;
const STATUS_READY: u8 = 1;
const STATUS_FAILED: u8 = 2;

/// Bounded free list of idle staging buffers, shared with in-flight readbacks.
struct StagingPool<B> {
    idle: Mutex<Vec<B>>,
    capacity: usize,
}

impl<B> StagingPool<B> {
    fn new(capacity: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    // push/pop never leave the list inconsistent, so a poisoned lock stays usable.
    fn lock(&self) -> MutexGuard<'_, Vec<B>> {
        self.idle.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("staging pool lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn take(&self) -> Option<B> {
        self.lock().pop()
    }

    /// Returns `false` when the pool is full and the buffer was dropped.
    fn give(&self, buffer: B) -> bool {
        let mut idle = self.lock();
        if idle.len() < self.capacity {
            idle.push(buffer);
            true
        } else {
            false
        }
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Atomic ray counters living in GPU memory.
pub struct GpuRayCounter {
    gpu: GpuContext,
    counters: wgpu::Buffer,
    staging: Arc<StagingPool<wgpu::Buffer>>,
    label: String,
}

impl GpuRayCounter {
    /// Allocate the counter buffer. Counters start zeroed.
    pub fn new(gpu: &GpuContext, config: &RayCountConfig) -> Self {
        let counters = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&config.label),
            size: COUNTER_BUFFER_SIZE,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            gpu: gpu.clone(),
            counters,
            staging: Arc::new(StagingPool::new(config.staging_pool_size)),
            label: config.label.clone(),
        }
    }

    /// The counter storage buffer, for binding into ray tracing passes.
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.counters
    }

    /// Bind group entry exposing the counters at `binding`.
    pub fn binding(&self, binding: u32) -> wgpu::BindGroupEntry<'_> {
        wgpu::BindGroupEntry {
            binding,
            resource: self.counters.as_entire_binding(),
        }
    }

    /// Matching layout entry for [`binding`](Self::binding).
    pub fn layout_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(COUNTER_BUFFER_SIZE),
            },
            count: None,
        }
    }

    /// Number of idle staging buffers ready for reuse.
    pub fn idle_staging_buffers(&self) -> usize {
        self.staging.len()
    }

    fn take_staging(&self) -> wgpu::Buffer {
        if let Some(buffer) = self.staging.take() {
            return buffer;
        }

        tracing::trace!(label = %self.label, "allocating ray count staging buffer");
        self.gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ray Count Staging"),
            size: COUNTER_BUFFER_SIZE,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}

impl ReadbackProducer for GpuRayCounter {
    type Request = GpuReadback;

    fn clear_counters(&mut self) {
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Ray Count Clear"),
            });
        encoder.clear_buffer(&self.counters, 0, None);
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
    }

    fn request_read(&mut self, byte_count: u64, offset: u64) -> GpuReadback {
        let aligned = byte_count % wgpu::COPY_BUFFER_ALIGNMENT == 0
            && offset % wgpu::COPY_BUFFER_ALIGNMENT == 0;
        let in_bounds = offset
            .checked_add(byte_count)
            .is_some_and(|end| end <= COUNTER_BUFFER_SIZE);
        if byte_count == 0 || !aligned || !in_bounds {
            tracing::warn!(label = %self.label, byte_count, offset, "rejecting out of range readback");
            return GpuReadback::failed(self.gpu.device.clone());
        }

        let staging = self.take_staging();

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Ray Count Readback"),
            });
        encoder.copy_buffer_to_buffer(&self.counters, offset, &staging, 0, byte_count);
        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        let status = Arc::new(AtomicU8::new(STATUS_PENDING));
        let callback_status = status.clone();
        staging
            .slice(0..byte_count)
            .map_async(wgpu::MapMode::Read, move |result| {
                let next = match result {
                    Ok(()) => STATUS_READY,
                    Err(_) => STATUS_FAILED,
                };
                callback_status.store(next, Ordering::Release);
            });

        GpuReadback {
            device: self.gpu.device.clone(),
            staging: Some(staging),
            byte_count,
            status,
            mapped: true,
            pool: Some(self.staging.clone()),
        }
    }
}

/// An in-flight copy of the counter buffer.
pub struct GpuReadback {
    device: wgpu::Device,
    staging: Option<wgpu::Buffer>,
    byte_count: u64,
    status: Arc<AtomicU8>,
    // Cleared once the mapped range has been read and unmapped.
    mapped: bool,
    pool: Option<Arc<StagingPool<wgpu::Buffer>>>,
}

impl GpuReadback {
    fn failed(device: wgpu::Device) -> Self {
        Self {
            device,
            staging: None,
            byte_count: 0,
            status: Arc::new(AtomicU8::new(STATUS_FAILED)),
            mapped: false,
            pool: None,
        }
    }

    fn load_status(&self) -> ReadbackStatus {
        match self.status.load(Ordering::Acquire) {
            STATUS_PENDING => ReadbackStatus::Pending,
            STATUS_READY => ReadbackStatus::Ready,
            _ => ReadbackStatus::Failed,
        }
    }
}

impl PendingReadback for GpuReadback {
    fn status(&self) -> ReadbackStatus {
        let status = self.load_status();
        if status != ReadbackStatus::Pending {
            return status;
        }

        // Map callbacks only fire while the device is polled.
        if let Err(e) = self.device.poll(wgpu::PollType::Poll) {
            tracing::debug!(error = %e, "device poll failed during readback");
        }
        self.load_status()
    }

    fn read(&mut self) -> Result<Vec<u8>, RayCountError> {
        if self.load_status() != ReadbackStatus::Ready || !self.mapped {
            return Err(RayCountError::ReadbackFailed(
                "readback is not mapped".to_string(),
            ));
        }
        let Some(staging) = &self.staging else {
            return Err(RayCountError::ReadbackFailed(
                "readback has no staging buffer".to_string(),
            ));
        };

        let view = staging.slice(0..self.byte_count).get_mapped_range();
        let bytes = view.to_vec();
        drop(view);
        staging.unmap();
        self.mapped = false;

        Ok(bytes)
    }
}

impl Drop for GpuReadback {
    fn drop(&mut self) {
        let Some(staging) = self.staging.take() else {
            return;
        };

        match self.load_status() {
            // Still in flight; the buffer goes away with the handle.
            ReadbackStatus::Pending => return,
            ReadbackStatus::Ready if self.mapped => staging.unmap(),
            _ => {}
        }

        if let Some(pool) = &self.pool {
            pool.give(staging);
        }
    }
}
