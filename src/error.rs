//! Error type shared by the GPU setup paths and snapshot decoding.
//!
//! Failed readbacks never reach callers of
//! [`RayCountAggregator::query`](crate::RayCountAggregator::query); they are
//! absorbed during the drain. These errors only surface from fallible setup
//! calls such as [`GpuContext::headless`](crate::GpuContext::headless) and
//! from explicit decoding via [`CounterSnapshot::from_bytes`](crate::CounterSnapshot::from_bytes).

/// Errors produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum RayCountError {
    /// No GPU adapter satisfied the request.
    #[error("no suitable GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    /// The adapter refused to create a device.
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    /// The producer could not complete a read.
    #[error("readback failed: {0}")]
    ReadbackFailed(String),
    /// A readback payload did not match the counter buffer layout.
    #[error("snapshot payload is {actual} bytes, expected {expected}")]
    SnapshotSize { expected: usize, actual: usize },
}
