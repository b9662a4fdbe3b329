//! The seam between the aggregator and whatever owns the counter storage.
//!
//! A [`ReadbackProducer`] owns the counters (on the GPU for
//! [`GpuRayCounter`](crate::GpuRayCounter)) and hands out
//! [`PendingReadback`] handles for reads that finish some frames later.
//! Producers must complete requests in the order they were issued.

/// Where an in-flight read currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadbackStatus {
    /// Still in flight.
    Pending,
    /// Finished; [`PendingReadback::read`] will return the payload.
    Ready,
    /// The producer gave up on this read.
    Failed,
}

impl ReadbackStatus {
    /// `true` once the request is either ready or failed.
    pub fn is_finished(self) -> bool {
        !matches!(self, ReadbackStatus::Pending)
    }
}

/// Handle to one asynchronous read of the counter storage.
pub trait PendingReadback {
    /// Reports the current state without blocking.
    fn status(&self) -> ReadbackStatus;

    /// Returns the payload of a [`Ready`](ReadbackStatus::Ready) request.
    ///
    /// Only called once, after `status` reported `Ready`.
    fn read(&mut self) -> Result<Vec<u8>, crate::RayCountError>;
}

/// Owner of the counter storage.
pub trait ReadbackProducer {
    type Request: PendingReadback;

    /// Zeroes the counters. Must be ordered before any later `request_read`.
    fn clear_counters(&mut self);

    /// Begins an asynchronous read of `byte_count` bytes starting at `offset`.
    fn request_read(&mut self, byte_count: u64, offset: u64) -> Self::Request;
}
