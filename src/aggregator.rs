//! Cross-frame aggregation of asynchronous ray count readbacks.
//!
//! [`RayCountAggregator`] issues one readback per frame against a
//! [`ReadbackProducer`], queues the pending handles in submission order, and
//! lazily folds finished readbacks into a cached [`CounterSnapshot`] whenever
//! the overlay asks for a value. It never blocks on the GPU: a query only
//! consumes readbacks that already finished, so the overlay shows values a
//! few frames old.
//!
//! # Frame order
//!
//! ```text
//! activate(enabled)  -> clears the counters for this frame when enabled
//! <ray tracing passes increment the counters>
//! submit_request()   -> queues a readback of this frame's counters
//! query(value)*      -> drains finished readbacks, returns the last known value
//! ```
//!
//! # Example
//!
//! ```no_run
//! use raycount::{GpuContext, GpuRayCounter, RayCountAggregator, RayCountConfig, RayCountValue};
//!
//! let gpu = GpuContext::headless().unwrap();
//! let config = RayCountConfig::new();
//! let counter = GpuRayCounter::new(&gpu, &config);
//! let mut rays = RayCountAggregator::new(counter, config);
//!
//! // once per frame
//! rays.activate(true);
//! // ... dispatch passes that bind rays.producer().buffer() ...
//! rays.submit_request();
//!
//! let total = rays.query(RayCountValue::Total);
//! ```
//!
//! # Failures
//!
//! A readback that fails (device loss, mapping error, malformed payload) is
//! dropped without retry and without surfacing an error. Callers keep seeing
//! the previous snapshot.

use std::collections::VecDeque;

use crate::category::{COUNTER_BUFFER_SIZE, RayCountValue};
use crate::config::RayCountConfig;
use crate::readback::{PendingReadback, ReadbackProducer, ReadbackStatus};
use crate::snapshot::CounterSnapshot;

/// Aggregates per-frame ray count readbacks into a cached snapshot.
///
/// Owned explicitly by whichever render loop needs ray statistics; there is no
/// global instance.
pub struct RayCountAggregator<P: ReadbackProducer> {
    producer: P,
    config: RayCountConfig,
    active: bool,
    // Requests complete in submission order, so only the front is ever inspected.
    pending: VecDeque<P::Request>,
    snapshot: CounterSnapshot,
}

impl<P: ReadbackProducer> RayCountAggregator<P> {
    /// Creates an inactive aggregator with an all-zero snapshot.
    pub fn new(producer: P, config: RayCountConfig) -> Self {
        Self {
            producer,
            config,
            active: false,
            pending: VecDeque::new(),
            snapshot: CounterSnapshot::default(),
        }
    }

    /// Enables or disables ray counting for the current frame.
    ///
    /// When enabled the producer's counters are cleared so the frame starts
    /// accumulating from zero.
    pub fn activate(&mut self, enabled: bool) {
        if enabled != self.active {
            tracing::debug!(label = %self.config.label, enabled, "ray counting toggled");
        }
        self.active = enabled;

        if self.active {
            self.producer.clear_counters();
        }
    }

    /// Queues a readback of the counters written this frame.
    ///
    /// Call at most once per frame. Does nothing while inactive, apart from
    /// draining readbacks that already finished when
    /// [`RayCountConfig::drain_while_inactive`] is set.
    pub fn submit_request(&mut self) {
        if !self.active {
            if self.config.drain_while_inactive {
                self.drain();
            }
            return;
        }

        if let Some(max) = self.config.max_pending {
            // Finished readbacks still count against the cap until drained.
            if self.pending.len() >= max {
                self.drain();
            }
            if self.pending.len() >= max {
                tracing::warn!(
                    label = %self.config.label,
                    pending = self.pending.len(),
                    max,
                    "readback queue full, skipping this frame"
                );
                return;
            }
        }

        let request = self.producer.request_read(COUNTER_BUFFER_SIZE, 0);
        self.pending.push_back(request);
        tracing::trace!(pending = self.pending.len(), "ray count readback queued");
    }

    /// Returns the last known count for `value`, or 0 while inactive.
    ///
    /// Finished readbacks are folded into the snapshot first. The call never
    /// waits for readbacks that are still in flight.
    pub fn query(&mut self, value: RayCountValue) -> u64 {
        if !self.active {
            return 0;
        }

        self.drain();
        self.snapshot.get(value)
    }

    /// Consumes every finished readback at the front of the queue.
    ///
    /// Returns the number of readbacks removed.
    pub fn drain(&mut self) -> usize {
        let mut drained = 0;

        while let Some(front) = self.pending.front() {
            let status = front.status();
            if !status.is_finished() {
                break;
            }

            let Some(mut request) = self.pending.pop_front() else {
                break;
            };
            drained += 1;

            if status == ReadbackStatus::Failed {
                tracing::debug!(label = %self.config.label, "skipping failed ray count readback");
                continue;
            }

            match request
                .read()
                .and_then(|bytes| CounterSnapshot::from_bytes(&bytes))
            {
                Ok(snapshot) => self.snapshot = snapshot,
                Err(e) => {
                    tracing::warn!(label = %self.config.label, error = %e, "discarding ray count readback");
                }
            }
        }

        drained
    }

    /// Whether ray counting is enabled for the current frame.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The cached snapshot, without draining.
    pub fn snapshot(&self) -> &CounterSnapshot {
        &self.snapshot
    }

    /// Number of readbacks still queued.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn config(&self) -> &RayCountConfig {
        &self.config
    }

    pub fn producer(&self) -> &P {
        &self.producer
    }

    pub fn producer_mut(&mut self) -> &mut P {
        &mut self.producer
    }
}
