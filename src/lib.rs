//! # raycount
//!
//! **Non-blocking ray count statistics for ray tracing debug overlays.**
//!
//! Ray tracing passes bump per-category counters on the GPU with atomics. Once
//! per frame a readback of those counters is queued, and the overlay asks for
//! the latest known values whenever it draws. Readbacks are consumed only once
//! the GPU has finished them, so the render loop never stalls.
//!
//! ## Quick Start
//!
//! ```no_run
//! use raycount::*;
//!
//! let gpu = GpuContext::headless().unwrap();
//! let config = RayCountConfig::new().label("Main View Rays");
//! let counter = GpuRayCounter::new(&gpu, &config);
//! let mut rays = RayCountAggregator::new(counter, config);
//!
//! loop {
//!     rays.activate(true);
//!     // bind rays.producer().binding(0) and dispatch ray tracing work
//!     rays.submit_request();
//!
//!     for line in RayCountOverlay::lines(&mut rays) {
//!         println!("{line}");
//!     }
//! #   break;
//! }
//! ```
//!
//! ## Pieces
//!
//! - [`RayCountAggregator`] queues readbacks and keeps the last good snapshot.
//! - [`ReadbackProducer`] / [`PendingReadback`] are the seam to the counter
//!   storage; [`GpuRayCounter`] implements them with wgpu.
//! - [`RayCountOverlay`] turns the snapshot into display rows.

mod aggregator;
mod category;
mod config;
mod error;
mod gpu;
mod gpu_counter;
mod overlay;
mod readback;
mod snapshot;

pub use aggregator::RayCountAggregator;
pub use category::{CATEGORY_COUNT, COUNTER_BUFFER_SIZE, RayCountValue};
pub use config::RayCountConfig;
pub use error::RayCountError;
pub use gpu::GpuContext;
pub use gpu_counter::{GpuRayCounter, GpuReadback};
pub use overlay::{OverlayLine, RayCountOverlay};
pub use readback::{PendingReadback, ReadbackProducer, ReadbackStatus};
pub use snapshot::CounterSnapshot;
