/// Tuning knobs for [`RayCountAggregator`](crate::RayCountAggregator) and
/// [`GpuRayCounter`](crate::GpuRayCounter).
///
/// # Example
/// ```
/// use raycount::RayCountConfig;
///
/// let config = RayCountConfig::new()
///     .label("Primary View Ray Counts")
///     .max_pending(8)
///     .staging_pool_size(4);
/// assert_eq!(config.max_pending, Some(8));
/// ```
#[derive(Clone, Debug)]
pub struct RayCountConfig {
    /// Debug label for GPU resources.
    pub label: String,
    /// Upper bound on queued readbacks. `None` means unbounded; the builder
    /// maps `0` to `None`.
    pub max_pending: Option<usize>,
    /// Keep draining finished readbacks from `submit_request` while inactive.
    pub drain_while_inactive: bool,
    /// Number of idle staging buffers the GPU producer keeps for reuse.
    pub staging_pool_size: usize,
}

impl Default for RayCountConfig {
    fn default() -> Self {
        Self {
            label: "Ray Count".to_string(),
            max_pending: None,
            drain_while_inactive: true,
            staging_pool_size: 3,
        }
    }
}

impl RayCountConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Caps the readback queue. `0` removes the cap.
    pub fn max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = (max_pending > 0).then_some(max_pending);
        self
    }

    pub fn drain_while_inactive(mut self, drain: bool) -> Self {
        self.drain_while_inactive = drain;
        self
    }

    pub fn staging_pool_size(mut self, size: usize) -> Self {
        self.staging_pool_size = size;
        self
    }
}
