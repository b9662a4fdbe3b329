//! Text lines for an on-screen ray count overlay.

use crate::aggregator::RayCountAggregator;
use crate::category::RayCountValue;
use crate::readback::ReadbackProducer;

/// One overlay row.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayLine {
    pub value: RayCountValue,
    pub rays: u64,
}

impl OverlayLine {
    /// Ray count in millions, the unit the overlay displays.
    pub fn mega_rays(&self) -> f64 {
        self.rays as f64 / 1_000_000.0
    }
}

impl std::fmt::Display for OverlayLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:.2} MRays/frame", self.value.label(), self.mega_rays())
    }
}

/// Collects the overlay rows from an aggregator.
pub struct RayCountOverlay;

impl RayCountOverlay {
    /// One row per category followed by the total.
    ///
    /// Querying drains finished readbacks, so call this once per frame after
    /// [`RayCountAggregator::submit_request`].
    pub fn lines<P: ReadbackProducer>(rays: &mut RayCountAggregator<P>) -> Vec<OverlayLine> {
        RayCountValue::CATEGORIES
            .iter()
            .copied()
            .chain(std::iter::once(RayCountValue::Total))
            .map(|value| OverlayLine {
                value,
                rays: rays.query(value),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_mega_rays() {
        let line = OverlayLine {
            value: RayCountValue::Shadow,
            rays: 1_250_000,
        };
        assert_eq!(line.to_string(), "Shadow: 1.25 MRays/frame");
    }

    #[test]
    fn formats_zero() {
        let line = OverlayLine {
            value: RayCountValue::Total,
            rays: 0,
        };
        assert_eq!(line.to_string(), "Total: 0.00 MRays/frame");
    }
}
