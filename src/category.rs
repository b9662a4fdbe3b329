//! Ray categories counted by the ray tracing passes.
//!
//! Each real category owns one `u32` slot in the GPU counter buffer. The slot
//! index is stable and must match the order shaders use when they increment
//! the counters. [`RayCountValue::Total`] is a synthetic selector that has no
//! slot of its own; it stands for the sum of every category.

/// Number of real categories, and therefore of `u32` slots in the counter buffer.
pub const CATEGORY_COUNT: usize = 5;

/// Size in bytes of the counter buffer read back each frame.
pub const COUNTER_BUFFER_SIZE: u64 = (CATEGORY_COUNT * std::mem::size_of::<u32>()) as u64;

/// The ray count values that can be queried.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RayCountValue {
    AmbientOcclusion,
    Shadow,
    DiffuseGi,
    Reflection,
    Recursive,
    /// Sum of every other category.
    Total,
}

impl RayCountValue {
    /// Real categories in slot order.
    pub const CATEGORIES: [RayCountValue; CATEGORY_COUNT] = [
        RayCountValue::AmbientOcclusion,
        RayCountValue::Shadow,
        RayCountValue::DiffuseGi,
        RayCountValue::Reflection,
        RayCountValue::Recursive,
    ];

    /// Slot index in the counter buffer, or `None` for [`Total`](Self::Total).
    pub fn index(self) -> Option<usize> {
        match self {
            RayCountValue::AmbientOcclusion => Some(0),
            RayCountValue::Shadow => Some(1),
            RayCountValue::DiffuseGi => Some(2),
            RayCountValue::Reflection => Some(3),
            RayCountValue::Recursive => Some(4),
            RayCountValue::Total => None,
        }
    }

    /// Human readable name used by the overlay.
    pub fn label(self) -> &'static str {
        match self {
            RayCountValue::AmbientOcclusion => "Ambient Occlusion",
            RayCountValue::Shadow => "Shadow",
            RayCountValue::DiffuseGi => "Diffuse GI",
            RayCountValue::Reflection => "Reflection",
            RayCountValue::Recursive => "Recursive",
            RayCountValue::Total => "Total",
        }
    }
}
