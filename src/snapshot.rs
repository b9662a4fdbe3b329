//! The last known ray counts.

use crate::category::{CATEGORY_COUNT, RayCountValue};
use crate::error::RayCountError;

/// Last known value of every counter slot.
///
/// A snapshot is always replaced wholesale when a readback completes; slots
/// are never merged across readbacks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    values: [u32; CATEGORY_COUNT],
}

impl CounterSnapshot {
    /// Creates a snapshot from explicit slot values.
    pub fn new(values: [u32; CATEGORY_COUNT]) -> Self {
        Self { values }
    }

    /// Decodes a readback payload of `CATEGORY_COUNT` native-endian `u32`s.
    ///
    /// The payload does not need to be 4-byte aligned.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RayCountError> {
        let expected = CATEGORY_COUNT * std::mem::size_of::<u32>();
        if bytes.len() != expected {
            return Err(RayCountError::SnapshotSize {
                expected,
                actual: bytes.len(),
            });
        }

        let mut values = [0u32; CATEGORY_COUNT];
        bytemuck::cast_slice_mut::<u32, u8>(&mut values).copy_from_slice(bytes);
        Ok(Self { values })
    }

    /// Raw slot values in category order.
    pub fn values(&self) -> &[u32; CATEGORY_COUNT] {
        &self.values
    }

    /// Value for a category, or the sum of all slots for [`RayCountValue::Total`].
    pub fn get(&self, value: RayCountValue) -> u64 {
        match value.index() {
            Some(slot) => u64::from(self.values[slot]),
            None => self.total(),
        }
    }

    /// Sum of every slot. Computed in `u64` so it cannot overflow.
    pub fn total(&self) -> u64 {
        self.values.iter().map(|&v| u64::from(v)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_native_endian_payload() {
        let bytes: Vec<u8> = [1u32, 2, 3, 4, 5]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        let snapshot = CounterSnapshot::from_bytes(&bytes).unwrap();
        assert_eq!(snapshot.values(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn decodes_unaligned_payload() {
        let mut storage: Vec<u8> = vec![0];
        storage.extend([9u32, 8, 7, 6, 5].iter().flat_map(|v| v.to_ne_bytes()));
        let snapshot = CounterSnapshot::from_bytes(&storage[1..]).unwrap();
        assert_eq!(snapshot.values(), &[9, 8, 7, 6, 5]);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = CounterSnapshot::from_bytes(&[0u8; 12]).unwrap_err();
        match err {
            RayCountError::SnapshotSize { expected, actual } => {
                assert_eq!(expected, 20);
                assert_eq!(actual, 12);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn total_is_sum_of_categories() {
        let snapshot = CounterSnapshot::new([10, 20, 30, 40, 50]);
        let sum: u64 = RayCountValue::CATEGORIES
            .iter()
            .map(|&c| snapshot.get(c))
            .sum();
        assert_eq!(snapshot.get(RayCountValue::Total), sum);
        assert_eq!(sum, 150);
    }

    #[test]
    fn total_does_not_overflow() {
        let snapshot = CounterSnapshot::new([u32::MAX; CATEGORY_COUNT]);
        assert_eq!(snapshot.total(), u64::from(u32::MAX) * CATEGORY_COUNT as u64);
    }

    #[test]
    fn default_is_zeroed() {
        assert_eq!(CounterSnapshot::default().total(), 0);
    }
}
