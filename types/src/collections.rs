use core::{num::NonZeroU64, ops::Range};

use bit_field::BitField as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::phase0::consts::JUSTIFICATION_BITS_LENGTH;

/// Fixed-length vector indexed modulo its length.
///
/// Used for the root and randao histories in `BeaconState`.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(
    bound(serialize = "T: Clone + Serialize", deserialize = "T: Deserialize<'de>"),
    into = "Vec<T>",
    try_from = "Vec<T>"
)]
pub struct HistoryVector<T> {
    elements: Vec<T>,
}

#[derive(Debug, Error)]
#[error("history vector must contain at least one element")]
pub struct EmptyHistoryVector;

impl<T> TryFrom<Vec<T>> for HistoryVector<T> {
    type Error = EmptyHistoryVector;

    fn try_from(elements: Vec<T>) -> Result<Self, Self::Error> {
        if elements.is_empty() {
            return Err(EmptyHistoryVector);
        }

        Ok(Self { elements })
    }
}

impl<T> From<HistoryVector<T>> for Vec<T> {
    fn from(vector: HistoryVector<T>) -> Self {
        vector.elements
    }
}

impl<T: Copy> HistoryVector<T> {
    #[must_use]
    pub fn filled(value: T, length: NonZeroU64) -> Self {
        let length = usize::try_from(length.get()).expect("history length should fit in usize");

        Self {
            elements: vec![value; length],
        }
    }

    #[must_use]
    pub fn get(&self, position: u64) -> T {
        self.elements[self.index(position)]
    }

    pub fn set(&mut self, position: u64, value: T) {
        let index = self.index(position);
        self.elements[index] = value;
    }

    #[must_use]
    pub fn len(&self) -> NonZeroU64 {
        u64::try_from(self.elements.len())
            .ok()
            .and_then(NonZeroU64::new)
            .expect("history vector is never empty and its length fits in u64")
    }

    fn index(&self, position: u64) -> usize {
        usize::try_from(position % self.len()).expect("remainder is smaller than the length")
    }
}

/// The 4 most recent justification bits. Bit 0 corresponds to the current epoch.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(transparent)]
pub struct JustificationBits(u8);

impl JustificationBits {
    pub fn shift_up_by_1(&mut self) {
        let shifted = self.0 << 1;
        self.0 = shifted.get_bits(0..JUSTIFICATION_BITS_LENGTH);
    }

    pub fn set(&mut self, bit: usize) {
        self.0.set_bit(bit, true);
    }

    #[must_use]
    pub fn get(self, bit: usize) -> bool {
        self.0.get_bit(bit)
    }

    /// Returns `true` if every bit in `range` is set.
    #[must_use]
    pub fn all(self, range: Range<usize>) -> bool {
        let mask = (1_u8 << range.len()) - 1;
        self.0.get_bits(range) == mask
    }
}
