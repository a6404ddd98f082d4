//! Swap-or-not shuffling.
//!
//! Each round picks a pivot and pairs every position `i` with `pivot - i` modulo the list length.
//! The higher position of a pair selects a bit from a hash of the seed, the round and the
//! position's 256 bit window. The pair is swapped if the bit is set. A round is an involution,
//! so running the rounds in the opposite order undoes a permutation.
//!
//! Whole-list shuffling applies rounds in the opposite order from single-index shuffling. This
//! makes `shuffle_slice(list)[i] == list[shuffle_single(i)]`.

use core::num::NonZeroU64;

use anyhow::{ensure, Result};
use bit_field::BitArray as _;
use itertools::Either;
use tap::TryConv as _;
use types::{phase0::primitives::H256, preset::Preset};

pub use crate::{
    error::Error,
    split::{split_indices, split_offset},
};

mod error;
mod split;

/// Largest list that can be shuffled. Positions must fit in 40 bits.
pub const MAX_LIST_SIZE: u64 = 1 << 40;

const BITS_PER_HASH: u64 = H256::len_bytes() as u64 * 8;

#[derive(Clone, Copy)]
enum RoundOrder {
    Ascending,
    Descending,
}

impl RoundOrder {
    fn rounds<P: Preset>(self) -> impl Iterator<Item = u8> {
        let rounds = 0..P::SHUFFLE_ROUND_COUNT;

        match self {
            Self::Ascending => Either::Left(rounds),
            Self::Descending => Either::Right(rounds.rev()),
        }
    }
}

/// Returns the position that `index` is moved to by the permutation for `seed`.
pub fn shuffle_single<P: Preset>(index: u64, index_count: u64, seed: H256) -> Result<u64> {
    permute_single::<P>(index, index_count, seed, RoundOrder::Ascending)
}

/// Inverse of [`shuffle_single`].
pub fn unshuffle_single<P: Preset>(index: u64, index_count: u64, seed: H256) -> Result<u64> {
    permute_single::<P>(index, index_count, seed, RoundOrder::Descending)
}

/// Shuffles `slice` in place.
///
/// The element at position `i` afterwards is the one that was at `shuffle_single(i)`.
pub fn shuffle_slice<P: Preset, T>(slice: &mut [T], seed: H256) -> Result<()> {
    permute_slice::<P, T>(slice, seed, RoundOrder::Descending)
}

/// Inverse of [`shuffle_slice`].
pub fn unshuffle_slice<P: Preset, T>(slice: &mut [T], seed: H256) -> Result<()> {
    permute_slice::<P, T>(slice, seed, RoundOrder::Ascending)
}

fn permute_single<P: Preset>(
    mut index: u64,
    index_count: u64,
    seed: H256,
    round_order: RoundOrder,
) -> Result<u64> {
    ensure!(
        index_count <= MAX_LIST_SIZE,
        Error::ListTooLong {
            length: index_count
        },
    );

    let index_count = NonZeroU64::new(index_count)
        .filter(|count| index < count.get())
        .ok_or(Error::IndexOutOfBounds { index, index_count })?;

    for round in round_order.rounds::<P>() {
        let pivot = compute_pivot(seed, round, index_count);
        let flip = (pivot + index_count.get() - index) % index_count;
        let position = index.max(flip);

        if source_bit(seed, round, position) {
            index = flip;
        }
    }

    Ok(index)
}

fn permute_slice<P: Preset, T>(slice: &mut [T], seed: H256, round_order: RoundOrder) -> Result<()> {
    let length = slice.len().try_conv::<u64>()?;

    ensure!(length <= MAX_LIST_SIZE, Error::ListTooLong { length });

    // Lists of 0 or 1 elements have only one permutation.
    let Some(length) = NonZeroU64::new(length).filter(|length| length.get() > 1) else {
        return Ok(());
    };

    for round in round_order.rounds::<P>() {
        let pivot = compute_pivot(seed, round, length).try_conv::<usize>()?;
        let last = slice.len() - 1;

        // Positions `0..=pivot` pair up around `pivot / 2`.
        // Positions `pivot + 1..=last` pair up around the middle of that range.
        swap_mirrored(slice, seed, round, 0, pivot)?;

        if pivot < last {
            swap_mirrored(slice, seed, round, pivot + 1, last)?;
        }
    }

    Ok(())
}

// Walks inward from both ends of `first..=last`.
// The higher position of each pair decreases monotonically, so the hash for a window of
// 256 positions is computed once and reused until the walk leaves the window.
fn swap_mirrored<T>(
    slice: &mut [T],
    seed: H256,
    round: u8,
    mut low: usize,
    mut high: usize,
) -> Result<()> {
    let mut cached_source = None;

    while low < high {
        let position = high.try_conv::<u64>()?;
        let window = position / BITS_PER_HASH;

        let source = match cached_source {
            Some((cached_window, source)) if cached_window == window => source,
            _ => {
                let source = compute_source(seed, round, window);
                cached_source = Some((window, source));
                source
            }
        };

        if source.as_bytes().get_bit((position % BITS_PER_HASH).try_conv::<usize>()?) {
            slice.swap(low, high);
        }

        low += 1;
        high -= 1;
    }

    Ok(())
}

fn source_bit(seed: H256, round: u8, position: u64) -> bool {
    let bit_index = usize::from(position.to_le_bytes()[0]);

    compute_source(seed, round, position / BITS_PER_HASH)
        .as_bytes()
        .get_bit(bit_index)
}

fn compute_pivot(seed: H256, round: u8, index_count: NonZeroU64) -> u64 {
    let digest = hashing::hash_256_8(seed, round);
    let mut bytes = [0; size_of::<u64>()];
    bytes.copy_from_slice(&digest.as_bytes()[..size_of::<u64>()]);

    u64::from_le_bytes(bytes) % index_count
}

fn compute_source(seed: H256, round: u8, window: u64) -> H256 {
    // Positions are below `MAX_LIST_SIZE`, so windows fit in 32 bits.
    #[expect(clippy::cast_possible_truncation)]
    let window = window as u32;

    hashing::hash_256_8_32(seed, round, window)
}
