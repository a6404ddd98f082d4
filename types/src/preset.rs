use core::{fmt::Debug, hash::Hash, num::NonZeroU64};

use nonzero_ext::nonzero;

use crate::phase0::primitives::Gwei;

/// Compile-time configuration variables.
///
/// The defaults are the mainnet values. Presets used for testing override only what differs.
pub trait Preset: Copy + Eq + Ord + Hash + Default + Debug + Send + Sync + 'static {
    const EPOCHS_PER_HISTORICAL_VECTOR: NonZeroU64 = nonzero!(65536_u64);
    const MAX_COMMITTEES_PER_SLOT: NonZeroU64 = nonzero!(64_u64);
    const MAX_EFFECTIVE_BALANCE: Gwei = 32_000_000_000;
    const MIN_ATTESTATION_INCLUSION_DELAY: NonZeroU64 = NonZeroU64::MIN;
    const MIN_SEED_LOOKAHEAD: u64 = 1;
    const SHUFFLE_ROUND_COUNT: u8 = 90;
    const SLOTS_PER_EPOCH: NonZeroU64 = nonzero!(32_u64);
    const SLOTS_PER_HISTORICAL_ROOT: NonZeroU64 = nonzero!(8192_u64);
    const TARGET_COMMITTEE_SIZE: NonZeroU64 = nonzero!(128_u64);
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Mainnet;

impl Preset for Mainnet {}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Minimal;

impl Preset for Minimal {
    const EPOCHS_PER_HISTORICAL_VECTOR: NonZeroU64 = nonzero!(64_u64);
    const MAX_COMMITTEES_PER_SLOT: NonZeroU64 = nonzero!(4_u64);
    const SHUFFLE_ROUND_COUNT: u8 = 10;
    const SLOTS_PER_EPOCH: NonZeroU64 = nonzero!(8_u64);
    const SLOTS_PER_HISTORICAL_ROOT: NonZeroU64 = nonzero!(64_u64);
    const TARGET_COMMITTEE_SIZE: NonZeroU64 = nonzero!(4_u64);
}
