use core::num::NonZeroU64;

use anyhow::Result;
use tap::{Pipe as _, TryConv as _};
use types::{
    phase0::{
        beacon_state::BeaconState,
        primitives::{Epoch, Slot, ValidatorIndex, H256},
    },
    preset::Preset,
};

use crate::error::Error;

#[must_use]
pub fn compute_epoch_at_slot<P: Preset>(slot: Slot) -> Epoch {
    slot / P::SLOTS_PER_EPOCH
}

#[must_use]
pub const fn compute_start_slot_at_epoch<P: Preset>(epoch: Epoch) -> Slot {
    epoch.saturating_mul(P::SLOTS_PER_EPOCH.get())
}

#[must_use]
pub fn is_epoch_start<P: Preset>(slot: Slot) -> bool {
    slots_since_epoch_start::<P>(slot) == 0
}

/// Returns `true` if the slot after `slot` starts a new epoch.
#[must_use]
pub fn is_epoch_end<P: Preset>(slot: Slot) -> bool {
    slots_since_epoch_start::<P>(slot) == P::SLOTS_PER_EPOCH.get() - 1
}

#[must_use]
pub fn slots_since_epoch_start<P: Preset>(slot: Slot) -> u64 {
    slot % P::SLOTS_PER_EPOCH
}

#[must_use]
pub fn committee_count_from_active_validator_count<P: Preset>(active_validator_count: u64) -> u64 {
    (active_validator_count / P::SLOTS_PER_EPOCH / P::TARGET_COMMITTEE_SIZE)
        .clamp(1, P::MAX_COMMITTEES_PER_SLOT.get())
}

/// Samples active validators in shuffled order until one passes a check weighted by its
/// effective balance.
pub fn compute_proposer_index<P: Preset>(
    state: &BeaconState<P>,
    indices: &[ValidatorIndex],
    seed: H256,
) -> Result<ValidatorIndex> {
    let total = indices
        .len()
        .try_conv::<u64>()?
        .pipe(NonZeroU64::new)
        .ok_or(Error::NoActiveValidators)?;

    let max_random_byte = u64::from(u8::MAX);

    for (attempt, random_byte) in (0..u64::MAX / H256::len_bytes() as u64)
        .flat_map(|quotient| hashing::hash_256_64(seed, quotient).to_fixed_bytes())
        .map(u64::from)
        .enumerate()
    {
        let attempt = attempt.try_conv::<u64>()?;
        let shuffled_position = shuffling::shuffle_single::<P>(attempt % total, total.get(), seed)?;
        let candidate_index = indices[shuffled_position.try_conv::<usize>()?];

        let effective_balance = state
            .validators
            .get(candidate_index.try_conv::<usize>()?)
            .ok_or(Error::ValidatorIndexOutOfBounds {
                validator_index: candidate_index,
            })?
            .effective_balance;

        if effective_balance * max_random_byte >= P::MAX_EFFECTIVE_BALANCE * random_byte {
            return Ok(candidate_index);
        }
    }

    Err(Error::FailedToSelectProposer.into())
}

#[cfg(test)]
mod tests {
    use test_case::test_case;
    use types::preset::{Mainnet, Minimal};

    use super::*;

    #[test_case(0 => 0)]
    #[test_case(7 => 0)]
    #[test_case(8 => 1)]
    #[test_case(65 => 8)]
    fn compute_epoch_at_slot_divides_by_slots_per_epoch(slot: Slot) -> Epoch {
        compute_epoch_at_slot::<Minimal>(slot)
    }

    #[test]
    fn epoch_boundaries_are_detected() {
        assert!(is_epoch_start::<Minimal>(16));
        assert!(!is_epoch_start::<Minimal>(17));
        assert!(is_epoch_end::<Minimal>(15));
        assert!(!is_epoch_end::<Minimal>(16));
        assert_eq!(compute_start_slot_at_epoch::<Mainnet>(2), 64);
        assert_eq!(compute_start_slot_at_epoch::<Mainnet>(Epoch::MAX), Slot::MAX);
    }

    #[test_case(0 => 1)]
    #[test_case(64_000 => 15)]
    #[test_case(1_000_000 => 64)]
    fn committee_count_is_clamped(active_validator_count: u64) -> u64 {
        committee_count_from_active_validator_count::<Mainnet>(active_validator_count)
    }

    #[test]
    fn compute_proposer_index_fails_without_active_validators() {
        let state = BeaconState::<Minimal>::genesis(0, vec![], H256::zero());
        let error = compute_proposer_index(&state, &[], H256::zero())
            .expect_err("proposer selection should fail with no candidates");

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::NoActiveValidators),
        ));
    }
}
