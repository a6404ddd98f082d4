use anyhow::{ensure, Result};
use itertools::Itertools as _;
use tap::TryConv as _;
use types::{
    nonstandard::RelativeEpoch,
    phase0::{
        beacon_state::BeaconState,
        consts::{DOMAIN_BEACON_ATTESTER, DOMAIN_BEACON_PROPOSER, GENESIS_EPOCH},
        containers::AttestationData,
        primitives::{CommitteeIndex, DomainType, Epoch, Gwei, Slot, ValidatorIndex, H256},
    },
    preset::Preset,
    traits::ContentRoot as _,
};

use crate::{error::Error, misc, ValidatorStore};

#[must_use]
pub fn get_current_epoch<P: Preset>(state: &BeaconState<P>) -> Epoch {
    misc::compute_epoch_at_slot::<P>(state.slot)
}

#[must_use]
pub fn get_previous_epoch<P: Preset>(state: &BeaconState<P>) -> Epoch {
    get_current_epoch(state)
        .saturating_sub(1)
        .max(GENESIS_EPOCH)
}

#[must_use]
pub fn get_next_epoch<P: Preset>(state: &BeaconState<P>) -> Epoch {
    get_current_epoch(state) + 1
}

pub fn relative_epoch<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> Result<RelativeEpoch> {
    let current_epoch = get_current_epoch(state);

    ensure!(
        epoch >= get_previous_epoch(state),
        Error::EpochBeforePrevious { epoch },
    );

    ensure!(
        epoch <= get_next_epoch(state),
        Error::EpochAfterNext { epoch },
    );

    let relative_epoch = match epoch.cmp(&current_epoch) {
        core::cmp::Ordering::Less => RelativeEpoch::Previous,
        core::cmp::Ordering::Equal => RelativeEpoch::Current,
        core::cmp::Ordering::Greater => RelativeEpoch::Next,
    };

    Ok(relative_epoch)
}

#[must_use]
pub fn absolute_epoch<P: Preset>(state: &BeaconState<P>, relative_epoch: RelativeEpoch) -> Epoch {
    match relative_epoch {
        RelativeEpoch::Previous => get_previous_epoch(state),
        RelativeEpoch::Current => get_current_epoch(state),
        RelativeEpoch::Next => get_next_epoch(state),
    }
}

pub fn get_block_root_at_slot<P: Preset>(state: &BeaconState<P>, slot: Slot) -> Result<H256> {
    let in_range = slot < state.slot && state.slot <= slot + P::SLOTS_PER_HISTORICAL_ROOT.get();

    ensure!(
        in_range,
        Error::SlotOutOfRange {
            slot,
            state_slot: state.slot,
        },
    );

    Ok(state.block_roots.get(slot))
}

/// Returns the root of the block at the start of `epoch` or the last block before it.
pub fn get_block_root<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> Result<H256> {
    get_block_root_at_slot(state, misc::compute_start_slot_at_epoch::<P>(epoch))
}

/// Returns the root of the latest block applied to `state`.
///
/// The state root in `BeaconState.latest_block_header` is only filled in during the next slot,
/// so this computes it if needed.
#[must_use]
pub fn latest_block_root<P: Preset>(state: &BeaconState<P>) -> H256 {
    let mut header = state.latest_block_header;

    if header.state_root.is_zero() {
        header.state_root = state.content_root();
    }

    header.content_root()
}

#[must_use]
pub fn get_randao_mix<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> H256 {
    state.randao_mixes.get(epoch)
}

#[must_use]
pub fn get_seed<P: Preset>(state: &BeaconState<P>, epoch: Epoch, domain_type: DomainType) -> H256 {
    let mix = get_randao_mix(
        state,
        epoch + P::EPOCHS_PER_HISTORICAL_VECTOR.get() - P::MIN_SEED_LOOKAHEAD - 1,
    );

    hashing::hash_32_64_256(domain_type.to_fixed_bytes(), epoch, mix)
}

pub fn get_committee_count_per_slot<P: Preset>(
    state: &BeaconState<P>,
    validator_store: &ValidatorStore,
    epoch: Epoch,
) -> Result<u64> {
    let active_validator_count = validator_store
        .active_validator_indices(state, epoch)
        .len()
        .try_conv::<u64>()?;

    Ok(misc::committee_count_from_active_validator_count::<P>(active_validator_count))
}

/// Returns the members of committee `committee_index` at `slot`.
///
/// The epoch of `slot` must be the previous, current or next one relative to `state`.
pub fn beacon_committee<P: Preset>(
    state: &BeaconState<P>,
    validator_store: &ValidatorStore,
    slot: Slot,
    committee_index: CommitteeIndex,
) -> Result<Vec<ValidatorIndex>> {
    let epoch = misc::compute_epoch_at_slot::<P>(slot);

    relative_epoch(state, epoch)?;

    let committees_per_slot = get_committee_count_per_slot(state, validator_store, epoch)?;

    ensure!(
        committee_index < committees_per_slot,
        Error::CommitteeIndexOutOfBounds {
            index: committee_index,
            committees_per_slot,
        },
    );

    let seed = get_seed(state, epoch, DOMAIN_BEACON_ATTESTER);
    let shuffled = validator_store.shuffled_validator_indices(state, epoch, seed)?;
    let validator_count = shuffled.len().try_conv::<u64>()?;
    let committees_in_epoch = (committees_per_slot * P::SLOTS_PER_EPOCH.get()).try_into()?;
    let index_in_epoch =
        misc::slots_since_epoch_start::<P>(slot) * committees_per_slot + committee_index;

    let start = shuffling::split_offset(validator_count, committees_in_epoch, index_in_epoch)?;
    let end = shuffling::split_offset(validator_count, committees_in_epoch, index_in_epoch + 1)?;

    Ok(shuffled[start.try_conv::<usize>()?..end.try_conv::<usize>()?].to_vec())
}

pub fn get_beacon_proposer_index<P: Preset>(
    state: &BeaconState<P>,
    validator_store: &ValidatorStore,
) -> Result<ValidatorIndex> {
    let epoch = get_current_epoch(state);
    let seed = hashing::hash_256_64(get_seed(state, epoch, DOMAIN_BEACON_PROPOSER), state.slot);
    let indices = validator_store.active_validator_indices(state, epoch);

    misc::compute_proposer_index(state, &indices, seed)
}

/// Resolves the validators that set bits in `aggregation_bits`.
///
/// Fails if the bitfield does not match the committee exactly.
pub fn get_attesting_indices<P: Preset>(
    state: &BeaconState<P>,
    validator_store: &ValidatorStore,
    attestation_data: AttestationData,
    aggregation_bits: &[u8],
) -> Result<Vec<ValidatorIndex>> {
    let committee = beacon_committee(
        state,
        validator_store,
        attestation_data.slot,
        attestation_data.index,
    )?;

    ensure!(
        aggregation_bits.len() == committee.len().div_ceil(8),
        Error::CommitteeLengthMismatch {
            aggregation_bits_length: aggregation_bits.len(),
            committee_length: committee.len(),
        },
    );

    (0..aggregation_bits.len() * 8)
        .filter(|position| aggregation_bits[position / 8] & (1 << (position % 8)) != 0)
        .map(|position| {
            committee
                .get(position)
                .copied()
                .ok_or_else(|| Error::AggregationBitOutOfRange {
                    position,
                    committee_length: committee.len(),
                })
                .map_err(Into::into)
        })
        .collect()
}

pub fn get_total_balance<P: Preset>(
    state: &BeaconState<P>,
    indices: impl IntoIterator<Item = ValidatorIndex>,
) -> Result<Gwei> {
    indices
        .into_iter()
        .unique()
        .map(|validator_index| {
            let validator = state
                .validators
                .get(validator_index.try_conv::<usize>()?)
                .ok_or(Error::ValidatorIndexOutOfBounds { validator_index })?;

            Ok(validator.effective_balance)
        })
        .sum()
}

pub fn get_total_active_balance<P: Preset>(
    state: &BeaconState<P>,
    validator_store: &ValidatorStore,
) -> Result<Gwei> {
    let indices = validator_store.active_validator_indices(state, get_current_epoch(state));
    get_total_balance(state, indices.iter().copied())
}
