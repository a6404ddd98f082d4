use core::mem;

use anyhow::Result;
use helper_functions::{accessors, ValidatorStore};
use itertools::Itertools as _;
use log::debug;
use types::{
    nonstandard::RelativeEpoch,
    phase0::{
        beacon_state::BeaconState,
        consts::GENESIS_EPOCH,
        containers::{Checkpoint, PendingAttestation},
        primitives::{Epoch, Gwei, ValidatorIndex},
    },
    preset::Preset,
};

pub fn process_epoch<P: Preset>(
    state: &mut BeaconState<P>,
    validator_store: &ValidatorStore,
) -> Result<()> {
    process_justification_and_finalization(state, validator_store)?;
    process_randao_mixes_reset(state);
    process_participation_record_updates(state);

    Ok(())
}

pub fn process_justification_and_finalization<P: Preset>(
    state: &mut BeaconState<P>,
    validator_store: &ValidatorStore,
) -> Result<()> {
    if !should_process_justification_and_finalization(state) {
        return Ok(());
    }

    let current_epoch_active_balance = accessors::get_total_active_balance(state, validator_store)?;

    let previous_epoch_target_balance = target_attesting_balance(
        state,
        validator_store,
        accessors::get_previous_epoch(state),
        &state.previous_epoch_attestations,
    )?;

    let current_epoch_target_balance = target_attesting_balance(
        state,
        validator_store,
        accessors::get_current_epoch(state),
        &state.current_epoch_attestations,
    )?;

    weigh_justification_and_finalization(
        state,
        current_epoch_active_balance,
        previous_epoch_target_balance,
        current_epoch_target_balance,
    )
}

pub fn weigh_justification_and_finalization<P: Preset>(
    state: &mut BeaconState<P>,
    current_epoch_active_balance: Gwei,
    previous_epoch_target_balance: Gwei,
    current_epoch_target_balance: Gwei,
) -> Result<()> {
    let old_previous_justified_checkpoint = state.previous_justified_checkpoint;
    let old_current_justified_checkpoint = state.current_justified_checkpoint;

    // Process justifications
    state.previous_justified_checkpoint = state.current_justified_checkpoint;
    state.justification_bits.shift_up_by_1();

    for (relative_epoch, bit, target_balance) in [
        (RelativeEpoch::Previous, 1, previous_epoch_target_balance),
        (RelativeEpoch::Current, 0, current_epoch_target_balance),
    ] {
        if target_balance * 3 >= current_epoch_active_balance * 2 {
            let epoch = accessors::absolute_epoch(state, relative_epoch);
            let root = accessors::get_block_root(state, epoch)?;

            state.current_justified_checkpoint = Checkpoint { epoch, root };
            state.justification_bits.set(bit);
        }
    }

    // Process finalizations
    let bits = state.justification_bits;
    let current_epoch = accessors::get_current_epoch(state);

    // The 2nd, 3rd and 4th most recent epochs are justified, the 2nd using the 4th as source
    if bits.all(1..4) && old_previous_justified_checkpoint.epoch + 3 == current_epoch {
        state.finalized_checkpoint = old_previous_justified_checkpoint;
    }

    // The 2nd and 3rd most recent epochs are justified, the 2nd using the 3rd as source
    if bits.all(1..3) && old_previous_justified_checkpoint.epoch + 2 == current_epoch {
        state.finalized_checkpoint = old_previous_justified_checkpoint;
    }

    // The 1st, 2nd and 3rd most recent epochs are justified, the 1st using the 3rd as source
    if bits.all(0..3) && old_current_justified_checkpoint.epoch + 2 == current_epoch {
        state.finalized_checkpoint = old_current_justified_checkpoint;
    }

    // The 1st and 2nd most recent epochs are justified, the 1st using the 2nd as source
    if bits.all(0..2) && old_current_justified_checkpoint.epoch + 1 == current_epoch {
        state.finalized_checkpoint = old_current_justified_checkpoint;
    }

    debug!(
        "justification processed (epoch: {current_epoch}, justified: {:?}, finalized: {:?})",
        state.current_justified_checkpoint, state.finalized_checkpoint,
    );

    Ok(())
}

#[must_use]
pub fn should_process_justification_and_finalization<P: Preset>(state: &BeaconState<P>) -> bool {
    // Checkpoints at genesis have a zero root.
    // Justification starts after the first 2 epochs so that the stub is never used as a target.
    GENESIS_EPOCH + 1 < accessors::get_current_epoch(state)
}

pub fn process_randao_mixes_reset<P: Preset>(state: &mut BeaconState<P>) {
    let current_epoch = accessors::get_current_epoch(state);
    let mix = accessors::get_randao_mix(state, current_epoch);

    state.randao_mixes.set(current_epoch + 1, mix);
}

pub fn process_participation_record_updates<P: Preset>(state: &mut BeaconState<P>) {
    state.previous_epoch_attestations = mem::take(&mut state.current_epoch_attestations);
}

/// Sums the effective balances of unslashed validators in `attestations` that attested to the
/// boundary block of `epoch`.
pub fn target_attesting_balance<P: Preset>(
    state: &BeaconState<P>,
    validator_store: &ValidatorStore,
    epoch: Epoch,
    attestations: &[PendingAttestation],
) -> Result<Gwei> {
    let boundary_root = accessors::get_block_root(state, epoch)?;

    let matching = attestations
        .iter()
        .filter(|attestation| attestation.data.target.root == boundary_root);

    let attesters = unslashed_attesting_indices(state, validator_store, matching)?;

    accessors::get_total_balance(state, attesters)
}

fn unslashed_attesting_indices<'attestations, P: Preset>(
    state: &BeaconState<P>,
    validator_store: &ValidatorStore,
    attestations: impl IntoIterator<Item = &'attestations PendingAttestation>,
) -> Result<Vec<ValidatorIndex>> {
    let mut attesters = vec![];

    for attestation in attestations {
        attesters.extend(accessors::get_attesting_indices(
            state,
            validator_store,
            attestation.data,
            &attestation.aggregation_bits,
        )?);
    }

    Ok(attesters
        .into_iter()
        .unique()
        .filter(|validator_index| {
            usize::try_from(*validator_index)
                .ok()
                .and_then(|index| state.validators.get(index))
                .is_some_and(|validator| !validator.slashed)
        })
        .collect())
}
