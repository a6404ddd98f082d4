use anyhow::{ensure, Result};
use helper_functions::{accessors, misc, ValidatorStore};
use types::{
    phase0::{
        beacon_state::BeaconState,
        containers::{
            Attestation, BeaconBlock, BeaconBlockBody, BeaconBlockHeader, PendingAttestation,
        },
        primitives::{ValidatorIndex, H256},
    },
    preset::Preset,
    traits::ContentRoot as _,
};

use crate::Error;

pub fn process_block<P: Preset>(
    state: &mut BeaconState<P>,
    validator_store: &ValidatorStore,
    block: &BeaconBlock,
) -> Result<()> {
    process_block_header(state, validator_store, block)?;
    process_randao(state, &block.body);

    for attestation in &block.body.attestations {
        process_attestation(state, validator_store, attestation, block.proposer_index)?;
    }

    Ok(())
}

pub fn process_block_header<P: Preset>(
    state: &mut BeaconState<P>,
    validator_store: &ValidatorStore,
    block: &BeaconBlock,
) -> Result<()> {
    ensure!(
        block.slot == state.slot,
        Error::SlotMismatch {
            state_slot: state.slot,
            block_slot: block.slot,
        },
    );

    ensure!(
        block.slot > state.latest_block_header.slot,
        Error::BlockNotNewerThanLatestBlockHeader {
            block_slot: block.slot,
            block_header_slot: state.latest_block_header.slot,
        },
    );

    let computed = accessors::get_beacon_proposer_index(state, validator_store)?;
    let in_block = block.proposer_index;

    ensure!(
        computed == in_block,
        Error::ProposerIndexMismatch { computed, in_block },
    );

    let computed = state.latest_block_header.content_root();
    let in_block = block.parent_root;

    ensure!(
        computed == in_block,
        Error::ParentRootMismatch { computed, in_block },
    );

    let index = block.proposer_index;

    let proposer_slashed = usize::try_from(index)
        .ok()
        .and_then(|position| state.validators.get(position))
        .is_some_and(|proposer| proposer.slashed);

    ensure!(!proposer_slashed, Error::ProposerSlashed { index });

    // The state root is filled in by the next call to `process_slot`.
    state.latest_block_header = BeaconBlockHeader {
        slot: block.slot,
        proposer_index: block.proposer_index,
        parent_root: block.parent_root,
        state_root: H256::zero(),
        body_root: block.body.content_root(),
    };

    Ok(())
}

pub fn process_randao<P: Preset>(state: &mut BeaconState<P>, body: &BeaconBlockBody) {
    let epoch = accessors::get_current_epoch(state);
    let mix = accessors::get_randao_mix(state, epoch) ^ hashing::hash_256(body.randao_reveal);

    state.randao_mixes.set(epoch, mix);
}

pub fn process_attestation<P: Preset>(
    state: &mut BeaconState<P>,
    validator_store: &ValidatorStore,
    attestation: &Attestation,
    proposer_index: ValidatorIndex,
) -> Result<()> {
    validate_attestation(state, validator_store, attestation)?;

    let data = attestation.data;

    let pending_attestation = PendingAttestation {
        aggregation_bits: attestation.aggregation_bits.clone(),
        data,
        inclusion_delay: state.slot - data.slot,
        proposer_index,
    };

    if data.target.epoch == accessors::get_current_epoch(state) {
        state.current_epoch_attestations.push(pending_attestation);
    } else {
        state.previous_epoch_attestations.push(pending_attestation);
    }

    Ok(())
}

pub fn validate_attestation<P: Preset>(
    state: &BeaconState<P>,
    validator_store: &ValidatorStore,
    attestation: &Attestation,
) -> Result<()> {
    let data = attestation.data;
    let target_epoch = data.target.epoch;
    let current_epoch = accessors::get_current_epoch(state);
    let previous_epoch = accessors::get_previous_epoch(state);

    ensure!(
        target_epoch == previous_epoch || target_epoch == current_epoch,
        Error::AttestationTargetsInvalidEpoch { target_epoch },
    );

    ensure!(
        target_epoch == misc::compute_epoch_at_slot::<P>(data.slot),
        Error::AttestationTargetsWrongEpoch { data },
    );

    let low_slot = data.slot + P::MIN_ATTESTATION_INCLUSION_DELAY.get();
    let high_slot = data.slot + P::SLOTS_PER_EPOCH.get();

    ensure!(
        (low_slot..=high_slot).contains(&state.slot),
        Error::AttestationOutsideInclusionRange {
            state_slot: state.slot,
            attestation_slot: data.slot,
        },
    );

    let in_state = if target_epoch == current_epoch {
        state.current_justified_checkpoint
    } else {
        state.previous_justified_checkpoint
    };

    let in_block = data.source;

    ensure!(
        in_state == in_block,
        Error::AttestationSourceMismatch { in_state, in_block },
    );

    // Fails if the bitfield does not match the committee.
    accessors::get_attesting_indices(
        state,
        validator_store,
        data,
        &attestation.aggregation_bits,
    )?;

    Ok(())
}
