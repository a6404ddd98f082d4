use anyhow::{ensure, Result};
use helper_functions::{misc, ValidatorStore};
use types::{
    phase0::{beacon_state::BeaconState, primitives::Slot},
    preset::Preset,
    traits::ContentRoot as _,
};

use crate::{epoch_processing, Error};

/// Advances `state` through empty slots until it reaches `slot`.
pub fn process_slots<P: Preset>(
    state: &mut BeaconState<P>,
    validator_store: &ValidatorStore,
    slot: Slot,
) -> Result<()> {
    ensure!(
        state.slot < slot,
        Error::SlotNotLater {
            current: state.slot,
            target: slot,
        },
    );

    while state.slot < slot {
        process_slot_transition(state, validator_store)?;
    }

    Ok(())
}

/// Runs slot processing, epoch processing if the current slot ends an epoch, and increments
/// the slot.
pub fn process_slot_transition<P: Preset>(
    state: &mut BeaconState<P>,
    validator_store: &ValidatorStore,
) -> Result<()> {
    process_slot(state);

    if misc::is_epoch_end::<P>(state.slot) {
        epoch_processing::process_epoch(state, validator_store)?;
    }

    state.slot += 1;

    Ok(())
}

pub fn process_slot<P: Preset>(state: &mut BeaconState<P>) {
    let slot = state.slot;

    // Cache state root
    let previous_state_root = state.content_root();
    state.state_roots.set(slot, previous_state_root);

    // Fill in the state root of the latest block if it was applied to this state
    if state.latest_block_header.state_root.is_zero() {
        state.latest_block_header.state_root = previous_state_root;
    }

    // Cache block root
    let previous_block_root = state.latest_block_header.content_root();
    state.block_roots.set(slot, previous_block_root);
}
