use anyhow::Result;
use helper_functions::{accessors, misc};
use types::{
    phase0::{
        beacon_state::BeaconState,
        containers::{Attestation, AttestationData, BeaconBlock, Checkpoint, Validator},
        primitives::H256,
    },
    preset::Preset,
};

use crate::SlotTransition;

pub fn genesis_state<P: Preset>(validator_count: usize) -> BeaconState<P> {
    let validators = vec![Validator::active_since_genesis(P::MAX_EFFECTIVE_BALANCE); validator_count];
    BeaconState::genesis(0, validators, H256::repeat_byte(0x42))
}

/// Attestations from every committee member at the slot of `state` voting for its latest block.
pub fn full_attestations<P: Preset>(
    transition: &SlotTransition,
    state: &BeaconState<P>,
) -> Result<Vec<Attestation>> {
    let validator_store = transition.validator_store();
    let head_root = accessors::latest_block_root(state);
    let epoch = accessors::get_current_epoch(state);

    let target_root = if misc::is_epoch_start::<P>(state.slot) {
        head_root
    } else {
        accessors::get_block_root(state, epoch)?
    };

    let committees = accessors::get_committee_count_per_slot(state, validator_store, epoch)?;

    (0..committees)
        .map(|index| {
            let data = AttestationData {
                slot: state.slot,
                index,
                beacon_block_root: head_root,
                source: state.current_justified_checkpoint,
                target: Checkpoint {
                    epoch,
                    root: target_root,
                },
            };

            let committee =
                accessors::beacon_committee(state, validator_store, state.slot, index)?;

            Ok(Attestation::with_participants(
                data,
                committee.len(),
                0..committee.len(),
            ))
        })
        .collect()
}

/// Builds blocks at every slot up to `last_slot`, each including attestations for its parent.
pub fn chain_with_full_participation<P: Preset>(
    transition: &SlotTransition,
    genesis_state: &BeaconState<P>,
    last_slot: u64,
) -> Result<Vec<(BeaconBlock, BeaconState<P>)>> {
    let mut chain = vec![];
    let mut state = genesis_state.clone();

    for slot in 1..=last_slot {
        let attestations = full_attestations(transition, &state)?;
        let randao_reveal = H256::from_low_u64_be(slot);
        let (block, post_state) =
            transition.produce_block(&state, slot, attestations, randao_reveal)?;

        state = post_state.clone();
        chain.push((block, post_state));
    }

    Ok(chain)
}
