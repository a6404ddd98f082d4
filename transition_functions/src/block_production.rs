use anyhow::Result;
use helper_functions::accessors;
use types::{
    phase0::{
        beacon_state::BeaconState,
        containers::{Attestation, BeaconBlock, BeaconBlockBody},
        primitives::{Slot, H256},
    },
    preset::Preset,
    traits::ContentRoot as _,
};

use crate::{block_processing, slot_processing, SlotTransition};

impl SlotTransition {
    /// Builds a block at `slot` on top of the latest block in `parent_state`.
    ///
    /// Returns the block with its state root filled in along with the post-state.
    pub fn produce_block<P: Preset>(
        &self,
        parent_state: &BeaconState<P>,
        slot: Slot,
        attestations: Vec<Attestation>,
        randao_reveal: H256,
    ) -> Result<(BeaconBlock, BeaconState<P>)> {
        let validator_store = self.validator_store();
        let mut state = parent_state.clone();

        slot_processing::process_slots(&mut state, validator_store, slot)?;

        let mut block = BeaconBlock {
            slot,
            proposer_index: accessors::get_beacon_proposer_index(&state, validator_store)?,
            parent_root: state.latest_block_header.content_root(),
            state_root: H256::zero(),
            body: BeaconBlockBody {
                randao_reveal,
                graffiti: H256::zero(),
                attestations,
            },
        };

        block_processing::process_block(&mut state, validator_store, &block)?;

        block.state_root = state.content_root();

        Ok((block, state))
    }
}
