use std::sync::Arc;

use anyhow::{ensure, Result};
use helper_functions::ValidatorStore;
use log::debug;
use types::{
    phase0::{beacon_state::BeaconState, containers::BeaconBlock},
    preset::Preset,
    traits::ContentRoot as _,
};

use crate::{block_processing, slot_processing, Error};

/// Per-slot state transition used by fork choice and state regeneration.
pub trait StateTransition<P: Preset> {
    /// Advances `state` by exactly one slot and applies `block` if there is one.
    ///
    /// Epoch processing runs if the slot of `state` is the last one in its epoch.
    /// `state` is left unchanged.
    fn advance_state(
        &self,
        state: &BeaconState<P>,
        block: Option<&BeaconBlock>,
    ) -> Result<BeaconState<P>>;
}

pub struct SlotTransition {
    validator_store: Arc<ValidatorStore>,
}

impl SlotTransition {
    #[must_use]
    pub const fn new(validator_store: Arc<ValidatorStore>) -> Self {
        Self { validator_store }
    }

    #[must_use]
    pub fn validator_store(&self) -> &ValidatorStore {
        &self.validator_store
    }
}

impl<P: Preset> StateTransition<P> for SlotTransition {
    fn advance_state(
        &self,
        state: &BeaconState<P>,
        block: Option<&BeaconBlock>,
    ) -> Result<BeaconState<P>> {
        let mut state = state.clone();

        slot_processing::process_slot_transition(&mut state, &self.validator_store)?;

        if let Some(block) = block {
            block_processing::process_block(&mut state, &self.validator_store, block)?;

            let computed = state.content_root();
            let in_block = block.state_root;

            ensure!(
                computed == in_block,
                Error::StateRootMismatch { computed, in_block },
            );

            debug!(
                "block applied (slot: {}, attestations: {})",
                block.slot,
                block.body.attestations.len(),
            );
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use helper_functions::accessors;
    use types::{
        phase0::primitives::H256,
        preset::{Minimal, Preset as _},
    };

    use crate::test_utils;

    use super::*;

    fn transition() -> SlotTransition {
        SlotTransition::new(Arc::new(ValidatorStore::new()))
    }

    #[test]
    fn advance_state_without_block_does_not_mutate_input() -> Result<()> {
        let transition = transition();
        let state = test_utils::genesis_state::<Minimal>(16);

        let advanced = transition.advance_state(&state, None)?;

        assert_eq!(state.slot, 0);
        assert_eq!(advanced.slot, 1);
        assert_eq!(advanced.latest_block_header.slot, 0);

        Ok(())
    }

    #[test]
    fn advance_state_reproduces_produced_block() -> Result<()> {
        let transition = transition();
        let state = test_utils::genesis_state::<Minimal>(16);
        let (block, post_state) = transition.produce_block(&state, 1, vec![], H256::zero())?;

        let advanced = transition.advance_state(&state, Some(&block))?;

        assert_eq!(advanced, post_state);
        assert_eq!(accessors::latest_block_root(&advanced), block.content_root());

        Ok(())
    }

    #[test]
    fn advance_state_rejects_wrong_state_root() -> Result<()> {
        let transition = transition();
        let state = test_utils::genesis_state::<Minimal>(16);
        let (mut block, _) = transition.produce_block(&state, 1, vec![], H256::zero())?;

        block.state_root = H256::repeat_byte(1);

        let error = transition
            .advance_state(&state, Some(&block))
            .expect_err("state root does not match");

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::StateRootMismatch { .. }),
        ));

        Ok(())
    }

    #[test]
    fn advance_state_rejects_wrong_parent() -> Result<()> {
        let transition = transition();
        let state = test_utils::genesis_state::<Minimal>(16);
        let (mut block, _) = transition.produce_block(&state, 1, vec![], H256::zero())?;

        block.parent_root = H256::repeat_byte(1);

        let error = transition
            .advance_state(&state, Some(&block))
            .expect_err("parent root does not match");

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::ParentRootMismatch { .. }),
        ));

        Ok(())
    }

    #[test]
    fn advance_state_rejects_wrong_proposer() -> Result<()> {
        let transition = transition();
        let state = test_utils::genesis_state::<Minimal>(16);
        let (mut block, _) = transition.produce_block(&state, 1, vec![], H256::zero())?;

        block.proposer_index = (block.proposer_index + 1) % 16;

        let error = transition
            .advance_state(&state, Some(&block))
            .expect_err("proposer index does not match");

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::ProposerIndexMismatch { .. }),
        ));

        Ok(())
    }

    #[test]
    fn advance_state_rejects_block_from_later_slot() -> Result<()> {
        let transition = transition();
        let state = test_utils::genesis_state::<Minimal>(16);
        let (block, _) = transition.produce_block(&state, 2, vec![], H256::zero())?;

        let error = transition
            .advance_state(&state, Some(&block))
            .expect_err("block is 2 slots ahead");

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::SlotMismatch {
                state_slot: 1,
                block_slot: 2,
            }),
        ));

        Ok(())
    }

    #[test]
    fn full_participation_justifies_and_finalizes() -> Result<()> {
        let transition = transition();
        let genesis_state = test_utils::genesis_state::<Minimal>(32);
        let epochs = 4;

        let chain = test_utils::chain_with_full_participation(
            &transition,
            &genesis_state,
            epochs * Minimal::SLOTS_PER_EPOCH.get(),
        )?;

        let (_, head_state) = chain.last().expect("chain is not empty");

        assert_eq!(accessors::get_current_epoch(head_state), epochs);
        assert_eq!(head_state.current_justified_checkpoint.epoch, 3);
        assert_eq!(head_state.finalized_checkpoint.epoch, 2);

        let (boundary_block, _) = &chain[usize::try_from(2 * Minimal::SLOTS_PER_EPOCH.get())? - 1];

        assert_eq!(
            head_state.finalized_checkpoint.root,
            boundary_block.content_root(),
        );

        Ok(())
    }
}
