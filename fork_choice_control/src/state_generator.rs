use std::sync::Arc;

use anyhow::{ensure, Result};
use fork_choice_store::Storage;
use log::debug;
use transition_functions::StateTransition;
use types::{
    phase0::{
        beacon_state::BeaconState,
        primitives::{Slot, H256},
    },
    preset::Preset,
};

use crate::{Controller, Error};

impl<P, S, T> Controller<P, S, T>
where
    P: Preset,
    S: Storage<P>,
    T: StateTransition<P>,
{
    /// Reconstructs the state of the canonical chain at `target_slot`.
    ///
    /// Replays canonical blocks on top of the finalized state.
    /// Slots without a canonical block are processed as empty.
    pub fn generate_state_from_block(&self, target_slot: Slot) -> Result<BeaconState<P>> {
        let finalized = self.storage.finalized_checkpoint()?.chain_link;
        let finalized_slot = finalized.slot();

        ensure!(
            finalized_slot <= target_slot,
            Error::TargetBeforeFinalized {
                target_slot,
                finalized_slot,
            },
        );

        let mut state = finalized.state.as_ref().clone();

        for slot in finalized_slot + 1..=target_slot {
            match self.storage.canonical_block_root(slot)? {
                Some(block_root) => {
                    let block = self.block(block_root)?;
                    state = self.transition.advance_state(&state, Some(&block))?;
                    debug!("replayed block (slot: {slot}, root: {block_root:?})");
                }
                None => {
                    state = self.transition.advance_state(&state, None)?;
                    debug!("replayed empty slot (slot: {slot})");
                }
            }
        }

        Ok(state)
    }

    /// Reconstructs the post-state of the block with root `block_root`.
    ///
    /// The block does not have to be canonical. Its ancestry is replayed from the nearest
    /// block with a stored state, or from the finalized block if there is none.
    pub fn generate_state_for_block(&self, block_root: H256) -> Result<BeaconState<P>> {
        let finalized = self.storage.finalized_checkpoint()?.chain_link;
        let mut ancestry = vec![];
        let mut current_root = block_root;
        let mut current_block = self.block(block_root)?;

        let base_state = loop {
            if current_root == finalized.block_root {
                break finalized.state;
            }

            if let Some(state) = self.storage.state_by_block_root(current_root)? {
                break state;
            }

            ensure!(
                current_block.slot > finalized.slot(),
                Error::BlockNotDescendantOfFinalized {
                    block_root,
                    finalized_root: finalized.block_root,
                },
            );

            let parent_root = current_block.parent_root;

            let parent = self
                .storage
                .block_by_root(parent_root)?
                .ok_or(Error::MissingAncestor {
                    block_root: current_root,
                    parent_root,
                })?;

            ancestry.push(core::mem::replace(&mut current_block, parent));
            current_root = parent_root;
        };

        let mut state = base_state.as_ref().clone();

        for block in ancestry.into_iter().rev() {
            state = self.advance_to_slot(&state, block.slot)?;
            state = self.transition.advance_state(&state, Some(&block))?;

            debug!("replayed ancestor (slot: {}, target: {block_root:?})", block.slot);
        }

        Ok(state)
    }

    pub(crate) fn state_for_block(&self, block_root: H256) -> Result<Arc<BeaconState<P>>> {
        if let Some(state) = self.storage.state_by_block_root(block_root)? {
            return Ok(state);
        }

        self.generate_state_for_block(block_root).map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use fork_choice_store::StoreConfig;
    use helper_functions::ValidatorStore;
    use transition_functions::SlotTransition;

    use crate::test_utils::{Context, ForgetfulStorage};

    use super::*;

    // Blocks at 1, 2, 4, 7, 9 and 10 with the epoch boundary at 8 skipped.
    const BLOCK_SLOTS: [Slot; 6] = [1, 2, 4, 7, 9, 10];

    fn canonical_chain(context: &Context) -> Result<()> {
        let mut head = context.genesis.clone();

        for slot in BLOCK_SLOTS {
            head = context.produce_and_store(&head, slot)?;
            context
                .controller
                .apply_fork_choice_rule(&head.block, &head.state)?;
        }

        Ok(())
    }

    #[test]
    fn regenerated_head_state_matches_live_state() -> Result<()> {
        let context = Context::new(16)?;

        canonical_chain(&context)?;

        let head = context.controller.storage().chain_head()?;

        assert_eq!(head.slot(), 10);

        let generated = context.controller.generate_state_from_block(head.slot())?;

        assert_eq!(generated, *head.state);

        Ok(())
    }

    #[test]
    fn regenerated_state_after_head_processes_empty_slots() -> Result<()> {
        let context = Context::new(16)?;

        canonical_chain(&context)?;

        let head = context.controller.storage().chain_head()?;
        let expected = context.controller.advance_to_slot(&head.state, 14)?;
        let expected = context.controller.transition.advance_state(&expected, None)?;

        let generated = context.controller.generate_state_from_block(14)?;

        assert_eq!(generated.slot, 14);
        assert_eq!(generated, expected);

        Ok(())
    }

    #[test]
    fn regenerated_skip_slot_state_is_empty_slot_state() -> Result<()> {
        let context = Context::new(16)?;

        canonical_chain(&context)?;

        let block_7_root = context
            .controller
            .storage()
            .canonical_block_root(7)?
            .expect("block 7 is canonical");

        let block_7_state = context
            .controller
            .storage()
            .state_by_block_root(block_7_root)?
            .expect("state of block 7 is stored");

        let expected = context.controller.transition.advance_state(&block_7_state, None)?;

        assert_eq!(context.controller.generate_state_from_block(8)?, expected);

        Ok(())
    }

    #[test]
    fn target_before_finalized_is_rejected() -> Result<()> {
        let context = Context::new(16)?;
        let anchor = context.produce_and_store(&context.genesis, 3)?;
        let anchored = Context::with_anchor(anchor)?;

        let error = anchored
            .controller
            .generate_state_from_block(2)
            .expect_err("finalized block is at slot 3");

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::TargetBeforeFinalized {
                target_slot: 2,
                finalized_slot: 3,
            }),
        ));

        Ok(())
    }

    #[test]
    fn missing_canonical_block_is_reported() -> Result<()> {
        let context = Context::new(16)?;

        canonical_chain(&context)?;

        let hidden_root = context
            .controller
            .storage()
            .canonical_block_root(4)?
            .expect("block 4 is canonical");

        let storage = ForgetfulStorage::new(Arc::clone(&context.controller.storage), hidden_root);
        let validator_store = Arc::new(ValidatorStore::new());

        let controller = Controller::new(
            StoreConfig::default(),
            Arc::new(storage),
            SlotTransition::new(Arc::clone(&validator_store)),
            validator_store,
        )?;

        let error = controller
            .generate_state_from_block(10)
            .expect_err("block at slot 4 cannot be loaded");

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::MissingBlock { block_root }) if *block_root == hidden_root,
        ));

        Ok(())
    }

    #[test]
    fn state_for_fork_block_is_regenerated() -> Result<()> {
        let context = Context::new(16)?;
        let controller = &context.controller;

        let block_1 = context.produce_and_store(&context.genesis, 1)?;
        let block_3 = context.produce_and_store(&block_1, 3)?;
        let expected = block_3.state.as_ref().clone();

        // Forget intermediate states by rebuilding storage from blocks only.
        let fresh = Context::with_anchor(context.genesis.clone())?;

        fresh
            .controller
            .storage()
            .save_block(block_1.block_root, Arc::clone(&block_1.block))?;
        fresh
            .controller
            .storage()
            .save_block(block_3.block_root, Arc::clone(&block_3.block))?;

        assert!(fresh
            .controller
            .storage()
            .state_by_block_root(block_3.block_root)?
            .is_none());

        assert_eq!(
            fresh.controller.generate_state_for_block(block_3.block_root)?,
            expected,
        );

        assert_eq!(*fresh.controller.state_for_block(block_3.block_root)?, expected);
        assert_eq!(
            *controller.state_for_block(block_3.block_root)?,
            *block_3.state,
        );

        Ok(())
    }

    #[test]
    fn generation_rejects_blocks_outside_finalized_chain() -> Result<()> {
        let context = Context::new(16)?;
        let block_1 = context.produce_and_store(&context.genesis, 1)?;
        let block_2 = context.produce_and_store(&block_1, 2)?;
        let anchored = Context::with_anchor(block_2.clone())?;

        // A sibling of the anchor at a later slot.
        let sibling = context.produce_and_store(&block_1, 4)?;

        anchored
            .controller
            .storage()
            .save_block(block_1.block_root, Arc::clone(&block_1.block))?;
        anchored
            .controller
            .storage()
            .save_block(sibling.block_root, Arc::clone(&sibling.block))?;

        let error = anchored
            .controller
            .generate_state_for_block(sibling.block_root)
            .expect_err("sibling does not descend from the anchor");

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::BlockNotDescendantOfFinalized { .. }),
        ));

        Ok(())
    }
}
