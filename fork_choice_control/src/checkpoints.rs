use anyhow::Result;
use fork_choice_store::{ChainLink, CheckpointLink, Storage};
use helper_functions::{accessors, misc};
use log::info;
use transition_functions::StateTransition;
use types::{
    phase0::{beacon_state::BeaconState, primitives::Epoch},
    preset::Preset,
};

use crate::{Controller, Error};

impl<P, S, T> Controller<P, S, T>
where
    P: Preset,
    S: Storage<P>,
    T: StateTransition<P>,
{
    /// Stores the justified and finalized checkpoints of `state` if they are newer than the
    /// stored ones.
    ///
    /// The two checkpoints are updated independently. Neither ever moves to an earlier epoch.
    /// Advancing the finalized checkpoint drops cached committees for epochs before the one
    /// preceding it.
    pub fn update_ffg_checkpoints(&self, state: &BeaconState<P>) -> Result<()> {
        let justified_epoch = state.current_justified_checkpoint.epoch;

        if justified_epoch > self.storage.justified_checkpoint()?.epoch {
            let checkpoint = self.resolve_checkpoint(state, justified_epoch)?;

            info!(
                "justified checkpoint updated (epoch: {justified_epoch}, block slot: {}, \
                 block root: {:?})",
                checkpoint.chain_link.slot(),
                checkpoint.block_root(),
            );

            self.storage.save_justified_checkpoint(checkpoint)?;
        }

        let finalized_epoch = state.finalized_checkpoint.epoch;

        if finalized_epoch > self.storage.finalized_checkpoint()?.epoch {
            let checkpoint = self.resolve_checkpoint(state, finalized_epoch)?;

            info!(
                "finalized checkpoint updated (epoch: {finalized_epoch}, block slot: {}, \
                 block root: {:?})",
                checkpoint.chain_link.slot(),
                checkpoint.block_root(),
            );

            self.storage.save_finalized_checkpoint(checkpoint)?;
            self.validator_store.prune(finalized_epoch.saturating_sub(1));
        }

        Ok(())
    }

    // The first slot of `epoch` may have been skipped.
    // In that case the checkpoint block is the last one before it in the chain of `state`.
    fn resolve_checkpoint(
        &self,
        state: &BeaconState<P>,
        epoch: Epoch,
    ) -> Result<CheckpointLink<P>> {
        let epoch_start_slot = misc::compute_start_slot_at_epoch::<P>(epoch);
        let mut block_root = accessors::latest_block_root(state);
        let mut block = self.block(block_root)?;

        while block.slot > epoch_start_slot {
            let parent_root = block.parent_root;

            block = self
                .storage
                .block_by_root(parent_root)?
                .ok_or(Error::MissingAncestor {
                    block_root,
                    parent_root,
                })?;

            block_root = parent_root;
        }

        let state = self.state_for_block(block_root)?;

        Ok(CheckpointLink::new(
            epoch,
            ChainLink {
                block_root,
                block,
                state,
            },
        ))
    }
}
