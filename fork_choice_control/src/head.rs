use anyhow::Result;
use fork_choice_store::{ChainLink, Storage};
use log::{debug, info, warn};
use transition_functions::StateTransition;
use types::{
    phase0::{beacon_state::BeaconState, containers::BeaconBlock, primitives::H256},
    preset::Preset,
};

use crate::Controller;

/// How the chain head changed after running the fork choice rule.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HeadUpdate {
    Unchanged,
    /// The new head descends from the old one.
    Extended,
    Reorganized {
        old_head: H256,
        new_head: H256,
    },
}

impl<P, S, T> Controller<P, S, T>
where
    P: Preset,
    S: Storage<P>,
    T: StateTransition<P>,
{
    /// Runs LMD-GHOST from the justified block and stores the result as the chain head.
    ///
    /// `post_state` is the post-state of `block`, which should be the most recently received
    /// block. Its checkpoints are stored first. Its slot bounds the blocks considered and its
    /// registry supplies vote weights.
    pub fn apply_fork_choice_rule(
        &self,
        block: &BeaconBlock,
        post_state: &BeaconState<P>,
    ) -> Result<HeadUpdate> {
        debug!(
            "applying fork choice rule (block slot: {}, parent root: {:?})",
            block.slot, block.parent_root,
        );

        self.update_ffg_checkpoints(post_state)?;

        let justified = self.storage.justified_checkpoint()?.chain_link;
        let vote_targets = self.attestation_targets(post_state)?;

        let (new_root, new_block) = self.lmd_ghost(
            justified.block_root,
            justified.block,
            post_state,
            &vote_targets,
        )?;

        let old_head = self.storage.chain_head()?;

        if old_head.block_root == new_root {
            return Ok(HeadUpdate::Unchanged);
        }

        let update = if self.is_descendant(old_head.block_root, new_root)? {
            HeadUpdate::Extended
        } else {
            warn!(
                "Reorg happened (old head slot: {}, old head root: {:?}, \
                 new head slot: {}, new head root: {new_root:?})",
                old_head.slot(),
                old_head.block_root,
                new_block.slot,
            );

            HeadUpdate::Reorganized {
                old_head: old_head.block_root,
                new_head: new_root,
            }
        };

        let state = self.state_for_block(new_root)?;
        let slot = new_block.slot;

        self.storage.update_chain_head(ChainLink {
            block_root: new_root,
            block: new_block,
            state,
        })?;

        info!("Chain head block and state updated (slot: {slot}, root: {new_root:?})");

        Ok(update)
    }
}
