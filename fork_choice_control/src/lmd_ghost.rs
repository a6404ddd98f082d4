use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use fork_choice_store::Storage;
use helper_functions::{accessors, predicates};
use transition_functions::StateTransition;
use types::{
    nonstandard::AttestationTarget,
    phase0::{
        beacon_state::BeaconState,
        containers::BeaconBlock,
        primitives::{Gwei, Slot, ValidatorIndex, H256},
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
    /// Returns children of `block_root` with slots not later than `state.slot`.
    ///
    /// Children are ordered by slot and then by root.
    pub fn block_children(
        &self,
        block_root: H256,
        state: &BeaconState<P>,
    ) -> Result<Vec<(H256, Arc<BeaconBlock>)>> {
        let mut children = vec![];

        for child_root in self.storage.children_of(block_root)? {
            let child = self
                .storage
                .block_by_root(child_root)?
                .ok_or(Error::MissingBlock {
                    block_root: child_root,
                })?;

            if child.slot <= state.slot {
                children.push((child_root, child));
            }
        }

        children.sort_by_key(|(root, block)| (block.slot, *root));

        Ok(children)
    }

    /// Sums effective balances of validators whose vote target is `block_root` or one of its
    /// descendants.
    ///
    /// Only validators active in the current epoch of `state` are counted.
    /// Votes whose ancestry cannot be traced back to the slot of `block` are not counted.
    pub fn vote_count(
        &self,
        block_root: H256,
        block: &BeaconBlock,
        state: &BeaconState<P>,
        vote_targets: &HashMap<ValidatorIndex, AttestationTarget>,
    ) -> Result<Gwei> {
        let current_epoch = accessors::get_current_epoch(state);
        let mut count = 0;

        for (validator_index, target) in vote_targets {
            let Some(ancestor) = self.ancestor_at_slot(*target, block.slot)? else {
                continue;
            };

            if ancestor.block_root != block_root {
                continue;
            }

            let balance = usize::try_from(*validator_index)
                .ok()
                .and_then(|index| state.validators.get(index))
                .filter(|validator| predicates::is_active_validator(validator, current_epoch))
                .map_or(0, |validator| validator.effective_balance);

            count += balance;
        }

        Ok(count)
    }

    /// Runs LMD-GHOST starting from `start_root`.
    ///
    /// Descends into the child with the most votes until reaching a leaf.
    /// Ties are broken in favor of the lexicographically smallest root.
    pub fn lmd_ghost(
        &self,
        start_root: H256,
        start_block: Arc<BeaconBlock>,
        state: &BeaconState<P>,
        vote_targets: &HashMap<ValidatorIndex, AttestationTarget>,
    ) -> Result<(H256, Arc<BeaconBlock>)> {
        let mut head = (start_root, start_block);

        loop {
            let mut candidates = vec![];

            for (child_root, child) in self.block_children(head.0, state)? {
                let votes = self.vote_count(child_root, &child, state, vote_targets)?;
                candidates.push((votes, child_root, child));
            }

            let best = candidates
                .into_iter()
                .max_by(|(votes_a, root_a, _), (votes_b, root_b, _)| {
                    votes_a.cmp(votes_b).then_with(|| root_b.cmp(root_a))
                });

            match best {
                Some((_, child_root, child)) => head = (child_root, child),
                None => return Ok(head),
            }
        }
    }

    /// Returns `true` if `descendant_root` is `ancestor_root` or one of its descendants.
    pub fn is_descendant(&self, ancestor_root: H256, descendant_root: H256) -> Result<bool> {
        let ancestor = self.block(ancestor_root)?;
        let mut block_root = descendant_root;
        let mut block = self.block(descendant_root)?;

        while block.slot > ancestor.slot {
            // The walk reached the start of the chain.
            if block.parent_root.is_zero() {
                return Ok(false);
            }

            let parent = self
                .storage
                .block_by_root(block.parent_root)?
                .ok_or(Error::MissingAncestor {
                    block_root,
                    parent_root: block.parent_root,
                })?;

            block_root = block.parent_root;
            block = parent;
        }

        Ok(block_root == ancestor_root)
    }

    /// Finds the ancestor of `target` at or before `slot`.
    ///
    /// Returns [`None`] if a block in the ancestry is missing.
    pub(crate) fn ancestor_at_slot(
        &self,
        target: AttestationTarget,
        slot: Slot,
    ) -> Result<Option<AttestationTarget>> {
        if target.slot <= slot {
            return Ok(Some(target));
        }

        if let Some(ancestor) = self.ancestor_cache.ancestor_by_slot(target.block_root, slot) {
            return Ok(Some(ancestor));
        }

        let mut ancestor = target;

        while ancestor.slot > slot {
            let Some(parent) = self.storage.block_by_root(ancestor.parent_root)? else {
                return Ok(None);
            };

            ancestor = AttestationTarget::new(ancestor.parent_root, &parent);
        }

        self.ancestor_cache
            .add_block_ancestor(target.block_root, slot, ancestor);

        Ok(Some(ancestor))
    }

    pub(crate) fn block(&self, block_root: H256) -> Result<Arc<BeaconBlock>> {
        self.storage
            .block_by_root(block_root)?
            .ok_or_else(|| Error::MissingBlock { block_root }.into())
    }
}
