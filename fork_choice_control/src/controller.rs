use core::marker::PhantomData;
use std::sync::Arc;

use anyhow::Result;
use fork_choice_store::{AncestorCache, ChainLink, LatestMessages, Storage, StoreConfig};
use helper_functions::ValidatorStore;
use log::debug;
use transition_functions::StateTransition;
use types::{
    phase0::{beacon_state::BeaconState, containers::BeaconBlock, primitives::Slot},
    preset::Preset,
    traits::ContentRoot as _,
};

pub struct Controller<P: Preset, S, T> {
    pub(crate) storage: Arc<S>,
    pub(crate) transition: T,
    pub(crate) validator_store: Arc<ValidatorStore>,
    pub(crate) latest_messages: LatestMessages,
    pub(crate) ancestor_cache: AncestorCache,
    phantom: PhantomData<P>,
}

impl<P, S, T> Controller<P, S, T>
where
    P: Preset,
    S: Storage<P>,
    T: StateTransition<P>,
{
    /// Creates a controller on top of `storage`.
    ///
    /// `validator_store` must be the same one `transition` uses, if it uses one.
    pub fn new(
        store_config: StoreConfig,
        storage: Arc<S>,
        transition: T,
        validator_store: Arc<ValidatorStore>,
    ) -> Result<Self> {
        let head = storage.chain_head()?;

        validator_store.initialize(&head.state);

        Ok(Self {
            storage,
            transition,
            validator_store,
            latest_messages: LatestMessages::new(),
            ancestor_cache: AncestorCache::new(store_config.ancestor_cache_size),
            phantom: PhantomData,
        })
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub const fn transition(&self) -> &T {
        &self.transition
    }

    #[must_use]
    pub const fn latest_messages(&self) -> &LatestMessages {
        &self.latest_messages
    }

    #[must_use]
    pub const fn ancestor_cache(&self) -> &AncestorCache {
        &self.ancestor_cache
    }

    /// Applies `block` to the post-state of its parent and stores both.
    ///
    /// Slots between the parent and `block` are processed as empty.
    /// The chain head is not updated. Call [`Self::apply_fork_choice_rule`] for that.
    pub fn on_block(&self, block: BeaconBlock) -> Result<ChainLink<P>> {
        let parent_state = self.state_for_block(block.parent_root)?;
        let mut state = self.advance_to_slot(&parent_state, block.slot)?;

        state = self.transition.advance_state(&state, Some(&block))?;

        let block_root = block.content_root();
        let block = Arc::new(block);
        let state = Arc::new(state);

        self.storage.save_block(block_root, Arc::clone(&block))?;
        self.storage.save_state(block_root, Arc::clone(&state))?;

        debug!("block stored (slot: {}, root: {block_root:?})", block.slot);

        Ok(ChainLink {
            block_root,
            block,
            state,
        })
    }

    // Processes empty slots until `state` is one slot before `slot`.
    pub(crate) fn advance_to_slot(
        &self,
        state: &BeaconState<P>,
        slot: Slot,
    ) -> Result<BeaconState<P>> {
        let mut state = state.clone();

        while state.slot + 1 < slot {
            state = self.transition.advance_state(&state, None)?;
        }

        Ok(state)
    }
}
