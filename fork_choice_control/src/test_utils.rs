use std::sync::Arc;

use anyhow::Result;
use fork_choice_store::{ChainLink, CheckpointLink, InMemoryStorage, Storage, StoreConfig};
use helper_functions::{accessors, misc, ValidatorStore};
use transition_functions::SlotTransition;
use types::{
    phase0::{
        beacon_state::BeaconState,
        containers::{Attestation, AttestationData, BeaconBlock, Checkpoint, Validator},
        primitives::{Slot, H256},
    },
    preset::{Minimal, Preset as _},
    traits::ContentRoot as _,
};

use crate::Controller;

pub struct Context {
    pub controller: Controller<Minimal, InMemoryStorage<Minimal>, SlotTransition>,
    pub genesis: ChainLink<Minimal>,
}

impl Context {
    pub fn new(validator_count: usize) -> Result<Self> {
        let validators =
            vec![Validator::active_since_genesis(Minimal::MAX_EFFECTIVE_BALANCE); validator_count];

        let state = BeaconState::genesis(0, validators, H256::repeat_byte(0x42));
        let block = state.genesis_block();

        Self::with_anchor(ChainLink {
            block_root: block.content_root(),
            block: Arc::new(block),
            state: Arc::new(state),
        })
    }

    /// Creates a controller whose storage contains only `anchor`.
    pub fn with_anchor(anchor: ChainLink<Minimal>) -> Result<Self> {
        let validator_store = Arc::new(ValidatorStore::new());
        let storage = Arc::new(InMemoryStorage::new(anchor.clone()));
        let transition = SlotTransition::new(Arc::clone(&validator_store));

        let controller =
            Controller::new(StoreConfig::default(), storage, transition, validator_store)?;

        Ok(Self {
            controller,
            genesis: anchor,
        })
    }

    pub fn produce(&self, parent: &ChainLink<Minimal>, slot: Slot) -> Result<BeaconBlock> {
        self.produce_with_attestations(parent, slot, vec![])
    }

    pub fn produce_with_attestations(
        &self,
        parent: &ChainLink<Minimal>,
        slot: Slot,
        attestations: Vec<Attestation>,
    ) -> Result<BeaconBlock> {
        let randao_reveal = H256::from_low_u64_be(slot);

        let (block, _) = self.controller.transition().produce_block(
            &parent.state,
            slot,
            attestations,
            randao_reveal,
        )?;

        Ok(block)
    }

    pub fn produce_and_store(
        &self,
        parent: &ChainLink<Minimal>,
        slot: Slot,
    ) -> Result<ChainLink<Minimal>> {
        let block = self.produce(parent, slot)?;
        self.controller.on_block(block)
    }

    /// Stores a block without a state.
    ///
    /// `graffiti` distinguishes blocks with the same slot and parent.
    pub fn store_fake_block(
        &self,
        slot: Slot,
        parent_root: H256,
        graffiti: u8,
    ) -> Result<(H256, Arc<BeaconBlock>)> {
        let mut block = BeaconBlock {
            slot,
            parent_root,
            ..BeaconBlock::default()
        };

        block.body.graffiti = H256::repeat_byte(graffiti);

        let block_root = block.content_root();
        let block = Arc::new(block);

        self.controller
            .storage()
            .save_block(block_root, Arc::clone(&block))?;

        Ok((block_root, block))
    }

    /// Returns the genesis state moved forward to `slot` without processing anything.
    pub fn state_at_slot(&self, slot: Slot) -> BeaconState<Minimal> {
        let mut state = self.genesis.state.as_ref().clone();
        state.slot = slot;
        state
    }
}

/// Attestations from every committee member at the slot of `state` voting for its latest block.
pub fn full_attestations(
    context: &Context,
    state: &BeaconState<Minimal>,
) -> Result<Vec<Attestation>> {
    let validator_store = context.controller.transition().validator_store();
    let head_root = accessors::latest_block_root(state);
    let epoch = accessors::get_current_epoch(state);

    let target_root = if misc::is_epoch_start::<Minimal>(state.slot) {
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

/// [`Storage`] that pretends one block was never saved.
pub struct ForgetfulStorage {
    inner: Arc<InMemoryStorage<Minimal>>,
    forgotten_root: H256,
}

impl ForgetfulStorage {
    pub const fn new(inner: Arc<InMemoryStorage<Minimal>>, forgotten_root: H256) -> Self {
        Self {
            inner,
            forgotten_root,
        }
    }
}

impl Storage<Minimal> for ForgetfulStorage {
    fn save_block(&self, block_root: H256, block: Arc<BeaconBlock>) -> Result<()> {
        self.inner.save_block(block_root, block)
    }

    fn block_by_root(&self, block_root: H256) -> Result<Option<Arc<BeaconBlock>>> {
        if block_root == self.forgotten_root {
            return Ok(None);
        }

        self.inner.block_by_root(block_root)
    }

    fn children_of(&self, parent_root: H256) -> Result<Vec<H256>> {
        self.inner.children_of(parent_root)
    }

    fn save_state(&self, block_root: H256, state: Arc<BeaconState<Minimal>>) -> Result<()> {
        self.inner.save_state(block_root, state)
    }

    fn state_by_block_root(&self, block_root: H256) -> Result<Option<Arc<BeaconState<Minimal>>>> {
        self.inner.state_by_block_root(block_root)
    }

    fn chain_head(&self) -> Result<ChainLink<Minimal>> {
        self.inner.chain_head()
    }

    fn update_chain_head(&self, head: ChainLink<Minimal>) -> Result<()> {
        self.inner.update_chain_head(head)
    }

    fn canonical_block_root(&self, slot: Slot) -> Result<Option<H256>> {
        self.inner.canonical_block_root(slot)
    }

    fn justified_checkpoint(&self) -> Result<CheckpointLink<Minimal>> {
        self.inner.justified_checkpoint()
    }

    fn save_justified_checkpoint(&self, checkpoint: CheckpointLink<Minimal>) -> Result<()> {
        self.inner.save_justified_checkpoint(checkpoint)
    }

    fn finalized_checkpoint(&self) -> Result<CheckpointLink<Minimal>> {
        self.inner.finalized_checkpoint()
    }

    fn save_finalized_checkpoint(&self, checkpoint: CheckpointLink<Minimal>) -> Result<()> {
        self.inner.save_finalized_checkpoint(checkpoint)
    }
}
