use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use anyhow::{ensure, Result};
use log::debug;
use parking_lot::RwLock;
use types::{
    phase0::{
        beacon_state::BeaconState,
        containers::BeaconBlock,
        primitives::{Slot, H256},
    },
    preset::Preset,
};

use crate::{
    error::Error,
    misc::{ChainLink, CheckpointLink},
};

/// Persistent storage of blocks, states and fork choice checkpoints.
///
/// Implementations are expected to be internally synchronized.
/// Errors are propagated to callers unchanged.
pub trait Storage<P: Preset>: Send + Sync {
    fn save_block(&self, block_root: H256, block: Arc<BeaconBlock>) -> Result<()>;

    fn block_by_root(&self, block_root: H256) -> Result<Option<Arc<BeaconBlock>>>;

    /// Returns roots of all stored blocks whose parent is `parent_root`.
    fn children_of(&self, parent_root: H256) -> Result<Vec<H256>>;

    fn save_state(&self, block_root: H256, state: Arc<BeaconState<P>>) -> Result<()>;

    /// Returns the post-state of the block with root `block_root` if it was saved.
    fn state_by_block_root(&self, block_root: H256) -> Result<Option<Arc<BeaconState<P>>>>;

    fn chain_head(&self) -> Result<ChainLink<P>>;

    /// Replaces the chain head and makes its ancestry the canonical chain.
    fn update_chain_head(&self, head: ChainLink<P>) -> Result<()>;

    /// Returns the root of the canonical block at `slot`, or [`None`] if `slot` was skipped.
    fn canonical_block_root(&self, slot: Slot) -> Result<Option<H256>>;

    fn justified_checkpoint(&self) -> Result<CheckpointLink<P>>;

    fn save_justified_checkpoint(&self, checkpoint: CheckpointLink<P>) -> Result<()>;

    fn finalized_checkpoint(&self) -> Result<CheckpointLink<P>>;

    fn save_finalized_checkpoint(&self, checkpoint: CheckpointLink<P>) -> Result<()>;

    fn justified_block(&self) -> Result<Arc<BeaconBlock>> {
        Ok(self.justified_checkpoint()?.chain_link.block)
    }

    fn justified_state(&self) -> Result<Arc<BeaconState<P>>> {
        Ok(self.justified_checkpoint()?.chain_link.state)
    }

    fn finalized_block(&self) -> Result<Arc<BeaconBlock>> {
        Ok(self.finalized_checkpoint()?.chain_link.block)
    }

    fn finalized_state(&self) -> Result<Arc<BeaconState<P>>> {
        Ok(self.finalized_checkpoint()?.chain_link.state)
    }
}

/// [`Storage`] that keeps everything in memory.
pub struct InMemoryStorage<P: Preset> {
    inner: RwLock<Inner<P>>,
}

struct Inner<P: Preset> {
    blocks: HashMap<H256, Arc<BeaconBlock>>,
    children: HashMap<H256, Vec<H256>>,
    states: HashMap<H256, Arc<BeaconState<P>>>,
    canonical_roots: BTreeMap<Slot, H256>,
    head: ChainLink<P>,
    justified_checkpoint: CheckpointLink<P>,
    finalized_checkpoint: CheckpointLink<P>,
}

impl<P: Preset> InMemoryStorage<P> {
    /// Creates storage containing only `anchor`.
    ///
    /// The anchor is the chain head and both checkpoints.
    #[must_use]
    pub fn new(anchor: ChainLink<P>) -> Self {
        let block_root = anchor.block_root;
        let checkpoint = CheckpointLink::new(anchor.epoch(), anchor.clone());

        let inner = Inner {
            blocks: HashMap::from([(block_root, Arc::clone(&anchor.block))]),
            children: HashMap::new(),
            states: HashMap::from([(block_root, Arc::clone(&anchor.state))]),
            canonical_roots: BTreeMap::from([(anchor.slot(), block_root)]),
            head: anchor,
            justified_checkpoint: checkpoint.clone(),
            finalized_checkpoint: checkpoint,
        };

        Self {
            inner: RwLock::new(inner),
        }
    }
}

impl<P: Preset> Storage<P> for InMemoryStorage<P> {
    fn save_block(&self, block_root: H256, block: Arc<BeaconBlock>) -> Result<()> {
        self.inner.write().insert_block(block_root, block);
        Ok(())
    }

    fn block_by_root(&self, block_root: H256) -> Result<Option<Arc<BeaconBlock>>> {
        Ok(self.inner.read().blocks.get(&block_root).cloned())
    }

    fn children_of(&self, parent_root: H256) -> Result<Vec<H256>> {
        Ok(self
            .inner
            .read()
            .children
            .get(&parent_root)
            .cloned()
            .unwrap_or_default())
    }

    fn save_state(&self, block_root: H256, state: Arc<BeaconState<P>>) -> Result<()> {
        let mut inner = self.inner.write();

        ensure!(
            inner.blocks.contains_key(&block_root),
            Error::StateForUnknownBlock { block_root },
        );

        inner.states.insert(block_root, state);

        Ok(())
    }

    fn state_by_block_root(&self, block_root: H256) -> Result<Option<Arc<BeaconState<P>>>> {
        Ok(self.inner.read().states.get(&block_root).cloned())
    }

    fn chain_head(&self) -> Result<ChainLink<P>> {
        Ok(self.inner.read().head.clone())
    }

    fn update_chain_head(&self, head: ChainLink<P>) -> Result<()> {
        let mut inner = self.inner.write();

        inner.insert_block(head.block_root, Arc::clone(&head.block));
        inner.states.insert(head.block_root, Arc::clone(&head.state));
        inner.rewrite_canonical_roots(head.block_root, Arc::clone(&head.block));
        inner.head = head;

        Ok(())
    }

    fn canonical_block_root(&self, slot: Slot) -> Result<Option<H256>> {
        Ok(self.inner.read().canonical_roots.get(&slot).copied())
    }

    fn justified_checkpoint(&self) -> Result<CheckpointLink<P>> {
        Ok(self.inner.read().justified_checkpoint.clone())
    }

    fn save_justified_checkpoint(&self, checkpoint: CheckpointLink<P>) -> Result<()> {
        self.inner.write().justified_checkpoint = checkpoint;
        Ok(())
    }

    fn finalized_checkpoint(&self) -> Result<CheckpointLink<P>> {
        Ok(self.inner.read().finalized_checkpoint.clone())
    }

    fn save_finalized_checkpoint(&self, checkpoint: CheckpointLink<P>) -> Result<()> {
        self.inner.write().finalized_checkpoint = checkpoint;
        Ok(())
    }
}

impl<P: Preset> Inner<P> {
    fn insert_block(&mut self, block_root: H256, block: Arc<BeaconBlock>) {
        let parent_root = block.parent_root;

        if self.blocks.insert(block_root, block).is_none() {
            self.children.entry(parent_root).or_default().push(block_root);
        }
    }

    // Walks back from the new head until reaching a block that is already canonical.
    // Entries above that block belong to the abandoned branch and are replaced.
    fn rewrite_canonical_roots(&mut self, head_root: H256, head_block: Arc<BeaconBlock>) {
        let mut new_roots = vec![];
        let mut block_root = head_root;
        let mut block = head_block;

        let retained_up_to = loop {
            if self.canonical_roots.get(&block.slot) == Some(&block_root) {
                break Some(block.slot);
            }

            new_roots.push((block.slot, block_root));

            match self.blocks.get(&block.parent_root) {
                Some(parent) => {
                    block_root = block.parent_root;
                    block = Arc::clone(parent);
                }
                None => break block.slot.checked_sub(1),
            }
        };

        let first_replaced = retained_up_to.map_or(0, |slot| slot + 1);
        let replaced = self.canonical_roots.split_off(&first_replaced);

        debug!(
            "canonical chain rewritten (head: {head_root:?}, replaced: {}, added: {})",
            replaced.len(),
            new_roots.len(),
        );

        self.canonical_roots.extend(new_roots);
    }
}
