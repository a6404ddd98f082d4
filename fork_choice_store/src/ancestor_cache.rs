use core::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use types::{
    nonstandard::AttestationTarget,
    phase0::primitives::{Slot, H256},
};

/// Maps a block and a slot to the ancestor of the block at or before that slot.
///
/// Entries are never invalidated. A block's ancestry cannot change, so an entry only becomes
/// useless when its block is no longer stored.
pub struct AncestorCache {
    ancestors: Mutex<LruCache<(H256, Slot), AttestationTarget>>,
}

impl AncestorCache {
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            ancestors: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the cached ancestor of `block_root` at `slot`.
    ///
    /// A hit marks the entry as most recently used.
    #[must_use]
    pub fn ancestor_by_slot(&self, block_root: H256, slot: Slot) -> Option<AttestationTarget> {
        self.ancestors.lock().get(&(block_root, slot)).copied()
    }

    pub fn add_block_ancestor(&self, block_root: H256, slot: Slot, ancestor: AttestationTarget) {
        self.ancestors.lock().put((block_root, slot), ancestor);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ancestors.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ancestors.lock().is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> NonZeroUsize {
        self.ancestors.lock().cap()
    }
}
