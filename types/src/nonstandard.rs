use serde::{Deserialize, Serialize};

use crate::phase0::{
    containers::BeaconBlock,
    primitives::{Slot, H256},
};

/// The block a validator's latest attestation votes for, as seen by LMD-GHOST.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Deserialize, Serialize)]
pub struct AttestationTarget {
    pub slot: Slot,
    pub block_root: H256,
    pub parent_root: H256,
}

impl AttestationTarget {
    #[must_use]
    pub const fn new(block_root: H256, block: &BeaconBlock) -> Self {
        Self {
            slot: block.slot,
            block_root,
            parent_root: block.parent_root,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RelativeEpoch {
    Previous,
    Current,
    Next,
}
