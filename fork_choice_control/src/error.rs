use thiserror::Error;
use types::phase0::primitives::{Slot, ValidatorIndex, H256};

#[derive(Debug, Error)]
pub enum Error {
    #[error("block {block_root:?} does not descend from finalized block {finalized_root:?}")]
    BlockNotDescendantOfFinalized {
        block_root: H256,
        finalized_root: H256,
    },
    #[error("invalid validator index {validator_index}")]
    InvalidValidatorIndex { validator_index: ValidatorIndex },
    #[error("parent {parent_root:?} of block {block_root:?} is missing")]
    MissingAncestor { block_root: H256, parent_root: H256 },
    #[error("block {block_root:?} is missing")]
    MissingBlock { block_root: H256 },
    #[error("target slot ({target_slot}) is before finalized slot ({finalized_slot})")]
    TargetBeforeFinalized {
        target_slot: Slot,
        finalized_slot: Slot,
    },
}
