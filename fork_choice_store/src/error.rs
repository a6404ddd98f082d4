use thiserror::Error;
use types::phase0::primitives::H256;

#[derive(Debug, Error)]
pub enum Error {
    #[error("state cannot be saved for block {block_root:?} that is not stored")]
    StateForUnknownBlock { block_root: H256 },
}
