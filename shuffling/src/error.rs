use thiserror::Error;

use crate::MAX_LIST_SIZE;

#[derive(Debug, Error)]
pub enum Error {
    #[error("index {index} is out of bounds for a list of {index_count} elements")]
    IndexOutOfBounds { index: u64, index_count: u64 },
    #[error("list of {length} elements exceeds the maximum of {max}", max = MAX_LIST_SIZE)]
    ListTooLong { length: u64 },
}
