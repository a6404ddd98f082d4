pub use crate::{error::Error, validator_store::ValidatorStore};

pub mod accessors;
pub mod misc;
pub mod predicates;

mod error;
mod validator_store;

#[cfg(test)]
mod test_utils;
