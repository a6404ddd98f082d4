//! Deterministic slot, epoch and block processing.
//!
//! Only the parts of the state transition that committee derivation and fork choice depend on
//! are implemented. There are no rewards, penalties, slashings or registry updates, so the set
//! of active validators never changes after genesis.

pub use crate::{
    error::Error,
    state_transition::{SlotTransition, StateTransition},
};

pub mod block_processing;
pub mod epoch_processing;
pub mod slot_processing;

mod block_production;
mod error;
mod state_transition;

#[cfg(test)]
mod test_utils;
