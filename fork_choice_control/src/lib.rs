//! LMD-GHOST fork choice on top of [`fork_choice_store`].
//!
//! [`Controller`] ties together latest messages, the ancestor cache, block and state storage
//! and the state transition. It is safe to share between threads, but callers must not run
//! [`Controller::apply_fork_choice_rule`] concurrently. The rule reads the chain head and then
//! overwrites it.

pub use crate::{controller::Controller, error::Error, head::HeadUpdate};

mod attestations;
mod checkpoints;
mod controller;
mod error;
mod head;
mod lmd_ghost;
mod state_generator;

#[cfg(test)]
mod test_utils;
