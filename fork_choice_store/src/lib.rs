//! Data structures fork choice reads and writes.
//!
//! Blocks and states live behind the [`Storage`] trait. [`InMemoryStorage`] is the only
//! implementation here. Hosts with a database are expected to provide their own.
//!
//! [`LatestMessages`] and [`AncestorCache`] each have their own lock so that attestation
//! processing and vote counting do not contend with each other.

pub use crate::{
    ancestor_cache::AncestorCache,
    error::Error,
    latest_messages::LatestMessages,
    misc::{ChainLink, CheckpointLink, LatestMessage},
    storage::{InMemoryStorage, Storage},
    store_config::StoreConfig,
};

mod ancestor_cache;
mod error;
mod latest_messages;
mod misc;
mod storage;
mod store_config;
