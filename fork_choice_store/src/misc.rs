use core::fmt::{Formatter, Result as FmtResult};
use std::sync::Arc;

use derivative::Derivative;
use helper_functions::misc;
use types::{
    phase0::{
        beacon_state::BeaconState,
        containers::{AttestationData, BeaconBlock},
        primitives::{CommitteeIndex, Epoch, Slot, H256},
    },
    preset::Preset,
};

/// A block together with its post-state.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub struct ChainLink<P: Preset> {
    pub block_root: H256,
    #[derivative(Debug(format_with = "fmt_block_concisely"))]
    pub block: Arc<BeaconBlock>,
    #[derivative(Debug(format_with = "fmt_as_wildcard"))]
    pub state: Arc<BeaconState<P>>,
}

impl<P: Preset> ChainLink<P> {
    #[must_use]
    pub fn slot(&self) -> Slot {
        self.block.slot
    }

    #[must_use]
    pub fn epoch(&self) -> Epoch {
        misc::compute_epoch_at_slot::<P>(self.slot())
    }
}

/// A justified or finalized checkpoint resolved to a stored block.
///
/// `epoch` is the checkpoint epoch. The block may be from an earlier epoch if the first slot of
/// the checkpoint epoch was skipped.
#[derive(Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub struct CheckpointLink<P: Preset> {
    pub epoch: Epoch,
    pub chain_link: ChainLink<P>,
}

impl<P: Preset> CheckpointLink<P> {
    #[must_use]
    pub const fn new(epoch: Epoch, chain_link: ChainLink<P>) -> Self {
        Self { epoch, chain_link }
    }

    #[must_use]
    pub const fn block_root(&self) -> H256 {
        self.chain_link.block_root
    }
}

/// The latest attestation seen from a validator.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LatestMessage {
    pub slot: Slot,
    pub index: CommitteeIndex,
    // This is the LMD GHOST vote and corresponds to `AttestationData.beacon_block_root`.
    pub beacon_block_root: H256,
}

impl From<AttestationData> for LatestMessage {
    fn from(data: AttestationData) -> Self {
        Self {
            slot: data.slot,
            index: data.index,
            beacon_block_root: data.beacon_block_root,
        }
    }
}

fn fmt_block_concisely(block: &Arc<BeaconBlock>, formatter: &mut Formatter) -> FmtResult {
    formatter
        .debug_struct("BeaconBlock")
        .field("slot", &block.slot)
        .field("parent_root", &block.parent_root)
        .finish_non_exhaustive()
}

fn fmt_as_wildcard<T>(_: T, formatter: &mut Formatter) -> FmtResult {
    formatter.write_str("_")
}
