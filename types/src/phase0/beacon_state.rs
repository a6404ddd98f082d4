use core::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::{
    collections::{HistoryVector, JustificationBits},
    phase0::{
        containers::{
            BeaconBlockBody, BeaconBlockHeader, Checkpoint, PendingAttestation, Validator,
        },
        primitives::{Slot, UnixSeconds, H256},
    },
    preset::Preset,
    traits::ContentRoot as _,
};

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(bound = "", deny_unknown_fields)]
pub struct BeaconState<P: Preset> {
    pub genesis_time: UnixSeconds,
    pub slot: Slot,
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: HistoryVector<H256>,
    pub state_roots: HistoryVector<H256>,
    pub validators: Vec<Validator>,
    pub randao_mixes: HistoryVector<H256>,
    pub previous_epoch_attestations: Vec<PendingAttestation>,
    pub current_epoch_attestations: Vec<PendingAttestation>,
    pub justification_bits: JustificationBits,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
    #[serde(skip)]
    phantom: PhantomData<P>,
}

impl<P: Preset> BeaconState<P> {
    /// Constructs a state at `GENESIS_SLOT` with every validator already active.
    #[must_use]
    pub fn genesis(
        genesis_time: UnixSeconds,
        validators: Vec<Validator>,
        initial_randao_mix: H256,
    ) -> Self {
        let latest_block_header = BeaconBlockHeader {
            body_root: BeaconBlockBody::default().content_root(),
            ..BeaconBlockHeader::default()
        };

        Self {
            genesis_time,
            slot: 0,
            latest_block_header,
            block_roots: HistoryVector::filled(H256::zero(), P::SLOTS_PER_HISTORICAL_ROOT),
            state_roots: HistoryVector::filled(H256::zero(), P::SLOTS_PER_HISTORICAL_ROOT),
            validators,
            randao_mixes: HistoryVector::filled(
                initial_randao_mix,
                P::EPOCHS_PER_HISTORICAL_VECTOR,
            ),
            previous_epoch_attestations: vec![],
            current_epoch_attestations: vec![],
            justification_bits: JustificationBits::default(),
            previous_justified_checkpoint: Checkpoint::default(),
            current_justified_checkpoint: Checkpoint::default(),
            finalized_checkpoint: Checkpoint::default(),
            phantom: PhantomData,
        }
    }
}
