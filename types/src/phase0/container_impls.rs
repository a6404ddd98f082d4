use bit_field::BitArray as _;

use crate::{
    phase0::{
        beacon_state::BeaconState,
        consts::{FAR_FUTURE_EPOCH, GENESIS_EPOCH},
        containers::{
            Attestation, AttestationData, BeaconBlock, BeaconBlockBody, BeaconBlockHeader,
            PendingAttestation, Validator,
        },
        primitives::{Gwei, H256},
    },
    preset::Preset,
    traits::ContentRoot,
};

impl ContentRoot for Attestation {}
impl ContentRoot for AttestationData {}
impl ContentRoot for BeaconBlockBody {}
impl ContentRoot for BeaconBlockHeader {}
impl<P: Preset> ContentRoot for BeaconState<P> {}

// A block and its header have the same root so that roots cached in `BeaconState` can be
// compared with roots of stored blocks.
impl ContentRoot for BeaconBlock {
    fn content_root(&self) -> H256 {
        self.to_header().content_root()
    }
}

impl BeaconBlock {
    #[must_use]
    pub fn to_header(&self) -> BeaconBlockHeader {
        BeaconBlockHeader {
            slot: self.slot,
            proposer_index: self.proposer_index,
            parent_root: self.parent_root,
            state_root: self.state_root,
            body_root: self.body.content_root(),
        }
    }
}

impl Attestation {
    /// Builds an attestation with the given positions in the committee set.
    ///
    /// Every position must be smaller than `committee_size`.
    #[must_use]
    pub fn with_participants(
        data: AttestationData,
        committee_size: usize,
        positions: impl IntoIterator<Item = usize>,
    ) -> Self {
        let mut aggregation_bits = vec![0; committee_size.div_ceil(8)];

        for position in positions {
            aggregation_bits.set_bit(position, true);
        }

        Self {
            aggregation_bits,
            data,
        }
    }

    pub fn participant_positions(&self) -> impl Iterator<Item = usize> + '_ {
        set_bit_positions(&self.aggregation_bits)
    }
}

impl PendingAttestation {
    pub fn participant_positions(&self) -> impl Iterator<Item = usize> + '_ {
        set_bit_positions(&self.aggregation_bits)
    }
}

impl Validator {
    #[must_use]
    pub const fn active_since_genesis(effective_balance: Gwei) -> Self {
        Self {
            effective_balance,
            slashed: false,
            activation_epoch: GENESIS_EPOCH,
            exit_epoch: FAR_FUTURE_EPOCH,
        }
    }
}

impl<P: Preset> BeaconState<P> {
    /// Returns the block whose post-state is `self`.
    ///
    /// Only meaningful for a state produced by [`BeaconState::genesis`].
    #[must_use]
    pub fn genesis_block(&self) -> BeaconBlock {
        BeaconBlock {
            state_root: self.content_root(),
            ..BeaconBlock::default()
        }
    }
}

fn set_bit_positions(bits: &[u8]) -> impl Iterator<Item = usize> + '_ {
    (0..bits.bit_length()).filter(|position| bits.get_bit(*position))
}
