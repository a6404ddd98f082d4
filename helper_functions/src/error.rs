use thiserror::Error;
use types::phase0::primitives::{CommitteeIndex, Epoch, Slot, ValidatorIndex};

#[derive(Debug, Error)]
pub enum Error {
    #[error("aggregation bit {position} is set but committee has only {committee_length} members")]
    AggregationBitOutOfRange {
        position: usize,
        committee_length: usize,
    },
    #[error("committee index {index} is out of bounds ({committees_per_slot} committees per slot)")]
    CommitteeIndexOutOfBounds {
        index: CommitteeIndex,
        committees_per_slot: u64,
    },
    #[error(
        "aggregation bitfield of {aggregation_bits_length} bytes \
         does not fit committee of {committee_length} members"
    )]
    CommitteeLengthMismatch {
        aggregation_bits_length: usize,
        committee_length: usize,
    },
    #[error("epoch {epoch} is after next one relative to state")]
    EpochAfterNext { epoch: Epoch },
    #[error("epoch {epoch} is before previous one relative to state")]
    EpochBeforePrevious { epoch: Epoch },
    #[error("failed to select proposer")]
    FailedToSelectProposer,
    #[error("no validators are active")]
    NoActiveValidators,
    #[error("slot {slot} is out of range of block roots in state at slot {state_slot}")]
    SlotOutOfRange { slot: Slot, state_slot: Slot },
    #[error("validator index {validator_index} is out of bounds")]
    ValidatorIndexOutOfBounds { validator_index: ValidatorIndex },
}
