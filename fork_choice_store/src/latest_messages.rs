use im::HashMap;
use parking_lot::RwLock;
use types::phase0::primitives::ValidatorIndex;

use crate::misc::LatestMessage;

/// Latest message of every validator that has attested.
///
/// Messages only move forward. A message replaces the stored one if its slot is not lower.
#[derive(Default)]
pub struct LatestMessages {
    messages: RwLock<HashMap<ValidatorIndex, LatestMessage>>,
}

impl LatestMessages {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, validator_index: ValidatorIndex) -> Option<LatestMessage> {
        self.messages.read().get(&validator_index).copied()
    }

    /// Stores `message` unless a message from a later slot is already stored.
    ///
    /// Returns `true` if `message` was stored.
    pub fn insert_if_newer(&self, validator_index: ValidatorIndex, message: LatestMessage) -> bool {
        let mut messages = self.messages.write();

        match messages.get(&validator_index) {
            Some(stored) if stored.slot > message.slot => false,
            _ => {
                messages.insert(validator_index, message);
                true
            }
        }
    }

    /// Returns a copy of all messages that is unaffected by later updates.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<ValidatorIndex, LatestMessage> {
        self.messages.read().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}
