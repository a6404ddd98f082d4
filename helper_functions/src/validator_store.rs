use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use log::debug;
use parking_lot::Mutex;
use types::{
    phase0::{
        beacon_state::BeaconState,
        primitives::{Epoch, ValidatorIndex, H256},
    },
    preset::Preset,
};

use crate::{accessors, predicates};

/// Cache of active validator indices and their shufflings per epoch.
///
/// Construct one when the node starts and pass it to everything that derives committees.
/// Active indices are keyed by epoch alone. This relies on the validator registry changing only
/// through epoch processing, so all states in the same epoch agree on which validators are
/// active. Shufflings are additionally keyed by seed because seeds differ between forks.
#[derive(Default)]
pub struct ValidatorStore {
    active_indices: Mutex<HashMap<Epoch, Arc<[ValidatorIndex]>>>,
    shufflings: Mutex<HashMap<(Epoch, H256), Arc<[ValidatorIndex]>>>,
}

impl ValidatorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Populates the cache for the current and next epochs of `state`.
    pub fn initialize<P: Preset>(&self, state: &BeaconState<P>) {
        let current_epoch = accessors::get_current_epoch(state);

        for epoch in [current_epoch, current_epoch + 1] {
            let indices = self.active_validator_indices(state, epoch);
            debug!("active validators cached (epoch: {epoch}, count: {})", indices.len());
        }
    }

    pub fn active_validator_indices<P: Preset>(
        &self,
        state: &BeaconState<P>,
        epoch: Epoch,
    ) -> Arc<[ValidatorIndex]> {
        if let Some(indices) = self.active_indices.lock().get(&epoch) {
            return Arc::clone(indices);
        }

        // Computed without holding the lock. Concurrent callers may compute the same list.
        let indices = (0..)
            .zip(&state.validators)
            .filter(|(_, validator)| predicates::is_active_validator(validator, epoch))
            .map(|(index, _)| index)
            .collect::<Arc<[_]>>();

        Arc::clone(self.active_indices.lock().entry(epoch).or_insert(indices))
    }

    /// Returns active validator indices for `epoch` permuted with `seed`.
    pub fn shuffled_validator_indices<P: Preset>(
        &self,
        state: &BeaconState<P>,
        epoch: Epoch,
        seed: H256,
    ) -> Result<Arc<[ValidatorIndex]>> {
        if let Some(shuffled) = self.shufflings.lock().get(&(epoch, seed)) {
            return Ok(Arc::clone(shuffled));
        }

        let mut shuffled = self.active_validator_indices(state, epoch).to_vec();

        shuffling::shuffle_slice::<P, _>(&mut shuffled, seed)?;

        let mut shufflings = self.shufflings.lock();
        let shuffled = shufflings.entry((epoch, seed)).or_insert_with(|| shuffled.into());

        Ok(Arc::clone(shuffled))
    }

    /// Drops entries for epochs before `epoch`.
    pub fn prune(&self, epoch: Epoch) {
        self.active_indices.lock().retain(|cached, _| *cached >= epoch);
        self.shufflings.lock().retain(|(cached, _), _| *cached >= epoch);
    }

    #[must_use]
    pub fn cached_epochs(&self) -> Vec<Epoch> {
        let mut epochs = self.active_indices.lock().keys().copied().collect::<Vec<_>>();
        epochs.sort_unstable();
        epochs
    }
}
