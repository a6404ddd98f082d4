use std::collections::HashMap;

use anyhow::{ensure, Result};
use fork_choice_store::{LatestMessage, Storage};
use helper_functions::{accessors, Error as HelperError};
use log::{debug, warn};
use transition_functions::StateTransition;
use types::{
    nonstandard::AttestationTarget,
    phase0::{
        beacon_state::BeaconState,
        containers::Attestation,
        primitives::{ValidatorIndex, H256},
    },
    preset::Preset,
};

use crate::{Controller, Error};

impl<P, S, T> Controller<P, S, T>
where
    P: Preset,
    S: Storage<P>,
    T: StateTransition<P>,
{
    /// Records `attestation` as the latest message of every attester unless a later one is
    /// already recorded.
    ///
    /// Committees are computed from the head state. Bits that do not correspond to a committee
    /// member are skipped.
    pub fn update_latest_attestation(&self, attestation: &Attestation) -> Result<()> {
        let head_state = self.storage.chain_head()?.state;
        let data = attestation.data;

        let committee = accessors::beacon_committee(
            &head_state,
            &self.validator_store,
            data.slot,
            data.index,
        )?;

        let message = LatestMessage::from(data);

        for position in attestation.participant_positions() {
            let Some(validator_index) = committee.get(position).copied() else {
                warn!(
                    "Bitfield points to an invalid index in the committee \
                     (position: {position}, committee length: {}, slot: {}, index: {})",
                    committee.len(),
                    data.slot,
                    data.index,
                );
                continue;
            };

            if self.latest_messages.insert_if_newer(validator_index, message) {
                debug!(
                    "latest attestation updated (validator: {validator_index}, slot: {}, \
                     block root: {:?})",
                    data.slot, data.beacon_block_root,
                );
            }
        }

        Ok(())
    }

    /// Applies [`Self::update_latest_attestation`] to each attestation in order.
    ///
    /// Attestations whose committee cannot be resolved from the head state are logged and
    /// skipped. Any other error stops the batch. Attestations before it stay applied.
    pub fn batch_update_latest_attestation<'attestations>(
        &self,
        attestations: impl IntoIterator<Item = &'attestations Attestation>,
    ) -> Result<()> {
        for attestation in attestations {
            let Err(error) = self.update_latest_attestation(attestation) else {
                continue;
            };

            let unresolvable_committee = matches!(
                error.downcast_ref::<HelperError>(),
                Some(
                    HelperError::CommitteeIndexOutOfBounds { .. }
                        | HelperError::EpochAfterNext { .. }
                        | HelperError::EpochBeforePrevious { .. },
                ),
            );

            if !unresolvable_committee {
                return Err(error);
            }

            warn!(
                "attestation ignored because its committee cannot be resolved \
                 (slot: {}, index: {}, error: {error})",
                attestation.data.slot, attestation.data.index,
            );
        }

        Ok(())
    }

    /// Returns the block the latest message of `validator_index` votes for.
    ///
    /// Returns [`None`] if the validator has not attested or voted for an unknown block.
    pub fn latest_attestation_target(
        &self,
        state: &BeaconState<P>,
        validator_index: ValidatorIndex,
    ) -> Result<Option<AttestationTarget>> {
        let in_registry = usize::try_from(validator_index)
            .is_ok_and(|index| index < state.validators.len());

        ensure!(in_registry, Error::InvalidValidatorIndex { validator_index });

        let Some(message) = self.latest_messages.get(validator_index) else {
            return Ok(None);
        };

        self.target_for_root(message.beacon_block_root)
    }

    /// Collects vote targets of all validators in `state` that have attested.
    pub fn attestation_targets(
        &self,
        state: &BeaconState<P>,
    ) -> Result<HashMap<ValidatorIndex, AttestationTarget>> {
        let mut targets = HashMap::new();

        for (validator_index, message) in self.latest_messages.snapshot() {
            let in_registry = usize::try_from(validator_index)
                .is_ok_and(|index| index < state.validators.len());

            if !in_registry {
                continue;
            }

            if let Some(target) = self.target_for_root(message.beacon_block_root)? {
                targets.insert(validator_index, target);
            }
        }

        Ok(targets)
    }

    fn target_for_root(&self, block_root: H256) -> Result<Option<AttestationTarget>> {
        let target = self
            .storage
            .block_by_root(block_root)?
            .map(|block| AttestationTarget::new(block_root, &block));

        Ok(target)
    }
}
