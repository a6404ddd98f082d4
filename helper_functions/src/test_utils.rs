use types::{
    phase0::{beacon_state::BeaconState, containers::Validator, primitives::H256},
    preset::Preset,
};

pub fn genesis_state<P: Preset>(validator_count: usize) -> BeaconState<P> {
    let validators = vec![Validator::active_since_genesis(P::MAX_EFFECTIVE_BALANCE); validator_count];
    BeaconState::genesis(0, validators, H256::repeat_byte(0x42))
}
