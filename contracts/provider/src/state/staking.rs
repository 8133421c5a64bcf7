use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp};
use cw_storage_plus::Map;

/// Validator is a provider validator as reported by the staking module, identified by its
/// provider consensus key
#[cw_serde]
pub struct Validator {
    /// `operator` may assign consumer keys and unjail the validator
    pub operator: Addr,
    /// `power` is the last power reported by the staking module
    pub power: u64,
    /// `jailed_until` is set while the validator is jailed. It stays set past the given time
    /// until the operator unjails
    pub jailed_until: Option<Timestamp>,
    pub tombstoned: bool,
}

impl Validator {
    /// Power the validator holds on the consumers
    pub fn effective_power(&self) -> u64 {
        if self.tombstoned || self.jailed_until.is_some() {
            0
        } else {
            self.power
        }
    }
}

/// Validators by provider consensus key
pub const VALIDATORS: Map<&str, Validator> = Map::new("validators");
/// Provider consensus key by operator
pub const OPERATORS: Map<&Addr, String> = Map::new("operators");
