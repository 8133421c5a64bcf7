/// Cross-chain validation types shared by the provider and consumer contracts.
/// The packet-level equivalents live in `ccv-proto`
use std::fmt;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, Decimal, Timestamp};

/// ValidatorUpdate is a single power change for a consensus key on a consumer chain.
/// A power of zero removes the key from the consumer's validator set
#[cw_serde]
pub struct ValidatorUpdate {
    /// `pub_key` is the consensus key used on the consumer chain
    pub pub_key: String,
    pub power: u64,
}

impl ValidatorUpdate {
    pub fn new(pub_key: impl Into<String>, power: u64) -> Self {
        ValidatorUpdate {
            pub_key: pub_key.into(),
            power,
        }
    }
}

#[cw_serde]
#[derive(Copy, Eq, Hash)]
pub enum Infraction {
    Downtime,
    DoubleSign,
}

impl fmt::Display for Infraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Infraction::Downtime => write!(f, "downtime"),
            Infraction::DoubleSign => write!(f, "double_sign"),
        }
    }
}

/// ConsumerStatus is the lifecycle stage of a consumer chain on the provider
#[cw_serde]
#[derive(Copy, Eq)]
pub enum ConsumerStatus {
    /// Accepted by governance, waiting for its spawn time
    Registered,
    /// Genesis produced, waiting for the CCV channel to be established
    Spawned,
    /// Channel established, validator set changes are flowing
    Active,
    /// Removal accepted, waiting for the stop time and for in-flight updates to mature
    StoppingScheduled,
    /// All state purged
    Removed,
}

impl fmt::Display for ConsumerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConsumerStatus::Registered => "registered",
            ConsumerStatus::Spawned => "spawned",
            ConsumerStatus::Active => "active",
            ConsumerStatus::StoppingScheduled => "stopping_scheduled",
            ConsumerStatus::Removed => "removed",
        };
        write!(f, "{s}")
    }
}

/// ConsumerParams are the consumer-side protocol parameters handed over in the genesis
#[cw_serde]
pub struct ConsumerParams {
    /// `distribution_transmission_channel` is an existing transfer channel to reuse for
    /// reward distribution. Empty means a new one is created
    pub distribution_transmission_channel: String,
    /// `consumer_redistribution_fraction` is the fraction of rewards kept on the consumer
    pub consumer_redistribution_fraction: Decimal,
    pub blocks_per_distribution_transmission: u64,
    /// `historical_entries` is the number of historical info entries kept on the consumer
    pub historical_entries: u64,
    /// `ccv_timeout_period` is the timeout for CCV packets, in seconds
    pub ccv_timeout_period: u64,
    /// `transfer_timeout_period` is the timeout for reward transfers, in seconds
    pub transfer_timeout_period: u64,
    /// `unbonding_period` is the consumer unbonding period, in seconds.
    /// Validator set changes mature after this period
    pub unbonding_period: u64,
}

/// ConsumerGenesis is the payload produced by the provider when a consumer spawns.
/// It is handed by an external process to the consumer's initial block
#[cw_serde]
pub struct ConsumerGenesis {
    pub chain_id: String,
    pub provider_chain_id: String,
    pub initial_height: u64,
    /// `spawn_height` is the provider height at which the genesis validator set was taken
    pub spawn_height: u64,
    pub spawn_time: Timestamp,
    pub genesis_hash: Binary,
    pub binary_hash: Binary,
    /// `initial_val_set` is the provider's active set, translated through key assignment
    pub initial_val_set: Vec<ValidatorUpdate>,
    pub params: ConsumerParams,
}
