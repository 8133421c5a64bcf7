/// Governance proposals handled by the provider.
/// Submission and voting happen outside of the contract; a passed proposal is delivered
/// to the provider as one of the variants of [`Proposal`]
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, Coin, Decimal, Timestamp};

use crate::ccv_api::ConsumerParams;

#[cw_serde]
pub enum Proposal {
    ConsumerAddition(ConsumerAdditionProposal),
    ConsumerRemoval(ConsumerRemovalProposal),
    Equivocation(EquivocationProposal),
    ParamChange(ParamChangeProposal),
}

impl Proposal {
    pub fn kind(&self) -> &'static str {
        match self {
            Proposal::ConsumerAddition(_) => "consumer_addition",
            Proposal::ConsumerRemoval(_) => "consumer_removal",
            Proposal::Equivocation(_) => "equivocation",
            Proposal::ParamChange(_) => "param_change",
        }
    }
}

/// ConsumerAdditionProposal registers a new consumer chain, to be spawned at `spawn_time`
#[cw_serde]
pub struct ConsumerAdditionProposal {
    pub chain_id: String,
    pub initial_height: u64,
    /// `genesis_hash` is the hash of the consumer's genesis without the CCV state
    pub genesis_hash: Binary,
    /// `binary_hash` is the hash of the consumer's binary
    pub binary_hash: Binary,
    pub spawn_time: Timestamp,
    pub consumer_redistribution_fraction: Decimal,
    pub blocks_per_distribution_transmission: u64,
    pub distribution_transmission_channel: String,
    pub historical_entries: u64,
    /// Seconds
    pub ccv_timeout_period: u64,
    /// Seconds
    pub transfer_timeout_period: u64,
    /// Seconds
    pub unbonding_period: u64,
    /// `deposit` is recorded for reference; escrow is handled by the governance module
    pub deposit: Vec<Coin>,
}

impl ConsumerAdditionProposal {
    pub fn consumer_params(&self) -> ConsumerParams {
        ConsumerParams {
            distribution_transmission_channel: self.distribution_transmission_channel.clone(),
            consumer_redistribution_fraction: self.consumer_redistribution_fraction,
            blocks_per_distribution_transmission: self.blocks_per_distribution_transmission,
            historical_entries: self.historical_entries,
            ccv_timeout_period: self.ccv_timeout_period,
            transfer_timeout_period: self.transfer_timeout_period,
            unbonding_period: self.unbonding_period,
        }
    }
}

/// ConsumerRemovalProposal schedules the removal of a consumer chain at `stop_time`
#[cw_serde]
pub struct ConsumerRemovalProposal {
    pub chain_id: String,
    pub stop_time: Timestamp,
    pub deposit: Vec<Coin>,
}

/// EquivocationProposal submits double-sign evidence that already went through governance.
/// It bypasses the slash throttle
#[cw_serde]
pub struct EquivocationProposal {
    pub equivocations: Vec<Equivocation>,
}

#[cw_serde]
pub struct Equivocation {
    /// `consensus_key` is the provider consensus key of the offending validator
    pub consensus_key: String,
    pub height: u64,
    pub time: Timestamp,
    pub power: u64,
}

#[cw_serde]
pub struct ParamChangeProposal {
    pub changes: Vec<ParamChange>,
}

/// ParamChange is a typed update of a single provider parameter
#[cw_serde]
pub enum ParamChange {
    /// Seconds between two slash packet releases
    SlashThrottleWindow { seconds: u64 },
    /// Seconds a stopping consumer may wait for its updates to mature
    DrainTimeout { seconds: u64 },
    /// Seconds a validator stays jailed for downtime
    JailDuration { seconds: u64 },
    /// Seconds after which an empty update packet is sent to an idle consumer
    VscHeartbeatPeriod { seconds: u64 },
    DoubleSignSlashFraction { fraction: Decimal },
}
