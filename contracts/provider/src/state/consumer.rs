use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, Coin, Timestamp};
use cw_storage_plus::Map;

use ccv_apis::ccv_api::{ConsumerGenesis, ConsumerParams, ConsumerStatus, ValidatorUpdate};

/// ConsumerChain is the provider's record of a consumer chain, from its addition to its removal
#[cw_serde]
pub struct ConsumerChain {
    pub chain_id: String,
    pub status: ConsumerStatus,
    pub initial_height: u64,
    pub spawn_time: Timestamp,
    /// `stop_time` is set once a removal has been accepted
    pub stop_time: Option<Timestamp>,
    pub genesis_hash: Binary,
    pub binary_hash: Binary,
    pub params: ConsumerParams,
    pub deposit: Vec<Coin>,
    /// `spawn_height` is the provider height at which the genesis was produced
    pub spawn_height: Option<u64>,
    /// `channel_id` is the CCV channel, bound once the consumer registers over it
    pub channel_id: Option<String>,
}

/// VscPacket is a validator set change produced for a consumer
#[cw_serde]
pub struct VscPacket {
    pub vsc_id: u64,
    pub updates: Vec<ValidatorUpdate>,
    pub slash_acks: Vec<String>,
}

/// ConsumerValidator is the last (key, power) of a provider validator sent to a consumer
#[cw_serde]
pub struct ConsumerValidator {
    pub key: String,
    pub power: u64,
}

/// Consumer chains by chain id
pub const CONSUMERS: Map<&str, ConsumerChain> = Map::new("consumers");
/// Chain id bound to each CCV channel id
pub const CHANNEL_TO_CHAIN: Map<&str, String> = Map::new("channel_to_chain");
/// Genesis produced at spawn time
pub const CONSUMER_GENESIS: Map<&str, ConsumerGenesis> = Map::new("consumer_genesis");
/// Next validator set change id, per consumer
pub const NEXT_VSC_ID: Map<&str, u64> = Map::new("next_vsc_id");
/// Provider height at which each validator set change was produced.
/// Id 0 is the genesis validator set
pub const VSC_SEND_HEIGHT: Map<(&str, u64), u64> = Map::new("vsc_send_height");
/// Validator set changes produced before the consumer channel was established
pub const PENDING_VSC: Map<(&str, u64), VscPacket> = Map::new("pending_vsc");
/// Sent validator set changes waiting for the consumer's maturity notice, with send time
pub const UNMATURED_VSC: Map<(&str, u64), Timestamp> = Map::new("unmatured_vsc");
/// Validator set as last sent to each consumer, by provider validator
pub const CONSUMER_VALSET: Map<(&str, &str), ConsumerValidator> = Map::new("consumer_valset");
/// Consumer keys whose slash packets were handled, to be acknowledged with the next packet
pub const SLASH_ACKS: Map<&str, Vec<String>> = Map::new("slash_acks");
/// Time the last validator set change was sent, per active consumer
pub const LAST_VSC_TIME: Map<&str, Timestamp> = Map::new("last_vsc_time");
