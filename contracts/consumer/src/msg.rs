use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Timestamp;

use ccv_apis::ccv_api::{ConsumerGenesis, Infraction, ValidatorUpdate};

use crate::state::config::Config;
use crate::state::outbox::OutboundPacket;
use crate::state::valset::Halt;

#[cw_serde]
pub struct InstantiateMsg {
    /// `genesis` is the payload produced by the provider when this chain spawned
    pub genesis: ConsumerGenesis,
}

/// SudoMsg is sent by the consumer chain's host modules
#[cw_serde]
pub enum SudoMsg {
    BeginBlock {},
    /// EndBlock matures validator set changes, sends queued packets and hands the
    /// applied validator set changes over to consensus
    EndBlock {},
    /// Slash reports misbehaviour of a validator, identified by its consumer key
    Slash {
        validator: String,
        power: u64,
        infraction_height: u64,
        infraction_time: Timestamp,
        infraction: Infraction,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Config)]
    Config {},
    /// ValidatorSet lists the active validator set, by consensus key
    #[returns(ValidatorSetResponse)]
    ValidatorSet {
        start_after: Option<String>,
        limit: Option<u32>,
    },
    #[returns(LastVscIdResponse)]
    LastVscId {},
    /// Halted returns the out of order packet that halted the channel, if any
    #[returns(HaltedResponse)]
    Halted {},
    #[returns(PendingMaturitiesResponse)]
    PendingMaturities {},
    #[returns(PendingPacketsResponse)]
    PendingPackets {},
    #[returns(OutstandingDowntimeResponse)]
    OutstandingDowntime { validator: String },
}

#[cw_serde]
pub struct ValidatorSetResponse {
    pub validators: Vec<ValidatorUpdate>,
}

#[cw_serde]
pub struct LastVscIdResponse {
    pub vsc_id: u64,
}

#[cw_serde]
pub struct HaltedResponse {
    pub halt: Option<Halt>,
}

#[cw_serde]
pub struct Maturity {
    pub vsc_id: u64,
    pub maturity_time: Timestamp,
}

#[cw_serde]
pub struct PendingMaturitiesResponse {
    pub maturities: Vec<Maturity>,
}

#[cw_serde]
pub struct PendingPacket {
    pub seq: u64,
    pub packet: OutboundPacket,
}

#[cw_serde]
pub struct PendingPacketsResponse {
    pub packets: Vec<PendingPacket>,
}

#[cw_serde]
pub struct OutstandingDowntimeResponse {
    pub outstanding: bool,
}
