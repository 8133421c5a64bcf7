use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, Timestamp};
use cw_storage_plus::{Item, Map};
use prost::Message;

use ccv_apis::ccv_api::Infraction;
use ccv_proto::interchain_security::ccv::v1::{
    ccv_packet_data::Packet, CcvPacketData, Infraction as ProtoInfraction, SlashPacketData,
    VscMaturedPacketData,
};

/// OutboundPacket is a packet for the provider, waiting for the channel
#[cw_serde]
pub enum OutboundPacket {
    Slash {
        /// `validator` is the consumer consensus key
        validator: String,
        power: u64,
        vsc_id: u64,
        infraction: Infraction,
        infraction_height: u64,
        infraction_time: Timestamp,
    },
    VscMatured {
        vsc_id: u64,
    },
}

impl OutboundPacket {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundPacket::Slash { .. } => "slash",
            OutboundPacket::VscMatured { .. } => "vsc_matured",
        }
    }

    /// encode builds the wire packet, reported from `chain_id`
    pub fn encode(&self, chain_id: &str) -> Binary {
        let packet = match self {
            OutboundPacket::Slash {
                validator,
                power,
                vsc_id,
                infraction,
                infraction_height,
                infraction_time,
            } => Packet::Slash(SlashPacketData {
                chain_id: chain_id.to_string(),
                validator: validator.clone(),
                power: *power,
                valset_update_id: *vsc_id,
                infraction: match infraction {
                    Infraction::Downtime => ProtoInfraction::Downtime,
                    Infraction::DoubleSign => ProtoInfraction::DoubleSign,
                } as i32,
                infraction_height: *infraction_height,
                infraction_time_nanos: infraction_time.nanos(),
            }),
            OutboundPacket::VscMatured { vsc_id } => Packet::VscMatured(VscMaturedPacketData {
                valset_update_id: *vsc_id,
            }),
        };
        let data = CcvPacketData {
            packet: Some(packet),
        };
        Binary::new(data.encode_to_vec())
    }
}

/// Packets in send order
pub const OUTBOX: Map<u64, OutboundPacket> = Map::new("outbox");
pub const NEXT_OUTBOX_SEQ: Item<u64> = Item::new("next_outbox_seq");
