//! Fixtures and a hand relayer for tests wiring the provider and consumer contracts together
use ccv_apis::proposal_api::ConsumerAdditionProposal;
use ccv_proto::interchain_security::ccv::v1::{ccv_packet_data::Packet, CcvPacketData};
use cosmwasm_std::{
    from_json, Addr, Binary, CosmosMsg, Decimal, IbcAcknowledgement, IbcEndpoint, IbcMsg,
    IbcPacket, IbcPacketAckMsg, IbcPacketReceiveMsg, IbcPacketTimeoutMsg, IbcTimeout, StdAck,
    SubMsg, Timestamp,
};
use prost::Message;

pub const PROVIDER_CHAIN_ID: &str = "provider";
pub const PROVIDER_PORT: &str = "wasm.provider";
pub const CONSUMER_PORT: &str = "wasm.consumer";
pub const RELAYER: &str = "relayer";

/// A consumer addition proposal with sensible defaults.
/// Unbonding period is one day, CCV timeout four weeks
pub fn consumer_addition(chain_id: &str, spawn_time: Timestamp) -> ConsumerAdditionProposal {
    ConsumerAdditionProposal {
        chain_id: chain_id.to_string(),
        initial_height: 1,
        genesis_hash: Binary::from(b"gen_hash"),
        binary_hash: Binary::from(b"bin_hash"),
        spawn_time,
        consumer_redistribution_fraction: Decimal::percent(75),
        blocks_per_distribution_transmission: 1000,
        distribution_transmission_channel: String::new(),
        historical_entries: 10000,
        ccv_timeout_period: 2419200,
        transfer_timeout_period: 3600,
        unbonding_period: 86400,
        deposit: vec![],
    }
}

/// An IBC packet sent by a contract, as found in its response messages
#[derive(Clone, Debug, PartialEq)]
pub struct SentPacket {
    pub channel_id: String,
    pub data: Binary,
    pub timeout: IbcTimeout,
}

impl SentPacket {
    pub fn decode(&self) -> Packet {
        CcvPacketData::decode(self.data.as_slice())
            .expect("sent packet is not CcvPacketData")
            .packet
            .expect("sent packet is empty")
    }
}

/// Extract the `IbcMsg::SendPacket` messages, in order
pub fn sent_packets<T>(msgs: &[SubMsg<T>]) -> Vec<SentPacket> {
    msgs.iter()
        .filter_map(|sub| match &sub.msg {
            CosmosMsg::Ibc(IbcMsg::SendPacket {
                channel_id,
                data,
                timeout,
            }) => Some(SentPacket {
                channel_id: channel_id.clone(),
                data: data.clone(),
                timeout: timeout.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// Extract the channel ids closed through `IbcMsg::CloseChannel`
pub fn closed_channels<T>(msgs: &[SubMsg<T>]) -> Vec<String> {
    msgs.iter()
        .filter_map(|sub| match &sub.msg {
            CosmosMsg::Ibc(IbcMsg::CloseChannel { channel_id }) => Some(channel_id.clone()),
            _ => None,
        })
        .collect()
}

pub fn is_success_ack(ack: &Option<Binary>) -> bool {
    ack.as_ref()
        .and_then(|bin| from_json::<StdAck>(bin).ok())
        .map(|ack| ack.is_success())
        .unwrap_or(false)
}

pub fn ack_error(ack: &Option<Binary>) -> Option<String> {
    match from_json::<StdAck>(ack.as_ref()?).ok()? {
        StdAck::Error(err) => Some(err),
        StdAck::Success(_) => None,
    }
}

/// Relayer delivers packets between the provider and one consumer over a single ordered
/// channel, assigning the transport sequence numbers of both directions
#[derive(Clone, Debug)]
pub struct Relayer {
    pub provider_channel: String,
    pub consumer_channel: String,
    to_consumer_seq: u64,
    to_provider_seq: u64,
}

impl Relayer {
    pub fn new(provider_channel: &str, consumer_channel: &str) -> Self {
        Relayer {
            provider_channel: provider_channel.to_string(),
            consumer_channel: consumer_channel.to_string(),
            to_consumer_seq: 0,
            to_provider_seq: 0,
        }
    }

    pub fn provider_endpoint(&self) -> IbcEndpoint {
        IbcEndpoint {
            port_id: PROVIDER_PORT.to_string(),
            channel_id: self.provider_channel.clone(),
        }
    }

    pub fn consumer_endpoint(&self) -> IbcEndpoint {
        IbcEndpoint {
            port_id: CONSUMER_PORT.to_string(),
            channel_id: self.consumer_channel.clone(),
        }
    }

    /// The packet as it arrives on the consumer
    pub fn packet_to_consumer(&mut self, sent: &SentPacket) -> IbcPacket {
        self.to_consumer_seq += 1;
        IbcPacket::new(
            sent.data.clone(),
            self.provider_endpoint(),
            self.consumer_endpoint(),
            self.to_consumer_seq,
            sent.timeout.clone(),
        )
    }

    /// The packet as it arrives on the provider
    pub fn packet_to_provider(&mut self, sent: &SentPacket) -> IbcPacket {
        self.to_provider_seq += 1;
        IbcPacket::new(
            sent.data.clone(),
            self.consumer_endpoint(),
            self.provider_endpoint(),
            self.to_provider_seq,
            sent.timeout.clone(),
        )
    }
}

pub fn recv_msg(packet: IbcPacket) -> IbcPacketReceiveMsg {
    IbcPacketReceiveMsg::new(packet, Addr::unchecked(RELAYER))
}

pub fn ack_msg(packet: IbcPacket, ack: Binary) -> IbcPacketAckMsg {
    IbcPacketAckMsg::new(
        IbcAcknowledgement::new(ack),
        packet,
        Addr::unchecked(RELAYER),
    )
}

pub fn timeout_msg(packet: IbcPacket) -> IbcPacketTimeoutMsg {
    IbcPacketTimeoutMsg::new(packet, Addr::unchecked(RELAYER))
}
