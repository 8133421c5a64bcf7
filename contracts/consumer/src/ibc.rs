use crate::error::ContractError;
use ccv_apis::ccv_api::ConsumerParams;
use ccv_bindings::CcvMsg;
use ccv_proto::interchain_security::ccv::v1::{
    ccv_packet_data::Packet, CcvPacketData, ConsumerRegisterPacketData, Infraction,
};

use cosmwasm_std::{
    Binary, DepsMut, Env, Event, Ibc3ChannelOpenResponse, IbcBasicResponse, IbcChannel,
    IbcChannelCloseMsg, IbcChannelConnectMsg, IbcChannelOpenMsg, IbcChannelOpenResponse, IbcMsg,
    IbcOrder, IbcPacketAckMsg, IbcPacketReceiveMsg, IbcPacketTimeoutMsg, IbcReceiveResponse,
    IbcTimeout, Never, StdAck,
};
use cw_storage_plus::Item;
use prost::Message;

use crate::state::config::CONFIG;
use crate::state::valset::OUTSTANDING_DOWNTIME;

pub const IBC_VERSION: &str = "ccv-1";
pub const IBC_ORDERING: IbcOrder = IbcOrder::Ordered;

// IBC specific state
pub const IBC_CHANNEL: Item<IbcChannel> = Item::new("ibc_channel");

/// This is executed during the ChannelOpenInit and ChannelOpenTry
/// of the IBC 4-step channel protocol
/// (see https://github.com/cosmos/ibc/tree/main/spec/core/ics-004-channel-and-packet-semantics#channel-lifecycle-management)
/// In the case of ChannelOpenTry there's a counterparty_version attribute in the message.
/// Here we ensure the ordering and version constraints.
pub fn ibc_channel_open(
    deps: DepsMut,
    _env: Env,
    msg: IbcChannelOpenMsg,
) -> Result<IbcChannelOpenResponse, ContractError> {
    // Ensure we have no channel yet
    if IBC_CHANNEL.may_load(deps.storage)?.is_some() {
        return Err(ContractError::IbcChannelAlreadyOpen {});
    }
    // The IBC channel has to be ordered
    let channel = msg.channel();
    if channel.order != IBC_ORDERING {
        return Err(ContractError::IbcUnorderedChannel {});
    }

    // In IBCv3 we don't check the version string passed in the message
    // and only check the counterparty version
    if let Some(counter_version) = msg.counterparty_version() {
        if counter_version != IBC_VERSION {
            return Err(ContractError::IbcInvalidCounterPartyVersion {
                version: IBC_VERSION.to_string(),
            });
        }
    }

    Ok(Some(Ibc3ChannelOpenResponse {
        version: IBC_VERSION.to_string(),
    }))
}

/// Second part of the 4-step handshake, i.e. ChannelOpenAck and ChannelOpenConfirm.
/// The consumer registers with the provider over the new channel
pub fn ibc_channel_connect(
    deps: DepsMut,
    env: Env,
    msg: IbcChannelConnectMsg,
) -> Result<IbcBasicResponse, ContractError> {
    // Ensure we have no channel yet
    if IBC_CHANNEL.may_load(deps.storage)?.is_some() {
        return Err(ContractError::IbcChannelAlreadyOpen {});
    }
    let channel = msg.channel();
    IBC_CHANNEL.save(deps.storage, channel)?;

    let cfg = CONFIG.load(deps.storage)?;
    let packet_data = CcvPacketData {
        packet: Some(Packet::ConsumerRegister(ConsumerRegisterPacketData {
            chain_id: cfg.chain_id.clone(),
        })),
    };
    let ibc_msg = IbcMsg::SendPacket {
        channel_id: channel.endpoint.channel_id.clone(),
        data: Binary::new(packet_data.encode_to_vec()),
        timeout: packet_timeout(&env, &cfg.params),
    };

    let chan_id = &channel.endpoint.channel_id;
    Ok(IbcBasicResponse::new()
        .add_message(ibc_msg)
        .add_attribute("action", "ibc_connect")
        .add_attribute("channel_id", chan_id)
        .add_attribute("chain_id", cfg.chain_id)
        .add_event(Event::new("ibc").add_attribute("channel", "connect")))
}

/// This is invoked on the IBC Channel Close message.
/// Queued packets stay queued
pub fn ibc_channel_close(
    deps: DepsMut,
    _env: Env,
    msg: IbcChannelCloseMsg,
) -> Result<IbcBasicResponse, ContractError> {
    let channel_id = msg.channel().endpoint.channel_id.as_str();
    let mut res = IbcBasicResponse::new()
        .add_attribute("action", "ibc_close")
        .add_attribute("channel_id", channel_id);
    if let Some(channel) = IBC_CHANNEL.may_load(deps.storage)? {
        if channel.endpoint.channel_id == channel_id {
            IBC_CHANNEL.remove(deps.storage);
            res = res.add_event(Event::new("channel_closed").add_attribute("channel_id", channel_id));
        }
    }
    Ok(res)
}

/// Invoked when an IBC packet is received
/// We decode the contents of the packet and if it matches one of the packets we support
/// execute the relevant function, otherwise return an error.
/// Handlers check everything before writing, so that an error acknowledgement leaves the
/// state untouched. The halt marker of an out of order packet is the only exception
pub fn ibc_packet_receive(
    deps: DepsMut,
    env: Env,
    msg: IbcPacketReceiveMsg,
) -> Result<IbcReceiveResponse<CcvMsg>, Never> {
    // put this in a closure so we can convert all error responses into acknowledgements
    (|| {
        let packet = msg.packet;
        // which local channel did this packet come on
        let caller = packet.dest.channel_id;
        let channel = IBC_CHANNEL.may_load(deps.storage)?;
        if channel.map(|c| c.endpoint.channel_id) != Some(caller.clone()) {
            return Err(ContractError::UnknownChannel(caller));
        }
        let packet_data = CcvPacketData::decode(packet.data.as_slice())
            .map_err(|e| ContractError::PacketDecode(e.to_string()))?;
        let ccv_packet = packet_data.packet.ok_or(ContractError::EmptyPacket)?;
        match ccv_packet {
            Packet::ValidatorSetChange(vsc) => {
                ibc_packet::handle_validator_set_change(deps, &env, &vsc)
            }
            Packet::Slash(_) => Err(ContractError::UnexpectedPacket("Slash".to_string())),
            Packet::VscMatured(_) => Err(ContractError::UnexpectedPacket("VscMatured".to_string())),
            Packet::ConsumerRegister(_) => Err(ContractError::UnexpectedPacket(
                "ConsumerRegister".to_string(),
            )),
        }
    })()
    .or_else(|e| {
        // we try to capture all app-level errors and convert them into
        // acknowledgement packets that contain an error code.
        Ok(
            IbcReceiveResponse::new(StdAck::error(format!("invalid packet: {e}")))
                .add_event(Event::new("ibc").add_attribute("packet", "receive")),
        )
    })
}

// Methods to handle PacketMsg variants
pub(crate) mod ibc_packet {
    use super::*;
    use ccv_proto::interchain_security::ccv::v1::ValidatorSetChangePacketData;

    use crate::applier;
    use crate::state::valset::{Halt, HALTED};

    pub fn handle_validator_set_change(
        deps: DepsMut,
        env: &Env,
        vsc: &ValidatorSetChangePacketData,
    ) -> Result<IbcReceiveResponse<CcvMsg>, ContractError> {
        let event = match applier::apply(deps.storage, env.block.time, vsc) {
            Ok(event) => event,
            Err(ContractError::OutOfOrderPacket { expected, received }) => {
                deps.api.debug(&format!(
                    "validator set change {received} out of order, expected {expected}"
                ));
                HALTED.save(deps.storage, &Halt { expected, received })?;
                return Err(ContractError::OutOfOrderPacket { expected, received });
            }
            Err(err) => return Err(err),
        };

        Ok(IbcReceiveResponse::new(StdAck::success(b"\x01"))
            .add_attribute("action", "receive_validator_set_change")
            .add_event(event))
    }
}

/// packet_timeout is the timeout of every packet sent to the provider
pub fn packet_timeout(env: &Env, params: &ConsumerParams) -> IbcTimeout {
    let timeout = env.block.time.plus_seconds(params.ccv_timeout_period);
    IbcTimeout::with_timestamp(timeout)
}

pub fn ibc_packet_ack(
    deps: DepsMut,
    _env: Env,
    msg: IbcPacketAckMsg,
) -> Result<IbcBasicResponse, ContractError> {
    let channel_id = msg.original_packet.src.channel_id.as_str();
    let mut res = IbcBasicResponse::new()
        .add_attribute("action", "ibc_packet_ack")
        .add_attribute("channel_id", channel_id);
    if let Ok(StdAck::Error(err)) = cosmwasm_std::from_json::<StdAck>(&msg.acknowledgement.data) {
        deps.api.debug(&format!(
            "packet {} rejected by the provider: {err}",
            msg.original_packet.sequence
        ));
        res = res.add_event(
            Event::new("packet_rejected")
                .add_attribute("sequence", msg.original_packet.sequence.to_string())
                .add_attribute("error", err),
        );
        // The provider never handled the report, later downtime must be reported again
        if let Ok(CcvPacketData {
            packet: Some(Packet::Slash(slash)),
        }) = CcvPacketData::decode(msg.original_packet.data.as_slice())
        {
            if slash.infraction() == Infraction::Downtime {
                OUTSTANDING_DOWNTIME.remove(deps.storage, &slash.validator);
            }
        }
    }
    Ok(res)
}

pub fn ibc_packet_timeout(
    deps: DepsMut,
    _env: Env,
    msg: IbcPacketTimeoutMsg,
) -> Result<IbcBasicResponse, ContractError> {
    let sequence = msg.packet.sequence;
    deps.api
        .debug(&format!("packet {sequence} to the provider timed out"));
    Ok(IbcBasicResponse::new()
        .add_attribute("action", "ibc_packet_timeout")
        .add_event(Event::new("packet_timeout").add_attribute("sequence", sequence.to_string())))
}
