use crate::error::ContractError;
use ccv_bindings::CcvMsg;
use ccv_proto::interchain_security::ccv::v1::{ccv_packet_data::Packet, CcvPacketData};

use cosmwasm_std::{
    DepsMut, Env, Event, Ibc3ChannelOpenResponse, IbcBasicResponse, IbcChannelCloseMsg,
    IbcChannelConnectMsg, IbcChannelOpenMsg, IbcChannelOpenResponse, IbcOrder, IbcPacketAckMsg,
    IbcPacketReceiveMsg, IbcPacketTimeoutMsg, IbcReceiveResponse, Never, StdAck,
};
use prost::Message;

use crate::lifecycle;

pub const IBC_VERSION: &str = "ccv-1";
pub const IBC_ORDERING: IbcOrder = IbcOrder::Ordered;

/// This is executed during the ChannelOpenInit and ChannelOpenTry
/// of the IBC 4-step channel protocol
/// (see https://github.com/cosmos/ibc/tree/main/spec/core/ics-004-channel-and-packet-semantics#channel-lifecycle-management)
/// In the case of ChannelOpenTry there's a counterparty_version attribute in the message.
/// Here we ensure the ordering and version constraints.
/// A channel is bound to a consumer chain only once the consumer registers over it.
pub fn ibc_channel_open(
    _deps: DepsMut,
    _env: Env,
    msg: IbcChannelOpenMsg,
) -> Result<IbcChannelOpenResponse, ContractError> {
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
pub fn ibc_channel_connect(
    _deps: DepsMut,
    _env: Env,
    msg: IbcChannelConnectMsg,
) -> Result<IbcBasicResponse, ContractError> {
    let chan_id = &msg.channel().endpoint.channel_id;
    Ok(IbcBasicResponse::new()
        .add_attribute("action", "ibc_connect")
        .add_attribute("channel_id", chan_id)
        .add_event(Event::new("ibc").add_attribute("channel", "connect")))
}

/// This is invoked on the IBC Channel Close message.
/// Closing the channel of a consumer schedules its removal
pub fn ibc_channel_close(
    deps: DepsMut,
    env: Env,
    msg: IbcChannelCloseMsg,
) -> Result<IbcBasicResponse, ContractError> {
    let channel_id = msg.channel().endpoint.channel_id.as_str();
    let mut res = IbcBasicResponse::new()
        .add_attribute("action", "ibc_close")
        .add_attribute("channel_id", channel_id);

    if let Some(chain) = lifecycle::chain_by_channel(deps.storage, channel_id)? {
        let event = lifecycle::stop_now(deps.storage, &chain.chain_id, env.block.time)?;
        res = res.add_event(event.add_attribute("reason", "channel_closed"));
    }
    Ok(res)
}

/// Invoked when an IBC packet is received
/// We decode the contents of the packet and if it matches one of the packets we support
/// execute the relevant function, otherwise return an error.
/// Handlers check everything before writing, so that an error acknowledgement leaves the
/// state untouched
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
        let packet_data = CcvPacketData::decode(packet.data.as_slice())
            .map_err(|e| ContractError::PacketDecode(e.to_string()))?;
        let ccv_packet = packet_data.packet.ok_or(ContractError::EmptyPacket)?;
        match ccv_packet {
            Packet::ConsumerRegister(register) => {
                ibc_packet::handle_consumer_register(deps, &env, caller, &register)
            }
            Packet::Slash(slash) => ibc_packet::handle_slash(deps, &env, caller, &slash),
            Packet::VscMatured(matured) => ibc_packet::handle_vsc_matured(deps, caller, &matured),
            Packet::ValidatorSetChange(_) => Err(ContractError::UnexpectedPacket(
                "ValidatorSetChange".to_string(),
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
    use ccv_proto::interchain_security::ccv::v1::{
        ConsumerRegisterPacketData, Infraction, SlashPacketData, VscMaturedPacketData,
    };

    use crate::state::consumer::UNMATURED_VSC;
    use crate::{throttle, unbonding};

    pub fn handle_consumer_register(
        deps: DepsMut,
        env: &Env,
        caller: String,
        register: &ConsumerRegisterPacketData,
    ) -> Result<IbcReceiveResponse<CcvMsg>, ContractError> {
        let msgs = lifecycle::activate(deps.storage, env, &register.chain_id, &caller)?;

        Ok(IbcReceiveResponse::new(StdAck::success(b"\x01"))
            .add_messages(msgs.iter().cloned())
            .add_attribute("action", "receive_consumer_register")
            .add_event(
                Event::new("consumer_activated")
                    .add_attribute("chain_id", &register.chain_id)
                    .add_attribute("channel_id", caller)
                    .add_attribute("flushed_vscs", msgs.len().to_string()),
            ))
    }

    pub fn handle_slash(
        deps: DepsMut,
        env: &Env,
        caller: String,
        slash: &SlashPacketData,
    ) -> Result<IbcReceiveResponse<CcvMsg>, ContractError> {
        let chain = lifecycle::chain_by_channel(deps.storage, &caller)?
            .ok_or_else(|| ContractError::UnknownConsumer(slash.chain_id.clone()))?;
        if chain.chain_id != slash.chain_id {
            return Err(ContractError::ChainIdMismatch {
                expected: chain.chain_id,
                received: slash.chain_id.clone(),
            });
        }

        let res = IbcReceiveResponse::new(StdAck::success(b"\x01"))
            .add_attribute("action", "receive_slash");
        match Infraction::try_from(slash.infraction) {
            Ok(Infraction::Downtime) => {
                let seq = throttle::enqueue(deps.storage, env.block.time, &chain.chain_id, slash)?;
                Ok(res.add_event(
                    Event::new("slash_packet_enqueued")
                        .add_attribute("seq", seq.to_string())
                        .add_attribute("chain_id", chain.chain_id)
                        .add_attribute("consumer_key", &slash.validator)
                        .add_attribute("vsc_id", slash.valset_update_id.to_string()),
                ))
            }
            Ok(Infraction::DoubleSign) => {
                // Double signing is punished through equivocation proposals only
                deps.api.debug(&format!(
                    "double sign slash packet from {} for {} ignored",
                    chain.chain_id, slash.validator
                ));
                Ok(res.add_event(
                    Event::new("slash_packet_ignored")
                        .add_attribute("chain_id", chain.chain_id)
                        .add_attribute("consumer_key", &slash.validator)
                        .add_attribute("infraction", "double_sign"),
                ))
            }
            Ok(Infraction::Unspecified) | Err(_) => {
                Err(ContractError::InvalidInfraction(slash.infraction))
            }
        }
    }

    pub fn handle_vsc_matured(
        deps: DepsMut,
        caller: String,
        matured: &VscMaturedPacketData,
    ) -> Result<IbcReceiveResponse<CcvMsg>, ContractError> {
        let chain = lifecycle::chain_by_channel(deps.storage, &caller)?
            .ok_or_else(|| ContractError::UnknownConsumer(caller.clone()))?;
        // Maturity notices may be redelivered
        UNMATURED_VSC.remove(deps.storage, (&chain.chain_id, matured.valset_update_id));
        let released =
            unbonding::on_matured(deps.storage, &chain.chain_id, matured.valset_update_id)?;

        Ok(IbcReceiveResponse::new(StdAck::success(b"\x01"))
            .add_attribute("action", "receive_vsc_matured")
            .add_event(
                Event::new("vsc_matured")
                    .add_attribute("chain_id", chain.chain_id)
                    .add_attribute("vsc_id", matured.valset_update_id.to_string())
                    .add_attribute("released_unbonding_ops", released.to_string()),
            ))
    }
}

/// Acknowledgements of the validator set change packets. An error means the consumer
/// rejected the packet, which is left to the operators
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
            "validator set change rejected on channel {channel_id}: {err}"
        ));
        res = res.add_event(
            Event::new("vsc_rejected")
                .add_attribute("channel_id", channel_id)
                .add_attribute("sequence", msg.original_packet.sequence.to_string())
                .add_attribute("error", err),
        );
    }
    Ok(res)
}

/// A validator set change that timed out means the consumer may not be secured anymore:
/// it is stopped
pub fn ibc_packet_timeout(
    deps: DepsMut,
    env: Env,
    msg: IbcPacketTimeoutMsg,
) -> Result<IbcBasicResponse, ContractError> {
    let channel_id = msg.packet.src.channel_id.as_str();
    let mut res = IbcBasicResponse::new()
        .add_attribute("action", "ibc_packet_timeout")
        .add_attribute("channel_id", channel_id);
    if let Some(chain) = lifecycle::chain_by_channel(deps.storage, channel_id)? {
        let event = lifecycle::stop_now(deps.storage, &chain.chain_id, env.block.time)?;
        res = res.add_event(event.add_attribute("reason", "packet_timeout"));
    }
    Ok(res)
}
