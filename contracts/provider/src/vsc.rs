//! ValidatorUpdateProducer: turns the provider validator set into ordered validator set
//! change packets for every consumer chain.
use cosmwasm_std::{
    Binary, Env, Event, IbcMsg, IbcTimeout, Order, StdResult, Storage, Timestamp,
};
use prost::Message;

use ccv_apis::ccv_api::{ConsumerStatus, ValidatorUpdate};
use ccv_proto::interchain_security::ccv::v1::{
    ccv_packet_data::Packet, CcvPacketData, ValidatorSetChangePacketData,
    ValidatorUpdate as ProtoValidatorUpdate,
};

use crate::error::ContractError;
use crate::{key_assignment, unbonding};
use crate::state::config::PARAMS;
use crate::state::consumer::{
    ConsumerChain, ConsumerValidator, VscPacket, CONSUMERS, CONSUMER_VALSET, LAST_VSC_TIME,
    NEXT_VSC_ID, PENDING_VSC, SLASH_ACKS, UNMATURED_VSC, VSC_SEND_HEIGHT,
};
use crate::state::staking::{Validator, VALIDATORS};

/// genesis_valset takes the current validator set of `chain_id`, through key assignment, as
/// the initial consumer view
pub fn genesis_valset(
    storage: &mut dyn Storage,
    chain_id: &str,
    height: u64,
) -> StdResult<Vec<ValidatorUpdate>> {
    let validators = active_validators(storage)?;
    let mut initial = Vec::with_capacity(validators.len());
    for (validator, power) in validators {
        let Some(key) = key_assignment::consumer_key(storage, chain_id, &validator, height)?
        else {
            continue;
        };
        CONSUMER_VALSET.save(
            storage,
            (chain_id, &validator),
            &ConsumerValidator {
                key: key.clone(),
                power,
            },
        )?;
        initial.push(ValidatorUpdate::new(key, power));
    }
    Ok(initial)
}

fn active_validators(storage: &dyn Storage) -> StdResult<Vec<(String, u64)>> {
    VALIDATORS
        .range(storage, None, None, Order::Ascending)
        .filter_map(|res| match res {
            Ok((key, validator)) => {
                let power = validator.effective_power();
                (power > 0).then_some(Ok((key, power)))
            }
            Err(e) => Some(Err(e)),
        })
        .collect()
}

/// compute_updates diffs the consumer view against the current validator set at `height`,
/// and stores the new view.
/// Removals come first, so that a key handed over between two validators within the same
/// packet ends up with the new holder's power
pub fn compute_updates(
    storage: &mut dyn Storage,
    chain_id: &str,
    height: u64,
) -> StdResult<Vec<ValidatorUpdate>> {
    let validators: Vec<(String, Validator)> = VALIDATORS
        .range(storage, None, None, Order::Ascending)
        .collect::<StdResult<_>>()?;

    let mut removals = vec![];
    let mut upserts = vec![];
    for (validator, info) in validators {
        let (key, power) =
            match key_assignment::consumer_key(storage, chain_id, &validator, height)? {
                Some(key) => (key, info.effective_power()),
                // Another validator holds its key on this consumer
                None => (
                    key_assignment::resolve(storage, chain_id, &validator, height)?,
                    0,
                ),
            };
        let prev = CONSUMER_VALSET.may_load(storage, (chain_id, &validator))?;
        match prev {
            Some(prev) if prev.key == key && prev.power == power => continue,
            Some(prev) if prev.key != key => {
                removals.push(ValidatorUpdate::new(prev.key, 0));
                if power > 0 {
                    upserts.push(ValidatorUpdate::new(key.clone(), power));
                }
            }
            Some(_) if power == 0 => removals.push(ValidatorUpdate::new(key.clone(), 0)),
            Some(_) => upserts.push(ValidatorUpdate::new(key.clone(), power)),
            None if power == 0 => continue,
            None => upserts.push(ValidatorUpdate::new(key.clone(), power)),
        }
        if power == 0 {
            CONSUMER_VALSET.remove(storage, (chain_id, &validator));
        } else {
            CONSUMER_VALSET.save(
                storage,
                (chain_id, &validator),
                &ConsumerValidator { key, power },
            )?;
        }
    }
    removals.extend(upserts);
    Ok(removals)
}

/// next_vsc_id assigns the next validator set change id of `chain_id`. Ids start at 1
fn next_vsc_id(storage: &mut dyn Storage, chain_id: &str) -> StdResult<u64> {
    let vsc_id = NEXT_VSC_ID.may_load(storage, chain_id)?.unwrap_or(1);
    NEXT_VSC_ID.save(storage, chain_id, &(vsc_id + 1))?;
    Ok(vsc_id)
}

/// produce_vsc_packets is called at the end of every block. It produces at most one packet
/// per consumer: sent right away over an established channel, queued otherwise.
/// The unbonding operations started in the block wait for every packet produced
pub fn produce_vsc_packets(
    storage: &mut dyn Storage,
    env: &Env,
) -> Result<(Vec<IbcMsg>, Vec<Event>), ContractError> {
    let params = PARAMS.load(storage)?;
    let height = env.block.height;
    let now = env.block.time;

    let chains: Vec<ConsumerChain> = CONSUMERS
        .range(storage, None, None, Order::Ascending)
        .map(|res| res.map(|(_, chain)| chain))
        .collect::<StdResult<_>>()?;
    let unbonding_ops = unbonding::take_pending(storage)?;

    let mut msgs = vec![];
    let mut events = vec![];
    for chain in chains {
        match chain.status {
            ConsumerStatus::Spawned | ConsumerStatus::Active => {}
            ConsumerStatus::StoppingScheduled if chain.stop_time.map_or(true, |t| t > now) => {}
            ConsumerStatus::StoppingScheduled
            | ConsumerStatus::Registered
            | ConsumerStatus::Removed => continue,
        }
        // A consumer stopped before spawning has no view to update
        if chain.spawn_height.is_none() {
            continue;
        }
        let chain_id = chain.chain_id.as_str();
        let updates = compute_updates(storage, chain_id, height)?;
        let slash_acks = SLASH_ACKS.may_load(storage, chain_id)?.unwrap_or_default();
        let heartbeat_due = chain.channel_id.is_some()
            && LAST_VSC_TIME
                .may_load(storage, chain_id)?
                .map_or(true, |last| now >= last.plus_seconds(params.vsc_heartbeat_period));
        if updates.is_empty() && slash_acks.is_empty() && unbonding_ops.is_empty() && !heartbeat_due
        {
            continue;
        }

        let vsc_id = next_vsc_id(storage, chain_id)?;
        VSC_SEND_HEIGHT.save(storage, (chain_id, vsc_id), &height)?;
        unbonding::attach(storage, chain_id, vsc_id, &unbonding_ops)?;
        SLASH_ACKS.remove(storage, chain_id);
        let packet = VscPacket {
            vsc_id,
            updates,
            slash_acks,
        };
        let mut event = Event::new("vsc_produced")
            .add_attribute("chain_id", chain_id)
            .add_attribute("vsc_id", vsc_id.to_string())
            .add_attribute("updates", packet.updates.len().to_string())
            .add_attribute("slash_acks", packet.slash_acks.len().to_string())
            .add_attribute("unbonding_ops", unbonding_ops.len().to_string());
        match &chain.channel_id {
            Some(channel_id) => {
                msgs.push(send_vsc(storage, now, &chain, channel_id, &packet)?);
                event = event.add_attribute("channel_id", channel_id);
            }
            None => {
                PENDING_VSC.save(storage, (chain_id, vsc_id), &packet)?;
                event = event.add_attribute("pending", "true");
            }
        }
        events.push(event);
    }
    unbonding::release_unreferenced(storage, &unbonding_ops)?;
    Ok((msgs, events))
}

/// flush_pending sends, in id order, the packets queued before the channel was established
pub fn flush_pending(
    storage: &mut dyn Storage,
    now: Timestamp,
    chain: &ConsumerChain,
    channel_id: &str,
) -> StdResult<Vec<IbcMsg>> {
    let chain_id = chain.chain_id.as_str();
    let pending: Vec<VscPacket> = PENDING_VSC
        .prefix(chain_id)
        .range(storage, None, None, Order::Ascending)
        .map(|res| res.map(|(_, packet)| packet))
        .collect::<StdResult<_>>()?;
    pending
        .iter()
        .map(|packet| {
            PENDING_VSC.remove(storage, (chain_id, packet.vsc_id));
            send_vsc(storage, now, chain, channel_id, packet)
        })
        .collect()
}

/// send_vsc builds the IBC message for `packet`, and tracks it until it matures on the consumer
fn send_vsc(
    storage: &mut dyn Storage,
    now: Timestamp,
    chain: &ConsumerChain,
    channel_id: &str,
    packet: &VscPacket,
) -> StdResult<IbcMsg> {
    UNMATURED_VSC.save(storage, (&chain.chain_id, packet.vsc_id), &now)?;
    LAST_VSC_TIME.save(storage, &chain.chain_id, &now)?;

    let data = CcvPacketData {
        packet: Some(Packet::ValidatorSetChange(ValidatorSetChangePacketData {
            validator_updates: packet
                .updates
                .iter()
                .map(|u| ProtoValidatorUpdate {
                    pub_key: u.pub_key.clone(),
                    power: u.power,
                })
                .collect(),
            valset_update_id: packet.vsc_id,
            slash_acks: packet.slash_acks.clone(),
        })),
    };
    Ok(IbcMsg::SendPacket {
        channel_id: channel_id.to_string(),
        data: Binary::new(data.encode_to_vec()),
        timeout: IbcTimeout::with_timestamp(now.plus_seconds(chain.params.ccv_timeout_period)),
    })
}

/// purge deletes the validator set change state of a consumer chain
pub fn purge(storage: &mut dyn Storage, chain_id: &str) -> StdResult<()> {
    NEXT_VSC_ID.remove(storage, chain_id);
    SLASH_ACKS.remove(storage, chain_id);
    LAST_VSC_TIME.remove(storage, chain_id);

    let sent = VSC_SEND_HEIGHT
        .prefix(chain_id)
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;
    for vsc_id in sent {
        VSC_SEND_HEIGHT.remove(storage, (chain_id, vsc_id));
    }
    let pending = PENDING_VSC
        .prefix(chain_id)
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;
    for vsc_id in pending {
        PENDING_VSC.remove(storage, (chain_id, vsc_id));
    }
    let unmatured = UNMATURED_VSC
        .prefix(chain_id)
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;
    for vsc_id in unmatured {
        UNMATURED_VSC.remove(storage, (chain_id, vsc_id));
    }
    let valset = CONSUMER_VALSET
        .prefix(chain_id)
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;
    for validator in valset {
        CONSUMER_VALSET.remove(storage, (chain_id, &validator));
    }
    Ok(())
}
