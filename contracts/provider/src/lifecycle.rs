//! ConsumerLifecycleManager: `Registered -> Spawned -> Active -> StoppingScheduled -> Removed`.
use cosmwasm_std::{Env, Event, IbcMsg, Order, StdResult, Storage, Timestamp};

use ccv_apis::ccv_api::{ConsumerGenesis, ConsumerStatus};
use ccv_apis::proposal_api::{ConsumerAdditionProposal, ConsumerRemovalProposal};

use crate::error::ContractError;
use crate::state::config::{CONFIG, PARAMS};
use crate::state::consumer::{
    ConsumerChain, CHANNEL_TO_CHAIN, CONSUMERS, CONSUMER_GENESIS, LAST_VSC_TIME, NEXT_VSC_ID,
    UNMATURED_VSC, VSC_SEND_HEIGHT,
};
use crate::{key_assignment, throttle, unbonding, vsc};

/// add_consumer registers a consumer chain accepted by governance
pub fn add_consumer(
    storage: &mut dyn Storage,
    proposal: &ConsumerAdditionProposal,
) -> Result<Event, ContractError> {
    let cfg = CONFIG.load(storage)?;
    if proposal.chain_id == cfg.provider_chain_id || CONSUMERS.has(storage, &proposal.chain_id) {
        return Err(ContractError::ConsumerAlreadyExists(
            proposal.chain_id.clone(),
        ));
    }
    let chain = ConsumerChain {
        chain_id: proposal.chain_id.clone(),
        status: ConsumerStatus::Registered,
        initial_height: proposal.initial_height,
        spawn_time: proposal.spawn_time,
        stop_time: None,
        genesis_hash: proposal.genesis_hash.clone(),
        binary_hash: proposal.binary_hash.clone(),
        params: proposal.consumer_params(),
        deposit: proposal.deposit.clone(),
        spawn_height: None,
        channel_id: None,
    };
    CONSUMERS.save(storage, &chain.chain_id, &chain)?;

    Ok(Event::new("consumer_added")
        .add_attribute("chain_id", &chain.chain_id)
        .add_attribute("spawn_time", chain.spawn_time.to_string()))
}

/// schedule_removal sets the stop time of a consumer chain, superseding any earlier one
pub fn schedule_removal(
    storage: &mut dyn Storage,
    proposal: &ConsumerRemovalProposal,
) -> Result<Event, ContractError> {
    let mut chain = CONSUMERS
        .may_load(storage, &proposal.chain_id)?
        .ok_or_else(|| ContractError::ConsumerUnknown(proposal.chain_id.clone()))?;
    let previous = chain.status;
    chain.status = ConsumerStatus::StoppingScheduled;
    chain.stop_time = Some(proposal.stop_time);
    CONSUMERS.save(storage, &chain.chain_id, &chain)?;

    Ok(Event::new("consumer_stop_scheduled")
        .add_attribute("chain_id", &chain.chain_id)
        .add_attribute("previous_status", previous.to_string())
        .add_attribute("stop_time", proposal.stop_time.to_string()))
}

/// stop_now schedules the removal of a consumer at `now`, after a CCV packet timeout or a
/// close of its channel
pub fn stop_now(
    storage: &mut dyn Storage,
    chain_id: &str,
    now: Timestamp,
) -> Result<Event, ContractError> {
    schedule_removal(
        storage,
        &ConsumerRemovalProposal {
            chain_id: chain_id.to_string(),
            stop_time: now,
            deposit: vec![],
        },
    )
}

/// begin_block spawns the consumers whose spawn time has come, and removes the stopped ones
/// that are drained
pub fn begin_block(
    storage: &mut dyn Storage,
    env: &Env,
) -> Result<(Vec<IbcMsg>, Vec<Event>), ContractError> {
    let now = env.block.time;
    let drain_timeout = PARAMS.load(storage)?.drain_timeout;
    let chains: Vec<ConsumerChain> = CONSUMERS
        .range(storage, None, None, Order::Ascending)
        .map(|res| res.map(|(_, chain)| chain))
        .collect::<StdResult<_>>()?;

    let mut msgs = vec![];
    let mut events = vec![];
    for chain in chains {
        match chain.status {
            ConsumerStatus::Registered if chain.spawn_time <= now => {
                events.push(spawn(storage, env, chain)?);
            }
            ConsumerStatus::StoppingScheduled => {
                let Some(stop_time) = chain.stop_time else {
                    continue;
                };
                if stop_time > now {
                    continue;
                }
                // Only the changes sent before the stop time are waited for
                let unmatured = UNMATURED_VSC
                    .prefix(&chain.chain_id)
                    .range(storage, None, None, Order::Ascending)
                    .collect::<StdResult<Vec<_>>>()?
                    .into_iter()
                    .filter(|(_, sent)| *sent <= stop_time)
                    .count();
                let timed_out = now.seconds() >= stop_time.seconds().saturating_add(drain_timeout);
                if unmatured == 0 || timed_out {
                    let (msg, event) = remove(storage, chain, unmatured)?;
                    msgs.extend(msg);
                    events.push(event);
                }
            }
            _ => {}
        }
    }
    Ok((msgs, events))
}

/// spawn produces the genesis of `chain` from the current validator set
fn spawn(storage: &mut dyn Storage, env: &Env, mut chain: ConsumerChain) -> StdResult<Event> {
    let cfg = CONFIG.load(storage)?;
    let height = env.block.height;
    let initial_val_set = vsc::genesis_valset(storage, &chain.chain_id, height)?;
    let genesis = ConsumerGenesis {
        chain_id: chain.chain_id.clone(),
        provider_chain_id: cfg.provider_chain_id,
        initial_height: chain.initial_height,
        spawn_height: height,
        spawn_time: env.block.time,
        genesis_hash: chain.genesis_hash.clone(),
        binary_hash: chain.binary_hash.clone(),
        initial_val_set,
        params: chain.params.clone(),
    };
    CONSUMER_GENESIS.save(storage, &chain.chain_id, &genesis)?;
    // Slash packets for infractions before the first update reference the genesis set
    VSC_SEND_HEIGHT.save(storage, (&chain.chain_id, 0), &height)?;
    NEXT_VSC_ID.save(storage, &chain.chain_id, &1)?;

    chain.status = ConsumerStatus::Spawned;
    chain.spawn_height = Some(height);
    CONSUMERS.save(storage, &chain.chain_id, &chain)?;

    Ok(Event::new("consumer_spawned")
        .add_attribute("chain_id", chain.chain_id)
        .add_attribute("spawn_height", height.to_string())
        .add_attribute("validators", genesis.initial_val_set.len().to_string()))
}

/// activate binds `channel_id` to the spawned consumer `chain_id` once it registered over it.
/// Returns the validator set changes queued while the channel was being established
pub fn activate(
    storage: &mut dyn Storage,
    env: &Env,
    chain_id: &str,
    channel_id: &str,
) -> Result<Vec<IbcMsg>, ContractError> {
    let mut chain = CONSUMERS
        .may_load(storage, chain_id)?
        .ok_or_else(|| ContractError::ConsumerUnknown(chain_id.to_string()))?;
    if chain.status != ConsumerStatus::Spawned {
        return Err(ContractError::ConsumerNotSpawned {
            chain_id: chain_id.to_string(),
            status: chain.status,
        });
    }
    if CHANNEL_TO_CHAIN.has(storage, channel_id) {
        return Err(ContractError::ChannelAlreadyBound(channel_id.to_string()));
    }

    CHANNEL_TO_CHAIN.save(storage, channel_id, &chain.chain_id)?;
    chain.status = ConsumerStatus::Active;
    chain.channel_id = Some(channel_id.to_string());
    CONSUMERS.save(storage, chain_id, &chain)?;
    LAST_VSC_TIME.save(storage, chain_id, &env.block.time)?;

    Ok(vsc::flush_pending(
        storage,
        env.block.time,
        &chain,
        channel_id,
    )?)
}

/// remove purges all the state of a stopped consumer, and closes its channel.
/// The chain id may be added again afterwards, as a new consumer
fn remove(
    storage: &mut dyn Storage,
    chain: ConsumerChain,
    unmatured: usize,
) -> Result<(Option<IbcMsg>, Event), ContractError> {
    let chain_id = chain.chain_id.as_str();
    let dropped_slashes = throttle::purge_chain(storage, chain_id)?;
    vsc::purge(storage, chain_id)?;
    key_assignment::purge(storage, chain_id)?;
    let released_ops = unbonding::purge_chain(storage, chain_id)?;
    CONSUMER_GENESIS.remove(storage, chain_id);
    CONSUMERS.remove(storage, chain_id);

    let close = match &chain.channel_id {
        Some(channel_id) => {
            CHANNEL_TO_CHAIN.remove(storage, channel_id);
            Some(IbcMsg::CloseChannel {
                channel_id: channel_id.clone(),
            })
        }
        None => None,
    };
    let event = Event::new("consumer_removed")
        .add_attribute("chain_id", chain_id)
        .add_attribute("unmatured_vscs", unmatured.to_string())
        .add_attribute("dropped_slash_packets", dropped_slashes.to_string())
        .add_attribute("released_unbonding_ops", released_ops.to_string());
    Ok((close, event))
}

/// chain_by_channel returns the consumer chain bound to `channel_id`
pub fn chain_by_channel(
    storage: &dyn Storage,
    channel_id: &str,
) -> StdResult<Option<ConsumerChain>> {
    match CHANNEL_TO_CHAIN.may_load(storage, channel_id)? {
        Some(chain_id) => CONSUMERS.may_load(storage, &chain_id),
        None => Ok(None),
    }
}
