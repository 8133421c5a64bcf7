//! SlashThrottle: downtime slash packets from the consumers are queued in arrival order and
//! released at most one per throttle window.
use cosmwasm_std::{Api, Env, Event, Order, StdResult, Storage, Timestamp};

use ccv_apis::ccv_api::ConsumerStatus;
use ccv_bindings::CcvMsg;
use ccv_proto::interchain_security::ccv::v1::SlashPacketData;

use crate::error::ContractError;
use crate::key_assignment;
use crate::staking::jail;
use crate::state::config::PARAMS;
use crate::state::consumer::{CONSUMERS, SLASH_ACKS, VSC_SEND_HEIGHT};
use crate::state::staking::VALIDATORS;
use crate::state::throttle::{
    GlobalSlashEntry, SlashRecord, CHAIN_SLASH_QUEUE, GLOBAL_SLASH_QUEUE, LAST_SLASH_RELEASE,
    NEXT_SLASH_SEQ,
};

/// enqueue appends a downtime report of `chain_id` to its queue and to the global queue.
/// Returns the sequence of the entry
pub fn enqueue(
    storage: &mut dyn Storage,
    now: Timestamp,
    chain_id: &str,
    packet: &SlashPacketData,
) -> Result<u64, ContractError> {
    let active = CONSUMERS
        .may_load(storage, chain_id)?
        .map_or(false, |chain| chain.status == ConsumerStatus::Active);
    if !active {
        return Err(ContractError::UnknownConsumer(chain_id.to_string()));
    }

    let seq = NEXT_SLASH_SEQ.may_load(storage)?.unwrap_or_default();
    NEXT_SLASH_SEQ.save(storage, &(seq + 1))?;
    CHAIN_SLASH_QUEUE.save(
        storage,
        (chain_id, seq),
        &SlashRecord {
            validator: packet.validator.clone(),
            power: packet.power,
            vsc_id: packet.valset_update_id,
            infraction_height: packet.infraction_height,
            infraction_time: Timestamp::from_nanos(packet.infraction_time_nanos),
            recv_time: now,
        },
    )?;
    GLOBAL_SLASH_QUEUE.save(
        storage,
        seq,
        &GlobalSlashEntry {
            chain_id: chain_id.to_string(),
            recv_time: now,
        },
    )?;
    Ok(seq)
}

/// tick releases the head of the global queue if a full window has passed since the last
/// release
pub fn tick(
    storage: &mut dyn Storage,
    api: &dyn Api,
    env: &Env,
) -> Result<(Vec<CcvMsg>, Vec<Event>), ContractError> {
    let params = PARAMS.load(storage)?;
    let now = env.block.time;
    let last = LAST_SLASH_RELEASE.load(storage)?;
    if now < last.plus_seconds(params.slash_throttle_window) {
        return Ok((vec![], vec![]));
    }

    let Some((seq, entry, record)) = pop_head(storage)? else {
        return Ok((vec![], vec![]));
    };
    LAST_SLASH_RELEASE.save(storage, &now)?;

    let mut event = Event::new("slash_packet_released")
        .add_attribute("seq", seq.to_string())
        .add_attribute("chain_id", &entry.chain_id)
        .add_attribute("consumer_key", &record.validator)
        .add_attribute("vsc_id", record.vsc_id.to_string());
    let mut msgs = vec![];
    let mut events = vec![];
    match release(storage, env, params.jail_duration, &entry.chain_id, &record)? {
        Release::Dropped(reason) => {
            api.debug(&format!(
                "slash packet {seq} from {} dropped: {reason}",
                entry.chain_id
            ));
            event = event.add_attribute("outcome", "dropped").add_attribute("reason", reason);
        }
        Release::Jailed { validator, msg } => {
            event = event
                .add_attribute("outcome", "jailed")
                .add_attribute("validator", &validator);
            if let Some(msg) = msg {
                events.push(Event::new("validator_jailed").add_attribute("validator", validator));
                msgs.push(msg);
            }
        }
    }
    events.insert(0, event);

    // Acknowledged either way, so the consumer can report the key again
    SLASH_ACKS.update(storage, &entry.chain_id, |acks| -> StdResult<_> {
        let mut acks = acks.unwrap_or_default();
        acks.push(record.validator.clone());
        Ok(acks)
    })?;
    Ok((msgs, events))
}

enum Release {
    Dropped(&'static str),
    Jailed {
        validator: String,
        msg: Option<CcvMsg>,
    },
}

fn release(
    storage: &mut dyn Storage,
    env: &Env,
    jail_duration: u64,
    chain_id: &str,
    record: &SlashRecord,
) -> Result<Release, ContractError> {
    let Some(height) = VSC_SEND_HEIGHT.may_load(storage, (chain_id, record.vsc_id))? else {
        return Ok(Release::Dropped("unknown_vsc_id"));
    };
    let Some(validator) =
        key_assignment::resolve_validator(storage, chain_id, &record.validator, height)?
    else {
        return Ok(Release::Dropped("unknown_validator"));
    };
    if VALIDATORS.load(storage, &validator)?.tombstoned {
        return Ok(Release::Dropped("tombstoned"));
    }
    let msg = jail(storage, &validator, env.block.time.plus_seconds(jail_duration))?;
    Ok(Release::Jailed { validator, msg })
}

/// pop_head removes and returns the oldest entry of the global queue
fn pop_head(
    storage: &mut dyn Storage,
) -> StdResult<Option<(u64, GlobalSlashEntry, SlashRecord)>> {
    loop {
        let head = GLOBAL_SLASH_QUEUE
            .range(storage, None, None, Order::Ascending)
            .next()
            .transpose()?;
        let Some((seq, entry)) = head else {
            return Ok(None);
        };
        GLOBAL_SLASH_QUEUE.remove(storage, seq);
        let key = (entry.chain_id.as_str(), seq);
        // The chain queue may have been purged with its consumer
        if let Some(record) = CHAIN_SLASH_QUEUE.may_load(storage, key)? {
            CHAIN_SLASH_QUEUE.remove(storage, key);
            return Ok(Some((seq, entry, record)));
        }
    }
}

/// purge_chain drops the queued reports of a removed consumer
pub fn purge_chain(storage: &mut dyn Storage, chain_id: &str) -> StdResult<usize> {
    let seqs = CHAIN_SLASH_QUEUE
        .prefix(chain_id)
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;
    for seq in &seqs {
        CHAIN_SLASH_QUEUE.remove(storage, (chain_id, *seq));
        GLOBAL_SLASH_QUEUE.remove(storage, *seq);
    }
    Ok(seqs.len())
}

pub fn global_queue_size(storage: &dyn Storage) -> u64 {
    GLOBAL_SLASH_QUEUE
        .keys_raw(storage, None, None, Order::Ascending)
        .count() as u64
}

pub fn chain_queue_size(storage: &dyn Storage, chain_id: &str) -> u64 {
    CHAIN_SLASH_QUEUE
        .prefix(chain_id)
        .keys_raw(storage, None, None, Order::Ascending)
        .count() as u64
}
