use cosmwasm_std::{Deps, Env, Order, StdResult};
use cw_storage_plus::Bound;

use ccv_apis::ccv_api::ConsumerGenesis;

use crate::error::ContractError;
use crate::key_assignment;
use crate::msg::{
    ConsumerChainsResponse, ConsumerKeyResponse, SlashQueueEntry, SlashQueueResponse,
    SlashQueueSizeResponse, UnbondingOpResponse, UnmaturedVsc, UnmaturedVscsResponse,
    ValidatorByConsumerKeyResponse,
};
use crate::state::config::{Config, Params, CONFIG, PARAMS};
use crate::state::consumer::{ConsumerChain, CONSUMERS, CONSUMER_GENESIS, UNMATURED_VSC};
use crate::state::staking::{Validator, VALIDATORS};
use crate::state::throttle::{CHAIN_SLASH_QUEUE, GLOBAL_SLASH_QUEUE};
use crate::{throttle, unbonding};

// Settings for pagination
const MAX_LIMIT: u32 = 30;
const DEFAULT_LIMIT: u32 = 10;

pub fn config(deps: Deps) -> StdResult<Config> {
    CONFIG.load(deps.storage)
}

pub fn params(deps: Deps) -> StdResult<Params> {
    PARAMS.load(deps.storage)
}

pub fn global_slash_queue_size(deps: Deps) -> SlashQueueSizeResponse {
    SlashQueueSizeResponse {
        size: throttle::global_queue_size(deps.storage),
    }
}

pub fn chain_slash_queue_size(deps: Deps, chain_id: &str) -> SlashQueueSizeResponse {
    SlashQueueSizeResponse {
        size: throttle::chain_queue_size(deps.storage, chain_id),
    }
}

/// slash_queue lists the global queue in release order
pub fn slash_queue(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> Result<SlashQueueResponse, ContractError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);
    let entries = GLOBAL_SLASH_QUEUE
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| {
            let (seq, entry) = item?;
            let record = CHAIN_SLASH_QUEUE.load(deps.storage, (&entry.chain_id, seq))?;
            Ok(SlashQueueEntry {
                seq,
                chain_id: entry.chain_id,
                validator: record.validator,
                vsc_id: record.vsc_id,
                recv_time: entry.recv_time,
            })
        })
        .collect::<StdResult<_>>()?;
    Ok(SlashQueueResponse { entries })
}

pub fn consumer_key(
    deps: Deps,
    env: &Env,
    chain_id: &str,
    validator: &str,
    height: Option<u64>,
) -> Result<ConsumerKeyResponse, ContractError> {
    if !CONSUMERS.has(deps.storage, chain_id) {
        return Err(ContractError::ConsumerUnknown(chain_id.to_string()));
    }
    let height = height.unwrap_or(env.block.height);
    Ok(ConsumerKeyResponse {
        consumer_key: key_assignment::resolve(deps.storage, chain_id, validator, height)?,
        assigned: key_assignment::assigned_at(deps.storage, chain_id, validator, height)?,
        pending_key: key_assignment::pending_key(deps.storage, chain_id, validator, height)?,
    })
}

pub fn validator_by_consumer_key(
    deps: Deps,
    env: &Env,
    chain_id: &str,
    consumer_key: &str,
    height: Option<u64>,
) -> Result<ValidatorByConsumerKeyResponse, ContractError> {
    if !CONSUMERS.has(deps.storage, chain_id) {
        return Err(ContractError::ConsumerUnknown(chain_id.to_string()));
    }
    let height = height.unwrap_or(env.block.height);
    Ok(ValidatorByConsumerKeyResponse {
        validator: key_assignment::resolve_validator(deps.storage, chain_id, consumer_key, height)?,
    })
}

pub fn consumer_chain(deps: Deps, chain_id: &str) -> Result<ConsumerChain, ContractError> {
    CONSUMERS
        .may_load(deps.storage, chain_id)?
        .ok_or_else(|| ContractError::ConsumerUnknown(chain_id.to_string()))
}

pub fn consumer_chains(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<ConsumerChainsResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.as_ref().map(|s| Bound::exclusive(s.as_str()));
    let chains = CONSUMERS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, chain)| chain))
        .collect::<StdResult<_>>()?;
    Ok(ConsumerChainsResponse { chains })
}

pub fn consumer_genesis(deps: Deps, chain_id: &str) -> Result<ConsumerGenesis, ContractError> {
    let chain = consumer_chain(deps, chain_id)?;
    CONSUMER_GENESIS
        .may_load(deps.storage, chain_id)?
        .ok_or(ContractError::ConsumerNotSpawned {
            chain_id: chain.chain_id,
            status: chain.status,
        })
}

pub fn validator(deps: Deps, consensus_key: &str) -> Result<Validator, ContractError> {
    VALIDATORS
        .may_load(deps.storage, consensus_key)?
        .ok_or_else(|| ContractError::UnknownValidator(consensus_key.to_string()))
}

pub fn unmatured_vscs(deps: Deps, chain_id: &str) -> StdResult<UnmaturedVscsResponse> {
    let vscs = UNMATURED_VSC
        .prefix(chain_id)
        .range(deps.storage, None, None, Order::Ascending)
        .map(|item| item.map(|(vsc_id, sent_time)| UnmaturedVsc { vsc_id, sent_time }))
        .collect::<StdResult<_>>()?;
    Ok(UnmaturedVscsResponse { vscs })
}

pub fn unbonding_op(deps: Deps, op_id: u64) -> StdResult<UnbondingOpResponse> {
    Ok(UnbondingOpResponse {
        op_id,
        waiting_consumers: unbonding::waiting_consumers(deps.storage, op_id)?,
    })
}
