use cosmwasm_std::{
    to_json_binary, Deps, DepsMut, Empty, Env, Event, MessageInfo, QueryResponse, Response,
    StdResult,
};
use cw2::set_contract_version;
use cw_utils::nonpayable;

use ccv_apis::Validate;
use ccv_bindings::CcvMsg;

use crate::error::ContractError;
use crate::ibc::IBC_CHANNEL;
use crate::msg::{InstantiateMsg, QueryMsg, SudoMsg};
use crate::slashing::{report_slash, Slash};
use crate::state::config::{Config, CONFIG};
use crate::state::outbox::NEXT_OUTBOX_SEQ;
use crate::{applier, outbox, queries};

pub const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response<CcvMsg>, ContractError> {
    nonpayable(&info)?;
    let genesis = msg.genesis;
    genesis.validate()?;

    let config = Config {
        chain_id: genesis.chain_id.clone(),
        provider_chain_id: genesis.provider_chain_id.clone(),
        spawn_height: genesis.spawn_height,
        params: genesis.params.clone(),
    };
    CONFIG.save(deps.storage, &config)?;
    applier::init_genesis(deps.storage, &genesis)?;
    NEXT_OUTBOX_SEQ.save(deps.storage, &0)?;

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("chain_id", config.chain_id)
        .add_attribute("validators", genesis.initial_val_set.len().to_string()))
}

pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> Result<QueryResponse, ContractError> {
    match msg {
        QueryMsg::Config {} => Ok(to_json_binary(&queries::config(deps)?)?),
        QueryMsg::ValidatorSet { start_after, limit } => Ok(to_json_binary(
            &queries::validator_set(deps, start_after, limit)?,
        )?),
        QueryMsg::LastVscId {} => Ok(to_json_binary(&queries::last_vsc_id(deps)?)?),
        QueryMsg::Halted {} => Ok(to_json_binary(&queries::halted(deps)?)?),
        QueryMsg::PendingMaturities {} => Ok(to_json_binary(&queries::pending_maturities(deps)?)?),
        QueryMsg::PendingPackets {} => Ok(to_json_binary(&queries::pending_packets(deps)?)?),
        QueryMsg::OutstandingDowntime { validator } => Ok(to_json_binary(
            &queries::outstanding_downtime(deps, &validator),
        )?),
    }
}

pub fn migrate(_deps: DepsMut, _env: Env, _msg: Empty) -> StdResult<Response> {
    Ok(Response::default())
}

pub fn sudo(deps: DepsMut, env: Env, msg: SudoMsg) -> Result<Response<CcvMsg>, ContractError> {
    match msg {
        SudoMsg::BeginBlock {} => handle_begin_block(deps, env),
        SudoMsg::EndBlock {} => handle_end_block(deps, env),
        SudoMsg::Slash {
            validator,
            power,
            infraction_height,
            infraction_time,
            infraction,
        } => {
            let event = report_slash(
                deps.storage,
                deps.api,
                Slash {
                    validator,
                    power,
                    infraction_height,
                    infraction_time,
                    infraction,
                },
            )?;
            Ok(Response::new()
                .add_attribute("action", "slash")
                .add_event(event))
        }
    }
}

fn handle_begin_block(deps: DepsMut, env: Env) -> Result<Response<CcvMsg>, ContractError> {
    let vsc_id = applier::record_height(deps.storage, env.block.height)?;
    Ok(Response::new()
        .add_attribute("action", "begin_block")
        .add_attribute("vsc_id", vsc_id.to_string()))
}

/// handle_end_block matures validator set changes, sends the queued packets once the channel
/// is open, and hands the applied validator set changes over to consensus
fn handle_end_block(deps: DepsMut, env: Env) -> Result<Response<CcvMsg>, ContractError> {
    let mut res = Response::new().add_attribute("action", "end_block");

    let matured = applier::sweep_maturities(deps.storage, env.block.time)?;
    if !matured.is_empty() {
        let ids: Vec<String> = matured.iter().map(u64::to_string).collect();
        res = res.add_event(Event::new("vsc_matured").add_attribute("vsc_ids", ids.join(",")));
    }

    if let Some(channel) = IBC_CHANNEL.may_load(deps.storage)? {
        let msgs = outbox::flush(deps.storage, &env, &channel.endpoint.channel_id)?;
        if !msgs.is_empty() {
            res = res.add_event(
                Event::new("packets_sent")
                    .add_attribute("channel_id", &channel.endpoint.channel_id)
                    .add_attribute("count", msgs.len().to_string()),
            );
            res = res.add_messages(msgs);
        }
    }

    let updates = applier::take_pending_changes(deps.storage)?;
    if !updates.is_empty() {
        res = res
            .add_event(
                Event::new("validator_set_updated")
                    .add_attribute("updates", updates.len().to_string()),
            )
            .add_message(CcvMsg::UpdateValidatorSet { updates });
    }
    Ok(res)
}
