use cosmwasm_std::{
    to_json_binary, Deps, DepsMut, Empty, Env, MessageInfo, QueryResponse, Response, StdResult,
};
use cw2::set_contract_version;
use cw_utils::{maybe_addr, nonpayable};

use ccv_apis::validate_chain_id;
use ccv_bindings::CcvMsg;

use crate::error::ContractError;
use crate::key_assignment::handle_assign_consumer_key;
use crate::msg::{ExecuteMsg, InstantiateMsg, PowerChange, QueryMsg, SudoMsg};
use crate::proposals::handle_proposal;
use crate::staking::{handle_unjail, record_power_changes};
use crate::state::config::{Config, ADMIN, CONFIG, PARAMS};
use crate::state::throttle::{LAST_SLASH_RELEASE, NEXT_SLASH_SEQ};
use crate::{lifecycle, queries, throttle, unbonding, vsc};

pub const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn instantiate(
    mut deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response<CcvMsg>, ContractError> {
    nonpayable(&info)?;
    validate_chain_id(&msg.provider_chain_id)?;
    let config = Config {
        provider_chain_id: msg.provider_chain_id,
    };
    CONFIG.save(deps.storage, &config)?;

    let api = deps.api;
    ADMIN.set(deps.branch(), maybe_addr(api, msg.admin.clone())?)?;

    let params = msg.params.unwrap_or_default();
    params.validate()?;
    PARAMS.save(deps.storage, &params)?;
    // The throttle clock starts now
    LAST_SLASH_RELEASE.save(deps.storage, &env.block.time)?;
    NEXT_SLASH_SEQ.save(deps.storage, &0)?;

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    Ok(Response::new().add_attribute("action", "instantiate"))
}

pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> Result<QueryResponse, ContractError> {
    match msg {
        QueryMsg::Config {} => Ok(to_json_binary(&queries::config(deps)?)?),
        QueryMsg::Params {} => Ok(to_json_binary(&queries::params(deps)?)?),
        QueryMsg::Admin {} => to_json_binary(&ADMIN.query_admin(deps)?).map_err(Into::into),
        QueryMsg::GlobalSlashQueueSize {} => {
            Ok(to_json_binary(&queries::global_slash_queue_size(deps))?)
        }
        QueryMsg::ChainSlashQueueSize { chain_id } => Ok(to_json_binary(
            &queries::chain_slash_queue_size(deps, &chain_id),
        )?),
        QueryMsg::SlashQueue { start_after, limit } => Ok(to_json_binary(
            &queries::slash_queue(deps, start_after, limit)?,
        )?),
        QueryMsg::ConsumerKey {
            chain_id,
            validator,
            height,
        } => Ok(to_json_binary(&queries::consumer_key(
            deps, &env, &chain_id, &validator, height,
        )?)?),
        QueryMsg::ValidatorByConsumerKey {
            chain_id,
            consumer_key,
            height,
        } => Ok(to_json_binary(&queries::validator_by_consumer_key(
            deps,
            &env,
            &chain_id,
            &consumer_key,
            height,
        )?)?),
        QueryMsg::ConsumerChain { chain_id } => {
            Ok(to_json_binary(&queries::consumer_chain(deps, &chain_id)?)?)
        }
        QueryMsg::ConsumerChains { start_after, limit } => Ok(to_json_binary(
            &queries::consumer_chains(deps, start_after, limit)?,
        )?),
        QueryMsg::ConsumerGenesis { chain_id } => {
            Ok(to_json_binary(&queries::consumer_genesis(deps, &chain_id)?)?)
        }
        QueryMsg::Validator { consensus_key } => {
            Ok(to_json_binary(&queries::validator(deps, &consensus_key)?)?)
        }
        QueryMsg::UnmaturedVscs { chain_id } => {
            Ok(to_json_binary(&queries::unmatured_vscs(deps, &chain_id)?)?)
        }
        QueryMsg::UnbondingOp { op_id } => {
            Ok(to_json_binary(&queries::unbonding_op(deps, op_id)?)?)
        }
    }
}

/// Nothing to migrate yet: the storage layout is unchanged across versions
pub fn migrate(_deps: DepsMut, _env: Env, _msg: Empty) -> StdResult<Response> {
    Ok(Response::default())
}

pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response<CcvMsg>, ContractError> {
    let api = deps.api;
    match msg {
        ExecuteMsg::UpdateAdmin { admin } => ADMIN
            .execute_update_admin(deps, info, maybe_addr(api, admin)?)
            .map_err(Into::into),
        ExecuteMsg::SubmitProposal { proposal } => {
            nonpayable(&info)?;
            handle_proposal(deps, &info, proposal)
        }
        ExecuteMsg::AssignConsumerKey {
            chain_id,
            consumer_key,
        } => {
            nonpayable(&info)?;
            handle_assign_consumer_key(deps, &env, &info, &chain_id, &consumer_key)
        }
        ExecuteMsg::Unjail {} => {
            nonpayable(&info)?;
            handle_unjail(deps, &env, &info)
        }
    }
}

pub fn sudo(mut deps: DepsMut, env: Env, msg: SudoMsg) -> Result<Response<CcvMsg>, ContractError> {
    match msg {
        SudoMsg::BeginBlock {} => handle_begin_block(&mut deps, env),
        SudoMsg::EndBlock { power_changes } => handle_end_block(&mut deps, env, &power_changes),
        SudoMsg::UnbondingInitiated { op_id } => {
            let event = unbonding::hold(deps.storage, op_id)?;
            Ok(Response::new().add_event(event))
        }
    }
}

fn handle_begin_block(deps: &mut DepsMut, env: Env) -> Result<Response<CcvMsg>, ContractError> {
    let (msgs, events) = lifecycle::begin_block(deps.storage, &env)?;
    Ok(Response::new().add_messages(msgs).add_events(events))
}

fn handle_end_block(
    deps: &mut DepsMut,
    env: Env,
    power_changes: &[PowerChange],
) -> Result<Response<CcvMsg>, ContractError> {
    record_power_changes(deps, power_changes)?;
    // Jailing takes effect in the updates of this block
    let (jail_msgs, slash_events) = throttle::tick(deps.storage, deps.api, &env)?;
    let (vsc_msgs, vsc_events) = vsc::produce_vsc_packets(deps.storage, &env)?;
    let unbonding_msgs = unbonding::complete_matured(deps.storage)?;

    Ok(Response::new()
        .add_messages(jail_msgs)
        .add_messages(vsc_msgs)
        .add_messages(unbonding_msgs)
        .add_events(slash_events)
        .add_events(vsc_events))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env};
    use cosmwasm_std::{coins, from_json, Decimal, IbcMsg};
    use cw_controllers::{AdminError, AdminResponse};
    use cw_utils::PaymentError;

    use ccv_apis::ccv_api::ConsumerStatus;
    use ccv_apis::proposal_api::{ConsumerAdditionProposal, Proposal};
    use ccv_apis::ApiError;

    use crate::msg::{ConsumerKeyResponse, SlashQueueSizeResponse};
    use crate::state::config::Params;
    use crate::state::consumer::ConsumerChain;
    use crate::staking::tests::power_change;

    pub(crate) const CREATOR: &str = "creator";
    pub(crate) const INIT_ADMIN: &str = "initial_admin";
    const NEW_ADMIN: &str = "new_admin";
    const CHAIN: &str = "consumer-1";

    fn instantiate_msg(admin: Option<String>) -> InstantiateMsg {
        InstantiateMsg {
            admin,
            provider_chain_id: "provider".to_string(),
            params: None,
        }
    }

    fn addition(env: &Env) -> Proposal {
        Proposal::ConsumerAddition(ConsumerAdditionProposal {
            chain_id: CHAIN.to_string(),
            initial_height: 1,
            genesis_hash: b"gen".into(),
            binary_hash: b"bin".into(),
            spawn_time: env.block.time,
            consumer_redistribution_fraction: Decimal::percent(75),
            blocks_per_distribution_transmission: 1000,
            distribution_transmission_channel: String::new(),
            historical_entries: 10000,
            ccv_timeout_period: 2419200,
            transfer_timeout_period: 3600,
            unbonding_period: 86400,
            deposit: vec![],
        })
    }

    #[test]
    fn instantiate_without_admin() {
        let mut deps = mock_dependencies();
        let info = message_info(&deps.api.addr_make(CREATOR), &[]);

        let res = instantiate(deps.as_mut(), mock_env(), info, instantiate_msg(None)).unwrap();
        assert_eq!(0, res.messages.len());

        let res = ADMIN.query_admin(deps.as_ref()).unwrap();
        assert_eq!(None, res.admin);
        assert_eq!(PARAMS.load(&deps.storage).unwrap(), Params::default());
    }

    #[test]
    fn instantiate_with_admin() {
        let mut deps = mock_dependencies();
        let init_admin = deps.api.addr_make(INIT_ADMIN);
        let info = message_info(&deps.api.addr_make(CREATOR), &[]);

        let msg = instantiate_msg(Some(init_admin.to_string()));
        instantiate(deps.as_mut(), mock_env(), info, msg).unwrap();
        ADMIN.assert_admin(deps.as_ref(), &init_admin).unwrap();

        // ensure the admin is queryable as well
        let res = query(deps.as_ref(), mock_env(), QueryMsg::Admin {}).unwrap();
        let admin: AdminResponse = from_json(res).unwrap();
        assert_eq!(admin.admin.unwrap(), init_admin.as_str())
    }

    #[test]
    fn instantiate_rejects_bad_input() {
        let mut deps = mock_dependencies();
        let creator = deps.api.addr_make(CREATOR);

        let info = message_info(&creator, &coins(100, "stake"));
        let err = instantiate(deps.as_mut(), mock_env(), info, instantiate_msg(None)).unwrap_err();
        assert_eq!(err, ContractError::Payment(PaymentError::NonPayable {}));

        let info = message_info(&creator, &[]);
        let msg = InstantiateMsg {
            provider_chain_id: " ".to_string(),
            ..instantiate_msg(None)
        };
        let err = instantiate(deps.as_mut(), mock_env(), info.clone(), msg).unwrap_err();
        assert_eq!(err, ContractError::Api(ApiError::EmptyChainId));

        let msg = InstantiateMsg {
            params: Some(Params {
                jail_duration: 0,
                ..Params::default()
            }),
            ..instantiate_msg(None)
        };
        let err = instantiate(deps.as_mut(), mock_env(), info, msg).unwrap_err();
        assert_eq!(err, ContractError::Api(ApiError::zero_period("jail_duration")));
    }

    #[test]
    fn test_update_admin() {
        let mut deps = mock_dependencies();
        let init_admin = deps.api.addr_make(INIT_ADMIN);
        let new_admin = deps.api.addr_make(NEW_ADMIN);
        let info = message_info(&deps.api.addr_make(CREATOR), &[]);
        instantiate(
            deps.as_mut(),
            mock_env(),
            info.clone(),
            instantiate_msg(Some(init_admin.to_string())),
        )
        .unwrap();

        let update = ExecuteMsg::UpdateAdmin {
            admin: Some(new_admin.to_string()),
        };
        // Only the current admin can update it
        let err = execute(deps.as_mut(), mock_env(), info, update.clone()).unwrap_err();
        assert_eq!(err, ContractError::Admin(AdminError::NotAdmin {}));

        let info = message_info(&init_admin, &[]);
        execute(deps.as_mut(), mock_env(), info, update).unwrap();
        ADMIN.assert_admin(deps.as_ref(), &new_admin).unwrap();
    }

    #[test]
    fn block_processing() {
        let mut deps = mock_dependencies();
        let env = mock_env();
        let admin = deps.api.addr_make(INIT_ADMIN);
        let info = message_info(&deps.api.addr_make(CREATOR), &[]);
        instantiate(
            deps.as_mut(),
            env.clone(),
            info,
            instantiate_msg(Some(admin.to_string())),
        )
        .unwrap();

        let changes = vec![
            power_change(&deps.api, "alice", 100),
            power_change(&deps.api, "bob", 50),
        ];
        sudo(
            deps.as_mut(),
            env.clone(),
            SudoMsg::EndBlock {
                power_changes: changes,
            },
        )
        .unwrap();

        let info = message_info(&admin, &[]);
        execute(
            deps.as_mut(),
            env.clone(),
            info,
            ExecuteMsg::SubmitProposal {
                proposal: addition(&env),
            },
        )
        .unwrap();

        // Assigned before spawning, effective from the next block on
        let info = message_info(&deps.api.addr_make("alice"), &[]);
        execute(
            deps.as_mut(),
            env.clone(),
            info,
            ExecuteMsg::AssignConsumerKey {
                chain_id: CHAIN.to_string(),
                consumer_key: "alice_key".to_string(),
            },
        )
        .unwrap();
        let res = query(
            deps.as_ref(),
            env.clone(),
            QueryMsg::ConsumerKey {
                chain_id: CHAIN.to_string(),
                validator: "alice_cons".to_string(),
                height: None,
            },
        )
        .unwrap();
        let key: ConsumerKeyResponse = from_json(res).unwrap();
        assert_eq!(key.consumer_key, "alice_cons");
        assert_eq!(key.pending_key, Some("alice_key".to_string()));

        let mut next = env.clone();
        next.block.height += 1;
        next.block.time = next.block.time.plus_seconds(5);
        sudo(deps.as_mut(), next.clone(), SudoMsg::BeginBlock {}).unwrap();
        let res = query(
            deps.as_ref(),
            next.clone(),
            QueryMsg::ConsumerChain {
                chain_id: CHAIN.to_string(),
            },
        )
        .unwrap();
        let chain: ConsumerChain = from_json(res).unwrap();
        assert_eq!(chain.status, ConsumerStatus::Spawned);
        let genesis = queries::consumer_genesis(deps.as_ref(), CHAIN).unwrap();
        assert!(genesis
            .initial_val_set
            .iter()
            .any(|update| update.pub_key == "alice_key" && update.power == 100));

        // No channel yet, the update is queued
        let changes = vec![power_change(&deps.api, "bob", 70)];
        let res = sudo(
            deps.as_mut(),
            next.clone(),
            SudoMsg::EndBlock {
                power_changes: changes,
            },
        )
        .unwrap();
        assert!(res
            .messages
            .iter()
            .all(|sub| !matches!(sub.msg, cosmwasm_std::CosmosMsg::Ibc(IbcMsg::SendPacket { .. }))));
        assert_eq!(res.events[0].ty, "vsc_produced");

        let res = query(
            deps.as_ref(),
            next,
            QueryMsg::GlobalSlashQueueSize {},
        )
        .unwrap();
        let size: SlashQueueSizeResponse = from_json(res).unwrap();
        assert_eq!(size.size, 0);
    }
}
