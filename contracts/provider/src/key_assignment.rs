//! Registry of the consensus keys provider validators use on each consumer chain.
//!
//! Assignments are kept as a history keyed by effective height, so that both directions
//! can be resolved for any past height: the key a validator update referenced when it was
//! produced, and the provider validator behind a key reported in a slash packet.
use cosmwasm_std::{DepsMut, Env, Event, MessageInfo, Order, Response, StdResult, Storage};
use cw_storage_plus::Bound;

use ccv_apis::ApiError;
use ccv_bindings::CcvMsg;

use crate::error::ContractError;
use crate::state::consumer::CONSUMERS;
use crate::state::keys::{KEY_FORWARD, KEY_REVERSE};
use crate::state::staking::VALIDATORS;
use crate::staking::validator_by_operator;

pub fn handle_assign_consumer_key(
    deps: DepsMut,
    env: &Env,
    info: &MessageInfo,
    chain_id: &str,
    consumer_key: &str,
) -> Result<Response<CcvMsg>, ContractError> {
    let (validator, _) = validator_by_operator(deps.storage, &info.sender)?;
    let effective_height = assign(
        deps.storage,
        chain_id,
        &validator,
        consumer_key,
        env.block.height,
    )?;

    Ok(Response::new()
        .add_attribute("action", "assign_consumer_key")
        .add_event(
            Event::new("key_assigned")
                .add_attribute("chain_id", chain_id)
                .add_attribute("validator", validator)
                .add_attribute("consumer_key", consumer_key)
                .add_attribute("effective_height", effective_height.to_string()),
        ))
}

/// assign records `key` as the consumer key of `validator` on `chain_id`, effective for
/// updates produced from `height + 1` on. Returns the effective height
pub fn assign(
    storage: &mut dyn Storage,
    chain_id: &str,
    validator: &str,
    key: &str,
    height: u64,
) -> Result<u64, ContractError> {
    if key.is_empty() {
        return Err(ApiError::EmptyKey.into());
    }
    if !CONSUMERS.has(storage, chain_id) {
        return Err(ContractError::ConsumerUnknown(chain_id.to_string()));
    }
    if let Some(owner) = current_owner(storage, chain_id, key)? {
        if owner != validator {
            return Err(ContractError::KeyAlreadyInUse {
                key: key.to_string(),
                owner,
            });
        }
    }

    let effective_height = height + 1;
    // A second assignment in the same block replaces the first one
    if let Some(replaced) = KEY_FORWARD.may_load(storage, (chain_id, validator, effective_height))? {
        KEY_REVERSE.remove(storage, (chain_id, &replaced, effective_height));
    }
    KEY_FORWARD.save(
        storage,
        (chain_id, validator, effective_height),
        &key.to_string(),
    )?;
    KEY_REVERSE.save(
        storage,
        (chain_id, key, effective_height),
        &validator.to_string(),
    )?;
    Ok(effective_height)
}

/// resolve returns the key `validator` used on `chain_id` for updates produced at `height`.
/// Without an assignment the provider key is used
pub fn resolve(
    storage: &dyn Storage,
    chain_id: &str,
    validator: &str,
    height: u64,
) -> StdResult<String> {
    let assigned = KEY_FORWARD
        .prefix((chain_id, validator))
        .range(
            storage,
            None,
            Some(Bound::inclusive(height)),
            Order::Descending,
        )
        .next()
        .transpose()?;
    Ok(assigned.map_or_else(|| validator.to_string(), |(_, key)| key))
}

/// assigned_at tells whether `validator` uses an assigned key at `height`
pub fn assigned_at(
    storage: &dyn Storage,
    chain_id: &str,
    validator: &str,
    height: u64,
) -> StdResult<bool> {
    Ok(KEY_FORWARD
        .prefix((chain_id, validator))
        .keys(
            storage,
            None,
            Some(Bound::inclusive(height)),
            Order::Descending,
        )
        .next()
        .transpose()?
        .is_some())
}

/// pending_key returns the latest assignment of `validator` if it is not effective at `height`
pub fn pending_key(
    storage: &dyn Storage,
    chain_id: &str,
    validator: &str,
    height: u64,
) -> StdResult<Option<String>> {
    let latest = KEY_FORWARD
        .prefix((chain_id, validator))
        .range(
            storage,
            Some(Bound::exclusive(height)),
            None,
            Order::Descending,
        )
        .next()
        .transpose()?;
    Ok(latest.map(|(_, key)| key))
}

/// latest_key returns the key `validator` will use once all recorded assignments are effective
fn latest_key(storage: &dyn Storage, chain_id: &str, validator: &str) -> StdResult<String> {
    resolve(storage, chain_id, validator, u64::MAX)
}

/// resolve_validator returns the provider validator that used `key` on `chain_id` for the
/// updates produced at `height`
pub fn resolve_validator(
    storage: &dyn Storage,
    chain_id: &str,
    key: &str,
    height: u64,
) -> StdResult<Option<String>> {
    // The last validator that took the key before `height` still holds it, if anyone does
    let candidate = KEY_REVERSE
        .prefix((chain_id, key))
        .range(
            storage,
            None,
            Some(Bound::inclusive(height)),
            Order::Descending,
        )
        .next()
        .transpose()?;
    if let Some((_, owner)) = candidate {
        if resolve(storage, chain_id, &owner, height)? == key {
            return Ok(Some(owner));
        }
    }
    if VALIDATORS.has(storage, key) && resolve(storage, chain_id, key, height)? == key {
        return Ok(Some(key.to_string()));
    }
    Ok(None)
}

/// consumer_key returns the key `validator` holds on `chain_id` at `height`. None when the
/// key it resolves to belongs to another validator, as happens to a validator joining with a
/// provider key someone already took as consumer key
pub fn consumer_key(
    storage: &dyn Storage,
    chain_id: &str,
    validator: &str,
    height: u64,
) -> StdResult<Option<String>> {
    let key = resolve(storage, chain_id, validator, height)?;
    match resolve_validator(storage, chain_id, &key, height)? {
        Some(owner) if owner == validator => Ok(Some(key)),
        _ => Ok(None),
    }
}

/// current_owner returns the validator holding `key` on `chain_id` once all recorded
/// assignments are effective
fn current_owner(storage: &dyn Storage, chain_id: &str, key: &str) -> StdResult<Option<String>> {
    resolve_validator(storage, chain_id, key, u64::MAX)
}

/// purge deletes the whole assignment history of a consumer chain
pub fn purge(storage: &mut dyn Storage, chain_id: &str) -> StdResult<()> {
    let forward = KEY_FORWARD
        .sub_prefix(chain_id)
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;
    for (validator, height) in forward {
        KEY_FORWARD.remove(storage, (chain_id, &validator, height));
    }
    let reverse = KEY_REVERSE
        .sub_prefix(chain_id)
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;
    for (key, height) in reverse {
        KEY_REVERSE.remove(storage, (chain_id, &key, height));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    use cosmwasm_std::testing::{mock_dependencies, MockStorage};
    use cosmwasm_std::{Addr, Binary, Decimal, Timestamp};

    use ccv_apis::ccv_api::{ConsumerParams, ConsumerStatus};

    use crate::state::consumer::ConsumerChain;
    use crate::state::staking::Validator;

    const CHAIN: &str = "consumer";

    fn setup(storage: &mut MockStorage, validators: &[&str]) {
        let chain = ConsumerChain {
            chain_id: CHAIN.to_string(),
            status: ConsumerStatus::Registered,
            initial_height: 1,
            spawn_time: Timestamp::from_seconds(100),
            stop_time: None,
            genesis_hash: Binary::default(),
            binary_hash: Binary::default(),
            params: ConsumerParams {
                distribution_transmission_channel: String::new(),
                consumer_redistribution_fraction: Decimal::percent(75),
                blocks_per_distribution_transmission: 1000,
                historical_entries: 10000,
                ccv_timeout_period: 2419200,
                transfer_timeout_period: 3600,
                unbonding_period: 86400,
            },
            deposit: vec![],
            spawn_height: None,
            channel_id: None,
        };
        CONSUMERS.save(storage, CHAIN, &chain).unwrap();
        for v in validators {
            let validator = Validator {
                operator: Addr::unchecked(*v),
                power: 100,
                jailed_until: None,
                tombstoned: false,
            };
            VALIDATORS.save(storage, v, &validator).unwrap();
        }
    }

    #[test]
    fn default_key_is_provider_key() {
        let mut deps = mock_dependencies();
        setup(&mut deps.storage, &["v1"]);

        assert_eq!(resolve(&deps.storage, CHAIN, "v1", 10).unwrap(), "v1");
        assert!(!assigned_at(&deps.storage, CHAIN, "v1", 10).unwrap());
        assert_eq!(
            resolve_validator(&deps.storage, CHAIN, "v1", 10).unwrap(),
            Some("v1".to_string())
        );
    }

    #[test]
    fn assignment_is_not_retroactive() {
        let mut deps = mock_dependencies();
        setup(&mut deps.storage, &["v1"]);

        // Recorded at height 10, effective from 11
        let effective = assign(&mut deps.storage, CHAIN, "v1", "k1", 10).unwrap();
        assert_eq!(effective, 11);
        assert_eq!(resolve(&deps.storage, CHAIN, "v1", 10).unwrap(), "v1");
        assert_eq!(
            pending_key(&deps.storage, CHAIN, "v1", 10).unwrap(),
            Some("k1".to_string())
        );
        assert_eq!(resolve(&deps.storage, CHAIN, "v1", 11).unwrap(), "k1");
        assert_eq!(pending_key(&deps.storage, CHAIN, "v1", 11).unwrap(), None);

        // A later reassignment keeps the history
        assign(&mut deps.storage, CHAIN, "v1", "k2", 20).unwrap();
        assert_eq!(resolve(&deps.storage, CHAIN, "v1", 10).unwrap(), "v1");
        assert_eq!(resolve(&deps.storage, CHAIN, "v1", 15).unwrap(), "k1");
        assert_eq!(resolve(&deps.storage, CHAIN, "v1", 21).unwrap(), "k2");

        // And so does the reverse direction
        let v1 = Some("v1".to_string());
        assert_eq!(resolve_validator(&deps.storage, CHAIN, "v1", 10).unwrap(), v1);
        assert_eq!(resolve_validator(&deps.storage, CHAIN, "k1", 15).unwrap(), v1);
        assert_eq!(resolve_validator(&deps.storage, CHAIN, "k1", 21).unwrap(), None);
        assert_eq!(resolve_validator(&deps.storage, CHAIN, "k2", 21).unwrap(), v1);
        assert_eq!(resolve_validator(&deps.storage, CHAIN, "v1", 21).unwrap(), None);
    }

    #[test]
    fn key_in_use_is_rejected() {
        let mut deps = mock_dependencies();
        setup(&mut deps.storage, &["v1", "v2"]);

        assign(&mut deps.storage, CHAIN, "v1", "k1", 10).unwrap();
        // Pending assignments count
        let err = assign(&mut deps.storage, CHAIN, "v2", "k1", 10).unwrap_err();
        assert_eq!(
            err,
            ContractError::KeyAlreadyInUse {
                key: "k1".to_string(),
                owner: "v1".to_string()
            }
        );
        // Another validator's provider key is in use while it has no assignment
        let err = assign(&mut deps.storage, CHAIN, "v1", "v2", 12).unwrap_err();
        assert_matches!(err, ContractError::KeyAlreadyInUse { .. });

        // Reassigning the own key is fine
        assign(&mut deps.storage, CHAIN, "v1", "k1", 12).unwrap();

        // Once v1 moves away, k1 is free again
        assign(&mut deps.storage, CHAIN, "v1", "k3", 13).unwrap();
        assign(&mut deps.storage, CHAIN, "v2", "k1", 14).unwrap();
        assert_eq!(
            resolve_validator(&deps.storage, CHAIN, "k1", 12).unwrap(),
            Some("v1".to_string())
        );
        assert_eq!(
            resolve_validator(&deps.storage, CHAIN, "k1", 15).unwrap(),
            Some("v2".to_string())
        );
        // v2's provider key is free now, v1 may take it
        assign(&mut deps.storage, CHAIN, "v1", "v2", 16).unwrap();
        assert_eq!(
            resolve_validator(&deps.storage, CHAIN, "v2", 14).unwrap(),
            Some("v2".to_string())
        );
        assert_eq!(
            resolve_validator(&deps.storage, CHAIN, "v2", 17).unwrap(),
            Some("v1".to_string())
        );
    }

    #[test]
    fn late_joiner_does_not_share_a_taken_key() {
        let mut deps = mock_dependencies();
        setup(&mut deps.storage, &["v1"]);

        assign(&mut deps.storage, CHAIN, "v1", "v2", 10).unwrap();
        setup(&mut deps.storage, &["v2"]);
        assert_eq!(
            consumer_key(&deps.storage, CHAIN, "v1", 11).unwrap(),
            Some("v2".to_string())
        );
        assert_eq!(consumer_key(&deps.storage, CHAIN, "v2", 11).unwrap(), None);
        // Before the assignment was effective, v2 held its own key
        assert_eq!(
            consumer_key(&deps.storage, CHAIN, "v2", 10).unwrap(),
            Some("v2".to_string())
        );
    }

    #[test]
    fn same_block_reassignment_replaces() {
        let mut deps = mock_dependencies();
        setup(&mut deps.storage, &["v1", "v2"]);

        assign(&mut deps.storage, CHAIN, "v1", "k1", 10).unwrap();
        assign(&mut deps.storage, CHAIN, "v1", "k2", 10).unwrap();
        assert_eq!(resolve(&deps.storage, CHAIN, "v1", 11).unwrap(), "k2");
        // k1 was never effective and is free
        assign(&mut deps.storage, CHAIN, "v2", "k1", 10).unwrap();
    }

    #[test]
    fn unknown_consumer_is_rejected() {
        let mut deps = mock_dependencies();
        setup(&mut deps.storage, &["v1"]);

        let err = assign(&mut deps.storage, "other", "v1", "k1", 10).unwrap_err();
        assert_eq!(err, ContractError::ConsumerUnknown("other".to_string()));
    }

    #[test]
    fn purge_removes_history() {
        let mut deps = mock_dependencies();
        setup(&mut deps.storage, &["v1"]);

        assign(&mut deps.storage, CHAIN, "v1", "k1", 10).unwrap();
        purge(&mut deps.storage, CHAIN).unwrap();
        assert_eq!(resolve(&deps.storage, CHAIN, "v1", 20).unwrap(), "v1");
        assert_eq!(resolve_validator(&deps.storage, CHAIN, "k1", 20).unwrap(), None);
    }
}
