use cosmwasm_std::{Addr, DepsMut, Env, Event, MessageInfo, Response, Storage, Timestamp};

use ccv_apis::ApiError;
use ccv_bindings::CcvMsg;

use crate::error::ContractError;
use crate::msg::PowerChange;
use crate::state::staking::{Validator, OPERATORS, VALIDATORS};

/// record_power_changes stores the staking power reported at the end of a block.
/// A validator seen for the first time is bound to its operator
pub fn record_power_changes(deps: &mut DepsMut, changes: &[PowerChange]) -> Result<(), ContractError> {
    for change in changes {
        if change.consensus_key.is_empty() {
            return Err(ApiError::EmptyKey.into());
        }
        let operator = deps.api.addr_validate(&change.operator)?;
        let validator = match VALIDATORS.may_load(deps.storage, &change.consensus_key)? {
            Some(mut validator) => {
                if validator.operator != operator {
                    return Err(ContractError::OperatorMismatch {
                        validator: change.consensus_key.clone(),
                        operator: validator.operator.to_string(),
                    });
                }
                validator.power = change.power;
                validator
            }
            None => {
                if let Some(existing) = OPERATORS.may_load(deps.storage, &operator)? {
                    return Err(ContractError::OperatorMismatch {
                        validator: existing,
                        operator: operator.to_string(),
                    });
                }
                OPERATORS.save(deps.storage, &operator, &change.consensus_key)?;
                Validator {
                    operator,
                    power: change.power,
                    jailed_until: None,
                    tombstoned: false,
                }
            }
        };
        VALIDATORS.save(deps.storage, &change.consensus_key, &validator)?;
    }
    Ok(())
}

/// validator_by_operator returns the provider consensus key and record of the validator run
/// by `operator`
pub fn validator_by_operator(
    storage: &dyn Storage,
    operator: &Addr,
) -> Result<(String, Validator), ContractError> {
    let key = OPERATORS
        .may_load(storage, operator)?
        .ok_or_else(|| ContractError::NotValidator(operator.to_string()))?;
    let validator = VALIDATORS.load(storage, &key)?;
    Ok((key, validator))
}

/// jail removes the validator's power from all consumers until it is unjailed.
/// Returns `None` if the validator is already jailed
pub fn jail(
    storage: &mut dyn Storage,
    key: &str,
    until: Timestamp,
) -> Result<Option<CcvMsg>, ContractError> {
    let mut validator = VALIDATORS
        .may_load(storage, key)?
        .ok_or_else(|| ContractError::UnknownValidator(key.to_string()))?;
    if validator.jailed_until.is_some() {
        return Ok(None);
    }
    validator.jailed_until = Some(until);
    VALIDATORS.save(storage, key, &validator)?;
    Ok(Some(CcvMsg::JailValidator {
        validator: key.to_string(),
        until,
    }))
}

pub fn handle_unjail(
    deps: DepsMut,
    env: &Env,
    info: &MessageInfo,
) -> Result<Response<CcvMsg>, ContractError> {
    let (key, mut validator) = validator_by_operator(deps.storage, &info.sender)?;
    if validator.tombstoned {
        return Err(ContractError::Tombstoned(key));
    }
    let until = validator
        .jailed_until
        .ok_or_else(|| ContractError::NotJailed(key.clone()))?;
    if env.block.time < until {
        return Err(ContractError::JailPeriodNotOver {
            validator: key,
            until,
        });
    }
    validator.jailed_until = None;
    VALIDATORS.save(deps.storage, &key, &validator)?;

    Ok(Response::new()
        .add_message(CcvMsg::UnjailValidator {
            validator: key.clone(),
        })
        .add_attribute("action", "unjail")
        .add_event(Event::new("validator_unjailed").add_attribute("validator", key)))
}
