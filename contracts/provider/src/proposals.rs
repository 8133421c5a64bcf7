use cosmwasm_std::{DepsMut, Event, MessageInfo, Response};

use ccv_apis::ccv_api::Infraction;
use ccv_apis::proposal_api::{EquivocationProposal, ParamChangeProposal, Proposal};
use ccv_apis::Validate;
use ccv_bindings::CcvMsg;

use crate::error::ContractError;
use crate::lifecycle;
use crate::state::config::{ADMIN, PARAMS};
use crate::state::staking::VALIDATORS;

/// handle_proposal executes a proposal that passed governance.
/// Only the admin, acting as the governance authority, may submit them
pub fn handle_proposal(
    deps: DepsMut,
    info: &MessageInfo,
    proposal: Proposal,
) -> Result<Response<CcvMsg>, ContractError> {
    ADMIN.assert_admin(deps.as_ref(), &info.sender)?;
    proposal.validate()?;

    let res = Response::new()
        .add_attribute("action", "submit_proposal")
        .add_attribute("kind", proposal.kind());
    match proposal {
        Proposal::ConsumerAddition(addition) => {
            let event = lifecycle::add_consumer(deps.storage, &addition)?;
            Ok(res.add_event(event))
        }
        Proposal::ConsumerRemoval(removal) => {
            let event = lifecycle::schedule_removal(deps.storage, &removal)?;
            Ok(res.add_event(event))
        }
        Proposal::Equivocation(equivocation) => handle_equivocation(deps, res, &equivocation),
        Proposal::ParamChange(changes) => handle_param_change(deps, res, &changes),
    }
}

/// handle_equivocation tombstones and slashes double signers, bypassing the slash throttle
fn handle_equivocation(
    deps: DepsMut,
    mut res: Response<CcvMsg>,
    proposal: &EquivocationProposal,
) -> Result<Response<CcvMsg>, ContractError> {
    let fraction = PARAMS.load(deps.storage)?.double_sign_slash_fraction;
    for evidence in &proposal.equivocations {
        let key = evidence.consensus_key.as_str();
        let mut validator = VALIDATORS
            .may_load(deps.storage, key)?
            .ok_or_else(|| ContractError::UnknownValidator(key.to_string()))?;
        if validator.tombstoned {
            return Err(ContractError::Tombstoned(key.to_string()));
        }
        validator.tombstoned = true;
        VALIDATORS.save(deps.storage, key, &validator)?;

        res = res
            .add_message(CcvMsg::TombstoneValidator {
                validator: key.to_string(),
            })
            .add_message(CcvMsg::SlashValidator {
                validator: key.to_string(),
                infraction: Infraction::DoubleSign,
                infraction_height: evidence.height,
                power: evidence.power,
                fraction,
            })
            .add_event(
                Event::new("validator_tombstoned")
                    .add_attribute("validator", key)
                    .add_attribute("infraction_height", evidence.height.to_string())
                    .add_attribute("fraction", fraction.to_string()),
            );
    }
    Ok(res)
}

fn handle_param_change(
    deps: DepsMut,
    res: Response<CcvMsg>,
    proposal: &ParamChangeProposal,
) -> Result<Response<CcvMsg>, ContractError> {
    let mut params = PARAMS.load(deps.storage)?;
    for change in &proposal.changes {
        params.apply(change);
    }
    params.validate()?;
    PARAMS.save(deps.storage, &params)?;
    Ok(res.add_event(
        Event::new("params_changed").add_attribute("changes", proposal.changes.len().to_string()),
    ))
}
