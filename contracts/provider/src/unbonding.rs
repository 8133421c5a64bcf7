//! Unbonding operations started on the provider are held until every consumer that was sent
//! the validator set change of their block has reported it as matured.
use cosmwasm_std::{Event, Order, StdResult, Storage};

use ccv_bindings::CcvMsg;

use crate::error::ContractError;
use crate::state::unbonding::{
    MATURED_UNBONDING_OPS, PENDING_UNBONDING_OPS, UNBONDING_OP_REFS, VSC_UNBONDING_OPS,
};

/// hold records an unbonding operation started in the current block.
/// It is attached to the validator set changes sent at the end of the block
pub fn hold(storage: &mut dyn Storage, op_id: u64) -> Result<Event, ContractError> {
    let mut pending = PENDING_UNBONDING_OPS.may_load(storage)?.unwrap_or_default();
    if pending.contains(&op_id) || UNBONDING_OP_REFS.has(storage, op_id) {
        return Err(ContractError::DuplicateUnbondingOp(op_id));
    }
    pending.push(op_id);
    PENDING_UNBONDING_OPS.save(storage, &pending)?;

    Ok(Event::new("unbonding_held").add_attribute("op_id", op_id.to_string()))
}

/// take_pending returns the unbonding operations started in this block
pub fn take_pending(storage: &mut dyn Storage) -> StdResult<Vec<u64>> {
    let pending = PENDING_UNBONDING_OPS.may_load(storage)?.unwrap_or_default();
    PENDING_UNBONDING_OPS.remove(storage);
    Ok(pending)
}

/// attach makes `ops` wait for validator set change `vsc_id` of `chain_id` to mature
pub fn attach(
    storage: &mut dyn Storage,
    chain_id: &str,
    vsc_id: u64,
    ops: &[u64],
) -> StdResult<()> {
    if ops.is_empty() {
        return Ok(());
    }
    VSC_UNBONDING_OPS.save(storage, (chain_id, vsc_id), &ops.to_vec())?;
    for op_id in ops {
        UNBONDING_OP_REFS.update(storage, *op_id, |refs| -> StdResult<_> {
            Ok(refs.unwrap_or_default() + 1)
        })?;
    }
    Ok(())
}

/// release_unreferenced releases the operations of `ops` no consumer waits for
pub fn release_unreferenced(storage: &mut dyn Storage, ops: &[u64]) -> StdResult<()> {
    let free: Vec<u64> = ops
        .iter()
        .copied()
        .filter(|op_id| !UNBONDING_OP_REFS.has(storage, *op_id))
        .collect();
    push_matured(storage, &free)
}

/// on_matured drops the hold of `chain_id` on the operations attached to `vsc_id`.
/// Returns the number of operations released
pub fn on_matured(storage: &mut dyn Storage, chain_id: &str, vsc_id: u64) -> StdResult<usize> {
    let Some(ops) = VSC_UNBONDING_OPS.may_load(storage, (chain_id, vsc_id))? else {
        return Ok(0);
    };
    VSC_UNBONDING_OPS.remove(storage, (chain_id, vsc_id));

    let mut released = vec![];
    for op_id in ops {
        match UNBONDING_OP_REFS.may_load(storage, op_id)? {
            Some(refs) if refs > 1 => UNBONDING_OP_REFS.save(storage, op_id, &(refs - 1))?,
            Some(_) => {
                UNBONDING_OP_REFS.remove(storage, op_id);
                released.push(op_id);
            }
            None => {}
        }
    }
    push_matured(storage, &released)?;
    Ok(released.len())
}

/// purge_chain drops every hold of a removed consumer
pub fn purge_chain(storage: &mut dyn Storage, chain_id: &str) -> StdResult<usize> {
    let held = VSC_UNBONDING_OPS
        .prefix(chain_id)
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;
    let mut released = 0;
    for vsc_id in held {
        released += on_matured(storage, chain_id, vsc_id)?;
    }
    Ok(released)
}

/// complete_matured returns the completion messages of the released operations
pub fn complete_matured(storage: &mut dyn Storage) -> StdResult<Vec<CcvMsg>> {
    let matured = MATURED_UNBONDING_OPS.may_load(storage)?.unwrap_or_default();
    MATURED_UNBONDING_OPS.remove(storage);
    Ok(matured
        .into_iter()
        .map(|op_id| CcvMsg::CompleteUnbonding { op_id })
        .collect())
}

/// waiting_consumers is the number of consumers `op_id` still waits for
pub fn waiting_consumers(storage: &dyn Storage, op_id: u64) -> StdResult<u32> {
    Ok(UNBONDING_OP_REFS.may_load(storage, op_id)?.unwrap_or_default())
}

fn push_matured(storage: &mut dyn Storage, ops: &[u64]) -> StdResult<()> {
    if ops.is_empty() {
        return Ok(());
    }
    let mut matured = MATURED_UNBONDING_OPS.may_load(storage)?.unwrap_or_default();
    matured.extend_from_slice(ops);
    MATURED_UNBONDING_OPS.save(storage, &matured)
}
