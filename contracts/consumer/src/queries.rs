use cosmwasm_std::{Deps, Order, StdResult};
use cw_storage_plus::Bound;

use ccv_apis::ccv_api::ValidatorUpdate;

use crate::msg::{
    HaltedResponse, LastVscIdResponse, Maturity, OutstandingDowntimeResponse, PendingMaturitiesResponse,
    PendingPacket, PendingPacketsResponse, ValidatorSetResponse,
};
use crate::state::config::{Config, CONFIG};
use crate::state::outbox::OUTBOX;
use crate::state::valset::{HALTED, LAST_VSC_ID, MATURITIES, OUTSTANDING_DOWNTIME, VALIDATORS};

// Settings for pagination
const MAX_LIMIT: u32 = 30;
const DEFAULT_LIMIT: u32 = 10;

pub fn config(deps: Deps) -> StdResult<Config> {
    CONFIG.load(deps.storage)
}

pub fn validator_set(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<ValidatorSetResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.as_ref().map(|s| Bound::exclusive(s.as_str()));
    let validators = VALIDATORS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(key, power)| ValidatorUpdate::new(key, power)))
        .collect::<StdResult<_>>()?;
    Ok(ValidatorSetResponse { validators })
}

pub fn last_vsc_id(deps: Deps) -> StdResult<LastVscIdResponse> {
    Ok(LastVscIdResponse {
        vsc_id: LAST_VSC_ID.load(deps.storage)?,
    })
}

pub fn halted(deps: Deps) -> StdResult<HaltedResponse> {
    Ok(HaltedResponse {
        halt: HALTED.may_load(deps.storage)?,
    })
}

pub fn pending_maturities(deps: Deps) -> StdResult<PendingMaturitiesResponse> {
    let maturities = MATURITIES
        .range(deps.storage, None, None, Order::Ascending)
        .map(|item| {
            item.map(|(vsc_id, maturity_time)| Maturity {
                vsc_id,
                maturity_time,
            })
        })
        .collect::<StdResult<_>>()?;
    Ok(PendingMaturitiesResponse { maturities })
}

pub fn pending_packets(deps: Deps) -> StdResult<PendingPacketsResponse> {
    let packets = OUTBOX
        .range(deps.storage, None, None, Order::Ascending)
        .map(|item| item.map(|(seq, packet)| PendingPacket { seq, packet }))
        .collect::<StdResult<_>>()?;
    Ok(PendingPacketsResponse { packets })
}

pub fn outstanding_downtime(deps: Deps, validator: &str) -> OutstandingDowntimeResponse {
    OutstandingDowntimeResponse {
        outstanding: OUTSTANDING_DOWNTIME.has(deps.storage, validator),
    }
}
