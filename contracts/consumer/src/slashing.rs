use cosmwasm_std::{Api, Empty, Event, Storage, Timestamp};

use ccv_apis::ccv_api::Infraction;
use ccv_apis::ApiError;

use crate::applier;
use crate::error::ContractError;
use crate::outbox;
use crate::state::outbox::OutboundPacket;
use crate::state::valset::OUTSTANDING_DOWNTIME;

/// Slash is an infraction reported by the host chain, for a consumer key
pub struct Slash {
    pub validator: String,
    pub power: u64,
    pub infraction_height: u64,
    pub infraction_time: Timestamp,
    pub infraction: Infraction,
}

/// report_slash queues a slash packet for the provider.
/// Only one downtime report per validator may be outstanding, until the provider
/// acknowledges it
pub fn report_slash(
    storage: &mut dyn Storage,
    api: &dyn Api,
    slash: Slash,
) -> Result<Event, ContractError> {
    if slash.validator.is_empty() {
        return Err(ApiError::EmptyKey.into());
    }
    let downtime = slash.infraction == Infraction::Downtime;
    if downtime && OUTSTANDING_DOWNTIME.has(storage, &slash.validator) {
        api.debug(&format!(
            "downtime of {} already reported, skipping",
            slash.validator
        ));
        return Ok(Event::new("slash_skipped")
            .add_attribute("validator", slash.validator)
            .add_attribute("infraction", slash.infraction.to_string())
            .add_attribute("reason", "outstanding_downtime"));
    }

    let vsc_id = applier::vsc_id_at(storage, slash.infraction_height)?;
    if downtime {
        OUTSTANDING_DOWNTIME.save(storage, &slash.validator, &Empty {})?;
    }
    let seq = outbox::enqueue(
        storage,
        &OutboundPacket::Slash {
            validator: slash.validator.clone(),
            power: slash.power,
            vsc_id,
            infraction: slash.infraction,
            infraction_height: slash.infraction_height,
            infraction_time: slash.infraction_time,
        },
    )?;

    Ok(Event::new("slash_queued")
        .add_attribute("seq", seq.to_string())
        .add_attribute("validator", slash.validator)
        .add_attribute("infraction", slash.infraction.to_string())
        .add_attribute("vsc_id", vsc_id.to_string()))
}
