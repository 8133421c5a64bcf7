use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Empty, Timestamp};
use cw_storage_plus::{Item, Map};

/// Halt is recorded when a validator set change arrives out of order.
/// It is cleared by the next in-sequence packet
#[cw_serde]
pub struct Halt {
    pub expected: u64,
    pub received: u64,
}

/// Active validator set, consensus key to power
pub const VALIDATORS: Map<&str, u64> = Map::new("validators");
/// Changes applied since the last end block, to be handed over to consensus
pub const PENDING_CHANGES: Map<&str, u64> = Map::new("pending_changes");
/// Id of the last applied validator set change. 0 is the genesis set
pub const LAST_VSC_ID: Item<u64> = Item::new("last_vsc_id");
pub const HALTED: Item<Halt> = Item::new("halted");
/// Maturity time of the applied validator set changes, by id
pub const MATURITIES: Map<u64, Timestamp> = Map::new("maturities");
/// Last applied validator set change id at the start of each block
pub const HEIGHT_TO_VSC_ID: Map<u64, u64> = Map::new("height_to_vsc_id");
/// Validators with a downtime report not yet acknowledged by the provider
pub const OUTSTANDING_DOWNTIME: Map<&str, Empty> = Map::new("outstanding_downtime");
