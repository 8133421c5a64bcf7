use cosmwasm_schema::cw_serde;
use cosmwasm_std::Timestamp;
use cw_storage_plus::{Item, Map};

/// GlobalSlashEntry references a slash record in the reporting chain's queue
#[cw_serde]
pub struct GlobalSlashEntry {
    pub chain_id: String,
    pub recv_time: Timestamp,
}

/// SlashRecord is a downtime report received from a consumer
#[cw_serde]
pub struct SlashRecord {
    /// `validator` is the consumer consensus key of the offender
    pub validator: String,
    pub power: u64,
    pub vsc_id: u64,
    pub infraction_height: u64,
    pub infraction_time: Timestamp,
    pub recv_time: Timestamp,
}

/// Global slash queue, ordered by arrival sequence
pub const GLOBAL_SLASH_QUEUE: Map<u64, GlobalSlashEntry> = Map::new("global_slash_queue");
/// Per consumer slash queues, keyed by the same arrival sequence as the global queue
pub const CHAIN_SLASH_QUEUE: Map<(&str, u64), SlashRecord> = Map::new("chain_slash_queue");
pub const NEXT_SLASH_SEQ: Item<u64> = Item::new("next_slash_seq");
/// Time of the last release. Starts at instantiation
pub const LAST_SLASH_RELEASE: Item<Timestamp> = Item::new("last_slash_release");
