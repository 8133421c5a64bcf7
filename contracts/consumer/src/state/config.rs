use cosmwasm_schema::cw_serde;
use cw_storage_plus::Item;

use ccv_apis::ccv_api::ConsumerParams;

pub(crate) const CONFIG: Item<Config> = Item::new("config");

/// Config is taken from the genesis produced by the provider
#[cw_serde]
pub struct Config {
    pub chain_id: String,
    pub provider_chain_id: String,
    /// `spawn_height` is the provider height of the genesis validator set
    pub spawn_height: u64,
    pub params: ConsumerParams,
}
