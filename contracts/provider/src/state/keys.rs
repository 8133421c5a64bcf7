use cw_storage_plus::Map;

/// Consumer key assignments: (chain id, provider validator, effective height) -> consumer key.
/// An assignment recorded at height H is stored with effective height H + 1
pub const KEY_FORWARD: Map<(&str, &str, u64), String> = Map::new("consumer_keys");
/// Reverse index: (chain id, consumer key, effective height) -> provider validator
pub const KEY_REVERSE: Map<(&str, &str, u64), String> = Map::new("consumer_key_owners");
