use cw_storage_plus::{Item, Map};

/// Unbonding operations started in the current block, waiting for its validator set changes
pub const PENDING_UNBONDING_OPS: Item<Vec<u64>> = Item::new("pending_unbonding_ops");
/// Unbonding operations held by each (chain id, vsc id) until the consumer reports it matured
pub const VSC_UNBONDING_OPS: Map<(&str, u64), Vec<u64>> = Map::new("vsc_unbonding_ops");
/// Number of consumers an unbonding operation still waits for
pub const UNBONDING_OP_REFS: Map<u64, u32> = Map::new("unbonding_op_refs");
/// Unbonding operations released, to be completed at the end of the block
pub const MATURED_UNBONDING_OPS: Item<Vec<u64>> = Item::new("matured_unbonding_ops");
