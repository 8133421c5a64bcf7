//! state is the module that manages the provider's owned store: consumer chains, the key
//! assignment registry, the slash queues, the held unbonding operations and the validator set
//! reported by staking
pub mod config;
pub mod consumer;
pub mod keys;
pub mod staking;
pub mod throttle;
pub mod unbonding;
