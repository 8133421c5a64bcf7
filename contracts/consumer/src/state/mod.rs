//! state is the module that manages the consumer's owned store: the applied validator set,
//! maturity tracking and the outbound packet queue
pub mod config;
pub mod outbox;
pub mod valset;
