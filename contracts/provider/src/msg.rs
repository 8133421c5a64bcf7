use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Timestamp;

use ccv_apis::ccv_api::ConsumerGenesis;
use ccv_apis::proposal_api::Proposal;

use crate::state::config::{Config, Params};
use crate::state::consumer::ConsumerChain;
use crate::state::staking::Validator;

#[cw_serde]
pub struct InstantiateMsg {
    /// Governance authority. Only it can submit proposals
    pub admin: Option<String>,
    pub provider_chain_id: String,
    /// Defaults are used when not set
    pub params: Option<Params>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Change the admin
    UpdateAdmin { admin: Option<String> },
    /// Execute a proposal that passed governance
    SubmitProposal { proposal: Proposal },
    /// Assign the consensus key the sender's validator uses on a consumer chain.
    /// It takes effect for the updates produced from the next block on
    AssignConsumerKey {
        chain_id: String,
        consumer_key: String,
    },
    /// Let the sender's validator back into the active set once its jail period is over
    Unjail {},
}

/// PowerChange is the staking power of a provider validator at the end of a block
#[cw_serde]
pub struct PowerChange {
    pub operator: String,
    pub consensus_key: String,
    pub power: u64,
}

#[cw_serde]
pub enum SudoMsg {
    /// The SDK should call SudoMsg::BeginBlock{} once per block (in BeginBlock).
    /// It spawns and removes consumer chains whose times have come
    BeginBlock {},
    /// The SDK should call SudoMsg::EndBlock{} once per block (in EndBlock), with the
    /// staking power changes of the block.
    /// It releases throttled slash packets and sends the validator set changes
    EndBlock { power_changes: Vec<PowerChange> },
    /// The staking module calls SudoMsg::UnbondingInitiated{} for every unbonding,
    /// redelegation or validator unbonding started in the block, and puts it on hold.
    /// It gets a CcvMsg::CompleteUnbonding once every consumer has matured the validator set
    /// changes of that block
    UnbondingInitiated { op_id: u64 },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Config)]
    Config {},
    #[returns(Params)]
    Params {},
    #[returns(cw_controllers::AdminResponse)]
    Admin {},
    /// Number of slash packets waiting in the global queue
    #[returns(SlashQueueSizeResponse)]
    GlobalSlashQueueSize {},
    /// Number of slash packets waiting from the given consumer
    #[returns(SlashQueueSizeResponse)]
    ChainSlashQueueSize { chain_id: String },
    /// Global slash queue entries, in release order
    #[returns(SlashQueueResponse)]
    SlashQueue {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    /// Key used by a provider validator on a consumer chain, at `height` (or now)
    #[returns(ConsumerKeyResponse)]
    ConsumerKey {
        chain_id: String,
        validator: String,
        height: Option<u64>,
    },
    /// Provider validator behind a consumer key, at `height` (or now)
    #[returns(ValidatorByConsumerKeyResponse)]
    ValidatorByConsumerKey {
        chain_id: String,
        consumer_key: String,
        height: Option<u64>,
    },
    #[returns(ConsumerChain)]
    ConsumerChain { chain_id: String },
    #[returns(ConsumerChainsResponse)]
    ConsumerChains {
        start_after: Option<String>,
        limit: Option<u32>,
    },
    #[returns(ConsumerGenesis)]
    ConsumerGenesis { chain_id: String },
    #[returns(Validator)]
    Validator { consensus_key: String },
    /// Sent validator set changes the consumer has not reported as matured yet
    #[returns(UnmaturedVscsResponse)]
    UnmaturedVscs { chain_id: String },
    /// Consumers an unbonding operation on hold still waits for
    #[returns(UnbondingOpResponse)]
    UnbondingOp { op_id: u64 },
}

#[cw_serde]
pub struct SlashQueueSizeResponse {
    pub size: u64,
}

#[cw_serde]
pub struct SlashQueueEntry {
    pub seq: u64,
    pub chain_id: String,
    pub validator: String,
    pub vsc_id: u64,
    pub recv_time: Timestamp,
}

#[cw_serde]
pub struct SlashQueueResponse {
    pub entries: Vec<SlashQueueEntry>,
}

#[cw_serde]
pub struct ConsumerKeyResponse {
    pub consumer_key: String,
    /// Whether the key comes from an assignment rather than the provider key default
    pub assigned: bool,
    /// Key recorded but not effective yet
    pub pending_key: Option<String>,
}

#[cw_serde]
pub struct ValidatorByConsumerKeyResponse {
    pub validator: Option<String>,
}

#[cw_serde]
pub struct ConsumerChainsResponse {
    pub chains: Vec<ConsumerChain>,
}

#[cw_serde]
pub struct UnmaturedVsc {
    pub vsc_id: u64,
    pub sent_time: Timestamp,
}

#[cw_serde]
pub struct UnmaturedVscsResponse {
    pub vscs: Vec<UnmaturedVsc>,
}

#[cw_serde]
pub struct UnbondingOpResponse {
    pub op_id: u64,
    pub waiting_consumers: u32,
}
