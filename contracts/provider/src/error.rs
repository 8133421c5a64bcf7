use cosmwasm_std::{StdError, Timestamp};
use cw_controllers::AdminError;
use cw_utils::PaymentError;
use thiserror::Error;

use ccv_apis::ccv_api::ConsumerStatus;
use ccv_apis::ApiError;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    StdError(#[from] StdError),
    #[error("{0}")]
    Payment(#[from] PaymentError),
    #[error("{0}")]
    Admin(#[from] AdminError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("Consumer chain already exists: {0}")]
    ConsumerAlreadyExists(String),
    #[error("Consumer chain is not registered: {0}")]
    ConsumerUnknown(String),
    #[error("Packet does not come from an active consumer chain: {0}")]
    UnknownConsumer(String),
    #[error("Consumer chain {chain_id} is {status}, expected spawned")]
    ConsumerNotSpawned {
        chain_id: String,
        status: ConsumerStatus,
    },
    #[error("Channel {0} is already bound to a consumer chain")]
    ChannelAlreadyBound(String),
    #[error("Consumer key {key} is already in use by validator {owner}")]
    KeyAlreadyInUse { key: String, owner: String },
    #[error("Sender is not a validator operator: {0}")]
    NotValidator(String),
    #[error("Unknown validator: {0}")]
    UnknownValidator(String),
    #[error("Validator {validator} is operated by {operator}")]
    OperatorMismatch { validator: String, operator: String },
    #[error("Validator is not jailed: {0}")]
    NotJailed(String),
    #[error("Validator {validator} is jailed until {until}")]
    JailPeriodNotOver { validator: String, until: Timestamp },
    #[error("Validator is tombstoned: {0}")]
    Tombstoned(String),
    #[error("Slash packet for chain {received} received on the channel of {expected}")]
    ChainIdMismatch { expected: String, received: String },
    #[error("Unbonding operation {0} is already held")]
    DuplicateUnbondingOp(u64),
    #[error("Invalid infraction type: {0}")]
    InvalidInfraction(i32),
    #[error("Failed to decode CcvPacketData: {0}")]
    PacketDecode(String),
    #[error("Empty IBC packet")]
    EmptyPacket,
    #[error("{0} packet should not be received")]
    UnexpectedPacket(String),
    #[error("The given ordering is not allowed: only ordered channels are supported")]
    IbcUnorderedChannel {},
    #[error("Counterparty version must be `{version}`")]
    IbcInvalidCounterPartyVersion { version: String },
}
