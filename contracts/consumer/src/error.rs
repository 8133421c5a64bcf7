use cw_utils::PaymentError;
use thiserror::Error;

use cosmwasm_std::StdError;

use ccv_apis::ApiError;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    StdError(#[from] StdError),
    #[error("{0}")]
    Payment(#[from] PaymentError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("Out of order validator set change: expected {expected}, received {received}")]
    OutOfOrderPacket { expected: u64, received: u64 },
    #[error("Packet received on unknown channel {0}")]
    UnknownChannel(String),
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
    #[error("The CCV channel is already open")]
    IbcChannelAlreadyOpen {},
}
