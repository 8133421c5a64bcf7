use thiserror::Error;

use cosmwasm_std::StdError;

#[derive(Error, Debug, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    Std(#[from] StdError),
    #[error("Empty chain id")]
    EmptyChainId,
    #[error("Invalid chain id: {0}")]
    InvalidChainId(String),
    #[error("Initial height must be positive")]
    ZeroInitialHeight,
    #[error("{0} must be positive")]
    ZeroPeriod(String),
    #[error("{name} is too long; got: {seconds}s, max: {max}s")]
    PeriodTooLong { name: String, seconds: u64, max: u64 },
    #[error("Consumer redistribution fraction must be between 0 and 1: {0}")]
    InvalidRedistributionFraction(String),
    #[error("Slash fraction must be between 0 and 1: {0}")]
    InvalidSlashFraction(String),
    #[error("Empty consensus key")]
    EmptyKey,
    #[error("Empty proposal: {0}")]
    EmptyProposal(String),
}

impl ApiError {
    pub fn zero_period(name: impl Into<String>) -> Self {
        ApiError::ZeroPeriod(name.into())
    }
}
