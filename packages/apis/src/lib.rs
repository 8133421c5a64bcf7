pub mod ccv_api;
pub mod error;
pub mod proposal_api;
mod validate;

pub use error::ApiError;
pub use validate::Validate;

/// Maximum length of a chain id, as enforced by CometBFT.
pub const MAX_CHAIN_ID_LENGTH: usize = 50;

/// Upper bound of any period parameter, in seconds (ten years).
/// Keeps every `block time + period` within the range of a timestamp
pub const MAX_PERIOD: u64 = 10 * 365 * 86_400;

/// validate_period checks that a period parameter is positive and at most [`MAX_PERIOD`]
pub fn validate_period(name: &str, seconds: u64) -> Result<(), ApiError> {
    if seconds == 0 {
        return Err(ApiError::zero_period(name));
    }
    if seconds > MAX_PERIOD {
        return Err(ApiError::PeriodTooLong {
            name: name.to_string(),
            seconds,
            max: MAX_PERIOD,
        });
    }
    Ok(())
}

/// validate_chain_id checks that the chain id is non-blank, has no whitespace and fits
/// into [`MAX_CHAIN_ID_LENGTH`]
pub fn validate_chain_id(chain_id: &str) -> Result<(), ApiError> {
    if chain_id.trim().is_empty() {
        return Err(ApiError::EmptyChainId);
    }
    if chain_id.len() > MAX_CHAIN_ID_LENGTH {
        return Err(ApiError::InvalidChainId(format!(
            "chain id too long; got: {}, max: {MAX_CHAIN_ID_LENGTH}",
            chain_id.len()
        )));
    }
    if chain_id.chars().any(char::is_whitespace) {
        return Err(ApiError::InvalidChainId(format!(
            "chain id contains whitespace: {chain_id:?}"
        )));
    }
    Ok(())
}
