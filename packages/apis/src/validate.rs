use cosmwasm_std::Decimal;

use crate::ccv_api::{ConsumerGenesis, ValidatorUpdate};
use crate::error::ApiError;
use crate::proposal_api::{
    ConsumerAdditionProposal, ConsumerRemovalProposal, Equivocation, EquivocationProposal,
    ParamChange, ParamChangeProposal, Proposal,
};
use crate::{validate_chain_id, validate_period};

/// A trait for validating the API structs / input.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

impl Validate for Proposal {
    fn validate(&self) -> Result<(), ApiError> {
        match self {
            Proposal::ConsumerAddition(p) => p.validate(),
            Proposal::ConsumerRemoval(p) => p.validate(),
            Proposal::Equivocation(p) => p.validate(),
            Proposal::ParamChange(p) => p.validate(),
        }
    }
}

impl Validate for ConsumerAdditionProposal {
    fn validate(&self) -> Result<(), ApiError> {
        validate_chain_id(&self.chain_id)?;

        if self.initial_height == 0 {
            return Err(ApiError::ZeroInitialHeight);
        }
        if self.consumer_redistribution_fraction > Decimal::one() {
            return Err(ApiError::InvalidRedistributionFraction(
                self.consumer_redistribution_fraction.to_string(),
            ));
        }
        if self.blocks_per_distribution_transmission == 0 {
            return Err(ApiError::zero_period("blocks_per_distribution_transmission"));
        }
        validate_period("ccv_timeout_period", self.ccv_timeout_period)?;
        validate_period("transfer_timeout_period", self.transfer_timeout_period)?;
        validate_period("unbonding_period", self.unbonding_period)
    }
}

impl Validate for ConsumerRemovalProposal {
    fn validate(&self) -> Result<(), ApiError> {
        validate_chain_id(&self.chain_id)
    }
}

impl Validate for EquivocationProposal {
    fn validate(&self) -> Result<(), ApiError> {
        if self.equivocations.is_empty() {
            return Err(ApiError::EmptyProposal("no equivocations".to_string()));
        }
        self.equivocations
            .iter()
            .try_for_each(Equivocation::validate)
    }
}

impl Validate for Equivocation {
    fn validate(&self) -> Result<(), ApiError> {
        if self.consensus_key.is_empty() {
            return Err(ApiError::EmptyKey);
        }
        Ok(())
    }
}

impl Validate for ParamChangeProposal {
    fn validate(&self) -> Result<(), ApiError> {
        if self.changes.is_empty() {
            return Err(ApiError::EmptyProposal("no param changes".to_string()));
        }
        self.changes.iter().try_for_each(ParamChange::validate)
    }
}

impl Validate for ParamChange {
    fn validate(&self) -> Result<(), ApiError> {
        match self {
            ParamChange::SlashThrottleWindow { seconds } => {
                validate_period("slash_throttle_window", *seconds)
            }
            ParamChange::DrainTimeout { seconds } => validate_period("drain_timeout", *seconds),
            ParamChange::JailDuration { seconds } => validate_period("jail_duration", *seconds),
            ParamChange::VscHeartbeatPeriod { seconds } => {
                validate_period("vsc_heartbeat_period", *seconds)
            }
            ParamChange::DoubleSignSlashFraction { fraction } if *fraction > Decimal::one() => {
                Err(ApiError::InvalidSlashFraction(fraction.to_string()))
            }
            ParamChange::DoubleSignSlashFraction { .. } => Ok(()),
        }
    }
}

impl Validate for ConsumerGenesis {
    fn validate(&self) -> Result<(), ApiError> {
        validate_chain_id(&self.chain_id)?;
        validate_chain_id(&self.provider_chain_id)?;
        validate_period("ccv_timeout_period", self.params.ccv_timeout_period)?;
        validate_period("unbonding_period", self.params.unbonding_period)?;
        self.initial_val_set
            .iter()
            .try_for_each(ValidatorUpdate::validate)
    }
}

impl Validate for ValidatorUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        if self.pub_key.is_empty() {
            return Err(ApiError::EmptyKey);
        }
        Ok(())
    }
}
