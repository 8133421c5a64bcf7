//! msg is the module that includes the custom messages that the CCV contracts send to the
//! host chain. The messages include:
//! - JailValidator / UnjailValidator: provider staking side effects of slash packets
//! - TombstoneValidator / SlashValidator: provider punishment of equivocations
//! - CompleteUnbonding: provider unbonding operations released by every consumer
//! - UpdateValidatorSet: consumer consensus validator set changes

use ccv_apis::ccv_api::{Infraction, ValidatorUpdate};
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{CosmosMsg, Decimal, Empty, Timestamp};

/// CcvMsg is the message that the CCV contracts can send to the host chain.
/// Validators are identified by their provider consensus key
#[cw_serde]
pub enum CcvMsg {
    /// JailValidator removes the validator from the active set until `until`
    JailValidator { validator: String, until: Timestamp },
    /// UnjailValidator lets a jailed validator back into the active set
    UnjailValidator { validator: String },
    /// TombstoneValidator permanently removes the validator from the active set
    TombstoneValidator { validator: String },
    /// SlashValidator burns `fraction` of the stake bonded to the validator at
    /// `infraction_height`
    SlashValidator {
        validator: String,
        infraction: Infraction,
        infraction_height: u64,
        power: u64,
        fraction: Decimal,
    },
    /// CompleteUnbonding lets the staking module complete an unbonding operation it was
    /// holding, once every consumer has matured the matching validator set change
    CompleteUnbonding { op_id: u64 },
    /// UpdateValidatorSet applies consensus power changes on a consumer chain.
    /// Zero power removes the key
    UpdateValidatorSet { updates: Vec<ValidatorUpdate> },
}

pub type CcvSudoMsg = Empty;
pub type CcvQuery = Empty;

// make CcvMsg to implement CosmosMsg::CustomMsg
impl cosmwasm_std::CustomMsg for CcvMsg {}

impl From<CcvMsg> for CosmosMsg<CcvMsg> {
    fn from(original: CcvMsg) -> Self {
        CosmosMsg::Custom(original)
    }
}
