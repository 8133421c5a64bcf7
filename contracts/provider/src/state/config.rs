use cosmwasm_schema::cw_serde;
use cosmwasm_std::Decimal;

use cw_controllers::Admin;
use cw_storage_plus::Item;
use derivative::Derivative;

use ccv_apis::proposal_api::ParamChange;
use ccv_apis::{ApiError, Validate};

pub(crate) const CONFIG: Item<Config> = Item::new("config");
pub(crate) const PARAMS: Item<Params> = Item::new("params");
/// Storage for admin. The admin is the governance authority allowed to submit proposals
pub(crate) const ADMIN: Admin = Admin::new("admin");

#[cw_serde]
pub struct Config {
    pub provider_chain_id: String,
}

/// Params are the governance-controlled provider parameters.
/// All periods are in seconds
#[cw_serde]
#[derive(Derivative)]
#[derivative(Default)]
pub struct Params {
    /// `slash_throttle_window` is the minimum time between two slash packet releases
    #[derivative(Default(value = "3600"))]
    pub slash_throttle_window: u64,
    /// `drain_timeout` bounds how long a stopping consumer may wait, past its stop time,
    /// for its sent validator set changes to mature
    #[derivative(Default(value = "1209600"))]
    pub drain_timeout: u64,
    /// `jail_duration` is how long a validator is jailed for downtime
    #[derivative(Default(value = "600"))]
    pub jail_duration: u64,
    /// `vsc_heartbeat_period` is the idle time after which an empty update is sent to an
    /// active consumer
    #[derivative(Default(value = "86400"))]
    pub vsc_heartbeat_period: u64,
    /// `double_sign_slash_fraction` is the fraction slashed for an equivocation
    #[derivative(Default(value = "Decimal::percent(5)"))]
    pub double_sign_slash_fraction: Decimal,
}

impl Params {
    pub fn validate(&self) -> Result<(), ApiError> {
        self.changes().iter().try_for_each(ParamChange::validate)
    }

    /// apply updates a single parameter
    pub fn apply(&mut self, change: &ParamChange) {
        match change {
            ParamChange::SlashThrottleWindow { seconds } => self.slash_throttle_window = *seconds,
            ParamChange::DrainTimeout { seconds } => self.drain_timeout = *seconds,
            ParamChange::JailDuration { seconds } => self.jail_duration = *seconds,
            ParamChange::VscHeartbeatPeriod { seconds } => self.vsc_heartbeat_period = *seconds,
            ParamChange::DoubleSignSlashFraction { fraction } => {
                self.double_sign_slash_fraction = *fraction
            }
        }
    }

    fn changes(&self) -> [ParamChange; 5] {
        [
            ParamChange::SlashThrottleWindow {
                seconds: self.slash_throttle_window,
            },
            ParamChange::DrainTimeout {
                seconds: self.drain_timeout,
            },
            ParamChange::JailDuration {
                seconds: self.jail_duration,
            },
            ParamChange::VscHeartbeatPeriod {
                seconds: self.vsc_heartbeat_period,
            },
            ParamChange::DoubleSignSlashFraction {
                fraction: self.double_sign_slash_fraction,
            },
        ]
    }
}
