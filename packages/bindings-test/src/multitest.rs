use anyhow::{bail, Result as AnyResult};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::cmp::max;
use std::fmt::Debug;
use std::ops::{Deref, DerefMut};
use thiserror::Error;

use cosmwasm_std::testing::{MockApi, MockStorage};
use cosmwasm_std::Order::Ascending;
use cosmwasm_std::{
    Addr, Api, Binary, BlockInfo, CustomQuery, Decimal, Empty, Querier, QuerierResult, StdError,
    StdResult, Storage, Timestamp,
};
use cw_multi_test::{
    App, AppResponse, BankKeeper, BasicAppBuilder, CosmosRouter, Module, WasmKeeper,
};
use cw_storage_plus::Map;

use ccv_bindings::{CcvMsg, CcvQuery};

/// CcvModule stands in for the host chain modules that consume [`CcvMsg`]:
/// the provider's staking / slashing modules and the consumer's consensus set.
/// It only records the side effects so tests can inspect them
pub struct CcvModule {}

/// How many seconds per block
/// (when we increment block.height, use this multiplier for block.time)
pub const BLOCK_TIME: u64 = 5;

const JAILED: Map<&str, Timestamp> = Map::new("ccv_module_jailed");
const TOMBSTONED: Map<&str, Empty> = Map::new("ccv_module_tombstoned");
const SLASHED: Map<&str, Decimal> = Map::new("ccv_module_slashed");
const CONSENSUS_POWER: Map<&str, u64> = Map::new("ccv_module_consensus_power");
const COMPLETED_UNBONDINGS: Map<u64, Empty> = Map::new("ccv_module_completed_unbondings");

impl CcvModule {
    pub fn jailed_until(&self, storage: &dyn Storage, validator: &str) -> StdResult<Option<Timestamp>> {
        JAILED.may_load(storage, validator)
    }

    pub fn is_tombstoned(&self, storage: &dyn Storage, validator: &str) -> bool {
        TOMBSTONED.has(storage, validator)
    }

    /// Total fraction slashed from a validator so far
    pub fn slashed(&self, storage: &dyn Storage, validator: &str) -> StdResult<Decimal> {
        Ok(SLASHED.may_load(storage, validator)?.unwrap_or_default())
    }

    pub fn consensus_set(&self, storage: &dyn Storage) -> StdResult<Vec<(String, u64)>> {
        CONSENSUS_POWER
            .range(storage, None, None, Ascending)
            .collect()
    }

    pub fn unbonding_completed(&self, storage: &dyn Storage, op_id: u64) -> bool {
        COMPLETED_UNBONDINGS.has(storage, op_id)
    }
}

impl Module for CcvModule {
    type ExecT = CcvMsg;
    type QueryT = CcvQuery;
    type SudoT = Empty;

    fn execute<ExecC, QueryC>(
        &self,
        _api: &dyn Api,
        storage: &mut dyn Storage,
        _router: &dyn CosmosRouter<ExecC = ExecC, QueryC = QueryC>,
        _block: &BlockInfo,
        _sender: Addr,
        msg: CcvMsg,
    ) -> AnyResult<AppResponse>
    where
        ExecC: Debug + Clone + PartialEq + JsonSchema + DeserializeOwned + 'static,
        QueryC: CustomQuery + DeserializeOwned + 'static,
    {
        match msg {
            CcvMsg::JailValidator { validator, until } => {
                if TOMBSTONED.has(storage, &validator) {
                    bail!(CcvError::Tombstoned(validator));
                }
                JAILED.save(storage, &validator, &until)?;
            }
            CcvMsg::UnjailValidator { validator } => {
                if JAILED.may_load(storage, &validator)?.is_none() {
                    bail!(CcvError::NotJailed(validator));
                }
                JAILED.remove(storage, &validator);
            }
            CcvMsg::TombstoneValidator { validator } => {
                TOMBSTONED.save(storage, &validator, &Empty {})?;
            }
            CcvMsg::SlashValidator {
                validator,
                fraction,
                ..
            } => {
                SLASHED.update(storage, &validator, |slashed| -> StdResult<_> {
                    Ok(slashed.unwrap_or_default() + fraction)
                })?;
            }
            CcvMsg::CompleteUnbonding { op_id } => {
                if COMPLETED_UNBONDINGS.has(storage, op_id) {
                    bail!(CcvError::UnbondingCompleted(op_id));
                }
                COMPLETED_UNBONDINGS.save(storage, op_id, &Empty {})?;
            }
            CcvMsg::UpdateValidatorSet { updates } => {
                for update in updates {
                    if update.power == 0 {
                        CONSENSUS_POWER.remove(storage, &update.pub_key);
                    } else {
                        CONSENSUS_POWER.save(storage, &update.pub_key, &update.power)?;
                    }
                }
            }
        }
        Ok(AppResponse::default())
    }

    fn query(
        &self,
        _api: &dyn Api,
        _storage: &dyn Storage,
        _querier: &dyn Querier,
        _block: &BlockInfo,
        _request: CcvQuery,
    ) -> anyhow::Result<Binary> {
        bail!("query not implemented for CcvModule")
    }

    fn sudo<ExecC, QueryC>(
        &self,
        _api: &dyn Api,
        _storage: &mut dyn Storage,
        _router: &dyn CosmosRouter<ExecC = ExecC, QueryC = QueryC>,
        _block: &BlockInfo,
        _msg: Self::SudoT,
    ) -> AnyResult<AppResponse>
    where
        ExecC: Debug + Clone + PartialEq + JsonSchema + DeserializeOwned + 'static,
        QueryC: CustomQuery + DeserializeOwned + 'static,
    {
        bail!("sudo not implemented for CcvModule")
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum CcvError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Validator is tombstoned: {0}")]
    Tombstoned(String),

    #[error("Validator is not jailed: {0}")]
    NotJailed(String),

    #[error("Unbonding operation already completed: {0}")]
    UnbondingCompleted(u64),
}

pub type CcvAppWrapped =
    App<BankKeeper, MockApi, MockStorage, CcvModule, WasmKeeper<CcvMsg, CcvQuery>>;

pub struct CcvApp(CcvAppWrapped);

impl Deref for CcvApp {
    type Target = CcvAppWrapped;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for CcvApp {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Querier for CcvApp {
    fn raw_query(&self, bin_request: &[u8]) -> QuerierResult {
        self.0.raw_query(bin_request)
    }
}

impl Default for CcvApp {
    fn default() -> Self {
        Self::new()
    }
}

impl CcvApp {
    pub fn new() -> Self {
        Self(
            BasicAppBuilder::<CcvMsg, CcvQuery>::new_custom()
                .with_custom(CcvModule {})
                .build(|_, _, _| {}),
        )
    }

    pub fn new_at_height(height: u64) -> Self {
        let block_info = BlockInfo {
            height,
            time: Timestamp::from_seconds(1714119228 + height * BLOCK_TIME),
            chain_id: "provider".to_owned(),
        };

        Self(
            BasicAppBuilder::<CcvMsg, CcvQuery>::new_custom()
                .with_custom(CcvModule {})
                .with_block(block_info)
                .build(|_, _, _| {}),
        )
    }

    pub fn block_info(&self) -> BlockInfo {
        self.0.block_info()
    }

    /// This advances BlockInfo by given number of blocks.
    /// It does not do any callbacks, but keeps the ratio of seconds/block
    pub fn advance_blocks(&mut self, blocks: u64) {
        self.update_block(|block| {
            block.time = block.time.plus_seconds(BLOCK_TIME * blocks);
            block.height += blocks;
        });
    }

    /// This advances BlockInfo by given number of seconds.
    /// It does not do any callbacks, but keeps the ratio of seconds/block
    pub fn advance_seconds(&mut self, seconds: u64) {
        self.update_block(|block| {
            block.time = block.time.plus_seconds(seconds);
            block.height += max(1, seconds / BLOCK_TIME);
        });
    }

    pub fn jailed_until(&self, validator: &str) -> StdResult<Option<Timestamp>> {
        self.read_module(|router, _, storage| router.custom.jailed_until(storage, validator))
    }

    pub fn is_tombstoned(&self, validator: &str) -> bool {
        self.read_module(|router, _, storage| router.custom.is_tombstoned(storage, validator))
    }

    pub fn slashed(&self, validator: &str) -> StdResult<Decimal> {
        self.read_module(|router, _, storage| router.custom.slashed(storage, validator))
    }

    pub fn consensus_set(&self) -> StdResult<Vec<(String, u64)>> {
        self.read_module(|router, _, storage| router.custom.consensus_set(storage))
    }

    pub fn unbonding_completed(&self, op_id: u64) -> bool {
        self.read_module(|router, _, storage| router.custom.unbonding_completed(storage, op_id))
    }
}
