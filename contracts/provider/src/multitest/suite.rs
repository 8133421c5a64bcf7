use anyhow::Result as AnyResult;
use cosmwasm_std::testing::MockApi;
use cosmwasm_std::{Addr, Timestamp};
use cw_multi_test::{AppResponse, Contract, ContractWrapper, Executor};
use derivative::Derivative;

use ccv_apis::ccv_api::ConsumerGenesis;
use ccv_apis::proposal_api::Proposal;
use ccv_bindings::CcvMsg;
use ccv_bindings_test::CcvApp;

use crate::msg::{
    ConsumerKeyResponse, ExecuteMsg, InstantiateMsg, PowerChange, QueryMsg, SudoMsg,
    ValidatorByConsumerKeyResponse,
};
use crate::state::config::Params;
use crate::state::consumer::ConsumerChain;
use crate::state::staking::Validator;

fn contract_provider() -> Box<dyn Contract<CcvMsg>> {
    let contract = ContractWrapper::new(crate::execute, crate::instantiate, crate::query)
        .with_sudo(crate::sudo);
    Box::new(contract)
}

#[derive(Derivative)]
#[derivative(Default = "new")]
pub struct SuiteBuilder {
    /// Validators and their initial power, reported at the end of the first block
    validators: Vec<(String, u64)>,
    params: Option<Params>,
    #[derivative(Default(value = "100"))]
    height: u64,
}

impl SuiteBuilder {
    pub fn with_validator(mut self, name: &str, power: u64) -> Self {
        self.validators.push((name.to_owned(), power));
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    #[track_caller]
    pub fn build(self) -> Suite {
        let owner = MockApi::default().addr_make("owner");
        let mut app = CcvApp::new_at_height(self.height);

        let code_id = app.store_code(contract_provider());
        let provider_chain_id = app.block_info().chain_id;
        let contract = app
            .instantiate_contract(
                code_id,
                owner.clone(),
                &InstantiateMsg {
                    admin: Some(owner.to_string()),
                    provider_chain_id,
                    params: self.params,
                },
                &[],
                "provider",
                Some(owner.to_string()),
            )
            .unwrap();

        let mut suite = Suite {
            app,
            contract,
            owner,
        };
        let changes = self
            .validators
            .iter()
            .map(|(name, power)| suite.power_change(name, *power))
            .collect();
        suite.end_block(changes).unwrap();
        suite
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Suite {
    #[derivative(Debug = "ignore")]
    pub app: CcvApp,
    /// Provider contract address
    pub contract: Addr,
    /// Admin of the provider contract, acting as governance
    pub owner: Addr,
}

impl Suite {
    pub fn operator(&self, name: &str) -> Addr {
        self.app.api().addr_make(name)
    }

    /// Validator `name` has consensus key `{name}_cons` and operator `addr_make(name)`
    pub fn power_change(&self, name: &str, power: u64) -> PowerChange {
        PowerChange {
            operator: self.operator(name).to_string(),
            consensus_key: format!("{name}_cons"),
            power,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.app.block_info().time
    }

    pub fn begin_block(&mut self) -> AnyResult<AppResponse> {
        self.app
            .wasm_sudo(self.contract.clone(), &SudoMsg::BeginBlock {})
    }

    pub fn end_block(&mut self, power_changes: Vec<PowerChange>) -> AnyResult<AppResponse> {
        self.app
            .wasm_sudo(self.contract.clone(), &SudoMsg::EndBlock { power_changes })
    }

    pub fn unbonding_initiated(&mut self, op_id: u64) -> AnyResult<AppResponse> {
        self.app
            .wasm_sudo(self.contract.clone(), &SudoMsg::UnbondingInitiated { op_id })
    }

    /// Moves to the next block after `seconds`, and runs it with `power_changes`
    pub fn next_block(
        &mut self,
        seconds: u64,
        power_changes: Vec<PowerChange>,
    ) -> AnyResult<(AppResponse, AppResponse)> {
        self.app.advance_seconds(seconds);
        let begin = self.begin_block()?;
        let end = self.end_block(power_changes)?;
        Ok((begin, end))
    }

    pub fn submit_proposal(&mut self, sender: &Addr, proposal: Proposal) -> AnyResult<AppResponse> {
        self.app.execute_contract(
            sender.clone(),
            self.contract.clone(),
            &ExecuteMsg::SubmitProposal { proposal },
            &[],
        )
    }

    pub fn governance(&mut self, proposal: Proposal) -> AnyResult<AppResponse> {
        let owner = self.owner.clone();
        self.submit_proposal(&owner, proposal)
    }

    pub fn assign_consumer_key(
        &mut self,
        name: &str,
        chain_id: &str,
        consumer_key: &str,
    ) -> AnyResult<AppResponse> {
        let operator = self.operator(name);
        self.app.execute_contract(
            operator,
            self.contract.clone(),
            &ExecuteMsg::AssignConsumerKey {
                chain_id: chain_id.to_owned(),
                consumer_key: consumer_key.to_owned(),
            },
            &[],
        )
    }

    pub fn unjail(&mut self, name: &str) -> AnyResult<AppResponse> {
        let operator = self.operator(name);
        self.app.execute_contract(
            operator,
            self.contract.clone(),
            &ExecuteMsg::Unjail {},
            &[],
        )
    }

    #[track_caller]
    pub fn get_params(&self) -> Params {
        self.app
            .wrap()
            .query_wasm_smart(self.contract.clone(), &QueryMsg::Params {})
            .unwrap()
    }

    pub fn consumer_chain(&self, chain_id: &str) -> AnyResult<ConsumerChain> {
        Ok(self.app.wrap().query_wasm_smart(
            self.contract.clone(),
            &QueryMsg::ConsumerChain {
                chain_id: chain_id.to_owned(),
            },
        )?)
    }

    pub fn consumer_genesis(&self, chain_id: &str) -> AnyResult<ConsumerGenesis> {
        Ok(self.app.wrap().query_wasm_smart(
            self.contract.clone(),
            &QueryMsg::ConsumerGenesis {
                chain_id: chain_id.to_owned(),
            },
        )?)
    }

    pub fn consumer_key(
        &self,
        chain_id: &str,
        name: &str,
        height: Option<u64>,
    ) -> AnyResult<ConsumerKeyResponse> {
        Ok(self.app.wrap().query_wasm_smart(
            self.contract.clone(),
            &QueryMsg::ConsumerKey {
                chain_id: chain_id.to_owned(),
                validator: format!("{name}_cons"),
                height,
            },
        )?)
    }

    pub fn validator_by_consumer_key(
        &self,
        chain_id: &str,
        consumer_key: &str,
        height: Option<u64>,
    ) -> AnyResult<Option<String>> {
        let res: ValidatorByConsumerKeyResponse = self.app.wrap().query_wasm_smart(
            self.contract.clone(),
            &QueryMsg::ValidatorByConsumerKey {
                chain_id: chain_id.to_owned(),
                consumer_key: consumer_key.to_owned(),
                height,
            },
        )?;
        Ok(res.validator)
    }

    #[track_caller]
    pub fn get_validator(&self, name: &str) -> Validator {
        self.app
            .wrap()
            .query_wasm_smart(
                self.contract.clone(),
                &QueryMsg::Validator {
                    consensus_key: format!("{name}_cons"),
                },
            )
            .unwrap()
    }
}
