use cosmwasm_schema::write_api;
use cosmwasm_std::Empty;

use ccv_provider::msg::{ExecuteMsg, InstantiateMsg, QueryMsg, SudoMsg};

fn main() {
    // Clear & write standard API
    write_api! {
        instantiate: InstantiateMsg,
        query: QueryMsg,
        migrate: Empty,
        execute: ExecuteMsg,
        sudo: SudoMsg,
    }
}
