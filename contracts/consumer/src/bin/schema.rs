use cosmwasm_schema::write_api;
use cosmwasm_std::Empty;

use ccv_consumer::msg::{InstantiateMsg, QueryMsg, SudoMsg};

fn main() {
    write_api! {
        instantiate: InstantiateMsg,
        query: QueryMsg,
        migrate: Empty,
        sudo: SudoMsg,
    }
}
