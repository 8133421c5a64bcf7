mod suite;

use cosmwasm_std::Decimal;
use suite::SuiteBuilder;
use test_utils::consumer_addition;

use ccv_apis::ccv_api::ConsumerStatus;
use ccv_apis::proposal_api::{ConsumerRemovalProposal, Proposal};

use crate::error::ContractError;
use crate::state::config::Params;

const CHAIN: &str = "consumer-1";

#[test]
fn initialization() {
    let suite = SuiteBuilder::new()
        .with_validator("alice", 100)
        .with_validator("bob", 50)
        .build();

    assert_eq!(suite.get_params(), Params::default());
    let alice = suite.get_validator("alice");
    assert_eq!(alice.operator, suite.operator("alice"));
    assert_eq!(alice.power, 100);
}

mod governance {
    use super::*;

    #[test]
    fn only_admin_submits_proposals() {
        let mut suite = SuiteBuilder::new().build();
        let stranger = suite.operator("stranger");
        let proposal = Proposal::ConsumerAddition(consumer_addition(CHAIN, suite.now()));

        let err = suite.submit_proposal(&stranger, proposal.clone()).unwrap_err();
        assert_eq!(
            err.root_cause().to_string(),
            cw_controllers::AdminError::NotAdmin {}.to_string()
        );
        suite.governance(proposal).unwrap();
        assert_eq!(
            suite.consumer_chain(CHAIN).unwrap().status,
            ConsumerStatus::Registered
        );
    }

    #[test]
    fn custom_params() {
        let params = Params {
            slash_throttle_window: 60,
            double_sign_slash_fraction: Decimal::percent(10),
            ..Params::default()
        };
        let suite = SuiteBuilder::new().with_params(params.clone()).build();
        assert_eq!(suite.get_params(), params);
    }
}

mod lifecycle {
    use super::*;

    #[test]
    fn consumer_spawns_at_spawn_time() {
        let mut suite = SuiteBuilder::new()
            .with_validator("alice", 100)
            .with_validator("bob", 50)
            .build();
        let spawn_time = suite.now().plus_seconds(10);
        suite
            .governance(Proposal::ConsumerAddition(consumer_addition(
                CHAIN, spawn_time,
            )))
            .unwrap();

        suite.next_block(5, vec![]).unwrap();
        assert_eq!(
            suite.consumer_chain(CHAIN).unwrap().status,
            ConsumerStatus::Registered
        );
        suite.consumer_genesis(CHAIN).unwrap_err();

        suite.next_block(5, vec![]).unwrap();
        let chain = suite.consumer_chain(CHAIN).unwrap();
        assert_eq!(chain.status, ConsumerStatus::Spawned);
        assert_eq!(chain.spawn_height, Some(suite.app.block_info().height));

        let genesis = suite.consumer_genesis(CHAIN).unwrap();
        assert_eq!(genesis.provider_chain_id, "provider");
        let mut keys: Vec<_> = genesis
            .initial_val_set
            .iter()
            .map(|update| (update.pub_key.as_str(), update.power))
            .collect();
        keys.sort();
        assert_eq!(keys, vec![("alice_cons", 100), ("bob_cons", 50)]);
    }

    #[test]
    fn spawned_consumer_stays_until_removed() {
        let mut suite = SuiteBuilder::new().with_validator("alice", 100).build();
        let now = suite.now();
        suite
            .governance(Proposal::ConsumerAddition(consumer_addition(CHAIN, now)))
            .unwrap();
        suite.next_block(5, vec![]).unwrap();

        // No channel ever established
        let drain_timeout = suite.get_params().drain_timeout;
        suite.next_block(2 * drain_timeout, vec![]).unwrap();
        assert_eq!(
            suite.consumer_chain(CHAIN).unwrap().status,
            ConsumerStatus::Spawned
        );

        let stop_time = suite.now().plus_seconds(10);
        suite
            .governance(Proposal::ConsumerRemoval(ConsumerRemovalProposal {
                chain_id: CHAIN.to_string(),
                stop_time,
                deposit: vec![],
            }))
            .unwrap();
        suite.next_block(5, vec![]).unwrap();
        assert_eq!(
            suite.consumer_chain(CHAIN).unwrap().status,
            ConsumerStatus::StoppingScheduled
        );

        let (begin, _) = suite.next_block(5, vec![]).unwrap();
        assert!(begin.events.iter().any(|e| e.ty == "wasm-consumer_removed"));
        suite.consumer_chain(CHAIN).unwrap_err();
    }
}

mod unbonding {
    use super::*;

    #[test]
    fn completes_right_away_without_consumers() {
        let mut suite = SuiteBuilder::new().with_validator("alice", 100).build();
        suite.unbonding_initiated(1).unwrap();
        assert!(!suite.app.unbonding_completed(1));

        suite.end_block(vec![]).unwrap();
        assert!(suite.app.unbonding_completed(1));
        // The staking module refuses to complete an operation twice
        suite.unbonding_initiated(1).unwrap();
        suite.end_block(vec![]).unwrap_err();
    }

    #[test]
    fn waits_for_the_consumer_until_it_is_removed() {
        let mut suite = SuiteBuilder::new().with_validator("alice", 100).build();
        let now = suite.now();
        suite
            .governance(Proposal::ConsumerAddition(consumer_addition(CHAIN, now)))
            .unwrap();
        suite.next_block(5, vec![]).unwrap();

        suite.unbonding_initiated(2).unwrap();
        let err = suite.unbonding_initiated(2).unwrap_err();
        assert_eq!(
            err.root_cause().to_string(),
            ContractError::DuplicateUnbondingOp(2).to_string()
        );
        suite.next_block(5, vec![]).unwrap();
        suite.next_block(5, vec![]).unwrap();
        assert!(!suite.app.unbonding_completed(2));

        let now = suite.now();
        suite
            .governance(Proposal::ConsumerRemoval(ConsumerRemovalProposal {
                chain_id: CHAIN.to_string(),
                stop_time: now,
                deposit: vec![],
            }))
            .unwrap();
        suite.next_block(5, vec![]).unwrap();
        suite.consumer_chain(CHAIN).unwrap_err();
        assert!(suite.app.unbonding_completed(2));
    }
}

mod key_assignment {
    use super::*;

    #[test]
    fn assignment_applies_from_next_block() {
        let mut suite = SuiteBuilder::new()
            .with_validator("alice", 100)
            .with_validator("bob", 50)
            .build();
        let now = suite.now();
        suite
            .governance(Proposal::ConsumerAddition(consumer_addition(CHAIN, now)))
            .unwrap();

        let height = suite.app.block_info().height;
        suite.assign_consumer_key("alice", CHAIN, "alice_key").unwrap();
        let key = suite.consumer_key(CHAIN, "alice", None).unwrap();
        assert_eq!(key.consumer_key, "alice_cons");
        assert!(!key.assigned);
        assert_eq!(key.pending_key, Some("alice_key".to_string()));

        suite.next_block(5, vec![]).unwrap();
        let key = suite.consumer_key(CHAIN, "alice", None).unwrap();
        assert_eq!(key.consumer_key, "alice_key");
        assert!(key.assigned);
        assert_eq!(key.pending_key, None);

        // History is kept
        let key = suite.consumer_key(CHAIN, "alice", Some(height)).unwrap();
        assert_eq!(key.consumer_key, "alice_cons");
        assert_eq!(
            suite
                .validator_by_consumer_key(CHAIN, "alice_key", Some(height + 1))
                .unwrap(),
            Some("alice_cons".to_string())
        );
        assert_eq!(
            suite
                .validator_by_consumer_key(CHAIN, "alice_key", Some(height))
                .unwrap(),
            None
        );

        // The genesis uses the assigned key
        let genesis = suite.consumer_genesis(CHAIN).unwrap();
        assert!(genesis
            .initial_val_set
            .iter()
            .any(|update| update.pub_key == "alice_key"));
    }

    #[test]
    fn key_in_use_is_rejected() {
        let mut suite = SuiteBuilder::new()
            .with_validator("alice", 100)
            .with_validator("bob", 50)
            .build();
        let now = suite.now();
        suite
            .governance(Proposal::ConsumerAddition(consumer_addition(CHAIN, now)))
            .unwrap();

        suite.assign_consumer_key("alice", CHAIN, "shared").unwrap();
        let err = suite
            .assign_consumer_key("bob", CHAIN, "shared")
            .unwrap_err();
        assert_eq!(
            err.root_cause().to_string(),
            ContractError::KeyAlreadyInUse {
                key: "shared".to_string(),
                owner: "alice_cons".to_string()
            }
            .to_string()
        );

        // Bob's provider key is taken by bob
        let err = suite
            .assign_consumer_key("alice", CHAIN, "bob_cons")
            .unwrap_err();
        assert_eq!(
            err.root_cause().to_string(),
            ContractError::KeyAlreadyInUse {
                key: "bob_cons".to_string(),
                owner: "bob_cons".to_string()
            }
            .to_string()
        );

        let err = suite
            .assign_consumer_key("alice", "unknown", "k")
            .unwrap_err();
        assert_eq!(
            err.root_cause().to_string(),
            ContractError::ConsumerUnknown("unknown".to_string()).to_string()
        );

        let err = suite
            .assign_consumer_key("stranger", CHAIN, "k")
            .unwrap_err();
        assert_eq!(
            err.root_cause().to_string(),
            ContractError::NotValidator(suite.operator("stranger").to_string()).to_string()
        );
    }
}

mod equivocation {
    use super::*;
    use ccv_apis::proposal_api::{Equivocation, EquivocationProposal};

    #[test]
    fn equivocation_tombstones_and_slashes() {
        let mut suite = SuiteBuilder::new()
            .with_validator("alice", 100)
            .with_validator("bob", 50)
            .build();
        let now = suite.now();
        suite
            .governance(Proposal::Equivocation(EquivocationProposal {
                equivocations: vec![Equivocation {
                    consensus_key: "alice_cons".to_string(),
                    height: 90,
                    time: now,
                    power: 100,
                }],
            }))
            .unwrap();

        assert!(suite.app.is_tombstoned("alice_cons"));
        assert_eq!(suite.app.slashed("alice_cons").unwrap(), Decimal::percent(5));
        assert!(suite.get_validator("alice").tombstoned);
        assert!(!suite.app.is_tombstoned("bob_cons"));

        // Tombstoned validators cannot come back
        let err = suite.unjail("alice").unwrap_err();
        assert_eq!(
            err.root_cause().to_string(),
            ContractError::Tombstoned("alice_cons".to_string()).to_string()
        );
    }

    #[test]
    fn unjail_requires_jail() {
        let mut suite = SuiteBuilder::new().with_validator("alice", 100).build();
        let err = suite.unjail("alice").unwrap_err();
        assert_eq!(
            err.root_cause().to_string(),
            ContractError::NotJailed("alice_cons".to_string()).to_string()
        );
    }
}
