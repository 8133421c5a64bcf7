//! applier keeps the consumer's validator set in step with the provider: it applies the
//! validator set changes in order, and tracks when each of them matures
use cosmwasm_std::{Event, Order, StdResult, Storage, Timestamp};
use cw_storage_plus::Bound;

use ccv_apis::ccv_api::{ConsumerGenesis, ValidatorUpdate};
use ccv_apis::Validate;
use ccv_proto::interchain_security::ccv::v1::ValidatorSetChangePacketData;

use crate::error::ContractError;
use crate::outbox;
use crate::state::config::CONFIG;
use crate::state::outbox::OutboundPacket;
use crate::state::valset::{
    HALTED, HEIGHT_TO_VSC_ID, LAST_VSC_ID, MATURITIES, OUTSTANDING_DOWNTIME, PENDING_CHANGES,
    VALIDATORS,
};

/// init_genesis stores the genesis validator set, which is validator set change 0
pub fn init_genesis(storage: &mut dyn Storage, genesis: &ConsumerGenesis) -> StdResult<()> {
    for update in genesis.initial_val_set.iter().filter(|u| u.power > 0) {
        VALIDATORS.save(storage, &update.pub_key, &update.power)?;
    }
    LAST_VSC_ID.save(storage, &0)
}

/// apply applies the next validator set change.
/// Anything but the change following the last applied one is rejected, leaving the state
/// untouched
pub fn apply(
    storage: &mut dyn Storage,
    now: Timestamp,
    vsc: &ValidatorSetChangePacketData,
) -> Result<Event, ContractError> {
    let vsc_id = vsc.valset_update_id;
    let expected = LAST_VSC_ID.load(storage)? + 1;
    if vsc_id != expected {
        return Err(ContractError::OutOfOrderPacket {
            expected,
            received: vsc_id,
        });
    }
    let updates: Vec<ValidatorUpdate> = vsc
        .validator_updates
        .iter()
        .map(|u| ValidatorUpdate::new(u.pub_key.clone(), u.power))
        .collect();
    updates.iter().try_for_each(ValidatorUpdate::validate)?;

    for update in &updates {
        if update.power == 0 {
            VALIDATORS.remove(storage, &update.pub_key);
        } else {
            VALIDATORS.save(storage, &update.pub_key, &update.power)?;
        }
        // Last change of a key in the block wins
        PENDING_CHANGES.save(storage, &update.pub_key, &update.power)?;
    }

    let config = CONFIG.load(storage)?;
    let maturity_time = now.plus_seconds(config.params.unbonding_period);
    MATURITIES.save(storage, vsc_id, &maturity_time)?;

    // The provider handled these downtime reports
    for key in &vsc.slash_acks {
        OUTSTANDING_DOWNTIME.remove(storage, key);
    }

    LAST_VSC_ID.save(storage, &vsc_id)?;
    HALTED.remove(storage);

    Ok(Event::new("vsc_applied")
        .add_attribute("vsc_id", vsc_id.to_string())
        .add_attribute("updates", updates.len().to_string())
        .add_attribute("slash_acks", vsc.slash_acks.len().to_string())
        .add_attribute("maturity_time", maturity_time.to_string()))
}

/// record_height maps the block height to the validator set change in force
pub fn record_height(storage: &mut dyn Storage, height: u64) -> StdResult<u64> {
    let vsc_id = LAST_VSC_ID.load(storage)?;
    HEIGHT_TO_VSC_ID.save(storage, height, &vsc_id)?;
    Ok(vsc_id)
}

/// vsc_id_at returns the validator set change in force at `height`.
/// Heights before the first recorded block use the genesis set
pub fn vsc_id_at(storage: &dyn Storage, height: u64) -> StdResult<u64> {
    HEIGHT_TO_VSC_ID
        .range(
            storage,
            None,
            Some(Bound::inclusive(height)),
            Order::Descending,
        )
        .next()
        .transpose()
        .map(|entry| entry.map(|(_, vsc_id)| vsc_id).unwrap_or_default())
}

/// prune_heights forgets the heights at which only changes older than `vsc_id` were in
/// force. The last of them is kept, so that the heights after it still resolve
fn prune_heights(storage: &mut dyn Storage, vsc_id: u64) -> StdResult<usize> {
    let mut stale = HEIGHT_TO_VSC_ID
        .range(storage, None, None, Order::Ascending)
        .take_while(|item| item.as_ref().map_or(true, |(_, id)| *id < vsc_id))
        .map(|item| item.map(|(height, _)| height))
        .collect::<StdResult<Vec<_>>>()?;
    stale.pop();
    for height in &stale {
        HEIGHT_TO_VSC_ID.remove(storage, *height);
    }
    Ok(stale.len())
}

/// sweep_maturities queues a maturity notice for every validator set change matured by
/// `now`, in id order. Matured changes are forgotten, so they are notified only once.
/// Heights from before the last matured change are past the unbonding period, and are
/// pruned as well
pub fn sweep_maturities(storage: &mut dyn Storage, now: Timestamp) -> StdResult<Vec<u64>> {
    let matured = MATURITIES
        .range(storage, None, None, Order::Ascending)
        .filter_map(|item| match item {
            Ok((vsc_id, maturity_time)) if maturity_time <= now => Some(Ok(vsc_id)),
            Ok(_) => None,
            Err(err) => Some(Err(err)),
        })
        .collect::<StdResult<Vec<_>>>()?;
    for vsc_id in &matured {
        MATURITIES.remove(storage, *vsc_id);
        outbox::enqueue(storage, &OutboundPacket::VscMatured { vsc_id: *vsc_id })?;
    }
    if let Some(latest) = matured.last() {
        prune_heights(storage, *latest)?;
    }
    Ok(matured)
}

/// take_pending_changes drains the validator set changes applied since the last call
pub fn take_pending_changes(storage: &mut dyn Storage) -> StdResult<Vec<ValidatorUpdate>> {
    let changes = PENDING_CHANGES
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(key, power)| ValidatorUpdate::new(key, power)))
        .collect::<StdResult<Vec<_>>>()?;
    PENDING_CHANGES.clear(storage);
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::tests::{setup, vsc};
    use crate::state::outbox::OUTBOX;

    #[test]
    fn genesis_is_vsc_zero() {
        let (deps, _) = setup(&[("alice", 100), ("bob", 50)]);
        assert_eq!(LAST_VSC_ID.load(&deps.storage).unwrap(), 0);
        assert_eq!(VALIDATORS.load(&deps.storage, "alice").unwrap(), 100);
        assert!(PENDING_CHANGES.is_empty(&deps.storage));
    }

    #[test]
    fn updates_are_applied_in_order() {
        let (mut deps, env) = setup(&[("alice", 100), ("bob", 50)]);

        apply(
            &mut deps.storage,
            env.block.time,
            &vsc(1, &[("bob", 0), ("carol", 10)], &[]),
        )
        .unwrap();
        assert!(!VALIDATORS.has(&deps.storage, "bob"));
        assert_eq!(VALIDATORS.load(&deps.storage, "carol").unwrap(), 10);
        assert_eq!(LAST_VSC_ID.load(&deps.storage).unwrap(), 1);

        let unbonding = CONFIG.load(&deps.storage).unwrap().params.unbonding_period;
        assert_eq!(
            MATURITIES.load(&deps.storage, 1).unwrap(),
            env.block.time.plus_seconds(unbonding)
        );

        apply(
            &mut deps.storage,
            env.block.time,
            &vsc(2, &[("carol", 20)], &[]),
        )
        .unwrap();
        assert_eq!(
            take_pending_changes(&mut deps.storage).unwrap(),
            vec![ValidatorUpdate::new("bob", 0), ValidatorUpdate::new("carol", 20)]
        );
        assert!(take_pending_changes(&mut deps.storage).unwrap().is_empty());
    }

    #[test]
    fn out_of_order_is_rejected() {
        let (mut deps, env) = setup(&[("alice", 100)]);

        let err = apply(&mut deps.storage, env.block.time, &vsc(2, &[("alice", 0)], &[]))
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::OutOfOrderPacket {
                expected: 1,
                received: 2
            }
        );
        assert_eq!(VALIDATORS.load(&deps.storage, "alice").unwrap(), 100);

        apply(&mut deps.storage, env.block.time, &vsc(1, &[], &[])).unwrap();
        // Duplicates are out of order too
        let err = apply(&mut deps.storage, env.block.time, &vsc(1, &[], &[])).unwrap_err();
        assert_eq!(
            err,
            ContractError::OutOfOrderPacket {
                expected: 2,
                received: 1
            }
        );
    }

    #[test]
    fn slash_acks_clear_outstanding_downtime() {
        let (mut deps, env) = setup(&[("alice", 100)]);
        OUTSTANDING_DOWNTIME
            .save(&mut deps.storage, "alice", &Default::default())
            .unwrap();

        apply(&mut deps.storage, env.block.time, &vsc(1, &[], &["alice"])).unwrap();
        assert!(!OUTSTANDING_DOWNTIME.has(&deps.storage, "alice"));
    }

    #[test]
    fn maturities_are_swept_once_in_order() {
        let (mut deps, env) = setup(&[("alice", 100)]);
        let unbonding = CONFIG.load(&deps.storage).unwrap().params.unbonding_period;

        apply(&mut deps.storage, env.block.time, &vsc(1, &[], &[])).unwrap();
        apply(&mut deps.storage, env.block.time, &vsc(2, &[], &[])).unwrap();
        let later = env.block.time.plus_seconds(10);
        apply(&mut deps.storage, later, &vsc(3, &[], &[])).unwrap();

        let now = env.block.time.plus_seconds(unbonding - 1);
        assert!(sweep_maturities(&mut deps.storage, now).unwrap().is_empty());

        let now = env.block.time.plus_seconds(unbonding);
        assert_eq!(sweep_maturities(&mut deps.storage, now).unwrap(), vec![1, 2]);
        assert!(sweep_maturities(&mut deps.storage, now).unwrap().is_empty());

        let now = later.plus_seconds(unbonding);
        assert_eq!(sweep_maturities(&mut deps.storage, now).unwrap(), vec![3]);

        let queued: Vec<_> = OUTBOX
            .range(&deps.storage, None, None, Order::Ascending)
            .map(|item| item.unwrap().1)
            .collect();
        assert_eq!(
            queued,
            vec![
                OutboundPacket::VscMatured { vsc_id: 1 },
                OutboundPacket::VscMatured { vsc_id: 2 },
                OutboundPacket::VscMatured { vsc_id: 3 },
            ]
        );
    }

    #[test]
    fn heights_map_to_vsc_ids() {
        let (mut deps, env) = setup(&[("alice", 100)]);
        assert_eq!(vsc_id_at(&deps.storage, 5).unwrap(), 0);

        record_height(&mut deps.storage, 10).unwrap();
        apply(&mut deps.storage, env.block.time, &vsc(1, &[], &[])).unwrap();
        record_height(&mut deps.storage, 11).unwrap();
        record_height(&mut deps.storage, 12).unwrap();

        assert_eq!(vsc_id_at(&deps.storage, 9).unwrap(), 0);
        assert_eq!(vsc_id_at(&deps.storage, 10).unwrap(), 0);
        assert_eq!(vsc_id_at(&deps.storage, 11).unwrap(), 1);
        assert_eq!(vsc_id_at(&deps.storage, 100).unwrap(), 1);
    }

    #[test]
    fn matured_heights_are_pruned() {
        let (mut deps, env) = setup(&[("alice", 100)]);
        let unbonding = CONFIG.load(&deps.storage).unwrap().params.unbonding_period;

        record_height(&mut deps.storage, 10).unwrap();
        record_height(&mut deps.storage, 11).unwrap();
        apply(&mut deps.storage, env.block.time, &vsc(1, &[], &[])).unwrap();
        record_height(&mut deps.storage, 12).unwrap();
        record_height(&mut deps.storage, 13).unwrap();
        let later = env.block.time.plus_seconds(10);
        apply(&mut deps.storage, later, &vsc(2, &[], &[])).unwrap();
        record_height(&mut deps.storage, 14).unwrap();

        sweep_maturities(&mut deps.storage, env.block.time.plus_seconds(unbonding)).unwrap();
        let heights: Vec<u64> = HEIGHT_TO_VSC_ID
            .keys(&deps.storage, None, None, Order::Ascending)
            .collect::<StdResult<_>>()
            .unwrap();
        assert_eq!(heights, vec![11, 12, 13, 14]);

        sweep_maturities(&mut deps.storage, later.plus_seconds(unbonding)).unwrap();
        let heights: Vec<u64> = HEIGHT_TO_VSC_ID
            .keys(&deps.storage, None, None, Order::Ascending)
            .collect::<StdResult<_>>()
            .unwrap();
        assert_eq!(heights, vec![13, 14]);
        // Later heights keep resolving
        assert_eq!(vsc_id_at(&deps.storage, 13).unwrap(), 1);
        assert_eq!(vsc_id_at(&deps.storage, 20).unwrap(), 2);
    }
}
