use cosmwasm_std::{Env, IbcMsg, Order, StdResult, Storage};

use crate::ibc::packet_timeout;
use crate::state::config::CONFIG;
use crate::state::outbox::{OutboundPacket, NEXT_OUTBOX_SEQ, OUTBOX};

/// enqueue appends a packet for the provider
pub fn enqueue(storage: &mut dyn Storage, packet: &OutboundPacket) -> StdResult<u64> {
    let seq = NEXT_OUTBOX_SEQ.load(storage)?;
    OUTBOX.save(storage, seq, packet)?;
    NEXT_OUTBOX_SEQ.save(storage, &(seq + 1))?;
    Ok(seq)
}

/// flush sends all queued packets over `channel_id`, in queue order
pub fn flush(storage: &mut dyn Storage, env: &Env, channel_id: &str) -> StdResult<Vec<IbcMsg>> {
    let config = CONFIG.load(storage)?;
    let queued = OUTBOX
        .range(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<_>>>()?;
    let timeout = packet_timeout(env, &config.params);
    Ok(queued
        .into_iter()
        .map(|(seq, packet)| {
            OUTBOX.remove(storage, seq);
            IbcMsg::SendPacket {
                channel_id: channel_id.to_string(),
                data: packet.encode(&config.chain_id),
                timeout: timeout.clone(),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::tests::setup;
    use ccv_proto::interchain_security::ccv::v1::{ccv_packet_data::Packet, CcvPacketData};
    use cosmwasm_std::IbcTimeout;
    use prost::Message;

    #[test]
    fn flush_sends_in_queue_order() {
        let (mut deps, env) = setup(&[("alice", 100)]);
        enqueue(&mut deps.storage, &OutboundPacket::VscMatured { vsc_id: 4 }).unwrap();
        enqueue(&mut deps.storage, &OutboundPacket::VscMatured { vsc_id: 5 }).unwrap();

        let msgs = flush(&mut deps.storage, &env, "channel-0").unwrap();
        let ids: Vec<u64> = msgs
            .iter()
            .map(|msg| match msg {
                IbcMsg::SendPacket {
                    channel_id,
                    data,
                    timeout,
                } => {
                    assert_eq!(channel_id, "channel-0");
                    let params = CONFIG.load(&deps.storage).unwrap().params;
                    assert_eq!(
                        timeout,
                        &IbcTimeout::with_timestamp(
                            env.block.time.plus_seconds(params.ccv_timeout_period)
                        )
                    );
                    match CcvPacketData::decode(data.as_slice()).unwrap().packet {
                        Some(Packet::VscMatured(matured)) => matured.valset_update_id,
                        other => panic!("unexpected packet: {other:?}"),
                    }
                }
                other => panic!("unexpected msg: {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec![4, 5]);

        assert!(flush(&mut deps.storage, &env, "channel-0").unwrap().is_empty());
        // Sequence keeps growing
        assert_eq!(
            enqueue(&mut deps.storage, &OutboundPacket::VscMatured { vsc_id: 6 }).unwrap(),
            2
        );
    }
}
