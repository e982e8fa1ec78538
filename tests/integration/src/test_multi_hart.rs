// Licensed under the Apache-2.0 license

//! Every hart exchanges tracked requests with every other hart at once.

#[cfg(test)]
mod test {
    use crate::test::{init_logging, World};
    use hss_config::{IPI_MAX_NUM_QUEUE_MESSAGES, IPI_NUM_QUEUES};
    use hss_platform::{HartId, HartMask};
    use hss_ssmb::{
        BufferRef, CompletionIndex, HandlerRegistry, Ipi, IpiError, IpiMessage, IpiStatusCode,
        MsgType, TxId,
    };
    use hss_state_machine::drain_acks;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const REQUESTS_PER_PEER: u32 = 300;

    // A queue carries both the sender's requests and its acknowledgments of
    // the peer's requests. Capping each direction at half the queue keeps room
    // for every acknowledgment.
    const MAX_IN_FLIGHT: u32 = IPI_MAX_NUM_QUEUE_MESSAGES as u32 / 2;

    static RECEIVED: [Mutex<Vec<(HartId, TxId, u32)>>; 5] = [const { Mutex::new(Vec::new()) }; 5];

    fn net_tx_handler(ipi: &Ipi<'_>, source: HartId, msg: &IpiMessage) -> IpiStatusCode {
        RECEIVED[ipi.hart().index()]
            .lock()
            .unwrap()
            .push((source, msg.tx_id, msg.immediate_arg));
        IpiStatusCode::Success
    }

    static REGISTRY: HandlerRegistry =
        HandlerRegistry::new().register(MsgType::NetTx, net_tx_handler);

    struct Outstanding {
        index: CompletionIndex,
        target: HartId,
    }

    /// Super-loop of one hart: keep requests to every peer in flight, serve
    /// requests from every peer, drain acknowledgments, retire completions.
    fn run_hart(world: World, me: HartId, finished: &AtomicUsize) -> Vec<(HartId, TxId, u32)> {
        let ipi = world.ipi(me, &REGISTRY);
        let peers: Vec<HartId> = HartId::ALL.into_iter().filter(|h| *h != me).collect();
        let mut sent = [0u32; 5];
        let mut in_flight = [0u32; 5];
        let mut completed = 0u32;
        let mut delivered = Vec::new();
        let mut outstanding: Vec<Outstanding> = Vec::new();
        let mut done = false;
        let total = REQUESTS_PER_PEER * peers.len() as u32;

        while finished.load(Ordering::Acquire) < HartId::ALL.len() {
            world.check_timeout();

            for &peer in &peers {
                if sent[peer.index()] == REQUESTS_PER_PEER || in_flight[peer.index()] == MAX_IN_FLIGHT
                {
                    continue;
                }
                let Ok(index) = ipi.message_alloc() else {
                    break;
                };
                let seq = sent[peer.index()];
                match ipi.message_deliver(index, peer, MsgType::NetTx, seq, BufferRef::NULL, BufferRef::NULL) {
                    Ok(()) => {
                        delivered.push((peer, ipi.message_tx_id(index).unwrap(), seq));
                        outstanding.push(Outstanding { index, target: peer });
                        sent[peer.index()] += 1;
                        in_flight[peer.index()] += 1;
                    }
                    Err(IpiError::QueueFull { .. }) => ipi.message_free(index).unwrap(),
                    Err(err) => panic!("{me}: deliver failed: {err}"),
                }
            }

            ipi.poll_receive(HartMask::ALL);
            for &peer in &peers {
                while ipi.consume_intent(peer, MsgType::NetTx) {}
            }
            drain_acks(ipi, HartMask::ALL);

            outstanding.retain(|request| {
                if !ipi.message_check_if_complete(request.index) {
                    return true;
                }
                assert_eq!(
                    ipi.message_status(request.index),
                    Some(IpiStatusCode::Success),
                    "{me}: request to {} failed",
                    request.target
                );
                ipi.message_free(request.index).unwrap();
                in_flight[request.target.index()] -= 1;
                completed += 1;
                false
            });

            if !done && completed == total {
                done = true;
                finished.fetch_add(1, Ordering::AcqRel);
            }
            std::thread::yield_now();
        }

        let stats = world.data.stats(me);
        assert_eq!(stats.allocs, stats.frees);
        assert_eq!(stats.delivers, total);
        assert!(outstanding.is_empty());
        delivered
    }

    #[test]
    fn test_all_pairs_exchange_requests() {
        init_logging();
        let world = World::new();
        let finished = AtomicUsize::new(0);

        let delivered: Vec<(HartId, Vec<(HartId, TxId, u32)>)> = std::thread::scope(|s| {
            let handles: Vec<_> = HartId::ALL
                .into_iter()
                .map(|hart| {
                    let finished = &finished;
                    (hart, s.spawn(move || run_hart(world, hart, finished)))
                })
                .collect();
            handles
                .into_iter()
                .map(|(hart, handle)| (hart, handle.join().unwrap()))
                .collect()
        });

        // Every delivered request was handled exactly once by its target.
        for (sender, requests) in &delivered {
            for target in HartId::ALL.into_iter().filter(|h| h != sender) {
                let expected: HashSet<(TxId, u32)> = requests
                    .iter()
                    .filter(|(t, _, _)| *t == target)
                    .map(|(_, tx_id, seq)| (*tx_id, *seq))
                    .collect();
                let received = RECEIVED[target.index()].lock().unwrap();
                let got: Vec<(TxId, u32)> = received
                    .iter()
                    .filter(|(source, _, _)| source == sender)
                    .map(|(_, tx_id, seq)| (*tx_id, *seq))
                    .collect();
                assert_eq!(got.len(), REQUESTS_PER_PEER as usize);
                assert_eq!(got.iter().copied().collect::<HashSet<_>>(), expected);
            }
        }

        // Transaction ids of one sender are unique and increasing in
        // delivery order.
        for (_, requests) in &delivered {
            assert!(requests.windows(2).all(|w| w[0].1 < w[1].1));
        }

        for index in 0..IPI_NUM_QUEUES {
            let queue = world.data.queue(index).unwrap();
            assert!(queue.slots.iter().all(|slot| slot.is_free()));
        }
    }
}
