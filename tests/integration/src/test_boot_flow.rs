// Licensed under the Apache-2.0 license

//! The E51 sends every U54 to its boot address and tracks the requests from
//! a state machine while the U54s acknowledge as pending and complete later.

#[cfg(test)]
mod test {
    use crate::test::{init_logging, World};
    use hss_config::SchedulerConfig;
    use hss_platform::{HartId, HartMask, TickSource, Ticks};
    use hss_services::ipi_poll::{enable, ipi_poll_service};
    use hss_services::handle_ipi;
    use hss_ssmb::{
        null_ipi_handler, BufferRef, CompletionIndex, HandlerRegistry, Ipi, IpiMessage,
        IpiStatusCode, MsgType, TxId,
    };
    use hss_state_machine::{
        dump_state_machine_stats, Machine, Scheduler, StateDesc, StateId, StateMachine,
    };
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    const BOOT_TIMEOUT: Ticks = 50_000_000;

    static BOOT_PENDING: [AtomicU32; 5] = [const { AtomicU32::new(0) }; 5];

    fn goto_handler(ipi: &Ipi<'_>, source: HartId, msg: &IpiMessage) -> IpiStatusCode {
        assert_eq!(source, HartId::E51);
        BOOT_PENDING[ipi.hart().index()].store(msg.tx_id.0, Ordering::Release);
        IpiStatusCode::Pending
    }

    static REGISTRY: HandlerRegistry = HandlerRegistry::new()
        .register(MsgType::PmpSetup, null_ipi_handler)
        .register(MsgType::Goto, goto_handler);

    const IDLE: StateId = 0;
    const REQUEST: StateId = 1;
    const WAIT: StateId = 2;
    const COMPLETE: StateId = 3;

    struct Boot {
        ipi: &'static Ipi<'static>,
        requests: [Option<CompletionIndex>; 4],
        results: [Option<IpiStatusCode>; 4],
    }

    static BOOT_STATES: [StateDesc<Boot>; 4] = [
        StateDesc {
            state: IDLE,
            name: "Idle",
            on_entry: None,
            on_exit: None,
            handler: idle_handler,
        },
        StateDesc {
            state: REQUEST,
            name: "Request",
            on_entry: None,
            on_exit: None,
            handler: request_handler,
        },
        StateDesc {
            state: WAIT,
            name: "Wait",
            on_entry: None,
            on_exit: None,
            handler: wait_handler,
        },
        StateDesc {
            state: COMPLETE,
            name: "Complete",
            on_entry: Some(complete_entry),
            on_exit: None,
            handler: complete_handler,
        },
    ];

    fn idle_handler(m: &mut StateMachine<Boot>) {
        m.set_state(REQUEST);
    }

    fn request_handler(m: &mut StateMachine<Boot>) {
        let ipi = m.instance.ipi;
        for (slot, hart) in HartId::ALL[1..].iter().enumerate() {
            let index = ipi.message_alloc().unwrap();
            ipi.message_deliver(
                index,
                *hart,
                MsgType::Goto,
                0,
                BufferRef(0x8000_0000),
                BufferRef::NULL,
            )
            .unwrap();
            m.instance.requests[slot] = Some(index);
        }
        m.set_state(WAIT);
    }

    fn wait_handler(m: &mut StateMachine<Boot>) {
        let ipi = m.instance.ipi;
        let waiting_since = m.start_time();
        let Boot {
            requests, results, ..
        } = &mut m.instance;
        for (request, result) in requests.iter_mut().zip(results.iter_mut()) {
            let Some(index) = *request else {
                continue;
            };
            if ipi.message_check_if_complete(index) {
                *result = ipi.message_status(index);
                ipi.message_free(index).unwrap();
                *request = None;
            }
        }
        if requests.iter().all(Option::is_none) {
            m.set_state(COMPLETE);
        } else if TickSource::is_elapsed(ipi.platform(), waiting_since, BOOT_TIMEOUT) {
            panic!("boot requests timed out");
        }
    }

    fn complete_entry(m: &mut StateMachine<Boot>) {
        log::info!("all application harts booted");
        assert_eq!(m.instance.ipi.hart(), HartId::E51);
    }

    fn complete_handler(_m: &mut StateMachine<Boot>) {}

    fn run_e51(world: World, done: &AtomicBool) -> [Option<IpiStatusCode>; 4] {
        let ipi = world.ipi(HartId::E51, &REGISTRY);
        let mut poll = ipi_poll_service(ipi);
        enable(&mut poll, HartMask::ALL_U54);
        let mut boot = StateMachine::new(
            "boot_service",
            &BOOT_STATES,
            IDLE,
            Boot {
                ipi,
                requests: [None; 4],
                results: [None; 4],
            },
        )
        .with_debug(true);

        let config = SchedulerConfig {
            poll_ipi: false,
            debug_loop_times: true,
            loop_times_threshold: 10_000,
            ..Default::default()
        };
        let clock = world.soc.hart(HartId::E51);
        let mut scheduler = Scheduler::new(&clock, Some(ipi), config);
        while boot.state() != COMPLETE {
            world.check_timeout();
            scheduler.run_state_machines(&mut [&mut poll, &mut boot]);
            world.soc.advance(1);
            std::thread::yield_now();
        }
        // One more pass runs the entry hook of the final state.
        scheduler.run_state_machines(&mut [&mut poll, &mut boot]);
        done.store(true, Ordering::Release);

        assert!(scheduler.execution_count() > 3);
        dump_state_machine_stats(&[&poll, &boot]);
        assert_eq!(boot.stats().state_name, "Complete");
        ipi.debug_dump_stats();
        boot.instance.results
    }

    fn run_u54(world: World, me: HartId, done: &AtomicBool) -> u32 {
        let ipi = world.ipi(me, &REGISTRY);
        let mut interrupts = 0;
        while !done.load(Ordering::Acquire) {
            world.check_timeout();
            if world.soc.doorbell(me) || ipi.poll_receive(HartMask::E51) {
                if handle_ipi(ipi) {
                    interrupts += 1;
                }
            }
            let tx_id = BOOT_PENDING[me.index()].swap(0, Ordering::AcqRel);
            if tx_id != 0 {
                // Boot work finished; report completion.
                ipi.send(
                    HartId::E51,
                    MsgType::AckComplete,
                    TxId(tx_id),
                    IpiStatusCode::Success.into(),
                    BufferRef::NULL,
                    BufferRef::NULL,
                )
                .unwrap();
            }
            std::thread::yield_now();
        }
        interrupts
    }

    #[test]
    fn test_boot_all_application_harts() {
        init_logging();
        let world = World::new();
        let done = AtomicBool::new(false);

        let (results, interrupts) = std::thread::scope(|s| {
            let done = &done;
            let u54s: Vec<_> = HartId::ALL[1..]
                .iter()
                .map(|hart| {
                    let hart = *hart;
                    s.spawn(move || run_u54(world, hart, done))
                })
                .collect();
            let results = s.spawn(move || run_e51(world, done)).join().unwrap();
            let interrupts: Vec<u32> = u54s.into_iter().map(|h| h.join().unwrap()).collect();
            (results, interrupts)
        });

        assert_eq!(results, [Some(IpiStatusCode::Success); 4]);
        assert_eq!(interrupts, vec![1; 4]);
        for hart in &HartId::ALL[1..] {
            let stats = world.data.stats(*hart);
            assert_eq!(stats.consume_intents, 1);
            // ACK_PENDING from the service loop plus the final ACK_COMPLETE.
            assert_eq!(stats.ipi_sends, 2);
        }
        let e51 = world.data.stats(HartId::E51);
        assert_eq!(e51.allocs, 4);
        assert_eq!(e51.frees, 4);
        assert_eq!(e51.consume_intents, 8);
    }
}
