// Licensed under the Apache-2.0 license

//! Service that keeps acknowledgments from selected harts flowing when the
//! scheduler's own drain is turned off.

use hss_platform::HartMask;
use hss_ssmb::Ipi;
use hss_state_machine::{drain_acks, StateDesc, StateId, StateMachine};

pub const IPI_POLL_INITIALIZATION: StateId = 0;
pub const IPI_POLL_MONITORING: StateId = 1;

pub struct IpiPoll {
    ipi: &'static Ipi<'static>,
    mask: HartMask,
}

impl IpiPoll {
    pub fn mask(&self) -> HartMask {
        self.mask
    }
}

pub type IpiPollService = StateMachine<IpiPoll>;

static IPI_POLL_STATES: [StateDesc<IpiPoll>; 2] = [
    StateDesc {
        state: IPI_POLL_INITIALIZATION,
        name: "Init",
        on_entry: None,
        on_exit: None,
        handler: init_handler,
    },
    StateDesc {
        state: IPI_POLL_MONITORING,
        name: "Monitoring",
        on_entry: None,
        on_exit: None,
        handler: monitoring_handler,
    },
];

pub fn ipi_poll_service(ipi: &'static Ipi<'static>) -> IpiPollService {
    StateMachine::new(
        "ipi_poll_service",
        &IPI_POLL_STATES,
        IPI_POLL_INITIALIZATION,
        IpiPoll {
            ipi,
            mask: HartMask::empty(),
        },
    )
    .with_debug(true)
}

fn init_handler(machine: &mut IpiPollService) {
    machine.instance.mask = HartMask::ALL_U54;
    machine.set_state(IPI_POLL_MONITORING);
}

fn monitoring_handler(machine: &mut IpiPollService) {
    let IpiPoll { ipi, mask } = machine.instance;
    drain_acks(ipi, mask);
}

/// Starts polling the harts in `mask`, skipping the init state.
pub fn enable(service: &mut IpiPollService, mask: HartMask) {
    service.instance.mask.insert(mask);
    service.set_state(IPI_POLL_MONITORING);
}
