// Licensed under the Apache-2.0 license

use hss_platform::{TickSource, Ticks};
use log::{debug, info};

pub type StateId = usize;

pub type StateFn<D> = fn(&mut StateMachine<D>);

/// One row of a machine's state table. Row `n` must describe state `n`.
pub struct StateDesc<D: 'static> {
    pub state: StateId,
    pub name: &'static str,
    pub on_entry: Option<StateFn<D>>,
    pub on_exit: Option<StateFn<D>>,
    pub handler: StateFn<D>,
}

/// A state machine: its constant state table plus run state, timing
/// statistics and service-owned instance data.
pub struct StateMachine<D: 'static> {
    state: StateId,
    prev_state: Option<StateId>,
    name: &'static str,
    descs: &'static [StateDesc<D>],
    start_time: Ticks,
    last_execution_time: Ticks,
    last_delta_execution_time: Ticks,
    max_execution_time: Ticks,
    max_state: Option<StateId>,
    execution_count: u64,
    pub debug_flag: bool,
    /// Informational. Machines run in the order they are handed to the
    /// scheduler.
    pub priority: u8,
    pub instance: D,
}

impl<D: 'static> StateMachine<D> {
    pub const fn new(
        name: &'static str,
        descs: &'static [StateDesc<D>],
        initial_state: StateId,
        instance: D,
    ) -> Self {
        Self {
            state: initial_state,
            prev_state: None,
            name,
            descs,
            start_time: 0,
            last_execution_time: 0,
            last_delta_execution_time: 0,
            max_execution_time: 0,
            max_state: None,
            execution_count: 0,
            debug_flag: false,
            priority: 0,
            instance,
        }
    }

    pub const fn with_debug(mut self, debug_flag: bool) -> Self {
        self.debug_flag = debug_flag;
        self
    }

    pub const fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    /// Moves to `state`. Exit and entry hooks run at the start of the next
    /// step.
    pub fn set_state(&mut self, state: StateId) {
        self.state = state;
    }

    /// `None` until the first step.
    pub fn prev_state(&self) -> Option<StateId> {
        self.prev_state
    }

    /// Steps taken in the current state, reset on every transition.
    pub fn execution_count(&self) -> u64 {
        self.execution_count
    }

    /// Tick at which the current state was entered.
    pub fn start_time(&self) -> Ticks {
        self.start_time
    }

    pub fn num_states(&self) -> usize {
        self.descs.len()
    }

    fn state_name(&self, state: StateId) -> &'static str {
        self.descs.get(state).map_or("<invalid>", |desc| desc.name)
    }

    fn desc(&self, state: StateId) -> &'static StateDesc<D> {
        let descs = self.descs;
        assert!(
            state < descs.len(),
            "{}: state {} out of range",
            self.name,
            state
        );
        let desc = &descs[state];
        assert_eq!(desc.state, state, "{}: state table out of order", self.name);
        desc
    }
}

/// Snapshot of a machine's run state and timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineStats {
    pub name: &'static str,
    pub state: StateId,
    pub state_name: &'static str,
    pub prev_state: Option<StateId>,
    pub execution_count: u64,
    pub start_time: Ticks,
    pub last_execution_time: Ticks,
    pub last_delta_execution_time: Ticks,
    pub max_execution_time: Ticks,
    pub max_state: Option<StateId>,
    pub priority: u8,
}

/// Object-safe view of a state machine so machines with different instance
/// data can share one scheduler array.
pub trait Machine {
    fn name(&self) -> &'static str;

    /// Runs pending exit/entry hooks and one step of the current state.
    fn step(&mut self, clock: &dyn TickSource, log_transitions: bool);

    fn stats(&self) -> MachineStats;
}

impl<D: 'static> Machine for StateMachine<D> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn step(&mut self, clock: &dyn TickSource, log_transitions: bool) {
        let current = self.state;
        let desc = self.desc(current);

        let entry = clock.tick_count();
        self.last_execution_time = entry;

        if self.prev_state != Some(current) {
            if let Some(prev) = self.prev_state.filter(|prev| *prev < self.descs.len()) {
                if let Some(on_exit) = self.desc(prev).on_exit {
                    on_exit(self);
                }
            }
            if let Some(on_entry) = desc.on_entry {
                on_entry(self);
            }
            self.start_time = entry;
            self.execution_count = 0;
            self.prev_state = Some(current);
        }

        (desc.handler)(self);
        self.execution_count += 1;

        let exit = clock.tick_count();
        self.last_delta_execution_time = exit.wrapping_sub(entry);
        if self.last_delta_execution_time > self.max_execution_time {
            self.max_execution_time = self.last_delta_execution_time;
            self.max_state = self.prev_state;
        }

        if log_transitions && self.debug_flag && self.state != current {
            debug!(
                "{} :: {} -> {}",
                self.name,
                desc.name,
                self.state_name(self.state)
            );
        }
    }

    fn stats(&self) -> MachineStats {
        MachineStats {
            name: self.name,
            state: self.state,
            state_name: self.state_name(self.state),
            prev_state: self.prev_state,
            execution_count: self.execution_count,
            start_time: self.start_time,
            last_execution_time: self.last_execution_time,
            last_delta_execution_time: self.last_delta_execution_time,
            max_execution_time: self.max_execution_time,
            max_state: self.max_state,
            priority: self.priority,
        }
    }
}

/// Steps a single machine outside the scheduler.
pub fn run_state_machine(machine: &mut dyn Machine, clock: &dyn TickSource) {
    machine.step(clock, true);
}

pub fn dump_state_machine_stats(machines: &[&dyn Machine]) {
    info!(" State Machine Name: Max Exec Time / State : Last Delta Time / Current State");
    for machine in machines {
        let stats = machine.stats();
        let max_state = stats.max_state.map_or(-1, |state| state as i64);
        info!(
            "{:>19}: {:>13} / {:>5} : {:>15} / {:>5}",
            stats.name,
            stats.max_execution_time,
            max_state,
            stats.last_delta_execution_time,
            stats.state
        );
    }
}
