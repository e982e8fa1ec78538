// Licensed under the Apache-2.0 license

#![cfg_attr(target_arch = "riscv64", no_std)]

//! Build-time sizing of the hart software services and the runtime knobs of
//! the super-loop and the message bus.

/// Number of harts taking part in the message bus: the E51 monitor core and
/// the four U54 application cores.
pub const NUM_HARTS: usize = 5;

/// Number of directed outbox queues, one per ordered (source, target) pair.
pub const IPI_NUM_QUEUES: usize = NUM_HARTS * (NUM_HARTS - 1);

/// Message slots in each outbox queue.
pub const IPI_MAX_NUM_QUEUE_MESSAGES: usize = 16;

/// Completion records owned by each hart.
pub const IPI_MAX_NUM_OUTSTANDING_COMPLETES: usize = IPI_MAX_NUM_QUEUE_MESSAGES * (NUM_HARTS - 1);

/// Layout version stamped into the shared IPI store at initialization.
pub const IPI_VERSION: u32 = 0x0101;

/// Configures the cooperative super-loop.
/// These are the defaults that can be overridden by the firmware image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Poll the message bus and drain acknowledgments before stepping machines.
    pub poll_ipi: bool,
    /// Report loop times every `loop_times_threshold` passes and whenever a
    /// new maximum is seen.
    pub debug_loop_times: bool,
    pub loop_times_threshold: u64,
    /// Dump the per-hart IPI counters alongside loop-time reports.
    pub debug_ipi_stats: bool,
    /// Log state transitions of machines that have their debug flag set.
    pub log_state_transitions: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            poll_ipi: true,
            debug_loop_times: false,
            loop_times_threshold: 1000,
            debug_ipi_stats: false,
            log_state_transitions: true,
        }
    }
}

/// Configures the message bus.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IpiConfig {
    /// Trace every message sent and consumed.
    pub trace_messages: bool,
}
