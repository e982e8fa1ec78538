// Licensed under the Apache-2.0 license

use crate::Machine;
use hss_config::{SchedulerConfig, IPI_MAX_NUM_QUEUE_MESSAGES};
use hss_platform::{HartMask, TickSource, Ticks};
use hss_ssmb::{Ipi, MsgType};
use log::{info, warn};

/// The per-hart super-loop driver.
pub struct Scheduler<'a> {
    clock: &'a dyn TickSource,
    ipi: Option<&'a Ipi<'a>>,
    config: SchedulerConfig,
    loop_count: u64,
    max_loop_time: Ticks,
}

impl<'a> Scheduler<'a> {
    pub fn new(clock: &'a dyn TickSource, ipi: Option<&'a Ipi<'a>>, config: SchedulerConfig) -> Self {
        Self {
            clock,
            ipi,
            config,
            loop_count: 0,
            max_loop_time: 0,
        }
    }

    /// One super-loop pass: drain acknowledgments, then step every machine
    /// once in slice order.
    pub fn run_state_machines(&mut self, machines: &mut [&mut dyn Machine]) {
        let start = self.clock.tick_count();

        if self.config.poll_ipi {
            if let Some(ipi) = self.ipi {
                drain_acks(ipi, HartMask::ALL);
            }
        }

        for machine in machines.iter_mut() {
            machine.step(self.clock, self.config.log_state_transitions);
        }
        self.loop_count += 1;

        let end = self.clock.tick_count();
        if self.config.debug_loop_times || self.config.debug_ipi_stats {
            self.report_loop_time(end.wrapping_sub(start));
        }
    }

    fn report_loop_time(&mut self, delta: Ticks) {
        let max_exceeded = delta > self.max_loop_time;
        if max_exceeded {
            self.max_loop_time = delta;
        }
        let threshold = self.config.loop_times_threshold;
        let dump =
            self.config.debug_loop_times && threshold != 0 && self.loop_count % threshold == 0;
        if !(dump || max_exceeded) {
            return;
        }

        if self.config.debug_ipi_stats {
            if let Some(ipi) = self.ipi {
                ipi.debug_dump_stats();
            }
        }
        if self.config.debug_loop_times {
            let plural = |n: Ticks| if n == 1 { "" } else { "s" };
            if dump {
                info!(
                    "loop {} took {} tick{} (max {} tick{})",
                    self.loop_count,
                    delta,
                    plural(delta),
                    self.max_loop_time,
                    plural(self.max_loop_time)
                );
            } else {
                warn!(
                    "loop {} took {} tick{} (max {} tick{})",
                    self.loop_count,
                    delta,
                    plural(delta),
                    self.max_loop_time,
                    plural(self.max_loop_time)
                );
            }
        }
    }

    /// Number of completed super-loop passes.
    pub fn execution_count(&self) -> u64 {
        self.loop_count
    }

    pub fn max_loop_time(&self) -> Ticks {
        self.max_loop_time
    }
}

/// Consumes the acknowledgments waiting from the peers in `mask` so completion
/// records resolve without any service having to ask for them.
pub fn drain_acks(ipi: &Ipi<'_>, mask: HartMask) {
    let me = ipi.hart();
    ipi.poll_receive(mask);
    for peer in mask.harts().filter(|peer| *peer != me) {
        if ipi.queue_pending_count(Ipi::queue_index(peer, me)) == 0 {
            continue;
        }
        for ack in [MsgType::AckComplete, MsgType::AckPending] {
            for _ in 0..IPI_MAX_NUM_QUEUE_MESSAGES {
                if !ipi.consume_intent(peer, ack) {
                    break;
                }
            }
        }
    }
}
