// Licensed under the Apache-2.0 license

//! Host model of the SoC services the hart software services run on, so
//! harts can be played by threads in tests.

use hss_config::NUM_HARTS;
use hss_platform::{HartId, Platform, TickSource, Ticks};
use portable_atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Doorbells, barrier counter and a shared tick counter.
pub struct SimSoc {
    doorbells: [AtomicBool; NUM_HARTS],
    ticks: AtomicU64,
    tick_step: AtomicU64,
    barriers: AtomicU32,
}

impl SimSoc {
    pub const fn new() -> Self {
        Self {
            doorbells: [const { AtomicBool::new(false) }; NUM_HARTS],
            ticks: AtomicU64::new(0),
            tick_step: AtomicU64::new(0),
            barriers: AtomicU32::new(0),
        }
    }

    /// The view of the SoC from `hart`.
    pub fn hart(&self, hart: HartId) -> SimHart<'_> {
        SimHart { soc: self, hart }
    }

    pub fn doorbell(&self, hart: HartId) -> bool {
        self.doorbells[hart.index()].load(Ordering::Acquire)
    }

    pub fn ticks(&self) -> Ticks {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn advance(&self, ticks: Ticks) {
        self.ticks.fetch_add(ticks, Ordering::Relaxed);
    }

    /// Make every tick read advance time by `step`, so that timed sections
    /// have a non-zero duration.
    pub fn set_tick_step(&self, step: Ticks) {
        self.tick_step.store(step, Ordering::Relaxed);
    }

    pub fn barrier_count(&self) -> u32 {
        self.barriers.load(Ordering::Relaxed)
    }
}

impl Default for SimSoc {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SimHart<'a> {
    soc: &'a SimSoc,
    hart: HartId,
}

impl SimHart<'_> {
    pub fn id(&self) -> HartId {
        self.hart
    }

    pub fn soc(&self) -> &SimSoc {
        self.soc
    }
}

impl TickSource for SimHart<'_> {
    fn tick_count(&self) -> Ticks {
        let step = self.soc.tick_step.load(Ordering::Relaxed);
        self.soc.ticks.fetch_add(step, Ordering::Relaxed)
    }
}

impl Platform for SimHart<'_> {
    fn current_hart(&self) -> HartId {
        self.hart
    }

    fn raise_doorbell(&self, target: HartId) {
        self.soc.doorbells[target.index()].store(true, Ordering::Release);
    }

    fn clear_doorbell(&self, target: HartId) {
        self.soc.doorbells[target.index()].store(false, Ordering::Release);
    }

    fn memory_barrier(&self) {
        self.soc.barriers.fetch_add(1, Ordering::Relaxed);
        portable_atomic::fence(Ordering::SeqCst);
    }
}
