// Licensed under the Apache-2.0 license

/// Machine timer ticks. The PolarFire `mtime` counter runs at 1 MHz.
pub type Ticks = u64;

pub const TICKS_PER_MILLISEC: Ticks = 1000;
pub const TICKS_PER_SEC: Ticks = 1000 * TICKS_PER_MILLISEC;

pub trait TickSource {
    /// Current value of the free-running tick counter.
    fn tick_count(&self) -> Ticks;

    /// True once more than `duration` ticks have passed since `start`.
    fn is_elapsed(&self, start: Ticks, duration: Ticks) -> bool {
        self.tick_count().wrapping_sub(start) > duration
    }
}
