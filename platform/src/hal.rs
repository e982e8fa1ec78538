// Licensed under the Apache-2.0 license

use crate::{HartId, TickSource};
use portable_atomic::{fence, Ordering};

/// Per-hart view of the SoC services the message bus and the scheduler rely
/// on: a tick counter, the identity of the running hart, and the software
/// interrupt doorbells.
pub trait Platform: TickSource {
    fn current_hart(&self) -> HartId;

    /// Raise the machine software interrupt of `target`.
    fn raise_doorbell(&self, target: HartId);

    /// Acknowledge the machine software interrupt of `target`.
    fn clear_doorbell(&self, target: HartId);

    /// Full barrier separating reads of a peer's queue contents from the
    /// doorbell or sequence counter that announced them.
    fn memory_barrier(&self) {
        fence(Ordering::SeqCst);
    }
}
