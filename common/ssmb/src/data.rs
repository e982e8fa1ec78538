// Licensed under the Apache-2.0 license

use crate::{BufferRef, IpiMessage, IpiStatusCode, MsgType, TxId};
use hss_config::{
    IPI_MAX_NUM_OUTSTANDING_COMPLETES, IPI_MAX_NUM_QUEUE_MESSAGES, IPI_NUM_QUEUES, IPI_VERSION,
    NUM_HARTS,
};
use portable_atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

// Every field below has exactly one writing hart. Counters are advanced with
// a load and a store rather than a read-modify-write.
pub(crate) fn bump(counter: &AtomicU32) {
    counter.store(counter.load(Ordering::Relaxed).wrapping_add(1), Ordering::Relaxed);
}

/// One mailbox entry. Written by the sending hart while free, cleared by the
/// receiving hart once consumed.
pub struct MessageSlot {
    msg_type: AtomicU32,
    tx_id: AtomicU32,
    immediate_arg: AtomicU32,
    extended: AtomicUsize,
    ancillary: AtomicUsize,
}

impl MessageSlot {
    pub const fn new() -> Self {
        Self {
            msg_type: AtomicU32::new(MsgType::NoMessage as u32),
            tx_id: AtomicU32::new(0),
            immediate_arg: AtomicU32::new(0),
            extended: AtomicUsize::new(0),
            ancillary: AtomicUsize::new(0),
        }
    }

    pub fn is_free(&self) -> bool {
        self.msg_type.load(Ordering::Acquire) == MsgType::NoMessage as u32
    }

    pub(crate) fn holds(&self, msg_type: MsgType) -> bool {
        self.msg_type.load(Ordering::Acquire) == msg_type as u32
    }

    /// Payload first, then the type word with release ordering. A reader that
    /// observes the type observes the whole message.
    pub(crate) fn publish(&self, msg: &IpiMessage) {
        self.tx_id.store(msg.tx_id.0, Ordering::Relaxed);
        self.immediate_arg.store(msg.immediate_arg, Ordering::Relaxed);
        self.extended.store(msg.extended.0, Ordering::Relaxed);
        self.ancillary.store(msg.ancillary.0, Ordering::Relaxed);
        self.msg_type.store(msg.msg_type as u32, Ordering::Release);
    }

    pub fn read(&self) -> Option<IpiMessage> {
        let msg_type = MsgType::try_from(self.msg_type.load(Ordering::Acquire)).ok()?;
        if msg_type == MsgType::NoMessage {
            return None;
        }
        Some(IpiMessage {
            msg_type,
            tx_id: TxId(self.tx_id.load(Ordering::Relaxed)),
            immediate_arg: self.immediate_arg.load(Ordering::Relaxed),
            extended: BufferRef(self.extended.load(Ordering::Relaxed)),
            ancillary: BufferRef(self.ancillary.load(Ordering::Relaxed)),
        })
    }

    pub(crate) fn clear(&self) {
        self.msg_type
            .store(MsgType::NoMessage as u32, Ordering::Release);
    }

    fn reset(&self) {
        self.tx_id.store(0, Ordering::Relaxed);
        self.immediate_arg.store(0, Ordering::Relaxed);
        self.extended.store(0, Ordering::Relaxed);
        self.ancillary.store(0, Ordering::Relaxed);
        self.clear();
    }
}

impl Default for MessageSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Outbox for one ordered (source, target) pair. `count` is owned by the
/// receiver and tracks occupied slots as of its last poll or consume.
pub struct OutboxQueue {
    pub slots: [MessageSlot; IPI_MAX_NUM_QUEUE_MESSAGES],
    pub(crate) count: AtomicU32,
}

impl OutboxQueue {
    pub const fn new() -> Self {
        Self {
            slots: [const { MessageSlot::new() }; IPI_MAX_NUM_QUEUE_MESSAGES],
            count: AtomicU32::new(0),
        }
    }

    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    pub(crate) fn first_free(&self) -> Option<&MessageSlot> {
        self.slots.iter().find(|slot| slot.is_free())
    }

    pub(crate) fn occupied(&self) -> u32 {
        self.slots.iter().filter(|slot| !slot.is_free()).count() as u32
    }

    pub(crate) fn release_one(&self) {
        let count = self.count.load(Ordering::Relaxed);
        self.count.store(count.saturating_sub(1), Ordering::Relaxed);
    }
}

impl Default for OutboxQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks one outstanding request of its owning hart.
pub struct CompletionRecord {
    pub(crate) used: AtomicBool,
    pub(crate) tx_id: AtomicU32,
    pub(crate) status: AtomicU32,
}

impl CompletionRecord {
    pub const fn new() -> Self {
        Self {
            used: AtomicBool::new(false),
            tx_id: AtomicU32::new(0),
            status: AtomicU32::new(IpiStatusCode::Idle as u32),
        }
    }

    pub fn is_used(&self) -> bool {
        self.used.load(Ordering::Relaxed)
    }

    pub fn tx_id(&self) -> TxId {
        TxId(self.tx_id.load(Ordering::Relaxed))
    }

    pub fn status(&self) -> IpiStatusCode {
        IpiStatusCode::try_from(self.status.load(Ordering::Relaxed))
            .unwrap_or(IpiStatusCode::Fail)
    }

    pub(crate) fn set_status(&self, status: IpiStatusCode) {
        self.status.store(status as u32, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.tx_id.store(0, Ordering::Relaxed);
        self.set_status(IpiStatusCode::Idle);
        self.used.store(false, Ordering::Relaxed);
    }
}

impl Default for CompletionRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-hart diagnostic counters.
#[derive(Default)]
pub struct HartStats {
    pub(crate) allocs: AtomicU32,
    pub(crate) delivers: AtomicU32,
    pub(crate) frees: AtomicU32,
    pub(crate) consume_intents: AtomicU32,
    pub(crate) ipi_sends: AtomicU32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HartStatsSnapshot {
    pub allocs: u32,
    pub delivers: u32,
    pub frees: u32,
    pub consume_intents: u32,
    pub ipi_sends: u32,
}

impl HartStats {
    pub const fn new() -> Self {
        Self {
            allocs: AtomicU32::new(0),
            delivers: AtomicU32::new(0),
            frees: AtomicU32::new(0),
            consume_intents: AtomicU32::new(0),
            ipi_sends: AtomicU32::new(0),
        }
    }

    pub fn snapshot(&self) -> HartStatsSnapshot {
        HartStatsSnapshot {
            allocs: self.allocs.load(Ordering::Relaxed),
            delivers: self.delivers.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
            consume_intents: self.consume_intents.load(Ordering::Relaxed),
            ipi_sends: self.ipi_sends.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        for counter in [
            &self.allocs,
            &self.delivers,
            &self.frees,
            &self.consume_intents,
            &self.ipi_sends,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// The store shared by all harts: outbox queues, per-hart completion pools,
/// per-queue sequence counters and per-hart statistics.
///
/// Ownership of each field:
/// * queue slots are filled by the source hart and cleared by the target hart;
/// * `count` and `shadow[q]` belong to the target of queue `q`;
/// * `last[q]` belongs to the source of queue `q`;
/// * `completions[h]`, `next_tx_id[h]` and `stats[h]` belong to hart `h`.
pub struct IpiData {
    version: AtomicU32,
    pub(crate) queues: [OutboxQueue; IPI_NUM_QUEUES],
    pub(crate) completions: [[CompletionRecord; IPI_MAX_NUM_OUTSTANDING_COMPLETES]; NUM_HARTS],
    pub(crate) last: [AtomicU32; IPI_NUM_QUEUES],
    pub(crate) shadow: [AtomicU32; IPI_NUM_QUEUES],
    pub(crate) next_tx_id: [AtomicU32; NUM_HARTS],
    pub(crate) stats: [HartStats; NUM_HARTS],
}

impl IpiData {
    pub const fn new() -> Self {
        Self {
            version: AtomicU32::new(IPI_VERSION),
            queues: [const { OutboxQueue::new() }; IPI_NUM_QUEUES],
            completions: [const {
                [const { CompletionRecord::new() }; IPI_MAX_NUM_OUTSTANDING_COMPLETES]
            }; NUM_HARTS],
            last: [const { AtomicU32::new(0) }; IPI_NUM_QUEUES],
            shadow: [const { AtomicU32::new(0) }; IPI_NUM_QUEUES],
            next_tx_id: [const { AtomicU32::new(TxId::FIRST.0) }; NUM_HARTS],
            stats: [const { HartStats::new() }; NUM_HARTS],
        }
    }

    /// Resets the store to its boot state. Run once by the boot hart before
    /// any other hart touches the bus.
    pub fn init(&self) {
        for queue in self.queues.iter() {
            queue.slots.iter().for_each(MessageSlot::reset);
            queue.count.store(0, Ordering::Relaxed);
        }
        self.completions
            .iter()
            .flatten()
            .for_each(CompletionRecord::reset);
        for counter in self.last.iter().chain(self.shadow.iter()) {
            counter.store(0, Ordering::Relaxed);
        }
        for next in self.next_tx_id.iter() {
            next.store(TxId::FIRST.0, Ordering::Relaxed);
        }
        self.stats.iter().for_each(HartStats::reset);
        self.version.store(IPI_VERSION, Ordering::Release);
    }

    pub fn version(&self) -> u32 {
        self.version.load(Ordering::Acquire)
    }

    pub fn queue(&self, index: usize) -> Option<&OutboxQueue> {
        self.queues.get(index)
    }

    pub fn stats(&self, hart: hss_platform::HartId) -> HartStatsSnapshot {
        self.stats[hart.index()].snapshot()
    }
}

impl Default for IpiData {
    fn default() -> Self {
        Self::new()
    }
}
