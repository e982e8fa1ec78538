// Licensed under the Apache-2.0 license

use crate::data::bump;
use crate::{
    BufferRef, CompletionRecord, HandlerRegistry, IpiData, IpiError, IpiMessage, IpiStatusCode,
    MsgType, OutboxQueue, TxId,
};
use hss_config::{IpiConfig, NUM_HARTS};
use hss_platform::{HartId, HartMask, Platform};
use log::{error, info, trace, warn};
use portable_atomic::Ordering;

/// Index of a record in the calling hart's completion pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionIndex(pub usize);

/// One hart's handle on the shared message bus.
pub struct Ipi<'a> {
    data: &'a IpiData,
    platform: &'a dyn Platform,
    registry: &'a HandlerRegistry,
    config: IpiConfig,
}

impl<'a> Ipi<'a> {
    pub const fn new(
        data: &'a IpiData,
        platform: &'a dyn Platform,
        registry: &'a HandlerRegistry,
        config: IpiConfig,
    ) -> Self {
        Self {
            data,
            platform,
            registry,
            config,
        }
    }

    /// Outbox index of the ordered pair (source, target). Pairs with
    /// `source == target` have no queue.
    pub const fn queue_index(source: HartId, target: HartId) -> usize {
        let source = source as usize;
        let target = target as usize;
        let index = source * (NUM_HARTS - 1) + target;
        if target > source {
            index - 1
        } else {
            index
        }
    }

    pub fn hart(&self) -> HartId {
        self.platform.current_hart()
    }

    pub fn platform(&self) -> &'a dyn Platform {
        self.platform
    }

    pub fn data(&self) -> &'a IpiData {
        self.data
    }

    /// Places a message in the outbox towards `target` and rings its doorbell.
    /// A full outbox is reported and left to the caller to retry.
    pub fn send(
        &self,
        target: HartId,
        msg_type: MsgType,
        tx_id: TxId,
        immediate_arg: u32,
        extended: BufferRef,
        ancillary: BufferRef,
    ) -> Result<(), IpiError> {
        let source = self.hart();
        if target == source {
            return Err(IpiError::InvalidTarget(target));
        }
        if msg_type == MsgType::NoMessage {
            return Err(IpiError::InvalidMessage);
        }

        let index = Self::queue_index(source, target);
        let Some(slot) = self.data.queues[index].first_free() else {
            error!(
                "{}->{} queue {} full, dropping {} (tx {})",
                source, target, index, msg_type, tx_id
            );
            return Err(IpiError::QueueFull { index });
        };

        slot.publish(&IpiMessage {
            msg_type,
            tx_id,
            immediate_arg,
            extended,
            ancillary,
        });
        let last = &self.data.last[index];
        last.store(last.load(Ordering::Relaxed).wrapping_add(1), Ordering::Release);
        self.platform.raise_doorbell(target);
        bump(&self.data.stats[source.index()].ipi_sends);

        if self.config.trace_messages {
            trace!(
                "{}->{} {} tx {} imm {:#x} ext {:#x} anc {:#x}",
                source,
                target,
                msg_type,
                tx_id,
                immediate_arg,
                extended.0,
                ancillary.0
            );
        }
        Ok(())
    }

    /// Refreshes the pending count of each inbound queue whose sender has
    /// sent since the last poll. Returns true if any queue changed.
    pub fn poll_receive(&self, mask: HartMask) -> bool {
        let me = self.hart();
        let mut changed = false;
        for source in mask.harts().filter(|source| *source != me) {
            let index = Self::queue_index(source, me);
            let last = self.data.last[index].load(Ordering::Acquire);
            let shadow = &self.data.shadow[index];
            if last != shadow.load(Ordering::Relaxed) {
                shadow.store(last, Ordering::Relaxed);
                let queue = &self.data.queues[index];
                queue.count.store(queue.occupied(), Ordering::Relaxed);
                changed = true;
            }
        }
        changed
    }

    /// Takes the first message of `msg_type` from `source` and hands it to the
    /// registered handler, replying with an acknowledgment unless the message
    /// is itself one or the handler returned `Idle`. Messages of a type with no
    /// handler are discarded.
    pub fn consume_intent(&self, source: HartId, msg_type: MsgType) -> bool {
        let me = self.hart();
        if source == me || msg_type == MsgType::NoMessage {
            return false;
        }
        let index = Self::queue_index(source, me);
        let queue = &self.data.queues[index];
        self.platform.memory_barrier();

        let handler = self.registry.lookup(msg_type);
        let Some(handler) = handler else {
            self.discard_unhandled(queue, source, msg_type);
            return false;
        };

        let Some(slot) = queue.slots.iter().find(|slot| slot.holds(msg_type)) else {
            return false;
        };
        let Some(msg) = slot.read() else {
            return false;
        };

        if self.config.trace_messages {
            trace!("{}<-{} {} tx {}", me, source, msg_type, msg.tx_id);
        }
        bump(&self.data.stats[me.index()].consume_intents);
        let result = handler(self, source, &msg);

        if !msg_type.is_ack() {
            let reply = match result {
                IpiStatusCode::Success => Some((MsgType::AckComplete, IpiStatusCode::Success)),
                IpiStatusCode::Fail => Some((MsgType::AckComplete, IpiStatusCode::Fail)),
                IpiStatusCode::Pending => Some((MsgType::AckPending, IpiStatusCode::Pending)),
                IpiStatusCode::Idle => None,
            };
            if let Some((ack, status)) = reply {
                // Failure is already logged by send.
                let _ = self.send(
                    source,
                    ack,
                    msg.tx_id,
                    status.into(),
                    BufferRef::NULL,
                    BufferRef::NULL,
                );
            }
        }

        slot.clear();
        queue.release_one();
        true
    }

    fn discard_unhandled(&self, queue: &OutboxQueue, source: HartId, msg_type: MsgType) {
        for slot in queue.slots.iter().filter(|slot| slot.holds(msg_type)) {
            error!(
                "no handler for {} from {}, force clearing",
                msg_type, source
            );
            slot.clear();
            queue.release_one();
        }
    }

    fn own_pool(&self) -> &'a [CompletionRecord] {
        &self.data.completions[self.hart().index()]
    }

    fn own_record(&self, index: CompletionIndex) -> Result<&'a CompletionRecord, IpiError> {
        let record = self
            .own_pool()
            .get(index.0)
            .ok_or(IpiError::InvalidIndex(index.0))?;
        if !record.is_used() {
            return Err(IpiError::NotAllocated(index.0));
        }
        Ok(record)
    }

    /// Reserves a completion record for a new request and assigns it this
    /// hart's next transaction id.
    pub fn message_alloc(&self) -> Result<CompletionIndex, IpiError> {
        let me = self.hart();
        let Some((index, record)) = self
            .own_pool()
            .iter()
            .enumerate()
            .find(|(_, record)| !record.is_used())
        else {
            warn!("{} completion pool exhausted", me);
            return Err(IpiError::PoolExhausted);
        };

        let next = &self.data.next_tx_id[me.index()];
        let tx_id = TxId(next.load(Ordering::Relaxed));
        next.store(tx_id.next().0, Ordering::Relaxed);

        record.tx_id.store(tx_id.0, Ordering::Relaxed);
        record.set_status(IpiStatusCode::Pending);
        record.used.store(true, Ordering::Relaxed);
        bump(&self.data.stats[me.index()].allocs);
        Ok(CompletionIndex(index))
    }

    /// Sends a request tracked by an allocated completion record.
    pub fn message_deliver(
        &self,
        index: CompletionIndex,
        target: HartId,
        msg_type: MsgType,
        immediate_arg: u32,
        extended: BufferRef,
        ancillary: BufferRef,
    ) -> Result<(), IpiError> {
        let record = self.own_record(index)?;
        self.send(
            target,
            msg_type,
            record.tx_id(),
            immediate_arg,
            extended,
            ancillary,
        )?;
        bump(&self.data.stats[self.hart().index()].delivers);
        Ok(())
    }

    /// Records the outcome of this hart's request `tx_id`. Returns false if no
    /// outstanding request carries that id.
    pub fn message_update_status(&self, tx_id: TxId, status: IpiStatusCode) -> bool {
        if tx_id.is_none() {
            return false;
        }
        match self
            .own_pool()
            .iter()
            .find(|record| record.is_used() && record.tx_id() == tx_id)
        {
            Some(record) => {
                record.set_status(status);
                true
            }
            None => false,
        }
    }

    pub fn message_check_if_complete(&self, index: CompletionIndex) -> bool {
        self.message_status(index)
            .is_some_and(|status| status != IpiStatusCode::Pending)
    }

    pub fn message_status(&self, index: CompletionIndex) -> Option<IpiStatusCode> {
        self.own_record(index).ok().map(CompletionRecord::status)
    }

    pub fn message_tx_id(&self, index: CompletionIndex) -> Option<TxId> {
        self.own_record(index).ok().map(CompletionRecord::tx_id)
    }

    pub fn message_free(&self, index: CompletionIndex) -> Result<(), IpiError> {
        let record = self.own_record(index).inspect_err(|err| {
            error!("{}: freeing completion {}: {}", self.hart(), index.0, err);
        })?;
        record.used.store(false, Ordering::Relaxed);
        record.set_status(IpiStatusCode::Idle);
        bump(&self.data.stats[self.hart().index()].frees);
        Ok(())
    }

    pub fn queue_pending_count(&self, index: usize) -> u32 {
        self.data.queue(index).map_or(0, OutboxQueue::count)
    }

    /// The transaction id the next `message_alloc` on this hart will assign.
    pub fn debug_get_tx_id(&self) -> TxId {
        TxId(self.data.next_tx_id[self.hart().index()].load(Ordering::Relaxed))
    }

    pub fn debug_dump_stats(&self) {
        info!("IPI layout version {:#06x}", self.data.version());
        for hart in HartId::ALL {
            let stats = self.data.stats(hart);
            info!(
                "{:>5}: allocs {} delivers {} frees {} consumed {} sent {}",
                hart.name(),
                stats.allocs,
                stats.delivers,
                stats.frees,
                stats.consume_intents,
                stats.ipi_sends
            );
        }
    }
}
