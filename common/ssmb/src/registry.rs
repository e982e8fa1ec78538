// Licensed under the Apache-2.0 license

use crate::{Ipi, IpiMessage, IpiStatusCode, MsgType, MSG_TYPE_COUNT};
use hss_platform::HartId;
use log::{debug, info};

/// Service entry point for one message type. Receives the bus of the hart it
/// runs on, the sending hart and the consumed message.
pub type IpiHandlerFn = fn(&Ipi<'_>, HartId, &IpiMessage) -> IpiStatusCode;

#[derive(Clone, Copy)]
pub struct IpiHandler {
    pub msg_type: MsgType,
    pub handler: Option<IpiHandlerFn>,
}

/// Static table from message type to handler, indexed by wire value.
#[derive(Clone, Copy)]
pub struct HandlerRegistry {
    entries: [IpiHandler; MSG_TYPE_COUNT],
}

impl HandlerRegistry {
    /// A registry with no handlers, not even for acknowledgments.
    pub const fn empty() -> Self {
        let mut entries = [IpiHandler {
            msg_type: MsgType::NoMessage,
            handler: None,
        }; MSG_TYPE_COUNT];
        let mut i = 0;
        while i < MSG_TYPE_COUNT {
            entries[i].msg_type = MsgType::ALL[i];
            i += 1;
        }
        Self { entries }
    }

    /// A registry with the generic acknowledgment handlers installed.
    pub const fn new() -> Self {
        Self::empty()
            .register(MsgType::AckPending, ack_pending_handler)
            .register(MsgType::AckComplete, ack_complete_handler)
    }

    pub const fn register(mut self, msg_type: MsgType, handler: IpiHandlerFn) -> Self {
        self.entries[msg_type as usize].handler = Some(handler);
        self
    }

    pub fn lookup(&self, msg_type: MsgType) -> Option<IpiHandlerFn> {
        let entry = &self.entries[msg_type as usize];
        assert_eq!(entry.msg_type, msg_type, "handler registry out of order");
        entry.handler
    }

    pub fn entries(&self) -> &[IpiHandler] {
        &self.entries
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves the completion record of the acknowledged request with the final
/// status carried in `immediate_arg`.
pub fn ack_complete_handler(ipi: &Ipi<'_>, source: HartId, msg: &IpiMessage) -> IpiStatusCode {
    let status = match IpiStatusCode::try_from(msg.immediate_arg) {
        Ok(IpiStatusCode::Success) => IpiStatusCode::Success,
        _ => IpiStatusCode::Fail,
    };
    if !ipi.message_update_status(msg.tx_id, status) {
        debug!("ACK_COMPLETE from {} for unknown transaction {}", source, msg.tx_id);
    }
    IpiStatusCode::Success
}

/// The peer accepted the request and is still working on it. The completion
/// record stays pending until the matching ACK_COMPLETE arrives.
pub fn ack_pending_handler(_ipi: &Ipi<'_>, source: HartId, msg: &IpiMessage) -> IpiStatusCode {
    debug!("ACK_PENDING from {} for transaction {}", source, msg.tx_id);
    IpiStatusCode::Idle
}

/// Placeholder for message types that are routed but have no service on
/// this image.
pub fn null_ipi_handler(_ipi: &Ipi<'_>, source: HartId, msg: &IpiMessage) -> IpiStatusCode {
    info!("{} from {} ignored (no service)", msg.msg_type, source);
    IpiStatusCode::Success
}
