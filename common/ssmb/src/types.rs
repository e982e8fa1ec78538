// Licensed under the Apache-2.0 license

use core::fmt;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Message kinds carried on the bus. The discriminants are the wire values
/// stored in a slot's `msg_type` word; `NoMessage` marks a free slot.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
pub enum MsgType {
    NoMessage = 0,
    BootRequest = 1,
    PmpSetup = 2,
    SpiXfer = 3,
    NetRxPoll = 4,
    NetTx = 5,
    ScatterGatherDma = 6,
    WdogInit = 7,
    GpioSet = 8,
    UartTx = 9,
    UartPollRx = 10,
    PowerMode = 11,
    FlashFreeze = 12,
    AckPending = 13,
    AckComplete = 14,
    Halt = 15,
    Continue = 16,
    Goto = 17,
    OpenSbiInit = 18,
    DdrTrain = 19,
}

pub const MSG_TYPE_COUNT: usize = MsgType::ALL.len();

impl MsgType {
    pub const ALL: [MsgType; 20] = [
        MsgType::NoMessage,
        MsgType::BootRequest,
        MsgType::PmpSetup,
        MsgType::SpiXfer,
        MsgType::NetRxPoll,
        MsgType::NetTx,
        MsgType::ScatterGatherDma,
        MsgType::WdogInit,
        MsgType::GpioSet,
        MsgType::UartTx,
        MsgType::UartPollRx,
        MsgType::PowerMode,
        MsgType::FlashFreeze,
        MsgType::AckPending,
        MsgType::AckComplete,
        MsgType::Halt,
        MsgType::Continue,
        MsgType::Goto,
        MsgType::OpenSbiInit,
        MsgType::DdrTrain,
    ];

    pub const fn is_ack(self) -> bool {
        matches!(self, MsgType::AckPending | MsgType::AckComplete)
    }

    pub const fn name(self) -> &'static str {
        match self {
            MsgType::NoMessage => "NO_MESSAGE",
            MsgType::BootRequest => "BOOT_REQUEST",
            MsgType::PmpSetup => "PMP_SETUP",
            MsgType::SpiXfer => "SPI_XFER",
            MsgType::NetRxPoll => "NET_RXPOLL",
            MsgType::NetTx => "NET_TX",
            MsgType::ScatterGatherDma => "SCATTERGATHER_DMA",
            MsgType::WdogInit => "WDOG_INIT",
            MsgType::GpioSet => "GPIO_SET",
            MsgType::UartTx => "UART_TX",
            MsgType::UartPollRx => "UART_POLL_RX",
            MsgType::PowerMode => "POWERMODE",
            MsgType::FlashFreeze => "FLASHFREEZE",
            MsgType::AckPending => "ACK_PENDING",
            MsgType::AckComplete => "ACK_COMPLETE",
            MsgType::Halt => "HALT",
            MsgType::Continue => "CONTINUE",
            MsgType::Goto => "GOTO",
            MsgType::OpenSbiInit => "OPENSBI_INIT",
            MsgType::DdrTrain => "DDR_TRAIN",
        }
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
pub enum IpiStatusCode {
    Fail = 0,
    Success = 1,
    Pending = 2,
    Idle = 3,
}

/// Transaction id correlating a request with its acknowledgment. Ids are
/// assigned per sending hart, start at 1 and never take the value 0, which
/// means "no transaction".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxId(pub u32);

impl TxId {
    pub const NONE: TxId = TxId(0);
    pub const FIRST: TxId = TxId(1);

    pub const fn next(self) -> TxId {
        match self.0.wrapping_add(1) {
            0 => TxId::FIRST,
            n => TxId(n),
        }
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of a payload held outside the queues, typically in DDR. The bus
/// carries the address only and never dereferences it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BufferRef(pub usize);

impl BufferRef {
    pub const NULL: BufferRef = BufferRef(0);

    pub fn from_ptr<T>(ptr: *const T) -> Self {
        BufferRef(ptr as usize)
    }

    pub fn as_ptr<T>(self) -> *const T {
        self.0 as *const T
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// A message as copied out of a queue slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpiMessage {
    pub msg_type: MsgType,
    pub tx_id: TxId,
    pub immediate_arg: u32,
    pub extended: BufferRef,
    pub ancillary: BufferRef,
}
