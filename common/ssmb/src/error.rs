// Licensed under the Apache-2.0 license

use hss_platform::HartId;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpiError {
    #[error("outbox queue {index} full")]
    QueueFull { index: usize },
    #[error("invalid target hart {0}")]
    InvalidTarget(HartId),
    #[error("NO_MESSAGE cannot be sent")]
    InvalidMessage,
    #[error("completion record {0} not allocated")]
    NotAllocated(usize),
    #[error("completion pool exhausted")]
    PoolExhausted,
    #[error("completion index {0} out of range")]
    InvalidIndex(usize),
}
