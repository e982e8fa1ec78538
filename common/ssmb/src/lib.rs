// Licensed under the Apache-2.0 license

//! Secure software message bus: typed point-to-point mailboxes between the
//! five harts, carried in a shared store and signalled through the CLINT
//! software interrupt.

#![cfg_attr(target_arch = "riscv64", no_std)]

mod data;
mod error;
mod ipi;
mod registry;
mod types;

pub use data::*;
pub use error::IpiError;
pub use ipi::*;
pub use registry::*;
pub use types::*;
