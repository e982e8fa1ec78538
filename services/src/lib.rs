// Licensed under the Apache-2.0 license

#![cfg_attr(target_arch = "riscv64", no_std)]

pub mod ipi_poll;
pub mod u54_ipi;

pub use ipi_poll::{ipi_poll_service, IpiPoll, IpiPollService};
pub use u54_ipi::handle_ipi;
