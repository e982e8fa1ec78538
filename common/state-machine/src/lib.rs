// Licensed under the Apache-2.0 license

//! Cooperative super-loop: table-driven state machines stepped once per pass,
//! with the message bus acknowledgments drained before each pass.

#![cfg_attr(target_arch = "riscv64", no_std)]

mod init;
mod machine;
mod scheduler;

pub use init::*;
pub use machine::*;
pub use scheduler::*;
