// Licensed under the Apache-2.0 license

#![cfg_attr(target_arch = "riscv64", no_std)]
#![allow(static_mut_refs)]

mod clint;
pub use clint::*;
mod hal;
pub use hal::*;
mod hart;
pub use hart::*;
mod logger;
pub use logger::*;
mod static_ref;
pub use static_ref::*;
mod time;
pub use time::*;

// Helpers to handle writing to the debug UART.

use core::fmt::{Display, Write};

pub static mut WRITER: Option<&'static mut dyn Write> = None;
pub static mut EXITER: Option<&'static mut dyn Exit> = None;

/// Sets the global backing writer for the `println` macro.
pub fn set_printer(writer: &'static mut dyn Write) {
    unsafe {
        WRITER = Some(writer);
    }
}

#[macro_export]
macro_rules! println {
    ($($arg:tt)*) => {
        if let Some(writer) = unsafe { $crate::WRITER.as_mut() } {
            let _ = core::fmt::Write::write_fmt(writer, format_args!($($arg)*));
            let _ = core::fmt::Write::write_str(writer, "\r\n");
        }
    };
}

pub struct HexBytes<'a>(pub &'a [u8]);
impl Display for HexBytes<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for &x in self.0.iter() {
            for c in [x >> 4, x & 0xf] {
                if c < 10 {
                    f.write_char((c + b'0') as char)?;
                } else {
                    f.write_char((c - 10 + b'A') as char)?;
                }
            }
        }
        Ok(())
    }
}

pub struct HexWord(pub u32);
impl Display for HexWord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        HexBytes(&self.0.to_be_bytes()).fmt(f)
    }
}

/// Board hook used to stop a hart that hit an unrecoverable condition.
pub trait Exit {
    fn exit(&mut self, code: u32);
}

pub fn set_exiter(exiter: &'static mut dyn Exit) {
    unsafe {
        EXITER = Some(exiter);
    }
}

/// Halts the calling hart. There is no recovery path below the hart software
/// services, so this never returns.
#[inline(never)]
pub fn fatal_error(code: u32) -> ! {
    println!("fatal error 0x{}", HexWord(code));
    unsafe {
        if let Some(exiter) = EXITER.as_mut() {
            exiter.exit(code);
        }
    }
    #[allow(clippy::empty_loop)]
    loop {}
}
