// Licensed under the Apache-2.0 license

use crate::{HartId, Platform, StaticRef, TickSource, Ticks};
use hss_config::NUM_HARTS;
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::register_structs;
use tock_registers::registers::{ReadOnly, ReadWrite};

pub const CLINT_BASE: usize = 0x0200_0000;

register_structs! {
    /// Core-local interruptor. One MSIP word and one `mtimecmp` per hart,
    /// plus the shared `mtime` counter.
    pub ClintRegisters {
        (0x0000 => pub msip: [ReadWrite<u32>; NUM_HARTS]),
        (0x0014 => _reserved0),
        (0x4000 => pub mtimecmp: [ReadWrite<u64>; NUM_HARTS]),
        (0x4028 => _reserved1),
        (0xbff8 => pub mtime: ReadOnly<u64>),
        (0xc000 => @END),
    }
}

/// Platform backed by the CLINT. Doorbells are MSIP writes and the tick
/// source is `mtime`.
pub struct ClintPlatform {
    registers: StaticRef<ClintRegisters>,
    hart_id: fn() -> HartId,
}

impl ClintPlatform {
    pub const fn new(registers: StaticRef<ClintRegisters>, hart_id: fn() -> HartId) -> Self {
        Self {
            registers,
            hart_id,
        }
    }

    /// The CLINT at its fixed address on PolarFire SoC.
    ///
    /// # Safety
    ///
    /// Only valid when running on the target, where the CLINT is mapped at
    /// [`CLINT_BASE`].
    pub const unsafe fn mpfs(hart_id: fn() -> HartId) -> Self {
        Self::new(
            StaticRef::new(CLINT_BASE as *const ClintRegisters),
            hart_id,
        )
    }

    pub fn set_timer_compare(&self, hart: HartId, deadline: Ticks) {
        self.registers.mtimecmp[hart.index()].set(deadline);
    }

    pub fn doorbell_raised(&self, hart: HartId) -> bool {
        self.registers.msip[hart.index()].get() & 1 != 0
    }
}

impl TickSource for ClintPlatform {
    fn tick_count(&self) -> Ticks {
        self.registers.mtime.get()
    }
}

impl Platform for ClintPlatform {
    fn current_hart(&self) -> HartId {
        (self.hart_id)()
    }

    fn raise_doorbell(&self, target: HartId) {
        self.registers.msip[target.index()].set(1);
    }

    fn clear_doorbell(&self, target: HartId) {
        self.registers.msip[target.index()].set(0);
    }
}

/// Reads `mhartid`. A hart index outside the CPU complex is unrecoverable.
#[cfg(target_arch = "riscv64")]
pub fn mhartid() -> HartId {
    let id: usize;
    unsafe {
        core::arch::asm!("csrr {0}, mhartid", out(reg) id);
    }
    match HartId::from_index(id) {
        Some(hart) => hart,
        None => crate::fatal_error(0x4841_5254),
    }
}
