// Licensed under the Apache-2.0 license

use bitflags::bitflags;
use core::fmt;
use hss_config::NUM_HARTS;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Hart identifiers on the PolarFire SoC CPU complex. The E51 monitor core
/// runs the hart software services; the four U54 cores run application code.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, IntoPrimitive, TryFromPrimitive,
)]
pub enum HartId {
    E51 = 0,
    U54_1 = 1,
    U54_2 = 2,
    U54_3 = 3,
    U54_4 = 4,
}

impl HartId {
    pub const ALL: [HartId; NUM_HARTS] = [
        HartId::E51,
        HartId::U54_1,
        HartId::U54_2,
        HartId::U54_3,
        HartId::U54_4,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<HartId> {
        Self::ALL.get(index).copied()
    }

    pub const fn mask(self) -> HartMask {
        HartMask::from_bits_truncate(1 << self as u32)
    }

    pub const fn is_application(self) -> bool {
        !matches!(self, HartId::E51)
    }

    pub const fn name(self) -> &'static str {
        match self {
            HartId::E51 => "E51",
            HartId::U54_1 => "U54_1",
            HartId::U54_2 => "U54_2",
            HartId::U54_3 => "U54_3",
            HartId::U54_4 => "U54_4",
        }
    }
}

impl fmt::Display for HartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Set of harts, one bit per hart index.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HartMask: u32 {
        const E51 = 1 << 0;
        const U54_1 = 1 << 1;
        const U54_2 = 1 << 2;
        const U54_3 = 1 << 3;
        const U54_4 = 1 << 4;
        const ALL_U54 = Self::U54_1.bits()
            | Self::U54_2.bits()
            | Self::U54_3.bits()
            | Self::U54_4.bits();
        const ALL = Self::E51.bits() | Self::ALL_U54.bits();
    }
}

impl HartMask {
    pub fn contains_hart(self, hart: HartId) -> bool {
        self.contains(hart.mask())
    }

    /// Harts in the mask, in ascending index order.
    pub fn harts(self) -> impl Iterator<Item = HartId> {
        HartId::ALL.into_iter().filter(move |h| self.contains_hart(*h))
    }
}

impl From<HartId> for HartMask {
    fn from(hart: HartId) -> Self {
        hart.mask()
    }
}
