// reg.rs - RISC-V integer register names
//
// Registers are rendered by their standard ABI names, never x0-x31.

use std::fmt;

const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", //
    "s0", "s1", "a0", "a1", "a2", "a3", "a4", "a5", //
    "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", //
    "s8", "s9", "s10", "s11", "t3", "t4", "t5", "t6",
];

/// An integer register x0-x31
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reg(u8);

impl Reg {
    pub const ZERO: Reg = Reg(0);
    pub const RA: Reg = Reg(1);
    pub const SP: Reg = Reg(2);

    /// Build a register from a 5-bit field. Higher bits are masked off.
    pub fn new(index: u8) -> Self {
        Reg(index & 0x1f)
    }

    /// Register `index`, or None above x31
    pub fn checked(index: u8) -> Option<Self> {
        (usize::from(index) < ABI_NAMES.len()).then_some(Reg(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn name(self) -> &'static str {
        ABI_NAMES[self.0 as usize]
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// ABI name of register `index`, None outside 0-31
pub fn register_name(index: u8) -> Option<&'static str> {
    Reg::checked(index).map(Reg::name)
}
