// render.rs - Listing line formatting
//
// Line layout:
//   XXXXXXXX: <prefix>\t<mnemonic> <operands>\t#<target>
// The prefix column is padded to a width chosen by the caller.

use crate::disasm::{Instruction, Operand};
use crate::resolve::DisplayLabel;
use std::fmt;

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Operand::Reg(reg) => write!(f, "{}", reg),
            Operand::Imm(imm) => write!(f, "{}", imm),
            Operand::UpperImm(imm) => write!(f, "0x{:x}", imm),
            Operand::Mem { base, offset } => write!(f, "{}({})", offset, base),
            Operand::Target { offset, .. } => write!(f, "{}", offset),
            Operand::Csr(csr) => write!(f, "0x{:x}", csr),
            Operand::FenceSet(set) => f.write_str(&fence_set(set)),
            Operand::Word(word) => write!(f, "0x{:08x}", word),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        for (i, op) in self.operands.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, op)?;
        }
        Ok(())
    }
}

/// Letters of a FENCE ordering set, `0` when empty
fn fence_set(set: u8) -> String {
    let s: String = [(8u8, 'i'), (4, 'o'), (2, 'r'), (1, 'w')]
        .iter()
        .filter(|&&(bit, _)| set & bit != 0)
        .map(|&(_, c)| c)
        .collect();
    if s.is_empty() {
        "0".to_string()
    } else {
        s
    }
}

/// Format one listing line.
///
/// `prefix` is the label of the instruction's own address, padded to
/// `width` columns; `target` is the resolved JAL/branch destination.
pub fn render_line(
    inst: &Instruction,
    prefix: Option<&str>,
    width: usize,
    target: Option<&DisplayLabel<'_>>,
) -> String {
    let mut line = format!(
        "{:08X}: {:<width$}\t{}",
        inst.addr,
        prefix.unwrap_or(""),
        inst,
        width = width
    );
    if let Some(target) = target {
        line.push_str(&format!("\t#{}", target));
    }
    line
}
