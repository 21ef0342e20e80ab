// disasm.rs - RISC-V disassembler
//
// Decodes RV32I/RV32M/Zicsr instruction words into structured form.
// Decoding is total: every 32-bit word yields an Instruction, with
// unrecognised encodings mapped to Opcode::Unknown.

use crate::bits;
use crate::reg::Reg;

// Major opcodes, bits [6:0]
const OP_LUI: u32 = 0b0110111;
const OP_AUIPC: u32 = 0b0010111;
const OP_JAL: u32 = 0b1101111;
const OP_JALR: u32 = 0b1100111;
const OP_BRANCH: u32 = 0b1100011;
const OP_LOAD: u32 = 0b0000011;
const OP_STORE: u32 = 0b0100011;
const OP_IMM: u32 = 0b0010011;
const OP_REG: u32 = 0b0110011;
const OP_FENCE: u32 = 0b0001111;
const OP_SYSTEM: u32 = 0b1110011;

const FUNCT7_BASE: u32 = 0b0000000;
const FUNCT7_ALT: u32 = 0b0100000;
const FUNCT7_MULDIV: u32 = 0b0000001;

/// A decoded RISC-V instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Virtual address
    pub addr: u32,
    /// Raw instruction word
    pub bits: u32,
    /// Decoded opcode
    pub opcode: Opcode,
    /// Operands in assembly order
    pub operands: Vec<Operand>,
}

/// One operand of a decoded instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Reg(Reg),
    /// Signed or small unsigned immediate, printed in decimal
    Imm(i32),
    /// Upper immediate (LUI/AUIPC), already shifted left by 12
    UpperImm(u32),
    /// `offset(base)` memory reference
    Mem { base: Reg, offset: i32 },
    /// PC-relative offset together with the absolute address it reaches
    Target { offset: i32, addr: u32 },
    /// CSR number
    Csr(u16),
    /// FENCE predecessor/successor set (bits: i, o, r, w)
    FenceSet(u8),
    /// Raw word of an unrecognised encoding
    Word(u32),
}

/// RISC-V opcodes (RV32IM + Zicsr)
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // RV32I Base
    LUI,
    AUIPC,
    JAL,
    JALR,
    BEQ,
    BNE,
    BLT,
    BGE,
    BLTU,
    BGEU,
    LB,
    LH,
    LW,
    LBU,
    LHU,
    SB,
    SH,
    SW,
    ADDI,
    SLTI,
    SLTIU,
    XORI,
    ORI,
    ANDI,
    SLLI,
    SRLI,
    SRAI,
    ADD,
    SUB,
    SLL,
    SLT,
    SLTU,
    XOR,
    SRL,
    SRA,
    OR,
    AND,
    FENCE,
    FENCE_I,
    ECALL,
    EBREAK,

    // Zicsr
    CSRRW,
    CSRRS,
    CSRRC,
    CSRRWI,
    CSRRSI,
    CSRRCI,

    // RV32M (Multiply)
    MUL,
    MULH,
    MULHSU,
    MULHU,
    DIV,
    DIVU,
    REM,
    REMU,

    // Unknown/unsupported
    Unknown,
}

impl Opcode {
    /// Assembly mnemonic
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::LUI => "lui",
            Opcode::AUIPC => "auipc",
            Opcode::JAL => "jal",
            Opcode::JALR => "jalr",
            Opcode::BEQ => "beq",
            Opcode::BNE => "bne",
            Opcode::BLT => "blt",
            Opcode::BGE => "bge",
            Opcode::BLTU => "bltu",
            Opcode::BGEU => "bgeu",
            Opcode::LB => "lb",
            Opcode::LH => "lh",
            Opcode::LW => "lw",
            Opcode::LBU => "lbu",
            Opcode::LHU => "lhu",
            Opcode::SB => "sb",
            Opcode::SH => "sh",
            Opcode::SW => "sw",
            Opcode::ADDI => "addi",
            Opcode::SLTI => "slti",
            Opcode::SLTIU => "sltiu",
            Opcode::XORI => "xori",
            Opcode::ORI => "ori",
            Opcode::ANDI => "andi",
            Opcode::SLLI => "slli",
            Opcode::SRLI => "srli",
            Opcode::SRAI => "srai",
            Opcode::ADD => "add",
            Opcode::SUB => "sub",
            Opcode::SLL => "sll",
            Opcode::SLT => "slt",
            Opcode::SLTU => "sltu",
            Opcode::XOR => "xor",
            Opcode::SRL => "srl",
            Opcode::SRA => "sra",
            Opcode::OR => "or",
            Opcode::AND => "and",
            Opcode::FENCE => "fence",
            Opcode::FENCE_I => "fence.i",
            Opcode::ECALL => "ecall",
            Opcode::EBREAK => "ebreak",
            Opcode::CSRRW => "csrrw",
            Opcode::CSRRS => "csrrs",
            Opcode::CSRRC => "csrrc",
            Opcode::CSRRWI => "csrrwi",
            Opcode::CSRRSI => "csrrsi",
            Opcode::CSRRCI => "csrrci",
            Opcode::MUL => "mul",
            Opcode::MULH => "mulh",
            Opcode::MULHSU => "mulhsu",
            Opcode::MULHU => "mulhu",
            Opcode::DIV => "div",
            Opcode::DIVU => "divu",
            Opcode::REM => "rem",
            Opcode::REMU => "remu",
            Opcode::Unknown => "unknown",
        }
    }

    /// Is this a conditional branch?
    pub fn is_branch(&self) -> bool {
        matches!(
            self,
            Opcode::BEQ | Opcode::BNE | Opcode::BLT | Opcode::BGE | Opcode::BLTU | Opcode::BGEU
        )
    }

    /// Does this instruction carry a statically known target address?
    pub fn has_target(&self) -> bool {
        self.is_branch() || *self == Opcode::JAL
    }
}

impl Instruction {
    /// Absolute target of a JAL or branch
    pub fn target(&self) -> Option<u32> {
        self.operands.iter().find_map(|op| match op {
            Operand::Target { addr, .. } => Some(*addr),
            _ => None,
        })
    }

    pub fn is_unknown(&self) -> bool {
        self.opcode == Opcode::Unknown
    }
}

/// Decode a 32-bit RISC-V instruction located at `addr`
pub fn decode(addr: u32, inst: u32) -> Instruction {
    let rd = Operand::Reg(Reg::new(bits::rd(inst)));
    let rs1 = Operand::Reg(Reg::new(bits::rs1(inst)));
    let rs2 = Operand::Reg(Reg::new(bits::rs2(inst)));
    let funct3 = bits::funct3(inst);
    let funct7 = bits::funct7(inst);

    let (opcode, operands) = match bits::opcode(inst) {
        OP_LUI => (Opcode::LUI, vec![rd, Operand::UpperImm(bits::imm_u(inst))]),
        OP_AUIPC => (Opcode::AUIPC, vec![rd, Operand::UpperImm(bits::imm_u(inst))]),
        OP_JAL => (Opcode::JAL, vec![rd, target(addr, bits::imm_j(inst))]),
        OP_JALR if funct3 == 0 => (
            Opcode::JALR,
            vec![rd, rs1, Operand::Imm(bits::imm_i(inst))],
        ),
        OP_BRANCH => match branch_opcode(funct3) {
            Opcode::Unknown => unknown(inst),
            op => (op, vec![rs1, rs2, target(addr, bits::imm_b(inst))]),
        },
        OP_LOAD => {
            let op = match funct3 {
                0 => Opcode::LB,
                1 => Opcode::LH,
                2 => Opcode::LW,
                4 => Opcode::LBU,
                5 => Opcode::LHU,
                _ => return unknown_at(addr, inst),
            };
            (op, vec![rd, mem(inst, bits::imm_i(inst))])
        }
        OP_STORE => {
            let op = match funct3 {
                0 => Opcode::SB,
                1 => Opcode::SH,
                2 => Opcode::SW,
                _ => return unknown_at(addr, inst),
            };
            (op, vec![rs2, mem(inst, bits::imm_s(inst))])
        }
        OP_IMM => {
            let (op, imm) = match funct3 {
                0 => (Opcode::ADDI, bits::imm_i(inst)),
                1 => (Opcode::SLLI, bits::shamt(inst) as i32),
                2 => (Opcode::SLTI, bits::imm_i(inst)),
                3 => (Opcode::SLTIU, bits::imm_i_raw(inst) as i32),
                4 => (Opcode::XORI, bits::imm_i(inst)),
                5 if funct7 == FUNCT7_ALT => (Opcode::SRAI, bits::shamt(inst) as i32),
                5 => (Opcode::SRLI, bits::shamt(inst) as i32),
                6 => (Opcode::ORI, bits::imm_i(inst)),
                _ => (Opcode::ANDI, bits::imm_i(inst)),
            };
            (op, vec![rd, rs1, Operand::Imm(imm)])
        }
        OP_REG => {
            let op = match (funct7, funct3) {
                (FUNCT7_BASE, 0) => Opcode::ADD,
                (FUNCT7_ALT, 0) => Opcode::SUB,
                (FUNCT7_BASE, 1) => Opcode::SLL,
                (FUNCT7_BASE, 2) => Opcode::SLT,
                (FUNCT7_BASE, 3) => Opcode::SLTU,
                (FUNCT7_BASE, 4) => Opcode::XOR,
                (FUNCT7_BASE, 5) => Opcode::SRL,
                (FUNCT7_ALT, 5) => Opcode::SRA,
                (FUNCT7_BASE, 6) => Opcode::OR,
                (FUNCT7_BASE, 7) => Opcode::AND,
                // M extension
                (FUNCT7_MULDIV, 0) => Opcode::MUL,
                (FUNCT7_MULDIV, 1) => Opcode::MULH,
                (FUNCT7_MULDIV, 2) => Opcode::MULHSU,
                (FUNCT7_MULDIV, 3) => Opcode::MULHU,
                (FUNCT7_MULDIV, 4) => Opcode::DIV,
                (FUNCT7_MULDIV, 5) => Opcode::DIVU,
                (FUNCT7_MULDIV, 6) => Opcode::REM,
                (FUNCT7_MULDIV, 7) => Opcode::REMU,
                _ => return unknown_at(addr, inst),
            };
            (op, vec![rd, rs1, rs2])
        }
        OP_FENCE if funct3 == 1 => (Opcode::FENCE_I, Vec::new()),
        OP_FENCE => {
            let imm = bits::imm_i_raw(inst);
            let pred = ((imm >> 4) & 0xf) as u8;
            let succ = (imm & 0xf) as u8;
            (
                Opcode::FENCE,
                vec![Operand::FenceSet(pred), Operand::FenceSet(succ)],
            )
        }
        OP_SYSTEM => {
            let csr = Operand::Csr(bits::imm_i_raw(inst) as u16);
            let zimm = Operand::Imm(bits::rs1(inst) as i32);
            match funct3 {
                0 => match bits::imm_i_raw(inst) {
                    0 => (Opcode::ECALL, Vec::new()),
                    1 => (Opcode::EBREAK, Vec::new()),
                    _ => unknown(inst),
                },
                1 => (Opcode::CSRRW, vec![rd, csr, rs1]),
                2 => (Opcode::CSRRS, vec![rd, csr, rs1]),
                3 => (Opcode::CSRRC, vec![rd, csr, rs1]),
                5 => (Opcode::CSRRWI, vec![rd, csr, zimm]),
                6 => (Opcode::CSRRSI, vec![rd, csr, zimm]),
                7 => (Opcode::CSRRCI, vec![rd, csr, zimm]),
                _ => unknown(inst),
            }
        }
        _ => unknown(inst),
    };

    Instruction {
        addr,
        bits: inst,
        opcode,
        operands,
    }
}

/// Target of a JAL or conditional branch at `addr`, without a full decode.
///
/// Agrees with `decode(addr, inst).target()` for every word.
pub fn branch_target(addr: u32, inst: u32) -> Option<u32> {
    let offset = match bits::opcode(inst) {
        OP_JAL => bits::imm_j(inst),
        OP_BRANCH if branch_opcode(bits::funct3(inst)) != Opcode::Unknown => bits::imm_b(inst),
        _ => return None,
    };
    Some(addr.wrapping_add(offset as u32))
}

fn branch_opcode(funct3: u32) -> Opcode {
    match funct3 {
        0 => Opcode::BEQ,
        1 => Opcode::BNE,
        4 => Opcode::BLT,
        5 => Opcode::BGE,
        6 => Opcode::BLTU,
        7 => Opcode::BGEU,
        _ => Opcode::Unknown,
    }
}

fn target(addr: u32, offset: i32) -> Operand {
    Operand::Target {
        offset,
        addr: addr.wrapping_add(offset as u32),
    }
}

fn mem(inst: u32, offset: i32) -> Operand {
    Operand::Mem {
        base: Reg::new(bits::rs1(inst)),
        offset,
    }
}

fn unknown(inst: u32) -> (Opcode, Vec<Operand>) {
    (Opcode::Unknown, vec![Operand::Word(inst)])
}

fn unknown_at(addr: u32, inst: u32) -> Instruction {
    let (opcode, operands) = unknown(inst);
    Instruction {
        addr,
        bits: inst,
        opcode,
        operands,
    }
}
