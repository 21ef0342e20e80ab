// bits.rs - RISC-V instruction field extraction
//
// Fixed-position fields shared by every base format, plus the immediate
// reassembly for the I/S/B/U/J layouts.

/// Opcode field, bits [6:0]
pub fn opcode(inst: u32) -> u32 {
    inst & 0x7f
}

/// Destination register, bits [11:7]
pub fn rd(inst: u32) -> u8 {
    ((inst >> 7) & 0x1f) as u8
}

/// funct3, bits [14:12]
pub fn funct3(inst: u32) -> u32 {
    (inst >> 12) & 0x7
}

/// First source register, bits [19:15]
pub fn rs1(inst: u32) -> u8 {
    ((inst >> 15) & 0x1f) as u8
}

/// Second source register, bits [24:20]
pub fn rs2(inst: u32) -> u8 {
    ((inst >> 20) & 0x1f) as u8
}

/// funct7, bits [31:25]
pub fn funct7(inst: u32) -> u32 {
    (inst >> 25) & 0x7f
}

/// Raw 12-bit I-type immediate field, bits [31:20], not sign-extended
pub fn imm_i_raw(inst: u32) -> u32 {
    inst >> 20
}

/// Sign-extend `value`, whose sign bit is bit `sign_bit`.
///
/// Bits above `sign_bit` are ignored. If the sign bit is set the result is
/// `value - 2^(sign_bit + 1)`, otherwise `value` unchanged.
pub fn sign_extend(value: u32, sign_bit: u32) -> i32 {
    debug_assert!(sign_bit < 32);
    let width = sign_bit + 1;
    let value = if width == 32 {
        value as u64
    } else {
        (value & ((1u32 << width) - 1)) as u64
    };

    if value & (1 << sign_bit) != 0 {
        (value as i64 - (1i64 << width)) as i32
    } else {
        value as i32
    }
}

/// I-type immediate: inst[31:20], sign-extended from bit 11
pub fn imm_i(inst: u32) -> i32 {
    sign_extend(imm_i_raw(inst), 11)
}

/// S-type immediate: {inst[31:25], inst[11:7]}, sign-extended from bit 11
pub fn imm_s(inst: u32) -> i32 {
    let imm11_5 = (inst >> 25) & 0x7f;
    let imm4_0 = (inst >> 7) & 0x1f;
    sign_extend((imm11_5 << 5) | imm4_0, 11)
}

/// B-type immediate: {inst[31], inst[7], inst[30:25], inst[11:8], 0},
/// sign-extended from bit 12
pub fn imm_b(inst: u32) -> i32 {
    let imm12 = (inst >> 31) & 0x1;
    let imm11 = (inst >> 7) & 0x1;
    let imm10_5 = (inst >> 25) & 0x3f;
    let imm4_1 = (inst >> 8) & 0xf;

    let imm = (imm12 << 12) | (imm11 << 11) | (imm10_5 << 5) | (imm4_1 << 1);
    sign_extend(imm, 12)
}

/// J-type immediate: {inst[31], inst[19:12], inst[20], inst[30:21], 0},
/// sign-extended from bit 20
pub fn imm_j(inst: u32) -> i32 {
    let imm20 = (inst >> 31) & 0x1;
    let imm19_12 = (inst >> 12) & 0xff;
    let imm11 = (inst >> 20) & 0x1;
    let imm10_1 = (inst >> 21) & 0x3ff;

    let imm = (imm20 << 20) | (imm19_12 << 12) | (imm11 << 11) | (imm10_1 << 1);
    sign_extend(imm, 20)
}

/// U-type immediate: inst[31:12] << 12, unsigned
pub fn imm_u(inst: u32) -> u32 {
    inst & 0xffff_f000
}

/// Shift amount for SLLI/SRLI/SRAI, inst[24:20]
pub fn shamt(inst: u32) -> u32 {
    (inst >> 20) & 0x1f
}
