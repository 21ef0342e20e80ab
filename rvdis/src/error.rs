// error.rs - Error types
//
// Everything except `Internal` means the input file is unusable.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed ELF: {0}")]
    Malformed(#[from] goblin::error::Error),

    #[error("not a 32-bit ELF object (EI_CLASS={class})")]
    NotElf32 { class: u8 },

    #[error("not a RISC-V object (e_machine=0x{machine:x})")]
    NotRiscV { machine: u16 },

    #[error("big-endian ELF objects are not supported")]
    BigEndian,

    #[error("section `{name}` not found")]
    MissingSection { name: String },

    #[error("section `{name}` has no contents in the file")]
    NoFileData { name: String },

    #[error("section `{name}` (offset 0x{offset:x}, size 0x{size:x}) lies outside the {file_len}-byte file")]
    SectionOutOfBounds {
        name: String,
        offset: u64,
        size: u64,
        file_len: usize,
    },

    #[error("section `{name}` at 0x{addr:x} (size 0x{size:x}) does not fit a 32-bit address space")]
    AddressOverflow { name: String, addr: u64, size: u64 },

    #[error("internal decoder fault at 0x{address:08X}: {reason}")]
    Internal { address: u32, reason: &'static str },
}

impl Error {
    /// True for faults in the disassembler itself rather than its input
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Internal { .. })
    }
}
