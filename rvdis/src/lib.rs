// rvdis - RV32IM ELF disassembler
//
// This library turns the code section of a 32-bit RISC-V ELF object into an
// assembly listing annotated with symbol names, inventing LOC_ labels for
// branch and jump targets the symbol table does not name.
//
// # Architecture
//
// 1. **ELF Parsing** (`elf.rs`): Validate the object, extract the code
//    section and symbol table
// 2. **Field Extraction** (`bits.rs`): Pull opcode/register/immediate fields
//    out of instruction words
// 3. **Decoding** (`disasm.rs`): Classify words into opcodes and operands
// 4. **Label Scan** (`listing.rs`, pass 1): Collect unnamed branch targets
// 5. **Listing** (`listing.rs` pass 2, `resolve.rs`, `render.rs`): Decode
//    every word again and render annotated lines
//
// # Output
//
//   00010074: <_start>          addi sp, sp, -16
//   00010078:                   jal ra, 12    #0x00010084 <LOC_0x00010084>
//
// followed by a `Symtable:` dump of every symbol (`symtab.rs`).

pub mod bits;
pub mod disasm;
pub mod elf;
pub mod error;
pub mod listing;
pub mod reg;
pub mod render;
pub mod resolve;
pub mod symtab;

pub use disasm::{decode, Instruction, Opcode, Operand};
pub use elf::{CodeSection, ElfInfo, SectionInfo};
pub use error::{Error, Result};
pub use listing::{disassemble, scan_labels, Listing};
pub use reg::{register_name, Reg};
pub use resolve::{resolve, DisplayLabel, LabelSet, SymbolLookup};
pub use symtab::{Symbol, SymbolTable};

/// Name of the section disassembled by default
pub const DEFAULT_SECTION: &str = ".text";

/// Output options
#[derive(Debug, Clone)]
pub struct Options {
    /// Code section to disassemble
    pub section: String,
    /// Append the symbol table dump after the listing
    pub symtab: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            section: DEFAULT_SECTION.to_string(),
            symtab: true,
        }
    }
}

/// Disassemble an RV32 ELF object into listing text
pub fn dump(elf_data: &[u8], options: &Options) -> Result<String> {
    // Parse and validate ELF
    let elf_info = elf::parse(elf_data)?;

    // Extract the code section
    let code = elf::extract_code_section(elf_data, &elf_info, &options.section)?;

    // Both passes
    let labels = elf_info.labels_for(&options.section);
    let listing = listing::disassemble(&code, &*labels)?;

    let mut out = listing.to_string();
    if options.symtab {
        out.push_str(&symtab::dump(&elf_info.symbols));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::testelf::ElfBuilder;

    #[test]
    fn test_dump_sample_program() {
        // jal zero, +8; addi ra, zero, 5; jalr zero, ra, 0
        let data = ElfBuilder::new(0, &[0x0080_006f, 0x0050_0093, 0x0000_8067]).build();
        let out = dump(&data, &Options::default()).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert!(lines[0].starts_with("00000000: "));
        assert!(lines[0].ends_with("\tjal zero, 8\t#0x00000008 <LOC_0x00000008>"));
        assert!(lines[1].ends_with("\taddi ra, zero, 5"));
        assert_eq!(lines[2], "00000008: <LOC_0x00000008>\tjalr zero, ra, 0");
        assert_eq!(lines[3], "Symtable:");
        // header row + null symbol
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_dump_with_symbols() {
        let data = ElfBuilder::new(0x10074, &[0x0080_00ef, 0x0000_8067, 0x0000_8067])
            .func("_start", 0x10074)
            .func("exit", 0x1007c)
            .build();
        let options = Options {
            symtab: false,
            ..Options::default()
        };
        let out = dump(&data, &options).unwrap();
        assert_eq!(
            out,
            "00010074: <_start>\tjal ra, 8\t#0x0001007C <exit>\n\
             00010078:         \tjalr zero, ra, 0\n\
             0001007C: <exit>  \tjalr zero, ra, 0\n"
        );
    }

    #[test]
    fn test_dump_missing_section_is_fatal() {
        let data = ElfBuilder::new(0, &[0x13]).text_name(".boot").build();
        let err = dump(&data, &Options::default()).unwrap_err();
        assert!(matches!(err, Error::MissingSection { .. }));
        assert!(!err.is_internal());
    }

    #[test]
    fn test_dump_other_section() {
        let data = ElfBuilder::new(0x80, &[0x0000_0073]).text_name(".init").build();
        let options = Options {
            section: ".init".to_string(),
            symtab: false,
        };
        assert_eq!(dump(&data, &options).unwrap(), "00000080: \tecall\n");
    }

    #[test]
    fn test_dump_trailing_bytes_ignored() {
        let data = ElfBuilder::new(0, &[0x0000_0073]).extra_bytes(&[0x13, 0x00]).build();
        let options = Options {
            symtab: false,
            ..Options::default()
        };
        assert_eq!(dump(&data, &options).unwrap(), "00000000: \tecall\n");
    }
}
