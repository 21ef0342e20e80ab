// elf.rs - ELF object parsing for RV32 objects
//
// Uses goblin for parsing, validates class/machine/endianness up front and
// extracts the code section and symbol table.

use crate::error::{Error, Result};
use crate::symtab::{Binding, Symbol, SymbolKind, SymbolTable, Visibility};
use goblin::elf::{header, section_header, Elf};
use goblin::strtab::Strtab;
use std::borrow::Cow;

/// Information about a parsed ELF object
#[derive(Debug, Clone)]
pub struct ElfInfo {
    pub entry: u32,
    pub is_pie: bool,
    /// ET_REL: symbol values are offsets into their own section
    pub is_relocatable: bool,
    pub sections: Vec<SectionInfo>,
    pub symbols: SymbolTable,
}

/// A section header, with its name resolved
#[derive(Debug, Clone)]
pub struct SectionInfo {
    pub name: String,
    pub addr: u64,
    pub offset: u64,
    pub size: u64,
    pub sh_type: u32,
}

/// A code section to disassemble
#[derive(Debug, Clone)]
pub struct CodeSection {
    pub name: String,
    pub vaddr: u32,
    pub data: Vec<u8>,
}

impl ElfInfo {
    /// First section header named `name`
    pub fn find_section(&self, name: &str) -> Option<&SectionInfo> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Symbols used to label section `name`
    pub fn labels_for(&self, name: &str) -> Cow<'_, SymbolTable> {
        let index = self.sections.iter().position(|s| s.name == name);
        match index.and_then(|i| u16::try_from(i).ok()) {
            Some(index) if self.is_relocatable => Cow::Owned(self.symbols.in_section(index)),
            _ => Cow::Borrowed(&self.symbols),
        }
    }
}

impl CodeSection {
    /// Build a code section, rejecting ranges that run past 4 GiB
    pub fn new(name: impl Into<String>, vaddr: u64, data: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let size = data.len() as u64;
        let vaddr = match vaddr.checked_add(size) {
            Some(end) if end <= 1 << 32 => vaddr as u32,
            _ => return Err(Error::AddressOverflow { name, addr: vaddr, size }),
        };
        Ok(Self { name, vaddr, data })
    }

    /// Number of complete 32-bit words
    pub fn word_count(&self) -> usize {
        self.data.len() / 4
    }

    /// Bytes after the last complete word; these are never decoded
    pub fn trailing_bytes(&self) -> usize {
        self.data.len() % 4
    }

    /// Virtual address of word `index`
    pub fn addr_of(&self, index: usize) -> u32 {
        self.vaddr.wrapping_add((index as u32).wrapping_mul(4))
    }

    /// Little-endian word at `index`, None past the last complete word
    pub fn word_at(&self, index: usize) -> Option<u32> {
        let start = index.checked_mul(4)?;
        let bytes = self.data.get(start..start.checked_add(4)?)?;
        Some(u32::from_le_bytes(bytes.try_into().ok()?))
    }
}

/// Parse an ELF object and check it is a little-endian RV32 object
pub fn parse(data: &[u8]) -> Result<ElfInfo> {
    let hdr = Elf::parse_header(data)?;

    let class = hdr.e_ident[header::EI_CLASS];
    if class != header::ELFCLASS32 {
        return Err(Error::NotElf32 { class });
    }
    if hdr.e_machine != header::EM_RISCV {
        return Err(Error::NotRiscV {
            machine: hdr.e_machine,
        });
    }
    if hdr.e_ident[header::EI_DATA] != header::ELFDATA2LSB {
        return Err(Error::BigEndian);
    }

    let elf = Elf::parse(data)?;

    let sections = elf
        .section_headers
        .iter()
        .map(|sh| SectionInfo {
            name: elf.shdr_strtab.get_at(sh.sh_name).unwrap_or("").to_string(),
            addr: sh.sh_addr,
            offset: sh.sh_offset,
            size: sh.sh_size,
            sh_type: sh.sh_type,
        })
        .collect();

    // Prefer the full symbol table; stripped objects may only have .dynsym
    let symbols = if !elf.syms.is_empty() {
        convert_symbols(elf.syms.iter(), &elf.strtab)
    } else {
        convert_symbols(elf.dynsyms.iter(), &elf.dynstrtab)
    };

    Ok(ElfInfo {
        // goblin widens ELF32 fields to u64; they always fit back
        entry: elf.entry as u32,
        is_pie: elf.header.e_type == header::ET_DYN,
        is_relocatable: elf.header.e_type == header::ET_REL,
        sections,
        symbols,
    })
}

fn convert_symbols(
    syms: impl Iterator<Item = goblin::elf::Sym>,
    strtab: &Strtab<'_>,
) -> SymbolTable {
    let symbols = syms
        .map(|sym| Symbol {
            name: strtab.get_at(sym.st_name).unwrap_or("").to_string(),
            value: sym.st_value as u32,
            size: sym.st_size as u32,
            kind: SymbolKind::from_raw(sym.st_type()),
            binding: Binding::from_raw(sym.st_bind()),
            visibility: Visibility::from_raw(sym.st_visibility()),
            shndx: sym.st_shndx as u16,
        })
        .collect();
    SymbolTable::new(symbols)
}

/// Extract the named section's bytes as a code section
pub fn extract_code_section(data: &[u8], info: &ElfInfo, name: &str) -> Result<CodeSection> {
    let section = info
        .find_section(name)
        .ok_or_else(|| Error::MissingSection {
            name: name.to_string(),
        })?;

    if section.sh_type == section_header::SHT_NOBITS {
        return Err(Error::NoFileData {
            name: name.to_string(),
        });
    }

    let out_of_bounds = || Error::SectionOutOfBounds {
        name: name.to_string(),
        offset: section.offset,
        size: section.size,
        file_len: data.len(),
    };
    let start = usize::try_from(section.offset).map_err(|_| out_of_bounds())?;
    let len = usize::try_from(section.size).map_err(|_| out_of_bounds())?;
    let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
    let bytes = data.get(start..end).ok_or_else(out_of_bounds)?;

    CodeSection::new(name, section.addr, bytes.to_vec())
}

/// Minimal ELF32 image writer for tests
#[cfg(test)]
pub(crate) mod testelf {
    use goblin::elf::dynamic::{DT_HASH, DT_NULL, DT_STRSZ, DT_STRTAB, DT_SYMENT, DT_SYMTAB};
    use goblin::elf::header::{
        ELFCLASS32, ELFCLASS64, ELFDATA2LSB, EM_RISCV, ET_EXEC, EV_CURRENT,
    };
    use goblin::elf::program_header::{PF_R, PF_W, PF_X, PT_DYNAMIC, PT_LOAD};
    use goblin::elf::section_header::{
        SHF_ALLOC, SHF_EXECINSTR, SHT_DYNSYM, SHT_PROGBITS, SHT_STRTAB, SHT_SYMTAB,
    };
    pub use goblin::elf::sym::{STB_GLOBAL, STT_FUNC, STT_OBJECT};

    const EHDR_SIZE: usize = 52;
    const PHDR_SIZE: usize = 32;
    const SHDR_SIZE: usize = 40;
    const SYM_SIZE: usize = 16;

    struct TestSym {
        name: String,
        value: u32,
        size: u32,
        info: u8,
        shndx: u16,
    }

    pub struct ElfBuilder {
        pub class: u8,
        pub data_encoding: u8,
        pub machine: u16,
        pub e_type: u16,
        text_name: String,
        text_addr: u32,
        text: Vec<u8>,
        syms: Vec<TestSym>,
        dynamic: bool,
    }

    impl ElfBuilder {
        /// RV32 executable with a `.text` section at `addr`
        pub fn new(addr: u32, words: &[u32]) -> Self {
            Self {
                class: ELFCLASS32,
                data_encoding: ELFDATA2LSB,
                machine: EM_RISCV,
                e_type: ET_EXEC,
                text_name: ".text".to_string(),
                text_addr: addr,
                text: words.iter().flat_map(|w| w.to_le_bytes()).collect(),
                syms: Vec::new(),
                dynamic: false,
            }
        }

        pub fn text_name(mut self, name: &str) -> Self {
            self.text_name = name.to_string();
            self
        }

        /// Append raw bytes to the code section
        pub fn extra_bytes(mut self, bytes: &[u8]) -> Self {
            self.text.extend_from_slice(bytes);
            self
        }

        /// Write the symbols as `.dynsym`/`.dynstr` behind a PT_DYNAMIC
        /// segment, with no `.symtab`
        pub fn dynamic_symbols(mut self) -> Self {
            self.dynamic = true;
            self
        }

        /// Global function symbol in `.text`
        pub fn func(self, name: &str, value: u32) -> Self {
            self.symbol(name, value, 0, (STB_GLOBAL << 4) | STT_FUNC, 1)
        }

        pub fn symbol(mut self, name: &str, value: u32, size: u32, info: u8, shndx: u16) -> Self {
            self.syms.push(TestSym {
                name: name.to_string(),
                value,
                size,
                info,
                shndx,
            });
            self
        }

        pub fn build(&self) -> Vec<u8> {
            let (symtab_name, strtab_name, symtab_type) = if self.dynamic {
                (".dynsym", ".dynstr", SHT_DYNSYM)
            } else {
                (".symtab", ".strtab", SHT_SYMTAB)
            };

            // string tables
            let mut strtab = vec![0u8];
            let mut name_offsets = Vec::new();
            for sym in &self.syms {
                name_offsets.push(strtab.len() as u32);
                strtab.extend_from_slice(sym.name.as_bytes());
                strtab.push(0);
            }
            let mut shstrtab = vec![0u8];
            let mut sh_names = Vec::new();
            for name in [self.text_name.as_str(), symtab_name, strtab_name, ".shstrtab"] {
                sh_names.push(shstrtab.len() as u32);
                shstrtab.extend_from_slice(name.as_bytes());
                shstrtab.push(0);
            }

            // symbol table, entry 0 is the null symbol
            let mut symtab = vec![0u8; SYM_SIZE];
            for (sym, &name) in self.syms.iter().zip(&name_offsets) {
                symtab.extend_from_slice(&name.to_le_bytes());
                symtab.extend_from_slice(&sym.value.to_le_bytes());
                symtab.extend_from_slice(&sym.size.to_le_bytes());
                symtab.push(sym.info);
                symtab.push(0);
                symtab.extend_from_slice(&sym.shndx.to_le_bytes());
            }

            let mut out = vec![0u8; EHDR_SIZE];
            let text_off = align(&mut out);
            out.extend_from_slice(&self.text);
            let symtab_off = align(&mut out);
            out.extend_from_slice(&symtab);
            let strtab_off = out.len();
            out.extend_from_slice(&strtab);
            let shstrtab_off = out.len();
            out.extend_from_slice(&shstrtab);

            // SysV hash table and dynamic array; addresses equal file offsets
            let dynamic = self.dynamic.then(|| {
                let hash_off = align(&mut out);
                let nsyms = symtab.len() / SYM_SIZE;
                // one empty bucket, nchain = symbol count
                let mut hash = vec![1u32, nsyms as u32, 0];
                hash.resize(3 + nsyms, 0);
                for word in hash {
                    out.extend_from_slice(&word.to_le_bytes());
                }

                let dyn_off = out.len();
                let entries = [
                    (DT_HASH, hash_off),
                    (DT_STRTAB, strtab_off),
                    (DT_SYMTAB, symtab_off),
                    (DT_STRSZ, strtab.len()),
                    (DT_SYMENT, SYM_SIZE),
                    (DT_NULL, 0),
                ];
                for (tag, val) in entries {
                    out.extend_from_slice(&(tag as u32).to_le_bytes());
                    out.extend_from_slice(&(val as u32).to_le_bytes());
                }
                (dyn_off as u32, (out.len() - dyn_off) as u32)
            });

            let shoff = align(&mut out);

            // [0] null, [1] code, [2] symbols, [3] symbol names, [4] .shstrtab
            let headers: [[u32; 10]; 5] = [
                [0; 10],
                [
                    sh_names[0],
                    SHT_PROGBITS,
                    SHF_ALLOC | SHF_EXECINSTR,
                    self.text_addr,
                    text_off as u32,
                    self.text.len() as u32,
                    0,
                    0,
                    4,
                    0,
                ],
                [
                    sh_names[1],
                    symtab_type,
                    0,
                    0,
                    symtab_off as u32,
                    symtab.len() as u32,
                    3,
                    1,
                    4,
                    SYM_SIZE as u32,
                ],
                [
                    sh_names[2],
                    SHT_STRTAB,
                    0,
                    0,
                    strtab_off as u32,
                    strtab.len() as u32,
                    0,
                    0,
                    1,
                    0,
                ],
                [
                    sh_names[3],
                    SHT_STRTAB,
                    0,
                    0,
                    shstrtab_off as u32,
                    shstrtab.len() as u32,
                    0,
                    0,
                    1,
                    0,
                ],
            ];
            for header in headers {
                for field in header {
                    out.extend_from_slice(&field.to_le_bytes());
                }
            }

            // PT_LOAD maps the whole file at address 0 so the dynamic
            // tags resolve to file offsets
            let phoff = out.len();
            let mut phnum = 0u16;
            if let Some((dyn_off, dyn_len)) = dynamic {
                let file_len = (phoff + 2 * PHDR_SIZE) as u32;
                let phdrs: [[u32; 8]; 2] = [
                    [PT_LOAD, 0, 0, 0, file_len, file_len, PF_R | PF_X, 4],
                    [PT_DYNAMIC, dyn_off, dyn_off, dyn_off, dyn_len, dyn_len, PF_R | PF_W, 4],
                ];
                for phdr in phdrs {
                    for field in phdr {
                        out.extend_from_slice(&field.to_le_bytes());
                    }
                }
                phnum = 2;
            }

            // ELF header
            let mut ehdr = Vec::with_capacity(EHDR_SIZE);
            ehdr.extend_from_slice(&[0x7f, b'E', b'L', b'F']);
            ehdr.extend_from_slice(&[self.class, self.data_encoding, EV_CURRENT]);
            ehdr.resize(16, 0);
            ehdr.extend_from_slice(&self.e_type.to_le_bytes());
            ehdr.extend_from_slice(&self.machine.to_le_bytes());
            ehdr.extend_from_slice(&u32::from(EV_CURRENT).to_le_bytes());
            ehdr.extend_from_slice(&self.text_addr.to_le_bytes()); // e_entry
            let e_phoff = if phnum > 0 { phoff as u32 } else { 0 };
            ehdr.extend_from_slice(&e_phoff.to_le_bytes());
            ehdr.extend_from_slice(&(shoff as u32).to_le_bytes());
            ehdr.extend_from_slice(&0u32.to_le_bytes()); // e_flags
            ehdr.extend_from_slice(&(EHDR_SIZE as u16).to_le_bytes());
            ehdr.extend_from_slice(&(PHDR_SIZE as u16).to_le_bytes());
            ehdr.extend_from_slice(&phnum.to_le_bytes());
            ehdr.extend_from_slice(&(SHDR_SIZE as u16).to_le_bytes());
            ehdr.extend_from_slice(&5u16.to_le_bytes()); // e_shnum
            ehdr.extend_from_slice(&4u16.to_le_bytes()); // e_shstrndx
            out[..EHDR_SIZE].copy_from_slice(&ehdr);
            out
        }
    }

    fn align(out: &mut Vec<u8>) -> usize {
        while out.len() % 4 != 0 {
            out.push(0);
        }
        out.len()
    }

    /// Bare ELF64 RISC-V header, enough for header validation
    pub fn elf64_header() -> Vec<u8> {
        let mut out = vec![0x7f, b'E', b'L', b'F', ELFCLASS64, ELFDATA2LSB, EV_CURRENT];
        out.resize(16, 0);
        out.extend_from_slice(&ET_EXEC.to_le_bytes());
        out.extend_from_slice(&EM_RISCV.to_le_bytes());
        out.extend_from_slice(&u32::from(EV_CURRENT).to_le_bytes());
        out.extend_from_slice(&0u64.to_le_bytes()); // e_entry
        out.extend_from_slice(&0u64.to_le_bytes()); // e_phoff
        out.extend_from_slice(&0u64.to_le_bytes()); // e_shoff
        out.extend_from_slice(&0u32.to_le_bytes()); // e_flags
        out.extend_from_slice(&64u16.to_le_bytes());
        out.extend_from_slice(&56u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&64u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }
}
