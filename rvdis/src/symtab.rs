// symtab.rs - ELF symbol records and the symbol table dump
//
// The table keeps symbols in file order. Function symbols are indexed by
// exact start address for label lookups.

use crate::resolve::SymbolLookup;
use goblin::elf::section_header::{
    SHN_ABS, SHN_COMMON, SHN_HIOS, SHN_HIPROC, SHN_HIRESERVE, SHN_LOOS, SHN_LOPROC,
    SHN_LORESERVE, SHN_UNDEF, SHN_XINDEX,
};
use goblin::elf::sym::{
    STB_GLOBAL, STB_HIPROC, STB_LOCAL, STB_LOPROC, STB_WEAK, STT_COMMON, STT_FILE, STT_FUNC,
    STT_HIPROC, STT_LOPROC, STT_NOTYPE, STT_OBJECT, STT_SECTION, STT_TLS, STV_DEFAULT,
    STV_HIDDEN, STV_INTERNAL,
};
use std::collections::BTreeMap;
use std::fmt;

/// Symbol type (`Sym::st_type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    NoType,
    Object,
    Func,
    Section,
    File,
    Common,
    Tls,
    LoProc,
    HiProc,
    Other(u8),
}

impl SymbolKind {
    pub fn from_raw(value: u8) -> Self {
        match value {
            STT_NOTYPE => SymbolKind::NoType,
            STT_OBJECT => SymbolKind::Object,
            STT_FUNC => SymbolKind::Func,
            STT_SECTION => SymbolKind::Section,
            STT_FILE => SymbolKind::File,
            STT_COMMON => SymbolKind::Common,
            STT_TLS => SymbolKind::Tls,
            STT_LOPROC => SymbolKind::LoProc,
            STT_HIPROC => SymbolKind::HiProc,
            other => SymbolKind::Other(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::NoType => "NOTYPE",
            SymbolKind::Object => "OBJECT",
            SymbolKind::Func => "FUNC",
            SymbolKind::Section => "SECTION",
            SymbolKind::File => "FILE",
            SymbolKind::Common => "COMMON",
            SymbolKind::Tls => "TLS",
            SymbolKind::LoProc => "LOPROC",
            SymbolKind::HiProc => "HIPROC",
            SymbolKind::Other(_) => "UNKNOWN",
        }
    }
}

/// Symbol binding (`Sym::st_bind`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Local,
    Global,
    Weak,
    LoProc,
    HiProc,
    Other(u8),
}

impl Binding {
    pub fn from_raw(value: u8) -> Self {
        match value {
            STB_LOCAL => Binding::Local,
            STB_GLOBAL => Binding::Global,
            STB_WEAK => Binding::Weak,
            STB_LOPROC => Binding::LoProc,
            STB_HIPROC => Binding::HiProc,
            other => Binding::Other(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Binding::Local => "LOCAL",
            Binding::Global => "GLOBAL",
            Binding::Weak => "WEAK",
            Binding::LoProc => "LOPROC",
            Binding::HiProc => "HIPROC",
            Binding::Other(_) => "UNKNOWN",
        }
    }
}

/// Symbol visibility (`Sym::st_visibility`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Default,
    Internal,
    Hidden,
    Protected,
}

impl Visibility {
    pub fn from_raw(value: u8) -> Self {
        match value {
            STV_DEFAULT => Visibility::Default,
            STV_INTERNAL => Visibility::Internal,
            STV_HIDDEN => Visibility::Hidden,
            _ => Visibility::Protected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Default => "DEFAULT",
            Visibility::Internal => "INTERNAL",
            Visibility::Hidden => "HIDDEN",
            Visibility::Protected => "PROTECTED",
        }
    }
}

/// A symbol table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub value: u32,
    pub size: u32,
    pub kind: SymbolKind,
    pub binding: Binding,
    pub visibility: Visibility,
    /// Section header index (st_shndx)
    pub shndx: u16,
}

/// All symbols of an object, in table order
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    /// Address -> index of the first named function symbol there
    functions: BTreeMap<u32, usize>,
}

impl SymbolTable {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        let functions = index_functions(&symbols, |_| true);
        Self { symbols, functions }
    }

    /// Same symbols, with only functions defined in section `shndx`
    /// usable as labels
    pub fn in_section(&self, shndx: u16) -> Self {
        Self {
            functions: index_functions(&self.symbols, |sym| sym.shndx == shndx),
            symbols: self.symbols.clone(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

fn index_functions(symbols: &[Symbol], keep: impl Fn(&Symbol) -> bool) -> BTreeMap<u32, usize> {
    let mut functions = BTreeMap::new();
    for (i, sym) in symbols.iter().enumerate() {
        if sym.kind == SymbolKind::Func && !sym.name.is_empty() && keep(sym) {
            functions.entry(sym.value).or_insert(i);
        }
    }
    functions
}

impl SymbolLookup for SymbolTable {
    fn function_at(&self, addr: u32) -> Option<&str> {
        self.functions
            .get(&addr)
            .map(|&i| self.symbols[i].name.as_str())
    }
}

/// Render the `Symtable:` block
pub fn dump(table: &SymbolTable) -> String {
    SymtabDump(table).to_string()
}

struct SymtabDump<'a>(&'a SymbolTable);

impl fmt::Display for SymtabDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = decimal_width(self.0.len());
        let first = &"Symbol"[..(width + 2).min(6)];

        writeln!(f, "Symtable:")?;
        writeln!(
            f,
            "{:>w$}   {:>8} {:>4} {:>7} {:>7} {:>8} {:>4} {}",
            first,
            "Value",
            "Size",
            "Type",
            "Bind",
            "Vis",
            "Index",
            "Name",
            w = width + 2
        )?;
        for (i, sym) in self.0.iter().enumerate() {
            writeln!(
                f,
                "[{:>w$}] 0x{:08X} {:>4} {:>7} {:>7} {:>8} {:>4} {}",
                i,
                sym.value,
                sym.size,
                sym.kind.as_str(),
                sym.binding.as_str(),
                sym.visibility.as_str(),
                section_index_name(sym.shndx),
                sym.name,
                w = width
            )?;
        }
        Ok(())
    }
}

fn decimal_width(n: usize) -> usize {
    n.checked_ilog10().map_or(1, |log| log as usize + 1)
}

fn section_index_name(shndx: u16) -> String {
    match u32::from(shndx) {
        SHN_UNDEF => "UNDEF".to_string(),
        SHN_ABS => "ABS".to_string(),
        SHN_COMMON => "COMMON".to_string(),
        SHN_XINDEX => "XINDEX".to_string(),
        SHN_LOPROC..=SHN_HIPROC => "PROC_RES".to_string(),
        SHN_LOOS..=SHN_HIOS => "OS_RES".to_string(),
        SHN_LORESERVE..=SHN_HIRESERVE => "RESERVED".to_string(),
        index => index.to_string(),
    }
}
