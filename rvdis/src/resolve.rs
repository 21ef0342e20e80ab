// resolve.rs - Address to label resolution
//
// An address is shown as its function symbol when one starts exactly there,
// as a synthetic LOC_ label when pass 1 discovered it as an unnamed branch
// target, and as a bare hex address otherwise.

use std::collections::BTreeSet;
use std::fmt;

/// Symbol queries the disassembler needs from an object container
pub trait SymbolLookup {
    /// Name of a function symbol whose value is exactly `addr`.
    ///
    /// When several function symbols alias one address, implementations
    /// return the first in table order.
    fn function_at(&self, addr: u32) -> Option<&str>;
}

/// Branch/jump targets with no function symbol, discovered in pass 1
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    addrs: BTreeSet<u32>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if `addr` was already present
    pub fn insert(&mut self, addr: u32) -> bool {
        self.addrs.insert(addr)
    }

    pub fn contains(&self, addr: u32) -> bool {
        self.addrs.contains(&addr)
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Addresses in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.addrs.iter().copied()
    }
}

impl FromIterator<u32> for LabelSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self {
            addrs: iter.into_iter().collect(),
        }
    }
}

/// How an address is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayLabel<'a> {
    /// Function symbol starting at the address
    Symbol { addr: u32, name: &'a str },
    /// Synthetic label for an unnamed branch target
    Synthetic(u32),
    /// No label at all
    Bare(u32),
}

impl DisplayLabel<'_> {
    pub fn addr(&self) -> u32 {
        match *self {
            DisplayLabel::Symbol { addr, .. } => addr,
            DisplayLabel::Synthetic(addr) => addr,
            DisplayLabel::Bare(addr) => addr,
        }
    }

    /// The `<name>` part, if the address has a label
    pub fn tag(&self) -> Option<String> {
        match self {
            DisplayLabel::Symbol { name, .. } => Some(format!("<{}>", name)),
            DisplayLabel::Synthetic(addr) => Some(format!("<{}>", synthetic_name(*addr))),
            DisplayLabel::Bare(_) => None,
        }
    }
}

impl fmt::Display for DisplayLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.addr())?;
        if let Some(tag) = self.tag() {
            write!(f, " {}", tag)?;
        }
        Ok(())
    }
}

/// Name given to an unlabelled branch target
pub fn synthetic_name(addr: u32) -> String {
    format!("LOC_0x{:08X}", addr)
}

/// Resolve `addr` to its display label.
///
/// Function symbols take precedence over synthetic labels.
pub fn resolve<'a, S>(addr: u32, labels: &LabelSet, symbols: &'a S) -> DisplayLabel<'a>
where
    S: SymbolLookup + ?Sized,
{
    if let Some(name) = symbols.function_at(addr) {
        DisplayLabel::Symbol { addr, name }
    } else if labels.contains(addr) {
        DisplayLabel::Synthetic(addr)
    } else {
        DisplayLabel::Bare(addr)
    }
}
