// listing.rs - Two-pass disassembly of a code section
//
// Pass 1 walks every word once, probing only JAL and branch encodings, and
// collects the targets that have no function symbol. Pass 2 walks the
// section again, fully decoding each word and rendering it with its labels.
// A trailing partial word is never read.

use crate::disasm::{self, Instruction};
use crate::elf::CodeSection;
use crate::error::{Error, Result};
use crate::render::render_line;
use crate::resolve::{resolve, LabelSet, SymbolLookup};
use std::fmt;

/// The rendered listing of one code section
#[derive(Debug, Clone)]
pub struct Listing {
    /// Synthetic labels discovered in pass 1
    pub labels: LabelSet,
    /// One rendered line per instruction word
    pub lines: Vec<String>,
    /// Words that decoded to Opcode::Unknown
    pub unknown: usize,
    /// Bytes after the last complete word
    pub trailing_bytes: usize,
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Pass 1: collect branch/jump targets that have no function symbol
pub fn scan_labels<S>(section: &CodeSection, symbols: &S) -> LabelSet
where
    S: SymbolLookup + ?Sized,
{
    let mut labels = LabelSet::new();
    for index in 0..section.word_count() {
        let Some(word) = section.word_at(index) else {
            break;
        };
        if let Some(target) = disasm::branch_target(section.addr_of(index), word) {
            if symbols.function_at(target).is_none() {
                labels.insert(target);
            }
        }
    }
    labels
}

/// Disassemble a code section into an annotated listing
pub fn disassemble<S>(section: &CodeSection, symbols: &S) -> Result<Listing>
where
    S: SymbolLookup + ?Sized,
{
    let labels = scan_labels(section, symbols);

    let instructions = (0..section.word_count())
        .map(|index| {
            let addr = section.addr_of(index);
            let word = section.word_at(index).ok_or(Error::Internal {
                address: addr,
                reason: "word read past end of section",
            })?;
            Ok(disasm::decode(addr, word))
        })
        .collect::<Result<Vec<Instruction>>>()?;

    // Line prefixes, padded to the longest one in the section
    let prefixes: Vec<Option<String>> = instructions
        .iter()
        .map(|inst| resolve(inst.addr, &labels, symbols).tag())
        .collect();
    let width = prefix_width(prefixes.iter().flatten().map(String::as_str));

    let lines = instructions
        .iter()
        .zip(&prefixes)
        .map(|(inst, prefix)| {
            let target = inst
                .target()
                .map(|addr| resolve(addr, &labels, symbols));
            render_line(inst, prefix.as_deref(), width, target.as_ref())
        })
        .collect();

    Ok(Listing {
        unknown: instructions.iter().filter(|i| i.is_unknown()).count(),
        trailing_bytes: section.trailing_bytes(),
        labels,
        lines,
    })
}

/// Display width of the widest label prefix
fn prefix_width<'a>(prefixes: impl Iterator<Item = &'a str>) -> usize {
    prefixes.map(|p| p.chars().count()).max().unwrap_or(0)
}
