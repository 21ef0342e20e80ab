// rvdis - RV32IM ELF disassembler
//
// Prints an annotated listing of a RISC-V object's code section followed
// by its symbol table.
//
// Usage:
//   rvdis input.elf
//   rvdis input.elf -o listing.txt --section .init --no-symtab

use anyhow::{Context, Result};
use clap::Parser;
use rvdis::{elf, listing, symtab, DEFAULT_SECTION};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rvdis")]
#[command(about = "RV32IM ELF disassembler")]
#[command(version)]
struct Args {
    /// Input RISC-V ELF object
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Code section to disassemble
    #[arg(short, long, default_value = DEFAULT_SECTION)]
    section: String,

    /// Do not print the symbol table
    #[arg(long)]
    no_symtab: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        eprintln!("rvdis - RV32IM ELF disassembler");
        eprintln!("Loading ELF: {}", args.input.display());
    }

    let elf_data = std::fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    // Parse and validate ELF
    let elf_info = elf::parse(&elf_data).context("Failed to parse ELF")?;

    if args.verbose {
        eprintln!("  Entry point: 0x{:08x}", elf_info.entry);
        eprintln!(
            "  Type: {}",
            if elf_info.is_pie { "PIE" } else { "executable" }
        );
        eprintln!("  Sections: {}", elf_info.sections.len());
        eprintln!("  Symbols: {}", elf_info.symbols.len());
    }

    // Extract code section
    let code = elf::extract_code_section(&elf_data, &elf_info, &args.section)?;

    if args.verbose {
        eprintln!(
            "  {}: 0x{:08x} ({} bytes)",
            code.name,
            code.vaddr,
            code.data.len()
        );
    }

    let labels = elf_info.labels_for(&args.section);
    let listing = listing::disassemble(&code, &*labels)?;

    if args.verbose {
        eprintln!("  Instructions: {}", listing.lines.len());
        eprintln!("  Synthetic labels: {}", listing.labels.len());
        eprintln!("  Unknown encodings: {}", listing.unknown);
    }
    if listing.trailing_bytes > 0 {
        eprintln!(
            "warning: {} trailing byte(s) in {} not decoded",
            listing.trailing_bytes, code.name
        );
    }

    let mut text = listing.to_string();
    if !args.no_symtab {
        text.push_str(&symtab::dump(&elf_info.symbols));
    }

    // Write output
    match args.output {
        Some(ref path) => {
            std::fs::write(path, text).context("Failed to write output")?;
            if args.verbose {
                eprintln!("Wrote: {}", path.display());
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .context("Failed to write output")?;
            stdout.flush()?;
        }
    }

    Ok(())
}
