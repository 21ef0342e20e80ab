// rvdis-wasm: RV32IM disassembler for the browser
//
// This crate wraps the rvdis library for use inside a WebAssembly
// environment. It compiles to wasm32-unknown-unknown via wasm-bindgen, so a
// page can disassemble an uploaded ELF object or a raw code region.

use wasm_bindgen::prelude::*;

/// Disassemble an RV32 ELF object into a listing followed by its symbol table.
#[wasm_bindgen]
pub fn disassemble_elf(data: &[u8]) -> Result<String, JsValue> {
    disassemble_elf_inner(data).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}

/// Disassemble a region of raw RV32 machine code located at `base_addr`.
///
/// There is no symbol table, so every branch target gets a LOC_ label.
#[wasm_bindgen]
pub fn disassemble_region(code: &[u8], base_addr: u32) -> Result<String, JsValue> {
    disassemble_region_inner(code, base_addr)
        .map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}

fn disassemble_elf_inner(data: &[u8]) -> anyhow::Result<String> {
    Ok(rvdis::dump(data, &rvdis::Options::default())?)
}

fn disassemble_region_inner(code: &[u8], base_addr: u32) -> anyhow::Result<String> {
    use rvdis::{disassemble, CodeSection, SymbolTable};

    if code.len() < 4 {
        anyhow::bail!("No complete instruction in region 0x{:08x}", base_addr);
    }

    let section = CodeSection::new(
        format!("region_0x{:08x}", base_addr),
        base_addr as u64,
        code.to_vec(),
    )?;
    let listing = disassemble(&section, &SymbolTable::default())?;
    Ok(listing.to_string())
}

/// Get version string
#[wasm_bindgen]
pub fn version() -> String {
    format!("rvdis-wasm {}", env!("CARGO_PKG_VERSION"))
}
