//! Assembler and disassembler for Whitespace programs.
//!
//! This module provides:
//! - A line-oriented assembler (mnemonics → [`Program`](crate::vm::Program))
//! - The `PUSHS` macro layer
//! - A disassembler (program → re-assemblable text)
//! - Loading and saving styled source files

pub mod assembler;
pub mod macros;
pub mod disasm;
pub mod source;

pub use assembler::{assemble, Assembly, AssemblerError};
pub use macros::{Macro, MacroError};
pub use disasm::{disassemble, listing};
pub use source::{load_source, save_source, read_program_text, SourceError};
