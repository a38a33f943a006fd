//! # wspace
//!
//! A toolkit for the Whitespace programming language.
//!
//! Programs are written with three symbols (space, tab and line feed, or any
//! other characters a [`Style`] maps onto them). This crate tokenizes them
//! with a prefix-tree automaton, runs them on an arbitrary-precision stack
//! machine with a heap and host function calls, and converts them to and
//! from a readable assembler syntax.
//!
//! ```
//! use wspace::{assemble, Vm};
//! use std::io::Cursor;
//!
//! let asm = assemble("PUSH 1\nPUSH 3\nADD\nPNUM").unwrap();
//! let mut vm = Vm::with_io(asm.program, Cursor::new(Vec::new()), Vec::new());
//! vm.run().unwrap();
//! assert_eq!(vm.output(), b"4");
//! ```

pub mod alphabet;
pub mod vm;
pub mod asm;
pub mod embed;
pub mod config;
pub mod error;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use num_bigint::{BigInt, BigUint};
pub use alphabet::{Symbol, Number, Label, Style, StyleError};
pub use vm::{
    Lexer, Program, Instruction, Opcode, SyntaxError, tokenize,
    Vm, VmState, VmError, Snapshot, ForeignRegistry, HostValue,
};
pub use asm::{assemble, disassemble, Assembly, AssemblerError, load_source, save_source};
pub use embed::{Snippet, Returns, Outcome};
pub use config::RunConfig;
pub use error::{Error, Result};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
