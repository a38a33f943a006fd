//! The Whitespace virtual machine.
//!
//! - [`lexer`] - symbol stream → [`Program`] via the opcode trie
//! - [`opcode`] - opcode catalog and the closed [`Instruction`] set
//! - [`engine`] - the stack/heap machine that executes a program
//! - [`foreign`] - host functions callable through `FFI`

pub mod opcode;
pub mod lexer;
pub mod stack;
pub mod heap;
pub mod arith;
pub mod foreign;
pub mod snapshot;
pub mod engine;

pub use opcode::{Opcode, Instruction, Operand, LiteralKind, Program};
pub use lexer::{Lexer, SyntaxError, tokenize};
pub use stack::Stack;
pub use heap::Heap;
pub use foreign::{ForeignRegistry, ForeignFn, HostValue};
pub use snapshot::Snapshot;
pub use engine::{Vm, VmState, VmError, raise_interrupt, resolve_labels};
