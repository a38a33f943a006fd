//! Symbol stream → instruction sequence.
//!
//! Opcode paths form a prefix code over the alphabet, so decoding walks a
//! trie one symbol at a time without backtracking. Reaching a leaf either
//! emits the opcode directly or switches to literal capture, which collects
//! digits up to the terminating `L`.

use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};
use crate::alphabet::{Symbol, Number, Label, LiteralError, Style};
use crate::alphabet::symbol::letters;
use crate::vm::opcode::{Instruction, LiteralKind, Opcode, Program};

/// One outgoing edge of a trie node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// No opcode continues with this symbol.
    Empty,
    /// More symbols needed: index of the next node.
    Branch(usize),
    /// Complete opcode.
    Leaf(Opcode),
}

/// Opcode trie, stored as an arena of nodes with three slots each.
#[derive(Debug)]
pub struct Trie {
    nodes: Vec<[Slot; 3]>,
}

impl Trie {
    /// Root node index.
    pub const ROOT: usize = 0;

    /// Build the trie from the opcode catalog.
    fn build() -> Self {
        let mut trie = Self { nodes: vec![[Slot::Empty; 3]] };
        for opcode in Opcode::ALL {
            trie.insert(opcode);
        }
        trie
    }

    fn insert(&mut self, opcode: Opcode) {
        let path = opcode.path();
        let mut node = Self::ROOT;
        for (depth, symbol) in path.iter().enumerate() {
            let last = depth + 1 == path.len();
            let index = symbol.index();
            match (self.nodes[node][index], last) {
                (Slot::Empty, true) => self.nodes[node][index] = Slot::Leaf(opcode),
                (Slot::Empty, false) => {
                    let next = self.nodes.len();
                    self.nodes[node][index] = Slot::Branch(next);
                    self.nodes.push([Slot::Empty; 3]);
                    node = next;
                }
                (Slot::Branch(next), false) => node = next,
                (existing, _) => unreachable!(
                    "opcode catalog is not prefix-free: {:?} collides with {:?}",
                    opcode, existing
                ),
            }
        }
    }

    /// The shared trie for the opcode catalog.
    pub fn get() -> &'static Trie {
        static TRIE: OnceLock<Trie> = OnceLock::new();
        TRIE.get_or_init(Trie::build)
    }

    fn step(&self, node: usize, symbol: Symbol) -> Slot {
        self.nodes[node][symbol.index()]
    }

    /// Number of nodes (for diagnostics).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Tokenizer state between symbols.
#[derive(Debug)]
enum State {
    /// Walking the trie; `start` is the offset of the opcode's first symbol.
    Walking { node: usize, start: usize },
    /// Collecting literal digits for an opcode.
    Capturing { opcode: Opcode, kind: LiteralKind, start: usize, digits: Vec<Symbol> },
}

/// The token automaton.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lexer {
    strict: bool,
}

impl Lexer {
    /// Create a lenient lexer: an incomplete trailing instruction is dropped.
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// Create a strict lexer: incomplete input, a missing `END` and empty
    /// label literals are syntax errors.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Whether this lexer is strict.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Remap source text through `style` and tokenize it.
    pub fn tokenize_source(&self, source: &str, style: &Style) -> Result<Program, SyntaxError> {
        self.tokenize(style.remap(source))
    }

    /// Tokenize a symbol stream.
    pub fn tokenize<I>(&self, symbols: I) -> Result<Program, SyntaxError>
    where
        I: IntoIterator<Item = Symbol>,
    {
        let trie = Trie::get();
        let mut out = Vec::new();
        let mut state = State::Walking { node: Trie::ROOT, start: 0 };
        let mut path: Vec<Symbol> = Vec::new();
        let mut offset = 0;

        for symbol in symbols {
            state = match state {
                State::Walking { node, start } => {
                    path.push(symbol);
                    match trie.step(node, symbol) {
                        Slot::Empty => {
                            return Err(SyntaxError::UnknownOpcode {
                                offset: start,
                                path: letters(&path),
                            });
                        }
                        Slot::Branch(next) => State::Walking { node: next, start },
                        Slot::Leaf(opcode) => {
                            path.clear();
                            match opcode.literal() {
                                None => {
                                    // nullary() covers every opcode without a literal
                                    if let Some(instr) = Instruction::nullary(opcode) {
                                        out.push(instr);
                                    }
                                    State::Walking { node: Trie::ROOT, start: offset + 1 }
                                }
                                Some(kind) => State::Capturing {
                                    opcode,
                                    kind,
                                    start,
                                    digits: Vec::new(),
                                },
                            }
                        }
                    }
                }
                State::Capturing { opcode, kind, start, mut digits } => {
                    if symbol == Symbol::L {
                        out.push(self.finish_literal(opcode, kind, start, digits)?);
                        State::Walking { node: Trie::ROOT, start: offset + 1 }
                    } else {
                        digits.push(symbol);
                        State::Capturing { opcode, kind, start, digits }
                    }
                }
            };
            offset += 1;
        }

        self.finish(state, &path, offset)?;

        if self.strict && !out.iter().any(|i| *i == Instruction::End) {
            return Err(SyntaxError::MissingEnd);
        }

        debug!(instructions = out.len(), symbols = offset, "tokenized program");
        Ok(Program::new(out))
    }

    fn finish_literal(
        &self,
        opcode: Opcode,
        kind: LiteralKind,
        start: usize,
        digits: Vec<Symbol>,
    ) -> Result<Instruction, SyntaxError> {
        let literal_error = |source| SyntaxError::Literal { offset: start, opcode, source };
        let instr = match kind {
            LiteralKind::Number => {
                let n = Number::from_digits(digits).map_err(literal_error)?;
                Instruction::with_number(opcode, n)
            }
            LiteralKind::Label => {
                if self.strict && digits.is_empty() {
                    return Err(SyntaxError::EmptyLabel { offset: start, opcode });
                }
                let label = Label::from_digits(digits).map_err(literal_error)?;
                Instruction::with_label(opcode, label)
            }
        };
        // The catalog guarantees the literal kind matches the constructor
        instr.ok_or(SyntaxError::UnknownOpcode { offset: start, path: letters(opcode.path()) })
    }

    /// Handle whatever is left when the stream ends.
    fn finish(&self, state: State, path: &[Symbol], offset: usize) -> Result<(), SyntaxError> {
        match state {
            State::Walking { node, start } if node != Trie::ROOT => {
                if self.strict {
                    return Err(SyntaxError::UnexpectedEndInOpcode { offset: start, path: letters(path) });
                }
                warn!(offset = start, path = %letters(path), "dropping incomplete opcode at end of input");
            }
            State::Capturing { opcode, start, .. } => {
                if self.strict {
                    return Err(SyntaxError::UnexpectedEndInLiteral { offset: start, opcode });
                }
                warn!(offset = start, %opcode, "dropping unterminated literal at end of input");
            }
            State::Walking { .. } => {}
        }
        debug!(offset, "end of symbol stream");
        Ok(())
    }
}

/// Tokenize a symbol stream with a lenient lexer.
pub fn tokenize<I>(symbols: I) -> Result<Program, SyntaxError>
where
    I: IntoIterator<Item = Symbol>,
{
    Lexer::new().tokenize(symbols)
}

/// Errors that can occur while tokenizing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("no opcode for path {path} at symbol {offset}")]
    UnknownOpcode { offset: usize, path: String },

    #[error("input ends inside opcode {path} starting at symbol {offset}")]
    UnexpectedEndInOpcode { offset: usize, path: String },

    #[error("input ends inside the literal of {opcode} at symbol {offset}")]
    UnexpectedEndInLiteral { offset: usize, opcode: Opcode },

    #[error("empty label for {opcode} at symbol {offset}")]
    EmptyLabel { offset: usize, opcode: Opcode },

    #[error("bad literal for {opcode} at symbol {offset}: {source}")]
    Literal { offset: usize, opcode: Opcode, source: LiteralError },

    #[error("program never ends (no END instruction)")]
    MissingEnd,
}
