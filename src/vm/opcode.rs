//! Instruction catalog.
//!
//! Every opcode is a fixed path over the alphabet, made of an IMP
//! (instruction modification parameter) selecting the group and a command
//! within it. Opcodes taking an operand are followed by a literal and a
//! terminating `L`.
//!
//! | IMP        | Group       |
//! |------------|-------------|
//! | `S`        | stack       |
//! | `T S`      | arithmetic  |
//! | `T T`      | heap        |
//! | `T L`      | I/O         |
//! | `L`        | flow control|

use std::fmt;
use std::ops::Index;
use serde::{Serialize, Deserialize};
use crate::alphabet::{Symbol, Number, Label};
use crate::alphabet::Symbol::{L, S, T};

/// Kind of literal an opcode takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    /// Signed number.
    Number,
    /// Unsigned label.
    Label,
}

/// Opcode without its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    // ==================== Stack ====================
    Push,
    Dup,
    Copy,
    Swap,
    Pop,
    Slide,

    // ==================== Arithmetic ====================
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // ==================== Heap ====================
    Store,
    Retrieve,

    // ==================== I/O ====================
    PrintChar,
    PrintNumber,
    ReadChar,
    ReadNumber,

    // ==================== Flow Control ====================
    Mark,
    Call,
    Jump,
    JumpZero,
    JumpNegative,
    Return,
    End,
    Foreign,
}

impl Opcode {
    /// Every opcode, in catalog order.
    pub const ALL: [Opcode; 25] = [
        Opcode::Push, Opcode::Dup, Opcode::Copy, Opcode::Swap, Opcode::Pop, Opcode::Slide,
        Opcode::Add, Opcode::Sub, Opcode::Mul, Opcode::Div, Opcode::Mod,
        Opcode::Store, Opcode::Retrieve,
        Opcode::PrintChar, Opcode::PrintNumber, Opcode::ReadChar, Opcode::ReadNumber,
        Opcode::Mark, Opcode::Call, Opcode::Jump, Opcode::JumpZero, Opcode::JumpNegative,
        Opcode::Return, Opcode::End, Opcode::Foreign,
    ];

    /// Full symbol path (IMP followed by command).
    pub const fn path(self) -> &'static [Symbol] {
        match self {
            Opcode::Push => &[S, S],
            Opcode::Dup => &[S, L, S],
            Opcode::Copy => &[S, T, S],
            Opcode::Swap => &[S, L, T],
            Opcode::Pop => &[S, L, L],
            Opcode::Slide => &[S, T, L],

            Opcode::Add => &[T, S, S, S],
            Opcode::Sub => &[T, S, S, T],
            Opcode::Mul => &[T, S, S, L],
            Opcode::Div => &[T, S, T, S],
            Opcode::Mod => &[T, S, T, T],

            Opcode::Store => &[T, T, S],
            Opcode::Retrieve => &[T, T, T],

            Opcode::PrintChar => &[T, L, S, S],
            Opcode::PrintNumber => &[T, L, S, T],
            Opcode::ReadChar => &[T, L, T, S],
            Opcode::ReadNumber => &[T, L, T, T],

            Opcode::Mark => &[L, S, S],
            Opcode::Call => &[L, S, T],
            Opcode::Jump => &[L, S, L],
            Opcode::JumpZero => &[L, T, S],
            Opcode::JumpNegative => &[L, T, T],
            Opcode::Return => &[L, T, L],
            Opcode::End => &[L, L, L],
            Opcode::Foreign => &[L, L, S],
        }
    }

    /// Literal taken by the opcode, if any.
    pub const fn literal(self) -> Option<LiteralKind> {
        match self {
            Opcode::Push | Opcode::Copy | Opcode::Slide => Some(LiteralKind::Number),
            Opcode::Mark
            | Opcode::Call
            | Opcode::Jump
            | Opcode::JumpZero
            | Opcode::JumpNegative
            | Opcode::Foreign => Some(LiteralKind::Label),
            _ => None,
        }
    }

    /// Number of operands (0 or 1).
    pub const fn arity(self) -> usize {
        match self.literal() {
            Some(_) => 1,
            None => 0,
        }
    }

    /// Canonical assembler mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Push => "PUSH",
            Opcode::Dup => "DUP",
            Opcode::Copy => "COPY",
            Opcode::Swap => "SWAP",
            Opcode::Pop => "POP",
            Opcode::Slide => "SLIDE",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Store => "STORE",
            Opcode::Retrieve => "RETRIEVE",
            Opcode::PrintChar => "PCHR",
            Opcode::PrintNumber => "PNUM",
            Opcode::ReadChar => "RCHR",
            Opcode::ReadNumber => "RNUM",
            Opcode::Mark => "MARK",
            Opcode::Call => "CALL",
            Opcode::Jump => "JUMP",
            Opcode::JumpZero => "JZ",
            Opcode::JumpNegative => "JN",
            Opcode::Return => "RET",
            Opcode::End => "END",
            Opcode::Foreign => "FFI",
        }
    }

    /// Look up a mnemonic (case-insensitive, aliases included).
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        let upper = text.to_ascii_uppercase();
        let opcode = match upper.as_str() {
            "PUSH" => Opcode::Push,
            "DUP" => Opcode::Dup,
            "COPY" => Opcode::Copy,
            "SWAP" => Opcode::Swap,
            "POP" | "DROP" => Opcode::Pop,
            "SLIDE" | "SKIP" => Opcode::Slide,
            "ADD" => Opcode::Add,
            "SUB" => Opcode::Sub,
            "MUL" => Opcode::Mul,
            "DIV" => Opcode::Div,
            "MOD" => Opcode::Mod,
            "STORE" => Opcode::Store,
            "RETRIEVE" | "LOAD" => Opcode::Retrieve,
            "PCHR" => Opcode::PrintChar,
            "PNUM" => Opcode::PrintNumber,
            "RCHR" => Opcode::ReadChar,
            "RNUM" => Opcode::ReadNumber,
            "MARK" => Opcode::Mark,
            "CALL" => Opcode::Call,
            "JUMP" | "JMP" => Opcode::Jump,
            "JZ" => Opcode::JumpZero,
            "JN" | "JS" => Opcode::JumpNegative,
            "RET" | "RETURN" => Opcode::Return,
            "END" | "HALT" | "HLT" => Opcode::End,
            "FFI" | "PYFN" => Opcode::Foreign,
            _ => return None,
        };
        Some(opcode)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    // ==================== Stack ====================

    /// Push the number onto the stack
    Push(Number),

    /// Duplicate the top item
    Dup,

    /// Copy the nth item (0 = top) onto the top
    Copy(Number),

    /// Swap the top two items
    Swap,

    /// Discard the top item
    Pop,

    /// Remove n items beneath the top, keeping the top
    Slide(Number),

    // ==================== Arithmetic ====================

    Add,
    Sub,
    Mul,
    /// Floor division
    Div,
    /// Modulo with the sign of the divisor
    Mod,

    // ==================== Heap ====================

    /// heap[key] := value (value on top, key beneath)
    Store,

    /// Replace the key on top with heap[key]
    Retrieve,

    // ==================== I/O ====================

    PrintChar,
    PrintNumber,
    /// Read a character into heap[top]
    ReadChar,
    /// Read a number into heap[top]
    ReadNumber,

    // ==================== Flow Control ====================

    /// Mark a location in the program
    Mark(Label),

    /// Call a subroutine
    Call(Label),

    /// Jump unconditionally
    Jump(Label),

    /// Pop; jump if zero
    JumpZero(Label),

    /// Pop; jump if negative
    JumpNegative(Label),

    /// Return to the caller
    Return,

    /// End the program
    End,

    /// Call a host function bound to the label
    Foreign(Label),
}

/// Operand attached to an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand<'a> {
    Number(&'a Number),
    Label(&'a Label),
}

impl Instruction {
    /// The opcode of this instruction.
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Push(_) => Opcode::Push,
            Instruction::Dup => Opcode::Dup,
            Instruction::Copy(_) => Opcode::Copy,
            Instruction::Swap => Opcode::Swap,
            Instruction::Pop => Opcode::Pop,
            Instruction::Slide(_) => Opcode::Slide,
            Instruction::Add => Opcode::Add,
            Instruction::Sub => Opcode::Sub,
            Instruction::Mul => Opcode::Mul,
            Instruction::Div => Opcode::Div,
            Instruction::Mod => Opcode::Mod,
            Instruction::Store => Opcode::Store,
            Instruction::Retrieve => Opcode::Retrieve,
            Instruction::PrintChar => Opcode::PrintChar,
            Instruction::PrintNumber => Opcode::PrintNumber,
            Instruction::ReadChar => Opcode::ReadChar,
            Instruction::ReadNumber => Opcode::ReadNumber,
            Instruction::Mark(_) => Opcode::Mark,
            Instruction::Call(_) => Opcode::Call,
            Instruction::Jump(_) => Opcode::Jump,
            Instruction::JumpZero(_) => Opcode::JumpZero,
            Instruction::JumpNegative(_) => Opcode::JumpNegative,
            Instruction::Return => Opcode::Return,
            Instruction::End => Opcode::End,
            Instruction::Foreign(_) => Opcode::Foreign,
        }
    }

    /// Build an instruction without an operand.
    ///
    /// Returns `None` if the opcode needs one.
    pub fn nullary(opcode: Opcode) -> Option<Self> {
        let instr = match opcode {
            Opcode::Dup => Instruction::Dup,
            Opcode::Swap => Instruction::Swap,
            Opcode::Pop => Instruction::Pop,
            Opcode::Add => Instruction::Add,
            Opcode::Sub => Instruction::Sub,
            Opcode::Mul => Instruction::Mul,
            Opcode::Div => Instruction::Div,
            Opcode::Mod => Instruction::Mod,
            Opcode::Store => Instruction::Store,
            Opcode::Retrieve => Instruction::Retrieve,
            Opcode::PrintChar => Instruction::PrintChar,
            Opcode::PrintNumber => Instruction::PrintNumber,
            Opcode::ReadChar => Instruction::ReadChar,
            Opcode::ReadNumber => Instruction::ReadNumber,
            Opcode::Return => Instruction::Return,
            Opcode::End => Instruction::End,
            _ => return None,
        };
        Some(instr)
    }

    /// Build an instruction taking a number. `None` for other opcodes.
    pub fn with_number(opcode: Opcode, n: Number) -> Option<Self> {
        match opcode {
            Opcode::Push => Some(Instruction::Push(n)),
            Opcode::Copy => Some(Instruction::Copy(n)),
            Opcode::Slide => Some(Instruction::Slide(n)),
            _ => None,
        }
    }

    /// Build an instruction taking a label. `None` for other opcodes.
    pub fn with_label(opcode: Opcode, label: Label) -> Option<Self> {
        match opcode {
            Opcode::Mark => Some(Instruction::Mark(label)),
            Opcode::Call => Some(Instruction::Call(label)),
            Opcode::Jump => Some(Instruction::Jump(label)),
            Opcode::JumpZero => Some(Instruction::JumpZero(label)),
            Opcode::JumpNegative => Some(Instruction::JumpNegative(label)),
            Opcode::Foreign => Some(Instruction::Foreign(label)),
            _ => None,
        }
    }

    /// The operand, if any.
    pub fn operand(&self) -> Option<Operand<'_>> {
        match self {
            Instruction::Push(n) | Instruction::Copy(n) | Instruction::Slide(n) => {
                Some(Operand::Number(n))
            }
            Instruction::Mark(l)
            | Instruction::Call(l)
            | Instruction::Jump(l)
            | Instruction::JumpZero(l)
            | Instruction::JumpNegative(l)
            | Instruction::Foreign(l) => Some(Operand::Label(l)),
            _ => None,
        }
    }

    /// Canonical symbol form: opcode path, literal digits and terminator.
    pub fn encode(&self) -> Vec<Symbol> {
        let mut out = self.opcode().path().to_vec();
        match self.operand() {
            Some(Operand::Number(n)) => {
                out.extend_from_slice(n.digits());
                out.push(Symbol::L);
            }
            Some(Operand::Label(l)) => {
                out.extend_from_slice(l.digits());
                out.push(Symbol::L);
            }
            None => {}
        }
        out
    }
}

/// An immutable instruction sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Wrap a sequence of instructions.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Iterate over the instructions.
    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// The instructions as a slice.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Whether the program contains an `END`.
    pub fn has_end(&self) -> bool {
        self.instructions.iter().any(|i| *i == Instruction::End)
    }

    /// Canonical symbol form of the whole program.
    pub fn encode(&self) -> Vec<Symbol> {
        self.instructions.iter().flat_map(Instruction::encode).collect()
    }
}

impl Index<usize> for Program {
    type Output = Instruction;

    fn index(&self, index: usize) -> &Instruction {
        &self.instructions[index]
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self::new(instructions)
    }
}

impl FromIterator<Instruction> for Program {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::symbol::letters;

    #[test]
    fn test_paths_are_prefix_free() {
        for a in Opcode::ALL {
            for b in Opcode::ALL {
                if a == b {
                    continue;
                }
                assert!(
                    !b.path().starts_with(a.path()),
                    "{:?} path is a prefix of {:?}", a, b
                );
            }
        }
    }

    #[test]
    fn test_mnemonic_roundtrip() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(op));
            assert_eq!(Opcode::from_mnemonic(&op.mnemonic().to_lowercase()), Some(op));
        }
        assert_eq!(Opcode::from_mnemonic("SKIP"), Some(Opcode::Slide));
        assert_eq!(Opcode::from_mnemonic("nope"), None);
    }

    #[test]
    fn test_constructors_match_arity() {
        for op in Opcode::ALL {
            match op.literal() {
                None => assert_eq!(Instruction::nullary(op).map(|i| i.opcode()), Some(op)),
                Some(LiteralKind::Number) => {
                    assert!(Instruction::nullary(op).is_none());
                    let instr = Instruction::with_number(op, Number::new(1)).unwrap();
                    assert_eq!(instr.opcode(), op);
                }
                Some(LiteralKind::Label) => {
                    assert!(Instruction::with_label(op, Label::new(1u32)).is_some());
                    assert!(Instruction::with_number(op, Number::new(1)).is_none());
                }
            }
        }
    }

    #[test]
    fn test_encode_push() {
        let instr = Instruction::Push(Number::new(-1));
        assert_eq!(letters(&instr.encode()), "SSTSL");
        assert_eq!(letters(&Instruction::Add.encode()), "TSSS");
        assert_eq!(letters(&Instruction::Jump(Label::new(2u32)).encode()), "LSLTSL");
    }
}
