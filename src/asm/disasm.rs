//! Disassembler for Whitespace programs.
//!
//! Converts a decoded program back to assembler text. Numbers print as
//! signed decimal and labels as unsigned decimal, so the output assembles
//! back into an equal program.

use std::fmt;
use crate::alphabet::symbol::letters;
use crate::vm::{Instruction, Operand, Program};

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand() {
            Some(Operand::Number(n)) => write!(f, "{} {}", self.opcode(), n.value()),
            Some(Operand::Label(l)) => write!(f, "{} {}", self.opcode(), l.value()),
            None => write!(f, "{}", self.opcode()),
        }
    }
}

/// Disassemble a single instruction to text.
pub fn disassemble_instruction(instr: &Instruction) -> String {
    instr.to_string()
}

/// Disassemble a whole program.
pub fn disassemble(program: &Program) -> String {
    let mut output = String::new();
    output.push_str("# Whitespace disassembly\n");
    output.push_str(&format!("# {} instructions\n", program.len()));

    for instr in program {
        output.push_str(&disassemble_instruction(instr));
        output.push('\n');
    }

    output
}

/// Listing with instruction indices and symbol text, for display only.
pub fn listing(program: &Program) -> String {
    let mut output = String::new();
    for (index, instr) in program.iter().enumerate() {
        output.push_str(&format!("{:04}: {:<16} # {}\n", index, instr.to_string(), letters(&instr.encode())));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{Label, Number};
    use crate::asm::assemble;

    #[test]
    fn test_format() {
        assert_eq!(Instruction::Push(Number::new(-5)).to_string(), "PUSH -5");
        assert_eq!(Instruction::Jump(Label::new(12u32)).to_string(), "JUMP 12");
        assert_eq!(Instruction::PrintChar.to_string(), "PCHR");
    }

    #[test]
    fn test_disassemble_reassembles() {
        let program = Program::new(vec![
            Instruction::Push(Number::new(-300)),
            Instruction::Mark(Label::new(0u32)),
            Instruction::Copy(Number::new(0)),
            Instruction::Slide(Number::new(2)),
            Instruction::Store,
            Instruction::JumpZero(Label::new(7u32)),
            Instruction::Call(Label::new(1u32)),
            Instruction::Foreign(Label::new(2u32)),
            Instruction::Return,
            Instruction::End,
        ]);
        let text = disassemble(&program);
        assert!(text.starts_with('#'));
        assert_eq!(assemble(&text).unwrap().program, program);
    }

    #[test]
    fn test_listing() {
        let program = Program::new(vec![Instruction::Add]);
        assert_eq!(listing(&program), format!("0000: {:<16} # TSSS\n", "ADD"));
    }
}
