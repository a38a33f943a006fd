//! Assembler for Whitespace programs.
//!
//! Syntax:
//! ```text
//! # Comment
//! ; Also a comment
//!     push 1          # mnemonics are case-insensitive
//!     PUSH -0x1F      ; hex, optionally negative
//!     PUSH 'a'        # character literal (\n \t \r \0 \\ \' escapes)
//!     PUSH b0101      # already-encoded digits, sign bit included
//!     MARK 3          # labels are non-negative
//!     JUMP 3
//!     PUSHS "hi"      # macro, see `asm::macros`
//!     END
//! ```

use num_bigint::{BigInt, BigUint};
use thiserror::Error;
use crate::alphabet::{Number, Label, Style, Symbol};
use crate::alphabet::symbol::letters;
use crate::asm::macros::{Macro, MacroError};
use crate::vm::{Instruction, LiteralKind, Opcode, Program};

/// Assembled program plus the canonical symbol text of each instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    pub program: Program,
    /// One entry per instruction: opcode path, literal digits, terminator.
    pub lines: Vec<String>,
}

impl Assembly {
    /// Symbol form of the whole program.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.program.encode()
    }

    /// Render the program in the given style.
    pub fn render(&self, style: &Style) -> String {
        style.render(&self.symbols())
    }
}

/// Assemble source text.
pub fn assemble(source: &str) -> Result<Assembly, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)?;
    Ok(asm.finish())
}

/// The assembler state.
struct Assembler {
    instructions: Vec<Instruction>,
}

impl Assembler {
    fn new() -> Self {
        Self { instructions: Vec::new() }
    }

    fn assemble(&mut self, source: &str) -> Result<(), AssemblerError> {
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }
        Ok(())
    }

    fn finish(self) -> Assembly {
        let lines = self.instructions.iter().map(|i| letters(&i.encode())).collect();
        Assembly {
            program: Program::new(self.instructions),
            lines,
        }
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            return Ok(());
        }

        let (mnemonic, argument) = match line.split_once(char::is_whitespace) {
            Some((m, rest)) => (m, Some(rest.trim()).filter(|a| !a.is_empty())),
            None => (line, None),
        };

        if let Some(mac) = Macro::from_name(mnemonic) {
            let expanded = mac
                .expand(argument)
                .map_err(|source| AssemblerError::MacroError { line: line_num, source })?;
            for text in &expanded {
                self.process_line(text, line_num)?;
            }
            return Ok(());
        }

        let instr = parse_instruction(mnemonic, argument, line_num)?;
        self.instructions.push(instr);
        Ok(())
    }
}

/// Cut a trailing `#` or `;` comment, ignoring markers inside quotes.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '#') | (None, ';') => return &line[..idx],
            (None, _) => {}
        }
    }
    line
}

fn parse_instruction(
    mnemonic: &str,
    argument: Option<&str>,
    line_num: usize,
) -> Result<Instruction, AssemblerError> {
    let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| AssemblerError::UnknownMnemonic {
        line: line_num,
        mnemonic: mnemonic.to_string(),
    })?;

    let instr = match (opcode.literal(), argument) {
        (None, None) => Instruction::nullary(opcode),
        (None, Some(arg)) => {
            return Err(AssemblerError::UnexpectedArgument {
                line: line_num,
                mnemonic: opcode.mnemonic(),
                argument: arg.to_string(),
            });
        }
        (Some(_), None) => {
            return Err(AssemblerError::MissingArgument {
                line: line_num,
                mnemonic: opcode.mnemonic(),
            });
        }
        (Some(LiteralKind::Number), Some(arg)) => {
            Instruction::with_number(opcode, parse_number(arg, line_num)?)
        }
        (Some(LiteralKind::Label), Some(arg)) => {
            Instruction::with_label(opcode, parse_label(arg, line_num)?)
        }
    };

    // literal() and the constructors agree on every opcode
    instr.ok_or_else(|| AssemblerError::UnknownMnemonic {
        line: line_num,
        mnemonic: mnemonic.to_string(),
    })
}

/// Parse a number argument.
pub fn parse_number(text: &str, line_num: usize) -> Result<Number, AssemblerError> {
    if let Some(bits) = text.strip_prefix('b') {
        return Number::from_bits(bits).map_err(|e| invalid(text, line_num, e.to_string()));
    }
    parse_integer(text, line_num).map(Number::new)
}

/// Parse a label argument. Negative values are rejected.
pub fn parse_label(text: &str, line_num: usize) -> Result<Label, AssemblerError> {
    if let Some(bits) = text.strip_prefix('b') {
        return Label::from_bits(bits).map_err(|e| invalid(text, line_num, e.to_string()));
    }
    let value = parse_integer(text, line_num)?;
    let value: BigUint = value.to_biguint().ok_or_else(|| AssemblerError::ValueOutOfRange {
        line: line_num,
        value: value.to_string(),
    })?;
    Ok(Label::new(value))
}

/// Decimal, `0x` hex (either optionally negative) or a character literal.
fn parse_integer(text: &str, line_num: usize) -> Result<BigInt, AssemblerError> {
    if text.starts_with('\'') {
        return parse_char(text, line_num).map(|c| BigInt::from(c as u32));
    }

    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (radix, digits) = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(hex) => (16, hex),
        None => (10, body),
    };
    if digits.is_empty() || digits.starts_with(&['+', '-'][..]) {
        return Err(invalid(text, line_num, "expected digits".into()));
    }
    let magnitude = BigInt::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| invalid(text, line_num, format!("not a base-{} integer", radix)))?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Parse `'c'` with the usual escapes.
fn parse_char(text: &str, line_num: usize) -> Result<char, AssemblerError> {
    let inner = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| invalid(text, line_num, "unterminated character literal".into()))?;

    let mut chars = inner.chars();
    let c = match (chars.next(), chars.next(), chars.next()) {
        (Some('\\'), Some(escape), None) => match escape {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '\'' => '\'',
            other => {
                return Err(invalid(text, line_num, format!("unknown escape \\{}", other)));
            }
        },
        (Some(c), None, None) if c != '\\' => c,
        _ => return Err(invalid(text, line_num, "expected a single character".into())),
    };
    Ok(c)
}

fn invalid(literal: &str, line: usize, message: String) -> AssemblerError {
    AssemblerError::InvalidLiteral {
        line,
        literal: literal.to_string(),
        message,
    }
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("{mnemonic} on line {line} requires an argument")]
    MissingArgument { line: usize, mnemonic: &'static str },

    #[error("{mnemonic} on line {line} takes no argument, found `{argument}`")]
    UnexpectedArgument {
        line: usize,
        mnemonic: &'static str,
        argument: String,
    },

    #[error("invalid literal `{literal}` on line {line}: {message}")]
    InvalidLiteral {
        line: usize,
        literal: String,
        message: String,
    },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: String },

    #[error("macro error on line {line}: {source}")]
    MacroError { line: usize, source: MacroError },
}

impl AssemblerError {
    /// Source line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            AssemblerError::UnknownMnemonic { line, .. }
            | AssemblerError::MissingArgument { line, .. }
            | AssemblerError::UnexpectedArgument { line, .. }
            | AssemblerError::InvalidLiteral { line, .. }
            | AssemblerError::ValueOutOfRange { line, .. }
            | AssemblerError::MacroError { line, .. } => *line,
        }
    }
}
