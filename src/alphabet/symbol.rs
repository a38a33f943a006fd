//! The three-symbol alphabet.
//!
//! Every program, whatever its surface style, is reduced to a stream of
//! these three symbols before tokenizing:
//! - `S` (space)
//! - `T` (tab)
//! - `L` (line feed)

use std::fmt;
use serde::{Serialize, Deserialize};

/// One symbol of the abstract alphabet.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Symbol {
    /// Space. Binary digit 0 inside a literal, sign `+` for numbers.
    S = 0,
    /// Tab. Binary digit 1 inside a literal, sign `-` for numbers.
    T = 1,
    /// Line feed. Terminates literals.
    L = 2,
}

impl Symbol {
    /// All symbols in slot order: S, T, L
    pub const ALL: [Symbol; 3] = [Symbol::S, Symbol::T, Symbol::L];

    /// Slot index (0, 1 or 2), used by the tokenizer trie.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Binary digit carried by this symbol inside a literal.
    ///
    /// Returns `None` for the terminator `L`.
    #[inline]
    pub const fn bit(self) -> Option<bool> {
        match self {
            Symbol::S => Some(false),
            Symbol::T => Some(true),
            Symbol::L => None,
        }
    }

    /// Symbol for a binary digit.
    #[inline]
    pub const fn from_bit(bit: bool) -> Self {
        if bit { Symbol::T } else { Symbol::S }
    }

    /// Parse the letter form (`S`, `T`, `L`, case-insensitive).
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'S' | 's' => Some(Symbol::S),
            'T' | 't' => Some(Symbol::T),
            'L' | 'l' => Some(Symbol::L),
            _ => None,
        }
    }

    /// Letter form of the symbol.
    #[inline]
    pub const fn letter(self) -> char {
        match self {
            Symbol::S => 'S',
            Symbol::T => 'T',
            Symbol::L => 'L',
        }
    }

    /// The character this symbol stands for in the original whitespace syntax.
    #[inline]
    pub const fn whitespace(self) -> char {
        match self {
            Symbol::S => ' ',
            Symbol::T => '\t',
            Symbol::L => '\n',
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Render a symbol slice in letter form, e.g. `SSTL`.
pub fn letters(symbols: &[Symbol]) -> String {
    symbols.iter().map(|s| s.letter()).collect()
}

/// Parse a letter-form string, ignoring any other characters.
pub fn from_letters(text: &str) -> Vec<Symbol> {
    text.chars().filter_map(Symbol::from_letter).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_roundtrip() {
        for bit in [false, true] {
            assert_eq!(Symbol::from_bit(bit).bit(), Some(bit));
        }
        assert_eq!(Symbol::L.bit(), None);
    }

    #[test]
    fn test_letter_roundtrip() {
        for s in Symbol::ALL {
            assert_eq!(Symbol::from_letter(s.letter()), Some(s));
        }
        assert_eq!(Symbol::from_letter('x'), None);
    }

    #[test]
    fn test_slot_indices_are_distinct() {
        let indices: Vec<usize> = Symbol::ALL.iter().map(|s| s.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_letters_helpers() {
        let symbols = from_letters("s t-L x");
        assert_eq!(symbols, vec![Symbol::S, Symbol::T, Symbol::L]);
        assert_eq!(letters(&symbols), "STL");
    }
}
