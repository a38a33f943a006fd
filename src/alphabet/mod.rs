//! The symbol alphabet and everything written in it.
//!
//! - [`Symbol`] - one of the three symbols `S`, `T`, `L`
//! - [`Number`] / [`Label`] - literals in the two-symbol numeral system
//! - [`Style`] - how raw source characters map onto symbols

pub mod symbol;
pub mod literal;
pub mod style;

pub use symbol::Symbol;
pub use literal::{Number, Label, LiteralError, encode_number, decode_number, encode_label, decode_label};
pub use style::{Style, StyleSpec, StyleError};
