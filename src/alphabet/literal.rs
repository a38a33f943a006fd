//! Literal codec.
//!
//! Literals are written as binary digits over the alphabet (`S` = 0,
//! `T` = 1) and end at the first `L`, which is not part of the literal.
//!
//! Numbers carry a leading sign symbol (`S` = non-negative, `T` = negative).
//! The magnitude of a negative number is stored as the *bitwise complement*
//! of the binary form of its absolute value, so `-5` (binary `101`) is
//! written `TSTS`: the sign `T` followed by `010`. Labels are plain unsigned
//! magnitudes without a sign.
//!
//! Equality and hashing of [`Number`] and [`Label`] only look at the value:
//! `S SSST` and `S T` are the same number.

use std::fmt;
use std::hash::{Hash, Hasher};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{Signed, Zero};
use thiserror::Error;
use crate::alphabet::Symbol;

/// A signed literal (push, copy and slide operands).
#[derive(Clone)]
pub struct Number {
    value: BigInt,
    /// Sign symbol followed by the magnitude digits. Never contains `L`.
    digits: Vec<Symbol>,
}

/// An unsigned literal (mark, jump, call and foreign-call targets).
#[derive(Clone)]
pub struct Label {
    value: BigUint,
    /// Magnitude digits. Never contains `L`.
    digits: Vec<Symbol>,
}

// ============================================================================
// Codec
// ============================================================================

/// Encode an unsigned magnitude as binary digits, most significant first.
///
/// Zero encodes as a single `S`.
fn encode_magnitude(magnitude: &BigUint) -> Vec<Symbol> {
    magnitude
        .to_str_radix(2)
        .chars()
        .map(|c| Symbol::from_bit(c == '1'))
        .collect()
}

/// Decode binary digits into a magnitude, optionally complementing each bit.
fn decode_magnitude(digits: &[Symbol], complement: bool) -> Result<BigUint, LiteralError> {
    let mut value = BigUint::zero();
    for (offset, symbol) in digits.iter().enumerate() {
        let bit = symbol.bit().ok_or(LiteralError::Terminator(offset))?;
        value <<= 1usize;
        if bit != complement {
            value += 1u32;
        }
    }
    Ok(value)
}

/// Encode a signed integer: sign symbol plus (possibly complemented) magnitude.
pub fn encode_number(value: &BigInt) -> Vec<Symbol> {
    let negative = value.is_negative();
    let mut digits = Vec::with_capacity(value.bits() as usize + 2);
    digits.push(Symbol::from_bit(negative));
    digits.extend(encode_magnitude(value.magnitude()).into_iter().map(|s| {
        if negative {
            Symbol::from_bit(s == Symbol::S)
        } else {
            s
        }
    }));
    digits
}

/// Decode a signed integer. An empty digit string, or a lone sign, is zero.
pub fn decode_number(digits: &[Symbol]) -> Result<BigInt, LiteralError> {
    let Some((sign, magnitude)) = digits.split_first() else {
        return Ok(BigInt::zero());
    };
    let negative = sign.bit().ok_or(LiteralError::Terminator(0))?;
    let magnitude = decode_magnitude(magnitude, negative)
        .map_err(|e| e.shifted(1))?;
    let sign = if negative { Sign::Minus } else { Sign::Plus };
    Ok(BigInt::from_biguint(sign, magnitude))
}

/// Encode an unsigned label.
pub fn encode_label(value: &BigUint) -> Vec<Symbol> {
    encode_magnitude(value)
}

/// Decode an unsigned label. An empty digit string is label `0`.
pub fn decode_label(digits: &[Symbol]) -> Result<BigUint, LiteralError> {
    decode_magnitude(digits, false)
}

/// Parse `0`/`1` text into symbols.
fn bits_to_symbols(bits: &str) -> Result<Vec<Symbol>, LiteralError> {
    bits.chars()
        .map(|c| match c {
            '0' => Ok(Symbol::S),
            '1' => Ok(Symbol::T),
            other => Err(LiteralError::InvalidBit(other)),
        })
        .collect()
}

/// Render symbols as `0`/`1` text.
fn symbols_to_bits(digits: &[Symbol]) -> String {
    digits
        .iter()
        .map(|s| if *s == Symbol::T { '1' } else { '0' })
        .collect()
}

// ============================================================================
// Number
// ============================================================================

impl Number {
    /// Create a number with its canonical digit string.
    pub fn new(value: impl Into<BigInt>) -> Self {
        let value = value.into();
        let digits = encode_number(&value);
        Self { value, digits }
    }

    /// Decode a digit string as written in a program (terminator excluded).
    ///
    /// The digits are kept verbatim, padding included.
    pub fn from_digits(digits: Vec<Symbol>) -> Result<Self, LiteralError> {
        let value = decode_number(&digits)?;
        Ok(Self { value, digits })
    }

    /// Decode `0`/`1` text holding the sign bit and the encoded magnitude.
    pub fn from_bits(bits: &str) -> Result<Self, LiteralError> {
        Self::from_digits(bits_to_symbols(bits)?)
    }

    /// The integer value.
    #[inline]
    pub fn value(&self) -> &BigInt {
        &self.value
    }

    /// Consume the literal, keeping the value.
    #[inline]
    pub fn into_value(self) -> BigInt {
        self.value
    }

    /// The digit string (sign first, no terminator).
    #[inline]
    pub fn digits(&self) -> &[Symbol] {
        &self.digits
    }

    /// The digit string as `0`/`1` text.
    pub fn to_bits(&self) -> String {
        symbols_to_bits(&self.digits)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Debug for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Number({})", self.value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::new(value)
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::new(value)
    }
}

// ============================================================================
// Label
// ============================================================================

impl Label {
    /// Create a label with its canonical digit string.
    pub fn new(value: impl Into<BigUint>) -> Self {
        let value = value.into();
        let digits = encode_label(&value);
        Self { value, digits }
    }

    /// Decode a digit string as written in a program (terminator excluded).
    pub fn from_digits(digits: Vec<Symbol>) -> Result<Self, LiteralError> {
        let value = decode_label(&digits)?;
        Ok(Self { value, digits })
    }

    /// Decode `0`/`1` text holding the label digits.
    pub fn from_bits(bits: &str) -> Result<Self, LiteralError> {
        Self::from_digits(bits_to_symbols(bits)?)
    }

    /// The label value.
    #[inline]
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// The digit string (no terminator).
    #[inline]
    pub fn digits(&self) -> &[Symbol] {
        &self.digits
    }

    /// The digit string as `0`/`1` text.
    pub fn to_bits(&self) -> String {
        symbols_to_bits(&self.digits)
    }

    /// The label as a signed integer, for pushing onto the operand stack.
    pub fn to_bigint(&self) -> BigInt {
        BigInt::from(self.value.clone())
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({})", self.value)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<u64> for Label {
    fn from(value: u64) -> Self {
        Label::new(value)
    }
}

impl From<BigUint> for Label {
    fn from(value: BigUint) -> Self {
        Label::new(value)
    }
}

/// Errors raised while decoding a literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("terminator inside literal at digit {0}")]
    Terminator(usize),

    #[error("invalid binary digit '{0}'")]
    InvalidBit(char),
}

impl LiteralError {
    fn shifted(self, by: usize) -> Self {
        match self {
            LiteralError::Terminator(offset) => LiteralError::Terminator(offset + by),
            other => other,
        }
    }
}
