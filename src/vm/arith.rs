//! Arbitrary-precision arithmetic for the five arithmetic opcodes.
//!
//! Division rounds toward negative infinity, so the remainder always takes
//! the sign of the divisor: `-7 / 2 = -4`, `-7 % 2 = 1`.

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use crate::vm::engine::VmError;
use crate::vm::opcode::Opcode;

/// Floor division and the matching modulo in one pass.
pub fn floor_div_mod(left: &BigInt, right: &BigInt) -> Result<(BigInt, BigInt), VmError> {
    if right.is_zero() {
        return Err(VmError::DivisionByZero);
    }
    let quotient = left / right;
    let remainder = left % right;
    // BigInt division truncates; shift toward -inf when signs differ
    if !remainder.is_zero() && remainder.is_negative() != right.is_negative() {
        Ok((quotient - BigInt::one(), remainder + right))
    } else {
        Ok((quotient, remainder))
    }
}

/// Floor division.
pub fn floor_div(left: &BigInt, right: &BigInt) -> Result<BigInt, VmError> {
    floor_div_mod(left, right).map(|(q, _)| q)
}

/// Modulo with the sign of the divisor.
pub fn floor_mod(left: &BigInt, right: &BigInt) -> Result<BigInt, VmError> {
    floor_div_mod(left, right).map(|(_, r)| r)
}

/// Apply an arithmetic opcode: `left op right`.
///
/// `left` is the operand pushed first, `right` the one on top.
pub fn apply(op: Opcode, left: &BigInt, right: &BigInt) -> Result<BigInt, VmError> {
    match op {
        Opcode::Add => Ok(left + right),
        Opcode::Sub => Ok(left - right),
        Opcode::Mul => Ok(left * right),
        Opcode::Div => floor_div(left, right),
        Opcode::Mod => floor_mod(left, right),
        other => unreachable!("{} is not an arithmetic opcode", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn big(n: i64) -> BigInt {
        BigInt::from(n)
    }

    #[test]
    fn test_floor_division_examples() {
        assert_eq!(floor_div(&big(-7), &big(2)).unwrap(), big(-4));
        assert_eq!(floor_mod(&big(-7), &big(2)).unwrap(), big(1));
        assert_eq!(floor_div(&big(7), &big(-2)).unwrap(), big(-4));
        assert_eq!(floor_mod(&big(7), &big(-2)).unwrap(), big(-1));
        assert_eq!(floor_div(&big(-7), &big(-2)).unwrap(), big(3));
        assert_eq!(floor_mod(&big(-7), &big(-2)).unwrap(), big(-1));
        assert_eq!(floor_mod(&big(6), &big(3)).unwrap(), big(0));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(floor_div(&big(1), &big(0)), Err(VmError::DivisionByZero));
        assert_eq!(apply(Opcode::Mod, &big(1), &big(0)), Err(VmError::DivisionByZero));
    }

    #[test]
    fn test_operand_order() {
        assert_eq!(apply(Opcode::Sub, &big(10), &big(3)).unwrap(), big(7));
        assert_eq!(apply(Opcode::Div, &big(10), &big(3)).unwrap(), big(3));
    }

    proptest! {
        #[test]
        fn prop_floor_division_law(a in any::<i64>(), b in any::<i64>().prop_filter("nonzero", |b| *b != 0)) {
            let (a, b) = (big(a), big(b));
            let (q, r) = floor_div_mod(&a, &b).unwrap();
            prop_assert_eq!(&q * &b + &r, a);
            prop_assert!(r.is_zero() || r.is_negative() == b.is_negative());
            prop_assert!(r.abs() < b.abs());
        }
    }
}
