//! Operand stack.

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};
use crate::vm::engine::VmError;

/// LIFO stack of arbitrary-precision integers. The top is the last element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    items: Vec<BigInt>,
}

impl Stack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    #[inline]
    pub fn push(&mut self, value: BigInt) {
        self.items.push(value);
    }

    /// Remove and return the top item.
    pub fn pop(&mut self) -> Result<BigInt, VmError> {
        self.items.pop().ok_or(VmError::StackUnderflow { needed: 1, depth: 0 })
    }

    /// Remove the top `n` items, returned in push order (deepest first).
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<BigInt>, VmError> {
        self.require(n)?;
        let split = self.items.len() - n;
        Ok(self.items.split_off(split))
    }

    /// Borrow the top item.
    pub fn peek(&self) -> Result<&BigInt, VmError> {
        self.items.last().ok_or(VmError::StackUnderflow { needed: 1, depth: 0 })
    }

    /// Push a copy of the top item.
    pub fn dup(&mut self) -> Result<(), VmError> {
        let top = self.peek()?.clone();
        self.items.push(top);
        Ok(())
    }

    /// Push a copy of the item `index` places below the top (0 = top).
    pub fn copy(&mut self, index: &BigInt) -> Result<(), VmError> {
        let depth = self.items.len();
        let offset = index
            .to_usize()
            .filter(|i| *i < depth)
            .ok_or_else(|| VmError::StackUnderflow {
                needed: index.to_usize().map_or(usize::MAX, |i| i.saturating_add(1)),
                depth,
            })?;
        let value = self.items[depth - 1 - offset].clone();
        self.items.push(value);
        Ok(())
    }

    /// Exchange the two topmost items.
    pub fn swap(&mut self) -> Result<(), VmError> {
        self.require(2)?;
        let len = self.items.len();
        self.items.swap(len - 1, len - 2);
        Ok(())
    }

    /// Remove `n` items directly beneath the top, keeping the top.
    ///
    /// With fewer than `n + 1` items the stack collapses to just the top.
    /// A negative count removes nothing.
    pub fn slide(&mut self, n: &BigInt) -> Result<(), VmError> {
        let top = self.pop()?;
        if !n.is_negative() {
            let keep = match n.to_usize() {
                Some(n) => self.items.len().saturating_sub(n),
                None => 0,
            };
            self.items.truncate(keep);
        }
        self.items.push(top);
        Ok(())
    }

    fn require(&self, needed: usize) -> Result<(), VmError> {
        let depth = self.items.len();
        if depth < needed {
            return Err(VmError::StackUnderflow { needed, depth });
        }
        Ok(())
    }

    /// Number of items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items from bottom to top.
    pub fn as_slice(&self) -> &[BigInt] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Extend<BigInt> for Stack {
    fn extend<I: IntoIterator<Item = BigInt>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl From<Vec<BigInt>> for Stack {
    fn from(items: Vec<BigInt>) -> Self {
        Self { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(values: &[i64]) -> Stack {
        Stack::from(values.iter().map(|v| BigInt::from(*v)).collect::<Vec<_>>())
    }

    fn values(stack: &Stack) -> Vec<i64> {
        stack.as_slice().iter().map(|v| v.to_i64().unwrap()).collect()
    }

    #[test]
    fn test_pop_empty_fails() {
        let mut s = Stack::new();
        assert_eq!(s.pop(), Err(VmError::StackUnderflow { needed: 1, depth: 0 }));
    }

    #[test]
    fn test_push_pop_is_noop() {
        let mut s = stack(&[1, 2]);
        s.push(BigInt::from(9));
        s.pop().unwrap();
        assert_eq!(values(&s), vec![1, 2]);
    }

    #[test]
    fn test_dup_swap_pop_leaves_x() {
        let mut s = Stack::new();
        s.push(BigInt::from(7));
        s.dup().unwrap();
        s.swap().unwrap();
        s.pop().unwrap();
        assert_eq!(values(&s), vec![7]);
    }

    #[test]
    fn test_copy_counts_from_top() {
        let mut s = stack(&[10, 20, 30]);
        s.copy(&BigInt::from(0)).unwrap();
        assert_eq!(values(&s), vec![10, 20, 30, 30]);
        s.copy(&BigInt::from(3)).unwrap();
        assert_eq!(values(&s), vec![10, 20, 30, 30, 10]);
    }

    #[test]
    fn test_copy_out_of_range() {
        let mut s = stack(&[1]);
        assert!(matches!(s.copy(&BigInt::from(1)), Err(VmError::StackUnderflow { .. })));
        assert!(matches!(s.copy(&BigInt::from(-1)), Err(VmError::StackUnderflow { .. })));
    }

    #[test]
    fn test_slide_keeps_top() {
        let mut s = stack(&[1, 2, 3, 4]);
        s.slide(&BigInt::from(2)).unwrap();
        assert_eq!(values(&s), vec![1, 4]);
    }

    #[test]
    fn test_slide_collapses_short_stack() {
        let mut s = stack(&[1, 2, 3]);
        s.slide(&BigInt::from(5)).unwrap();
        assert_eq!(values(&s), vec![3]);
        // exactly n + 1 items is not short
        let mut s = stack(&[1, 2, 3]);
        s.slide(&BigInt::from(2)).unwrap();
        assert_eq!(values(&s), vec![3]);
    }

    #[test]
    fn test_slide_negative_is_noop() {
        let mut s = stack(&[1, 2, 3]);
        s.slide(&BigInt::from(-2)).unwrap();
        assert_eq!(values(&s), vec![1, 2, 3]);
    }

    #[test]
    fn test_pop_n_order() {
        let mut s = stack(&[1, 2, 3]);
        let args = s.pop_n(2).unwrap();
        assert_eq!(args, vec![BigInt::from(2), BigInt::from(3)]);
        assert_eq!(values(&s), vec![1]);
        assert_eq!(s.pop_n(2), Err(VmError::StackUnderflow { needed: 2, depth: 1 }));
    }
}
