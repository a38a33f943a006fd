//! The VM heap: an unbounded key → value store.
//!
//! Not a memory allocator. Keys and values are arbitrary-precision integers;
//! any integer is a valid key.

use std::collections::{BTreeMap, HashMap};
use num_bigint::BigInt;
use crate::vm::engine::VmError;

/// Associative storage addressed by integer keys.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Heap {
    cells: HashMap<BigInt, BigInt>,
}

impl Heap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self { cells: HashMap::new() }
    }

    /// Write `value` at `key`, replacing any previous value.
    #[inline]
    pub fn store(&mut self, key: BigInt, value: BigInt) {
        self.cells.insert(key, value);
    }

    /// Read the value at `key`.
    pub fn retrieve(&self, key: &BigInt) -> Result<BigInt, VmError> {
        self.cells
            .get(key)
            .cloned()
            .ok_or_else(|| VmError::KeyError(key.clone()))
    }

    /// Read the value at `key`, if present.
    #[inline]
    pub fn get(&self, key: &BigInt) -> Option<&BigInt> {
        self.cells.get(key)
    }

    /// Number of stored cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over cells in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&BigInt, &BigInt)> {
        self.cells.iter()
    }

    /// Cells ordered by key (for display and comparison).
    pub fn sorted(&self) -> BTreeMap<BigInt, BigInt> {
        self.cells.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Remove all cells.
    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

impl Extend<(BigInt, BigInt)> for Heap {
    fn extend<I: IntoIterator<Item = (BigInt, BigInt)>>(&mut self, iter: I) {
        self.cells.extend(iter);
    }
}

impl FromIterator<(BigInt, BigInt)> for Heap {
    fn from_iter<I: IntoIterator<Item = (BigInt, BigInt)>>(iter: I) -> Self {
        Self { cells: iter.into_iter().collect() }
    }
}

impl std::fmt::Debug for Heap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.sorted()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_retrieve() {
        let mut heap = Heap::new();
        heap.store(BigInt::from(3), BigInt::from(1));
        assert_eq!(heap.retrieve(&BigInt::from(3)).unwrap(), BigInt::from(1));
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let heap = Heap::new();
        assert_eq!(heap.retrieve(&BigInt::from(-4)), Err(VmError::KeyError(BigInt::from(-4))));
    }

    #[test]
    fn test_overwrite() {
        let mut heap = Heap::new();
        heap.store(BigInt::from(1), BigInt::from(1));
        heap.store(BigInt::from(1), BigInt::from(2));
        assert_eq!(heap.get(&BigInt::from(1)), Some(&BigInt::from(2)));
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn test_sorted_order() {
        let heap: Heap = [(5, 0), (-1, 0), (2, 0)]
            .into_iter()
            .map(|(k, v)| (BigInt::from(k), BigInt::from(v)))
            .collect();
        let keys: Vec<BigInt> = heap.sorted().into_keys().collect();
        assert_eq!(keys, vec![BigInt::from(-1), BigInt::from(2), BigInt::from(5)]);
    }
}
