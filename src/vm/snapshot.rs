//! Serializable view of the final VM state.

use std::collections::BTreeMap;
use std::fmt;
use num_bigint::BigInt;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Stack (bottom first) and heap (ordered by key) at a point in time.
///
/// Serializes integers as decimal strings so values of any size survive JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    #[serde(serialize_with = "decimal_seq")]
    pub stack: Vec<BigInt>,
    #[serde(serialize_with = "decimal_map")]
    pub heap: BTreeMap<BigInt, BigInt>,
}

impl Snapshot {
    pub fn new(stack: Vec<BigInt>, heap: BTreeMap<BigInt, BigInt>) -> Self {
        Self { stack, heap }
    }

    /// Top of stack, if any.
    pub fn top(&self) -> Option<&BigInt> {
        self.stack.last()
    }

    /// Pretty JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn decimal_seq<S: Serializer>(values: &[BigInt], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(values.len()))?;
    for value in values {
        seq.serialize_element(&value.to_string())?;
    }
    seq.end()
}

fn decimal_map<S: Serializer>(
    cells: &BTreeMap<BigInt, BigInt>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(cells.len()))?;
    for (key, value) in cells {
        map.serialize_entry(&key.to_string(), &value.to_string())?;
    }
    map.end()
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stack: Vec<String> = self.stack.iter().map(BigInt::to_string).collect();
        let heap: Vec<String> = self.heap.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "stack: [{}]\nheap:  {{{}}}", stack.join(", "), heap.join(", "))
    }
}
