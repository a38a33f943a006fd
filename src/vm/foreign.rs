//! Host functions reachable through the `FFI` opcode.
//!
//! The host fills a [`ForeignRegistry`] before a run and hands it to the VM.
//! There is no global registry: every VM sees only the bindings it was given.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use num_bigint::{BigInt, BigUint};
use crate::alphabet::{Number, Label};
use crate::vm::engine::VmError;

/// Signature of a host function. Arguments arrive in push order.
pub type HostFn = dyn Fn(&[BigInt]) -> Result<HostValue, VmError> + Send + Sync;

/// Value returned by a host function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostValue {
    Number(Number),
    Label(Label),
    Int(BigInt),
    /// Not representable on the stack.
    Text(String),
    /// Not representable on the stack.
    Unit,
}

impl HostValue {
    /// Type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Number(_) => "number",
            HostValue::Label(_) => "label",
            HostValue::Int(_) => "integer",
            HostValue::Text(_) => "text",
            HostValue::Unit => "unit",
        }
    }

    /// Convert to a stack value. `None` for text and unit.
    pub fn into_stack_value(self) -> Option<BigInt> {
        match self {
            HostValue::Number(n) => Some(n.into_value()),
            HostValue::Label(l) => Some(l.to_bigint()),
            HostValue::Int(i) => Some(i),
            HostValue::Text(_) | HostValue::Unit => None,
        }
    }
}

impl From<BigInt> for HostValue {
    fn from(value: BigInt) -> Self {
        HostValue::Int(value)
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        HostValue::Int(BigInt::from(value))
    }
}

impl From<Number> for HostValue {
    fn from(value: Number) -> Self {
        HostValue::Number(value)
    }
}

impl From<Label> for HostValue {
    fn from(value: Label) -> Self {
        HostValue::Label(value)
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::Text(value)
    }
}

impl From<()> for HostValue {
    fn from(_: ()) -> Self {
        HostValue::Unit
    }
}

/// A registered host function.
#[derive(Clone)]
pub struct ForeignFn {
    name: String,
    arity: usize,
    func: Arc<HostFn>,
}

impl ForeignFn {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of stack values the function consumes.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Invoke the function.
    pub fn call(&self, args: &[BigInt]) -> Result<HostValue, VmError> {
        (self.func)(args)
    }
}

impl fmt::Debug for ForeignFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignFn")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Label → host function bindings.
#[derive(Debug, Clone, Default)]
pub struct ForeignRegistry {
    bindings: HashMap<BigUint, ForeignFn>,
}

impl ForeignRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { bindings: HashMap::new() }
    }

    /// Bind `func` to `label`, returning the previous binding if any.
    pub fn register<F>(
        &mut self,
        label: impl Into<BigUint>,
        name: &str,
        arity: usize,
        func: F,
    ) -> Option<ForeignFn>
    where
        F: Fn(&[BigInt]) -> Result<HostValue, VmError> + Send + Sync + 'static,
    {
        let binding = ForeignFn {
            name: name.to_string(),
            arity,
            func: Arc::new(func),
        };
        self.bindings.insert(label.into(), binding)
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<F>(mut self, label: impl Into<BigUint>, name: &str, arity: usize, func: F) -> Self
    where
        F: Fn(&[BigInt]) -> Result<HostValue, VmError> + Send + Sync + 'static,
    {
        self.register(label, name, arity, func);
        self
    }

    /// Remove a binding.
    pub fn unregister(&mut self, label: &BigUint) -> Option<ForeignFn> {
        self.bindings.remove(label)
    }

    /// Look up the binding for a label.
    pub fn get(&self, label: &BigUint) -> Option<&ForeignFn> {
        self.bindings.get(label)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bound labels with their functions.
    pub fn iter(&self) -> impl Iterator<Item = (&BigUint, &ForeignFn)> {
        self.bindings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_call() {
        let registry = ForeignRegistry::new()
            .with(7u32, "mul", 2, |args| Ok(HostValue::from(&args[0] * &args[1])));
        let binding = registry.get(&BigUint::from(7u32)).unwrap();
        assert_eq!(binding.arity(), 2);
        assert_eq!(binding.name(), "mul");
        let result = binding.call(&[BigInt::from(3), BigInt::from(2)]).unwrap();
        assert_eq!(result, HostValue::Int(BigInt::from(6)));
    }

    #[test]
    fn test_rebinding_returns_previous() {
        let mut registry = ForeignRegistry::new();
        assert!(registry.register(1u32, "a", 0, |_| Ok(HostValue::Unit)).is_none());
        let previous = registry.register(1u32, "b", 0, |_| Ok(HostValue::Unit)).unwrap();
        assert_eq!(previous.name(), "a");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_stack_conversion() {
        assert_eq!(HostValue::from(Number::new(-3)).into_stack_value(), Some(BigInt::from(-3)));
        assert_eq!(HostValue::from(Label::new(4u32)).into_stack_value(), Some(BigInt::from(4)));
        assert_eq!(HostValue::from("x".to_string()).into_stack_value(), None);
        assert_eq!(HostValue::Unit.type_name(), "unit");
    }
}
