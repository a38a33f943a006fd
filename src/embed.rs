//! Running Whitespace from host code.
//!
//! A [`Snippet`] is a compiled program plus a description of what the host
//! wants back. Every call runs on a fresh VM, so calls never share state.
//!
//! ```
//! use wspace::embed::{Returns, Snippet};
//!
//! // push 1; push 3; add  (STL style)
//! let add = Snippet::from_doc("SSSTL SSSTTL TSSS").unwrap();
//! let out = add.call(Vec::new()).unwrap();
//! assert_eq!(out.top().map(|v| v.to_string()), Some("4".to_string()));
//! ```

use std::collections::BTreeMap;
use std::io::Cursor;
use num_bigint::BigInt;
use crate::alphabet::Style;
use crate::asm::assemble;
use crate::error::Result;
use crate::vm::{ForeignRegistry, Lexer, Program, Snapshot, Vm, VmError};

/// Which part of the final state a snippet returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Returns {
    /// The top of the stack.
    #[default]
    Top,
    /// The whole stack, bottom first.
    Stack,
    /// The heap.
    Heap,
    /// Stack and heap.
    Both,
}

/// Result of a snippet call, shaped by its [`Returns`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Top(Option<BigInt>),
    Stack(Vec<BigInt>),
    Heap(BTreeMap<BigInt, BigInt>),
    Both {
        stack: Vec<BigInt>,
        heap: BTreeMap<BigInt, BigInt>,
    },
}

impl Outcome {
    fn shape(returns: Returns, snapshot: Snapshot) -> Self {
        match returns {
            Returns::Top => Outcome::Top(snapshot.stack.last().cloned()),
            Returns::Stack => Outcome::Stack(snapshot.stack),
            Returns::Heap => Outcome::Heap(snapshot.heap),
            Returns::Both => Outcome::Both {
                stack: snapshot.stack,
                heap: snapshot.heap,
            },
        }
    }

    /// Top of stack, for `Top`, `Stack` and `Both` outcomes.
    pub fn top(&self) -> Option<&BigInt> {
        match self {
            Outcome::Top(top) => top.as_ref(),
            Outcome::Stack(stack) | Outcome::Both { stack, .. } => stack.last(),
            Outcome::Heap(_) => None,
        }
    }
}

/// A compiled program ready to be called from the host.
#[derive(Debug, Clone)]
pub struct Snippet {
    program: Program,
    returns: Returns,
    foreign: ForeignRegistry,
    max_steps: Option<u64>,
    input: String,
}

impl Snippet {
    /// Wrap an already decoded program.
    pub fn new(program: Program) -> Self {
        Self {
            program,
            returns: Returns::default(),
            foreign: ForeignRegistry::new(),
            max_steps: None,
            input: String::new(),
        }
    }

    /// Compile source text written in `style`.
    pub fn from_source(source: &str, style: &Style) -> Result<Self> {
        Ok(Self::new(Lexer::new().tokenize_source(source, style)?))
    }

    /// Compile doc-string text in the `S`/`T`/`L` letter style.
    pub fn from_doc(doc: &str) -> Result<Self> {
        Self::from_source(doc, &Style::stl())
    }

    /// Compile assembler text.
    pub fn from_asm(text: &str) -> Result<Self> {
        Ok(Self::new(assemble(text)?.program))
    }

    /// Select what calls return.
    pub fn returns(mut self, returns: Returns) -> Self {
        self.returns = returns;
        self
    }

    /// Host functions available to `FFI`.
    pub fn with_foreign(mut self, registry: ForeignRegistry) -> Self {
        self.foreign = registry;
        self
    }

    /// Bound the number of executed instructions per call.
    pub fn max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Text served to the read opcodes.
    pub fn with_input(mut self, input: &str) -> Self {
        self.input = input.to_string();
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Run with `args` pushed in order and return the selected state.
    pub fn call<I: IntoIterator<Item = BigInt>>(&self, args: I) -> std::result::Result<Outcome, VmError> {
        let (snapshot, _) = self.run(args)?;
        Ok(Outcome::shape(self.returns, snapshot))
    }

    /// Run with `args` pushed in order, returning the final state and
    /// everything the program printed.
    ///
    /// A run cut short by the step bound fails with [`VmError::StepLimit`].
    pub fn run<I: IntoIterator<Item = BigInt>>(
        &self,
        args: I,
    ) -> std::result::Result<(Snapshot, String), VmError> {
        let input = Cursor::new(self.input.clone().into_bytes());
        let mut vm = Vm::with_io(self.program.clone(), input, Vec::new())
            .with_foreign(self.foreign.clone());
        vm.seed_stack(args);
        if let Some(limit) = self.max_steps {
            vm.run_limited(limit)?;
            if vm.is_running() {
                return Err(VmError::StepLimit(limit));
            }
        } else {
            vm.run()?;
        }
        let snapshot = vm.snapshot();
        let output = String::from_utf8_lossy(&vm.into_output()).into_owned();
        Ok((snapshot, output))
    }
}

/// Define a host function whose body is the Whitespace program in its doc
/// comment, written in the `S`/`T`/`L` letter style.
///
/// Arguments are pushed in order before the run. The return selector names
/// a [`Returns`](crate::embed::Returns) variant.
///
/// ```
/// wspace::whitespace_fn! {
///     /// TSSS
///     fn add(a, b) -> Top;
/// }
///
/// let sum = add(2, 5).unwrap();
/// assert_eq!(sum.top().map(|v| v.to_string()), Some("7".to_string()));
/// ```
#[macro_export]
macro_rules! whitespace_fn {
    ($(#[doc = $doc:literal])* $vis:vis fn $name:ident($($arg:ident),* $(,)?) -> $ret:ident;) => {
        $(#[doc = $doc])*
        $vis fn $name($($arg: impl ::core::convert::Into<$crate::BigInt>),*)
            -> $crate::Result<$crate::embed::Outcome>
        {
            let source = concat!($($doc, "\n"),*);
            let snippet = $crate::embed::Snippet::from_doc(source)?
                .returns($crate::embed::Returns::$ret);
            let args: ::std::vec::Vec<$crate::BigInt> = ::std::vec![$($arg.into()),*];
            Ok(snippet.call(args)?)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::HostValue;

    fn int(n: i64) -> BigInt {
        BigInt::from(n)
    }

    whitespace_fn! {
        /// SSSTSL
        /// TSSL
        fn double(x) -> Top;
    }

    whitespace_fn! {
        /// TTS
        fn store(key, value) -> Both;
    }

    #[test]
    fn test_from_doc() {
        let snippet = Snippet::from_doc("SSSTL SSSTTL TSSS").unwrap();
        assert_eq!(snippet.call(Vec::new()).unwrap(), Outcome::Top(Some(int(4))));
    }

    #[test]
    fn test_returns_selector() {
        let snippet = Snippet::from_asm("PUSH 1\nPUSH 2\nSTORE\nPUSH 9").unwrap();
        assert_eq!(
            snippet.clone().returns(Returns::Stack).call(Vec::new()).unwrap(),
            Outcome::Stack(vec![int(9)])
        );
        let heap: BTreeMap<BigInt, BigInt> = [(int(1), int(2))].into_iter().collect();
        assert_eq!(
            snippet.clone().returns(Returns::Heap).call(Vec::new()).unwrap(),
            Outcome::Heap(heap.clone())
        );
        assert_eq!(
            snippet.returns(Returns::Both).call(Vec::new()).unwrap(),
            Outcome::Both { stack: vec![int(9)], heap }
        );
    }

    #[test]
    fn test_calls_are_independent() {
        let snippet = Snippet::from_asm("PUSH 0\nSWAP\nSTORE\nPUSH 0\nRETRIEVE").unwrap();
        assert_eq!(snippet.call(vec![int(5)]).unwrap().top(), Some(&int(5)));
        assert_eq!(snippet.call(vec![int(8)]).unwrap().top(), Some(&int(8)));
    }

    #[test]
    fn test_foreign_and_output() {
        let registry = ForeignRegistry::new()
            .with(3u32, "square", 1, |args| Ok(HostValue::from(&args[0] * &args[0])));
        let snippet = Snippet::from_asm("FFI 3\nDUP\nPNUM")
            .unwrap()
            .with_foreign(registry);
        let (snapshot, output) = snippet.run(vec![int(12)]).unwrap();
        assert_eq!(snapshot.stack, vec![int(144)]);
        assert_eq!(output, "144");
    }

    #[test]
    fn test_input_and_step_limit() {
        let snippet = Snippet::from_asm("PUSH 0\nRNUM\nPUSH 0\nRETRIEVE").unwrap().with_input("21\n");
        assert_eq!(snippet.call(Vec::new()).unwrap().top(), Some(&int(21)));

        let looping = Snippet::from_asm("MARK 0\nJUMP 0").unwrap().max_steps(50);
        assert_eq!(looping.call(Vec::new()), Err(VmError::StepLimit(50)));

        let bounded = Snippet::from_asm("PUSH 1\nPUSH 2").unwrap().max_steps(2);
        assert_eq!(bounded.call(Vec::new()).unwrap().top(), Some(&int(2)));
    }

    #[test]
    fn test_macro_functions() {
        assert_eq!(double(21).unwrap().top(), Some(&int(42)));
        let stored = store(4, -1).unwrap();
        let heap: BTreeMap<BigInt, BigInt> = [(int(4), int(-1))].into_iter().collect();
        assert_eq!(stored, Outcome::Both { stack: vec![], heap });
    }

    #[test]
    fn test_runtime_error_surfaces() {
        let snippet = Snippet::from_asm("ADD").unwrap();
        assert!(matches!(snippet.call(Vec::new()), Err(VmError::StackUnderflow { .. })));
    }
}
