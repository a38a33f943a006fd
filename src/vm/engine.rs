//! Execution engine.
//!
//! Runs a decoded [`Program`] one instruction at a time against a stack,
//! a heap, a call stack and a label table resolved before the first step.

use std::collections::{HashMap, VecDeque};
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use num_bigint::{BigInt, BigUint};
use num_traits::{Signed, ToPrimitive, Zero};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, trace, warn};
use crate::alphabet::Label;
use crate::vm::arith;
use crate::vm::foreign::ForeignRegistry;
use crate::vm::heap::Heap;
use crate::vm::opcode::{Instruction, Program};
use crate::vm::snapshot::Snapshot;
use crate::vm::stack::Stack;

/// VM execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VmState {
    /// More instructions to execute.
    Running,
    /// Stopped by `END`.
    Halted,
    /// Ran past the last instruction.
    Finished,
    /// Stopped through the interrupt handle.
    Interrupted,
    /// Stopped by a fatal error.
    Error,
}

/// Map every `MARK` label to its instruction index.
///
/// When a label is marked twice the later mark wins.
pub fn resolve_labels(program: &Program) -> HashMap<BigUint, usize> {
    let mut labels = HashMap::new();
    for (index, instr) in program.iter().enumerate() {
        if let Instruction::Mark(label) = instr {
            if let Some(previous) = labels.insert(label.value().clone(), index) {
                warn!(label = %label, previous, index, "duplicate mark, later one wins");
            }
        }
    }
    debug!(count = labels.len(), "resolved labels");
    labels
}

/// Raise an interrupt flag obtained from [`Vm::interrupt_handle`].
///
/// Returns `true` when the flag was already raised, i.e. the request is a
/// repeat that the run has not honored yet (for example because it is
/// blocked reading input).
pub fn raise_interrupt(flag: &AtomicBool) -> bool {
    flag.swap(true, Ordering::SeqCst)
}

/// The Whitespace virtual machine.
///
/// Generic over its input and output so hosts and tests can substitute
/// in-memory buffers for the terminal.
pub struct Vm<R = BufReader<Stdin>, W = Stdout> {
    program: Program,
    pc: usize,
    stack: Stack,
    heap: Heap,
    call_stack: Vec<usize>,
    labels: HashMap<BigUint, usize>,
    foreign: ForeignRegistry,
    strict_foreign: bool,
    state: VmState,
    steps: u64,
    last_instr: Option<Instruction>,
    input: R,
    output: W,
    line_buffer: VecDeque<char>,
    interrupt: Arc<AtomicBool>,
}

impl Vm {
    /// Create a VM reading stdin and writing stdout.
    pub fn new(program: Program) -> Self {
        Self::with_io(program, BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> Vm<R, W> {
    /// Create a VM over the given reader and writer.
    pub fn with_io(program: Program, input: R, output: W) -> Self {
        let labels = resolve_labels(&program);
        debug!(instructions = program.len(), "program loaded");
        let state = Self::initial_state(&program);
        Self {
            program,
            pc: 0,
            stack: Stack::new(),
            heap: Heap::new(),
            call_stack: Vec::new(),
            labels,
            foreign: ForeignRegistry::new(),
            strict_foreign: false,
            state,
            steps: 0,
            last_instr: None,
            input,
            output,
            line_buffer: VecDeque::new(),
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    fn initial_state(program: &Program) -> VmState {
        if program.is_empty() {
            VmState::Finished
        } else {
            VmState::Running
        }
    }

    /// Replace the foreign function registry.
    pub fn with_foreign(mut self, registry: ForeignRegistry) -> Self {
        self.foreign = registry;
        self
    }

    /// Make calls to unbound foreign labels fail with `LabelError`.
    pub fn strict_foreign(mut self, strict: bool) -> Self {
        self.strict_foreign = strict;
        self
    }

    pub fn foreign(&self) -> &ForeignRegistry {
        &self.foreign
    }

    pub fn foreign_mut(&mut self) -> &mut ForeignRegistry {
        &mut self.foreign
    }

    /// Push values before the run, bottom first.
    pub fn seed_stack<I: IntoIterator<Item = BigInt>>(&mut self, values: I) {
        self.stack.extend(values);
    }

    /// Preload heap cells before the run.
    pub fn seed_heap<I: IntoIterator<Item = (BigInt, BigInt)>>(&mut self, cells: I) {
        self.heap.extend(cells);
    }

    /// Reset to the initial state, keeping program, registry and I/O.
    pub fn reset(&mut self) {
        self.pc = 0;
        self.stack.clear();
        self.heap.clear();
        self.call_stack.clear();
        self.line_buffer.clear();
        self.state = Self::initial_state(&self.program);
        self.steps = 0;
        self.last_instr = None;
        self.interrupt.store(false, Ordering::SeqCst);
    }

    /// Shared flag that stops the run before the next instruction.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed.
    pub fn step(&mut self) -> Result<Instruction, VmError> {
        if self.state != VmState::Running {
            return Err(VmError::NotRunning(self.state));
        }

        let instr = match self.program.get(self.pc) {
            Some(instr) => instr.clone(),
            None => {
                self.state = VmState::Finished;
                return Err(VmError::NotRunning(self.state));
            }
        };
        trace!(pc = self.pc, instr = %instr, depth = self.stack.len(), "step");

        // Advance before executing; branches overwrite it
        self.pc += 1;
        if let Err(e) = self.execute(&instr) {
            self.state = VmState::Error;
            return Err(e);
        }

        self.steps += 1;
        self.last_instr = Some(instr.clone());
        if self.state == VmState::Running && self.pc >= self.program.len() {
            self.state = VmState::Finished;
        }

        Ok(instr)
    }

    /// Run until the program stops.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, VmError> {
        self.run_while(|_| true)
    }

    /// Run for at most `max_steps` instructions.
    pub fn run_limited(&mut self, max_steps: u64) -> Result<u64, VmError> {
        let limit = self.steps.saturating_add(max_steps);
        self.run_while(|vm| vm.steps < limit)
    }

    fn run_while(&mut self, mut keep_going: impl FnMut(&Self) -> bool) -> Result<u64, VmError> {
        let start = self.steps;
        let mut result = Ok(());
        while self.state == VmState::Running && keep_going(&*self) {
            if self.interrupt.load(Ordering::SeqCst) {
                warn!(pc = self.pc, "interrupted");
                self.state = VmState::Interrupted;
                break;
            }
            if let Err(e) = self.step() {
                result = Err(e);
                break;
            }
        }
        let flushed = self.flush();
        result?;
        flushed?;
        Ok(self.steps - start)
    }

    fn execute(&mut self, instr: &Instruction) -> Result<(), VmError> {
        match instr {
            // ==================== Stack ====================

            Instruction::Push(n) => self.stack.push(n.value().clone()),
            Instruction::Dup => self.stack.dup()?,
            Instruction::Copy(n) => self.stack.copy(n.value())?,
            Instruction::Swap => self.stack.swap()?,
            Instruction::Pop => {
                self.stack.pop()?;
            }
            Instruction::Slide(n) => self.stack.slide(n.value())?,

            // ==================== Arithmetic ====================

            Instruction::Add
            | Instruction::Sub
            | Instruction::Mul
            | Instruction::Div
            | Instruction::Mod => {
                let right = self.stack.pop()?;
                let left = self.stack.pop()?;
                let result = arith::apply(instr.opcode(), &left, &right)?;
                self.stack.push(result);
            }

            // ==================== Heap ====================

            Instruction::Store => {
                let value = self.stack.pop()?;
                let key = self.stack.pop()?;
                self.heap.store(key, value);
            }
            Instruction::Retrieve => {
                let key = self.stack.pop()?;
                let value = self.heap.retrieve(&key)?;
                self.stack.push(value);
            }

            // ==================== I/O ====================

            Instruction::PrintChar => {
                let code = self.stack.pop()?;
                let c = code
                    .to_u32()
                    .and_then(char::from_u32)
                    .ok_or(VmError::InvalidCharacter(code))?;
                write!(self.output, "{}", c)?;
            }
            Instruction::PrintNumber => {
                let n = self.stack.pop()?;
                write!(self.output, "{}", n)?;
            }
            Instruction::ReadChar => {
                let key = self.stack.pop()?;
                self.flush()?;
                if self.line_buffer.is_empty() {
                    let line = self.read_line()?;
                    self.line_buffer.extend(line.chars());
                    self.line_buffer.push_back('\n');
                }
                let c = self.line_buffer.pop_front().unwrap_or('\n');
                self.heap.store(key, BigInt::from(c as u32));
            }
            Instruction::ReadNumber => {
                let key = self.stack.pop()?;
                self.flush()?;
                // Always a fresh line; characters buffered by RCHR stay put
                let line = self.read_line()?;
                let text = line.trim();
                let value = BigInt::from_str(text)
                    .map_err(|_| VmError::InputError(format!("not a number: {:?}", text)))?;
                self.heap.store(key, value);
            }

            // ==================== Flow Control ====================

            Instruction::Mark(_) => {}
            Instruction::Call(label) => {
                let target = self.target(label)?;
                self.call_stack.push(self.pc);
                self.pc = target;
            }
            Instruction::Jump(label) => {
                self.pc = self.target(label)?;
            }
            Instruction::JumpZero(label) => {
                if self.stack.pop()?.is_zero() {
                    self.pc = self.target(label)?;
                }
            }
            Instruction::JumpNegative(label) => {
                if self.stack.pop()?.is_negative() {
                    self.pc = self.target(label)?;
                }
            }
            Instruction::Return => match self.call_stack.pop() {
                Some(address) => self.pc = address,
                None => warn!(pc = self.pc - 1, "return with empty call stack ignored"),
            },
            Instruction::End => {
                self.state = VmState::Halted;
            }
            Instruction::Foreign(label) => self.call_foreign(label)?,
        }

        Ok(())
    }

    /// Index of the instruction after the mark for `label`.
    fn target(&self, label: &Label) -> Result<usize, VmError> {
        self.labels
            .get(label.value())
            .map(|index| index + 1)
            .ok_or_else(|| VmError::LabelError(label.value().clone()))
    }

    fn call_foreign(&mut self, label: &Label) -> Result<(), VmError> {
        let binding = match self.foreign.get(label.value()) {
            Some(binding) => binding.clone(),
            None if self.strict_foreign => {
                return Err(VmError::LabelError(label.value().clone()));
            }
            None => {
                warn!(label = %label, "no host function bound, FFI ignored");
                return Ok(());
            }
        };
        let args = self.stack.pop_n(binding.arity())?;
        debug!(name = binding.name(), arity = binding.arity(), "foreign call");
        let result = binding.call(&args)?;
        let found = result.type_name();
        match result.into_stack_value() {
            Some(value) => {
                self.stack.push(value);
                Ok(())
            }
            None => Err(VmError::TypeError {
                name: binding.name().to_string(),
                found,
            }),
        }
    }

    /// Read one line of input without its line ending.
    fn read_line(&mut self) -> Result<String, VmError> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            return Err(VmError::InputError("end of input".to_string()));
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    fn flush(&mut self) -> Result<(), VmError> {
        self.output.flush()?;
        Ok(())
    }

    // ==================== Accessors ====================

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Index of the next instruction.
    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    /// Instructions executed since the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Pending return addresses, innermost last.
    pub fn call_stack(&self) -> &[usize] {
        &self.call_stack
    }

    pub fn labels(&self) -> &HashMap<BigUint, usize> {
        &self.labels
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<&Instruction> {
        self.last_instr.as_ref()
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Check if the VM can execute more instructions.
    pub fn is_running(&self) -> bool {
        self.state == VmState::Running
    }

    /// Check if the VM stopped at `END`.
    pub fn is_halted(&self) -> bool {
        self.state == VmState::Halted
    }

    /// Serializable copy of stack and heap.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.stack.as_slice().to_vec(), self.heap.sorted())
    }
}

impl<R, W> std::fmt::Debug for Vm<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vm")
            .field("state", &self.state)
            .field("pc", &self.pc)
            .field("steps", &self.steps)
            .field("stack", &self.stack)
            .field("heap", &self.heap)
            .field("call_stack", &self.call_stack)
            .finish()
    }
}

/// Errors that can occur during execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("stack underflow: needed {needed} item(s), stack has {depth}")]
    StackUnderflow { needed: usize, depth: usize },

    #[error("heap key {0} is not set")]
    KeyError(BigInt),

    #[error("label {0} is not defined")]
    LabelError(BigUint),

    #[error("host function `{name}` returned {found}, expected a number or label")]
    TypeError { name: String, found: &'static str },

    #[error("input error: {0}")]
    InputError(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("{0} is not a valid character code")]
    InvalidCharacter(BigInt),

    #[error("VM not running: {0:?}")]
    NotRunning(VmState),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("step limit of {0} reached before the program stopped")]
    StepLimit(u64),
}

impl From<io::Error> for VmError {
    fn from(e: io::Error) -> Self {
        VmError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use crate::alphabet::Number;
    use crate::vm::foreign::HostValue;

    type TestVm = Vm<Cursor<Vec<u8>>, Vec<u8>>;

    fn push(n: i64) -> Instruction {
        Instruction::Push(Number::new(n))
    }

    fn label(n: u64) -> Label {
        Label::new(n)
    }

    fn make_vm(instructions: Vec<Instruction>, input: &str) -> TestVm {
        Vm::with_io(
            Program::new(instructions),
            Cursor::new(input.as_bytes().to_vec()),
            Vec::new(),
        )
    }

    fn stack_of(vm: &TestVm) -> Vec<i64> {
        vm.stack().as_slice().iter().map(|v| v.to_i64().unwrap()).collect()
    }

    fn heap_of(vm: &TestVm) -> Vec<(i64, i64)> {
        vm.heap()
            .sorted()
            .into_iter()
            .map(|(k, v)| (k.to_i64().unwrap(), v.to_i64().unwrap()))
            .collect()
    }

    #[test]
    fn test_add() {
        let mut vm = make_vm(vec![push(1), push(3), Instruction::Add], "");
        let executed = vm.run().unwrap();
        assert_eq!(executed, 3);
        assert_eq!(stack_of(&vm), vec![4]);
        assert!(vm.heap().is_empty());
        assert_eq!(vm.state(), VmState::Finished);
    }

    #[test]
    fn test_store() {
        let mut vm = make_vm(vec![push(1), push(2), Instruction::Store], "");
        vm.run().unwrap();
        assert!(vm.stack().is_empty());
        assert_eq!(heap_of(&vm), vec![(1, 2)]);
    }

    #[test]
    fn test_store_then_retrieve() {
        let mut vm = make_vm(
            vec![push(3), push(1), Instruction::Store, push(3), Instruction::Retrieve],
            "",
        );
        vm.run().unwrap();
        assert_eq!(stack_of(&vm), vec![1]);
        assert_eq!(heap_of(&vm), vec![(3, 1)]);
    }

    #[test]
    fn test_foreign_multiply() {
        let registry = ForeignRegistry::new()
            .with(5u32, "mul", 2, |args| Ok(HostValue::from(&args[0] * &args[1])));
        let mut vm = make_vm(vec![push(3), push(2), Instruction::Foreign(label(5))], "")
            .with_foreign(registry);
        vm.run().unwrap();
        assert_eq!(stack_of(&vm), vec![6]);
    }

    #[test]
    fn test_foreign_argument_order() {
        let registry = ForeignRegistry::new()
            .with(1u32, "sub", 2, |args| Ok(HostValue::from(&args[0] - &args[1])));
        let mut vm = make_vm(vec![push(10), push(4), Instruction::Foreign(label(1))], "")
            .with_foreign(registry);
        vm.run().unwrap();
        assert_eq!(stack_of(&vm), vec![6]);
    }

    #[test]
    fn test_foreign_text_result_is_type_error() {
        let registry = ForeignRegistry::new()
            .with(1u32, "greet", 0, |_| Ok(HostValue::Text("hi".into())));
        let mut vm = make_vm(vec![Instruction::Foreign(label(1))], "").with_foreign(registry);
        assert_eq!(
            vm.run(),
            Err(VmError::TypeError { name: "greet".into(), found: "text" })
        );
    }

    #[test]
    fn test_foreign_error_propagates() {
        let registry = ForeignRegistry::new()
            .with(1u32, "fail", 1, |_| Err(VmError::InputError("host".into())));
        let mut vm = make_vm(vec![push(1), Instruction::Foreign(label(1))], "")
            .with_foreign(registry);
        assert_eq!(vm.run(), Err(VmError::InputError("host".into())));
    }

    #[test]
    fn test_unbound_foreign() {
        let program = vec![push(1), Instruction::Foreign(label(9))];
        let mut vm = make_vm(program.clone(), "");
        vm.run().unwrap();
        assert_eq!(stack_of(&vm), vec![1]);

        let mut vm = make_vm(program, "").strict_foreign(true);
        assert_eq!(vm.run(), Err(VmError::LabelError(BigUint::from(9u32))));
    }

    #[test]
    fn test_forward_reference() {
        let mut vm = make_vm(
            vec![
                Instruction::Jump(label(1)),
                push(99),
                Instruction::Mark(label(1)),
                push(7),
            ],
            "",
        );
        vm.run().unwrap();
        assert_eq!(stack_of(&vm), vec![7]);
    }

    #[test]
    fn test_call_and_return() {
        let mut vm = make_vm(
            vec![
                Instruction::Call(label(0)),
                push(2),
                Instruction::End,
                Instruction::Mark(label(0)),
                push(1),
                Instruction::Return,
            ],
            "",
        );
        vm.run().unwrap();
        assert_eq!(stack_of(&vm), vec![1, 2]);
        assert!(vm.is_halted());
        assert!(vm.call_stack().is_empty());
    }

    #[test]
    fn test_return_on_empty_call_stack_is_ignored() {
        let mut vm = make_vm(vec![Instruction::Return, push(1)], "");
        vm.run().unwrap();
        assert_eq!(stack_of(&vm), vec![1]);
    }

    #[test]
    fn test_conditional_jumps_always_pop() {
        let mut vm = make_vm(
            vec![
                push(5),
                push(1),
                Instruction::JumpZero(label(0)),
                push(-1),
                Instruction::JumpNegative(label(0)),
                push(8),
                Instruction::Mark(label(0)),
            ],
            "",
        );
        vm.run().unwrap();
        assert_eq!(stack_of(&vm), vec![5]);
    }

    #[test]
    fn test_countdown_loop() {
        // push 3; loop: dup pnum; push 1; sub; dup; jz end; jump loop; end:
        let mut vm = make_vm(
            vec![
                push(3),
                Instruction::Mark(label(1)),
                Instruction::Dup,
                Instruction::PrintNumber,
                push(1),
                Instruction::Sub,
                Instruction::Dup,
                Instruction::JumpZero(label(2)),
                Instruction::Jump(label(1)),
                Instruction::Mark(label(2)),
            ],
            "",
        );
        vm.run().unwrap();
        assert_eq!(vm.output(), b"321");
        assert_eq!(stack_of(&vm), vec![0]);
    }

    #[test]
    fn test_missing_label() {
        let mut vm = make_vm(vec![Instruction::Jump(label(4))], "");
        assert_eq!(vm.run(), Err(VmError::LabelError(BigUint::from(4u32))));
    }

    #[test]
    fn test_duplicate_mark_later_wins() {
        let mut vm = make_vm(
            vec![
                Instruction::Jump(label(1)),
                Instruction::Mark(label(1)),
                push(1),
                Instruction::End,
                Instruction::Mark(label(1)),
                push(2),
            ],
            "",
        );
        vm.run().unwrap();
        assert_eq!(stack_of(&vm), vec![2]);
    }

    #[test]
    fn test_end_halts() {
        let mut vm = make_vm(vec![push(1), Instruction::End, push(2)], "");
        assert_eq!(vm.run().unwrap(), 2);
        assert!(vm.is_halted());
        assert_eq!(vm.step(), Err(VmError::NotRunning(VmState::Halted)));
    }

    #[test]
    fn test_empty_program_is_finished() {
        let mut vm = make_vm(vec![], "");
        assert_eq!(vm.state(), VmState::Finished);
        assert_eq!(vm.run().unwrap(), 0);
    }

    #[test]
    fn test_print_char_and_number() {
        let mut vm = make_vm(
            vec![push('h' as i64), Instruction::PrintChar, push(-12), Instruction::PrintNumber],
            "",
        );
        vm.run().unwrap();
        assert_eq!(String::from_utf8(vm.into_output()).unwrap(), "h-12");
    }

    #[test]
    fn test_invalid_character() {
        let mut vm = make_vm(vec![push(-1), Instruction::PrintChar], "");
        assert_eq!(vm.run(), Err(VmError::InvalidCharacter(BigInt::from(-1))));
    }

    #[test]
    fn test_read_char_buffers_line() {
        let mut vm = make_vm(
            vec![
                push(0),
                Instruction::ReadChar,
                push(1),
                Instruction::ReadChar,
                push(2),
                Instruction::ReadChar,
            ],
            "ab\nc\n",
        );
        vm.run().unwrap();
        assert_eq!(heap_of(&vm), vec![(0, 'a' as i64), (1, 'b' as i64), (2, '\n' as i64)]);
    }

    #[test]
    fn test_read_number() {
        let mut vm = make_vm(
            vec![push(5), Instruction::ReadNumber, push(6), Instruction::ReadNumber],
            "  42 \n-7\n",
        );
        vm.run().unwrap();
        assert_eq!(heap_of(&vm), vec![(5, 42), (6, -7)]);
    }

    #[test]
    fn test_read_number_after_read_char() {
        let mut vm = make_vm(
            vec![push(0), Instruction::ReadChar, push(1), Instruction::ReadNumber],
            "a\n5\n",
        );
        vm.run().unwrap();
        assert_eq!(heap_of(&vm), vec![(0, 'a' as i64), (1, 5)]);
    }

    #[test]
    fn test_read_errors() {
        let mut vm = make_vm(vec![push(0), Instruction::ReadNumber], "forty\n");
        assert!(matches!(vm.run(), Err(VmError::InputError(_))));

        let mut vm = make_vm(vec![push(0), Instruction::ReadChar], "");
        assert_eq!(vm.run(), Err(VmError::InputError("end of input".into())));
    }

    #[test]
    fn test_division_by_zero() {
        let mut vm = make_vm(vec![push(1), push(0), Instruction::Div], "");
        assert_eq!(vm.run(), Err(VmError::DivisionByZero));
    }

    #[test]
    fn test_underflow() {
        let mut vm = make_vm(vec![push(1), Instruction::Add], "");
        assert!(matches!(vm.run(), Err(VmError::StackUnderflow { .. })));
    }

    #[test]
    fn test_error_stops_vm() {
        let mut vm = make_vm(vec![Instruction::Add, push(1)], "");
        assert!(matches!(vm.step(), Err(VmError::StackUnderflow { needed: 1, depth: 0 })));
        assert_eq!(vm.state(), VmState::Error);
        assert!(!vm.is_running());
        assert_eq!(vm.step(), Err(VmError::NotRunning(VmState::Error)));
        assert!(vm.stack().is_empty());

        vm.reset();
        assert!(vm.is_running());
    }

    #[test]
    fn test_missing_heap_key() {
        let mut vm = make_vm(vec![push(3), Instruction::Retrieve], "");
        assert_eq!(vm.run(), Err(VmError::KeyError(BigInt::from(3))));
    }

    #[test]
    fn test_run_limited_then_resume() {
        let mut vm = make_vm(vec![push(1), push(2), push(3)], "");
        assert_eq!(vm.run_limited(2).unwrap(), 2);
        assert!(vm.is_running());
        assert_eq!(vm.run().unwrap(), 1);
        assert_eq!(stack_of(&vm), vec![1, 2, 3]);
    }

    #[test]
    fn test_interrupt() {
        let mut vm = make_vm(vec![Instruction::Mark(label(0)), Instruction::Jump(label(0))], "");
        vm.interrupt_handle().store(true, Ordering::SeqCst);
        assert_eq!(vm.run().unwrap(), 0);
        assert_eq!(vm.state(), VmState::Interrupted);
    }

    #[test]
    fn test_repeated_interrupt_is_reported() {
        let mut vm = make_vm(vec![push(1)], "");
        let handle = vm.interrupt_handle();
        assert!(!raise_interrupt(&handle));
        assert!(raise_interrupt(&handle));
        assert_eq!(vm.run().unwrap(), 0);
        assert_eq!(vm.state(), VmState::Interrupted);

        vm.reset();
        assert!(!raise_interrupt(&handle));
    }

    #[test]
    fn test_seed_and_reset() {
        let mut vm = make_vm(vec![Instruction::Add], "");
        vm.seed_stack([BigInt::from(2), BigInt::from(5)]);
        vm.seed_heap([(BigInt::from(0), BigInt::from(1))]);
        vm.run().unwrap();
        assert_eq!(stack_of(&vm), vec![7]);
        assert_eq!(heap_of(&vm), vec![(0, 1)]);

        vm.reset();
        assert!(vm.stack().is_empty());
        assert!(vm.heap().is_empty());
        assert!(vm.is_running());
        assert_eq!(vm.steps(), 0);
    }

    #[test]
    fn test_deterministic() {
        let program = vec![push(7), push(2), Instruction::Mod, push(0), Instruction::Swap, Instruction::Store];
        let mut a = make_vm(program.clone(), "");
        let mut b = make_vm(program, "");
        a.run().unwrap();
        b.run().unwrap();
        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(heap_of(&a), vec![(0, 1)]);
    }

    #[test]
    fn test_step_reports_instruction() {
        let mut vm = make_vm(vec![push(1), Instruction::Dup], "");
        assert_eq!(vm.step().unwrap(), push(1));
        assert_eq!(vm.pc(), 1);
        assert_eq!(vm.step().unwrap(), Instruction::Dup);
        assert_eq!(vm.last_instruction(), Some(&Instruction::Dup));
        assert_eq!(vm.state(), VmState::Finished);
    }
}
