//! WebAssembly bindings.
//!
//! JavaScript-friendly wrapper around the VM. Input is supplied up front
//! and output is captured in memory.

use std::io::Cursor;
use wasm_bindgen::prelude::*;
use crate::alphabet::Style;
use crate::asm::{assemble, disassemble};
use crate::vm::{Lexer, Program, Vm};

type BufferedVm = Vm<Cursor<Vec<u8>>, Vec<u8>>;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// WebAssembly-friendly VM wrapper.
#[wasm_bindgen]
pub struct WasmVm {
    vm: BufferedVm,
    program: Program,
    input: String,
}

#[wasm_bindgen]
impl WasmVm {
    /// Create a VM with an empty program.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            vm: Self::build(Program::default(), ""),
            program: Program::default(),
            input: String::new(),
        }
    }

    /// Load source text in a built-in style (`origin` or `stl`).
    #[wasm_bindgen]
    pub fn load_source(&mut self, source: &str, style: &str) -> Result<usize, JsError> {
        let style = Style::builtin(style).map_err(js_error)?;
        let program = Lexer::new().tokenize_source(source, &style).map_err(js_error)?;
        Ok(self.install(program))
    }

    /// Load a program from assembler text.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let program = assemble(source).map_err(js_error)?.program;
        Ok(self.install(program))
    }

    /// Set the text read by `RCHR`/`RNUM`. Restarts the program.
    #[wasm_bindgen]
    pub fn set_input(&mut self, input: &str) {
        self.input = input.to_string();
        self.reset();
    }

    /// Step one instruction. Returns its mnemonic form.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let instr = self.vm.step().map_err(js_error)?;
        Ok(instr.to_string())
    }

    /// Run until the program stops or `max_steps` instructions ran.
    #[wasm_bindgen]
    pub fn run(&mut self, max_steps: u32) -> Result<u64, JsError> {
        self.vm.run_limited(u64::from(max_steps)).map_err(js_error)
    }

    /// Restart the loaded program with fresh state and output.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.vm = Self::build(self.program.clone(), &self.input);
    }

    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.vm.is_running()
    }

    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.vm.is_halted()
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.vm.state())
    }

    #[wasm_bindgen]
    pub fn steps(&self) -> u64 {
        self.vm.steps()
    }

    /// Index of the next instruction.
    #[wasm_bindgen]
    pub fn pc(&self) -> usize {
        self.vm.pc()
    }

    /// Stack values (bottom first) as decimal strings.
    #[wasm_bindgen]
    pub fn stack(&self) -> js_sys::Array {
        self.vm
            .stack()
            .as_slice()
            .iter()
            .map(|v| JsValue::from_str(&v.to_string()))
            .collect()
    }

    /// Stack and heap as JSON.
    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<String, JsError> {
        self.vm.snapshot().to_json().map_err(js_error)
    }

    /// Everything printed so far.
    #[wasm_bindgen]
    pub fn output(&self) -> String {
        String::from_utf8_lossy(self.vm.output()).into_owned()
    }

    /// Mnemonic listing of the loaded program.
    #[wasm_bindgen]
    pub fn disassembly(&self) -> String {
        disassemble(&self.program)
    }
}

impl WasmVm {
    fn build(program: Program, input: &str) -> BufferedVm {
        Vm::with_io(program, Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn install(&mut self, program: Program) -> usize {
        let len = program.len();
        self.vm = Self::build(program.clone(), &self.input);
        self.program = program;
        len
    }
}

impl Default for WasmVm {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return the program in the given style.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str, style: &str) -> Result<String, JsError> {
    let style = Style::builtin(style).map_err(js_error)?;
    Ok(assemble(source).map_err(js_error)?.render(&style))
}

/// Disassemble source text written in a built-in style.
#[wasm_bindgen]
pub fn wasm_disassemble(source: &str, style: &str) -> Result<String, JsError> {
    let style = Style::builtin(style).map_err(js_error)?;
    let program = Lexer::new().tokenize_source(source, &style).map_err(js_error)?;
    Ok(disassemble(&program))
}
