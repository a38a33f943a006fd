//! Debugger application state and logic.

use std::collections::HashSet;
use std::io::Cursor;
use crate::vm::{Program, Vm};

type DebugVm = Vm<Cursor<Vec<u8>>, Vec<u8>>;

/// Instructions executed per tick while running continuously.
const STEPS_PER_TICK: usize = 64;

/// Debugger application state.
pub struct DebuggerApp {
    /// The VM being debugged.
    pub vm: DebugVm,
    /// Original program for reference.
    pub program: Program,
    /// Text served to the read opcodes.
    pub input: String,
    /// Breakpoints (by instruction index).
    pub breakpoints: HashSet<usize>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Heap view scroll offset.
    pub heap_scroll: usize,
    resume_pc: Option<usize>,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Program, input: &str) -> Self {
        Self {
            vm: Self::build(&program, input),
            program,
            input: input.to_string(),
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            heap_scroll: 0,
            resume_pc: None,
        }
    }

    fn build(program: &Program, input: &str) -> DebugVm {
        Vm::with_io(program.clone(), Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.vm.is_running() {
            self.status = format!("VM stopped: {:?}", self.vm.state());
            self.running = false;
            return;
        }

        let pc = self.vm.pc();
        match self.vm.step() {
            Ok(instr) => {
                self.status = format!("PC={:04}: {}", pc, instr);
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Run until the program stops, a breakpoint, or an error.
    pub fn run(&mut self) {
        self.running = true;
        self.resume_pc = Some(self.vm.pc());
        self.status = "Running...".into();
    }

    /// Run one batch of continuous execution.
    pub fn tick(&mut self) {
        for _ in 0..STEPS_PER_TICK {
            if !self.running {
                return;
            }

            if !self.vm.is_running() {
                self.running = false;
                self.status = format!("{:?} after {} steps", self.vm.state(), self.vm.steps());
                return;
            }

            // The instruction we resumed from never re-triggers its breakpoint
            let pc = self.vm.pc();
            let resuming = self.resume_pc.take() == Some(pc);
            if self.breakpoints.contains(&pc) && !resuming {
                self.running = false;
                self.status = format!("Breakpoint at PC={}", pc);
                return;
            }

            self.step();
        }
    }

    /// Toggle breakpoint at the current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.vm.pc();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={}", pc);
        }
    }

    /// Reset the VM to its initial state.
    pub fn reset(&mut self) {
        self.vm = Self::build(&self.program, &self.input);
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Program output captured so far.
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(self.vm.output()).into_owned()
    }

    /// Get disassembly around the current PC.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(usize, String, bool)> {
        let pc = self.vm.pc();
        let start = pc.saturating_sub(lines / 2);

        self.program
            .iter()
            .enumerate()
            .skip(start)
            .take(lines)
            .map(|(index, instr)| (index, instr.to_string(), index == pc))
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Program) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program, "");

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => {
                            app.heap_scroll = app.heap_scroll.saturating_sub(1);
                        }
                        KeyCode::Down => {
                            if app.heap_scroll + 1 < app.vm.heap().len() {
                                app.heap_scroll += 1;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    fn app(source: &str) -> DebuggerApp {
        DebuggerApp::new(assemble(source).unwrap().program, "")
    }

    #[test]
    fn test_step_updates_status() {
        let mut app = app("PUSH 4\nPNUM");
        app.step();
        assert_eq!(app.status, "PC=0000: PUSH 4");
        app.step();
        assert_eq!(app.output_text(), "4");
        app.step();
        assert!(app.status.starts_with("VM stopped"));
    }

    #[test]
    fn test_run_stops_at_breakpoint() {
        let mut app = app("PUSH 1\nPUSH 2\nPUSH 3");
        app.breakpoints.insert(2);
        app.run();
        app.tick();
        assert!(!app.running);
        assert_eq!(app.vm.pc(), 2);
        assert_eq!(app.status, "Breakpoint at PC=2");
    }

    #[test]
    fn test_error_stops_stepping() {
        let mut app = app("ADD\nPUSH 1");
        app.step();
        assert!(app.status.starts_with("Error: stack underflow"));
        app.step();
        assert_eq!(app.status, "VM stopped: Error");
        assert!(app.vm.stack().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut app = app("PUSH 1");
        app.step();
        app.reset();
        assert_eq!(app.vm.pc(), 0);
        assert!(app.vm.stack().is_empty());
    }

    #[test]
    fn test_disassembly_window() {
        let app = app("PUSH 1\nDUP\nADD");
        let lines = app.get_disassembly(2);
        assert_eq!(lines, vec![(0, "PUSH 1".to_string(), true), (1, "DUP".to_string(), false)]);
    }
}
