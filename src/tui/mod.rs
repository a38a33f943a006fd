//! TUI debugger.
//!
//! Provides an interactive terminal-based debugger with:
//! - Program listing around the current instruction
//! - Stack, heap and captured output views
//! - Step/run/breakpoint controls

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
