//! Crate-level error type.

use thiserror::Error;
use crate::alphabet::StyleError;
use crate::asm::{AssemblerError, SourceError};
use crate::vm::{SyntaxError, VmError};

/// Any error the toolkit can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("runtime error: {0}")]
    Vm(#[from] VmError),

    #[error("assembler error: {0}")]
    Assembler(#[from] AssemblerError),

    #[error("style error: {0}")]
    Style(#[from] StyleError),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
