//! Program source files.
//!
//! Source is plain text in some [`Style`]: characters the style maps become
//! symbols, everything else is commentary and ignored.

use std::path::Path;
use thiserror::Error;
use tracing::debug;
use crate::alphabet::{Style, Symbol};

/// Load a source file and remap it through `style`.
pub fn load_source<P: AsRef<Path>>(path: P, style: &Style) -> Result<Vec<Symbol>, SourceError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| SourceError::IoError(format!("{}: {}", path.display(), e)))?;
    let symbols = style.remap(&text);
    debug!(path = %path.display(), chars = text.chars().count(), symbols = symbols.len(), "loaded source");
    Ok(symbols)
}

/// Write symbols to disk rendered in `style`.
pub fn save_source<P: AsRef<Path>>(path: P, symbols: &[Symbol], style: &Style) -> Result<(), SourceError> {
    let path = path.as_ref();
    std::fs::write(path, style.render(symbols))
        .map_err(|e| SourceError::IoError(format!("{}: {}", path.display(), e)))
}

/// Program text from a command-line argument.
///
/// If `arg` names an existing file its contents are returned, otherwise the
/// argument itself is taken as program text.
pub fn read_program_text(arg: &str) -> Result<String, SourceError> {
    let path = Path::new(arg);
    if path.is_file() {
        std::fs::read_to_string(path)
            .map_err(|e| SourceError::IoError(format!("{}: {}", path.display(), e)))
    } else {
        Ok(arg.to_string())
    }
}

/// Errors that can occur while reading or writing source files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    IoError(String),
}
