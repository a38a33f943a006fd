//! Run configuration.
//!
//! Settings come from an optional JSON file; command-line flags override
//! whatever the file says.
//!
//! ```json
//! { "style": "stl", "strict": true, "max_steps": 100000 }
//! ```

use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use crate::alphabet::Style;
use crate::error::{Error, Result};
use crate::vm::Lexer;

/// Options shared by the `run`, `ir` and `debug` commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Built-in style name (`origin` or `stl`).
    pub style: Option<String>,
    /// JSON style description; takes precedence over `style`.
    pub style_file: Option<PathBuf>,
    /// Strict tokenizing.
    pub strict: bool,
    /// Unbound `FFI` labels are errors instead of no-ops.
    pub strict_foreign: bool,
    /// Stop after this many instructions.
    pub max_steps: Option<u64>,
    /// Log every executed instruction.
    pub trace: bool,
}

impl RunConfig {
    /// Parse a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// The style these settings select. Defaults to `origin`.
    pub fn resolve_style(&self) -> Result<Style> {
        if let Some(path) = &self.style_file {
            let json = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
            return Ok(Style::from_json(&json)?);
        }
        match &self.style {
            Some(name) => Ok(Style::builtin(name)?),
            None => Ok(Style::origin()),
        }
    }

    /// Lexer matching the `strict` setting.
    pub fn lexer(&self) -> Lexer {
        if self.strict {
            Lexer::strict()
        } else {
            Lexer::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::from_json("{}").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.resolve_style().unwrap().name(), "origin");
        assert!(!config.lexer().is_strict());
    }

    #[test]
    fn test_parse() {
        let config = RunConfig::from_json(r#"{"style": "stl", "strict": true, "max_steps": 10}"#).unwrap();
        assert_eq!(config.max_steps, Some(10));
        assert_eq!(config.resolve_style().unwrap().name(), "stl");
        assert!(config.lexer().is_strict());
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(matches!(RunConfig::from_json(r#"{"colour": 1}"#), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_style() {
        let config = RunConfig { style: Some("emoji".into()), ..Default::default() };
        assert!(matches!(config.resolve_style(), Err(Error::Style(_))));
    }
}
