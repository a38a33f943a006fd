//! Assembler macros.
//!
//! Macros expand into ordinary assembler lines, which then go through the
//! usual mnemonic lookup; the VM never sees them.
//!
//! ```text
//! PUSHS [1, -2, 3]    ; PUSH 1, PUSH -2, PUSH 3
//! PUSHS "hi"          ; PUSH 104, PUSH 105
//! PUSHS ~"hi"         ; PUSH 105, PUSH 104
//! ```

use std::sync::OnceLock;
use num_bigint::BigInt;
use regex::Regex;
use thiserror::Error;

const LIST_PATTERN: &str = r"^\[\s*(?:-?\d+\s*,\s*)*-?\d+\s*\]$";
const TEXT_PATTERN: &str = r#"^"(.*)"$"#;

/// A known macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Macro {
    /// Push a list of integers or the code points of a string.
    PushSeq,
}

impl Macro {
    /// Look up a macro by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "PUSHS" => Some(Macro::PushSeq),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Macro::PushSeq => "PUSHS",
        }
    }

    /// Expand the macro with its raw argument text into assembler lines.
    pub fn expand(self, arg: Option<&str>) -> Result<Vec<String>, MacroError> {
        let arg = arg.map(str::trim).filter(|a| !a.is_empty());
        let arg = arg.ok_or(MacroError::MissingArgument(self.name()))?;
        match self {
            Macro::PushSeq => {
                let values = push_values(arg)?;
                Ok(values
                    .into_iter()
                    .map(|v| format!("PUSH {}", v))
                    .collect())
            }
        }
    }
}

fn pattern(cell: &'static OnceLock<Result<Regex, regex::Error>>, source: &str) -> Result<&'static Regex, MacroError> {
    cell.get_or_init(|| Regex::new(source))
        .as_ref()
        .map_err(|e| MacroError::Pattern(e.to_string()))
}

fn list_regex() -> Result<&'static Regex, MacroError> {
    static LIST: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    pattern(&LIST, LIST_PATTERN)
}

fn text_regex() -> Result<&'static Regex, MacroError> {
    static TEXT: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    pattern(&TEXT, TEXT_PATTERN)
}

/// Values pushed by `PUSHS`, in push order.
pub fn push_values(arg: &str) -> Result<Vec<BigInt>, MacroError> {
    let arg = arg.trim();
    let (reverse, body) = match arg.strip_prefix('~') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, arg),
    };

    let mut values = if list_regex()?.is_match(body) {
        body.trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(|item| {
                item.trim()
                    .parse::<BigInt>()
                    .map_err(|_| MacroError::Malformed(arg.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?
    } else if let Some(caps) = text_regex()?.captures(body) {
        caps.get(1)
            .map_or("", |m| m.as_str())
            .chars()
            .map(|c| BigInt::from(c as u32))
            .collect()
    } else {
        return Err(MacroError::Malformed(arg.to_string()));
    };

    if reverse {
        values.reverse();
    }
    Ok(values)
}

/// Errors raised while expanding a macro.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacroError {
    #[error("{0} requires an argument")]
    MissingArgument(&'static str),

    #[error("cannot expand PUSHS {0}")]
    Malformed(String),

    #[error("invalid macro pattern: {0}")]
    Pattern(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<BigInt> {
        values.iter().map(|v| BigInt::from(*v)).collect()
    }

    #[test]
    fn test_list() {
        assert_eq!(push_values("[1, -2, 3]").unwrap(), ints(&[1, -2, 3]));
        assert_eq!(push_values("[ 7 ]").unwrap(), ints(&[7]));
        assert_eq!(push_values("~[1,2,3]").unwrap(), ints(&[3, 2, 1]));
    }

    #[test]
    fn test_string() {
        assert_eq!(push_values("\"hi\"").unwrap(), ints(&[104, 105]));
        assert_eq!(push_values("~\"hi\"").unwrap(), ints(&[105, 104]));
        assert_eq!(push_values("\"\"").unwrap(), ints(&[]));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(push_values("[1, x]"), Err(MacroError::Malformed(_))));
        assert!(matches!(push_values("[]"), Err(MacroError::Malformed(_))));
        assert!(matches!(push_values("hi"), Err(MacroError::Malformed(_))));
        assert_eq!(
            Macro::PushSeq.expand(None),
            Err(MacroError::MissingArgument("PUSHS"))
        );
    }

    #[test]
    fn test_expand_to_push() {
        let expanded = Macro::from_name("pushs").unwrap().expand(Some("[5, 6]")).unwrap();
        assert_eq!(expanded, vec!["PUSH 5".to_string(), "PUSH 6".to_string()]);
    }
}
