//! Surface styles.
//!
//! A style maps raw source characters onto the three symbols. Characters a
//! style does not map are comments and are dropped before tokenizing.

use std::collections::HashMap;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use crate::alphabet::Symbol;

/// A character → symbol lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    name: String,
    map: HashMap<char, Symbol>,
    /// Character used when rendering each symbol (indexed by slot).
    render: [char; 3],
}

/// JSON description of a custom style.
///
/// Each field lists every character that maps to the symbol; the first
/// character is used when rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleSpec {
    pub name: String,
    pub space: String,
    pub tab: String,
    pub lf: String,
}

impl Style {
    /// The original whitespace syntax: space, tab and line feed.
    pub fn origin() -> Self {
        Self::from_pairs("origin", &[(' ', Symbol::S), ('\t', Symbol::T), ('\n', Symbol::L)])
    }

    /// The letter syntax: `S`, `T` and `L`.
    pub fn stl() -> Self {
        Self::from_pairs("stl", &[('S', Symbol::S), ('T', Symbol::T), ('L', Symbol::L)])
    }

    fn from_pairs(name: &str, pairs: &[(char, Symbol)]) -> Self {
        let mut render = [' '; 3];
        for (c, symbol) in pairs {
            render[symbol.index()] = *c;
        }
        Self {
            name: name.to_string(),
            map: pairs.iter().copied().collect(),
            render,
        }
    }

    /// Look up a built-in style by name.
    pub fn builtin(name: &str) -> Result<Self, StyleError> {
        match name.to_ascii_lowercase().as_str() {
            "origin" | "ws" | "whitespace" => Ok(Self::origin()),
            "stl" | "letters" => Ok(Self::stl()),
            _ => Err(StyleError::Unknown(name.to_string())),
        }
    }

    /// Build a style from a [`StyleSpec`].
    pub fn from_spec(spec: &StyleSpec) -> Result<Self, StyleError> {
        let mut map = HashMap::new();
        let mut render = [' '; 3];

        for (symbol, chars) in [(Symbol::S, &spec.space), (Symbol::T, &spec.tab), (Symbol::L, &spec.lf)] {
            let first = chars.chars().next().ok_or(StyleError::Empty(symbol))?;
            render[symbol.index()] = first;
            for c in chars.chars() {
                if let Some(previous) = map.insert(c, symbol) {
                    if previous != symbol {
                        return Err(StyleError::Overlap(c));
                    }
                }
            }
        }

        Ok(Self { name: spec.name.clone(), map, render })
    }

    /// Parse a JSON style description.
    pub fn from_json(json: &str) -> Result<Self, StyleError> {
        let spec: StyleSpec = serde_json::from_str(json)
            .map_err(|e| StyleError::Json(e.to_string()))?;
        Self::from_spec(&spec)
    }

    /// Style name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Map one character. `None` for characters the style ignores.
    #[inline]
    pub fn symbol(&self, c: char) -> Option<Symbol> {
        self.map.get(&c).copied()
    }

    /// Reduce source text to its symbol stream, dropping unmapped characters.
    pub fn remap(&self, source: &str) -> Vec<Symbol> {
        source.chars().filter_map(|c| self.symbol(c)).collect()
    }

    /// The characters of `source` this style ignores (the "comment" text).
    pub fn filler(&self, source: &str) -> String {
        source.chars().filter(|c| !self.map.contains_key(c)).collect()
    }

    /// Render a symbol stream in this style.
    pub fn render(&self, symbols: &[Symbol]) -> String {
        symbols.iter().map(|s| self.render[s.index()]).collect()
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::origin()
    }
}

/// Errors raised while building a style.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    #[error("unknown style: {0}")]
    Unknown(String),

    #[error("no characters mapped to symbol {0}")]
    Empty(Symbol),

    #[error("character {0:?} mapped to more than one symbol")]
    Overlap(char),

    #[error("invalid style description: {0}")]
    Json(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::symbol::letters;

    #[test]
    fn test_origin_drops_unmapped() {
        let style = Style::origin();
        assert_eq!(letters(&style.remap("a s ")), "SS");
        assert_eq!(style.filler("a s "), "as");
    }

    #[test]
    fn test_stl_is_case_sensitive() {
        let style = Style::stl();
        assert_eq!(letters(&style.remap("aLsS")), "LS");
    }

    #[test]
    fn test_render_roundtrip() {
        let style = Style::origin();
        let symbols = Style::stl().remap("SSTL");
        let text = style.render(&symbols);
        assert_eq!(text, "  \t\n");
        assert_eq!(style.remap(&text), symbols);
    }

    #[test]
    fn test_custom_style_from_json() {
        let style = Style::from_json(r#"{"name": "dots", "space": ".,", "tab": "-", "lf": "|"}"#).unwrap();
        assert_eq!(style.name(), "dots");
        assert_eq!(letters(&style.remap(". , - | x")), "SSTL");
        assert_eq!(style.render(&style.remap(",-|")), ".-|");
    }

    #[test]
    fn test_custom_style_overlap() {
        let err = Style::from_json(r#"{"name": "bad", "space": "a", "tab": "a", "lf": "b"}"#).unwrap_err();
        assert_eq!(err, StyleError::Overlap('a'));
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(Style::builtin("STL").unwrap(), Style::stl());
        assert!(matches!(Style::builtin("braille"), Err(StyleError::Unknown(_))));
    }
}
