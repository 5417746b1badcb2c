//! Layered answer extraction from free-form model replies.
//!
//! Layers are tried in order, each one lossier than the last:
//! 1. a fenced ```` ```json ```` block,
//! 2. the first balanced `{...}` that parses as JSON,
//! 3. task-specific regular expressions, in the order they were added,
//! 4. the configured default (sentinel) value.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{CoreError, Result};

/// Placeholder answer used by tasks that must answer something.
pub const DEFAULT_SENTINEL: &str = "znacznik";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionLayer {
    FencedJson,
    BracedJson,
    Pattern,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub pattern: String,
    pub text: String,
    pub groups: Vec<String>,
}

/// What an [`Extractor`] found and which layer found it.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    FencedJson(Value),
    BracedJson(Value),
    Pattern(PatternMatch),
    Default(String),
}

impl Extracted {
    pub fn layer(&self) -> ExtractionLayer {
        match self {
            Extracted::FencedJson(_) => ExtractionLayer::FencedJson,
            Extracted::BracedJson(_) => ExtractionLayer::BracedJson,
            Extracted::Pattern(_) => ExtractionLayer::Pattern,
            Extracted::Default(_) => ExtractionLayer::Default,
        }
    }

    pub fn json(&self) -> Option<&Value> {
        match self {
            Extracted::FencedJson(v) | Extracted::BracedJson(v) => Some(v),
            _ => None,
        }
    }

    /// Flatten to a string: JSON strings unquoted, other JSON compact, patterns as matched.
    pub fn into_text(self) -> String {
        match self {
            Extracted::FencedJson(Value::String(s)) | Extracted::BracedJson(Value::String(s)) => s,
            Extracted::FencedJson(v) | Extracted::BracedJson(v) => v.to_string(),
            Extracted::Pattern(m) => m.text,
            Extracted::Default(s) => s,
        }
    }
}

/// A named regular expression for the pattern layer.
#[derive(Debug, Clone)]
pub struct TextPattern {
    name: String,
    regex: Regex,
}

impl TextPattern {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| CoreError::Configuration(format!("invalid pattern {}: {}", pattern, e)))?;
        Ok(Self {
            name: name.into(),
            regex,
        })
    }

    /// Grid coordinates written as `(x, y)`.
    pub fn coordinates() -> Result<Self> {
        Self::new("coordinates", r"\((\d+),\s*(\d+)\)")
    }

    /// Dates as `YYYY-MM-DD`, `YYYY_MM_DD`, `DD-MM-YYYY` or `DD_MM_YYYY`.
    pub fn dates() -> Result<Self> {
        Self::new(
            "dates",
            r"\d{4}-\d{2}-\d{2}|\d{4}_\d{2}_\d{2}|\d{2}-\d{2}-\d{4}|\d{2}_\d{2}_\d{4}",
        )
    }

    /// Polish street names with their prefix, e.g. `ul. Marszałkowska`.
    pub fn streets() -> Result<Self> {
        Self::new(
            "streets",
            r"(?:ulica|ul\.|aleja|al\.|plac|pl\.) [A-ZŻŹĆĄŚĘŁÓŃ][a-zżźćńółęąś]+",
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find(&self, text: &str) -> Option<PatternMatch> {
        let caps = self.regex.captures(text)?;
        let whole = caps.get(0)?.as_str().to_string();
        let groups = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str().to_string())
            .collect();
        Some(PatternMatch {
            pattern: self.name.clone(),
            text: whole,
            groups,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Extractor {
    patterns: Vec<TextPattern>,
    default: Option<String>,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, pattern: TextPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Run the layers over `reply`. Without a default, an unmatched reply is
    /// an [`CoreError::Extraction`] and the caller decides what to do.
    pub fn extract(&self, reply: &str) -> Result<Extracted> {
        if let Some(value) = fenced_json(reply) {
            return Ok(Extracted::FencedJson(value));
        }
        if let Some(value) = braced_json(reply) {
            return Ok(Extracted::BracedJson(value));
        }
        for pattern in &self.patterns {
            if let Some(found) = pattern.find(reply) {
                debug!(pattern = pattern.name(), matched = %found.text, "Pattern layer matched");
                return Ok(Extracted::Pattern(found));
            }
        }
        match &self.default {
            Some(default) => Ok(Extracted::Default(default.clone())),
            None => Err(CoreError::Extraction(format!(
                "no JSON or pattern match in reply of {} chars",
                reply.chars().count()
            ))),
        }
    }
}

/// The first fenced code block (```` ```json ```` or a bare fence) whose body parses as JSON.
pub fn fenced_json(text: &str) -> Option<Value> {
    let mut rest = text;
    while let Some(start) = rest.find("```") {
        let after = &rest[start + 3..];
        let end_rel = after.find("```")?;
        let block = &after[..end_rel];
        let (label, content) = match block.find('\n') {
            Some(nl) => (block[..nl].trim(), &block[nl..]),
            None => match block.trim_start().strip_prefix("json") {
                Some(stripped) => ("json", stripped),
                None => ("", block),
            },
        };
        if label.is_empty() || label.eq_ignore_ascii_case("json") {
            if let Ok(value) = serde_json::from_str::<Value>(content.trim()) {
                return Some(value);
            }
        }
        rest = &after[end_rel + 3..];
    }
    None
}

/// The first balanced `{...}` span that parses as JSON. Braces inside JSON
/// strings are ignored; if a candidate fails to parse the scan moves on to the
/// next opening brace.
pub fn braced_json(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let mut offset = 0;
    while let Some(rel) = text[offset..].find('{') {
        let start = offset + rel;
        if let Some(end) = balanced_end(bytes, start) {
            if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
                return Some(value);
            }
        }
        offset = start + 1;
    }
    None
}

fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_braced_json_skips_strings_and_bad_candidates() {
        let text = r#"uwaga {nie json} a potem {"a": "x}y", "b": {"c": 1}} koniec"#;
        assert_eq!(braced_json(text), Some(json!({"a": "x}y", "b": {"c": 1}})));
        assert_eq!(braced_json("{ niedomknięte"), None);
    }

    #[test]
    fn test_fenced_json_ignores_other_languages() {
        let text = "```python\n{\"x\": 1}\n```\n```json\n{\"x\": 2}\n```";
        assert_eq!(fenced_json(text), Some(json!({"x": 2})));
    }

    #[test]
    fn test_pattern_groups() {
        let found = TextPattern::coordinates().unwrap().find("pole (2, 3) na mapie").unwrap();
        assert_eq!(found.text, "(2, 3)");
        assert_eq!(found.groups, vec!["2", "3"]);
    }

    #[test]
    fn test_no_match_without_default_is_error() {
        let extractor = Extractor::new();
        assert!(matches!(
            extractor.extract("nic tu nie ma"),
            Err(CoreError::Extraction(_))
        ));
    }
}
