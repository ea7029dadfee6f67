//! Best-effort structured extraction
//!
//! Helpers that ask a model for JSON never fail on unparseable output. They
//! return [`Extraction::FallbackRaw`] with the raw text instead, so callers
//! can tell a genuine structured result from a salvaged one.
//!
//! Handles the usual model output issues before giving up:
//! - Markdown code fence wrapping (```json ... ```)
//! - Trailing commas
//! - Missing closing braces/brackets
//! - JSON embedded in explanatory text

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Outcome of parsing a model reply as `T`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Extraction<T> {
    Parsed(T),
    FallbackRaw(String),
}

/// Default-shaped record built from unparseable model output
pub trait FromRawFallback {
    fn from_raw(raw: String) -> Self;
}

impl<T> Extraction<T> {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Extraction::Parsed(_))
    }

    pub fn parsed(self) -> Option<T> {
        match self {
            Extraction::Parsed(value) => Some(value),
            Extraction::FallbackRaw(_) => None,
        }
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            Extraction::Parsed(_) => None,
            Extraction::FallbackRaw(raw) => Some(raw),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Extraction<U> {
        match self {
            Extraction::Parsed(value) => Extraction::Parsed(f(value)),
            Extraction::FallbackRaw(raw) => Extraction::FallbackRaw(raw),
        }
    }

    /// Collapse into `T`, wrapping raw text into its default shape.
    /// Every structured field must then be treated as possibly empty.
    pub fn into_best_effort(self) -> T
    where
        T: FromRawFallback,
    {
        match self {
            Extraction::Parsed(value) => value,
            Extraction::FallbackRaw(raw) => T::from_raw(raw),
        }
    }
}

impl<T: FromRawFallback> FromRawFallback for Vec<T> {
    fn from_raw(raw: String) -> Self {
        vec![T::from_raw(raw)]
    }
}

/// Parse `raw` as `T`, repairing common formatting damage first
pub fn extract_structured<T: DeserializeOwned>(raw: &str) -> Extraction<T> {
    let cleaned = strip_code_fences(raw.trim().trim_start_matches('\u{feff}'));

    if let Ok(value) = serde_json::from_str::<T>(&cleaned) {
        return Extraction::Parsed(value);
    }
    debug!("Structured parse failed, attempting repair");

    let candidates = [
        Some(balance_brackets(&fix_trailing_commas(&cleaned))),
        extract_embedded(&cleaned).map(|s| balance_brackets(&fix_trailing_commas(&s))),
    ];
    for candidate in candidates.into_iter().flatten() {
        if let Ok(value) = serde_json::from_str::<T>(&candidate) {
            debug!("Structured output repaired");
            return Extraction::Parsed(value);
        }
    }

    warn!(
        preview = %raw.chars().take(120).collect::<String>(),
        "Model output is not valid JSON, keeping raw text"
    );
    Extraction::FallbackRaw(raw.to_string())
}

fn strip_code_fences(s: &str) -> String {
    let mut body = s;
    if body.starts_with("```") {
        body = body.find('\n').map_or("", |i| &body[i + 1..]);
    }
    if let Some(stripped) = body.trim_end().strip_suffix("```") {
        body = stripped;
    }
    body.trim().to_string()
}

fn fix_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escape = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            match ch {
                _ if escape => escape = false,
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            result.push(ch);
            continue;
        }
        if ch == '"' {
            in_string = true;
        } else if ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some(']') | Some('}')) {
                continue;
            }
        }
        result.push(ch);
    }
    result
}

/// Close an unterminated string and any open brackets, innermost first
fn balance_brackets(s: &str) -> String {
    let mut open: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for ch in s.chars() {
        if in_string {
            match ch {
                _ if escape => escape = false,
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => open.push('}'),
            '[' => open.push(']'),
            '}' | ']' => {
                open.pop();
            }
            _ => {}
        }
    }

    let mut result = s.to_string();
    if in_string {
        result.push('"');
    }
    result.extend(open.into_iter().rev());
    result
}

/// First JSON object or array inside surrounding prose
fn extract_embedded(s: &str) -> Option<String> {
    let start = s.find(['{', '['])?;
    let closer = if s[start..].starts_with('{') { '}' } else { ']' };
    let body = &s[start..];
    match body.rfind(closer) {
        Some(end) => Some(body[..=end].to_string()),
        None => Some(body.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Summary {
        title: String,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        raw: Option<String>,
    }

    impl FromRawFallback for Summary {
        fn from_raw(raw: String) -> Self {
            Self {
                raw: Some(raw),
                ..Default::default()
            }
        }
    }

    #[test]
    fn test_plain_json_parses() {
        let result: Extraction<Summary> = extract_structured(r#"{"title":"Q3","tags":["a"]}"#);
        assert_eq!(
            result.parsed().unwrap(),
            Summary {
                title: "Q3".into(),
                tags: vec!["a".into()],
                raw: None
            }
        );
    }

    #[test]
    fn test_fenced_json_with_trailing_comma() {
        let raw = "```json\n{\"title\": \"Deal\", \"tags\": [\"x\", \"y\",],}\n```";
        let result: Extraction<Summary> = extract_structured(raw);
        assert_eq!(result.parsed().unwrap().tags, vec!["x", "y"]);
    }

    #[test]
    fn test_json_inside_prose_and_truncated() {
        let raw = "Here is the result:\n{\"title\": \"Lead\", \"tags\": [\"saas\"";
        let result: Extraction<Summary> = extract_structured(raw);
        assert!(result.is_parsed());
    }

    #[test]
    fn test_comma_inside_string_is_kept() {
        let fixed = fix_trailing_commas(r#"{"a": "x, }", }"#);
        assert_eq!(fixed, r#"{"a": "x, }" }"#);
    }

    #[test]
    fn test_unparseable_falls_back_to_raw() {
        let result: Extraction<Summary> = extract_structured("I cannot help with that.");
        assert_eq!(result.raw(), Some("I cannot help with that."));

        let best = result.into_best_effort();
        assert_eq!(best.title, "");
        assert!(best.tags.is_empty());
        assert_eq!(best.raw.as_deref(), Some("I cannot help with that."));
    }

    #[test]
    fn test_vec_fallback_wraps_single_record() {
        let result: Extraction<Vec<Summary>> = extract_structured("no json here");
        let best = result.into_best_effort();
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].raw.as_deref(), Some("no json here"));
    }
}
