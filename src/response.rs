//! Accumulated action responses

use crate::fields::Field;
use std::collections::HashMap;

/// Text returned for one action, exactly as framed by the read loop.
///
/// AMI replies are `Key: Value` blocks, but listings and CLI output are
/// free-form, so the raw lines are kept alongside a field map in which a
/// later line overwrites an earlier one with the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmiResponse {
    lines: Vec<String>,
    headers: HashMap<String, String>,
}

/// Split `Key: Value`. Lines without a colon (CLI output, blank separators)
/// are not fields.
fn split_field(line: &str) -> Option<(&str, &str)> {
    let colon_pos = line.find(':')?;
    let key = line[..colon_pos].trim();
    if key.is_empty() || key.contains(' ') {
        return None;
    }
    Some((key, line[colon_pos + 1..].trim()))
}

impl AmiResponse {
    /// Build from lines without their terminators.
    pub fn from_lines(lines: Vec<String>) -> Self {
        let mut headers = HashMap::new();
        for line in &lines {
            if let Some((key, value)) = split_field(line) {
                headers.insert(key.to_ascii_lowercase(), value.to_string());
            }
        }
        Self { lines, headers }
    }

    /// Lines in arrival order, terminators stripped.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines received.
    pub fn len(&self) -> usize {
        self.lines
            .len()
    }

    /// `true` if nothing was received.
    pub fn is_empty(&self) -> bool {
        self.lines
            .is_empty()
    }

    /// Response text with CRLF line endings.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(line);
            text.push_str("\r\n");
        }
        text
    }

    /// Substring search over all lines.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .iter()
            .any(|line| line.contains(needle))
    }

    /// Last value seen for a field (case-insensitive).
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(
                &name
                    .as_ref()
                    .to_ascii_lowercase(),
            )
            .map(|s| s.as_str())
    }

    /// Every field, keyed by lowercased name.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// `Response:` field (`Success`, `Error`, `Goodbye`, `Pong`, ...).
    pub fn response(&self) -> Option<&str> {
        self.header(Field::Response)
    }

    /// `Message:` field.
    pub fn message(&self) -> Option<&str> {
        self.header(Field::Message)
    }

    /// `true` when `Response: Success` was received.
    pub fn is_success(&self) -> bool {
        self.response()
            .is_some_and(|r| r.eq_ignore_ascii_case("Success"))
    }
}
