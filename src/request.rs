//! Action request encoding

use crate::{
    constants::LINE_TERMINATOR,
    error::{AmiError, AmiResult},
    fields::Field,
};
use std::fmt;

/// Validate that a user-provided string contains no line breaks.
///
/// AMI requests are CRLF-delimited; an embedded line break would end the
/// request early and let the rest be parsed as a second action.
fn validate_no_newlines(s: &str, context: &str) -> AmiResult<()> {
    if s.contains('\n') || s.contains('\r') {
        return Err(AmiError::protocol_error(format!(
            "{} must not contain newlines",
            context
        )));
    }
    Ok(())
}

/// One AMI action: ordered `Key: Value` lines closed by a blank line.
///
/// Field order is preserved exactly as added.
///
/// ```
/// use asterisk_ami_tokio::{ActionRequest, Field};
///
/// let req = ActionRequest::new("QueueStatus").unwrap()
///     .field(Field::Queue, "sales").unwrap()
///     .field("ActionID", 42).unwrap();
/// assert_eq!(
///     req.to_wire_format(),
///     "Action: QueueStatus\r\nQueue: sales\r\nActionID: 42\r\n\r\n"
/// );
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ActionRequest {
    fields: Vec<(String, String)>,
}

impl ActionRequest {
    /// Start a request with its `Action:` line.
    pub fn new(action: impl AsRef<str>) -> AmiResult<Self> {
        Self {
            fields: Vec::new(),
        }
        .field(Field::Action, action.as_ref())
    }

    /// Append a field.
    ///
    /// Returns an error if the name or value contains line breaks, or the
    /// name contains a colon.
    pub fn field(mut self, name: impl AsRef<str>, value: impl fmt::Display) -> AmiResult<Self> {
        let name = name.as_ref();
        let value = value.to_string();
        validate_no_newlines(name, "field name")?;
        validate_no_newlines(&value, "field value")?;
        if name.is_empty() || name.contains(':') {
            return Err(AmiError::protocol_error(format!(
                "invalid field name '{}'",
                name
            )));
        }
        self.fields
            .push((name.to_string(), value));
        Ok(self)
    }

    /// Append a field only when a value is present.
    ///
    /// An absent value leaves no line at all on the wire, which is not the
    /// same as sending the field empty.
    pub fn optional_field<V: fmt::Display>(
        self,
        name: impl AsRef<str>,
        value: Option<V>,
    ) -> AmiResult<Self> {
        match value {
            Some(v) => self.field(name, v),
            None => Ok(self),
        }
    }

    /// Value of the `Action:` field.
    pub fn action(&self) -> Option<&str> {
        self.get(Field::Action)
    }

    /// First value for `name` (case-insensitive).
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        let name = name.as_ref();
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All fields in wire order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Serialize to wire bytes: one CRLF line per field plus a blank line.
    pub fn to_wire_format(&self) -> String {
        use std::fmt::Write;
        let mut result = String::new();
        for (key, value) in &self.fields {
            let _ = write!(result, "{}: {}{}", key, value, LINE_TERMINATOR);
        }
        result.push_str(LINE_TERMINATOR);
        result
    }
}

impl fmt::Debug for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.fields {
            if Field::is_sensitive(key) {
                map.entry(key, &"[REDACTED]");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}
