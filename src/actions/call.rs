//! Call origination

use super::AmiAction;
use crate::{
    error::{AmiError, AmiResult},
    fields::{ActionName, Field},
    protocol::Termination,
    request::ActionRequest,
};
use std::fmt;

/// Channel variables for an `Originate`, packed into one `Variable:` field
/// as `key=value` pairs joined by `|`.
///
/// ```
/// use asterisk_ami_tokio::Variables;
///
/// let vars = Variables::new().set("CALLERID(num)", "5551234").set("team", "sales");
/// assert_eq!(vars.to_string(), "CALLERID(num)=5551234|team=sales");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables(Vec<(String, String)>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a variable, keeping first-insertion order.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .0
            .iter_mut()
            .find(|(k, _)| *k == name)
        {
            Some(slot) => slot.1 = value,
            None => self
                .0
                .push((name, value)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0
            .is_empty()
    }

    pub fn len(&self) -> usize {
        self.0
            .len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn validate(&self) -> AmiResult<()> {
        for (name, value) in &self.0 {
            if name.is_empty() || name.contains('=') || name.contains('|') {
                return Err(AmiError::protocol_error(format!(
                    "invalid variable name '{}'",
                    name
                )));
            }
            if value.contains('|') {
                return Err(AmiError::protocol_error(format!(
                    "value of variable '{}' must not contain '|'",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Variables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self
            .0
            .iter()
            .enumerate()
        {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Variables::new(), |vars, (k, v)| vars.set(k, v))
    }
}

/// `Action: Originate`
///
/// Places a call from `channel` into `context`/`extension`. The reply is
/// drained until the socket goes idle and not inspected: the call itself is
/// reported later through events this client does not consume.
///
/// ```
/// use asterisk_ami_tokio::{AmiAction, Originate};
///
/// let wire = Originate::new("SIP/100", "from-internal", "200")
///     .caller_id("Reception <100>")
///     .to_request()
///     .unwrap()
///     .to_wire_format();
/// assert!(wire.starts_with("Action: Originate\r\nChannel: SIP/100\r\n"));
/// assert!(wire.contains("Callerid: Reception <100>\r\n"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Originate {
    pub channel: String,
    pub context: String,
    pub extension: String,
    /// Dialplan priority. Default: 1
    pub priority: u32,
    pub caller_id: Option<String>,
    /// Ring timeout in milliseconds. Default: 30000
    pub timeout_ms: u64,
    pub variables: Variables,
    pub action_id: Option<String>,
}

impl Originate {
    pub fn new(
        channel: impl Into<String>,
        context: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            context: context.into(),
            extension: extension.into(),
            priority: 1,
            caller_id: None,
            timeout_ms: 30_000,
            variables: Variables::new(),
            action_id: None,
        }
    }

    pub fn priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn caller_id(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn action_id(mut self, action_id: impl Into<String>) -> Self {
        self.action_id = Some(action_id.into());
        self
    }
}

impl AmiAction for Originate {
    fn to_request(&self) -> AmiResult<ActionRequest> {
        self.variables
            .validate()?;
        let variables = (!self
            .variables
            .is_empty())
        .then(|| self.variables.to_string());

        ActionRequest::new(ActionName::Originate)?
            .field(Field::Channel, &self.channel)?
            .field(Field::Context, &self.context)?
            .field(Field::Exten, &self.extension)?
            .field(Field::Priority, self.priority)?
            .optional_field(Field::CallerId, self.caller_id.as_deref())?
            .field(Field::Timeout, self.timeout_ms)?
            .optional_field(Field::Variable, variables)?
            .optional_field(Field::ActionId, self.action_id.as_deref())
    }

    fn termination(&self) -> Termination {
        Termination::Idle
    }
}
