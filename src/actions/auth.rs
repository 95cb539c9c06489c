//! Login, challenge and logoff actions

use super::AmiAction;
use crate::{
    constants::{MARKER_AUTHENTICATION, MARKER_GOODBYE},
    error::AmiResult,
    fields::{ActionName, Field},
    protocol::Termination,
    request::ActionRequest,
};
use md5::{Digest, Md5};
use std::fmt;

/// Error returned when parsing an unrecognized auth mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAuthModeError(pub String);

impl fmt::Display for ParseAuthModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown auth mode: {}", self.0)
    }
}

impl std::error::Error for ParseAuthModeError {}

define_wire_enum! {
    error_type: ParseAuthModeError,
    /// How [`AmiClient::login`](crate::AmiClient::login) proves the secret.
    pub enum AuthMode {
        /// Secret sent as-is in a `Secret:` field
        Plain => "plain",
        /// Secret hashed with a server nonce (`AuthType: MD5`)
        Md5 => "MD5",
    }
}

impl Default for AuthMode {
    fn default() -> Self {
        AuthMode::Plain
    }
}

/// Compute the MD5 login key: lowercase hex of `md5(challenge ‖ secret)`.
///
/// ```
/// assert_eq!(
///     asterisk_ami_tokio::challenge_key("123456789", "mypass").len(),
///     32
/// );
/// ```
pub fn challenge_key(challenge: &str, secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(challenge.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// What a [`Login`] sends to prove identity.
#[derive(Clone, PartialEq, Eq)]
pub enum LoginCredential {
    /// Plain secret
    Secret(String),
    /// Hex key from [`challenge_key`]
    Md5Key(String),
}

impl fmt::Debug for LoginCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginCredential::Secret(_) => f
                .debug_tuple("Secret")
                .field(&"[REDACTED]")
                .finish(),
            LoginCredential::Md5Key(_) => f
                .debug_tuple("Md5Key")
                .field(&"[REDACTED]")
                .finish(),
        }
    }
}

/// `Action: Login`
///
/// The reply is read up to and including the `Message: Authentication ...`
/// line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    pub username: String,
    pub credential: LoginCredential,
    /// Send `Events: off` so no unsolicited events share this socket
    pub suppress_events: bool,
}

impl Login {
    /// Plain-secret login.
    pub fn plain(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            credential: LoginCredential::Secret(secret.into()),
            suppress_events: false,
        }
    }

    /// Challenge/response login with a precomputed key.
    pub fn md5(username: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            credential: LoginCredential::Md5Key(key.into()),
            suppress_events: false,
        }
    }

    /// Request `Events: off` for this session.
    pub fn suppress_events(mut self, on: bool) -> Self {
        self.suppress_events = on;
        self
    }
}

impl AmiAction for Login {
    fn to_request(&self) -> AmiResult<ActionRequest> {
        let request = ActionRequest::new(ActionName::Login)?;
        let request = match &self.credential {
            LoginCredential::Secret(secret) => request
                .field(Field::Username, &self.username)?
                .field(Field::Secret, secret)?,
            LoginCredential::Md5Key(key) => request
                .field(Field::AuthType, AuthMode::Md5)?
                .field(Field::Username, &self.username)?
                .field(Field::Key, key)?,
        };
        if self.suppress_events {
            request.field(Field::Events, "off")
        } else {
            Ok(request)
        }
    }

    fn termination(&self) -> Termination {
        Termination::marker_included(MARKER_AUTHENTICATION)
    }
}

/// `Action: Challenge` with `AuthType: MD5`
///
/// The server answers with one short block and no reliable footer, so the
/// reply is read until the socket goes idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Challenge;

impl AmiAction for Challenge {
    fn to_request(&self) -> AmiResult<ActionRequest> {
        ActionRequest::new(ActionName::Challenge)?.field(Field::AuthType, AuthMode::Md5)
    }

    fn termination(&self) -> Termination {
        Termination::Idle
    }
}

/// `Action: Logoff`
///
/// The server answers `Response: Goodbye` and closes the connection.
/// [`AmiClient::logout`](crate::AmiClient::logout) only writes the request;
/// through [`AmiClient::execute`](crate::AmiClient::execute) the reply is read
/// up to the `Goodbye` line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Logoff;

impl AmiAction for Logoff {
    fn to_request(&self) -> AmiResult<ActionRequest> {
        ActionRequest::new(ActionName::Logoff)
    }

    fn termination(&self) -> Termination {
        Termination::marker_included(MARKER_GOODBYE)
    }
}
