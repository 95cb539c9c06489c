//! Error types for the AMI client

use std::io;
use thiserror::Error;

/// Errors returned by [`AmiClient`](crate::AmiClient) and the protocol engine.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AmiError {
    /// TCP connect to the manager port failed or timed out.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        /// `host:port` that was dialed
        address: String,
        #[source]
        source: io::Error,
    },

    /// Operation needs an open transport and there is none.
    #[error("not connected")]
    NotConnected,

    /// The session was closed with [`AmiClient::close`](crate::AmiClient::close).
    #[error("session is closed")]
    SessionClosed,

    /// Writing the request failed (broken pipe, reset, partial write).
    #[error("failed to write request: {0}")]
    TransportWrite(#[source] io::Error),

    /// Reading failed, or the server closed the connection before replying.
    #[error("failed to read response: {0}")]
    TransportRead(#[source] io::Error),

    /// Idle timeout elapsed before a single byte of the reply arrived.
    #[error("no response within {timeout_ms}ms")]
    NoResponse {
        /// Idle timeout that elapsed
        timeout_ms: u64,
    },

    /// The termination condition was not met in time.
    #[error("response incomplete after {timeout_ms}ms ({lines} lines received)")]
    ResponseTimeout {
        /// Timeout that elapsed
        timeout_ms: u64,
        /// Lines accumulated before giving up
        lines: usize,
    },

    /// Login or challenge rejected.
    #[error("authentication failed: {reason}")]
    AuthenticationFailed {
        /// Server message, or a description of what was missing
        reason: String,
    },

    /// The CLI passthrough reported `No such command`.
    #[error("unknown CLI command: {command}")]
    UnknownCommand {
        /// Command text that was sent
        command: String,
    },

    /// `Action: Monitor` did not report success.
    #[error("failed to start monitoring {channel}")]
    MonitorFailed {
        /// Channel that was to be recorded
        channel: String,
    },

    /// Malformed request input or response data.
    #[error("protocol error: {message}")]
    ProtocolError {
        /// What went wrong
        message: String,
    },

    /// Connection options are unusable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Which option is wrong
        message: String,
    },
}

/// Result alias used throughout the crate.
pub type AmiResult<T> = Result<T, AmiError>;

impl AmiError {
    pub(crate) fn protocol_error(message: impl Into<String>) -> Self {
        AmiError::ProtocolError {
            message: message.into(),
        }
    }

    pub(crate) fn auth_failed(reason: impl Into<String>) -> Self {
        AmiError::AuthenticationFailed {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        AmiError::InvalidConfig {
            message: message.into(),
        }
    }

    /// `true` for failures of the TCP transport itself.
    ///
    /// After one of these the connection is probably unusable; a caller
    /// that wants reconnect-and-retry should `connect()` and log in again.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            AmiError::Connect { .. }
                | AmiError::NotConnected
                | AmiError::TransportWrite(_)
                | AmiError::TransportRead(_)
        )
    }

    /// `true` when reading stopped before the reply was complete, so its
    /// remainder may still arrive on the socket.
    pub(crate) fn abandons_response(&self) -> bool {
        matches!(
            self,
            AmiError::NoResponse { .. }
                | AmiError::ResponseTimeout { .. }
                | AmiError::ProtocolError { .. }
        )
    }

    /// `true` when the server was too slow rather than wrong.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            AmiError::NoResponse { .. } | AmiError::ResponseTimeout { .. }
        )
    }
}
