//! Status queries, listings, CLI passthrough and ping

use super::AmiAction;
use crate::{
    constants::{
        MARKER_END_COMMAND, MARKER_IAX_PEERS, MARKER_PARKED_CALLS_COMPLETE, MARKER_RESPONSE,
        MARKER_SIP_PEERS,
    },
    error::AmiResult,
    fields::{ActionName, Field},
    protocol::Termination,
    request::ActionRequest,
};

/// `Action: Status`, for one channel or, with `None`, for all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelStatus {
    pub channel: Option<String>,
}

impl ChannelStatus {
    pub fn all() -> Self {
        Self { channel: None }
    }

    pub fn channel(channel: impl Into<String>) -> Self {
        Self {
            channel: Some(channel.into()),
        }
    }
}

impl AmiAction for ChannelStatus {
    fn to_request(&self) -> AmiResult<ActionRequest> {
        ActionRequest::new(ActionName::Status)?.optional_field(Field::Channel, self.channel.as_deref())
    }

    fn termination(&self) -> Termination {
        Termination::Idle
    }
}

/// `Action: Sippeers`
///
/// Read up to the `ListItems` line of the closing `PeerlistComplete` event,
/// which is left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SipPeers;

impl AmiAction for SipPeers {
    fn to_request(&self) -> AmiResult<ActionRequest> {
        ActionRequest::new(ActionName::SipPeers)
    }

    fn termination(&self) -> Termination {
        Termination::marker_excluded(MARKER_SIP_PEERS)
    }
}

/// `Action: IAXPeers`, read up to the `N iax2 peers` summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IaxPeers;

impl AmiAction for IaxPeers {
    fn to_request(&self) -> AmiResult<ActionRequest> {
        ActionRequest::new(ActionName::IaxPeers)
    }

    fn termination(&self) -> Termination {
        Termination::marker_excluded(MARKER_IAX_PEERS)
    }
}

/// `Action: ParkedCalls`, read through the `ParkedCallsComplete` event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParkedCalls;

impl AmiAction for ParkedCalls {
    fn to_request(&self) -> AmiResult<ActionRequest> {
        ActionRequest::new(ActionName::ParkedCalls)?.field(Field::Parameters, Field::ActionId)
    }

    fn termination(&self) -> Termination {
        Termination::marker_included(MARKER_PARKED_CALLS_COMPLETE)
    }
}

/// `Action: Command`: run an Asterisk CLI command and collect its output.
///
/// Output ends at the `--END COMMAND--` footer, which is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliCommand {
    pub command: String,
}

impl CliCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl AmiAction for CliCommand {
    fn to_request(&self) -> AmiResult<ActionRequest> {
        ActionRequest::new(ActionName::Command)?.field(Field::Command, &self.command)
    }

    fn termination(&self) -> Termination {
        Termination::marker_excluded(MARKER_END_COMMAND)
    }
}

/// `Action: Ping`, answered by a single `Response:` line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ping;

impl AmiAction for Ping {
    fn to_request(&self) -> AmiResult<ActionRequest> {
        ActionRequest::new(ActionName::Ping)
    }

    fn termination(&self) -> Termination {
        Termination::marker_included(MARKER_RESPONSE)
    }
}
