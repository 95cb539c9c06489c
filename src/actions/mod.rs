//! Typed builders for the supported AMI actions.
//!
//! Each action knows how to encode itself and which [`Termination`] policy
//! frames its reply; [`AmiClient::execute`](crate::AmiClient::execute) does
//! the rest. New actions only need an [`AmiAction`] impl:
//!
//! ```
//! use asterisk_ami_tokio::{ActionRequest, AmiAction, AmiResult, Field, Termination};
//!
//! struct QueueStatus<'a> {
//!     queue: &'a str,
//! }
//!
//! impl AmiAction for QueueStatus<'_> {
//!     fn to_request(&self) -> AmiResult<ActionRequest> {
//!         ActionRequest::new("QueueStatus")?.field(Field::Queue, self.queue)
//!     }
//!
//!     fn termination(&self) -> Termination {
//!         Termination::marker_included("QueueStatusComplete")
//!     }
//! }
//!
//! let wire = QueueStatus { queue: "sales" }.to_request().unwrap().to_wire_format();
//! assert_eq!(wire, "Action: QueueStatus\r\nQueue: sales\r\n\r\n");
//! ```

mod auth;
mod call;
mod monitor;
mod queue;
mod status;

pub use auth::{challenge_key, AuthMode, Challenge, Login, LoginCredential, Logoff, ParseAuthModeError};
pub use call::{Originate, Variables};
pub use monitor::{StartMonitor, StopMonitor};
pub use queue::{QueueAdd, QueueRemove, Queues};
pub use status::{ChannelStatus, CliCommand, IaxPeers, ParkedCalls, Ping, SipPeers};

use crate::{error::AmiResult, protocol::Termination, request::ActionRequest};

/// An action that can be sent through [`AmiClient::execute`](crate::AmiClient::execute).
pub trait AmiAction {
    /// Encode the action. Fails on field values that would break framing.
    fn to_request(&self) -> AmiResult<ActionRequest>;

    /// How the reply to this action is framed.
    fn termination(&self) -> Termination;
}
