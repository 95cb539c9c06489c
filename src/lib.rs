//! Asterisk Manager Interface (AMI) client for Rust
//!
//! This crate provides an async client for Asterisk's Manager Interface, the
//! line-oriented TCP protocol (port 5038) used to administer an Asterisk PBX:
//! log in, originate calls, manage queue members, record channels, list
//! peers and run CLI commands.
//!
//! # Framing
//!
//! AMI replies carry no length field, and different actions end in different
//! ways. Each action therefore declares a [`Termination`] policy:
//!
//! - [`Termination::Marker`]: read until a line containing a marker such as
//!   `--END COMMAND--`, keeping or dropping that line;
//! - [`Termination::Idle`]: read until the socket has been quiet for the
//!   read timeout.
//!
//! All actions go through one primitive, [`AmiClient::send`], which writes a
//! request and reads its reply under the chosen policy. Replies never wait
//! forever: the read timeout and an overall response timeout bound every
//! call.
//!
//! # Examples
//!
//! ```rust,no_run
//! use asterisk_ami_tokio::{AmiClient, AmiConnectOptions, AmiError, AuthMode, Originate, Variables};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AmiError> {
//!     let client = AmiClient::new(AmiConnectOptions::new("127.0.0.1")).await?;
//!     client.connect().await?;
//!     client.login("admin", "amp111", AuthMode::Md5, true).await?;
//!
//!     let output = client.command("core show version").await?;
//!     println!("{}", output.text());
//!
//!     client.queue_add("sales", "SIP/200", Some(1)).await?;
//!
//!     let call = Originate::new("SIP/200", "from-internal", "100")
//!         .caller_id("Sales <200>")
//!         .variables(Variables::new().set("campaign", "spring"));
//!     client.originate(&call).await?;
//!
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Custom actions
//!
//! Actions outside the built-in catalogue can be sent with an explicit policy:
//!
//! ```rust,no_run
//! use asterisk_ami_tokio::{ActionRequest, AmiClient, AmiError, Termination};
//!
//! # async fn example(client: &AmiClient) -> Result<(), AmiError> {
//! let request = ActionRequest::new("CoreShowChannels")?;
//! let response = client
//!     .send(&request, &Termination::marker_included("CoreShowChannelsComplete"))
//!     .await?;
//! for line in response.lines() {
//!     println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Unsolicited `Event:` messages share the socket with replies and are not
//! demultiplexed; log in with `suppress_events = true` to keep them off a
//! command connection.

#[macro_use]
mod macros;

pub mod actions;
pub mod connection;
pub mod constants;
pub mod error;
pub mod fields;

pub(crate) mod buffer;
pub(crate) mod protocol;
pub(crate) mod request;
pub(crate) mod response;

pub use actions::{
    challenge_key, AmiAction, AuthMode, Challenge, ChannelStatus, CliCommand, IaxPeers, Login,
    LoginCredential, Logoff, Originate, ParkedCalls, ParseAuthModeError, Ping, QueueAdd,
    QueueRemove, Queues, SipPeers, StartMonitor, StopMonitor, Variables,
};
pub use connection::{AmiClient, AmiConnectOptions, SessionState};
pub use constants::DEFAULT_AMI_PORT;
pub use error::{AmiError, AmiResult};
pub use fields::{ActionName, Field, ParseActionNameError, ParseFieldError};
pub use protocol::{MarkerLine, Termination};
pub use request::ActionRequest;
pub use response::AmiResponse;
