//! Channel recording

use super::AmiAction;
use crate::{
    error::AmiResult,
    fields::{ActionName, Field},
    protocol::Termination,
    request::ActionRequest,
};

/// `Action: Monitor`: record a channel to a file.
///
/// [`AmiClient::start_monitor`](crate::AmiClient::start_monitor) treats any
/// reply without `Success` as [`MonitorFailed`](crate::AmiError::MonitorFailed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartMonitor {
    pub channel: String,
    /// File name without extension
    pub file: String,
    /// Audio format, e.g. `wav` or `gsm`
    pub format: String,
    /// Mix both legs into one file when recording stops
    pub mix: bool,
}

impl StartMonitor {
    pub fn new(
        channel: impl Into<String>,
        file: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            file: file.into(),
            format: format.into(),
            mix: false,
        }
    }

    pub fn mix(mut self, mix: bool) -> Self {
        self.mix = mix;
        self
    }
}

impl AmiAction for StartMonitor {
    fn to_request(&self) -> AmiResult<ActionRequest> {
        ActionRequest::new(ActionName::Monitor)?
            .field(Field::Channel, &self.channel)?
            .field(Field::File, &self.file)?
            .field(Field::Format, &self.format)?
            .field(Field::Mix, u8::from(self.mix))
    }

    fn termination(&self) -> Termination {
        Termination::Idle
    }
}

/// `Action: StopMonitor`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopMonitor {
    pub channel: String,
}

impl StopMonitor {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }
}

impl AmiAction for StopMonitor {
    fn to_request(&self) -> AmiResult<ActionRequest> {
        ActionRequest::new(ActionName::StopMonitor)?.field(Field::Channel, &self.channel)
    }

    fn termination(&self) -> Termination {
        Termination::Idle
    }
}
