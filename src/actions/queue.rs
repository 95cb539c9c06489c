//! Queue membership and listing

use super::AmiAction;
use crate::{
    error::AmiResult,
    fields::{ActionName, Field},
    protocol::Termination,
    request::ActionRequest,
};

/// `Action: QueueAdd`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueAdd {
    pub queue: String,
    /// Member interface, e.g. `SIP/200`
    pub interface: String,
    /// Sent only when set; `Some(0)` is sent as `Penalty: 0`.
    pub penalty: Option<u32>,
}

impl QueueAdd {
    pub fn new(queue: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            interface: interface.into(),
            penalty: None,
        }
    }

    pub fn penalty(mut self, penalty: u32) -> Self {
        self.penalty = Some(penalty);
        self
    }
}

impl AmiAction for QueueAdd {
    fn to_request(&self) -> AmiResult<ActionRequest> {
        ActionRequest::new(ActionName::QueueAdd)?
            .field(Field::Queue, &self.queue)?
            .field(Field::Interface, &self.interface)?
            .optional_field(Field::Penalty, self.penalty)
    }

    fn termination(&self) -> Termination {
        Termination::Idle
    }
}

/// `Action: QueueRemove`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRemove {
    pub queue: String,
    pub interface: String,
}

impl QueueRemove {
    pub fn new(queue: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            interface: interface.into(),
        }
    }
}

impl AmiAction for QueueRemove {
    fn to_request(&self) -> AmiResult<ActionRequest> {
        ActionRequest::new(ActionName::QueueRemove)?
            .field(Field::Queue, &self.queue)?
            .field(Field::Interface, &self.interface)
    }

    fn termination(&self) -> Termination {
        Termination::Idle
    }
}

/// `Action: Queues`: CLI-style summary of every queue and its members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Queues;

impl AmiAction for Queues {
    fn to_request(&self) -> AmiResult<ActionRequest> {
        ActionRequest::new(ActionName::Queues)
    }

    fn termination(&self) -> Termination {
        Termination::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_add_without_penalty() {
        let wire = QueueAdd::new("sales", "SIP/200")
            .to_request()
            .unwrap()
            .to_wire_format();
        assert_eq!(
            wire,
            "Action: QueueAdd\r\nQueue: sales\r\nInterface: SIP/200\r\n\r\n"
        );
        assert!(!wire.contains("Penalty"));
    }

    #[test]
    fn test_queue_add_with_penalty() {
        let wire = QueueAdd::new("sales", "SIP/200")
            .penalty(3)
            .to_request()
            .unwrap()
            .to_wire_format();
        assert_eq!(
            wire,
            "Action: QueueAdd\r\nQueue: sales\r\nInterface: SIP/200\r\nPenalty: 3\r\n\r\n"
        );
    }

    #[test]
    fn test_queue_add_zero_penalty_is_sent() {
        let wire = QueueAdd::new("sales", "SIP/200")
            .penalty(0)
            .to_request()
            .unwrap()
            .to_wire_format();
        assert!(wire.contains("Penalty: 0\r\n"));
    }

    #[test]
    fn test_queue_remove() {
        let wire = QueueRemove::new("sales", "SIP/200")
            .to_request()
            .unwrap()
            .to_wire_format();
        assert_eq!(
            wire,
            "Action: QueueRemove\r\nQueue: sales\r\nInterface: SIP/200\r\n\r\n"
        );
    }

    #[test]
    fn test_queues() {
        assert_eq!(
            Queues
                .to_request()
                .unwrap()
                .to_wire_format(),
            "Action: Queues\r\n\r\n"
        );
    }
}
