//! Typed AMI field and action names.

/// Error returned when parsing an unrecognized field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFieldError(pub String);

impl std::fmt::Display for ParseFieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown AMI field: {}", self.0)
    }
}

impl std::error::Error for ParseFieldError {}

/// Error returned when parsing an unrecognized action name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseActionNameError(pub String);

impl std::fmt::Display for ParseActionNameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown AMI action: {}", self.0)
    }
}

impl std::error::Error for ParseActionNameError {}

define_wire_enum! {
    error_type: ParseFieldError,
    /// Field names used by the built-in actions, in requests and replies.
    ///
    /// [`ActionRequest::field`](crate::ActionRequest::field) and
    /// [`AmiResponse::header`](crate::AmiResponse::header) accept these or
    /// any `&str`, so fields missing here can still be used.
    pub enum Field {
        Action => "Action",
        ActionId => "ActionID",
        AuthType => "AuthType",
        Username => "Username",
        Secret => "Secret",
        Key => "Key",
        Events => "Events",
        Challenge => "Challenge",
        Response => "Response",
        Message => "Message",
        Channel => "Channel",
        Context => "Context",
        Exten => "Exten",
        Priority => "Priority",
        CallerId => "Callerid",
        Timeout => "Timeout",
        Variable => "Variable",
        Queue => "Queue",
        Interface => "Interface",
        Penalty => "Penalty",
        File => "File",
        Format => "Format",
        Mix => "Mix",
        Command => "Command",
        Parameters => "Parameters",
        ListItems => "ListItems",
    }
}

define_wire_enum! {
    error_type: ParseActionNameError,
    /// Values of the `Action:` field for the built-in catalogue.
    pub enum ActionName {
        Login => "Login",
        Logoff => "Logoff",
        Challenge => "Challenge",
        Ping => "Ping",
        Command => "Command",
        Originate => "Originate",
        Queues => "Queues",
        QueueAdd => "QueueAdd",
        QueueRemove => "QueueRemove",
        Monitor => "Monitor",
        StopMonitor => "StopMonitor",
        Status => "Status",
        SipPeers => "Sippeers",
        IaxPeers => "IAXPeers",
        ParkedCalls => "ParkedCalls",
    }
}

impl Field {
    /// Fields whose values must never reach logs.
    pub fn is_sensitive(name: &str) -> bool {
        name.eq_ignore_ascii_case(Field::Secret.as_str())
            || name.eq_ignore_ascii_case(Field::Key.as_str())
    }
}
