//! Protocol constants and configuration values

/// Default Asterisk Manager Interface port
pub const DEFAULT_AMI_PORT: u16 = 5038;

/// Socket read chunk size (8KB). AMI replies are small text blocks; CLI
/// passthrough output is the largest and rarely exceeds a few hundred KB.
pub const SOCKET_BUF_SIZE: usize = 8 * 1024;

/// Maximum size of one response (16MB), whether held as lines or as
/// unsplit bytes. Exceeding it is a protocol error.
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Every request line and the blank request terminator end with CRLF
pub const LINE_TERMINATOR: &str = "\r\n";

/// TCP connect timeout in milliseconds
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3000;

/// Per-read idle timeout in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 3000;

/// Upper bound on a whole response, however slowly it trickles in
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 30_000;

/// Login replies carry `Message: Authentication accepted` or `... failed`
pub const MARKER_AUTHENTICATION: &str = "Message: Authentication";
/// Phrase that distinguishes an accepted login from a rejected one
pub const AUTHENTICATION_ACCEPTED: &str = "Authentication accepted";
/// Footer of `Action: Command` CLI output
pub const MARKER_END_COMMAND: &str = "--END COMMAND--";
/// Final event of `Action: ParkedCalls`
pub const MARKER_PARKED_CALLS_COMPLETE: &str = "ParkedCallsComplete";
/// `PeerlistComplete` carries the `ListItems` count as its last field
pub const MARKER_SIP_PEERS: &str = "ListItems";
/// `Action: IAXPeers` ends with the CLI-style `N iax2 peers` summary
pub const MARKER_IAX_PEERS: &str = " iax2 peers";
/// First line of every direct reply
pub const MARKER_RESPONSE: &str = "Response";

/// `Response: Goodbye` line answering `Action: Logoff`
pub const MARKER_GOODBYE: &str = "Goodbye";

/// Reply text from `Action: Ping`
pub const PING_PONG: &str = "Pong";
/// CLI passthrough reply for an unknown command
pub const NO_SUCH_COMMAND: &str = "No such command";
/// Monitor success marker
pub const MONITOR_SUCCESS: &str = "Success";
