//! Session management: transport ownership, login state and the action API

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::{
    actions::{
        challenge_key, AmiAction, AuthMode, Challenge, ChannelStatus, CliCommand, IaxPeers, Login,
        Logoff, Originate, ParkedCalls, Ping, QueueAdd, QueueRemove, Queues, SipPeers,
        StartMonitor, StopMonitor,
    },
    buffer::LineBuffer,
    constants::{
        AUTHENTICATION_ACCEPTED, DEFAULT_AMI_PORT, DEFAULT_CONNECT_TIMEOUT_MS,
        DEFAULT_READ_TIMEOUT_MS, DEFAULT_RESPONSE_TIMEOUT_MS, MONITOR_SUCCESS, NO_SUCH_COMMAND,
        PING_PONG,
    },
    error::{AmiError, AmiResult},
    fields::Field,
    protocol::{self, millis, ReadLimits, Termination},
    request::ActionRequest,
    response::AmiResponse,
};

/// Lifecycle state of an [`AmiClient`] session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionState {
    /// No transport open.
    Disconnected,
    /// TCP connected, not logged in.
    Connected,
    /// Logged in; the transport is open.
    Authenticated,
    /// [`AmiClient::close`] was called. Terminal.
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Connected => write!(f, "connected"),
            SessionState::Authenticated => write!(f, "authenticated"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// Connection options for an [`AmiClient`].
///
/// Deserializable so applications can embed it in their own config files;
/// every field except `host` has a default.
///
/// ```
/// use asterisk_ami_tokio::AmiConnectOptions;
/// use std::time::Duration;
///
/// let options = AmiConnectOptions::new("pbx.example.net")
///     .with_read_timeout(Duration::from_millis(500));
/// assert_eq!(options.port, 5038);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AmiConnectOptions {
    /// Manager host name or address. Required.
    pub host: String,
    /// Manager port. Default: 5038.
    pub port: u16,
    /// TCP connect timeout. Default: 3000.
    pub connect_timeout_ms: u64,
    /// How long a read may wait for more bytes. Idle-terminated replies
    /// end after this much silence. Default: 3000.
    pub read_timeout_ms: u64,
    /// Upper bound for a whole response. Default: 30000.
    pub response_timeout_ms: u64,
    /// Connect while constructing the client. Default: false.
    pub auto_connect: bool,
}

impl Default for AmiConnectOptions {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_AMI_PORT,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            auto_connect: false,
        }
    }
}

impl AmiConnectOptions {
    /// Defaults for `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = millis(timeout);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = millis(timeout);
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout_ms = millis(timeout);
        self
    }

    pub fn with_auto_connect(mut self, auto_connect: bool) -> Self {
        self.auto_connect = auto_connect;
        self
    }

    /// Reject options that cannot work.
    pub fn validate(&self) -> AmiResult<()> {
        if self
            .host
            .trim()
            .is_empty()
        {
            return Err(AmiError::invalid_config("host must be set"));
        }
        if self.port == 0 {
            return Err(AmiError::invalid_config("port must not be 0"));
        }
        if self.connect_timeout_ms == 0 || self.read_timeout_ms == 0 || self.response_timeout_ms == 0
        {
            return Err(AmiError::invalid_config("timeouts must be non-zero"));
        }
        Ok(())
    }

    fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    fn read_limits(&self) -> ReadLimits {
        ReadLimits::new(
            Duration::from_millis(self.read_timeout_ms),
            Duration::from_millis(self.response_timeout_ms),
        )
    }
}

/// Establish a TCP connection with a timeout.
async fn tcp_connect_with_timeout(options: &AmiConnectOptions) -> AmiResult<TcpStream> {
    let address = format!("{}:{}", options.host, options.port);
    let tcp_result = timeout(
        options.connect_timeout(),
        TcpStream::connect((options.host.as_str(), options.port)),
    )
    .await;

    match tcp_result {
        Ok(Ok(s)) => {
            debug!("[CONNECT] TCP connection established to {}", address);
            Ok(s)
        }
        Ok(Err(e)) => {
            warn!("[CONNECT] TCP connect to {} failed: {}", address, e);
            Err(AmiError::Connect { address, source: e })
        }
        Err(_) => {
            warn!(
                "[CONNECT] TCP connect to {} timed out after {}ms",
                address, options.connect_timeout_ms
            );
            Err(AmiError::Connect {
                address,
                source: std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("no answer within {}ms", options.connect_timeout_ms),
                ),
            })
        }
    }
}

/// Socket plus the bytes read from it but not yet consumed.
struct Transport {
    stream: TcpStream,
    buffer: LineBuffer,
}

impl Transport {
    async fn shutdown(mut self) {
        if let Err(e) = self
            .stream
            .shutdown()
            .await
        {
            debug!("Ignoring error while shutting down transport: {}", e);
        }
    }
}

struct Session {
    state: SessionState,
    transport: Option<Transport>,
}

impl Session {
    /// Write one request and read its reply on the open transport.
    ///
    /// Nothing is written once `limits.deadline` has passed. A reply that
    /// was given up on midway leaves unread bytes on the socket, so the
    /// transport is dropped and the session goes back to `Disconnected`.
    async fn exchange(
        &mut self,
        request: &ActionRequest,
        termination: &Termination,
        limits: ReadLimits,
    ) -> AmiResult<AmiResponse> {
        let transport = self
            .transport
            .as_mut()
            .ok_or(AmiError::NotConnected)?;
        if Instant::now() >= limits.deadline {
            debug!("Deadline passed before {:?} was sent", request.action());
            return Err(AmiError::ResponseTimeout {
                timeout_ms: 0,
                lines: 0,
            });
        }

        let result = protocol::exchange(
            &mut transport.stream,
            &mut transport.buffer,
            request,
            termination,
            limits,
        )
        .await;

        if let Err(e) = &result {
            if e.abandons_response() {
                warn!("Dropping connection after incomplete response: {}", e);
                self.state = SessionState::Disconnected;
                if let Some(transport) = self
                    .transport
                    .take()
                {
                    transport
                        .shutdown()
                        .await;
                }
            }
        }
        result
    }
}

/// Asterisk Manager Interface client (Clone + Send + Sync).
///
/// All clones share one session and one TCP connection. AMI has no
/// pipelining, so the session lock is held for a whole write-and-read cycle:
/// concurrent callers are served one action at a time.
///
/// ```rust,no_run
/// use asterisk_ami_tokio::{AmiClient, AmiConnectOptions, AuthMode, AmiError};
///
/// # async fn example() -> Result<(), AmiError> {
/// let client = AmiClient::new(AmiConnectOptions::new("127.0.0.1").with_auto_connect(true)).await?;
/// client.login("admin", "secret", AuthMode::Md5, true).await?;
/// assert!(client.ping().await?);
/// client.logout().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AmiClient {
    options: Arc<AmiConnectOptions>,
    session: Arc<Mutex<Session>>,
}

impl std::fmt::Debug for AmiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self
            .session
            .try_lock()
            .map(|s| s.state.to_string())
            .unwrap_or_else(|_| "busy".to_string());
        f.debug_struct("AmiClient")
            .field("host", &self.options.host)
            .field("port", &self.options.port)
            .field("state", &state)
            .finish()
    }
}

impl AmiClient {
    /// Create a client, connecting right away if `options.auto_connect` is set.
    pub async fn new(options: AmiConnectOptions) -> AmiResult<Self> {
        options.validate()?;
        let auto_connect = options.auto_connect;
        let client = Self {
            options: Arc::new(options),
            session: Arc::new(Mutex::new(Session {
                state: SessionState::Disconnected,
                transport: None,
            })),
        };
        if auto_connect {
            client
                .connect()
                .await?;
        }
        Ok(client)
    }

    /// Options this client was created with.
    pub fn options(&self) -> &AmiConnectOptions {
        &self.options
    }

    /// Current session state snapshot.
    pub async fn state(&self) -> SessionState {
        self.session
            .lock()
            .await
            .state
    }

    /// Whether the last login succeeded on the current connection.
    pub async fn is_authenticated(&self) -> bool {
        self.state().await == SessionState::Authenticated
    }

    /// Open the TCP connection. An open connection is closed first, which
    /// also drops any login.
    pub async fn connect(&self) -> AmiResult<()> {
        let mut session = self
            .session
            .lock()
            .await;
        if session.state == SessionState::Closed {
            return Err(AmiError::SessionClosed);
        }
        if let Some(old) = session
            .transport
            .take()
        {
            debug!("Closing existing transport before reconnecting");
            session.state = SessionState::Disconnected;
            old.shutdown()
                .await;
        }

        info!(
            "Connecting to Asterisk manager at {}:{}",
            self.options.host, self.options.port
        );
        let stream = tcp_connect_with_timeout(&self.options).await?;
        session.transport = Some(Transport {
            stream,
            buffer: LineBuffer::new(),
        });
        session.state = SessionState::Connected;
        Ok(())
    }

    /// Log in on the open connection.
    ///
    /// With [`AuthMode::Md5`] a challenge is requested first and only the
    /// digest of `challenge ‖ secret` is sent. `suppress_events` adds
    /// `Events: off` so unsolicited events stay off this socket.
    ///
    /// A rejected login leaves the session connected, so it may be retried.
    /// A timeout drops the connection like any other incomplete reply.
    pub async fn login(
        &self,
        username: &str,
        secret: &str,
        mode: AuthMode,
        suppress_events: bool,
    ) -> AmiResult<()> {
        let mut session = self
            .session
            .lock()
            .await;
        if session
            .transport
            .is_none()
        {
            return Err(AmiError::NotConnected);
        }

        let login = match mode {
            AuthMode::Plain => Login::plain(username, secret),
            AuthMode::Md5 => {
                debug!("[AUTH] Requesting MD5 challenge");
                let challenge = session
                    .exchange(
                        &Challenge.to_request()?,
                        &Challenge.termination(),
                        self.options.read_limits(),
                    )
                    .await?;
                if !challenge.is_success() {
                    warn!("[AUTH] Challenge request rejected");
                    return Err(AmiError::auth_failed(
                        challenge
                            .message()
                            .unwrap_or("challenge rejected"),
                    ));
                }
                let nonce = challenge
                    .header(Field::Challenge)
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| AmiError::auth_failed("no challenge in reply"))?;
                Login::md5(username, challenge_key(nonce, secret))
            }
        }
        .suppress_events(suppress_events);

        debug!("[AUTH] Sending login for {} [REDACTED]", username);
        let response = session
            .exchange(
                &login.to_request()?,
                &login.termination(),
                self.options.read_limits(),
            )
            .await?;

        if !response.contains(AUTHENTICATION_ACCEPTED) {
            warn!("[AUTH] Login rejected for {}", username);
            return Err(AmiError::auth_failed(
                response
                    .message()
                    .unwrap_or("Authentication failed"),
            ));
        }

        session.state = SessionState::Authenticated;
        info!("Authenticated to Asterisk manager as {}", username);
        Ok(())
    }

    /// Send `Action: Logoff` and close the connection.
    ///
    /// Logoff is a one-way notification; the reply is not read. The client
    /// can `connect()` again afterwards.
    pub async fn logout(&self) -> AmiResult<()> {
        let mut session = self
            .session
            .lock()
            .await;
        let transport = session
            .transport
            .as_mut()
            .ok_or(AmiError::NotConnected)?;
        protocol::write_request(&mut transport.stream, &Logoff.to_request()?).await?;

        if let Some(transport) = session
            .transport
            .take()
        {
            transport
                .shutdown()
                .await;
        }
        session.state = SessionState::Disconnected;
        info!("Logged off from Asterisk manager");
        Ok(())
    }

    /// Close the connection without logging off. Idempotent; the client
    /// cannot be reconnected afterwards.
    pub async fn close(&self) -> AmiResult<()> {
        let mut session = self
            .session
            .lock()
            .await;
        if let Some(transport) = session
            .transport
            .take()
        {
            info!("Client requested close");
            transport
                .shutdown()
                .await;
        }
        session.state = SessionState::Closed;
        Ok(())
    }

    /// Send a request and read its reply with the given termination policy.
    ///
    /// This is the primitive every helper uses. The configured read and
    /// response timeouts bound the call; they start once the session is free,
    /// not while waiting behind other callers.
    ///
    /// After a timeout or an oversized reply the connection is dropped and
    /// must be reopened with [`connect`](Self::connect).
    pub async fn send(
        &self,
        request: &ActionRequest,
        termination: &Termination,
    ) -> AmiResult<AmiResponse> {
        self.send_with_limits(request, termination, None)
            .await
    }

    /// Like [`send`](Self::send), but also gives up at `deadline`.
    ///
    /// Prefer this to wrapping `send` in `tokio::time::timeout`: dropping an
    /// in-flight call can leave part of its reply on the socket, where the
    /// next action would read it. If `deadline` passes while waiting for the
    /// session, nothing is sent.
    pub async fn send_with_deadline(
        &self,
        request: &ActionRequest,
        termination: &Termination,
        deadline: Instant,
    ) -> AmiResult<AmiResponse> {
        self.send_with_limits(request, termination, Some(deadline))
            .await
    }

    async fn send_with_limits(
        &self,
        request: &ActionRequest,
        termination: &Termination,
        deadline: Option<Instant>,
    ) -> AmiResult<AmiResponse> {
        let mut session = self
            .session
            .lock()
            .await;
        let mut limits = self
            .options
            .read_limits();
        if let Some(deadline) = deadline {
            limits = limits.with_deadline(deadline);
        }
        session
            .exchange(request, termination, limits)
            .await
    }

    /// Send a typed action with its own termination policy.
    pub async fn execute<A: AmiAction + ?Sized>(&self, action: &A) -> AmiResult<AmiResponse> {
        let request = action.to_request()?;
        self.send(&request, &action.termination())
            .await
    }

    /// Originate a call. The reply is returned unchecked.
    pub async fn originate(&self, originate: &Originate) -> AmiResult<AmiResponse> {
        self.execute(originate)
            .await
    }

    /// Add `interface` to `queue`. `Penalty` is only sent when given.
    pub async fn queue_add(
        &self,
        queue: &str,
        interface: &str,
        penalty: Option<u32>,
    ) -> AmiResult<AmiResponse> {
        let action = QueueAdd {
            queue: queue.to_string(),
            interface: interface.to_string(),
            penalty,
        };
        self.execute(&action)
            .await
    }

    /// Remove `interface` from `queue`.
    pub async fn queue_remove(&self, queue: &str, interface: &str) -> AmiResult<AmiResponse> {
        self.execute(&QueueRemove::new(queue, interface))
            .await
    }

    /// Summary of all queues and members.
    pub async fn queues(&self) -> AmiResult<AmiResponse> {
        self.execute(&Queues)
            .await
    }

    /// Start recording `channel`. Fails with
    /// [`MonitorFailed`](AmiError::MonitorFailed) unless the reply reports success.
    pub async fn start_monitor(
        &self,
        channel: &str,
        file: &str,
        format: &str,
        mix: bool,
    ) -> AmiResult<AmiResponse> {
        let response = self
            .execute(&StartMonitor::new(channel, file, format).mix(mix))
            .await?;
        if !response.contains(MONITOR_SUCCESS) {
            warn!("Monitor of {} rejected: {:?}", channel, response.message());
            return Err(AmiError::MonitorFailed {
                channel: channel.to_string(),
            });
        }
        Ok(response)
    }

    /// Stop recording `channel`.
    pub async fn stop_monitor(&self, channel: &str) -> AmiResult<AmiResponse> {
        self.execute(&StopMonitor::new(channel))
            .await
    }

    /// Status of one channel, or of all channels with `None`.
    pub async fn channel_status(&self, channel: Option<&str>) -> AmiResult<AmiResponse> {
        let action = ChannelStatus {
            channel: channel.map(|c| c.to_string()),
        };
        self.execute(&action)
            .await
    }

    /// SIP peer listing.
    pub async fn sip_peers(&self) -> AmiResult<AmiResponse> {
        self.execute(&SipPeers)
            .await
    }

    /// IAX peer listing.
    pub async fn iax_peers(&self) -> AmiResult<AmiResponse> {
        self.execute(&IaxPeers)
            .await
    }

    /// Parked calls, including the closing `ParkedCallsComplete` event.
    pub async fn parked_calls(&self) -> AmiResult<AmiResponse> {
        self.execute(&ParkedCalls)
            .await
    }

    /// Run an Asterisk CLI command and return its output.
    pub async fn command(&self, command: &str) -> AmiResult<AmiResponse> {
        let response = self
            .execute(&CliCommand::new(command))
            .await?;
        if response.contains(NO_SUCH_COMMAND) {
            return Err(AmiError::UnknownCommand {
                command: command.to_string(),
            });
        }
        Ok(response)
    }

    /// `true` if the server answered the ping with `Pong`.
    pub async fn ping(&self) -> AmiResult<bool> {
        let response = self
            .execute(&Ping)
            .await?;
        Ok(response.contains(PING_PONG))
    }
}
