//! AMI framing: request write path and the line-oriented read loop
//!
//! AMI has no length prefix. Each action is read until one of:
//!
//! - a line containing an action-specific marker ([`Termination::Marker`]),
//! - the socket staying quiet for the idle timeout ([`Termination::Idle`]),
//! - EOF, accepted only once at least one line has arrived.
//!
//! The overall response deadline bounds every read regardless of policy.

use crate::{
    buffer::LineBuffer,
    constants::{LINE_TERMINATOR, MAX_BUFFER_SIZE, SOCKET_BUF_SIZE},
    error::{AmiError, AmiResult},
    request::ActionRequest,
    response::AmiResponse,
};
use std::borrow::Cow;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout, Instant};
use tracing::{debug, trace, warn};

/// Whether the line carrying the marker belongs to the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerLine {
    /// Keep the marker line (e.g. a `Response: Pong` line is the answer itself).
    Include,
    /// Drop the marker line (e.g. the `--END COMMAND--` footer).
    Exclude,
}

/// Rule deciding when a response is complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Stop at the first line containing `marker`.
    ///
    /// Running out of idle time before the marker shows up is a
    /// [`AmiError::ResponseTimeout`].
    Marker {
        /// Substring searched for in each line
        marker: Cow<'static, str>,
        /// Whether that line is returned
        line: MarkerLine,
    },
    /// Stop once the socket has been quiet for the idle timeout.
    ///
    /// Quiet after some data is success; quiet with nothing received is
    /// [`AmiError::NoResponse`].
    Idle,
}

impl Termination {
    /// Marker policy keeping the marker line.
    pub fn marker_included(marker: impl Into<Cow<'static, str>>) -> Self {
        Termination::Marker {
            marker: marker.into(),
            line: MarkerLine::Include,
        }
    }

    /// Marker policy dropping the marker line.
    pub fn marker_excluded(marker: impl Into<Cow<'static, str>>) -> Self {
        Termination::Marker {
            marker: marker.into(),
            line: MarkerLine::Exclude,
        }
    }
}

/// Time limits for one exchange.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ReadLimits {
    /// Longest wait for the next chunk of bytes
    pub idle: Duration,
    /// Point after which the response is abandoned
    pub deadline: Instant,
}

impl ReadLimits {
    pub(crate) fn new(idle: Duration, total: Duration) -> Self {
        let now = Instant::now();
        Self {
            idle,
            deadline: now
                .checked_add(total)
                .unwrap_or_else(|| now + FAR_FUTURE),
        }
    }

    /// Tighten the deadline to an external one.
    pub(crate) fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = self
            .deadline
            .min(deadline);
        self
    }
}

/// Lines accumulated so far for one response.
struct Accumulator<'a> {
    termination: &'a Termination,
    lines: Vec<String>,
    /// Bytes taken so far, counting a CRLF per line
    size: usize,
}

impl Accumulator<'_> {
    /// Add a line; `true` once the termination marker has been seen.
    fn push(&mut self, line: String) -> AmiResult<bool> {
        trace!("[RECV] {}", line);
        self.size += line.len() + LINE_TERMINATOR.len();
        if self.size > MAX_BUFFER_SIZE {
            warn!(
                "Response exceeded {} bytes after {} lines",
                MAX_BUFFER_SIZE,
                self.lines.len()
            );
            return Err(AmiError::protocol_error(format!(
                "response exceeded {} bytes",
                MAX_BUFFER_SIZE
            )));
        }
        if let Termination::Marker { marker, line: keep } = self.termination {
            if line.contains(marker.as_ref()) {
                if *keep == MarkerLine::Include {
                    self.lines
                        .push(line);
                }
                return Ok(true);
            }
        }
        self.lines
            .push(line);
        Ok(false)
    }

    fn finish(self) -> AmiResponse {
        debug!("Received response: {} lines", self.lines.len());
        AmiResponse::from_lines(self.lines)
    }
}

/// Stand-in deadline for response timeouts too large to represent.
pub(crate) const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

pub(crate) fn millis(d: Duration) -> u64 {
    d.as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

/// Write one request and flush it.
pub(crate) async fn write_request<W>(writer: &mut W, request: &ActionRequest) -> AmiResult<()>
where
    W: AsyncWrite + Unpin,
{
    debug!("Sending action: {:?}", request);
    let wire = request.to_wire_format();
    writer
        .write_all(wire.as_bytes())
        .await
        .map_err(AmiError::TransportWrite)?;
    writer
        .flush()
        .await
        .map_err(AmiError::TransportWrite)?;
    Ok(())
}

/// Read one response according to `termination`.
///
/// Bytes already in `buffer` are consumed first. Anything read past the
/// terminating line stays in `buffer`.
pub(crate) async fn read_response<R>(
    reader: &mut R,
    buffer: &mut LineBuffer,
    termination: &Termination,
    limits: ReadLimits,
) -> AmiResult<AmiResponse>
where
    R: AsyncRead + Unpin,
{
    let started = Instant::now();
    let mut acc = Accumulator {
        termination,
        lines: Vec::new(),
        size: 0,
    };
    let mut read_buffer = [0u8; SOCKET_BUF_SIZE];

    loop {
        while let Some(line) = buffer.next_line() {
            if acc.push(line)? {
                if !buffer.is_empty() {
                    trace!("Bytes after the terminating line kept for the next action");
                }
                return Ok(acc.finish());
            }
        }

        let now = Instant::now();
        if now >= limits.deadline {
            warn!(
                "Response deadline reached after {}ms",
                started
                    .elapsed()
                    .as_millis()
            );
            return Err(AmiError::ResponseTimeout {
                timeout_ms: millis(started.elapsed()),
                lines: acc.lines.len(),
            });
        }
        let wait = limits
            .idle
            .min(limits.deadline - now);

        match timeout(wait, reader.read(&mut read_buffer)).await {
            Ok(Ok(0)) => {
                debug!("Connection closed (EOF) while reading response");
                if let Some(partial) = buffer.take_partial() {
                    if acc.push(partial)? {
                        return Ok(acc.finish());
                    }
                }
                if acc.lines.is_empty() {
                    return Err(AmiError::TransportRead(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed before any response",
                    )));
                }
                return Ok(acc.finish());
            }
            Ok(Ok(n)) => {
                trace!("[RECV] Read {} bytes from socket", n);
                buffer.extend_from_slice(&read_buffer[..n])?;
            }
            Ok(Err(e)) => {
                warn!("Read error: {}", e);
                return Err(AmiError::TransportRead(e));
            }
            Err(_) if wait < limits.idle => {
                // Deadline expired before the idle window did.
                continue;
            }
            Err(_) => {
                if let Some(partial) = buffer.take_partial() {
                    if acc.push(partial)? {
                        return Ok(acc.finish());
                    }
                }
                return match termination {
                    Termination::Idle if acc.lines.is_empty() => {
                        Err(AmiError::NoResponse {
                            timeout_ms: millis(limits.idle),
                        })
                    }
                    Termination::Idle => Ok(acc.finish()),
                    Termination::Marker { marker, .. } => {
                        warn!(
                            "No '{}' within {}ms idle timeout ({} lines received)",
                            marker,
                            millis(limits.idle),
                            acc.lines.len()
                        );
                        Err(AmiError::ResponseTimeout {
                            timeout_ms: millis(limits.idle),
                            lines: acc.lines.len(),
                        })
                    }
                };
            }
        }
    }
}

/// Write `request`, then read its response: the single primitive every
/// action goes through.
pub(crate) async fn exchange<S>(
    stream: &mut S,
    buffer: &mut LineBuffer,
    request: &ActionRequest,
    termination: &Termination,
    limits: ReadLimits,
) -> AmiResult<AmiResponse>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    write_request(stream, request).await?;
    read_response(stream, buffer, termination, limits).await
}
