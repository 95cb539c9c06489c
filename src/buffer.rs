//! Receive buffer that hands out complete lines

use crate::{
    constants::MAX_BUFFER_SIZE,
    error::{AmiError, AmiResult},
};

/// Bytes read from the socket but not yet consumed as lines.
///
/// Lives as long as the transport: bytes that arrive after a response's
/// terminating line stay here for the next action.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    data: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Append freshly read bytes. Fails, discarding the buffer, once more
    /// than [`MAX_BUFFER_SIZE`] bytes are waiting to be split into lines.
    pub(crate) fn extend_from_slice(&mut self, bytes: &[u8]) -> AmiResult<()> {
        self.data
            .extend_from_slice(bytes);
        if self.data.len() > MAX_BUFFER_SIZE {
            self.clear();
            return Err(AmiError::protocol_error(format!(
                "unread data exceeded {} bytes",
                MAX_BUFFER_SIZE
            )));
        }
        Ok(())
    }

    /// Take the next `\n`-terminated line, without its CR/LF.
    pub(crate) fn next_line(&mut self) -> Option<String> {
        let pos = self
            .data
            .iter()
            .position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self
            .data
            .drain(..=pos)
            .collect();
        Some(decode_line(&raw))
    }

    /// Take a trailing line that never got its terminator.
    pub(crate) fn take_partial(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.data);
        Some(decode_line(&raw))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.data
            .is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.data
            .clear();
    }
}

fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    while end > 0 && (raw[end - 1] == b'\n' || raw[end - 1] == b'\r') {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
