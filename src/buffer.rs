//! Buffer management for incremental wire parsing

use crate::constants::*;
use crate::error::{AmiError, AmiResult};
use bytes::BytesMut;

/// Byte buffer with a consume cursor, feeding the manager wire parser.
///
/// Bytes read off the socket are appended at the back; the parser extracts
/// complete lines from the front. [`compact`](AmiBuffer::compact) reclaims
/// consumed space once a whole message has been parsed.
pub struct AmiBuffer {
    buffer: BytesMut,
    position: usize,
}

impl AmiBuffer {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(BUF_CHUNK),
            position: 0,
        }
    }

    /// Unconsumed bytes remaining in the buffer
    pub fn len(&self) -> usize {
        self.buffer.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append bytes read from the socket
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Reference to the unconsumed bytes
    pub fn data(&self) -> &[u8] {
        &self.buffer[self.position..]
    }

    /// Find `pattern` in the unconsumed bytes
    pub fn find_pattern(&self, pattern: &[u8]) -> Option<usize> {
        let data = self.data();
        if pattern.is_empty() || data.len() < pattern.len() {
            return None;
        }
        (0..=(data.len() - pattern.len())).find(|&i| &data[i..i + pattern.len()] == pattern)
    }

    /// Extract bytes up to (but not including) `pattern`, consuming the
    /// pattern as well. Returns `None` when the pattern is not present.
    pub fn extract_until_pattern(&mut self, pattern: &[u8]) -> Option<Vec<u8>> {
        let pos = self.find_pattern(pattern)?;
        let result = self.data()[..pos].to_vec();
        self.position += pos + pattern.len();
        Some(result)
    }

    /// Reclaim consumed space by moving the remaining bytes to the front
    pub fn compact(&mut self) {
        if self.position > 0 {
            let remaining = self.len();
            if remaining > 0 {
                self.buffer.copy_within(self.position.., 0);
            }
            self.buffer.truncate(remaining);
            self.position = 0;
        }
    }

    /// Fail if the buffer has grown past the point where the peer can
    /// plausibly still be framing messages
    pub fn check_size_limits(&self) -> AmiResult<()> {
        if self.buffer.len() > MAX_BUFFER_SIZE {
            tracing::error!(
                "buffer overflow: {} bytes accumulated (limit {}), protocol desync",
                self.buffer.len(),
                MAX_BUFFER_SIZE
            );
            return Err(AmiError::BufferOverflow {
                size: self.buffer.len(),
                limit: MAX_BUFFER_SIZE,
            });
        }
        Ok(())
    }
}

impl Default for AmiBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_operations() {
        let mut buffer = AmiBuffer::new();
        assert!(buffer.is_empty());

        buffer.extend_from_slice(b"Hello World");
        assert_eq!(buffer.len(), 11);
        assert_eq!(buffer.data(), b"Hello World");
    }

    #[test]
    fn find_pattern() {
        let mut buffer = AmiBuffer::new();
        buffer.extend_from_slice(b"Event: Hangup\r\nCause: 16\r\n\r\n");
        assert_eq!(buffer.find_pattern(b"\r\n"), Some(13));
        assert_eq!(buffer.find_pattern(b"\r\n\r\n"), Some(24));
        assert_eq!(buffer.find_pattern(b"missing"), None);
    }

    #[test]
    fn extract_until_pattern_consumes_pattern() {
        let mut buffer = AmiBuffer::new();
        buffer.extend_from_slice(b"Event: Hangup\r\nCause: 16\r\n");

        let line = buffer.extract_until_pattern(b"\r\n").unwrap();
        assert_eq!(line, b"Event: Hangup");
        assert_eq!(buffer.data(), b"Cause: 16\r\n");

        let line = buffer.extract_until_pattern(b"\r\n").unwrap();
        assert_eq!(line, b"Cause: 16");
        assert!(buffer.is_empty());
        assert!(buffer.extract_until_pattern(b"\r\n").is_none());
    }

    #[test]
    fn partial_line_is_not_extracted() {
        let mut buffer = AmiBuffer::new();
        buffer.extend_from_slice(b"Event: Hang");
        assert!(buffer.extract_until_pattern(b"\r\n").is_none());
        buffer.extend_from_slice(b"up\r\n");
        let line = buffer.extract_until_pattern(b"\r\n").unwrap();
        assert_eq!(line, b"Event: Hangup");
    }

    #[test]
    fn compact_preserves_unconsumed_data() {
        let mut buffer = AmiBuffer::new();
        buffer.extend_from_slice(b"first\r\nsecond");
        buffer.extract_until_pattern(b"\r\n").unwrap();
        buffer.compact();
        assert_eq!(buffer.data(), b"second");
    }
}
