//! Manager wire parsing.
//!
//! The manager protocol is a stream of messages, each a non-empty sequence
//! of CRLF-terminated `Name: Value` header lines closed by one empty line.
//! The first header of a message identifies its kind: `Event` or
//! `Response` (the client only ever writes `Action` messages).
//!
//! One special encoding exists: when a response's value is `Follows`, the
//! message carries the raw output of a CLI command. Lines are scanned for
//! the `--END COMMAND--` marker; the text preceding the marker on that
//! line is the raw body, stored in the message's
//! [`data`](crate::Message::data) slot (the output's own line breaks are
//! bare LF, so body and marker arrive as one CRLF-terminated line). Every
//! other line of a `Follows` response is still a header line.

use crate::buffer::AmiBuffer;
use crate::constants::*;
use crate::error::{AmiError, AmiResult};
use crate::message::Message;

/// Parse a colon-separated header line into a `(name, value)` pair.
///
/// The name is everything before the first `:`; at most one leading space
/// of the value is consumed.
pub fn parse_header(line: &str) -> AmiResult<(String, String)> {
    if line.is_empty() {
        return Err(AmiError::EmptyHeader);
    }

    let colon = line
        .find(':')
        .ok_or_else(|| AmiError::parse(format!("missing ':' in header: {line}")))?;

    let name = line[..colon].to_string();
    let mut value = &line[colon + 1..];
    if let Some(stripped) = value.strip_prefix(' ') {
        value = stripped;
    }

    Ok((name, value.to_string()))
}

/// Split a greeting line `<server-name>/<version>` at the last `/`.
///
/// A greeting with no `/` yields the whole line as the name and an empty
/// version, matching how Asterisk-compatible servers identify themselves.
pub fn parse_greeting(line: &str) -> (String, String) {
    match line.rfind('/') {
        Some(i) => (line[..i].to_string(), line[i + 1..].to_string()),
        None => (line.to_string(), String::new()),
    }
}

/// Parser state carried across reads for a partially received message
enum ParseState {
    /// Waiting for the first header of the next message
    Idle,
    /// Collecting headers (and raw body, in `Follows` mode) of a message
    Collecting { message: Message, follows: bool },
}

/// Incremental manager wire parser.
///
/// Socket bytes go in through [`extend`](AmiParser::extend); whole
/// messages come out of [`parse_message`](AmiParser::parse_message) as
/// they complete. Partial lines and partial messages are held until more
/// data arrives.
pub struct AmiParser {
    buffer: AmiBuffer,
    state: ParseState,
}

impl AmiParser {
    pub fn new() -> Self {
        Self {
            buffer: AmiBuffer::new(),
            state: ParseState::Idle,
        }
    }

    /// Append bytes read from the socket
    pub fn extend(&mut self, data: &[u8]) -> AmiResult<()> {
        self.buffer.extend_from_slice(data);
        self.buffer.check_size_limits()
    }

    /// Unparsed bytes currently buffered
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Extract the next complete CRLF-terminated line, stripped of its
    /// terminator. Used directly for the one-line server greeting.
    pub fn take_line(&mut self) -> AmiResult<Option<String>> {
        match self.buffer.extract_until_pattern(LINE_TERMINATOR.as_bytes()) {
            Some(bytes) => {
                let line = String::from_utf8(bytes)
                    .map_err(|_| AmiError::parse("invalid UTF-8 on the wire"))?;
                Ok(Some(line))
            }
            None => Ok(None),
        }
    }

    /// Try to complete one message from the buffered data.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Parse failures leave
    /// the parser idle so that a caller choosing to continue resynchronizes
    /// at the next message boundary.
    pub fn parse_message(&mut self) -> AmiResult<Option<Message>> {
        loop {
            let Some(line) = self.take_line()? else {
                return Ok(None);
            };

            match std::mem::replace(&mut self.state, ParseState::Idle) {
                ParseState::Idle => {
                    let (name, value) = parse_header(&line)?;
                    let (message, follows) = match name.as_str() {
                        HEADER_EVENT => (Message::event(value), false),
                        HEADER_RESPONSE => {
                            let follows = value == RESPONSE_FOLLOWS;
                            (Message::response(value), follows)
                        }
                        _ => return Err(AmiError::UnknownMessage(name)),
                    };
                    self.state = ParseState::Collecting { message, follows };
                }
                ParseState::Collecting {
                    mut message,
                    follows,
                } => {
                    // the blank line closes the message
                    if line.is_empty() {
                        self.buffer.compact();
                        return Ok(Some(message));
                    }

                    if follows {
                        // strip the marker if found, otherwise this is a
                        // normal header
                        if let Some(pos) = line.find(END_COMMAND_MARKER) {
                            message.data = Some(line[..pos].to_string());
                        } else {
                            let (name, value) = parse_header(&line)?;
                            message.insert(name, value);
                        }
                    } else {
                        let (name, value) = parse_header(&line)?;
                        message.insert(name, value);
                    }
                    self.state = ParseState::Collecting { message, follows };
                }
            }
        }
    }
}

impl Default for AmiParser {
    fn default() -> Self {
        Self::new()
    }
}
