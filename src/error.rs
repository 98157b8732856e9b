//! Error types for AMI and AGI operations.
//!
//! The two protocol engines carry separate error enums: [`AmiError`] for the
//! manager connection and message model, [`AgiError`] for the stdio gateway.
//! Both derive [`thiserror::Error`] and convert from `std::io::Error`.
//!
//! The library never terminates or retries on its own; every failure
//! surfaces as an `Err` value for the application to act on.

use crate::message::Message;
use thiserror::Error;

/// Result type alias for manager operations
pub type AmiResult<T> = Result<T, AmiError>;

/// Result type alias for gateway operations
pub type AgiResult<T> = Result<T, AgiError>;

/// Refinement of an `Error` response raised by an action's response handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionErrorKind {
    /// Asterisk reported required data was missing
    MissingData,
    /// Asterisk reported the given data was bad
    BadData,
    /// Asterisk reported that the specified channel was not found
    ChannelNotFound,
}

/// Errors raised by the manager connection and the message model
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AmiError {
    /// IO error from underlying TCP operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection is not established or lost
    #[error("Not connected to Asterisk")]
    NotConnected,

    /// Connection closed by remote
    #[error("Connection closed by Asterisk")]
    ConnectionClosed,

    /// Timeout establishing the connection
    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Malformed header line (missing `:`), or other wire-level garbage
    #[error("parse error: {0}")]
    Parse(String),

    /// An empty line was parsed where a header was required
    #[error("empty header received")]
    EmptyHeader,

    /// The first header of a message was neither `Event` nor `Response`
    #[error("unknown message type: {0}")]
    UnknownMessage(String),

    /// A required header (the primary header) was missing from a message
    #[error("missing {0} header")]
    HeaderMissing(String),

    /// Buffer overflow, the peer stopped framing messages
    #[error("buffer overflow: {size} bytes accumulated (limit {limit})")]
    BufferOverflow { size: usize, limit: usize },

    /// Asterisk denied the action for lack of permission
    #[error("Permission denied")]
    PermissionDenied,

    /// Asterisk requires authentication before this action
    #[error("Authentication Required")]
    AuthenticationRequired,

    /// An `Error` response with a recognized `Message` text
    #[error("{message}")]
    Action {
        kind: ActionErrorKind,
        message: String,
        /// The action message that triggered the error
        action: Box<Message>,
    },

    /// The `Login` action did not return `Success`
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// The `QueuePause` action did not return `Success`
    #[error("queue pause failed: {0}")]
    QueuePauseFailed(String),
}

impl AmiError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// `true` if the TCP session is dead and the caller should reconnect.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            AmiError::Io(_)
                | AmiError::NotConnected
                | AmiError::ConnectionClosed
                | AmiError::Timeout { .. }
        )
    }
}

/// Errors raised by the stdio gateway engine
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AgiError {
    /// Error reading from or writing to the gateway streams
    #[error("IO error communicating with Asterisk: {0}")]
    Io(#[from] std::io::Error),

    /// A reply line could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// SIGHUP was received, the controlling channel hung up
    #[error("received SIGHUP from Asterisk, indicating a hangup")]
    HangupBySignal,

    /// `hangup` was received as the data of a command result
    #[error("received \"hangup\" as the result of an AGI command")]
    HangupByResult,

    /// A command returned -1, the application failed or the channel hung up
    #[error("error executing AGI command: {0}")]
    ApplicationError(String),

    /// The server replied 510, the command is invalid or unknown
    #[error("invalid or unknown command: {0}")]
    InvalidCommand(String),

    /// The server replied 520 with a usage block
    #[error("usage error: {0}")]
    UsageError(String),

    /// The server replied with a code this library does not understand
    #[error("unknown error {code}: {message}")]
    UnknownError { code: u16, message: String },

    /// The current command timed out
    #[error("operation timed out")]
    Timeout,

    /// An Asterisk database operation failed
    #[error("database operation failed: {0}")]
    DatabaseError(String),

    /// The requested channel could not be found
    #[error("channel '{0}' was not found")]
    NoChannel(String),

    /// Installing the hangup/pipe signal watchers failed
    #[error("error installing signal handlers: {0}")]
    SignalSetup(String),
}

impl AgiError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_detection() {
        let io_error = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(AmiError::from(io_error).is_connection_error());
        assert!(AmiError::NotConnected.is_connection_error());
        assert!(AmiError::ConnectionClosed.is_connection_error());
        assert!(!AmiError::EmptyHeader.is_connection_error());
        assert!(!AmiError::PermissionDenied.is_connection_error());
    }

    #[test]
    fn error_display() {
        assert_eq!(
            AmiError::HeaderMissing("Action".into()).to_string(),
            "missing Action header"
        );
        assert_eq!(
            AmiError::UnknownMessage("Bogus".into()).to_string(),
            "unknown message type: Bogus"
        );
        assert_eq!(
            AgiError::UnknownError {
                code: 404,
                message: "gone".into()
            }
            .to_string(),
            "unknown error 404: gone"
        );
        assert_eq!(
            AgiError::NoChannel("SIP/100-abc".into()).to_string(),
            "channel 'SIP/100-abc' was not found"
        );
    }
}
