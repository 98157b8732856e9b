//! Protocol constants and configuration values

/// Default Asterisk Manager Interface port
pub const DEFAULT_AMI_PORT: u16 = 5038;

/// Socket buffer size for reading from the TCP stream (64KB)
pub const SOCKET_BUF_SIZE: usize = 65536;

/// Buffer chunk size for incremental parsing
pub const BUF_CHUNK: usize = 65536;

/// Maximum bytes the parse buffer may accumulate before the connection is
/// considered desynchronized
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Manager wire line terminator
pub const LINE_TERMINATOR: &str = "\r\n";

/// Marker terminating the raw body of a `Response: Follows` message
pub const END_COMMAND_MARKER: &str = "--END COMMAND--";

/// Primary header names
pub const HEADER_ACTION: &str = "Action";
pub const HEADER_RESPONSE: &str = "Response";
pub const HEADER_EVENT: &str = "Event";

/// Common secondary header names
pub const HEADER_ACTION_ID: &str = "ActionID";
pub const HEADER_MESSAGE: &str = "Message";
pub const HEADER_VALUE: &str = "Value";

/// `Response` values with special meaning
pub const RESPONSE_SUCCESS: &str = "Success";
pub const RESPONSE_ERROR: &str = "Error";
pub const RESPONSE_FOLLOWS: &str = "Follows";

/// `Message` header value Asterisk uses for a permission error
pub const PERMISSION_ERROR_TEXT: &str = "Permission denied";

/// `Message` header value Asterisk uses for an authentication error
pub const AUTHENTICATION_ERROR_TEXT: &str = "Authentication Required";

/// Connection timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 25000;

/// Event mask flags for the `Events` action, from manager.h in the
/// Asterisk source
pub mod event_flag {
    /// System events such as module load/unload
    pub const SYSTEM: u16 = 1 << 0;
    /// Call events, such as state change
    pub const CALL: u16 = 1 << 1;
    /// Log events
    pub const LOG: u16 = 1 << 2;
    /// Verbose messages
    pub const VERBOSE: u16 = 1 << 3;
    /// Ability to read/set commands
    pub const COMMAND: u16 = 1 << 4;
    /// Ability to read/set agent info
    pub const AGENT: u16 = 1 << 5;
    /// Ability to read/set user info
    pub const USER: u16 = 1 << 6;
    /// Ability to modify configurations
    pub const CONFIG: u16 = 1 << 7;
}
