//! Session-level manager actions: authentication, liveness, introspection
//! and event control.

use super::{check_error_response, ManagerAction};
use crate::constants::*;
use crate::error::{AmiError, AmiResult};
use crate::message::Message;

/// Login to the manager.
///
/// A response other than `Success` raises
/// [`AmiError::LoginFailed`] with the server's `Message` text.
pub struct Login {
    username: String,
    secret: String,
}

impl Login {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }
}

impl ManagerAction for Login {
    fn to_message(&self) -> Message {
        let mut action = Message::action("Login");
        action.insert("Username", &self.username);
        action.insert("Secret", &self.secret);
        action
    }

    fn handle_response(&mut self, response: Message) -> AmiResult<Message> {
        check_error_response(&response, || self.to_message())?;
        if response != RESPONSE_SUCCESS {
            return Err(AmiError::LoginFailed(
                response.get_or_default(HEADER_MESSAGE).to_string(),
            ));
        }
        Ok(response)
    }
}

/// Logoff from the manager
pub struct Logoff;

impl ManagerAction for Logoff {
    fn to_message(&self) -> Message {
        Message::action("Logoff")
    }
}

/// Keepalive ping
pub struct Ping;

impl ManagerAction for Ping {
    fn to_message(&self) -> Message {
        Message::action("Ping")
    }
}

/// Run a CLI command on the server.
///
/// The response arrives in `Follows` mode: the raw command output is in
/// the response's [`data`](Message::data) slot, not in a header.
pub struct Command {
    command: String,
}

impl Command {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl ManagerAction for Command {
    fn to_message(&self) -> Message {
        let mut action = Message::action("Command");
        action.insert("Command", &self.command);
        action
    }
}

/// List all actions the server accepts
pub struct ListCommands;

impl ManagerAction for ListCommands {
    fn to_message(&self) -> Message {
        Message::action("ListCommands")
    }
}

/// The `EventMask` of an [`Events`] action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventMask {
    /// Decimal OR of the [`event_flag`] constants
    Flags(u16),
    /// Comma-separated list of flag names, e.g. `"system,call,log"`
    Names(String),
    /// All events on
    On,
    /// All events off
    Off,
}

impl EventMask {
    fn as_wire(&self) -> String {
        match self {
            EventMask::Flags(mask) => mask.to_string(),
            EventMask::Names(names) => names.clone(),
            EventMask::On => "on".to_string(),
            EventMask::Off => "off".to_string(),
        }
    }
}

/// Control which event classes the server sends on this connection.
///
/// ```
/// use asterisk_ami_rs::actions::{Events, EventMask, ManagerAction};
/// use asterisk_ami_rs::constants::event_flag;
///
/// let action = Events::new(EventMask::Flags(
///     event_flag::SYSTEM | event_flag::CALL | event_flag::LOG,
/// ));
/// assert_eq!(action.to_message().get("EventMask"), Some("7"));
/// ```
pub struct Events {
    mask: EventMask,
}

impl Events {
    pub fn new(mask: EventMask) -> Self {
        Self { mask }
    }

    /// Turn all events on or off
    pub fn all(on: bool) -> Self {
        Self {
            mask: if on { EventMask::On } else { EventMask::Off },
        }
    }
}

impl ManagerAction for Events {
    fn to_message(&self) -> Message {
        let mut action = Message::action("Events");
        action.insert("EventMask", self.mask.as_wire());
        action
    }
}

/// Generate a `UserEvent` on the server.
///
/// Extra headers added with [`header`](UserEvent::header) are carried
/// verbatim on the generated event.
pub struct UserEvent {
    event: String,
    headers: Vec<(String, String)>,
}

impl UserEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            headers: Vec::new(),
        }
    }

    /// Attach an extra header to the generated event
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl ManagerAction for UserEvent {
    fn to_message(&self) -> Message {
        let mut action = Message::action("UserEvent");
        action.insert("UserEvent", &self.event);
        action.insert_all(self.headers.iter().cloned());
        action
    }
}

/// Check whether a mailbox has waiting messages
pub struct MailboxStatus {
    mailbox: String,
}

impl MailboxStatus {
    pub fn new(mailbox: impl Into<String>) -> Self {
        Self {
            mailbox: mailbox.into(),
        }
    }
}

impl ManagerAction for MailboxStatus {
    fn to_message(&self) -> Message {
        let mut action = Message::action("MailboxStatus");
        action.insert("Mailbox", &self.mailbox);
        action
    }
}

/// Get the number of messages in a voicemail box
pub struct MailboxCount {
    mailbox: String,
}

impl MailboxCount {
    pub fn new(mailbox: impl Into<String>) -> Self {
        Self {
            mailbox: mailbox.into(),
        }
    }
}

impl ManagerAction for MailboxCount {
    fn to_message(&self) -> Message {
        let mut action = Message::action("MailboxCount");
        action.insert("Mailbox", &self.mailbox);
        action
    }
}
