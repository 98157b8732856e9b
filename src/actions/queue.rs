//! Queue management actions.

use super::{check_error_response, ManagerAction};
use crate::constants::*;
use crate::error::{AmiError, AmiResult};
use crate::message::Message;

/// Pause or unpause a queue member.
///
/// With no queue set, the member's state changes in every queue it
/// belongs to. A response other than `Success` raises
/// [`AmiError::QueuePauseFailed`].
pub struct QueuePause {
    interface: String,
    queue: Option<String>,
    paused: bool,
}

impl QueuePause {
    pub fn new(interface: impl Into<String>, paused: bool) -> Self {
        Self {
            interface: interface.into(),
            queue: None,
            paused,
        }
    }

    /// Restrict the state change to one queue
    pub fn queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }
}

impl ManagerAction for QueuePause {
    fn to_message(&self) -> Message {
        let mut action = Message::action("QueuePause");
        if let Some(queue) = &self.queue {
            action.insert("Queue", queue);
        }
        action.insert("Interface", &self.interface);
        action.insert("Paused", if self.paused { "true" } else { "false" });
        action
    }

    fn handle_response(&mut self, response: Message) -> AmiResult<Message> {
        check_error_response(&response, || self.to_message())?;
        if response != RESPONSE_SUCCESS {
            return Err(AmiError::QueuePauseFailed(
                response.get_or_default(HEADER_MESSAGE).to_string(),
            ));
        }
        Ok(response)
    }
}

/// Ask for queue status.
///
/// The server answers with a series of `QueueParams`/`QueueMember`/
/// `QueueEntry` events; set an `ActionID` (via
/// [`WithActionId`](super::WithActionId)) to correlate them.
#[derive(Default)]
pub struct QueueStatus {
    queue: Option<String>,
    member: Option<String>,
}

impl QueueStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the report to one queue
    pub fn queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    /// Restrict the report to one member
    pub fn member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }
}

impl ManagerAction for QueueStatus {
    fn to_message(&self) -> Message {
        let mut action = Message::action("QueueStatus");
        if let Some(queue) = &self.queue {
            action.insert("Queue", queue);
        }
        if let Some(member) = &self.member {
            action.insert("Member", member);
        }
        action
    }
}
