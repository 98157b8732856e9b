//! Manager actions.
//!
//! Every manager command implements [`ManagerAction`]: it knows how to
//! build its wire [`Message`] and how to interpret the response, turning
//! Asterisk error replies into typed failures. The shared mapping lives in
//! [`check_error_response`]; concrete actions call it first (via the
//! default [`handle_response`](ManagerAction::handle_response)) and add
//! their own checks on top — [`Login`] demands a `Success` response,
//! [`Getvar`] captures the returned `Value` header.
//!
//! ```rust,no_run
//! # use asterisk_ami_rs::{ManagerConnection, AmiResult};
//! use asterisk_ami_rs::actions::{Login, Ping};
//!
//! # async fn run(mut connection: ManagerConnection) -> AmiResult<()> {
//! let mut login = Login::new("admin", "secret");
//! connection.execute(&mut login).await?; // translated errors
//! let raw = connection.send_action(&Ping).await?; // raw response
//! assert!(raw == "Success" || raw == "Pong");
//! # Ok(())
//! # }
//! ```

pub mod basic;
pub mod channel;
pub mod originate;
pub mod queue;

pub use basic::{
    Command, Events, EventMask, ListCommands, Login, Logoff, MailboxCount, MailboxStatus, Ping,
    UserEvent,
};
pub use channel::{
    AbsoluteTimeout, ExtensionState, Getvar, Hangup, Redirect, Setvar, Status,
};
pub use originate::{Originate, OriginateDestination};
pub use queue::{QueuePause, QueueStatus};

use crate::constants::*;
use crate::error::{ActionErrorKind, AmiError, AmiResult};
use crate::message::Message;

/// A manager command.
///
/// Implementations are passed to
/// [`ManagerConnection::send_action`](crate::ManagerConnection::send_action)
/// which serializes whatever [`to_message`](ManagerAction::to_message)
/// returns.
pub trait ManagerAction {
    /// Build the wire message for this action
    fn to_message(&self) -> Message;

    /// Correlation token echoed on the response and on any events this
    /// action triggers. Serialized as the `ActionID` header when present.
    fn action_id(&self) -> Option<&str> {
        None
    }

    /// Inspect the response, turning error replies into typed failures.
    ///
    /// The default implementation applies the standard error taxonomy via
    /// [`check_error_response`]. Overrides should call that helper first if
    /// they want to keep the shared mapping.
    fn handle_response(&mut self, response: Message) -> AmiResult<Message> {
        check_error_response(&response, || self.to_message())?;
        Ok(response)
    }
}

/// Map a recognized `Error` response onto a typed failure.
///
/// `action` is only invoked when an error is actually raised, to attach
/// the offending action message to the failure.
pub fn check_error_response(
    response: &Message,
    action: impl FnOnce() -> Message,
) -> AmiResult<()> {
    if *response != RESPONSE_ERROR {
        return Ok(());
    }

    let text = response.get_or_default(HEADER_MESSAGE);
    let kind = match text {
        PERMISSION_ERROR_TEXT => return Err(AmiError::PermissionDenied),
        AUTHENTICATION_ERROR_TEXT => return Err(AmiError::AuthenticationRequired),
        "No timeout specified"
        | "No channel specified"
        | "Channel not specified"
        | "Extension not specified"
        | "No variable specified"
        | "No value specified"
        | "Mailbox not specified" => ActionErrorKind::MissingData,
        "Invalid priority" | "Invalid channel" | "Invalid timeout" => ActionErrorKind::BadData,
        "No such channel" => ActionErrorKind::ChannelNotFound,
        _ => return Ok(()),
    };

    Err(AmiError::Action {
        kind,
        message: text.to_string(),
        action: Box::new(action()),
    })
}

/// Attach an `ActionID` correlation token to any action.
///
/// ```
/// use asterisk_ami_rs::actions::{ManagerAction, Ping, WithActionId};
///
/// let ping = WithActionId::new(Ping, "ping-42");
/// assert_eq!(ping.action_id(), Some("ping-42"));
/// ```
pub struct WithActionId<A> {
    inner: A,
    id: String,
}

impl<A: ManagerAction> WithActionId<A> {
    pub fn new(inner: A, id: impl Into<String>) -> Self {
        Self {
            inner,
            id: id.into(),
        }
    }

    /// The wrapped action
    pub fn into_inner(self) -> A {
        self.inner
    }
}

impl<A: ManagerAction> ManagerAction for WithActionId<A> {
    fn to_message(&self) -> Message {
        self.inner.to_message()
    }

    fn action_id(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn handle_response(&mut self, response: Message) -> AmiResult<Message> {
        self.inner.handle_response(response)
    }
}
