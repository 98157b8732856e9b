//! Channel-scoped manager actions.

use super::{check_error_response, ManagerAction};
use crate::constants::*;
use crate::error::AmiResult;
use crate::message::Message;
use std::time::Duration;

/// Hang a channel up after the given time has passed.
///
/// `None` (or a zero duration) cancels any pending timeout; the wire
/// value is in whole seconds.
pub struct AbsoluteTimeout {
    channel: String,
    timeout: Option<Duration>,
}

impl AbsoluteTimeout {
    pub fn new(channel: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            channel: channel.into(),
            timeout,
        }
    }

    /// Cancel a pending timeout on `channel`
    pub fn cancel(channel: impl Into<String>) -> Self {
        Self::new(channel, None)
    }
}

impl ManagerAction for AbsoluteTimeout {
    fn to_message(&self) -> Message {
        let mut action = Message::action("AbsoluteTimeout");
        action.insert("Channel", &self.channel);
        let seconds = self.timeout.map(|t| t.as_secs()).unwrap_or(0);
        action.insert("Timeout", seconds.to_string());
        action
    }
}

/// Hang up a channel
pub struct Hangup {
    channel: String,
}

impl Hangup {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }
}

impl ManagerAction for Hangup {
    fn to_message(&self) -> Message {
        let mut action = Message::action("Hangup");
        action.insert("Channel", &self.channel);
        action
    }
}

/// Get a channel variable.
///
/// The response's `Value` header is captured and retrievable through
/// [`value`](Getvar::value) after the response has been handled:
///
/// ```rust,no_run
/// # use asterisk_ami_rs::{ManagerConnection, AmiResult};
/// use asterisk_ami_rs::actions::Getvar;
///
/// # async fn run(mut connection: ManagerConnection) -> AmiResult<()> {
/// let mut getvar = Getvar::new("SIP/100-0001", "CALLERID(num)");
/// connection.execute(&mut getvar).await?;
/// println!("caller id: {}", getvar.value());
/// # Ok(())
/// # }
/// ```
pub struct Getvar {
    channel: String,
    variable: String,
    value: Option<String>,
}

impl Getvar {
    pub fn new(channel: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            variable: variable.into(),
            value: None,
        }
    }

    /// The value captured from the response, `""` until one arrives
    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

impl ManagerAction for Getvar {
    fn to_message(&self) -> Message {
        let mut action = Message::action("Getvar");
        action.insert("Channel", &self.channel);
        action.insert("Variable", &self.variable);
        action
    }

    fn handle_response(&mut self, response: Message) -> AmiResult<Message> {
        check_error_response(&response, || self.to_message())?;
        self.value = Some(response.get_or_default(HEADER_VALUE).to_string());
        Ok(response)
    }
}

/// Set a channel variable
pub struct Setvar {
    channel: String,
    variable: String,
    value: String,
}

impl Setvar {
    pub fn new(
        channel: impl Into<String>,
        variable: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            variable: variable.into(),
            value: value.into(),
        }
    }
}

impl ManagerAction for Setvar {
    fn to_message(&self) -> Message {
        let mut action = Message::action("Setvar");
        action.insert("Channel", &self.channel);
        action.insert("Variable", &self.variable);
        action.insert("Value", &self.value);
        action
    }
}

/// Get channel status.
///
/// With no channel set, the server reports every active channel (as a
/// series of `Status` events bracketed by the response).
#[derive(Default)]
pub struct Status {
    channel: Option<String>,
}

impl Status {
    /// Status of all active channels
    pub fn all() -> Self {
        Self { channel: None }
    }

    /// Status of one channel
    pub fn of(channel: impl Into<String>) -> Self {
        Self {
            channel: Some(channel.into()),
        }
    }
}

impl ManagerAction for Status {
    fn to_message(&self) -> Message {
        let mut action = Message::action("Status");
        if let Some(channel) = &self.channel {
            action.insert("Channel", channel);
        }
        action
    }
}

/// Check the state of an extension (useful for devices with hints)
pub struct ExtensionState {
    context: String,
    exten: String,
}

impl ExtensionState {
    pub fn new(context: impl Into<String>, exten: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            exten: exten.into(),
        }
    }
}

impl ManagerAction for ExtensionState {
    fn to_message(&self) -> Message {
        let mut action = Message::action("ExtensionState");
        action.insert("Context", &self.context);
        action.insert("Exten", &self.exten);
        action
    }
}

/// Redirect a call to another dialplan location.
pub struct Redirect {
    channel: String,
    extra_channel: Option<String>,
    context: String,
    exten: String,
    priority: String,
}

impl Redirect {
    pub fn new(
        channel: impl Into<String>,
        context: impl Into<String>,
        exten: impl Into<String>,
        priority: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            extra_channel: None,
            context: context.into(),
            exten: exten.into(),
            priority: priority.into(),
        }
    }

    /// Redirect a second channel as well (generally the bridged leg)
    pub fn extra_channel(mut self, channel: impl Into<String>) -> Self {
        self.extra_channel = Some(channel.into());
        self
    }
}

impl ManagerAction for Redirect {
    fn to_message(&self) -> Message {
        let mut action = Message::action("Redirect");
        action.insert("Channel", &self.channel);
        if let Some(extra) = &self.extra_channel {
            action.insert("ExtraChannel", extra);
        }
        action.insert("Context", &self.context);
        action.insert("Exten", &self.exten);
        action.insert("Priority", &self.priority);
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_timeout_seconds_and_cancel() {
        let action = AbsoluteTimeout::new("SIP/100-a", Some(Duration::from_secs(90)));
        let message = action.to_message();
        assert_eq!(message.get("Timeout"), Some("90"));

        let message = AbsoluteTimeout::cancel("SIP/100-a").to_message();
        assert_eq!(message.get("Timeout"), Some("0"));
    }

    #[test]
    fn getvar_captures_value() {
        let mut getvar = Getvar::new("SIP/100-a", "FOO");
        assert_eq!(getvar.value(), "");

        let mut response = Message::response(RESPONSE_SUCCESS);
        response.insert("Variable", "FOO");
        response.insert(HEADER_VALUE, "bar");
        getvar.handle_response(response).unwrap();
        assert_eq!(getvar.value(), "bar");
    }

    #[test]
    fn setvar_wire_shape() {
        let wire = Setvar::new("SIP/100-a", "FOO", "bar")
            .to_message()
            .to_wire()
            .unwrap();
        assert_eq!(
            wire,
            "Action: Setvar\r\nChannel: SIP/100-a\r\nVariable: FOO\r\nValue: bar\r\n\r\n"
        );
    }

    #[test]
    fn status_channel_is_optional() {
        assert!(Status::all().to_message().get("Channel").is_none());
        assert_eq!(
            Status::of("SIP/100-a").to_message().get("Channel"),
            Some("SIP/100-a")
        );
    }

    #[test]
    fn redirect_extra_channel_placement() {
        let message = Redirect::new("SIP/100-a", "default", "200", "1")
            .extra_channel("SIP/200-b")
            .to_message();
        let headers: Vec<(&str, &str)> = message.iter().collect();
        assert_eq!(
            headers,
            vec![
                ("Action", "Redirect"),
                ("Channel", "SIP/100-a"),
                ("ExtraChannel", "SIP/200-b"),
                ("Context", "default"),
                ("Exten", "200"),
                ("Priority", "1"),
            ]
        );
    }

    #[test]
    fn extension_state_wire_shape() {
        let message = ExtensionState::new("hints", "100").to_message();
        assert_eq!(message.get("Context"), Some("hints"));
        assert_eq!(message.get("Exten"), Some("100"));
    }
}
