//! The `Originate` action: place a call and connect it to a dialplan
//! location or directly to an application.

use super::ManagerAction;
use crate::message::Message;
use std::time::Duration;

/// Where the originated call is connected once the channel answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginateDestination {
    /// Start the channel in the dialplan at context/exten/priority
    Dialplan {
        context: String,
        exten: String,
        priority: String,
    },
    /// Run an application with the given data on the channel
    Application { application: String, data: String },
}

/// Timeout for an [`Originate`]; Asterisk defaults to 30 seconds when the
/// header is omitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OriginateTimeout {
    /// Omit the header, letting the server default apply
    #[default]
    Default,
    /// Wait this long for an answer (serialized in milliseconds)
    After(Duration),
    /// Never time out (serialized as `-1`)
    Infinite,
}

/// Originate a call.
///
/// ```
/// use asterisk_ami_rs::actions::{ManagerAction, Originate};
/// use std::time::Duration;
///
/// let action = Originate::to_dialplan("SIP/100", "default", "200", "1")
///     .timeout(Duration::from_secs(45))
///     .caller_id("\"Support\" <300>")
///     .variable("ACCOUNT", "premium")
///     .variable("CAMPAIGN", "q3")
///     .run_async();
///
/// let message = action.to_message();
/// assert_eq!(message.get("Timeout"), Some("45000"));
/// assert_eq!(message.values("Variable").count(), 2);
/// ```
pub struct Originate {
    channel: String,
    destination: OriginateDestination,
    timeout: OriginateTimeout,
    caller_id: Option<String>,
    account: Option<String>,
    run_async: bool,
    variables: Vec<(String, String)>,
}

impl Originate {
    /// Originate `channel` into the dialplan
    pub fn to_dialplan(
        channel: impl Into<String>,
        context: impl Into<String>,
        exten: impl Into<String>,
        priority: impl Into<String>,
    ) -> Self {
        Self::new(
            channel,
            OriginateDestination::Dialplan {
                context: context.into(),
                exten: exten.into(),
                priority: priority.into(),
            },
        )
    }

    /// Originate `channel` into an application
    pub fn to_application(
        channel: impl Into<String>,
        application: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self::new(
            channel,
            OriginateDestination::Application {
                application: application.into(),
                data: data.into(),
            },
        )
    }

    pub fn new(channel: impl Into<String>, destination: OriginateDestination) -> Self {
        Self {
            channel: channel.into(),
            destination,
            timeout: OriginateTimeout::Default,
            caller_id: None,
            account: None,
            run_async: false,
            variables: Vec::new(),
        }
    }

    /// Wait this long for the channel to answer
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() {
            OriginateTimeout::Default
        } else {
            OriginateTimeout::After(timeout)
        };
        self
    }

    /// Never time out waiting for an answer
    pub fn no_timeout(mut self) -> Self {
        self.timeout = OriginateTimeout::Infinite;
        self
    }

    /// Set the CallerID for the call (any format Asterisk accepts,
    /// e.g. `"Name" <number>`)
    pub fn caller_id(mut self, cid: impl Into<String>) -> Self {
        self.caller_id = Some(cid.into());
        self
    }

    /// Set the account code for the call
    pub fn account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Return the response immediately instead of waiting for the call to
    /// complete; progress arrives as `OriginateResponse` events
    pub fn run_async(mut self) -> Self {
        self.run_async = true;
        self
    }

    /// Set a variable on the originated channel. May be called repeatedly;
    /// each variable is carried as its own repeated `Variable` header.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }
}

impl ManagerAction for Originate {
    fn to_message(&self) -> Message {
        let mut action = Message::action("Originate");
        action.insert("Channel", &self.channel);

        match &self.destination {
            OriginateDestination::Dialplan {
                context,
                exten,
                priority,
            } => {
                action.insert("Context", context);
                action.insert("Exten", exten);
                action.insert("Priority", priority);
            }
            OriginateDestination::Application { application, data } => {
                action.insert("Application", application);
                action.insert("Data", data);
            }
        }

        match self.timeout {
            OriginateTimeout::Default => {}
            OriginateTimeout::After(timeout) => {
                action.insert("Timeout", timeout.as_millis().to_string());
            }
            // Asterisk uses -1 for infinite
            OriginateTimeout::Infinite => {
                action.insert("Timeout", "-1");
            }
        }

        if let Some(cid) = &self.caller_id {
            action.insert("CallerID", cid);
        }
        if let Some(account) = &self.account {
            action.insert("Account", account);
        }
        if self.run_async {
            action.insert("Async", "true");
        }

        for (name, value) in &self.variables {
            action.insert("Variable", format!("{name}={value}"));
        }

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialplan_destination_headers() {
        let message = Originate::to_dialplan("SIP/100", "default", "200", "1").to_message();
        assert_eq!(message.get("Channel"), Some("SIP/100"));
        assert_eq!(message.get("Context"), Some("default"));
        assert_eq!(message.get("Exten"), Some("200"));
        assert_eq!(message.get("Priority"), Some("1"));
        assert!(message.get("Application").is_none());
        assert!(message.get("Timeout").is_none());
    }

    #[test]
    fn application_destination_headers() {
        let message = Originate::to_application("SIP/100", "Playback", "welcome").to_message();
        assert_eq!(message.get("Application"), Some("Playback"));
        assert_eq!(message.get("Data"), Some("welcome"));
        assert!(message.get("Context").is_none());
    }

    #[test]
    fn timeout_is_milliseconds() {
        let message = Originate::to_dialplan("SIP/100", "default", "200", "1")
            .timeout(Duration::from_secs(45))
            .to_message();
        assert_eq!(message.get("Timeout"), Some("45000"));
    }

    #[test]
    fn zero_timeout_omits_header() {
        let message = Originate::to_dialplan("SIP/100", "default", "200", "1")
            .timeout(Duration::ZERO)
            .to_message();
        assert!(message.get("Timeout").is_none());
    }

    #[test]
    fn infinite_timeout_serializes_minus_one() {
        let message = Originate::to_dialplan("SIP/100", "default", "200", "1")
            .no_timeout()
            .to_message();
        assert_eq!(message.get("Timeout"), Some("-1"));
    }

    #[test]
    fn optional_headers() {
        let message = Originate::to_dialplan("SIP/100", "default", "200", "1")
            .caller_id("\"Ops\" <300>")
            .account("acct-7")
            .run_async()
            .to_message();
        assert_eq!(message.get("CallerID"), Some("\"Ops\" <300>"));
        assert_eq!(message.get("Account"), Some("acct-7"));
        assert_eq!(message.get("Async"), Some("true"));
    }

    #[test]
    fn variables_are_repeated_headers() {
        let message = Originate::to_dialplan("SIP/100", "default", "200", "1")
            .variable("A", "1")
            .variable("B", "2")
            .to_message();
        let variables: Vec<&str> = message.values("Variable").collect();
        assert_eq!(variables, vec!["A=1", "B=2"]);
        assert!(message.get("Variable1").is_none());
    }
}
