//! The manager message model.
//!
//! Every unit of traffic on the manager wire is a [`Message`]: an ordered,
//! multi-valued header container with one distinguished *primary* header
//! naming the message kind (`Action`, `Response`, or `Event`). Headers are
//! stored exactly as received from Asterisk, so the exact case Asterisk
//! uses must be used for lookups. Repeated header names are permitted and
//! preserved in insertion order.
//!
//! Comparing a message against a string compares the primary header's
//! value, which reads naturally when testing a response status:
//!
//! ```
//! use asterisk_ami_rs::Message;
//!
//! let response = Message::response("Success");
//! assert!(response == "Success");
//! ```

use crate::constants::*;
use crate::error::{AmiError, AmiResult};
use serde::{Deserialize, Serialize};

/// The kind of a manager message, determining its primary header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Client to server command (`Action:` header)
    Action,
    /// Server reply, one per action, FIFO ordered (`Response:` header)
    Response,
    /// Asynchronous server notification (`Event:` header)
    Event,
}

impl MessageKind {
    /// The name of the primary header for this kind
    pub fn primary_header(self) -> &'static str {
        match self {
            MessageKind::Action => HEADER_ACTION,
            MessageKind::Response => HEADER_RESPONSE,
            MessageKind::Event => HEADER_EVENT,
        }
    }
}

/// An Asterisk manager message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    kind: MessageKind,
    headers: Vec<(String, String)>,
    /// Raw command output of a `Response: Follows` message. Never a header.
    pub data: Option<String>,
}

impl Message {
    /// Construct a message of the given kind with the primary header set
    pub fn new(kind: MessageKind, primary_value: impl Into<String>) -> Self {
        Self {
            kind,
            headers: vec![(kind.primary_header().to_string(), primary_value.into())],
            data: None,
        }
    }

    /// Construct an `Action` message
    pub fn action(value: impl Into<String>) -> Self {
        Self::new(MessageKind::Action, value)
    }

    /// Construct a `Response` message
    pub fn response(value: impl Into<String>) -> Self {
        Self::new(MessageKind::Response, value)
    }

    /// Construct an `Event` message
    pub fn event(value: impl Into<String>) -> Self {
        Self::new(MessageKind::Event, value)
    }

    /// Construct a message from an existing list of header pairs
    pub fn from_headers(
        kind: MessageKind,
        headers: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            kind,
            headers: headers.into_iter().collect(),
            data: None,
        }
    }

    /// The kind of this message
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Get the first value stored under `name`, if any
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Get the first value stored under `name`, or `""` if absent
    pub fn get_or_default(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Get a mutable reference to the first value stored under `name`,
    /// creating an empty entry when no header with that name exists
    pub fn get_or_insert(&mut self, name: &str) -> &mut String {
        if let Some(index) = self.headers.iter().position(|(key, _)| key == name) {
            return &mut self.headers[index].1;
        }
        self.headers.push((name.to_string(), String::new()));
        &mut self.headers.last_mut().unwrap().1
    }

    /// Set the first value stored under `name`, inserting it when absent
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        *self.get_or_insert(name) = value.into();
        self
    }

    /// Append a header, preserving any existing headers with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Append many header pairs in order
    pub fn insert_all(&mut self, pairs: impl IntoIterator<Item = (String, String)>) -> &mut Self {
        self.headers.extend(pairs);
        self
    }

    /// Iterate every value stored under `name`, in insertion order
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.headers
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate all headers in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of headers, duplicates included
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// `true` when the message has no headers
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// The value of the primary header (`Action`, `Response`, or `Event`).
    ///
    /// Fails `HeaderMissing` only when no header with the primary name
    /// exists; a present-but-empty value is returned as `""`.
    pub fn primary(&self) -> AmiResult<&str> {
        let name = self.kind.primary_header();
        self.get(name)
            .ok_or_else(|| AmiError::HeaderMissing(name.to_string()))
    }

    /// Format this message in wire form.
    ///
    /// The primary header is serialized first even if it was inserted
    /// later; every header line is CRLF terminated and an empty CRLF line
    /// closes the message. An absent *or empty* primary value is a
    /// `HeaderMissing` failure, there is no such thing as a message
    /// without a kind on the wire.
    pub fn to_wire(&self) -> AmiResult<String> {
        let primary_name = self.kind.primary_header();
        let primary_value = match self.primary()? {
            "" => return Err(AmiError::HeaderMissing(primary_name.to_string())),
            value => value,
        };

        let mut out = String::new();
        out.push_str(primary_name);
        out.push_str(": ");
        out.push_str(primary_value);
        out.push_str(LINE_TERMINATOR);

        for (name, value) in &self.headers {
            // don't repeat the primary header
            if name == primary_name {
                continue;
            }
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str(LINE_TERMINATOR);
        }

        out.push_str(LINE_TERMINATOR);
        Ok(out)
    }
}

impl PartialEq<str> for Message {
    fn eq(&self, other: &str) -> bool {
        self.primary().map(|value| value == other).unwrap_or(false)
    }
}

impl PartialEq<&str> for Message {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<Message> for &str {
    fn eq(&self, other: &Message) -> bool {
        other == self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_value_and_equality() {
        let message = Message::response("Success");
        assert_eq!(message.primary().unwrap(), "Success");
        assert!(message == "Success");
        assert!(message != "Error");
        assert!("Success" == message);
    }

    #[test]
    fn missing_primary_compares_false() {
        let message = Message::from_headers(MessageKind::Response, vec![]);
        assert!(message != "Success");
        assert!(matches!(
            message.primary(),
            Err(AmiError::HeaderMissing(name)) if name == "Response"
        ));
    }

    #[test]
    fn first_match_lookup_with_duplicates() {
        let mut message = Message::action("Originate");
        message.insert("Variable", "a=1");
        message.insert("Variable", "b=2");
        assert_eq!(message.get("Variable"), Some("a=1"));
        let all: Vec<&str> = message.values("Variable").collect();
        assert_eq!(all, vec!["a=1", "b=2"]);
    }

    #[test]
    fn get_or_insert_creates_empty_entry() {
        let mut message = Message::event("Hangup");
        assert!(message.get("Cause").is_none());
        message.get_or_insert("Cause").push_str("16");
        assert_eq!(message.get("Cause"), Some("16"));
        assert_eq!(message.len(), 2);
    }

    #[test]
    fn keys_are_case_sensitive() {
        let mut message = Message::event("Hangup");
        message.insert("Channel", "SIP/100-a");
        assert!(message.get("channel").is_none());
        assert_eq!(message.get("Channel"), Some("SIP/100-a"));
    }

    #[test]
    fn wire_form_puts_primary_first() {
        let mut message = Message::from_headers(
            MessageKind::Action,
            vec![("Channel".to_string(), "SIP/100".to_string())],
        );
        message.insert("Action", "Hangup");
        let wire = message.to_wire().unwrap();
        assert_eq!(wire, "Action: Hangup\r\nChannel: SIP/100\r\n\r\n");
    }

    #[test]
    fn wire_form_preserves_duplicates() {
        let mut message = Message::action("Originate");
        message.insert("Channel", "SIP/100");
        message.insert("Variable", "a=1");
        message.insert("Variable", "b=2");
        let wire = message.to_wire().unwrap();
        assert_eq!(
            wire,
            "Action: Originate\r\nChannel: SIP/100\r\nVariable: a=1\r\nVariable: b=2\r\n\r\n"
        );
    }

    #[test]
    fn wire_form_requires_primary() {
        let message = Message::from_headers(
            MessageKind::Action,
            vec![("Channel".to_string(), "SIP/100".to_string())],
        );
        assert!(matches!(
            message.to_wire(),
            Err(AmiError::HeaderMissing(name)) if name == "Action"
        ));
    }

    #[test]
    fn empty_primary_value_reads_but_does_not_serialize() {
        let mut message = Message::action("");
        assert_eq!(message.primary().unwrap(), "");
        assert!(message == "");
        assert!(matches!(
            message.to_wire(),
            Err(AmiError::HeaderMissing(name)) if name == "Action"
        ));

        message.set("Action", "Ping");
        assert_eq!(message.to_wire().unwrap(), "Action: Ping\r\n\r\n");
    }
}
