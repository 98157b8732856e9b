//! Integration tests exercising the public API surface.
//!
//! These tests use only the public API. Tests for internal modules
//! (buffer, protocol, message) live as unit tests inside the respective
//! modules.

use asterisk_ami_rs::actions::{
    Events, EventMask, Hangup, ManagerAction, Originate, Setvar, WithActionId,
};
use asterisk_ami_rs::constants::event_flag;
use asterisk_ami_rs::{ActionErrorKind, AmiError, Message, MessageKind};
use std::time::Duration;

#[test]
fn message_kinds_and_primary_headers() {
    assert_eq!(MessageKind::Action.primary_header(), "Action");
    assert_eq!(MessageKind::Response.primary_header(), "Response");
    assert_eq!(MessageKind::Event.primary_header(), "Event");
}

#[test]
fn action_messages_serialize_primary_first() {
    let action = Setvar::new("SIP/100-a", "FOO", "bar");
    let wire = action.to_message().to_wire().unwrap();
    assert!(wire.starts_with("Action: Setvar\r\n"));
    assert!(wire.ends_with("\r\n\r\n"));
}

#[test]
fn action_id_wrapper_composes_with_any_action() {
    let action = WithActionId::new(Hangup::new("SIP/100-a"), "h-1");
    assert_eq!(action.action_id(), Some("h-1"));
    assert!(action.to_message() == "Hangup");
}

#[test]
fn event_mask_flag_values_match_the_manager_dialect() {
    assert_eq!(event_flag::SYSTEM, 1);
    assert_eq!(event_flag::CALL, 2);
    assert_eq!(event_flag::LOG, 4);
    assert_eq!(event_flag::VERBOSE, 8);
    assert_eq!(event_flag::COMMAND, 16);
    assert_eq!(event_flag::AGENT, 32);
    assert_eq!(event_flag::USER, 64);
    assert_eq!(event_flag::CONFIG, 128);

    let message = Events::new(EventMask::Flags(event_flag::USER | event_flag::CONFIG))
        .to_message();
    assert_eq!(message.get("EventMask"), Some("192"));
}

#[test]
fn originate_full_wire_shape() {
    let wire = Originate::to_dialplan("SIP/100", "default", "200", "1")
        .timeout(Duration::from_millis(1500))
        .caller_id("1001")
        .run_async()
        .variable("X", "1")
        .to_message()
        .to_wire()
        .unwrap();
    assert_eq!(
        wire,
        "Action: Originate\r\nChannel: SIP/100\r\nContext: default\r\nExten: 200\r\n\
         Priority: 1\r\nTimeout: 1500\r\nCallerID: 1001\r\nAsync: true\r\nVariable: X=1\r\n\r\n"
    );
}

#[test]
fn error_taxonomy_is_matchable() {
    let error = AmiError::Action {
        kind: ActionErrorKind::ChannelNotFound,
        message: "No such channel".to_string(),
        action: Box::new(Message::action("Hangup")),
    };
    match error {
        AmiError::Action { kind, action, .. } => {
            assert_eq!(kind, ActionErrorKind::ChannelNotFound);
            assert!(*action == "Hangup");
        }
        _ => unreachable!(),
    }
}
