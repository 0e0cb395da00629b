use super::envelope::{Audience, Message, decode, encode};
use crate::utils::error::Error;
use serde_json::json;

#[test]
fn round_trip_all_fields() {
    let msg = Message {
        sender_id: "agent-a".to_string(),
        content: json!({"kind": "report", "values": [1, 2, 3]}),
        timestamp: 1_725_000_000_000,
        message_id: "msg-1".to_string(),
        in_reply_to: Some("msg-0".to_string()),
        audience: Audience::Direct,
        recipient_id: Some("agent-b".to_string()),
    };

    let bytes = encode(&msg).unwrap();
    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded, msg);
}

#[test]
fn round_trip_without_optionals() {
    let msg = Message::new("agent-a", json!("hello"));
    let bytes = encode(&msg).unwrap();
    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded, msg);
    assert_eq!(decoded.in_reply_to, None);
    assert_eq!(decoded.recipient_id, None);
}

#[test]
fn absent_optionals_are_omitted_on_the_wire() {
    let msg = Message::new("agent-a", json!(42));
    let text = String::from_utf8(encode(&msg).unwrap()).unwrap();
    assert!(!text.contains("in_reply_to"));
    assert!(!text.contains("recipient_id"));
}

#[test]
fn decode_fills_defaults_for_minimal_payload() {
    let bytes = br#"{"sender_id": "agent-a", "content": "hi"}"#;
    let msg = decode(bytes).unwrap();
    assert_eq!(msg.sender_id, "agent-a");
    assert_eq!(msg.audience, Audience::Everyone);
    assert!(!msg.message_id.is_empty());
    assert!(msg.timestamp > 0);
}

#[test]
fn decode_rejects_malformed_bytes() {
    let err = decode(b"not json at all").unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[test]
fn decode_rejects_missing_sender() {
    let err = decode(br#"{"content": "hi"}"#).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));

    let err = decode(br#"{"sender_id": "", "content": "hi"}"#).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[test]
fn decode_rejects_direct_without_recipient() {
    let bytes = br#"{"sender_id": "agent-a", "content": "hi", "audience": "direct"}"#;
    let err = decode(bytes).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));

    let bytes =
        br#"{"sender_id": "agent-a", "content": "hi", "audience": "direct", "recipient_id": ""}"#;
    let err = decode(bytes).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[test]
fn validate_rejects_direct_without_recipient() {
    let mut msg = Message::new("agent-a", json!("hi"));
    msg.audience = Audience::Direct;
    let err = msg.validate().unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    msg.recipient_id = Some("agent-b".to_string());
    assert!(msg.validate().is_ok());
}

#[test]
fn content_supports_structured_values() {
    let msg = Message::new("agent-a", json!({"nested": {"n": 1.5, "ok": true}}));
    let decoded = decode(&encode(&msg).unwrap()).unwrap();
    assert_eq!(decoded.content["nested"]["n"], json!(1.5));
    assert_eq!(decoded.content["nested"]["ok"], json!(true));
}
