//! RCI request bodies and response parsing.
//!
//! Kept free of I/O so the router's JSON shapes are tested directly.

use crate::{InterfaceInfo, Message, MessageId, RouterError, RouterResult};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

/// Interface types that carry a cellular modem.
pub const MOBILE_INTERFACE_TYPES: [&str; 5] = ["UsbQmi", "UsbLte", "UsbModem", "UsbPtp", "Yota"];

/// Router-side SMS state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsAction {
    Read,
    Delete,
}

impl SmsAction {
    fn command(self) -> &'static str {
        match self {
            SmsAction::Read => "read",
            SmsAction::Delete => "delete",
        }
    }
}

/// Mobile interfaces from a `show/interface` answer, in answer order.
pub fn parse_mobile_interfaces(value: &Value) -> RouterResult<Vec<InterfaceInfo>> {
    let interfaces = value.as_object().ok_or_else(|| {
        RouterError::Protocol("show/interface did not return an object".to_string())
    })?;

    Ok(interfaces
        .iter()
        .filter_map(|(name, interface)| {
            let kind = interface.get("type")?.as_str()?;
            if !MOBILE_INTERFACE_TYPES.contains(&kind) {
                return None;
            }
            Some(InterfaceInfo {
                name: name.clone(),
                kind: kind.to_string(),
                description: interface
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        })
        .collect())
}

/// Body listing the SMS of one interface.
pub fn sms_list_command(interface: &str) -> Value {
    json!({ "sms": { "list": { "interface": interface } } })
}

#[derive(Debug, Deserialize)]
struct SmsRecord {
    #[serde(default)]
    read: bool,
    from: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    timestamp: String,
}

/// Messages from an `sms list` answer, in the router's map order.
///
/// A missing `messages` key means an empty inbox. Entries that cannot be
/// decoded are logged and skipped.
pub fn parse_sms_list(interface: &str, value: &Value) -> RouterResult<Vec<Message>> {
    check_status(value)?;

    let list = value
        .get("sms")
        .and_then(|sms| sms.get("list"))
        .ok_or_else(|| RouterError::Protocol("sms list answer has no sms.list".to_string()))?;

    let messages = match list.get("messages") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(messages)) => messages,
        Some(other) => {
            return Err(RouterError::Protocol(format!(
                "sms.list.messages is not an object: {}",
                other
            )))
        }
    };

    Ok(messages
        .iter()
        .filter_map(|(id, raw)| match SmsRecord::deserialize(raw) {
            Ok(record) => Some(Message {
                id: id.clone(),
                interface: interface.to_string(),
                sender: record.from,
                text: record.text,
                timestamp: record.timestamp,
                read: record.read,
            }),
            Err(e) => {
                warn!(
                    interface = %interface,
                    message_id = %id,
                    error = %e,
                    "Skipping undecodable SMS entry"
                );
                None
            }
        })
        .collect())
}

/// One batched body applying `action` to every id.
pub fn sms_state_commands(action: SmsAction, interface: &str, ids: &[MessageId]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| {
                json!({ "sms": { action.command(): { "interface": interface, "id": id } } })
            })
            .collect(),
    )
}

/// Fail on the first `status` entry of type `error` anywhere in the answer.
pub fn check_status(value: &Value) -> RouterResult<()> {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(entries)) = map.get("status") {
                for entry in entries {
                    if entry.get("status").and_then(Value::as_str) == Some("error") {
                        let message = entry
                            .get("message")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown error");
                        return Err(RouterError::Command(message.to_string()));
                    }
                }
            }
            map.values().try_for_each(check_status)
        }
        Value::Array(items) => items.iter().try_for_each(check_status),
        _ => Ok(()),
    }
}
