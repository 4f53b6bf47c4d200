//! Bus payload for an accepted message.

use crate::error::{ActionError, ActionResult};
use chrono::NaiveDateTime;
use keenetic_client::Message;
use serde::Serialize;

/// Rendering of timestamps in the payload. The router reports local time
/// without a zone, so none is added.
pub const PAYLOAD_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Serialize)]
struct Payload<'a> {
    id: &'a str,
    from: &'a str,
    text: &'a str,
    timestamp: String,
}

const WEEKDAY_NAMES: [(&str, &str); 7] = [
    ("Mon", "Monday"),
    ("Tue", "Tuesday"),
    ("Wed", "Wednesday"),
    ("Thu", "Thursday"),
    ("Fri", "Friday"),
    ("Sat", "Saturday"),
    ("Sun", "Sunday"),
];

/// Reparse a router timestamp written in `datetime_format`.
///
/// A weekday name that disagrees with the date is ignored; the date wins.
pub fn parse_timestamp(raw: &str, datetime_format: &str) -> ActionResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, datetime_format).or_else(|source| {
        parse_ignoring_weekday(raw, datetime_format).ok_or_else(|| ActionError::Format {
            timestamp: raw.to_string(),
            format: datetime_format.to_string(),
            source,
        })
    })
}

/// Retry with `%a`/`%A` replaced by the weekday name found in `raw`.
fn parse_ignoring_weekday(raw: &str, datetime_format: &str) -> Option<NaiveDateTime> {
    WEEKDAY_NAMES.iter().find_map(|&(short, long)| {
        let format = if datetime_format.contains("%A") && raw.contains(long) {
            datetime_format.replace("%A", long)
        } else if datetime_format.contains("%a") && raw.contains(short) {
            datetime_format.replace("%a", short)
        } else {
            return None;
        };
        NaiveDateTime::parse_from_str(raw, &format).ok()
    })
}

/// JSON bytes `{"id", "from", "text", "timestamp"}`, UTF-8 unescaped.
pub fn serialize(message: &Message, datetime_format: &str) -> ActionResult<Vec<u8>> {
    let timestamp = parse_timestamp(&message.timestamp, datetime_format)?;

    let payload = Payload {
        id: &message.id,
        from: &message.sender,
        text: &message.text,
        timestamp: timestamp.format(PAYLOAD_TIMESTAMP_FORMAT).to_string(),
    };

    Ok(serde_json::to_vec(&payload)?)
}
