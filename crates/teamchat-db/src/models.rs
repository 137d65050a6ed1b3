use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use tracing::warn;
use uuid::Uuid;

use teamchat_types::models::{Channel, Message};

/// Database row types, mapping directly to SQLite rows.
/// Distinct from teamchat-types API models to keep the DB layer independent.

pub struct ChannelRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub channel_id: String,
    pub user_name: String,
    pub content: String,
    pub is_ai: bool,
    pub created_at: String,
}

pub struct DocumentRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub embedding: Vec<u8>,
}

impl ChannelRow {
    pub fn into_channel(self) -> Channel {
        Channel {
            id: parse_uuid(&self.id, "channel"),
            created_at: parse_timestamp(&self.created_at, &self.id),
            name: self.name,
            description: self.description,
        }
    }
}

impl MessageRow {
    pub fn into_message(self) -> Message {
        Message {
            id: parse_uuid(&self.id, "message"),
            channel_id: parse_uuid(&self.channel_id, "channel"),
            created_at: parse_timestamp(&self.created_at, &self.id),
            user_name: self.user_name,
            content: self.content,
            is_ai: self.is_ai,
        }
    }
}

/// Stored timestamp format. Fixed width, so lexical order is time order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}

fn parse_timestamp(raw: &str, row_id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through sqlite3 use datetime('now'):
            // "YYYY-MM-DD HH:MM:SS" without timezone.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on row '{}': {}", raw, row_id, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip_and_sort() {
        let earlier = "2026-01-02T03:04:05.000001Z".parse::<DateTime<Utc>>().unwrap();
        let later = earlier + chrono::Duration::microseconds(1);
        assert!(format_timestamp(earlier) < format_timestamp(later));
        assert_eq!(parse_timestamp(&format_timestamp(later), "x"), later);
    }

    #[test]
    fn accepts_sqlite_datetime_format() {
        let ts = parse_timestamp("2026-01-02 03:04:05", "x");
        assert_eq!(format_timestamp(ts), "2026-01-02T03:04:05.000000Z");
    }
}
