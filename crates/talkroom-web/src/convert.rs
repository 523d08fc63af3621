//! Stored rows to domain models. Corrupt columns are logged and replaced by
//! defaults instead of failing the whole page.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use talkroom_db::models::{TalkRow, UserRow};
use talkroom_types::models::{Talk, User};

pub fn user_from_row(row: UserRow) -> User {
    User {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt user id '{}': {}", row.id, e);
            Uuid::default()
        }),
        created_at: parse_timestamp(&row.created_at).unwrap_or_else(|| {
            warn!("Corrupt created_at '{}' on user '{}'", row.created_at, row.id);
            DateTime::default()
        }),
        username: row.username,
        email: row.email,
    }
}

pub fn talk_from_row(row: TalkRow) -> Talk {
    Talk {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt talk id '{}': {}", row.id, e);
            Uuid::default()
        }),
        sender_id: row.sender_id.parse().unwrap_or_else(|e| {
            warn!("Corrupt sender_id '{}' on talk '{}': {}", row.sender_id, row.id, e);
            Uuid::default()
        }),
        receiver_id: row.receiver_id.parse().unwrap_or_else(|e| {
            warn!("Corrupt receiver_id '{}' on talk '{}': {}", row.receiver_id, row.id, e);
            Uuid::default()
        }),
        time: parse_timestamp(&row.time).unwrap_or_else(|| {
            warn!("Corrupt time '{}' on talk '{}'", row.time, row.id);
            DateTime::default()
        }),
        sender_username: row.sender_username,
        message: row.message,
    }
}

/// Accepts RFC 3339 as well as SQLite's `datetime('now')` format.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        let sqlite = parse_timestamp("2026-10-19 08:30:00").unwrap();
        let rfc = parse_timestamp("2026-10-19T08:30:00.000000Z").unwrap();
        assert_eq!(sqlite, rfc);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_corrupt_talk_row_falls_back_to_defaults() {
        let talk = talk_from_row(TalkRow {
            id: "not-a-uuid".into(),
            sender_id: Uuid::nil().to_string(),
            sender_username: "alice".into(),
            receiver_id: "bad".into(),
            message: "hi".into(),
            time: "garbage".into(),
        });
        assert_eq!(talk.id, Uuid::default());
        assert_eq!(talk.receiver_id, Uuid::default());
        assert_eq!(talk.time, DateTime::<Utc>::default());
        assert_eq!(talk.message, "hi");
    }
}
