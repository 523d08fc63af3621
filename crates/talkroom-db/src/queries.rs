use crate::Database;
use crate::models::{TalkRow, UserRow};
use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row};

impl Database {
    // -- Users --

    /// Insert a new user. Returns `false` when the username is already taken.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, email, password) VALUES (?1, ?2, ?3, ?4)",
                (id, username, email, password_hash),
            );
            unique_or_err(inserted)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Every registered user, ordered by username.
    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, email, password, created_at FROM users ORDER BY username",
            )?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Rename a user. Returns `false` when another user already holds the name.
    pub fn update_username(&self, id: &str, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute("UPDATE users SET username = ?1 WHERE id = ?2", (username, id));
            unique_or_err(updated)
        })
    }

    pub fn update_email(&self, id: &str, email: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE users SET email = ?1 WHERE id = ?2", (email, id))?;
            Ok(())
        })
    }

    pub fn update_password(&self, id: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE users SET password = ?1 WHERE id = ?2", (password_hash, id))?;
            Ok(())
        })
    }

    // -- Talks --

    pub fn insert_talk(
        &self,
        id: &str,
        sender_id: &str,
        receiver_id: &str,
        message: &str,
        time: DateTime<Utc>,
    ) -> Result<()> {
        let time = time.to_rfc3339_opts(SecondsFormat::Micros, true);
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO talks (id, sender_id, receiver_id, message, time) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, sender_id, receiver_id, message, &time),
            )?;
            Ok(())
        })
    }

    pub fn count_talks(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM talks", [], |r| r.get(0))?;
            Ok(count as u64)
        })
    }

    /// All talks exchanged between two users in either direction, oldest first.
    /// Equal timestamps fall back to insertion order.
    pub fn get_talks_between(&self, user_a: &str, user_b: &str) -> Result<Vec<TalkRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.sender_id, u.username, t.receiver_id, t.message, t.time
                 FROM talks t
                 LEFT JOIN users u ON t.sender_id = u.id
                 WHERE (t.sender_id = ?1 AND t.receiver_id = ?2)
                    OR (t.sender_id = ?2 AND t.receiver_id = ?1)
                 ORDER BY t.time ASC, t.rowid ASC",
            )?;

            let rows = stmt
                .query_map((user_a, user_b), |row| {
                    Ok(TalkRow {
                        id: row.get(0)?,
                        sender_id: row.get(1)?,
                        sender_username: row
                            .get::<_, Option<String>>(2)?
                            .unwrap_or_else(|| "unknown".to_string()),
                        receiver_id: row.get(3)?,
                        message: row.get(4)?,
                        time: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, email, password, created_at FROM users WHERE {} = ?1",
        column
    );
    let row = conn.query_row(&sql, [value], user_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Map a UNIQUE constraint failure to `Ok(false)`, keep every other error.
fn unique_or_err(result: rusqlite::Result<usize>) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn add_user(db: &Database, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        assert!(db.create_user(&id, username, &format!("{}@example.com", username), "hash").unwrap());
        id
    }

    fn send(db: &Database, from: &str, to: &str, message: &str, secs: i64) {
        let time = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
        db.insert_talk(&Uuid::new_v4().to_string(), from, to, message, time).unwrap();
    }

    #[test]
    fn test_duplicate_username_is_reported() {
        let db = Database::open_in_memory().unwrap();
        add_user(&db, "alice");
        let taken = db
            .create_user(&Uuid::new_v4().to_string(), "alice", "other@example.com", "hash")
            .unwrap();
        assert!(!taken);
        assert_eq!(db.list_users().unwrap().len(), 1);
    }

    #[test]
    fn test_lookup_and_list_users() {
        let db = Database::open_in_memory().unwrap();
        let bob = add_user(&db, "bob");
        add_user(&db, "alice");

        let found = db.get_user_by_id(&bob).unwrap().unwrap();
        assert_eq!(found.username, "bob");
        assert_eq!(found.email, "bob@example.com");
        assert!(db.get_user_by_username("carol").unwrap().is_none());

        let names: Vec<String> = db.list_users().unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn test_talks_are_symmetric_and_ordered() {
        let db = Database::open_in_memory().unwrap();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        let carol = add_user(&db, "carol");

        send(&db, &bob, &alice, "second", 20);
        send(&db, &alice, &bob, "first", 10);
        send(&db, &alice, &bob, "third", 30);
        send(&db, &alice, &carol, "elsewhere", 15);

        let from_alice: Vec<String> =
            db.get_talks_between(&alice, &bob).unwrap().into_iter().map(|t| t.message).collect();
        let from_bob: Vec<String> =
            db.get_talks_between(&bob, &alice).unwrap().into_iter().map(|t| t.message).collect();

        assert_eq!(from_alice, vec!["first", "second", "third"]);
        assert_eq!(from_alice, from_bob);
    }

    #[test]
    fn test_equal_times_keep_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");

        send(&db, &alice, &bob, "a", 0);
        send(&db, &bob, &alice, "b", 0);
        send(&db, &alice, &bob, "c", 0);

        let talks = db.get_talks_between(&bob, &alice).unwrap();
        let messages: Vec<&str> = talks.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
        assert_eq!(talks[1].sender_username, "bob");
    }

    #[test]
    fn test_talk_to_self_or_unknown_user_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let alice = add_user(&db, "alice");
        let ghost = Uuid::new_v4().to_string();

        let now = Utc::now();
        assert!(db.insert_talk(&Uuid::new_v4().to_string(), &alice, &alice, "me", now).is_err());
        assert!(db.insert_talk(&Uuid::new_v4().to_string(), &alice, &ghost, "boo", now).is_err());
        assert_eq!(db.count_talks().unwrap(), 0);
    }

    #[test]
    fn test_update_fields() {
        let db = Database::open_in_memory().unwrap();
        let alice = add_user(&db, "alice");
        add_user(&db, "bob");

        assert!(!db.update_username(&alice, "bob").unwrap());
        assert_eq!(db.get_user_by_id(&alice).unwrap().unwrap().username, "alice");

        assert!(db.update_username(&alice, "alicia").unwrap());
        db.update_email(&alice, "alicia@example.org").unwrap();
        db.update_password(&alice, "new-hash").unwrap();

        let row = db.get_user_by_id(&alice).unwrap().unwrap();
        assert_eq!(row.username, "alicia");
        assert_eq!(row.email, "alicia@example.org");
        assert_eq!(row.password, "new-hash");
    }
}
