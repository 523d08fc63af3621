//! Database row types. These map directly to SQLite rows and are kept apart
//! from the talkroom-types models so the storage layer stays independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

pub struct TalkRow {
    pub id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub receiver_id: String,
    pub message: String,
    pub time: String,
}
