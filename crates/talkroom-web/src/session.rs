use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use talkroom_types::forms::Claims;

pub const COOKIE_NAME: &str = "talkroom_session";

/// How session cookies are issued.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub lifetime_days: i64,
    pub secure_cookies: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            lifetime_days: 14,
            secure_cookies: false,
        }
    }
}

/// Digest tying a session to the password hash it was issued under.
pub fn session_auth_hash(secret: &str, password_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update([0u8]);
    hasher.update(password_hash.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..32].to_string()
}

pub fn create_token(
    secret: &str,
    settings: &SessionSettings,
    user_id: Uuid,
    username: &str,
    password_hash: &str,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        auth: session_auth_hash(secret, password_hash),
        exp: (chrono::Utc::now() + chrono::Duration::days(settings.lifetime_days)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Signature and expiry check only; the caller still has to match `auth`
/// against the current password hash.
pub fn decode_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

pub fn session_cookie(token: String, settings: &SessionSettings) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure_cookies)
        .max_age(time::Duration::days(settings.lifetime_days))
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip_carries_auth_hash() {
        let settings = SessionSettings::default();
        let id = Uuid::new_v4();
        let token = create_token("secret", &settings, id, "alice", "$argon2id$hash").unwrap();

        let claims = decode_token("secret", &token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.auth, session_auth_hash("secret", "$argon2id$hash"));

        assert!(decode_token("other-secret", &token).is_none());
        assert!(decode_token("secret", "garbage").is_none());
    }

    #[test]
    fn test_auth_hash_changes_with_password() {
        let before = session_auth_hash("secret", "hash-one");
        assert_eq!(before.len(), 32);
        assert_eq!(before, session_auth_hash("secret", "hash-one"));
        assert_ne!(before, session_auth_hash("secret", "hash-two"));
        assert_ne!(before, session_auth_hash("another", "hash-one"));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let settings = SessionSettings {
            lifetime_days: -1,
            secure_cookies: false,
        };
        let token = create_token("secret", &settings, Uuid::new_v4(), "alice", "hash").unwrap();
        assert!(decode_token("secret", &token).is_none());
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("tok".into(), &SessionSettings::default());
        assert_eq!(cookie.name(), COOKIE_NAME);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(14)));
    }

    #[test]
    fn test_secure_cookie_setting() {
        let settings = SessionSettings {
            lifetime_days: 1,
            secure_cookies: true,
        };
        let cookie = session_cookie("tok".into(), &settings);
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(1)));

        let plain = session_cookie("tok".into(), &SessionSettings::default());
        assert_ne!(plain.secure(), Some(true));
    }
}
