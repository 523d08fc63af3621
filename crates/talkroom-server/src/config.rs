use std::ops::RangeInclusive;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use talkroom_web::session::SessionSettings;

/// Placeholder secrets that MUST NOT be used to sign sessions.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "dev-secret-change-me", "secret"];

/// Session lifetimes outside this window either expire on issue or overflow
/// the token expiry arithmetic.
const SESSION_DAYS_RANGE: RangeInclusive<i64> = 1..=3650;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub secret: String,
    pub session: SessionSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret = var("TALKROOM_SECRET").unwrap_or_default();
        if secret.is_empty() || PLACEHOLDER_SECRETS.contains(&secret.as_str()) {
            bail!("TALKROOM_SECRET is unset or still a placeholder; set it in your environment or .env");
        }

        let host = var("TALKROOM_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("TALKROOM_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("TALKROOM_PORT must be a port number")?;
        let db_path = var("TALKROOM_DB_PATH")
            .unwrap_or_else(|| "talkroom.db".into())
            .into();

        let defaults = SessionSettings::default();
        let lifetime_days = match var("TALKROOM_SESSION_DAYS") {
            Some(days) => days.parse().context("TALKROOM_SESSION_DAYS must be a whole number")?,
            None => defaults.lifetime_days,
        };
        if !SESSION_DAYS_RANGE.contains(&lifetime_days) {
            bail!(
                "TALKROOM_SESSION_DAYS must be between {} and {}, got {}",
                SESSION_DAYS_RANGE.start(),
                SESSION_DAYS_RANGE.end(),
                lifetime_days
            );
        }
        let secure_cookies = var("TALKROOM_SECURE_COOKIES")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.secure_cookies);

        Ok(Self {
            host,
            port,
            db_path,
            secret,
            session: SessionSettings {
                lifetime_days,
                secure_cookies,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("TALKROOM_SECRET", "a-long-random-value")]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_path, PathBuf::from("talkroom.db"));
        assert_eq!(cfg.session.lifetime_days, 14);
        assert!(!cfg.session.secure_cookies);
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("TALKROOM_SECRET", "a-long-random-value"),
            ("TALKROOM_PORT", "8080"),
            ("TALKROOM_SESSION_DAYS", "2"),
            ("TALKROOM_SECURE_COOKIES", "TRUE"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.session.lifetime_days, 2);
        assert!(cfg.session.secure_cookies);
    }

    #[test]
    fn test_rejects_missing_or_placeholder_secret() {
        assert!(config(&[]).is_err());
        assert!(config(&[("TALKROOM_SECRET", "dev-secret-change-me")]).is_err());
        assert!(config(&[("TALKROOM_SECRET", "x"), ("TALKROOM_PORT", "http")]).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_session_days() {
        for days in ["0", "-3", "999999999999"] {
            let result = config(&[("TALKROOM_SECRET", "a-long-random-value"), ("TALKROOM_SESSION_DAYS", days)]);
            assert!(result.is_err(), "{} days should be rejected", days);
        }
        let cfg = config(&[("TALKROOM_SECRET", "a-long-random-value"), ("TALKROOM_SESSION_DAYS", "3650")]).unwrap();
        assert_eq!(cfg.session.lifetime_days, 3650);
    }
}
