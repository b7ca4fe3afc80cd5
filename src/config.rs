use std::env;

use actix_web::cookie::Key;
use thiserror::Error;

use crate::application::CheckoutMode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings read from the process environment (and `.env`).
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub session_key: Key,
    pub checkout_mode: CheckoutMode,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build the config from any variable source; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => 8080,
        };

        let checkout_mode = match lookup("CHECKOUT_MODE") {
            Some(raw) => raw
                .parse::<CheckoutMode>()
                .map_err(|reason| ConfigError::Invalid {
                    var: "CHECKOUT_MODE",
                    value: raw.clone(),
                    reason,
                })?,
            None => CheckoutMode::default(),
        };

        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(raw) => parse_bool("COOKIE_SECURE", &raw)?,
            None => false,
        };

        Ok(Self {
            database_url,
            host,
            port,
            session_key: session_key(lookup("SESSION_SECRET")),
            checkout_mode,
            cookie_secure,
        })
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

/// Cookie signing key. Sessions do not survive a restart when the key is
/// generated.
fn session_key(secret: Option<String>) -> Key {
    match secret.as_deref().map(|s| Key::try_from(s.as_bytes())) {
        Some(Ok(key)) => key,
        Some(Err(e)) => {
            log::warn!("SESSION_SECRET rejected ({e}); using a temporary session key");
            Key::generate()
        }
        None => {
            log::warn!("SESSION_SECRET not set; using a temporary session key");
            Key::generate()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| vars.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")]))
            .expect("config");
        assert_eq!(config.database_url, "postgres://x");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.checkout_mode, CheckoutMode::Sequential);
        assert!(!config.cookie_secure);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert_eq!(
            AppConfig::from_lookup(lookup(&[])).err(),
            Some(ConfigError::Missing("DATABASE_URL"))
        );
    }

    #[test]
    fn explicit_values_are_parsed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("CHECKOUT_MODE", "Atomic"),
            ("COOKIE_SECURE", "true"),
        ]))
        .expect("config");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.checkout_mode, CheckoutMode::Atomic);
        assert!(config.cookie_secure);
    }

    #[test]
    fn bad_port_names_the_variable() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("PORT", "eighty"),
        ]))
        .err()
        .expect("should fail");
        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
    }

    #[test]
    fn bad_checkout_mode_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("CHECKOUT_MODE", "eventually"),
        ]))
        .err()
        .expect("should fail");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "CHECKOUT_MODE",
                ..
            }
        ));
    }

    #[test]
    fn long_secret_is_used_as_key() {
        let secret = "s".repeat(64);
        let a = session_key(Some(secret.clone()));
        let b = session_key(Some(secret));
        assert_eq!(a.master(), b.master());
    }

    #[test]
    fn short_secret_falls_back_to_generated_key() {
        let a = session_key(Some("short".to_string()));
        let b = session_key(Some("short".to_string()));
        assert_ne!(a.master(), b.master());
    }
}
