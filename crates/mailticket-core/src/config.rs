//! Process configuration read from the environment.

use std::fmt;

use mailticket_imap::DEFAULT_PORT;
use thiserror::Error;

/// Account address used for LOGIN.
pub const ENV_EMAIL: &str = "EMAIL";
/// Account secret used for LOGIN.
pub const ENV_PASSWORD: &str = "EMAIL_PASSWORD";
/// Ticket webhook endpoint.
pub const ENV_WEBHOOK_URL: &str = "WEBHOOK_URL";
/// IMAP server host name.
pub const ENV_IMAP_SERVER: &str = "IMAP_SERVER";
/// Optional IMAP port override.
pub const ENV_IMAP_PORT: &str = "IMAP_PORT";

/// Startup configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more required variables are unset or empty.
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    /// `IMAP_PORT` is not a valid port number.
    #[error("invalid IMAP_PORT {0:?}: expected a number between 1 and 65535")]
    InvalidPort(String),
}

/// Everything a run needs, built once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Mailbox account address.
    pub email: String,
    /// Mailbox account secret.
    pub password: String,
    /// Ticket webhook URL as configured.
    pub webhook_url: String,
    /// IMAP server host name.
    pub imap_server: String,
    /// IMAP server port (implicit TLS).
    pub imap_port: u16,
}

impl Config {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] naming every required variable that
    /// is unset or empty, or [`ConfigError::InvalidPort`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut required = |name: &'static str| {
            let value = lookup(name).filter(|v| !v.trim().is_empty());
            if value.is_none() {
                missing.push(name);
            }
            value.unwrap_or_default()
        };

        let email = required(ENV_EMAIL);
        let password = required(ENV_PASSWORD);
        let webhook_url = required(ENV_WEBHOOK_URL);
        let imap_server = required(ENV_IMAP_SERVER);

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let imap_port = match lookup(ENV_IMAP_PORT).filter(|v| !v.trim().is_empty()) {
            None => DEFAULT_PORT,
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|&port| port != 0)
                .ok_or(ConfigError::InvalidPort(raw))?,
        };

        Ok(Self {
            email,
            password,
            webhook_url: webhook_url.trim().to_string(),
            imap_server: imap_server.trim().to_string(),
            imap_port,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("webhook_url", &self.webhook_url)
            .field("imap_server", &self.imap_server)
            .field("imap_port", &self.imap_port)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const COMPLETE: &[(&str, &str)] = &[
        ("EMAIL", "support@example.com"),
        ("EMAIL_PASSWORD", "hunter2"),
        ("WEBHOOK_URL", "https://desk.example.com/hook"),
        ("IMAP_SERVER", "imap.example.com"),
    ];

    #[test]
    fn test_complete_config() {
        let config = Config::from_lookup(lookup_from(COMPLETE)).unwrap();
        assert_eq!(config.email, "support@example.com");
        assert_eq!(config.imap_server, "imap.example.com");
        assert_eq!(config.imap_port, 993);
    }

    #[test]
    fn test_all_missing_reported_together() {
        let err = Config::from_lookup(lookup_from(&[("EMAIL", "a@example.com")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing(vec!["EMAIL_PASSWORD", "WEBHOOK_URL", "IMAP_SERVER"])
        );
        assert_eq!(
            err.to_string(),
            "missing required environment variables: EMAIL_PASSWORD, WEBHOOK_URL, IMAP_SERVER"
        );
    }

    #[test]
    fn test_empty_counts_as_missing() {
        let mut pairs = COMPLETE.to_vec();
        pairs[1] = ("EMAIL_PASSWORD", "  ");
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::Missing(vec!["EMAIL_PASSWORD"]));
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let mut pairs = COMPLETE.to_vec();
        pairs[2] = ("WEBHOOK_URL", " http://desk.example.com/hook\n");
        pairs[3] = ("IMAP_SERVER", "\timap.example.com ");
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.webhook_url, "http://desk.example.com/hook");
        assert_eq!(config.imap_server, "imap.example.com");
    }

    #[test]
    fn test_port_override() {
        let mut pairs = COMPLETE.to_vec();
        pairs.push(("IMAP_PORT", "1993"));
        assert_eq!(Config::from_lookup(lookup_from(&pairs)).unwrap().imap_port, 1993);

        pairs.pop();
        pairs.push(("IMAP_PORT", "imaps"));
        assert!(matches!(
            Config::from_lookup(lookup_from(&pairs)),
            Err(ConfigError::InvalidPort(_))
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = Config::from_lookup(lookup_from(COMPLETE)).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
