//! Gateway configuration from the environment

use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8081;
const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_NOTIFY_QUEUE: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `USSD_PORT`
    pub port: u16,
    /// `USSD_SESSION_TTL_SECS`: age after which the sweep drops a session
    pub session_ttl: Duration,
    /// `USSD_SWEEP_INTERVAL_SECS`
    pub sweep_interval: Duration,
    /// `USSD_NOTIFY_QUEUE`: notifications buffered before new ones are dropped
    pub notify_queue: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            session_ttl: DEFAULT_SESSION_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            notify_queue: DEFAULT_NOTIFY_QUEUE,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their default
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match get("USSD_PORT") {
            Some(v) => parse(&v, "USSD_PORT", "a port number")?,
            None => defaults.port,
        };
        let session_ttl = match get("USSD_SESSION_TTL_SECS") {
            Some(v) => secs(&v, "USSD_SESSION_TTL_SECS")?,
            None => defaults.session_ttl,
        };
        let sweep_interval = match get("USSD_SWEEP_INTERVAL_SECS") {
            Some(v) => secs(&v, "USSD_SWEEP_INTERVAL_SECS")?,
            None => defaults.sweep_interval,
        };
        let notify_queue = match get("USSD_NOTIFY_QUEUE") {
            Some(v) => match parse::<usize>(&v, "USSD_NOTIFY_QUEUE", "a positive integer")? {
                0 => return Err(invalid("USSD_NOTIFY_QUEUE", "a positive integer", &v)),
                n => n,
            },
            None => defaults.notify_queue,
        };

        Ok(Self {
            port,
            session_ttl,
            sweep_interval,
            notify_queue,
        })
    }
}

fn parse<T: std::str::FromStr>(
    value: &str,
    var: &'static str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(var, expected, value))
}

fn secs(value: &str, var: &'static str) -> Result<Duration, ConfigError> {
    match parse::<u64>(value, var, "a positive number of seconds")? {
        0 => Err(invalid(var, "a positive number of seconds", value)),
        n => Ok(Duration::from_secs(n)),
    }
}

fn invalid(var: &'static str, expected: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        expected,
        value: value.to_string(),
    }
}
