//! Environment-variable configuration loading.

use std::env;

use crate::error::ConfigError;
use crate::schema::Config;

fn read_string(var: &'static str, default: &str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::Empty { var }),
        Ok(value) => Ok(value),
        Err(env::VarError::NotPresent) => Ok(default.to_string()),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue {
            var,
            value: "<non-utf8>".to_string(),
            expected: "a UTF-8 string",
        }),
    }
}

fn read_parsed<T>(var: &'static str, default: T, expected: &'static str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(var) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            var,
            value,
            expected,
        }),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue {
            var,
            value: "<non-utf8>".to_string(),
            expected,
        }),
    }
}

impl Config {
    /// Loads configuration from the process environment, falling back to the
    /// defaults documented on each field for anything unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a set variable cannot be parsed as its
    /// expected type, or a string variable is set but empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            store_url: read_string("STORE_URL", &defaults.store_url)?,
            log_level: read_string("LOG_LEVEL", &defaults.log_level)?,
            heartbeat_timeout_secs: read_parsed(
                "HEARTBEAT_TIMEOUT",
                defaults.heartbeat_timeout_secs,
                "a positive integer number of seconds",
            )?,
            monitor_interval_secs: read_parsed(
                "MONITOR_INTERVAL",
                defaults.monitor_interval_secs,
                "a positive integer number of seconds",
            )?,
            status_dir: read_string("STATUS_DIR", &defaults.status_dir)?,
            max_queue_len: read_parsed(
                "MAX_QUEUE_LEN",
                defaults.max_queue_len,
                "a positive integer",
            )?,
            recent_changes_cap: read_parsed(
                "RECENT_CHANGES_CAP",
                defaults.recent_changes_cap,
                "a positive integer",
            )?,
            store_reconnect_deadline_secs: read_parsed(
                "STORE_RECONNECT_DEADLINE",
                defaults.store_reconnect_deadline_secs,
                "a positive integer number of seconds",
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_when_unset() {
        for var in [
            "STORE_URL",
            "LOG_LEVEL",
            "HEARTBEAT_TIMEOUT",
            "MONITOR_INTERVAL",
            "STATUS_DIR",
            "MAX_QUEUE_LEN",
            "RECENT_CHANGES_CAP",
            "STORE_RECONNECT_DEADLINE",
        ] {
            unsafe { env::remove_var(var) };
        }
        let config = Config::from_env().expect("defaults load cleanly");
        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn rejects_unparsable_integer() {
        unsafe { env::set_var("HEARTBEAT_TIMEOUT", "not-a-number") };
        let err = Config::from_env().expect_err("should fail");
        assert!(matches!(err, ConfigError::InvalidValue { var: "HEARTBEAT_TIMEOUT", .. }));
        unsafe { env::remove_var("HEARTBEAT_TIMEOUT") };
    }

    #[test]
    #[serial]
    fn rejects_empty_string_override() {
        unsafe { env::set_var("STORE_URL", "") };
        let err = Config::from_env().expect_err("should fail");
        assert!(matches!(err, ConfigError::Empty { var: "STORE_URL" }));
        unsafe { env::remove_var("STORE_URL") };
    }
}
