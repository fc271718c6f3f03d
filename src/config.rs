use clap::Parser;
use ini::Ini;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::gate::DEFAULT_BLOCK_WINDOW;

pub const SECTION: &str = "dreamer";
pub const DEFAULT_SECRET: &str = "mellon";

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Arguments {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to configuration file",
        env = "DREAMER_CONFIG",
        default_value = "dreamer.ini"
    )]
    pub config_file: String,
}

#[derive(Debug, Clone)]
pub struct Configuration {
    /// Every named section found in the file, in file order.
    pub sections: Vec<String>,
    pub listen: SocketAddr,
    pub secret: String,
    pub idle_timeout: Option<Duration>,
    pub block_window: Duration,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
            listen: SocketAddr::from(([0, 0, 0, 0], 3000)),
            secret: DEFAULT_SECRET.to_string(),
            idle_timeout: None,
            block_window: DEFAULT_BLOCK_WINDOW,
        }
    }
}

impl Configuration {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        debug!("Loading configuration from file: {}", path.as_ref().display());
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(source)?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Configuration::default();

        for name in ini.sections().flatten() {
            info!("Config section: {}", name);
            config.sections.push(name.to_string());
        }

        if let Some(props) = ini.section(Some(SECTION)) {
            if let Some(listen) = props.get("listen") {
                config.listen = parse_value("listen", listen)?;
            }
            if let Some(secret) = props.get("secret") {
                config.secret = secret.to_string();
            }
            if let Some(secs) = props.get("idle_timeout") {
                config.idle_timeout =
                    Some(Duration::from_secs(parse_value("idle_timeout", secs)?));
            }
            if let Some(value) = props.get("block_minutes") {
                let minutes: u64 = parse_value("block_minutes", value)?;
                let secs = minutes
                    .checked_mul(60)
                    .ok_or_else(|| invalid("block_minutes", value))?;
                config.block_window = Duration::from_secs(secs);
            }
        }

        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: SECTION.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_enumerated_in_order() {
        let config = Configuration::parse(
            "top = level\n[alpha]\nkey = 1\n[beta]\n[dreamer]\nsecret = open sesame\n",
        )
        .unwrap();

        assert_eq!(config.sections, vec!["alpha", "beta", "dreamer"]);
        assert_eq!(config.secret, "open sesame");
    }

    #[test]
    fn test_defaults_without_dreamer_section() {
        let config = Configuration::parse("[game]\nport = 3001\n").unwrap();

        assert_eq!(config.listen, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.secret, DEFAULT_SECRET);
        assert_eq!(config.idle_timeout, None);
        assert_eq!(config.block_window, Duration::from_secs(300));
    }

    #[test]
    fn test_dreamer_overrides() {
        let config = Configuration::parse(
            "[dreamer]\nlisten = 127.0.0.1:4000\nidle_timeout = 30\nblock_minutes = 1\n",
        )
        .unwrap();

        assert_eq!(config.listen, "127.0.0.1:4000".parse().unwrap());
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.block_window, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_value() {
        let err = Configuration::parse("[dreamer]\nlisten = nowhere\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "listen"));
    }

    #[test]
    fn test_block_minutes_overflow() {
        let source = format!("[dreamer]\nblock_minutes = {}\n", u64::MAX / 60 + 1);
        let err = Configuration::parse(&source).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "block_minutes"));

        let source = format!("[dreamer]\nblock_minutes = {}\n", u64::MAX / 60);
        let config = Configuration::parse(&source).unwrap();
        assert_eq!(config.block_window.as_secs(), u64::MAX / 60 * 60);
    }

    #[test]
    fn test_missing_file() {
        let err = Configuration::load("/nonexistent/dreamer.ini").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
