use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

use crate::config::ApplicationSettings;

/// Subscriber settings derived from `[application]`.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `commission_ledger=debug`.
    pub level: String,
    pub format: LogFormat,
    /// Adds source file and line to every event.
    pub with_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            with_location: false,
        }
    }
}

impl From<&ApplicationSettings> for LogConfig {
    fn from(settings: &ApplicationSettings) -> Self {
        Self {
            level: settings.log_level.clone(),
            format: LogFormat::from(settings.log_format.as_str()),
            with_location: settings.log_level.eq_ignore_ascii_case("trace"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    /// One JSON object per event; ledger spans are reported when they close.
    Json,
    Compact,
}

impl From<&str> for LogFormat {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over
/// `config.level`. Fails if a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let location = config.with_location;

    let json = (config.format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_file(location)
            .with_line_number(location)
            .with_span_events(FmtSpan::CLOSE)
    });
    let compact = (config.format == LogFormat::Compact).then(|| {
        fmt::layer()
            .compact()
            .with_file(location)
            .with_line_number(location)
    });
    let pretty = (config.format == LogFormat::Pretty).then(|| {
        fmt::layer()
            .pretty()
            .with_file(location)
            .with_line_number(location)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(compact)
        .with(pretty)
        .try_init()?;

    tracing::info!(level = %config.level, format = ?config.format, "Logging initialized");
    Ok(())
}

/// Masks the local part of an e-mail address, e.g. `pl***r1@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => format!("{}@{}", mask_sensitive(local, 2), domain),
        None => mask_sensitive(email, 2),
    }
}

/// Masks the middle of a string, keeping `visible_chars` at each end.
pub fn mask_sensitive(value: &str, visible_chars: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= visible_chars * 2 {
        return "*".repeat(chars.len());
    }

    let prefix: String = chars[..visible_chars].iter().collect();
    let suffix: String = chars[chars.len() - visible_chars..].iter().collect();
    let masked_len = chars.len() - (visible_chars * 2);

    format!("{}{}{}", prefix, "*".repeat(masked_len), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_sensitive_short_string() {
        assert_eq!(mask_sensitive("abc", 2), "***");
    }

    #[test]
    fn test_mask_sensitive_long_string() {
        assert_eq!(mask_sensitive("1234567890", 2), "12******90");
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("player1@example.com"), "pl***r1@example.com");
        assert_eq!(mask_email("ab@example.com"), "**@example.com");
        assert_eq!(mask_email("not-an-email"), "no********il");
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!(LogFormat::from("json"), LogFormat::Json);
        assert_eq!(LogFormat::from("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from(" compact "), LogFormat::Compact);
        assert_eq!(LogFormat::from("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::from("unknown"), LogFormat::Pretty);
    }

    #[test]
    fn test_log_config_from_settings() {
        let settings = ApplicationSettings {
            log_level: "debug".to_string(),
            log_format: "json".to_string(),
        };

        let config = LogConfig::from(&settings);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.with_location);
    }
}
