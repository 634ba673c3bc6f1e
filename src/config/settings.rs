use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;

use crate::message::Platform;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    /// Platform application ARN per platform tag (`apns`, `apns_voip`, `fcm`, `gcm`, `adm`)
    #[serde(default)]
    pub platforms: BTreeMap<String, String>,
    /// Log messages instead of publishing them
    #[serde(default)]
    pub debug: bool,
    /// Maximum number of publishes in flight during a broadcast
    #[serde(default = "default_max_concurrent_sends")]
    pub max_concurrent_sends: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_max_concurrent_sends() -> usize {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("push.debug", false)?
            .set_default("push.max_concurrent_sends", 50)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // PUSH__DEBUG, PUSH__PLATFORMS__APNS, LOGGING__FORMAT, etc.
            .add_source(Environment::default().separator("__").try_parsing(true));

        builder.build()?.try_deserialize()
    }
}

impl PushConfig {
    /// Application ARN configured for a platform
    pub fn application_arn(&self, platform: Platform) -> Option<&str> {
        self.platforms
            .iter()
            .find(|(tag, _)| Platform::from_tag(tag) == Some(platform))
            .map(|(_, arn)| arn.as_str())
    }

    /// Configured platforms with their application ARNs, unknown tags skipped
    pub fn applications(&self) -> Vec<(Platform, &str)> {
        self.platforms
            .iter()
            .filter_map(|(tag, arn)| Platform::from_tag(tag).map(|platform| (platform, arn.as_str())))
            .collect()
    }

    /// Tags that do not name a known platform
    pub fn unknown_platforms(&self) -> Vec<&str> {
        self.platforms
            .keys()
            .filter(|tag| Platform::from_tag(tag).is_none())
            .map(String::as_str)
            .collect()
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            platforms: BTreeMap::new(),
            debug: false,
            max_concurrent_sends: default_max_concurrent_sends(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert!(!settings.push.debug);
        assert_eq!(settings.push.max_concurrent_sends, 50);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_application_lookup() {
        let mut push = PushConfig::default();
        push.platforms
            .insert("apns".to_string(), "arn:app/APNS/ios".to_string());
        push.platforms
            .insert("GCM".to_string(), "arn:app/GCM/android".to_string());
        push.platforms
            .insert("wns".to_string(), "arn:app/WNS/windows".to_string());

        assert_eq!(push.application_arn(Platform::Apns), Some("arn:app/APNS/ios"));
        assert_eq!(push.application_arn(Platform::Gcm), Some("arn:app/GCM/android"));
        assert_eq!(push.application_arn(Platform::Adm), None);
        assert_eq!(push.applications().len(), 2);
        assert_eq!(push.unknown_platforms(), vec!["wns"]);
    }

    #[test]
    fn test_deserialize_from_json() {
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "push": {
                "platforms": {"adm": "arn:app/ADM/fire"},
                "debug": true
            },
            "logging": {"format": "json"}
        }))
        .unwrap();

        assert!(settings.push.debug);
        assert_eq!(settings.push.max_concurrent_sends, 50);
        assert_eq!(settings.push.application_arn(Platform::Adm), Some("arn:app/ADM/fire"));
        assert_eq!(settings.logging.format, LogFormat::Json);
    }
}
