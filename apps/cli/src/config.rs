use std::path::Path;

use serde::Deserialize;
use zunder_terminology::config::default_connect_timeout_seconds;
use zunder_terminology::{ServerConfig, TerminologyConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub loinc: Option<ServerConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Default)]
pub struct Overrides<'a> {
    pub base_url: Option<&'a str>,
    pub loinc_base_url: Option<&'a str>,
}

impl Config {
    pub fn load(config_file: Option<&Path>, overrides: Overrides<'_>) -> anyhow::Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let file_source = match config_file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("tx").required(false),
        };

        let config = config::Config::builder()
            .set_default(
                "server.connect_timeout_seconds",
                default_connect_timeout_seconds(),
            )?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.json", false)?
            .add_source(file_source)
            // Example: TX__SERVER__BASE_URL → config.server.base_url
            .add_source(
                config::Environment::with_prefix("TX")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.base_url", overrides.base_url)?
            .set_override_option("loinc.base_url", overrides.loinc_base_url)?
            .build()?;

        let config: Self = config.try_deserialize()?;
        Ok(config)
    }

    pub fn terminology(&self) -> TerminologyConfig {
        TerminologyConfig {
            server: self.server.clone(),
            loinc: self.loinc.clone(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.terminology().validate().map_err(|e| e.to_string())?;

        let level = self.logging.level.to_ascii_lowercase();
        if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            return Err(format!(
                "logging.level must be one of trace, debug, info, warn, error (got '{}')",
                self.logging.level
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str, level: &str) -> Config {
        Config {
            server: ServerConfig::new(base_url),
            loinc: None,
            logging: LoggingConfig {
                level: level.to_string(),
                json: false,
            },
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(config("https://ontology.example.org/fhir", "warn")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_base_url() {
        let err = config("", "warn").validate().unwrap_err();
        assert!(err.contains("server.base_url"));
    }

    #[test]
    fn test_validate_rejects_unknown_level() {
        assert!(config("https://ontology.example.org/fhir", "loud")
            .validate()
            .is_err());
    }
}
