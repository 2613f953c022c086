// file: src/config.rs
// description: logging and toolkit configuration with toml and environment support
// reference: https://docs.rs/config

use crate::error::{Result, UtilitiesError};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Handler threshold, spelled the way the agency's scripts have always
/// written levels (`WARNING` rather than `WARN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HandlerLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl HandlerLevel {
    pub fn as_tracing(self) -> Level {
        match self {
            HandlerLevel::Debug => Level::DEBUG,
            HandlerLevel::Info => Level::INFO,
            HandlerLevel::Warning => Level::WARN,
            HandlerLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    #[serde(default)]
    pub toolkit: ToolkitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub directory_name: String,
    pub file_name: String,
    pub console_level: HandlerLevel,
    pub file: FileHandlerConfig,
    pub email: EmailHandlerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileHandlerConfig {
    pub level: HandlerLevel,
    pub max_bytes: u64,
    pub backup_count: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailHandlerConfig {
    pub enabled: bool,
    pub level: HandlerLevel,
    pub mail_host: String,
    pub port: u16,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolkitConfig {
    pub install_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory_name: "logs".to_string(),
            file_name: "log.log".to_string(),
            console_level: HandlerLevel::Debug,
            file: FileHandlerConfig {
                level: HandlerLevel::Info,
                max_bytes: 10 * 1_024 * 1_024,
                backup_count: 3,
            },
            email: EmailHandlerConfig {
                enabled: true,
                level: HandlerLevel::Warning,
                mail_host: "mail.dnr.wa.gov".to_string(),
                port: 25,
                from: "jason.hildreth@dnr.wa.gov".to_string(),
                to: vec!["jason.hildreth@dnr.wa.gov".to_string()],
                subject: "Script Update".to_string(),
                timeout_secs: 10,
            },
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new(DEFAULT_CONFIG_PATH)));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("WADNR_UTILITIES")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("logging.email.to")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| UtilitiesError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| UtilitiesError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            logging: LoggingConfig::default(),
            toolkit: ToolkitConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.logging.validate()
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.directory_name.trim().is_empty() {
            return Err(UtilitiesError::Config(
                "directory_name must not be empty".to_string(),
            ));
        }

        if self.file_name.trim().is_empty() {
            return Err(UtilitiesError::Config(
                "file_name must not be empty".to_string(),
            ));
        }

        let email = &self.email;
        if email.enabled {
            if email.mail_host.trim().is_empty() {
                return Err(UtilitiesError::Config(
                    "email.mail_host must not be empty when email is enabled".to_string(),
                ));
            }
            if email.from.trim().is_empty() {
                return Err(UtilitiesError::Config(
                    "email.from must not be empty when email is enabled".to_string(),
                ));
            }
            if email.to.is_empty() {
                return Err(UtilitiesError::Config(
                    "email.to needs at least one recipient when email is enabled".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_agency_settings() {
        let config = Config::default_config();
        assert_eq!(config.logging.directory_name, "logs");
        assert_eq!(config.logging.file_name, "log.log");
        assert_eq!(config.logging.file.max_bytes, 10_485_760);
        assert_eq!(config.logging.file.backup_count, 3);
        assert_eq!(config.logging.email.mail_host, "mail.dnr.wa.gov");
        assert_eq!(config.logging.email.subject, "Script Update");
        assert_eq!(config.logging.console_level, HandlerLevel::Debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_level_names_deserialize() {
        let level: HandlerLevel = serde_json::from_str("\"WARNING\"").unwrap();
        assert_eq!(level, HandlerLevel::Warning);
        assert_eq!(level.as_tracing(), Level::WARN);
        assert!(serde_json::from_str::<HandlerLevel>("\"WARN\"").is_err());
    }

    #[test]
    fn test_validation_rejects_missing_recipients() {
        let mut config = Config::default_config();
        config.logging.email.to.clear();
        assert!(matches!(config.validate(), Err(UtilitiesError::Config(_))));

        config.logging.email.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_file_name() {
        let mut config = Config::default_config();
        config.logging.file_name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[logging]
directory_name = "logs"
file_name = "run.log"
console_level = "INFO"

[logging.file]
level = "INFO"
max_bytes = 2048
backup_count = 5

[logging.email]
enabled = false
level = "ERROR"
mail_host = "localhost"
port = 2525
from = "gis@example.org"
to = ["ops@example.org"]
subject = "Nightly batch"
timeout_secs = 5

[toolkit]
install_dir = "/opt/arcgis"
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.logging.file_name, "run.log");
        assert_eq!(config.logging.file.backup_count, 5);
        assert_eq!(config.logging.email.level, HandlerLevel::Error);
        assert!(!config.logging.email.enabled);
        assert_eq!(
            config.toolkit.install_dir.as_deref(),
            Some(Path::new("/opt/arcgis"))
        );
    }
}
