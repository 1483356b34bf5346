//! Configuration management
//!
//! Everything comes from the environment (a local `.env` is read by `dotenvy`
//! in `main`). Only the bot token is required; the rest defaults to values
//! that suit a single-group deployment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::imaging;
use crate::ocr::OcrBackend;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub ocr: OcrConfig,
    pub imaging: ImagingConfig,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API token (required).
    pub token: String,
    /// Chat whose photos are ingested. `None` accepts photos from any chat.
    pub group_chat_id: Option<i64>,
    /// User ids allowed to request reports. Empty disables `/report`.
    pub admin_user_ids: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the liveness endpoint.
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Path of the registry JSON file.
    pub data_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Recognition backends in priority order.
    pub backends: Vec<OcrBackend>,
    /// Language spec handed to the recognizer, e.g. `eng+rus`.
    pub languages: String,
    /// Endpoint of the remote recognition service, if that backend is enabled.
    pub remote_url: String,
}

#[derive(Debug, Clone)]
pub struct ImagingConfig {
    pub contrast: f32,
    pub binarize: bool,
    pub binarize_threshold: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig {
                token: String::new(),
                group_chat_id: None,
                admin_user_ids: Vec::new(),
            },
            server: ServerConfig { port: 10000 },
            registry: RegistryConfig {
                data_file: PathBuf::from("device_data.json"),
            },
            ocr: OcrConfig {
                backends: vec![OcrBackend::Tesseract],
                languages: "eng+rus".to_string(),
                remote_url: String::new(),
            },
            imaging: ImagingConfig {
                contrast: imaging::CONTRAST_FACTOR,
                binarize: false,
                binarize_threshold: imaging::BINARIZE_THRESHOLD,
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN is not set")]
    MissingToken,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let token = env::var("BOT_TOKEN").map_err(|_| ConfigError::MissingToken)?;

        Ok(Config {
            telegram: TelegramConfig {
                token,
                group_chat_id: env::var("GROUP_CHAT_ID").ok().and_then(|v| parse_or_warn("GROUP_CHAT_ID", &v)),
                admin_user_ids: env::var("ADMIN_USER_IDS")
                    .map(|v| parse_id_list(&v))
                    .unwrap_or_default(),
            },
            server: ServerConfig {
                port: env_parsed("PORT", defaults.server.port),
            },
            registry: RegistryConfig {
                data_file: env::var("DATA_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.registry.data_file),
            },
            ocr: OcrConfig {
                backends: env::var("OCR_BACKENDS")
                    .map(|v| parse_backend_list(&v))
                    .unwrap_or(defaults.ocr.backends),
                languages: env::var("OCR_LANGUAGES").unwrap_or(defaults.ocr.languages),
                remote_url: env::var("OCR_REMOTE_URL").unwrap_or(defaults.ocr.remote_url),
            },
            imaging: ImagingConfig {
                contrast: env_parsed("IMAGE_CONTRAST", defaults.imaging.contrast),
                binarize: env_parsed("IMAGE_BINARIZE", defaults.imaging.binarize),
                binarize_threshold: env_parsed("IMAGE_BINARIZE_THRESHOLD", defaults.imaging.binarize_threshold),
            },
        })
    }
}

/// Read and parse a variable, falling back to `default` when it is absent
/// or malformed. Malformed values are logged, never fatal.
fn env_parsed<T: FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(value) => parse_or_warn(name, &value).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_or_warn<T: FromStr>(name: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(%name, %value, "ignoring unparsable value");
            None
        }
    }
}

/// Parse a comma-separated list of numeric user ids.
pub fn parse_id_list(raw: &str) -> Vec<u64> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| parse_or_warn("ADMIN_USER_IDS", part))
        .collect()
}

/// Parse a comma-separated list of backend names.
pub fn parse_backend_list(raw: &str) -> Vec<OcrBackend> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| match OcrBackend::parse(part) {
            Some(backend) => Some(backend),
            None => {
                tracing::warn!(backend = %part, "ignoring unknown OCR backend");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 10000);
        assert_eq!(config.registry.data_file, PathBuf::from("device_data.json"));
        assert_eq!(config.ocr.backends, vec![OcrBackend::Tesseract]);
        assert_eq!(config.ocr.languages, "eng+rus");
        assert!(config.telegram.admin_user_ids.is_empty());
        assert!(config.telegram.group_chat_id.is_none());
    }

    #[test]
    fn parses_id_lists_with_noise() {
        assert_eq!(parse_id_list("123, 456"), vec![123, 456]);
        assert_eq!(parse_id_list(" 7 "), vec![7]);
        assert_eq!(parse_id_list("1,junk,2"), vec![1, 2]);
        assert!(parse_id_list("").is_empty());
    }

    #[test]
    fn parses_backend_lists() {
        assert_eq!(
            parse_backend_list("tesseract, remote"),
            vec![OcrBackend::Tesseract, OcrBackend::Remote]
        );
        assert_eq!(parse_backend_list("nonsense"), Vec::<OcrBackend>::new());
    }
}
