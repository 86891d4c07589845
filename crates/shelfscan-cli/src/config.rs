//! TOML configuration file for the `shelfscan` binary.
//!
//! Every key is optional; missing keys take the library defaults.
//!
//! ```toml
//! [api]
//! base_url = "http://127.0.0.1:5000/api"
//! timeout_ms = 30000
//!
//! [scanner]
//! refresh_rate_hz = 60
//! auto_lookup = true
//! max_retries = 3
//! tolerate_polarity = false
//!
//! [camera]
//! facing = "environment"
//! width = 1280
//! height = 720
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use shelfscan_camera::{CaptureConstraints, Facing};
use shelfscan_core::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_IDEAL_HEIGHT, DEFAULT_IDEAL_WIDTH, DEFAULT_LOOKUP_TIMEOUT_MS,
    DEFAULT_MAX_RETRIES, DEFAULT_REFRESH_RATE_HZ,
};
use shelfscan_decoder::DecodeOptions;
use shelfscan_lookup::LookupClientConfig;
use shelfscan_scanner::ScannerConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api: ApiConfig,
    pub scanner: ScannerSection,
    pub camera: CameraSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Inventory API root, without the lookup path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-lookup timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Bearer token, if the API wants one
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScannerSection {
    #[serde(default = "default_refresh_rate_hz")]
    pub refresh_rate_hz: u32,

    #[serde(default = "default_auto_lookup")]
    pub auto_lookup: bool,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Also accept light-on-dark symbols
    #[serde(default)]
    pub tolerate_polarity: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraSection {
    #[serde(default)]
    pub facing: Facing,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,
}

impl FileConfig {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: FileConfig = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        debug!(path = %path.display(), ?config, "Configuration loaded");
        Ok(config)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms)
    }

    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig::default()
            .constraints(
                CaptureConstraints::default()
                    .with_facing(self.camera.facing)
                    .with_ideal_resolution(self.camera.width, self.camera.height),
            )
            .decode(DecodeOptions::default().with_tolerate_polarity(self.scanner.tolerate_polarity))
            .lookup_timeout(self.lookup_timeout())
            .refresh_rate_hz(self.scanner.refresh_rate_hz)
            .auto_lookup(self.scanner.auto_lookup)
            .max_retries(self.scanner.max_retries)
    }

    pub fn lookup_config(&self) -> LookupClientConfig {
        let config = LookupClientConfig::new(self.api.base_url.clone()).timeout(self.lookup_timeout());
        match &self.api.auth_token {
            Some(token) => config.auth_token(token.clone()),
            None => config,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            auth_token: None,
        }
    }
}

impl Default for ScannerSection {
    fn default() -> Self {
        Self {
            refresh_rate_hz: default_refresh_rate_hz(),
            auto_lookup: default_auto_lookup(),
            max_retries: default_max_retries(),
            tolerate_polarity: false,
        }
    }
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            facing: Facing::default(),
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_LOOKUP_TIMEOUT_MS
}

fn default_refresh_rate_hz() -> u32 {
    DEFAULT_REFRESH_RATE_HZ
}

fn default_auto_lookup() -> bool {
    true
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_width() -> u32 {
    DEFAULT_IDEAL_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_IDEAL_HEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();

        assert_eq!(config, FileConfig::default());
        assert_eq!(config.scanner_config(), ScannerConfig::default());
        assert_eq!(config.lookup_config(), LookupClientConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let config: FileConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://inventory.example/api"
            timeout_ms = 5000
            auth_token = "s3cret"

            [scanner]
            auto_lookup = false
            tolerate_polarity = true

            [camera]
            facing = "user"
            "#,
        )
        .unwrap();

        let scanner = config.scanner_config();
        assert!(!scanner.auto_lookup);
        assert!(scanner.decode.tolerate_polarity);
        assert_eq!(scanner.max_retries, 3);
        assert_eq!(scanner.lookup_timeout, Duration::from_secs(5));
        assert_eq!(scanner.constraints.facing, Facing::User);
        assert_eq!(scanner.constraints.ideal_resolution.width, 1280);
        assert!(scanner.validate().is_ok());

        let lookup = config.lookup_config();
        assert_eq!(lookup.base_url, "https://inventory.example/api");
        assert_eq!(lookup.timeout, Duration::from_secs(5));
        assert_eq!(lookup.auth_token.as_deref(), Some("s3cret"));
    }

    #[rstest]
    #[case::unknown_section("[printer]\nport = 1\n")]
    #[case::unknown_scanner_key("[scanner]\nrefresh = 30\n")]
    #[case::unknown_api_key("[api]\nurl = \"http://x\"\n")]
    #[case::bad_facing("[camera]\nfacing = \"sideways\"\n")]
    fn test_invalid_file_rejected(#[case] text: &str) {
        let result: Result<FileConfig, _> = toml::from_str(text);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scanner]\nrefresh_rate_hz = 30").unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.scanner.refresh_rate_hz, 30);
    }

    #[test]
    fn test_load_missing_file() {
        let err = FileConfig::load(Path::new("/nonexistent/shelfscan.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
