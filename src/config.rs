//! Embedded configuration for the stub executable.
//!
//! The generator copies the stub binary and appends a marker followed by a JSON
//! object. At startup the stub reads its own image, finds the last marker and
//! parses everything after it:
//!
//! ```text
//! <stub PE image bytes> \n---SITEWRAP_CONFIG_V1---\n {"url": "...", "title": "..."}
//! ```
//!
//! `embed_config` produces exactly that layout so both sides agree on it.
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use thiserror::Error;

/// Separator between the stub image and the JSON blob
pub const CONFIG_MARKER: &str = "\n---SITEWRAP_CONFIG_V1---\n";

pub const DEFAULT_TITLE: &str = "Web App";
pub const DEFAULT_WIDTH: u32 = 1024;
pub const DEFAULT_HEIGHT: u32 = 768;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to locate the running executable: {0}")]
    ExecutableUnavailable(#[source] io::Error),

    #[error("failed to read the running executable: {0}")]
    ExecutableUnreadable(#[source] io::Error),

    #[error("configuration marker not found")]
    MarkerMissing,

    #[error("failed to parse configuration JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("no target URL configured")]
    MissingUrl,
}

/// Configuration stamped onto the stub by the generator
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    // Basic
    pub url: String,
    pub title: String,

    // Window
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub fullscreen: bool,
    pub frameless: bool,
    pub always_on_top: bool,
    pub start_maximized: bool,
    /// `dark`, `light` or a `#rrggbb` caption color
    #[serde(rename = "titlebar_color")]
    pub title_bar_color: String,

    // Behavior
    pub single_instance: bool,
    pub user_agent: String,
    pub clear_cache_on_exit: bool,
    pub enable_notification: bool,

    // System tray
    pub enable_tray: bool,
    /// Minimize hides to tray instead of the taskbar
    pub minimize_to_tray: bool,
    /// Close hides to tray instead of exiting
    pub close_to_tray: bool,
    pub start_minimized: bool,
    /// Offer a "start with Windows" toggle in the tray menu
    pub enable_auto_start: bool,

    // Injection
    pub inject_css: String,
    pub inject_js: String,

    // Navigation
    pub whitelist: Vec<String>,
    pub block_external_nav: bool,

    // Advanced
    pub disable_context_menu: bool,
    pub disable_devtools: bool,
}

impl AppConfig {
    /// Fill zero-valued window fields and the title with their defaults
    pub fn with_defaults(mut self) -> Self {
        if self.width == 0 {
            self.width = DEFAULT_WIDTH;
        }
        if self.height == 0 {
            self.height = DEFAULT_HEIGHT;
        }
        if self.title.trim().is_empty() {
            self.title = DEFAULT_TITLE.to_string();
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        Ok(())
    }

    /// Close interception only applies when there is a tray to hide into
    pub fn closes_to_tray(&self) -> bool {
        self.enable_tray && self.close_to_tray
    }

    pub fn minimizes_to_tray(&self) -> bool {
        self.enable_tray && self.minimize_to_tray
    }
}

/// Parse the configuration blob out of an executable image
pub fn parse_embedded(image: &[u8]) -> Result<AppConfig, ConfigError> {
    let marker = CONFIG_MARKER.as_bytes();
    let start = image
        .windows(marker.len())
        .rposition(|window| window == marker)
        .ok_or(ConfigError::MarkerMissing)?;

    let mut blob = &image[start + marker.len()..];
    while let Some((last, rest)) = blob.split_last() {
        if matches!(last, b'\0' | b' ' | b'\n' | b'\r' | b'\t') {
            blob = rest;
        } else {
            break;
        }
    }

    Ok(serde_json::from_slice(blob)?)
}

/// Load, default and validate the configuration appended to this executable
pub fn read_embedded_config() -> Result<AppConfig, ConfigError> {
    let exe_path = std::env::current_exe().map_err(ConfigError::ExecutableUnavailable)?;
    let image = fs::read(&exe_path).map_err(ConfigError::ExecutableUnreadable)?;

    let config = parse_embedded(&image)?.with_defaults();
    config.validate()?;

    tracing::debug!("Loaded embedded config for {:?} -> {}", config.title, config.url);
    Ok(config)
}

/// Append a configuration blob to a stub image (generator side of the format)
pub fn embed_config(stub: &[u8], config: &AppConfig) -> Result<Vec<u8>, ConfigError> {
    let json = serde_json::to_vec(config)?;
    let mut image = Vec::with_capacity(stub.len() + CONFIG_MARKER.len() + json.len());
    image.extend_from_slice(stub);
    image.extend_from_slice(CONFIG_MARKER.as_bytes());
    image.extend_from_slice(&json);
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> AppConfig {
        AppConfig {
            url: "https://web.whatsapp.com".to_string(),
            title: "WhatsApp".to_string(),
            enable_tray: true,
            close_to_tray: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_embedded_config_is_found_after_stub_bytes() {
        let image = embed_config(b"MZ\x90\x00stub-bytes", &sample_config()).unwrap();
        let parsed = parse_embedded(&image).unwrap();
        assert_eq!(parsed, sample_config());
    }

    #[test]
    fn test_last_marker_wins() {
        let mut older = sample_config();
        older.url = "https://old.example.com".to_string();
        let first = embed_config(b"stub", &older).unwrap();
        let image = embed_config(&first, &sample_config()).unwrap();

        assert_eq!(parse_embedded(&image).unwrap().url, "https://web.whatsapp.com");
    }

    #[test]
    fn test_trailing_padding_is_trimmed() {
        let mut image = embed_config(b"stub", &sample_config()).unwrap();
        image.extend_from_slice(b" \r\n\t\0\0\0");
        assert!(parse_embedded(&image).is_ok());
    }

    #[test]
    fn test_missing_marker() {
        let result = parse_embedded(b"just a plain executable");
        assert!(matches!(result, Err(ConfigError::MarkerMissing)));
    }

    #[test]
    fn test_corrupt_json() {
        let mut image = b"stub".to_vec();
        image.extend_from_slice(CONFIG_MARKER.as_bytes());
        image.extend_from_slice(b"{\"url\": ");
        assert!(matches!(parse_embedded(&image), Err(ConfigError::InvalidJson(_))));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let mut image = b"stub".to_vec();
        image.extend_from_slice(CONFIG_MARKER.as_bytes());
        image.extend_from_slice(br##"{"url":"https://a.test","icon_path":"C:\\app.ico","future_flag":1}"##);
        let parsed = parse_embedded(&image).unwrap();
        assert_eq!(parsed.url, "https://a.test");
    }

    #[test]
    fn test_titlebar_and_auto_start_keys() {
        let mut image = b"stub".to_vec();
        image.extend_from_slice(CONFIG_MARKER.as_bytes());
        image.extend_from_slice(br##"{"url":"https://a.test","titlebar_color":"#1a1a2e","enable_auto_start":true}"##);
        let parsed = parse_embedded(&image).unwrap();
        assert_eq!(parsed.title_bar_color, "#1a1a2e");
        assert!(parsed.enable_auto_start);
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig {
            url: "https://a.test".to_string(),
            ..Default::default()
        }
        .with_defaults();

        assert_eq!(config.title, DEFAULT_TITLE);
        assert_eq!(config.width, DEFAULT_WIDTH);
        assert_eq!(config.height, DEFAULT_HEIGHT);
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let config = AppConfig::default().with_defaults();
        assert!(matches!(config.validate(), Err(ConfigError::MissingUrl)));
    }

    #[test]
    fn test_tray_interception_requires_tray() {
        let mut config = sample_config();
        assert!(config.closes_to_tray());
        assert!(!config.minimizes_to_tray());

        config.enable_tray = false;
        assert!(!config.closes_to_tray());
    }
}
