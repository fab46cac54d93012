// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Ulrim

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Quote database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Preference store settings
    #[serde(default)]
    pub preferences: PreferencesConfig,

    /// Default quote bundle
    #[serde(default)]
    pub bundle: BundleConfig,

    /// Share card rendering
    #[serde(default)]
    pub share: ShareConfig,

    /// Web UI settings
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PreferencesConfig {
    #[serde(default = "default_prefs_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BundleConfig {
    /// Bundled JSON file
    #[serde(default = "default_bundle_path")]
    pub path: String,
    /// Fetch the bundle from here instead of the file
    #[serde(default)]
    pub url: Option<String>,
    /// Import a newer bundle before running any command
    #[serde(default = "default_true")]
    pub sync_on_start: bool,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Share card canvas and typography
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShareConfig {
    #[serde(default = "default_card_width")]
    pub width: u32,
    #[serde(default = "default_card_height")]
    pub height: u32,
    /// Horizontal padding on each side of the text block
    #[serde(default = "default_padding")]
    pub padding: u32,
    #[serde(default = "default_text_size")]
    pub text_size: f32,
    #[serde(default = "default_line_height")]
    pub line_height: f32,
    /// Shift of the text block below the vertical centre
    #[serde(default = "default_text_offset")]
    pub text_offset: f32,
    /// Alpha of the black overlay drawn over the background
    #[serde(default = "default_overlay_alpha")]
    pub overlay_alpha: u8,
    #[serde(default = "default_watermark")]
    pub watermark: String,
    #[serde(default = "default_watermark_size")]
    pub watermark_size: f32,
    /// Distance of the watermark baseline from the bottom edge
    #[serde(default = "default_watermark_margin")]
    pub watermark_margin: f32,
    #[serde(default = "default_watermark_alpha")]
    pub watermark_alpha: u8,
    /// TrueType/OpenType font used for card text
    #[serde(default)]
    pub font_path: Option<String>,
    /// Background image, scaled to fill; solid colour when unset
    #[serde(default)]
    pub background_path: Option<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

// Default value functions
fn default_true() -> bool { true }
fn default_timeout() -> u64 { 15 }
fn default_db_path() -> String { "ulrim.db".to_string() }
fn default_prefs_path() -> String { "ulrim_settings.json".to_string() }
fn default_bundle_path() -> String { "ulrim_quotes.json".to_string() }
fn default_card_width() -> u32 { 1080 }
fn default_card_height() -> u32 { 1920 }
fn default_padding() -> u32 { 60 }
fn default_text_size() -> f32 { 56.0 }
fn default_line_height() -> f32 { 80.0 }
fn default_text_offset() -> f32 { 200.0 }
fn default_overlay_alpha() -> u8 { 0x66 }
fn default_watermark() -> String { "Ulrim".to_string() }
fn default_watermark_size() -> f32 { 32.0 }
fn default_watermark_margin() -> f32 { 100.0 }
fn default_watermark_alpha() -> u8 { 0x80 }
fn default_output_dir() -> String { "cards".to_string() }
fn default_web_host() -> String { "127.0.0.1".to_string() }
fn default_web_port() -> u16 { 8080 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_prefs_path(),
        }
    }
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            path: default_bundle_path(),
            url: None,
            sync_on_start: true,
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            width: default_card_width(),
            height: default_card_height(),
            padding: default_padding(),
            text_size: default_text_size(),
            line_height: default_line_height(),
            text_offset: default_text_offset(),
            overlay_alpha: default_overlay_alpha(),
            watermark: default_watermark(),
            watermark_size: default_watermark_size(),
            watermark_margin: default_watermark_margin(),
            watermark_alpha: default_watermark_alpha(),
            font_path: None,
            background_path: None,
            output_dir: default_output_dir(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

impl ShareConfig {
    /// Width available to a line of card text
    pub fn text_width(&self) -> f32 {
        self.width.saturating_sub(2 * self.padding) as f32
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::UlrimError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the renderer and server cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        let share = &self.share;
        if share.width == 0 || share.height == 0 {
            return Err(crate::UlrimError::Config("share card size must be non-zero".to_string()));
        }
        if share.text_width() <= 0.0 {
            return Err(crate::UlrimError::Config(format!(
                "share padding {} leaves no room for text on a {}px card",
                share.padding, share.width
            )));
        }
        if share.text_size <= 0.0 || share.line_height <= 0.0 {
            return Err(crate::UlrimError::Config(
                "share text size and line height must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
