// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Key-value preference store
//!
//! User settings plus two bits of cached state (today's quote and the last
//! imported bundle version). Persisted as one JSON object that is rewritten
//! atomically on every edit. Subscribers get the new [`UserPreferences`]
//! after each edit through a `watch` channel.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::db::SourceFilter;
use crate::{Result, UlrimError};

/// Quote text size on the main screen, stored and exchanged as 0, 1 or 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub fn index(&self) -> u8 {
        match self {
            FontSize::Small => 0,
            FontSize::Medium => 1,
            FontSize::Large => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(FontSize::Small),
            1 => Some(FontSize::Medium),
            2 => Some(FontSize::Large),
            _ => None,
        }
    }

    /// Multiplier applied to the base title size
    pub fn scale(&self) -> f32 {
        match self {
            FontSize::Small => 0.8,
            FontSize::Medium => 1.0,
            FontSize::Large => 1.3,
        }
    }
}

impl From<FontSize> for u8 {
    fn from(size: FontSize) -> u8 {
        size.index()
    }
}

impl TryFrom<u8> for FontSize {
    type Error = UlrimError;

    fn try_from(index: u8) -> Result<Self> {
        FontSize::from_index(index).ok_or_else(|| {
            UlrimError::Validation(format!("font size must be 0, 1 or 2 (got {})", index))
        })
    }
}

/// What the default widget shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetMode {
    #[default]
    Daily,
    Random,
}

impl WidgetMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetMode::Daily => "daily",
            WidgetMode::Random => "random",
        }
    }

    /// Anything but "random" shows the daily quote
    pub fn from_pref(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl FromStr for WidgetMode {
    type Err = UlrimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "daily" => Ok(WidgetMode::Daily),
            "random" => Ok(WidgetMode::Random),
            other => Err(UlrimError::Validation(format!(
                "unknown widget mode '{}' (expected daily or random)",
                other
            ))),
        }
    }
}

impl fmt::Display for WidgetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded user-facing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub font_size: FontSize,
    pub animation_on: bool,
    pub background_on: bool,
    pub widget_mode: WidgetMode,
    pub quote_source: SourceFilter,
    pub widget_quote_source: SourceFilter,
    pub onboarding_completed: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        StoredPreferences::default().decode()
    }
}

/// The raw stored keys. Absent keys take their defaults when decoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoredPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    font_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    animation_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    background_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    widget_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quote_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    widget_quote_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    onboarding_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    today_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    today_quote_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_quotes_version: Option<i64>,
}

impl StoredPreferences {
    fn decode(&self) -> UserPreferences {
        let font_size = self
            .font_size
            .and_then(|i| u8::try_from(i).ok())
            .and_then(FontSize::from_index)
            .unwrap_or_default();
        UserPreferences {
            font_size,
            animation_on: self.animation_on.unwrap_or(true),
            background_on: self.background_on.unwrap_or(true),
            widget_mode: self
                .widget_mode
                .as_deref()
                .map(WidgetMode::from_pref)
                .unwrap_or_default(),
            quote_source: self
                .quote_source
                .as_deref()
                .map(SourceFilter::from_pref)
                .unwrap_or_default(),
            widget_quote_source: self
                .widget_quote_source
                .as_deref()
                .map(SourceFilter::from_pref)
                .unwrap_or_default(),
            onboarding_completed: self.onboarding_completed.unwrap_or(false),
        }
    }
}

/// Preference store (cheap to clone, shared between components)
#[derive(Clone)]
pub struct PreferenceStore {
    state: Arc<Mutex<StoredPreferences>>,
    path: Option<PathBuf>,
    changes: Arc<watch::Sender<UserPreferences>>,
}

impl PreferenceStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let stored = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| {
                UlrimError::Preferences(format!("Failed to parse {:?}: {}", path, e))
            })?
        } else {
            info!("No preference file at {:?}, using defaults", path);
            StoredPreferences::default()
        };
        Ok(Self::with_state(stored, Some(path)))
    }

    /// A store that lives only in memory (for testing)
    pub fn in_memory() -> Self {
        Self::with_state(StoredPreferences::default(), None)
    }

    fn with_state(stored: StoredPreferences, path: Option<PathBuf>) -> Self {
        let (tx, _rx) = watch::channel(stored.decode());
        Self {
            state: Arc::new(Mutex::new(stored)),
            path,
            changes: Arc::new(tx),
        }
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, StoredPreferences>> {
        self.state
            .lock()
            .map_err(|_| UlrimError::Preferences("Preference lock poisoned".to_string()))
    }

    /// Apply one edit, persist it, then notify subscribers
    fn edit<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut StoredPreferences),
    {
        let mut state = self.lock_state()?;
        let mut next = state.clone();
        apply(&mut next);
        if let Some(path) = &self.path {
            write_atomic(path, &next)?;
        }
        let decoded = next.decode();
        *state = next;
        drop(state);
        self.changes.send_replace(decoded);
        Ok(())
    }

    /// File backing this store, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn user_preferences(&self) -> Result<UserPreferences> {
        Ok(self.lock_state()?.decode())
    }

    /// Receive the decoded preferences after every edit
    pub fn subscribe(&self) -> watch::Receiver<UserPreferences> {
        self.changes.subscribe()
    }

    pub fn set_font_size(&self, index: u8) -> Result<()> {
        let size = FontSize::try_from(index)?;
        self.edit(|p| p.font_size = Some(size.index() as i64))
    }

    pub fn set_animation_on(&self, on: bool) -> Result<()> {
        self.edit(|p| p.animation_on = Some(on))
    }

    pub fn set_background_on(&self, on: bool) -> Result<()> {
        self.edit(|p| p.background_on = Some(on))
    }

    pub fn set_widget_mode(&self, mode: WidgetMode) -> Result<()> {
        self.edit(|p| p.widget_mode = Some(mode.as_str().to_string()))
    }

    pub fn set_quote_source(&self, source: SourceFilter) -> Result<()> {
        self.edit(|p| p.quote_source = Some(source.as_str().to_string()))
    }

    pub fn set_widget_quote_source(&self, source: SourceFilter) -> Result<()> {
        self.edit(|p| p.widget_quote_source = Some(source.as_str().to_string()))
    }

    pub fn set_onboarding_completed(&self, completed: bool) -> Result<()> {
        self.edit(|p| p.onboarding_completed = Some(completed))
    }

    /// Cached (date, quote id) of today's pick
    pub fn today_quote(&self) -> Result<(Option<String>, Option<i64>)> {
        let state = self.lock_state()?;
        Ok((state.today_date.clone(), state.today_quote_id))
    }

    /// Both keys are written in the same edit
    pub fn set_today_quote(&self, date: &str, quote_id: i64) -> Result<()> {
        self.edit(|p| {
            p.today_date = Some(date.to_string());
            p.today_quote_id = Some(quote_id);
        })
    }

    /// Version of the last imported bundle (0 when nothing was imported)
    pub fn bundle_version(&self) -> Result<i64> {
        Ok(self.lock_state()?.default_quotes_version.unwrap_or(0))
    }

    pub fn set_bundle_version(&self, version: i64) -> Result<()> {
        self.edit(|p| p.default_quotes_version = Some(version))
    }

    /// Set a user-facing setting by key, parsing the value from text
    pub fn set_from_str(&self, key: &str, value: &str) -> Result<()> {
        match key {
            "font_size" => {
                let index: u8 = value.trim().parse().map_err(|_| {
                    UlrimError::Validation(format!("font size must be 0, 1 or 2 (got '{}')", value))
                })?;
                self.set_font_size(index)
            }
            "animation_on" => self.set_animation_on(parse_bool(value)?),
            "background_on" => self.set_background_on(parse_bool(value)?),
            "widget_mode" => self.set_widget_mode(value.parse()?),
            "quote_source" => self.set_quote_source(value.parse()?),
            "widget_quote_source" => self.set_widget_quote_source(value.parse()?),
            "onboarding_completed" => self.set_onboarding_completed(parse_bool(value)?),
            other => Err(UlrimError::Validation(format!("unknown setting '{}'", other))),
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(UlrimError::Validation(format!("expected a boolean, got '{}'", other))),
    }
}

fn write_atomic(path: &Path, stored: &StoredPreferences) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_string_pretty(stored)?)?;
    std::fs::rename(&tmp, path)?;
    debug!("Preferences written to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_when_nothing_stored() {
        let store = PreferenceStore::in_memory();
        let prefs = store.user_preferences().unwrap();

        assert_eq!(prefs.font_size, FontSize::Medium);
        assert!(prefs.animation_on);
        assert!(prefs.background_on);
        assert_eq!(prefs.widget_mode, WidgetMode::Daily);
        assert_eq!(prefs.quote_source, SourceFilter::Both);
        assert_eq!(prefs.widget_quote_source, SourceFilter::Both);
        assert!(!prefs.onboarding_completed);
        assert_eq!(store.today_quote().unwrap(), (None, None));
        assert_eq!(store.bundle_version().unwrap(), 0);
    }

    #[test]
    fn edits_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs").join("settings.json");

        let store = PreferenceStore::open(&path).unwrap();
        store.set_font_size(2).unwrap();
        store.set_quote_source(SourceFilter::LocalOnly).unwrap();
        store.set_today_quote("2026-10-19", 7).unwrap();
        store.set_bundle_version(3).unwrap();

        let reopened = PreferenceStore::open(&path).unwrap();
        let prefs = reopened.user_preferences().unwrap();
        assert_eq!(prefs.font_size, FontSize::Large);
        assert_eq!(prefs.quote_source, SourceFilter::LocalOnly);
        assert_eq!(
            reopened.today_quote().unwrap(),
            (Some("2026-10-19".to_string()), Some(7))
        );
        assert_eq!(reopened.bundle_version().unwrap(), 3);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn rejects_out_of_range_font_size() {
        let store = PreferenceStore::in_memory();
        assert!(matches!(store.set_font_size(3), Err(UlrimError::Validation(_))));
        assert_eq!(store.user_preferences().unwrap().font_size, FontSize::Medium);
    }

    #[test]
    fn font_size_is_exchanged_as_an_index() {
        let prefs = UserPreferences {
            font_size: FontSize::Large,
            ..UserPreferences::default()
        };
        let json = serde_json::to_value(&prefs).unwrap();
        assert_eq!(json["font_size"], 2);

        let decoded: UserPreferences = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, prefs);
        assert!(serde_json::from_str::<FontSize>("3").is_err());
        assert!(serde_json::from_str::<FontSize>("\"medium\"").is_err());
    }

    #[test]
    fn unknown_stored_values_decode_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"font_size": 9, "widget_mode": "sometimes", "quote_source": "everything", "extra": 1}"#,
        )
        .unwrap();

        let prefs = PreferenceStore::open(&path).unwrap().user_preferences().unwrap();
        assert_eq!(prefs.font_size, FontSize::Medium);
        assert_eq!(prefs.widget_mode, WidgetMode::Daily);
        assert_eq!(prefs.quote_source, SourceFilter::Both);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(PreferenceStore::open(&path), Err(UlrimError::Preferences(_))));
    }

    #[test]
    fn subscribers_see_edits() {
        let store = PreferenceStore::in_memory();
        let mut rx = store.subscribe();
        assert!(!rx.borrow_and_update().onboarding_completed);

        store.set_onboarding_completed(true).unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().onboarding_completed);
    }

    #[test]
    fn set_from_str_parses_each_key() {
        let store = PreferenceStore::in_memory();
        store.set_from_str("font_size", "0").unwrap();
        store.set_from_str("animation_on", "off").unwrap();
        store.set_from_str("widget_mode", "random").unwrap();
        store.set_from_str("widget_quote_source", "remote_only").unwrap();

        let prefs = store.user_preferences().unwrap();
        assert_eq!(prefs.font_size, FontSize::Small);
        assert!((prefs.font_size.scale() - 0.8).abs() < f32::EPSILON);
        assert!(!prefs.animation_on);
        assert_eq!(prefs.widget_mode, WidgetMode::Random);
        assert_eq!(prefs.widget_quote_source, SourceFilter::RemoteOnly);

        assert!(store.set_from_str("today_date", "2020-01-01").is_err());
        assert!(store.set_from_str("widget_mode", "weekly").is_err());
    }
}
