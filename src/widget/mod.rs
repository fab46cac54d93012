// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Home-screen widget surfaces

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::daily::{Clock, DailyQuoteManager, SystemClock};
use crate::db::{Database, Quote};
use crate::library::{QuoteLibrary, PLACEHOLDER};
use crate::prefs::{PreferenceStore, WidgetMode};
use crate::share::{wrap_text, FixedAdvance};
use crate::{Result, UlrimError};

/// Tapping a widget opens the main screen
pub const MAIN_DEEP_LINK: &str = "ulrim://main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    /// Branded card; daily or random by setting
    Default,
    /// Bare text; always the daily quote
    Simple,
}

impl FromStr for WidgetKind {
    type Err = UlrimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(WidgetKind::Default),
            "simple" => Ok(WidgetKind::Simple),
            other => Err(UlrimError::Validation(format!("unknown widget '{}'", other))),
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetKind::Default => f.write_str("default"),
            WidgetKind::Simple => f.write_str("simple"),
        }
    }
}

/// What a widget displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetView {
    pub kind: WidgetKind,
    pub header: Option<String>,
    pub text: String,
    pub footer: Option<String>,
    pub max_lines: usize,
    pub deep_link: String,
    pub quote_id: Option<i64>,
}

impl WidgetView {
    fn new(kind: WidgetKind, quote: Option<Quote>) -> Self {
        let text = QuoteLibrary::display_text(quote.as_ref()).to_string();
        let quote_id = quote.map(|q| q.id);
        match kind {
            WidgetKind::Default => Self {
                kind,
                header: Some("Ulrim".to_string()),
                text,
                footer: Some("Today's Quote".to_string()),
                max_lines: 4,
                deep_link: MAIN_DEEP_LINK.to_string(),
                quote_id,
            },
            WidgetKind::Simple => Self {
                kind,
                header: None,
                text,
                footer: None,
                max_lines: 6,
                deep_link: MAIN_DEEP_LINK.to_string(),
                quote_id,
            },
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.quote_id.is_none() && self.text == PLACEHOLDER
    }

    /// Quote text wrapped to `columns` and cut to `max_lines`
    pub fn to_lines(&self, columns: usize) -> Vec<String> {
        let mut lines = wrap_text(&self.text, &FixedAdvance(1.0), columns as f32);
        if lines.len() > self.max_lines {
            lines.truncate(self.max_lines);
            if let Some(last) = lines.last_mut() {
                last.push('…');
            }
        }
        lines
    }
}

/// Resolves which quote each widget shows
pub struct WidgetProvider<C: Clock = SystemClock> {
    db: Database,
    prefs: PreferenceStore,
    daily: DailyQuoteManager<C>,
}

impl WidgetProvider<SystemClock> {
    pub fn new(db: Database, prefs: PreferenceStore) -> Self {
        let daily = DailyQuoteManager::new(db.clone(), prefs.clone());
        Self { db, prefs, daily }
    }
}

impl<C: Clock> WidgetProvider<C> {
    pub fn with_daily(db: Database, prefs: PreferenceStore, daily: DailyQuoteManager<C>) -> Self {
        Self { db, prefs, daily }
    }

    pub fn render(&self, kind: WidgetKind) -> Result<WidgetView> {
        let prefs = self.prefs.user_preferences()?;
        let quote = match kind {
            WidgetKind::Default => match prefs.widget_mode {
                WidgetMode::Random => self.db.random(prefs.widget_quote_source)?,
                WidgetMode::Daily => self.daily.get_or_update_today_quote(prefs.widget_quote_source)?,
            },
            WidgetKind::Simple => self.daily.get_or_update_today_quote(prefs.quote_source)?,
        };
        Ok(WidgetView::new(kind, quote))
    }
}
