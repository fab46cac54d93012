// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Everyday quote operations: add, edit, delete, browse, draw

use tracing::{debug, info};

use crate::db::{Database, NewQuote, Quote, QuoteSource};
use crate::prefs::PreferenceStore;
use crate::{Result, UlrimError};

/// Shown wherever a quote is expected but none exists
pub const PLACEHOLDER: &str = "Tap to find your principle.";

/// The user's quote collection plus the settings that shape it
#[derive(Clone)]
pub struct QuoteLibrary {
    db: Database,
    prefs: PreferenceStore,
}

fn require_content(content: &str) -> Result<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(UlrimError::Validation("quote text cannot be blank".to_string()));
    }
    Ok(trimmed.to_string())
}

impl QuoteLibrary {
    pub fn new(db: Database, prefs: PreferenceStore) -> Self {
        Self { db, prefs }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.prefs
    }

    /// Save a quote written by the user. Blank text is rejected.
    pub fn add_quote(&self, content: &str, author: Option<&str>, tags: &[String]) -> Result<Quote> {
        let content = require_content(content)?;
        let quote = NewQuote::local(content)
            .with_author(author.map(str::to_string))
            .with_tags(tags);
        let stored = self.db.insert(&quote)?;
        info!("Added quote {}", stored.id);
        Ok(stored)
    }

    /// Replace a quote's text. Blank text is rejected.
    pub fn update_content(&self, id: i64, content: &str) -> Result<Quote> {
        let content = require_content(content)?;
        let mut quote = self.db.get_by_id(id)?.ok_or(UlrimError::NotFound(id))?;
        quote.content = content;
        self.db.update(&quote)?;
        Ok(quote)
    }

    pub fn delete_quote(&self, id: i64) -> Result<()> {
        if !self.db.delete(id)? {
            return Err(UlrimError::NotFound(id));
        }
        info!("Deleted quote {}", id);
        Ok(())
    }

    pub fn get(&self, id: i64) -> Result<Quote> {
        self.db.get_by_id(id)?.ok_or(UlrimError::NotFound(id))
    }

    /// Random quote from the pool chosen by the `quote_source` setting
    pub fn random_quote(&self) -> Result<Option<Quote>> {
        let filter = self.prefs.user_preferences()?.quote_source;
        debug!("Drawing random quote from {}", filter);
        self.db.random(filter)
    }

    pub fn all_quotes(&self) -> Result<Vec<Quote>> {
        self.db.get_all()
    }

    pub fn local_quotes(&self) -> Result<Vec<Quote>> {
        self.db.get_by_source(QuoteSource::Local)
    }

    /// Bundled quotes available to browse
    pub fn remote_quotes(&self) -> Result<Vec<Quote>> {
        self.db.get_by_source(QuoteSource::Remote)
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<Quote>> {
        self.db.search(query, limit)
    }

    /// Keep copies of the selected bundled quotes as the user's own
    pub fn adopt_remote(&self, ids: &[i64]) -> Result<Vec<Quote>> {
        let adopted = self.db.copy_to_local(ids)?;
        info!("Saved {} of {} selected quotes", adopted.len(), ids.len());
        Ok(adopted)
    }

    /// Text to display for an optional quote
    pub fn display_text(quote: Option<&Quote>) -> &str {
        quote.map(|q| q.content.as_str()).unwrap_or(PLACEHOLDER)
    }
}
