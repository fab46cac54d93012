// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Quote of the day
//!
//! The pick is cached in the preference store as (date, quote id) and is
//! reused for the rest of that calendar day. A date change or a deleted
//! quote invalidates it and a fresh random quote is drawn.

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::db::{Database, Quote, SourceFilter};
use crate::prefs::PreferenceStore;
use crate::Result;

/// Date format used for the cached day
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of "today"
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The local calendar date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always the same date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Picks and caches the quote of the day
#[derive(Clone)]
pub struct DailyQuoteManager<C: Clock = SystemClock> {
    db: Database,
    prefs: PreferenceStore,
    clock: C,
}

impl DailyQuoteManager<SystemClock> {
    pub fn new(db: Database, prefs: PreferenceStore) -> Self {
        Self::with_clock(db, prefs, SystemClock)
    }
}

impl<C: Clock> DailyQuoteManager<C> {
    pub fn with_clock(db: Database, prefs: PreferenceStore, clock: C) -> Self {
        Self { db, prefs, clock }
    }

    /// Today's date as stored in the cache
    pub fn today_key(&self) -> String {
        self.clock.today().format(DATE_FORMAT).to_string()
    }

    /// Return today's cached quote, or draw and cache a new one.
    ///
    /// A cached quote is returned as-is even if `filter` would no longer
    /// select its source. `None` means the filtered pool is empty; the cache
    /// is left alone in that case.
    pub fn get_or_update_today_quote(&self, filter: SourceFilter) -> Result<Option<Quote>> {
        let today = self.today_key();
        let (saved_date, saved_id) = self.prefs.today_quote()?;

        if saved_date.as_deref() == Some(today.as_str()) {
            if let Some(id) = saved_id {
                if let Some(quote) = self.db.get_by_id(id)? {
                    debug!("Using cached quote {} for {}", id, today);
                    return Ok(Some(quote));
                }
                debug!("Cached quote {} no longer exists", id);
            }
        }

        let Some(quote) = self.db.random(filter)? else {
            debug!("No quotes available for filter {}", filter);
            return Ok(None);
        };

        self.prefs.set_today_quote(&today, quote.id)?;
        info!("Picked quote {} for {}", quote.id, today);
        Ok(Some(quote))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewQuote, QuoteSource};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn seeded() -> (Database, PreferenceStore) {
        let db = Database::in_memory().unwrap();
        for i in 0..10 {
            db.insert(&NewQuote::local(format!("local {}", i))).unwrap();
            db.insert(&NewQuote::remote(format!("remote {}", i))).unwrap();
        }
        (db, PreferenceStore::in_memory())
    }

    #[test]
    fn same_day_returns_same_quote() {
        let (db, prefs) = seeded();
        let manager = DailyQuoteManager::with_clock(db, prefs.clone(), FixedClock(day(19)));

        let first = manager.get_or_update_today_quote(SourceFilter::Both).unwrap().unwrap();
        for _ in 0..5 {
            let again = manager.get_or_update_today_quote(SourceFilter::Both).unwrap().unwrap();
            assert_eq!(again, first);
        }
        assert_eq!(
            prefs.today_quote().unwrap(),
            (Some("2026-10-19".to_string()), Some(first.id))
        );
    }

    #[test]
    fn new_day_refreshes_cache() {
        let (db, prefs) = seeded();
        let yesterday = DailyQuoteManager::with_clock(db.clone(), prefs.clone(), FixedClock(day(18)));
        yesterday.get_or_update_today_quote(SourceFilter::Both).unwrap().unwrap();

        let today = DailyQuoteManager::with_clock(db, prefs.clone(), FixedClock(day(19)));
        let picked = today.get_or_update_today_quote(SourceFilter::Both).unwrap().unwrap();

        let (date, id) = prefs.today_quote().unwrap();
        assert_eq!(date.as_deref(), Some("2026-10-19"));
        assert_eq!(id, Some(picked.id));
    }

    #[test]
    fn deleted_quote_invalidates_cache() {
        let db = Database::in_memory().unwrap();
        let only = db.insert(&NewQuote::local("only")).unwrap();
        let prefs = PreferenceStore::in_memory();
        let manager = DailyQuoteManager::with_clock(db.clone(), prefs.clone(), FixedClock(day(19)));

        assert_eq!(manager.get_or_update_today_quote(SourceFilter::Both).unwrap(), Some(only.clone()));

        db.delete(only.id).unwrap();
        let replacement = db.insert(&NewQuote::local("replacement")).unwrap();

        let picked = manager.get_or_update_today_quote(SourceFilter::Both).unwrap().unwrap();
        assert_eq!(picked.id, replacement.id);
        assert_eq!(prefs.today_quote().unwrap().1, Some(replacement.id));
    }

    #[test]
    fn empty_pool_leaves_cache_untouched() {
        let db = Database::in_memory().unwrap();
        db.insert(&NewQuote::remote("bundled")).unwrap();
        let prefs = PreferenceStore::in_memory();
        let manager = DailyQuoteManager::with_clock(db, prefs.clone(), FixedClock(day(19)));

        assert_eq!(manager.get_or_update_today_quote(SourceFilter::LocalOnly).unwrap(), None);
        assert_eq!(prefs.today_quote().unwrap(), (None, None));
    }

    #[test]
    fn fresh_draw_honours_filter() {
        let (db, prefs) = seeded();
        let manager = DailyQuoteManager::with_clock(db, prefs, FixedClock(day(19)));
        let picked = manager
            .get_or_update_today_quote(SourceFilter::RemoteOnly)
            .unwrap()
            .unwrap();
        assert_eq!(picked.source, QuoteSource::Remote);
    }
}
