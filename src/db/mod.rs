// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Database module for quote records

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::{Result, UlrimError};

/// Current schema version, stored in `PRAGMA user_version`
pub const SCHEMA_VERSION: i64 = 2;

const QUOTE_COLUMNS: &str = "id, content, author, language, tags, source, created_at";

/// Database manager for Ulrim (thread-safe wrapper)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

/// Where a quote came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuoteSource {
    /// Written by the user
    Local,
    /// Imported from a quote bundle
    Remote,
}

impl QuoteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteSource::Local => "LOCAL",
            QuoteSource::Remote => "REMOTE",
        }
    }

    fn from_db(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("REMOTE") {
            QuoteSource::Remote
        } else {
            QuoteSource::Local
        }
    }
}

impl fmt::Display for QuoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pool random draws are taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFilter {
    LocalOnly,
    RemoteOnly,
    #[default]
    Both,
}

impl SourceFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFilter::LocalOnly => "local_only",
            SourceFilter::RemoteOnly => "remote_only",
            SourceFilter::Both => "both",
        }
    }

    /// The single source this filter restricts to, if any
    pub fn source(&self) -> Option<QuoteSource> {
        match self {
            SourceFilter::LocalOnly => Some(QuoteSource::Local),
            SourceFilter::RemoteOnly => Some(QuoteSource::Remote),
            SourceFilter::Both => None,
        }
    }

    /// Decode a stored value; anything unrecognised means `Both`
    pub fn from_pref(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl FromStr for SourceFilter {
    type Err = UlrimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "local_only" => Ok(SourceFilter::LocalOnly),
            "remote_only" => Ok(SourceFilter::RemoteOnly),
            "both" => Ok(SourceFilter::Both),
            other => Err(UlrimError::Validation(format!(
                "unknown quote source '{}' (expected local_only, remote_only or both)",
                other
            ))),
        }
    }
}

impl fmt::Display for SourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: i64,
    pub content: String,
    pub author: Option<String>,
    pub language: String,
    /// Comma-joined tags
    pub tags: String,
    pub source: QuoteSource,
    /// Unix milliseconds
    pub created_at: i64,
}

impl Quote {
    /// Tags split back out of the comma-joined column
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// A quote that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuote {
    pub content: String,
    pub author: Option<String>,
    pub language: String,
    pub tags: String,
    pub source: QuoteSource,
}

impl NewQuote {
    pub fn new(content: impl Into<String>, source: QuoteSource) -> Self {
        Self {
            content: content.into(),
            author: None,
            language: "en".to_string(),
            tags: String::new(),
            source,
        }
    }

    pub fn local(content: impl Into<String>) -> Self {
        Self::new(content, QuoteSource::Local)
    }

    pub fn remote(content: impl Into<String>) -> Self {
        Self::new(content, QuoteSource::Remote)
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author.filter(|a| !a.trim().is_empty());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_tags<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        self.tags = tags
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        self
    }
}

/// Database statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DbStats {
    pub quote_count: i64,
    pub local_count: i64,
    pub remote_count: i64,
}

fn quote_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Quote> {
    let source: String = row.get(5)?;
    Ok(Quote {
        id: row.get(0)?,
        content: row.get(1)?,
        author: row.get(2)?,
        language: row.get(3)?,
        tags: row.get(4)?,
        source: QuoteSource::from_db(&source),
        created_at: row.get(6)?,
    })
}

fn insert_row(conn: &Connection, quote: &NewQuote, created_at: i64) -> rusqlite::Result<Quote> {
    conn.execute(
        r#"INSERT INTO sentences (content, author, language, tags, source, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        params![
            quote.content,
            quote.author,
            quote.language,
            quote.tags,
            quote.source.as_str(),
            created_at
        ],
    )?;
    Ok(Quote {
        id: conn.last_insert_rowid(),
        content: quote.content.clone(),
        author: quote.author.clone(),
        language: quote.language.clone(),
        tags: quote.tags.clone(),
        source: quote.source,
        created_at,
    })
}

/// Escape LIKE wildcards so the query matches literally
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names.iter().any(|n| n == column))
}

impl Database {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize()?;
        Ok(db)
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| UlrimError::Config("Database lock poisoned".to_string()))
    }

    /// Create the schema, or upgrade an older one in place
    fn initialize(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        let has_table: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'sentences')",
            [],
            |row| row.get(0),
        )?;

        if !has_table {
            conn.execute_batch(
                r#"
                CREATE TABLE sentences (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    content TEXT NOT NULL,
                    author TEXT,
                    language TEXT NOT NULL DEFAULT 'en',
                    tags TEXT NOT NULL DEFAULT '',
                    source TEXT NOT NULL DEFAULT 'LOCAL',
                    created_at INTEGER NOT NULL
                );
            "#,
            )?;
        } else if version < SCHEMA_VERSION {
            info!("Upgrading quote database from schema v{} to v{}", version, SCHEMA_VERSION);
            let additions = [
                ("author", "ALTER TABLE sentences ADD COLUMN author TEXT"),
                ("language", "ALTER TABLE sentences ADD COLUMN language TEXT NOT NULL DEFAULT 'en'"),
                ("tags", "ALTER TABLE sentences ADD COLUMN tags TEXT NOT NULL DEFAULT ''"),
                ("source", "ALTER TABLE sentences ADD COLUMN source TEXT NOT NULL DEFAULT 'LOCAL'"),
            ];
            for (column, sql) in additions {
                if !column_exists(&conn, "sentences", column)? {
                    conn.execute(sql, [])?;
                }
            }
        }

        conn.execute_batch(&format!(
            r#"
            CREATE INDEX IF NOT EXISTS idx_sentences_source ON sentences(source);
            CREATE INDEX IF NOT EXISTS idx_sentences_created ON sentences(created_at);
            PRAGMA user_version = {};
        "#,
            SCHEMA_VERSION
        ))?;
        Ok(())
    }

    /// Insert a new quote and return it with its assigned id
    pub fn insert(&self, quote: &NewQuote) -> Result<Quote> {
        let conn = self.lock_conn()?;
        let stored = insert_row(&conn, quote, Utc::now().timestamp_millis())?;
        debug!("Inserted quote {} ({})", stored.id, stored.source);
        Ok(stored)
    }

    /// Insert many quotes in one transaction
    pub fn insert_all(&self, quotes: &[NewQuote]) -> Result<usize> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now().timestamp_millis();
        for quote in quotes {
            insert_row(&tx, quote, now)?;
        }
        tx.commit()?;
        Ok(quotes.len())
    }

    /// Overwrite an existing quote's fields
    pub fn update(&self, quote: &Quote) -> Result<()> {
        let conn = self.lock_conn()?;
        let changed = conn.execute(
            r#"UPDATE sentences SET content = ?2, author = ?3, language = ?4, tags = ?5, source = ?6
               WHERE id = ?1"#,
            params![
                quote.id,
                quote.content,
                quote.author,
                quote.language,
                quote.tags,
                quote.source.as_str()
            ],
        )?;
        if changed == 0 {
            return Err(UlrimError::NotFound(quote.id));
        }
        Ok(())
    }

    /// Delete a quote; returns whether a row was removed
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.lock_conn()?;
        let changed = conn.execute("DELETE FROM sentences WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn get_by_id(&self, id: i64) -> Result<Option<Quote>> {
        let conn = self.lock_conn()?;
        let quote = conn
            .query_row(
                &format!("SELECT {} FROM sentences WHERE id = ?1", QUOTE_COLUMNS),
                params![id],
                quote_from_row,
            )
            .optional()?;
        Ok(quote)
    }

    /// All quotes, newest first
    pub fn get_all(&self) -> Result<Vec<Quote>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sentences ORDER BY created_at DESC, id DESC",
            QUOTE_COLUMNS
        ))?;
        let quotes = stmt
            .query_map([], quote_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(quotes)
    }

    /// Quotes of one provenance, newest first
    pub fn get_by_source(&self, source: QuoteSource) -> Result<Vec<Quote>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sentences WHERE source = ?1 ORDER BY created_at DESC, id DESC",
            QUOTE_COLUMNS
        ))?;
        let quotes = stmt
            .query_map(params![source.as_str()], quote_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(quotes)
    }

    /// Search content, author and tags
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<Quote>> {
        let conn = self.lock_conn()?;
        let pattern = format!("%{}%", escape_like(query));
        let mut stmt = conn.prepare(&format!(
            r#"SELECT {} FROM sentences
               WHERE content LIKE ?1 ESCAPE '\' OR author LIKE ?1 ESCAPE '\' OR tags LIKE ?1 ESCAPE '\'
               ORDER BY created_at DESC, id DESC LIMIT ?2"#,
            QUOTE_COLUMNS
        ))?;
        let quotes = stmt
            .query_map(params![pattern, limit as i64], quote_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(quotes)
    }

    /// Draw one quote uniformly at random from the filtered pool
    pub fn random(&self, filter: SourceFilter) -> Result<Option<Quote>> {
        let conn = self.lock_conn()?;
        let quote = match filter.source() {
            Some(source) => conn
                .query_row(
                    &format!(
                        "SELECT {} FROM sentences WHERE source = ?1 ORDER BY RANDOM() LIMIT 1",
                        QUOTE_COLUMNS
                    ),
                    params![source.as_str()],
                    quote_from_row,
                )
                .optional()?,
            None => conn
                .query_row(
                    &format!("SELECT {} FROM sentences ORDER BY RANDOM() LIMIT 1", QUOTE_COLUMNS),
                    [],
                    quote_from_row,
                )
                .optional()?,
        };
        Ok(quote)
    }

    /// Delete every quote of one provenance
    pub fn delete_by_source(&self, source: QuoteSource) -> Result<usize> {
        let conn = self.lock_conn()?;
        let removed = conn.execute("DELETE FROM sentences WHERE source = ?1", params![source.as_str()])?;
        Ok(removed)
    }

    /// Swap out every quote of one provenance in a single transaction
    pub fn replace_source(&self, source: QuoteSource, quotes: &[NewQuote]) -> Result<usize> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM sentences WHERE source = ?1", params![source.as_str()])?;
        let now = Utc::now().timestamp_millis();
        for quote in quotes {
            let mut quote = quote.clone();
            quote.source = source;
            insert_row(&tx, &quote, now)?;
        }
        tx.commit()?;
        debug!("Replaced {} {} quotes with {}", removed, source, quotes.len());
        Ok(quotes.len())
    }

    /// Copy bundled quotes into the user's own collection.
    ///
    /// Ids that do not name a `REMOTE` quote are skipped, repeated ids are
    /// copied once. Copies get fresh ids and creation timestamps.
    pub fn copy_to_local(&self, ids: &[i64]) -> Result<Vec<Quote>> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now().timestamp_millis();
        let mut seen = HashSet::new();
        let mut copied = Vec::new();
        for id in ids.iter().filter(|id| seen.insert(**id)) {
            let bundled = tx
                .query_row(
                    &format!(
                        "SELECT {} FROM sentences WHERE id = ?1 AND source = 'REMOTE'",
                        QUOTE_COLUMNS
                    ),
                    params![id],
                    quote_from_row,
                )
                .optional()?;
            if let Some(bundled) = bundled {
                let copy = NewQuote {
                    content: bundled.content,
                    author: bundled.author,
                    language: bundled.language,
                    tags: bundled.tags,
                    source: QuoteSource::Local,
                };
                copied.push(insert_row(&tx, &copy, now)?);
            }
        }
        tx.commit()?;
        Ok(copied)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.lock_conn()?;
        conn.query_row("SELECT COUNT(*) FROM sentences", [], |row| row.get(0))
            .map_err(Into::into)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let conn = self.lock_conn()?;
        let (quote_count, local_count, remote_count) = conn.query_row(
            r#"SELECT COUNT(*),
                      COALESCE(SUM(source = 'LOCAL'), 0),
                      COALESCE(SUM(source = 'REMOTE'), 0)
               FROM sentences"#,
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        Ok(DbStats {
            quote_count,
            local_count,
            remote_count,
        })
    }

    /// Vacuum database
    pub fn vacuum(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("VACUUM", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn insert_assigns_ids_and_defaults() {
        let db = Database::in_memory().unwrap();
        let quote = db
            .insert(&NewQuote::local("Stay curious").with_tags(&["mind", " growth "]))
            .unwrap();

        assert!(quote.id > 0);
        assert_eq!(quote.language, "en");
        assert_eq!(quote.tags, "mind,growth");
        assert_eq!(quote.tag_list(), vec!["mind", "growth"]);
        assert_eq!(db.get_by_id(quote.id).unwrap(), Some(quote));
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let db = Database::in_memory().unwrap();
        let first = db.insert(&NewQuote::local("one")).unwrap();
        let second = db.insert(&NewQuote::local("two")).unwrap();
        assert!(db.delete(second.id).unwrap());

        let third = db.insert(&NewQuote::local("three")).unwrap();
        assert!(third.id > second.id);
        assert!(third.id > first.id);
    }

    #[test]
    fn delete_missing_reports_false() {
        let db = Database::in_memory().unwrap();
        assert!(!db.delete(42).unwrap());
        assert_eq!(db.get_by_id(42).unwrap(), None);
    }

    #[test]
    fn update_missing_is_not_found() {
        let db = Database::in_memory().unwrap();
        let mut quote = db.insert(&NewQuote::local("draft")).unwrap();
        quote.content = "final".to_string();
        db.update(&quote).unwrap();
        assert_eq!(db.get_by_id(quote.id).unwrap().unwrap().content, "final");

        quote.id = 999;
        assert!(matches!(db.update(&quote), Err(UlrimError::NotFound(999))));
    }

    #[test]
    fn random_respects_source_filter() {
        let db = Database::in_memory().unwrap();
        db.insert(&NewQuote::local("mine")).unwrap();
        db.insert(&NewQuote::remote("bundled")).unwrap();

        for _ in 0..20 {
            let local = db.random(SourceFilter::LocalOnly).unwrap().unwrap();
            assert_eq!(local.source, QuoteSource::Local);
            let remote = db.random(SourceFilter::RemoteOnly).unwrap().unwrap();
            assert_eq!(remote.source, QuoteSource::Remote);
        }
        assert!(db.random(SourceFilter::Both).unwrap().is_some());
    }

    #[test]
    fn random_on_empty_pool_is_none() {
        let db = Database::in_memory().unwrap();
        db.insert(&NewQuote::local("mine")).unwrap();
        assert_eq!(db.random(SourceFilter::RemoteOnly).unwrap(), None);
    }

    #[test]
    fn replace_source_keeps_other_provenance() {
        let db = Database::in_memory().unwrap();
        db.insert(&NewQuote::local("mine")).unwrap();
        db.insert_all(&[NewQuote::remote("old a"), NewQuote::remote("old b")]).unwrap();

        db.replace_source(QuoteSource::Remote, &[NewQuote::local("new")]).unwrap();

        let remote = db.get_by_source(QuoteSource::Remote).unwrap();
        assert_eq!(remote.len(), 1);
        assert_eq!(remote[0].content, "new");
        assert_eq!(db.get_by_source(QuoteSource::Local).unwrap().len(), 1);
    }

    #[test]
    fn copy_to_local_skips_non_remote_ids() {
        let db = Database::in_memory().unwrap();
        let mine = db.insert(&NewQuote::local("mine")).unwrap();
        let bundled = db
            .insert(&NewQuote::remote("bundled").with_author(Some("Seneca".to_string())))
            .unwrap();

        let copied = db.copy_to_local(&[bundled.id, mine.id, 777]).unwrap();
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].source, QuoteSource::Local);
        assert_eq!(copied[0].author.as_deref(), Some("Seneca"));
        assert_ne!(copied[0].id, bundled.id);

        let stats = db.stats().unwrap();
        assert_eq!(stats, DbStats { quote_count: 3, local_count: 2, remote_count: 1 });
    }

    #[test]
    fn search_matches_author_and_tags() {
        let db = Database::in_memory().unwrap();
        db.insert(&NewQuote::local("Know thyself").with_author(Some("Socrates".to_string())))
            .unwrap();
        db.insert(&NewQuote::local("Keep going").with_tags(&["grit"])).unwrap();

        assert_eq!(db.search("socrates", 10).unwrap().len(), 1);
        assert_eq!(db.search("grit", 10).unwrap()[0].content, "Keep going");
        assert!(db.search("nothing", 10).unwrap().is_empty());
    }

    #[test]
    fn copy_to_local_copies_repeated_ids_once() {
        let db = Database::in_memory().unwrap();
        let bundled = db.insert(&NewQuote::remote("once")).unwrap();

        let copied = db.copy_to_local(&[bundled.id, bundled.id]).unwrap();
        assert_eq!(copied.len(), 1);
        assert_eq!(db.get_by_source(QuoteSource::Local).unwrap().len(), 1);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let db = Database::in_memory().unwrap();
        db.insert(&NewQuote::local("Give 100% today")).unwrap();
        db.insert(&NewQuote::local("snake_case forever")).unwrap();
        db.insert(&NewQuote::local("back\\slash")).unwrap();
        db.insert(&NewQuote::local("Plain words")).unwrap();

        let percent = db.search("%", 10).unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].content, "Give 100% today");

        let underscore = db.search("_", 10).unwrap();
        assert_eq!(underscore.len(), 1);
        assert_eq!(underscore[0].content, "snake_case forever");

        assert_eq!(db.search("\\", 10).unwrap().len(), 1);
        assert_eq!(db.search("plain", 10).unwrap().len(), 1);
    }

    #[test]
    fn delete_by_source_leaves_other_provenance() {
        let db = Database::in_memory().unwrap();
        let mine = db.insert(&NewQuote::local("mine")).unwrap();
        db.insert_all(&[NewQuote::remote("a"), NewQuote::remote("b")]).unwrap();

        assert_eq!(db.delete_by_source(QuoteSource::Remote).unwrap(), 2);
        assert_eq!(db.delete_by_source(QuoteSource::Remote).unwrap(), 0);
        assert_eq!(db.get_all().unwrap(), vec![mine]);
    }

    #[test]
    fn upgrades_version_one_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ulrim.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                r#"
                CREATE TABLE sentences (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    content TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                );
                INSERT INTO sentences (content, created_at) VALUES ('legacy', 1700000000000);
                PRAGMA user_version = 1;
            "#,
            )
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let all = db.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "legacy");
        assert_eq!(all[0].language, "en");
        assert_eq!(all[0].tags, "");
        assert_eq!(all[0].source, QuoteSource::Local);
        assert_eq!(all[0].author, None);

        drop(db);
        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn source_filter_parsing_is_lenient_for_prefs() {
        assert_eq!(SourceFilter::from_pref("local_only"), SourceFilter::LocalOnly);
        assert_eq!(SourceFilter::from_pref("garbage"), SourceFilter::Both);
        assert!("garbage".parse::<SourceFilter>().is_err());
    }
}
