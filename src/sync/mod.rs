// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Version-gated import of the default quote bundle

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::BundleConfig;
use crate::db::{Database, NewQuote, QuoteSource};
use crate::prefs::PreferenceStore;
use crate::Result;

/// A versioned set of default quotes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub version: i64,
    #[serde(default)]
    pub quotes: Vec<BundleQuote>,
}

/// One quote as it appears in the bundle payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleQuote {
    /// Bundle-local identifier; the database assigns its own
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub author: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_language() -> String {
    "en".to_string()
}

impl Bundle {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Records to store, all marked as imported
    pub fn to_records(&self) -> Vec<NewQuote> {
        self.quotes
            .iter()
            .map(|q| {
                NewQuote::remote(q.text.clone())
                    .with_author(Some(q.author.clone()))
                    .with_language(q.language.clone())
                    .with_tags(&q.tags)
            })
            .collect()
    }
}

/// Where a bundle is loaded from. `Ok(None)` means there is no bundle.
#[async_trait]
pub trait BundleSource: Send + Sync {
    fn describe(&self) -> String;

    async fn load(&self) -> Result<Option<Bundle>>;
}

/// Bundle shipped as a JSON file
pub struct FileBundleSource {
    path: PathBuf,
}

impl FileBundleSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

#[async_trait]
impl BundleSource for FileBundleSource {
    fn describe(&self) -> String {
        format!("file {:?}", self.path)
    }

    async fn load(&self) -> Result<Option<Bundle>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => Ok(Some(Bundle::from_json(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Bundle fetched over HTTP
pub struct HttpBundleSource {
    client: reqwest::Client,
    url: String,
}

impl HttpBundleSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl BundleSource for HttpBundleSource {
    fn describe(&self) -> String {
        format!("url {}", self.url)
    }

    async fn load(&self) -> Result<Option<Bundle>> {
        let response = self.client.get(&self.url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bundle = response.error_for_status()?.json::<Bundle>().await?;
        Ok(Some(bundle))
    }
}

/// Bundle held in memory
pub struct StaticBundleSource {
    bundle: Option<Bundle>,
}

impl StaticBundleSource {
    pub fn new(bundle: Bundle) -> Self {
        Self { bundle: Some(bundle) }
    }

    pub fn empty() -> Self {
        Self { bundle: None }
    }
}

#[async_trait]
impl BundleSource for StaticBundleSource {
    fn describe(&self) -> String {
        "in-memory bundle".to_string()
    }

    async fn load(&self) -> Result<Option<Bundle>> {
        Ok(self.bundle.clone())
    }
}

/// The bundle source named by the configuration: the URL when set,
/// otherwise the bundled file
pub fn source_from_config(config: &BundleConfig) -> Result<Box<dyn BundleSource>> {
    match &config.url {
        Some(url) => Ok(Box::new(HttpBundleSource::new(
            url,
            Duration::from_secs(config.timeout_secs),
        )?)),
        None => Ok(Box::new(FileBundleSource::new(&config.path))),
    }
}

/// What a sync run did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Imported { version: i64, count: usize },
    UpToDate { stored: i64, bundled: i64 },
    BundleMissing,
}

/// Imports the default bundle when it is newer than the last import
pub struct QuotesSyncManager {
    db: Database,
    prefs: PreferenceStore,
    source: Box<dyn BundleSource>,
}

impl QuotesSyncManager {
    pub fn new(db: Database, prefs: PreferenceStore, source: Box<dyn BundleSource>) -> Self {
        Self { db, prefs, source }
    }

    /// Replace imported quotes if the bundle version is strictly newer.
    ///
    /// The quote swap is one transaction; the version is written after it, so
    /// an interrupted run simply imports again next time.
    pub async fn sync_default_quotes(&self) -> Result<SyncOutcome> {
        let stored = self.prefs.bundle_version()?;

        let Some(bundle) = self.source.load().await? else {
            info!("No quote bundle found at {}", self.source.describe());
            return Ok(SyncOutcome::BundleMissing);
        };

        if bundle.version <= stored {
            debug!("Bundle v{} is not newer than stored v{}", bundle.version, stored);
            return Ok(SyncOutcome::UpToDate {
                stored,
                bundled: bundle.version,
            });
        }

        let records = bundle.to_records();
        let count = self.db.replace_source(QuoteSource::Remote, &records)?;
        self.prefs.set_bundle_version(bundle.version)?;

        info!(
            "Imported {} bundled quotes (v{} -> v{}) from {}",
            count,
            stored,
            bundle.version,
            self.source.describe()
        );
        Ok(SyncOutcome::Imported {
            version: bundle.version,
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn bundle(version: i64, texts: &[&str]) -> Bundle {
        Bundle {
            version,
            quotes: texts
                .iter()
                .enumerate()
                .map(|(i, t)| BundleQuote {
                    id: format!("q{}", i),
                    text: t.to_string(),
                    author: "Anon".to_string(),
                    language: "en".to_string(),
                    tags: vec!["calm".to_string(), "focus".to_string()],
                })
                .collect(),
        }
    }

    fn manager(db: &Database, prefs: &PreferenceStore, b: Bundle) -> QuotesSyncManager {
        QuotesSyncManager::new(db.clone(), prefs.clone(), Box::new(StaticBundleSource::new(b)))
    }

    #[test]
    fn parses_payload_with_defaults() {
        let parsed = Bundle::from_json(
            r#"{"version": 2, "quotes": [
                {"id": "a", "text": "Breathe.", "author": "", "language": "ko", "tags": ["calm"]},
                {"id": "b", "text": "Begin."}
            ]}"#,
        )
        .unwrap();

        let records = parsed.to_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].author, None);
        assert_eq!(records[0].language, "ko");
        assert_eq!(records[0].tags, "calm");
        assert_eq!(records[1].language, "en");
        assert_eq!(records[1].tags, "");
        assert!(records.iter().all(|r| r.source == QuoteSource::Remote));
    }

    #[tokio::test]
    async fn newer_bundle_replaces_imported_quotes() {
        let db = Database::in_memory().unwrap();
        let prefs = PreferenceStore::in_memory();
        let mine = db.insert(&NewQuote::local("my own")).unwrap();

        let first = manager(&db, &prefs, bundle(1, &["a", "b", "c"]));
        assert_eq!(
            first.sync_default_quotes().await.unwrap(),
            SyncOutcome::Imported { version: 1, count: 3 }
        );

        let second = manager(&db, &prefs, bundle(2, &["x", "y"]));
        assert_eq!(
            second.sync_default_quotes().await.unwrap(),
            SyncOutcome::Imported { version: 2, count: 2 }
        );

        let mut remote: Vec<String> = db
            .get_by_source(QuoteSource::Remote)
            .unwrap()
            .into_iter()
            .map(|q| q.content)
            .collect();
        remote.sort();
        assert_eq!(remote, vec!["x", "y"]);
        assert_eq!(db.get_by_id(mine.id).unwrap(), Some(mine));
        assert_eq!(prefs.bundle_version().unwrap(), 2);

        let stored = db.get_by_source(QuoteSource::Remote).unwrap();
        assert_eq!(stored[0].tags, "calm,focus");
        assert_eq!(stored[0].author.as_deref(), Some("Anon"));
    }

    #[tokio::test]
    async fn same_or_older_version_is_a_no_op() {
        let db = Database::in_memory().unwrap();
        let prefs = PreferenceStore::in_memory();
        manager(&db, &prefs, bundle(3, &["a", "b"])).sync_default_quotes().await.unwrap();

        for version in [3, 1] {
            let outcome = manager(&db, &prefs, bundle(version, &["z"]))
                .sync_default_quotes()
                .await
                .unwrap();
            assert_eq!(outcome, SyncOutcome::UpToDate { stored: 3, bundled: version });
            assert_eq!(db.count().unwrap(), 2);
            assert_eq!(prefs.bundle_version().unwrap(), 3);
        }
    }

    #[tokio::test]
    async fn missing_bundle_degrades() {
        let dir = tempdir().unwrap();
        let db = Database::in_memory().unwrap();
        let prefs = PreferenceStore::in_memory();
        let sync = QuotesSyncManager::new(
            db.clone(),
            prefs.clone(),
            Box::new(FileBundleSource::new(dir.path().join("absent.json"))),
        );

        assert_eq!(sync.sync_default_quotes().await.unwrap(), SyncOutcome::BundleMissing);
        assert_eq!(db.count().unwrap(), 0);
        assert_eq!(prefs.bundle_version().unwrap(), 0);

        let empty = QuotesSyncManager::new(db, prefs, Box::new(StaticBundleSource::empty()));
        assert_eq!(empty.sync_default_quotes().await.unwrap(), SyncOutcome::BundleMissing);
    }

    #[tokio::test]
    async fn file_bundle_is_read_and_malformed_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quotes.json");
        std::fs::write(&path, serde_json::to_string(&bundle(5, &["from disk"])).unwrap()).unwrap();

        let db = Database::in_memory().unwrap();
        let prefs = PreferenceStore::in_memory();
        let sync = QuotesSyncManager::new(db.clone(), prefs.clone(), Box::new(FileBundleSource::new(&path)));
        assert_eq!(
            sync.sync_default_quotes().await.unwrap(),
            SyncOutcome::Imported { version: 5, count: 1 }
        );

        std::fs::write(&path, "{\"version\": \"six\"}").unwrap();
        assert!(sync.sync_default_quotes().await.is_err());
        assert_eq!(prefs.bundle_version().unwrap(), 5);
    }
}
