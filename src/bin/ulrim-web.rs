// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ulrim Web Dashboard
//!
//! Standalone web server for the Ulrim quote screens and widgets.

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, warn};

use ulrim::config::AppConfig;
use ulrim::db::Database;
use ulrim::prefs::PreferenceStore;
use ulrim::sync::{source_from_config, QuotesSyncManager};
use ulrim::Result;

#[derive(Parser, Debug)]
#[command(name = "ulrim-web")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.0.0")]
#[command(about = "Ulrim Web Dashboard Server")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Open browser automatically
    #[arg(long)]
    open: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Ulrim Web Dashboard v1.0.0");

    let mut config = AppConfig::load(&args.config)?;

    if let Some(host) = args.host {
        config.web.host = host;
    }
    if let Some(port) = args.port {
        config.web.port = port;
    }

    let db = Database::open(&config.database.path)?;
    info!("Database: {}", config.database.path);
    let prefs = PreferenceStore::open(&config.preferences.path)?;

    if config.bundle.sync_on_start {
        let synced = match source_from_config(&config.bundle) {
            Ok(source) => QuotesSyncManager::new(db.clone(), prefs.clone(), source)
                .sync_default_quotes()
                .await
                .map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = synced {
            warn!("Startup sync failed: {}", e);
        }
    }

    if args.open {
        let url = format!("http://{}:{}", config.web.host, config.web.port);
        if let Err(e) = open_browser(&url) {
            error!("Failed to open browser: {}", e);
        }
    }

    ulrim::web::start_server(config, db, prefs).await
}

fn open_browser(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()?;
    }
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }
    Ok(())
}
