// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ulrim: Personal Quotes Library
//!
//! Collect the sayings you live by, get one a day, browse the bundled
//! defaults and share any quote as text or as an image card.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use ulrim::config::AppConfig;
use ulrim::daily::DailyQuoteManager;
use ulrim::db::{Database, Quote};
use ulrim::library::QuoteLibrary;
use ulrim::prefs::PreferenceStore;
use ulrim::share::{share_text, ShareCardGenerator};
use ulrim::sync::{
    source_from_config, BundleSource, FileBundleSource, HttpBundleSource, QuotesSyncManager, SyncOutcome,
};
use ulrim::widget::{WidgetKind, WidgetProvider};
use ulrim::{Result, UlrimError};

/// Ulrim CLI - Personal Quotes Library
#[derive(Parser, Debug)]
#[command(name = "ulrim")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.0.0")]
#[command(about = "Find your principle. Reset your mind.", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show today's quote
    Today,

    /// Show a random quote from the configured pool
    Random,

    /// Add a quote of your own
    Add {
        /// Quote text
        content: String,

        /// Who said it
        #[arg(short, long)]
        author: Option<String>,

        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// List stored quotes
    List {
        /// Only quotes from this source (local or remote)
        #[arg(short, long, value_parser = ["local", "remote"])]
        source: Option<String>,
    },

    /// Show a single quote
    Show {
        id: i64,
    },

    /// Replace a quote's text
    Edit {
        id: i64,
        content: String,
    },

    /// Delete a quote
    Delete {
        id: i64,
    },

    /// Search quote text, authors and tags
    Search {
        query: String,

        /// Maximum results
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// List the bundled default quotes
    Browse,

    /// Save bundled quotes into your own collection
    Adopt {
        /// Ids of bundled quotes
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Import the default quote bundle if it is newer
    Sync {
        /// Read the bundle from this file instead of the configured source
        #[arg(long, conflicts_with = "url")]
        bundle: Option<PathBuf>,

        /// Fetch the bundle from this URL instead of the configured source
        #[arg(long)]
        url: Option<String>,
    },

    /// Share a quote as text or as an image card
    Share {
        id: i64,

        /// Print the text payload
        #[arg(long)]
        text: bool,

        /// Write a PNG card (to the output directory when no path is given)
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        image: Option<String>,
    },

    /// Render a home-screen widget
    Widget {
        /// Widget style (default or simple)
        #[arg(default_value = "default")]
        kind: String,

        /// Terminal width used for wrapping
        #[arg(long, default_value = "40")]
        columns: usize,
    },

    /// User settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommands,
    },

    /// First-run onboarding
    Onboarding {
        #[command(subcommand)]
        action: OnboardingCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbCommands,
    },

    /// Initialize a new Ulrim directory
    Init {
        /// Directory to initialize (default: current)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommands {
    /// Show current settings
    Show,

    /// Change a setting
    Set {
        /// font_size, animation_on, background_on, widget_mode,
        /// quote_source, widget_quote_source or onboarding_completed
        key: String,
        value: String,
    },
}

#[derive(Subcommand, Debug)]
enum OnboardingCommands {
    /// Show whether onboarding is done
    Status,

    /// Mark onboarding as done
    Complete,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    /// Show database statistics
    Stats,

    /// Vacuum database (reclaim space)
    Vacuum,

    /// Export all quotes to JSON
    Export {
        /// Output file
        output: PathBuf,
    },
}

/// Stores and services shared by the quote commands
struct App {
    config: AppConfig,
    library: QuoteLibrary,
    json: bool,
}

impl App {
    fn open(config: AppConfig, format: &str) -> Result<Self> {
        let db = Database::open(&config.database.path)?;
        let prefs = PreferenceStore::open(&config.preferences.path)?;
        Ok(Self {
            library: QuoteLibrary::new(db, prefs),
            config,
            json: format == "json",
        })
    }

    fn db(&self) -> &Database {
        self.library.database()
    }

    fn prefs(&self) -> &PreferenceStore {
        self.library.preferences()
    }

    fn daily(&self) -> DailyQuoteManager {
        DailyQuoteManager::new(self.db().clone(), self.prefs().clone())
    }

    fn sync_manager(&self, bundle: Option<PathBuf>, url: Option<String>) -> Result<QuotesSyncManager> {
        let source: Box<dyn BundleSource> = match (bundle, url) {
            (Some(path), _) => Box::new(FileBundleSource::new(path)),
            (None, Some(url)) => Box::new(HttpBundleSource::new(
                &url,
                std::time::Duration::from_secs(self.config.bundle.timeout_secs),
            )?),
            (None, None) => source_from_config(&self.config.bundle)?,
        };
        Ok(QuotesSyncManager::new(self.db().clone(), self.prefs().clone(), source))
    }

    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn print_quote(&self, quote: Option<&Quote>) -> Result<()> {
        if self.json {
            return self.print_json(&serde_json::json!({
                "quote": quote,
                "text": QuoteLibrary::display_text(quote),
            }));
        }
        println!("{}", QuoteLibrary::display_text(quote));
        if let Some(author) = quote.and_then(|q| q.author.as_deref()) {
            println!("  - {}", author);
        }
        Ok(())
    }

    fn print_quotes(&self, quotes: &[Quote]) -> Result<()> {
        if self.json {
            return self.print_json(&quotes);
        }
        if quotes.is_empty() {
            println!("No quotes.");
        }
        for q in quotes {
            let author = q.author.as_deref().map(|a| format!(" - {}", a)).unwrap_or_default();
            let tags = if q.tags.is_empty() { String::new() } else { format!(" [{}]", q.tags) };
            println!("{:>5}  {}{}{}  ({})", q.id, q.content, author, tags, q.source);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Load configuration
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Some(Commands::Config { action }) => run_config_command(config, action, &cli.config),
        Some(Commands::Init { dir, force }) => run_init(dir, force),
        command => {
            let app = App::open(config, &cli.format)?;
            if app.config.bundle.sync_on_start && shows_quotes(&command) {
                sync_on_start(&app).await;
            }
            run_command(&app, command).await
        }
    }
}

/// Commands that draw from the quote pool and so import a newer bundle first
fn shows_quotes(command: &Option<Commands>) -> bool {
    matches!(
        command,
        None | Some(Commands::Today)
            | Some(Commands::Random)
            | Some(Commands::Browse)
            | Some(Commands::Widget { .. })
    )
}

/// Startup import; failures never abort the command
async fn sync_on_start(app: &App) {
    let manager = match app.sync_manager(None, None) {
        Ok(manager) => manager,
        Err(e) => {
            warn!("Startup sync skipped: {}", e);
            return;
        }
    };
    if let Err(e) = manager.sync_default_quotes().await {
        warn!("Startup sync failed: {}", e);
    }
}

async fn run_command(app: &App, command: Option<Commands>) -> Result<()> {
    match command {
        None => run_main_screen(app),
        Some(Commands::Today) => {
            let filter = app.prefs().user_preferences()?.quote_source;
            app.print_quote(app.daily().get_or_update_today_quote(filter)?.as_ref())
        }
        Some(Commands::Random) => app.print_quote(app.library.random_quote()?.as_ref()),
        Some(Commands::Add { content, author, tags }) => {
            let quote = app.library.add_quote(&content, author.as_deref(), &tags)?;
            if app.json {
                app.print_json(&quote)
            } else {
                println!("Saved quote {}", quote.id);
                Ok(())
            }
        }
        Some(Commands::List { source }) => {
            let quotes = match source.as_deref() {
                Some("local") => app.library.local_quotes()?,
                Some("remote") => app.library.remote_quotes()?,
                _ => app.library.all_quotes()?,
            };
            app.print_quotes(&quotes)
        }
        Some(Commands::Show { id }) => {
            let quote = app.library.get(id)?;
            if app.json {
                return app.print_json(&quote);
            }
            app.print_quote(Some(&quote))?;
            if !quote.tags.is_empty() {
                println!("  tags: {}", quote.tag_list().join(", "));
            }
            println!("  source: {}  language: {}", quote.source, quote.language);
            Ok(())
        }
        Some(Commands::Edit { id, content }) => {
            let quote = app.library.update_content(id, &content)?;
            if app.json {
                app.print_json(&quote)
            } else {
                println!("Updated quote {}", quote.id);
                Ok(())
            }
        }
        Some(Commands::Delete { id }) => {
            app.library.delete_quote(id)?;
            if !app.json {
                println!("Deleted quote {}", id);
            }
            Ok(())
        }
        Some(Commands::Search { query, limit }) => app.print_quotes(&app.library.search(&query, limit)?),
        Some(Commands::Browse) => app.print_quotes(&app.library.remote_quotes()?),
        Some(Commands::Adopt { ids }) => {
            let adopted = app.library.adopt_remote(&ids)?;
            if app.json {
                app.print_json(&adopted)
            } else {
                println!("Saved {} of {} selected quotes", adopted.len(), ids.len());
                Ok(())
            }
        }
        Some(Commands::Sync { bundle, url }) => run_sync(app, bundle, url).await,
        Some(Commands::Share { id, text, image }) => run_share(app, id, text, image),
        Some(Commands::Widget { kind, columns }) => run_widget(app, &kind, columns),
        Some(Commands::Settings { action }) => run_settings_command(app, action),
        Some(Commands::Onboarding { action }) => run_onboarding_command(app, action),
        Some(Commands::Db { action }) => run_db_command(app, action),
        Some(Commands::Config { .. }) | Some(Commands::Init { .. }) => Ok(()),
    }
}

/// Welcome on first run, a random quote afterwards
fn run_main_screen(app: &App) -> Result<()> {
    let prefs = app.prefs().user_preferences()?;
    if prefs.onboarding_completed || app.json {
        return app.print_quote(app.library.random_quote()?.as_ref());
    }

    println!("Welcome to Ulrim");
    println!();
    println!("Find your principle.");
    println!("Reset your mind.");
    println!();
    println!("  ulrim add \"<quote>\"      Add my first quote");
    println!("  ulrim browse             Browse default quotes");
    println!("  ulrim onboarding complete  Skip for now");
    Ok(())
}

async fn run_sync(app: &App, bundle: Option<PathBuf>, url: Option<String>) -> Result<()> {
    let outcome = app.sync_manager(bundle, url)?.sync_default_quotes().await?;
    if app.json {
        return app.print_json(&outcome);
    }
    match outcome {
        SyncOutcome::Imported { version, count } => {
            println!("Imported {} default quotes (bundle v{})", count, version)
        }
        SyncOutcome::UpToDate { stored, bundled } => {
            println!("Default quotes up to date (stored v{}, bundle v{})", stored, bundled)
        }
        SyncOutcome::BundleMissing => println!("No quote bundle found"),
    }
    Ok(())
}

fn run_share(app: &App, id: i64, text: bool, image: Option<String>) -> Result<()> {
    let quote = app.library.get(id)?;

    if text || image.is_none() {
        println!("{}", share_text(&quote));
    }

    if let Some(path) = image {
        let path = if path.is_empty() {
            let dir = PathBuf::from(&app.config.share.output_dir);
            std::fs::create_dir_all(&dir)?;
            dir.join(format!("quote-{}.png", quote.id))
        } else {
            PathBuf::from(path)
        };

        let written = ShareCardGenerator::from_config(&app.config.share)
            .and_then(|cards| cards.render_to_file(&quote.content, &path));
        match written {
            Ok(path) => {
                if !app.json {
                    println!("Card written to {}", path.display());
                }
            }
            Err(e) => error!("Failed to create share card: {}", e),
        }
    }

    Ok(())
}

fn run_widget(app: &App, kind: &str, columns: usize) -> Result<()> {
    let kind: WidgetKind = kind.parse()?;
    let widgets = WidgetProvider::new(app.db().clone(), app.prefs().clone());
    let view = widgets.render(kind)?;

    if app.json {
        return app.print_json(&view);
    }

    let rule = "-".repeat(columns);
    println!("{}", rule);
    if let Some(header) = &view.header {
        println!("{}", header);
        println!();
    }
    for line in view.to_lines(columns) {
        println!("{}", line);
    }
    if let Some(footer) = &view.footer {
        println!();
        println!("{}", footer);
    }
    println!("{}", rule);
    println!("opens {}", view.deep_link);
    Ok(())
}

fn run_settings_command(app: &App, action: SettingsCommands) -> Result<()> {
    if let SettingsCommands::Set { key, value } = &action {
        app.prefs().set_from_str(key, value)?;
        info!("Setting {} = {}", key, value);
    }

    let prefs = app.prefs().user_preferences()?;
    if app.json {
        return app.print_json(&prefs);
    }
    println!("Settings:");
    println!("  font_size:           {} ({:?})", prefs.font_size.index(), prefs.font_size);
    println!("  animation_on:        {}", prefs.animation_on);
    println!("  background_on:       {}", prefs.background_on);
    println!("  widget_mode:         {}", prefs.widget_mode);
    println!("  quote_source:        {}", prefs.quote_source);
    println!("  widget_quote_source: {}", prefs.widget_quote_source);
    println!("  onboarding_completed: {}", prefs.onboarding_completed);
    Ok(())
}

fn run_onboarding_command(app: &App, action: OnboardingCommands) -> Result<()> {
    if let OnboardingCommands::Complete = action {
        app.prefs().set_onboarding_completed(true)?;
    }
    let completed = app.prefs().user_preferences()?.onboarding_completed;
    if app.json {
        return app.print_json(&serde_json::json!({ "completed": completed }));
    }
    println!("Onboarding {}", if completed { "completed" } else { "pending" });
    Ok(())
}

fn run_db_command(app: &App, action: DbCommands) -> Result<()> {
    match action {
        DbCommands::Stats => {
            let stats = app.db().stats()?;
            if app.json {
                return app.print_json(&stats);
            }
            println!("Database Statistics:");
            println!("  Quotes: {}", stats.quote_count);
            println!("  Mine: {}", stats.local_count);
            println!("  Bundled: {}", stats.remote_count);
            println!("  Bundle version: {}", app.prefs().bundle_version()?);
        }
        DbCommands::Vacuum => {
            app.db().vacuum()?;
            println!("Database vacuumed successfully");
        }
        DbCommands::Export { output } => {
            let quotes = app.db().get_all()?;
            std::fs::write(&output, serde_json::to_string_pretty(&quotes)?)?;
            println!("Exported {} quotes to {:?}", quotes.len(), output);
        }
    }
    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            println!("Configuration at {:?} is valid", config_path);
            println!("  Database: {}", config.database.path);
            println!("  Preferences: {}", config.preferences.path);
            match &config.bundle.url {
                Some(url) => println!("  Bundle: {}", url),
                None => println!("  Bundle: {}", config.bundle.path),
            }
            println!(
                "  Share font: {}",
                config.share.font_path.as_deref().unwrap_or("not set (image cards disabled)")
            );
        }
    }
    Ok(())
}

/// Initialize a new Ulrim directory
fn run_init(dir: Option<PathBuf>, force: bool) -> Result<()> {
    let target = dir.unwrap_or_else(|| PathBuf::from("."));
    let config_path = target.join("config.json");

    if config_path.exists() && !force {
        return Err(UlrimError::Config(
            "config.json already exists. Use --force to overwrite".to_string(),
        ));
    }

    let cards_dir = target.join("cards");
    std::fs::create_dir_all(&cards_dir)?;

    let mut config = AppConfig::default();
    let under = |name: &str| target.join(name).to_string_lossy().to_string();
    config.database.path = under("ulrim.db");
    config.preferences.path = under("ulrim_settings.json");
    config.bundle.path = under("ulrim_quotes.json");
    config.share.output_dir = cards_dir.to_string_lossy().to_string();
    config.save(&config_path)?;

    println!("Ulrim initialized in {:?}", target);
    println!("\nCreated:");
    println!("  - config.json");
    println!("  - cards/");
    println!("\nNext steps:");
    println!("  1. Set share.font_path in config.json to enable image cards");
    println!("  2. Add a quote: ulrim add \"Be here now.\"");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulrim::db::SourceFilter;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["ulrim"]).unwrap();
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
        assert_eq!(cli.format, "text");
    }

    #[test]
    fn test_cli_add_command() {
        let cli = Cli::try_parse_from([
            "ulrim", "add", "Be here now.", "--author", "Ram Dass", "--tag", "calm", "-t", "focus",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Add { content, author, tags }) => {
                assert_eq!(content, "Be here now.");
                assert_eq!(author.as_deref(), Some("Ram Dass"));
                assert_eq!(tags, vec!["calm", "focus"]);
            }
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn test_cli_share_image_without_path() {
        let cli = Cli::try_parse_from(["ulrim", "share", "3", "--image"]).unwrap();
        match cli.command {
            Some(Commands::Share { id, text, image }) => {
                assert_eq!(id, 3);
                assert!(!text);
                assert_eq!(image.as_deref(), Some(""));
            }
            _ => panic!("Expected Share command"),
        }

        let cli = Cli::try_parse_from(["ulrim", "share", "3", "--image", "card.png", "--text"]).unwrap();
        match cli.command {
            Some(Commands::Share { text, image, .. }) => {
                assert!(text);
                assert_eq!(image.as_deref(), Some("card.png"));
            }
            _ => panic!("Expected Share command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_source_and_format() {
        assert!(Cli::try_parse_from(["ulrim", "list", "--source", "everywhere"]).is_err());
        assert!(Cli::try_parse_from(["ulrim", "--format", "yaml", "today"]).is_err());
        assert!(Cli::try_parse_from(["ulrim", "adopt"]).is_err());
        assert!(Cli::try_parse_from(["ulrim", "sync", "--bundle", "a.json", "--url", "http://x"]).is_err());
    }

    #[test]
    fn test_cli_settings_set() {
        let cli = Cli::try_parse_from(["ulrim", "--format", "json", "settings", "set", "widget_mode", "random"])
            .unwrap();
        assert_eq!(cli.format, "json");
        match cli.command {
            Some(Commands::Settings { action: SettingsCommands::Set { key, value } }) => {
                assert_eq!(key, "widget_mode");
                assert_eq!(value, "random");
            }
            _ => panic!("Expected Settings Set command"),
        }
    }

    #[test]
    fn test_startup_sync_only_for_quote_screens() {
        let parse = |args: &[&str]| Cli::try_parse_from(args).unwrap().command;

        assert!(shows_quotes(&parse(&["ulrim"])));
        assert!(shows_quotes(&parse(&["ulrim", "today"])));
        assert!(shows_quotes(&parse(&["ulrim", "browse"])));
        assert!(shows_quotes(&parse(&["ulrim", "widget", "simple"])));

        assert!(!shows_quotes(&parse(&["ulrim", "delete", "4"])));
        assert!(!shows_quotes(&parse(&["ulrim", "settings", "show"])));
        assert!(!shows_quotes(&parse(&["ulrim", "sync"])));
    }

    #[test]
    fn test_app_reads_and_writes_stores() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.database.path = dir.path().join("q.db").to_string_lossy().to_string();
        config.preferences.path = dir.path().join("p.json").to_string_lossy().to_string();

        let app = App::open(config.clone(), "text").unwrap();
        app.library.add_quote("kept", None, &[]).unwrap();
        app.prefs().set_quote_source(SourceFilter::LocalOnly).unwrap();
        drop(app);

        let reopened = App::open(config, "json").unwrap();
        assert!(reopened.json);
        assert_eq!(reopened.library.all_quotes().unwrap().len(), 1);
        assert_eq!(
            reopened.prefs().user_preferences().unwrap().quote_source,
            SourceFilter::LocalOnly
        );
    }
}
