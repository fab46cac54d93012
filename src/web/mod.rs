// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Web UI for the Ulrim quote library

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::daily::DailyQuoteManager;
use crate::db::{Database, DbStats, Quote, QuoteSource, SourceFilter};
use crate::library::{QuoteLibrary, PLACEHOLDER};
use crate::prefs::{PreferenceStore, UserPreferences, WidgetMode};
use crate::share::{share_text, ShareCardGenerator};
use crate::sync::{source_from_config, BundleSource, QuotesSyncManager, SyncOutcome};
use crate::widget::{WidgetProvider, WidgetView};
use crate::UlrimError;

/// Shared application state
pub struct AppState {
    pub library: QuoteLibrary,
    pub daily: DailyQuoteManager,
    pub widgets: WidgetProvider,
    pub sync: QuotesSyncManager,
    pub cards: Option<ShareCardGenerator>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, db: Database, prefs: PreferenceStore) -> crate::Result<Self> {
        let source = source_from_config(&config.bundle)?;
        let cards = match ShareCardGenerator::from_config(&config.share) {
            Ok(generator) => Some(generator),
            Err(e) => {
                warn!("Share cards disabled: {}", e);
                None
            }
        };
        Ok(Self {
            library: QuoteLibrary::new(db.clone(), prefs.clone()),
            daily: DailyQuoteManager::new(db.clone(), prefs.clone()),
            widgets: WidgetProvider::new(db.clone(), prefs.clone()),
            sync: QuotesSyncManager::new(db, prefs, source),
            cards,
            config,
        })
    }

    /// Swap the bundle source (tests, alternate deployments)
    pub fn with_bundle_source(mut self, source: Box<dyn BundleSource>) -> Self {
        let db = self.library.database().clone();
        let prefs = self.library.preferences().clone();
        self.sync = QuotesSyncManager::new(db, prefs, source);
        self
    }

    fn prefs(&self) -> &PreferenceStore {
        self.library.preferences()
    }
}

/// Error response: validation is 400, unknown quotes 404, everything else 500
pub struct ApiError(UlrimError);

impl From<UlrimError> for ApiError {
    fn from(err: UlrimError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            UlrimError::Validation(_) => StatusCode::BAD_REQUEST,
            UlrimError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self.0);
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Pages
        .route("/", get(index_page))
        .route("/quotes", get(quotes_page))
        .route("/browse", get(browse_page))
        .route("/settings", get(settings_page))
        .route("/widget/:kind", get(widget_page))
        // API endpoints
        .route("/api/quotes", get(api_list_quotes).post(api_add_quote))
        .route(
            "/api/quotes/:id",
            get(api_get_quote).put(api_update_quote).delete(api_delete_quote),
        )
        .route("/api/quotes/:id/card.png", get(api_quote_card))
        .route("/api/quotes/:id/text", get(api_quote_text))
        .route("/api/today", get(api_today))
        .route("/api/random", get(api_random))
        .route("/api/widget/:kind", get(api_widget))
        .route("/api/settings", get(api_get_settings).put(api_update_settings))
        .route("/api/sync", post(api_sync))
        .route("/api/browse/adopt", post(api_adopt))
        .route("/api/onboarding/complete", post(api_complete_onboarding))
        .route("/api/stats", get(api_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// === Page Handlers ===

async fn index_page(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    let prefs = state.prefs().user_preferences()?;
    let quote = state.library.random_quote()?;
    let today = state.daily.get_or_update_today_quote(prefs.quote_source)?;
    Ok(Html(render_index(quote.as_ref(), today.as_ref(), &prefs)))
}

async fn quotes_page(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    let quotes = state.library.all_quotes()?;
    Ok(Html(render_quotes_page(&quotes)))
}

async fn browse_page(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    let quotes = state.library.remote_quotes()?;
    Ok(Html(render_browse_page(&quotes)))
}

async fn settings_page(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    let prefs = state.prefs().user_preferences()?;
    let version = state.prefs().bundle_version()?;
    Ok(Html(render_settings_page(&prefs, version, &state.config)))
}

async fn widget_page(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> ApiResult<Html<String>> {
    let view = state.widgets.render(kind.parse()?)?;
    Ok(Html(render_widget_page(&view)))
}

// === API Handlers ===

#[derive(Deserialize)]
struct QuotesQuery {
    source: Option<String>,
    q: Option<String>,
    limit: Option<usize>,
}

async fn api_list_quotes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuotesQuery>,
) -> ApiResult<Json<Vec<Quote>>> {
    let quotes = if let Some(q) = query.q {
        state.library.search(&q, query.limit.unwrap_or(50))?
    } else {
        let mut quotes = match query.source.as_deref() {
            Some("local") => state.library.local_quotes()?,
            Some("remote") => state.library.remote_quotes()?,
            Some(other) => {
                return Err(UlrimError::Validation(format!("unknown source '{}'", other)).into())
            }
            None => state.library.all_quotes()?,
        };
        if let Some(limit) = query.limit {
            quotes.truncate(limit);
        }
        quotes
    };
    Ok(Json(quotes))
}

#[derive(Deserialize)]
struct NewQuoteRequest {
    content: String,
    author: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

async fn api_add_quote(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewQuoteRequest>,
) -> ApiResult<(StatusCode, Json<Quote>)> {
    let quote = state
        .library
        .add_quote(&req.content, req.author.as_deref(), &req.tags)?;
    Ok((StatusCode::CREATED, Json(quote)))
}

async fn api_get_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Quote>> {
    Ok(Json(state.library.get(id)?))
}

#[derive(Deserialize)]
struct UpdateQuoteRequest {
    content: String,
}

async fn api_update_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateQuoteRequest>,
) -> ApiResult<Json<Quote>> {
    Ok(Json(state.library.update_content(id, &req.content)?))
}

async fn api_delete_quote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.library.delete_quote(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn api_quote_text(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<String> {
    Ok(share_text(&state.library.get(id)?))
}

async fn api_quote_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let quote = state.library.get(id)?;
    let Some(cards) = &state.cards else {
        warn!("Share card requested for quote {} but no font is configured", id);
        return Ok((StatusCode::SERVICE_UNAVAILABLE, "share cards are not configured").into_response());
    };
    match cards.render_png(&quote.content) {
        Ok(png) => Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response()),
        Err(e) => {
            error!("Failed to render share card for quote {}: {}", id, e);
            Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

#[derive(Serialize)]
struct QuoteResponse {
    quote: Option<Quote>,
    text: String,
}

impl QuoteResponse {
    fn new(quote: Option<Quote>) -> Self {
        let text = QuoteLibrary::display_text(quote.as_ref()).to_string();
        Self { quote, text }
    }
}

async fn api_today(State(state): State<Arc<AppState>>) -> ApiResult<Json<QuoteResponse>> {
    let filter = state.prefs().user_preferences()?.quote_source;
    let quote = state.daily.get_or_update_today_quote(filter)?;
    Ok(Json(QuoteResponse::new(quote)))
}

async fn api_random(State(state): State<Arc<AppState>>) -> ApiResult<Json<QuoteResponse>> {
    Ok(Json(QuoteResponse::new(state.library.random_quote()?)))
}

async fn api_widget(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> ApiResult<Json<WidgetView>> {
    Ok(Json(state.widgets.render(kind.parse()?)?))
}

async fn api_get_settings(State(state): State<Arc<AppState>>) -> ApiResult<Json<UserPreferences>> {
    Ok(Json(state.prefs().user_preferences()?))
}

#[derive(Deserialize, Default)]
struct SettingsUpdate {
    font_size: Option<u8>,
    animation_on: Option<bool>,
    background_on: Option<bool>,
    widget_mode: Option<WidgetMode>,
    quote_source: Option<SourceFilter>,
    widget_quote_source: Option<SourceFilter>,
    onboarding_completed: Option<bool>,
}

async fn api_update_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<Json<UserPreferences>> {
    let prefs = state.prefs();
    if let Some(size) = update.font_size {
        prefs.set_font_size(size)?;
    }
    if let Some(on) = update.animation_on {
        prefs.set_animation_on(on)?;
    }
    if let Some(on) = update.background_on {
        prefs.set_background_on(on)?;
    }
    if let Some(mode) = update.widget_mode {
        prefs.set_widget_mode(mode)?;
    }
    if let Some(source) = update.quote_source {
        prefs.set_quote_source(source)?;
    }
    if let Some(source) = update.widget_quote_source {
        prefs.set_widget_quote_source(source)?;
    }
    if let Some(done) = update.onboarding_completed {
        prefs.set_onboarding_completed(done)?;
    }
    Ok(Json(prefs.user_preferences()?))
}

async fn api_sync(State(state): State<Arc<AppState>>) -> ApiResult<Json<SyncOutcome>> {
    Ok(Json(state.sync.sync_default_quotes().await?))
}

#[derive(Deserialize)]
struct AdoptRequest {
    ids: Vec<i64>,
}

async fn api_adopt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdoptRequest>,
) -> ApiResult<Json<Vec<Quote>>> {
    Ok(Json(state.library.adopt_remote(&req.ids)?))
}

async fn api_complete_onboarding(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    state.prefs().set_onboarding_completed(true)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn api_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<DbStats>> {
    Ok(Json(state.library.database().stats()?))
}

// === Template Rendering ===

/// Escape text for inclusion in HTML
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn base_template(title: &str, content: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Ulrim</title>
    <style>
        :root {{
            --bg-primary: #121212;
            --bg-secondary: #1c1c1c;
            --bg-card: #242424;
            --text-primary: #f2f2f2;
            --text-secondary: #9a9a9a;
            --accent: #e0c097;
            --border: #333333;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: Georgia, 'Times New Roman', serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
        }}
        .container {{ max-width: 960px; margin: 0 auto; padding: 20px; }}
        nav {{
            background: var(--bg-secondary);
            padding: 15px 20px;
            display: flex;
            align-items: center;
            gap: 30px;
            border-bottom: 1px solid var(--border);
        }}
        nav .logo {{
            font-size: 1.5em;
            font-weight: bold;
            color: var(--accent);
            text-decoration: none;
        }}
        nav a {{ color: var(--text-secondary); text-decoration: none; }}
        nav a:hover {{ color: var(--text-primary); }}
        .card {{
            background: var(--bg-card);
            border-radius: 12px;
            padding: 20px;
            margin-bottom: 20px;
        }}
        .card h2 {{ margin-bottom: 15px; color: var(--accent); }}
        .principle {{
            min-height: 50vh;
            display: flex;
            flex-direction: column;
            justify-content: center;
            text-align: center;
            white-space: pre-line;
        }}
        .author {{ color: var(--text-secondary); margin-top: 12px; }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{ padding: 12px; text-align: left; border-bottom: 1px solid var(--border); }}
        th {{ color: var(--text-secondary); font-weight: 500; }}
        .tag {{
            display: inline-block;
            border: 1px solid var(--accent);
            color: var(--accent);
            padding: 0 8px;
            border-radius: 12px;
            font-size: 0.8em;
            margin: 2px;
        }}
        .source-badge {{
            display: inline-block;
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            padding: 2px 8px;
            border-radius: 6px;
            font-size: 0.8em;
        }}
        .widget {{
            width: 320px;
            padding: 16px;
            border-radius: 16px;
            text-align: center;
        }}
        .widget.default {{ background: #121212; border: 1px solid var(--border); }}
        .widget.simple {{ background: transparent; }}
        .muted {{ color: var(--text-secondary); font-size: 0.8em; }}
        button {{
            background: var(--accent);
            border: none;
            border-radius: 8px;
            padding: 8px 16px;
            cursor: pointer;
        }}
    </style>
</head>
<body>
    <nav>
        <a href="/" class="logo">Ulrim</a>
        <a href="/">Today</a>
        <a href="/quotes">My Quotes</a>
        <a href="/browse">Browse</a>
        <a href="/settings">Settings</a>
    </nav>
    <main class="container">
        {}
    </main>
</body>
</html>"#, escape_html(title), content)
}

fn render_tags(quote: &Quote) -> String {
    quote
        .tag_list()
        .iter()
        .map(|t| format!(r#"<span class="tag">{}</span>"#, escape_html(t)))
        .collect()
}

fn render_index(quote: Option<&Quote>, today: Option<&Quote>, prefs: &UserPreferences) -> String {
    let onboarding = if prefs.onboarding_completed {
        String::new()
    } else {
        r#"
        <div class="card">
            <h2>Welcome to Ulrim</h2>
            <p>Find your principle.<br>Reset your mind.</p>
            <p style="margin-top: 12px;">
                <a href="/quotes">Add My First Quote</a> &middot;
                <a href="/browse">Browse Default Quotes</a> &middot;
                <button onclick="fetch('/api/onboarding/complete', {method: 'POST'}).then(() => location.reload())">Skip for now</button>
            </p>
        </div>
        "#
        .to_string()
    };

    let size = 2.0 * prefs.font_size.scale();
    let principle = match quote {
        Some(q) => {
            let author = q
                .author
                .as_deref()
                .map(|a| format!(r#"<div class="author">{}</div>"#, escape_html(a)))
                .unwrap_or_default();
            format!(
                r#"<div style="font-size: {:.2}rem;">{}</div>{}
                <p class="muted" style="margin-top: 20px;">
                    <a href="/api/quotes/{id}/text">Share as Text</a> &middot;
                    <a href="/api/quotes/{id}/card.png">Share as Image</a>
                </p>"#,
                size,
                escape_html(&q.content),
                author,
                id = q.id
            )
        }
        None => format!(
            r#"<div style="font-size: {:.2}rem;">{}
Or add a new one.</div>"#,
            size,
            PLACEHOLDER
        ),
    };

    let today_html = format!(
        r#"<div class="card"><h2>Today's Quote</h2><p>{}</p></div>"#,
        escape_html(QuoteLibrary::display_text(today))
    );

    let content = format!(
        r#"
        {}
        <div class="card principle">{}</div>
        {}
    "#,
        onboarding, principle, today_html
    );

    base_template("Today", &content)
}

fn render_quotes_table(quotes: &[Quote]) -> String {
    let rows: String = quotes
        .iter()
        .map(|q| {
            format!(
                r#"
                <tr>
                    <td>{}</td>
                    <td>{}</td>
                    <td>{}</td>
                    <td><span class="source-badge">{}</span></td>
                </tr>
            "#,
                escape_html(&q.content),
                escape_html(q.author.as_deref().unwrap_or("-")),
                render_tags(q),
                match q.source {
                    QuoteSource::Local => "Mine",
                    QuoteSource::Remote => "Bundled",
                }
            )
        })
        .collect();

    format!(
        r#"
        <table>
            <tr>
                <th>Quote</th>
                <th>Author</th>
                <th>Tags</th>
                <th>Source</th>
            </tr>
            {}
        </table>
    "#,
        rows
    )
}

fn render_quotes_page(quotes: &[Quote]) -> String {
    let body = if quotes.is_empty() {
        "<p>No quotes yet.</p>".to_string()
    } else {
        render_quotes_table(quotes)
    };
    let content = format!(
        r#"
        <h1>My Quotes</h1>
        <div class="card">
            {}
        </div>
    "#,
        body
    );

    base_template("My Quotes", &content)
}

fn render_browse_page(quotes: &[Quote]) -> String {
    let items: String = quotes
        .iter()
        .map(|q| {
            format!(
                r#"<p><label><input type="checkbox" class="pick" value="{}"> {}</label>{}</p>"#,
                q.id,
                escape_html(&q.content),
                q.author
                    .as_deref()
                    .map(|a| format!(r#" <span class="muted">{}</span>"#, escape_html(a)))
                    .unwrap_or_default()
            )
        })
        .collect();

    let content = format!(
        r#"
        <h1>Browse Default Quotes</h1>
        <div class="card">
            {}
            <button style="margin-top: 16px;" onclick="saveSelected()">Save Selected</button>
        </div>
        <script>
            function saveSelected() {{
                const ids = [...document.querySelectorAll('.pick:checked')].map(e => Number(e.value));
                fetch('/api/browse/adopt', {{
                    method: 'POST',
                    headers: {{ 'Content-Type': 'application/json' }},
                    body: JSON.stringify({{ ids }})
                }}).then(() => location.href = '/quotes');
            }}
        </script>
    "#,
        if items.is_empty() { "<p>No bundled quotes available.</p>".to_string() } else { items }
    );

    base_template("Browse", &content)
}

fn render_settings_page(prefs: &UserPreferences, bundle_version: i64, config: &AppConfig) -> String {
    let content = format!(
        r#"
        <h1>Settings</h1>
        <div class="card">
            <h2>Display</h2>
            <table>
                <tr><td>Font Size</td><td>{:?}</td></tr>
                <tr><td>Animation</td><td>{}</td></tr>
                <tr><td>Background</td><td>{}</td></tr>
                <tr><td>Quote Source</td><td>{}</td></tr>
            </table>
        </div>
        <div class="card">
            <h2>Widgets</h2>
            <p>Add a widget to your home screen to see daily quotes.</p>
            <table>
                <tr><td>Widget Mode</td><td>{}</td></tr>
                <tr><td>Widget Quote Source</td><td>{}</td></tr>
            </table>
            <p><a href="/widget/default">Default Style</a> &middot; <a href="/widget/simple">Simple Style</a></p>
        </div>
        <div class="card">
            <h2>Library</h2>
            <table>
                <tr><td>Bundle Version</td><td>{}</td></tr>
                <tr><td>Database</td><td>{}</td></tr>
                <tr><td>Share Font</td><td>{}</td></tr>
            </table>
        </div>
    "#,
        prefs.font_size,
        prefs.animation_on,
        prefs.background_on,
        prefs.quote_source,
        prefs.widget_mode,
        prefs.widget_quote_source,
        bundle_version,
        escape_html(&config.database.path),
        escape_html(config.share.font_path.as_deref().unwrap_or("not set")),
    );

    base_template("Settings", &content)
}

fn render_widget_page(view: &WidgetView) -> String {
    let header = view
        .header
        .as_deref()
        .map(|h| format!(r#"<div class="muted">{}</div>"#, escape_html(h)))
        .unwrap_or_default();
    let footer = view
        .footer
        .as_deref()
        .map(|f| format!(r#"<div class="muted">{}</div>"#, escape_html(f)))
        .unwrap_or_default();
    let lines: Vec<String> = view.to_lines(36).iter().map(|l| escape_html(l)).collect();

    let content = format!(
        r#"
        <a href="/" style="text-decoration: none; color: inherit;">
            <div class="widget {}">
                {}
                <p style="margin: 12px 0;">{}</p>
                {}
            </div>
        </a>
    "#,
        view.kind,
        header,
        lines.join("<br>"),
        footer
    );

    base_template("Widget", &content)
}

/// Start the web server with config, database and preferences
pub async fn start_server(config: AppConfig, db: Database, prefs: PreferenceStore) -> crate::Result<()> {
    let addr = format!("{}:{}", config.web.host, config.web.port);
    let state = Arc::new(AppState::new(config, db, prefs)?);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Web UI available at http://{}", addr);

    let router = create_router(state);
    axum::serve(listener, router)
        .await
        .map_err(|e| UlrimError::Config(format!("Server error: {}", e)))?;

    Ok(())
}
