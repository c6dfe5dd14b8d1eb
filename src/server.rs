use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::AppState;
use crate::chat::Message;
use crate::config::AppConfig;
use crate::controller::ChatWidgetController;
use crate::landing::{CHAT_LOG_SELECTOR, SUBJECT_GRID_SELECTOR};
use crate::widget_session::WidgetSession;

type HandlerError = (StatusCode, String);

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: AppConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config)?;

    spawn_session_sweeper(state.clone());

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/widget", post(api_create_widget))
        .route("/api/widget/{id}", axum::routing::delete(api_delete_widget))
        .route("/api/widget/{id}/send", post(api_send))
        .route("/api/widget/{id}/log", get(api_log))
        .route("/api/widget/{id}/scroll", post(api_scroll))
        .route("/api/widget/{id}/transcript", get(api_transcript))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Drop idle sessions on a fixed interval.
fn spawn_session_sweeper(state: AppState) {
    let timeout = state.config.session_timeout();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = state.sessions.cleanup_expired_with_timeout(timeout);
            if removed > 0 {
                debug!(
                    name: "sessions.swept",
                    removed,
                    remaining = state.sessions.len(),
                    "Expired widget sessions removed"
                );
            }
        }
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Generate the HTML shell for the application.
fn html_shell(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Plataforma de estudos para o ENEM">
    <title>{title} - ENEM Estudos</title>
    <script src="https://unpkg.com/htmx.org@2.0.4/dist/htmx.min.js"></script>
    <link rel="stylesheet" href="/static/app.css">
</head>
<body>
{content}
</body>
</html>"#
    )
}

/// GET / - Open a widget session and render its landing page.
async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, HandlerError> {
    let session = state.open_session().map_err(internal)?;
    info!(name: "widget.session.opened", session_id = %session.id(), "Widget session opened");

    let content = session.with_controller(|widget| {
        let page = widget.page();
        page[page.root()]
            .children()
            .iter()
            .map(|&child| page.render(child))
            .collect::<Vec<_>>()
            .join("\n")
    });
    Ok(Html(html_shell("Início", &content)))
}

async fn health_handler() -> &'static str {
    "ok"
}

// ─────────────────────────────────────────────────────────────────────────────
// Widget API Handlers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CreateWidgetResponse {
    session_id: String,
}

/// Form body posted by the chat form.
#[derive(Debug, Deserialize)]
struct SendForm {
    #[serde(default)]
    message: String,
}

/// Window metrics posted by the subject grid.
#[derive(Debug, Deserialize)]
struct ScrollForm {
    scroll_y: f64,
    #[serde(default)]
    viewport_height: Option<f64>,
}

/// POST /api/widget - Open a session without rendering the page.
async fn api_create_widget(
    State(state): State<AppState>,
) -> Result<Json<CreateWidgetResponse>, HandlerError> {
    let session = state.open_session().map_err(internal)?;
    Ok(Json(CreateWidgetResponse {
        session_id: session.id().to_string(),
    }))
}

/// DELETE /api/widget/{id}
async fn api_delete_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HandlerError> {
    match state.sessions.remove(&id) {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(not_found(&id)),
    }
}

/// POST /api/widget/{id}/send - Type the message, press send, return the log.
async fn api_send(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<SendForm>,
) -> Result<Html<String>, HandlerError> {
    let session = lookup(&state, &id)?;
    session
        .with_controller(|widget| {
            widget.type_text(&form.message);
            widget.click_send();
            fragment(widget, CHAT_LOG_SELECTOR)
        })
        .map(Html)
}

/// GET /api/widget/{id}/log - Current chat log, polled by the page.
async fn api_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, HandlerError> {
    let session = lookup(&state, &id)?;
    session
        .with_controller(|widget| fragment(widget, CHAT_LOG_SELECTOR))
        .map(Html)
}

/// POST /api/widget/{id}/scroll - Sync window metrics, return the card grid.
///
/// The grid also posts here on a timer so staggered reveals reach the
/// browser; unchanged metrics only advance the clock.
async fn api_scroll(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ScrollForm>,
) -> Result<Html<String>, HandlerError> {
    if !form.scroll_y.is_finite() {
        return Err(bad_request("scroll_y must be a finite number"));
    }
    if form
        .viewport_height
        .is_some_and(|h| !h.is_finite() || h <= 0.0)
    {
        return Err(bad_request("viewport_height must be a positive number"));
    }

    let session = lookup(&state, &id)?;
    session
        .with_controller(|widget| {
            widget.sync_window(form.scroll_y, form.viewport_height);
            fragment(widget, SUBJECT_GRID_SELECTOR)
        })
        .map(Html)
}

/// GET /api/widget/{id}/transcript
async fn api_transcript(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, HandlerError> {
    let session = lookup(&state, &id)?;
    Ok(Json(
        session.with_controller(|widget| widget.transcript().to_vec()),
    ))
}

fn lookup(state: &AppState, id: &str) -> Result<WidgetSession, HandlerError> {
    state.sessions.get(id).ok_or_else(|| not_found(id))
}

fn fragment(widget: &ChatWidgetController, selector: &str) -> Result<String, HandlerError> {
    widget
        .render_fragment(selector)
        .map_err(internal)?
        .ok_or_else(|| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Page has no element matching {selector}"),
            )
        })
}

fn bad_request(reason: &str) -> HandlerError {
    (StatusCode::BAD_REQUEST, reason.to_string())
}

fn not_found(id: &str) -> HandlerError {
    (StatusCode::NOT_FOUND, format!("Widget session not found: {id}"))
}

fn internal(err: impl std::fmt::Display) -> HandlerError {
    warn!(name: "widget.request.failed", error = %err, "Widget request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
