//! HTTP API.
//!
//! `/health` is public; everything else needs `Authorization: Bearer <token>`
//! where the token is looked up in `user_tokens`. The resolved user travels
//! to handlers as an [`AuthUser`] request extension.

mod assistant;
mod diary;
pub mod error;

use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{DefaultBodyLimit, State};
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::achievements::store::SqliteAchievementStore;
use crate::achievements::tracker::{self, UnlockNotice};
use crate::ai::{AiError, GatewayClient};
use crate::config::MurmurConfig;
use crate::diary::local_day;
pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub ai: Option<Arc<GatewayClient>>,
    pub config: Arc<MurmurConfig>,
}

/// The user a request's bearer token resolved to.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

impl AppState {
    fn gateway(&self) -> Result<Arc<GatewayClient>, ApiError> {
        self.ai.clone().ok_or(ApiError::Ai(AiError::NotConfigured))
    }

    fn today(&self) -> NaiveDate {
        local_day(Utc::now(), self.config.diary.offset())
    }
}

/// Run `f` against the locked connection on the blocking pool.
async fn with_db<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Connection) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = Arc::clone(&state.db);
    tokio::task::spawn_blocking(move || {
        let mut conn = db.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut conn)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("db task failed: {e}")))?
    .map_err(ApiError::from)
}

/// Notification sink for unlocks recorded while serving a request.
fn announce_unlock(user: &str, icon: &str, name: &str) {
    tracing::info!(user = %user, "{icon} Achievement unlocked! {name}");
}

/// Achievement pass after a stats change. Never fails the request.
async fn achievement_pass(state: &AppState, user_id: &str) -> Vec<UnlockNotice> {
    let today = state.today();
    let user = user_id.to_string();
    let result = with_db(state, move |conn| {
        let store = SqliteAchievementStore::new(conn, today);
        let outcome =
            tracker::run_pass(&store, &user, |icon, name| announce_unlock(&user, icon, name));
        Ok(outcome.unlocked)
    })
    .await;

    result.unwrap_or_else(|e| {
        tracing::warn!(user = %user_id, error = %e, "achievement pass failed");
        Vec::new()
    })
}

async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    let user = with_db(&state, move |conn| crate::db::tokens::resolve_token(conn, &token))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(AuthUser(user));
    Ok(next.run(req).await)
}

pub fn router(state: AppState) -> Router {
    let max_upload = state.config.server.max_upload_bytes;

    let public = Router::new().route("/health", get(health));

    let protected = Router::new()
        .route("/transcribe", post(assistant::transcribe))
        .route("/analyze", post(assistant::analyze))
        .route("/ask", post(assistant::ask))
        .route("/entries", post(assistant::create_entry).get(diary::list_entries))
        .route("/events/upcoming", get(diary::upcoming_events))
        .route("/calendar", get(diary::calendar))
        .route("/summary", get(diary::summary))
        .route("/reminders/due", get(diary::due_reminders))
        .route("/stats", get(diary::stats))
        .route("/achievements", get(diary::achievements))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public
        .merge(protected)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(RequestBodyLimitLayer::new(max_upload))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "murmur",
        "version": env!("CARGO_PKG_VERSION"),
        "ai_enabled": state.ai.is_some(),
    }))
}
