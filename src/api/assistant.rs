//! AI-backed routes: transcription, event extraction, questions, and the
//! record-analyze-reward flow behind `POST /entries`.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use super::{achievement_pass, with_db, ApiError, AppState, AuthUser};
use crate::ai::prompts;
use crate::diary::types::NewEvent;
use crate::diary::{entries, events, stats};

pub(super) async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut audio = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("audio") {
            let mime = field.content_type().unwrap_or("audio/webm").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read audio: {e}")))?;
            audio = Some((bytes, mime));
            break;
        }
    }
    let Some((bytes, mime)) = audio else {
        return Err(ApiError::BadRequest("no audio file provided".into()));
    };
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("audio file is empty".into()));
    }

    let transcript = state.gateway()?.transcribe(&bytes, &mime).await?;
    tracing::info!(chars = transcript.len(), "transcription complete");

    Ok(Json(serde_json::json!({
        "success": true,
        "transcript": transcript,
    })))
}

#[derive(Deserialize)]
pub(super) struct AnalyzeBody {
    transcript: String,
    entry_id: Option<String>,
}

/// Extract events; store them only when they belong to one of the user's entries.
pub(super) async fn analyze(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<AnalyzeBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.transcript.trim().is_empty() {
        return Err(ApiError::BadRequest("transcript must not be empty".into()));
    }
    let gateway = state.gateway()?;

    if let Some(entry_id) = body.entry_id.clone() {
        let owner = user.clone();
        let exists = with_db(&state, move |conn| entries::get_entry(conn, &owner, &entry_id))
            .await?
            .is_some();
        if !exists {
            return Err(ApiError::NotFound);
        }
    }

    let found = extract(&state, &gateway, &body.transcript).await?;
    let events_count = found.len();

    let mut unlocked = Vec::new();
    if let Some(entry_id) = body.entry_id {
        store(&state, &user, &entry_id, found).await?;
        unlocked = achievement_pass(&state, &user).await;
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "events_count": events_count,
        "unlocked": unlocked,
    })))
}

#[derive(Deserialize)]
pub(super) struct AskBody {
    question: String,
}

pub(super) async fn ask(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<AskBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let question = body.question.trim().to_string();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".into()));
    }
    let gateway = state.gateway()?;

    let offset = state.config.diary.offset();
    let owner = user.clone();
    let (entries_ctx, events_ctx) = with_db(&state, move |conn| {
        let all_entries = entries::list_entries(conn, &owner)?;
        let all_events = events::list_events(conn, &owner)?;
        Ok((
            prompts::entries_context(&all_entries, offset),
            prompts::events_context(&all_events, offset),
        ))
    })
    .await?;

    let answer = gateway
        .answer(&question, &entries_ctx, &events_ctx, state.today())
        .await?;

    let owner = user.clone();
    with_db(&state, move |conn| stats::increment_questions(conn, &owner)).await?;
    let unlocked = achievement_pass(&state, &user).await;

    Ok(Json(serde_json::json!({
        "success": true,
        "answer": answer,
        "unlocked": unlocked,
    })))
}

#[derive(Deserialize)]
pub(super) struct EntryBody {
    transcript: String,
    #[serde(default)]
    duration: f64,
}

pub(super) async fn create_entry(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<EntryBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if body.transcript.trim().is_empty() {
        return Err(ApiError::BadRequest("transcript must not be empty".into()));
    }
    if !body.duration.is_finite() || body.duration < 0.0 {
        return Err(ApiError::BadRequest("duration must be a non-negative number".into()));
    }

    let offset = state.config.diary.offset();
    let owner = user.clone();
    let transcript = body.transcript.clone();
    let entry = with_db(&state, move |conn| {
        entries::record_entry(conn, &owner, &transcript, body.duration, offset)
    })
    .await?;

    let mut events_count = 0;
    if let Some(gateway) = state.ai.clone() {
        let analysis = match extract(&state, &gateway, &body.transcript).await {
            Ok(found) => store(&state, &user, &entry.id, found).await,
            Err(e) => Err(e),
        };
        match analysis {
            Ok(n) => events_count = n,
            Err(e) => tracing::warn!(entry = %entry.id, error = %e, "entry analysis failed"),
        }
    }

    let unlocked = achievement_pass(&state, &user).await;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "entry": entry,
            "events_count": events_count,
            "unlocked": unlocked,
        })),
    ))
}

async fn extract(
    state: &AppState,
    gateway: &crate::ai::GatewayClient,
    transcript: &str,
) -> Result<Vec<NewEvent>, ApiError> {
    let extracted = gateway.extract_events(transcript, state.today()).await?;
    Ok(extracted.iter().filter_map(|e| e.to_new_event()).collect())
}

async fn store(
    state: &AppState,
    user: &str,
    entry_id: &str,
    found: Vec<NewEvent>,
) -> Result<usize, ApiError> {
    let reminder_minutes = state.config.diary.default_reminder_minutes;
    let user = user.to_string();
    let entry_id = entry_id.to_string();
    with_db(state, move |conn| {
        events::store_events(conn, &user, Some(&entry_id), &found, reminder_minutes)
    })
    .await
}
