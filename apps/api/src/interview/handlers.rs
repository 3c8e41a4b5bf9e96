//! Axum route handlers for the Interview API.
//!
//! Handlers own request validation, API-key checks and the registry lifecycle;
//! every interview rule lives in `InterviewSession`.

use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::interview::feedback::Feedback;
use crate::interview::persona::PersonaSummary;
use crate::interview::registry::{SessionHandle, SessionId};
use crate::interview::session::{InterviewSession, SessionState};
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const API_KEY_PREFIX: &str = "sk-or-v1-";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PersonasResponse {
    pub personas: Vec<PersonaSummary>,
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub persona_id: String,
}

#[derive(Debug, Serialize)]
pub struct PersonaBrief {
    pub id: String,
    pub name: String,
    pub title: String,
    pub company: String,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub session_id: SessionId,
    pub opening_question: String,
    pub persona: PersonaBrief,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub user_message: String,
}

#[derive(Debug, Serialize)]
pub struct RespondResponse {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    #[serde(default)]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct EndResponse {
    /// Human-readable, e.g. "4m 5s".
    pub duration: String,
    pub duration_seconds: f64,
    /// Answered candidate messages.
    pub message_count: usize,
    pub turn_count: usize,
    pub feedback: Feedback,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub session_id: Option<String>,
}

/// Session state as reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    Active,
    Ended,
    /// A completion call holds the session; counters are omitted.
    Busy,
}

impl From<SessionState> for SessionStatus {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::NotStarted => SessionStatus::NotStarted,
            SessionState::Active => SessionStatus::Active,
            SessionState::Ended => SessionStatus::Ended,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: SessionStatus,
    pub persona_id: String,
    pub message_count: Option<usize>,
    pub started_at: Option<DateTime<Utc>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/personas
///
/// Lists available interviewers. No API key required.
pub async fn handle_list_personas(State(state): State<AppState>) -> Json<PersonasResponse> {
    Json(PersonasResponse {
        personas: state.catalog.list_summaries(),
    })
}

/// POST /api/interview/start
///
/// Creates a session bound to the caller's API key and returns the opening line.
pub async fn handle_start(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<StartRequest>,
) -> Result<Json<StartResponse>, AppError> {
    let api_key = require_api_key(&headers)?;

    if request.persona_id.trim().is_empty() {
        return Err(AppError::Validation("persona_id not specified".to_string()));
    }

    let mut session =
        InterviewSession::new(state.catalog.clone(), state.llm.for_api_key(&api_key));
    let opening_question = session.begin(&request.persona_id)?.to_string();

    let persona = session
        .persona()
        .map(|p| PersonaBrief {
            id: p.id.to_string(),
            name: p.name.to_string(),
            title: p.title.to_string(),
            company: p.organization.to_string(),
        })
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Started session has no persona")))?;

    let handle = state.sessions.insert(session, &api_key, &persona.id).await;
    info!("Session {} started with persona '{}'", handle.id, persona.id);

    Ok(Json(StartResponse {
        session_id: handle.id,
        opening_question,
        persona,
    }))
}

/// POST /api/interview/respond
///
/// Sends one candidate message and returns the interviewer's reply.
pub async fn handle_respond(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RespondRequest>,
) -> Result<Json<RespondResponse>, AppError> {
    let api_key = require_api_key(&headers)?;
    let handle = authorized_session(&state, &request.session_id, &api_key).await?;

    if request.user_message.trim().is_empty() {
        return Err(AppError::Validation("No message provided".to_string()));
    }

    let response = handle
        .session
        .lock()
        .await
        .respond(&request.user_message)
        .await?;

    Ok(Json(RespondResponse { response }))
}

/// POST /api/interview/retry
///
/// Re-sends the candidate message whose reply failed (timeout, provider error).
pub async fn handle_retry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SessionRequest>,
) -> Result<Json<RespondResponse>, AppError> {
    let api_key = require_api_key(&headers)?;
    let handle = authorized_session(&state, &request.session_id, &api_key).await?;

    let response = handle.session.lock().await.retry_pending().await?;

    Ok(Json(RespondResponse { response }))
}

/// POST /api/interview/end
///
/// Produces feedback, then discards the session. A failed feedback call keeps
/// the session registered so the caller can try again.
pub async fn handle_end(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SessionRequest>,
) -> Result<Json<EndResponse>, AppError> {
    let api_key = require_api_key(&headers)?;
    let handle = authorized_session(&state, &request.session_id, &api_key).await?;

    let report = handle.session.lock().await.end().await?;
    state.sessions.remove(&handle.id).await;

    info!(
        "Session {} closed after {} exchange(s)",
        handle.id, report.exchange_count
    );

    Ok(Json(EndResponse {
        duration: format_duration(report.duration),
        duration_seconds: report.duration.as_secs_f64(),
        message_count: report.exchange_count,
        turn_count: report.turn_count,
        feedback: report.feedback,
    }))
}

/// GET /api/interview/status?session_id=
///
/// Polling neither waits on an in-flight completion nor keeps the session alive.
pub async fn handle_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, AppError> {
    let raw_id = query.session_id.as_deref().unwrap_or_default();
    let id: SessionId = raw_id.parse().map_err(|_| session_not_found())?;
    let handle = state.sessions.peek(&id).await.ok_or_else(session_not_found)?;

    let response = match handle.session.try_lock() {
        Ok(session) => StatusResponse {
            status: session.state().into(),
            persona_id: handle.persona_id.clone(),
            message_count: Some(session.transcript().len()),
            started_at: session.started_at(),
        },
        Err(_) => StatusResponse {
            status: SessionStatus::Busy,
            persona_id: handle.persona_id.clone(),
            message_count: None,
            started_at: None,
        },
    };

    Ok(Json(response))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Extracts the caller's provider key from `X-API-Key`.
fn require_api_key(headers: &HeaderMap) -> Result<String, AppError> {
    let key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::Unauthorized("API key required".to_string()))?;

    if !key.starts_with(API_KEY_PREFIX) {
        return Err(AppError::Unauthorized("Invalid API key format".to_string()));
    }

    Ok(key.to_string())
}

fn session_not_found() -> AppError {
    AppError::NotFound("Invalid session".to_string())
}

/// Resolves a session id and marks the session active.
async fn lookup_session(state: &AppState, raw_id: &str) -> Result<SessionHandle, AppError> {
    let id: SessionId = raw_id.parse().map_err(|_| session_not_found())?;
    state.sessions.get(&id).await.ok_or_else(session_not_found)
}

/// Resolves a session and checks it belongs to the presented key.
async fn authorized_session(
    state: &AppState,
    raw_id: &str,
    api_key: &str,
) -> Result<SessionHandle, AppError> {
    let handle = lookup_session(state, raw_id).await?;
    if handle.api_key != api_key {
        return Err(AppError::Unauthorized(
            "Invalid API key for this session".to_string(),
        ));
    }
    Ok(handle)
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}
