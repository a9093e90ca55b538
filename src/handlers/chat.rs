use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{ChatSession, Language};
use crate::services::conversation::{self, ChatReply};
use crate::services::dialogue::ChatEvent;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSession {
    pub language: Option<Language>,
}

// POST /api/chat/sessions
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateSession>>,
) -> Result<(StatusCode, Json<ChatSession>), AppError> {
    let language = body.and_then(|Json(body)| body.language);
    let session = conversation::create_session(&state, language)?;
    Ok((StatusCode::CREATED, Json(session)))
}

// GET /api/chat/sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ChatSession>, AppError> {
    Ok(Json(conversation::get_session(&state, &id)?))
}

#[derive(Debug, Deserialize)]
pub struct Utterance {
    pub text: String,
}

// POST /api/chat/sessions/:id/messages
pub async fn submit_utterance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<Utterance>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = conversation::process_event(&state, &id, ChatEvent::Utterance(body.text)).await?;
    Ok(Json(reply))
}

#[derive(Debug, Deserialize)]
pub struct QuickReplyPick {
    pub index: usize,
}

// POST /api/chat/sessions/:id/quick-replies
pub async fn submit_quick_reply(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<QuickReplyPick>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = conversation::process_event(&state, &id, ChatEvent::QuickReply(body.index)).await?;
    Ok(Json(reply))
}

#[derive(Debug, Deserialize)]
pub struct LanguageSwitch {
    pub language: Language,
}

// POST /api/chat/sessions/:id/language
pub async fn set_language(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<LanguageSwitch>,
) -> Result<Json<ChatSession>, AppError> {
    Ok(Json(conversation::set_language(&state, &id, body.language)?))
}
