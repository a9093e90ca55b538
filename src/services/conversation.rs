use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, Utc};
use serde::Serialize;

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::models::{ChatSession, Language, Notice};
use crate::services::ai::Skills;
use crate::services::dialogue::{self, ChatEvent, SkillCall, SkillRequest, SkillResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub session: ChatSession,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn touch(state: &Arc<AppState>, session: &mut ChatSession) {
    let now = now();
    session.last_activity = now;
    session.expires_at = now + Duration::minutes(state.config.session_ttl_minutes);
}

fn save(state: &Arc<AppState>, session: &ChatSession) -> Result<(), AppError> {
    let conn = db::lock(&state.db)?;
    queries::save_session(&conn, session)?;
    Ok(())
}

pub fn create_session(state: &Arc<AppState>, language: Option<Language>) -> Result<ChatSession, AppError> {
    let language = language.unwrap_or(state.config.default_language);
    let mut session = ChatSession {
        id: uuid::Uuid::new_v4().to_string(),
        state: dialogue::greeting(language),
        last_activity: now(),
        expires_at: now(),
    };
    touch(state, &mut session);
    save(state, &session)?;

    tracing::info!(session = %session.id, language = language.as_str(), "chat session created");
    Ok(session)
}

pub fn get_session(state: &Arc<AppState>, id: &str) -> Result<ChatSession, AppError> {
    let conn = db::lock(&state.db)?;
    queries::get_session(&conn, id, now())?
        .ok_or_else(|| AppError::NotFound(format!("chat session {id}")))
}

/// Extra slack on top of the LLM timeout before a stored placeholder is
/// considered abandoned.
const STALL_GRACE_SECS: i64 = 15;

fn stalled(state: &Arc<AppState>, session: &ChatSession, now: NaiveDateTime) -> bool {
    let limit = Duration::from_std(state.config.llm_timeout).unwrap_or_else(|_| Duration::minutes(5))
        + Duration::seconds(STALL_GRACE_SECS);
    session.state.reply_pending() && session.last_activity + limit < now
}

/// Run one chat event through the dialogue manager, executing the skill it
/// asks for. The placeholder state is stored before the skill runs so a
/// concurrent event for the same session sees the reply as pending.
///
/// The skill runs on its own task and its outcome is folded into the stored
/// session, so a dropped request still settles the placeholder.
pub async fn process_event(
    state: &Arc<AppState>,
    id: &str,
    event: ChatEvent,
) -> Result<ChatReply, AppError> {
    // Load, reduce and store under one lock so events for a session serialize.
    let (session, call) = {
        let conn = db::lock(&state.db)?;
        let now = now();
        let mut session = queries::get_session(&conn, id, now)?
            .ok_or_else(|| AppError::NotFound(format!("chat session {id}")))?;

        if stalled(state, &session, now) {
            tracing::warn!(session = %id, "abandoning stalled reply");
            session.state = dialogue::abandon_pending(session.state);
        }

        let turn = dialogue::reduce(session.state.clone(), event, state.classifier.as_ref())?;
        session.state = turn.state;
        touch(state, &mut session);
        queries::save_session(&conn, &session)?;
        (session, turn.call)
    };

    let Some(call) = call else {
        tracing::info!(session = %id, context = session.state.context.as_str(), "answered without skill");
        return Ok(ChatReply { session, notice: None });
    };

    let placeholder = session.state.messages.last().map(|m| m.id.clone());
    let task_state = Arc::clone(state);
    let session_id = id.to_string();
    tokio::spawn(async move { finish_turn(&task_state, &session_id, placeholder, call).await })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("chat reply task failed: {e}")))?
}

async fn finish_turn(
    state: &Arc<AppState>,
    id: &str,
    placeholder: Option<String>,
    call: SkillCall,
) -> Result<ChatReply, AppError> {
    tracing::info!(session = %id, skill = call.request.name(), "running skill");
    let timeout = state.config.llm_timeout;
    let result = match tokio::time::timeout(timeout, run_skill(state.skills.as_ref(), &call)).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!("no reply within {} seconds", timeout.as_secs())),
    };
    if let Err(e) = &result {
        tracing::warn!(session = %id, skill = call.request.name(), error = %e, "skill failed");
    }

    // Fold into what is stored now; writes made while the skill ran are kept.
    let conn = db::lock(&state.db)?;
    let mut session = queries::get_session(&conn, id, now())?
        .ok_or_else(|| AppError::NotFound(format!("chat session {id}")))?;

    let current = session.state.messages.last().map(|m| m.id.clone());
    if !session.state.reply_pending() || current != placeholder {
        tracing::warn!(session = %id, "placeholder already settled; dropping skill result");
        return Ok(ChatReply { session, notice: None });
    }

    let (next, notice) = dialogue::resolve(session.state, &call, result);
    session.state = next;
    touch(state, &mut session);
    queries::save_session(&conn, &session)?;

    Ok(ChatReply { session, notice })
}

pub async fn run_skill(skills: &dyn Skills, call: &SkillCall) -> anyhow::Result<SkillResponse> {
    let language = call.language;
    let response = match &call.request {
        SkillRequest::AnswerQuestion { question } => {
            SkillResponse::Answer(skills.answer_question(question, language).await?)
        }
        SkillRequest::SuggestTrends => SkillResponse::Trends(skills.suggest_trends(language).await?),
        SkillRequest::RecommendHaircut(slots) => {
            SkillResponse::Recommendation(skills.recommend_haircut(slots, language).await?)
        }
        SkillRequest::BookAppointment(request) => {
            SkillResponse::Booking(skills.book_appointment(request, language).await?)
        }
    };
    Ok(response)
}

/// Language switch keeps the transcript; only new copy uses the new language.
pub fn set_language(state: &Arc<AppState>, id: &str, language: Language) -> Result<ChatSession, AppError> {
    let conn = db::lock(&state.db)?;
    let mut session = queries::get_session(&conn, id, now())?
        .ok_or_else(|| AppError::NotFound(format!("chat session {id}")))?;
    session.state.language = language;
    touch(state, &mut session);
    queries::save_session(&conn, &session)?;
    Ok(session)
}

pub fn cleanup_expired(state: &Arc<AppState>) -> anyhow::Result<usize> {
    let conn = db::lock(&state.db)?;
    let removed = queries::delete_expired_sessions(&conn, now())?;
    if removed > 0 {
        tracing::info!(removed, "expired chat sessions removed");
    }
    Ok(removed)
}
