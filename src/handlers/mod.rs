pub mod booking;
pub mod chat;
pub mod comments;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/chat/sessions", post(chat::create_session))
        .route("/api/chat/sessions/:id", get(chat::get_session))
        .route("/api/chat/sessions/:id/messages", post(chat::submit_utterance))
        .route(
            "/api/chat/sessions/:id/quick-replies",
            post(chat::submit_quick_reply),
        )
        .route("/api/chat/sessions/:id/language", post(chat::set_language))
        .route("/api/availability", get(booking::availability))
        .route("/api/booking/:visitor", get(booking::board))
        .route("/api/booking/:visitor/date", post(booking::select_date))
        .route(
            "/api/booking/:visitor/appointments",
            post(booking::submit_booking),
        )
        .route(
            "/api/comments",
            get(comments::list_comments).post(comments::post_comment),
        )
        .route("/api/comments/events", get(comments::events_stream))
        .with_state(state)
}
