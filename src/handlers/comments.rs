use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::Json;
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::StreamExt;

use crate::errors::AppError;
use crate::models::{Comment, NewComment};
use crate::services::comments;
use crate::state::AppState;

// GET /api/comments
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Comment>>, AppError> {
    Ok(Json(comments::list(&state)?))
}

// POST /api/comments
pub async fn post_comment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewComment>,
) -> Result<(StatusCode, Json<Vec<Comment>>), AppError> {
    let written = comments::post_comment(&state, body).await?;
    Ok((StatusCode::CREATED, Json(written)))
}

#[derive(Deserialize)]
pub struct SseQuery {
    pub last_id: Option<i64>,
}

fn comment_event(comment: &Comment) -> Event {
    let data = serde_json::to_string(comment).unwrap_or_default();
    Event::default()
        .data(data)
        .event("comment")
        .id(comment.id.to_string())
}

// GET /api/comments/events (SSE)
pub async fn events_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SseQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    // Subscribe before the catch-up read so nothing falls in between
    let rx = state.comments_tx.subscribe();
    let last_id = query.last_id.unwrap_or(0);
    let catchup = comments::list_since(&state, last_id)?;
    let newest = catchup.last().map(|c| c.id).unwrap_or(last_id);

    let catchup_stream =
        tokio_stream::iter(catchup.into_iter().map(|c| Ok::<_, Infallible>(comment_event(&c))));

    let live_stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(comment) if comment.id > newest => Some(Ok(comment_event(&comment))),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "comment feed subscriber lagged");
            None
        }
    });

    let keepalive_stream = IntervalStream::new(tokio::time::interval(Duration::from_secs(30)))
        .map(|_| Ok(Event::default().comment("keepalive")));

    let merged = catchup_stream.chain(live_stream).merge(keepalive_stream);
    Ok(Sse::new(merged))
}
