use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::availability::booking_window;
use crate::models::{DisabledMap, Language};
use crate::services::availability::SlotBoard;
use crate::services::booking::{self, BookingForm, BookingReceipt};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityView {
    pub date: NaiveDate,
    pub disabled: DisabledMap,
    pub window: (NaiveDate, NaiveDate),
}

// GET /api/availability?date=YYYY-MM-DD
pub async fn availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityView>, AppError> {
    let disabled = state.availability.for_date(query.date).await?;
    Ok(Json(AvailabilityView {
        date: query.date,
        disabled,
        window: booking_window(state.availability.clock().today()),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SelectDate {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub language: Language,
}

// POST /api/booking/:visitor/date
pub async fn select_date(
    State(state): State<Arc<AppState>>,
    Path(visitor): Path<String>,
    Json(body): Json<SelectDate>,
) -> Json<SlotBoard> {
    Json(
        state
            .availability
            .select_date(&visitor, body.date, body.language)
            .await,
    )
}

// GET /api/booking/:visitor
pub async fn board(
    State(state): State<Arc<AppState>>,
    Path(visitor): Path<String>,
) -> Json<SlotBoard> {
    Json(state.availability.board(&visitor))
}

// POST /api/booking/:visitor/appointments
pub async fn submit_booking(
    State(state): State<Arc<AppState>>,
    Path(visitor): Path<String>,
    Json(form): Json<BookingForm>,
) -> Result<(StatusCode, Json<BookingReceipt>), AppError> {
    let receipt = booking::submit_booking(&state, &visitor, form).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
