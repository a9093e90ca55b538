use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::ErrorCode;
use serde::{Deserialize, Serialize};

use crate::db::{self, queries, Db};
use crate::errors::AppError;
use crate::models::availability::{is_canonical_slot, within_booking_window, CAPACITY_PER_SLOT};
use crate::models::{Language, Localized, NewAppointment, PaymentMethod, SaveOutcome, SlotCounts};
use crate::services::availability::SlotBoard;
use crate::state::AppState;

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("booking database unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied by booking database ({0}); make sure the database file and its directory are writable by the service user")]
    PermissionDenied(String),

    #[error("booking database error: {0}")]
    Other(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(
                ErrorCode::PermissionDenied
                | ErrorCode::ReadOnly
                | ErrorCode::AuthorizationForStatementDenied,
            ) => StoreError::PermissionDenied(e.to_string()),
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::NotADatabase,
            ) => StoreError::Unavailable(e.to_string()),
            _ => StoreError::Other(e.to_string()),
        }
    }
}

/// Persistence for appointments.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Bookings per slot label for one date. Labels without bookings may be absent.
    async fn get_booking_counts(&self, date: NaiveDate) -> Result<SlotCounts, StoreError>;

    async fn save_appointment(&self, appointment: &NewAppointment) -> Result<SaveOutcome, StoreError>;
}

const SAVED: Localized = Localized::new(
    "Appointment successfully saved to our records.",
    "Janji temu berhasil disimpan di catatan kami.",
);

const SLOT_FULL: Localized = Localized::new(
    "The selected time slot is full. Please choose another time.",
    "Slot waktu yang dipilih sudah penuh. Silakan pilih waktu lain.",
);

pub struct SqliteBookingStore {
    db: Db,
}

impl SqliteBookingStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookingStore for SqliteBookingStore {
    async fn get_booking_counts(&self, date: NaiveDate) -> Result<SlotCounts, StoreError> {
        let conn = db::lock(&self.db).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(queries::count_bookings_by_time(&conn, date)?)
    }

    async fn save_appointment(&self, appointment: &NewAppointment) -> Result<SaveOutcome, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = Utc::now().naive_utc();

        let inserted = {
            let conn = db::lock(&self.db).map_err(|e| StoreError::Unavailable(e.to_string()))?;
            queries::insert_appointment_within_capacity(
                &conn,
                &id,
                appointment,
                created_at,
                CAPACITY_PER_SLOT,
            )?
        };

        let language = appointment.language;
        if inserted {
            tracing::info!(
                appointment_id = %id,
                date = %appointment.booking_date,
                time = %appointment.booking_time,
                "appointment saved"
            );
            Ok(SaveOutcome {
                success: true,
                message: SAVED.pick(language).to_string(),
                appointment_id: Some(id),
            })
        } else {
            tracing::info!(
                date = %appointment.booking_date,
                time = %appointment.booking_time,
                "slot full, appointment refused"
            );
            Ok(SaveOutcome {
                success: false,
                message: SLOT_FULL.pick(language).to_string(),
                appointment_id: None,
            })
        }
    }
}

// ── Booking form ──

#[derive(Debug, Clone, Deserialize)]
pub struct BookingForm {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    pub booking_date: Option<NaiveDate>,
    pub booking_time: Option<String>,
    pub payment_method: Option<String>,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Serialize)]
pub struct BookingReceipt {
    pub outcome: SaveOutcome,
    pub owner_notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_error: Option<String>,
    pub board: SlotBoard,
}

const INCOMPLETE_FORM: Localized =
    Localized::new("Please fill in all fields.", "Harap isi semua kolom.");

const OUTSIDE_WINDOW: Localized = Localized::new(
    "Please choose a date within the next 6 days.",
    "Silakan pilih tanggal dalam 6 hari ke depan.",
);

const UNKNOWN_SLOT: Localized = Localized::new(
    "Please choose one of the listed times.",
    "Silakan pilih salah satu waktu yang tersedia.",
);

const UNKNOWN_PAYMENT: Localized = Localized::new(
    "Please choose a payment method.",
    "Silakan pilih metode pembayaran.",
);

const SLOT_UNAVAILABLE: Localized = Localized::new(
    "The selected time slot is full or past. Please choose another time.",
    "Slot waktu yang dipilih sudah penuh atau terlewat. Silakan pilih waktu lain.",
);

fn validate(form: BookingForm, today: NaiveDate) -> Result<NewAppointment, AppError> {
    let language = form.language;
    let invalid = |text: Localized| AppError::Validation(text.pick(language).to_string());

    let customer_name = form.customer_name.trim().to_string();
    let customer_phone = form.customer_phone.trim().to_string();
    let (Some(booking_date), Some(booking_time), Some(payment)) =
        (form.booking_date, form.booking_time, form.payment_method)
    else {
        return Err(invalid(INCOMPLETE_FORM));
    };
    if customer_name.is_empty() || customer_phone.is_empty() {
        return Err(invalid(INCOMPLETE_FORM));
    }
    if !within_booking_window(booking_date, today) {
        return Err(invalid(OUTSIDE_WINDOW));
    }
    if !is_canonical_slot(&booking_time) {
        return Err(invalid(UNKNOWN_SLOT));
    }
    let payment = PaymentMethod::parse(&payment).ok_or_else(|| invalid(UNKNOWN_PAYMENT))?;

    Ok(NewAppointment {
        customer_name,
        booking_date,
        booking_time,
        customer_phone,
        payment_method: payment.label(language).to_string(),
        language,
    })
}

/// Validate the form against the visitor's board, save, notify the owner and
/// re-fetch the board for the booked date.
pub async fn submit_booking(
    state: &Arc<AppState>,
    visitor: &str,
    form: BookingForm,
) -> Result<BookingReceipt, AppError> {
    let today = state.availability.clock().today();
    let appointment = validate(form, today)?;
    let language = appointment.language;

    if state.availability.board(visitor).selected != Some(appointment.booking_date) {
        // The visitor never loaded this date; project it now.
        state
            .availability
            .select_date(visitor, Some(appointment.booking_date), language)
            .await;
    }

    // Fresh projection of the booked date; the shared board may have moved on.
    let disabled = state.availability.for_date(appointment.booking_date).await?;
    if disabled.get(&appointment.booking_time).copied().unwrap_or(true) {
        return Err(AppError::SlotUnavailable(SLOT_UNAVAILABLE.pick(language).to_string()));
    }

    let outcome = state.store.save_appointment(&appointment).await?;

    if !outcome.success {
        state
            .availability
            .revalidate(visitor, appointment.booking_date)
            .await;
        return Err(AppError::SlotUnavailable(outcome.message));
    }

    let (owner_notified, notification_error) = match notify_owner(state, &appointment).await {
        Ok(()) => (true, None),
        Err(e) => {
            tracing::warn!(error = %e, "owner notification failed; booking kept");
            (false, Some(e.to_string()))
        }
    };

    state
        .availability
        .revalidate(visitor, appointment.booking_date)
        .await;

    Ok(BookingReceipt {
        outcome,
        owner_notified,
        notification_error,
        board: state.availability.board(visitor),
    })
}

/// Owner-facing summary, always in Indonesian.
pub fn owner_message(appointment: &NewAppointment) -> String {
    format!(
        "🔔 Notifikasi Janji Temu: King Barbershop - Kutabumi 🔔\n\
         =========================\n\
         Pelanggan: {}\n\
         Tanggal: {}\n\
         Waktu: {}\n\
         Telepon: {}\n\
         Pembayaran: {}\n\
         Bahasa Pelanggan: {}",
        appointment.customer_name,
        appointment.booking_date.format("%d-%m-%Y"),
        appointment.booking_time,
        appointment.customer_phone,
        appointment.payment_method,
        appointment.language.as_str().to_uppercase(),
    )
}

async fn notify_owner(state: &Arc<AppState>, appointment: &NewAppointment) -> anyhow::Result<()> {
    state
        .messaging
        .send_message(&state.config.owner_whatsapp_number, &owner_message(appointment))
        .await?;
    tracing::info!("owner notified of new appointment");
    Ok(())
}
