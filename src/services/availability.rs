//! Per-visitor slot boards for the booking page.
//!
//! Every count fetch carries a `RefreshTicket` naming the date it was issued
//! for. A result is committed only if that date is still the board's selected
//! date; anything else is dropped silently. Fetch errors fail closed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::availability::{all_disabled, compute_availability};
use crate::models::{DisabledMap, Language, Localized, Notice, SlotCounts};
use crate::services::booking::{BookingStore, StoreError};
use crate::services::clock::Clock;

const FETCH_ERROR_TITLE: Localized =
    Localized::new("Error Fetching Availability", "Gagal Memuat Ketersediaan");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SlotBoard {
    pub selected: Option<NaiveDate>,
    pub disabled: DisabledMap,
    pub fetching: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
    pub language: Language,
}

impl SlotBoard {
    /// Changing the date clears the old projection and issues a ticket for the
    /// new one.
    pub fn select_date(&mut self, date: Option<NaiveDate>) -> Option<RefreshTicket> {
        self.selected = date;
        self.disabled.clear();
        self.notice = None;
        self.fetching = date.is_some();
        date.map(|date| RefreshTicket { date })
    }

    pub fn is_current(&self, ticket: &RefreshTicket) -> bool {
        self.selected == Some(ticket.date)
    }

    /// Commit a fetch result. Returns false when the ticket is stale.
    pub fn apply(
        &mut self,
        ticket: RefreshTicket,
        result: Result<SlotCounts, StoreError>,
        now: NaiveDateTime,
    ) -> bool {
        if !self.is_current(&ticket) {
            tracing::debug!(requested = %ticket.date, selected = ?self.selected, "dropping stale availability result");
            return false;
        }

        self.fetching = false;
        match result {
            Ok(counts) => {
                self.disabled = compute_availability(ticket.date, now, &counts);
            }
            Err(e) => {
                self.disabled = all_disabled();
                self.notice = Some(Notice::new(FETCH_ERROR_TITLE.pick(self.language), e.to_string()));
            }
        }
        true
    }

    /// Labels the board has no entry for are treated as unavailable.
    pub fn is_disabled(&self, label: &str) -> bool {
        self.disabled.get(label).copied().unwrap_or(true)
    }
}

struct TrackedBoard {
    board: SlotBoard,
    touched: Instant,
}

type Boards = HashMap<String, TrackedBoard>;

/// Board for `visitor`, created on first use and marked as touched.
fn touch<'a>(boards: &'a mut Boards, visitor: &str) -> &'a mut SlotBoard {
    let tracked = boards
        .entry(visitor.to_string())
        .or_insert_with(|| TrackedBoard {
            board: SlotBoard::default(),
            touched: Instant::now(),
        });
    tracked.touched = Instant::now();
    &mut tracked.board
}

pub struct AvailabilityService {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    boards: Mutex<Boards>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn BookingStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            boards: Mutex::new(HashMap::new()),
        }
    }

    fn boards(&self) -> MutexGuard<'_, Boards> {
        self.boards.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// One-off projection for a date, with no board involved.
    pub async fn for_date(&self, date: NaiveDate) -> Result<DisabledMap, StoreError> {
        let counts = self.store.get_booking_counts(date).await?;
        Ok(compute_availability(date, self.clock.now(), &counts))
    }

    pub async fn select_date(
        &self,
        visitor: &str,
        date: Option<NaiveDate>,
        language: Language,
    ) -> SlotBoard {
        let ticket = {
            let mut boards = self.boards();
            let board = touch(&mut boards, visitor);
            board.language = language;
            board.select_date(date)
        };

        if let Some(ticket) = ticket {
            self.refresh(visitor, ticket).await;
        }
        self.board(visitor)
    }

    /// Re-fetch counts for `date` after a write. Applied under the same guard,
    /// so a visitor who has moved on to another date keeps that date's view.
    pub async fn revalidate(&self, visitor: &str, date: NaiveDate) -> bool {
        self.refresh(visitor, RefreshTicket { date }).await
    }

    async fn refresh(&self, visitor: &str, ticket: RefreshTicket) -> bool {
        let result = self.store.get_booking_counts(ticket.date).await;
        if let Err(e) = &result {
            tracing::warn!(visitor, date = %ticket.date, error = %e, "availability fetch failed");
        }

        let now = self.clock.now();
        let mut boards = self.boards();
        touch(&mut boards, visitor).apply(ticket, result, now)
    }

    pub fn board(&self, visitor: &str) -> SlotBoard {
        match self.boards().get_mut(visitor) {
            Some(tracked) => {
                tracked.touched = Instant::now();
                tracked.board.clone()
            }
            None => SlotBoard::default(),
        }
    }

    /// Drop boards nobody has looked at for `max_idle`.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut boards = self.boards();
        let before = boards.len();
        boards.retain(|_, tracked| tracked.touched.elapsed() < max_idle);
        before - boards.len()
    }
}
