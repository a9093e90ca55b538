use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Daily appointment slots. There is no 12:00 slot (lunch break).
pub const TIME_SLOTS: [&str; 10] = [
    "09:00", "10:00", "11:00", "13:00", "14:00", "15:00", "16:00", "17:00", "18:00", "19:00",
];

pub const CAPACITY_PER_SLOT: u32 = 2;

/// Bookable days counted from today, inclusive.
pub const BOOKING_WINDOW_DAYS: i64 = 6;

/// Booking count per canonical slot label for one date.
pub type SlotCounts = BTreeMap<String, u32>;

/// Whether each canonical slot label is unavailable for one date.
pub type DisabledMap = BTreeMap<String, bool>;

pub fn is_canonical_slot(label: &str) -> bool {
    TIME_SLOTS.contains(&label)
}

pub fn slot_time(label: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(label, "%H:%M").ok()
}

pub fn empty_counts() -> SlotCounts {
    TIME_SLOTS.iter().map(|t| (t.to_string(), 0)).collect()
}

pub fn all_disabled() -> DisabledMap {
    TIME_SLOTS.iter().map(|t| (t.to_string(), true)).collect()
}

/// A slot is disabled when it is at capacity, or when `date` is today and the
/// slot start is at or before the current minute.
pub fn compute_availability(date: NaiveDate, now: NaiveDateTime, counts: &SlotCounts) -> DisabledMap {
    let is_today = date == now.date();
    let (hour, minute) = (now.hour(), now.minute());

    TIME_SLOTS
        .iter()
        .map(|label| {
            let by_count = counts.get(*label).copied().unwrap_or(0) >= CAPACITY_PER_SLOT;
            let by_time = is_today
                && slot_time(label)
                    .map(|t| t.hour() < hour || (t.hour() == hour && t.minute() <= minute))
                    .unwrap_or(true);
            (label.to_string(), by_count || by_time)
        })
        .collect()
}

pub fn booking_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today, today + Duration::days(BOOKING_WINDOW_DAYS - 1))
}

pub fn within_booking_window(date: NaiveDate, today: NaiveDate) -> bool {
    let (first, last) = booking_window(today);
    date >= first && date <= last
}
