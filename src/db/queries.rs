use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{ChatSession, Comment, ConversationState, Language, NewAppointment, SlotCounts};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Chat Sessions ──

/// Returns the session only while it has not expired.
pub fn get_session(
    conn: &Connection,
    id: &str,
    now: NaiveDateTime,
) -> anyhow::Result<Option<ChatSession>> {
    let result = conn.query_row(
        "SELECT id, state, last_activity, expires_at FROM chat_sessions WHERE id = ?1 AND expires_at > ?2",
        params![id, now.format(TS_FORMAT).to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    );

    match result {
        Ok((id, state_json, last_activity, expires_at)) => {
            let state: ConversationState = serde_json::from_str(&state_json)?;
            Ok(Some(ChatSession {
                id,
                state,
                last_activity: parse_ts(&last_activity),
                expires_at: parse_ts(&expires_at),
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_session(conn: &Connection, session: &ChatSession) -> anyhow::Result<()> {
    let state_json = serde_json::to_string(&session.state)?;
    conn.execute(
        "INSERT INTO chat_sessions (id, state, last_activity, expires_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET state = excluded.state, last_activity = excluded.last_activity, expires_at = excluded.expires_at",
        params![
            session.id,
            state_json,
            session.last_activity.format(TS_FORMAT).to_string(),
            session.expires_at.format(TS_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn delete_expired_sessions(conn: &Connection, now: NaiveDateTime) -> anyhow::Result<usize> {
    let count = conn.execute(
        "DELETE FROM chat_sessions WHERE expires_at <= ?1",
        params![now.format(TS_FORMAT).to_string()],
    )?;
    Ok(count)
}

// ── Appointments ──
//
// These return `rusqlite::Result` so the booking store can classify failures.

pub fn count_bookings_by_time(conn: &Connection, date: NaiveDate) -> rusqlite::Result<SlotCounts> {
    let mut stmt = conn.prepare(
        "SELECT booking_time, COUNT(*) FROM appointments WHERE booking_date = ?1 GROUP BY booking_time",
    )?;
    let rows = stmt.query_map(params![date.format("%Y-%m-%d").to_string()], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
    })?;

    let mut counts = SlotCounts::new();
    for row in rows {
        let (time, count) = row?;
        counts.insert(time, count);
    }
    Ok(counts)
}

/// Inserts the appointment only while the slot holds fewer than `capacity`
/// bookings. The count and the write happen in one statement. Returns whether
/// a row was written.
pub fn insert_appointment_within_capacity(
    conn: &Connection,
    id: &str,
    appointment: &NewAppointment,
    created_at: NaiveDateTime,
    capacity: u32,
) -> rusqlite::Result<bool> {
    let date = appointment.booking_date.format("%Y-%m-%d").to_string();
    let inserted = conn.execute(
        "INSERT INTO appointments (id, customer_name, booking_date, booking_time, customer_phone, payment_method, language, created_at)
         SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
         WHERE (SELECT COUNT(*) FROM appointments WHERE booking_date = ?3 AND booking_time = ?4) < ?9",
        params![
            id,
            appointment.customer_name,
            date,
            appointment.booking_time,
            appointment.customer_phone,
            appointment.payment_method,
            appointment.language.as_str(),
            created_at.format(TS_FORMAT).to_string(),
            capacity,
        ],
    )?;
    Ok(inserted > 0)
}

// ── Live Comments ──

pub fn insert_comment(
    conn: &Connection,
    author: &str,
    text: &str,
    language: Language,
    is_ai_reply: bool,
) -> anyhow::Result<Comment> {
    let created_at = Utc::now().naive_utc().format(TS_FORMAT).to_string();
    conn.execute(
        "INSERT INTO live_comments (author, text, language, is_ai_reply, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![author, text, language.as_str(), is_ai_reply as i32, created_at],
    )?;
    Ok(Comment {
        id: conn.last_insert_rowid(),
        author: author.to_string(),
        text: text.to_string(),
        language,
        is_ai_reply,
        created_at,
    })
}

/// Comments with an id greater than `after_id`, oldest first.
pub fn list_comments_since(conn: &Connection, after_id: i64) -> anyhow::Result<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT id, author, text, language, is_ai_reply, created_at FROM live_comments WHERE id > ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![after_id], |row| {
        let language: String = row.get(3)?;
        Ok(Comment {
            id: row.get(0)?,
            author: row.get(1)?,
            text: row.get(2)?,
            language: Language::from_code(&language).unwrap_or_default(),
            is_ai_reply: row.get::<_, i32>(4)? != 0,
            created_at: row.get(5)?,
        })
    })?;

    let mut comments = vec![];
    for row in rows {
        comments.push(row?);
    }
    Ok(comments)
}

pub fn list_comments(conn: &Connection) -> anyhow::Result<Vec<Comment>> {
    list_comments_since(conn, 0)
}
