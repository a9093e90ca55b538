use std::sync::{Arc, OnceLock};

use regex::{Captures, Regex};

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::models::{Comment, Language, NewComment};
use crate::state::AppState;

pub const BOT_AUTHOR: &str = "KingBot";

const MAX_AUTHOR_CHARS: usize = 60;
const MAX_TEXT_CHARS: usize = 1000;

const BAD_WORDS_EN: &[&str] = &["shit", "motherfucker", "heck", "darn"];

const BAD_WORDS_ID: &[&str] = &[
    "ngentot", "tot", "sialan", "kurangajar", "tolol", "bangsat", "anjing", "babi", "pukimak",
    "bodat", "tai", "tahi", "sundal", "jancok", "jancuk", "ndasmu", "raimu", "gendeng", "goblog",
    "asu", "cangkeme",
];

fn word_list_pattern(words: &[&str]) -> Regex {
    let alternation = words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("escaped word list is a valid pattern")
}

fn bad_words(language: Language) -> &'static Regex {
    static EN: OnceLock<Regex> = OnceLock::new();
    static ID: OnceLock<Regex> = OnceLock::new();
    match language {
        Language::En => EN.get_or_init(|| word_list_pattern(BAD_WORDS_EN)),
        Language::Id => ID.get_or_init(|| word_list_pattern(BAD_WORDS_ID)),
    }
}

/// Mask whole-word profanity for the comment's language with asterisks of the
/// same length.
pub fn filter_profanity(text: &str, language: Language) -> String {
    bad_words(language)
        .replace_all(text, |caps: &Captures| "*".repeat(caps[0].chars().count()))
        .into_owned()
}

fn store(
    state: &Arc<AppState>,
    author: &str,
    text: &str,
    language: Language,
    is_ai_reply: bool,
) -> Result<Comment, AppError> {
    let comment = {
        let conn = db::lock(&state.db)?;
        queries::insert_comment(&conn, author, text, language, is_ai_reply)?
    };
    // No subscribers is fine
    let _ = state.comments_tx.send(comment.clone());
    Ok(comment)
}

/// Store and broadcast a visitor comment. Strongly negative feedback gets an
/// empathetic reply from the bot, stored and broadcast right after it.
/// Returns every comment written, the visitor's first.
pub async fn post_comment(state: &Arc<AppState>, new: NewComment) -> Result<Vec<Comment>, AppError> {
    let author = new.author.trim();
    let text = new.text.trim();
    if author.is_empty() || text.is_empty() {
        return Err(AppError::Validation("author and text are required".to_string()));
    }
    if author.chars().count() > MAX_AUTHOR_CHARS || text.chars().count() > MAX_TEXT_CHARS {
        return Err(AppError::Validation("comment is too long".to_string()));
    }

    // The feed shows the masked text; the review still reads the original.
    let shown = filter_profanity(text, new.language);
    let comment = store(state, author, &shown, new.language, false)?;
    tracing::info!(comment_id = comment.id, author, "comment posted");
    let mut written = vec![comment];

    let review = match state.skills.review_feedback(text, author, new.language).await {
        Ok(review) => review,
        Err(e) => {
            tracing::warn!(error = %e, "feedback review failed; treating comment as not negative");
            return Ok(written);
        }
    };

    if let (true, Some(response)) = (review.is_negative, review.response) {
        let response = response.trim();
        if !response.is_empty() {
            let reply = store(state, BOT_AUTHOR, response, new.language, true)?;
            tracing::info!(comment_id = reply.id, "replied to negative feedback");
            written.push(reply);
        }
    }

    Ok(written)
}

pub fn list(state: &Arc<AppState>) -> Result<Vec<Comment>, AppError> {
    let conn = db::lock(&state.db)?;
    Ok(queries::list_comments(&conn)?)
}

pub fn list_since(state: &Arc<AppState>, after_id: i64) -> Result<Vec<Comment>, AppError> {
    let conn = db::lock(&state.db)?;
    Ok(queries::list_comments_since(&conn, after_id)?)
}
