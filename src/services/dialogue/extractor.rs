//! Free-text field extraction for the chat router.
//!
//! Recommendation slots use ordered keyword tables: for each field the first
//! keyword found wins (active language first, then the other one), and the
//! matched words are removed before the next field is scanned. This is a
//! precision policy, not a longest-match search; "long" is claimed by face
//! shape before the style table ever sees it.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::models::{BookingRequest, Language, RecommendationSlots};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    FaceShape,
    HairType,
    Style,
}

struct KeywordTable {
    field: Field,
    en: &'static [&'static str],
    id: &'static [&'static str],
}

const TABLES: [KeywordTable; 3] = [
    KeywordTable {
        field: Field::FaceShape,
        en: &["oval", "square", "round", "heart", "diamond", "oblong", "long", "triangle"],
        id: &["oval", "kotak", "bulat", "hati", "wajik", "lonjong", "panjang", "segitiga"],
    },
    KeywordTable {
        field: Field::HairType,
        en: &["straight", "wavy", "curly", "coily", "fine", "thick", "thin"],
        id: &["lurus", "bergelombang", "keriting", "ikal", "tipis", "tebal"],
    },
    KeywordTable {
        field: Field::Style,
        en: &[
            "modern", "classic", "trendy", "minimalist", "professional", "casual", "short",
            "long", "medium", "undercut", "fade", "crop", "pompadour", "quiff", "buzz cut",
            "slick back", "taper", "crew cut",
        ],
        id: &[
            "modern", "klasik", "trend", "minimalis", "profesional", "santai", "pendek",
            "panjang", "sedang", "undercut", "fade", "crop", "pompadour", "quiff", "cepak",
            "slick back", "taper", "crew cut",
        ],
    },
];

const FILLER_EN: &[&str] = &[
    "for", "face", "hair", "style", "model", "i", "want", "like", "please", "recommend",
    "recommendation", "with", "and", "cut", "a", "an", "the", "my", "me", "is",
];

const FILLER_ID: &[&str] = &[
    "untuk", "wajah", "rambut", "gaya", "model", "saya", "ingin", "minta", "tolong", "carikan",
    "rekomendasi", "dengan", "dan", "potongan", "yang", "mau",
];

impl KeywordTable {
    fn ordered(&self, language: Language) -> impl Iterator<Item = &'static str> {
        let (first, second) = match language {
            Language::En => (self.en, self.id),
            Language::Id => (self.id, self.en),
        };
        first.iter().chain(second.iter()).copied()
    }
}

/// Maps Indonesian keywords onto the English values the skills expect.
fn canonical(field: Field, keyword: &str) -> &str {
    match (field, keyword) {
        (Field::FaceShape, "kotak") => "square",
        (Field::FaceShape, "bulat") => "round",
        (Field::FaceShape, "lonjong" | "panjang") => "oval",
        (Field::FaceShape, "hati") => "heart",
        (Field::FaceShape, "wajik") => "diamond",
        (Field::FaceShape, "segitiga") => "triangle",
        (Field::HairType, "lurus") => "straight",
        (Field::HairType, "bergelombang" | "ikal") => "wavy",
        (Field::HairType, "keriting") => "curly",
        (Field::HairType, "tipis") => "thin",
        (Field::HairType, "tebal") => "thick",
        (Field::Style, "klasik") => "classic",
        (Field::Style, "trend") => "trendy",
        (Field::Style, "minimalis") => "minimalist",
        (Field::Style, "profesional") => "professional",
        (Field::Style, "santai") => "casual",
        (Field::Style, "pendek") => "short",
        (Field::Style, "panjang") => "long",
        (Field::Style, "sedang") => "medium",
        (Field::Style, "cepak") => "buzz cut",
        _ => keyword,
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn find_phrase(tokens: &[String], phrase: &[&str]) -> Option<usize> {
    if phrase.is_empty() || phrase.len() > tokens.len() {
        return None;
    }
    tokens
        .windows(phrase.len())
        .position(|w| w.iter().zip(phrase).all(|(a, b)| a == b))
}

fn remove_phrase(tokens: &mut Vec<String>, phrase: &[&str]) {
    while let Some(start) = find_phrase(tokens, phrase) {
        tokens.drain(start..start + phrase.len());
    }
}

pub fn extract_slots(text: &str, language: Language) -> RecommendationSlots {
    let mut tokens = tokenize(text);
    let mut slots = RecommendationSlots::default();

    for table in &TABLES {
        let hit = table.ordered(language).find_map(|kw| {
            let phrase: Vec<&str> = kw.split(' ').collect();
            find_phrase(&tokens, &phrase).map(|_| (kw, phrase))
        });

        if let Some((kw, phrase)) = hit {
            let value = canonical(table.field, kw).to_string();
            match table.field {
                Field::FaceShape => slots.face_shape = Some(value),
                Field::HairType => slots.hair_type = Some(value),
                Field::Style => slots.style_preference = Some(value),
            }
            remove_phrase(&mut tokens, &phrase);
        }
    }

    let filler = match language {
        Language::En => FILLER_EN,
        Language::Id => FILLER_ID,
    };
    let rest: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .filter(|t| !filler.contains(t))
        .collect();
    if !rest.is_empty() {
        slots.reference_description = Some(rest.join(" "));
    }

    slots
}

struct BookingPatterns {
    name: Regex,
    date: Regex,
    time: Regex,
    phone: Regex,
}

fn booking_patterns(language: Language) -> &'static BookingPatterns {
    static EN: OnceLock<BookingPatterns> = OnceLock::new();
    static ID: OnceLock<BookingPatterns> = OnceLock::new();

    let (cell, name_words, phone_words) = match language {
        Language::En => (&EN, "name|for", "phone"),
        Language::Id => (&ID, "nama|untuk", "nomor|telp|telepon"),
    };

    cell.get_or_init(|| BookingPatterns {
        name: Regex::new(&format!(r"(?i)\b(?:{name_words})\b[:\s]+([a-z][a-z\s]*?)\s*(?:,|$)"))
            .expect("valid name pattern"),
        date: Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("valid date pattern"),
        time: Regex::new(r"\b(\d{2}:\d{2})\b").expect("valid time pattern"),
        phone: Regex::new(&format!(r"(?i)\b(?:{phone_words})\b[:\s]*(\d[\d\s-]{{7,}})"))
            .expect("valid phone pattern"),
    })
}

/// Pulls name, ISO date, HH:MM time and phone number out of one message.
/// Returns `None` unless all four are present and well-formed.
pub fn extract_booking_request(text: &str, language: Language) -> Option<BookingRequest> {
    let patterns = booking_patterns(language);

    let customer_name = patterns
        .name
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|n| !n.is_empty())?;
    let preferred_date = patterns
        .date
        .captures(text)
        .and_then(|c| NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok())?;
    let preferred_time = patterns
        .time
        .captures(text)
        .map(|c| c[1].to_string())
        .filter(|t| NaiveTime::parse_from_str(t, "%H:%M").is_ok())?;
    let contact_number: String = patterns
        .phone
        .captures(text)
        .map(|c| c[1].chars().filter(char::is_ascii_digit).collect())?;

    Some(BookingRequest {
        customer_name,
        preferred_date,
        preferred_time,
        contact_number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_and_hair_in_one_message() {
        let slots = extract_slots("Recommend a style for my round face and curly hair!", Language::En);
        assert_eq!(slots.face_shape.as_deref(), Some("round"));
        assert_eq!(slots.hair_type.as_deref(), Some("curly"));
    }

    #[test]
    fn test_indonesian_normalization() {
        let slots = extract_slots("wajah kotak rambut bergelombang", Language::Id);
        assert_eq!(slots.face_shape.as_deref(), Some("square"));
        assert_eq!(slots.hair_type.as_deref(), Some("wavy"));
        assert_eq!(slots.reference_description, None);
    }

    #[test]
    fn test_other_language_keywords_still_match() {
        let slots = extract_slots("oval face, rambut lurus", Language::En);
        assert_eq!(slots.face_shape.as_deref(), Some("oval"));
        assert_eq!(slots.hair_type.as_deref(), Some("straight"));
    }

    #[test]
    fn test_first_match_wins_and_consumes_token() {
        // "long" is taken by face shape, so style falls through to "fade"
        let slots = extract_slots("long face, fade please", Language::En);
        assert_eq!(slots.face_shape.as_deref(), Some("long"));
        assert_eq!(slots.style_preference.as_deref(), Some("fade"));
    }

    #[test]
    fn test_multi_word_style() {
        let slots = extract_slots("something like a buzz cut", Language::En);
        assert_eq!(slots.style_preference.as_deref(), Some("buzz cut"));
        assert_eq!(slots.reference_description.as_deref(), Some("something"));
    }

    #[test]
    fn test_reference_description_leftover() {
        let slots = extract_slots("oval face like ronaldo", Language::En);
        assert_eq!(slots.face_shape.as_deref(), Some("oval"));
        assert_eq!(slots.reference_description.as_deref(), Some("ronaldo"));
    }

    #[test]
    fn test_no_keywords() {
        let slots = extract_slots("hello there", Language::En);
        assert_eq!(slots.face_shape, None);
        assert_eq!(slots.hair_type, None);
        assert_eq!(slots.reference_description.as_deref(), Some("hello there"));
    }

    #[test]
    fn test_booking_request_english_example() {
        let req = extract_booking_request(
            "Book for John Doe, 2024-12-25, 10:00, Phone 08123456789",
            Language::En,
        )
        .unwrap();
        assert_eq!(req.customer_name, "John Doe");
        assert_eq!(req.preferred_date, NaiveDate::from_ymd_opt(2024, 12, 25).unwrap());
        assert_eq!(req.preferred_time, "10:00");
        assert_eq!(req.contact_number, "08123456789");
    }

    #[test]
    fn test_booking_request_indonesian() {
        let req = extract_booking_request(
            "Pesan untuk Budi, 2024-12-25, 10:00, Telepon 0812-3456-789",
            Language::Id,
        )
        .unwrap();
        assert_eq!(req.customer_name, "Budi");
        assert_eq!(req.contact_number, "08123456789");
    }

    #[test]
    fn test_booking_request_name_label() {
        let req = extract_booking_request(
            "appointment name: Andi Wijaya, 2025-01-05 14:00 phone: 081234567",
            Language::En,
        )
        .unwrap();
        assert_eq!(req.customer_name, "Andi Wijaya");
        assert_eq!(req.preferred_time, "14:00");
    }

    #[test]
    fn test_booking_request_incomplete() {
        assert!(extract_booking_request("I want to book an appointment", Language::En).is_none());
        assert!(extract_booking_request(
            "Book for John, 2024-12-25, Phone 08123456789",
            Language::En
        )
        .is_none());
    }

    #[test]
    fn test_booking_request_invalid_date() {
        assert!(extract_booking_request(
            "Book for John, 2024-13-45, 10:00, Phone 08123456789",
            Language::En
        )
        .is_none());
    }
}
