//! Bot-visible text and the canned quick-reply sets.

use crate::models::{Language, Localized, QuickReply, QuickReplyAction, SlotField};

pub const GREETING: Localized = Localized::new(
    "Hello! I am KingBot, your AI assistant. How can I help you today with your hairstyle needs or appointment bookings?",
    "Halo! Saya KingBot, asisten AI Anda. Ada yang bisa saya bantu hari ini terkait kebutuhan gaya rambut Anda atau pemesanan janji?",
);

pub const THINKING: Localized = Localized::new("Thinking...", "Sedang berpikir...");

pub const FINDING_RECOMMENDATIONS: Localized = Localized::new(
    "Alright, let me find some recommendations for you...",
    "Baik, saya carikan beberapa rekomendasi untuk Anda...",
);

pub const FINDING_RECOMMENDATIONS_SHORTCUT: Localized = Localized::new(
    "Alright, let me find some recommendations for you based on that...",
    "Baik, saya carikan beberapa rekomendasi berdasarkan itu...",
);

pub const RECOMMENDATION_LABEL: Localized = Localized::new("Recommendation:", "Rekomendasi:");
pub const SUITABILITY_LABEL: Localized = Localized::new("Suitability:", "Kecocokan:");

pub const ANYTHING_ELSE: Localized = Localized::new(
    "Is there anything else I can help you with?",
    "Ada lagi yang bisa saya bantu?",
);

pub const ANYTHING_ELSE_GENERAL: Localized = Localized::new(
    "Is there anything else I can assist you with regarding hairstyles or our services?",
    "Ada lagi yang bisa saya bantu terkait gaya rambut atau layanan kami?",
);

// Opening prompts, used when a recommendation request starts.
pub const ASK_FACE_OPENING: Localized = Localized::new(
    "Sure, I can help with haircut recommendations! First, what's your face shape? (e.g., oval, round, square)",
    "Tentu, saya bisa bantu rekomendasi potongan rambut! Pertama, apa bentuk wajah Anda? (misalnya oval, bulat, kotak)",
);

pub const ASK_HAIR_OPENING: Localized = Localized::new(
    "Okay, I have your face shape. What's your hair type? (e.g., straight, wavy, curly)",
    "Oke, bentuk wajah sudah ada. Apa jenis rambut Anda? (misalnya lurus, bergelombang, keriting)",
);

// Follow-up prompts, used while details are still being collected.
pub const ASK_FACE_FOLLOW_UP: Localized = Localized::new(
    "I see. And what is your face shape (e.g., round, oval, square)?",
    "Baik. Lalu, apa bentuk wajah Anda (misalnya bulat, oval, kotak)?",
);

pub const ASK_HAIR_FOLLOW_UP: Localized = Localized::new(
    "Great! Now, what is your hair type (e.g., straight, wavy, curly)?",
    "Sip! Sekarang, apa jenis rambut Anda (misalnya lurus, bergelombang, keriting)?",
);

pub const ASK_FACE_QUICK_REPLY: Localized = Localized::new(
    "Okay, I can help with that! What is your face shape (e.g., round, square, oval)?",
    "Baik, saya bisa bantu! Apa bentuk wajah Anda (misalnya, bulat, kotak, oval)?",
);

pub const BOOKING_INSTRUCTIONS: Localized = Localized::new(
    "To book, please tell me your Name, preferred Date (YYYY-MM-DD), Time (HH:MM), and Phone Number. Example: Book for John Doe, 2024-12-25, 10:00, Phone 08123456789",
    "Untuk memesan, tolong sebutkan Nama, Tanggal (YYYY-MM-DD), Waktu (HH:MM), dan Nomor Telepon Anda. Contoh: Pesan untuk Budi, 2024-12-25, 10:00, Telepon 08123456789",
);

pub const BOOKING_INSTRUCTIONS_QUICK_REPLY: Localized = Localized::new(
    "Sure! To book an appointment, please tell me your Full Name, preferred Date (YYYY-MM-DD), Time (HH:MM), and Phone Number. Example: Book for John Doe, 2024-12-25, 10:00, Phone 08123456789",
    "Tentu! Untuk memesan janji, tolong sebutkan Nama Lengkap, Tanggal (YYYY-MM-DD), Waktu (HH:MM), dan Nomor Telepon Anda. Contoh: Pesan untuk Budi, 2024-12-25, 10:00, Telepon 08123456789",
);

pub const APOLOGY: Localized = Localized::new(
    "Oops! Something went wrong. Please try again.",
    "Oops! Terjadi kesalahan. Silakan coba lagi.",
);

pub const APOLOGY_QUICK_REPLY: Localized = Localized::new(
    "Oops! Something went wrong with that option.",
    "Oops! Terjadi kesalahan dengan opsi itu.",
);

pub const CHATBOT_ERROR_TITLE: Localized = Localized::new("Chatbot Error", "Kesalahan Chatbot");

pub const COULD_NOT_PROCESS: Localized = Localized::new(
    "Could not process your request.",
    "Tidak dapat memproses permintaan Anda.",
);

fn option(label: Localized, action: QuickReplyAction, language: Language) -> QuickReply {
    QuickReply {
        label: label.pick(language).to_string(),
        action,
    }
}

fn detail(label: Localized, payload: Localized, language: Language) -> QuickReply {
    option(
        label,
        QuickReplyAction::ProvideDetail {
            text: payload.pick(language).to_string(),
        },
        language,
    )
}

pub fn default_menu(language: Language) -> Vec<QuickReply> {
    vec![
        option(
            Localized::new("Book Appointment", "Pesan Janji"),
            QuickReplyAction::InitBookAppointment,
            language,
        ),
        option(
            Localized::new("Haircut Trends 2025", "Tren Rambut 2025"),
            QuickReplyAction::TrendingHaircuts,
            language,
        ),
        option(
            Localized::new("Recommend Haircut", "Rekomendasi Potongan"),
            QuickReplyAction::InitRecommendHaircut,
            language,
        ),
    ]
}

/// The three canned answers offered when `field` is the one still missing.
pub fn field_options(field: SlotField, language: Language) -> Vec<QuickReply> {
    match field {
        SlotField::FaceShape => vec![
            detail(Localized::new("Oval", "Oval"), Localized::new("oval face", "wajah oval"), language),
            detail(Localized::new("Round", "Bulat"), Localized::new("round face", "wajah bulat"), language),
            detail(Localized::new("Square", "Kotak"), Localized::new("square face", "wajah kotak"), language),
        ],
        SlotField::HairType => vec![
            detail(
                Localized::new("Straight", "Lurus"),
                Localized::new("straight hair", "rambut lurus"),
                language,
            ),
            detail(
                Localized::new("Wavy", "Bergelombang"),
                Localized::new("wavy hair", "rambut bergelombang"),
                language,
            ),
            detail(
                Localized::new("Curly", "Keriting"),
                Localized::new("curly hair", "rambut keriting"),
                language,
            ),
        ],
    }
}
