use std::env;
use std::time::Duration;

use crate::models::Language;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub llm_provider: String,
    pub groq_api_key: String,
    pub groq_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub llm_timeout: Duration,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_whatsapp_sender_number: String,
    pub owner_whatsapp_number: String,
    pub business_utc_offset_hours: i32,
    pub default_language: Language,
    pub session_ttl_minutes: i64,
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: parsed("PORT", 3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "barbershop.db".to_string()),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "ollama".to_string()),
            groq_api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            groq_model: env::var("GROQ_MODEL")
                .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            llm_timeout: Duration::from_secs(parsed("LLM_TIMEOUT_SECS", 60)),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            twilio_whatsapp_sender_number: env::var("TWILIO_WHATSAPP_SENDER_NUMBER")
                .unwrap_or_default(),
            owner_whatsapp_number: env::var("OWNER_WHATSAPP_RECIPIENT_NUMBER").unwrap_or_default(),
            // WIB
            business_utc_offset_hours: parsed("BUSINESS_UTC_OFFSET_HOURS", 7),
            default_language: env::var("DEFAULT_LANGUAGE")
                .ok()
                .and_then(|v| Language::from_code(&v))
                .unwrap_or_default(),
            session_ttl_minutes: parsed("SESSION_TTL_MINUTES", 30),
        }
    }
}
