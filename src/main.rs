use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use kingbarber::config::AppConfig;
use kingbarber::db;
use kingbarber::handlers;
use kingbarber::services::ai::groq::GroqProvider;
use kingbarber::services::ai::ollama::OllamaProvider;
use kingbarber::services::ai::{LlmProvider, LlmSkills};
use kingbarber::services::availability::AvailabilityService;
use kingbarber::services::booking::{BookingStore, SqliteBookingStore};
use kingbarber::services::clock::SystemClock;
use kingbarber::services::conversation;
use kingbarber::services::dialogue::KeywordClassifier;
use kingbarber::services::messaging::twilio::{is_whatsapp_number, TwilioWhatsAppProvider};
use kingbarber::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "groq" => {
            anyhow::ensure!(!config.groq_api_key.is_empty(), "GROQ_API_KEY must be set when LLM_PROVIDER=groq");
            tracing::info!("using Groq LLM provider (model: {})", config.groq_model);
            Box::new(GroqProvider::new(
                config.groq_api_key.clone(),
                config.groq_model.clone(),
                config.llm_timeout,
            )?)
        }
        _ => {
            tracing::info!("using Ollama LLM provider (url: {}, model: {})", config.ollama_url, config.ollama_model);
            Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
                config.llm_timeout,
            )?)
        }
    };

    if !is_whatsapp_number(&config.owner_whatsapp_number) {
        tracing::warn!("OWNER_WHATSAPP_RECIPIENT_NUMBER missing or malformed; owner notifications will fail");
    }
    let messaging = TwilioWhatsAppProvider::new(
        config.twilio_account_sid.clone(),
        config.twilio_auth_token.clone(),
        config.twilio_whatsapp_sender_number.clone(),
    );

    let store: Arc<dyn BookingStore> = Arc::new(SqliteBookingStore::new(Arc::clone(&db)));
    let clock = Arc::new(SystemClock::with_utc_offset_hours(config.business_utc_offset_hours));
    let (comments_tx, _) = broadcast::channel(256);

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        skills: Box::new(LlmSkills::new(llm)),
        messaging: Box::new(messaging),
        classifier: Box::new(KeywordClassifier::default()),
        availability: AvailabilityService::new(Arc::clone(&store), clock),
        store,
        comments_tx,
    });

    // Sweep expired chat sessions and idle slot boards
    {
        let state = Arc::clone(&state);
        let board_idle = Duration::from_secs(config.session_ttl_minutes.max(1) as u64 * 60);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                if let Err(e) = conversation::cleanup_expired(&state) {
                    tracing::error!(error = %e, "session cleanup failed");
                }
                let evicted = state.availability.evict_idle(board_idle);
                if evicted > 0 {
                    tracing::info!(evicted, "idle slot boards removed");
                }
            }
        });
    }

    let app = handlers::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
