use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::NaiveDateTime;
use serde_json::{json, Value};
use tokio::sync::{broadcast, Notify};
use tower::ServiceExt;

use kingbarber::config::AppConfig;
use kingbarber::db;
use kingbarber::handlers;
use kingbarber::db::queries;
use kingbarber::models::{Language, NewAppointment, SaveOutcome, SlotCounts};
use kingbarber::services::ai::{LlmProvider, LlmSkills, Message};
use kingbarber::services::availability::AvailabilityService;
use kingbarber::services::booking::{BookingStore, SqliteBookingStore, StoreError};
use kingbarber::services::clock::FixedClock;
use kingbarber::services::conversation;
use kingbarber::services::dialogue::{ChatEvent, KeywordClassifier};
use kingbarber::services::messaging::MessagingProvider;
use kingbarber::state::AppState;

// ── Mock Providers ──

/// Answers by looking at which skill prompt it was given.
struct MockLlm;

#[async_trait]
impl LlmProvider for MockLlm {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");

        if system_prompt.contains("booking assistant") {
            anyhow::bail!("booking backend offline")
        } else if system_prompt.contains("Recommend exactly one haircut") {
            Ok(r#"{"recommended_haircut":"Two Block Haircut","description":"Short sides with a longer top layer.","suitability_explanation":"Works well with an oval face and wavy hair."}"#.to_string())
        } else if system_prompt.contains("fashion expert") {
            Ok(r#"{"trends":"Mullets and textured crops are everywhere this year."}"#.to_string())
        } else if system_prompt.contains("customer service representative") {
            if last.contains("terrible") {
                Ok(r#"{"is_negative":true,"response":"We're sorry to hear that. Please contact us so we can make it right."}"#.to_string())
            } else {
                Ok(r#"{"is_negative":false,"response":null}"#.to_string())
            }
        } else {
            Ok(r#"{"answer":"We open at 9 AM every day."}"#.to_string())
        }
    }
}

/// Blocks every call until released, then answers.
struct GatedLlm {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl LlmProvider for GatedLlm {
    async fn chat(&self, _system_prompt: &str, _messages: &[Message]) -> anyhow::Result<String> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(r#"{"answer":"We open at 9 AM every day."}"#.to_string())
    }
}

/// Never answers.
struct SilentLlm;

#[async_trait]
impl LlmProvider for SilentLlm {
    async fn chat(&self, _system_prompt: &str, _messages: &[Message]) -> anyhow::Result<String> {
        std::future::pending().await
    }
}

struct DownStore;

#[async_trait]
impl BookingStore for DownStore {
    async fn get_booking_counts(&self, _date: chrono::NaiveDate) -> Result<SlotCounts, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn save_appointment(&self, _appointment: &NewAppointment) -> Result<SaveOutcome, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

struct MockMessaging {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl MessagingProvider for MockMessaging {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

// ── Helpers ──

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        llm_provider: "ollama".to_string(),
        groq_api_key: String::new(),
        groq_model: String::new(),
        ollama_url: "http://localhost:11434".to_string(),
        ollama_model: "llama3.2".to_string(),
        llm_timeout: Duration::from_secs(5),
        twilio_account_sid: String::new(),
        twilio_auth_token: String::new(),
        twilio_whatsapp_sender_number: "whatsapp:+14155238886".to_string(),
        owner_whatsapp_number: "whatsapp:+6281234567890".to_string(),
        business_utc_offset_hours: 7,
        default_language: Language::Id,
        session_ttl_minutes: 30,
    }
}

fn build_state(
    llm: Box<dyn LlmProvider>,
    store: Option<Arc<dyn BookingStore>>,
    llm_timeout: Duration,
) -> (Arc<AppState>, Arc<Mutex<Vec<(String, String)>>>) {
    let conn = db::init_db(":memory:").unwrap();
    let db = Arc::new(Mutex::new(conn));
    let sent = Arc::new(Mutex::new(vec![]));
    let messaging = MockMessaging {
        sent: Arc::clone(&sent),
    };

    let store = store.unwrap_or_else(|| Arc::new(SqliteBookingStore::new(Arc::clone(&db))));
    let clock = Arc::new(FixedClock(at("2025-06-16 08:00")));
    let (comments_tx, _) = broadcast::channel(16);

    let mut config = test_config();
    config.llm_timeout = llm_timeout;

    let state = Arc::new(AppState {
        db,
        config,
        skills: Box::new(LlmSkills::new(llm)),
        messaging: Box::new(messaging),
        classifier: Box::new(KeywordClassifier::default()),
        availability: AvailabilityService::new(Arc::clone(&store), clock),
        store,
        comments_tx,
    });
    (state, sent)
}

fn test_state_with_sent() -> (Arc<AppState>, Arc<Mutex<Vec<(String, String)>>>) {
    build_state(Box::new(MockLlm), None, Duration::from_secs(5))
}

fn test_app() -> Router {
    let (state, _) = test_state_with_sent();
    handlers::router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let res = app.clone().oneshot(request).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn new_session(app: &Router, language: &str) -> String {
    let (status, body) = send(app, "POST", "/api/chat/sessions", Some(json!({ "language": language }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

fn last_message(reply: &Value) -> &Value {
    reply["session"]["state"]["messages"]
        .as_array()
        .and_then(|m| m.last())
        .unwrap()
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// ── Chat ──

#[tokio::test]
async fn test_new_session_greets_with_menu() {
    let app = test_app();
    let (status, body) = send(&app, "POST", "/api/chat/sessions", Some(json!({ "language": "en" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let messages = body["state"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0]["text"].as_str().unwrap().starts_with("Hello! I am KingBot"));
    assert_eq!(messages[0]["options"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_general_question_falls_back_to_answer_skill() {
    let app = test_app();
    let id = new_session(&app, "en").await;

    let (status, reply) = send(
        &app,
        "POST",
        &format!("/api/chat/sessions/{id}/messages"),
        Some(json!({ "text": "What are your opening hours?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let last = last_message(&reply);
    assert_eq!(last["sender"], "bot");
    assert_eq!(last["loading"], false);
    assert_eq!(
        last["text"],
        "We open at 9 AM every day.\n\nIs there anything else I can assist you with regarding hairstyles or our services?"
    );
    assert_eq!(last["options"].as_array().unwrap().len(), 3);
    assert!(reply.get("notice").is_none());
}

#[tokio::test]
async fn test_recommendation_collected_over_several_turns() {
    let app = test_app();
    let id = new_session(&app, "en").await;
    let messages_uri = format!("/api/chat/sessions/{id}/messages");
    let picks_uri = format!("/api/chat/sessions/{id}/quick-replies");

    let (_, reply) = send(&app, "POST", &messages_uri, Some(json!({ "text": "Can you recommend a haircut?" }))).await;
    assert_eq!(reply["session"]["state"]["context"]["state"], "awaiting_recommendation_details");
    assert!(last_message(&reply)["text"].as_str().unwrap().contains("what's your face shape"));

    // "Oval"
    let (status, reply) = send(&app, "POST", &picks_uri, Some(json!({ "index": 0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["session"]["state"]["context"]["pending"]["face_shape"], "oval");
    assert!(last_message(&reply)["text"].as_str().unwrap().starts_with("Great! Now, what is your hair type"));

    // "Wavy"
    let (status, reply) = send(&app, "POST", &picks_uri, Some(json!({ "index": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["session"]["state"]["context"]["state"], "idle");

    let last = last_message(&reply);
    let text = last["text"].as_str().unwrap();
    assert!(text.starts_with("Recommendation: Two Block Haircut"));
    assert!(text.ends_with("Is there anything else I can help you with?"));
    assert!(last["image"]["url"].is_string());
}

#[tokio::test]
async fn test_booking_skill_failure_apologizes() {
    let app = test_app();
    let id = new_session(&app, "en").await;

    let (status, reply) = send(
        &app,
        "POST",
        &format!("/api/chat/sessions/{id}/messages"),
        Some(json!({ "text": "Book for Budi, 2025-06-18, 10:00, phone 08123456789" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let last = last_message(&reply);
    assert_eq!(last["text"], "Oops! Something went wrong. Please try again.");
    assert_eq!(last["loading"], false);
    assert!(last.get("options").is_none());
    assert_eq!(reply["session"]["state"]["context"]["state"], "idle");
    assert_eq!(reply["notice"]["title"], "Chatbot Error");
    assert!(reply["notice"]["description"]
        .as_str()
        .unwrap()
        .contains("booking backend offline"));
}

#[tokio::test]
async fn test_booking_without_details_gets_instructions() {
    let app = test_app();
    let id = new_session(&app, "id").await;

    let (_, reply) = send(
        &app,
        "POST",
        &format!("/api/chat/sessions/{id}/messages"),
        Some(json!({ "text": "Saya mau pesan janji" })),
    )
    .await;
    assert!(last_message(&reply)["text"]
        .as_str()
        .unwrap()
        .starts_with("Untuk memesan"));
}

#[tokio::test]
async fn test_trends_quick_reply() {
    let app = test_app();
    let id = new_session(&app, "en").await;

    let (status, reply) = send(
        &app,
        "POST",
        &format!("/api/chat/sessions/{id}/quick-replies"),
        Some(json!({ "index": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let messages = reply["session"]["state"]["messages"].as_array().unwrap();
    assert_eq!(messages[messages.len() - 2]["text"], "Haircut Trends 2025");
    assert!(last_message(&reply)["text"]
        .as_str()
        .unwrap()
        .starts_with("Mullets and textured crops"));
}

#[tokio::test]
async fn test_bad_chat_events_rejected() {
    let app = test_app();
    let id = new_session(&app, "en").await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/chat/sessions/{id}/quick-replies"),
        Some(json!({ "index": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/chat/sessions/{id}/messages"),
        Some(json!({ "text": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Rejected events leave the transcript untouched
    let (_, session) = send(&app, "GET", &format!("/api/chat/sessions/{id}"), None).await;
    assert_eq!(session["state"]["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_session_not_found() {
    let app = test_app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/chat/sessions/nope/messages",
        Some(json!({ "text": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dropped_request_still_settles_reply() {
    let (state, _) = build_state(Box::new(SilentLlm), None, Duration::from_millis(200));
    let id = conversation::create_session(&state, Some(Language::En)).unwrap().id;

    // The client goes away while the skill is still running
    let dropped = tokio::time::timeout(
        Duration::from_millis(20),
        conversation::process_event(&state, &id, ChatEvent::Utterance("What are your opening hours?".into())),
    )
    .await;
    assert!(dropped.is_err());

    let mut settled = None;
    for _ in 0..50 {
        let session = conversation::get_session(&state, &id).unwrap();
        if !session.state.reply_pending() {
            settled = Some(session);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let session = settled.expect("placeholder settled after the skill timed out");
    let last = session.state.messages.last().unwrap();
    assert_eq!(last.text, "Oops! Something went wrong. Please try again.");

    let reply = conversation::process_event(&state, &id, ChatEvent::Utterance("Book an appointment".into()))
        .await
        .unwrap();
    assert!(!reply.session.state.reply_pending());
}

#[tokio::test]
async fn test_stalled_placeholder_is_abandoned_on_next_event() {
    let (state, _) = test_state_with_sent();
    let id = conversation::create_session(&state, Some(Language::En)).unwrap().id;

    // A reply whose final save never happened
    {
        let conn = db::lock(&state.db).unwrap();
        let mut session = queries::get_session(&conn, &id, chrono::Utc::now().naive_utc())
            .unwrap()
            .unwrap();
        session.state.push_user("What are your opening hours?");
        session.state.push_placeholder("Thinking...");
        session.last_activity = session.last_activity - chrono::Duration::minutes(10);
        queries::save_session(&conn, &session).unwrap();
    }

    let reply = conversation::process_event(&state, &id, ChatEvent::Utterance("What are your opening hours?".into()))
        .await
        .unwrap();
    let messages = &reply.session.state.messages;
    assert_eq!(messages.len(), 5);
    assert_eq!(messages[2].text, "Oops! Something went wrong. Please try again.");
    assert!(!messages[2].loading);
    assert!(messages[4].text.starts_with("We open at 9 AM every day."));
}

#[tokio::test]
async fn test_language_switch_during_reply_is_kept() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let llm = GatedLlm {
        entered: Arc::clone(&entered),
        release: Arc::clone(&release),
    };
    let (state, _) = build_state(Box::new(llm), None, Duration::from_secs(5));
    let id = conversation::create_session(&state, Some(Language::En)).unwrap().id;

    let pending = {
        let state = Arc::clone(&state);
        let id = id.clone();
        tokio::spawn(async move {
            conversation::process_event(&state, &id, ChatEvent::Utterance("What are your opening hours?".into()))
                .await
        })
    };

    entered.notified().await;
    let switched = conversation::set_language(&state, &id, Language::Id).unwrap();
    assert_eq!(switched.state.language, Language::Id);

    // A second event while the reply is pending is refused
    let err = conversation::process_event(&state, &id, ChatEvent::Utterance("hi again".into())).await;
    assert!(err.is_err());

    release.notify_one();
    let reply = pending.await.unwrap().unwrap();
    assert_eq!(reply.session.state.language, Language::Id);
    assert!(!reply.session.state.reply_pending());

    let stored = conversation::get_session(&state, &id).unwrap();
    assert_eq!(stored.state.language, Language::Id);
    assert!(stored
        .state
        .messages
        .last()
        .unwrap()
        .text
        .ends_with("Ada lagi yang bisa saya bantu terkait gaya rambut atau layanan kami?"));
}

// ── Booking ──

fn booking_form(name: &str) -> Value {
    json!({
        "customer_name": name,
        "customer_phone": "08123456789",
        "booking_date": "2025-06-17",
        "booking_time": "15:00",
        "payment_method": "gopay",
        "language": "en",
    })
}

#[tokio::test]
async fn test_slot_fills_up_after_two_bookings() {
    let (state, sent) = test_state_with_sent();
    let app = handlers::router(state);

    let (status, receipt) = send(&app, "POST", "/api/booking/v1/appointments", Some(booking_form("Budi"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["outcome"]["success"], true);
    assert_eq!(receipt["owner_notified"], true);
    assert_eq!(receipt["board"]["disabled"]["15:00"], false);

    let (status, receipt) = send(&app, "POST", "/api/booking/v2/appointments", Some(booking_form("Andi"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["board"]["disabled"]["15:00"], true);

    let (status, body) = send(&app, "POST", "/api/booking/v3/appointments", Some(booking_form("Citra"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("full"));

    let (status, view) = send(&app, "GET", "/api/availability?date=2025-06-17", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["disabled"]["15:00"], true);
    assert_eq!(view["disabled"]["16:00"], false);

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0, "whatsapp:+6281234567890");
    assert!(sent[0].1.contains("Pelanggan: Budi"));
    assert!(sent[0].1.contains("Pembayaran: GoPay"));
}

#[tokio::test]
async fn test_past_slots_disabled_today() {
    let app = test_app();
    // Clock is fixed at 2025-06-16 08:00
    let (status, board) = send(
        &app,
        "POST",
        "/api/booking/v1/date",
        Some(json!({ "date": "2025-06-16", "language": "en" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["selected"], "2025-06-16");
    assert_eq!(board["fetching"], false);
    assert_eq!(board["disabled"]["09:00"], false);

    let (_, board) = send(&app, "GET", "/api/booking/v1", None).await;
    assert_eq!(board["selected"], "2025-06-16");
}

#[tokio::test]
async fn test_booking_store_outage_surfaces() {
    let (state, sent) = build_state(Box::new(MockLlm), Some(Arc::new(DownStore)), Duration::from_secs(5));
    let app = handlers::router(state);

    let (status, body) = send(&app, "POST", "/api/booking/v1/appointments", Some(booking_form("Budi"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_incomplete_booking_form() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/booking/v1/appointments",
        Some(json!({ "customer_name": "Budi", "language": "en" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please fill in all fields.");
}

// ── Comments ──

#[tokio::test]
async fn test_negative_comment_gets_bot_reply() {
    let app = test_app();

    let (status, written) = send(
        &app,
        "POST",
        "/api/comments",
        Some(json!({ "author": "Andi", "text": "The haircut was terrible", "language": "en" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let written = written.as_array().unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(written[1]["author"], "KingBot");
    assert_eq!(written[1]["is_ai_reply"], true);

    let (status, written) = send(
        &app,
        "POST",
        "/api/comments",
        Some(json!({ "author": "Sari", "text": "Great cut, thanks!", "language": "en" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(written.as_array().unwrap().len(), 1);

    let (_, all) = send(&app, "GET", "/api/comments", None).await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0]["author"], "Andi");
    assert_eq!(all[2]["author"], "Sari");
}

#[tokio::test]
async fn test_comment_profanity_masked() {
    let app = test_app();

    let (status, written) = send(
        &app,
        "POST",
        "/api/comments",
        Some(json!({ "author": "Joko", "text": "Potongannya oke, tapi antriannya bikin tolol", "language": "id" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(written[0]["text"], "Potongannya oke, tapi antriannya bikin *****");

    let (_, all) = send(&app, "GET", "/api/comments", None).await;
    assert_eq!(all[0]["text"], "Potongannya oke, tapi antriannya bikin *****");
}

#[tokio::test]
async fn test_empty_comment_rejected() {
    let app = test_app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/comments",
        Some(json!({ "author": "Andi", "text": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
