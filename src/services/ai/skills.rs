use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::models::{
    haircut, BookingConfirmation, BookingRequest, FeedbackReview, HaircutRecommendation, Language,
    RecommendationSlots,
};
use crate::services::ai::{LlmProvider, Message};

/// The external capabilities the chat and comment feed delegate to.
#[async_trait]
pub trait Skills: Send + Sync {
    async fn answer_question(&self, question: &str, language: Language) -> anyhow::Result<String>;

    async fn suggest_trends(&self, language: Language) -> anyhow::Result<String>;

    async fn recommend_haircut(
        &self,
        slots: &RecommendationSlots,
        language: Language,
    ) -> anyhow::Result<HaircutRecommendation>;

    async fn book_appointment(
        &self,
        request: &BookingRequest,
        language: Language,
    ) -> anyhow::Result<BookingConfirmation>;

    /// Flags strongly negative feedback and drafts a short empathetic reply.
    async fn review_feedback(
        &self,
        text: &str,
        author: &str,
        language: Language,
    ) -> anyhow::Result<FeedbackReview>;
}

const PERSONA: &str = "You are KingBot, a friendly and knowledgeable assistant for King Barbershop - Kutabumi, a men's barbershop in Indonesia.";

const PLAIN_TEXT_RULE: &str = "Do not use double asterisks (**) for bolding.";

const PRICE_LIST: &str = r#"Services:
- Basic Package (Paket Basic): Rp 35,000. Hair cut, shaving.
- Senior Package (Paket Senior): Rp 40,000. Hair cut, shaving, hair wash, hair tonic, styling pomade.
- Executive Package (Paket Executive): Rp 45,000, most popular. Senior package plus head massage.
- Shaving (Cukur): Rp 25,000.
- Head Massage + Wash (Pijat Kepala + Cuci): Rp 30,000.
- Hair Colouring Black: Rp 95,000. Bleaching: Rp 215,000. Full Colour: Rp 300,000.
- Perming (Keriting Rambut): Rp 250,000, includes hair cut.
Products:
- Clay King Barbershop (small): Rp 35,000.
- Hair Tonic King Barbershop: Rp 50,000.
- Hair Powder King Barbershop: Rp 35,000.
If asked the price of a haircut without naming a package, list the three packages and ask which one they want."#;

fn language_name(language: Language) -> &'static str {
    match language {
        Language::En => "English",
        Language::Id => "Indonesian",
    }
}

pub struct LlmSkills {
    llm: Box<dyn LlmProvider>,
}

impl LlmSkills {
    pub fn new(llm: Box<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    async fn ask(&self, system: &str, user: String) -> anyhow::Result<String> {
        self.llm.chat(system, &[Message::user(user)]).await
    }
}

#[derive(Deserialize)]
struct AnswerReply {
    answer: String,
}

#[derive(Deserialize)]
struct TrendsReply {
    trends: String,
}

#[async_trait]
impl Skills for LlmSkills {
    async fn answer_question(&self, question: &str, language: Language) -> anyhow::Result<String> {
        let system = format!(
            "{PERSONA}\nAnswer questions about men's hairstyles, hair care, hair problems, our services and products. \
             Be concise and do not make up information. Respond in {}. {PLAIN_TEXT_RULE}\n\n{PRICE_LIST}\n\n\
             Return ONLY JSON: {{\"answer\": \"...\"}}",
            language_name(language)
        );
        let response = self.ask(&system, question.to_string()).await?;
        Ok(parse_json_reply::<AnswerReply>(&response)
            .map(|r| r.answer)
            .unwrap_or_else(|| response.trim().to_string()))
    }

    async fn suggest_trends(&self, language: Language) -> anyhow::Result<String> {
        let system = format!(
            "You are a fashion expert specializing in men's haircuts in Indonesia. It is currently 2025. \
             Respond in {}. {PLAIN_TEXT_RULE}\n\nReturn ONLY JSON: {{\"trends\": \"...\"}}",
            language_name(language)
        );
        let response = self
            .ask(&system, "What are the latest haircut trends for men in Indonesia?".to_string())
            .await?;
        Ok(parse_json_reply::<TrendsReply>(&response)
            .map(|r| r.trends)
            .unwrap_or_else(|| response.trim().to_string()))
    }

    async fn recommend_haircut(
        &self,
        slots: &RecommendationSlots,
        language: Language,
    ) -> anyhow::Result<HaircutRecommendation> {
        let catalog: Vec<&str> = haircut::HAIRCUTS.iter().map(|h| h.name.en).collect();
        let system = format!(
            "{PERSONA}\nRecommend exactly one haircut for the customer. Prefer one of: {}. \
             Respond in {}. {PLAIN_TEXT_RULE}\n\n\
             Return ONLY JSON: {{\"recommended_haircut\": \"...\", \"description\": \"...\", \"suitability_explanation\": \"...\"}}",
            catalog.join(", "),
            language_name(language)
        );

        let mut details = format!(
            "Face shape: {}\nHair type: {}",
            slots.face_shape.as_deref().unwrap_or("unknown"),
            slots.hair_type.as_deref().unwrap_or("unknown"),
        );
        if let Some(style) = &slots.style_preference {
            details.push_str(&format!("\nStyle preference: {style}"));
        }
        if let Some(reference) = &slots.reference_description {
            details.push_str(&format!("\nReference: {reference}"));
        }
        let suited: Vec<&str> = haircut::suited_to(slots).map(|h| h.name.en).collect();
        if !suited.is_empty() {
            details.push_str(&format!("\nCatalog matches: {}", suited.join(", ")));
        }

        let response = self.ask(&system, details).await?;
        parse_json_reply(&response)
            .ok_or_else(|| anyhow::anyhow!("recommendation reply was not valid JSON"))
    }

    async fn book_appointment(
        &self,
        request: &BookingRequest,
        language: Language,
    ) -> anyhow::Result<BookingConfirmation> {
        let system = format!(
            "You are a booking assistant for King Barbershop - Kutabumi. Greet the customer by name and confirm \
             the date and time of their appointment in a friendly way. Do not ask for more information. \
             Respond in {}. {PLAIN_TEXT_RULE}\n\n\
             Return ONLY JSON: {{\"confirmation_message\": \"...\", \"appointment_details\": \"...\"}}",
            language_name(language)
        );
        let details = format!(
            "Customer Name: {}\nPreferred Date: {}\nPreferred Time: {}\nContact Number: {}",
            request.customer_name,
            request.preferred_date.format("%Y-%m-%d"),
            request.preferred_time,
            request.contact_number,
        );

        let response = self.ask(&system, details).await?;
        Ok(parse_json_reply(&response).unwrap_or_else(|| BookingConfirmation {
            confirmation_message: response.trim().to_string(),
            appointment_details: String::new(),
        }))
    }

    async fn review_feedback(
        &self,
        text: &str,
        author: &str,
        language: Language,
    ) -> anyhow::Result<FeedbackReview> {
        let system = format!(
            "You are a customer service representative for King Barbershop. Decide whether the feedback is a \
             significant complaint or strongly negative. If it is, set is_negative to true and write a 1-2 sentence \
             empathetic, non-defensive response in {} that invites the customer to contact us directly. \
             Otherwise set is_negative to false and response to null.\n\n\
             Return ONLY JSON: {{\"is_negative\": true, \"response\": \"...\"}}",
            language_name(language)
        );
        let details = format!("Customer's Name: {author}\nSource of feedback: review\nFeedback text: \"{text}\"");

        let response = self.ask(&system, details).await?;
        parse_json_reply(&response)
            .ok_or_else(|| anyhow::anyhow!("feedback reply was not valid JSON"))
    }
}

/// Parse a JSON object out of an LLM reply, tolerating code fences and
/// surrounding prose.
pub fn parse_json_reply<T: DeserializeOwned>(response: &str) -> Option<T> {
    if let Ok(parsed) = serde_json::from_str::<T>(response) {
        return Some(parsed);
    }

    // Strip markdown code fences
    let cleaned = response
        .trim()
        .strip_prefix("```json")
        .or_else(|| response.trim().strip_prefix("```"))
        .unwrap_or(response.trim());
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(parsed) = serde_json::from_str::<T>(cleaned) {
        return Some(parsed);
    }

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end < start {
        return None;
    }
    match serde_json::from_str::<T>(&cleaned[start..=end]) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse LLM reply as JSON");
            None
        }
    }
}
