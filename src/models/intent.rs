use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Recommend,
    Book,
    Trends,
    GeneralQuestion,
}

/// Booking details pulled out of a single chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingRequest {
    pub customer_name: String,
    pub preferred_date: NaiveDate,
    pub preferred_time: String,
    pub contact_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HaircutRecommendation {
    pub recommended_haircut: String,
    pub description: String,
    pub suitability_explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingConfirmation {
    pub confirmation_message: String,
    #[serde(default)]
    pub appointment_details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackReview {
    #[serde(alias = "isNegative")]
    pub is_negative: bool,
    #[serde(default)]
    pub response: Option<String>,
}
