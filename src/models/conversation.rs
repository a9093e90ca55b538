use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::language::Language;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuickReply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub loading: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuickReply {
    pub label: String,
    pub action: QuickReplyAction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuickReplyAction {
    InitBookAppointment,
    TrendingHaircuts,
    InitRecommendHaircut,
    ProvideDetail { text: String },
}

/// Structured fields collected before the recommendation skill can run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendationSlots {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hair_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotField {
    FaceShape,
    HairType,
}

impl RecommendationSlots {
    /// Fields present in `other` overwrite the ones already collected.
    pub fn merge(&mut self, other: RecommendationSlots) {
        if other.face_shape.is_some() {
            self.face_shape = other.face_shape;
        }
        if other.hair_type.is_some() {
            self.hair_type = other.hair_type;
        }
        if other.style_preference.is_some() {
            self.style_preference = other.style_preference;
        }
        if other.reference_description.is_some() {
            self.reference_description = other.reference_description;
        }
    }

    /// First required field still missing, face shape before hair type.
    pub fn missing(&self) -> Option<SlotField> {
        if self.face_shape.is_none() {
            Some(SlotField::FaceShape)
        } else if self.hair_type.is_none() {
            Some(SlotField::HairType)
        } else {
            None
        }
    }
}

/// Which parser branch handles the next utterance.
///
/// The pending slots live inside the awaiting variant, so a session can only
/// be waiting for recommendation details while it actually holds them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogueContext {
    #[default]
    Idle,
    AwaitingRecommendationDetails {
        pending: RecommendationSlots,
    },
    /// Never entered by the router; booking needs every field in one message.
    /// Sessions carrying it are routed like `Idle`.
    AwaitingBookingDetails,
}

impl DialogueContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueContext::Idle => "idle",
            DialogueContext::AwaitingRecommendationDetails { .. } => {
                "awaiting_recommendation_details"
            }
            DialogueContext::AwaitingBookingDetails => "awaiting_booking_details",
        }
    }

    pub fn pending(&self) -> Option<&RecommendationSlots> {
        match self {
            DialogueContext::AwaitingRecommendationDetails { pending } => Some(pending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationState {
    pub language: Language,
    #[serde(default)]
    pub context: DialogueContext,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    next_id: u64,
}

impl ConversationState {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            context: DialogueContext::Idle,
            messages: Vec::new(),
            next_id: 0,
        }
    }

    fn next_message_id(&mut self) -> String {
        self.next_id += 1;
        format!("m{}", self.next_id)
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        let id = self.next_message_id();
        self.messages.push(Message {
            id,
            text: text.into(),
            sender: Sender::User,
            options: Vec::new(),
            image: None,
            loading: false,
        });
    }

    pub fn push_bot(&mut self, text: impl Into<String>, options: Vec<QuickReply>) {
        let id = self.next_message_id();
        self.messages.push(Message {
            id,
            text: text.into(),
            sender: Sender::Bot,
            options,
            image: None,
            loading: false,
        });
    }

    pub fn push_placeholder(&mut self, text: impl Into<String>) {
        let id = self.next_message_id();
        self.messages.push(Message {
            id,
            text: text.into(),
            sender: Sender::Bot,
            options: Vec::new(),
            image: None,
            loading: true,
        });
    }

    /// Replace the pending bot placeholder with its final content. Falls back
    /// to appending when no placeholder is pending.
    pub fn replace_placeholder(
        &mut self,
        text: impl Into<String>,
        options: Vec<QuickReply>,
        image: Option<ImageRef>,
    ) {
        let text = text.into();
        match self.messages.last_mut() {
            Some(last) if last.sender == Sender::Bot && last.loading => {
                last.text = text;
                last.options = options;
                last.image = image;
                last.loading = false;
            }
            _ => {
                self.push_bot(text, options);
                if let Some(last) = self.messages.last_mut() {
                    last.image = image;
                }
            }
        }
    }

    pub fn reply_pending(&self) -> bool {
        self.messages
            .last()
            .map(|m| m.sender == Sender::Bot && m.loading)
            .unwrap_or(false)
    }

    /// Quick replies can only be picked from the latest settled bot message.
    pub fn offered_option(&self, index: usize) -> Option<&QuickReply> {
        let last = self.messages.last()?;
        if last.sender != Sender::Bot || last.loading {
            return None;
        }
        last.options.get(index)
    }
}

/// A persisted chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub state: ConversationState,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}
