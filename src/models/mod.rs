pub mod availability;
pub mod booking;
pub mod comment;
pub mod conversation;
pub mod haircut;
pub mod intent;
pub mod language;
pub mod notice;

pub use availability::{DisabledMap, SlotCounts};
pub use booking::{NewAppointment, PaymentMethod, SaveOutcome};
pub use comment::{Comment, NewComment};
pub use conversation::{
    ChatSession, ConversationState, DialogueContext, ImageRef, Message, QuickReply,
    QuickReplyAction, RecommendationSlots, Sender, SlotField,
};
pub use intent::{BookingConfirmation, BookingRequest, FeedbackReview, HaircutRecommendation, Intent};
pub use language::{Language, Localized};
pub use notice::Notice;
