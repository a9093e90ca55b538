//! Turn-taking logic for the chat widget.
//!
//! `reduce` consumes one event and returns the next state plus at most one
//! skill call for the driver to run. `resolve` folds the skill's outcome back
//! into the transcript. Neither touches I/O.

use crate::models::{
    haircut, BookingConfirmation, BookingRequest, ConversationState, DialogueContext,
    HaircutRecommendation, ImageRef, Intent, Language, Localized, Notice, QuickReplyAction,
    RecommendationSlots, SlotField,
};

use super::classifier::IntentClassifier;
use super::copy;
use super::extractor::{extract_booking_request, extract_slots};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Utterance(String),
    /// Index into the options of the latest bot message.
    QuickReply(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Message,
    QuickReply,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillRequest {
    AnswerQuestion { question: String },
    SuggestTrends,
    RecommendHaircut(RecommendationSlots),
    BookAppointment(BookingRequest),
}

impl SkillRequest {
    pub fn name(&self) -> &'static str {
        match self {
            SkillRequest::AnswerQuestion { .. } => "answer_question",
            SkillRequest::SuggestTrends => "suggest_trends",
            SkillRequest::RecommendHaircut(_) => "recommend_haircut",
            SkillRequest::BookAppointment(_) => "book_appointment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillCall {
    pub request: SkillRequest,
    pub language: Language,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillResponse {
    Answer(String),
    Trends(String),
    Recommendation(HaircutRecommendation),
    Booking(BookingConfirmation),
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub state: ConversationState,
    pub call: Option<SkillCall>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DialogueError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("the previous reply is still pending")]
    ReplyPending,
    #[error("quick reply {0} is not on offer")]
    UnknownOption(usize),
}

/// Fresh conversation: greeting plus the default menu.
pub fn greeting(language: Language) -> ConversationState {
    let mut state = ConversationState::new(language);
    state.push_bot(copy::GREETING.pick(language), copy::default_menu(language));
    state
}

pub fn reduce(
    mut state: ConversationState,
    event: ChatEvent,
    classifier: &dyn IntentClassifier,
) -> Result<Turn, DialogueError> {
    if state.reply_pending() {
        return Err(DialogueError::ReplyPending);
    }

    match event {
        ChatEvent::Utterance(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(DialogueError::EmptyMessage);
            }
            state.push_user(text);
            Ok(route(state, text, Origin::Message, classifier))
        }
        ChatEvent::QuickReply(index) => {
            let option = state
                .offered_option(index)
                .cloned()
                .ok_or(DialogueError::UnknownOption(index))?;
            state.push_user(option.label.as_str());
            Ok(quick_reply(state, option.action, classifier))
        }
    }
}

fn quick_reply(
    mut state: ConversationState,
    action: QuickReplyAction,
    classifier: &dyn IntentClassifier,
) -> Turn {
    let language = state.language;
    match action {
        // Payloads are generated by us, so they skip the empty-text check.
        QuickReplyAction::ProvideDetail { text } => route(state, &text, Origin::Message, classifier),
        QuickReplyAction::InitBookAppointment => {
            state.context = DialogueContext::Idle;
            state.push_bot(
                copy::BOOKING_INSTRUCTIONS_QUICK_REPLY.pick(language),
                copy::default_menu(language),
            );
            Turn { state, call: None }
        }
        QuickReplyAction::InitRecommendHaircut => {
            state.context = DialogueContext::AwaitingRecommendationDetails {
                pending: RecommendationSlots::default(),
            };
            state.push_bot(
                copy::ASK_FACE_QUICK_REPLY.pick(language),
                copy::field_options(SlotField::FaceShape, language),
            );
            Turn { state, call: None }
        }
        QuickReplyAction::TrendingHaircuts => {
            state.context = DialogueContext::Idle;
            call_skill(state, copy::THINKING, SkillRequest::SuggestTrends, Origin::QuickReply)
        }
    }
}

fn route(
    mut state: ConversationState,
    text: &str,
    origin: Origin,
    classifier: &dyn IntentClassifier,
) -> Turn {
    let language = state.language;

    if let Some(pending) = state.context.pending() {
        let mut merged = pending.clone();
        merged.merge(extract_slots(text, language));
        return match merged.missing() {
            None => {
                state.context = DialogueContext::Idle;
                call_skill(
                    state,
                    copy::FINDING_RECOMMENDATIONS,
                    SkillRequest::RecommendHaircut(merged),
                    origin,
                )
            }
            Some(field) => {
                let prompt = match field {
                    SlotField::FaceShape => copy::ASK_FACE_FOLLOW_UP,
                    SlotField::HairType => copy::ASK_HAIR_FOLLOW_UP,
                };
                state.context = DialogueContext::AwaitingRecommendationDetails { pending: merged };
                state.push_bot(prompt.pick(language), copy::field_options(field, language));
                Turn { state, call: None }
            }
        };
    }

    let intent = classifier.classify(&text.to_lowercase(), language);
    state.context = DialogueContext::Idle;

    match intent {
        Intent::Recommend => {
            let slots = extract_slots(text, language);
            match slots.missing() {
                None => call_skill(
                    state,
                    copy::FINDING_RECOMMENDATIONS_SHORTCUT,
                    SkillRequest::RecommendHaircut(slots),
                    origin,
                ),
                Some(field) => {
                    let prompt = match field {
                        SlotField::FaceShape => copy::ASK_FACE_OPENING,
                        SlotField::HairType => copy::ASK_HAIR_OPENING,
                    };
                    state.context = DialogueContext::AwaitingRecommendationDetails { pending: slots };
                    state.push_bot(prompt.pick(language), copy::field_options(field, language));
                    Turn { state, call: None }
                }
            }
        }
        Intent::Book => match extract_booking_request(text, language) {
            Some(request) => {
                call_skill(state, copy::THINKING, SkillRequest::BookAppointment(request), origin)
            }
            None => {
                state.push_bot(
                    copy::BOOKING_INSTRUCTIONS.pick(language),
                    copy::default_menu(language),
                );
                Turn { state, call: None }
            }
        },
        Intent::Trends => call_skill(state, copy::THINKING, SkillRequest::SuggestTrends, origin),
        Intent::GeneralQuestion => call_skill(
            state,
            copy::THINKING,
            SkillRequest::AnswerQuestion {
                question: text.to_string(),
            },
            origin,
        ),
    }
}

fn call_skill(
    mut state: ConversationState,
    placeholder: Localized,
    request: SkillRequest,
    origin: Origin,
) -> Turn {
    let language = state.language;
    state.push_placeholder(placeholder.pick(language));
    Turn {
        state,
        call: Some(SkillCall {
            request,
            language,
            origin,
        }),
    }
}

/// Replace the pending placeholder with the skill's outcome. A failed call
/// leaves the apology in its place, resets the context and yields a notice.
pub fn resolve(
    mut state: ConversationState,
    call: &SkillCall,
    result: anyhow::Result<SkillResponse>,
) -> (ConversationState, Option<Notice>) {
    let language = state.language;
    state.context = DialogueContext::Idle;

    match result {
        Ok(response) => {
            let (text, image) = render(response, language);
            state.replace_placeholder(text, copy::default_menu(language), image);
            (state, None)
        }
        Err(err) => {
            let apology = match call.origin {
                Origin::Message => copy::APOLOGY,
                Origin::QuickReply => copy::APOLOGY_QUICK_REPLY,
            };
            state.replace_placeholder(apology.pick(language), Vec::new(), None);

            let description = err.to_string();
            let description = if description.trim().is_empty() {
                copy::COULD_NOT_PROCESS.pick(language).to_string()
            } else {
                description
            };
            let notice = Notice::new(copy::CHATBOT_ERROR_TITLE.pick(language), description);
            (state, Some(notice))
        }
    }
}

/// Settle a placeholder whose skill run was lost, so the session accepts
/// events again. A state with no pending reply is returned unchanged.
pub fn abandon_pending(mut state: ConversationState) -> ConversationState {
    if !state.reply_pending() {
        return state;
    }
    let language = state.language;
    state.context = DialogueContext::Idle;
    state.replace_placeholder(copy::APOLOGY.pick(language), Vec::new(), None);
    state
}

fn render(response: SkillResponse, language: Language) -> (String, Option<ImageRef>) {
    let closing = copy::ANYTHING_ELSE.pick(language);
    match response {
        SkillResponse::Answer(answer) => (
            format!("{answer}\n\n{}", copy::ANYTHING_ELSE_GENERAL.pick(language)),
            None,
        ),
        SkillResponse::Trends(trends) => (format!("{trends}\n\n{closing}"), None),
        SkillResponse::Booking(confirmation) => {
            (format!("{}\n\n{closing}", confirmation.confirmation_message), None)
        }
        SkillResponse::Recommendation(rec) => {
            let text = format!(
                "{} {}\n{}\n\n{} {}\n\n{closing}",
                copy::RECOMMENDATION_LABEL.pick(language),
                rec.recommended_haircut,
                rec.description,
                copy::SUITABILITY_LABEL.pick(language),
                rec.suitability_explanation,
            );
            let image = haircut::find_by_name(&rec.recommended_haircut).and_then(|cut| {
                cut.cover_image().map(|url| ImageRef {
                    url: url.to_string(),
                    alt: cut.display_name(language).to_string(),
                })
            });
            (text, image)
        }
    }
}
