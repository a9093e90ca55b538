pub mod classifier;
pub mod copy;
pub mod extractor;
pub mod manager;

pub use classifier::{IntentClassifier, IntentMatcher, KeywordClassifier, KeywordMatcher};
pub use manager::{
    abandon_pending, greeting, reduce, resolve, ChatEvent, DialogueError, Origin, SkillCall, SkillRequest,
    SkillResponse, Turn,
};
