use crate::models::{Intent, Language};

/// One intent-detection strategy.
pub trait IntentMatcher: Send + Sync {
    fn intent(&self) -> Intent;
    fn matches(&self, text: &str, language: Language) -> bool;
}

/// Turns a lowercased utterance into an intent.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, text: &str, language: Language) -> Intent;
}

/// Substring match against the active language's trigger words.
pub struct KeywordMatcher {
    intent: Intent,
    en: &'static [&'static str],
    id: &'static [&'static str],
}

impl KeywordMatcher {
    pub const fn new(intent: Intent, en: &'static [&'static str], id: &'static [&'static str]) -> Self {
        Self { intent, en, id }
    }

    fn keywords(&self, language: Language) -> &'static [&'static str] {
        match language {
            Language::En => self.en,
            Language::Id => self.id,
        }
    }
}

impl IntentMatcher for KeywordMatcher {
    fn intent(&self) -> Intent {
        self.intent
    }

    fn matches(&self, text: &str, language: Language) -> bool {
        self.keywords(language).iter().any(|kw| text.contains(kw))
    }
}

/// Ordered list of matchers; the first one that matches decides the intent.
/// Nothing matching means a general question.
pub struct KeywordClassifier {
    matchers: Vec<Box<dyn IntentMatcher>>,
}

impl KeywordClassifier {
    pub fn new(matchers: Vec<Box<dyn IntentMatcher>>) -> Self {
        Self { matchers }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(vec![
            Box::new(KeywordMatcher::new(
                Intent::Recommend,
                &["recommend", "suggest", "style"],
                &["rekomendasi", "saran", "gaya"],
            )),
            Box::new(KeywordMatcher::new(
                Intent::Book,
                &["book", "appointment"],
                &["pesan", "janji"],
            )),
            Box::new(KeywordMatcher::new(Intent::Trends, &["trend"], &["tren"])),
        ])
    }
}

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, text: &str, language: Language) -> Intent {
        self.matchers
            .iter()
            .find(|m| m.matches(text, language))
            .map(|m| m.intent())
            .unwrap_or(Intent::GeneralQuestion)
    }
}
