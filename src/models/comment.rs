use serde::{Deserialize, Serialize};

use super::language::Language;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub language: Language,
    pub is_ai_reply: bool,
    pub created_at: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewComment {
    pub author: String,
    pub text: String,
    #[serde(default)]
    pub language: Language,
}
