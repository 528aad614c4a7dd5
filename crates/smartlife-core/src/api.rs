//! JSON bodies exchanged with the Smart Life backend (`/api/v1/*`).

use serde::{Deserialize, Deserializer, Serialize};

use crate::state::ChatMessage;

/// A category tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "id_string")]
    pub category_id: String,
    pub category_name: String,
}

/// A canned question tied to a knowledge entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetQuestion {
    #[serde(deserialize_with = "id_string")]
    pub knowledge_id: String,
    pub preset_question: String,
}

/// Ids go back into URL paths, so a numeric key is kept as its decimal text.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesResponse {
    pub categories: Vec<Category>,
}

/// `preset_questions` may be omitted by the backend; that is an empty list,
/// not an error.
#[derive(Debug, Deserialize)]
pub(crate) struct PresetQuestionsResponse {
    #[serde(default)]
    pub preset_questions: Option<Vec<PresetQuestion>>,
}

/// Body of both the knowledge and chat endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct AiResponse {
    #[serde(default)]
    pub ai_response: Option<String>,
}

/// One prior turn in the shape the chat endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub role: String,
    pub parts: Vec<String>,
}

impl From<&ChatMessage> for HistoryEntry {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.wire_name().to_string(),
            parts: vec![msg.content.clone()],
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub history: &'a [HistoryEntry],
    pub prompt: &'a str,
    pub user_id: &'a str,
}

/// Rewrite a transcript for the chat endpoint: `assistant` becomes `model`
/// and each message becomes a single-part list.
pub fn translate_history(messages: &[ChatMessage]) -> Vec<HistoryEntry> {
    messages.iter().map(HistoryEntry::from).collect()
}
