use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{
    translate_history, AiResponse, CategoriesResponse, Category, ChatRequest, PresetQuestion,
    PresetQuestionsResponse,
};
use crate::state::ChatMessage;

/// Backend call failure.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request failed with status code {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// HTTP client for the four `/api/v1` endpoints.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    user_id: String,
}

impl BackendClient {
    pub fn new(base_url: &str, user_id: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id: user_id.to_string(),
        }
    }

    /// Same as `new`, but every request gives up after `timeout`.
    pub fn with_timeout(
        base_url: &str,
        user_id: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id: user_id.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub async fn fetch_categories(&self) -> Result<Vec<Category>, ClientError> {
        let url = format!("{}/api/v1/categories", self.base_url);
        let body: CategoriesResponse = self.read_json(self.client.get(&url)).await?;
        Ok(body.categories)
    }

    /// A response without `preset_questions` yields an empty list.
    pub async fn fetch_preset_questions(
        &self,
        category_id: &str,
    ) -> Result<Vec<PresetQuestion>, ClientError> {
        let url = format!("{}/api/v1/categories/{}/questions", self.base_url, category_id);
        let body: PresetQuestionsResponse = self.read_json(self.client.get(&url)).await?;
        Ok(body.preset_questions.unwrap_or_default())
    }

    /// Knowledge-backed answer for a preset question. `None` when the backend
    /// answered without an `ai_response`.
    pub async fn fetch_knowledge_answer(
        &self,
        knowledge_id: &str,
    ) -> Result<Option<String>, ClientError> {
        let url = format!("{}/api/v1/knowledge/{}", self.base_url, knowledge_id);
        let request = self
            .client
            .get(&url)
            .query(&[("user_id", self.user_id.as_str())]);
        let body: AiResponse = self.read_json(request).await?;
        Ok(body.ai_response)
    }

    /// Free-text chat. `history` is everything said before `prompt`.
    pub async fn send_chat(
        &self,
        history: &[ChatMessage],
        prompt: &str,
    ) -> Result<Option<String>, ClientError> {
        let url = format!("{}/api/v1/chat", self.base_url);
        let history = translate_history(history);
        let request = ChatRequest {
            history: &history,
            prompt,
            user_id: &self.user_id,
        };
        let body: AiResponse = self.read_json(self.client.post(&url).json(&request)).await?;
        Ok(body.ai_response)
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), %status, "backend responded");

        if !status.is_success() {
            return Err(ClientError::Status(status));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
