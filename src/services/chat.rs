//! Chat-completion client for answer generation.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ChatError;
use crate::models::{ChatConfig, LlmInfo};

const SYSTEM_PROMPT: &str = "You are a technical documentation assistant. Answer the user's \
question using only the provided document excerpts. If the excerpts do not contain the answer, \
say so explicitly instead of inventing information. Structure the answer with headings, lists \
or tables where it improves readability, and bold the key facts.\n\nDocument excerpts:\n";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

/// Completion text plus usage counters from the backend.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub answer: String,
    pub llm: LlmInfo,
}

/// Client for a hosted chat-completion API (OpenAI-compatible wire format).
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ChatClient {
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let api_key = config.api_key().ok_or(ChatError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model to answer `query` grounded in `context`.
    pub async fn complete(&self, query: &str, context: &str) -> Result<ChatOutcome, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: format!("{}{}", SYSTEM_PROMPT, context),
                },
                ChatMessage {
                    role: "user",
                    content: query.to_string(),
                },
            ],
        };

        let started = std::time::Instant::now();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::Timeout
                } else {
                    ChatError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::BackendError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ChatError::InvalidResponse("no choices in response".to_string()))?;

        let usage = parsed.usage.unwrap_or_default();

        Ok(ChatOutcome {
            answer,
            llm: LlmInfo {
                model: self.model.clone(),
                generation_ms: started.elapsed().as_millis() as u64,
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_api_key() {
        let _guard = crate::services::test_env::lock();
        // SAFETY: mutation is serialized by test_env::lock.
        unsafe {
            std::env::remove_var(crate::models::CHAT_API_KEY_VAR);
        }
        let config = ChatConfig::default();
        assert!(matches!(ChatClient::new(&config), Err(ChatError::MissingApiKey)));
    }

    #[test]
    fn test_usage_defaults_when_absent() {
        let raw = r#"{"choices":[{"message":{"content":"hi"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.usage.is_none());
        assert_eq!(parsed.choices[0].message.content, "hi");
    }
}
