//! Horoscope text generation via an OpenAI-compatible chat completions API.
//!
//! Generation never fails from the caller's point of view: errors are
//! logged and turned into [`Generation::Fallback`] carrying a fixed apology
//! text, so callers can still persist and deliver something while knowing
//! the text is not real content.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::catalog::{Category, Language};
use crate::config::GeneratorConfig;

const SYSTEM_PROMPT: &str =
    "You are a professional astrologer. Write a positive and motivating horoscope for today.";

/// Result of one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// Text produced by the model.
    Generated(String),
    /// Deterministic apology text used because the call failed.
    Fallback { text: String, cause: String },
}

impl Generation {
    /// Build from the outcome of an API call, logging failures.
    pub fn from_result(category: &Category, result: Result<String, GenerationError>) -> Self {
        match result {
            Ok(text) => Self::Generated(text),
            Err(e) => {
                error!("Failed to generate horoscope for {}: {}", category.name, e);
                Self::Fallback {
                    text: fallback_text(category),
                    cause: e.to_string(),
                }
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) => text,
            Self::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) => text,
            Self::Fallback { text, .. } => text,
        }
    }
}

/// The text stored and sent when generation fails.
pub fn fallback_text(category: &Category) -> String {
    format!(
        "Sorry, we could not generate a horoscope for {} today.",
        category.name
    )
}

/// Errors from the generation API. Never escapes [`ContentGenerator::generate`].
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response contained no text")]
    Empty,
}

/// Something that can write today's text for a category in a language.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, category: &Category, language: &Language) -> Generation;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions client.
#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    client: Client,
    config: GeneratorConfig,
}

impl OpenAiGenerator {
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: GeneratorConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn build_request(&self, category: &Category, language: &Language) -> ChatRequest {
        let prompt = format!(
            "Write a detailed horoscope for today for the sign {} {}. \
             The horoscope should be positive, motivating and include advice for the day.",
            category.name, language.prompt_phrase
        );

        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
        }
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let body: ChatResponse = response.json().await?;
        extract_text(body)
    }
}

/// First choice's content, trimmed. Blank content counts as a failure.
fn extract_text(response: ChatResponse) -> Result<String, GenerationError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(GenerationError::Empty)
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    async fn generate(&self, category: &Category, language: &Language) -> Generation {
        let request = self.build_request(category, language);
        debug!(
            "Generating horoscope for {} ({}) with {}",
            category.key, language.code, self.config.model
        );

        Generation::from_result(category, self.complete(&request).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fire() -> Category {
        Category::new("fire", "Fire")
    }

    fn english() -> Language {
        Language::new("en", "English", "in English")
    }

    #[test]
    fn test_extract_text_trims() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": "  Shine today.\n" } }]
        }))
        .unwrap();

        assert_eq!(extract_text(response).unwrap(), "Shine today.");
    }

    #[test]
    fn test_extract_text_rejects_blank_and_missing() {
        let blank: ChatResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": "   " } }]
        }))
        .unwrap();
        assert!(matches!(extract_text(blank), Err(GenerationError::Empty)));

        let none: ChatResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(extract_text(none), Err(GenerationError::Empty)));
    }

    #[test]
    fn test_fallback_is_deterministic_and_names_category() {
        let a = Generation::from_result(&fire(), Err(GenerationError::Empty));
        let b = Generation::from_result(
            &fire(),
            Err(GenerationError::Status {
                status: 429,
                body: "quota".into(),
            }),
        );

        assert!(a.is_fallback());
        assert_eq!(a.text(), b.text());
        assert!(a.text().contains("Fire"));
    }

    #[test]
    fn test_request_carries_prompt_phrase_and_budget() {
        let mut config = GeneratorConfig::new("key");
        config.max_tokens = 123;
        let generator = OpenAiGenerator::new(config).unwrap();

        let request = generator.build_request(&fire(), &english());
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["max_tokens"], 123);
        assert_eq!(value["messages"][0]["role"], "system");
        let user = value["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("Fire"));
        assert!(user.contains("in English"));
    }

    #[tokio::test]
    async fn test_unreachable_api_falls_back() {
        let mut config = GeneratorConfig::new("key");
        config.base_url = "http://127.0.0.1:9".to_string();
        let generator = OpenAiGenerator::new(config).unwrap();

        let generation = generator.generate(&fire(), &english()).await;

        match generation {
            Generation::Fallback { text, cause } => {
                assert_eq!(text, fallback_text(&fire()));
                assert!(!cause.is_empty());
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }
}
