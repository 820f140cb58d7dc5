//! Narrative generation through an OpenAI-compatible chat completions API.

use crate::prompt::PromptContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("LLM endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("LLM response contained no text")]
    EmptyResponse,
}

/// Turns a rendered prompt into interpretation text.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, prompt: &PromptContext) -> Result<String, NarrativeError>;
}

#[derive(Debug, Clone)]
pub struct NarratorConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

pub struct ChatCompletionsNarrator {
    http: reqwest::Client,
    config: NarratorConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsNarrator {
    pub fn new(config: NarratorConfig) -> Result<Self, NarrativeError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn request<'a>(&'a self, prompt: &'a PromptContext) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait]
impl NarrativeGenerator for ChatCompletionsNarrator {
    async fn generate(&self, prompt: &PromptContext) -> Result<String, NarrativeError> {
        let started = std::time::Instant::now();
        let rsp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&self.request(prompt))
            .send()
            .await?;

        let status = rsp.status();
        if !status.is_success() {
            let body = rsp.text().await.unwrap_or_default();
            return Err(NarrativeError::Status {
                status: status.as_u16(),
                body: truncate(&body, 500),
            });
        }

        let text = first_choice(rsp.json::<ChatResponse>().await?)?;
        log::debug!(
            "narrator: {} chars from {} in {:?}",
            text.len(),
            self.config.model,
            started.elapsed()
        );
        Ok(text)
    }
}

fn first_choice(response: ChatResponse) -> Result<String, NarrativeError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(NarrativeError::EmptyResponse)
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn narrator() -> ChatCompletionsNarrator {
        ChatCompletionsNarrator::new(NarratorConfig {
            base_url: "http://localhost:11434/v1/".to_string(),
            model: "llama3".to_string(),
            api_key: "k".to_string(),
            temperature: 0.4,
            max_tokens: 256,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_request_shape() {
        let narrator = narrator();
        let prompt = PromptContext {
            system: "be kind".to_string(),
            user: "question".to_string(),
        };

        let json = serde_json::to_value(narrator.request(&prompt)).unwrap();

        assert_eq!(narrator.endpoint(), "http://localhost:11434/v1/chat/completions");
        assert_eq!(json["model"], "llama3");
        assert_eq!(json["max_tokens"], 256);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "be kind");
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn test_first_choice_extracted() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"  Mars pushes you forward. "}}]}"#,
        )
        .unwrap();

        assert_eq!(first_choice(response).unwrap(), "Mars pushes you forward.");
    }

    #[test]
    fn test_empty_choices_rejected() {
        let none: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(first_choice(none), Err(NarrativeError::EmptyResponse)));

        let blank: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"   "}}]}"#).unwrap();
        assert!(matches!(first_choice(blank), Err(NarrativeError::EmptyResponse)));
    }
}
