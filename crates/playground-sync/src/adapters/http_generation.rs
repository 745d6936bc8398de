//! HTTP generation backend
//!
//! Calls an OpenAI-compatible chat completions endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use playground::{DomainError, GenerationOutput, GenerationRequest, GenerationService};

use crate::config::GenerationConfig;

#[derive(Clone)]
pub struct HttpGenerationService {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    completion_tokens: u32,
}

impl HttpGenerationService {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        }
    }

    fn build_request<'a>(&'a self, request: &'a GenerationRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if !request.system_text.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &request.system_text,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.user_text,
        });

        ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput, DomainError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            DomainError::GenerationUnavailable("no API key configured".to_string())
        })?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    DomainError::GenerationUnavailable(e.to_string())
                } else {
                    DomainError::Generation(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DomainError::Generation(format!(
                "backend returned {}: {}",
                status, error_text
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Generation(format!("invalid response body: {}", e)))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::Generation("no completion returned".to_string()))?;

        Ok(GenerationOutput {
            text,
            tokens_used: body.usage.map(|u| u.completion_tokens),
        })
    }

    async fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}
