//! Generation Service Port
//!
//! Abstract interface for the text generation backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{errors::DomainError, GenerationParameters};

/// A single generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub system_text: String,
    pub user_text: String,
    /// Temperature (0.0 - 1.0)
    pub temperature: f64,
    /// Upper-bound hint, not enforced by every backend
    pub max_tokens: u32,
}

impl From<GenerationParameters> for GenerationRequest {
    fn from(params: GenerationParameters) -> Self {
        Self {
            system_text: params.system_text,
            user_text: params.user_text,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        }
    }
}

impl From<&GenerationRequest> for GenerationParameters {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            system_text: request.system_text.clone(),
            user_text: request.user_text.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

/// Result of a generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub text: String,
    /// Reported by backends that count tokens
    pub tokens_used: Option<u32>,
}

/// Text generation backend
///
/// Fails with `DomainError::GenerationUnavailable` when the backend is not
/// present for this device/account, `DomainError::Generation` otherwise.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput, DomainError>;

    /// Check if the backend can be called at all
    async fn is_available(&self) -> bool {
        true
    }
}
