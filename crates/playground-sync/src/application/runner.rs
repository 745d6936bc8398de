//! Prompt runner
//!
//! Runs prompts against a generation backend with an upper time bound and
//! optionally keeps the result as a SavedOutput.

use std::sync::Arc;
use std::time::Duration;

use playground::{
    DomainError, GenerationOutput, GenerationParameters, GenerationRequest, GenerationService,
    Prompt, RecordStore, SavedOutput,
};

use super::repository::PromptRepository;
use crate::config::GenerationConfig;

pub struct PromptRunner<G: GenerationService> {
    service: Arc<G>,
    timeout: Duration,
}

impl<G: GenerationService> PromptRunner<G> {
    pub fn new(service: Arc<G>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub fn with_config(service: Arc<G>, config: &GenerationConfig) -> Self {
        Self::new(service, config.timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn is_available(&self) -> bool {
        self.service.is_available().await
    }

    /// Generate text for `params`.
    ///
    /// `max_tokens` is passed on as a hint; the output length is not checked.
    pub async fn run(&self, params: &GenerationParameters) -> Result<GenerationOutput, DomainError> {
        if params.user_text.trim().is_empty() {
            return Err(DomainError::Validation(
                "user text must not be empty".to_string(),
            ));
        }
        if !self.service.is_available().await {
            return Err(DomainError::GenerationUnavailable(
                "generation backend is not available".to_string(),
            ));
        }

        let request = GenerationRequest::from(params.clone());
        tracing::debug!(
            "Generating with temperature {} and max_tokens {}",
            request.temperature,
            request.max_tokens
        );

        match tokio::time::timeout(self.timeout, self.service.generate(&request)).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::Generation(format!(
                "no response within {}s",
                self.timeout.as_secs()
            ))),
        }
    }

    /// Run `prompt` and keep the result through the repository.
    ///
    /// Failures also land in the repository's error slot.
    pub async fn run_and_save<S: RecordStore + ?Sized>(
        &self,
        repository: &PromptRepository<S>,
        prompt: &Prompt,
    ) -> Result<SavedOutput, DomainError> {
        let params = prompt.parameters();
        let output = match self.run(&params).await {
            Ok(output) => output,
            Err(e) => {
                repository
                    .record_failure("Failed to run prompt", &e)
                    .await;
                return Err(e);
            }
        };

        let mut saved = SavedOutput::new(prompt.id, output.text, params);
        saved.actual_tokens_used = output.tokens_used.filter(|t| *t > 0);
        repository.add_output(saved).await
    }
}
