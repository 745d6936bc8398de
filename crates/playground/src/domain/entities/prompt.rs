//! Prompt - A text template with generation parameters
//!
//! Pure domain entity without infrastructure dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::Record;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{RecordKind, RemoteRef};

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Prompt - A reusable prompt template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: Uuid,
    pub title: String,
    pub system_text: String,
    pub user_text: String,
    /// Sampling temperature (0.0 - 1.0)
    pub temperature: f64,
    /// Upper-bound hint for the generation length
    pub max_tokens: u32,
    /// Display order is preserved, membership is unique
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ref: Option<RemoteRef>,
}

/// Snapshot of the parameters a generation ran with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub system_text: String,
    pub user_text: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl GenerationParameters {
    /// Temperature in 0.0..=1.0 (NaN rejected) and a positive token budget
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(DomainError::Validation(format!(
                "temperature {} is outside 0.0..=1.0",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(DomainError::Validation(
                "max_tokens must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Prompt {
    /// Create a new prompt with default generation parameters
    pub fn new(
        title: impl Into<String>,
        system_text: impl Into<String>,
        user_text: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            system_text: system_text.into(),
            user_text: user_text.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            tags: Vec::new(),
            project_id: None,
            is_favorite: false,
            created_at: now,
            modified_at: now,
            remote_ref: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_project(mut self, project_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            self.add_tag(tag);
        }
        self
    }

    /// Rough character budget (1 token ≈ 4 characters)
    pub fn estimated_characters(&self) -> u64 {
        u64::from(self.max_tokens) * 4
    }

    /// Rough word budget (1 token ≈ 0.75 words)
    pub fn estimated_words(&self) -> u64 {
        (f64::from(self.max_tokens) * 0.75).floor() as u64
    }

    /// Add a tag; blank tags and tags already present in any case are ignored
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        let tag = tag.trim();
        if tag.is_empty() || self.has_tag(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let needle = tag.to_lowercase();
        let before = self.tags.len();
        self.tags.retain(|t| t.to_lowercase() != needle);
        self.tags.len() != before
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let needle = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == needle)
    }

    /// Case-insensitive substring match over title, texts and tags
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.system_text.to_lowercase().contains(&needle)
            || self.user_text.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }

    /// Parameters to run this prompt with right now
    pub fn parameters(&self) -> GenerationParameters {
        GenerationParameters {
            system_text: self.system_text.clone(),
            user_text: self.user_text.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.parameters().validate()?;
        if self.modified_at < self.created_at {
            return Err(DomainError::Validation(
                "modified_at precedes created_at".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Prompt {
    fn default() -> Self {
        Self::new("New Prompt", "", "")
    }
}

impl Record for Prompt {
    const KIND: RecordKind = RecordKind::Prompt;

    fn id(&self) -> Uuid {
        self.id
    }

    fn remote_ref(&self) -> Option<&RemoteRef> {
        self.remote_ref.as_ref()
    }

    fn ensure_id(&mut self) {
        if self.id.is_nil() {
            self.id = Uuid::new_v4();
        }
    }

    fn set_remote_ref(&mut self, remote_ref: RemoteRef) {
        self.remote_ref = Some(remote_ref);
    }
}
