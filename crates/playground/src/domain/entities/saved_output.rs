//! SavedOutput - A generation result kept by the user
//!
//! Pure domain entity without infrastructure dependencies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{GenerationParameters, Record};
use crate::domain::value_objects::{RecordKind, RemoteRef};

/// SavedOutput - Refers to its prompt by id without owning it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedOutput {
    pub id: Uuid,
    pub prompt_id: Uuid,
    pub output_text: String,
    /// Parameters captured when the output was generated
    pub parameters: GenerationParameters,
    #[serde(default)]
    pub actual_tokens_used: Option<u32>,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ref: Option<RemoteRef>,
}

impl SavedOutput {
    pub fn new(
        prompt_id: Uuid,
        output_text: impl Into<String>,
        parameters: GenerationParameters,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt_id,
            output_text: output_text.into(),
            parameters,
            actual_tokens_used: None,
            is_favorite: false,
            created_at: Utc::now(),
            notes: String::new(),
            remote_ref: None,
        }
    }

    pub fn with_tokens_used(mut self, tokens: u32) -> Self {
        self.actual_tokens_used = Some(tokens);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

impl Record for SavedOutput {
    const KIND: RecordKind = RecordKind::SavedOutput;

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
