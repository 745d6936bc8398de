//! Project - Named grouping of prompts
//!
//! Pure domain entity without infrastructure dependencies.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::Record;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{RecordKind, RemoteRef};

pub const DEFAULT_PROJECT_COLOR: &str = "#007AFF";

/// Project - Prompts reference it through `Prompt::project_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Opaque display token (a hex color in practice)
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ref: Option<RemoteRef>,
}

impl Project {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            color: DEFAULT_PROJECT_COLOR.to_string(),
            created_at: now,
            modified_at: now,
            remote_ref: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Name order used for project lists, ignoring case
    pub fn compare_names(&self, other: &Project) -> Ordering {
        self.name
            .to_lowercase()
            .cmp(&other.name.to_lowercase())
            .then_with(|| self.name.cmp(&other.name))
    }

    /// A draft may have an empty name; a stored project may not
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation(
                "project name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new("New Project", "")
    }
}

impl Record for Project {
    const KIND: RecordKind = RecordKind::Project;

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
