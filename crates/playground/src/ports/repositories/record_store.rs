//! Record Store Port
//!
//! The persistence boundary of the prompt repository. The cloud-synced and
//! local-only deployments both plug in here, so they share one contract.

use async_trait::async_trait;

use crate::domain::{errors::DomainError, Project, Prompt, RecordKind, RemoteRef, SavedOutput};

/// Store interface for Prompt, Project and SavedOutput records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All prompts, most recently modified first
    async fn fetch_prompts(&self) -> Result<Vec<Prompt>, DomainError>;

    /// All projects, by name ascending
    async fn fetch_projects(&self) -> Result<Vec<Project>, DomainError>;

    /// All saved outputs, newest first
    async fn fetch_outputs(&self) -> Result<Vec<SavedOutput>, DomainError>;

    /// Create or update; returns the store-confirmed record
    async fn save_prompt(&self, prompt: &Prompt) -> Result<Prompt, DomainError>;

    async fn save_project(&self, project: &Project) -> Result<Project, DomainError>;

    async fn save_output(&self, output: &SavedOutput) -> Result<SavedOutput, DomainError>;

    /// Delete by remote handle; fails if the handle is unknown
    async fn delete(&self, kind: RecordKind, remote_ref: &RemoteRef) -> Result<(), DomainError>;
}
