//! Remote implementation of RecordStore
//!
//! Runs records through the codec against a `RecordDatabase`. Records that
//! fail to decode are dropped from fetch results instead of failing them.

use std::sync::Arc;

use async_trait::async_trait;

use playground::{
    AccountStatus, DomainError, Project, Prompt, RecordDatabase, RecordKind, RecordStore,
    RemoteRef, SavedOutput,
};

use super::codec::RecordCodec;

/// Cloud-synced record store
pub struct RemoteRecordStore<D: RecordDatabase> {
    database: Arc<D>,
}

impl<D: RecordDatabase> RemoteRecordStore<D> {
    pub fn new(database: Arc<D>) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &Arc<D> {
        &self.database
    }

    async fn account_available(&self) -> Result<bool, DomainError> {
        let status = self.database.account_status().await?;
        if status != AccountStatus::Available {
            tracing::warn!("Remote account status is {:?}", status);
        }
        Ok(status == AccountStatus::Available)
    }

    async fn fetch_all<T: RecordCodec>(&self) -> Result<Vec<T>, DomainError> {
        let available = self
            .account_available()
            .await
            .map_err(|e| DomainError::RemoteUnavailable(e.to_string()))?;
        if !available {
            return Err(DomainError::RemoteUnavailable(
                "no authorized account for the record database".to_string(),
            ));
        }

        let records = self
            .database
            .query(T::RECORD_TYPE, &T::sort_descriptor())
            .await?;
        let total = records.len();

        let decoded: Vec<T> = records
            .iter()
            .filter_map(|record| match T::decode(record) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(
                        "Dropping {} record {:?}: {}",
                        T::RECORD_TYPE,
                        record.handle.as_ref().map(RemoteRef::as_str),
                        e
                    );
                    None
                }
            })
            .collect();

        tracing::debug!(
            "Fetched {}/{} {} records",
            decoded.len(),
            total,
            T::RECORD_TYPE
        );
        Ok(decoded)
    }

    async fn save_one<T: RecordCodec>(&self, record: &T) -> Result<T, DomainError> {
        let available = self
            .account_available()
            .await
            .map_err(|e| DomainError::RemoteWrite(e.to_string()))?;
        if !available {
            return Err(DomainError::RemoteWrite(
                "no authorized account for the record database".to_string(),
            ));
        }

        let saved = self.database.save(record.encode()).await?;
        match T::decode(&saved) {
            Ok(confirmed) => Ok(confirmed),
            Err(e) => {
                // The write landed, so the caller still needs the handle
                let Some(handle) = saved.handle else {
                    return Err(e);
                };
                tracing::warn!(
                    "Keeping local copy of {} record {}: {}",
                    T::RECORD_TYPE,
                    handle,
                    e
                );
                let mut confirmed = record.clone();
                confirmed.set_remote_ref(handle);
                Ok(confirmed)
            }
        }
    }
}

#[async_trait]
impl<D: RecordDatabase + 'static> RecordStore for RemoteRecordStore<D> {
    async fn fetch_prompts(&self) -> Result<Vec<Prompt>, DomainError> {
        self.fetch_all().await
    }

    async fn fetch_projects(&self) -> Result<Vec<Project>, DomainError> {
        let mut projects: Vec<Project> = self.fetch_all().await?;
        projects.sort_by(|a, b| a.compare_names(b));
        Ok(projects)
    }

    async fn fetch_outputs(&self) -> Result<Vec<SavedOutput>, DomainError> {
        self.fetch_all().await
    }

    async fn save_prompt(&self, prompt: &Prompt) -> Result<Prompt, DomainError> {
        self.save_one(prompt).await
    }

    async fn save_project(&self, project: &Project) -> Result<Project, DomainError> {
        self.save_one(project).await
    }

    async fn save_output(&self, output: &SavedOutput) -> Result<SavedOutput, DomainError> {
        self.save_one(output).await
    }

    async fn delete(&self, kind: RecordKind, remote_ref: &RemoteRef) -> Result<(), DomainError> {
        self.database.delete(remote_ref).await?;
        tracing::debug!("Deleted {} record {}", kind, remote_ref);
        Ok(())
    }
}
