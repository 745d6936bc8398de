//! Local-only implementation of RecordStore
//!
//! The whole library lives in one JSON blob that is read once when the
//! store opens and rewritten after every mutation.

use std::cmp::Reverse;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use playground::{
    DomainError, Project, Prompt, Record, RecordKind, RecordStore, RemoteRef, SavedOutput,
};

use super::samples::sample_prompts;

/// Serialized form of the local library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    #[serde(default)]
    pub prompts: Vec<Prompt>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub outputs: Vec<SavedOutput>,
}

impl LibrarySnapshot {
    fn seeded() -> Self {
        let prompts = sample_prompts()
            .into_iter()
            .map(|mut p| {
                p.remote_ref = Some(local_ref(p.id));
                p
            })
            .collect();
        Self {
            prompts,
            ..Self::default()
        }
    }
}

pub struct BlobRecordStore {
    path: PathBuf,
    library: RwLock<LibrarySnapshot>,
}

impl BlobRecordStore {
    /// Open the blob at `path`.
    ///
    /// A missing blob starts the sample library; an unreadable one starts
    /// empty. Neither is an error for the caller.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let library = match Self::read(&path) {
            Ok(Some(library)) => {
                tracing::info!(
                    "Restored {} prompts from {}",
                    library.prompts.len(),
                    path.display()
                );
                library
            }
            Ok(None) => {
                tracing::info!("No library at {}, starting with samples", path.display());
                let seeded = LibrarySnapshot::seeded();
                // Keep sample ids stable across launches
                if let Err(e) = flush(&path, &seeded) {
                    tracing::error!("{}", e);
                }
                seeded
            }
            Err(e) => {
                tracing::error!("{}; starting with an empty library", e);
                LibrarySnapshot::default()
            }
        };

        Self {
            path,
            library: RwLock::new(library),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(path: &Path) -> Result<Option<LibrarySnapshot>, DomainError> {
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(path).map_err(|e| {
            DomainError::Persistence(format!("failed to read {}: {}", path.display(), e))
        })?;
        let library = serde_json::from_slice(&bytes).map_err(|e| {
            DomainError::Persistence(format!("failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Some(library))
    }

    /// Apply `change` to a copy, persist it, then commit it
    async fn mutate<F, T>(&self, change: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut LibrarySnapshot) -> Result<T, DomainError>,
    {
        let mut library = self.library.write().await;
        let mut next = library.clone();
        let result = change(&mut next)?;
        flush(&self.path, &next)?;
        *library = next;
        Ok(result)
    }
}

/// Write-then-rename so a crash never leaves a half-written blob
fn flush(path: &Path, library: &LibrarySnapshot) -> Result<(), DomainError> {
    let bytes = serde_json::to_vec_pretty(library)
        .map_err(|e| DomainError::Persistence(format!("failed to serialize library: {}", e)))?;

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| {
            DomainError::Persistence(format!("failed to create {}: {}", dir.display(), e))
        })?;
    }

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes).map_err(|e| {
        DomainError::Persistence(format!("failed to write {}: {}", tmp.display(), e))
    })?;
    std::fs::rename(&tmp, path).map_err(|e| {
        DomainError::Persistence(format!("failed to replace {}: {}", path.display(), e))
    })?;
    Ok(())
}

fn local_ref(id: uuid::Uuid) -> RemoteRef {
    RemoteRef::new(format!("local-{}", id))
}

fn upsert<T: Record>(records: &mut Vec<T>, record: T) {
    match records.iter_mut().find(|r| r.id() == record.id()) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

fn remove_by_ref<T: Record>(records: &mut Vec<T>, remote_ref: &RemoteRef) -> bool {
    let before = records.len();
    records.retain(|r| r.remote_ref() != Some(remote_ref));
    records.len() != before
}

#[async_trait]
impl RecordStore for BlobRecordStore {
    async fn fetch_prompts(&self) -> Result<Vec<Prompt>, DomainError> {
        let mut prompts = self.library.read().await.prompts.clone();
        prompts.sort_by_key(|p| Reverse(p.modified_at));
        Ok(prompts)
    }

    async fn fetch_projects(&self) -> Result<Vec<Project>, DomainError> {
        let mut projects = self.library.read().await.projects.clone();
        projects.sort_by(|a, b| a.compare_names(b));
        Ok(projects)
    }

    async fn fetch_outputs(&self) -> Result<Vec<SavedOutput>, DomainError> {
        let mut outputs = self.library.read().await.outputs.clone();
        outputs.sort_by_key(|o| Reverse(o.created_at));
        Ok(outputs)
    }

    async fn save_prompt(&self, prompt: &Prompt) -> Result<Prompt, DomainError> {
        let mut saved = prompt.clone();
        saved.remote_ref.get_or_insert_with(|| local_ref(prompt.id));
        self.mutate(|library| {
            upsert(&mut library.prompts, saved.clone());
            Ok(saved)
        })
        .await
    }

    async fn save_project(&self, project: &Project) -> Result<Project, DomainError> {
        let mut saved = project.clone();
        saved.remote_ref.get_or_insert_with(|| local_ref(project.id));
        self.mutate(|library| {
            upsert(&mut library.projects, saved.clone());
            Ok(saved)
        })
        .await
    }

    async fn save_output(&self, output: &SavedOutput) -> Result<SavedOutput, DomainError> {
        let mut saved = output.clone();
        saved.remote_ref.get_or_insert_with(|| local_ref(output.id));
        self.mutate(|library| {
            upsert(&mut library.outputs, saved.clone());
            Ok(saved)
        })
        .await
    }

    async fn delete(&self, kind: RecordKind, remote_ref: &RemoteRef) -> Result<(), DomainError> {
        self.mutate(|library| {
            let removed = match kind {
                RecordKind::Prompt => remove_by_ref(&mut library.prompts, remote_ref),
                RecordKind::Project => remove_by_ref(&mut library.projects, remote_ref),
                RecordKind::SavedOutput => remove_by_ref(&mut library.outputs, remote_ref),
            };
            if removed {
                Ok(())
            } else {
                Err(DomainError::RemoteWrite(format!(
                    "{} record {} does not exist",
                    kind, remote_ref
                )))
            }
        })
        .await
    }
}
