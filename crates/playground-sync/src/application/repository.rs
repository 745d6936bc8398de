//! Prompt Repository (façade)
//!
//! The single entry point UI code uses for record operations. Mutations hit
//! the local cache first, then the store; the store-confirmed record replaces
//! the optimistic copy by id. A failed write leaves the optimistic state in
//! place and raises the shared error slot.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use playground::{
    DomainError, Project, Prompt, Record, RecordDatabase, RecordKind, RecordStore, RemoteRef,
    SavedOutput, SyncState,
};

use super::cache::RecordCache;
use super::events::RepositoryEvent;
use crate::adapters::{BlobRecordStore, RemoteRecordStore};
use crate::config::{DeploymentMode, PlaygroundConfig};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct Caches {
    prompts: RecordCache<Prompt>,
    projects: RecordCache<Project>,
    outputs: RecordCache<SavedOutput>,
}

#[derive(Debug, Default)]
struct Status {
    last_error: Option<String>,
    fetch_errors: HashMap<RecordKind, String>,
    sync: HashMap<Uuid, SyncState>,
}

/// Ties a record type to its cache slot
trait Cached: Record {
    const LABEL: &'static str;

    fn slot(caches: &Caches) -> &RecordCache<Self>;

    fn slot_mut(caches: &mut Caches) -> &mut RecordCache<Self>;

    /// Where a newly added record goes
    fn place_new(cache: &mut RecordCache<Self>, record: Self) {
        cache.insert_front(record);
    }
}

impl Cached for Prompt {
    const LABEL: &'static str = "prompt";

    fn slot(caches: &Caches) -> &RecordCache<Self> {
        &caches.prompts
    }

    fn slot_mut(caches: &mut Caches) -> &mut RecordCache<Self> {
        &mut caches.prompts
    }
}

impl Cached for Project {
    const LABEL: &'static str = "project";

    fn slot(caches: &Caches) -> &RecordCache<Self> {
        &caches.projects
    }

    fn slot_mut(caches: &mut Caches) -> &mut RecordCache<Self> {
        &mut caches.projects
    }

    fn place_new(cache: &mut RecordCache<Self>, record: Self) {
        cache.upsert(record);
        cache.sort_by(|a, b| a.compare_names(b));
    }
}

impl Cached for SavedOutput {
    const LABEL: &'static str = "saved output";

    fn slot(caches: &Caches) -> &RecordCache<Self> {
        &caches.outputs
    }

    fn slot_mut(caches: &mut Caches) -> &mut RecordCache<Self> {
        &mut caches.outputs
    }
}

/// Repository façade over a record store
pub struct PromptRepository<S: RecordStore + ?Sized> {
    store: Arc<S>,
    caches: RwLock<Caches>,
    status: RwLock<Status>,
    loading: AtomicUsize,
    events: broadcast::Sender<RepositoryEvent>,
}

/// Repository backed by the remote record database
pub type CloudPromptRepository<D> = PromptRepository<RemoteRecordStore<D>>;

/// Repository backed by a local JSON blob
pub type LocalPromptRepository = PromptRepository<BlobRecordStore>;

/// Repository whose store was chosen at runtime
pub type DynPromptRepository = PromptRepository<dyn RecordStore>;

impl<D: RecordDatabase + 'static> PromptRepository<RemoteRecordStore<D>> {
    pub fn cloud(database: Arc<D>) -> Self {
        Self::new(Arc::new(RemoteRecordStore::new(database)))
    }
}

impl PromptRepository<BlobRecordStore> {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(BlobRecordStore::open(path)))
    }

    pub fn local_from_config(config: &PlaygroundConfig) -> anyhow::Result<Self> {
        Ok(Self::local(config.library_path()?))
    }
}

impl PromptRepository<dyn RecordStore> {
    /// Build the repository for the configured deployment mode.
    ///
    /// `database` is only used in cloud mode.
    pub fn from_config<D: RecordDatabase + 'static>(
        config: &PlaygroundConfig,
        database: Arc<D>,
    ) -> anyhow::Result<Self> {
        let store: Arc<dyn RecordStore> = match config.mode {
            DeploymentMode::Cloud => Arc::new(RemoteRecordStore::new(database)),
            DeploymentMode::Local => Arc::new(BlobRecordStore::open(config.library_path()?)),
        };
        tracing::info!("Using {:?} record store", config.mode);
        Ok(Self::new(store))
    }
}

impl<S: RecordStore + ?Sized> PromptRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            caches: RwLock::new(Caches::default()),
            status: RwLock::new(Status::default()),
            loading: AtomicUsize::new(0),
            events,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Receive change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<RepositoryEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: RepositoryEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // ---------------------------------------------------------------
    // Observable state
    // ---------------------------------------------------------------

    /// True while an `initialize` is in flight
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    pub async fn last_error(&self) -> Option<String> {
        self.status.read().await.last_error.clone()
    }

    /// The user has seen the error
    pub async fn acknowledge_error(&self) {
        self.clear_error().await;
    }

    /// Error of the latest fetch of `kind`, if it failed
    pub async fn fetch_error(&self, kind: RecordKind) -> Option<String> {
        self.status.read().await.fetch_errors.get(&kind).cloned()
    }

    pub async fn sync_state(&self, id: Uuid) -> Option<SyncState> {
        self.status.read().await.sync.get(&id).copied()
    }

    async fn set_sync(&self, kind: RecordKind, id: Uuid, state: SyncState) {
        self.status.write().await.sync.insert(id, state);
        self.emit(RepositoryEvent::SyncStateChanged { kind, id, state });
    }

    pub(crate) async fn record_failure(&self, context: &str, err: &DomainError) {
        let message = format!("{}: {}", context, err);
        tracing::error!("{}", message);
        self.status.write().await.last_error = Some(message.clone());
        self.emit(RepositoryEvent::ErrorRaised(message));
    }

    async fn reject(&self, context: &str, err: DomainError) -> DomainError {
        self.record_failure(context, &err).await;
        err
    }

    async fn clear_error(&self) {
        let cleared = self.status.write().await.last_error.take().is_some();
        if cleared {
            self.emit(RepositoryEvent::ErrorCleared);
        }
    }

    // ---------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------

    /// Refetch all three record types concurrently.
    ///
    /// A failing type does not stop the others; every failure is recorded
    /// and the first one is returned once all three have finished.
    pub async fn initialize(&self) -> Result<(), DomainError> {
        if self.loading.fetch_add(1, Ordering::SeqCst) == 0 {
            self.emit(RepositoryEvent::LoadingChanged(true));
        }
        tracing::info!("Fetching library");

        let (prompts, projects, outputs) = tokio::join!(
            self.refresh_prompts(),
            self.refresh_projects(),
            self.refresh_outputs(),
        );

        if self.loading.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.emit(RepositoryEvent::LoadingChanged(false));
        }

        prompts?;
        projects?;
        outputs?;
        Ok(())
    }

    pub async fn refresh_prompts(&self) -> Result<usize, DomainError> {
        let result = self.store.fetch_prompts().await;
        self.apply_fetch(result).await
    }

    pub async fn refresh_projects(&self) -> Result<usize, DomainError> {
        let result = self.store.fetch_projects().await;
        self.apply_fetch(result).await
    }

    pub async fn refresh_outputs(&self) -> Result<usize, DomainError> {
        let result = self.store.fetch_outputs().await;
        self.apply_fetch(result).await
    }

    /// Fetched records replace the whole slice for their type
    async fn apply_fetch<T: Cached>(
        &self,
        result: Result<Vec<T>, DomainError>,
    ) -> Result<usize, DomainError> {
        match result {
            Ok(records) => {
                let count = records.len();
                let ids: Vec<Uuid> = records.iter().map(Record::id).collect();
                T::slot_mut(&mut *self.caches.write().await).replace_all(records);
                {
                    let mut status = self.status.write().await;
                    status.fetch_errors.remove(&T::KIND);
                    for id in ids {
                        status.sync.insert(id, SyncState::Synced);
                    }
                }
                tracing::info!("Loaded {} {} records", count, T::LABEL);
                self.emit(RepositoryEvent::CollectionChanged(T::KIND));
                Ok(count)
            }
            Err(e) => {
                self.status
                    .write()
                    .await
                    .fetch_errors
                    .insert(T::KIND, e.to_string());
                self.record_failure(&format!("Failed to fetch {}s", T::LABEL), &e)
                    .await;
                Err(e)
            }
        }
    }

    // ---------------------------------------------------------------
    // Mutation plumbing
    // ---------------------------------------------------------------

    async fn stage_new<T: Cached>(&self, record: T) {
        let (kind, id) = (T::KIND, record.id());
        T::place_new(T::slot_mut(&mut *self.caches.write().await), record);
        self.set_sync(kind, id, SyncState::LocalOnly).await;
        self.emit(RepositoryEvent::CollectionChanged(kind));
    }

    async fn dispatch_new<T: Cached>(&self, id: Uuid) {
        self.set_sync(T::KIND, id, SyncState::Syncing).await;
    }

    /// Swap in the store's answer, or mark the optimistic copy as failed
    async fn reconcile<T: Cached>(
        &self,
        id: Uuid,
        result: Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        match result {
            Ok(confirmed) => {
                let still_cached =
                    T::slot_mut(&mut *self.caches.write().await).replace(confirmed.clone());
                if still_cached {
                    self.set_sync(T::KIND, id, SyncState::Synced).await;
                    self.emit(RepositoryEvent::CollectionChanged(T::KIND));
                }
                self.clear_error().await;
                Ok(confirmed)
            }
            Err(e) => {
                self.set_sync(T::KIND, id, SyncState::SyncFailed).await;
                self.record_failure(&format!("Failed to save {}", T::LABEL), &e)
                    .await;
                Err(e)
            }
        }
    }

    async fn cached<T: Cached>(&self, id: Uuid) -> Option<T> {
        T::slot(&*self.caches.read().await).find_by_id(id).cloned()
    }

    /// The cached copy may already carry a handle the caller's copy lacks
    async fn resolve_remote_ref<T: Cached>(
        &self,
        id: Uuid,
        fallback: Option<&RemoteRef>,
    ) -> Option<RemoteRef> {
        self.cached::<T>(id)
            .await
            .and_then(|r| r.remote_ref().cloned())
            .or_else(|| fallback.cloned())
    }

    async fn delete_remote<T: Cached>(
        &self,
        id: Uuid,
        fallback: Option<&RemoteRef>,
    ) -> Result<(), DomainError> {
        let context = format!("Failed to delete {}", T::LABEL);
        let Some(remote_ref) = self.resolve_remote_ref::<T>(id, fallback).await else {
            let err = DomainError::RemoteWrite(format!("{} {} has no remote handle", T::LABEL, id));
            return Err(self.reject(&context, err).await);
        };

        match self.store.delete(T::KIND, &remote_ref).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.reject(&context, e).await),
        }
    }

    // ---------------------------------------------------------------
    // Prompts
    // ---------------------------------------------------------------

    /// Add a prompt at the front of the list and persist it
    pub async fn add_prompt(&self, mut prompt: Prompt) -> Result<Prompt, DomainError> {
        prompt.ensure_id();
        if prompt.modified_at < prompt.created_at {
            prompt.modified_at = prompt.created_at;
        }
        if let Err(e) = prompt.validate() {
            return Err(self.reject("Invalid prompt", e).await);
        }

        self.stage_new(prompt.clone()).await;
        self.dispatch_new::<Prompt>(prompt.id).await;
        let result = self.store.save_prompt(&prompt).await;
        self.reconcile(prompt.id, result).await
    }

    /// Stamp, move to the top and persist an edited prompt
    pub async fn update_prompt(&self, mut prompt: Prompt) -> Result<Prompt, DomainError> {
        let Some(current) = self.cached::<Prompt>(prompt.id).await else {
            let err = DomainError::not_found(RecordKind::Prompt, prompt.id);
            return Err(self.reject("Failed to update prompt", err).await);
        };

        prompt.modified_at = Utc::now()
            .max(current.modified_at)
            .max(prompt.modified_at);
        if prompt.remote_ref.is_none() {
            prompt.remote_ref = current.remote_ref;
        }
        if let Err(e) = prompt.validate() {
            return Err(self.reject("Invalid prompt", e).await);
        }

        {
            let mut caches = self.caches.write().await;
            // Front first so the stable sort keeps it ahead of equal timestamps
            caches.prompts.insert_front(prompt.clone());
            caches
                .prompts
                .sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        }
        self.set_sync(RecordKind::Prompt, prompt.id, SyncState::Syncing)
            .await;
        self.emit(RepositoryEvent::CollectionChanged(RecordKind::Prompt));

        let result = self.store.save_prompt(&prompt).await;
        self.reconcile(prompt.id, result).await
    }

    pub async fn toggle_prompt_favorite(&self, id: Uuid) -> Result<Prompt, DomainError> {
        let Some(mut prompt) = self.cached::<Prompt>(id).await else {
            let err = DomainError::not_found(RecordKind::Prompt, id);
            return Err(self.reject("Failed to update prompt", err).await);
        };
        prompt.is_favorite = !prompt.is_favorite;
        self.update_prompt(prompt).await
    }

    /// Delete remotely, then drop the prompt and its saved outputs locally
    pub async fn delete_prompt(&self, prompt: &Prompt) -> Result<(), DomainError> {
        self.delete_remote::<Prompt>(prompt.id, prompt.remote_ref.as_ref())
            .await?;

        let orphans = {
            let mut caches = self.caches.write().await;
            caches.prompts.remove(prompt.id);
            caches.outputs.remove_where(|o| o.prompt_id == prompt.id)
        };
        {
            let mut status = self.status.write().await;
            status.sync.remove(&prompt.id);
            for output in &orphans {
                status.sync.remove(&output.id);
            }
        }
        self.emit(RepositoryEvent::CollectionChanged(RecordKind::Prompt));
        if !orphans.is_empty() {
            self.emit(RepositoryEvent::CollectionChanged(RecordKind::SavedOutput));
        }
        tracing::info!(
            "Deleted prompt {} with {} saved outputs",
            prompt.id,
            orphans.len()
        );

        // Remote copies of the outputs go too, best effort
        for remote_ref in orphans.iter().filter_map(|o| o.remote_ref.as_ref()) {
            if let Err(e) = self.store.delete(RecordKind::SavedOutput, remote_ref).await {
                tracing::warn!("Could not delete saved output {}: {}", remote_ref, e);
            }
        }

        self.clear_error().await;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Projects
    // ---------------------------------------------------------------

    pub async fn add_project(&self, mut project: Project) -> Result<Project, DomainError> {
        project.ensure_id();
        if let Err(e) = project.validate() {
            return Err(self.reject("Invalid project", e).await);
        }

        self.stage_new(project.clone()).await;
        self.dispatch_new::<Project>(project.id).await;
        let result = self.store.save_project(&project).await;
        self.reconcile(project.id, result).await
    }

    pub async fn update_project(&self, mut project: Project) -> Result<Project, DomainError> {
        let Some(current) = self.cached::<Project>(project.id).await else {
            let err = DomainError::not_found(RecordKind::Project, project.id);
            return Err(self.reject("Failed to update project", err).await);
        };

        project.modified_at = Utc::now().max(current.modified_at);
        if project.remote_ref.is_none() {
            project.remote_ref = current.remote_ref;
        }
        if let Err(e) = project.validate() {
            return Err(self.reject("Invalid project", e).await);
        }

        {
            let mut caches = self.caches.write().await;
            caches.projects.replace(project.clone());
            caches.projects.sort_by(|a, b| a.compare_names(b));
        }
        self.set_sync(RecordKind::Project, project.id, SyncState::Syncing)
            .await;
        self.emit(RepositoryEvent::CollectionChanged(RecordKind::Project));

        let result = self.store.save_project(&project).await;
        self.reconcile(project.id, result).await
    }

    /// Delete remotely, drop locally, then detach and re-save every prompt
    /// that pointed at the project (one write per prompt)
    pub async fn delete_project(&self, project: &Project) -> Result<(), DomainError> {
        self.delete_remote::<Project>(project.id, project.remote_ref.as_ref())
            .await?;

        let detached = {
            let mut caches = self.caches.write().await;
            caches.projects.remove(project.id);
            caches.prompts.filter(|p| p.project_id == Some(project.id))
        };
        self.status.write().await.sync.remove(&project.id);
        self.emit(RepositoryEvent::CollectionChanged(RecordKind::Project));
        self.clear_error().await;
        tracing::info!(
            "Deleted project {}, detaching {} prompts",
            project.id,
            detached.len()
        );

        let mut first_failure = None;
        for mut prompt in detached {
            prompt.project_id = None;
            if let Err(e) = self.update_prompt(prompt).await {
                first_failure.get_or_insert(e);
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // ---------------------------------------------------------------
    // Saved outputs
    // ---------------------------------------------------------------

    pub async fn add_output(&self, mut output: SavedOutput) -> Result<SavedOutput, DomainError> {
        output.ensure_id();

        self.stage_new(output.clone()).await;
        self.dispatch_new::<SavedOutput>(output.id).await;
        let result = self.store.save_output(&output).await;
        self.reconcile(output.id, result).await
    }

    /// Persist edits to notes or the favorite flag
    pub async fn update_output(
        &self,
        mut output: SavedOutput,
    ) -> Result<SavedOutput, DomainError> {
        let Some(current) = self.cached::<SavedOutput>(output.id).await else {
            let err = DomainError::not_found(RecordKind::SavedOutput, output.id);
            return Err(self.reject("Failed to update saved output", err).await);
        };
        if output.remote_ref.is_none() {
            output.remote_ref = current.remote_ref;
        }

        self.caches.write().await.outputs.replace(output.clone());
        self.set_sync(RecordKind::SavedOutput, output.id, SyncState::Syncing)
            .await;
        self.emit(RepositoryEvent::CollectionChanged(RecordKind::SavedOutput));

        let result = self.store.save_output(&output).await;
        self.reconcile(output.id, result).await
    }

    pub async fn toggle_output_favorite(&self, id: Uuid) -> Result<SavedOutput, DomainError> {
        let Some(mut output) = self.cached::<SavedOutput>(id).await else {
            let err = DomainError::not_found(RecordKind::SavedOutput, id);
            return Err(self.reject("Failed to update saved output", err).await);
        };
        output.is_favorite = !output.is_favorite;
        self.update_output(output).await
    }

    pub async fn delete_output(&self, output: &SavedOutput) -> Result<(), DomainError> {
        self.delete_remote::<SavedOutput>(output.id, output.remote_ref.as_ref())
            .await?;

        self.caches.write().await.outputs.remove(output.id);
        self.status.write().await.sync.remove(&output.id);
        self.emit(RepositoryEvent::CollectionChanged(RecordKind::SavedOutput));
        self.clear_error().await;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub async fn prompts(&self) -> Vec<Prompt> {
        self.caches.read().await.prompts.get().to_vec()
    }

    pub async fn projects(&self) -> Vec<Project> {
        self.caches.read().await.projects.get().to_vec()
    }

    pub async fn saved_outputs(&self) -> Vec<SavedOutput> {
        self.caches.read().await.outputs.get().to_vec()
    }

    pub async fn find_prompt(&self, id: Uuid) -> Option<Prompt> {
        self.cached(id).await
    }

    pub async fn find_project(&self, id: Uuid) -> Option<Project> {
        self.cached(id).await
    }

    /// Case-insensitive match on title, texts and tags, in cache order.
    /// An empty query returns every prompt.
    pub async fn search_prompts(&self, query: &str) -> Vec<Prompt> {
        let caches = self.caches.read().await;
        if query.is_empty() {
            return caches.prompts.get().to_vec();
        }
        caches.prompts.filter(|p| p.matches(query))
    }

    pub async fn prompts_for_project(&self, project: &Project) -> Vec<Prompt> {
        self.caches
            .read()
            .await
            .prompts
            .filter(|p| p.project_id == Some(project.id))
    }

    pub async fn prompts_without_project(&self) -> Vec<Prompt> {
        self.caches
            .read()
            .await
            .prompts
            .filter(|p| p.project_id.is_none())
    }

    pub async fn favorite_prompts(&self) -> Vec<Prompt> {
        self.caches.read().await.prompts.filter(|p| p.is_favorite)
    }

    pub async fn saved_outputs_for_prompt(&self, prompt_id: Uuid) -> Vec<SavedOutput> {
        self.caches
            .read()
            .await
            .outputs
            .filter(|o| o.prompt_id == prompt_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryRecordDatabase;
    use async_trait::async_trait;
    use chrono::Duration;
    use playground::AccountStatus;
    use tempfile::TempDir;

    fn cloud() -> (
        Arc<InMemoryRecordDatabase>,
        CloudPromptRepository<InMemoryRecordDatabase>,
    ) {
        let db = Arc::new(InMemoryRecordDatabase::new());
        (db.clone(), PromptRepository::cloud(db))
    }

    fn titles(prompts: &[Prompt]) -> Vec<String> {
        prompts.iter().map(|p| p.title.clone()).collect()
    }

    fn drain(rx: &mut broadcast::Receiver<RepositoryEvent>) -> Vec<RepositoryEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Remote store whose saved-output query is always down
    struct OutputsDown {
        inner: RemoteRecordStore<InMemoryRecordDatabase>,
    }

    #[async_trait]
    impl RecordStore for OutputsDown {
        async fn fetch_prompts(&self) -> Result<Vec<Prompt>, DomainError> {
            self.inner.fetch_prompts().await
        }

        async fn fetch_projects(&self) -> Result<Vec<Project>, DomainError> {
            self.inner.fetch_projects().await
        }

        async fn fetch_outputs(&self) -> Result<Vec<SavedOutput>, DomainError> {
            Err(DomainError::RemoteUnavailable("zone offline".to_string()))
        }

        async fn save_prompt(&self, prompt: &Prompt) -> Result<Prompt, DomainError> {
            self.inner.save_prompt(prompt).await
        }

        async fn save_project(&self, project: &Project) -> Result<Project, DomainError> {
            self.inner.save_project(project).await
        }

        async fn save_output(&self, output: &SavedOutput) -> Result<SavedOutput, DomainError> {
            self.inner.save_output(output).await
        }

        async fn delete(
            &self,
            kind: RecordKind,
            remote_ref: &RemoteRef,
        ) -> Result<(), DomainError> {
            self.inner.delete(kind, remote_ref).await
        }
    }

    #[tokio::test]
    async fn test_add_prompt_lands_at_front_and_syncs() {
        let (_db, repo) = cloud();
        repo.add_prompt(Prompt::new("First", "", "")).await.unwrap();
        let added = repo.add_prompt(Prompt::new("Second", "", "")).await.unwrap();

        let all = repo.search_prompts("").await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, added.id);
        assert!(added.remote_ref.is_some());
        assert_eq!(all[0].remote_ref, added.remote_ref);
        assert_eq!(repo.sync_state(added.id).await, Some(SyncState::Synced));
        assert_eq!(repo.last_error().await, None);
    }

    #[tokio::test]
    async fn test_add_assigns_missing_id() {
        let (_db, repo) = cloud();
        let mut prompt = Prompt::new("Nil", "", "");
        prompt.id = Uuid::nil();

        let added = repo.add_prompt(prompt).await.unwrap();
        assert!(!added.id.is_nil());
        assert!(repo.find_prompt(added.id).await.is_some());
    }

    #[tokio::test]
    async fn test_failed_add_keeps_optimistic_record() {
        let (db, repo) = cloud();
        db.set_fail_writes(true);
        let prompt = Prompt::new("Offline", "", "");

        let err = repo.add_prompt(prompt.clone()).await.unwrap_err();
        assert!(matches!(err, DomainError::RemoteWrite(_)));

        let cached = repo.find_prompt(prompt.id).await.unwrap();
        assert!(cached.remote_ref.is_none());
        assert_eq!(
            repo.sync_state(prompt.id).await,
            Some(SyncState::SyncFailed)
        );
        assert!(repo
            .last_error()
            .await
            .unwrap()
            .starts_with("Failed to save prompt"));

        repo.acknowledge_error().await;
        assert_eq!(repo.last_error().await, None);
    }

    #[tokio::test]
    async fn test_retry_after_failure_creates_one_remote_record() {
        let (db, repo) = cloud();
        db.set_fail_writes(true);
        let prompt = Prompt::new("Flaky", "", "");
        assert!(repo.add_prompt(prompt.clone()).await.is_err());

        db.set_fail_writes(false);
        let cached = repo.find_prompt(prompt.id).await.unwrap();
        let saved = repo.update_prompt(cached).await.unwrap();

        assert!(saved.remote_ref.is_some());
        assert_eq!(db.len().await, 1);
        assert_eq!(repo.sync_state(prompt.id).await, Some(SyncState::Synced));
        assert_eq!(repo.last_error().await, None);
    }

    #[tokio::test]
    async fn test_update_reorders_by_modified_at() {
        let (db, repo) = cloud();
        let store = RemoteRecordStore::new(db.clone());
        let t1 = Utc::now() - Duration::minutes(30);
        let t2 = t1 + Duration::minutes(10);

        let mut a = Prompt::new("A", "", "");
        a.created_at = t1;
        a.modified_at = t1;
        let mut b = Prompt::new("B", "", "");
        b.created_at = t1;
        b.modified_at = t2;
        store.save_prompt(&a).await.unwrap();
        store.save_prompt(&b).await.unwrap();

        repo.initialize().await.unwrap();
        assert_eq!(titles(&repo.prompts().await), vec!["B", "A"]);

        let a = repo.find_prompt(a.id).await.unwrap();
        let updated = repo.update_prompt(a.clone()).await.unwrap();
        assert!(updated.modified_at > t2);
        assert!(updated.modified_at >= a.modified_at);
        assert_eq!(titles(&repo.prompts().await), vec!["A", "B"]);

        let remote = store.fetch_prompts().await.unwrap();
        assert_eq!(titles(&remote), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_update_unknown_prompt_is_not_found() {
        let (_db, repo) = cloud();
        let err = repo
            .update_prompt(Prompt::new("Ghost", "", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
        assert!(repo.prompts().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_prompt_cascades_outputs() {
        let (db, repo) = cloud();
        let prompt = repo.add_prompt(Prompt::new("P", "", "hi")).await.unwrap();
        let other = repo.add_prompt(Prompt::new("Other", "", "")).await.unwrap();
        for text in ["one", "two"] {
            repo.add_output(SavedOutput::new(prompt.id, text, prompt.parameters()))
                .await
                .unwrap();
        }
        repo.add_output(SavedOutput::new(other.id, "keep", other.parameters()))
            .await
            .unwrap();

        repo.delete_prompt(&prompt).await.unwrap();
        assert!(repo.find_prompt(prompt.id).await.is_none());
        assert!(repo.saved_outputs_for_prompt(prompt.id).await.is_empty());
        assert_eq!(repo.saved_outputs().await.len(), 1);
        assert_eq!(repo.sync_state(prompt.id).await, None);

        // Remote copies are gone as well
        repo.initialize().await.unwrap();
        assert!(repo.saved_outputs_for_prompt(prompt.id).await.is_empty());
        assert_eq!(db.len().await, 2);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_prompt_and_outputs() {
        let (db, repo) = cloud();
        let prompt = repo.add_prompt(Prompt::new("P", "", "hi")).await.unwrap();
        repo.add_output(SavedOutput::new(prompt.id, "out", prompt.parameters()))
            .await
            .unwrap();

        db.set_fail_writes(true);
        let err = repo.delete_prompt(&prompt).await.unwrap_err();
        assert!(matches!(err, DomainError::RemoteWrite(_)));

        assert!(repo.find_prompt(prompt.id).await.is_some());
        assert_eq!(repo.saved_outputs_for_prompt(prompt.id).await.len(), 1);
        assert!(repo
            .last_error()
            .await
            .unwrap()
            .starts_with("Failed to delete prompt"));
    }

    #[tokio::test]
    async fn test_delete_uses_handle_from_cache() {
        let (_db, repo) = cloud();
        let draft = Prompt::new("Stale copy", "", "");
        repo.add_prompt(draft.clone()).await.unwrap();

        // `draft` never received the handle, the cached copy did
        assert!(draft.remote_ref.is_none());
        repo.delete_prompt(&draft).await.unwrap();
        assert!(repo.prompts().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_unsynced_prompt_fails() {
        let (db, repo) = cloud();
        db.set_fail_writes(true);
        let prompt = Prompt::new("Never synced", "", "");
        assert!(repo.add_prompt(prompt.clone()).await.is_err());
        db.set_fail_writes(false);

        let err = repo.delete_prompt(&prompt).await.unwrap_err();
        assert!(matches!(err, DomainError::RemoteWrite(_)));
        assert!(repo.find_prompt(prompt.id).await.is_some());
    }

    #[tokio::test]
    async fn test_delete_project_detaches_prompts() {
        let (db, repo) = cloud();
        let project = repo.add_project(Project::new("Work", "")).await.unwrap();
        let p1 = repo
            .add_prompt(Prompt::new("In 1", "", "").with_project(project.id))
            .await
            .unwrap();
        let p2 = repo
            .add_prompt(Prompt::new("In 2", "", "").with_project(project.id))
            .await
            .unwrap();
        repo.add_prompt(Prompt::new("Loose", "", "")).await.unwrap();

        assert_eq!(repo.prompts_for_project(&project).await.len(), 2);
        assert_eq!(repo.prompts_without_project().await.len(), 1);

        repo.delete_project(&project).await.unwrap();
        assert!(repo.projects().await.is_empty());
        for id in [p1.id, p2.id] {
            assert_eq!(repo.find_prompt(id).await.unwrap().project_id, None);
        }
        assert_eq!(repo.prompts_without_project().await.len(), 3);

        let remote = RemoteRecordStore::new(db).fetch_prompts().await.unwrap();
        assert_eq!(remote.len(), 3);
        assert!(remote.iter().all(|p| p.project_id.is_none()));
    }

    #[tokio::test]
    async fn test_search_prompts() {
        let (_db, repo) = cloud();
        repo.add_prompt(Prompt::new("Code Review Assistant", "You review code.", ""))
            .await
            .unwrap();
        repo.add_prompt(Prompt::new("Creative Writing Helper", "", "").with_tags(["Fiction"]))
            .await
            .unwrap();

        assert_eq!(
            titles(&repo.search_prompts("review").await),
            vec!["Code Review Assistant"]
        );
        assert_eq!(repo.search_prompts("REVIEW").await.len(), 1);
        assert_eq!(
            titles(&repo.search_prompts("fiction").await),
            vec!["Creative Writing Helper"]
        );
        assert!(repo.search_prompts("zzz").await.is_empty());
        assert_eq!(
            titles(&repo.search_prompts("").await),
            vec!["Creative Writing Helper", "Code Review Assistant"]
        );
    }

    #[tokio::test]
    async fn test_projects_stay_sorted_by_name() {
        let (_db, repo) = cloud();
        for name in ["Zeta", "alpha", "Mid"] {
            repo.add_project(Project::new(name, "")).await.unwrap();
        }
        let names = |projects: Vec<Project>| -> Vec<String> {
            projects.into_iter().map(|p| p.name).collect()
        };
        assert_eq!(names(repo.projects().await), vec!["alpha", "Mid", "Zeta"]);

        let mut alpha = repo.projects().await.remove(0);
        alpha.name = "omega".to_string();
        repo.update_project(alpha).await.unwrap();
        assert_eq!(names(repo.projects().await), vec!["Mid", "omega", "Zeta"]);
    }

    #[tokio::test]
    async fn test_invalid_records_are_rejected_before_caching() {
        let (db, repo) = cloud();
        let err = repo
            .add_prompt(Prompt::default().with_temperature(1.5))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(repo.prompts().await.is_empty());
        assert!(repo.last_error().await.is_some());

        assert!(repo.add_project(Project::new("", "")).await.is_err());
        assert!(repo.projects().await.is_empty());
        assert!(db.is_empty().await);
    }

    #[tokio::test]
    async fn test_toggle_favorites() {
        let (_db, repo) = cloud();
        let prompt = repo.add_prompt(Prompt::new("Fav", "", "x")).await.unwrap();
        let output = repo
            .add_output(SavedOutput::new(prompt.id, "text", prompt.parameters()))
            .await
            .unwrap();

        let toggled = repo.toggle_prompt_favorite(prompt.id).await.unwrap();
        assert!(toggled.is_favorite);
        assert_eq!(repo.favorite_prompts().await.len(), 1);

        let toggled = repo.toggle_output_favorite(output.id).await.unwrap();
        assert!(toggled.is_favorite);
        let toggled = repo.toggle_output_favorite(output.id).await.unwrap();
        assert!(!toggled.is_favorite);
    }

    #[tokio::test]
    async fn test_delete_output() {
        let (db, repo) = cloud();
        let prompt = repo.add_prompt(Prompt::new("P", "", "x")).await.unwrap();
        let output = repo
            .add_output(SavedOutput::new(prompt.id, "text", prompt.parameters()).with_notes("n"))
            .await
            .unwrap();

        repo.delete_output(&output).await.unwrap();
        assert!(repo.saved_outputs().await.is_empty());
        assert_eq!(db.len().await, 1);
    }

    #[tokio::test]
    async fn test_initialize_without_account_reports_each_kind() {
        let (db, repo) = cloud();
        db.set_account_status(AccountStatus::NoAccount).await;

        let err = repo.initialize().await.unwrap_err();
        assert!(matches!(err, DomainError::RemoteUnavailable(_)));
        for kind in RecordKind::ALL {
            assert!(repo.fetch_error(kind).await.is_some());
        }
        assert!(!repo.is_loading());
        assert!(repo.last_error().await.is_some());
    }

    #[tokio::test]
    async fn test_one_failing_fetch_does_not_block_others() {
        let db = Arc::new(InMemoryRecordDatabase::new());
        let inner = RemoteRecordStore::new(db.clone());
        inner.save_prompt(&Prompt::new("P", "", "")).await.unwrap();
        inner.save_project(&Project::new("Work", "")).await.unwrap();
        let repo = PromptRepository::new(Arc::new(OutputsDown { inner }));

        assert!(repo.initialize().await.is_err());
        assert_eq!(repo.prompts().await.len(), 1);
        assert_eq!(repo.projects().await.len(), 1);
        assert!(repo.fetch_error(RecordKind::SavedOutput).await.is_some());
        assert!(repo.fetch_error(RecordKind::Prompt).await.is_none());
        assert!(repo.fetch_error(RecordKind::Project).await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_remote_record_is_skipped() {
        let (db, repo) = cloud();
        let store = RemoteRecordStore::new(db.clone());
        for i in 0..4 {
            store
                .save_prompt(&Prompt::new(format!("Valid {}", i), "", ""))
                .await
                .unwrap();
        }
        let mut broken = crate::adapters::RecordCodec::encode(&Prompt::default());
        broken.fields.remove("modifiedAt");
        db.insert_raw(broken).await;

        assert_eq!(repo.refresh_prompts().await.unwrap(), 4);
        assert_eq!(repo.prompts().await.len(), 4);
        assert_eq!(repo.last_error().await, None);
    }

    #[tokio::test]
    async fn test_out_of_range_remote_prompt_never_reaches_cache() {
        let (db, repo) = cloud();
        let store = RemoteRecordStore::new(db.clone());
        let good = store.save_prompt(&Prompt::new("Good", "", "")).await.unwrap();
        let mut hot = crate::adapters::RecordCodec::encode(&Prompt::new("Hot", "", ""));
        hot.set("temperature", playground::FieldValue::Double(5.0));
        db.insert_raw(hot).await;

        assert_eq!(repo.refresh_prompts().await.unwrap(), 1);
        assert!(repo.prompts().await.iter().all(|p| p.validate().is_ok()));
        let toggled = repo.toggle_prompt_favorite(good.id).await.unwrap();
        assert!(toggled.is_favorite);
    }

    #[tokio::test]
    async fn test_from_config_follows_deployment_mode() {
        let dir = TempDir::new().unwrap();
        let mut config = PlaygroundConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..PlaygroundConfig::default()
        };

        config.mode = DeploymentMode::Local;
        let db = Arc::new(InMemoryRecordDatabase::new());
        let local = DynPromptRepository::from_config(&config, db.clone()).unwrap();
        local.initialize().await.unwrap();
        assert_eq!(local.prompts().await.len(), 4);
        assert!(db.is_empty().await);

        config.mode = DeploymentMode::Cloud;
        let cloud = DynPromptRepository::from_config(&config, db.clone()).unwrap();
        cloud.initialize().await.unwrap();
        assert!(cloud.prompts().await.is_empty());
        cloud.add_prompt(Prompt::new("Remote", "", "")).await.unwrap();
        assert_eq!(db.len().await, 1);
    }

    #[tokio::test]
    async fn test_local_samples_survive_restart_without_edits() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.json");

        let first = PromptRepository::local(&path);
        first.initialize().await.unwrap();
        let second = PromptRepository::local(&path);
        second.initialize().await.unwrap();

        let ids = |prompts: Vec<Prompt>| -> Vec<Uuid> {
            let mut ids: Vec<_> = prompts.into_iter().map(|p| p.id).collect();
            ids.sort();
            ids
        };
        assert_eq!(ids(first.prompts().await), ids(second.prompts().await));
    }

    #[tokio::test]
    async fn test_fetch_replaces_cache_wholesale() {
        let (db, repo) = cloud();
        let prompt = repo.add_prompt(Prompt::new("Mine", "", "")).await.unwrap();

        // Someone else overwrote it remotely
        let mut remote = prompt.clone();
        remote.title = "Theirs".to_string();
        RemoteRecordStore::new(db).save_prompt(&remote).await.unwrap();

        repo.refresh_prompts().await.unwrap();
        assert_eq!(titles(&repo.prompts().await), vec!["Theirs"]);
    }

    #[tokio::test]
    async fn test_events_follow_add_lifecycle() {
        let (_db, repo) = cloud();
        let mut rx = repo.subscribe();
        let prompt = repo.add_prompt(Prompt::new("Evented", "", "")).await.unwrap();

        let events = drain(&mut rx);
        let staged = RepositoryEvent::SyncStateChanged {
            kind: RecordKind::Prompt,
            id: prompt.id,
            state: SyncState::LocalOnly,
        };
        let syncing = RepositoryEvent::SyncStateChanged {
            kind: RecordKind::Prompt,
            id: prompt.id,
            state: SyncState::Syncing,
        };
        let synced = RepositoryEvent::SyncStateChanged {
            kind: RecordKind::Prompt,
            id: prompt.id,
            state: SyncState::Synced,
        };
        let local = events.iter().position(|e| *e == staged).unwrap();
        let first = events.iter().position(|e| *e == syncing).unwrap();
        let second = events.iter().position(|e| *e == synced).unwrap();
        assert!(local < first);
        assert!(first < second);
        assert!(events.contains(&RepositoryEvent::CollectionChanged(RecordKind::Prompt)));
    }

    #[tokio::test]
    async fn test_loading_flag_is_announced() {
        let (_db, repo) = cloud();
        let mut rx = repo.subscribe();
        assert!(!repo.is_loading());

        repo.initialize().await.unwrap();
        let events = drain(&mut rx);
        assert_eq!(events.first(), Some(&RepositoryEvent::LoadingChanged(true)));
        assert!(events.contains(&RepositoryEvent::LoadingChanged(false)));
        assert!(!repo.is_loading());
    }

    #[tokio::test]
    async fn test_second_error_overwrites_first() {
        let (db, repo) = cloud();
        db.set_fail_writes(true);
        assert!(repo.add_prompt(Prompt::new("P", "", "")).await.is_err());
        assert!(repo.add_project(Project::new("Work", "")).await.is_err());

        assert!(repo
            .last_error()
            .await
            .unwrap()
            .starts_with("Failed to save project"));
    }

    #[tokio::test]
    async fn test_local_repository_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.json");

        let repo = PromptRepository::local(&path);
        repo.initialize().await.unwrap();
        assert_eq!(repo.prompts().await.len(), 4);

        let added = repo.add_prompt(Prompt::new("Mine", "", "")).await.unwrap();
        assert_eq!(repo.sync_state(added.id).await, Some(SyncState::Synced));

        let reopened = PromptRepository::local(&path);
        reopened.initialize().await.unwrap();
        let prompts = reopened.prompts().await;
        assert_eq!(prompts.len(), 5);
        assert_eq!(prompts[0].id, added.id);
        assert_eq!(
            titles(&reopened.search_prompts("review").await),
            vec!["Code Review Assistant"]
        );

        reopened.delete_prompt(&prompts[0]).await.unwrap();
        let again = PromptRepository::local(&path);
        again.initialize().await.unwrap();
        assert_eq!(again.prompts().await.len(), 4);
    }
}
