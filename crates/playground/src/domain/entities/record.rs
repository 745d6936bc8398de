//! Record - Behaviour shared by every persisted entity

use uuid::Uuid;

use crate::domain::value_objects::{RecordKind, RemoteRef};

/// A Prompt, Project or SavedOutput as seen by caches and stores
pub trait Record: Clone + Send + Sync + 'static {
    const KIND: RecordKind;

    fn id(&self) -> Uuid;

    fn remote_ref(&self) -> Option<&RemoteRef>;

    /// Fill in a fresh identifier when the caller left it nil
    fn ensure_id(&mut self);

    fn set_remote_ref(&mut self, remote_ref: RemoteRef);
}
