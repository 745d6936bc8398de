//! Change notifications for UI bindings

use uuid::Uuid;

use playground::{RecordKind, SyncState};

/// Emitted by the repository after its state changes
#[derive(Debug, Clone, PartialEq)]
pub enum RepositoryEvent {
    /// The cached sequence of a record type changed
    CollectionChanged(RecordKind),
    SyncStateChanged {
        kind: RecordKind,
        id: Uuid,
        state: SyncState,
    },
    ErrorRaised(String),
    ErrorCleared,
    LoadingChanged(bool),
}
