//! SyncState - Per-record synchronization status

use serde::{Deserialize, Serialize};

/// Where a record stands relative to the store.
///
/// `LocalOnly -> Syncing -> Synced | SyncFailed`, and a failed or synced
/// record goes back to `Syncing` on its next write.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    LocalOnly,
    Syncing,
    Synced,
    SyncFailed,
}

impl SyncState {
    /// Whether the UI should flag the record as not yet persisted
    pub fn is_unsynced(&self) -> bool {
        !matches!(self, SyncState::Synced)
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncState::LocalOnly => write!(f, "local_only"),
            SyncState::Syncing => write!(f, "syncing"),
            SyncState::Synced => write!(f, "synced"),
            SyncState::SyncFailed => write!(f, "sync_failed"),
        }
    }
}
