//! Infrastructure Adapters
//!
//! Implementations of domain ports for external systems.

pub mod blob_store;
pub mod codec;
pub mod http_generation;
pub mod memory_database;
pub mod remote_store;
mod samples;

// Re-exports
pub use blob_store::{BlobRecordStore, LibrarySnapshot};
pub use codec::RecordCodec;
pub use http_generation::HttpGenerationService;
pub use memory_database::InMemoryRecordDatabase;
pub use remote_store::RemoteRecordStore;
pub use samples::sample_prompts;
