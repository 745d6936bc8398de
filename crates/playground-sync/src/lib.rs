//! Prompt Playground Repository
//!
//! Local cache, store adapters and use cases on top of the `playground`
//! domain crate.
//!
//! - `adapters/`: remote record codec and store, local blob store,
//!   in-memory record database, HTTP generation backend
//! - `application/`: the `PromptRepository` façade, prompt runner and
//!   support purchases
//! - `config`: TOML configuration
//! - `telemetry`: tracing setup
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use playground_sync::{DynPromptRepository, InMemoryRecordDatabase, PlaygroundConfig};
//!
//! let config = PlaygroundConfig::load()?;
//! let database = Arc::new(InMemoryRecordDatabase::new());
//! let repository = DynPromptRepository::from_config(&config, database)?;
//! repository.initialize().await?;
//! let hits = repository.search_prompts("review").await;
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod telemetry;

pub use adapters::{BlobRecordStore, HttpGenerationService, InMemoryRecordDatabase, RemoteRecordStore};
pub use application::{
    CloudPromptRepository, DynPromptRepository, LocalPromptRepository, PromptRepository,
    PromptRunner, RecordCache, RepositoryEvent, SupportStore,
};
pub use config::{DeploymentMode, GenerationConfig, PlaygroundConfig};
