//! Application Layer (Use Cases)
//!
//! Orchestrates domain operations and coordinates between
//! the record store and external services.

mod cache;
mod events;
mod repository;
mod runner;
mod support;

pub use cache::RecordCache;
pub use events::RepositoryEvent;
pub use repository::{
    CloudPromptRepository, DynPromptRepository, LocalPromptRepository, PromptRepository,
};
pub use runner::PromptRunner;
pub use support::{SupportStore, SUPPORT_PRODUCT_ID};
