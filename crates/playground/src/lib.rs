//! Prompt Playground Domain Library
//!
//! Core domain types and interfaces for authoring, storing and running
//! prompts against a text generation backend.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: Core records (Prompt, Project, SavedOutput)
//!   - `value_objects/`: Immutable value types (RecordKind, RemoteRef, SyncState)
//!   - `errors/`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `repositories/`: Record persistence interface
//!   - `services/`: Remote database, generation and commerce interfaces
//!
//! # Usage
//!
//! ```rust,ignore
//! use playground::domain::{Prompt, Project};
//! use playground::ports::{RecordStore, GenerationService};
//! ```

pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    DomainError, GenerationParameters, Project, Prompt, Record, RecordKind, RemoteRef,
    SavedOutput, SyncState,
};
pub use ports::{
    AccountStatus, CommerceService, FieldValue, GenerationOutput, GenerationRequest,
    GenerationService, Product, PurchaseOutcome, RecordDatabase, RecordStore, RemoteRecord,
    SortDescriptor,
};
