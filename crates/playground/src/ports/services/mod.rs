//! Service Ports
//!
//! Abstract interfaces for external services.

mod commerce;
mod generation;
mod record_database;

pub use commerce::*;
pub use generation::*;
pub use record_database::*;
