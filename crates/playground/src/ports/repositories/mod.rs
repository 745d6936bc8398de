//! Repository Ports
//!
//! Abstract interfaces for record persistence operations.

mod record_store;

pub use record_store::*;
