//! Value Objects
//!
//! Immutable objects defined by their attributes rather than identity.

mod record_kind;
mod remote_ref;
mod sync_state;

pub use record_kind::*;
pub use remote_ref::*;
pub use sync_state::*;
