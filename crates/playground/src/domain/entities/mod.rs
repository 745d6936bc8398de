//! Domain Entities
//!
//! Pure domain models without infrastructure dependencies.
//! - Prompt: Text template with generation parameters
//! - Project: Named grouping of prompts
//! - SavedOutput: A kept generation result

mod project;
mod prompt;
mod record;
mod saved_output;

pub use project::*;
pub use prompt::*;
pub use record::*;
pub use saved_output::*;
