//! RecordKind - The three persisted record types

use serde::{Deserialize, Serialize};

/// Record type discriminator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Prompt,
    Project,
    SavedOutput,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [
        RecordKind::Prompt,
        RecordKind::Project,
        RecordKind::SavedOutput,
    ];
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Prompt => write!(f, "prompt"),
            RecordKind::Project => write!(f, "project"),
            RecordKind::SavedOutput => write!(f, "saved_output"),
        }
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prompt" => Ok(RecordKind::Prompt),
            "project" => Ok(RecordKind::Project),
            "saved_output" => Ok(RecordKind::SavedOutput),
            _ => Err(format!("Unknown record kind: {}", s)),
        }
    }
}
