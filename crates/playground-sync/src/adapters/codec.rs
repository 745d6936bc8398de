//! Remote record codec
//!
//! Maps records to and from the remote database's flat field layout.
//! Booleans travel as 0/1, optional references as a string or nothing.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use playground::{
    DomainError, FieldValue, GenerationParameters, Project, Prompt, Record, RecordKind,
    RemoteRecord, SavedOutput, SortDescriptor,
};

/// Conversion between a record and its remote representation
pub trait RecordCodec: Record + Sized {
    /// Record type name in the remote database
    const RECORD_TYPE: &'static str;

    /// Order `fetch_all` returns this type in
    fn sort_descriptor() -> SortDescriptor;

    fn encode(&self) -> RemoteRecord;

    fn decode(record: &RemoteRecord) -> Result<Self, DomainError>;
}

/// Typed field access that reports which field was bad
struct Fields<'a> {
    record: &'a RemoteRecord,
    kind: RecordKind,
}

impl<'a> Fields<'a> {
    fn new(record: &'a RemoteRecord, kind: RecordKind) -> Self {
        Self { record, kind }
    }

    fn missing(&self, key: &str) -> DomainError {
        DomainError::decode(self.kind, format!("missing or mistyped field '{}'", key))
    }

    fn string(&self, key: &str) -> Result<String, DomainError> {
        self.record
            .get(key)
            .and_then(FieldValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| self.missing(key))
    }

    fn uuid(&self, key: &str) -> Result<Uuid, DomainError> {
        let raw = self.string(key)?;
        Uuid::parse_str(&raw)
            .map_err(|e| DomainError::decode(self.kind, format!("field '{}': {}", key, e)))
    }

    fn optional_uuid(&self, key: &str) -> Result<Option<Uuid>, DomainError> {
        match self.record.get(key) {
            None => Ok(None),
            Some(_) => self.uuid(key).map(Some),
        }
    }

    fn double(&self, key: &str) -> Result<f64, DomainError> {
        self.record
            .get(key)
            .and_then(FieldValue::as_double)
            .ok_or_else(|| self.missing(key))
    }

    fn int(&self, key: &str) -> Result<i64, DomainError> {
        self.record
            .get(key)
            .and_then(FieldValue::as_int)
            .ok_or_else(|| self.missing(key))
    }

    fn positive_u32(&self, key: &str) -> Result<u32, DomainError> {
        let value = self.int(key)?;
        u32::try_from(value)
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                DomainError::decode(self.kind, format!("field '{}' out of range: {}", key, value))
            })
    }

    fn flag(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.int(key)? == 1)
    }

    fn optional_flag(&self, key: &str) -> Result<bool, DomainError> {
        match self.record.get(key) {
            None => Ok(false),
            Some(_) => self.flag(key),
        }
    }

    fn date(&self, key: &str) -> Result<DateTime<Utc>, DomainError> {
        self.record
            .get(key)
            .and_then(FieldValue::as_date)
            .ok_or_else(|| self.missing(key))
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>, DomainError> {
        match self.record.get(key) {
            None => Ok(Vec::new()),
            Some(value) => value
                .as_string_list()
                .map(<[String]>::to_vec)
                .ok_or_else(|| self.missing(key)),
        }
    }
}

/// A record that decodes but breaks a record invariant counts as malformed
fn invalid(kind: RecordKind, err: DomainError) -> DomainError {
    match err {
        DomainError::Validation(reason) => DomainError::decode(kind, reason),
        other => other,
    }
}

fn flag(value: bool) -> FieldValue {
    FieldValue::Int(if value { 1 } else { 0 })
}

impl RecordCodec for Prompt {
    const RECORD_TYPE: &'static str = "PromptModel";

    fn sort_descriptor() -> SortDescriptor {
        SortDescriptor::descending("modifiedAt")
    }

    fn encode(&self) -> RemoteRecord {
        let mut record = RemoteRecord::new(Self::RECORD_TYPE, self.remote_ref.clone());
        record.set("id", FieldValue::String(self.id.to_string()));
        record.set("title", FieldValue::String(self.title.clone()));
        record.set("systemPrompt", FieldValue::String(self.system_text.clone()));
        record.set("userPrompt", FieldValue::String(self.user_text.clone()));
        record.set("temperature", FieldValue::Double(self.temperature));
        record.set("maxTokens", FieldValue::Int(i64::from(self.max_tokens)));
        record.set("tags", FieldValue::StringList(self.tags.clone()));
        if let Some(project_id) = self.project_id {
            record.set("projectID", FieldValue::String(project_id.to_string()));
        }
        record.set("isFavorite", flag(self.is_favorite));
        record.set("createdAt", FieldValue::Date(self.created_at));
        record.set("modifiedAt", FieldValue::Date(self.modified_at));
        record
    }

    fn decode(record: &RemoteRecord) -> Result<Self, DomainError> {
        let f = Fields::new(record, RecordKind::Prompt);
        let prompt = Prompt {
            id: f.uuid("id")?,
            title: f.string("title")?,
            system_text: f.string("systemPrompt")?,
            user_text: f.string("userPrompt")?,
            temperature: f.double("temperature")?,
            max_tokens: f.positive_u32("maxTokens")?,
            tags: f.string_list("tags")?,
            project_id: f.optional_uuid("projectID")?,
            is_favorite: f.optional_flag("isFavorite")?,
            created_at: f.date("createdAt")?,
            modified_at: f.date("modifiedAt")?,
            remote_ref: record.handle.clone(),
        };
        prompt
            .validate()
            .map_err(|e| invalid(RecordKind::Prompt, e))?;
        Ok(prompt)
    }
}

impl RecordCodec for Project {
    const RECORD_TYPE: &'static str = "ProjectModel";

    fn sort_descriptor() -> SortDescriptor {
        SortDescriptor::ascending("name")
    }

    fn encode(&self) -> RemoteRecord {
        let mut record = RemoteRecord::new(Self::RECORD_TYPE, self.remote_ref.clone());
        record.set("id", FieldValue::String(self.id.to_string()));
        record.set("name", FieldValue::String(self.name.clone()));
        record.set("description", FieldValue::String(self.description.clone()));
        record.set("color", FieldValue::String(self.color.clone()));
        record.set("createdAt", FieldValue::Date(self.created_at));
        record.set("modifiedAt", FieldValue::Date(self.modified_at));
        record
    }

    fn decode(record: &RemoteRecord) -> Result<Self, DomainError> {
        let f = Fields::new(record, RecordKind::Project);
        let project = Project {
            id: f.uuid("id")?,
            name: f.string("name")?,
            description: f.string("description")?,
            color: f.string("color")?,
            created_at: f.date("createdAt")?,
            modified_at: f.date("modifiedAt")?,
            remote_ref: record.handle.clone(),
        };
        project
            .validate()
            .map_err(|e| invalid(RecordKind::Project, e))?;
        Ok(project)
    }
}

impl RecordCodec for SavedOutput {
    const RECORD_TYPE: &'static str = "SavedOutputModel";

    fn sort_descriptor() -> SortDescriptor {
        SortDescriptor::descending("createdAt")
    }

    fn encode(&self) -> RemoteRecord {
        let mut record = RemoteRecord::new(Self::RECORD_TYPE, self.remote_ref.clone());
        record.set("id", FieldValue::String(self.id.to_string()));
        record.set("promptID", FieldValue::String(self.prompt_id.to_string()));
        record.set("output", FieldValue::String(self.output_text.clone()));
        record.set(
            "systemPrompt",
            FieldValue::String(self.parameters.system_text.clone()),
        );
        record.set(
            "userPrompt",
            FieldValue::String(self.parameters.user_text.clone()),
        );
        record.set("temperature", FieldValue::Double(self.parameters.temperature));
        record.set(
            "maxTokens",
            FieldValue::Int(i64::from(self.parameters.max_tokens)),
        );
        // 0 stands for "not reported"
        record.set(
            "actualTokensUsed",
            FieldValue::Int(i64::from(self.actual_tokens_used.unwrap_or(0))),
        );
        record.set("isFavorite", flag(self.is_favorite));
        record.set("createdAt", FieldValue::Date(self.created_at));
        record.set("notes", FieldValue::String(self.notes.clone()));
        record
    }

    fn decode(record: &RemoteRecord) -> Result<Self, DomainError> {
        let f = Fields::new(record, RecordKind::SavedOutput);
        let tokens = f.int("actualTokensUsed")?;
        let output = SavedOutput {
            id: f.uuid("id")?,
            prompt_id: f.uuid("promptID")?,
            output_text: f.string("output")?,
            parameters: GenerationParameters {
                system_text: f.string("systemPrompt")?,
                user_text: f.string("userPrompt")?,
                temperature: f.double("temperature")?,
                max_tokens: f.positive_u32("maxTokens")?,
            },
            actual_tokens_used: u32::try_from(tokens).ok().filter(|t| *t > 0),
            is_favorite: f.flag("isFavorite")?,
            created_at: f.date("createdAt")?,
            notes: f.string("notes")?,
            remote_ref: record.handle.clone(),
        };
        output
            .parameters
            .validate()
            .map_err(|e| invalid(RecordKind::SavedOutput, e))?;
        Ok(output)
    }
}
