//! Record Database Port
//!
//! The managed remote record database as the client sees it: schema-less
//! records keyed by a server handle, sorted queries, last-write-wins saves.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{errors::DomainError, RemoteRef};

/// Primitive value stored in a remote record field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Double(f64),
    Date(DateTime<Utc>),
    StringList(Vec<String>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers are accepted where a double is expected
    pub fn as_double(&self) -> Option<f64> {
        match self {
            FieldValue::Double(d) => Some(*d),
            FieldValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_string_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::StringList(list) => Some(list),
            _ => None,
        }
    }
}

/// A flat record in the remote database
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRecord {
    pub record_type: String,
    /// Absent until the database has accepted the record
    pub handle: Option<RemoteRef>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl RemoteRecord {
    pub fn new(record_type: impl Into<String>, handle: Option<RemoteRef>) -> Self {
        Self {
            record_type: record_type.into(),
            handle,
            fields: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, key: &str, value: FieldValue) {
        self.fields.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }
}

/// Sort order for a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDescriptor {
    pub key: String,
    pub ascending: bool,
}

impl SortDescriptor {
    pub fn ascending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ascending: true,
        }
    }

    pub fn descending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ascending: false,
        }
    }
}

/// Account state of the database session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountStatus {
    #[default]
    CouldNotDetermine,
    Available,
    Restricted,
    NoAccount,
}

/// Managed remote record database
#[async_trait]
pub trait RecordDatabase: Send + Sync {
    async fn account_status(&self) -> Result<AccountStatus, DomainError>;

    /// All records of a type in the requested order
    async fn query(
        &self,
        record_type: &str,
        sort: &SortDescriptor,
    ) -> Result<Vec<RemoteRecord>, DomainError>;

    /// Insert (no handle) or overwrite (handle); returns the stored record
    async fn save(&self, record: RemoteRecord) -> Result<RemoteRecord, DomainError>;

    async fn delete(&self, handle: &RemoteRef) -> Result<(), DomainError>;
}
