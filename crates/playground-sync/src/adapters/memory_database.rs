//! In-memory record database
//!
//! Stands in for the managed remote database during local development and
//! in tests: handles are assigned on first save, saves overwrite whole
//! records (last write wins), queries sort by a single field.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use playground::{
    AccountStatus, DomainError, FieldValue, RecordDatabase, RemoteRecord, RemoteRef,
    SortDescriptor,
};

pub struct InMemoryRecordDatabase {
    records: RwLock<Vec<RemoteRecord>>,
    status: RwLock<AccountStatus>,
    fail_writes: AtomicBool,
    next_handle: AtomicU64,
}

impl InMemoryRecordDatabase {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            status: RwLock::new(AccountStatus::Available),
            fail_writes: AtomicBool::new(false),
            next_handle: AtomicU64::new(1),
        }
    }

    pub async fn set_account_status(&self, status: AccountStatus) {
        *self.status.write().await = status;
    }

    /// Make every save/delete fail as if the network dropped
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, AtomicOrdering::SeqCst);
    }

    /// Store a record as-is, bypassing validation; returns its handle
    pub async fn insert_raw(&self, mut record: RemoteRecord) -> RemoteRef {
        let handle = self.allocate_handle();
        record.handle = Some(handle.clone());
        self.records.write().await.push(record);
        handle
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn allocate_handle(&self) -> RemoteRef {
        let n = self.next_handle.fetch_add(1, AtomicOrdering::SeqCst);
        RemoteRef::new(format!("rec-{:06}", n))
    }

    async fn check_writable(&self) -> Result<(), DomainError> {
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            return Err(DomainError::RemoteWrite("network connection lost".to_string()));
        }
        let status = *self.status.read().await;
        if status != AccountStatus::Available {
            return Err(DomainError::RemoteWrite(format!(
                "account not available ({:?})",
                status
            )));
        }
        Ok(())
    }
}

impl Default for InMemoryRecordDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Missing values sort after present ones regardless of direction
fn compare_field(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (Some(FieldValue::String(x)), Some(FieldValue::String(y))) => x.cmp(y),
        (Some(FieldValue::Date(x)), Some(FieldValue::Date(y))) => x.cmp(y),
        (Some(x), Some(y)) => match (x.as_double(), y.as_double()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl RecordDatabase for InMemoryRecordDatabase {
    async fn account_status(&self) -> Result<AccountStatus, DomainError> {
        Ok(*self.status.read().await)
    }

    async fn query(
        &self,
        record_type: &str,
        sort: &SortDescriptor,
    ) -> Result<Vec<RemoteRecord>, DomainError> {
        let status = *self.status.read().await;
        if status != AccountStatus::Available {
            return Err(DomainError::RemoteUnavailable(format!(
                "account not available ({:?})",
                status
            )));
        }

        let mut matching: Vec<RemoteRecord> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.record_type == record_type)
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let (fa, fb) = (a.get(&sort.key), b.get(&sort.key));
            match (fa.is_some(), fb.is_some()) {
                (true, true) if !sort.ascending => compare_field(fb, fa),
                _ => compare_field(fa, fb),
            }
        });

        Ok(matching)
    }

    async fn save(&self, mut record: RemoteRecord) -> Result<RemoteRecord, DomainError> {
        self.check_writable().await?;

        let mut records = self.records.write().await;
        match record.handle.clone() {
            Some(handle) => {
                match records.iter_mut().find(|r| r.handle.as_ref() == Some(&handle)) {
                    Some(existing) => *existing = record.clone(),
                    None => records.push(record.clone()),
                }
            }
            None => {
                record.handle = Some(self.allocate_handle());
                records.push(record.clone());
            }
        }

        tracing::debug!(
            "Saved {} record {:?}",
            record.record_type,
            record.handle.as_ref().map(RemoteRef::as_str)
        );
        Ok(record)
    }

    async fn delete(&self, handle: &RemoteRef) -> Result<(), DomainError> {
        self.check_writable().await?;

        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.handle.as_ref() != Some(handle));
        if records.len() == before {
            return Err(DomainError::RemoteWrite(format!(
                "record {} does not exist",
                handle
            )));
        }
        Ok(())
    }
}
