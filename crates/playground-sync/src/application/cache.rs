//! Local cache of one record type
//!
//! An ordered sequence unique by identifier. Lookups are linear scans;
//! libraries are user-authored and small.

use std::cmp::Ordering;

use uuid::Uuid;

use playground::Record;

#[derive(Debug, Clone)]
pub struct RecordCache<T> {
    records: Vec<T>,
}

impl<T> Default for RecordCache<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T: Record> RecordCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find_by_id(&self, id: Uuid) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn filter<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.records.iter().filter(|&r| predicate(r)).cloned().collect()
    }

    /// Replace the record with the same id in place, else append.
    /// Returns whether a record was replaced.
    pub fn upsert(&mut self, record: T) -> bool {
        match self.records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => {
                *existing = record;
                true
            }
            None => {
                self.records.push(record);
                false
            }
        }
    }

    /// Replace in place only if the id is already cached
    pub fn replace(&mut self, record: T) -> bool {
        match self.records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => {
                *existing = record;
                true
            }
            None => false,
        }
    }

    /// Move or insert the record to the front
    pub fn insert_front(&mut self, record: T) {
        self.records.retain(|r| r.id() != record.id());
        self.records.insert(0, record);
    }

    pub fn remove(&mut self, id: Uuid) -> Option<T> {
        let index = self.records.iter().position(|r| r.id() == id)?;
        Some(self.records.remove(index))
    }

    /// Remove every matching record and return them
    pub fn remove_where<P>(&mut self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        let (removed, kept): (Vec<T>, Vec<T>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|r| predicate(r));
        self.records = kept;
        removed
    }

    /// Swap in a fetched sequence; later duplicates of an id are dropped
    pub fn replace_all(&mut self, records: Vec<T>) {
        let mut unique: Vec<T> = Vec::with_capacity(records.len());
        for record in records {
            if !unique.iter().any(|r| r.id() == record.id()) {
                unique.push(record);
            }
        }
        self.records = unique;
    }

    /// Stable sort
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.records.sort_by(compare);
    }
}
