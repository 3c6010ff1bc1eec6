//! RecordStore - the in-memory state container.
//!
//! The store holds the ordered sequence of quote records and is the sole
//! owner of record identity. It performs no IO; callers persist through
//! their gateway after any mutating call.

use crate::{error::Result, Error, Record, RecordId, Timestamp};
use std::collections::HashMap;

/// Ordered collection of records with unique ids.
///
/// Records keep their insertion position for the whole lifetime of the
/// store; `upsert` overwrites in place so external references by position
/// stay valid.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    index: HashMap<RecordId, usize>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a persisted batch of records.
    ///
    /// The batch is validated as a whole: a duplicate id or an empty quote
    /// body rejects the entire batch and nothing is applied.
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let mut index = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            if record.text.is_empty() {
                return Err(Error::MalformedImport(format!(
                    "record '{}' has empty text",
                    record.id
                )));
            }
            if index.insert(record.id.clone(), pos).is_some() {
                return Err(Error::MalformedImport(format!(
                    "duplicate record id '{}'",
                    record.id
                )));
            }
        }
        Ok(Self { records, index })
    }

    /// Append a record. Fails if the id is already present or the text is
    /// empty; the store is unchanged on failure.
    pub fn add(&mut self, record: Record) -> Result<()> {
        if record.text.is_empty() {
            return Err(Error::EmptyText(record.id));
        }
        if self.index.contains_key(&record.id) {
            return Err(Error::DuplicateId(record.id));
        }
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Insert if the id is absent, otherwise overwrite all fields in place.
    ///
    /// The existing storage slot is reused, so the record keeps its
    /// position in the ordered sequence. Callers are responsible for the
    /// non-empty-text invariant on this path (the merge trusts the remote
    /// snapshot as authoritative).
    pub fn upsert(&mut self, record: Record) {
        match self.index.get(&record.id) {
            Some(&pos) => self.records[pos] = record,
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Get a record by id.
    pub fn find(&self, id: &str) -> Option<&Record> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    pub(crate) fn find_mut(&mut self, id: &str) -> Option<&mut Record> {
        let pos = *self.index.get(id)?;
        Some(&mut self.records[pos])
    }

    /// All records with `dirty = true`, in insertion order.
    pub fn list_dirty(&self) -> Vec<&Record> {
        self.records.iter().filter(|r| r.dirty).collect()
    }

    /// Count of records awaiting acknowledgment.
    pub fn dirty_count(&self) -> usize {
        self.records.iter().filter(|r| r.dirty).count()
    }

    /// The full ordered sequence.
    pub fn all(&self) -> &[Record] {
        &self.records
    }

    /// Number of records in the store.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Apply a local edit: rewrite text/category, mark dirty.
    pub fn edit(
        &mut self,
        id: &str,
        text: impl Into<String>,
        category: impl Into<String>,
        now: Timestamp,
    ) -> Result<()> {
        let text = text.into();
        if text.is_empty() {
            return Err(Error::EmptyText(id.to_string()));
        }
        let record = self
            .find_mut(id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        record.text = text;
        record.category = category.into();
        record.dirty = true;
        record.origin = crate::Origin::Local;
        record.updated_at = now;
        Ok(())
    }

    /// Apply a push acknowledgment: clear `dirty` and rename the record to
    /// the server-assigned identity, keeping its storage slot.
    ///
    /// Renaming onto an id that already names another record fails without
    /// touching the store; the caller decides whether to retry the push.
    pub fn acknowledge_push(&mut self, old_id: &str, new_id: &str) -> Result<()> {
        let pos = *self
            .index
            .get(old_id)
            .ok_or_else(|| Error::RecordNotFound(old_id.to_string()))?;

        if new_id != old_id {
            if self.index.contains_key(new_id) {
                return Err(Error::DuplicateId(new_id.to_string()));
            }
            self.index.remove(old_id);
            self.index.insert(new_id.to_string(), pos);
            self.records[pos].id = new_id.to_string();
        }
        self.records[pos].dirty = false;
        Ok(())
    }
}
