//! Generic record table
//!
//! A `Table<R>` owns fixed-shape records of one kind in insertion order.
//! Ids come from a table-wide counter that only ever grows, so an id that
//! was deleted can never resolve to a different record later on. Because
//! records are only ever appended, they are also sorted by id, which keeps
//! lookups to a binary search.
//!
//! Each table carries one "current" mark: the record a command falls back
//! to when no explicit id is given.

use crate::error::{PitError, Result};
use tracing::debug;

/// A row that can live in a [`Table`].
pub trait Record {
    /// Human readable kind used in error messages ("project", "task").
    const KIND: &'static str;

    fn id(&self) -> i32;

    /// Called exactly once, by [`Table::insert`].
    fn assign_id(&mut self, id: i32);

    /// Sets both creation and modification timestamps.
    fn stamp(&mut self, now: &str);

    /// Bumps the modification timestamp.
    fn touch(&mut self, now: &str);
}

/// Current local time in the store's timestamp format.
pub fn timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table<R> {
    records: Vec<R>,
    last_id: i32,
    current_id: i32,
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Table<R> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            last_id: 0,
            current_id: 0,
        }
    }

    /// Rebuild a table from persisted state.
    ///
    /// Rejects anything the table itself could never have produced.
    pub fn restore(records: Vec<R>, last_id: i32, current_id: i32) -> Result<Self> {
        if last_id < 0 {
            return Err(PitError::Corrupt(format!(
                "{} counter is negative ({})",
                R::KIND,
                last_id
            )));
        }

        let mut previous = 0;
        for record in &records {
            let id = record.id();
            if id <= previous {
                return Err(PitError::Corrupt(format!(
                    "{} ids out of order or duplicated at {}",
                    R::KIND,
                    id
                )));
            }
            if id > last_id {
                return Err(PitError::Corrupt(format!(
                    "{} {} is above the id counter {}",
                    R::KIND,
                    id,
                    last_id
                )));
            }
            previous = id;
        }

        let table = Self {
            records,
            last_id,
            current_id,
        };
        if current_id != 0 && table.position(current_id).is_none() {
            return Err(PitError::Corrupt(format!(
                "current {} {} does not exist",
                R::KIND,
                current_id
            )));
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest id ever handed out, including deleted records.
    pub fn last_id(&self) -> i32 {
        self.last_id
    }

    /// 0 when nothing is marked.
    pub fn current_id(&self) -> i32 {
        self.current_id
    }

    fn position(&self, id: i32) -> Option<usize> {
        self.records.binary_search_by_key(&id, |r| r.id()).ok()
    }

    fn not_found(id: i32) -> PitError {
        PitError::NotFound { kind: R::KIND, id }
    }

    /// Append a record under the next unused id.
    ///
    /// Fails once the id counter is exhausted; ids are never wrapped or reused.
    pub fn insert(&mut self, mut record: R) -> Result<&mut R> {
        self.last_id = self.last_id.checked_add(1).ok_or_else(|| {
            PitError::Corrupt(format!("{} id space exhausted", R::KIND))
        })?;
        record.assign_id(self.last_id);
        record.stamp(&timestamp());
        debug!(kind = R::KIND, id = self.last_id, "inserted record");

        let index = self.records.len();
        self.records.push(record);
        Ok(&mut self.records[index])
    }

    pub fn contains(&self, id: i32) -> bool {
        self.position(id).is_some()
    }

    pub fn find(&self, id: i32) -> Result<&R> {
        self.position(id)
            .map(|i| &self.records[i])
            .ok_or_else(|| Self::not_found(id))
    }

    pub fn find_mut(&mut self, id: i32) -> Result<&mut R> {
        match self.position(id) {
            Some(i) => Ok(&mut self.records[i]),
            None => Err(Self::not_found(id)),
        }
    }

    /// Modify a record in place and bump its modification time.
    pub fn update<F>(&mut self, id: i32, f: F) -> Result<&R>
    where
        F: FnOnce(&mut R),
    {
        let record = self.find_mut(id)?;
        f(record);
        record.touch(&timestamp());
        Ok(&*record)
    }

    /// The marked record, if the mark is set and still resolves.
    pub fn current(&self) -> Result<&R> {
        if self.current_id == 0 {
            return Err(PitError::NoCurrent(R::KIND));
        }
        self.find(self.current_id)
            .map_err(|_| PitError::NoCurrent(R::KIND))
    }

    /// Mark a record as current; `mark(0)` clears the mark.
    pub fn mark(&mut self, id: i32) {
        self.current_id = id;
    }

    /// Resolve an explicit id, or fall back to the current mark.
    pub fn resolve(&self, id: Option<i32>) -> Result<i32> {
        match id {
            Some(id) => self.find(id).map(Record::id),
            None => self.current().map(Record::id),
        }
    }

    /// Remove a record. A mark pointing at it is cleared, not moved.
    pub fn delete(&mut self, id: i32) -> Result<R> {
        let index = self.position(id).ok_or_else(|| Self::not_found(id))?;
        let removed = self.records.remove(index);
        if self.current_id == id {
            self.current_id = 0;
        }
        debug!(kind = R::KIND, id, "deleted record");
        Ok(removed)
    }

    /// Records in insertion order. Every call starts a fresh pass.
    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }

    /// Ids of the records matching `predicate`, collected up front so the
    /// caller can delete them one by one.
    pub fn ids_where<P>(&self, predicate: P) -> Vec<i32>
    where
        P: Fn(&R) -> bool,
    {
        self.records
            .iter()
            .filter(|r| predicate(*r))
            .map(Record::id)
            .collect()
    }
}

impl<'a, R: Record> IntoIterator for &'a Table<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
