use crate::cookies::Record;
use std::fmt::Debug;
use std::sync::Arc;

/// An immutable version of a manager collection.
///
/// Snapshots are cheap to take (one reference count bump) and never change
/// after they have been taken; later stores publish a new version instead.
pub struct Snapshot<R> {
    records: Arc<Vec<Arc<R>>>,
}

impl<R: Record> Snapshot<R> {
    pub(crate) fn new(records: Arc<Vec<Arc<R>>>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record by name.
    pub fn get(&self, name: &str) -> Option<&Arc<R>> {
        self.records.iter().find(|r| r.name() == name)
    }

    /// Position of the record called `name` in collection order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.name() == name)
    }

    /// Iterates the records in collection order.
    pub fn iter(&self) -> impl Iterator<Item = &R> + '_ {
        self.records.iter().map(|r| r.as_ref())
    }

    /// Record names in collection order.
    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name()).collect()
    }

    pub fn as_slice(&self) -> &[Arc<R>] {
        &self.records
    }
}

impl<R> Clone for Snapshot<R> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
        }
    }
}

impl<R: Debug> Debug for Snapshot<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.records.iter()).finish()
    }
}

impl<'a, R> IntoIterator for &'a Snapshot<R> {
    type Item = &'a Arc<R>;
    type IntoIter = std::slice::Iter<'a, Arc<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
