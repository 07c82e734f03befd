//! Contains the types of results returned by a bulk write.


use std::collections::BTreeMap;

use crate::{
    bson::Bson,
    error::{WriteConcernError, WriteError},
};

/// The result of a bulk write.
///
/// Every index in this result refers to the position at which the corresponding operation was
/// appended, regardless of how the operations were split into batches.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct BulkWriteResult {
    /// The number of documents inserted.
    pub inserted_count: i64,

    /// The number of documents matched by update and replace operations.
    pub matched_count: i64,

    /// The number of documents modified by update and replace operations.
    pub modified_count: i64,

    /// The number of documents deleted.
    pub deleted_count: i64,

    /// The number of documents upserted.
    pub upserted_count: i64,

    /// The `_id` of each upserted document, keyed by the index of the operation that upserted it.
    pub upserted_ids: BTreeMap<usize, Bson>,

    /// The operations that failed, in index order.
    pub write_errors: Vec<WriteError>,

    /// The write concern errors reported by the server, one per affected batch, in dispatch
    /// order.
    pub write_concern_errors: Vec<WriteConcernError>,

    /// Whether the server acknowledged the writes. Counts and per-operation results are not
    /// reported for unacknowledged writes.
    pub acknowledged: bool,
}

impl BulkWriteResult {
    pub(crate) fn new(acknowledged: bool) -> Self {
        Self {
            acknowledged,
            ..Default::default()
        }
    }

    /// Whether any operation failed or any write concern could not be satisfied.
    pub fn has_errors(&self) -> bool {
        !self.write_errors.is_empty() || !self.write_concern_errors.is_empty()
    }

    /// Folds the result of a later batch into this one.
    pub(crate) fn merge(&mut self, other: Self) {
        let BulkWriteResult {
            inserted_count,
            matched_count,
            modified_count,
            deleted_count,
            upserted_count,
            upserted_ids,
            write_errors,
            write_concern_errors,
            acknowledged: _,
        } = other;

        self.inserted_count += inserted_count;
        self.matched_count += matched_count;
        self.modified_count += modified_count;
        self.deleted_count += deleted_count;
        self.upserted_count += upserted_count;
        self.upserted_ids.extend(upserted_ids);
        self.write_errors.extend(write_errors);
        self.write_concern_errors.extend(write_concern_errors);
    }

    pub(crate) fn add_upserted_id(&mut self, index: usize, id: Bson) {
        self.upserted_ids.insert(index, id);
    }

    pub(crate) fn add_write_error(&mut self, error: WriteError) {
        self.write_errors.push(error);
    }

    pub(crate) fn add_write_concern_error(&mut self, error: WriteConcernError) {
        self.write_concern_errors.push(error);
    }

    /// Orders the write errors by index; the server does not guarantee the order of the entries
    /// in its results cursor.
    pub(crate) fn finalize(mut self) -> Self {
        self.write_errors.sort_by_key(|error| error.index);
        self
    }
}
