//! Splits the operations of a bulk write into batches that fit within a server's limits.


use std::iter::FusedIterator;

use crate::{
    bson::RawDocumentBuf,
    bson_util::array_entry_size_bytes,
    cluster::ServerLimits,
    model::WriteModel,
};

/// The number of bytes reserved in each batch for the command fields surrounding the `ops`
/// array.
pub(crate) const COMMAND_OVERHEAD_SIZE: usize = 16_000;

/// A contiguous run of operations sent to the server as a single command.
#[derive(Debug, PartialEq)]
pub(crate) struct Batch {
    /// The index of the first operation of this batch in append order.
    pub(crate) offset: usize,

    /// The encoded `ops` array entries, one per operation.
    pub(crate) ops: Vec<RawDocumentBuf>,

    /// The encoded size of the `ops` array entries.
    pub(crate) size_bytes: usize,
}

impl Batch {
    pub(crate) fn len(&self) -> usize {
        self.ops.len()
    }
}

/// A unit of work produced by a [`BatchSplitter`].
#[derive(Debug, PartialEq)]
pub(crate) enum PlannedBatch {
    /// Operations to send to the server.
    Batch(Batch),

    /// An operation carrying a document larger than the maximum document size, which must not
    /// be sent. `size_bytes` is the size of that document.
    Oversized { index: usize, size_bytes: usize },
}

/// Lazily splits operations into batches in append order.
///
/// Operations are packed greedily: a batch is closed once adding the next operation would exceed
/// either the server's maximum batch size or the byte budget for the `ops` array. An operation
/// larger than the byte budget whose documents are within the maximum document size is sent in a
/// batch of its own.
pub(crate) struct BatchSplitter<'a> {
    models: &'a [WriteModel],
    max_count: usize,
    max_bytes: usize,
    max_document_size: usize,
    next_index: usize,
    /// The encoded entry for `models[next_index]`, if it was encoded while closing the previous
    /// batch.
    pending: Option<RawDocumentBuf>,
}

impl<'a> BatchSplitter<'a> {
    pub(crate) fn new(models: &'a [WriteModel], limits: &ServerLimits) -> Self {
        let max_payload = limits
            .max_bson_object_size
            .min(limits.max_message_size_bytes);

        Self {
            models,
            max_count: limits.max_write_batch_size.max(1),
            max_bytes: max_payload.saturating_sub(COMMAND_OVERHEAD_SIZE),
            max_document_size: limits.max_bson_object_size,
            next_index: 0,
            pending: None,
        }
    }

    fn take_entry(&mut self) -> RawDocumentBuf {
        match self.pending.take() {
            Some(entry) => entry,
            None => self.models[self.next_index].to_ops_document(),
        }
    }
}

impl Iterator for BatchSplitter<'_> {
    type Item = PlannedBatch;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.next_index;
        let mut ops = Vec::new();
        let mut size_bytes = 0;

        while self.next_index < self.models.len() && ops.len() < self.max_count {
            let document_size = self.models[self.next_index].max_document_size_bytes();
            if document_size > self.max_document_size {
                if ops.is_empty() {
                    self.next_index += 1;
                    return Some(PlannedBatch::Oversized {
                        index: offset,
                        size_bytes: document_size,
                    });
                }
                // Close the current batch first so that the oversized operation keeps its
                // position in the sequence.
                break;
            }

            let entry = self.take_entry();
            let entry_size = array_entry_size_bytes(ops.len(), entry.as_bytes().len());
            if !ops.is_empty() && size_bytes + entry_size > self.max_bytes {
                self.pending = Some(entry);
                break;
            }

            ops.push(entry);
            size_bytes += entry_size;
            self.next_index += 1;
        }

        if ops.is_empty() {
            return None;
        }

        Some(PlannedBatch::Batch(Batch {
            offset,
            ops,
            size_bytes,
        }))
    }
}

impl FusedIterator for BatchSplitter<'_> {}
