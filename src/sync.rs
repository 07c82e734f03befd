//! Contains the sync API. This is only available when the `sync` feature is enabled.


use crate::{
    bson::{Bson, Document},
    bulk_write::{BulkWrite as AsyncBulkWrite, ExecutionState},
    cluster::{Cluster, Collection as AsyncCollection, Namespace},
    error::Result,
    options::{BulkWriteOptions, WriteConcern, WriteModel},
    results::BulkWriteResult,
};

pub(crate) static TOKIO_RUNTIME: once_cell::sync::Lazy<tokio::runtime::Runtime> =
    once_cell::sync::Lazy::new(|| match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => panic!(
            "Error occurred when starting the underlying async runtime: {}",
            err
        ),
    });

/// A blocking handle to a collection. Wraps an async [`Collection`](crate::Collection).
#[derive(Clone, Debug)]
pub struct Collection {
    async_collection: AsyncCollection,
}

impl Collection {
    /// Creates a handle for `namespace` on `cluster`.
    pub fn new(cluster: Cluster, namespace: Namespace) -> Self {
        Self {
            async_collection: AsyncCollection::new(cluster, namespace),
        }
    }

    /// The namespace of this collection.
    pub fn namespace(&self) -> &Namespace {
        self.async_collection.namespace()
    }

    /// Starts a blocking bulk write against this collection.
    pub fn bulk_write(&self, options: impl Into<Option<BulkWriteOptions>>) -> BulkWrite {
        BulkWrite {
            async_bulk_write: self.async_collection.bulk_write(options),
        }
    }
}

impl From<AsyncCollection> for Collection {
    fn from(async_collection: AsyncCollection) -> Self {
        Self { async_collection }
    }
}

/// A blocking bulk write. Wraps an async [`BulkWrite`](crate::BulkWrite); see its documentation
/// for the semantics of each method.
///
/// [`execute`](BulkWrite::execute) drives the bulk write to completion on a runtime shared by all
/// blocking handles, and must not be called from within an async context.
#[must_use]
#[derive(Debug)]
pub struct BulkWrite {
    async_bulk_write: AsyncBulkWrite,
}

impl BulkWrite {
    /// Creates an empty bulk write against `namespace`.
    pub fn new(
        cluster: Cluster,
        namespace: Namespace,
        options: impl Into<Option<BulkWriteOptions>>,
    ) -> Self {
        Self {
            async_bulk_write: AsyncBulkWrite::new(cluster, namespace, options),
        }
    }

    /// Whether the operations should be performed in the order in which they were appended.
    pub fn ordered(self, value: bool) -> Self {
        self.map(|bulk| bulk.ordered(value))
    }

    /// Opt out of document-level validation.
    pub fn bypass_document_validation(self, value: bool) -> Self {
        self.map(|bulk| bulk.bypass_document_validation(value))
    }

    /// Tags each command sent for this bulk write with an arbitrary value.
    pub fn comment(self, value: Bson) -> Self {
        self.map(|bulk| bulk.comment(value))
    }

    /// Parameter names and values that can be referenced in filters and updates.
    pub fn let_vars(self, value: Document) -> Self {
        self.map(|bulk| bulk.let_vars(value))
    }

    /// The write concern for every batch of this bulk write.
    pub fn write_concern(self, value: WriteConcern) -> Self {
        self.map(|bulk| bulk.write_concern(value))
    }

    fn map(self, f: impl FnOnce(AsyncBulkWrite) -> AsyncBulkWrite) -> Self {
        Self {
            async_bulk_write: f(self.async_bulk_write),
        }
    }

    /// Appends an operation, validating it first.
    pub fn append(&mut self, model: impl Into<WriteModel>) -> Result<()> {
        self.async_bulk_write.append(model)
    }

    /// Appends each operation in turn, stopping at the first one that fails to append.
    pub fn append_all(
        &mut self,
        models: impl IntoIterator<Item = impl Into<WriteModel>>,
    ) -> Result<()> {
        self.async_bulk_write.append_all(models)
    }

    /// The number of operations appended.
    pub fn len(&self) -> usize {
        self.async_bulk_write.len()
    }

    /// Whether no operations have been appended.
    pub fn is_empty(&self) -> bool {
        self.async_bulk_write.is_empty()
    }

    /// The current state of this bulk write.
    pub fn state(&self) -> ExecutionState {
        self.async_bulk_write.state()
    }

    /// Whether the operations will be performed in append order, stopping at the first failure.
    pub fn is_ordered(&self) -> bool {
        self.async_bulk_write.is_ordered()
    }

    /// Sends every appended operation to the server and blocks until the combined result is
    /// available.
    pub fn execute(&mut self) -> Result<BulkWriteResult> {
        TOKIO_RUNTIME.block_on(self.async_bulk_write.execute())
    }
}
