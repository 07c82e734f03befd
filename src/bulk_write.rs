//! Contains the [`BulkWrite`] handle, which accumulates write operations and dispatches them to a
//! server in batches.

use crate::{
    batch::{Batch, BatchSplitter, PlannedBatch},
    bson::{Bson, Document},
    cluster::{Cluster, Namespace},
    error::{
        Error,
        ErrorKind,
        Result,
        WriteError,
        DOCUMENT_TOO_LARGE_CODE,
        DOCUMENT_TOO_LARGE_CODE_NAME,
    },
    operation::BulkWriteBatch,
    options::{BulkWriteOptions, WriteConcern, WriteModel},
    results::BulkWriteResult,
    trace::{TracingRepresentation, BULK_WRITE_TRACING_EVENT_TARGET},
};

macro_rules! option_setters {
    (
        $opt_field:ident: $opt_field_ty:ty;
        $(
            $(#[$($attrss:tt)*])*
            $opt_name:ident: $opt_ty:ty,
        )+
    ) => {
        $(
            $(#[$($attrss)*])*
            pub fn $opt_name(mut self, value: $opt_ty) -> Self {
                self.$opt_field.$opt_name = Some(value);
                self
            }
        )+
    };
}

/// The lifecycle of a [`BulkWrite`]. A bulk write dispatches at most once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExecutionState {
    /// Operations may be appended and the bulk write has not been executed.
    Idle,

    /// Batches are being sent to the server.
    Dispatching,

    /// Every batch that was due to be sent completed.
    Completed,

    /// Dispatch stopped on an error that aborted the bulk write.
    Aborted,
}

/// Accumulates write operations against a single collection and executes them as a bulk write.
///
/// Operations are appended in order and assigned sequential indexes, which every index in the
/// [`BulkWriteResult`] refers to. [`execute`](BulkWrite::execute) splits the operations into
/// batches that fit within the limits of the selected server and sends them one at a time.
///
/// ```no_run
/// # use mongodb_bulk_write::{bson::rawdoc, options::InsertOneModel, Collection, error::Result};
/// # async fn run(collection: Collection) -> Result<()> {
/// let mut bulk = collection.bulk_write(None).ordered(false);
/// bulk.append(InsertOneModel::builder().document(rawdoc! { "x": 1 }).build())?;
/// bulk.append(InsertOneModel::builder().document(rawdoc! { "x": 2 }).build())?;
///
/// let result = bulk.execute().await?;
/// assert_eq!(result.inserted_count, 2);
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug)]
pub struct BulkWrite {
    cluster: Cluster,
    namespace: Namespace,
    options: BulkWriteOptions,
    models: Vec<WriteModel>,
    state: ExecutionState,
}

impl BulkWrite {
    /// Creates an empty bulk write against `namespace`.
    pub fn new(
        cluster: Cluster,
        namespace: Namespace,
        options: impl Into<Option<BulkWriteOptions>>,
    ) -> Self {
        Self {
            cluster,
            namespace,
            options: options.into().unwrap_or_default(),
            models: Vec::new(),
            state: ExecutionState::Idle,
        }
    }

    option_setters!(options: BulkWriteOptions;
        /// Whether the operations should be performed in the order in which they were appended.
        /// Defaults to true.
        ordered: bool,
        /// Opt out of document-level validation.
        bypass_document_validation: bool,
        /// Tags each command sent for this bulk write with an arbitrary value.
        comment: Bson,
        /// Parameter names and values that can be referenced in filters and updates.
        let_vars: Document,
        /// The write concern for every batch of this bulk write.
        write_concern: WriteConcern,
    );

    /// Appends an operation, validating it first. The operation is assigned the next index.
    ///
    /// Returns an [`ErrorKind::InvalidOperation`](crate::error::ErrorKind::InvalidOperation)
    /// error if a required document is empty, leaving the bulk write unchanged, or an
    /// [`ErrorKind::Logic`](crate::error::ErrorKind::Logic) error if the bulk write has already
    /// been executed.
    pub fn append(&mut self, model: impl Into<WriteModel>) -> Result<()> {
        if self.state != ExecutionState::Idle {
            return Err(Error::logic("bulk write already executed"));
        }

        let model = model.into();
        model.validate()?;
        self.models.push(model);
        Ok(())
    }

    /// Appends each operation in turn, stopping at the first one that fails to append. The
    /// operations before it remain appended.
    pub fn append_all(
        &mut self,
        models: impl IntoIterator<Item = impl Into<WriteModel>>,
    ) -> Result<()> {
        for model in models {
            self.append(model)?;
        }
        Ok(())
    }

    /// The number of operations appended.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no operations have been appended.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// The current state of this bulk write.
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Whether the operations will be performed in append order, stopping at the first failure.
    pub fn is_ordered(&self) -> bool {
        self.options.is_ordered()
    }

    /// The namespace this bulk write targets.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Sends every appended operation to the server and returns the combined result.
    ///
    /// Operations the server rejects individually are reported in
    /// [`BulkWriteResult::write_errors`] rather than as an `Err`. When ordered, no operation after
    /// the first rejected one is sent. An error that prevents a batch from completing, such as a
    /// network failure, aborts the bulk write; the results of the batches that already completed
    /// are available from [`Error::partial_result`].
    ///
    /// A bulk write can only be executed once. Executing a bulk write with no operations, or
    /// executing one a second time, returns an
    /// [`ErrorKind::Logic`](crate::error::ErrorKind::Logic) error without contacting the server.
    pub async fn execute(&mut self) -> Result<BulkWriteResult> {
        self.check_executable()?;

        self.state = ExecutionState::Dispatching;
        tracing::debug!(
            target: BULK_WRITE_TRACING_EVENT_TARGET,
            namespace = %self.namespace,
            operations = self.models.len(),
            ordered = self.is_ordered(),
            "Bulk write started"
        );

        let outcome = self.dispatch().await;

        match outcome {
            Ok(ref result) => {
                self.state = ExecutionState::Completed;
                tracing::debug!(
                    target: BULK_WRITE_TRACING_EVENT_TARGET,
                    namespace = %self.namespace,
                    insertedCount = result.inserted_count,
                    matchedCount = result.matched_count,
                    modifiedCount = result.modified_count,
                    deletedCount = result.deleted_count,
                    upsertedCount = result.upserted_count,
                    writeErrors = result.write_errors.len(),
                    writeConcernErrors = result.write_concern_errors.len(),
                    "Bulk write completed"
                );
            }
            Err(ref error) => {
                self.state = ExecutionState::Aborted;
                tracing::debug!(
                    target: BULK_WRITE_TRACING_EVENT_TARGET,
                    namespace = %self.namespace,
                    failure = error.tracing_representation(),
                    partialResult = error.partial_result().is_some(),
                    "Bulk write aborted"
                );
            }
        }

        outcome
    }

    /// Checks that run before any network activity. A failure leaves the bulk write idle.
    fn check_executable(&self) -> Result<()> {
        if self.state != ExecutionState::Idle {
            return Err(Error::logic("bulk write already executed"));
        }
        if self.models.is_empty() {
            return Err(Error::logic(
                "cannot execute a bulk write with no operations",
            ));
        }
        if let Some(ref write_concern) = self.options.write_concern {
            write_concern.validate()?;
        }
        if self.is_ordered() && !self.options.is_acknowledged() {
            return Err(Error::logic(
                "cannot execute an ordered bulk write with an unacknowledged write concern",
            ));
        }
        Ok(())
    }

    async fn dispatch(&self) -> Result<BulkWriteResult> {
        let server = self.cluster.select_server("bulkWrite").await?;
        let ordered = self.is_ordered();

        let mut result = BulkWriteResult::new(self.options.is_acknowledged());
        let mut has_partial_result = false;

        for planned in BatchSplitter::new(&self.models, &server.limits) {
            match planned {
                PlannedBatch::Oversized { index, size_bytes } => {
                    tracing::debug!(
                        target: BULK_WRITE_TRACING_EVENT_TARGET,
                        index,
                        sizeBytes = size_bytes,
                        maxBsonObjectSize = server.limits.max_bson_object_size,
                        "Operation exceeds the maximum document size"
                    );
                    result.add_write_error(WriteError::document_too_large(
                        index,
                        size_bytes,
                        server.limits.max_bson_object_size,
                    ));
                    has_partial_result = true;
                }
                PlannedBatch::Batch(batch) => {
                    tracing::debug!(
                        target: BULK_WRITE_TRACING_EVENT_TARGET,
                        offset = batch.offset,
                        operations = batch.len(),
                        sizeBytes = batch.size_bytes,
                        "Dispatching batch"
                    );

                    let mut operation = BulkWriteBatch::new(&self.namespace, &self.options, &batch);
                    match self.cluster.execute_operation(&server, &mut operation).await {
                        Ok(batch_result) => {
                            result.merge(batch_result);
                            has_partial_result = true;
                        }
                        Err(error) => match record_batch_failure(&mut result, &batch, error) {
                            Ok(()) => has_partial_result = true,
                            Err(error) if has_partial_result => {
                                return Err(error.with_partial_result(result.finalize()));
                            }
                            Err(error) => return Err(error),
                        },
                    }
                }
            }

            if ordered && !result.write_errors.is_empty() {
                break;
            }
        }

        Ok(result.finalize())
    }
}

/// Records an error reported for individual operations of `batch` in `result`, translating any
/// batch-relative index into append order. Errors that abort the bulk write are returned.
fn record_batch_failure(
    result: &mut BulkWriteResult,
    batch: &Batch,
    error: Error,
) -> Result<()> {
    let global_index = |index: usize| {
        if index < batch.len() {
            Ok(batch.offset + index)
        } else {
            Err(Error::invalid_response(format!(
                "operation index {} is out of range for a batch of {} operations",
                index,
                batch.len()
            )))
        }
    };

    match *error.kind {
        ErrorKind::Write(ref write_error) => {
            let mut write_error = write_error.clone();
            write_error.index = global_index(write_error.index)?;
            result.add_write_error(write_error);
        }
        ErrorKind::WriteConcern(ref write_concern_error) => {
            result.add_write_concern_error(write_concern_error.clone());
        }
        ErrorKind::DocumentTooLarge { ref message, index } => {
            let index = match index {
                Some(index) => global_index(index)?,
                None if batch.len() == 1 => batch.offset,
                None => {
                    return Err(Error::operation(format!(
                        "a document in the batch starting at operation {} is too large: {}",
                        batch.offset, message
                    )))
                }
            };
            result.add_write_error(WriteError {
                index,
                code: DOCUMENT_TOO_LARGE_CODE,
                code_name: Some(DOCUMENT_TOO_LARGE_CODE_NAME.to_string()),
                message: message.clone(),
                details: None,
            });
        }
        _ => return Err(error),
    }

    tracing::debug!(
        target: BULK_WRITE_TRACING_EVENT_TARGET,
        offset = batch.offset,
        failure = error.tracing_representation(),
        "Recorded batch failure"
    );
    Ok(())
}
