//! Contains the options for bulk writes and re-exports the option types used by write models.

use serde::Serialize;
use serde_with::skip_serializing_none;
use typed_builder::TypedBuilder;

use crate::{
    bson::{Bson, Document},
    serde_util::{serialize_bool_or_true, write_concern_is_empty},
};

pub use crate::{
    cluster::{ServerAddress, ServerLimits},
    concern::{Acknowledgment, WriteConcern},
    model::{
        DeleteManyModel,
        DeleteOneModel,
        Hint,
        InsertOneModel,
        ReplaceOneModel,
        UpdateManyModel,
        UpdateModifications,
        UpdateOneModel,
        WriteModel,
    },
};

/// Specifies the options to a [`BulkWrite`](crate::BulkWrite). The options are fixed when the bulk
/// write is constructed.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, TypedBuilder, Serialize)]
#[builder(field_defaults(default, setter(strip_option)))]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct BulkWriteOptions {
    /// Whether the operations should be performed in the order in which they were appended. If
    /// true, no further operations are attempted after one fails.
    ///
    /// Defaults to true.
    #[serialize_always]
    #[serde(serialize_with = "serialize_bool_or_true")]
    pub ordered: Option<bool>,

    /// Opt out of document-level validation.
    pub bypass_document_validation: Option<bool>,

    /// Tags the command sent for each batch with an arbitrary value that appears in server logs
    /// and profiling output.
    pub comment: Option<Bson>,

    /// Map of parameter names and values that can be referenced in filters and updates.
    #[serde(rename = "let")]
    pub let_vars: Option<Document>,

    /// The write concern for every batch of the bulk write.
    #[serde(skip_serializing_if = "write_concern_is_empty")]
    pub write_concern: Option<WriteConcern>,
}

impl BulkWriteOptions {
    pub(crate) fn is_ordered(&self) -> bool {
        self.ordered.unwrap_or(true)
    }

    pub(crate) fn is_acknowledged(&self) -> bool {
        self.write_concern
            .as_ref()
            .map_or(true, WriteConcern::is_acknowledged)
    }
}
