use serde::Deserialize;

use crate::{
    bson::{Bson, Document, RawDocumentBuf},
    error::WriteConcernError,
    results::BulkWriteResult,
};

/// The top-level response to the bulkWrite command.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Response {
    pub(super) cursor: CursorInfo,
    #[serde(flatten)]
    pub(super) summary: SummaryInfo,
    pub(super) write_concern_error: Option<WriteConcernError>,
}

/// The results cursor returned by the bulkWrite command. The transport drains any additional
/// batches into `first_batch`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CursorInfo {
    pub(super) id: i64,
    pub(super) first_batch: Vec<RawDocumentBuf>,
}

/// The summary information contained within the top-level response to the bulkWrite command.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SummaryInfo {
    pub(super) n_inserted: i64,
    pub(super) n_matched: i64,
    pub(super) n_modified: i64,
    pub(super) n_upserted: i64,
    pub(super) n_deleted: i64,
}

impl BulkWriteResult {
    pub(super) fn populate_summary_info(&mut self, summary_info: &SummaryInfo) {
        self.inserted_count += summary_info.n_inserted;
        self.upserted_count += summary_info.n_upserted;
        self.matched_count += summary_info.n_matched;
        self.modified_count += summary_info.n_modified;
        self.deleted_count += summary_info.n_deleted;
    }
}

/// The structure of the response for a single operation within the results cursor.
#[derive(Debug, Deserialize)]
pub(super) struct SingleOperationResponse {
    #[serde(rename = "idx")]
    pub(super) index: usize,
    #[serde(flatten)]
    pub(super) result: SingleOperationResult,
}

/// The structure of the non-index fields for a single operation within the results cursor.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum SingleOperationResult {
    // This variant must be listed first for proper deserialization.
    Error(OperationError),
    #[serde(rename_all = "camelCase")]
    Success {
        #[allow(dead_code)]
        n: u64,
        upserted: Option<UpsertedId>,
    },
}

/// A write error reported for a single operation, indexed relative to its batch.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OperationError {
    pub(super) code: i32,
    pub(super) code_name: Option<String>,
    #[serde(rename = "errmsg", default)]
    pub(super) message: String,
    #[serde(rename = "errInfo")]
    pub(super) details: Option<Document>,
}

/// The structure of the inserted ID for an upserted document.
#[derive(Debug, Deserialize)]
pub(super) struct UpsertedId {
    #[serde(rename = "_id")]
    pub(super) id: Bson,
}
