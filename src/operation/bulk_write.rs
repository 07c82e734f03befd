mod server_responses;

#[cfg(test)]
mod test;

use crate::{
    batch::Batch,
    bson::{rawdoc, RawDocumentBuf},
    bson_util,
    cluster::{Command, Namespace},
    error::{Error, Result, WriteError},
    operation::{check_command_ok, Operation},
    options::BulkWriteOptions,
    results::BulkWriteResult,
};

use server_responses::*;

/// The database every bulkWrite command is run against.
const ADMIN_DB: &str = "admin";

/// A single batch of a bulk write, sent as one bulkWrite command.
pub(crate) struct BulkWriteBatch<'a> {
    namespace: &'a Namespace,
    options: &'a BulkWriteOptions,
    batch: &'a Batch,
}

impl<'a> BulkWriteBatch<'a> {
    pub(crate) fn new(
        namespace: &'a Namespace,
        options: &'a BulkWriteOptions,
        batch: &'a Batch,
    ) -> Self {
        Self {
            namespace,
            options,
            batch,
        }
    }

    /// Converts a batch-relative index reported by the server into the index of the operation in
    /// append order.
    fn global_index(&self, index: usize) -> Result<usize> {
        if index >= self.batch.len() {
            return Err(Error::invalid_response(format!(
                "operation index {} is out of range for a batch of {} operations",
                index,
                self.batch.len()
            )));
        }
        Ok(self.batch.offset + index)
    }
}

impl Operation for BulkWriteBatch<'_> {
    type O = BulkWriteResult;

    const NAME: &'static str = "bulkWrite";

    fn build(&mut self) -> Result<Command> {
        let mut command = rawdoc! {
            Self::NAME: 1,
            "ops": bson_util::vec_to_raw_array_buf(self.batch.ops.clone()),
            "nsInfo": [ { "ns": self.namespace.to_string() } ],
            "errorsOnly": false,
        };

        let options = crate::bson::to_raw_document_buf(self.options)?;
        bson_util::extend_raw_document_buf(&mut command, options)?;

        Ok(Command::new(Self::NAME, ADMIN_DB, command))
    }

    fn handle_response(&self, response: RawDocumentBuf) -> Result<Self::O> {
        check_command_ok(&response)?;

        if !self.options.is_acknowledged() {
            return Ok(BulkWriteResult::new(false));
        }

        let response: Response =
            crate::bson::from_slice(response.as_bytes()).map_err(Error::invalid_response)?;
        if response.cursor.id != 0 {
            return Err(Error::invalid_response(
                "the results cursor was not exhausted by the transport",
            ));
        }

        let mut result = BulkWriteResult::new(true);
        result.populate_summary_info(&response.summary);

        for entry in response.cursor.first_batch {
            let SingleOperationResponse {
                index,
                result: operation_result,
            } = crate::bson::from_slice(entry.as_bytes()).map_err(Error::invalid_response)?;
            let index = self.global_index(index)?;

            match operation_result {
                SingleOperationResult::Error(error) => result.add_write_error(WriteError {
                    index,
                    code: error.code,
                    code_name: error.code_name,
                    message: error.message,
                    details: error.details,
                }),
                SingleOperationResult::Success {
                    upserted: Some(upserted),
                    ..
                } => result.add_upserted_id(index, upserted.id),
                SingleOperationResult::Success { upserted: None, .. } => {}
            }
        }

        if let Some(write_concern_error) = response.write_concern_error {
            result.add_write_concern_error(write_concern_error);
        }

        Ok(result)
    }
}
