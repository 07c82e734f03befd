//! Contains the `Error` and `Result` types that `mongodb_bulk_write` uses.

mod translate;


use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::{bson::Document, results::BulkWriteResult};

pub use translate::{ErrorDomain, NativeError};
#[cfg(test)]
pub(crate) use translate::codes;

/// The server error code reported when a document exceeds the maximum BSON object size.
pub const DOCUMENT_TOO_LARGE_CODE: i32 = 10334;

pub(crate) const DOCUMENT_TOO_LARGE_CODE_NAME: &str = "BSONObjectTooLarge";

/// The result type for all methods that can return an error in the `mongodb_bulk_write` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in the `mongodb_bulk_write` crate. The inner
/// [`ErrorKind`](enum.ErrorKind.html) is boxed to keep `Result`s small.
#[derive(Clone, Debug, Error)]
#[error("{kind}")]
#[non_exhaustive]
pub struct Error {
    /// The type of error that occurred.
    pub kind: Box<ErrorKind>,
    partial_result: Option<Box<BulkWriteResult>>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
            partial_result: None,
        }
    }

    pub(crate) fn invalid_operation(message: impl Into<String>) -> Self {
        ErrorKind::InvalidOperation {
            message: message.into(),
        }
        .into()
    }

    pub(crate) fn logic(message: impl Into<String>) -> Self {
        ErrorKind::Logic {
            message: message.into(),
        }
        .into()
    }

    pub(crate) fn operation(message: impl Into<String>) -> Self {
        ErrorKind::Operation {
            message: message.into(),
            code: None,
        }
        .into()
    }

    pub(crate) fn invalid_response(message: impl fmt::Display) -> Self {
        Self::operation(format!("invalid server reply: {}", message))
    }

    /// The results of the batches that completed before this error aborted a bulk write, if any
    /// batch completed.
    pub fn partial_result(&self) -> Option<&BulkWriteResult> {
        self.partial_result.as_deref()
    }

    pub(crate) fn with_partial_result(mut self, result: BulkWriteResult) -> Self {
        self.partial_result = Some(Box::new(result));
        self
    }

    /// Whether this error aborted an entire operation rather than a single document.
    pub fn is_fatal(&self) -> bool {
        matches!(*self.kind, ErrorKind::Operation { .. } | ErrorKind::Logic { .. })
    }

    /// Whether this error reports API misuse.
    pub fn is_logic_error(&self) -> bool {
        matches!(*self.kind, ErrorKind::Logic { .. })
    }

    /// The server or native error code carried by this error, if any.
    pub fn code(&self) -> Option<i32> {
        match *self.kind {
            ErrorKind::Write(ref write_error) => Some(write_error.code),
            ErrorKind::WriteConcern(ref write_concern_error) => Some(write_concern_error.code),
            ErrorKind::Operation { code, .. } => code,
            _ => None,
        }
    }
}

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    fn from(err: E) -> Self {
        Self::new(err.into())
    }
}

impl std::ops::Deref for Error {
    type Target = ErrorKind;

    fn deref(&self) -> &Self::Target {
        &self.kind
    }
}

impl From<crate::bson::raw::Error> for ErrorKind {
    fn from(err: crate::bson::raw::Error) -> Self {
        Self::InvalidOperation {
            message: format!("malformed encoded document: {}", err),
        }
    }
}

impl From<crate::bson::ser::Error> for ErrorKind {
    fn from(err: crate::bson::ser::Error) -> Self {
        Self::InvalidOperation {
            message: format!("failed to encode options: {}", err),
        }
    }
}

impl From<crate::bson::de::Error> for ErrorKind {
    fn from(err: crate::bson::de::Error) -> Self {
        Self::Operation {
            message: format!("invalid server reply: {}", err),
            code: None,
        }
    }
}

/// The types of errors that can occur.
#[allow(missing_docs)]
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A write operation was malformed when appended. The caller may correct it and append
    /// again.
    #[error("Invalid write operation: {message}")]
    #[non_exhaustive]
    InvalidOperation { message: String },

    /// An operation cannot fit in any batch sent to the server.
    #[error("Document too large: {message}")]
    #[non_exhaustive]
    DocumentTooLarge {
        message: String,
        /// Index of the offending operation, when known.
        index: Option<usize>,
    },

    /// The bulk write API was misused, e.g. executed twice or executed with no operations.
    #[error("Logic error: {message}")]
    #[non_exhaustive]
    Logic { message: String },

    /// The server rejected a single document of a bulk write.
    #[error("An error occurred when trying to execute a write operation: {0}")]
    Write(WriteError),

    /// The server applied a write but could not satisfy the requested write concern.
    #[error("An error occurred when trying to satisfy a write concern: {0}")]
    WriteConcern(WriteConcernError),

    /// The operation failed to send or receive a reply, or the server rejected the whole
    /// command.
    #[error("A database operation failed to send or receive a reply: {message}")]
    #[non_exhaustive]
    Operation { message: String, code: Option<i32> },
}

/// An error reported by the server for a single operation within a bulk write.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct WriteError {
    /// Index of the operation this error corresponds to, in append order.
    pub index: usize,

    /// Identifies the type of write error.
    pub code: i32,

    /// The name associated with the error code.
    ///
    /// Note that the server will not return this in some cases, hence `code_name` being an
    /// `Option`.
    pub code_name: Option<String>,

    /// A description of the error that occurred.
    pub message: String,

    /// A document providing more information about the write error (e.g. details
    /// pertaining to document validation).
    pub details: Option<Document>,
}

impl WriteError {
    pub(crate) fn document_too_large(index: usize, size: usize, max_size: usize) -> Self {
        Self {
            index,
            code: DOCUMENT_TOO_LARGE_CODE,
            code_name: Some(DOCUMENT_TOO_LARGE_CODE_NAME.to_string()),
            message: format!(
                "document is {} bytes, which exceeds the maximum document size of {} bytes",
                size, max_size
            ),
            details: None,
        }
    }

    /// Whether this error reports a document exceeding the maximum document size.
    pub fn is_document_too_large(&self) -> bool {
        self.code == DOCUMENT_TOO_LARGE_CODE
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self.code_name {
            Some(ref code_name) => write!(
                fmt,
                "operation {}: ({}) {}",
                self.index, code_name, self.message
            ),
            None => write!(fmt, "operation {}: ({}) {}", self.index, self.code, self.message),
        }
    }
}

/// An error that occurred due to not being able to satisfy a write concern.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[non_exhaustive]
pub struct WriteConcernError {
    /// Identifies the type of write concern error.
    pub code: i32,

    /// The name associated with the error code.
    #[serde(rename = "codeName", default)]
    pub code_name: String,

    /// A description of the error that occurred.
    #[serde(rename = "errmsg", default)]
    pub message: String,

    /// A document identifying the write concern setting related to the error.
    #[serde(rename = "errInfo")]
    pub details: Option<Document>,

    /// The error labels that the server returned.
    #[serde(rename = "errorLabels", default)]
    pub labels: Vec<String>,
}

impl fmt::Display for WriteConcernError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "({}): {}", self.code_name, self.message)
    }
}
