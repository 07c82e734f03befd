use derive_more::Display;

use super::{ErrorKind, WriteConcernError, WriteError, DOCUMENT_TOO_LARGE_CODE};

/// The subsystem of the native driver that reported an error.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorDomain {
    Client,
    Stream,
    Protocol,
    Cursor,
    Query,
    Insert,
    Sasl,
    Bson,
    Matcher,
    Namespace,
    Command,
    Collection,
    Scram,
    ServerSelection,
    WriteConcern,
    Server,
}

impl ErrorDomain {
    /// Maps the native driver's numeric error domain onto an `ErrorDomain`. Unknown domains are
    /// treated as server-reported errors.
    pub fn from_raw(domain: u32) -> Self {
        match domain {
            1 => Self::Client,
            2 => Self::Stream,
            3 => Self::Protocol,
            4 => Self::Cursor,
            5 => Self::Query,
            6 => Self::Insert,
            7 => Self::Sasl,
            8 => Self::Bson,
            9 => Self::Matcher,
            10 => Self::Namespace,
            11 => Self::Command,
            12 => Self::Collection,
            14 => Self::Scram,
            15 => Self::ServerSelection,
            16 => Self::WriteConcern,
            _ => Self::Server,
        }
    }
}

/// Native error codes that translate to something other than the default for their domain.
pub(crate) mod codes {
    pub(crate) const CLIENT_NOT_READY: i32 = 7;
    pub(crate) const CLIENT_TOO_BIG: i32 = 8;
    pub(crate) const CLIENT_IN_EXHAUST: i32 = 13;
    pub(crate) const BSON_INVALID: i32 = 18;
    pub(crate) const COMMAND_INVALID_ARG: i32 = 22;
}

/// An error reported by the native driver underneath this crate, identified by a
/// `(domain, code)` pair. Transports convert these into [`Error`]s with `?` or `into()`.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct NativeError {
    pub domain: ErrorDomain,
    pub code: i32,
    pub message: String,
    /// Index of the operation the error refers to, when the native driver reported one.
    pub index: Option<usize>,
}

impl NativeError {
    /// Creates a `NativeError` that is not associated with any operation.
    pub fn new(domain: ErrorDomain, code: i32, message: impl Into<String>) -> Self {
        Self {
            domain,
            code,
            message: message.into(),
            index: None,
        }
    }

    /// Associates this error with the operation at `index`.
    pub fn at_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

impl From<NativeError> for ErrorKind {
    fn from(err: NativeError) -> Self {
        let NativeError {
            domain,
            code,
            message,
            index,
        } = err;

        match (domain, code) {
            (ErrorDomain::Client, codes::CLIENT_TOO_BIG)
            | (ErrorDomain::Bson, codes::BSON_INVALID) => {
                ErrorKind::DocumentTooLarge { message, index }
            }
            (ErrorDomain::Client, codes::CLIENT_NOT_READY | codes::CLIENT_IN_EXHAUST)
            | (ErrorDomain::Cursor, _) => ErrorKind::Logic { message },
            (ErrorDomain::Command, codes::COMMAND_INVALID_ARG)
            | (ErrorDomain::Namespace, _)
            | (ErrorDomain::Matcher, _) => ErrorKind::InvalidOperation { message },
            (ErrorDomain::WriteConcern, _) => ErrorKind::WriteConcern(WriteConcernError {
                code,
                code_name: String::new(),
                message,
                details: None,
                labels: Vec::new(),
            }),
            (
                ErrorDomain::Server
                | ErrorDomain::Collection
                | ErrorDomain::Insert
                | ErrorDomain::Query
                | ErrorDomain::Command,
                _,
            ) => match index {
                Some(index) => WriteError {
                    index,
                    code,
                    code_name: None,
                    message,
                    details: None,
                }
                .into(),
                None => ErrorKind::Operation {
                    message,
                    code: Some(code),
                },
            },
            (
                ErrorDomain::Client
                | ErrorDomain::Stream
                | ErrorDomain::Protocol
                | ErrorDomain::Sasl
                | ErrorDomain::Scram
                | ErrorDomain::ServerSelection
                | ErrorDomain::Bson,
                _,
            ) => ErrorKind::Operation {
                message: format!("{} error: {}", domain, message),
                code: Some(code),
            },
        }
    }
}

impl From<WriteError> for ErrorKind {
    fn from(err: WriteError) -> Self {
        if err.code == DOCUMENT_TOO_LARGE_CODE {
            ErrorKind::DocumentTooLarge {
                message: format!("operation {}: {}", err.index, err.message),
                index: Some(err.index),
            }
        } else {
            ErrorKind::Write(err)
        }
    }
}

impl From<WriteConcernError> for ErrorKind {
    fn from(err: WriteConcernError) -> Self {
        ErrorKind::WriteConcern(err)
    }
}
