pub(crate) mod bulk_write;

use serde::Deserialize;

use crate::{
    bson::{RawBsonRef, RawDocument, RawDocumentBuf},
    cluster::Command,
    error::{Error, ErrorKind, Result},
};

pub(crate) use bulk_write::BulkWriteBatch;

/// A trait modeling the behavior of a server side operation.
pub(crate) trait Operation {
    /// The output type of this operation.
    type O;

    /// The name of the server side command associated with this operation.
    const NAME: &'static str;

    /// Returns the command that should be sent to the server as part of this operation.
    fn build(&mut self) -> Result<Command>;

    /// Interprets the server response to the command.
    fn handle_response(&self, response: RawDocumentBuf) -> Result<Self::O>;
}

/// The body of a reply to a command that the server rejected as a whole.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommandErrorBody {
    #[serde(default)]
    pub(crate) code: Option<i32>,

    #[serde(default)]
    pub(crate) code_name: Option<String>,

    #[serde(rename = "errmsg", default)]
    pub(crate) message: String,
}

impl From<CommandErrorBody> for Error {
    fn from(body: CommandErrorBody) -> Error {
        let message = match body.code_name {
            Some(code_name) => format!("command failed ({}): {}", code_name, body.message),
            None => format!("command failed: {}", body.message),
        };
        ErrorKind::Operation {
            message,
            code: body.code,
        }
        .into()
    }
}

/// Returns an error if the reply reports that the command failed.
pub(crate) fn check_command_ok(response: &RawDocument) -> Result<()> {
    let ok = match response.get("ok").map_err(Error::invalid_response)? {
        Some(RawBsonRef::Double(ok)) => ok != 0.0,
        Some(RawBsonRef::Int32(ok)) => ok != 0,
        Some(RawBsonRef::Int64(ok)) => ok != 0,
        Some(RawBsonRef::Boolean(ok)) => ok,
        Some(other) => {
            return Err(Error::invalid_response(format!(
                "expected \"ok\" to be a number, got {:?}",
                other.element_type()
            )))
        }
        None => return Err(Error::invalid_response("missing \"ok\" field")),
    };

    if ok {
        return Ok(());
    }

    let body: CommandErrorBody =
        crate::bson::from_slice(response.as_bytes()).map_err(Error::invalid_response)?;
    Err(body.into())
}
