use crate::{
    bson::{Bson, Document, RawDocument},
    error::Error,
};

pub(crate) const BULK_WRITE_TRACING_EVENT_TARGET: &str = "mongodb_bulk_write::bulk_write";
pub(crate) const COMMAND_TRACING_EVENT_TARGET: &str = "mongodb_bulk_write::command";
pub(crate) const SERVER_SELECTION_TRACING_EVENT_TARGET: &str =
    "mongodb_bulk_write::server_selection";

/// The maximum length of a command or reply rendered into a tracing event.
pub(crate) const DEFAULT_MAX_DOCUMENT_LENGTH_BYTES: usize = 1000;

pub(crate) trait TracingRepresentation {
    type Representation;

    fn tracing_representation(&self) -> Self::Representation;
}

impl TracingRepresentation for RawDocument {
    type Representation = String;

    fn tracing_representation(&self) -> String {
        match Document::try_from(self) {
            Ok(document) => Bson::Document(document).into_relaxed_extjson().to_string(),
            Err(error) => format!("<malformed document: {}>", error),
        }
    }
}

impl TracingRepresentation for Error {
    type Representation = String;

    fn tracing_representation(&self) -> String {
        self.to_string()
    }
}

/// Renders a command or reply as relaxed extended JSON, truncated to at most
/// `max_length_bytes` bytes (rounded up to the next character boundary).
pub(crate) fn serialize_command_or_reply(doc: &RawDocument, max_length_bytes: usize) -> String {
    let mut serialized = doc.tracing_representation();
    truncate_on_char_boundary(&mut serialized, max_length_bytes);
    serialized
}

/// Truncates `s` to `new_len`, or to the next character boundary after it, and appends an
/// ellipsis if anything was removed.
pub(crate) fn truncate_on_char_boundary(s: &mut String, new_len: usize) {
    let original_len = s.len();
    if original_len > new_len {
        let mut truncate_index = new_len;
        while !s.is_char_boundary(truncate_index) {
            truncate_index += 1;
        }

        s.truncate(truncate_index);
        if s.len() < original_len {
            s.push_str("...");
        }
    }
}
