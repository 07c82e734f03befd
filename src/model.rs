//! The write operations that can be appended to a bulk write.


use typed_builder::TypedBuilder;

use crate::{
    bson::{rawdoc, RawBson, RawDocumentBuf},
    bson_util::{array_entry_size_bytes, is_empty_document, vec_to_raw_array_buf},
    error::{Error, Result},
};

/// The index into the `nsInfo` array of the single namespace a bulk write targets.
const NAMESPACE_INDEX: i32 = 0;

/// Specifies the index to use for an operation.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Hint {
    /// Specifies the keys of the index to use.
    Keys(RawDocumentBuf),
    /// Specifies the name of the index to use.
    Name(String),
}

impl Hint {
    fn to_raw_bson(&self) -> RawBson {
        match self {
            Hint::Keys(ref keys) => RawBson::Document(keys.clone()),
            Hint::Name(ref name) => RawBson::String(name.clone()),
        }
    }
}

/// The modifications applied by an update operation.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum UpdateModifications {
    /// An update document containing update operators.
    Document(RawDocumentBuf),

    /// An aggregation pipeline. Only available on MongoDB 4.2+.
    Pipeline(Vec<RawDocumentBuf>),
}

impl UpdateModifications {
    fn validate(&self) -> Result<()> {
        match self {
            Self::Document(document) if is_empty_document(document) => {
                Err(Error::invalid_operation("update document must not be empty"))
            }
            Self::Pipeline(stages) if stages.is_empty() => {
                Err(Error::invalid_operation("update pipeline must not be empty"))
            }
            Self::Pipeline(stages) if stages.iter().any(is_empty_document) => Err(
                Error::invalid_operation("update pipeline stages must not be empty"),
            ),
            _ => Ok(()),
        }
    }

    /// The encoded size of the update document or of the pipeline array.
    fn size_bytes(&self) -> usize {
        match self {
            Self::Document(document) => document.as_bytes().len(),
            Self::Pipeline(stages) => {
                // length prefix, entries, and trailing null byte
                4 + stages
                    .iter()
                    .enumerate()
                    .map(|(i, stage)| array_entry_size_bytes(i, stage.as_bytes().len()))
                    .sum::<usize>()
                    + 1
            }
        }
    }

    fn to_raw_bson(&self) -> RawBson {
        match self {
            Self::Document(document) => RawBson::Document(document.clone()),
            Self::Pipeline(stages) => RawBson::Array(vec_to_raw_array_buf(stages.clone())),
        }
    }
}

impl From<RawDocumentBuf> for UpdateModifications {
    fn from(document: RawDocumentBuf) -> Self {
        Self::Document(document)
    }
}

impl From<Vec<RawDocumentBuf>> for UpdateModifications {
    fn from(stages: Vec<RawDocumentBuf>) -> Self {
        Self::Pipeline(stages)
    }
}

/// Inserts a single document.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
#[non_exhaustive]
pub struct InsertOneModel {
    /// The document to insert.
    pub document: RawDocumentBuf,
}

/// Updates a single document matching `filter`.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
#[non_exhaustive]
pub struct UpdateOneModel {
    /// The filter to use to select the document to update.
    pub filter: RawDocumentBuf,

    /// The update document or pipeline to apply.
    #[builder(setter(into))]
    pub update: UpdateModifications,

    /// Filters determining which array elements to modify for an update on an array field.
    #[builder(default, setter(strip_option))]
    pub array_filters: Option<Vec<RawDocumentBuf>>,

    /// The collation to use when matching documents.
    #[builder(default, setter(strip_option))]
    pub collation: Option<RawDocumentBuf>,

    /// The index to use for the filter.
    #[builder(default, setter(strip_option))]
    pub hint: Option<Hint>,

    /// Whether a new document should be inserted if no document matches the filter.
    #[builder(default, setter(strip_option))]
    pub upsert: Option<bool>,
}

/// Updates every document matching `filter`.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
#[non_exhaustive]
pub struct UpdateManyModel {
    /// The filter to use to select the documents to update.
    pub filter: RawDocumentBuf,

    /// The update document or pipeline to apply.
    #[builder(setter(into))]
    pub update: UpdateModifications,

    /// Filters determining which array elements to modify for an update on an array field.
    #[builder(default, setter(strip_option))]
    pub array_filters: Option<Vec<RawDocumentBuf>>,

    /// The collation to use when matching documents.
    #[builder(default, setter(strip_option))]
    pub collation: Option<RawDocumentBuf>,

    /// The index to use for the filter.
    #[builder(default, setter(strip_option))]
    pub hint: Option<Hint>,

    /// Whether a new document should be inserted if no document matches the filter.
    #[builder(default, setter(strip_option))]
    pub upsert: Option<bool>,
}

/// Replaces a single document matching `filter`.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
#[non_exhaustive]
pub struct ReplaceOneModel {
    /// The filter to use to select the document to replace.
    pub filter: RawDocumentBuf,

    /// The replacement document.
    pub replacement: RawDocumentBuf,

    /// The collation to use when matching documents.
    #[builder(default, setter(strip_option))]
    pub collation: Option<RawDocumentBuf>,

    /// The index to use for the filter.
    #[builder(default, setter(strip_option))]
    pub hint: Option<Hint>,

    /// Whether the replacement should be inserted if no document matches the filter.
    #[builder(default, setter(strip_option))]
    pub upsert: Option<bool>,
}

/// Deletes a single document matching `filter`.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
#[non_exhaustive]
pub struct DeleteOneModel {
    /// The filter to use to select the document to delete.
    pub filter: RawDocumentBuf,

    /// The collation to use when matching documents.
    #[builder(default, setter(strip_option))]
    pub collation: Option<RawDocumentBuf>,

    /// The index to use for the filter.
    #[builder(default, setter(strip_option))]
    pub hint: Option<Hint>,
}

/// Deletes every document matching `filter`.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
#[non_exhaustive]
pub struct DeleteManyModel {
    /// The filter to use to select the documents to delete.
    pub filter: RawDocumentBuf,

    /// The collation to use when matching documents.
    #[builder(default, setter(strip_option))]
    pub collation: Option<RawDocumentBuf>,

    /// The index to use for the filter.
    #[builder(default, setter(strip_option))]
    pub hint: Option<Hint>,
}

/// A single write operation within a bulk write.
///
/// Documents are supplied already encoded; they are only checked for emptiness and are otherwise
/// forwarded to the server untouched.
#[derive(Clone, Debug, PartialEq, derive_more::From)]
#[non_exhaustive]
pub enum WriteModel {
    /// See [`InsertOneModel`].
    InsertOne(InsertOneModel),
    /// See [`UpdateOneModel`].
    UpdateOne(UpdateOneModel),
    /// See [`UpdateManyModel`].
    UpdateMany(UpdateManyModel),
    /// See [`ReplaceOneModel`].
    ReplaceOne(ReplaceOneModel),
    /// See [`DeleteOneModel`].
    DeleteOne(DeleteOneModel),
    /// See [`DeleteManyModel`].
    DeleteMany(DeleteManyModel),
}

pub(crate) enum OperationType {
    Insert,
    Update,
    Delete,
}

impl WriteModel {
    pub(crate) fn operation_type(&self) -> OperationType {
        match self {
            Self::InsertOne(_) => OperationType::Insert,
            Self::UpdateOne(_) | Self::UpdateMany(_) | Self::ReplaceOne(_) => {
                OperationType::Update
            }
            Self::DeleteOne(_) | Self::DeleteMany(_) => OperationType::Delete,
        }
    }

    /// Whether this operation should apply to all documents that match the filter. Returns None if
    /// the operation does not use a filter.
    pub(crate) fn multi(&self) -> Option<bool> {
        match self {
            Self::UpdateMany(_) | Self::DeleteMany(_) => Some(true),
            Self::UpdateOne(_) | Self::ReplaceOne(_) | Self::DeleteOne(_) => Some(false),
            Self::InsertOne(_) => None,
        }
    }

    pub(crate) fn operation_name(&self) -> &'static str {
        match self.operation_type() {
            OperationType::Insert => "insert",
            OperationType::Update => "update",
            OperationType::Delete => "delete",
        }
    }

    /// Checks that every document this operation requires is present and non-empty. Filters may
    /// be empty, in which case they match every document.
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::InsertOne(model) if is_empty_document(&model.document) => {
                Err(Error::invalid_operation("insert document must not be empty"))
            }
            Self::UpdateOne(UpdateOneModel {
                update,
                array_filters,
                ..
            })
            | Self::UpdateMany(UpdateManyModel {
                update,
                array_filters,
                ..
            }) => {
                update.validate()?;
                if let Some(array_filters) = array_filters {
                    if array_filters.iter().any(is_empty_document) {
                        return Err(Error::invalid_operation(
                            "array filters must not be empty documents",
                        ));
                    }
                }
                Ok(())
            }
            Self::ReplaceOne(model) if is_empty_document(&model.replacement) => Err(
                Error::invalid_operation("replacement document must not be empty"),
            ),
            _ => Ok(()),
        }
    }

    /// The encoded size of the largest document this operation carries: its filter, its insert or
    /// replacement document, or its update modifications. This is what the server's maximum
    /// document size applies to.
    pub(crate) fn max_document_size_bytes(&self) -> usize {
        match self {
            Self::InsertOne(model) => model.document.as_bytes().len(),
            Self::UpdateOne(UpdateOneModel { filter, update, .. })
            | Self::UpdateMany(UpdateManyModel { filter, update, .. }) => {
                filter.as_bytes().len().max(update.size_bytes())
            }
            Self::ReplaceOne(model) => model
                .filter
                .as_bytes()
                .len()
                .max(model.replacement.as_bytes().len()),
            Self::DeleteOne(DeleteOneModel { filter, .. })
            | Self::DeleteMany(DeleteManyModel { filter, .. }) => filter.as_bytes().len(),
        }
    }

    /// Returns this operation's entry in the `ops` array of a `bulkWrite` command.
    pub(crate) fn to_ops_document(&self) -> RawDocumentBuf {
        let mut entry = rawdoc! { self.operation_name(): NAMESPACE_INDEX };

        match self {
            Self::InsertOne(model) => {
                entry.append("document", model.document.clone());
            }
            Self::UpdateOne(UpdateOneModel {
                filter,
                update,
                array_filters,
                collation,
                hint,
                upsert,
            })
            | Self::UpdateMany(UpdateManyModel {
                filter,
                update,
                array_filters,
                collation,
                hint,
                upsert,
            }) => {
                entry.append("filter", filter.clone());
                entry.append("updateMods", update.to_raw_bson());
                if let Some(array_filters) = array_filters {
                    entry.append("arrayFilters", vec_to_raw_array_buf(array_filters.clone()));
                }
                append_filter_options(&mut entry, collation, hint);
                if let Some(upsert) = upsert {
                    entry.append("upsert", *upsert);
                }
            }
            Self::ReplaceOne(ReplaceOneModel {
                filter,
                replacement,
                collation,
                hint,
                upsert,
            }) => {
                entry.append("filter", filter.clone());
                entry.append("updateMods", replacement.clone());
                append_filter_options(&mut entry, collation, hint);
                if let Some(upsert) = upsert {
                    entry.append("upsert", *upsert);
                }
            }
            Self::DeleteOne(DeleteOneModel {
                filter,
                collation,
                hint,
            })
            | Self::DeleteMany(DeleteManyModel {
                filter,
                collation,
                hint,
            }) => {
                entry.append("filter", filter.clone());
                append_filter_options(&mut entry, collation, hint);
            }
        }

        if let Some(multi) = self.multi() {
            entry.append("multi", multi);
        }

        entry
    }
}

fn append_filter_options(
    entry: &mut RawDocumentBuf,
    collation: &Option<RawDocumentBuf>,
    hint: &Option<Hint>,
) {
    if let Some(collation) = collation {
        entry.append("collation", collation.clone());
    }
    if let Some(hint) = hint {
        entry.append("hint", hint.to_raw_bson());
    }
}
