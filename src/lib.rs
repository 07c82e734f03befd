//! This crate contains the bulk write core of a MongoDB client: it accumulates heterogeneous write
//! operations, splits them into batches that fit within a server's limits, sends each batch as a
//! `bulkWrite` command, and folds the replies into a single [`results::BulkWriteResult`]. It uses
//! the [`bson`] crate for BSON support.
//!
//! Connection management, authentication, topology discovery, and document encoding are left to
//! the embedding driver, which supplies them through the [`Topology`] and [`Transport`] traits.
//! Documents are passed in already encoded as [`bson::RawDocumentBuf`]s and are forwarded to the
//! server untouched.
//!
//! # Feature flags
//!
//! | Feature | Description                                                                   | Extra dependencies | Default |
//! |:--------|:------------------------------------------------------------------------------|:-------------------|:--------|
//! | `sync`  | Expose the blocking API (`mongodb_bulk_write::sync`), backed by a tokio runtime. | `tokio`, `once_cell` | no      |
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use futures_util::future::{BoxFuture, FutureExt};
//! use mongodb_bulk_write::{
//!     bson::{rawdoc, RawDocumentBuf},
//!     error::Result,
//!     options::{DeleteOneModel, InsertOneModel, ServerAddress, ServerLimits, UpdateOneModel},
//!     Cluster,
//!     Command,
//!     SelectedServer,
//!     Topology,
//!     Transport,
//! };
//!
//! struct SingleServer;
//!
//! impl Topology for SingleServer {
//!     fn select_server(&self) -> BoxFuture<'_, Result<SelectedServer>> {
//!         let server =
//!             SelectedServer::new(ServerAddress::new("localhost", 27017), ServerLimits::default());
//!         async move { Ok(server) }.boxed()
//!     }
//! }
//!
//! struct Connection;
//!
//! impl Transport for Connection {
//!     fn send_command<'a>(
//!         &'a self,
//!         server: &'a SelectedServer,
//!         command: Command,
//!     ) -> BoxFuture<'a, Result<RawDocumentBuf>> {
//!         async move {
//!             // Send `command.body` to the `command.target_db` database on `server.address`
//!             // and return the reply with its results cursor drained into `firstBatch`.
//!             # let _ = (server, command);
//!             # Ok(RawDocumentBuf::new())
//!         }
//!         .boxed()
//!     }
//! }
//!
//! # async fn run() -> Result<()> {
//! let cluster = Cluster::new(Arc::new(SingleServer), Arc::new(Connection));
//! let mut bulk = cluster.collection("shop", "orders").bulk_write(None);
//!
//! bulk.append(InsertOneModel::builder().document(rawdoc! { "_id": 1, "qty": 5 }).build())?;
//! bulk.append(
//!     UpdateOneModel::builder()
//!         .filter(rawdoc! { "_id": 1 })
//!         .update(rawdoc! { "$inc": { "qty": 1 } })
//!         .build(),
//! )?;
//! bulk.append(DeleteOneModel::builder().filter(rawdoc! { "qty": 0 }).build())?;
//!
//! let result = bulk.execute().await?;
//! for error in &result.write_errors {
//!     println!("operation {} failed: {}", error.index, error.message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Tracing
//!
//! Bulk write progress, server selection, and every command sent are reported as `tracing`
//! events at the debug level under the `mongodb_bulk_write::bulk_write`,
//! `mongodb_bulk_write::server_selection`, and `mongodb_bulk_write::command` targets.

#![warn(missing_docs)]
#![cfg_attr(docsrs, warn(rustdoc::missing_crate_level_docs))]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod options;

pub use ::bson;

mod batch;
mod bson_util;
mod bulk_write;
mod cluster;
mod concern;
pub mod error;
mod model;
mod operation;
pub mod results;
mod serde_util;
#[cfg(feature = "sync")]
#[cfg_attr(docsrs, doc(cfg(feature = "sync")))]
pub mod sync;
mod trace;

pub use crate::{
    bulk_write::{BulkWrite, ExecutionState},
    cluster::{
        Cluster,
        Collection,
        Command,
        Namespace,
        SelectedServer,
        Topology,
        Transport,
        DEFAULT_MAX_BSON_OBJECT_SIZE,
        DEFAULT_MAX_MESSAGE_SIZE_BYTES,
        DEFAULT_MAX_WRITE_BATCH_SIZE,
    },
};
