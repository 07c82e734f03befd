//! The collaborators a bulk write is dispatched through: server selection, the transport that
//! exchanges commands with a server, and the namespace the writes target.

#[cfg(test)]
mod test;

use std::{fmt, sync::Arc, time::Instant};

use derive_more::Display;
use futures_util::future::BoxFuture;

use crate::{
    bson::RawDocumentBuf,
    bulk_write::BulkWrite,
    error::Result,
    operation::Operation,
    options::BulkWriteOptions,
    trace::{
        serialize_command_or_reply,
        TracingRepresentation,
        COMMAND_TRACING_EVENT_TARGET,
        DEFAULT_MAX_DOCUMENT_LENGTH_BYTES,
        SERVER_SELECTION_TRACING_EVENT_TARGET,
    },
};

/// The default maximum number of operations in a single batch, used when a server does not
/// advertise one.
pub const DEFAULT_MAX_WRITE_BATCH_SIZE: usize = 1000;

/// The default maximum size of a single BSON document.
pub const DEFAULT_MAX_BSON_OBJECT_SIZE: usize = 16 * 1024 * 1024;

/// The default maximum size of a single wire protocol message.
pub const DEFAULT_MAX_MESSAGE_SIZE_BYTES: usize = 48_000_000;

/// The address of a server.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash)]
#[display("{host}:{port}")]
#[non_exhaustive]
pub struct ServerAddress {
    /// The hostname or IP address where the server can be found.
    pub host: String,

    /// The TCP port that the server is listening on.
    pub port: u16,
}

impl ServerAddress {
    /// Creates a new address from a host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// The size limits a server advertises for write commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct ServerLimits {
    /// The maximum number of write operations permitted in a single batch.
    pub max_write_batch_size: usize,

    /// The maximum permitted size of a single document.
    pub max_bson_object_size: usize,

    /// The maximum permitted size of a single wire protocol message.
    pub max_message_size_bytes: usize,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            max_write_batch_size: DEFAULT_MAX_WRITE_BATCH_SIZE,
            max_bson_object_size: DEFAULT_MAX_BSON_OBJECT_SIZE,
            max_message_size_bytes: DEFAULT_MAX_MESSAGE_SIZE_BYTES,
        }
    }
}

impl ServerLimits {
    /// Builds limits from the values a server advertised, falling back to the defaults for any
    /// value that is unknown or not positive.
    pub fn from_advertised(
        max_write_batch_size: Option<i64>,
        max_bson_object_size: Option<i64>,
        max_message_size_bytes: Option<i64>,
    ) -> Self {
        fn positive(value: Option<i64>, default: usize) -> usize {
            value
                .filter(|value| *value > 0)
                .and_then(|value| usize::try_from(value).ok())
                .unwrap_or(default)
        }

        Self {
            max_write_batch_size: positive(max_write_batch_size, DEFAULT_MAX_WRITE_BATCH_SIZE),
            max_bson_object_size: positive(max_bson_object_size, DEFAULT_MAX_BSON_OBJECT_SIZE),
            max_message_size_bytes: positive(
                max_message_size_bytes,
                DEFAULT_MAX_MESSAGE_SIZE_BYTES,
            ),
        }
    }
}

/// A server chosen to receive the batches of one bulk write.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct SelectedServer {
    /// The address of the server.
    pub address: ServerAddress,

    /// The limits the server advertised.
    pub limits: ServerLimits,
}

impl SelectedServer {
    /// Creates a new `SelectedServer`.
    pub fn new(address: ServerAddress, limits: ServerLimits) -> Self {
        Self { address, limits }
    }
}

/// A command ready to be sent to a server.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Command {
    /// The name of the command.
    pub name: String,

    /// The database the command runs against.
    pub target_db: String,

    /// The encoded command body.
    pub body: RawDocumentBuf,
}

impl Command {
    pub(crate) fn new(
        name: impl Into<String>,
        target_db: impl Into<String>,
        body: RawDocumentBuf,
    ) -> Self {
        Self {
            name: name.into(),
            target_db: target_db.into(),
            body,
        }
    }
}

/// Selects the server that a bulk write is sent to.
pub trait Topology: Send + Sync {
    /// Selects a writable server. Called once per execution of a bulk write.
    fn select_server(&self) -> BoxFuture<'_, Result<SelectedServer>>;
}

/// Exchanges commands with a server.
///
/// Implementations own connection management, timeouts, and retry policy. A failure to deliver a
/// command or to receive its reply (including a timeout) must be returned as an error, which
/// aborts the bulk write. Any results cursor in the reply must be drained into
/// `cursor.firstBatch` before the reply is returned.
pub trait Transport: Send + Sync {
    /// Sends `command` to `server` and returns the server's reply.
    fn send_command<'a>(
        &'a self,
        server: &'a SelectedServer,
        command: Command,
    ) -> BoxFuture<'a, Result<RawDocumentBuf>>;
}

/// A handle to an open cluster: the topology used for server selection and the transport used to
/// reach the selected server. Cloning is cheap.
#[derive(Clone)]
pub struct Cluster {
    pub(crate) topology: Arc<dyn Topology>,
    pub(crate) transport: Arc<dyn Transport>,
}

impl Cluster {
    /// Creates a handle from its collaborators.
    pub fn new(topology: Arc<dyn Topology>, transport: Arc<dyn Transport>) -> Self {
        Self {
            topology,
            transport,
        }
    }

    /// Returns a handle to the collection `coll` in database `db`.
    pub fn collection(&self, db: impl Into<String>, coll: impl Into<String>) -> Collection {
        Collection::new(self.clone(), Namespace::new(db, coll))
    }
}

impl Cluster {
    pub(crate) async fn select_server(&self, operation_name: &str) -> Result<SelectedServer> {
        tracing::debug!(
            target: SERVER_SELECTION_TRACING_EVENT_TARGET,
            operation = operation_name,
            "Server selection started"
        );

        match self.topology.select_server().await {
            Ok(server) => {
                tracing::debug!(
                    target: SERVER_SELECTION_TRACING_EVENT_TARGET,
                    operation = operation_name,
                    serverHost = server.address.host.as_str(),
                    serverPort = server.address.port,
                    maxWriteBatchSize = server.limits.max_write_batch_size,
                    maxBsonObjectSize = server.limits.max_bson_object_size,
                    maxMessageSizeBytes = server.limits.max_message_size_bytes,
                    "Server selection succeeded"
                );
                Ok(server)
            }
            Err(error) => {
                tracing::debug!(
                    target: SERVER_SELECTION_TRACING_EVENT_TARGET,
                    operation = operation_name,
                    failure = error.tracing_representation(),
                    "Server selection failed"
                );
                Err(error)
            }
        }
    }

    /// Builds the command for `op`, sends it to `server`, and interprets the reply.
    pub(crate) async fn execute_operation<T: Operation>(
        &self,
        server: &SelectedServer,
        op: &mut T,
    ) -> Result<T::O> {
        let command = op.build()?;
        let command_name = command.name.clone();

        tracing::debug!(
            target: COMMAND_TRACING_EVENT_TARGET,
            command = serialize_command_or_reply(&command.body, DEFAULT_MAX_DOCUMENT_LENGTH_BYTES),
            databaseName = command.target_db.as_str(),
            commandName = command_name.as_str(),
            serverHost = server.address.host.as_str(),
            serverPort = server.address.port,
            "Command started"
        );

        let start = Instant::now();
        let reply = match self.transport.send_command(server, command).await {
            Ok(reply) => reply,
            Err(error) => {
                tracing::debug!(
                    target: COMMAND_TRACING_EVENT_TARGET,
                    failure = error.tracing_representation(),
                    commandName = command_name.as_str(),
                    serverHost = server.address.host.as_str(),
                    serverPort = server.address.port,
                    durationMS = start.elapsed().as_millis(),
                    "Command failed"
                );
                return Err(error);
            }
        };

        tracing::debug!(
            target: COMMAND_TRACING_EVENT_TARGET,
            reply = serialize_command_or_reply(&reply, DEFAULT_MAX_DOCUMENT_LENGTH_BYTES),
            commandName = command_name.as_str(),
            serverHost = server.address.host.as_str(),
            serverPort = server.address.port,
            durationMS = start.elapsed().as_millis(),
            "Command succeeded"
        );

        op.handle_response(reply)
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster").finish_non_exhaustive()
    }
}

/// A struct modeling the canonical name for a collection in MongoDB.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash)]
#[display("{db}.{coll}")]
pub struct Namespace {
    /// The name of the database associated with this namespace.
    pub db: String,

    /// The name of the collection this namespace corresponds to.
    pub coll: String,
}

impl Namespace {
    /// Construct a `Namespace` with the given database and collection.
    pub fn new(db: impl Into<String>, coll: impl Into<String>) -> Self {
        Self {
            db: db.into(),
            coll: coll.into(),
        }
    }
}

/// A cluster handle already resolved to a single collection.
#[derive(Clone, Debug)]
pub struct Collection {
    cluster: Cluster,
    namespace: Namespace,
}

impl Collection {
    /// Creates a handle for `namespace` on `cluster`.
    pub fn new(cluster: Cluster, namespace: Namespace) -> Self {
        Self { cluster, namespace }
    }

    /// The namespace of this collection.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Starts a bulk write against this collection.
    pub fn bulk_write(&self, options: impl Into<Option<BulkWriteOptions>>) -> BulkWrite {
        BulkWrite::new(self.cluster.clone(), self.namespace.clone(), options)
    }
}
