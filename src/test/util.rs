use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
};

use futures_util::{future::BoxFuture, FutureExt};

use crate::{
    bson::{doc, Bson, Document, RawDocumentBuf},
    cluster::{
        Cluster,
        Collection,
        Command,
        SelectedServer,
        ServerAddress,
        ServerLimits,
        Topology,
        Transport,
    },
    error::{Error, ErrorDomain, NativeError, Result},
};

/// A topology and transport pair that emulates a single server.
///
/// The transport applies each operation in a `bulkWrite` command the way a server would: an
/// operation fails with a duplicate key error if its document or filter contains `fail: true`,
/// and an ordered command stops at its first failure. Every command is recorded.
pub(crate) struct MockCluster {
    pub(crate) topology: Arc<MockTopology>,
    pub(crate) transport: Arc<MockTransport>,
}

impl MockCluster {
    pub(crate) fn new() -> Self {
        Self::with_limits(ServerLimits::default())
    }

    pub(crate) fn with_limits(limits: ServerLimits) -> Self {
        Self {
            topology: Arc::new(MockTopology {
                server: SelectedServer::new(ServerAddress::new("localhost", 27017), limits),
                failure: Mutex::new(None),
                selections: AtomicUsize::new(0),
            }),
            transport: Arc::new(MockTransport::default()),
        }
    }

    pub(crate) fn cluster(&self) -> Cluster {
        Cluster::new(self.topology.clone(), self.transport.clone())
    }

    pub(crate) fn collection(&self) -> Collection {
        self.cluster().collection("bulk", "coll")
    }

    /// The commands sent so far, in order.
    pub(crate) fn commands(&self) -> Vec<Command> {
        self.transport.commands.lock().unwrap().clone()
    }

    /// The `ops` arrays of the commands sent so far.
    pub(crate) fn sent_ops(&self) -> Vec<Vec<Document>> {
        self.commands()
            .iter()
            .map(|command| {
                command
                    .body
                    .to_document()
                    .unwrap()
                    .get_array("ops")
                    .unwrap()
                    .iter()
                    .map(|op| op.as_document().unwrap().clone())
                    .collect()
            })
            .collect()
    }

    pub(crate) fn selections(&self) -> usize {
        self.topology.selections.load(Ordering::SeqCst)
    }
}

pub(crate) struct MockTopology {
    server: SelectedServer,
    failure: Mutex<Option<Error>>,
    selections: AtomicUsize,
}

impl MockTopology {
    pub(crate) fn fail_with(&self, error: Error) {
        *self.failure.lock().unwrap() = Some(error);
    }
}

impl Topology for MockTopology {
    fn select_server(&self) -> BoxFuture<'_, Result<SelectedServer>> {
        self.selections.fetch_add(1, Ordering::SeqCst);
        let outcome = match *self.failure.lock().unwrap() {
            Some(ref error) => Err(error.clone()),
            None => Ok(self.server.clone()),
        };
        async move { outcome }.boxed()
    }
}

/// A scripted failure for one command, identified by its position in the sequence of commands.
#[derive(Clone, Debug)]
pub(crate) enum MockFailure {
    /// The connection drops before a reply is received.
    Network,

    /// The server rejects the whole command.
    CommandError { code: i32, code_name: &'static str },

    /// The reply is missing its results cursor.
    MalformedReply,

    /// The transport reports an error from the native driver in place of a reply.
    Native(NativeError),
}

#[derive(Default)]
pub(crate) struct MockTransport {
    commands: Mutex<Vec<Command>>,
    failures: Mutex<HashMap<usize, MockFailure>>,
    write_concern_error: AtomicBool,
}

impl MockTransport {
    /// Fails the `command_number`th command (zero-based) with `failure`.
    pub(crate) fn fail_command(&self, command_number: usize, failure: MockFailure) {
        self.failures
            .lock()
            .unwrap()
            .insert(command_number, failure);
    }

    /// Reports a write concern error alongside every subsequent acknowledged reply.
    pub(crate) fn report_write_concern_errors(&self) {
        self.write_concern_error.store(true, Ordering::SeqCst);
    }

    fn reply(&self, command: Command) -> Result<RawDocumentBuf> {
        let command_number = {
            let mut commands = self.commands.lock().unwrap();
            commands.push(command.clone());
            commands.len() - 1
        };

        match self.failures.lock().unwrap().get(&command_number) {
            Some(MockFailure::Network) => {
                return Err(
                    NativeError::new(ErrorDomain::Stream, 2, "connection reset by peer").into(),
                );
            }
            Some(MockFailure::CommandError { code, code_name }) => {
                return Ok(raw(doc! {
                    "ok": 0.0,
                    "code": *code,
                    "codeName": *code_name,
                    "errmsg": "command rejected",
                }));
            }
            Some(MockFailure::MalformedReply) => return Ok(raw(doc! { "ok": 1.0 })),
            Some(MockFailure::Native(error)) => return Err(error.clone().into()),
            None => {}
        }

        let body = command.body.to_document().unwrap();
        let ordered = body.get_bool("ordered").unwrap_or(true);
        let unacknowledged = body
            .get_document("writeConcern")
            .map(|write_concern| matches!(write_concern.get("w"), Some(Bson::Int32(0))))
            .unwrap_or(false);

        let mut summary = Summary::default();
        let mut entries = Vec::new();
        for (idx, op) in body.get_array("ops").unwrap().iter().enumerate() {
            let op = op.as_document().unwrap();
            let entry = summary.apply(idx as i32, op);
            let failed = entry.get_f64("ok") == Ok(0.0);
            entries.push(Bson::Document(entry));
            if failed && ordered {
                break;
            }
        }

        if unacknowledged {
            return Ok(raw(doc! { "ok": 1.0 }));
        }

        let mut reply = doc! {
            "ok": 1.0,
            "cursor": { "id": 0_i64, "ns": "admin.$cmd.bulkWrite", "firstBatch": entries },
            "nErrors": summary.n_errors,
            "nInserted": summary.n_inserted,
            "nMatched": summary.n_matched,
            "nModified": summary.n_modified,
            "nUpserted": summary.n_upserted,
            "nDeleted": summary.n_deleted,
        };
        if self.write_concern_error.load(Ordering::SeqCst) {
            reply.insert(
                "writeConcernError",
                doc! {
                    "code": 64,
                    "codeName": "WriteConcernFailed",
                    "errmsg": "waiting for replication timed out",
                    "errInfo": { "wtimeout": true },
                },
            );
        }
        Ok(raw(reply))
    }
}

impl Transport for MockTransport {
    fn send_command<'a>(
        &'a self,
        _server: &'a SelectedServer,
        command: Command,
    ) -> BoxFuture<'a, Result<RawDocumentBuf>> {
        async move { self.reply(command) }.boxed()
    }
}

#[derive(Default)]
struct Summary {
    n_errors: i32,
    n_inserted: i32,
    n_matched: i32,
    n_modified: i32,
    n_upserted: i32,
    n_deleted: i32,
}

impl Summary {
    /// Applies a single `ops` entry and returns its results cursor entry.
    fn apply(&mut self, idx: i32, op: &Document) -> Document {
        let kind = op.keys().next().unwrap().as_str();
        let target = match kind {
            "insert" => op.get_document("document").unwrap(),
            _ => op.get_document("filter").unwrap(),
        };

        if target.get_bool("fail") == Ok(true) {
            self.n_errors += 1;
            return doc! {
                "ok": 0.0,
                "idx": idx,
                "code": 11000,
                "codeName": "DuplicateKey",
                "errmsg": "E11000 duplicate key error",
                "errInfo": { "keyValue": target.clone() },
                "n": 0,
            };
        }

        match kind {
            "insert" => {
                self.n_inserted += 1;
                doc! { "ok": 1.0, "idx": idx, "n": 1 }
            }
            "update" if op.get_bool("upsert") == Ok(true) => {
                self.n_upserted += 1;
                let id = target
                    .get("_id")
                    .cloned()
                    .unwrap_or_else(|| Bson::String(format!("generated-{}", idx)));
                doc! { "ok": 1.0, "idx": idx, "n": 1, "nModified": 0, "upserted": { "_id": id } }
            }
            "update" => {
                self.n_matched += 1;
                self.n_modified += 1;
                doc! { "ok": 1.0, "idx": idx, "n": 1, "nModified": 1 }
            }
            "delete" => {
                self.n_deleted += 1;
                doc! { "ok": 1.0, "idx": idx, "n": 1 }
            }
            other => panic!("unexpected operation type {}", other),
        }
    }
}

fn raw(document: Document) -> RawDocumentBuf {
    RawDocumentBuf::from_document(&document).unwrap()
}
