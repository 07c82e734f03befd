use pretty_assertions::assert_eq;

use crate::{
    batch::Batch,
    bson::{doc, rawdoc, Bson, RawDocumentBuf},
    cluster::Namespace,
    error::ErrorKind,
    operation::{BulkWriteBatch, Operation},
    options::{Acknowledgment, BulkWriteOptions, InsertOneModel, WriteConcern, WriteModel},
};

fn batch(offset: usize, len: usize) -> Batch {
    let ops: Vec<RawDocumentBuf> = (0..len)
        .map(|i| {
            WriteModel::from(
                InsertOneModel::builder()
                    .document(rawdoc! { "_id": (offset + i) as i32 })
                    .build(),
            )
            .to_ops_document()
        })
        .collect();
    Batch {
        offset,
        ops,
        size_bytes: 0,
    }
}

fn namespace() -> Namespace {
    Namespace::new("db", "coll")
}

#[test]
fn build_command() {
    let namespace = namespace();
    let options = BulkWriteOptions::builder()
        .ordered(false)
        .bypass_document_validation(true)
        .comment(Bson::String("tag".to_string()))
        .let_vars(doc! { "limit": 5 })
        .write_concern(WriteConcern::majority())
        .build();
    let batch = batch(0, 2);

    let command = BulkWriteBatch::new(&namespace, &options, &batch)
        .build()
        .unwrap();
    assert_eq!(command.name, "bulkWrite");
    assert_eq!(command.target_db, "admin");

    let body = command.body.to_document().unwrap();
    let expected = doc! {
        "bulkWrite": 1,
        "ops": [
            { "insert": 0, "document": { "_id": 0 } },
            { "insert": 0, "document": { "_id": 1 } }
        ],
        "nsInfo": [ { "ns": "db.coll" } ],
        "errorsOnly": false,
        "ordered": false,
        "bypassDocumentValidation": true,
        "comment": "tag",
        "let": { "limit": 5 },
        "writeConcern": { "w": "majority" },
    };
    assert_eq!(body, expected);
}

#[test]
fn build_command_defaults() {
    let namespace = namespace();
    let options = BulkWriteOptions::default();
    let batch = batch(0, 1);

    let command = BulkWriteBatch::new(&namespace, &options, &batch)
        .build()
        .unwrap();
    let body = command.body.to_document().unwrap();

    assert_eq!(body.get_bool("ordered"), Ok(true));
    assert!(body.get("writeConcern").is_none());
    assert!(body.get("bypassDocumentValidation").is_none());
    assert!(body.get("comment").is_none());
    assert!(body.get("let").is_none());
}

#[test]
fn handle_response_uses_global_indexes() {
    let namespace = namespace();
    let options = BulkWriteOptions::default();
    let batch = batch(1000, 3);
    let operation = BulkWriteBatch::new(&namespace, &options, &batch);

    let reply = rawdoc! {
        "ok": 1.0,
        "cursor": {
            "id": 0_i64,
            "ns": "admin.$cmd.bulkWrite",
            "firstBatch": [
                { "ok": 1.0, "idx": 0, "n": 1 },
                { "ok": 1.0, "idx": 1, "n": 1, "nModified": 0, "upserted": { "_id": "new" } },
                {
                    "ok": 0.0,
                    "idx": 2,
                    "code": 11000,
                    "codeName": "DuplicateKey",
                    "errmsg": "E11000 duplicate key error",
                    "errInfo": { "keyValue": { "_id": 2 } },
                }
            ],
        },
        "nErrors": 1,
        "nInserted": 1,
        "nMatched": 0,
        "nModified": 0,
        "nUpserted": 1,
        "nDeleted": 0,
    };

    let result = operation.handle_response(reply).unwrap();
    assert!(result.acknowledged);
    assert_eq!(result.inserted_count, 1);
    assert_eq!(result.upserted_count, 1);
    assert_eq!(
        result.upserted_ids.get(&1001),
        Some(&Bson::String("new".to_string()))
    );
    assert_eq!(result.write_errors.len(), 1);

    let error = &result.write_errors[0];
    assert_eq!(error.index, 1002);
    assert_eq!(error.code, 11000);
    assert_eq!(error.code_name.as_deref(), Some("DuplicateKey"));
    assert_eq!(error.details, Some(doc! { "keyValue": { "_id": 2 } }));
}

#[test]
fn handle_response_collects_write_concern_error() {
    let namespace = namespace();
    let options = BulkWriteOptions::default();
    let batch = batch(0, 1);
    let operation = BulkWriteBatch::new(&namespace, &options, &batch);

    let reply = rawdoc! {
        "ok": 1,
        "cursor": { "id": 0_i64, "firstBatch": [ { "ok": 1, "idx": 0, "n": 1 } ] },
        "nErrors": 0,
        "nInserted": 1,
        "nMatched": 0,
        "nModified": 0,
        "nUpserted": 0,
        "nDeleted": 0,
        "writeConcernError": { "code": 64, "codeName": "WriteConcernFailed", "errmsg": "timed out" },
    };

    let result = operation.handle_response(reply).unwrap();
    assert_eq!(result.inserted_count, 1);
    assert_eq!(result.write_concern_errors.len(), 1);
    assert_eq!(result.write_concern_errors[0].code, 64);
}

#[test]
fn handle_response_rejects_out_of_range_index() {
    let namespace = namespace();
    let options = BulkWriteOptions::default();
    let batch = batch(0, 2);
    let operation = BulkWriteBatch::new(&namespace, &options, &batch);

    let reply = rawdoc! {
        "ok": 1,
        "cursor": { "id": 0_i64, "firstBatch": [ { "ok": 1, "idx": 2, "n": 1 } ] },
        "nErrors": 0,
        "nInserted": 1,
        "nMatched": 0,
        "nModified": 0,
        "nUpserted": 0,
        "nDeleted": 0,
    };

    let error = operation.handle_response(reply).unwrap_err();
    assert!(matches!(*error.kind, ErrorKind::Operation { code: None, .. }));
}

#[test]
fn handle_response_rejects_open_cursor() {
    let namespace = namespace();
    let options = BulkWriteOptions::default();
    let batch = batch(0, 1);
    let operation = BulkWriteBatch::new(&namespace, &options, &batch);

    let reply = rawdoc! {
        "ok": 1,
        "cursor": { "id": 42_i64, "firstBatch": [] },
        "nErrors": 0,
        "nInserted": 1,
        "nMatched": 0,
        "nModified": 0,
        "nUpserted": 0,
        "nDeleted": 0,
    };

    let error = operation.handle_response(reply).unwrap_err();
    assert!(error.is_fatal());
}

#[test]
fn handle_response_command_error() {
    let namespace = namespace();
    let options = BulkWriteOptions::default();
    let batch = batch(0, 1);
    let operation = BulkWriteBatch::new(&namespace, &options, &batch);

    let reply = rawdoc! {
        "ok": 0.0,
        "code": 13,
        "codeName": "Unauthorized",
        "errmsg": "not authorized on admin to execute command",
    };

    let error = operation.handle_response(reply).unwrap_err();
    match *error.kind {
        ErrorKind::Operation { ref message, code } => {
            assert_eq!(code, Some(13));
            assert!(message.contains("Unauthorized"));
        }
        ref other => panic!("expected operation error, got {:?}", other),
    }
}

#[test]
fn handle_response_malformed_reply() {
    let namespace = namespace();
    let options = BulkWriteOptions::default();
    let batch = batch(0, 1);
    let operation = BulkWriteBatch::new(&namespace, &options, &batch);

    let error = operation
        .handle_response(rawdoc! { "ok": 1, "nInserted": 1 })
        .unwrap_err();
    assert!(matches!(*error.kind, ErrorKind::Operation { .. }));

    let error = operation
        .handle_response(rawdoc! { "cursor": {} })
        .unwrap_err();
    assert!(matches!(*error.kind, ErrorKind::Operation { .. }));
}

#[test]
fn handle_response_unacknowledged() {
    let namespace = namespace();
    let options = BulkWriteOptions::builder()
        .ordered(false)
        .write_concern(WriteConcern::from(Acknowledgment::Nodes(0)))
        .build();
    let batch = batch(0, 1);
    let operation = BulkWriteBatch::new(&namespace, &options, &batch);

    let result = operation.handle_response(rawdoc! { "ok": 1 }).unwrap();
    assert!(!result.acknowledged);
    assert_eq!(result.inserted_count, 0);
}
