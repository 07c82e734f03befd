use std::time::Duration;

use pretty_assertions::assert_eq;

use crate::{
    bson::{self, doc},
    error::ErrorKind,
    options::{Acknowledgment, WriteConcern},
};

#[test]
fn write_concern_is_acknowledged() {
    let w_1 = WriteConcern::builder()
        .w(Acknowledgment::Nodes(1))
        .journal(false)
        .build();
    assert!(w_1.is_acknowledged());

    let w_majority = WriteConcern::builder()
        .w(Acknowledgment::Majority)
        .journal(false)
        .build();
    assert!(w_majority.is_acknowledged());

    let w_0 = WriteConcern::builder()
        .w(Acknowledgment::Nodes(0))
        .journal(false)
        .build();
    assert!(!w_0.is_acknowledged());

    let w_0 = WriteConcern::unacknowledged();
    assert!(!w_0.is_acknowledged());

    let empty = WriteConcern::builder().build();
    assert!(empty.is_acknowledged());
    assert!(empty.is_empty());

    let journaled = WriteConcern::builder().journal(true).build();
    assert!(journaled.is_acknowledged());
    assert!(!journaled.is_empty());
}

#[test]
fn write_concern_validate() {
    assert!(WriteConcern::majority().validate().is_ok());

    let invalid = WriteConcern::builder()
        .w(Acknowledgment::Nodes(0))
        .journal(true)
        .build();
    let error = invalid.validate().unwrap_err();
    assert!(matches!(*error.kind, ErrorKind::InvalidOperation { .. }));

    let negative = WriteConcern::from(Acknowledgment::Nodes(-1));
    assert!(negative.validate().is_err());
}

#[test]
fn write_concern_serialize() {
    let wc = WriteConcern::builder()
        .w(Acknowledgment::Majority)
        .w_timeout(Duration::from_millis(250))
        .journal(true)
        .build();
    let doc = bson::to_document(&wc).unwrap();
    assert_eq!(doc, doc! { "w": "majority", "wtimeout": 250, "j": true });

    let wc = WriteConcern::from(Acknowledgment::Nodes(2));
    let doc = bson::to_document(&wc).unwrap();
    assert_eq!(doc, doc! { "w": 2 });
}

#[test]
fn acknowledgment_from_str() {
    assert_eq!(Acknowledgment::from("majority"), Acknowledgment::Majority);
    assert_eq!(
        Acknowledgment::from("myTag".to_string()),
        Acknowledgment::Custom("myTag".to_string())
    );
    assert_eq!(Acknowledgment::from(1), Acknowledgment::Nodes(1));

    let wc = WriteConcern::from(Acknowledgment::from("myTag"));
    let doc = bson::to_document(&wc).unwrap();
    assert_eq!(doc, doc! { "w": "myTag" });
}
