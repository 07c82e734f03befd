use pretty_assertions::assert_eq;

use crate::{
    cluster::{
        Namespace,
        ServerAddress,
        ServerLimits,
        DEFAULT_MAX_BSON_OBJECT_SIZE,
        DEFAULT_MAX_MESSAGE_SIZE_BYTES,
        DEFAULT_MAX_WRITE_BATCH_SIZE,
    },
    test::MockCluster,
};

#[test]
fn limits_fall_back_to_defaults() {
    let limits = ServerLimits::from_advertised(None, Some(0), Some(-5));
    assert_eq!(limits, ServerLimits::default());
    assert_eq!(limits.max_write_batch_size, DEFAULT_MAX_WRITE_BATCH_SIZE);
    assert_eq!(limits.max_bson_object_size, DEFAULT_MAX_BSON_OBJECT_SIZE);
    assert_eq!(limits.max_message_size_bytes, DEFAULT_MAX_MESSAGE_SIZE_BYTES);

    let limits = ServerLimits::from_advertised(Some(100_000), Some(1024), Some(4096));
    assert_eq!(limits.max_write_batch_size, 100_000);
    assert_eq!(limits.max_bson_object_size, 1024);
    assert_eq!(limits.max_message_size_bytes, 4096);
}

#[test]
fn display() {
    assert_eq!(Namespace::new("db", "coll").to_string(), "db.coll");
    assert_eq!(ServerAddress::new("localhost", 27017).to_string(), "localhost:27017");
}

#[test]
fn collection_handle() {
    let mock = MockCluster::new();
    let collection = mock.cluster().collection("shop", "orders");
    assert_eq!(collection.namespace(), &Namespace::new("shop", "orders"));

    let bulk = collection.bulk_write(None);
    assert!(bulk.is_empty());
    assert!(bulk.is_ordered());
    assert_eq!(bulk.namespace().to_string(), "shop.orders");
}
