//! S2: same setup as S1, but the inserting transaction aborts. A fresh
//! scan under a new transaction must see zero rows, since NO-STEAL means
//! none of the aborted transaction's dirty pages ever reached disk.

use pagedb::database::Database;
use pagedb::field::{Field, Type};
use pagedb::op_iterator::OpIterator;
use pagedb::ops::scan::SeqScan;
use pagedb::page_store::PageStore;
use pagedb::transaction_id::TransactionId;
use pagedb::tuple::Tuple;
use pagedb::tuple_desc::TupleDesc;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn aborted_insert_is_invisible_to_a_later_transaction() {
    Database::reset_with_max_pages(3);

    let dir = tempdir().unwrap();
    let schema = TupleDesc::new(vec![("a".into(), Type::Int), ("b".into(), Type::Int)]);
    let store = Arc::new(PageStore::new(dir.path().join("t.dat"), schema).unwrap());
    Database::mut_catalog().add_table("t", Arc::clone(&store));

    let pool = Database::buffer_pool();
    let writer = TransactionId::new();
    for i in 0..1000i32 {
        pool.insert_tuple(writer, store.id(), Tuple::new(vec![Field::Int(i), Field::Int(i * 2)]))
            .unwrap();
    }
    pool.transaction_complete(writer, false);

    let reader = TransactionId::new();
    let mut scan = SeqScan::new(reader, Arc::clone(&store));
    scan.open().unwrap();
    let mut count = 0;
    while scan.has_next().unwrap() {
        scan.next().unwrap();
        count += 1;
    }
    scan.close();
    pool.transaction_complete(reader, true);

    assert_eq!(count, 0);
}
