//! Property 6: interleaved writers on the same page, each committing a
//! read-modify-write increment under X, must produce a final state equal
//! to some serial order of their commits — i.e. no update is lost.

use pagedb::database::Database;
use pagedb::error::DbError;
use pagedb::field::{Field, Type};
use pagedb::op_iterator::OpIterator;
use pagedb::ops::scan::SeqScan;
use pagedb::page::Page;
use pagedb::page_id::PageId;
use pagedb::page_store::PageStore;
use pagedb::permissions::Permission;
use pagedb::transaction_id::TransactionId;
use pagedb::tuple::Tuple;
use pagedb::tuple_desc::TupleDesc;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

#[test]
fn interleaved_writers_on_one_page_never_lose_an_update() {
    Database::reset_with_max_pages(10);
    let dir = tempdir().unwrap();
    let schema = TupleDesc::new(vec![("counter".into(), Type::Int)]);
    let store = Arc::new(PageStore::new(dir.path().join("counter.dat"), schema).unwrap());
    Database::mut_catalog().add_table("counter", Arc::clone(&store));

    let setup = TransactionId::new();
    Database::buffer_pool()
        .insert_tuple(setup, store.id(), Tuple::new(vec![Field::Int(0)]))
        .unwrap();
    Database::buffer_pool().transaction_complete(setup, true);

    let pid = PageId::new(store.id(), 0);
    const WRITERS: usize = 8;
    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            thread::spawn(move || {
                let pool = Database::buffer_pool();
                loop {
                    let tid = TransactionId::new();
                    match pool.get_page(tid, pid, Permission::ReadWrite) {
                        Ok(page_lock) => {
                            let mut page = page_lock.write().unwrap();
                            let current =
                                page.tuples().next().unwrap().get_field(0).as_int().unwrap();
                            page.delete_at(0);
                            page.insert_at(0, Tuple::new(vec![Field::Int(current + 1)]));
                            page.mark_dirty(Some(tid));
                            drop(page);
                            pool.transaction_complete(tid, true);
                            break;
                        }
                        Err(DbError::TransactionAborted) => {
                            pool.transaction_complete(tid, false);
                            continue;
                        }
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let tid = TransactionId::new();
    let mut scan = SeqScan::new(tid, Arc::clone(&store));
    scan.open().unwrap();
    let t = scan.next().unwrap();
    scan.close();
    Database::buffer_pool().transaction_complete(tid, true);

    assert_eq!(*t.get_field(0), Field::Int(WRITERS as i32));
}
