//! S6: fill the buffer pool to capacity with clean pages from distinct
//! tables, then request one more distinct page. Exactly one eviction
//! happens, and its victim is the least-recently-accessed page.

use pagedb::database::Database;
use pagedb::field::{Field, Type};
use pagedb::page_id::PageId;
use pagedb::page_store::PageStore;
use pagedb::permissions::Permission;
use pagedb::transaction_id::TransactionId;
use pagedb::tuple::Tuple;
use pagedb::tuple_desc::TupleDesc;
use std::sync::Arc;
use tempfile::tempdir;

fn one_page_table(dir: &std::path::Path, name: &str) -> Arc<PageStore> {
    let schema = TupleDesc::new(vec![("a".into(), Type::Int)]);
    let store = Arc::new(PageStore::new(dir.join(format!("{}.dat", name)), schema).unwrap());
    Database::mut_catalog().add_table(name, Arc::clone(&store));
    let tid = TransactionId::new();
    Database::buffer_pool()
        .insert_tuple(tid, store.id(), Tuple::new(vec![Field::Int(1)]))
        .unwrap();
    Database::buffer_pool().transaction_complete(tid, true);
    store
}

#[test]
fn fetching_past_capacity_evicts_the_least_recently_used_clean_page() {
    Database::reset_with_max_pages(3);
    let dir = tempdir().unwrap();

    let t0 = one_page_table(dir.path(), "t0");
    let t1 = one_page_table(dir.path(), "t1");
    let t2 = one_page_table(dir.path(), "t2");
    let t3 = one_page_table(dir.path(), "t3");

    let pool = Database::buffer_pool();
    pool.clear();

    let p0 = PageId::new(t0.id(), 0);
    let p1 = PageId::new(t1.id(), 0);
    let p2 = PageId::new(t2.id(), 0);
    let p3 = PageId::new(t3.id(), 0);

    // Access p0, p1, p2 in order (read-only, then release each lock so a
    // later fetch of the same page by another tid won't block). After
    // this, p0 is the least-recently-accessed of the three.
    for pid in [p0, p1, p2] {
        let tid = TransactionId::new();
        pool.get_page(tid, pid, Permission::ReadOnly).unwrap();
        pool.transaction_complete(tid, true);
    }
    assert_eq!(pool.len(), 3);
    assert_eq!(pool.cached_page_ids(), vec![p2, p1, p0]);

    // p3 is not cached: this must evict exactly one page (p0, the LRU
    // victim) to stay within capacity.
    let tid = TransactionId::new();
    pool.get_page(tid, p3, Permission::ReadOnly).unwrap();
    pool.transaction_complete(tid, true);

    assert_eq!(pool.len(), 3);
    let cached = pool.cached_page_ids();
    assert!(cached.contains(&p3));
    assert!(cached.contains(&p1));
    assert!(cached.contains(&p2));
    assert!(!cached.contains(&p0), "least-recently-used page should have been evicted");
}
