//! Bounded in-memory page cache: the single choke point for all page
//! access. Pages are fetched through `get_page`, which loads on miss
//! (evicting a clean LRU victim if the pool is full) and then blocks on
//! a per-page `PageLatch` for the requested permission.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::latch::PageLatch;
use crate::page::{HeapPage, Page};
use crate::page_id::PageId;
use crate::permissions::Permission;
use crate::transaction_id::TransactionId;
use crate::tuple::Tuple;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

struct Entry {
    latch: Arc<PageLatch>,
    page: Arc<RwLock<HeapPage>>,
}

struct PoolInner {
    entries: HashMap<PageId, Entry>,
    /// Most-recently-accessed id at the front.
    lru: Vec<PageId>,
}

impl PoolInner {
    fn touch(&mut self, pid: PageId) {
        self.lru.retain(|p| *p != pid);
        self.lru.insert(0, pid);
    }

    fn forget(&mut self, pid: PageId) {
        self.lru.retain(|p| *p != pid);
        self.entries.remove(&pid);
    }
}

pub struct BufferPool {
    max_pages: usize,
    inner: Mutex<PoolInner>,
}

impl BufferPool {
    pub fn new(max_pages: usize) -> Self {
        BufferPool {
            max_pages,
            inner: Mutex::new(PoolInner {
                entries: HashMap::new(),
                lru: Vec::new(),
            }),
        }
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.lru.clear();
    }

    /// Cached page ids, most-recently-accessed first. Diagnostic only;
    /// no operator depends on the order beyond what eviction already uses.
    pub fn cached_page_ids(&self) -> Vec<PageId> {
        self.inner.lock().unwrap().lru.clone()
    }

    fn load_page(pid: PageId) -> DbResult<HeapPage> {
        let store = Database::catalog().get_table(pid.table_id)?;
        store.read_page(pid)
    }

    /// Fetch `pid` with the given permission, blocking on its lock as
    /// needed. Eviction (if the pool is full and `pid` isn't cached) and
    /// cache population happen before the lock request; the lock request
    /// itself is the only step that may block or abort, and it happens
    /// with the pool's own mutex released.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: PageId,
        perm: Permission,
    ) -> DbResult<Arc<RwLock<HeapPage>>> {
        debug!("get_page: tid={}, pid={}, perm={:?}", tid, pid, perm);
        let (latch, page) = {
            let mut inner = self.inner.lock().unwrap();

            if !inner.entries.contains_key(&pid) {
                if inner.entries.len() >= self.max_pages {
                    self.evict_one_locked(&mut inner)?;
                }
                let page = Self::load_page(pid)?;
                inner.entries.insert(
                    pid,
                    Entry {
                        latch: Arc::new(PageLatch::new()),
                        page: Arc::new(RwLock::new(page)),
                    },
                );
            }
            inner.touch(pid);

            let entry = inner.entries.get(&pid).unwrap();
            (Arc::clone(&entry.latch), Arc::clone(&entry.page))
        };

        latch.acquire(tid, perm.to_lock_mode())?;
        Ok(page)
    }

    pub fn release_page(&self, tid: TransactionId, pid: PageId) {
        let inner = self.inner.lock().unwrap();
        if let Some(entry) = inner.entries.get(&pid) {
            entry.latch.release(tid);
        }
    }

    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.entries.get(&pid).map(|e| e.latch.holds(tid)).unwrap_or(false)
    }

    /// Insert `tuple` into `table_id` on behalf of `tid`; mark every page
    /// the store dirtied with `tid` and ensure it stays cached in X mode.
    pub fn insert_tuple(&self, tid: TransactionId, table_id: i32, tuple: Tuple) -> DbResult<()> {
        let store = Database::catalog().get_table(table_id)?;
        let dirtied = store.insert_tuple(tid, tuple)?;
        self.mark_dirty(tid, &dirtied);
        Ok(())
    }

    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> DbResult<()> {
        let rid = tuple
            .record_id()
            .ok_or_else(|| DbError::exception("tuple has no record id"))?;
        let store = Database::catalog().get_table(rid.page_id.table_id)?;
        let dirtied = store.delete_tuple(tid, tuple)?;
        self.mark_dirty(tid, &dirtied);
        Ok(())
    }

    fn mark_dirty(&self, tid: TransactionId, pages: &[PageId]) {
        let inner = self.inner.lock().unwrap();
        for pid in pages {
            if let Some(entry) = inner.entries.get(pid) {
                entry.page.write().unwrap().mark_dirty(Some(tid));
            }
        }
    }

    /// Commit: flush every page `tid` holds (keeping them cached) and
    /// clear their dirty marker. Abort: discard every page `tid` holds without
    /// writing, rolling back uncommitted changes since the on-disk copy
    /// is untouched. Either way, release every lock `tid` holds.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) {
        let held: Vec<PageId> = {
            let inner = self.inner.lock().unwrap();
            inner
                .entries
                .iter()
                .filter(|(_, e)| e.latch.holds(tid))
                .map(|(pid, _)| *pid)
                .collect()
        };

        for pid in &held {
            if commit {
                self.flush_page(*pid);
            } else {
                self.discard_page(*pid);
            }
        }

        let inner = self.inner.lock().unwrap();
        for pid in &held {
            if let Some(entry) = inner.entries.get(pid) {
                entry.latch.release(tid);
            }
        }
    }

    /// Write the page's content to its store and clear its dirty marker,
    /// but leave it cached (only `evict_one`/`discard_page` remove cache
    /// entries).
    pub fn flush_page(&self, pid: PageId) {
        let page_lock = {
            let inner = self.inner.lock().unwrap();
            match inner.entries.get(&pid) {
                Some(entry) => Arc::clone(&entry.page),
                None => return,
            }
        };

        let mut page = page_lock.write().unwrap();
        if page.dirty().is_none() {
            return;
        }

        let store = match Database::catalog().get_table(pid.table_id) {
            Ok(s) => s,
            Err(e) => {
                debug!("flush_page: table lookup failed for {}: {}", pid, e);
                return;
            }
        };
        if let Err(e) = store.write_page(&page) {
            debug!("flush_page: write failed for {}: {}", pid, e);
            return;
        }
        page.mark_dirty(None);
    }

    pub fn flush_all_pages(&self) {
        let pids: Vec<PageId> = self.inner.lock().unwrap().entries.keys().copied().collect();
        for pid in pids {
            self.flush_page(pid);
        }
    }

    pub fn flush_pages(&self, tid: TransactionId) {
        let pids: Vec<PageId> = {
            let inner = self.inner.lock().unwrap();
            inner
                .entries
                .iter()
                .filter(|(_, e)| e.latch.holds(tid))
                .map(|(pid, _)| *pid)
                .collect()
        };
        for pid in pids {
            self.flush_page(pid);
        }
    }

    pub fn discard_page(&self, pid: PageId) {
        let mut inner = self.inner.lock().unwrap();
        inner.forget(pid);
    }

    /// Walk the LRU from least to most recently accessed and evict the
    /// first clean page found. Never evicts a dirty page (NO STEAL); if
    /// every cached page is dirty, fails loudly.
    fn evict_one_locked(&self, inner: &mut PoolInner) -> DbResult<()> {
        for pid in inner.lru.iter().rev().copied().collect::<Vec<_>>() {
            let clean = inner
                .entries
                .get(&pid)
                .map(|e| e.page.read().unwrap().dirty().is_none())
                .unwrap_or(false);
            if clean {
                debug!("evict_one: evicting {}", pid);
                inner.forget(pid);
                return Ok(());
            }
        }
        warn!("evict_one: pool full and every cached page is dirty");
        Err(DbError::exception("all pages dirty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, Type};
    use crate::tuple_desc::TupleDesc;
    use tempfile::tempdir;

    fn schema() -> TupleDesc {
        TupleDesc::new(vec![
            ("a".into(), Type::Int),
            ("b".into(), Type::Int),
        ])
    }

    #[test]
    fn eviction_bound_holds_after_every_fetch() {
        let dir = tempdir().unwrap();
        let store = Arc::new(
            crate::page_store::PageStore::new(dir.path().join("t.dat"), schema()).unwrap(),
        );
        Database::mut_catalog().add_table("t", Arc::clone(&store));

        let pool = BufferPool::new(3);
        let tid = TransactionId::new();
        for i in 0..1000i32 {
            pool.insert_tuple(tid, store.id(), Tuple::new(vec![Field::Int(i), Field::Int(i * 2)]))
                .unwrap();
            assert!(pool.len() <= pool.max_pages());
        }
        pool.transaction_complete(tid, true);
    }

    #[test]
    fn evict_one_never_picks_a_dirty_page() {
        let dir = tempdir().unwrap();
        let store = Arc::new(
            crate::page_store::PageStore::new(dir.path().join("t2.dat"), schema()).unwrap(),
        );
        Database::mut_catalog().add_table("t2", Arc::clone(&store));

        let pool = BufferPool::new(1);
        let tid = TransactionId::new();

        // Insert enough tuples, all under one uncommitted transaction, to
        // force the heap file past one page. Once the pool's single slot
        // is held by a dirty page, the fetch that needs a second, distinct
        // page must fail rather than silently evict a dirty one.
        let mut saw_buffer_full = false;
        for i in 0..2000i32 {
            match pool.insert_tuple(tid, store.id(), Tuple::new(vec![Field::Int(i), Field::Int(i)])) {
                Ok(()) => {}
                Err(DbError::DbException(msg)) => {
                    assert_eq!(msg, "all pages dirty");
                    saw_buffer_full = true;
                    break;
                }
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert!(saw_buffer_full, "expected eviction to fail once the pool filled with dirty pages");
    }
}
