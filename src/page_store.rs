//! Random-access paged heap file: one `PageStore` backs one table.
//!
//! Pages are fixed-width slabs seeked to by `index * PAGE_SIZE`. Reads
//! and writes of cached pages are routed through the global buffer pool
//! so that locking is always applied.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::op_iterator::OpIterator;
use crate::page::{HeapPage, Page};
use crate::page_id::PageId;
use crate::permissions::Permission;
use crate::transaction_id::TransactionId;
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;
use crate::types::page_size;
use crate::util::HandyMutex;
use std::collections::hash_map::DefaultHasher;
use std::fs::{File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub struct PageStore {
    id: i32,
    path: PathBuf,
    tuple_desc: Arc<TupleDesc>,
    file: Mutex<File>,
}

impl PageStore {
    pub fn new(path: impl AsRef<Path>, tuple_desc: TupleDesc) -> DbResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        let canonical = path.canonicalize()?;
        let mut hasher = DefaultHasher::new();
        canonical.hash(&mut hasher);
        let id = (hasher.finish() & 0x7fff_ffff) as i32;

        Ok(PageStore {
            id,
            path: canonical,
            tuple_desc: Arc::new(tuple_desc),
            file: Mutex::new(file),
        })
    }

    /// Stable identifier derived from the canonical file path; equal
    /// stores return equal ids.
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn schema(&self) -> &TupleDesc {
        &self.tuple_desc
    }

    pub fn schema_arc(&self) -> Arc<TupleDesc> {
        Arc::clone(&self.tuple_desc)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `ceil(file_length / PAGE_SIZE)`; 0 for an empty file.
    pub fn num_pages(&self) -> usize {
        let len = self.file.lk().metadata().map(|m| m.len()).unwrap_or(0) as usize;
        (len + page_size() - 1) / page_size()
    }

    pub fn read_page(&self, pid: PageId) -> DbResult<HeapPage> {
        if pid.page_index >= self.num_pages() {
            return Err(DbError::exception(format!(
                "invalid page number: {}",
                pid.page_index
            )));
        }
        let mut file = self.file.lk();
        file.seek(SeekFrom::Start((pid.page_index * page_size()) as u64))?;
        let mut buf = vec![0u8; page_size()];
        file.read_exact(&mut buf)?;
        Ok(HeapPage::new(pid, Arc::clone(&self.tuple_desc), &buf))
    }

    pub fn write_page(&self, page: &HeapPage) -> DbResult<()> {
        let mut file = self.file.lk();
        file.seek(SeekFrom::Start(
            (page.page_id().page_index * page_size()) as u64,
        ))?;
        file.write_all(&page.get_page_data())?;
        Ok(())
    }

    /// Append one blank (all-zero) page at EOF and return its id.
    ///
    /// The index and the write happen under one lock acquisition so two
    /// concurrent inserters racing to extend the same file can't compute
    /// the same index for physically different offsets.
    fn append_blank_page(&self) -> DbResult<PageId> {
        let mut file = self.file.lk();
        let len = file.metadata().map(|m| m.len()).unwrap_or(0) as usize;
        let index = (len + page_size() - 1) / page_size();
        file.seek(SeekFrom::End(0))?;
        file.write_all(&vec![0u8; page_size()])?;
        Ok(PageId::new(self.id, index))
    }

    /// Find a page with a free slot (preferring the last page), inserting
    /// `tuple` there; extend the file by one page if none has room.
    /// Acquires the target page through the buffer pool with write
    /// permission. Returns the id of the dirtied page.
    pub fn insert_tuple(&self, tid: TransactionId, tuple: Tuple) -> DbResult<Vec<PageId>> {
        let pool = Database::buffer_pool();
        let num_pages = self.num_pages();

        for index in (0..num_pages).rev() {
            let pid = PageId::new(self.id, index);
            let page_lock = pool.get_page(tid, pid, Permission::ReadWrite)?;
            let mut page = page_lock.write().unwrap();
            if let Some(slot) = page.empty_slot() {
                page.insert_at(slot, tuple);
                return Ok(vec![pid]);
            }
        }

        let pid = self.append_blank_page()?;
        let page_lock = pool.get_page(tid, pid, Permission::ReadWrite)?;
        let mut page = page_lock.write().unwrap();
        let slot = page
            .empty_slot()
            .expect("freshly appended page always has a free slot");
        page.insert_at(slot, tuple);
        Ok(vec![pid])
    }

    /// Resolve the tuple's page from its record id, remove it under a
    /// write lock, and return the id of the dirtied page.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> DbResult<Vec<PageId>> {
        let rid = tuple
            .record_id()
            .ok_or_else(|| DbError::exception("tuple has no record id"))?;
        let pool = Database::buffer_pool();
        let page_lock = pool.get_page(tid, rid.page_id, Permission::ReadWrite)?;
        let mut page = page_lock.write().unwrap();
        if !page.delete_at(rid.slot_index) {
            return Err(DbError::exception("tuple not present at its record id"));
        }
        Ok(vec![rid.page_id])
    }

    /// Yields every tuple in the file in page-index, then in-page slot
    /// order, fetching each page through the buffer pool with read
    /// permission, one at a time.
    pub fn iterator(self: &Arc<Self>, tid: TransactionId) -> HeapFileIterator {
        HeapFileIterator::new(Arc::clone(self), tid)
    }
}

pub struct HeapFileIterator {
    store: Arc<PageStore>,
    tid: TransactionId,
    page_index: usize,
    slot_index: usize,
    buffer: Vec<Tuple>,
    opened: bool,
}

impl HeapFileIterator {
    fn new(store: Arc<PageStore>, tid: TransactionId) -> Self {
        HeapFileIterator {
            store,
            tid,
            page_index: 0,
            slot_index: 0,
            buffer: Vec::new(),
            opened: false,
        }
    }

    fn load_page(&mut self, index: usize) -> DbResult<()> {
        let pid = PageId::new(self.store.id(), index);
        let page_lock = Database::buffer_pool().get_page(self.tid, pid, Permission::ReadOnly)?;
        let page = page_lock.read().unwrap();
        self.buffer = page.tuples().cloned().collect();
        Ok(())
    }

    fn advance_to_next_tuple(&mut self) -> DbResult<bool> {
        loop {
            if self.slot_index < self.buffer.len() {
                return Ok(true);
            }
            if self.page_index + 1 >= self.store.num_pages() {
                return Ok(false);
            }
            self.page_index += 1;
            self.slot_index = 0;
            self.load_page(self.page_index)?;
        }
    }
}

impl OpIterator for HeapFileIterator {
    fn open(&mut self) -> DbResult<()> {
        self.page_index = 0;
        self.slot_index = 0;
        self.buffer.clear();
        if self.store.num_pages() > 0 {
            self.load_page(0)?;
        }
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) {
        self.opened = false;
        self.buffer.clear();
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.close();
        self.open()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        if !self.opened {
            return Err(DbError::exception("iterator not open"));
        }
        self.advance_to_next_tuple()
    }

    fn next(&mut self) -> DbResult<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        let tuple = self.buffer[self.slot_index].clone();
        self.slot_index += 1;
        Ok(tuple)
    }

    fn schema(&self) -> &TupleDesc {
        self.store.schema()
    }
}
