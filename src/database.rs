//! Process-wide wiring: one `BufferPool` and one `Catalog` shared by every
//! operator, lazily constructed once via `std::sync::Once` and handed out
//! as a `'static` reference thereafter.

use crate::buffer_pool::BufferPool;
use crate::catalog::Catalog;
use std::mem;
use std::sync::{Once, RwLock};

pub const DEFAULT_MAX_PAGES: usize = 50;

pub struct Database {
    buffer_pool: BufferPool,
    catalog: RwLock<Catalog>,
}

static mut SINGLETON: *mut Database = std::ptr::null_mut();
static INIT: Once = Once::new();

impl Database {
    fn new() -> Self {
        Database {
            buffer_pool: BufferPool::new(DEFAULT_MAX_PAGES),
            catalog: RwLock::new(Catalog::new()),
        }
    }

    pub fn global() -> &'static Database {
        INIT.call_once(|| unsafe {
            SINGLETON = Box::into_raw(Box::new(Database::new()));
        });
        unsafe { &*SINGLETON }
    }

    pub fn buffer_pool() -> &'static BufferPool {
        &Database::global().buffer_pool
    }

    pub fn catalog() -> std::sync::RwLockReadGuard<'static, Catalog> {
        use crate::util::HandyRwLock;
        Database::global().catalog.rl()
    }

    pub fn mut_catalog() -> std::sync::RwLockWriteGuard<'static, Catalog> {
        use crate::util::HandyRwLock;
        Database::global().catalog.wl()
    }

    /// Reset all in-memory state: page cache and catalog. Used by tests
    /// so each test scenario starts from a clean process-wide slate.
    pub fn reset() {
        Database::reset_with_max_pages(DEFAULT_MAX_PAGES);
    }

    /// Like `reset`, but installs a buffer pool bounded to `max_pages`;
    /// used by scenarios that exercise eviction at a specific capacity.
    pub fn reset_with_max_pages(max_pages: usize) {
        INIT.call_once(|| unsafe {
            SINGLETON = Box::into_raw(Box::new(Database::new()));
        });
        let fresh = Database {
            buffer_pool: BufferPool::new(max_pages),
            catalog: RwLock::new(Catalog::new()),
        };
        unsafe {
            let old = mem::replace(&mut *SINGLETON, fresh);
            drop(old);
        }
    }
}
