//! Process-global configuration cell.
//!
//! A single `PAGE_SIZE` variable used by every `PageStore`. Mutable only
//! for tests; production code must treat it as fixed at process start.

use std::sync::atomic::{AtomicUsize, Ordering};

pub const DEFAULT_PAGE_SIZE: usize = 4096;

static PAGE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_PAGE_SIZE);

pub fn page_size() -> usize {
    PAGE_SIZE.load(Ordering::Relaxed)
}

#[cfg(test)]
pub fn set_page_size_for_test(size: usize) {
    PAGE_SIZE.store(size, Ordering::Relaxed);
}
