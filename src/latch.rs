//! Per-page multi-reader/single-writer lock keyed by transaction identity.
//!
//! Deadlock is avoided by bounded waiting rather than a wait-for graph:
//! a blocked acquirer gives up and asks its caller to abort once it has
//! waited most of a randomized timeout window. Each waiter blocks on its
//! own condition variable so a release can wake exactly the right set of
//! waiters instead of every sleeper on the page.

use crate::error::{DbError, DbResult};
use crate::permissions::LockMode;
use crate::transaction_id::TransactionId;
use log::debug;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

struct Holder {
    tid: TransactionId,
    mode: LockMode,
}

struct Waiter {
    tid: TransactionId,
    mode: LockMode,
    signal: Arc<Condvar>,
}

struct LatchState {
    holders: Vec<Holder>,
    waiters: VecDeque<Waiter>,
}

impl LatchState {
    fn holder_mode(&self, tid: TransactionId) -> Option<LockMode> {
        self.holders.iter().find(|h| h.tid == tid).map(|h| h.mode)
    }

    /// {S x S compatible; everything else conflicting}, ignoring `tid`'s
    /// own existing holder record (callers handle that separately).
    fn compatible(&self, mode: LockMode) -> bool {
        self.holders.iter().all(|h| h.mode.compatible_with(mode))
    }
}

/// Per-page lock. `holders` satisfies: at most one X, or any number of S,
/// never both. `waiters` is an arrival-ordered queue; release prefers
/// waking an X waiter over any S waiters to avoid writer starvation.
pub struct PageLatch {
    state: Mutex<LatchState>,
}

impl PageLatch {
    pub fn new() -> Self {
        PageLatch {
            state: Mutex::new(LatchState {
                holders: Vec::new(),
                waiters: VecDeque::new(),
            }),
        }
    }

    /// Block (with bounded timeout) until `tid` holds `mode` on this
    /// page, or return `TransactionAborted`.
    pub fn acquire(&self, tid: TransactionId, mode: LockMode) -> DbResult<()> {
        let mut guard = self.state.lock().unwrap();
        loop {
            match guard.holder_mode(tid) {
                Some(LockMode::Exclusive) => return Ok(()),
                Some(LockMode::Shared) if mode == LockMode::Shared => return Ok(()),
                Some(LockMode::Shared) => {
                    // upgrade: atomically drop the S record, then try to
                    // grant X immediately; otherwise fall through and
                    // wait like any other X request.
                    guard.holders.retain(|h| h.tid != tid);
                    if guard.compatible(LockMode::Exclusive) {
                        guard.holders.push(Holder {
                            tid,
                            mode: LockMode::Exclusive,
                        });
                        return Ok(());
                    }
                }
                None => {
                    if guard.compatible(mode) {
                        guard.holders.push(Holder { tid, mode });
                        return Ok(());
                    }
                }
            }

            // Not grantable yet: enqueue and wait on our own signal.
            let signal = Arc::new(Condvar::new());
            guard.waiters.push_back(Waiter {
                tid,
                mode,
                signal: Arc::clone(&signal),
            });

            let timeout = Duration::from_millis(rand::thread_rng().gen_range(1000, 4000));
            let wait_budget = timeout.mul_f64(0.9);
            let (next_guard, timeout_result) =
                signal.wait_timeout(guard, wait_budget).unwrap();
            guard = next_guard;

            // Defensive: drop our own waiter record regardless of why we
            // woke (explicit signal, timeout, or spurious wakeup).
            guard
                .waiters
                .retain(|w| !(w.tid == tid && Arc::ptr_eq(&w.signal, &signal)));

            if timeout_result.timed_out() {
                debug!("acquire timed out, tid: {}, mode: {:?}", tid, mode);
                return Err(DbError::TransactionAborted);
            }
            // else retry the whole acquire from scratch.
        }
    }

    /// Release the lock record `tid` holds, if any. Infallible; a no-op
    /// when `tid` doesn't hold this page.
    pub fn release(&self, tid: TransactionId) {
        let mut guard = self.state.lock().unwrap();
        if let Some(pos) = guard.holders.iter().position(|h| h.tid == tid) {
            guard.holders.remove(pos);
        }

        if let Some(pos) = guard.waiters.iter().position(|w| w.mode == LockMode::Exclusive) {
            let waiter = guard.waiters.remove(pos).unwrap();
            waiter.signal.notify_one();
        } else {
            for waiter in guard.waiters.iter() {
                waiter.signal.notify_one();
            }
        }
    }

    pub fn holds(&self, tid: TransactionId) -> bool {
        self.state.lock().unwrap().holder_mode(tid).is_some()
    }
}

impl Default for PageLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn shared_locks_are_concurrent() {
        let latch = PageLatch::new();
        let t1 = TransactionId::new();
        let t2 = TransactionId::new();
        latch.acquire(t1, LockMode::Shared).unwrap();
        latch.acquire(t2, LockMode::Shared).unwrap();
        assert!(latch.holds(t1));
        assert!(latch.holds(t2));
    }

    #[test]
    fn exclusive_excludes_everyone() {
        let latch = StdArc::new(PageLatch::new());
        let t1 = TransactionId::new();
        let t2 = TransactionId::new();
        latch.acquire(t1, LockMode::Exclusive).unwrap();

        let latch2 = StdArc::clone(&latch);
        let start = Instant::now();
        let handle = thread::spawn(move || latch2.acquire(t2, LockMode::Exclusive));

        thread::sleep(Duration::from_millis(50));
        assert!(latch.holds(t1));
        latch.release(t1);

        let result = handle.join().unwrap();
        assert!(result.is_ok());
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn conflicting_request_times_out_with_abort() {
        let latch = StdArc::new(PageLatch::new());
        let t1 = TransactionId::new();
        let t2 = TransactionId::new();
        latch.acquire(t1, LockMode::Exclusive).unwrap();

        let latch2 = StdArc::clone(&latch);
        let start = Instant::now();
        let handle = thread::spawn(move || latch2.acquire(t2, LockMode::Exclusive));

        let result = handle.join().unwrap();
        assert!(matches!(result, Err(DbError::TransactionAborted)));
        assert!(start.elapsed() <= Duration::from_secs(4));
        assert!(latch.holds(t1));
    }

    #[test]
    fn upgrade_from_shared_to_exclusive() {
        let latch = PageLatch::new();
        let t1 = TransactionId::new();
        latch.acquire(t1, LockMode::Shared).unwrap();
        latch.acquire(t1, LockMode::Exclusive).unwrap();
        assert!(latch.holds(t1));
    }

    #[test]
    fn release_is_a_noop_when_not_held() {
        let latch = PageLatch::new();
        let t1 = TransactionId::new();
        latch.release(t1);
        assert!(!latch.holds(t1));
    }
}
