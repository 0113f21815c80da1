//! The pull-based iterator contract every operator (scan, filter,
//! project, join, insert, delete, aggregate) honors.
//!
//! `open` must be called before `has_next`/`next`; the initial position is
//! before the first row; `rewind` resets to that position; `close`
//! releases the iterator's state; `next` after exhaustion raises
//! `NoSuchElement`; `has_next`/`next` on a closed or never-opened
//! operator raises `DbException`.

use crate::error::DbResult;
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;

pub trait OpIterator {
    /// Must be called before `has_next`/`next`. Idempotent: `open; open`
    /// behaves as a single `open`.
    fn open(&mut self) -> DbResult<()>;

    /// Release resources; subsequent `has_next`/`next` calls raise
    /// `DbException` until the iterator is `open`ed again. Always safe
    /// to call, including on an already-closed iterator.
    fn close(&mut self);

    /// Restart production from the beginning, preserving the operator
    /// tree. Equivalent to `close(); open()`.
    fn rewind(&mut self) -> DbResult<()>;

    /// Idempotent: does not consume a row.
    fn has_next(&mut self) -> DbResult<bool>;

    /// Advance exactly one row. Raises `NoSuchElement` at EOF.
    fn next(&mut self) -> DbResult<Tuple>;

    fn schema(&self) -> &TupleDesc;
}

/// Tree-shaped composition: every operator reports and accepts its
/// children so a plan can be rewritten/rewound uniformly.
pub trait Operator: OpIterator {
    fn children(&self) -> Vec<&dyn OpIterator>;
    fn set_children(&mut self, children: Vec<Box<dyn OpIterator + Send>>);
}
