//! Leaf operator: a full scan of one table's heap file.

use crate::error::DbResult;
use crate::op_iterator::{OpIterator, Operator};
use crate::page_store::{HeapFileIterator, PageStore};
use crate::transaction_id::TransactionId;
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;
use std::sync::Arc;

pub struct SeqScan {
    tid: TransactionId,
    store: Arc<PageStore>,
    inner: HeapFileIterator,
}

impl SeqScan {
    pub fn new(tid: TransactionId, store: Arc<PageStore>) -> Self {
        let inner = store.iterator(tid);
        SeqScan { tid, store, inner }
    }
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> DbResult<()> {
        self.inner.open()
    }

    fn close(&mut self) {
        self.inner.close()
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.inner = self.store.iterator(self.tid);
        self.inner.open()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        self.inner.has_next()
    }

    fn next(&mut self) -> DbResult<Tuple> {
        self.inner.next()
    }

    fn schema(&self) -> &TupleDesc {
        self.store.schema()
    }
}

impl Operator for SeqScan {
    fn children(&self) -> Vec<&dyn OpIterator> {
        Vec::new()
    }

    fn set_children(&mut self, _children: Vec<Box<dyn OpIterator + Send>>) {
        // leaf operator: no children to accept
    }
}
