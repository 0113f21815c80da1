//! Passes through only the rows its predicate accepts.

use crate::error::DbResult;
use crate::op_iterator::{OpIterator, Operator};
use crate::predicate::Predicate;
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;

pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator + Send>,
    pending: Option<Tuple>,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator + Send>) -> Self {
        Filter { predicate, child, pending: None }
    }
}

impl OpIterator for Filter {
    fn open(&mut self) -> DbResult<()> {
        self.child.open()
    }

    fn close(&mut self) {
        self.pending = None;
        self.child.close()
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.pending = None;
        self.child.rewind()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        while self.child.has_next()? {
            let t = self.child.next()?;
            if self.predicate.filter(&t) {
                self.pending = Some(t);
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn next(&mut self) -> DbResult<Tuple> {
        if let Some(t) = self.pending.take() {
            return Ok(t);
        }
        if !self.has_next()? {
            return Err(crate::error::DbError::NoSuchElement);
        }
        Ok(self.pending.take().unwrap())
    }

    fn schema(&self) -> &TupleDesc {
        self.child.schema()
    }
}

impl Operator for Filter {
    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }

    fn set_children(&mut self, mut children: Vec<Box<dyn OpIterator + Send>>) {
        self.child = children.remove(0);
    }
}
