//! Drains its child into an `Aggregator` on `open`, then replays the
//! aggregator's grouped results.

use crate::aggregator::Aggregator;
use crate::error::DbResult;
use crate::op_iterator::{OpIterator, Operator};
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;

pub struct Aggregate {
    child: Box<dyn OpIterator + Send>,
    aggregator: Box<dyn Aggregator>,
    result: Option<Box<dyn OpIterator + Send>>,
}

impl Aggregate {
    pub fn new(child: Box<dyn OpIterator + Send>, aggregator: Box<dyn Aggregator>) -> Self {
        Aggregate { child, aggregator, result: None }
    }
}

impl OpIterator for Aggregate {
    fn open(&mut self) -> DbResult<()> {
        self.aggregator.reset();
        self.child.open()?;
        while self.child.has_next()? {
            let t = self.child.next()?;
            self.aggregator.merge(&t)?;
        }
        self.child.close();

        let mut result = self.aggregator.iterator();
        result.open()?;
        self.result = Some(result);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(r) = self.result.as_mut() {
            r.close();
        }
        self.result = None;
    }

    fn rewind(&mut self) -> DbResult<()> {
        match self.result.as_mut() {
            Some(r) => r.rewind(),
            None => self.open(),
        }
    }

    fn has_next(&mut self) -> DbResult<bool> {
        match self.result.as_mut() {
            Some(r) => r.has_next(),
            None => Err(crate::error::DbError::exception("aggregate iterator not open")),
        }
    }

    fn next(&mut self) -> DbResult<Tuple> {
        match self.result.as_mut() {
            Some(r) => r.next(),
            None => Err(crate::error::DbError::exception("aggregate iterator not open")),
        }
    }

    fn schema(&self) -> &TupleDesc {
        match self.result.as_ref() {
            Some(r) => r.schema(),
            None => self.child.schema(),
        }
    }
}

impl Operator for Aggregate {
    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }

    fn set_children(&mut self, mut children: Vec<Box<dyn OpIterator + Send>>) {
        self.child = children.remove(0);
    }
}
