//! Nested-loop equality/inequality join: for each outer row, rewinds the
//! inner child and emits every matching pair concatenated outer-then-inner.

use crate::error::DbResult;
use crate::op_iterator::{OpIterator, Operator};
use crate::predicate::JoinPredicate;
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;

pub struct Join {
    predicate: JoinPredicate,
    outer: Box<dyn OpIterator + Send>,
    inner: Box<dyn OpIterator + Send>,
    schema: TupleDesc,
    current_outer: Option<Tuple>,
    pending: Option<(Tuple, Tuple)>,
}

impl Join {
    pub fn new(
        predicate: JoinPredicate,
        outer: Box<dyn OpIterator + Send>,
        inner: Box<dyn OpIterator + Send>,
    ) -> Self {
        let schema = TupleDesc::merge(outer.schema(), inner.schema());
        Join { predicate, outer, inner, schema, current_outer: None, pending: None }
    }
}

impl OpIterator for Join {
    fn open(&mut self) -> DbResult<()> {
        self.outer.open()?;
        self.inner.open()?;
        self.current_outer = None;
        Ok(())
    }

    fn close(&mut self) {
        self.current_outer = None;
        self.pending = None;
        self.outer.close();
        self.inner.close();
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.current_outer = None;
        self.pending = None;
        self.outer.rewind()?;
        self.inner.rewind()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        loop {
            if self.current_outer.is_none() {
                if !self.outer.has_next()? {
                    return Ok(false);
                }
                self.current_outer = Some(self.outer.next()?);
                self.inner.rewind()?;
            }

            let outer = self.current_outer.as_ref().unwrap();
            while self.inner.has_next()? {
                let inner = self.inner.next()?;
                if self.predicate.filter(outer, &inner) {
                    self.pending = Some((outer.clone(), inner));
                    return Ok(true);
                }
            }
            // inner exhausted for this outer row; advance to the next one
            self.current_outer = None;
        }
    }

    fn next(&mut self) -> DbResult<Tuple> {
        if self.pending.is_none() && !self.has_next()? {
            return Err(crate::error::DbError::NoSuchElement);
        }
        let (outer, inner) = self.pending.take().unwrap();
        let mut cells = outer.fields().to_vec();
        cells.extend(inner.fields().iter().cloned());
        Ok(Tuple::new(cells))
    }

    fn schema(&self) -> &TupleDesc {
        &self.schema
    }
}

impl Operator for Join {
    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.outer.as_ref(), self.inner.as_ref()]
    }

    fn set_children(&mut self, mut children: Vec<Box<dyn OpIterator + Send>>) {
        self.inner = children.remove(1);
        self.outer = children.remove(0);
    }
}
