//! Reorders/narrows a child's fields to a chosen output schema.

use crate::error::DbResult;
use crate::op_iterator::{OpIterator, Operator};
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;

pub struct Project {
    field_indices: Vec<usize>,
    schema: TupleDesc,
    child: Box<dyn OpIterator + Send>,
}

impl Project {
    pub fn new(field_indices: Vec<usize>, schema: TupleDesc, child: Box<dyn OpIterator + Send>) -> Self {
        Project { field_indices, schema, child }
    }
}

impl OpIterator for Project {
    fn open(&mut self) -> DbResult<()> {
        self.child.open()
    }

    fn close(&mut self) {
        self.child.close()
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.child.rewind()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        self.child.has_next()
    }

    fn next(&mut self) -> DbResult<Tuple> {
        let t = self.child.next()?;
        let cells = self.field_indices.iter().map(|&i| t.get_field(i).clone()).collect();
        Ok(Tuple::new(cells))
    }

    fn schema(&self) -> &TupleDesc {
        &self.schema
    }
}

impl Operator for Project {
    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }

    fn set_children(&mut self, mut children: Vec<Box<dyn OpIterator + Send>>) {
        self.child = children.remove(0);
    }
}
