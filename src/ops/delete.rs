//! Drains its child and deletes every row it reads (using each tuple's
//! own record id), then yields a single count tuple before going EOF.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::field::{Field, Type};
use crate::op_iterator::{OpIterator, Operator};
use crate::transaction_id::TransactionId;
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;

pub struct Delete {
    tid: TransactionId,
    child: Box<dyn OpIterator + Send>,
    schema: TupleDesc,
    opened: bool,
    done: bool,
}

impl Delete {
    pub fn new(tid: TransactionId, child: Box<dyn OpIterator + Send>) -> Self {
        Delete {
            tid,
            child,
            schema: TupleDesc::new(vec![("count".to_string(), Type::Int)]),
            opened: false,
            done: false,
        }
    }
}

impl OpIterator for Delete {
    fn open(&mut self) -> DbResult<()> {
        self.opened = true;
        self.done = false;
        self.child.open()
    }

    fn close(&mut self) {
        self.opened = false;
        self.done = true;
        self.child.close();
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.done = false;
        self.child.rewind()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        if !self.opened {
            return Err(DbError::exception("iterator not open"));
        }
        Ok(!self.done)
    }

    fn next(&mut self) -> DbResult<Tuple> {
        if !self.opened {
            return Err(DbError::exception("iterator not open"));
        }
        if self.done {
            return Err(DbError::NoSuchElement);
        }
        let pool = Database::buffer_pool();
        let mut count = 0i32;
        while self.child.has_next()? {
            let t = self.child.next()?;
            pool.delete_tuple(self.tid, &t)?;
            count += 1;
        }
        self.done = true;
        Ok(Tuple::new(vec![Field::Int(count)]))
    }

    fn schema(&self) -> &TupleDesc {
        &self.schema
    }
}

impl Operator for Delete {
    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }

    fn set_children(&mut self, mut children: Vec<Box<dyn OpIterator + Send>>) {
        self.child = children.remove(0);
    }
}
