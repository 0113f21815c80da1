//! Grouped and ungrouped aggregation over a column of incoming tuples.
//!
//! An aggregator is fed tuples one at a time through `merge`; once the
//! child producing them is exhausted, `iterator` hands back the final
//! per-group results as a fresh `OpIterator`. `IntegerAggregator` supports
//! every `AggregateOp`; `StringAggregator` only `Count`, since the other
//! operations have no meaning over text.

use crate::error::{DbError, DbResult};
use crate::field::{Field, Type};
use crate::op_iterator::OpIterator;
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl AggregateOp {
    fn name(self) -> &'static str {
        match self {
            AggregateOp::Min => "MIN",
            AggregateOp::Max => "MAX",
            AggregateOp::Sum => "SUM",
            AggregateOp::Avg => "AVG",
            AggregateOp::Count => "COUNT",
        }
    }
}

pub trait Aggregator: Send {
    fn merge(&mut self, tuple: &Tuple) -> DbResult<()>;
    fn iterator(&self) -> Box<dyn OpIterator + Send>;
    /// Drop all accumulated group state, as if no tuple had ever been merged.
    fn reset(&mut self);
}

/// Running state kept per group: enough to answer any `AggregateOp`
/// without re-scanning, including a running (sum, count) pair so `Avg`
/// stays exact rather than averaging partial averages.
#[derive(Debug, Clone, Copy)]
struct State {
    sum: i32,
    count: i32,
    min: i32,
    max: i32,
}

impl State {
    fn first(v: i32) -> Self {
        State { sum: v, count: 1, min: v, max: v }
    }

    fn merge(&mut self, v: i32) {
        self.sum += v;
        self.count += 1;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    fn result(&self, op: AggregateOp) -> i32 {
        match op {
            AggregateOp::Min => self.min,
            AggregateOp::Max => self.max,
            AggregateOp::Sum => self.sum,
            AggregateOp::Avg => self.sum / self.count,
            AggregateOp::Count => self.count,
        }
    }
}

const NO_GROUPING_KEY: Option<Field> = None;

pub struct IntegerAggregator {
    group_field: Option<usize>,
    group_type: Option<Type>,
    agg_field: usize,
    op: AggregateOp,
    groups: HashMap<Option<Field>, State>,
    /// Preserves first-seen order so output is deterministic across runs
    /// of the same input, rather than HashMap iteration order.
    order: Vec<Option<Field>>,
}

impl IntegerAggregator {
    pub fn new(
        group_field: Option<(usize, Type)>,
        agg_field: usize,
        op: AggregateOp,
    ) -> Self {
        let (group_field, group_type) = match group_field {
            Some((idx, t)) => (Some(idx), Some(t)),
            None => (None, None),
        };
        IntegerAggregator {
            group_field,
            group_type,
            agg_field,
            op,
            groups: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn output_schema(&self) -> TupleDesc {
        match self.group_type {
            Some(gt) => TupleDesc::new(vec![
                ("groupby".to_string(), gt),
                (self.op.name().to_string(), Type::Int),
            ]),
            None => TupleDesc::new(vec![(self.op.name().to_string(), Type::Int)]),
        }
    }

    fn rows(&self) -> Vec<Tuple> {
        self.order
            .iter()
            .map(|key| {
                let state = &self.groups[key];
                let value = Field::Int(state.result(self.op));
                match key {
                    Some(f) => Tuple::new(vec![f.clone(), value]),
                    None => Tuple::new(vec![value]),
                }
            })
            .collect()
    }
}

impl Aggregator for IntegerAggregator {
    fn merge(&mut self, tuple: &Tuple) -> DbResult<()> {
        let key = match self.group_field {
            Some(idx) => Some(tuple.get_field(idx).clone()),
            None => NO_GROUPING_KEY,
        };
        let v = tuple
            .get_field(self.agg_field)
            .as_int()
            .ok_or_else(|| DbError::exception("aggregate field is not an integer"))?;

        match self.groups.get_mut(&key) {
            Some(state) => state.merge(v),
            None => {
                self.groups.insert(key.clone(), State::first(v));
                self.order.push(key);
            }
        }
        Ok(())
    }

    fn iterator(&self) -> Box<dyn OpIterator + Send> {
        Box::new(MaterializedIterator::new(self.output_schema(), self.rows()))
    }

    fn reset(&mut self) {
        self.groups.clear();
        self.order.clear();
    }
}

pub struct StringAggregator {
    group_field: Option<usize>,
    group_type: Option<Type>,
    agg_field: usize,
    op: AggregateOp,
    counts: HashMap<Option<Field>, i32>,
    order: Vec<Option<Field>>,
}

impl StringAggregator {
    pub fn new(
        group_field: Option<(usize, Type)>,
        agg_field: usize,
        op: AggregateOp,
    ) -> DbResult<Self> {
        if op != AggregateOp::Count {
            return Err(DbError::UnsupportedOperation(format!(
                "string aggregation only supports count, got {:?}",
                op
            )));
        }
        let (group_field, group_type) = match group_field {
            Some((idx, t)) => (Some(idx), Some(t)),
            None => (None, None),
        };
        Ok(StringAggregator {
            group_field,
            group_type,
            agg_field,
            op,
            counts: HashMap::new(),
            order: Vec::new(),
        })
    }

    fn output_schema(&self) -> TupleDesc {
        match self.group_type {
            Some(gt) => TupleDesc::new(vec![
                ("groupby".to_string(), gt),
                (self.op.name().to_string(), Type::Int),
            ]),
            None => TupleDesc::new(vec![(self.op.name().to_string(), Type::Int)]),
        }
    }

    fn rows(&self) -> Vec<Tuple> {
        self.order
            .iter()
            .map(|key| {
                let count = self.counts[key];
                let value = Field::Int(count);
                match key {
                    Some(f) => Tuple::new(vec![f.clone(), value]),
                    None => Tuple::new(vec![value]),
                }
            })
            .collect()
    }
}

impl Aggregator for StringAggregator {
    fn merge(&mut self, tuple: &Tuple) -> DbResult<()> {
        let key = match self.group_field {
            Some(idx) => Some(tuple.get_field(idx).clone()),
            None => NO_GROUPING_KEY,
        };
        // presence is all that's counted; the field's value is untouched
        let _ = tuple.get_field(self.agg_field);

        match self.counts.get_mut(&key) {
            Some(c) => *c += 1,
            None => {
                self.counts.insert(key.clone(), 1);
                self.order.push(key);
            }
        }
        Ok(())
    }

    fn iterator(&self) -> Box<dyn OpIterator + Send> {
        Box::new(MaterializedIterator::new(self.output_schema(), self.rows()))
    }

    fn reset(&mut self) {
        self.counts.clear();
        self.order.clear();
    }
}

/// A fixed row set replayed under the full `OpIterator` contract: `open`
/// before use, `rewind` resets position, `close` ends production,
/// `next` past the end raises `NoSuchElement`.
struct MaterializedIterator {
    schema: TupleDesc,
    rows: Vec<Tuple>,
    pos: usize,
    opened: bool,
}

impl MaterializedIterator {
    fn new(schema: TupleDesc, rows: Vec<Tuple>) -> Self {
        MaterializedIterator { schema, rows, pos: 0, opened: false }
    }
}

impl OpIterator for MaterializedIterator {
    fn open(&mut self) -> DbResult<()> {
        self.pos = 0;
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) {
        self.opened = false;
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.close();
        self.open()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        if !self.opened {
            return Err(DbError::exception("iterator not open"));
        }
        Ok(self.pos < self.rows.len())
    }

    fn next(&mut self) -> DbResult<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        let t = self.rows[self.pos].clone();
        self.pos += 1;
        Ok(t)
    }

    fn schema(&self) -> &TupleDesc {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(group: Option<i32>, value: i32) -> Tuple {
        match group {
            Some(g) => Tuple::new(vec![Field::Int(g), Field::Int(value)]),
            None => Tuple::new(vec![Field::Int(value)]),
        }
    }

    #[test]
    fn ungrouped_avg_is_exact() {
        let mut agg = IntegerAggregator::new(None, 0, AggregateOp::Avg);
        for v in [1, 2, 3, 4] {
            agg.merge(&row(None, v)).unwrap();
        }
        let mut it = agg.iterator();
        it.open().unwrap();
        let t = it.next().unwrap();
        assert_eq!(*t.get_field(0), Field::Int(2));
        assert!(!it.has_next().unwrap());
    }

    #[test]
    fn grouped_sum_keeps_groups_separate() {
        let mut agg = IntegerAggregator::new(Some((0, Type::Int)), 1, AggregateOp::Sum);
        agg.merge(&row(Some(1), 10)).unwrap();
        agg.merge(&row(Some(2), 20)).unwrap();
        agg.merge(&row(Some(1), 5)).unwrap();

        let mut it = agg.iterator();
        it.open().unwrap();
        let a = it.next().unwrap();
        assert_eq!(*a.get_field(0), Field::Int(1));
        assert_eq!(*a.get_field(1), Field::Int(15));
        let b = it.next().unwrap();
        assert_eq!(*b.get_field(0), Field::Int(2));
        assert_eq!(*b.get_field(1), Field::Int(20));
        assert!(!it.has_next().unwrap());
    }

    #[test]
    fn string_aggregator_rejects_non_count() {
        let err = StringAggregator::new(None, 0, AggregateOp::Sum);
        assert!(matches!(err, Err(DbError::UnsupportedOperation(_))));
    }

    #[test]
    fn string_aggregator_counts_grouped_rows() {
        let mut agg = StringAggregator::new(Some((0, Type::Int)), 1, AggregateOp::Count).unwrap();
        agg.merge(&Tuple::new(vec![Field::Int(1), Field::Str("a".into())])).unwrap();
        agg.merge(&Tuple::new(vec![Field::Int(1), Field::Str("b".into())])).unwrap();
        agg.merge(&Tuple::new(vec![Field::Int(2), Field::Str("c".into())])).unwrap();

        let mut it = agg.iterator();
        it.open().unwrap();
        let a = it.next().unwrap();
        assert_eq!(*a.get_field(0), Field::Int(1));
        assert_eq!(*a.get_field(1), Field::Int(2));
        let b = it.next().unwrap();
        assert_eq!(*b.get_field(1), Field::Int(1));
    }

    #[test]
    fn exhausted_iterator_raises_no_such_element() {
        let mut agg = IntegerAggregator::new(None, 0, AggregateOp::Count);
        agg.merge(&row(None, 1)).unwrap();
        let mut it = agg.iterator();
        it.open().unwrap();
        it.next().unwrap();
        assert!(matches!(it.next(), Err(DbError::NoSuchElement)));
    }
}
