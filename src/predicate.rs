//! Single-field comparison predicates used by `Filter` and the nested-loop
//! `Join`.

use crate::field::Field;
use crate::tuple::Tuple;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
}

impl Op {
    fn matches(self, cmp: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match (self, cmp) {
            (Op::Equals, Equal) => true,
            (Op::NotEquals, Less) | (Op::NotEquals, Greater) => true,
            (Op::GreaterThan, Greater) => true,
            (Op::GreaterThanOrEq, Greater) | (Op::GreaterThanOrEq, Equal) => true,
            (Op::LessThan, Less) => true,
            (Op::LessThanOrEq, Less) | (Op::LessThanOrEq, Equal) => true,
            _ => false,
        }
    }
}

/// Compares one field of a tuple against a fixed constant.
pub struct Predicate {
    field_index: usize,
    op: Op,
    operand: Field,
}

impl Predicate {
    pub fn new(field_index: usize, op: Op, operand: Field) -> Self {
        Predicate { field_index, op, operand }
    }

    /// Fields of differing type never match; string/int values only
    /// compare against values of their own variant.
    pub fn filter(&self, tuple: &Tuple) -> bool {
        match tuple.get_field(self.field_index).partial_cmp(&self.operand) {
            Some(cmp) => self.op.matches(cmp),
            None => false,
        }
    }
}

/// Compares one field of the outer tuple against one field of the inner
/// tuple, used by the nested-loop join.
pub struct JoinPredicate {
    outer_index: usize,
    op: Op,
    inner_index: usize,
}

impl JoinPredicate {
    pub fn new(outer_index: usize, op: Op, inner_index: usize) -> Self {
        JoinPredicate { outer_index, op, inner_index }
    }

    pub fn filter(&self, outer: &Tuple, inner: &Tuple) -> bool {
        let a = outer.get_field(self.outer_index);
        let b = inner.get_field(self.inner_index);
        match a.partial_cmp(b) {
            Some(cmp) => self.op.matches(cmp),
            None => false,
        }
    }
}
