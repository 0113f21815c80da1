//! Fixed-size, byte-backed page container.
//!
//! Layout: a slot-usage bitmap (one bit per slot, most-significant-bit
//! first within each byte) followed by fixed-width tuple slots, padded
//! to `PAGE_SIZE`.

use crate::field::Field;
use crate::page_id::{PageId, RecordId};
use crate::transaction_id::TransactionId;
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;
use crate::types::page_size;
use bit_vec::BitVec;
use std::io::Cursor;
use std::sync::Arc;

/// Identity, dirty lifecycle, and (de)serialization shared by every page
/// kind the cache manages. A page lives in the buffer pool from fetch
/// until eviction/discard; callers only ever see a borrowed view of one
/// for the duration of a single operator call.
pub trait Page {
    fn page_id(&self) -> PageId;
    /// `None` when clean; `Some(tid)` names the transaction that dirtied it.
    fn dirty(&self) -> Option<TransactionId>;
    fn mark_dirty(&mut self, tid: Option<TransactionId>);
    fn get_page_data(&self) -> Vec<u8>;
}

/// Number of fixed-width tuple slots that fit in one page under the
/// given schema, accounting for the 1-bit-per-slot header.
pub fn slots_per_page(tuple_desc: &TupleDesc) -> usize {
    let tuple_width = tuple_desc.tuple_width();
    (page_size() * 8) / (tuple_width * 8 + 1)
}

pub fn header_size_bytes(tuple_desc: &TupleDesc) -> usize {
    (slots_per_page(tuple_desc) + 7) / 8
}

/// One page of a heap file: a slot-usage header plus a flat array of
/// fixed-width tuple slots.
pub struct HeapPage {
    pid: PageId,
    tuple_desc: Arc<TupleDesc>,
    header: BitVec,
    slots: Vec<Option<Tuple>>,
    dirty: Option<TransactionId>,
}

impl HeapPage {
    /// Deserialize a page's raw bytes (exactly `PAGE_SIZE` long).
    pub fn new(pid: PageId, tuple_desc: Arc<TupleDesc>, bytes: &[u8]) -> Self {
        let header_len = header_size_bytes(&tuple_desc);
        let n_slots = slots_per_page(&tuple_desc);
        let header = BitVec::from_bytes(&bytes[0..header_len]);

        let mut slots = Vec::with_capacity(n_slots);
        let tuple_width = tuple_desc.tuple_width();
        let mut offset = header_len;
        for slot in 0..n_slots {
            if header.get(slot).unwrap_or(false) {
                let slot_bytes = &bytes[offset..offset + tuple_width];
                let mut cursor = Cursor::new(slot_bytes);
                let mut cells = Vec::with_capacity(tuple_desc.num_fields());
                for i in 0..tuple_desc.num_fields() {
                    cells.push(Field::decode_fixed(&mut cursor, tuple_desc.field_type(i)));
                }
                let mut tuple = Tuple::new(cells);
                tuple.set_record_id(RecordId::new(pid, slot));
                slots.push(Some(tuple));
            } else {
                slots.push(None);
            }
            offset += tuple_width;
        }

        HeapPage {
            pid,
            tuple_desc,
            header,
            slots,
            dirty: None,
        }
    }

    /// A freshly-allocated, all-empty page of the given schema.
    pub fn empty(pid: PageId, tuple_desc: Arc<TupleDesc>) -> Self {
        let header_len = header_size_bytes(&tuple_desc);
        let n_slots = slots_per_page(&tuple_desc);
        HeapPage {
            pid,
            tuple_desc,
            header: BitVec::from_elem(header_len * 8, false),
            slots: vec![None; n_slots],
            dirty: None,
        }
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn empty_slot(&self) -> Option<usize> {
        self.slots.iter().position(|s| s.is_none())
    }

    pub fn num_used_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Insert `tuple` into `slot`, marking the slot used.
    pub fn insert_at(&mut self, slot: usize, mut tuple: Tuple) {
        tuple.set_record_id(RecordId::new(self.pid, slot));
        self.header.set(slot, true);
        self.slots[slot] = Some(tuple);
    }

    /// Remove the tuple at `slot`, if it names one on this page.
    pub fn delete_at(&mut self, slot: usize) -> bool {
        if self.slots[slot].is_none() {
            return false;
        }
        self.header.set(slot, false);
        self.slots[slot] = None;
        true
    }

    /// Every live tuple on the page, in slot order.
    pub fn tuples(&self) -> impl Iterator<Item = &Tuple> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }
}

impl Page for HeapPage {
    fn page_id(&self) -> PageId {
        self.pid
    }

    fn dirty(&self) -> Option<TransactionId> {
        self.dirty
    }

    fn mark_dirty(&mut self, tid: Option<TransactionId>) {
        self.dirty = tid;
    }

    fn get_page_data(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(page_size());
        buf.extend_from_slice(&self.header.to_bytes());

        let tuple_width = self.tuple_desc.tuple_width();
        for slot in &self.slots {
            match slot {
                Some(tuple) => {
                    for i in 0..self.tuple_desc.num_fields() {
                        buf.extend(tuple.get_field(i).encode_fixed(self.tuple_desc.field_type(i)));
                    }
                }
                None => buf.extend(std::iter::repeat(0u8).take(tuple_width)),
            }
        }

        buf.resize(page_size(), 0);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, Type};

    fn schema() -> Arc<TupleDesc> {
        Arc::new(TupleDesc::new(vec![
            ("a".into(), Type::Int),
            ("b".into(), Type::Int),
        ]))
    }

    #[test]
    fn insert_delete_round_trip_through_bytes() {
        let pid = PageId::new(1, 0);
        let mut page = HeapPage::empty(pid, schema());
        let slot = page.empty_slot().unwrap();
        page.insert_at(slot, Tuple::new(vec![Field::Int(7), Field::Int(9)]));
        assert_eq!(page.num_used_slots(), 1);

        let bytes = page.get_page_data();
        assert_eq!(bytes.len(), page_size());

        let reloaded = HeapPage::new(pid, schema(), &bytes);
        let tuples: Vec<_> = reloaded.tuples().collect();
        assert_eq!(tuples.len(), 1);
        assert_eq!(*tuples[0].get_field(0), Field::Int(7));
        assert_eq!(*tuples[0].get_field(1), Field::Int(9));
    }

    #[test]
    fn delete_frees_the_slot_for_reuse() {
        let pid = PageId::new(1, 0);
        let mut page = HeapPage::empty(pid, schema());
        let slot = page.empty_slot().unwrap();
        page.insert_at(slot, Tuple::new(vec![Field::Int(1), Field::Int(2)]));
        assert!(page.delete_at(slot));
        assert!(!page.delete_at(slot));
        assert_eq!(page.num_used_slots(), 0);
        assert_eq!(page.empty_slot(), Some(slot));
    }
}
