/// Identifies a page by the table it belongs to and its 0-based index
/// within that table's heap file. Equality and hash are structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId {
    pub table_id: i32,
    pub page_index: usize,
}

impl PageId {
    pub fn new(table_id: i32, page_index: usize) -> Self {
        PageId { table_id, page_index }
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page({}, {})", self.table_id, self.page_index)
    }
}

/// Identifies a tuple's storage location: the page it lives on plus its
/// slot index within that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot_index: usize,
}

impl RecordId {
    pub fn new(page_id: PageId, slot_index: usize) -> Self {
        RecordId { page_id, slot_index }
    }
}
