use crate::field::Type;

#[derive(Debug, Clone, PartialEq)]
struct FieldItem {
    name: String,
    field_type: Type,
}

/// Schema descriptor: an ordered list of (name, type) pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TupleDesc {
    fields: Vec<FieldItem>,
}

impl TupleDesc {
    pub fn new(fields: Vec<(String, Type)>) -> Self {
        TupleDesc {
            fields: fields
                .into_iter()
                .map(|(name, field_type)| FieldItem { name, field_type })
                .collect(),
        }
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn field_type(&self, i: usize) -> Type {
        self.fields[i].field_type
    }

    pub fn field_name(&self, i: usize) -> &str {
        &self.fields[i].name
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Total on-disk byte width of one tuple under this schema.
    pub fn tuple_width(&self) -> usize {
        self.fields.iter().map(|f| f.field_type.width()).sum()
    }

    pub fn merge(a: &TupleDesc, b: &TupleDesc) -> TupleDesc {
        let mut fields = a.fields.clone();
        fields.extend(b.fields.clone());
        TupleDesc { fields }
    }
}
