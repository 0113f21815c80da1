//! Name/id → file mapping, loaded from a line-oriented catalog file
//! format. Each table maps to one flat `PageStore`.

use crate::error::{DbError, DbResult};
use crate::field::Type;
use crate::page_store::PageStore;
use crate::tuple_desc::TupleDesc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Catalog {
    by_id: HashMap<i32, Arc<PageStore>>,
    name_to_id: HashMap<String, i32>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            by_id: HashMap::new(),
            name_to_id: HashMap::new(),
        }
    }

    pub fn add_table(&mut self, name: &str, store: Arc<PageStore>) {
        let id = store.id();
        self.name_to_id.insert(name.to_string(), id);
        self.by_id.insert(id, store);
    }

    pub fn get_table(&self, table_id: i32) -> DbResult<Arc<PageStore>> {
        self.by_id.get(&table_id).cloned().ok_or(DbError::NoSuchElement)
    }

    pub fn get_table_id(&self, name: &str) -> DbResult<i32> {
        self.name_to_id.get(name).copied().ok_or(DbError::NoSuchElement)
    }

    /// Parse and load every table declared in a catalog file.
    ///
    /// Line format: `name (field type[, field type]*)`, `type ∈ {int,
    /// string}`, a field may be suffixed with ` pk` (recorded but not
    /// otherwise enforced by the core). Data file is
    /// `<base_dir>/<name>.dat`. Unknown type or annotation is fatal.
    pub fn load_file(&mut self, path: impl AsRef<Path>, base_dir: impl AsRef<Path>) -> DbResult<()> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (name, tuple_desc) = parse_catalog_line(line)?;
            let data_path: PathBuf = base_dir.as_ref().join(format!("{}.dat", name));
            let store = PageStore::new(data_path, tuple_desc)?;
            self.add_table(&name, Arc::new(store));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.name_to_id.clear();
    }
}

fn parse_catalog_line(line: &str) -> DbResult<(String, TupleDesc)> {
    let open = line
        .find('(')
        .ok_or_else(|| DbError::exception(format!("malformed catalog line: {}", line)))?;
    let close = line
        .rfind(')')
        .ok_or_else(|| DbError::exception(format!("malformed catalog line: {}", line)))?;
    let name = line[..open].trim().to_string();
    let body = &line[open + 1..close];

    let mut fields = Vec::new();
    for field_spec in body.split(',') {
        let parts: Vec<&str> = field_spec.split_whitespace().collect();
        let (field_name, type_str) = match parts.as_slice() {
            [n, t] => (*n, *t),
            [n, t, "pk"] => (*n, *t),
            _ => {
                return Err(DbError::exception(format!(
                    "malformed field spec: {}",
                    field_spec
                )))
            }
        };
        let field_type = match type_str {
            "int" => Type::Int,
            "string" => Type::String(128),
            other => {
                return Err(DbError::exception(format!("unknown field type: {}", other)))
            }
        };
        fields.push((field_name.to_string(), field_type));
    }

    Ok((name, TupleDesc::new(fields)))
}
