//! Documents and write operations

use crate::path::DocPath;
use serde_json::{Map, Value};

/// Top-level fields of a document
pub type Fields = Map<String, Value>;

/// A stored document together with its full path
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocPath,
    pub fields: Fields,
}

impl Document {
    pub fn new(path: DocPath, fields: Fields) -> Self {
        Self { path, fields }
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}

/// A single write inside a batch
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or overwrite. With `merge`, only the given top-level fields are
    /// written and every other field is left alone.
    Set {
        path: DocPath,
        fields: Fields,
        merge: bool,
    },
    /// Patch an existing document: write `fields`, delete the `remove` keys.
    /// Fails the whole batch if the document does not exist.
    Update {
        path: DocPath,
        fields: Fields,
        remove: Vec<String>,
    },
    /// Delete a document. Deleting a missing document is not an error.
    Delete { path: DocPath },
}

impl WriteOp {
    pub fn set(path: DocPath, fields: Fields) -> Self {
        Self::Set {
            path,
            fields,
            merge: false,
        }
    }

    pub fn set_merge(path: DocPath, fields: Fields) -> Self {
        Self::Set {
            path,
            fields,
            merge: true,
        }
    }

    pub fn update(path: DocPath, fields: Fields) -> Self {
        Self::Update {
            path,
            fields,
            remove: Vec::new(),
        }
    }

    /// Delete the named fields of an existing document
    pub fn remove_fields(path: DocPath, remove: Vec<String>) -> Self {
        Self::Update {
            path,
            fields: Fields::new(),
            remove,
        }
    }

    pub fn delete(path: DocPath) -> Self {
        Self::Delete { path }
    }

    pub fn path(&self) -> &DocPath {
        match self {
            Self::Set { path, .. } | Self::Update { path, .. } | Self::Delete { path } => path,
        }
    }
}

/// Ordered list of writes committed atomically
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

impl From<Vec<WriteOp>> for WriteBatch {
    fn from(ops: Vec<WriteOp>) -> Self {
        Self { ops }
    }
}

impl FromIterator<WriteOp> for WriteBatch {
    fn from_iter<I: IntoIterator<Item = WriteOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}
