//! Column schema: name, declared type, primary-key flag, optional foreign
//! key, and (iff primary key) an owned B-tree index.

use crate::btree::BTree;
use crate::value::DataType;

/// The default minimum degree used for every B-tree this engine allocates.
pub const DEFAULT_BTREE_DEGREE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub referenced_table: String,
    pub referenced_column: String,
}

impl ForeignKey {
    pub fn new(referenced_table: impl Into<String>, referenced_column: impl Into<String>) -> ForeignKey {
        ForeignKey {
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub is_primary_key: bool,
    pub foreign_key: Option<ForeignKey>,
    /// Present iff `is_primary_key`. Kept in sync with the owning table's
    /// `primary_key_btree`, which is the *same* index — see
    /// [`crate::table::Table`]'s doc comment for why this consolidates what
    /// the original design kept as two separate trees.
    index: Option<BTree>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Column {
        Column {
            name: name.into(),
            data_type,
            is_primary_key: false,
            foreign_key: None,
            index: None,
        }
    }

    pub fn primary_key(name: impl Into<String>, data_type: DataType) -> Column {
        let mut col = Column::new(name, data_type);
        col.set_primary_key(true);
        col
    }

    pub fn with_foreign_key(mut self, fk: ForeignKey) -> Column {
        self.foreign_key = Some(fk);
        self
    }

    pub fn set_primary_key(&mut self, is_primary_key: bool) {
        self.is_primary_key = is_primary_key;
        if is_primary_key && self.index.is_none() {
            self.index = Some(BTree::new(DEFAULT_BTREE_DEGREE));
        }
        if !is_primary_key {
            self.index = None;
        }
    }

    pub fn index(&self) -> Option<&BTree> {
        self.index.as_ref()
    }

    pub fn index_mut(&mut self) -> Option<&mut BTree> {
        self.index.as_mut()
    }
}
