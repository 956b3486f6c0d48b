//! An ordered sequence of rows over a fixed set of columns, with a primary
//! key index and row-level CRUD.
//!
//! Cross-table foreign-key validation lives one layer up, in
//! [`crate::database::Database`] — Rust's borrow checker won't let a `Table`
//! method hold both `&mut self` and a `&Database` that might itself contain
//! `self`, the way the source's raw `DatabaseManager*` back-pointer could.
//! `Database::insert_row`/`update_row` do the two-phase validate-then-commit
//! dance instead; `Table`'s own methods only ever touch their own rows.

use crate::column::Column;
use crate::error::{EngineError, EngineResult};
use crate::row::Row;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Table {
        Table {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Declares a new column. Fails if the name is already taken, or if this
    /// would be a second primary key on the table.
    pub fn add_column(&mut self, column: Column) -> EngineResult<()> {
        if self.columns.iter().any(|c| c.name == column.name) {
            return Err(EngineError::DuplicateColumn {
                table: self.name.clone(),
                column: column.name,
            });
        }
        if column.is_primary_key && self.get_primary_key().is_some() {
            return Err(EngineError::DuplicatePrimaryKeyColumn(self.name.clone()));
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn get_primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_primary_key)
    }

    fn get_primary_key_mut(&mut self) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.is_primary_key)
    }

    /// The row's value at the primary-key column, defaulting to the column's
    /// zero value if the row never set it. `None` if the table has no
    /// primary key.
    pub fn pk_value(&self, row: &Row) -> Option<Value> {
        let pk = self.get_primary_key()?;
        Some(
            row.get(&pk.name)
                .cloned()
                .unwrap_or_else(|| pk.data_type.default_value()),
        )
    }

    /// Step 1 of insertion (§4.3): fails if a row with this primary-key value
    /// already exists. Does not mutate the table.
    pub fn check_primary_key_available(&self, row: &Row) -> EngineResult<()> {
        if let Some(pk) = self.get_primary_key() {
            let value = self.pk_value(row).expect("pk column present");
            if pk.index().expect("pk column owns an index").search(&value) {
                return Err(EngineError::DuplicatePrimaryKey {
                    table: self.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Step 3 of insertion: appends the row and updates every column index
    /// (in practice, just the primary key's).
    pub fn commit_row(&mut self, row: Row) {
        if let Some(value) = self.pk_value(&row) {
            self.get_primary_key_mut()
                .and_then(|pk| pk.index_mut())
                .expect("pk column owns an index")
                .insert(value);
        }
        self.rows.push(row);
    }

    /// Removes the row whose primary-key column equals `pk_value`.
    pub fn delete_row(&mut self, pk_value: &Value) -> EngineResult<()> {
        let pk_name = self
            .get_primary_key()
            .map(|c| c.name.clone())
            .ok_or_else(|| EngineError::RowNotFound(self.name.clone()))?;

        let position = self
            .rows
            .iter()
            .position(|r| r.get(&pk_name).map(|v| v == pk_value).unwrap_or(false));

        match position {
            Some(i) => {
                self.rows.remove(i);
                self.get_primary_key_mut()
                    .and_then(|pk| pk.index_mut())
                    .expect("pk column owns an index")
                    .remove(pk_value);
                Ok(())
            }
            None => Err(EngineError::RowNotFound(self.name.clone())),
        }
    }

    /// Overwrites the row whose primary key is `old_pk` with `new_row`,
    /// re-keying the index. Foreign-key re-validation of `new_row` is the
    /// caller's responsibility (see `Database::update_row`).
    pub fn update_row(&mut self, old_pk: &Value, new_row: Row) -> EngineResult<()> {
        let pk_name = self
            .get_primary_key()
            .map(|c| c.name.clone())
            .ok_or_else(|| EngineError::RowNotFound(self.name.clone()))?;

        let position = self
            .rows
            .iter()
            .position(|r| r.get(&pk_name).map(|v| v == old_pk).unwrap_or(false));

        let i = position.ok_or_else(|| EngineError::RowNotFound(self.name.clone()))?;

        let new_pk = self.pk_value(&new_row).expect("pk column present");
        self.rows[i] = new_row;
        let index = self
            .get_primary_key_mut()
            .and_then(|pk| pk.index_mut())
            .expect("pk column owns an index");
        index.remove(old_pk);
        index.insert(new_pk);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DataType;

    fn row(id: i32, name: &str) -> Row {
        let mut r = Row::new();
        r.set("id", Value::Int(id));
        r.set("name", Value::Str(name.to_string()));
        r
    }

    fn table_with_pk() -> Table {
        let mut t = Table::new("t");
        t.add_column(Column::primary_key("id", DataType::Int)).unwrap();
        t.add_column(Column::new("name", DataType::Str)).unwrap();
        t
    }

    #[test]
    fn second_primary_key_rejected() {
        let mut t = Table::new("t");
        t.add_column(Column::primary_key("id", DataType::Int)).unwrap();
        let err = t
            .add_column(Column::primary_key("other", DataType::Int))
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicatePrimaryKeyColumn(_)));
    }

    #[test]
    fn duplicate_column_name_rejected() {
        let mut t = Table::new("t");
        t.add_column(Column::new("id", DataType::Int)).unwrap();
        let err = t.add_column(Column::new("id", DataType::Str)).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateColumn { .. }));
    }

    #[test]
    fn insert_then_duplicate_pk_rejected() {
        let mut t = table_with_pk();
        t.check_primary_key_available(&row(1, "a")).unwrap();
        t.commit_row(row(1, "a"));
        let err = t.check_primary_key_available(&row(1, "b")).unwrap_err();
        assert!(matches!(err, EngineError::DuplicatePrimaryKey { .. }));
        assert_eq!(t.rows().len(), 1);
    }

    #[test]
    fn delete_missing_row_fails() {
        let mut t = table_with_pk();
        let err = t.delete_row(&Value::Int(1)).unwrap_err();
        assert!(matches!(err, EngineError::RowNotFound(_)));
    }

    #[test]
    fn delete_existing_row_removes_from_index() {
        let mut t = table_with_pk();
        t.commit_row(row(1, "a"));
        t.delete_row(&Value::Int(1)).unwrap();
        assert_eq!(t.rows().len(), 0);
        assert!(!t.get_primary_key().unwrap().index().unwrap().search(&Value::Int(1)));
    }

    #[test]
    fn update_changes_pk_and_index() {
        let mut t = table_with_pk();
        t.commit_row(row(1, "a"));
        t.update_row(&Value::Int(1), row(2, "a2")).unwrap();
        assert!(t.get_primary_key().unwrap().index().unwrap().search(&Value::Int(2)));
        assert!(!t.get_primary_key().unwrap().index().unwrap().search(&Value::Int(1)));
        assert_eq!(t.rows()[0].get("name"), Some(&Value::Str("a2".to_string())));
    }
}
