//! A named collection of tables, and the catalog of databases that tracks
//! which one is currently selected.

use std::collections::BTreeMap;

use crate::error::{EngineError, EngineResult};
use crate::row::Row;
use crate::table::Table;
use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub struct Database {
    tables: BTreeMap<String, Table>,
}

impl Database {
    pub fn new() -> Database {
        Database::default()
    }

    /// Installs `table`, **silently overwriting** any existing table of the
    /// same name. This mirrors the source's observed behavior: re-declaring
    /// a table (e.g. to reset it between test runs) is a supported idiom
    /// here, not an error.
    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }

    /// Validates and inserts `row` into `table_name` (§4.3 `add_row`):
    /// primary-key uniqueness, then foreign-key integrity against every
    /// referenced table in this same database, then commit. Nothing is
    /// mutated unless every check passes.
    pub fn insert_row(&mut self, table_name: &str, row: Row) -> EngineResult<()> {
        self.validate_insert(table_name, &row)?;
        let table = self
            .tables
            .get_mut(table_name)
            .ok_or_else(|| EngineError::UnknownTable(table_name.to_string()))?;
        table.commit_row(row);
        Ok(())
    }

    fn validate_insert(&self, table_name: &str, row: &Row) -> EngineResult<()> {
        let table = self
            .get_table(table_name)
            .ok_or_else(|| EngineError::UnknownTable(table_name.to_string()))?;

        table.check_primary_key_available(row)?;
        self.check_foreign_keys(table_name, row)
    }

    /// Foreign-key validation shared by insert and update: every FK column
    /// on `table_name` must reference an existing row in its target table.
    fn check_foreign_keys(&self, table_name: &str, row: &Row) -> EngineResult<()> {
        let table = self
            .get_table(table_name)
            .ok_or_else(|| EngineError::UnknownTable(table_name.to_string()))?;

        for column in table.columns() {
            let Some(fk) = &column.foreign_key else {
                continue;
            };
            let referenced = self.get_table(&fk.referenced_table).ok_or_else(|| {
                EngineError::MissingReferencedTable {
                    table: table_name.to_string(),
                    column: column.name.clone(),
                    referenced_table: fk.referenced_table.clone(),
                }
            })?;
            if referenced.get_column(&fk.referenced_column).is_none() {
                return Err(EngineError::MissingReferencedColumn {
                    table: table_name.to_string(),
                    column: column.name.clone(),
                    referenced_table: fk.referenced_table.clone(),
                    referenced_column: fk.referenced_column.clone(),
                });
            }
            let value = row
                .get(&column.name)
                .cloned()
                .unwrap_or_else(|| column.data_type.default_value());
            let found = referenced
                .rows()
                .iter()
                .any(|r| r.get(&fk.referenced_column).map(|v| v == &value).unwrap_or(false));
            if !found {
                return Err(EngineError::ForeignKeyViolation {
                    table: table_name.to_string(),
                    column: column.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn delete_row(&mut self, table_name: &str, pk_value: &Value) -> EngineResult<()> {
        self.tables
            .get_mut(table_name)
            .ok_or_else(|| EngineError::UnknownTable(table_name.to_string()))?
            .delete_row(pk_value)
    }

    /// Updates a row, **re-validating foreign keys on the new row** before
    /// committing. The source implementation this engine is modeled on skips
    /// this check; this is a deliberate fix, not an oversight (see
    /// SPEC_FULL.md §9, open question 2).
    pub fn update_row(&mut self, table_name: &str, old_pk: &Value, new_row: Row) -> EngineResult<()> {
        self.check_foreign_keys(table_name, &new_row)?;
        self.tables
            .get_mut(table_name)
            .ok_or_else(|| EngineError::UnknownTable(table_name.to_string()))?
            .update_row(old_pk, new_row)
    }
}

/// The catalog of all databases, plus which one is currently selected.
#[derive(Debug, Default)]
pub struct DatabaseManager {
    databases: BTreeMap<String, Database>,
    current: Option<String>,
}

impl DatabaseManager {
    pub fn new() -> DatabaseManager {
        DatabaseManager::default()
    }

    /// Installs a fresh, empty database, replacing any existing one of the
    /// same name (mirrors `Database::add_table`'s overwrite behavior).
    pub fn create_database(&mut self, name: impl Into<String>) {
        self.databases.insert(name.into(), Database::new());
    }

    pub fn select_database(&mut self, name: &str) -> bool {
        if self.databases.contains_key(name) {
            self.current = Some(name.to_string());
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&Database> {
        self.current.as_ref().and_then(|n| self.databases.get(n))
    }

    pub fn current_mut(&mut self) -> Option<&mut Database> {
        let name = self.current.clone()?;
        self.databases.get_mut(&name)
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&Database> {
        self.databases.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Database> {
        self.databases.get_mut(name)
    }

    pub fn databases(&self) -> impl Iterator<Item = (&str, &Database)> {
        self.databases.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Installs `db` under `name`, replacing any existing entry — used by
    /// persistence on load.
    pub fn insert(&mut self, name: impl Into<String>, db: Database) {
        self.databases.insert(name.into(), db);
    }
}
