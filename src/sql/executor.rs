//! Dispatches parsed statements against a [`DatabaseManager`], and splits a
//! line of input into `;`-separated statements.
//!
//! Batch semantics (SPEC_FULL.md §4.5, confirmed against the source's
//! `QueryParser::executeCommand`): statements within one line are executed
//! left to right; a failing statement is logged and skipped, but does not
//! stop later statements in the same line from being attempted. The overall
//! result is the logical AND of every sub-statement's result.

use tracing::{debug, warn};

use super::parser::{ColumnDef, Statement, parse};
use crate::column::{Column, ForeignKey};
use crate::database::DatabaseManager;
use crate::error::{EngineError, EngineResult};
use crate::row::Row;
use crate::table::Table;
use crate::value::{DataType, Value};

/// Splits `line` on `;`, trimming and dropping empty pieces.
pub fn split_statements(line: &str) -> Vec<String> {
    line.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn data_type_from_name(name: &str) -> EngineResult<DataType> {
    match name {
        "INT" => Ok(DataType::Int),
        "STRING" => Ok(DataType::Str),
        "BOOL" => Ok(DataType::Bool),
        "TIMESTAMP" => Ok(DataType::Timestamp),
        "FLOAT" => Ok(DataType::Float),
        "BLOB" => Ok(DataType::Blob),
        other => Err(EngineError::Parse(format!("unknown column type '{other}'"))),
    }
}

/// Parses a raw token into a typed [`Value`], dispatching on the column's
/// declared type (SPEC_FULL.md §4.5). `STRING` and `BLOB` tokens are taken
/// verbatim — there is no quoting syntax, so a value containing `,` or `)`
/// cannot be represented (a known, accepted grammar limitation).
fn parse_value(data_type: DataType, token: &str) -> EngineResult<Value> {
    Ok(match data_type {
        DataType::Int => Value::Int(
            token
                .parse()
                .map_err(|_| EngineError::Parse(format!("'{token}' is not a valid INT")))?,
        ),
        DataType::Str => Value::Str(token.to_string()),
        DataType::Bool => Value::Bool(token == "true"),
        DataType::Timestamp => Value::Timestamp(
            token
                .parse()
                .map_err(|_| EngineError::Parse(format!("'{token}' is not a valid TIMESTAMP")))?,
        ),
        DataType::Float => Value::Float(
            token
                .parse()
                .map_err(|_| EngineError::Parse(format!("'{token}' is not a valid FLOAT")))?,
        ),
        DataType::Blob => Value::Blob(token.as_bytes().to_vec()),
    })
}

fn build_row(table: &Table, columns: &[String], values: &[String]) -> EngineResult<Row> {
    if columns.len() != values.len() {
        return Err(EngineError::Parse(format!(
            "column list has {} entries but value list has {}",
            columns.len(),
            values.len()
        )));
    }
    let mut row = Row::new();
    for (name, raw) in columns.iter().zip(values.iter()) {
        let column = table
            .get_column(name)
            .ok_or_else(|| EngineError::UnknownColumn {
                table: table.name.clone(),
                column: name.clone(),
            })?;
        row.set(name.clone(), parse_value(column.data_type, raw)?);
    }
    Ok(row)
}

fn require_current<'a>(mgr: &'a DatabaseManager) -> EngineResult<&'a str> {
    mgr.current_name().ok_or(EngineError::NoDatabaseSelected)
}

/// Executes one already-parsed statement.
pub fn execute(mgr: &mut DatabaseManager, statement: Statement) -> EngineResult<()> {
    match statement {
        Statement::CreateDatabase(name) => {
            debug!(database = %name, "CREATE DATABASE");
            mgr.create_database(name);
            Ok(())
        }
        Statement::Use(name) => {
            debug!(database = %name, "USE");
            if mgr.select_database(&name) {
                Ok(())
            } else {
                Err(EngineError::UnknownDatabase(name))
            }
        }
        Statement::AddTable { name, columns } => {
            let db_name = require_current(mgr)?.to_string();
            debug!(database = %db_name, table = %name, "ADD TABLE");
            let mut table = Table::new(name);
            for col_def in columns {
                table.add_column(build_column(col_def)?)?;
            }
            mgr.current_mut().expect("validated above").add_table(table);
            Ok(())
        }
        Statement::Insert {
            table,
            columns,
            values,
        } => {
            require_current(mgr)?;
            let db = mgr.current_mut().expect("validated above");
            let t = db
                .get_table(&table)
                .ok_or_else(|| EngineError::UnknownTable(table.clone()))?;
            let row = build_row(t, &columns, &values)?;
            debug!(table = %table, "INSERT");
            db.insert_row(&table, row)
        }
        Statement::Remove {
            table,
            where_col,
            where_val,
        } => {
            require_current(mgr)?;
            let db = mgr.current_mut().expect("validated above");
            let t = db
                .get_table(&table)
                .ok_or_else(|| EngineError::UnknownTable(table.clone()))?;
            // `WHERE` must name the primary-key column: the source's
            // `parseRemoveRow` rejects the statement outright when it
            // doesn't (`if (!column || !column->isPrimaryKey) return false`),
            // since `delete_row` only ever knows how to match by PK value.
            let col = t
                .get_column(&where_col)
                .ok_or_else(|| EngineError::UnknownColumn {
                    table: table.clone(),
                    column: where_col.clone(),
                })?;
            if !col.is_primary_key {
                return Err(EngineError::NotPrimaryKeyColumn {
                    table: table.clone(),
                    column: where_col.clone(),
                });
            }
            let value = parse_value(col.data_type, &where_val)?;
            debug!(table = %table, "REMOVE");
            db.delete_row(&table, &value)
        }
        Statement::Update {
            table,
            assignments,
            where_col,
            where_val,
        } => {
            require_current(mgr)?;
            let db = mgr.current_mut().expect("validated above");
            let t = db
                .get_table(&table)
                .ok_or_else(|| EngineError::UnknownTable(table.clone()))?;
            // `WHERE` must name the primary-key column, same as `REMOVE`
            // (see the comment there) — `update_row` only knows how to
            // relocate a row by its old PK value.
            let where_column = t
                .get_column(&where_col)
                .ok_or_else(|| EngineError::UnknownColumn {
                    table: table.clone(),
                    column: where_col.clone(),
                })?;
            if !where_column.is_primary_key {
                return Err(EngineError::NotPrimaryKeyColumn {
                    table: table.clone(),
                    column: where_col.clone(),
                });
            }
            let old_pk = parse_value(where_column.data_type, &where_val)?;

            // The new row is built *only* from the SET clause, replacing
            // the old row wholesale — the source's `updateRow` does
            // `*it = newRow`, it does not merge unspecified columns from
            // the old row.
            let mut new_row = Row::new();
            for (name, raw) in &assignments {
                let column = t
                    .get_column(name)
                    .ok_or_else(|| EngineError::UnknownColumn {
                        table: table.clone(),
                        column: name.clone(),
                    })?;
                new_row.set(name.clone(), parse_value(column.data_type, raw)?);
            }
            debug!(table = %table, "UPDATE");
            db.update_row(&table, &old_pk, new_row)
        }
    }
}

fn build_column(def: ColumnDef) -> EngineResult<Column> {
    let data_type = data_type_from_name(&def.type_name)?;
    let mut column = Column::new(def.name, data_type);
    if def.is_primary_key {
        column.set_primary_key(true);
    }
    if let Some((ref_table, ref_column)) = def.foreign_key {
        column.foreign_key = Some(ForeignKey::new(ref_table, ref_column));
    }
    Ok(column)
}

/// Parses and executes every `;`-separated statement in `line`. Returns the
/// logical AND of all sub-results; a failure is logged and does not stop
/// later statements in the same line from running.
pub fn execute_line(mgr: &mut DatabaseManager, line: &str) -> bool {
    let mut all_succeeded = true;
    for piece in split_statements(line) {
        let result = parse(&piece).and_then(|stmt| execute(mgr, stmt));
        if let Err(e) = result {
            warn!(statement = %piece, error = %e, "statement failed");
            all_succeeded = false;
        }
    }
    all_succeeded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_statements_trims_and_drops_empty() {
        assert_eq!(
            split_statements(" CREATE DATABASE D; USE D; "),
            vec!["CREATE DATABASE D".to_string(), "USE D".to_string()]
        );
    }

    #[test]
    fn end_to_end_scenario_s1() {
        let mut mgr = DatabaseManager::new();
        assert!(execute_line(&mut mgr, "CREATE DATABASE D; USE D;"));
        assert!(execute_line(
            &mut mgr,
            "ADD TABLE t (id INT PRIMARY_KEY, name STRING);"
        ));
        assert!(execute_line(
            &mut mgr,
            "INSERT INTO t (id, name) VALUES (1, alice); INSERT INTO t (id, name) VALUES (2, bob);"
        ));
        let db = mgr.current().unwrap();
        let t = db.get_table("t").unwrap();
        assert_eq!(t.rows().len(), 2);
        assert_eq!(
            t.get_primary_key().unwrap().index().unwrap().in_order(),
            vec![Value::Int(1), Value::Int(2)]
        );
    }

    #[test]
    fn duplicate_primary_key_rejected_batch_continues() {
        let mut mgr = DatabaseManager::new();
        execute_line(&mut mgr, "CREATE DATABASE D; USE D;");
        execute_line(&mut mgr, "ADD TABLE t (id INT PRIMARY_KEY, name STRING);");
        execute_line(&mut mgr, "INSERT INTO t (id, name) VALUES (1, alice);");
        let ok = execute_line(
            &mut mgr,
            "INSERT INTO t (id, name) VALUES (1, carol); INSERT INTO t (id, name) VALUES (2, dave);",
        );
        assert!(!ok, "batch should report failure overall");
        let db = mgr.current().unwrap();
        let t = db.get_table("t").unwrap();
        // the duplicate insert failed, but the later valid insert in the
        // same line still went through
        assert_eq!(t.rows().len(), 2);
    }

    #[test]
    fn remove_and_update_scenarios() {
        let mut mgr = DatabaseManager::new();
        execute_line(&mut mgr, "CREATE DATABASE D; USE D;");
        execute_line(&mut mgr, "ADD TABLE t (id INT PRIMARY_KEY, name STRING);");
        execute_line(
            &mut mgr,
            "INSERT INTO t (id, name) VALUES (1, alice); INSERT INTO t (id, name) VALUES (2, bob);",
        );
        assert!(execute_line(&mut mgr, "REMOVE FROM t WHERE id = 1;"));
        {
            let db = mgr.current().unwrap();
            let t = db.get_table("t").unwrap();
            assert_eq!(t.rows().len(), 1);
        }
        assert!(execute_line(
            &mut mgr,
            "UPDATE t SET id = 3, name = bob2 WHERE id = 2;"
        ));
        let db = mgr.current().unwrap();
        let t = db.get_table("t").unwrap();
        assert_eq!(t.rows()[0].get("name"), Some(&Value::Str("bob2".to_string())));
    }

    #[test]
    fn no_database_selected_fails() {
        let mut mgr = DatabaseManager::new();
        assert!(!execute_line(&mut mgr, "ADD TABLE t (id INT PRIMARY_KEY);"));
    }

    #[test]
    fn remove_rejects_non_primary_key_where_column() {
        let mut mgr = DatabaseManager::new();
        execute_line(&mut mgr, "CREATE DATABASE D; USE D;");
        execute_line(&mut mgr, "ADD TABLE t (id INT PRIMARY_KEY, name STRING);");
        execute_line(&mut mgr, "INSERT INTO t (id, name) VALUES (1, alice);");

        let stmt = parse("REMOVE FROM t WHERE name = alice").unwrap();
        let err = execute(&mut mgr, stmt).unwrap_err();
        assert!(matches!(err, EngineError::NotPrimaryKeyColumn { .. }));
        // the row must survive: a non-PK WHERE column is rejected outright,
        // never silently matched against the actual primary key
        let db = mgr.current().unwrap();
        assert_eq!(db.get_table("t").unwrap().rows().len(), 1);
    }

    #[test]
    fn update_rejects_non_primary_key_where_column() {
        let mut mgr = DatabaseManager::new();
        execute_line(&mut mgr, "CREATE DATABASE D; USE D;");
        execute_line(&mut mgr, "ADD TABLE t (id INT PRIMARY_KEY, name STRING);");
        execute_line(&mut mgr, "INSERT INTO t (id, name) VALUES (1, alice);");

        let stmt = parse("UPDATE t SET name = carol WHERE name = alice").unwrap();
        let err = execute(&mut mgr, stmt).unwrap_err();
        assert!(matches!(err, EngineError::NotPrimaryKeyColumn { .. }));
        let db = mgr.current().unwrap();
        assert_eq!(
            db.get_table("t").unwrap().rows()[0].get("name"),
            Some(&Value::Str("alice".to_string()))
        );
    }

    #[test]
    fn insert_value_with_internal_space_round_trips() {
        let mut mgr = DatabaseManager::new();
        execute_line(&mut mgr, "CREATE DATABASE D; USE D;");
        execute_line(&mut mgr, "ADD TABLE t (id INT PRIMARY_KEY, name STRING);");
        assert!(execute_line(
            &mut mgr,
            "INSERT INTO t (id, name) VALUES (1, john doe);"
        ));
        let db = mgr.current().unwrap();
        assert_eq!(
            db.get_table("t").unwrap().rows()[0].get("name"),
            Some(&Value::Str("john doe".to_string()))
        );
    }
}
