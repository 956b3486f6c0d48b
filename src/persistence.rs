//! Whole-database binary load/save.
//!
//! Two format variants coexist, selected by caller context (there is no
//! in-file version tag — see SPEC_FULL.md §6.2/§9). All integers are
//! little-endian; `size` fields are 64-bit unsigned.
//!
//! Foreign-key annotations are **not** persisted: only a column's name, type,
//! and primary-key flag survive a save/load round trip. `ADD TABLE`
//! statements in a commands file re-declare the foreign keys on every fresh
//! load. This is a known limitation carried over deliberately, not patched
//! into the wire format (SPEC_FULL.md §9, open question 1).

use std::io::{Read, Write};

use crate::column::Column;
use crate::database::Database;
use crate::error::{EngineError, EngineResult};
use crate::row::Row;
use crate::table::Table;
use crate::value::{DataType, Value, read_u64};

const MAX_NAME_LEN: u64 = 1000;

/// Which on-disk layout to read or write. The v1 ("legacy") format predates
/// `TIMESTAMP`, `FLOAT`, and `BLOB`, and has no primary-key flag per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    V1,
    V2,
}

const V1_TYPE_COUNT: u64 = 3;

pub fn save_database(db: &Database, w: &mut impl Write) -> EngineResult<()> {
    let tables: Vec<&Table> = db.tables().collect();
    write_u64(w, tables.len() as u64)?;
    for table in tables {
        write_string(w, &table.name)?;
        write_u64(w, table.columns().len() as u64)?;
        for col in table.columns() {
            write_string(w, &col.name)?;
            write_u64(w, col.data_type.tag())?;
            w.write_all(&[if col.is_primary_key { 1 } else { 0 }])?;
        }
        write_u64(w, table.rows().len() as u64)?;
        for row in table.rows() {
            for col in table.columns() {
                let value = row
                    .get(&col.name)
                    .cloned()
                    .unwrap_or_else(|| col.data_type.default_value());
                let mut buf = Vec::new();
                value.encode_payload(&mut buf);
                w.write_all(&buf)?;
            }
        }
    }
    Ok(())
}

pub fn load_database(r: &mut impl Read, format: Format) -> EngineResult<Database> {
    let mut db = Database::new();
    let num_tables = read_u64(r)?;
    for _ in 0..num_tables {
        let table_name = read_bounded_string(r)?;
        let mut table = Table::new(table_name);

        let num_cols = read_u64(r)?;
        let mut col_types = Vec::with_capacity(num_cols as usize);
        for _ in 0..num_cols {
            let col_name = read_bounded_string(r)?;
            let type_tag = read_u64(r)?;
            let data_type = match format {
                Format::V2 => DataType::from_tag(type_tag).ok_or_else(|| {
                    EngineError::CorruptFile(format!("unknown column type tag {type_tag}"))
                })?,
                Format::V1 => {
                    if type_tag >= V1_TYPE_COUNT {
                        return Err(EngineError::CorruptFile(format!(
                            "v1 format only supports type tags 0..{V1_TYPE_COUNT}, got {type_tag}"
                        )));
                    }
                    DataType::from_tag(type_tag).expect("v1 tags are a prefix of v2 tags")
                }
            };
            let is_pk = match format {
                Format::V2 => {
                    let mut b = [0u8; 1];
                    r.read_exact(&mut b)?;
                    b[0] != 0
                }
                Format::V1 => false,
            };
            col_types.push(data_type);
            let mut column = Column::new(col_name, data_type);
            if is_pk {
                column.set_primary_key(true);
            }
            table.add_column(column)?;
        }

        let num_rows = read_u64(r)?;
        for _ in 0..num_rows {
            let mut row = Row::new();
            for (i, col) in table.columns().to_vec().iter().enumerate() {
                let value = Value::decode_payload(col_types[i], r)?;
                row.set(col.name.clone(), value);
            }
            table.commit_row(row);
        }

        db.add_table(table);
    }
    Ok(db)
}

fn write_u64(w: &mut impl Write, v: u64) -> EngineResult<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_string(w: &mut impl Write, s: &str) -> EngineResult<()> {
    write_u64(w, s.len() as u64)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

fn read_bounded_string(r: &mut impl Read) -> EngineResult<String> {
    let len = read_u64(r)?;
    if len > MAX_NAME_LEN {
        return Err(EngineError::CorruptFile(format!(
            "name length {len} exceeds sanity bound of {MAX_NAME_LEN}"
        )));
    }
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| EngineError::CorruptFile(format!("invalid UTF-8 in name: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::value::Value;

    fn sample_db() -> Database {
        let mut db = Database::new();
        let mut t = Table::new("t");
        t.add_column(Column::primary_key("id", DataType::Int)).unwrap();
        t.add_column(Column::new("name", DataType::Str)).unwrap();
        t.add_column(Column::new("active", DataType::Bool)).unwrap();
        let mut row1 = Row::new();
        row1.set("id", Value::Int(1));
        row1.set("name", Value::Str("alice".to_string()));
        row1.set("active", Value::Bool(true));
        t.commit_row(row1);
        let mut row2 = Row::new();
        row2.set("id", Value::Int(2));
        row2.set("name", Value::Str("bob".to_string()));
        row2.set("active", Value::Bool(false));
        t.commit_row(row2);
        db.add_table(t);
        db
    }

    #[test]
    fn round_trip_v2() {
        let db = sample_db();
        let mut buf = Vec::new();
        save_database(&db, &mut buf).unwrap();
        let mut cursor = &buf[..];
        let loaded = load_database(&mut cursor, Format::V2).unwrap();

        let t = loaded.get_table("t").unwrap();
        assert_eq!(t.rows().len(), 2);
        assert_eq!(t.columns().len(), 3);
        assert_eq!(t.rows()[0].get("name"), Some(&Value::Str("alice".to_string())));
        assert!(t.get_primary_key().unwrap().index().unwrap().search(&Value::Int(1)));
        assert!(t.get_primary_key().unwrap().index().unwrap().search(&Value::Int(2)));
    }

    #[test]
    fn oversized_table_name_rejected() {
        let mut buf = Vec::new();
        write_u64(&mut buf, 1).unwrap(); // num_tables
        write_u64(&mut buf, 2_000).unwrap(); // table name length, over bound
        let mut cursor = &buf[..];
        let err = load_database(&mut cursor, Format::V2).unwrap_err();
        assert!(matches!(err, EngineError::CorruptFile(_)));
    }

    #[test]
    fn v1_rejects_unsupported_type_tag() {
        let mut buf = Vec::new();
        write_u64(&mut buf, 1).unwrap(); // num_tables
        write_string(&mut buf, "t").unwrap();
        write_u64(&mut buf, 1).unwrap(); // num_cols
        write_string(&mut buf, "c").unwrap();
        write_u64(&mut buf, 4).unwrap(); // FLOAT tag, not in v1
        let mut cursor = &buf[..];
        let err = load_database(&mut cursor, Format::V1).unwrap_err();
        assert!(matches!(err, EngineError::CorruptFile(_)));
    }
}
