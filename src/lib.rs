//! A small, connectionless relational engine: typed rows over a B-tree
//! primary-key index, integrity-checked tables, and a hand-written query
//! executor for a SQL-like mini-language.
//!
//! # Quick Start
//! ```rust
//! use bantam_db::database::DatabaseManager;
//! use bantam_db::sql::execute_line;
//!
//! let mut mgr = DatabaseManager::new();
//! execute_line(&mut mgr, "CREATE DATABASE d; USE d;");
//! execute_line(&mut mgr, "ADD TABLE t (id INT PRIMARY_KEY, name STRING);");
//! execute_line(&mut mgr, "INSERT INTO t (id, name) VALUES (1, alice);");
//! assert_eq!(mgr.current().unwrap().get_table("t").unwrap().rows().len(), 1);
//! ```

pub mod btree;
pub mod column;
pub mod database;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod row;
pub mod sql;
pub mod table;
pub mod value;

pub use database::{Database, DatabaseManager};
pub use error::{EngineError, EngineResult};
pub use value::{DataType, Value};
