//! Runtime support for generated data access modules
//!
//! Generated code depends only on this module: transfer values and rows,
//! checksum hashing, the [`Record`] protocol and the query assembly DSL.
//! With the `mysql` feature the driver's connections and transactions
//! implement [`Executor`] and [`Connection`].

pub mod checksum;
pub mod query;
pub mod record;
pub mod value;

#[cfg(feature = "mysql")]
pub mod mysql;

pub use checksum::{hash_strings, now, rand_uid, unique_id, HashInput};
pub use query::{assemble, Fragment};
pub use record::{
    projection_column, ColumnSql, Connection, Executor, Record, StatementSql, TableSql,
    Transaction, UpdateOutcome, UpsertOutcome,
};
pub use value::{
    is_null_int, parse_timestamp, to_sql_blob, to_sql_bool, to_sql_date, to_sql_date_str,
    to_sql_float64, to_sql_int64, to_sql_string, Geometry, Row, Timestamp, Value, NULL_INT32,
};

pub use crate::error::OrmError;
