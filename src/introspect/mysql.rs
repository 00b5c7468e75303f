use mysql::{Conn, Opts};
use tracing::{debug, error, info, trace};

use super::{Introspector, TableFilter, DISCOVERY_SQL};
use crate::config::DbConfig;
use crate::orm::{Executor, Row, Value};
use crate::prelude::OrmgenError;
use crate::schema::{ColumnRow, Schema};

/// MySQL introspector
pub struct MysqlIntrospector<'a> {
    conn: &'a mut Conn,
}

impl<'a> MysqlIntrospector<'a> {
    pub fn new(conn: &'a mut Conn) -> Self {
        Self { conn }
    }
}

/// Open a connection for the configured database
pub fn connect(config: &DbConfig) -> Result<Conn, OrmgenError> {
    info!(connection = ?config.redacted_url(), "Connecting to MySQL");

    let opts = Opts::from_url(&config.mysql_url()).map_err(|e| {
        OrmgenError::Connection(format!("invalid URL {}: {}", config.redacted_url(), e))
    })?;
    let conn = Conn::new(opts).map_err(|e| {
        error!(connection = ?config.redacted_url(), error = ?e, "Failed to connect");
        OrmgenError::Connection(format!("{}: {}", config.redacted_url(), e))
    })?;

    info!("Connected to database");
    Ok(conn)
}

impl Introspector for MysqlIntrospector<'_> {
    fn introspect(
        &mut self,
        schema_name: &str,
        filter: &TableFilter,
    ) -> Result<Schema, OrmgenError> {
        info!(schema = ?schema_name, "Starting schema introspection");

        let rows = query_columns(self.conn, schema_name)?;
        debug!(count = ?rows.len(), "Found columns");

        let schema = Schema::from_rows(schema_name, rows, filter)?;

        info!(
            schema = ?schema_name,
            tables = ?schema.tables.len(),
            "Schema introspection complete"
        );

        Ok(schema)
    }
}

/// Query column metadata for every table in a schema
fn query_columns(conn: &mut Conn, schema_name: &str) -> Result<Vec<ColumnRow>, OrmgenError> {
    trace!(schema = ?schema_name, "Querying columns");

    let rows = Executor::query(conn, DISCOVERY_SQL, vec![Value::from(schema_name)]).map_err(|e| {
        error!(schema = ?schema_name, error = ?e, "Failed to query columns");
        OrmgenError::Introspection {
            schema: schema_name.to_string(),
            message: format!("Failed to query columns: {}", e),
        }
    })?;

    Ok(rows.iter().map(column_row).collect())
}

fn optional_u64(row: &Row, index: usize) -> Option<u64> {
    row.is_valid(index)
        .then(|| u64::try_from(row.int64(index)).ok())
        .flatten()
}

fn column_row(row: &Row) -> ColumnRow {
    let column = ColumnRow {
        table_name: row.string(0),
        column_name: row.string(1),
        column_key: row.string(2),
        is_nullable: row.string(3).eq_ignore_ascii_case("YES"),
        data_type: row.string(4),
        column_default: row.is_valid(5).then(|| row.string(5)),
        max_length: optional_u64(row, 6),
        precision: optional_u64(row, 7),
        scale: optional_u64(row, 8),
        column_type: row.string(9),
        ordinal_position: u32::try_from(row.int64(10)).unwrap_or_default(),
    };
    trace!(
        table = ?column.table_name,
        column = ?column.column_name,
        data_type = ?column.data_type,
        column_type = ?column.column_type,
        "Parsed column"
    );
    column
}
