//! Runtime for generated data access operations
//!
//! Generated modules describe each table with a static [`TableSql`] and
//! implement [`Record`] for the row struct. Every statement runs on a
//! caller supplied [`Executor`], which is either a plain connection or a
//! transaction the caller manages. The only operation that opens its own
//! transaction is [`Record::upsert`].

use tracing::{trace, warn};

use super::checksum::hash_strings;
use super::query::{self, assemble, Fragment};
use super::value::{Row, Value};
use crate::error::OrmError;

/// Executes parameterized statements
pub trait Executor {
    /// Run a statement and return the driver reported affected row count
    fn execute(&mut self, sql: &str, params: Vec<Value>) -> Result<u64, OrmError>;

    /// Run a query and return every row
    fn query(&mut self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, OrmError>;

    /// Run a query and return the first row, if any
    fn query_row(&mut self, sql: &str, params: Vec<Value>) -> Result<Option<Row>, OrmError> {
        Ok(self.query(sql, params)?.into_iter().next())
    }
}

/// A connection able to open transactions
pub trait Connection: Executor {
    type Tx<'a>: Transaction
    where
        Self: 'a;

    fn begin(&mut self) -> Result<Self::Tx<'_>, OrmError>;
}

pub trait Transaction: Executor {
    fn commit(self) -> Result<(), OrmError>;
    fn rollback(self) -> Result<(), OrmError>;
}

/// Static description of one generated column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSql {
    pub name: &'static str,
    pub primary_key: bool,
    pub checksum: bool,
    pub geometry: bool,
}

impl ColumnSql {
    /// Number of parameters the column binds
    pub fn width(&self) -> usize {
        if self.geometry {
            2
        } else {
            1
        }
    }
}

/// A statement and the columns it binds, in placeholder order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementSql {
    pub sql: &'static str,
    /// Column indices; each column binds every value of its group
    pub columns: &'static [usize],
}

impl StatementSql {
    /// Parameters for the statement from per-column value groups
    pub fn bind(&self, groups: &[Vec<Value>]) -> Vec<Value> {
        self.columns
            .iter()
            .flat_map(|&i| groups.get(i).cloned().unwrap_or_default())
            .collect()
    }
}

/// Statements synthesized for one table
///
/// Statements that need a primary key are `None` when the table has none.
#[derive(Debug, Clone, Copy)]
pub struct TableSql {
    pub table: &'static str,
    pub columns: &'static [ColumnSql],
    /// Projection expressions in declared column order
    pub projection: &'static [&'static str],
    pub insert: StatementSql,
    pub insert_ignore_duplicate: Option<StatementSql>,
    pub update: Option<StatementSql>,
    pub delete: Option<StatementSql>,
    pub find_one: Option<StatementSql>,
    pub exists: Option<StatementSql>,
    pub upsert: Option<StatementSql>,
}

impl TableSql {
    pub fn primary_key_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| c.primary_key)
    }

    pub fn checksum_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| c.checksum)
    }

    /// Split flattened values into one group per column
    ///
    /// Missing trailing values are filled with NULL.
    pub fn group(&self, values: Vec<Value>) -> Vec<Vec<Value>> {
        let mut values = values.into_iter();
        self.columns
            .iter()
            .map(|column| {
                (0..column.width())
                    .map(|_| values.next().unwrap_or(Value::Null))
                    .collect()
            })
            .collect()
    }

    /// Projection fragments selecting every column in declared order
    pub fn projection(&self) -> Vec<Fragment> {
        self.projection
            .iter()
            .map(|p| Fragment::from(query::expr(p)))
            .collect()
    }

    fn primary_key(&self, operation: &'static str) -> Result<usize, OrmError> {
        self.primary_key_index().ok_or(OrmError::NoPrimaryKey {
            table: self.table,
            operation,
        })
    }

    fn statement(
        &self,
        statement: Option<StatementSql>,
        operation: &'static str,
    ) -> Result<StatementSql, OrmError> {
        statement.ok_or(OrmError::NoPrimaryKey {
            table: self.table,
            operation,
        })
    }
}

/// A column as it appears in a projection, spatial columns read as text
pub fn projection_column(name: &str, geometry: bool) -> query::ColumnDef {
    if geometry {
        query::function("ST_AsText", name)
    } else {
        query::column(name)
    }
}

/// Result of [`Record::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The checksum was unchanged and no statement was sent
    Unchanged,
    /// The statement ran and affected this many rows
    Applied(u64),
}

impl UpdateOutcome {
    pub fn affected_rows(&self) -> u64 {
        match self {
            UpdateOutcome::Unchanged => 0,
            UpdateOutcome::Applied(n) => *n,
        }
    }
}

/// Which branch an upsert took
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub inserted: bool,
    pub updated: bool,
}

/// Column groups of a record with the checksum column recomputed
fn write_values<R: Record>(record: &R) -> Vec<Vec<Value>> {
    let table = R::table();
    let mut groups = table.group(record.to_values());
    if let Some(index) = table.checksum_index() {
        groups[index] = vec![Value::Text(record.calculate_checksum())];
    }
    groups
}

/// A row type with generated statements
pub trait Record: Default {
    fn table() -> &'static TableSql;

    /// Transfer values of every column in declared order, spatial columns flattened
    fn to_values(&self) -> Vec<Value>;

    /// Build a record from a row read through [`TableSql::projection`]
    fn from_row(row: &Row) -> Self;

    /// String forms of every non-key, non-checksum column
    fn checksum_inputs(&self) -> Vec<String> {
        Vec::new()
    }

    fn stored_checksum(&self) -> Option<&str> {
        None
    }

    fn set_checksum(&mut self, _checksum: String) {}

    /// Reset the primary key field to its null value
    fn clear_primary_key(&mut self) {}

    fn calculate_checksum(&self) -> String {
        hash_strings(self.checksum_inputs())
    }

    /// Whether the stored checksum differs from the computed one, and the computed one
    fn is_dirty(&self) -> (bool, String) {
        let checksum = self.calculate_checksum();
        (self.stored_checksum() != Some(checksum.as_str()), checksum)
    }

    fn create<E: Executor + ?Sized>(&self, exec: &mut E) -> Result<u64, OrmError> {
        let table = Self::table();
        let params = table.insert.bind(&write_values(self));
        trace!(table = table.table, sql = table.insert.sql, params = ?params, "create");
        exec.execute(table.insert.sql, params)
    }

    /// Insert, silently ignoring a conflicting primary key
    fn create_ignore_duplicate<E: Executor + ?Sized>(&self, exec: &mut E) -> Result<u64, OrmError> {
        let table = Self::table();
        let statement = table.statement(table.insert_ignore_duplicate, "create_ignore_duplicate")?;
        let params = statement.bind(&write_values(self));
        trace!(table = table.table, sql = statement.sql, params = ?params, "create_ignore_duplicate");
        exec.execute(statement.sql, params)
    }

    /// Update every non-key column by primary key
    ///
    /// On a checksummed table an unchanged record is not written and the
    /// result is [`UpdateOutcome::Unchanged`]. The new checksum is stored
    /// only once the statement succeeds.
    fn update<E: Executor + ?Sized>(&mut self, exec: &mut E) -> Result<UpdateOutcome, OrmError> {
        let table = Self::table();
        table.primary_key("update")?;
        let Some(statement) = table.update else {
            return Ok(UpdateOutcome::Unchanged);
        };

        let checksum = match table.checksum_index() {
            Some(_) => {
                let (dirty, checksum) = self.is_dirty();
                if !dirty {
                    trace!(table = table.table, "update skipped, checksum unchanged");
                    return Ok(UpdateOutcome::Unchanged);
                }
                Some(checksum)
            }
            None => None,
        };

        let params = statement.bind(&write_values(self));
        trace!(table = table.table, sql = statement.sql, params = ?params, "update");
        let affected = exec.execute(statement.sql, params)?;

        if let Some(checksum) = checksum {
            self.set_checksum(checksum);
        }
        Ok(UpdateOutcome::Applied(affected))
    }

    /// Delete by primary key, then reset the in-memory key
    ///
    /// Returns true only if a row was removed.
    fn delete<E: Executor + ?Sized>(&mut self, exec: &mut E) -> Result<bool, OrmError> {
        let table = Self::table();
        table.primary_key("delete")?;
        let statement = table.statement(table.delete, "delete")?;
        let params = statement.bind(&table.group(self.to_values()));

        trace!(table = table.table, sql = statement.sql, params = ?params, "delete");
        let affected = exec.execute(statement.sql, params)?;
        self.clear_primary_key();
        Ok(affected > 0)
    }

    /// Load the row with the given key into `self`; false when there is none
    fn find_one<E: Executor + ?Sized>(
        &mut self,
        exec: &mut E,
        key: impl Into<Value>,
    ) -> Result<bool, OrmError> {
        let table = Self::table();
        let pk = table.primary_key("find_one")?;
        let statement = table.statement(table.find_one, "find_one")?;
        let params = vec![key.into()];

        trace!(table = table.table, sql = statement.sql, params = ?params, "find_one");
        match exec.query_row(statement.sql, params)? {
            Some(row) if row.is_valid(pk) => {
                *self = Self::from_row(&row);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Whether a row with this record's key exists
    fn exists<E: Executor + ?Sized>(&self, exec: &mut E) -> Result<bool, OrmError> {
        let table = Self::table();
        table.primary_key("exists")?;
        let statement = table.statement(table.exists, "exists")?;
        let params = statement.bind(&table.group(self.to_values()));

        trace!(table = table.table, sql = statement.sql, params = ?params, "exists");
        Ok(exec
            .query_row(statement.sql, params)?
            .is_some_and(|row| row.is_valid(0)))
    }

    /// Insert or update inside a transaction opened on `conn`
    ///
    /// The transaction is committed on success and rolled back on any error.
    fn upsert<C: Connection>(&mut self, conn: &mut C) -> Result<UpsertOutcome, OrmError> {
        let table = Self::table();
        table.primary_key("upsert")?;

        let mut tx = conn.begin()?;
        let result = upsert_in(self, &mut tx);
        match result {
            Ok(outcome) => {
                tx.commit()?;
                trace!(table = table.table, ?outcome, "upsert committed");
                Ok(outcome)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback() {
                    warn!(table = table.table, error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Single statement upsert within a caller managed transaction
    ///
    /// Affected rows of 1 mean inserted, 0 means the row already held these
    /// values, anything else means updated.
    fn upsert_tx<E: Executor + ?Sized>(&self, exec: &mut E) -> Result<UpsertOutcome, OrmError> {
        let table = Self::table();
        let statement = table.statement(table.upsert, "upsert")?;
        let params = statement.bind(&write_values(self));

        trace!(table = table.table, sql = statement.sql, params = ?params, "upsert");
        let outcome = match exec.execute(statement.sql, params)? {
            0 => UpsertOutcome::default(),
            1 => UpsertOutcome {
                inserted: true,
                updated: false,
            },
            _ => UpsertOutcome {
                inserted: false,
                updated: true,
            },
        };
        Ok(outcome)
    }

    /// Load the first row matching `fragments` into `self`
    fn find<E: Executor + ?Sized>(
        &mut self,
        exec: &mut E,
        fragments: Vec<Fragment>,
    ) -> Result<bool, OrmError> {
        let (sql, params) = select(Self::table(), fragments);
        trace!(table = Self::table().table, sql = %sql, params = ?params, "find");
        match exec.query_row(&sql, params)? {
            Some(row) => {
                *self = Self::from_row(&row);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn find_all<E: Executor + ?Sized>(
        exec: &mut E,
        fragments: Vec<Fragment>,
    ) -> Result<Vec<Self>, OrmError> {
        let (sql, params) = select(Self::table(), fragments);
        trace!(table = Self::table().table, sql = %sql, params = ?params, "find_all");
        let rows = exec.query(&sql, params)?;
        Ok(rows.iter().map(Self::from_row).collect())
    }

    fn count<E: Executor + ?Sized>(exec: &mut E, fragments: Vec<Fragment>) -> Result<i64, OrmError> {
        let table = Self::table();
        let mut components = vec![
            Fragment::from(query::count_alias("*", "count")),
            Fragment::from(query::table(table.table)),
        ];
        components.extend(fragments);
        let (sql, params) = assemble(components);

        trace!(table = table.table, sql = %sql, params = ?params, "count");
        Ok(exec.query_row(&sql, params)?.map_or(0, |row| row.int64(0)))
    }

    /// Delete every row matching `fragments`
    fn delete_all<E: Executor + ?Sized>(
        exec: &mut E,
        fragments: Vec<Fragment>,
    ) -> Result<u64, OrmError> {
        let table = Self::table();
        let mut components = vec![Fragment::from(query::table(table.table))];
        components.extend(fragments);
        let (sql, params) = assemble(components);
        let sql = format!("DELETE {}", sql);

        trace!(table = table.table, sql = %sql, params = ?params, "delete_all");
        exec.execute(&sql, params)
    }
}

fn upsert_in<R, E>(record: &mut R, exec: &mut E) -> Result<UpsertOutcome, OrmError>
where
    R: Record,
    E: Executor + ?Sized,
{
    if record.exists(exec)? {
        record.update(exec)?;
        Ok(UpsertOutcome {
            inserted: false,
            updated: true,
        })
    } else {
        record.create(exec)?;
        Ok(UpsertOutcome {
            inserted: true,
            updated: false,
        })
    }
}

fn select(table: &TableSql, fragments: Vec<Fragment>) -> (String, Vec<Value>) {
    let mut components = table.projection();
    components.push(Fragment::from(query::table(table.table)));
    components.extend(fragments);
    assemble(components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::checksum::HashInput;
    use crate::orm::value::{to_sql_int64, to_sql_string};
    use std::collections::BTreeMap;

    static COLUMNS: [ColumnSql; 3] = [
        ColumnSql {
            name: "id",
            primary_key: true,
            checksum: false,
            geometry: false,
        },
        ColumnSql {
            name: "location",
            primary_key: false,
            checksum: false,
            geometry: true,
        },
        ColumnSql {
            name: "name",
            primary_key: false,
            checksum: false,
            geometry: false,
        },
    ];

    static PLACES: TableSql = TableSql {
        table: "places",
        columns: &COLUMNS,
        projection: &["`id`", "ST_AsText(`location`)", "`name`"],
        insert: StatementSql {
            sql: "INSERT INTO `places` (`id`, `location`, `name`) VALUES (?, ST_GeomFromText(POINT(?, ?)), ?)",
            columns: &[0, 1, 2],
        },
        insert_ignore_duplicate: None,
        update: None,
        delete: None,
        find_one: None,
        exists: None,
        upsert: None,
    };

    #[test]
    fn test_group_by_column_width() {
        let groups = PLACES.group(vec![
            Value::Int(1),
            Value::Float(1.0),
            Value::Float(2.0),
            Value::from("a"),
        ]);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0], vec![Value::Int(1)]);
        assert_eq!(groups[1], vec![Value::Float(1.0), Value::Float(2.0)]);
        assert_eq!(groups[2], vec![Value::from("a")]);
    }

    #[test]
    fn test_group_fills_missing_values() {
        let groups = PLACES.group(vec![Value::Int(1)]);
        assert_eq!(groups[1], vec![Value::Null, Value::Null]);
        assert_eq!(groups[2], vec![Value::Null]);
    }

    #[test]
    fn test_bind_follows_statement_columns() {
        let groups = PLACES.group(vec![
            Value::Int(1),
            Value::Float(1.0),
            Value::Float(2.0),
            Value::from("a"),
        ]);
        assert_eq!(PLACES.insert.bind(&groups).len(), 4);

        let key_last = StatementSql {
            sql: "",
            columns: &[2, 1, 0],
        };
        assert_eq!(
            key_last.bind(&groups),
            vec![
                Value::from("a"),
                Value::Float(1.0),
                Value::Float(2.0),
                Value::Int(1)
            ]
        );
    }

    #[test]
    fn test_projection_reads_geometry_as_text() {
        let (sql, params) = select(&PLACES, Vec::new());
        assert_eq!(
            sql,
            "SELECT `id`, ST_AsText(`location`), `name` FROM `places`"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_update_outcome_affected_rows() {
        assert_eq!(UpdateOutcome::Unchanged.affected_rows(), 0);
        assert_eq!(UpdateOutcome::Applied(3).affected_rows(), 3);
    }

    static ACCOUNT_COLUMNS: [ColumnSql; 4] = [
        ColumnSql {
            name: "id",
            primary_key: true,
            checksum: false,
            geometry: false,
        },
        ColumnSql {
            name: "name",
            primary_key: false,
            checksum: false,
            geometry: false,
        },
        ColumnSql {
            name: "balance",
            primary_key: false,
            checksum: false,
            geometry: false,
        },
        ColumnSql {
            name: "checksum",
            primary_key: false,
            checksum: true,
            geometry: false,
        },
    ];

    static ACCOUNTS: TableSql = TableSql {
        table: "accounts",
        columns: &ACCOUNT_COLUMNS,
        projection: &["`id`", "`name`", "`balance`", "`checksum`"],
        insert: StatementSql {
            sql: "INSERT INTO `accounts` (`id`, `name`, `balance`, `checksum`) VALUES (?, ?, ?, ?)",
            columns: &[0, 1, 2, 3],
        },
        insert_ignore_duplicate: Some(StatementSql {
            sql: "INSERT INTO `accounts` (`id`, `name`, `balance`, `checksum`) VALUES (?, ?, ?, ?) \
                  ON DUPLICATE KEY UPDATE `id` = `id`",
            columns: &[0, 1, 2, 3],
        }),
        update: Some(StatementSql {
            sql: "UPDATE `accounts` SET `name` = ?, `balance` = ?, `checksum` = ? WHERE `id` = ?",
            columns: &[1, 2, 3, 0],
        }),
        delete: Some(StatementSql {
            sql: "DELETE FROM `accounts` WHERE `id` = ?",
            columns: &[0],
        }),
        find_one: Some(StatementSql {
            sql: "SELECT `id`, `name`, `balance`, `checksum` FROM `accounts` WHERE `id` = ? LIMIT 1",
            columns: &[0],
        }),
        exists: Some(StatementSql {
            sql: "SELECT `id` FROM `accounts` WHERE `id` = ?",
            columns: &[0],
        }),
        upsert: Some(StatementSql {
            sql: "INSERT INTO `accounts` (`id`, `name`, `balance`, `checksum`) VALUES (?, ?, ?, ?) \
                  ON DUPLICATE KEY UPDATE `name` = VALUES(`name`), `balance` = VALUES(`balance`), \
                  `checksum` = VALUES(`checksum`)",
            columns: &[0, 1, 2, 3],
        }),
    };

    fn sql_of(statement: Option<StatementSql>) -> Option<&'static str> {
        statement.map(|s| s.sql)
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Account {
        id: String,
        name: String,
        balance: i32,
        checksum: String,
    }

    impl Account {
        fn new(id: &str, name: &str, balance: i32) -> Self {
            Self {
                id: id.to_string(),
                name: name.to_string(),
                balance,
                checksum: String::new(),
            }
        }
    }

    impl Record for Account {
        fn table() -> &'static TableSql {
            &ACCOUNTS
        }

        fn to_values(&self) -> Vec<Value> {
            vec![
                to_sql_string(&self.id),
                to_sql_string(&self.name),
                to_sql_int64(self.balance),
                to_sql_string(&self.checksum),
            ]
        }

        fn from_row(row: &Row) -> Self {
            Self {
                id: row.string(0),
                name: row.string(1),
                balance: row.int64(2) as i32,
                checksum: row.string(3),
            }
        }

        fn checksum_inputs(&self) -> Vec<String> {
            vec![self.name.hash_input(), self.balance.hash_input()]
        }

        fn stored_checksum(&self) -> Option<&str> {
            Some(self.checksum.as_str())
        }

        fn set_checksum(&mut self, checksum: String) {
            self.checksum = checksum;
        }

        fn clear_primary_key(&mut self) {
            self.id = String::new();
        }
    }

    /// Table without a primary key
    #[derive(Debug, Default)]
    struct Event;

    static EVENTS: TableSql = TableSql {
        table: "events",
        columns: &[],
        projection: &[],
        insert: StatementSql {
            sql: "INSERT INTO `events` () VALUES ()",
            columns: &[],
        },
        insert_ignore_duplicate: None,
        update: None,
        delete: None,
        find_one: None,
        exists: None,
        upsert: None,
    };

    impl Record for Event {
        fn table() -> &'static TableSql {
            &EVENTS
        }

        fn to_values(&self) -> Vec<Value> {
            Vec::new()
        }

        fn from_row(_row: &Row) -> Self {
            Event
        }
    }

    /// In-memory `accounts` table answering the statements above
    #[derive(Debug, Default)]
    struct FakeDb {
        rows: BTreeMap<String, Vec<Value>>,
        log: Vec<(String, Vec<Value>)>,
        fail_on: Option<&'static str>,
        commits: usize,
        rollbacks: usize,
    }

    fn key_of(value: &Value) -> String {
        value.to_string()
    }

    impl Executor for FakeDb {
        fn execute(&mut self, sql: &str, params: Vec<Value>) -> Result<u64, OrmError> {
            self.log.push((sql.to_string(), params.clone()));
            if self.fail_on == Some(sql) {
                return Err(OrmError::database(std::io::Error::other("injected failure")));
            }

            if sql == ACCOUNTS.insert.sql {
                let key = key_of(&params[0]);
                if self.rows.contains_key(&key) {
                    return Err(OrmError::database(std::io::Error::other("duplicate key")));
                }
                self.rows.insert(key, params);
                Ok(1)
            } else if Some(sql) == sql_of(ACCOUNTS.insert_ignore_duplicate) {
                let key = key_of(&params[0]);
                if self.rows.contains_key(&key) {
                    return Ok(0);
                }
                self.rows.insert(key, params);
                Ok(1)
            } else if Some(sql) == sql_of(ACCOUNTS.update) {
                let key = key_of(&params[3]);
                match self.rows.get_mut(&key) {
                    Some(row) => {
                        row[1..].clone_from_slice(&params[..3]);
                        Ok(1)
                    }
                    None => Ok(0),
                }
            } else if Some(sql) == sql_of(ACCOUNTS.delete) {
                Ok(u64::from(self.rows.remove(&key_of(&params[0])).is_some()))
            } else if Some(sql) == sql_of(ACCOUNTS.upsert) {
                let key = key_of(&params[0]);
                match self.rows.insert(key, params.clone()) {
                    None => Ok(1),
                    Some(previous) if previous == params => Ok(0),
                    Some(_) => Ok(2),
                }
            } else if sql.starts_with("DELETE FROM `accounts`") {
                let removed = self.rows.len() as u64;
                self.rows.clear();
                Ok(removed)
            } else {
                Err(OrmError::database(std::io::Error::other(format!(
                    "unexpected statement: {}",
                    sql
                ))))
            }
        }

        fn query(&mut self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, OrmError> {
            self.log.push((sql.to_string(), params.clone()));
            if self.fail_on == Some(sql) {
                return Err(OrmError::database(std::io::Error::other("injected failure")));
            }

            if Some(sql) == sql_of(ACCOUNTS.find_one) {
                Ok(self
                    .rows
                    .get(&key_of(&params[0]))
                    .map(|values| Row::new(values.clone()))
                    .into_iter()
                    .collect())
            } else if Some(sql) == sql_of(ACCOUNTS.exists) {
                Ok(self
                    .rows
                    .get(&key_of(&params[0]))
                    .map(|values| Row::new(vec![values[0].clone()]))
                    .into_iter()
                    .collect())
            } else if sql.starts_with("SELECT COUNT(*)") {
                Ok(vec![Row::new(vec![Value::Int(self.rows.len() as i64)])])
            } else {
                Ok(self.rows.values().map(|v| Row::new(v.clone())).collect())
            }
        }
    }

    struct FakeTx<'a> {
        db: &'a mut FakeDb,
        snapshot: BTreeMap<String, Vec<Value>>,
    }

    impl Executor for FakeTx<'_> {
        fn execute(&mut self, sql: &str, params: Vec<Value>) -> Result<u64, OrmError> {
            self.db.execute(sql, params)
        }

        fn query(&mut self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, OrmError> {
            self.db.query(sql, params)
        }
    }

    impl Transaction for FakeTx<'_> {
        fn commit(self) -> Result<(), OrmError> {
            self.db.commits += 1;
            Ok(())
        }

        fn rollback(self) -> Result<(), OrmError> {
            self.db.rows = self.snapshot;
            self.db.rollbacks += 1;
            Ok(())
        }
    }

    impl Connection for FakeDb {
        type Tx<'a> = FakeTx<'a>;

        fn begin(&mut self) -> Result<FakeTx<'_>, OrmError> {
            let snapshot = self.rows.clone();
            Ok(FakeTx { db: self, snapshot })
        }
    }

    #[test]
    fn test_create_binds_computed_checksum() {
        let mut db = FakeDb::default();
        let account = Account::new("a1", "alice", 10);

        assert_eq!(account.create(&mut db).unwrap(), 1);

        let (sql, params) = &db.log[0];
        assert_eq!(sql, ACCOUNTS.insert.sql);
        assert_eq!(params[3], Value::Text(account.calculate_checksum()));
        // create leaves the in-memory checksum alone
        assert!(account.checksum.is_empty());
    }

    #[test]
    fn test_create_ignore_duplicate() {
        let mut db = FakeDb::default();
        let account = Account::new("a1", "alice", 10);
        assert_eq!(account.create_ignore_duplicate(&mut db).unwrap(), 1);
        assert_eq!(account.create_ignore_duplicate(&mut db).unwrap(), 0);
        assert_eq!(db.rows.len(), 1);
    }

    #[test]
    fn test_update_unchanged_sends_nothing() {
        let mut db = FakeDb::default();
        let mut account = Account::new("a1", "alice", 10);
        account.checksum = account.calculate_checksum();

        assert_eq!(account.update(&mut db).unwrap(), UpdateOutcome::Unchanged);
        assert!(db.log.is_empty());
    }

    #[test]
    fn test_update_dirty_record() {
        let mut db = FakeDb::default();
        let mut account = Account::new("a1", "alice", 10);
        account.create(&mut db).unwrap();

        account.balance = 25;
        assert!(account.is_dirty().0);
        assert_eq!(account.update(&mut db).unwrap(), UpdateOutcome::Applied(1));
        assert!(!account.is_dirty().0);

        let (sql, params) = db.log.last().unwrap();
        assert_eq!(Some(sql.as_str()), sql_of(ACCOUNTS.update));
        assert_eq!(params[0], Value::from("alice"));
        assert_eq!(params[1], Value::Int(25));
        assert_eq!(params[2], Value::Text(account.checksum.clone()));
        assert_eq!(params[3], Value::from("a1"));
    }

    #[test]
    fn test_find_one_loads_row() {
        let mut db = FakeDb::default();
        Account::new("a1", "alice", 10).create(&mut db).unwrap();

        let mut found = Account::default();
        assert!(found.find_one(&mut db, "a1").unwrap());
        assert_eq!(found.name, "alice");
        assert_eq!(found.balance, 10);
        assert_eq!(found.checksum, found.calculate_checksum());

        let mut missing = Account::default();
        assert!(!missing.find_one(&mut db, "nope").unwrap());
        assert_eq!(missing, Account::default());
    }

    #[test]
    fn test_exists() {
        let mut db = FakeDb::default();
        let account = Account::new("a1", "alice", 10);
        assert!(!account.exists(&mut db).unwrap());
        account.create(&mut db).unwrap();
        assert!(account.exists(&mut db).unwrap());
    }

    #[test]
    fn test_delete_resets_key() {
        let mut db = FakeDb::default();
        let mut account = Account::new("a1", "alice", 10);
        account.create(&mut db).unwrap();

        assert!(account.delete(&mut db).unwrap());
        assert!(account.id.is_empty());
        assert!(db.rows.is_empty());

        let mut gone = Account::new("a1", "alice", 10);
        assert!(!gone.delete(&mut db).unwrap());
    }

    #[test]
    fn test_upsert_inserts_then_updates() {
        let mut db = FakeDb::default();
        let mut account = Account::new("a1", "alice", 10);

        let first = account.upsert(&mut db).unwrap();
        assert_eq!(
            first,
            UpsertOutcome {
                inserted: true,
                updated: false
            }
        );

        account.balance = 11;
        let second = account.upsert(&mut db).unwrap();
        assert_eq!(
            second,
            UpsertOutcome {
                inserted: false,
                updated: true
            }
        );
        assert_eq!(db.commits, 2);
        assert_eq!(db.rows["a1"][2], Value::Int(11));

        // Same values again: the row is found, the checksum matches and
        // nothing is written, yet the update branch is reported
        let writes = db.log.len();
        let third = account.upsert(&mut db).unwrap();
        assert_eq!(
            third,
            UpsertOutcome {
                inserted: false,
                updated: true
            }
        );
        assert_eq!(db.commits, 3);
        assert_eq!(db.log.len(), writes + 1);
        assert_eq!(Some(db.log.last().unwrap().0.as_str()), sql_of(ACCOUNTS.exists));
    }

    #[test]
    fn test_failed_update_keeps_record_dirty() {
        let mut db = FakeDb::default();
        let mut account = Account::new("a1", "alice", 10);
        account.create(&mut db).unwrap();
        account.checksum = account.calculate_checksum();

        account.balance = 30;
        db.fail_on = sql_of(ACCOUNTS.update);
        assert!(account.update(&mut db).is_err());
        assert!(account.is_dirty().0);
        assert_eq!(db.rows["a1"][2], Value::Int(10));

        db.fail_on = None;
        assert_eq!(account.update(&mut db).unwrap(), UpdateOutcome::Applied(1));
        assert!(!account.is_dirty().0);
        assert_eq!(db.rows["a1"][2], Value::Int(30));
    }

    #[test]
    fn test_upsert_rolls_back_on_failure() {
        let mut db = FakeDb::default();
        db.rows.insert(
            "a1".to_string(),
            Account::new("a1", "alice", 10).to_values(),
        );
        db.fail_on = sql_of(ACCOUNTS.update);

        let mut account = Account::new("a1", "alice", 99);
        let err = account.upsert(&mut db).unwrap_err();
        assert!(matches!(err, OrmError::Database(_)));
        assert_eq!(db.rollbacks, 1);
        assert_eq!(db.commits, 0);
        assert_eq!(db.rows["a1"][2], Value::Int(10));
    }

    #[test]
    fn test_upsert_tx_maps_affected_rows() {
        let mut db = FakeDb::default();
        let mut account = Account::new("a1", "alice", 10);

        let inserted = account.upsert_tx(&mut db).unwrap();
        assert!(inserted.inserted && !inserted.updated);

        let same = account.upsert_tx(&mut db).unwrap();
        assert_eq!(same, UpsertOutcome::default());

        account.balance = 12;
        let updated = account.upsert_tx(&mut db).unwrap();
        assert!(!updated.inserted && updated.updated);
    }

    #[test]
    fn test_operations_need_primary_key() {
        let mut db = FakeDb::default();
        let mut event = Event;

        let err = event.update(&mut db).unwrap_err();
        assert!(matches!(
            err,
            OrmError::NoPrimaryKey {
                table: "events",
                operation: "update"
            }
        ));
        assert!(event.delete(&mut db).is_err());
        assert!(event.exists(&mut db).is_err());
        assert!(event.find_one(&mut db, 1).is_err());
        assert!(event.upsert(&mut db).is_err());
        assert!(event.upsert_tx(&mut db).is_err());
        assert!(db.log.is_empty());
    }

    #[test]
    fn test_count_and_delete_all() {
        let mut db = FakeDb::default();
        Account::new("a1", "alice", 10).create(&mut db).unwrap();
        Account::new("a2", "bob", 20).create(&mut db).unwrap();

        assert_eq!(Account::count(&mut db, Vec::new()).unwrap(), 2);
        assert_eq!(db.log.last().unwrap().0, "SELECT COUNT(*) AS `count` FROM `accounts`");

        let all = Account::find_all(&mut db, Vec::new()).unwrap();
        assert_eq!(all.len(), 2);

        assert_eq!(Account::delete_all(&mut db, Vec::new()).unwrap(), 2);
        assert_eq!(db.log.last().unwrap().0, "DELETE FROM `accounts`");
    }

    #[test]
    fn test_find_all_with_condition() {
        let mut db = FakeDb::default();
        Account::find_all(
            &mut db,
            crate::fragments![query::is_greater_than("balance", 5), query::limit(10)],
        )
        .unwrap();

        let (sql, params) = db.log.last().unwrap();
        assert_eq!(
            sql,
            "SELECT `id`, `name`, `balance`, `checksum` FROM `accounts` WHERE `balance` > ? LIMIT 10"
        );
        assert_eq!(params, &vec![Value::Int(5)]);
    }
}
