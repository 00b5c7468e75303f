//! Executors backed by the `mysql` driver

use chrono::{Datelike, NaiveDate, Timelike};
use mysql::prelude::Queryable;
use mysql::{Conn, Params, TxOpts};

use super::record::{Connection, Executor, Transaction};
use super::value::{Row, Value};
use crate::error::OrmError;

fn to_driver_value(value: Value) -> mysql::Value {
    match value {
        Value::Null => mysql::Value::NULL,
        Value::Int(i) => mysql::Value::Int(i),
        Value::Float(f) => mysql::Value::Double(f),
        Value::Bool(b) => mysql::Value::Int(i64::from(b)),
        Value::Text(s) => mysql::Value::Bytes(s.into_bytes()),
        Value::Bytes(b) => mysql::Value::Bytes(b),
        Value::Timestamp(t) => mysql::Value::Date(
            t.year() as u16,
            t.month() as u8,
            t.day() as u8,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
            t.timestamp_subsec_micros(),
        ),
    }
}

fn from_driver_value(value: &mysql::Value) -> Value {
    match value {
        mysql::Value::NULL => Value::Null,
        mysql::Value::Bytes(b) => Value::Bytes(b.clone()),
        mysql::Value::Int(i) => Value::Int(*i),
        mysql::Value::UInt(u) => i64::try_from(*u).map_or(Value::Float(*u as f64), Value::Int),
        mysql::Value::Float(f) => Value::Float(f64::from(*f)),
        mysql::Value::Double(f) => Value::Float(*f),
        mysql::Value::Date(year, month, day, hour, minute, second, micros) => {
            NaiveDate::from_ymd_opt(i32::from(*year), u32::from(*month), u32::from(*day))
                .and_then(|date| {
                    date.and_hms_micro_opt(
                        u32::from(*hour),
                        u32::from(*minute),
                        u32::from(*second),
                        *micros,
                    )
                })
                .map_or(Value::Null, |naive| Value::Timestamp(naive.and_utc()))
        }
        mysql::Value::Time(negative, days, hours, minutes, seconds, _) => {
            let hours = u32::from(*hours) + days * 24;
            let sign = if *negative { "-" } else { "" };
            Value::Text(format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds))
        }
    }
}

fn to_params(values: Vec<Value>) -> Params {
    Params::from(values.into_iter().map(to_driver_value).collect::<Vec<_>>())
}

/// Convert a driver row into a transfer row
pub fn row_from_driver(row: &mysql::Row) -> Row {
    Row::new(
        (0..row.len())
            .map(|i| row.as_ref(i).map_or(Value::Null, from_driver_value))
            .collect(),
    )
}

fn run_execute<Q: Queryable>(
    q: &mut Q,
    sql: &str,
    params: Vec<Value>,
) -> Result<(), OrmError> {
    q.exec_drop(sql, to_params(params)).map_err(OrmError::database)
}

fn run_query<Q: Queryable>(q: &mut Q, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, OrmError> {
    let rows: Vec<mysql::Row> = q.exec(sql, to_params(params)).map_err(OrmError::database)?;
    Ok(rows.iter().map(row_from_driver).collect())
}

impl Executor for Conn {
    fn execute(&mut self, sql: &str, params: Vec<Value>) -> Result<u64, OrmError> {
        run_execute(self, sql, params)?;
        Ok(self.affected_rows())
    }

    fn query(&mut self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, OrmError> {
        run_query(self, sql, params)
    }
}

impl Connection for Conn {
    type Tx<'a> = mysql::Transaction<'a>;

    fn begin(&mut self) -> Result<Self::Tx<'_>, OrmError> {
        self.start_transaction(TxOpts::default())
            .map_err(OrmError::database)
    }
}

impl Executor for mysql::Transaction<'_> {
    fn execute(&mut self, sql: &str, params: Vec<Value>) -> Result<u64, OrmError> {
        run_execute(self, sql, params)?;
        Ok(self.affected_rows())
    }

    fn query(&mut self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, OrmError> {
        run_query(self, sql, params)
    }
}

impl Transaction for mysql::Transaction<'_> {
    fn commit(self) -> Result<(), OrmError> {
        mysql::Transaction::commit(self).map_err(OrmError::database)
    }

    fn rollback(self) -> Result<(), OrmError> {
        mysql::Transaction::rollback(self).map_err(OrmError::database)
    }
}
