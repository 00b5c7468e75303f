//! Transfer values
//!
//! Null-safe values moved to and from the database, the lenient row
//! accessors generated code reads through, and the geometry point type.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};

/// In-memory timestamp representation used by generated records
pub type Timestamp = DateTime<Utc>;

/// Magic 32-bit integer which is stored as NULL
pub const NULL_INT32: i32 = -2_147_483_647;

/// Returns true if the value is the NULL integer sentinel
pub fn is_null_int(v: i32) -> bool {
    v == NULL_INT32
}

/// A single bound parameter or fetched column value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(Timestamp),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{:.6}", v),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => f.write_str(s),
            Value::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Value::Timestamp(t) => write!(f, "{}", t.format(SQL_DATETIME)),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

const SQL_DATETIME: &str = "%Y-%m-%d %H:%M:%S";
const ISO_DATETIME: &str = "%Y-%m-%dT%H:%M:%S";

/// Null-safe string: the empty string is stored as NULL
pub fn to_sql_string(v: &str) -> Value {
    if v.is_empty() {
        Value::Null
    } else {
        Value::Text(v.to_string())
    }
}

/// Null-safe integer: the [`NULL_INT32`] sentinel is stored as NULL
pub fn to_sql_int64(v: i32) -> Value {
    if is_null_int(v) {
        Value::Null
    } else {
        Value::Int(i64::from(v))
    }
}

pub fn to_sql_bool(v: bool) -> Value {
    Value::Bool(v)
}

pub fn to_sql_float64(v: f32) -> Value {
    Value::Float(f64::from(v))
}

pub fn to_sql_date(v: Option<&Timestamp>) -> Value {
    v.map_or(Value::Null, |t| Value::Timestamp(*t))
}

/// Null-safe date parsed from text
///
/// Accepts `now`, `YYYY-MM-DDTHH:MM:SS` with an optional trailing `Z`, and
/// `YYYY-MM-DD HH:MM:SS`. Anything else is NULL.
pub fn to_sql_date_str(v: &str) -> Value {
    to_sql_date(parse_timestamp(v).as_ref())
}

/// Raw bytes travel through the string transfer type untouched
pub fn to_sql_blob(v: &[u8]) -> Value {
    Value::Bytes(v.to_vec())
}

/// Parse the textual timestamp forms accepted by [`to_sql_date_str`]
pub fn parse_timestamp(v: &str) -> Option<Timestamp> {
    if v == "now" {
        return Some(Utc::now());
    }
    let v = v.strip_suffix('Z').unwrap_or(v);
    if v.is_empty() {
        return None;
    }
    let format = if v.contains('T') {
        ISO_DATETIME
    } else {
        SQL_DATETIME
    };
    NaiveDateTime::parse_from_str(v, format)
        .ok()
        .map(|naive| naive.and_utc())
}

/// One fetched row, in projection order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

static NULL: Value = Value::Null;

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column value, NULL when out of range
    pub fn get(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&NULL)
    }

    /// True when the column holds a non-NULL value
    pub fn is_valid(&self, index: usize) -> bool {
        !self.get(index).is_null()
    }

    pub fn string(&self, index: usize) -> String {
        self.get(index).to_string()
    }

    pub fn int64(&self, index: usize) -> i64 {
        match self.get(index) {
            Value::Int(i) => *i,
            Value::Float(f) => *f as i64,
            Value::Bool(b) => i64::from(*b),
            Value::Text(s) => s.trim().parse().unwrap_or(0),
            Value::Bytes(b) => String::from_utf8_lossy(b).trim().parse().unwrap_or(0),
            Value::Null | Value::Timestamp(_) => 0,
        }
    }

    pub fn float64(&self, index: usize) -> f64 {
        match self.get(index) {
            Value::Float(f) => *f,
            Value::Int(i) => *i as f64,
            Value::Text(s) => s.trim().parse().unwrap_or(0.0),
            Value::Bytes(b) => String::from_utf8_lossy(b).trim().parse().unwrap_or(0.0),
            Value::Null | Value::Bool(_) | Value::Timestamp(_) => 0.0,
        }
    }

    pub fn bool(&self, index: usize) -> bool {
        match self.get(index) {
            Value::Bool(b) => *b,
            Value::Int(i) => *i > 0,
            Value::Float(f) => *f > 0.0,
            Value::Text(s) => s == "true" || s == "1",
            Value::Bytes(b) => b.as_slice() == b"true" || b.as_slice() == b"1",
            Value::Null | Value::Timestamp(_) => false,
        }
    }

    pub fn bytes(&self, index: usize) -> Vec<u8> {
        match self.get(index) {
            Value::Bytes(b) => b.clone(),
            Value::Null => Vec::new(),
            other => other.to_string().into_bytes(),
        }
    }

    pub fn timestamp(&self, index: usize) -> Option<Timestamp> {
        match self.get(index) {
            Value::Timestamp(t) => Some(*t),
            Value::Text(s) => parse_timestamp(s),
            Value::Bytes(b) => parse_timestamp(&String::from_utf8_lossy(b)),
            _ => None,
        }
    }
}

/// A (longitude, latitude) point stored in a spatial column
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Geometry {
    pub longitude: f32,
    pub latitude: f32,
}

impl Geometry {
    pub fn new(longitude: f32, latitude: f32) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Text form as returned by `ST_AsText`, e.g. `POINT(-122.38 37.61)`
    pub fn to_wkt(&self) -> String {
        format!("POINT({} {})", self.longitude, self.latitude)
    }

    /// Parse `POINT(x y)` text; anything else yields the origin
    pub fn from_wkt(text: &str) -> Self {
        let inner = text
            .trim()
            .strip_prefix("POINT(")
            .and_then(|rest| rest.strip_suffix(')'));
        let Some(inner) = inner else {
            return Self::default();
        };
        let tokens: Vec<&str> = inner.split_whitespace().collect();
        match tokens.as_slice() {
            [x, y] => Self {
                longitude: x.parse().unwrap_or(0.0),
                latitude: y.parse().unwrap_or(0.0),
            },
            _ => Self::default(),
        }
    }
}
