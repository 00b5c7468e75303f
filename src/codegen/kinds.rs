//! Per-type rendering
//!
//! Each scalar type has one [`ColumnKind`] implementation which knows how a
//! column of that type is bound, projected, converted to and from transfer
//! values, and initialized in generated code.

use crate::error::OrmgenError;
use crate::orm::projection_column;
use crate::schema::{Column, ScalarType};

/// How a column of one scalar type appears in statements and generated code
pub trait ColumnKind {
    /// Placeholder bound in INSERT and UPDATE statements
    fn placeholder(&self) -> &'static str {
        "?"
    }

    /// Expression selecting the column
    fn projection(&self, name: &str) -> String {
        projection_column(name, false).to_string()
    }

    /// Rust type of the record field
    fn rust_type(&self) -> String;

    /// Expressions turning `field` into transfer values, one per placeholder
    fn to_transfer(&self, field: &str) -> Vec<String>;

    /// Expression reading the field back from `row` at `index`
    fn from_transfer(&self, index: usize) -> String;

    /// Value the field holds when unset, also used to reset a deleted key
    fn null_value(&self) -> String;

    /// Value used when building sample records
    fn sample_value(&self, column: &Column) -> String;
}

fn truncated(value: &str, max_length: Option<u64>) -> String {
    match max_length.and_then(|n| usize::try_from(n).ok()) {
        Some(n) if n > 0 => value.chars().take(n).collect(),
        _ => value.to_string(),
    }
}

pub struct StringKind;

impl ColumnKind for StringKind {
    fn rust_type(&self) -> String {
        "String".to_string()
    }

    fn to_transfer(&self, field: &str) -> Vec<String> {
        vec![format!("orm::to_sql_string(&{})", field)]
    }

    fn from_transfer(&self, index: usize) -> String {
        format!("row.string({})", index)
    }

    fn null_value(&self) -> String {
        "String::new()".to_string()
    }

    fn sample_value(&self, column: &Column) -> String {
        if column.primary_key {
            return match column.max_length {
                Some(n) if n < 64 => format!(
                    "{{ let mut id = orm::unique_id(); id.truncate({}); id }}",
                    n
                ),
                _ => "orm::unique_id()".to_string(),
            };
        }
        let value = if column.is_json() {
            format!("{{\"value\":\"{}\"}}", column.name)
        } else {
            truncated(&column.name, column.max_length)
        };
        format!("{:?}.to_string()", value)
    }
}

pub struct BytesKind;

impl ColumnKind for BytesKind {
    fn rust_type(&self) -> String {
        "Vec<u8>".to_string()
    }

    fn to_transfer(&self, field: &str) -> Vec<String> {
        vec![format!("orm::to_sql_blob(&{})", field)]
    }

    fn from_transfer(&self, index: usize) -> String {
        format!("row.bytes({})", index)
    }

    fn null_value(&self) -> String {
        "Vec::new()".to_string()
    }

    fn sample_value(&self, _column: &Column) -> String {
        "vec![0x1, 0x2]".to_string()
    }
}

pub struct TimestampKind;

impl ColumnKind for TimestampKind {
    fn rust_type(&self) -> String {
        "Option<orm::Timestamp>".to_string()
    }

    fn to_transfer(&self, field: &str) -> Vec<String> {
        vec![format!("orm::to_sql_date({}.as_ref())", field)]
    }

    fn from_transfer(&self, index: usize) -> String {
        format!("row.timestamp({})", index)
    }

    fn null_value(&self) -> String {
        "None".to_string()
    }

    fn sample_value(&self, _column: &Column) -> String {
        "Some(orm::now())".to_string()
    }
}

pub struct BoolKind;

impl ColumnKind for BoolKind {
    fn rust_type(&self) -> String {
        "bool".to_string()
    }

    fn to_transfer(&self, field: &str) -> Vec<String> {
        vec![format!("orm::to_sql_bool({})", field)]
    }

    fn from_transfer(&self, index: usize) -> String {
        format!("row.bool({})", index)
    }

    fn null_value(&self) -> String {
        "false".to_string()
    }

    fn sample_value(&self, _column: &Column) -> String {
        "true".to_string()
    }
}

pub struct IntKind;

impl ColumnKind for IntKind {
    fn rust_type(&self) -> String {
        "i32".to_string()
    }

    fn to_transfer(&self, field: &str) -> Vec<String> {
        vec![format!("orm::to_sql_int64({})", field)]
    }

    fn from_transfer(&self, index: usize) -> String {
        format!("row.int64({}) as i32", index)
    }

    fn null_value(&self) -> String {
        "0".to_string()
    }

    fn sample_value(&self, _column: &Column) -> String {
        "orm::rand_uid()".to_string()
    }
}

pub struct FloatKind;

impl ColumnKind for FloatKind {
    fn rust_type(&self) -> String {
        "f32".to_string()
    }

    fn to_transfer(&self, field: &str) -> Vec<String> {
        vec![format!("orm::to_sql_float64({})", field)]
    }

    fn from_transfer(&self, index: usize) -> String {
        format!("row.float64({}) as f32", index)
    }

    fn null_value(&self) -> String {
        "0.0".to_string()
    }

    fn sample_value(&self, _column: &Column) -> String {
        "1.104".to_string()
    }
}

/// Enum columns travel as their raw stored value
pub struct EnumKind {
    pub name: String,
}

impl ColumnKind for EnumKind {
    fn rust_type(&self) -> String {
        self.name.clone()
    }

    fn to_transfer(&self, field: &str) -> Vec<String> {
        vec![format!("orm::to_sql_string({}.sql_value())", field)]
    }

    fn from_transfer(&self, index: usize) -> String {
        format!("{}::from_sql_value(&row.string({}))", self.name, index)
    }

    fn null_value(&self) -> String {
        format!("{}::default()", self.name)
    }

    fn sample_value(&self, column: &Column) -> String {
        match column.enum_def.as_ref().and_then(|def| def.fields.first()) {
            Some(field) => format!("{}::{}", self.name, field.variant),
            None => self.null_value(),
        }
    }
}

/// Spatial columns bind two coordinates and read back as `POINT(x y)` text
pub struct PointKind;

impl ColumnKind for PointKind {
    fn placeholder(&self) -> &'static str {
        "POINT(?,?)"
    }

    fn projection(&self, name: &str) -> String {
        projection_column(name, true).to_string()
    }

    fn rust_type(&self) -> String {
        "orm::Geometry".to_string()
    }

    fn to_transfer(&self, field: &str) -> Vec<String> {
        vec![
            format!("orm::Value::from({}.longitude)", field),
            format!("orm::Value::from({}.latitude)", field),
        ]
    }

    fn from_transfer(&self, index: usize) -> String {
        format!("orm::Geometry::from_wkt(&row.string({}))", index)
    }

    fn null_value(&self) -> String {
        "orm::Geometry::default()".to_string()
    }

    fn sample_value(&self, _column: &Column) -> String {
        "orm::Geometry::new(-122.389_09, 37.614_54)".to_string()
    }
}

/// Select the rendering for a column, failing on unsupported types
pub fn kind_for(table: &str, column: &Column) -> Result<Box<dyn ColumnKind>, OrmgenError> {
    let kind: Box<dyn ColumnKind> = match column.scalar() {
        ScalarType::String => Box::new(StringKind),
        ScalarType::Bytes => Box::new(BytesKind),
        ScalarType::Timestamp => Box::new(TimestampKind),
        ScalarType::Bool => Box::new(BoolKind),
        ScalarType::Int32 => Box::new(IntKind),
        ScalarType::Float32 => Box::new(FloatKind),
        ScalarType::Enum(name) => Box::new(EnumKind { name: name.clone() }),
        ScalarType::Point => Box::new(PointKind),
        ScalarType::Unsupported(native) => {
            return Err(OrmgenError::UnsupportedType {
                table: table.to_string(),
                column: column.name.clone(),
                native_type: native.clone(),
            })
        }
    };
    Ok(kind)
}
