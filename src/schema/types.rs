//! Native column type mapping
//!
//! Maps a MySQL data type name to the in-memory scalar type, the protobuf
//! wire type and the null-safe transfer type used when binding values.

use std::fmt;

use serde::Serialize;

/// In-memory type of a generated field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ScalarType {
    String,
    Bytes,
    Timestamp,
    Bool,
    Int32,
    Float32,
    /// Synthetic enum type, carries the type name
    Enum(String),
    /// (longitude, latitude) point
    Point,
    /// Native type outside the mapping table
    Unsupported(String),
}

impl ScalarType {
    /// External dependency a field of this type pulls in
    pub fn dependency(&self) -> Option<Dependency> {
        match self {
            ScalarType::Timestamp => Some(Dependency::Timestamp),
            ScalarType::Point => Some(Dependency::Geometry),
            _ => None,
        }
    }
}

/// Serialization type of a generated message field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum WireType {
    String,
    Bytes,
    Timestamp,
    Bool,
    Int32,
    Float,
    Enum(String),
    Geometry,
    Unknown(String),
}

impl WireType {
    pub fn proto_name(&self) -> String {
        match self {
            WireType::String => "string".to_string(),
            WireType::Bytes => "bytes".to_string(),
            WireType::Timestamp => "google.protobuf.Timestamp".to_string(),
            WireType::Bool => "bool".to_string(),
            WireType::Int32 => "int32".to_string(),
            WireType::Float => "float".to_string(),
            WireType::Enum(name) => name.clone(),
            WireType::Geometry => "orm.Geometry".to_string(),
            WireType::Unknown(native) => format!("unknown_{}", native),
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.proto_name())
    }
}

/// Null-safe wrapper a value travels through on its way to and from the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TransferType {
    NullString,
    NullTime,
    NullBool,
    NullInt64,
    NullFloat64,
}

/// Additional artifact a table's generated code must import
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Dependency {
    Timestamp,
    Geometry,
}

impl Dependency {
    pub fn proto_import(&self) -> &'static str {
        match self {
            Dependency::Timestamp => "google/protobuf/timestamp.proto",
            Dependency::Geometry => "geometry.proto",
        }
    }
}

/// Result of mapping one native column type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeMapping {
    pub scalar: ScalarType,
    pub wire: WireType,
    /// `None` for unsupported types
    pub transfer: Option<TransferType>,
}

impl TypeMapping {
    fn new(scalar: ScalarType, wire: WireType, transfer: TransferType) -> Self {
        Self {
            scalar,
            wire,
            transfer: Some(transfer),
        }
    }

    pub fn dependency(&self) -> Option<Dependency> {
        self.scalar.dependency()
    }
}

/// Map a native data type name
///
/// `enum_name` is the synthetic type name used when the type is an enum or
/// set. Unrecognized types map to [`ScalarType::Unsupported`].
pub fn map_type(data_type: &str, enum_name: &str) -> TypeMapping {
    let native = data_type.trim().to_lowercase();
    match native.as_str() {
        "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "json" => {
            TypeMapping::new(ScalarType::String, WireType::String, TransferType::NullString)
        }
        "tinyblob" | "blob" | "mediumblob" | "longblob" | "binary" | "varbinary" => {
            TypeMapping::new(ScalarType::Bytes, WireType::Bytes, TransferType::NullString)
        }
        "date" | "time" | "datetime" | "timestamp" => TypeMapping::new(
            ScalarType::Timestamp,
            WireType::Timestamp,
            TransferType::NullTime,
        ),
        "tinyint" | "bool" | "boolean" => {
            TypeMapping::new(ScalarType::Bool, WireType::Bool, TransferType::NullBool)
        }
        "smallint" | "int" | "integer" | "mediumint" | "bigint" => {
            TypeMapping::new(ScalarType::Int32, WireType::Int32, TransferType::NullInt64)
        }
        "float" | "decimal" | "double" => TypeMapping::new(
            ScalarType::Float32,
            WireType::Float,
            TransferType::NullFloat64,
        ),
        "enum" | "set" => TypeMapping::new(
            ScalarType::Enum(enum_name.to_string()),
            WireType::Enum(enum_name.to_string()),
            TransferType::NullString,
        ),
        "geometry" | "point" => {
            TypeMapping::new(ScalarType::Point, WireType::Geometry, TransferType::NullString)
        }
        _ => TypeMapping {
            scalar: ScalarType::Unsupported(native.clone()),
            wire: WireType::Unknown(native),
            transfer: None,
        },
    }
}
