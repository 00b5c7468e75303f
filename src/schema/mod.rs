//! Schema data structures
//!
//! These types represent the discovered tables and columns and form the
//! contract between introspection (produces) and code generation (consumes).

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::OrmgenError;
use crate::introspect::TableFilter;

pub mod enums;
pub mod types;

pub use enums::{EnumDef, EnumField};
pub use types::{map_type, Dependency, ScalarType, TransferType, TypeMapping, WireType};

/// Name of the column used for dirty tracking
pub const CHECKSUM_COLUMN: &str = "checksum";

/// A complete database schema
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    pub tables: Vec<Table>,
}

impl Schema {
    /// Build a schema from discovery rows, keeping only tables the filter accepts
    pub fn from_rows(
        name: &str,
        rows: Vec<ColumnRow>,
        filter: &TableFilter,
    ) -> Result<Self, OrmgenError> {
        let rows: Vec<ColumnRow> = rows
            .into_iter()
            .filter(|row| filter.should_include(&row.table_name))
            .collect();
        let tables = build_tables(rows)?;
        Ok(Self {
            name: name.to_string(),
            tables,
        })
    }

    /// Union of every table's dependencies
    pub fn dependencies(&self) -> BTreeSet<Dependency> {
        self.tables.iter().flat_map(Table::dependencies).collect()
    }
}

/// One row of column metadata, as returned by the discovery query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnRow {
    pub table_name: String,
    pub column_name: String,
    /// `PRI` for primary key columns
    pub column_key: String,
    pub is_nullable: bool,
    pub data_type: String,
    pub column_default: Option<String>,
    pub max_length: Option<u64>,
    pub precision: Option<u64>,
    pub scale: Option<u64>,
    /// Full type, e.g. `varchar(64)` or `enum('a','b')`
    pub column_type: String,
    pub ordinal_position: u32,
}

/// Database table
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
        }
    }

    /// First column flagged as primary key
    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// First column named `checksum`
    pub fn checksum(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_checksum())
    }

    /// Columns that are not the primary key, in declared order
    pub fn non_key_columns(&self) -> Vec<&Column> {
        let pk = self.primary_key().map(|c| c.position);
        self.columns
            .iter()
            .filter(|c| Some(c.position) != pk)
            .collect()
    }

    /// Columns that feed the checksum: not the key and not the checksum itself
    pub fn checksum_columns(&self) -> Vec<&Column> {
        self.non_key_columns()
            .into_iter()
            .filter(|c| !c.is_checksum())
            .collect()
    }

    /// External dependencies required by this table's columns
    pub fn dependencies(&self) -> BTreeSet<Dependency> {
        self.columns
            .iter()
            .filter_map(|c| c.mapping.dependency())
            .collect()
    }

    pub fn enums(&self) -> Vec<&EnumDef> {
        self.columns
            .iter()
            .filter_map(|c| c.enum_def.as_ref())
            .collect()
    }

    /// PascalCase struct name
    pub fn struct_name(&self) -> String {
        type_ident(&self.name)
    }
}

/// A table column
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    /// 1-based ordinal position
    pub position: u32,
    pub primary_key: bool,
    pub name: String,
    pub data_type: String,
    pub column_type: String,
    pub mapping: TypeMapping,
    pub enum_def: Option<EnumDef>,
    pub max_length: Option<u64>,
    pub is_nullable: bool,
    pub default_value: String,
}

impl Column {
    pub fn scalar(&self) -> &ScalarType {
        &self.mapping.scalar
    }

    pub fn is_checksum(&self) -> bool {
        self.name == CHECKSUM_COLUMN
    }

    pub fn is_json(&self) -> bool {
        self.data_type.eq_ignore_ascii_case("json")
    }

    pub fn is_geometry(&self) -> bool {
        self.mapping.scalar == ScalarType::Point
    }

    /// Field name usable as a Rust identifier
    pub fn field_name(&self) -> String {
        field_ident(&self.name)
    }

    fn from_row(row: ColumnRow) -> Result<Self, OrmgenError> {
        let enum_name = type_ident(&format!("{}_{}", row.table_name, row.column_name));
        let mapping = map_type(&row.data_type, &enum_name);

        let enum_def = match &mapping.scalar {
            ScalarType::Enum(name) => Some(
                EnumDef::from_column_type(name, &row.column_type).ok_or_else(|| {
                    OrmgenError::MalformedEnum {
                        table: row.table_name.clone(),
                        column: row.column_name.clone(),
                        spec: row.column_type.clone(),
                    }
                })?,
            ),
            _ => None,
        };

        trace!(
            table = ?row.table_name,
            column = ?row.column_name,
            data_type = ?row.data_type,
            scalar = ?mapping.scalar,
            "Mapped column"
        );

        Ok(Self {
            position: row.ordinal_position,
            primary_key: row.column_key == "PRI",
            name: row.column_name,
            data_type: row.data_type,
            column_type: row.column_type,
            mapping,
            enum_def,
            max_length: row.max_length,
            is_nullable: row.is_nullable,
            default_value: row.column_default.unwrap_or_default(),
        })
    }
}

/// Group discovery rows into tables
///
/// Rows must arrive ordered by table then position. A new table starts
/// whenever the table name changes; columns keep stream order.
pub fn build_tables(rows: Vec<ColumnRow>) -> Result<Vec<Table>, OrmgenError> {
    let mut tables: Vec<Table> = Vec::new();

    for row in rows {
        let starts_table = tables.last().map_or(true, |t| t.name != row.table_name);
        if starts_table {
            trace!(table = ?row.table_name, "Found new table");
            tables.push(Table::new(&row.table_name));
        }
        let column = Column::from_row(row)?;
        if let Some(table) = tables.last_mut() {
            table.columns.push(column);
        }
    }

    for table in &tables {
        debug!(
            table = ?table.name,
            columns = ?table.columns.len(),
            primary_key = ?table.primary_key().map(|c| &c.name),
            dependencies = ?table.dependencies(),
            "Built table"
        );
    }

    Ok(tables)
}

/// Convert snake_case to PascalCase
///
/// This is a shared utility used by code generators for all target languages.
pub fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => {
                    let first_upper = first.to_uppercase().to_string();
                    first_upper + chars.as_str()
                }
            }
        })
        .collect()
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "gen", "macro", "override",
    "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Turn a table or column name into a Rust type identifier
///
/// Any run of characters that cannot appear in an identifier separates words.
/// Names that would clash with `Self` or the imported `Record` trait get a
/// trailing underscore.
pub fn type_ident(name: &str) -> String {
    let words: Vec<&str> = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let mut ident = to_pascal_case(&words.join("_"));
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if matches!(ident.as_str(), "Self" | "Record") {
        ident.push('_');
    }
    ident
}

/// Turn a column name into a Rust field identifier
pub fn field_ident(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if matches!(ident.as_str(), "self" | "Self" | "super" | "crate") {
        ident.push('_');
    } else if RUST_KEYWORDS.contains(&ident.as_str()) {
        ident.insert_str(0, "r#");
    }
    ident
}
