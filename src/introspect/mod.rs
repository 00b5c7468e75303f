//! Database introspection
//!
//! This module provides functionality for extracting schema information
//! from databases. Each supported database has its own feature-gated submodule.

use crate::prelude::{OrmgenError, Schema};

/// Column metadata query, one row per column ordered by table then position
pub const DISCOVERY_SQL: &str = "SELECT \
    TABLE_NAME, \
    COLUMN_NAME, \
    COLUMN_KEY, \
    IS_NULLABLE, \
    DATA_TYPE, \
    COLUMN_DEFAULT, \
    CHARACTER_MAXIMUM_LENGTH, \
    NUMERIC_PRECISION, \
    NUMERIC_SCALE, \
    COLUMN_TYPE, \
    ORDINAL_POSITION \
    FROM INFORMATION_SCHEMA.COLUMNS \
    WHERE TABLE_SCHEMA = ? \
    ORDER BY TABLE_NAME, ORDINAL_POSITION";

/// Filters to apply during introspection
#[derive(Debug, Default, Clone)]
pub struct TableFilter {
    /// Only include these tables (if Some)
    pub include: Option<Vec<String>>,
    /// Exclude these tables
    pub exclude: Option<Vec<String>>,
}

impl TableFilter {
    /// Check if a table should be included
    pub fn should_include(&self, table_name: &str) -> bool {
        let included = self
            .include
            .as_ref()
            .map_or(true, |include| include.iter().any(|t| t == table_name));
        let excluded = self
            .exclude
            .as_ref()
            .is_some_and(|exclude| exclude.iter().any(|t| t == table_name));
        included && !excluded
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }
}

/// Trait for database introspection implementations
pub trait Introspector {
    /// Introspect a database schema and return structured schema information
    fn introspect(&mut self, schema_name: &str, filter: &TableFilter)
        -> Result<Schema, OrmgenError>;
}

// Feature-gated database implementations
#[cfg(feature = "mysql")]
mod mysql;

#[cfg(feature = "mysql")]
pub use self::mysql::{connect, MysqlIntrospector};
