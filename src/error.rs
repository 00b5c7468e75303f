use thiserror::Error;

/// ormgen errors
#[derive(Error, Debug)]
pub enum OrmgenError {
    #[error("Failed to connect to database: {0}")]
    Connection(String),

    #[error("Failed to introspect schema '{schema}': {message}")]
    Introspection { schema: String, message: String },

    #[error("Malformed enumeration for column '{table}.{column}': {spec}")]
    MalformedEnum {
        table: String,
        column: String,
        spec: String,
    },

    #[error("Unsupported type '{native_type}' for column '{table}.{column}'")]
    UnsupportedType {
        table: String,
        column: String,
        native_type: String,
    },

    #[error("Code generation failed for table '{table}': {message}")]
    CodeGen { table: String, message: String },

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised by generated data access operations
#[derive(Error, Debug)]
pub enum OrmError {
    #[error("Table '{table}' has no primary key, {operation} is not available")]
    NoPrimaryKey {
        table: &'static str,
        operation: &'static str,
    },

    #[error("Database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl OrmError {
    /// Wrap a driver error without altering it
    pub fn database<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        OrmError::Database(Box::new(err))
    }
}
