//! # ormgen
//!
//! Generate typed data access code from MySQL schemas
//!
//! This crate provides a CLI tool and library for introspecting database
//! schemas and generating Rust data access modules and protobuf messages,
//! plus the small [`orm`] runtime the generated code depends on.

pub mod codegen;
pub mod config;
pub mod error;
pub mod introspect;
pub mod orm;
pub mod schema;

pub mod prelude {
    pub use crate::codegen::{
        CodeGenConfig, CodeGenerator, OutputMode, ProtobufGenerator, RustGenerator,
    };
    pub use crate::config::DbConfig;
    pub use crate::error::{OrmError, OrmgenError};
    pub use crate::introspect::{Introspector, TableFilter};
    pub use crate::orm::{Executor, Record};
    pub use crate::schema::{Column, ColumnRow, Schema, Table};
}

#[cfg(feature = "mysql")]
pub use introspect::MysqlIntrospector;
