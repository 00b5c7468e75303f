//! Code generation
//!
//! This module provides functionality for generating typed data access code
//! from the introspected database schema.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::prelude::{OrmgenError, Schema};

pub mod fixtures;
pub mod kinds;
pub mod protobuf;
pub mod rust;
pub mod statements;

pub use protobuf::ProtobufGenerator;
pub use rust::RustGenerator;
pub use statements::{synthesize, Binding, BindingSource, Statement, StatementBundle};

/// Output mode for generated code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// One file per table, organized as a library/package
    #[default]
    Library,
    /// Single file with all tables
    Flat,
}

/// Configuration for code generation
#[derive(Debug, Clone)]
pub struct CodeGenConfig {
    /// Output directory
    pub output_path: PathBuf,
    /// Output mode
    pub output_mode: OutputMode,
    /// Protobuf package name
    pub package: String,
    /// Path generated Rust code imports the runtime from
    pub runtime_path: String,
}

impl CodeGenConfig {
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            output_path,
            output_mode: OutputMode::default(),
            package: "schema".to_string(),
            runtime_path: "ormgen::orm".to_string(),
        }
    }

    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    pub fn with_runtime_path(mut self, runtime_path: impl Into<String>) -> Self {
        self.runtime_path = runtime_path.into();
        self
    }
}

/// A rendered file, with its path relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }
}

/// Trait for language-specific code generators
pub trait CodeGenerator {
    /// Render every file for the given schema without touching the filesystem
    fn render(&self, schema: &Schema, config: &CodeGenConfig)
        -> Result<Vec<GeneratedFile>, OrmgenError>;

    /// Render and write files under the configured output directory
    fn generate(&self, schema: &Schema, config: &CodeGenConfig) -> Result<Vec<PathBuf>, OrmgenError> {
        let files = self.render(schema, config)?;
        write_files(&config.output_path, &files)
    }
}

/// Write files, creating the output directory if needed
pub fn write_files(output_dir: &Path, files: &[GeneratedFile]) -> Result<Vec<PathBuf>, OrmgenError> {
    fs::create_dir_all(output_dir)?;
    debug!(path = ?output_dir, "Created output directory");

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = output_dir.join(&file.path);
        fs::write(&path, &file.contents)?;
        debug!(path = ?path, bytes = file.contents.len(), "Wrote file");
        written.push(path);
    }

    info!(files = written.len(), output = ?output_dir, "Wrote generated files");
    Ok(written)
}

/// Map a minijinja error to a code generation error for `table`
pub(crate) fn template_error(table: &str, stage: &str, err: minijinja::Error) -> OrmgenError {
    OrmgenError::CodeGen {
        table: table.to_string(),
        message: format!("{} error: {}", stage, err),
    }
}
