//! Rust code generator
//!
//! Generates one module per table holding the record struct, its enum
//! types, the synthesized statements and a [`Record`](crate::orm::Record)
//! implementation targeting the `orm` runtime.

use minijinja::Environment;
use serde::Serialize;
use tracing::{debug, info};

use crate::codegen::fixtures::{create_table_sql, sample_values};
use crate::codegen::kinds::kind_for;
use crate::codegen::statements::{synthesize, Statement};
use crate::codegen::{template_error, CodeGenConfig, CodeGenerator, GeneratedFile, OutputMode};
use crate::error::OrmgenError;
use crate::schema::{field_ident, Column, EnumDef, Schema, Table};

/// Rust string literal for `s`
fn literal(s: &str) -> String {
    format!("{:?}", s)
}

/// `orm::StatementSql` expression for a synthesized statement
fn statement_literal(statement: &Statement) -> String {
    let columns: Vec<String> = statement.columns().iter().map(usize::to_string).collect();
    format!(
        "orm::StatementSql {{ sql: {}, columns: &[{}] }}",
        literal(&statement.sql),
        columns.join(", ")
    )
}

fn optional_literal(statement: &Option<Statement>) -> String {
    match statement {
        Some(statement) => format!("Some({})", statement_literal(statement)),
        None => "None".to_string(),
    }
}

#[derive(Debug, Serialize)]
struct VariantContext {
    name: String,
    code: usize,
    value: String,
    identifier: String,
}

#[derive(Debug, Serialize)]
struct EnumContext {
    name: String,
    column: String,
    variants: Vec<VariantContext>,
}

impl EnumContext {
    fn new(column: &Column, def: &EnumDef) -> Self {
        Self {
            name: def.name.clone(),
            column: column.name.clone(),
            variants: def
                .fields
                .iter()
                .enumerate()
                .map(|(code, field)| VariantContext {
                    name: field.variant.clone(),
                    code,
                    value: literal(&field.value),
                    identifier: literal(&field.identifier),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ColumnContext {
    name: String,
    field: String,
    rust_type: String,
    primary_key: bool,
    checksum: bool,
    geometry: bool,
    to_transfer: Vec<String>,
    from_transfer: String,
}

#[derive(Debug, Serialize)]
struct SqlContext {
    projection: Vec<String>,
    insert: String,
    insert_ignore_duplicate: String,
    update: String,
    delete: String,
    find_one: String,
    exists: String,
    upsert: String,
}

#[derive(Debug, Serialize)]
struct SampleContext {
    field: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct TableContext {
    name: String,
    literal: String,
    struct_name: String,
    upper: String,
    module: String,
    columns: Vec<ColumnContext>,
    enums: Vec<EnumContext>,
    sql: SqlContext,
    checksum_field: Option<String>,
    checksum_inputs: Vec<String>,
    pk_field: Option<String>,
    pk_null: String,
    create_table_sql: String,
    samples: Vec<SampleContext>,
}

/// Module name and file stem for a table
fn module_name(table: &Table) -> String {
    field_ident(&table.name.to_lowercase())
}

fn build_table_context(table: &Table) -> Result<TableContext, OrmgenError> {
    let bundle = synthesize(table)?;

    let mut columns = Vec::with_capacity(table.columns.len());
    let mut enums = Vec::new();
    let mut pk_null = String::new();
    for (index, column) in table.columns.iter().enumerate() {
        let kind = kind_for(&table.name, column)?;
        let field = column.field_name();
        if let Some(def) = &column.enum_def {
            enums.push(EnumContext::new(column, def));
        }
        if column.primary_key && pk_null.is_empty() {
            pk_null = kind.null_value();
        }
        columns.push(ColumnContext {
            name: literal(&column.name),
            rust_type: kind.rust_type(),
            primary_key: column.primary_key,
            checksum: column.is_checksum(),
            geometry: column.is_geometry(),
            to_transfer: kind.to_transfer(&format!("self.{}", field)),
            from_transfer: kind.from_transfer(index),
            field,
        });
    }

    let samples = sample_values(table)?
        .into_iter()
        .map(|(field, value)| SampleContext { field, value })
        .collect();

    Ok(TableContext {
        name: table.name.clone(),
        literal: literal(&table.name),
        struct_name: table.struct_name(),
        upper: module_name(table).trim_start_matches("r#").to_uppercase(),
        module: module_name(table),
        columns,
        enums,
        sql: SqlContext {
            projection: bundle.projection.iter().map(|p| literal(p)).collect(),
            insert: statement_literal(&bundle.insert),
            insert_ignore_duplicate: optional_literal(&bundle.insert_ignore_duplicate),
            update: optional_literal(&bundle.update),
            delete: optional_literal(&bundle.delete),
            find_one: optional_literal(&bundle.find_one),
            exists: optional_literal(&bundle.exists),
            upsert: optional_literal(&bundle.upsert),
        },
        checksum_field: table.checksum().map(Column::field_name),
        checksum_inputs: table
            .checksum_columns()
            .iter()
            .map(|c| c.field_name())
            .collect(),
        pk_field: table.primary_key().map(Column::field_name),
        pk_null,
        create_table_sql: literal(&create_table_sql(table)),
        samples,
    })
}

/// Rust code generator
pub struct RustGenerator {
    env: Environment<'static>,
}

impl RustGenerator {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        // Register templates
        env.add_template("file", include_str!("templates/file.rs.jinja"))
            .expect("Failed to load rust file template");
        env.add_template("record", include_str!("templates/record.rs.jinja"))
            .expect("Failed to load rust record template");
        env.add_template("module", include_str!("templates/module.rs.jinja"))
            .expect("Failed to load rust module template");

        Self { env }
    }
}

impl Default for RustGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator for RustGenerator {
    fn render(
        &self,
        schema: &Schema,
        config: &CodeGenConfig,
    ) -> Result<Vec<GeneratedFile>, OrmgenError> {
        info!(
            mode = ?config.output_mode,
            runtime = ?config.runtime_path,
            "Generating Rust code"
        );

        let tables = schema
            .tables
            .iter()
            .map(build_table_context)
            .collect::<Result<Vec<_>, _>>()?;

        let files = match config.output_mode {
            OutputMode::Library => {
                let mut files = Vec::with_capacity(tables.len() + 1);
                for table in &tables {
                    let contents = self.render_file(std::slice::from_ref(table), &table.name, config)?;
                    let stem = table.module.trim_start_matches("r#");
                    debug!(table = ?table.name, "Rendered table module");
                    files.push(GeneratedFile::new(format!("{}.rs", stem), contents));
                }
                files.push(GeneratedFile::new("mod.rs", self.render_module(&tables)?));
                files
            }
            OutputMode::Flat => vec![GeneratedFile::new(
                "schema.rs",
                self.render_file(&tables, "schema", config)?,
            )],
        };

        info!(tables = tables.len(), files = files.len(), "Rust generation complete");
        Ok(files)
    }
}

impl RustGenerator {
    fn render_file(
        &self,
        tables: &[TableContext],
        label: &str,
        config: &CodeGenConfig,
    ) -> Result<String, OrmgenError> {
        let template = self
            .env
            .get_template("file")
            .map_err(|e| template_error(label, "Template", e))?;

        let ctx = minijinja::context! {
            runtime => &config.runtime_path,
            tables => tables,
        };

        template
            .render(ctx)
            .map_err(|e| template_error(label, "Render", e))
    }

    /// Render mod.rs
    fn render_module(&self, tables: &[TableContext]) -> Result<String, OrmgenError> {
        let template = self
            .env
            .get_template("module")
            .map_err(|e| template_error("mod", "Template", e))?;

        template
            .render(minijinja::context! { tables => tables })
            .map_err(|e| template_error("mod", "Render", e))
    }
}
