//! Protobuf schema generator
//!
//! Emits one message per table with fields numbered by ordinal position and
//! a nested enum for every enum or set column.

use std::collections::BTreeSet;

use minijinja::Environment;
use serde::Serialize;
use tracing::{debug, info};

use crate::codegen::kinds::kind_for;
use crate::codegen::{template_error, CodeGenConfig, CodeGenerator, GeneratedFile, OutputMode};
use crate::error::OrmgenError;
use crate::schema::{Dependency, EnumDef, Schema, Table};

#[derive(Debug, Serialize)]
struct FieldContext {
    wire: String,
    name: String,
    number: u32,
}

#[derive(Debug, Serialize)]
struct EnumContext {
    name: String,
    /// Value names prefixed with the enum name, in code order
    values: Vec<String>,
}

impl EnumContext {
    /// Values of sibling enums share the message scope, so each carries its
    /// enum's name as a prefix
    fn new(def: &EnumDef) -> Self {
        let prefix = screaming_snake(&def.name);
        Self {
            values: def
                .fields
                .iter()
                .map(|field| format!("{}_{}", prefix, field.identifier))
                .collect(),
            name: def.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MessageContext {
    name: String,
    enums: Vec<EnumContext>,
    fields: Vec<FieldContext>,
}

/// `OrdersState` -> `ORDERS_STATE`
fn screaming_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_ascii_uppercase()
            && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
        {
            out.push('_');
        }
        out.push(c.to_ascii_uppercase());
        prev = Some(c);
    }
    out
}

/// Protobuf code generator
pub struct ProtobufGenerator {
    env: Environment<'static>,
}

impl ProtobufGenerator {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        // Register templates
        env.add_template("messages", include_str!("templates/messages.proto.jinja"))
            .expect("Failed to load protobuf messages template");
        env.add_template("geometry", include_str!("templates/geometry.proto.jinja"))
            .expect("Failed to load protobuf geometry template");

        Self { env }
    }
}

impl Default for ProtobufGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator for ProtobufGenerator {
    fn render(
        &self,
        schema: &Schema,
        config: &CodeGenConfig,
    ) -> Result<Vec<GeneratedFile>, OrmgenError> {
        info!(mode = ?config.output_mode, package = ?config.package, "Generating protobuf schema");

        let mut files = match config.output_mode {
            OutputMode::Library => schema
                .tables
                .iter()
                .map(|table| {
                    let contents = self.render_messages(
                        std::slice::from_ref(table),
                        &table.name,
                        config,
                    )?;
                    debug!(table = ?table.name, "Rendered message");
                    Ok(GeneratedFile::new(format!("{}.proto", table.name), contents))
                })
                .collect::<Result<Vec<_>, OrmgenError>>()?,
            OutputMode::Flat => vec![GeneratedFile::new(
                "schema.proto",
                self.render_messages(&schema.tables, "schema", config)?,
            )],
        };

        if schema.dependencies().contains(&Dependency::Geometry) {
            files.push(GeneratedFile::new(
                Dependency::Geometry.proto_import(),
                self.render_geometry()?,
            ));
        }

        info!(files = files.len(), "Protobuf generation complete");
        Ok(files)
    }
}

impl ProtobufGenerator {
    /// Render a file holding one message per table
    fn render_messages(
        &self,
        tables: &[Table],
        label: &str,
        config: &CodeGenConfig,
    ) -> Result<String, OrmgenError> {
        let template = self
            .env
            .get_template("messages")
            .map_err(|e| template_error(label, "Template", e))?;

        let messages = tables
            .iter()
            .map(build_message_context)
            .collect::<Result<Vec<_>, _>>()?;

        let imports: BTreeSet<Dependency> = tables.iter().flat_map(Table::dependencies).collect();
        let imports: Vec<&str> = imports.iter().map(Dependency::proto_import).collect();

        let ctx = minijinja::context! {
            package => &config.package,
            imports => imports,
            messages => messages,
        };

        template
            .render(ctx)
            .map_err(|e| template_error(label, "Render", e))
    }

    fn render_geometry(&self) -> Result<String, OrmgenError> {
        let template = self
            .env
            .get_template("geometry")
            .map_err(|e| template_error("geometry", "Template", e))?;
        template
            .render(minijinja::context! {})
            .map_err(|e| template_error("geometry", "Render", e))
    }
}

fn build_message_context(table: &Table) -> Result<MessageContext, OrmgenError> {
    let fields = table
        .columns
        .iter()
        .map(|column| {
            // unsupported types never reach the output
            kind_for(&table.name, column)?;
            Ok(FieldContext {
                wire: column.mapping.wire.proto_name(),
                name: column.name.clone(),
                number: column.position,
            })
        })
        .collect::<Result<Vec<_>, OrmgenError>>()?;

    Ok(MessageContext {
        name: table.struct_name(),
        enums: table.enums().into_iter().map(EnumContext::new).collect(),
        fields,
    })
}
