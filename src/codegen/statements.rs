//! Statement synthesis
//!
//! Builds the parameterized statement set for one table together with the
//! order in which values are bound to its placeholders.

use serde::Serialize;
use tracing::debug;

use super::kinds::{kind_for, ColumnKind};
use crate::error::OrmgenError;
use crate::schema::{Column, ScalarType, Table};

/// Where a bound value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BindingSource {
    /// The record field
    Field,
    /// A checksum computed at call time
    Checksum,
    Longitude,
    Latitude,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    /// Position of the column in the table
    pub index: usize,
    pub column: String,
    pub source: BindingSource,
}

/// SQL text with its bindings in placeholder order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub sql: String,
    pub bindings: Vec<Binding>,
}

impl Statement {
    /// Columns bound by the statement in placeholder order, one entry per column
    pub fn columns(&self) -> Vec<usize> {
        let mut columns: Vec<usize> = self.bindings.iter().map(|b| b.index).collect();
        columns.dedup();
        columns
    }
}

/// Every statement synthesized for one table
///
/// Statements that address a row by key are `None` without a primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementBundle {
    pub table: String,
    /// Projection expressions in declared column order
    pub projection: Vec<String>,
    pub insert: Statement,
    pub insert_ignore_duplicate: Option<Statement>,
    pub update: Option<Statement>,
    pub delete: Option<Statement>,
    pub find_one: Option<Statement>,
    pub exists: Option<Statement>,
    pub upsert: Option<Statement>,
}

fn quote(name: &str) -> String {
    format!("`{}`", name)
}

struct Planned<'a> {
    index: usize,
    column: &'a Column,
    kind: Box<dyn ColumnKind>,
}

impl Planned<'_> {
    fn bindings(&self) -> Vec<Binding> {
        let sources: &[BindingSource] = if self.column.is_checksum() {
            &[BindingSource::Checksum]
        } else if self.column.is_geometry() {
            &[BindingSource::Longitude, BindingSource::Latitude]
        } else {
            &[BindingSource::Field]
        };
        sources
            .iter()
            .map(|source| Binding {
                index: self.index,
                column: self.column.name.clone(),
                source: *source,
            })
            .collect()
    }

    fn assignment(&self) -> String {
        format!("{} = {}", quote(&self.column.name), self.kind.placeholder())
    }
}

/// Resolve the rendering of every column, failing on the first unusable one
fn plan(table: &Table) -> Result<Vec<Planned<'_>>, OrmgenError> {
    table
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let kind = kind_for(&table.name, column)?;
            if column.is_checksum() && *column.scalar() != ScalarType::String {
                return Err(OrmgenError::CodeGen {
                    table: table.name.clone(),
                    message: format!(
                        "checksum column must be a string type, found '{}'",
                        column.data_type
                    ),
                });
            }
            Ok(Planned {
                index,
                column,
                kind,
            })
        })
        .collect()
}

/// Synthesize the statement bundle for a table
pub fn synthesize(table: &Table) -> Result<StatementBundle, OrmgenError> {
    let planned = plan(table)?;
    let name = quote(&table.name);

    let projection: Vec<String> = planned
        .iter()
        .map(|p| p.kind.projection(&p.column.name))
        .collect();

    let column_list = planned
        .iter()
        .map(|p| quote(&p.column.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = planned
        .iter()
        .map(|p| p.kind.placeholder())
        .collect::<Vec<_>>()
        .join(", ");
    let all_bindings: Vec<Binding> = planned.iter().flat_map(Planned::bindings).collect();

    let insert = Statement {
        sql: format!("INSERT INTO {} ({}) VALUES ({})", name, column_list, placeholders),
        bindings: all_bindings.clone(),
    };

    let pk_position = planned.iter().position(|p| p.column.primary_key);
    let Some(pk_position) = pk_position else {
        debug!(table = ?table.name, "No primary key, emitting insert only");
        return Ok(StatementBundle {
            table: table.name.clone(),
            projection,
            insert,
            insert_ignore_duplicate: None,
            update: None,
            delete: None,
            find_one: None,
            exists: None,
            upsert: None,
        });
    };

    let pk = &planned[pk_position];
    let pk_name = quote(&pk.column.name);
    let pk_where = format!("WHERE {}", pk.assignment());
    let pk_bindings = pk.bindings();
    let noop = format!("ON DUPLICATE KEY UPDATE {} = {}", pk_name, pk_name);

    let non_key: Vec<&Planned> = planned
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != pk_position)
        .map(|(_, p)| p)
        .collect();

    let update = (!non_key.is_empty()).then(|| {
        let assignments = non_key
            .iter()
            .map(|p| p.assignment())
            .collect::<Vec<_>>()
            .join(", ");
        let mut bindings: Vec<Binding> = non_key.iter().flat_map(|p| p.bindings()).collect();
        bindings.extend(pk_bindings.clone());
        Statement {
            sql: format!("UPDATE {} SET {} {}", name, assignments, pk_where),
            bindings,
        }
    });

    let upsert_clause = if non_key.is_empty() {
        noop.clone()
    } else {
        let values = non_key
            .iter()
            .map(|p| {
                let column = quote(&p.column.name);
                format!("{} = VALUES({})", column, column)
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("ON DUPLICATE KEY UPDATE {}", values)
    };

    let bundle = StatementBundle {
        table: table.name.clone(),
        insert_ignore_duplicate: Some(Statement {
            sql: format!("{} {}", insert.sql, noop),
            bindings: all_bindings.clone(),
        }),
        update,
        delete: Some(Statement {
            sql: format!("DELETE FROM {} {}", name, pk_where),
            bindings: pk_bindings.clone(),
        }),
        find_one: Some(Statement {
            sql: format!(
                "SELECT {} FROM {} {} LIMIT 1",
                projection.join(", "),
                name,
                pk_where
            ),
            bindings: pk_bindings.clone(),
        }),
        exists: Some(Statement {
            sql: format!("SELECT {} FROM {} {}", pk_name, name, pk_where),
            bindings: pk_bindings,
        }),
        upsert: Some(Statement {
            sql: format!("{} {}", insert.sql, upsert_clause),
            bindings: all_bindings,
        }),
        projection,
        insert,
    };

    debug!(table = ?table.name, "Synthesized statements");
    Ok(bundle)
}
