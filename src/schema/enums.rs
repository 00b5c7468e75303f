//! Enum and set value extraction

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::to_pascal_case;

static VALUE_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*(?:enum|set)\s*\((.*)\)\s*$").expect("Invalid enum list regex")
});

static QUOTED_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'((?:[^']|'')*)'").expect("Invalid enum value regex"));

/// Parse the raw values of an `enum('a','b')` or `set(...)` type, in order
///
/// Returns `None` when no value list can be parsed.
pub fn extract_values(column_type: &str) -> Option<Vec<String>> {
    let captures = VALUE_LIST.captures(column_type)?;
    let values: Vec<String> = QUOTED_VALUE
        .captures_iter(&captures[1])
        .map(|c| c[1].replace("''", "'"))
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Alias of a raw value, with leading `+`/`-` spelled out
pub fn alias_for(value: &str) -> String {
    if let Some(rest) = value.strip_prefix('+') {
        format!("Plus_{}", rest)
    } else if let Some(rest) = value.strip_prefix('-') {
        format!("Minus_{}", rest)
    } else {
        value.to_string()
    }
}

fn identifier_for(alias: &str) -> String {
    let mut ident: String = alias
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() {
        ident = "EMPTY".to_string();
    } else if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

/// First of `base`, `base{sep}{n}`, `base{sep}{n+1}`, ... not yet in `seen`
fn unique(base: String, sep: &str, start: usize, seen: &mut HashSet<String>) -> String {
    let mut candidate = base.clone();
    let mut n = start;
    while seen.contains(&candidate) {
        candidate = format!("{}{}{}", base, sep, n);
        n += 1;
    }
    seen.insert(candidate.clone());
    candidate
}

fn variant_for(identifier: &str) -> String {
    let variant = to_pascal_case(&identifier.to_lowercase());
    if variant.is_empty() || variant.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Value{}", variant)
    } else {
        variant
    }
}

/// One enum value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumField {
    /// Value as stored in the database
    pub value: String,
    pub alias: String,
    /// Upper case identifier used in generated code
    pub identifier: String,
    /// PascalCase Rust variant name
    pub variant: String,
}

impl EnumField {
    pub fn new(value: &str) -> Self {
        let alias = alias_for(value);
        let identifier = identifier_for(&alias);
        let variant = variant_for(&identifier);
        Self {
            value: value.to_string(),
            alias,
            identifier,
            variant,
        }
    }
}

/// Enum type synthesized for one column
///
/// The integer code of a value is its position. Identifiers and variant
/// names are unique within the enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDef {
    pub name: String,
    pub fields: Vec<EnumField>,
}

impl EnumDef {
    /// Build from a column type, `None` if it carries no value list
    pub fn from_column_type(name: &str, column_type: &str) -> Option<Self> {
        let values = extract_values(column_type)?;
        let mut identifiers = HashSet::new();
        let mut variants = HashSet::new();
        let fields = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let mut field = EnumField::new(value);
                field.identifier = unique(field.identifier, "_", i, &mut identifiers);
                field.variant = unique(variant_for(&field.identifier), "", i, &mut variants);
                field
            })
            .collect();

        Some(Self {
            name: name.to_string(),
            fields,
        })
    }
}
