//! Scratch table DDL and sample records for generated tests

use crate::error::OrmgenError;
use crate::schema::Table;

use super::kinds::kind_for;

const TABLE_OPTIONS: &str = "ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci";

fn default_literal(value: &str) -> String {
    let upper = value.to_uppercase();
    let keyword = upper.starts_with("CURRENT_TIMESTAMP") || upper == "NULL";
    if keyword || value.parse::<f64>().is_ok() {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "''"))
    }
}

/// `CREATE TABLE` statement recreating the table from its discovered columns
pub fn create_table_sql(table: &Table) -> String {
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|column| {
            let mut definition = format!("`{}` {}", column.name, column.column_type);
            if !column.default_value.is_empty() {
                definition.push_str(" DEFAULT ");
                definition.push_str(&default_literal(&column.default_value));
            }
            if !column.is_nullable {
                definition.push_str(" NOT NULL");
            }
            if column.primary_key {
                definition.push_str(" PRIMARY KEY");
            }
            definition
        })
        .collect();

    format!(
        "CREATE TABLE `{}` ({}) {}",
        table.name,
        columns.join(", "),
        TABLE_OPTIONS
    )
}

/// Sample value expression for every column, as `(field, expression)`
pub fn sample_values(table: &Table) -> Result<Vec<(String, String)>, OrmgenError> {
    table
        .columns
        .iter()
        .map(|column| {
            let kind = kind_for(&table.name, column)?;
            Ok((column.field_name(), kind.sample_value(column)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{build_tables, ColumnRow};

    fn users() -> Table {
        let rows = vec![
            ColumnRow {
                table_name: "users".to_string(),
                column_name: "id".to_string(),
                column_key: "PRI".to_string(),
                data_type: "varchar".to_string(),
                column_type: "varchar(64)".to_string(),
                max_length: Some(64),
                ordinal_position: 1,
                ..Default::default()
            },
            ColumnRow {
                table_name: "users".to_string(),
                column_name: "status".to_string(),
                data_type: "enum".to_string(),
                column_type: "enum('new','old')".to_string(),
                column_default: Some("new".to_string()),
                is_nullable: true,
                ordinal_position: 2,
                ..Default::default()
            },
            ColumnRow {
                table_name: "users".to_string(),
                column_name: "visits".to_string(),
                data_type: "int".to_string(),
                column_type: "int(11)".to_string(),
                column_default: Some("0".to_string()),
                ordinal_position: 3,
                ..Default::default()
            },
        ];
        build_tables(rows).unwrap().remove(0)
    }

    #[test]
    fn test_create_table_sql() {
        assert_eq!(
            create_table_sql(&users()),
            "CREATE TABLE `users` (`id` varchar(64) NOT NULL PRIMARY KEY, \
             `status` enum('new','old') DEFAULT 'new', \
             `visits` int(11) DEFAULT 0 NOT NULL) \
             ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci"
        );
    }

    #[test]
    fn test_default_literal() {
        assert_eq!(default_literal("CURRENT_TIMESTAMP"), "CURRENT_TIMESTAMP");
        assert_eq!(default_literal("1.5"), "1.5");
        assert_eq!(default_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_sample_values() {
        let samples = sample_values(&users()).unwrap();
        assert_eq!(samples[0], ("id".to_string(), "orm::unique_id()".to_string()));
        assert_eq!(samples[1].1, "UsersStatus::New");
        assert_eq!(samples[2].1, "orm::rand_uid()");
    }
}
