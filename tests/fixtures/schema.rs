// Code generated by ormgen. DO NOT EDIT.

use ormgen::orm::{self as orm, Record};

/// Values of `places.kind`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PlacesKind {
    #[default]
    Cafe = 0,
    Plus1 = 1,
}

impl PlacesKind {
    pub const ALL: [Self; 2] = [Self::Cafe, Self::Plus1];

    /// Stored values, indexed by code
    pub const VALUES: [&'static str; 2] = ["cafe", "+1"];

    pub fn sql_value(&self) -> &'static str {
        Self::VALUES[*self as usize]
    }

    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Cafe => "CAFE",
            Self::Plus1 => "PLUS_1",
        }
    }

    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Parse a stored value, unknown values map to the default
    pub fn from_sql_value(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|v| v.sql_value().eq_ignore_ascii_case(value))
            .unwrap_or_default()
    }
}

impl orm::HashInput for PlacesKind {
    fn hash_input(&self) -> String {
        self.sql_value().to_string()
    }
}

/// Row of the `places` table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Places {
    pub id: String,
    pub kind: PlacesKind,
    pub visits: i32,
    pub location: orm::Geometry,
    pub opened_at: Option<orm::Timestamp>,
    pub checksum: String,
}

static PLACES_COLUMNS: [orm::ColumnSql; 6] = [
    orm::ColumnSql {
        name: "id",
        primary_key: true,
        checksum: false,
        geometry: false,
    },
    orm::ColumnSql {
        name: "kind",
        primary_key: false,
        checksum: false,
        geometry: false,
    },
    orm::ColumnSql {
        name: "visits",
        primary_key: false,
        checksum: false,
        geometry: false,
    },
    orm::ColumnSql {
        name: "location",
        primary_key: false,
        checksum: false,
        geometry: true,
    },
    orm::ColumnSql {
        name: "opened_at",
        primary_key: false,
        checksum: false,
        geometry: false,
    },
    orm::ColumnSql {
        name: "checksum",
        primary_key: false,
        checksum: true,
        geometry: false,
    },
];

pub static PLACES_SQL: orm::TableSql = orm::TableSql {
    table: "places",
    columns: &PLACES_COLUMNS,
    projection: &["`id`", "`kind`", "`visits`", "ST_AsText(`location`)", "`opened_at`", "`checksum`"],
    insert: orm::StatementSql { sql: "INSERT INTO `places` (`id`, `kind`, `visits`, `location`, `opened_at`, `checksum`) VALUES (?, ?, ?, POINT(?,?), ?, ?)", columns: &[0, 1, 2, 3, 4, 5] },
    insert_ignore_duplicate: Some(orm::StatementSql { sql: "INSERT INTO `places` (`id`, `kind`, `visits`, `location`, `opened_at`, `checksum`) VALUES (?, ?, ?, POINT(?,?), ?, ?) ON DUPLICATE KEY UPDATE `id` = `id`", columns: &[0, 1, 2, 3, 4, 5] }),
    update: Some(orm::StatementSql { sql: "UPDATE `places` SET `kind` = ?, `visits` = ?, `location` = POINT(?,?), `opened_at` = ?, `checksum` = ? WHERE `id` = ?", columns: &[1, 2, 3, 4, 5, 0] }),
    delete: Some(orm::StatementSql { sql: "DELETE FROM `places` WHERE `id` = ?", columns: &[0] }),
    find_one: Some(orm::StatementSql { sql: "SELECT `id`, `kind`, `visits`, ST_AsText(`location`), `opened_at`, `checksum` FROM `places` WHERE `id` = ? LIMIT 1", columns: &[0] }),
    exists: Some(orm::StatementSql { sql: "SELECT `id` FROM `places` WHERE `id` = ?", columns: &[0] }),
    upsert: Some(orm::StatementSql { sql: "INSERT INTO `places` (`id`, `kind`, `visits`, `location`, `opened_at`, `checksum`) VALUES (?, ?, ?, POINT(?,?), ?, ?) ON DUPLICATE KEY UPDATE `kind` = VALUES(`kind`), `visits` = VALUES(`visits`), `location` = VALUES(`location`), `opened_at` = VALUES(`opened_at`), `checksum` = VALUES(`checksum`)", columns: &[0, 1, 2, 3, 4, 5] }),
};

/// Recreates `places` in a scratch database
pub const PLACES_CREATE_TABLE_SQL: &str = "CREATE TABLE `places` (`id` varchar(36) NOT NULL PRIMARY KEY, `kind` enum('cafe','+1') NOT NULL, `visits` int(11) NOT NULL, `location` point NOT NULL, `opened_at` timestamp, `checksum` varchar(64) NOT NULL) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci";

impl Record for Places {
    fn table() -> &'static orm::TableSql {
        &PLACES_SQL
    }

    fn to_values(&self) -> Vec<orm::Value> {
        vec![
            orm::to_sql_string(&self.id),
            orm::to_sql_string(self.kind.sql_value()),
            orm::to_sql_int64(self.visits),
            orm::Value::from(self.location.longitude),
            orm::Value::from(self.location.latitude),
            orm::to_sql_date(self.opened_at.as_ref()),
            orm::to_sql_string(&self.checksum),
        ]
    }

    fn from_row(row: &orm::Row) -> Self {
        Self {
            id: row.string(0),
            kind: PlacesKind::from_sql_value(&row.string(1)),
            visits: row.int64(2) as i32,
            location: orm::Geometry::from_wkt(&row.string(3)),
            opened_at: row.timestamp(4),
            checksum: row.string(5),
        }
    }

    fn checksum_inputs(&self) -> Vec<String> {
        vec![
            orm::HashInput::hash_input(&self.kind),
            orm::HashInput::hash_input(&self.visits),
            orm::HashInput::hash_input(&self.location),
            orm::HashInput::hash_input(&self.opened_at),
        ]
    }

    fn stored_checksum(&self) -> Option<&str> {
        Some(self.checksum.as_str())
    }

    fn set_checksum(&mut self, checksum: String) {
        self.checksum = checksum;
    }

    fn clear_primary_key(&mut self) {
        self.id = String::new();
    }
}

impl Places {
    /// Record filled with sample values
    pub fn sample() -> Self {
        Self {
            id: { let mut id = orm::unique_id(); id.truncate(36); id },
            kind: PlacesKind::Cafe,
            visits: orm::rand_uid(),
            location: orm::Geometry::new(-122.389_09, 37.614_54),
            opened_at: Some(orm::now()),
            checksum: "checksum".to_string(),
        }
    }
}
/// Row of the `notes` table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notes {
    pub body: String,
}

static NOTES_COLUMNS: [orm::ColumnSql; 1] = [
    orm::ColumnSql {
        name: "body",
        primary_key: false,
        checksum: false,
        geometry: false,
    },
];

pub static NOTES_SQL: orm::TableSql = orm::TableSql {
    table: "notes",
    columns: &NOTES_COLUMNS,
    projection: &["`body`"],
    insert: orm::StatementSql { sql: "INSERT INTO `notes` (`body`) VALUES (?)", columns: &[0] },
    insert_ignore_duplicate: None,
    update: None,
    delete: None,
    find_one: None,
    exists: None,
    upsert: None,
};

/// Recreates `notes` in a scratch database
pub const NOTES_CREATE_TABLE_SQL: &str = "CREATE TABLE `notes` (`body` text NOT NULL) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci";

impl Record for Notes {
    fn table() -> &'static orm::TableSql {
        &NOTES_SQL
    }

    fn to_values(&self) -> Vec<orm::Value> {
        vec![
            orm::to_sql_string(&self.body),
        ]
    }

    fn from_row(row: &orm::Row) -> Self {
        Self {
            body: row.string(0),
        }
    }
}

impl Notes {
    /// Record filled with sample values
    pub fn sample() -> Self {
        Self {
            body: "body".to_string(),
        }
    }
}
