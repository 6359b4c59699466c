//! SQL dialect capability table.
//!
//! Everything that differs between supported backends lives in one
//! [`DialectProfile`] value: placeholder syntax, how the generated id is
//! returned, catalog query text and native type names. Statement builders
//! read the profile and never branch on the backend themselves.

use crate::schema::FieldType;
use std::str::FromStr;

use crate::error::ConfigError;

/// Leading reserved columns of every form table (id, created_ts, updated_ts, created_user).
pub const RESERVED_COLUMN_COUNT: i64 = 4;

/// Where the backend expects the "return generated id" clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdReturn {
    /// Appended after the whole statement, e.g. `RETURNING id`.
    Trailing(&'static str),
    /// Inlined before `VALUES` / `WHERE`, e.g. `OUTPUT INSERTED.id`.
    Inline(&'static str),
}

#[derive(Debug)]
pub struct DialectProfile {
    pub name: &'static str,
    placeholder_prefix: &'static str,
    pub id_return: IdReturn,
    /// Columns of a table in ordinal order: (name, native type, not null). Params: table, skip count.
    pub catalog_columns_sql: &'static str,
    /// Read expression for Money columns, wrapped around the column name.
    money_read: (&'static str, &'static str),
    /// Read expression for columns whose native type has no table entry.
    text_read: (&'static str, &'static str),
    /// Whether text parameters need an explicit cast to an untabled column type.
    casts_text_params: bool,
    type_table: &'static [(&'static str, FieldType)],
}

pub static POSTGRES: DialectProfile = DialectProfile {
    name: "postgres",
    placeholder_prefix: "$",
    id_return: IdReturn::Trailing("RETURNING id"),
    catalog_columns_sql: "SELECT f.attname, pg_catalog.format_type(f.atttypid, f.atttypmod), f.attnotnull \
        FROM pg_attribute f \
        JOIN pg_class c ON c.oid = f.attrelid \
        LEFT JOIN pg_namespace n ON n.oid = c.relnamespace \
        WHERE c.relkind = 'r'::char AND n.nspname = 'public' AND c.relname = $1 AND f.attnum > $2 \
        AND NOT f.attisdropped \
        ORDER BY f.attnum",
    money_read: ("", "::numeric"),
    text_read: ("", "::text"),
    casts_text_params: true,
    type_table: &[
        ("character varying", FieldType::VarChar),
        ("text", FieldType::Text),
        ("integer", FieldType::Integer),
        ("numeric", FieldType::Decimal),
        ("money", FieldType::Money),
        ("double precision", FieldType::Float),
        ("boolean", FieldType::Boolean),
        ("timestamp with time zone", FieldType::Timestamp),
        ("date", FieldType::Date),
    ],
};

pub static SQL_SERVER: DialectProfile = DialectProfile {
    name: "sqlserver",
    placeholder_prefix: "@p",
    id_return: IdReturn::Inline("OUTPUT INSERTED.id"),
    catalog_columns_sql: "SELECT COLUMN_NAME, DATA_TYPE, CAST(IIF(IS_NULLABLE = 'NO', 1, 0) AS bit) \
        FROM information_schema.columns \
        WHERE table_name = @p1 AND ORDINAL_POSITION > @p2 \
        ORDER BY ORDINAL_POSITION",
    money_read: ("CAST(", " AS decimal(19,4))"),
    text_read: ("CAST(", " AS nvarchar(max))"),
    casts_text_params: false,
    type_table: &[
        ("varchar", FieldType::VarChar),
        ("text", FieldType::Text),
        ("int", FieldType::Integer),
        ("decimal", FieldType::Decimal),
        ("money", FieldType::Money),
        ("float", FieldType::Float),
        ("bit", FieldType::Boolean),
        ("datetimeoffset", FieldType::Timestamp),
        ("date", FieldType::Date),
    ],
};

impl DialectProfile {
    /// Placeholder for parameter at given index (1-based).
    pub fn placeholder(&self, index: usize) -> String {
        format!("{}{}", self.placeholder_prefix, index)
    }

    /// Clause placed before `VALUES` / `WHERE`, if the backend inlines it.
    pub fn inline_id_return(&self) -> Option<&'static str> {
        match self.id_return {
            IdReturn::Inline(clause) => Some(clause),
            IdReturn::Trailing(_) => None,
        }
    }

    /// Clause appended after the statement, if the backend trails it.
    pub fn trailing_id_return(&self) -> Option<&'static str> {
        match self.id_return {
            IdReturn::Trailing(clause) => Some(clause),
            IdReturn::Inline(_) => None,
        }
    }

    /// Select expression that reads a Money column as a decimal.
    pub fn money_column(&self, column: &str) -> String {
        format!("{}{}{}", self.money_read.0, column, self.money_read.1)
    }

    /// Select expression that reads an untabled column as text.
    pub fn text_column(&self, column: &str) -> String {
        format!("{}{}{}", self.text_read.0, column, self.text_read.1)
    }

    /// Value expression for a text parameter written to a column of `native` type.
    /// SQL Server converts nvarchar implicitly; Postgres has no assignment cast from text.
    pub fn text_param(&self, placeholder: String, native: &str) -> String {
        if self.casts_text_params {
            format!("CAST({} AS {})", placeholder, native)
        } else {
            placeholder
        }
    }

    /// Exact lookup in the native type table. Callers normalise first.
    pub fn lookup_type(&self, native: &str) -> Option<FieldType> {
        self.type_table
            .iter()
            .find(|(name, _)| *name == native)
            .map(|(_, ft)| *ft)
    }

    pub fn native_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.type_table.iter().map(|(name, _)| *name)
    }
}

/// Backend selected once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    SqlServer,
}

impl Dialect {
    pub fn profile(self) -> &'static DialectProfile {
        match self {
            Dialect::Postgres => &POSTGRES,
            Dialect::SqlServer => &SQL_SERVER,
        }
    }
}

impl FromStr for Dialect {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            other => Err(ConfigError::UnknownDialect(other.to_string())),
        }
    }
}
