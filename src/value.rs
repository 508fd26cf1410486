use chrono::NaiveDateTime;

/// Native kind of a result column, decided once when the result is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    NullableInteger,
    Double,
    NullableDouble,
    Decimal,
    NullableDecimal,
    Text,
    NullableText,
    NullableTimestamp,
    Opaque,
}

/// Metadata for a single result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ordinal: usize,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, ordinal: usize, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            ordinal,
            kind,
        }
    }
}

/// A single cell, tagged with the kind of the column it was fetched from.
///
/// Nullable kinds carry `None` for SQL NULL. `Decimal` holds the driver's
/// textual form so no precision is lost to a float conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    NullableInteger(Option<i64>),
    Double(f64),
    NullableDouble(Option<f64>),
    Decimal(String),
    NullableDecimal(Option<String>),
    Text(String),
    NullableText(Option<String>),
    NullableTimestamp(Option<NaiveDateTime>),
    Opaque(Option<Vec<u8>>),
}

/// One fetched row; same length and order as the result's columns.
pub type Row = Vec<Value>;
