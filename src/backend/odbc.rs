use std::collections::VecDeque;

use chrono::{NaiveDate, NaiveDateTime};
use odbc_api::buffers::{AnySlice, BufferDesc, ColumnarAnyBuffer};
use odbc_api::handles::StatementImpl;
use odbc_api::sys::Timestamp;
use odbc_api::{
    BlockCursor, ColumnDescription, Connection, ConnectionOptions, Cursor, CursorImpl, DataType,
    Environment, Error as OdbcError, Nullability, ResultSetMetadata,
};

use crate::backend::{RowSource, Session};
use crate::config::ConnectionConfig;
use crate::error::ExportError;
use crate::masking;
use crate::value::{Column, ColumnKind, Row, Value};

/// Widest NUMERIC/DECIMAL that still fits an i64 when its scale is zero.
const MAX_INTEGER_PRECISION: usize = 18;

/// Minimum text buffer width for decimals fetched in their textual form.
/// Wide enough for any Oracle NUMBER written out positionally.
const DECIMAL_TEXT_LEN: usize = 160;

pub fn open_environment() -> Result<Environment, ExportError> {
    Environment::new().map_err(|e| ExportError::Connection {
        message: format!("ODBC environment error: {}", e),
    })
}

/// Build the ODBC connection string for `config`.
///
/// `connect` is used verbatim when it already holds attributes, otherwise it
/// names a DSN.
pub fn connection_string(config: &ConnectionConfig) -> String {
    let mut parts = Vec::new();
    if config.connect.contains('=') {
        parts.push(config.connect.trim().trim_end_matches(';').to_string());
    } else {
        parts.push(format!("DSN={}", config.connect.trim()));
    }

    if let Some(ref user) = config.user {
        parts.push(format!("UID={}", user));
    }
    if let Some(ref password) = config.password {
        use secrecy::ExposeSecret;
        parts.push(format!(
            "PWD={}",
            odbc_api::escape_attribute_value(password.expose_secret())
        ));
    }

    parts.join(";") + ";"
}

/// One authenticated ODBC connection. Borrows the environment, so it is
/// always released before it.
pub struct OdbcSession<'env> {
    conn: Connection<'env>,
    batch_size: usize,
    max_text_len: usize,
}

impl<'env> OdbcSession<'env> {
    pub fn connect(
        env: &'env Environment,
        config: &ConnectionConfig,
        show_secrets: bool,
    ) -> Result<Self, ExportError> {
        let conn_str = connection_string(config);
        tracing::info!(
            "connecting: {}",
            masking::mask_connection_string(&conn_str, show_secrets)
        );

        let conn = env
            .connect_with_connection_string(
                &conn_str,
                ConnectionOptions {
                    login_timeout_sec: Some(config.login_timeout_secs),
                    ..Default::default()
                },
            )
            .map_err(|e| ExportError::Connection {
                message: format!("connection failed: {}", e),
            })?;

        Ok(Self {
            conn,
            batch_size: config.batch_size.max(1),
            max_text_len: config.max_text_len.max(1),
        })
    }
}

impl<'env> Session for OdbcSession<'env> {
    type Source<'s>
        = OdbcCursor<CursorImpl<StatementImpl<'s>>>
    where
        Self: 's;

    fn query(&self, sql: &str) -> Result<Self::Source<'_>, ExportError> {
        let cursor = self
            .conn
            .execute(sql, ())
            .map_err(|e| ExportError::Statement {
                message: format!("query execution failed: {}", e),
            })?
            .ok_or_else(|| ExportError::statement("query produced no result set"))?;
        OdbcCursor::new(cursor, self.batch_size, self.max_text_len)
    }

    fn call(&self, sql: &str) -> Result<Option<Self::Source<'_>>, ExportError> {
        let cursor = self
            .conn
            .execute(sql, ())
            .map_err(|e| ExportError::Statement {
                message: format!("cursor call failed: {}", e),
            })?;

        let Some(mut cursor) = cursor else {
            return Ok(None);
        };
        let num_cols = cursor.num_result_cols().map_err(|e| ExportError::Statement {
            message: format!("failed to get column count: {}", e),
        })?;
        if num_cols == 0 {
            return Ok(None);
        }
        OdbcCursor::new(cursor, self.batch_size, self.max_text_len).map(Some)
    }
}

/// A bound block cursor that hands out rows one at a time.
pub struct OdbcCursor<C: Cursor> {
    columns: Vec<Column>,
    block: BlockCursor<C, ColumnarAnyBuffer>,
    pending: VecDeque<Row>,
}

impl<C: Cursor> OdbcCursor<C> {
    fn new(mut cursor: C, batch_size: usize, max_text_len: usize) -> Result<Self, ExportError> {
        let num_cols = cursor.num_result_cols().map_err(|e| ExportError::Statement {
            message: format!("failed to get column count: {}", e),
        })? as usize;

        let mut columns = Vec::with_capacity(num_cols);
        let mut buffer_descs = Vec::with_capacity(num_cols);

        for i in 1..=num_cols as u16 {
            let mut col_desc = ColumnDescription::default();
            cursor
                .describe_col(i, &mut col_desc)
                .map_err(|e| ExportError::Statement {
                    message: format!("failed to describe column {}: {}", i, e),
                })?;

            let name = col_desc.name_to_string().map_err(|e| ExportError::Statement {
                message: format!("failed to decode column name {}: {}", i, e),
            })?;

            let kind = column_kind(&col_desc.data_type, col_desc.nullability);
            tracing::debug!(column = %name, ?kind, data_type = ?col_desc.data_type, "column discovered");
            buffer_descs.push(buffer_desc(kind, &col_desc.data_type, max_text_len));
            columns.push(Column::new(name, (i - 1) as usize, kind));
        }

        let buffer = ColumnarAnyBuffer::try_from_descs(batch_size, buffer_descs).map_err(|e| {
            ExportError::Statement {
                message: format!("failed to create buffer: {}", e),
            }
        })?;

        let block = cursor.bind_buffer(buffer).map_err(|e| ExportError::Statement {
            message: format!("failed to bind buffer: {}", e),
        })?;

        Ok(Self {
            columns,
            block,
            pending: VecDeque::new(),
        })
    }
}

impl<C: Cursor> RowSource for OdbcCursor<C> {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn fetch(&mut self) -> Result<Option<Row>, ExportError> {
        while self.pending.is_empty() {
            let batch = self
                .block
                .fetch_with_truncation_check(true)
                .map_err(|e| fetch_error(e, &self.columns))?;
            let Some(batch) = batch else {
                return Ok(None);
            };
            self.pending = decode_batch(batch, &self.columns)?;
        }
        Ok(self.pending.pop_front())
    }
}

/// Decide the native kind of a column from its reported SQL type.
pub fn column_kind(data_type: &DataType, nullability: Nullability) -> ColumnKind {
    let nullable = nullability != Nullability::NoNulls;
    let pick = |not_null: ColumnKind, nullable_kind: ColumnKind| {
        if nullable { nullable_kind } else { not_null }
    };

    match *data_type {
        DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt | DataType::Bit => {
            pick(ColumnKind::Integer, ColumnKind::NullableInteger)
        }
        DataType::Numeric { precision, scale } | DataType::Decimal { precision, scale }
            if scale == 0 && precision > 0 && precision <= MAX_INTEGER_PRECISION =>
        {
            pick(ColumnKind::Integer, ColumnKind::NullableInteger)
        }
        DataType::Numeric { .. } | DataType::Decimal { .. } => {
            pick(ColumnKind::Decimal, ColumnKind::NullableDecimal)
        }
        DataType::Real | DataType::Float { .. } | DataType::Double => {
            pick(ColumnKind::Double, ColumnKind::NullableDouble)
        }
        DataType::Char { .. }
        | DataType::WChar { .. }
        | DataType::Varchar { .. }
        | DataType::WVarchar { .. }
        | DataType::LongVarchar { .. } => pick(ColumnKind::Text, ColumnKind::NullableText),
        DataType::Date | DataType::Timestamp { .. } => ColumnKind::NullableTimestamp,
        _ => ColumnKind::Opaque,
    }
}

fn buffer_desc(kind: ColumnKind, data_type: &DataType, max_text_len: usize) -> BufferDesc {
    match kind {
        ColumnKind::Integer => BufferDesc::I64 { nullable: false },
        ColumnKind::NullableInteger => BufferDesc::I64 { nullable: true },
        ColumnKind::Double => BufferDesc::F64 { nullable: false },
        ColumnKind::NullableDouble => BufferDesc::F64 { nullable: true },
        ColumnKind::Decimal | ColumnKind::NullableDecimal => BufferDesc::Text {
            max_str_len: decimal_buffer_len(data_type),
        },
        ColumnKind::NullableTimestamp => BufferDesc::Timestamp { nullable: true },
        ColumnKind::Text | ColumnKind::NullableText | ColumnKind::Opaque => BufferDesc::Text {
            max_str_len: text_buffer_len(data_type, max_text_len),
        },
    }
}

/// Bytes reserved per text cell: the declared width in UTF-8, capped at
/// `max_text_len`. Columns without a declared width get the cap.
pub fn text_buffer_len(data_type: &DataType, max_text_len: usize) -> usize {
    data_type
        .utf8_len()
        .map_or(max_text_len, |len| len.get().min(max_text_len))
}

pub fn decimal_buffer_len(data_type: &DataType) -> usize {
    data_type
        .display_size()
        .map_or(DECIMAL_TEXT_LEN, |len| len.get().max(DECIMAL_TEXT_LEN))
}

/// A value wider than its bound buffer fails the fetch instead of being cut.
fn fetch_error(error: OdbcError, columns: &[Column]) -> ExportError {
    match error {
        OdbcError::TooLargeValueForBuffer {
            indicator,
            buffer_index,
        } => {
            let name = columns
                .get(buffer_index)
                .map_or("<unknown>", |c| c.name.as_str());
            let size = indicator
                .map_or_else(|| "an unreported number of".to_string(), |n| n.to_string());
            ExportError::statement(format!(
                "column {name}: value of {size} bytes does not fit the fetch buffer (raise --max-text-len)"
            ))
        }
        other => ExportError::Statement {
            message: format!("fetch error: {}", other),
        },
    }
}

fn decode_batch(batch: &ColumnarAnyBuffer, columns: &[Column]) -> Result<VecDeque<Row>, ExportError> {
    let num_rows = batch.num_rows();
    let mut rows: Vec<Row> = (0..num_rows)
        .map(|_| Vec::with_capacity(columns.len()))
        .collect();

    for (col_idx, column) in columns.iter().enumerate() {
        let values = decode_column(batch.column(col_idx), column, num_rows)?;
        for (row, value) in rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    Ok(rows.into())
}

fn decode_column(
    slice: AnySlice<'_>,
    column: &Column,
    num_rows: usize,
) -> Result<Vec<Value>, ExportError> {
    let values = match (column.kind, slice) {
        (ColumnKind::Integer, AnySlice::I64(values)) => {
            values.iter().map(|v| Value::Integer(*v)).collect()
        }
        (ColumnKind::NullableInteger, AnySlice::NullableI64(values)) => {
            values.map(|v| Value::NullableInteger(v.copied())).collect()
        }
        (ColumnKind::Double, AnySlice::F64(values)) => {
            values.iter().map(|v| Value::Double(*v)).collect()
        }
        (ColumnKind::NullableDouble, AnySlice::NullableF64(values)) => {
            values.map(|v| Value::NullableDouble(v.copied())).collect()
        }
        (ColumnKind::NullableTimestamp, AnySlice::NullableTimestamp(values)) => values
            .map(|v| v.map(to_naive).transpose().map(Value::NullableTimestamp))
            .collect::<Result<Vec<_>, _>>()?,
        (kind, AnySlice::Text(view)) => {
            // Drivers that skip the truncation diagnostic still report the full length.
            if let Some(indicator) = view.has_truncated_values() {
                return Err(ExportError::statement(format!(
                    "column {}: value truncated to {} bytes ({:?}; raise --max-text-len)",
                    column.name,
                    view.max_len(),
                    indicator
                )));
            }
            (0..num_rows)
                .map(|row_idx| text_value(kind, view.get(row_idx), column))
                .collect::<Result<Vec<_>, _>>()?
        }
        (kind, _) => {
            return Err(ExportError::statement(format!(
                "column {}: fetched buffer does not match kind {:?}",
                column.name, kind
            )));
        }
    };
    Ok(values)
}

fn text_value(kind: ColumnKind, bytes: Option<&[u8]>, column: &Column) -> Result<Value, ExportError> {
    let value = match (kind, bytes) {
        (ColumnKind::Decimal, Some(b)) => Value::Decimal(canonical_decimal(utf8(b, column)?)),
        (ColumnKind::NullableDecimal, b) => Value::NullableDecimal(
            b.map(|b| utf8(b, column).map(canonical_decimal)).transpose()?,
        ),
        (ColumnKind::Text, Some(b)) => Value::Text(utf8(b, column)?.to_string()),
        (ColumnKind::NullableText, b) => Value::NullableText(
            b.map(|b| utf8(b, column).map(str::to_string)).transpose()?,
        ),
        (ColumnKind::Opaque, b) => Value::Opaque(b.map(<[u8]>::to_vec)),
        (ColumnKind::Decimal | ColumnKind::Text, None) => {
            return Err(ExportError::statement(format!(
                "column {} is declared NOT NULL but returned NULL",
                column.name
            )));
        }
        (kind, _) => {
            return Err(ExportError::statement(format!(
                "column {}: text buffer does not match kind {:?}",
                column.name, kind
            )));
        }
    };
    Ok(value)
}

fn utf8<'a>(bytes: &'a [u8], column: &Column) -> Result<&'a str, ExportError> {
    std::str::from_utf8(bytes).map_err(|e| {
        tracing::error!(column = %column.name, "text value is not valid UTF-8: {e}");
        ExportError::Normalization {
            message: format!("column {}: text value is not valid UTF-8: {}", column.name, e),
        }
    })
}

/// Trim driver padding and restore a leading zero (`.5` → `0.5`).
pub fn canonical_decimal(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("-.") {
        format!("-0.{rest}")
    } else if let Some(rest) = trimmed.strip_prefix('.') {
        format!("0.{rest}")
    } else {
        trimmed.to_string()
    }
}

fn to_naive(ts: &Timestamp) -> Result<NaiveDateTime, ExportError> {
    NaiveDate::from_ymd_opt(ts.year as i32, ts.month as u32, ts.day as u32)
        .and_then(|d| {
            d.and_hms_nano_opt(
                ts.hour as u32,
                ts.minute as u32,
                ts.second as u32,
                ts.fraction,
            )
        })
        .ok_or_else(|| {
            ExportError::statement(format!(
                "invalid timestamp {:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:09}",
                ts.year, ts.month, ts.day, ts.hour, ts.minute, ts.second, ts.fraction
            ))
        })
}
