use crate::error::ExportError;
use crate::options::ExportOptions;
use crate::value::Value;

/// Render one value as canonical text.
///
/// NULLs of any nullable kind become `opts.null_text` verbatim; quoting is the
/// writer's concern. Integers are plain base 10, doubles use the shortest text
/// that parses back to the same bits, decimals keep their driver text and
/// timestamps go through `opts.date_format` without any zone conversion.
pub fn normalize(value: &Value, opts: &ExportOptions) -> Result<String, ExportError> {
    match value {
        Value::Integer(v) | Value::NullableInteger(Some(v)) => Ok(v.to_string()),
        Value::Double(v) | Value::NullableDouble(Some(v)) => Ok(format_double(*v)),
        Value::Decimal(s)
        | Value::NullableDecimal(Some(s))
        | Value::Text(s)
        | Value::NullableText(Some(s)) => Ok(s.clone()),
        Value::NullableTimestamp(Some(ts)) => opts.date_format.render(ts),
        Value::Opaque(Some(bytes)) => opaque_as_text(bytes),
        Value::NullableInteger(None)
        | Value::NullableDouble(None)
        | Value::NullableDecimal(None)
        | Value::NullableText(None)
        | Value::NullableTimestamp(None)
        | Value::Opaque(None) => Ok(opts.null_text.clone()),
    }
}

/// `Display` for f64 already prints the shortest round-trip form, never in
/// exponent notation.
fn format_double(v: f64) -> String {
    v.to_string()
}

fn opaque_as_text(bytes: &[u8]) -> Result<String, ExportError> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            tracing::error!(
                len = bytes.len(),
                "unrecognized column value is not text: {e}"
            );
            Err(ExportError::Normalization {
                message: format!(
                    "unrecognized value of {} bytes is not valid text: {}",
                    bytes.len(),
                    e
                ),
            })
        }
    }
}
