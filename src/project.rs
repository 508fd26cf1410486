use crate::error::ExportError;
use crate::normalize::normalize;
use crate::options::ExportOptions;
use crate::value::Value;

/// Normalize every cell of a row in column order.
///
/// All-or-nothing: the first failing cell aborts the row and nothing of it is
/// returned.
pub fn project(row: &[Value], opts: &ExportOptions) -> Result<Vec<String>, ExportError> {
    row.iter().map(|value| normalize(value, opts)).collect()
}
