pub mod odbc;

use crate::error::ExportError;
use crate::value::{Column, Row};

/// A live, forward-only result cursor.
pub trait RowSource {
    /// Columns of the result, fixed once the cursor exists.
    fn columns(&self) -> &[Column];

    /// Pull the next row, or `None` once the cursor is exhausted.
    fn fetch(&mut self) -> Result<Option<Row>, ExportError>;
}

/// An opened database session able to run statement text.
pub trait Session {
    type Source<'s>: RowSource
    where
        Self: 's;

    /// Execute `sql` as a query. A statement that yields no result set is an error.
    fn query(&self, sql: &str) -> Result<Self::Source<'_>, ExportError>;

    /// Execute `sql` as a call whose output cursor comes back as the result.
    /// `None` means the call left its cursor unopened.
    fn call(&self, sql: &str) -> Result<Option<Self::Source<'_>>, ExportError>;
}
