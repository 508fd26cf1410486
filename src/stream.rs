use crate::backend::{RowSource, Session};
use crate::error::ExportError;
use crate::value::{Column, Row};

/// Which execution path produces the result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportMode {
    /// Statement text executed directly as a query.
    Query(String),
    /// Call text binding an output cursor (procedure or function returning one).
    Cursor(String),
}

impl ExportMode {
    pub fn text(&self) -> &str {
        match self {
            ExportMode::Query(sql) | ExportMode::Cursor(sql) => sql,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportMode::Query(_) => "query",
            ExportMode::Cursor(_) => "cursor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Open,
    Closed,
}

/// Lazy, single-pass iteration over a result, uniform across both modes.
///
/// A cursor call that produced no cursor is a valid empty stream: no columns,
/// no rows. A failure reported by the source is kept in `err()` and ends the
/// stream; once closed, every further pull fails with `StreamClosed`.
pub struct ResultStream<S: RowSource> {
    source: Option<S>,
    columns: Vec<Column>,
    state: StreamState,
    err: Option<ExportError>,
}

impl<S: RowSource> ResultStream<S> {
    /// Execute `mode` on `session` and position the stream before the first row.
    pub fn open<'s, X>(session: &'s X, mode: &ExportMode) -> Result<Self, ExportError>
    where
        X: Session<Source<'s> = S>,
    {
        let source = match mode {
            ExportMode::Query(sql) => Some(session.query(sql)?),
            ExportMode::Cursor(sql) => session.call(sql)?,
        };
        if source.is_none() {
            tracing::debug!("cursor call returned no open cursor");
        }
        Ok(Self::from_source(source))
    }

    /// Wrap an already executed source. `None` yields an empty stream.
    pub fn from_source(source: Option<S>) -> Self {
        let columns = source
            .as_ref()
            .map(|s| s.columns().to_vec())
            .unwrap_or_default();
        Self {
            source,
            columns,
            state: StreamState::Open,
            err: None,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Advance one row. `Ok(None)` means end of stream; check `err()` afterwards.
    pub fn next(&mut self) -> Result<Option<Row>, ExportError> {
        if self.state == StreamState::Closed {
            return Err(ExportError::StreamClosed);
        }
        let Some(source) = self.source.as_mut() else {
            self.close();
            return Ok(None);
        };

        match source.fetch() {
            Ok(Some(row)) if row.len() == self.columns.len() => Ok(Some(row)),
            Ok(Some(row)) => {
                self.fail(ExportError::statement(format!(
                    "fetched row has {} values for {} columns",
                    row.len(),
                    self.columns.len()
                )));
                Ok(None)
            }
            Ok(None) => {
                self.close();
                Ok(None)
            }
            Err(e) => {
                self.fail(e);
                Ok(None)
            }
        }
    }

    /// The sticky error set by the source, if any.
    pub fn err(&self) -> Option<&ExportError> {
        self.err.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.state == StreamState::Closed
    }

    /// Release the underlying cursor. Idempotent.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            tracing::debug!("result cursor released");
        }
        self.state = StreamState::Closed;
    }

    /// Close the stream and surface the sticky error, if one was recorded.
    pub fn finish(mut self) -> Result<(), ExportError> {
        self.close();
        match self.err.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, err: ExportError) {
        tracing::warn!("result stream failed: {err}");
        if self.err.is_none() {
            self.err = Some(err);
        }
        self.close();
    }
}
