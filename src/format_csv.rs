use std::io::Write;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::ExportError;
use crate::options::{ExportOptions, LineTerminator};
use crate::value::Column;

/// Delimited-text sink.
///
/// Fields containing the delimiter, a double quote, CR or LF are quoted and
/// embedded quotes doubled. Records end with the configured terminator.
pub struct ExportWriter<W: Write> {
    inner: csv::Writer<W>,
    rows_written: usize,
}

impl<W: Write> ExportWriter<W> {
    pub fn new(sink: W, opts: &ExportOptions) -> Self {
        let terminator = match opts.terminator {
            LineTerminator::Lf => Terminator::Any(b'\n'),
            LineTerminator::CrLf => Terminator::CRLF,
        };
        let inner = WriterBuilder::new()
            .delimiter(opts.delimiter)
            .terminator(terminator)
            .quote_style(QuoteStyle::Necessary)
            .double_quote(true)
            .flexible(true)
            .from_writer(sink);
        Self {
            inner,
            rows_written: 0,
        }
    }

    /// Write the column names as the first record.
    pub fn write_header(&mut self, columns: &[Column]) -> Result<(), ExportError> {
        self.inner
            .write_record(columns.iter().map(|c| c.name.as_str()))?;
        Ok(())
    }

    pub fn write_row(&mut self, fields: &[String]) -> Result<(), ExportError> {
        self.inner.write_record(fields)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Data rows written so far, header excluded.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush everything buffered down to the sink and hand the sink back.
    pub fn flush(self) -> Result<W, ExportError> {
        let mut sink = self.inner.into_inner().map_err(|e| ExportError::Write {
            message: format!("flush failed: {}", e.error()),
        })?;
        sink.flush().map_err(|e| ExportError::Write {
            message: format!("flush failed: {e}"),
        })?;
        Ok(sink)
    }
}
