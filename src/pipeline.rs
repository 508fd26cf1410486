use std::io::{BufRead, Write};

use crate::backend::Session;
use crate::cli::Cli;
use crate::config::{self, AppConfig};
use crate::error::ExportError;
use crate::format_csv::ExportWriter;
use crate::options::ExportOptions;
use crate::project::project;
use crate::stream::{ExportMode, ResultStream};
use crate::verbose::Timer;

/// Where a run currently is. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    ModeSelected,
    StreamOpen,
    Draining,
    Completed,
    Failed,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub columns: usize,
    pub rows: usize,
}

/// Drives one export: mode selection, stream open, header, row drain, flush.
///
/// Any error moves the pipeline to `Failed` and is returned as is; there is no
/// partial success. The result cursor is released on every exit path.
#[derive(Debug)]
pub struct ExportPipeline {
    mode: Option<ExportMode>,
    state: PipelineState,
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportPipeline {
    pub fn new() -> Self {
        Self {
            mode: None,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn mode(&self) -> Option<&ExportMode> {
        self.mode.as_ref()
    }

    /// Pick the execution mode from the query and cursor-call fragments.
    ///
    /// Fragments are joined with a single space. Exactly one of the two may be
    /// non-empty; when both are empty the query is read from `input`, one
    /// line per fragment.
    pub fn select_mode<R: BufRead>(
        &mut self,
        query: &[String],
        cursor: &[String],
        input: R,
    ) -> Result<&ExportMode, ExportError> {
        if self.state != PipelineState::Idle {
            return Err(ExportError::config("input mode already selected"));
        }
        match resolve_mode(query, cursor, input) {
            Ok(mode) => {
                self.state = PipelineState::ModeSelected;
                Ok(self.mode.insert(mode))
            }
            Err(err) => {
                self.state = PipelineState::Failed;
                Err(err)
            }
        }
    }

    /// Run the selected statement on `session` and stream its result into `sink`.
    pub fn run<S, W>(
        &mut self,
        session: &S,
        options: &ExportOptions,
        sink: W,
    ) -> Result<ExportSummary, ExportError>
    where
        S: Session,
        W: Write,
    {
        let result = self.drive(session, options, sink);
        match &result {
            Ok(summary) => {
                self.state = PipelineState::Completed;
                tracing::info!(rows = summary.rows, columns = summary.columns, "export complete");
            }
            Err(err) => {
                self.state = PipelineState::Failed;
                tracing::error!("export failed: {err}");
            }
        }
        result
    }

    fn drive<S, W>(
        &mut self,
        session: &S,
        options: &ExportOptions,
        sink: W,
    ) -> Result<ExportSummary, ExportError>
    where
        S: Session,
        W: Write,
    {
        if self.state != PipelineState::ModeSelected {
            return Err(ExportError::config(format!(
                "cannot run export from state {:?}",
                self.state
            )));
        }
        let Some(mode) = self.mode.as_ref() else {
            return Err(ExportError::config("no input mode selected"));
        };

        let timer = Timer::start();
        let mut stream = ResultStream::open(session, mode)?;
        self.state = PipelineState::StreamOpen;
        let columns = stream.columns().len();
        tracing::debug!(
            columns,
            elapsed_ms = timer.elapsed_ms() as u64,
            "{} executed",
            mode.label()
        );

        let mut writer = ExportWriter::new(sink, options);
        if options.emit_header && columns > 0 {
            writer.write_header(stream.columns())?;
        }

        self.state = PipelineState::Draining;
        while let Some(row) = stream.next()? {
            let fields = project(&row, options)?;
            writer.write_row(&fields)?;
        }
        stream.finish()?;

        let rows = writer.rows_written();
        writer.flush()?;
        tracing::debug!(rows, elapsed_ms = timer.elapsed_ms() as u64, "rows drained");

        Ok(ExportSummary { columns, rows })
    }
}

/// Settle the input mode, then load configuration. Neither step touches the
/// database, and a missing input is reported ahead of a missing connection.
pub fn prepare<R: BufRead>(cli: &Cli, input: R) -> Result<(ExportPipeline, AppConfig), ExportError> {
    let mut pipeline = ExportPipeline::new();
    pipeline.select_mode(&cli.export.query, &cli.export.ref_cursor, input)?;

    let app_config = config::load_from_export_args(
        &cli.export,
        cli.verbose,
        cli.show_secrets,
        cli.config.as_ref(),
    )?;
    Ok((pipeline, app_config))
}

fn resolve_mode<R: BufRead>(
    query: &[String],
    cursor: &[String],
    input: R,
) -> Result<ExportMode, ExportError> {
    let query = join_fragments(query);
    let cursor = join_fragments(cursor);

    match (query, cursor) {
        (Some(_), Some(_)) => Err(ExportError::config(
            "the input cannot be both a query and a cursor call",
        )),
        (Some(sql), None) => Ok(ExportMode::Query(sql)),
        (None, Some(call)) => Ok(ExportMode::Cursor(call)),
        (None, None) => {
            let lines = input
                .lines()
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ExportError::config(format!("cannot read standard input: {e}")))?;
            join_fragments(&lines)
                .map(ExportMode::Query)
                .ok_or_else(|| {
                    ExportError::config(
                        "no input: pass --query or --ref-cursor, or pipe a query on standard input",
                    )
                })
        }
    }
}

fn join_fragments(parts: &[String]) -> Option<String> {
    let joined = parts.join(" ");
    if joined.trim().is_empty() {
        None
    } else {
        Some(joined)
    }
}
