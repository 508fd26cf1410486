use crate::error::ExportError;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Print error to stderr in the contract format: error: <category>: <message>
pub fn print_error(err: &ExportError) {
    eprintln!("error: {}", err);
}

/// Print the file output summary to stdout. Only used when data went to a file.
pub fn print_summary(rows: usize, path: &Path) {
    print!("{}", summary_text(rows, path));
}

pub fn summary_text(rows: usize, path: &Path) -> String {
    format!("rows_written: {}\nfile: {}\n", rows, path.display())
}

/// Open the export sink: the given file, or stdout.
pub fn open_sink(path: Option<&Path>) -> Result<Box<dyn Write>, ExportError> {
    let Some(path) = path else {
        return Ok(Box::new(io::stdout().lock()));
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        return Err(ExportError::Write {
            message: format!("parent directory does not exist: {}", parent.display()),
        });
    }
    let file = File::create(path).map_err(|e| ExportError::Write {
        message: format!("cannot create {}: {}", path.display(), e),
    })?;
    Ok(Box::new(file))
}
