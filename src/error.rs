use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("config: {message}")]
    Config { message: String },

    #[error("connection: {message}")]
    Connection { message: String },

    #[error("statement: {message}")]
    Statement { message: String },

    /// An unrecognized value reached the normalizer. Always fatal.
    #[error("normalization: {message}")]
    Normalization { message: String },

    #[error("write: {message}")]
    Write { message: String },

    #[error("stream: result stream is closed")]
    StreamClosed,
}

impl ExportError {
    pub fn config(message: impl Into<String>) -> Self {
        ExportError::Config {
            message: message.into(),
        }
    }

    pub fn statement(message: impl Into<String>) -> Self {
        ExportError::Statement {
            message: message.into(),
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Write {
            message: err.to_string(),
        }
    }
}
