use std::fmt;

use crate::model::Source;

/// Run-aborting failures. Row-level defects never surface here; they are
/// collected as [`crate::model::RowIssue`] values on the result instead.
#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty table entry, duplicate override, etc.).
    ConfigValidation(String),
    /// Missing required column in an input table.
    MissingColumn { source: Source, column: String },
    /// Structural CSV error (unreadable header, broken quoting).
    Csv { source: Source, message: String },
    /// IO error (file read/write).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { source, column } => {
                write!(f, "{source}: missing column '{column}'")
            }
            Self::Csv { source, message } => write!(f, "{source}: CSV error: {message}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<std::io::Error> for ReconError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
