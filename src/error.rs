use std::path::PathBuf;
use thiserror::Error;

/// Caller mistakes: nothing was read or written when one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("No sources selected")]
    NoSources,

    #[error("No columns selected")]
    NoColumns,

    #[error("No comparison has been run yet")]
    NoComparison,

    #[error("Match pair {index} is out of range ({len} pairs)")]
    PairOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum DupsyError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("Unsupported file type: {path}")]
    UnsupportedFormat { path: PathBuf },
}

impl DupsyError {
    pub fn read(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Read {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Write {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DupsyError>;
