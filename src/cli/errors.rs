use clap::error::ErrorKind;
use std::{error::Error, fmt};

#[derive(Debug, Clone)]
pub enum CrxCliError {
    UnsupportedFileType,
    NotFound(String),
    InvalidExtension(String),
}

impl Error for CrxCliError {}

impl fmt::Display for CrxCliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrxCliError::UnsupportedFileType => {
                write!(f, "Unsupported file type. Only CRX files are supported")
            }
            CrxCliError::NotFound(path) => write!(f, "{} not found", path),
            CrxCliError::InvalidExtension(reason) => write!(f, "{}", reason),
        }
    }
}

impl From<CrxCliError> for ErrorKind {
    fn from(error: CrxCliError) -> Self {
        match error {
            CrxCliError::UnsupportedFileType => ErrorKind::InvalidValue,
            CrxCliError::NotFound(_) => ErrorKind::Io,
            CrxCliError::InvalidExtension(_) => ErrorKind::ValueValidation,
        }
    }
}
