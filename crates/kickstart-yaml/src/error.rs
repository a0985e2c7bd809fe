//! Error types for YAML parsing with source locations.

use crate::SourceInfo;
use thiserror::Error;

/// Result type alias for kickstart-yaml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during YAML parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// YAML syntax error
    #[error("Parse error: {message}{}", display_location(.location))]
    ParseError {
        message: String,
        location: Option<SourceInfo>,
    },

    /// Invalid YAML structure
    #[error("Invalid YAML structure: {message}{}", display_location(.location))]
    InvalidStructure {
        message: String,
        location: Option<SourceInfo>,
    },
}

impl Error {
    /// Source location of the error, if known.
    pub fn location(&self) -> Option<&SourceInfo> {
        match self {
            Error::ParseError { location, .. } | Error::InvalidStructure { location, .. } => {
                location.as_ref()
            }
        }
    }

    pub(crate) fn with_file(mut self, filename: Option<&str>, base_offset: usize) -> Self {
        let location = match &mut self {
            Error::ParseError { location, .. } | Error::InvalidStructure { location, .. } => {
                location
            }
        };
        if let Some(loc) = location.take() {
            let mut loc = loc.shifted(base_offset);
            if let Some(file) = filename {
                loc = loc.with_file(file);
            }
            *location = Some(loc);
        }
        self
    }
}

fn display_location(location: &Option<SourceInfo>) -> String {
    match location {
        Some(loc) => format!(" (at {})", loc),
        None => String::new(),
    }
}

impl From<yaml_rust2::ScanError> for Error {
    fn from(err: yaml_rust2::ScanError) -> Self {
        let marker = err.marker();
        Error::ParseError {
            message: err.info().to_string(),
            location: Some(SourceInfo::new(
                None,
                marker.index(),
                marker.line() + 1,
                marker.col() + 1,
                0,
            )),
        }
    }
}
