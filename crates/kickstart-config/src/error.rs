//! Error types for kickstart-config

use std::path::PathBuf;

use kickstart_error_reporting::{DiagnosticKind, DiagnosticMessage, DiagnosticMessageBuilder};
use kickstart_runtime::RuntimeError;
use kickstart_source_map::SourceInfo;
use thiserror::Error;

use crate::factory::FactoryError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Yaml(#[from] kickstart_yaml::Error),

    #[error("Failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Invalid period '{0}'")]
    InvalidPeriod(String),

    #[error("Invalid value for !{tag}: {message}{}", display_location(.location))]
    InvalidTagValue {
        tag: String,
        message: String,
        location: Option<SourceInfo>,
    },

    #[error("!{tag} failed{}: {source}", display_location(.location))]
    TagFailed {
        tag: String,
        location: Option<SourceInfo>,
        #[source]
        source: RuntimeError,
    },

    #[error("Unknown error severity '{0}'")]
    UnknownSeverity(String),

    #[error("Offset {offset} is not on a character boundary")]
    InvalidOffset { offset: u64 },

    #[error(transparent)]
    Factory(#[from] FactoryError),
}

fn display_location(location: &Option<SourceInfo>) -> String {
    match location {
        Some(info) => format!(" at {}", info),
        None => String::new(),
    }
}

impl ConfigError {
    /// Source location of the offending node, when known.
    pub fn location(&self) -> Option<&SourceInfo> {
        match self {
            ConfigError::Yaml(e) => e.location(),
            ConfigError::InvalidTagValue { location, .. } | ConfigError::TagFailed { location, .. } => {
                location.as_ref()
            }
            _ => None,
        }
    }

    /// Catalog code for errors caused by a tag's value.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            ConfigError::InvalidPeriod(_) => Some("K-1-3"),
            ConfigError::InvalidTagValue { .. } | ConfigError::UnknownSeverity(_) => Some("K-1-2"),
            _ => None,
        }
    }

    /// Render as a diagnostic, titled from the catalog when the error has a code.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let builder = match self.code() {
            Some(code) => DiagnosticMessageBuilder::from_code(DiagnosticKind::Error, code),
            None => DiagnosticMessageBuilder::error("Configuration error"),
        };
        builder
            .problem(self.to_string())
            .with_optional_location(self.location().cloned())
            .build()
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
