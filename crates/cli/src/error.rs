//! CLI error types.

use std::fmt;

#[derive(Debug)]
pub enum CliError {
    /// Configuration file error
    Config(String),
    /// Consent, vendor list or bidder input error
    Input(String),
    /// IO error
    Io(std::io::Error),
    /// JSON serialization error
    Json(serde_json::Error),
    /// Logger setup error
    Logger(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Input(msg) => write!(f, "Input error: {}", msg),
            CliError::Io(err) => write!(f, "IO error: {}", err),
            CliError::Json(err) => write!(f, "JSON error: {}", err),
            CliError::Logger(msg) => write!(f, "Logger error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(err) => Some(err),
            CliError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Json(err)
    }
}

impl From<log::SetLoggerError> for CliError {
    fn from(err: log::SetLoggerError) -> Self {
        CliError::Logger(err.to_string())
    }
}
