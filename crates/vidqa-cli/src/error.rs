//! CLI-specific error types and exit codes.

use thiserror::Error;
use vidqa_core::{InferenceError, SettingsError};
use vidqa_runtime::SupervisorError;

#[derive(Debug, Error)]
pub enum CliError {
    /// Settings file, flags or environment are invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A transcript file could not be read or is malformed.
    #[error("Transcript error: {0}")]
    Transcript(String),

    /// The inference server could not be started or reached.
    #[error("Inference server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl CliError {
    /// Map error to an exit code (sysexits.h conventions).
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 78,     // EX_CONFIG
            Self::Transcript(_) => 65, // EX_DATAERR
            Self::Server(_) => 69,     // EX_UNAVAILABLE
            Self::Io(_) => 74,         // EX_IOERR
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<SupervisorError> for CliError {
    fn from(err: SupervisorError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<InferenceError> for CliError {
    fn from(err: InferenceError) -> Self {
        Self::Server(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::from(SettingsError::InvalidPort).exit_code(), 78);
        assert_eq!(
            CliError::from(InferenceError::SpawnFailed("python".into())).exit_code(),
            69
        );
        assert_eq!(CliError::Transcript("bad".into()).exit_code(), 65);
    }

    #[test]
    fn test_survives_anyhow_context() {
        let err = anyhow::Error::from(CliError::Transcript("bad".into())).context("loading");
        let cli = err.downcast_ref::<CliError>().unwrap();
        assert_eq!(cli.exit_code(), 65);
    }
}
