//! CLI error types and exit codes

use thiserror::Error;
use xavyo_connector_access_profile::ConfigError;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 3: Remote API error
/// - 4: Validation error
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Client error: {0}")]
    Client(#[from] xavyo_connector_access_profile::AccessProfileError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("No current entitlements could be read for Access Profile {0} (see logs for details)")]
    LookupFailed(String),

    #[error("Patch for Access Profile {0} was not applied (see logs for details)")]
    PatchFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Client(_) | CliError::LookupFailed(_) | CliError::PatchFailed(_) => 3,
            CliError::Validation(_) | CliError::Json(_) => 4,
            CliError::Config(_) | CliError::Io(_) | CliError::Logging(_) => 1,
        }
    }

    /// Print the error to stderr
    pub fn print(&self) {
        eprintln!("Error: {self}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Validation("x".into()).exit_code(), 4);
        assert_eq!(CliError::PatchFailed("ap-1".into()).exit_code(), 3);
        assert_eq!(CliError::LookupFailed("ap-1".into()).exit_code(), 3);
        assert_eq!(
            CliError::Config(ConfigError::MissingVar("ISC_BASE_URL".into())).exit_code(),
            1
        );
    }
}
