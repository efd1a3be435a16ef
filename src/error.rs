use std::path::PathBuf;
use thiserror::Error;

/// Core library errors
#[derive(Error, Debug)]
pub enum TidyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error at path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory '{0}' does not exist or is not accessible")]
    DirectoryNotFound(PathBuf),

    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),

    #[error(".gitignore file not found in directory '{0}'")]
    GitignoreMissing(PathBuf),

    #[error("No items selected for cleaning")]
    NoSelection,

    #[error("A cleanup is already running")]
    CleanupInProgress,

    #[error("Failed to start worker thread: {0}")]
    Thread(#[source] std::io::Error),

    #[error("{failed} of {total} items could not be deleted")]
    PartialFailure { failed: usize, total: usize },

    #[error("Operation cancelled")]
    Cancelled,
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TidyError>;

impl TidyError {
    /// True for errors raised because a precondition of the requested
    /// operation did not hold. These never leave partial state behind.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            TidyError::DirectoryNotFound(_)
                | TidyError::NotADirectory(_)
                | TidyError::GitignoreMissing(_)
                | TidyError::NoSelection
                | TidyError::CleanupInProgress
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = ConfigError::Invalid("tick_rate_ms must be positive".into());
        assert!(err.to_string().contains("tick_rate_ms"));

        let err = TidyError::GitignoreMissing(PathBuf::from("/work"));
        assert!(err.to_string().contains(".gitignore"));
        assert!(err.to_string().contains("/work"));
    }

    #[test]
    fn error_conversion() {
        let config_err = ConfigError::Invalid("test".into());
        let tidy_err: TidyError = config_err.into();
        assert!(matches!(tidy_err, TidyError::Config(_)));
    }

    #[test]
    fn precondition_classification() {
        assert!(TidyError::NoSelection.is_precondition());
        assert!(TidyError::DirectoryNotFound(PathBuf::from("/x")).is_precondition());
        assert!(!TidyError::Cancelled.is_precondition());
        assert!(!TidyError::PartialFailure { failed: 1, total: 2 }.is_precondition());
    }

    #[test]
    fn partial_failure_message_counts_items() {
        let err = TidyError::PartialFailure { failed: 1, total: 3 };
        assert_eq!(err.to_string(), "1 of 3 items could not be deleted");
    }
}
