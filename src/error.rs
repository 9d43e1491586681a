/// Centralized error types for history-mapper using thiserror
///
/// Hard errors are reserved for environmental problems (repository, configuration,
/// tokenizer failures). Failing to find a match is not an error: lookups return `Ok(None)`.
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, MapperError>;

/// Main error type for the history mapper
#[derive(Error, Debug)]
pub enum MapperError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors raised by the history repository adapter
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Failed to initialize mirror of '{path}': {reason}")]
    InitializationFailed { path: String, reason: String },

    #[error("Unknown revision: {0}")]
    UnknownRevision(String),

    #[error("File '{path}' not found at commit {commit}")]
    FileNotFoundAtCommit { path: String, commit: String },

    #[error("No first-parent path between {from} and {to}")]
    NoLinearPath { from: String, to: String },

    #[error("Git operation failed: {0}")]
    Git(String),
}

/// Errors related to tokenizing source files
#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Failed to parse '{0}'")]
    ParseFailed(String),

    #[error("Failed to tokenize '{file}': {reason}")]
    Failed { file: String, reason: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to input validation
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Only METHOD artifacts can be mapped, got {0}")]
    UnsupportedArtifactType(String),

    #[error("Empty {0}")]
    Empty(String),
}

impl From<git2::Error> for RepositoryError {
    fn from(err: git2::Error) -> Self {
        RepositoryError::Git(err.message().to_string())
    }
}

impl From<git2::Error> for MapperError {
    fn from(err: git2::Error) -> Self {
        MapperError::Repository(err.into())
    }
}

// Conversion from anyhow::Error to MapperError
impl From<anyhow::Error> for MapperError {
    fn from(err: anyhow::Error) -> Self {
        MapperError::Other(format!("{:#}", err))
    }
}

impl MapperError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        MapperError::Other(msg.into())
    }

    /// Check if this is a caller error (bad input) rather than an environment failure
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            MapperError::Validation(_)
                | MapperError::Repository(RepositoryError::UnknownRevision(_))
                | MapperError::Repository(RepositoryError::NoLinearPath { .. })
                | MapperError::Config(ConfigError::InvalidValue { .. })
        )
    }

    /// True when the error only signals that a file is absent at a commit
    pub fn is_file_not_found(&self) -> bool {
        matches!(
            self,
            MapperError::Repository(RepositoryError::FileNotFoundAtCommit { .. })
        )
    }
}
