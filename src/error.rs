use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid inventory location provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The inventory could not be fetched.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The inventory bytes are not a readable columnar file.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Logging or configuration setup failed.
    #[error("Config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Fetch(err.to_string())
    }
}

impl From<parquet::errors::ParquetError> for AppError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        AppError::Decode(err.to_string())
    }
}
