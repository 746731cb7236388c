use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, aggregating, and rendering standings
#[derive(Debug, Error)]
pub enum PoolError {
    /// Input file does not exist
    #[error("The file {} was not found", path.display())]
    InputNotFound { path: PathBuf },

    /// Input file exists but is not readable as CSV
    #[error("There was an issue parsing the CSV file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// One or more required columns are absent from the header
    #[error("Missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// A required column holds nulls or values of the wrong type
    #[error("Invalid values in column '{column}': {message}")]
    InvalidColumn { column: String, message: String },

    /// Dataframe failure while aggregating
    #[error("Data error: {0}")]
    Data(#[from] polars::prelude::PolarsError),

    /// Configuration error (malformed config file, out-of-range values, unknown palette)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A single chart could not be drawn or saved
    #[error("Error generating plot for year range {label}: {message}")]
    Render { label: String, message: String },

    /// Frames could not be combined into the animation
    #[error("Error creating animation {}: {message}", path.display())]
    Assembly { path: PathBuf, message: String },

    /// Filesystem error outside of the categories above
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results using PoolError
pub type Result<T> = std::result::Result<T, PoolError>;
