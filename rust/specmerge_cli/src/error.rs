use specmerge::SpecMergeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid merge configuration: {0}")]
    Config(#[from] SpecMergeError),

    #[error("Data reading error: {0}")]
    DataReading(String),

    #[error("Progress bar error: {0}")]
    Progress(String),

    #[error("Could not set up logging: {0}")]
    Tracing(#[from] tracing::subscriber::SetGlobalDefaultError),
}
