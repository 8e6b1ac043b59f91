use thiserror::Error;

#[derive(Debug, Error)]
pub enum WayfindError {
    // Collaborator errors
    #[error("Completion service failed: {0}")]
    UpstreamCompletion(String),

    #[error("Retrieval service failed: {0}")]
    UpstreamRetrieval(String),

    #[error("Completion response parse error: {0}")]
    CompletionParse(String),

    // Pipeline errors
    #[error("Pipeline definition invalid: {0}")]
    Pipeline(String),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WayfindError>;
