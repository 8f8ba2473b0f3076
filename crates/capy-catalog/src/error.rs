//! Error types for capy-catalog

/// Catalog engine errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
