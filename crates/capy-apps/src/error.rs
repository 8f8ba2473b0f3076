//! Error types for capy-apps

use capy_catalog::CatalogError;

/// XDG backend errors
#[derive(Debug, thiserror::Error)]
pub enum AppsError {
    #[error("Unknown app: {0}")]
    UnknownApp(String),

    #[error("App {0} has no Exec line")]
    NoExec(String),

    #[error("Bad Exec line for {0}: {1}")]
    BadExec(String, String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl From<AppsError> for CatalogError {
    fn from(err: AppsError) -> Self {
        match err {
            AppsError::Io(e) => CatalogError::Io(e),
            other => CatalogError::BackendUnavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppsError>;
