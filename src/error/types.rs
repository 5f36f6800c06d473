use thiserror::Error;

use crate::logging::LoggingError;

/// Unified result type for the dashboard layout crate.
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Errors surfaced by the dashboard layout engine.
///
/// Blocked placements are not errors; they come back as rejected commits.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("default layout is empty")]
    EmptyDefaultLayout,
    #[error("unknown widget type `{0}`")]
    UnknownWidget(String),
    #[error("settings store failure: {0}")]
    Store(String),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("settings serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
