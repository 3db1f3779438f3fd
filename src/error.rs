//! Error types for geo-distance

use thiserror::Error;

/// Main error type for geo-distance operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Geocoding error: {0}")]
    Geocoding(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Attribute error: {0}")]
    Attribute(String),
}

/// Result type alias for geo-distance operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage in which a ranking run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Cache read or provider resolution
    Lookup,
    /// Resolving the configured attributes against the record model
    Attribute,
    /// Building or executing the distance query
    Query,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lookup => write!(f, "lookup"),
            Self::Attribute => write!(f, "attribute"),
            Self::Query => write!(f, "query"),
        }
    }
}

/// A ranking run that degraded to the unchanged input order
///
/// Never returned to callers of the ranking entry points; it is logged and
/// handed to the engine's degradation hook.
#[derive(Error, Debug)]
#[error("distance ranking for field '{field_id}' failed during {stage}: {source}")]
pub struct ResolutionError {
    pub field_id: String,
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl ResolutionError {
    pub fn new(field_id: impl Into<String>, stage: Stage, source: Error) -> Self {
        Self {
            field_id: field_id.into(),
            stage,
            source,
        }
    }
}
