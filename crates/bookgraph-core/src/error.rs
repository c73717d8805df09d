//! Error types for Bookgraph

use thiserror::Error;

/// Result type alias using Bookgraph's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Bookgraph error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Graph errors (E001-E099)
    #[error("Node id {0} not found in the knowledge graph.")]
    NodeNotFound(usize),

    // Network errors (E100-E199)
    #[error("Network error: {0}. Check that the completion server is reachable.")]
    NetworkError(#[from] reqwest::Error),

    #[error("Transport failure after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },

    #[error("Completion server returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("LLM error: {0}")]
    LLMError(String),

    // Storage errors (E400-E499)
    #[error("Unsupported artifact format at {path}: {reason}")]
    UnsupportedFormat { path: String, reason: String },

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::NodeNotFound(_) => "E001",
            Self::NetworkError(_) => "E100",
            Self::Transport { .. } => "E101",
            Self::HttpStatus { .. } => "E102",
            Self::LLMError(_) => "E103",
            Self::UnsupportedFormat { .. } => "E400",
            Self::ArtifactNotFound(_) => "E401",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Json(_) => "E900",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NetworkError(_) | Self::Transport { .. } => {
                Some("bookgraph ping".to_string())
            }
            Self::HttpStatus { status: 404, .. } => Some("bookgraph models".to_string()),
            Self::ArtifactNotFound(path) if path.contains("concepts") => {
                Some("bookgraph concepts <book-title>".to_string())
            }
            Self::ArtifactNotFound(path) if path.contains("prerequisites") => {
                Some("bookgraph prereqs <book-title>".to_string())
            }
            Self::ArtifactNotFound(path) if path.contains("edges") => {
                Some("bookgraph edges <book-title>".to_string())
            }
            Self::ConfigError(_) => Some("bookgraph config list".to_string()),
            _ => None,
        }
    }

    /// Whether the failure happened while talking to the completion server
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::NetworkError(_) | Self::Transport { .. } | Self::HttpStatus { .. }
        )
    }
}
