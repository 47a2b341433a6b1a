use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;

/// Errors surfaced by graph transitions and the layout worker handle.
///
/// Transitions that fail leave the store exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node not found: {0}")]
    UnknownNode(String),

    #[error("link not found: {from} - {to}")]
    UnknownLink { from: String, to: String },

    #[error("search not found: {0}")]
    UnknownSearch(String),

    #[error("connector not found: {0}")]
    UnknownConnector(String),

    #[error("rule {rule} not found in connector {connector}")]
    UnknownRule { connector: String, rule: String },

    #[error("normalization not found: {0}")]
    UnknownNormalization(String),

    #[error("via rule not found: {0}")]
    UnknownVia(String),

    #[error("invalid regex {pattern:?}: {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("invalid via rule: {0}")]
    InvalidVia(String),

    #[error("a normalization already produces {0:?}")]
    DuplicateNormalization(String),

    #[error("layout worker unavailable: {0}")]
    WorkerUnavailable(String),
}
