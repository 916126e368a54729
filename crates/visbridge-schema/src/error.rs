use visbridge_message::Kind;

/// Errors from loading schemas and validating payloads.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    #[error("failed to compile schema: {0}")]
    CompileFailed(String),

    /// The payload does not satisfy the schema registered for its kind.
    #[error("{kind} payload failed validation: {message}")]
    ValidationFailed { kind: Kind, message: String },

    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("no schema registered for {0}")]
    NoSchema(Kind),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
