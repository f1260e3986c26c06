//! Pipeline error types.

/// Errors raised while turning the markdown event stream into a document tree.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unsupported markdown construct: {0}")]
    Unsupported(String),

    #[error("unbalanced markdown event stream: expected end of {expected}, found {found}")]
    Unbalanced { expected: String, found: String },

    #[error("markdown event stream ended inside {0}")]
    UnexpectedEnd(String),
}

/// Errors that can occur during pipeline processing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("markdown parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    #[error("invalid pipeline configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// Create a stage-specific error.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }
}
