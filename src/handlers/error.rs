use thiserror::Error;

use crate::remote::RemoteError;
use crate::token::TokenError;

/// Failure inside one handler's extraction or provisioning step
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("{field} resolved to '{value}', which is not a valid identifier")]
    InvalidReference { field: String, value: String },
}

/// The pipeline could not be built or a handler aborted the run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("handler '{handler}' failed: {source}")]
    HandlerFailed {
        handler: String,
        #[source]
        source: HandlerError,
    },

    #[error("handler '{handler}' requires '{requires}', which is not registered")]
    UnknownDependency { handler: String, requires: String },

    #[error("circular dependency between handlers: {}", .handlers.join(", "))]
    CircularDependency { handlers: Vec<String> },

    #[error("handler '{0}' is registered twice")]
    DuplicateHandler(String),

    #[error("no handler named '{0}'")]
    UnknownHandler(String),
}
