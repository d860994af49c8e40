//! Token resolution errors

use thiserror::Error;

use crate::error::{render_report, Span};

/// Why a token could not be replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// No resolver is registered for the prefix
    UnknownPrefix,
    /// The resolver found nothing for the arguments, e.g. the list does not
    /// exist yet
    NotFound,
}

/// A token was left unresolved while the parser was in strict mode
#[derive(Debug, Clone, PartialEq, Error)]
#[error("unresolved token {token}: {}", describe(.reason, .prefix))]
pub struct UnresolvedTokenError {
    /// The token exactly as written
    pub token: String,
    pub prefix: String,
    pub reason: UnresolvedReason,
    /// The string being parsed and the token's position in it
    pub input: String,
    pub span: Span,
}

fn describe(reason: &UnresolvedReason, prefix: &str) -> String {
    match reason {
        UnresolvedReason::UnknownPrefix => format!("no resolver for prefix '{}'", prefix),
        UnresolvedReason::NotFound => "referenced entity does not exist".to_string(),
    }
}

impl UnresolvedTokenError {
    /// Render the error with the token underlined in its input
    pub fn format(&self, name: &str) -> String {
        let note = match self.reason {
            UnresolvedReason::NotFound => {
                Some("entities are registered as handlers create them; run the creating handler first")
            }
            UnresolvedReason::UnknownPrefix => None,
        };
        render_report(
            &self.input,
            name,
            self.span.clone(),
            "unresolved token",
            &describe(&self.reason, &self.prefix),
            note,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TokenError {
    #[error(transparent)]
    Unresolved(#[from] UnresolvedTokenError),

    #[error("invalid token prefix '{0}': expected a letter followed by letters, digits, '_' or '-'")]
    InvalidPrefix(String),
}

impl TokenError {
    pub fn format(&self, name: &str) -> String {
        match self {
            TokenError::Unresolved(err) => err.format(name),
            other => other.to_string(),
        }
    }
}
