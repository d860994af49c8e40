//! Deferred references inside template strings
//!
//! A token such as `{listid:Projects}` names an entity that may not exist
//! until provisioning creates it. Handlers register entities on the
//! [`TokenParser`] as they create them, and later handlers parse their
//! string fields through it.

mod error;
mod lexer;
mod parser;
mod resolvers;

pub use error::{TokenError, UnresolvedReason, UnresolvedTokenError};
pub use parser::TokenParser;
pub use resolvers::{
    Entity, EntityCatalog, EntityKind, ListIdResolver, ListUrlResolver, ParameterResolver, SiteCollectionResolver,
    SiteResolver, TokenResolver, TokenScope, WorkflowDefinitionIdResolver,
};

use crate::error::Span;

/// One `{prefix:arg1,arg2}` occurrence in a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lowercased prefix
    pub prefix: String,
    /// Comma-separated arguments, trimmed; empty for `{prefix}`
    pub args: Vec<String>,
    /// The token exactly as written, braces included
    pub text: String,
    pub span: Span,
}

impl Token {
    /// Build a token from lexed text of the form `{prefix}` or `{prefix:args}`
    pub(crate) fn parse(text: &str, span: Span) -> Self {
        let inner = text.trim_start_matches('{').trim_end_matches('}');
        let (prefix, args) = match inner.split_once(':') {
            Some((prefix, args)) => (prefix, args.split(',').map(|a| a.trim().to_string()).collect()),
            None => (inner, Vec::new()),
        };
        Self {
            prefix: prefix.to_lowercase(),
            args,
            text: text.to_string(),
            span,
        }
    }
}

/// A token bound to the value that replaced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInstance {
    pub token: Token,
    pub value: String,
}
