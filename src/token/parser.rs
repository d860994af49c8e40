//! The token parser: one resolution session over a template

use std::collections::HashMap;

use logos::Logos;

use crate::model::Template;

use super::error::{TokenError, UnresolvedReason, UnresolvedTokenError};
use super::lexer::{token_spans, Segment};
use super::resolvers::{builtin_resolvers, Entity, EntityCatalog, EntityKind, TokenResolver, TokenScope};
use super::{Token, TokenInstance};

/// Replaces `{prefix:args}` tokens in template strings
///
/// One parser is one session: successful resolutions are cached by the exact
/// token text until an entity they may depend on is replaced. Each call to
/// [`parse_string`](Self::parse_string) is a single left-to-right pass;
/// replacement values are never re-scanned. A token that cannot be resolved
/// yet is left verbatim unless the parser is strict.
pub struct TokenParser {
    template: Template,
    site_url: String,
    site_collection_url: String,
    resolvers: HashMap<String, Box<dyn TokenResolver>>,
    entities: EntityCatalog,
    cache: HashMap<String, String>,
    strict: bool,
}

impl TokenParser {
    /// Parser over a copy of `template`, with the built-in resolvers
    pub fn new(template: &Template, site_url: impl Into<String>) -> Self {
        let site_url = site_url.into();
        let resolvers = builtin_resolvers()
            .into_iter()
            .map(|r| (r.prefix().to_lowercase(), r))
            .collect();
        Self {
            template: template.clone(),
            site_collection_url: site_url.clone(),
            site_url,
            resolvers,
            entities: EntityCatalog::new(),
            cache: HashMap::new(),
            strict: false,
        }
    }

    /// Fail on unresolved tokens instead of leaving them in place
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_site_collection_url(mut self, url: impl Into<String>) -> Self {
        self.site_collection_url = url.into();
        self.cache.clear();
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn entities(&self) -> &EntityCatalog {
        &self.entities
    }

    /// Add or replace the resolver for its prefix
    pub fn register_resolver(&mut self, resolver: impl TokenResolver + 'static) -> Result<(), TokenError> {
        let prefix = resolver.prefix().to_lowercase();
        let valid = prefix.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(TokenError::InvalidPrefix(prefix));
        }
        if self.resolvers.insert(prefix, Box::new(resolver)).is_some() {
            self.cache.clear();
        }
        Ok(())
    }

    /// Make a newly created entity available to tokens
    pub fn register_entity(&mut self, kind: EntityKind, name: &str, entity: Entity) {
        tracing::debug!(?kind, name, id = %entity.id, "entity registered");
        if let Some(previous) = self.entities.insert(kind, name, entity.clone()) {
            if previous != entity {
                self.cache.clear();
            }
        }
    }

    /// Tokens of `input` in order of appearance
    pub fn tokens(input: &str) -> Vec<Token> {
        token_spans(input)
            .map(|span| Token::parse(&input[span.clone()], span))
            .collect()
    }

    /// Whether the exact token text has a cached resolution
    pub fn is_cached(&self, token: &str) -> bool {
        self.cache.contains_key(token)
    }

    /// Return a copy of `input` with every resolvable token replaced
    pub fn parse_string(&mut self, input: &str) -> Result<String, TokenError> {
        let mut output = String::with_capacity(input.len());
        for (segment, span) in Segment::lexer(input).spanned() {
            let text = &input[span.clone()];
            if segment != Ok(Segment::Token) {
                output.push_str(text);
                continue;
            }
            let token = Token::parse(text, span);
            match self.resolve(&token, input)? {
                Some(value) => output.push_str(&value),
                None => output.push_str(text),
            }
        }
        Ok(output)
    }

    /// Resolve every token of `input`, returning the resolved ones
    pub fn resolve_tokens(&mut self, input: &str) -> Result<Vec<TokenInstance>, TokenError> {
        let mut instances = Vec::new();
        for token in Self::tokens(input) {
            if let Some(value) = self.resolve(&token, input)? {
                instances.push(TokenInstance { token, value });
            }
        }
        Ok(instances)
    }

    fn resolve(&mut self, token: &Token, input: &str) -> Result<Option<String>, TokenError> {
        if let Some(value) = self.cache.get(&token.text) {
            return Ok(Some(value.clone()));
        }
        let scope = TokenScope {
            template: &self.template,
            site_url: &self.site_url,
            site_collection_url: &self.site_collection_url,
            entities: &self.entities,
        };
        let resolved = match self.resolvers.get(&token.prefix) {
            Some(resolver) => resolver.resolve(&token.args, &scope).ok_or(UnresolvedReason::NotFound),
            None => Err(UnresolvedReason::UnknownPrefix),
        };
        match resolved {
            Ok(value) => {
                self.cache.insert(token.text.clone(), value.clone());
                Ok(Some(value))
            }
            Err(reason) if self.strict => Err(UnresolvedTokenError {
                token: token.text.clone(),
                prefix: token.prefix.clone(),
                reason,
                input: input.to_string(),
                span: token.span.clone(),
            }
            .into()),
            Err(reason) => {
                tracing::debug!(token = %token.text, ?reason, "token left unresolved");
                Ok(None)
            }
        }
    }
}
