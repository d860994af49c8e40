//! Splits template strings into literal text and `{prefix:args}` tokens

use logos::Logos;

use crate::error::Span;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment {
    /// `{prefix}` or `{prefix:arg1,arg2}`; arguments never contain braces
    #[regex(r"\{[A-Za-z][A-Za-z0-9_\-]*(:[^{}]*)?\}")]
    Token,

    #[regex(r"[^{]+")]
    Text,

    /// A brace that does not open a token
    #[token("{")]
    OpenBrace,
}

/// Byte spans of every token in `input`, left to right
pub(crate) fn token_spans(input: &str) -> impl Iterator<Item = Span> + '_ {
    Segment::lexer(input)
        .spanned()
        .filter_map(|(segment, span)| matches!(segment, Ok(Segment::Token)).then_some(span))
}
