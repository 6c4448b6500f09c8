//! PHPX Parser
//!
//! Parses the token stream from `phpx-lexer` into a list of [`Node`]s. Host
//! code is kept as tokens; only PHPX constructs (elements, fragments,
//! template literals) and the brackets around them get structure.

pub mod ast;
pub mod cursor;
pub mod diagnostics;
pub mod parser;

pub use ast::Node;
pub use cursor::{Pattern, TokenCursor};
pub use diagnostics::{Logger, Record, TracingLogger};
pub use parser::{Parser, DEFAULT_MAX_DEPTH};

use phpx_lexer::LexError;

/// Parser error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Parse error at line {line}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unterminated {construct} opened at line {opened_at}")]
    Unterminated {
        construct: &'static str,
        opened_at: u32,
    },

    #[error(
        "Expected closing tag to match opening tag name '{expected}' at line {opened_at}, found '{found}'"
    )]
    ClosingTagMismatch {
        expected: String,
        found: String,
        opened_at: u32,
    },

    #[error(
        "Unexpected token #{index} => `{text}` at line {line}{}",
        .expected.as_ref().map(|e| format!(", expected {e} instead")).unwrap_or_default()
    )]
    UnexpectedToken {
        index: usize,
        text: String,
        line: u32,
        expected: Option<String>,
    },

    #[error("Use `className` instead of `{name}`")]
    ReservedAttribute { name: String },

    #[error("Unescaped PHP comment found at line {line}")]
    UnescapedComment { line: u32 },

    #[error("Unexpected PHP opening tag on line {line}")]
    PhpTagInText { line: u32 },

    #[error("Unexpected PHP closing tag on line {line}")]
    PhpCloseTagInText { line: u32 },

    #[error("nesting deeper than {limit} levels")]
    MaxDepthExceeded { limit: usize },

    #[error(transparent)]
    Lex(#[from] LexError),
}

impl From<LexError> for ParseError {
    fn from(error: LexError) -> Self {
        ParseError {
            line: error.line(),
            kind: ParseErrorKind::Lex(error),
        }
    }
}
