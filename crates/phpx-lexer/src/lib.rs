//! PHPX Lexer
//!
//! Tokenizes PHPX source (PHP with embedded markup) into a flat stream of
//! tokens. A PHP host lexer ([`Scanner`]) does the classification; this
//! module layers the PHPX rules on top: sources without an open tag are
//! read as code, `<>` / `<name` / `` ` `` are re-tagged for the parser, and
//! unterminated single quotes in markup are rejected early.
//!
//! # Example
//!
//! ```
//! use phpx_lexer::{tokenize, TokenKind};
//!
//! let tokens = tokenize("<>Hi</>").unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::FragmentOpen);
//! ```

pub mod scanner;
pub mod token;

pub use scanner::{Scanner, ScannerMode};
pub use token::{is_keyword, HostKind, Token, TokenKind};

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Malformed source at line {line}: {message}")]
    MalformedSource { message: String, line: u32 },

    #[error(
        "Unescaped single quote found at line {line}:\n{snippet}\n\
         Use &apos; for HTML5 or &#39; for HTML4 to escape quotes in markup"
    )]
    UnescapedQuote {
        line: u32,
        offset: u32,
        snippet: String,
    },
}

impl LexError {
    pub fn line(&self) -> u32 {
        match self {
            LexError::MalformedSource { line, .. } | LexError::UnescapedQuote { line, .. } => *line,
        }
    }

    /// Rebuild the source excerpt of an [`LexError::UnescapedQuote`]: the
    /// offending line followed by a caret under the quote. `source` must be
    /// the text the error offset points into.
    pub fn annotate(self, source: &str) -> Self {
        match self {
            LexError::UnescapedQuote { line, offset, .. } => LexError::UnescapedQuote {
                line,
                offset,
                snippet: quote_snippet(source, offset as usize),
            },
            other => other,
        }
    }

    fn shifted(self, offset: u32, lines: u32) -> Self {
        match self {
            LexError::MalformedSource { message, line } => LexError::MalformedSource {
                message,
                line: line + lines,
            },
            LexError::UnescapedQuote {
                line,
                offset: at,
                snippet,
            } => LexError::UnescapedQuote {
                line: line + lines,
                offset: at + offset,
                snippet,
            },
        }
    }
}

/// The open tag the tokenizer looks for (and pretends exists when missing).
pub const OPEN_TAG: &str = "<?php";

/// Tokenize a PHPX source.
///
/// A source that starts (after optional whitespace) with `<?php` is lexed as
/// a normal PHP file. Any other source is lexed as if `<?php ` had been
/// prepended, with offsets still relative to `source`. Mixing the two, a
/// source that has an open tag but not at the start, is rejected.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    if !starts_with_open_tag(source) {
        if let Some(at) = source.find(OPEN_TAG) {
            return Err(LexError::MalformedSource {
                message: format!("have a {OPEN_TAG} tag at the beginning or not at all"),
                line: line_at(source, at),
            });
        }
    }
    lex(source).map_err(|e| e.annotate(source))
}

/// Tokenize a fragment of a larger source as host code.
///
/// Token offsets and lines are shifted so they point into the larger source:
/// the fragment is assumed to start at byte `base_offset` on line
/// `base_line`.
pub fn offset_tokenize(
    source: &str,
    base_offset: u32,
    base_line: u32,
) -> Result<Vec<Token>, LexError> {
    let lines = base_line.saturating_sub(1);
    lex_code(source)
        .map(|tokens| shift(tokens, base_offset, lines))
        .map_err(|e| e.annotate(source).shifted(base_offset, lines))
}

fn starts_with_open_tag(source: &str) -> bool {
    source
        .trim_start()
        .get(..OPEN_TAG.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(OPEN_TAG))
}

fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    if starts_with_open_tag(source) {
        retag(Scanner::tokenize(source)?, source)
    } else {
        lex_code(source)
    }
}

/// Lex `source` as code, positions relative to `source` itself.
fn lex_code(source: &str) -> Result<Vec<Token>, LexError> {
    retag(Scanner::tokenize_script(source)?, source)
}

fn shift(tokens: Vec<Token>, offset: u32, lines: u32) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|t| t.shifted(offset, lines))
        .collect()
}

/// Apply the PHPX re-tagging rules to host tokens.
fn retag(tokens: Vec<Token>, source: &str) -> Result<Vec<Token>, LexError> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());

    for (i, token) in tokens.iter().enumerate() {
        let kind = match token.kind {
            TokenKind::Host(HostKind::IsNotEqual) if token.text == "<>" => TokenKind::FragmentOpen,
            TokenKind::Host(HostKind::Backtick) => TokenKind::TemplateDelimiter,
            TokenKind::Host(HostKind::Less) if tokens.get(i + 1).is_some_and(Token::is_word) => {
                TokenKind::ElementOpen
            }
            TokenKind::Host(HostKind::UnterminatedString) => {
                let escaped = out.last().is_some_and(|t| t.is(HostKind::NsSeparator));
                if !escaped {
                    return Err(LexError::UnescapedQuote {
                        line: token.line,
                        offset: token.offset,
                        snippet: String::new(),
                    });
                }
                // `\'` in markup is a literal quote; lex what follows it again.
                let backslash = out.pop();
                let line = backslash.as_ref().map_or(token.line, |t| t.line);
                let offset = backslash.as_ref().map_or(token.offset, |t| t.offset);
                out.push(Token::host(HostKind::Identifier, "\\'", line, offset));

                let rest_start = token.offset as usize + 1;
                let lines = token.line - 1;
                let rest = lex_code(&source[rest_start..])
                    .map_err(|e| e.shifted(rest_start as u32, lines))?;
                out.extend(shift(rest, rest_start as u32, lines));
                return Ok(out);
            }
            kind => kind,
        };
        out.push(Token {
            kind,
            ..token.clone()
        });
    }

    Ok(out)
}

fn line_at(source: &str, offset: usize) -> u32 {
    source[..offset].matches('\n').count() as u32 + 1
}

fn quote_snippet(source: &str, offset: usize) -> String {
    let offset = offset.min(source.len());
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[offset..]
        .find('\n')
        .map_or(source.len(), |i| offset + i);
    let before = &source[line_start..offset];
    format!(
        "{}\n{}^",
        &source[line_start..line_end],
        "-".repeat(before.chars().count())
    )
}
