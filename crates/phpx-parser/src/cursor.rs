//! Token cursor with pattern matching.
//!
//! The cursor owns the token stream for one parse. Besides moving forward it
//! can rewind by a step and splice replacement tokens in at its position,
//! which the text rule uses to re-lex comments that swallowed markup.

use phpx_lexer::{HostKind, Token, TokenKind};

/// Something a token (or a run of tokens) can be matched against.
#[derive(Debug, Clone, Copy)]
pub enum Pattern<'p> {
    /// Exact token text.
    Text(&'p str),
    /// Exact token kind.
    Kind(TokenKind),
    /// Any token passing the predicate.
    Test(fn(&Token) -> bool),
    /// Consecutive tokens, each matching the pattern at the same position.
    Seq(&'p [Pattern<'p>]),
}

impl Pattern<'_> {
    pub const fn host(kind: HostKind) -> Pattern<'static> {
        Pattern::Kind(TokenKind::Host(kind))
    }
}

/// `</>`
pub const FRAGMENT_CLOSE: Pattern<'static> = Pattern::Seq(&[
    Pattern::Text("<"),
    Pattern::Text("/"),
    Pattern::Text(">"),
]);

/// `</name>`
pub const ELEMENT_CLOSE: Pattern<'static> = Pattern::Seq(&[
    Pattern::Text("<"),
    Pattern::Text("/"),
    Pattern::Test(Token::is_word),
    Pattern::Text(">"),
]);

/// `/>`
pub const SELF_CLOSE: Pattern<'static> = Pattern::Seq(&[Pattern::Text("/"), Pattern::Text(">")]);

/// `<?` as seen when an open tag appears where code is expected.
pub const PHP_OPEN: Pattern<'static> = Pattern::Seq(&[Pattern::Text("<"), Pattern::Text("?")]);

/// Owned token sequence plus a position.
///
/// Reads past either end return `None`; the position is clamped to
/// `0..=len`.
#[derive(Debug, Clone, Default)]
pub struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenCursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// The token under the cursor.
    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// The token `offset` steps away from the cursor.
    pub fn peek(&self, offset: isize) -> Option<&Token> {
        let index = self.pos.checked_add_signed(offset)?;
        self.tokens.get(index)
    }

    /// Return the token under the cursor and step past it.
    pub fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub fn matches(&self, pattern: &Pattern<'_>) -> bool {
        self.match_len(self.pos, pattern).is_some()
    }

    /// Like [`TokenCursor::matches`], but starting `offset` steps away.
    pub fn matches_at(&self, offset: isize, pattern: &Pattern<'_>) -> bool {
        self.pos
            .checked_add_signed(offset)
            .and_then(|index| self.match_len(index, pattern))
            .is_some()
    }

    fn match_len(&self, index: usize, pattern: &Pattern<'_>) -> Option<usize> {
        match pattern {
            Pattern::Seq(parts) => parts.iter().try_fold(0, |len, part| {
                self.match_len(index + len, part).map(|n| len + n)
            }),
            Pattern::Text(text) => (self.tokens.get(index)?.text == *text).then_some(1),
            Pattern::Kind(kind) => (self.tokens.get(index)?.kind == *kind).then_some(1),
            Pattern::Test(test) => test(self.tokens.get(index)?).then_some(1),
        }
    }

    pub fn move_by(&mut self, offset: isize) {
        self.pos = self
            .pos
            .saturating_add_signed(offset)
            .min(self.tokens.len());
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn index(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Replace the token under the cursor with `tokens`. The cursor stays on
    /// the first replacement token.
    pub fn splice_at_cursor(&mut self, tokens: Vec<Token>) {
        let end = (self.pos + 1).min(self.tokens.len());
        self.tokens.splice(self.pos..end, tokens);
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The text the tokens were lexed from.
    pub fn source_text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}
