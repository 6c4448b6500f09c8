use crate::token::{is_keyword, HostKind, Token, TokenKind};
use crate::LexError;

/// Scanner mode decides how the next character is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerMode {
    /// Outside `<?php ... ?>`: everything up to the next open tag is inline HTML.
    Html,
    /// Host code.
    Script,
    /// Host code inside a `${ ... }` interpolation, with nested brace depth.
    Interpolation { depth: usize },
    /// Inside a backtick string.
    Template,
}

/// Multi-character operators, longest first.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "**=", "...", "<=>", "===", "!==", "??=", "?->", "==", "!=", "<>", "<=", ">=",
    "&&", "||", "++", "--", "+=", "-=", "*=", "/=", ".=", "%=", "&=", "|=", "^=", "->", "=>",
    "::", "<<", ">>", "??", "**",
];

/// PHP host lexer.
///
/// Splits source into host tokens that cover every byte of the input, so
/// concatenating the token texts gives the source back. Strings, comments
/// and heredocs are single opaque tokens; the scanner never looks inside
/// them except to find where they end.
///
/// Modes form a stack: a backtick string pushes `Template`, a `${` inside it
/// pushes `Interpolation`, and the matching `}` / `` ` `` pop them again.
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    start: usize,
    line: u32,
    tokens: Vec<Token>,
    modes: Vec<ScannerMode>,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner starting in inline HTML mode.
    pub fn new(source: &'a str) -> Self {
        Self::with_mode(source, ScannerMode::Html)
    }

    /// Create a scanner with a specific starting mode.
    pub fn with_mode(source: &'a str, mode: ScannerMode) -> Self {
        Self {
            source,
            pos: 0,
            start: 0,
            line: 1,
            tokens: Vec::new(),
            modes: vec![mode],
        }
    }

    /// Tokenize the entire source into host tokens.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        let mut scanner = Scanner::new(source);
        scanner.scan_tokens()?;
        Ok(scanner.tokens)
    }

    /// Tokenize a source fragment as host code (no open tag needed).
    pub fn tokenize_script(source: &str) -> Result<Vec<Token>, LexError> {
        let mut scanner = Scanner::with_mode(source, ScannerMode::Script);
        scanner.scan_tokens()?;
        Ok(scanner.tokens)
    }

    fn scan_tokens(&mut self) -> Result<(), LexError> {
        while !self.is_at_end() {
            self.start = self.pos;
            match self.mode() {
                ScannerMode::Html => self.scan_inline_html(),
                ScannerMode::Template => self.scan_template_part(),
                ScannerMode::Script | ScannerMode::Interpolation { .. } => self.scan_token()?,
            }
        }
        Ok(())
    }

    fn scan_token(&mut self) -> Result<(), LexError> {
        let ch = self.peek();

        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                while matches!(self.peek(), ' ' | '\t' | '\n' | '\r') && !self.is_at_end() {
                    self.advance();
                }
                self.emit(HostKind::Whitespace);
            }

            '?' if self.peek_next() == '>' && self.mode() == ScannerMode::Script => {
                self.scan_close_tag()
            }

            // Comments and attributes
            '#' if self.peek_next() == '[' => {
                self.advance_by(2);
                self.emit(HostKind::Attribute);
            }
            '#' => self.scan_line_comment(),
            '/' if self.peek_next() == '/' => self.scan_line_comment(),
            '/' if self.peek_next() == '*' => self.scan_block_comment()?,

            '$' if is_label_start(self.peek_next()) => {
                self.advance();
                self.skip_label();
                self.emit(HostKind::Variable);
            }

            // Strings
            '\'' => self.scan_single_quoted(),
            '"' => self.scan_double_quoted(),
            '`' => {
                self.advance();
                self.emit(HostKind::Backtick);
                self.modes.push(ScannerMode::Template);
            }
            '<' if self.rest().starts_with("<<<") && self.heredoc_label().is_some() => {
                self.scan_heredoc()?
            }

            // Names
            '\\' if is_label_start(self.peek_next()) => {
                self.advance();
                self.scan_name();
                self.emit(HostKind::FullyQualifiedName);
            }
            '\\' => {
                self.advance();
                self.emit(HostKind::NsSeparator);
            }
            c if is_label_start(c) => {
                let qualified = self.scan_name();
                let kind = if qualified {
                    HostKind::QualifiedName
                } else if is_keyword(&self.source[self.start..self.pos]) {
                    HostKind::Keyword
                } else {
                    HostKind::Identifier
                };
                self.emit(kind);
            }

            // Numbers
            '0'..='9' => self.scan_number(),
            '.' if self.peek_next().is_ascii_digit() => self.scan_number(),

            // Braces track interpolation depth
            '{' => {
                if let Some(ScannerMode::Interpolation { depth }) = self.modes.last_mut() {
                    *depth += 1;
                }
                self.advance();
                self.emit(HostKind::OpenCurly);
            }
            '}' => {
                match self.modes.last_mut() {
                    Some(ScannerMode::Interpolation { depth: 0 }) => {
                        self.modes.pop();
                    }
                    Some(ScannerMode::Interpolation { depth }) => *depth -= 1,
                    _ => {}
                }
                self.advance();
                self.emit(HostKind::CloseCurly);
            }

            c if c.is_control() => {
                return Err(self.error(format!("Unexpected character U+{:04X}", c as u32)));
            }

            _ => self.scan_operator(),
        }
        Ok(())
    }

    // --- Modes ---

    fn scan_inline_html(&mut self) {
        if let Some((kind, len)) = self.open_tag() {
            self.advance_by(len);
            self.emit(kind);
            self.set_mode(ScannerMode::Script);
            return;
        }
        while !self.is_at_end() && self.open_tag().is_none() {
            self.advance();
        }
        self.emit(HostKind::InlineHtml);
    }

    /// Recognize `<?php` (plus one whitespace character) or `<?=` at the cursor.
    fn open_tag(&self) -> Option<(HostKind, usize)> {
        let rest = self.rest();
        if rest.starts_with("<?=") {
            return Some((HostKind::OpenTagWithEcho, 3));
        }
        let head = rest.get(..5)?;
        if !head.eq_ignore_ascii_case("<?php") {
            return None;
        }
        match &rest[5..] {
            "" => Some((HostKind::OpenTag, 5)),
            tail if tail.starts_with("\r\n") => Some((HostKind::OpenTag, 7)),
            tail if tail.starts_with([' ', '\t', '\n', '\r']) => Some((HostKind::OpenTag, 6)),
            _ => None,
        }
    }

    /// `?>` swallows a single directly following line break.
    fn scan_close_tag(&mut self) {
        self.advance_by(2);
        if self.rest().starts_with("\r\n") {
            self.advance_by(2);
        } else if self.peek() == '\n' {
            self.advance();
        }
        self.emit(HostKind::CloseTag);
        self.set_mode(ScannerMode::Html);
    }

    fn scan_template_part(&mut self) {
        if self.peek() == '`' {
            self.advance();
            self.emit(HostKind::Backtick);
            self.modes.pop();
            return;
        }
        if self.rest().starts_with("${") {
            self.advance_by(2);
            self.emit(HostKind::DollarOpenCurlyBraces);
            self.modes.push(ScannerMode::Interpolation { depth: 0 });
            return;
        }
        while !self.is_at_end() && self.peek() != '`' && !self.rest().starts_with("${") {
            if self.peek() == '\\' {
                self.advance();
            }
            self.advance();
        }
        self.emit(HostKind::TemplateText);
    }

    // --- Scanners ---

    /// `//` and `#` comments end before a line break or `?>`.
    fn scan_line_comment(&mut self) {
        while !self.is_at_end()
            && !matches!(self.peek(), '\n' | '\r')
            && !self.rest().starts_with("?>")
        {
            self.advance();
        }
        self.emit(HostKind::Comment);
    }

    fn scan_block_comment(&mut self) -> Result<(), LexError> {
        let start_line = self.line;
        self.advance_by(2);
        let doc = self.peek() == '*' && matches!(self.peek_next(), ' ' | '\t' | '\n' | '\r');

        match self.rest().find("*/") {
            Some(end) => {
                self.advance_by(end + 2);
                self.emit(if doc {
                    HostKind::DocComment
                } else {
                    HostKind::Comment
                });
                Ok(())
            }
            None => Err(LexError::MalformedSource {
                message: "Unterminated comment".into(),
                line: start_line,
            }),
        }
    }

    /// A `'` string that never closes becomes one token running to the end of
    /// input; the tokenizer decides whether that is an error.
    fn scan_single_quoted(&mut self) {
        self.advance();
        while !self.is_at_end() {
            match self.peek() {
                '\\' => self.advance_by(2),
                '\'' => {
                    self.advance();
                    self.emit(HostKind::ConstantString);
                    return;
                }
                _ => self.advance(),
            }
        }
        self.emit(HostKind::UnterminatedString);
    }

    /// A `"` that never closes is emitted on its own so stray quotes in
    /// markup text survive.
    fn scan_double_quoted(&mut self) {
        self.advance();
        while !self.is_at_end() {
            match self.peek() {
                '\\' => self.advance_by(2),
                '"' => {
                    self.advance();
                    self.emit(HostKind::ConstantString);
                    return;
                }
                _ => self.advance(),
            }
        }
        self.pos = self.start + 1;
        self.emit(HostKind::DoubleQuote);
    }

    /// Parse `<<<[ \t]*("|')?LABEL\1` followed by a line break. Returns the
    /// label and the byte length of the opener including the line break.
    fn heredoc_label(&self) -> Option<(&'a str, usize)> {
        let rest = &self.source[self.pos..];
        let bytes = rest.as_bytes();
        let mut i = 3;
        while matches!(bytes.get(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        let quote = match bytes.get(i) {
            Some(q @ (b'\'' | b'"')) => {
                i += 1;
                Some(*q)
            }
            _ => None,
        };
        let label_start = i;
        if !rest[i..].starts_with(is_label_start) {
            return None;
        }
        while rest[i..].starts_with(is_label_char) {
            i += rest[i..].chars().next().map_or(1, char::len_utf8);
        }
        let label = &rest[label_start..i];
        if let Some(q) = quote {
            if bytes.get(i) != Some(&q) {
                return None;
            }
            i += 1;
        }
        if rest[i..].starts_with("\r\n") {
            Some((label, i + 2))
        } else if rest[i..].starts_with('\n') {
            Some((label, i + 1))
        } else {
            None
        }
    }

    fn scan_heredoc(&mut self) -> Result<(), LexError> {
        let start_line = self.line;
        let Some((label, opener_len)) = self.heredoc_label() else {
            return Err(self.error("Invalid heredoc opener".into()));
        };
        self.advance_by(opener_len);

        loop {
            let line_start = self.pos;
            let indented = self.rest().trim_start_matches([' ', '\t']);
            let indent = self.rest().len() - indented.len();
            if let Some(after) = indented.strip_prefix(label) {
                if !after.starts_with(is_label_char) {
                    self.pos = line_start + indent + label.len();
                    self.emit(HostKind::Heredoc);
                    return Ok(());
                }
            }
            match self.rest().find('\n') {
                Some(newline) => self.advance_by(newline + 1),
                None => {
                    return Err(LexError::MalformedSource {
                        message: format!("Unterminated heredoc `{label}`"),
                        line: start_line,
                    })
                }
            }
        }
    }

    /// Scan a label with any `\Label` continuations. Returns whether the name
    /// was qualified.
    fn scan_name(&mut self) -> bool {
        self.skip_label();
        let mut qualified = false;
        while self.peek() == '\\' && is_label_start(self.peek_next()) {
            self.advance();
            self.skip_label();
            qualified = true;
        }
        qualified
    }

    fn skip_label(&mut self) {
        while !self.is_at_end() && is_label_char(self.peek()) {
            self.advance();
        }
    }

    fn scan_number(&mut self) {
        let radix = if self.peek() == '0' {
            match self.peek_next() {
                'x' | 'X' => Some(16),
                'b' | 'B' => Some(2),
                'o' | 'O' => Some(8),
                _ => None,
            }
        } else {
            None
        };

        if let Some(radix) = radix {
            self.advance_by(2);
            while self.peek().is_digit(radix) || self.peek() == '_' {
                self.advance();
            }
            self.emit(HostKind::LNumber);
            return;
        }

        let mut float = false;
        self.skip_digits();
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            float = true;
            self.advance();
            self.skip_digits();
        }
        if matches!(self.peek(), 'e' | 'E') {
            let mut chars = self.rest().chars().skip(1);
            let exponent = match chars.next() {
                Some('+' | '-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent {
                float = true;
                self.advance();
                if matches!(self.peek(), '+' | '-') {
                    self.advance();
                }
                self.skip_digits();
            }
        }
        self.emit(if float {
            HostKind::DNumber
        } else {
            HostKind::LNumber
        });
    }

    fn skip_digits(&mut self) {
        while self.peek().is_ascii_digit() || self.peek() == '_' {
            self.advance();
        }
    }

    fn scan_operator(&mut self) {
        let rest = self.rest();
        if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            let kind = if matches!(*op, "!=" | "<>") {
                HostKind::IsNotEqual
            } else {
                HostKind::Operator
            };
            self.advance_by(op.len());
            self.emit(kind);
            return;
        }

        let ch = self.peek();
        self.advance();
        self.emit(match ch {
            '(' => HostKind::OpenParen,
            ')' => HostKind::CloseParen,
            '[' => HostKind::OpenBracket,
            ']' => HostKind::CloseBracket,
            '<' => HostKind::Less,
            '>' => HostKind::Greater,
            '/' => HostKind::Slash,
            '=' => HostKind::Equals,
            ':' => HostKind::Colon,
            '-' => HostKind::Minus,
            _ => HostKind::Char,
        });
    }

    // --- Helpers ---

    fn mode(&self) -> ScannerMode {
        self.modes.last().copied().unwrap_or(ScannerMode::Script)
    }

    fn set_mode(&mut self, mode: ScannerMode) {
        self.modes.clear();
        self.modes.push(mode);
    }

    /// Push the text between `start` and the cursor as one token.
    fn emit(&mut self, kind: HostKind) {
        let text = &self.source[self.start..self.pos];
        let line = self.line;
        self.line += text.matches('\n').count() as u32;
        self.tokens
            .push(Token::new(TokenKind::Host(kind), text, line, self.start as u32));
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> char {
        self.rest().chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.rest().chars().nth(1).unwrap_or('\0')
    }

    fn advance(&mut self) {
        if let Some(c) = self.rest().chars().next() {
            self.pos += c.len_utf8();
        }
    }

    fn advance_by(&mut self, count: usize) {
        let target = (self.pos + count).min(self.source.len());
        while self.pos < target {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn error(&self, message: String) -> LexError {
        LexError::MalformedSource {
            message,
            line: self.line + self.source[self.start..self.pos].matches('\n').count() as u32,
        }
    }
}

fn is_label_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii()
}
