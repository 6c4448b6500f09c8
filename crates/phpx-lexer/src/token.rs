use std::fmt;

/// Lexical categories of the PHP host language.
///
/// Only the distinctions the PHPX pipeline acts on get their own variant.
/// Everything else that PHP would split further (individual keywords,
/// assignment operators, casts) is grouped, since the text is kept on the
/// token and host code is passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum HostKind {
    // Modes
    InlineHtml,
    OpenTag,
    OpenTagWithEcho,
    CloseTag,

    // Trivia
    Whitespace,
    Comment,
    DocComment,

    // Names
    Variable,
    Identifier,
    Keyword,
    QualifiedName,
    FullyQualifiedName,
    NsSeparator,

    // Literals
    LNumber,
    DNumber,
    ConstantString,
    Heredoc,
    /// A `'` string that runs to the end of input.
    UnterminatedString,
    /// A `"` with no closing quote.
    DoubleQuote,

    // Backtick strings
    Backtick,
    TemplateText,
    DollarOpenCurlyBraces,

    // Delimiters
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    /// `#[`
    Attribute,

    // Punctuation the grammar inspects
    Less,
    Greater,
    Slash,
    Equals,
    Colon,
    Minus,

    /// `!=` or `<>`
    IsNotEqual,
    /// Any other multi-character operator.
    Operator,
    /// Any other single character.
    Char,
}

/// Token classification seen by the PHPX parser.
///
/// Host tokens keep the host lexer's classification; the extension adds a
/// few synthetic kinds on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TokenKind {
    Host(HostKind),
    /// `<>`
    FragmentOpen,
    /// `<` immediately followed by an element name.
    ElementOpen,
    /// `` ` ``
    TemplateDelimiter,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Host(kind) => kind.name(),
            TokenKind::FragmentOpen => "FRAGMENT_OPEN",
            TokenKind::ElementOpen => "ELEMENT_OPEN",
            TokenKind::TemplateDelimiter => "TEMPLATE_DELIMITER",
        }
    }
}

impl HostKind {
    pub fn name(self) -> &'static str {
        match self {
            HostKind::InlineHtml => "T_INLINE_HTML",
            HostKind::OpenTag => "T_OPEN_TAG",
            HostKind::OpenTagWithEcho => "T_OPEN_TAG_WITH_ECHO",
            HostKind::CloseTag => "T_CLOSE_TAG",
            HostKind::Whitespace => "T_WHITESPACE",
            HostKind::Comment => "T_COMMENT",
            HostKind::DocComment => "T_DOC_COMMENT",
            HostKind::Variable => "T_VARIABLE",
            HostKind::Identifier => "T_STRING",
            HostKind::Keyword => "T_KEYWORD",
            HostKind::QualifiedName => "T_NAME_QUALIFIED",
            HostKind::FullyQualifiedName => "T_NAME_FULLY_QUALIFIED",
            HostKind::NsSeparator => "T_NS_SEPARATOR",
            HostKind::LNumber => "T_LNUMBER",
            HostKind::DNumber => "T_DNUMBER",
            HostKind::ConstantString => "T_CONSTANT_ENCAPSED_STRING",
            HostKind::Heredoc => "T_HEREDOC",
            HostKind::UnterminatedString => "T_ENCAPSED_AND_WHITESPACE",
            HostKind::DoubleQuote => "\"",
            HostKind::Backtick => "`",
            HostKind::TemplateText => "T_ENCAPSED_AND_WHITESPACE",
            HostKind::DollarOpenCurlyBraces => "T_DOLLAR_OPEN_CURLY_BRACES",
            HostKind::OpenCurly => "{",
            HostKind::CloseCurly => "}",
            HostKind::OpenParen => "(",
            HostKind::CloseParen => ")",
            HostKind::OpenBracket => "[",
            HostKind::CloseBracket => "]",
            HostKind::Attribute => "T_ATTRIBUTE",
            HostKind::Less => "<",
            HostKind::Greater => ">",
            HostKind::Slash => "/",
            HostKind::Equals => "=",
            HostKind::Colon => ":",
            HostKind::Minus => "-",
            HostKind::IsNotEqual => "T_IS_NOT_EQUAL",
            HostKind::Operator => "T_OPERATOR",
            HostKind::Char => "T_CHAR",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A token produced by the PHPX tokenizer.
///
/// `offset` is a byte offset into the text handed to [`crate::tokenize`];
/// `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub offset: u32,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: u32, offset: u32) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            offset,
        }
    }

    pub fn host(kind: HostKind, text: impl Into<String>, line: u32, offset: u32) -> Self {
        Self::new(TokenKind::Host(kind), text, line, offset)
    }

    /// Byte offset one past the last byte of the token.
    pub fn end(&self) -> u32 {
        self.offset + self.text.len() as u32
    }

    pub fn is(&self, kind: HostKind) -> bool {
        self.kind == TokenKind::Host(kind)
    }

    /// Identifiers and reserved words both count as words (element and
    /// attribute names may be either).
    pub fn is_word(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Host(HostKind::Identifier) | TokenKind::Host(HostKind::Keyword)
        )
    }

    pub fn is_whitespace(&self) -> bool {
        self.is(HostKind::Whitespace)
    }

    /// Whitespace spanning at least one line break.
    pub fn is_line_break(&self) -> bool {
        self.is_whitespace() && self.text.contains('\n')
    }

    pub(crate) fn shifted(mut self, offset: u32, lines: u32) -> Self {
        self.offset += offset;
        self.line += lines;
        self
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "L{}:P{}-{}:{}:{}",
            self.line,
            self.offset,
            self.end(),
            self.text,
            self.kind
        )
    }
}

/// Words the PHP lexer reserves (matched case-insensitively).
pub const KEYWORDS: &[&str] = &[
    "abstract", "and", "array", "as", "break", "callable", "case", "catch", "class", "clone",
    "const", "continue", "declare", "default", "die", "do", "echo", "else", "elseif", "empty",
    "enddeclare", "endfor", "endforeach", "endif", "endswitch", "endwhile", "eval", "exit",
    "extends", "final", "finally", "fn", "for", "foreach", "function", "global", "goto", "if",
    "implements", "include", "include_once", "instanceof", "insteadof", "interface", "isset",
    "list", "match", "namespace", "new", "or", "print", "private", "protected", "public",
    "readonly", "require", "require_once", "return", "static", "switch", "throw", "trait", "try",
    "unset", "use", "var", "while", "xor", "yield", "__class__", "__dir__", "__file__",
    "__function__", "__line__", "__method__", "__namespace__", "__trait__",
];

/// Check if a word is reserved by the host language.
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}
