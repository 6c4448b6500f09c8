//! Abstract Syntax Tree for PHPX.
//!
//! Every node keeps the tokens it was built from so the generator can
//! reproduce host code byte for byte. Host code that is not PHPX stays a
//! flat run of tokens inside [`Block`]s and [`Expression`]s.

use phpx_lexer::Token;

/// A parsed node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum Node {
    /// A bracketed region: `{...}`, `${...}`, `(...)` or `[...]`.
    Block(Block),

    /// A single host token outside any PHPX construct.
    Expression(Expression),

    /// A backtick string with `${...}` interpolations.
    TemplateLiteral(TemplateLiteral),

    /// `<name ...>...</name>` or `<name ... />`.
    Element(Element),

    /// `<>...</>`
    Fragment(Fragment),

    Attribute(Attribute),

    /// `{...}` among element children.
    ExpressionContainer(ExpressionContainer),

    /// A run of markup text tokens.
    Text(Text),

    /// `{/* ... */}` among element children.
    Comment(Comment),
}

impl Node {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Block(_) => "Block",
            Node::Expression(_) => "Expression",
            Node::TemplateLiteral(_) => "TemplateLiteral",
            Node::Element(_) => "Element",
            Node::Fragment(_) => "Fragment",
            Node::Attribute(_) => "Attribute",
            Node::ExpressionContainer(_) => "ExpressionContainer",
            Node::Text(_) => "Text",
            Node::Comment(_) => "Comment",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Block {
    pub opening: Token,
    pub children: Vec<BlockChild>,
    pub closing: Token,
}

/// Blocks hold host tokens with PHPX nodes mixed in.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BlockChild {
    Token(Token),
    Node(Node),
}

impl BlockChild {
    pub fn is_whitespace(&self) -> bool {
        matches!(self, BlockChild::Token(t) if t.is_whitespace())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Expression {
    pub value: Token,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TemplateLiteral {
    pub opening: Token,
    pub children: Vec<TemplatePart>,
    pub closing: Token,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TemplatePart {
    /// Literal text between interpolations.
    Token(Token),
    /// A `${...}` interpolation.
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Element {
    pub name: Token,
    pub self_closing: bool,
    pub attributes: Vec<AttributeItem>,
    /// `None` for self-closing elements.
    pub children: Option<Vec<Node>>,
}

/// One entry of an element's attribute list, in source order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AttributeItem {
    /// Whitespace between attributes.
    Token(Token),
    Attribute(Attribute),
    /// `{...$props}` or a punned `{$name}`.
    Spread(Block),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Fragment {
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Attribute {
    /// Name tokens, e.g. `data`, `-`, `foo` for `data-foo`.
    pub name: Vec<Token>,
    pub assignment: Option<Token>,
    pub value: AttributeValue,
}

impl Attribute {
    /// The attribute name as written.
    pub fn name_text(&self) -> String {
        self.name.iter().map(|t| t.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AttributeValue {
    /// A quoted string.
    Literal(Token),
    /// `{expr}`
    Expression(Block),
    /// A bare attribute such as `disabled`.
    True,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExpressionContainer {
    pub expression: Block,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Text {
    pub tokens: Vec<Token>,
}

impl Text {
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Comment {
    pub comment: Token,
}
