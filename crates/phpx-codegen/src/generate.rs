//! PHP generation from the PHPX AST.
//!
//! Host code is written back token by token. Elements and fragments become
//! array literals (or whatever the [`Formatter`] makes of them), text becomes
//! single-quoted strings and `{...}` containers become parenthesized
//! expressions.

use phpx_lexer::{HostKind, Token};
use phpx_parser::ast::{
    Attribute, AttributeItem, AttributeValue, Block, BlockChild, Element, ExpressionContainer,
    Fragment, Node, TemplateLiteral, TemplatePart, Text,
};
use phpx_parser::{Logger, Record};

use crate::formatter::Formatter;
use crate::CodegenError;

/// Separator written after every non-text child of a children array.
const CHILD_SEPARATOR: &str = ", ";

/// Walks nodes and writes PHP.
pub struct Generator<'a> {
    formatter: &'a dyn Formatter,
    logger: Option<&'a dyn Logger>,
}

impl<'a> Generator<'a> {
    pub fn new(formatter: &'a dyn Formatter) -> Self {
        Self {
            formatter,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: &'a dyn Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Generate a whole program.
    pub fn generate(&self, nodes: &[Node]) -> Result<String, CodegenError> {
        self.trace("generate", None);
        let mut out = String::new();
        for node in nodes {
            out.push_str(&self.generate_node(node)?);
        }
        Ok(out)
    }

    fn generate_node(&self, node: &Node) -> Result<String, CodegenError> {
        match node {
            Node::Block(block) => self.generate_block(block, None, None),
            Node::Expression(expression) => Ok(expression.value.text.clone()),
            Node::TemplateLiteral(literal) => self.generate_template_literal(literal),
            Node::Element(element) => self.generate_element(element),
            Node::Fragment(fragment) => self.generate_fragment(fragment),
            Node::ExpressionContainer(container) => {
                self.generate_expression_container(container)
            }
            Node::Attribute(attribute) => self.generate_attribute(attribute),
            Node::Text(_) | Node::Comment(_) => Err(unknown(node, "program")),
        }
    }

    // =========================================================================
    // Host code
    // =========================================================================

    /// `opening`/`closing` replace the block's own delimiters when given.
    fn generate_block(
        &self,
        block: &Block,
        opening: Option<&str>,
        closing: Option<&str>,
    ) -> Result<String, CodegenError> {
        self.trace("generate_block", Some(&block.opening));

        let mut out = String::from(opening.unwrap_or(&block.opening.text));
        for child in &block.children {
            match child {
                BlockChild::Token(token) => out.push_str(&token.text),
                BlockChild::Node(node) => out.push_str(&self.generate_block_node(node)?),
            }
        }
        out.push_str(closing.unwrap_or(&block.closing.text));
        Ok(out)
    }

    fn generate_block_node(&self, node: &Node) -> Result<String, CodegenError> {
        match node {
            Node::Block(block) => self.generate_block(block, None, None),
            Node::Element(element) => self.generate_element(element),
            Node::Fragment(fragment) => self.generate_fragment(fragment),
            Node::ExpressionContainer(container) => {
                self.generate_expression_container(container)
            }
            Node::TemplateLiteral(literal) => self.generate_template_literal(literal),
            _ => Err(unknown(node, "block")),
        }
    }

    fn generate_template_literal(&self, literal: &TemplateLiteral) -> Result<String, CodegenError> {
        self.trace("generate_template_literal", Some(&literal.opening));

        let mut parts = Vec::new();
        let mut text = String::new();
        for part in &literal.children {
            match part {
                TemplatePart::Token(token) => text.push_str(&token.text),
                TemplatePart::Block(block) => {
                    if !text.is_empty() {
                        parts.push(quote(&unescape_template(&std::mem::take(&mut text))));
                    }
                    parts.push(self.generate_block(block, Some("("), Some(")"))?);
                }
            }
        }
        if !text.is_empty() {
            parts.push(quote(&unescape_template(&text)));
        }

        if parts.is_empty() {
            return Ok("''".to_string());
        }
        Ok(parts.join("."))
    }

    // =========================================================================
    // Markup
    // =========================================================================

    fn generate_element(&self, element: &Element) -> Result<String, CodegenError> {
        self.trace("generate_element", Some(&element.name));

        let attributes = if element.attributes.is_empty() {
            None
        } else {
            Some(self.generate_attributes(&element.attributes)?)
        };
        let children = match &element.children {
            Some(children) if !children.is_empty() => Some(self.generate_children(children)?),
            _ => None,
        };

        Ok(self.formatter.format_element(
            &element.name.text,
            attributes.as_deref(),
            children.as_deref(),
        ))
    }

    fn generate_fragment(&self, fragment: &Fragment) -> Result<String, CodegenError> {
        self.trace("generate_fragment", None);
        let children = self.generate_children(&fragment.children)?;
        Ok(self.formatter.format_fragment(&children))
    }

    /// A children list as a PHP array literal.
    fn generate_children(&self, children: &[Node]) -> Result<String, CodegenError> {
        self.trace("generate_children", None);

        let last = children.len().saturating_sub(1);
        let mut out = String::new();
        for (i, child) in children.iter().enumerate() {
            match child {
                Node::Text(text) => out.push_str(&self.generate_text(text, i == 0, i == last)),
                Node::Comment(comment) => {
                    out.push_str(&comment.comment.text);
                    // The line break that ended the comment stayed inside the braces.
                    if is_line_comment(&comment.comment.text) {
                        out.push('\n');
                    }
                }
                Node::ExpressionContainer(container)
                    if container.expression.children.iter().all(BlockChild::is_whitespace) => {}
                Node::Attribute(_) | Node::Expression(_) => {
                    return Err(unknown(child, "children"));
                }
                node => {
                    out.push_str(&self.generate_block_node(node)?);
                    out.push_str(CHILD_SEPARATOR);
                }
            }
        }

        let out = if out.contains('\n') {
            out.replace(", \n", ",\n").replace(", \r\n", ",\r\n")
        } else {
            out.trim_matches([',', ' ']).to_string()
        };
        Ok(format!("[{out}]"))
    }

    fn generate_text(&self, text: &Text, first: bool, last: bool) -> String {
        self.trace("generate_text", text.tokens.first());

        let raw = text.text();
        if let [token] = text.tokens.as_slice() {
            if token.is_whitespace() && (first || last || raw.contains('\n')) {
                return raw;
            }
        }

        let trimmed = if first {
            raw.trim_start_matches(' ')
        } else if last {
            raw.trim_end_matches(' ')
        } else {
            raw.as_str()
        };
        format!("{}{CHILD_SEPARATOR}", quote(trimmed))
    }

    fn generate_expression_container(
        &self,
        container: &ExpressionContainer,
    ) -> Result<String, CodegenError> {
        self.trace("generate_expression_container", Some(&container.expression.opening));

        let mut code = String::new();
        for child in &container.expression.children {
            match child {
                BlockChild::Token(token) => code.push_str(&token.text),
                BlockChild::Node(node) => code.push_str(&self.generate_block_node(node)?),
            }
        }
        Ok(format!("({code})"))
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    fn generate_attributes(&self, items: &[AttributeItem]) -> Result<String, CodegenError> {
        self.trace("generate_attributes", None);

        let mut out = String::new();
        for item in items {
            match item {
                AttributeItem::Token(token) => out.push_str(&token.text),
                AttributeItem::Attribute(attribute) => {
                    out.push_str(&self.generate_attribute(attribute)?);
                    out.push(',');
                }
                AttributeItem::Spread(block) => {
                    out.push_str(&self.generate_spread(block)?);
                    out.push(',');
                }
            }
        }

        Ok(format!("[{}]", trim_attribute_map(&out)))
    }

    fn generate_attribute(&self, attribute: &Attribute) -> Result<String, CodegenError> {
        self.trace("generate_attribute", attribute.name.first());

        let value = match (&attribute.assignment, &attribute.value) {
            (Some(assignment), _) if assignment.text != "=" => {
                return Err(CodegenError::UnknownAssignment {
                    text: assignment.text.clone(),
                });
            }
            (_, AttributeValue::Literal(token)) => token.text.clone(),
            (_, AttributeValue::Expression(block)) => {
                self.generate_block(block, Some("("), Some(")"))?
            }
            (_, AttributeValue::True) => "true".to_string(),
        };

        Ok(self
            .formatter
            .format_attribute(&attribute.name_text(), &value))
    }

    /// `{$name}` puns into `'name'=>$name`; anything else is spliced in
    /// without its braces.
    fn generate_spread(&self, block: &Block) -> Result<String, CodegenError> {
        self.trace("generate_spread", Some(&block.opening));

        let significant: Vec<&BlockChild> = block
            .children
            .iter()
            .filter(|child| !child.is_whitespace())
            .collect();

        match significant.as_slice() {
            [BlockChild::Token(token)] if token.is(HostKind::Variable) => {
                let name = token.text.trim_start_matches('$').to_lowercase();
                Ok(self.formatter.format_attribute(&name, &token.text))
            }
            [BlockChild::Token(token)] => Err(CodegenError::UnsupportedAttributeExpression {
                text: token.text.clone(),
            }),
            [BlockChild::Node(node)] => Err(CodegenError::UnsupportedAttributeExpression {
                text: node.kind_name().to_string(),
            }),
            _ => self.generate_block(block, Some(""), Some("")),
        }
    }

    fn trace(&self, rule: &'static str, token: Option<&Token>) {
        if let Some(logger) = self.logger {
            logger.debug(&Record {
                rule,
                index: None,
                line: token.map(|t| t.line),
                text: token.map(|t| t.text.as_str()),
            });
        }
    }
}

fn unknown(node: &Node, context: &'static str) -> CodegenError {
    CodegenError::UnknownNodeKind {
        kind: node.kind_name(),
        context,
    }
}

/// `//` and `#` comments run to the end of the line.
fn is_line_comment(text: &str) -> bool {
    text.starts_with("//") || text.starts_with('#')
}

/// One-line maps lose surrounding commas and spaces. Multi-line maps keep a
/// blank last line so the closing bracket stays on its own line.
fn trim_attribute_map(map: &str) -> &str {
    if !map.contains('\n') {
        return map.trim_matches([' ', ',']);
    }

    let map = map.trim_start_matches(' ');
    let last_line = map.rsplit('\n').next().unwrap_or_default();
    if last_line.trim().is_empty() {
        map
    } else {
        map.trim_end_matches([' ', ','])
    }
}

/// A single-quoted PHP string.
fn quote(text: &str) -> String {
    format!("'{}'", escape_quotes(text))
}

/// Escape `'` for a single-quoted string. Sequences that are already escaped
/// (`\'`, `\\`) are kept, and a trailing backslash is doubled so it cannot
/// escape the closing quote.
fn escape_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&next @ ('\'' | '\\')) => {
                    out.push('\\');
                    out.push(next);
                    chars.next();
                }
                Some(_) => out.push('\\'),
                None => out.push_str("\\\\"),
            },
            '\'' => out.push_str("\\'"),
            c => out.push(c),
        }
    }
    out
}

fn unescape_template(text: &str) -> String {
    text.replace("\\`", "`").replace("\\$", "$")
}
