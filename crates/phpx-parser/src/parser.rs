//! Recursive descent parser for PHPX.
//!
//! Host code is passed through as single-token [`Expression`] nodes. Brackets
//! become [`Block`]s so that markup nested inside host expressions (a ternary
//! returning an element, an array of fragments) is found at any depth.
//! Inside markup the grammar switches to elements, attributes and text.

use std::sync::Arc;

use phpx_lexer::{HostKind, Token, TokenKind};

use crate::ast::{
    Attribute, AttributeItem, AttributeValue, Block, BlockChild, Comment, Element, Expression,
    ExpressionContainer, Fragment, Node, TemplateLiteral, TemplatePart, Text,
};
use crate::cursor::{Pattern, TokenCursor, ELEMENT_CLOSE, FRAGMENT_CLOSE, PHP_OPEN, SELF_CLOSE};
use crate::diagnostics::{Logger, Record};
use crate::{ParseError, ParseErrorKind};

/// Nesting limit used when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// PHPX parser.
///
/// Drives one [`TokenCursor`] from start to end and returns the node list.
pub struct Parser {
    cursor: TokenCursor,
    logger: Option<Arc<dyn Logger>>,
    max_depth: usize,
    depth: usize,
}

impl Parser {
    /// Create a new parser over the given cursor.
    pub fn new(cursor: TokenCursor) -> Self {
        Self {
            cursor,
            logger: None,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Limit how deeply blocks, elements, fragments and template literals
    /// may nest.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Tokenize and parse source code.
    pub fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
        let tokens = phpx_lexer::tokenize(source)?;
        Parser::new(TokenCursor::new(tokens)).parse_program()
    }

    pub fn cursor(&self) -> &TokenCursor {
        &self.cursor
    }

    /// Parse every remaining token.
    pub fn parse_program(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();

        while let Some(kind) = self.current_kind() {
            self.trace("parse");
            let node = match kind {
                k if closer_for(k).is_some() => Node::Block(self.parse_block()?),
                TokenKind::FragmentOpen => Node::Fragment(self.parse_fragment()?),
                TokenKind::ElementOpen => Node::Element(self.parse_element()?),
                TokenKind::TemplateDelimiter => {
                    Node::TemplateLiteral(self.parse_template_literal()?)
                }
                _ => match self.cursor.advance() {
                    Some(value) => Node::Expression(Expression { value }),
                    None => break,
                },
            };
            nodes.push(node);
        }

        Ok(nodes)
    }

    // =========================================================================
    // Host code
    // =========================================================================

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.trace("parse_block");
        self.nested(Self::block_body)
    }

    fn block_body(&mut self) -> Result<Block, ParseError> {
        let opening = self.take("block", 0)?;
        let Some(closer) = closer_for(opening.kind) else {
            return Err(self.unexpected(Some("block opener")));
        };

        let mut children = Vec::new();
        loop {
            let Some(kind) = self.current_kind() else {
                return Err(self.unterminated("block", opening.line));
            };
            if kind == TokenKind::Host(closer) {
                break;
            }
            self.trace("parse_block");
            let child = match kind {
                k if closer_for(k).is_some() => BlockChild::Node(Node::Block(self.parse_block()?)),
                TokenKind::FragmentOpen => BlockChild::Node(Node::Fragment(self.parse_fragment()?)),
                TokenKind::ElementOpen => BlockChild::Node(Node::Element(self.parse_element()?)),
                TokenKind::TemplateDelimiter => {
                    BlockChild::Node(Node::TemplateLiteral(self.parse_template_literal()?))
                }
                _ => BlockChild::Token(self.take("block", opening.line)?),
            };
            children.push(child);
        }

        let closing = self.take("block", opening.line)?;
        Ok(Block {
            opening,
            children,
            closing,
        })
    }

    fn parse_template_literal(&mut self) -> Result<TemplateLiteral, ParseError> {
        self.trace("parse_template_literal");
        self.nested(Self::template_literal_body)
    }

    fn template_literal_body(&mut self) -> Result<TemplateLiteral, ParseError> {
        let opening = self.take("template literal", 0)?;
        let mut children = Vec::new();

        loop {
            match self.current_kind() {
                None => return Err(self.unterminated("template literal", opening.line)),
                Some(TokenKind::TemplateDelimiter) => break,
                Some(TokenKind::Host(HostKind::DollarOpenCurlyBraces)) => {
                    children.push(TemplatePart::Block(self.parse_block()?));
                }
                Some(_) => {
                    children.push(TemplatePart::Token(
                        self.take("template literal", opening.line)?,
                    ));
                }
            }
        }

        let closing = self.take("template literal", opening.line)?;
        Ok(TemplateLiteral {
            opening,
            children,
            closing,
        })
    }

    // =========================================================================
    // Markup
    // =========================================================================

    fn parse_fragment(&mut self) -> Result<Fragment, ParseError> {
        self.trace("parse_fragment");
        self.nested(Self::fragment_body)
    }

    fn fragment_body(&mut self) -> Result<Fragment, ParseError> {
        let opening = self.take("fragment", 0)?;
        let children = self.parse_element_children()?;

        if self.cursor.matches(&FRAGMENT_CLOSE) {
            self.cursor.move_by(3);
            Ok(Fragment { children })
        } else if self.cursor.at_end() {
            Err(self.unterminated("fragment", opening.line))
        } else {
            Err(self.unexpected(Some("fragment element closer `</>`")))
        }
    }

    fn parse_element(&mut self) -> Result<Element, ParseError> {
        self.trace("parse_element");
        self.nested(Self::element_body)
    }

    fn element_body(&mut self) -> Result<Element, ParseError> {
        let opening = self.take("element", 0)?;
        let name = self.take("element", opening.line)?;
        let attributes = self.parse_attributes()?;

        if self.cursor.matches(&SELF_CLOSE) {
            self.cursor.move_by(2);
            return Ok(Element {
                name,
                self_closing: true,
                attributes,
                children: None,
            });
        }

        if self.cursor.advance().is_none() {
            return Err(self.unterminated("element", name.line));
        }
        let children = self.parse_element_children()?;

        let closing_name = if self.cursor.matches(&ELEMENT_CLOSE) {
            self.cursor.peek(2).map(|t| t.text.clone())
        } else if self.cursor.matches(&FRAGMENT_CLOSE) {
            Some(String::new())
        } else {
            return Err(self.unterminated("element", name.line));
        };

        match closing_name {
            Some(found) if found == name.text => {
                self.cursor.move_by(4);
                Ok(Element {
                    name,
                    self_closing: false,
                    attributes,
                    children: Some(children),
                })
            }
            found => Err(self.error(ParseErrorKind::ClosingTagMismatch {
                expected: name.text.clone(),
                found: format!("</{}>", found.unwrap_or_default()),
                opened_at: name.line,
            })),
        }
    }

    /// Attributes run until `/>` or `>`.
    fn parse_attributes(&mut self) -> Result<Vec<AttributeItem>, ParseError> {
        let mut items = Vec::new();

        while let Some(token) = self.cursor.current() {
            if self.cursor.matches(&SELF_CLOSE) || token.is(HostKind::Greater) {
                break;
            }
            self.trace("parse_attributes");

            let line = token.line;
            let item = if token.is_whitespace() {
                AttributeItem::Token(self.take("element", line)?)
            } else if token.is(HostKind::OpenCurly) {
                AttributeItem::Spread(self.parse_block()?)
            } else if token.is_word() {
                if token.text.eq_ignore_ascii_case("class") {
                    let name = token.text.clone();
                    return Err(self.error(ParseErrorKind::ReservedAttribute { name }));
                }
                AttributeItem::Attribute(self.parse_attribute()?)
            } else {
                return Err(self.unexpected(None));
            };
            items.push(item);
        }

        Ok(items)
    }

    fn parse_attribute(&mut self) -> Result<Attribute, ParseError> {
        self.trace("parse_attribute");
        let first = self.take("attribute", 0)?;
        let line = first.line;
        let mut name = vec![first];

        let is_word = Pattern::Test(Token::is_word);
        if self.cursor.matches(&Pattern::Text(":")) && self.cursor.matches_at(1, &is_word) {
            name.push(self.take("attribute", line)?);
            name.push(self.take("attribute", line)?);
        }
        while self.cursor.matches(&Pattern::Text("-")) && self.cursor.matches_at(1, &is_word) {
            name.push(self.take("attribute", line)?);
            name.push(self.take("attribute", line)?);
        }

        if self.cursor.matches(&Pattern::Text("=")) {
            let assignment = self.take("attribute", line)?;
            let value = match self.current_kind() {
                Some(TokenKind::Host(HostKind::OpenCurly)) => {
                    AttributeValue::Expression(self.parse_block()?)
                }
                Some(TokenKind::Host(HostKind::ConstantString)) => {
                    AttributeValue::Literal(self.take("attribute", line)?)
                }
                _ => return Err(self.unexpected(Some("attribute \"value\" or {expression}"))),
            };
            return Ok(Attribute {
                name,
                assignment: Some(assignment),
                value,
            });
        }

        let boundary = self
            .cursor
            .current()
            .is_some_and(|t| t.is_whitespace() || t.text == "/" || t.text == ">");
        if !boundary {
            if self.cursor.at_end() {
                return Err(self.unterminated("element", line));
            }
            return Err(self.unexpected(Some("\"=\" (attribute assignment)")));
        }

        Ok(Attribute {
            name,
            assignment: None,
            value: AttributeValue::True,
        })
    }

    /// Children run until `</>` or `</name>`; the caller checks which.
    fn parse_element_children(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut children = Vec::new();

        while let Some(kind) = self.current_kind() {
            if self.cursor.matches(&FRAGMENT_CLOSE) || self.cursor.matches(&ELEMENT_CLOSE) {
                break;
            }
            self.trace("parse_element_children");

            let child = match kind {
                TokenKind::Host(HostKind::OpenCurly) => self.parse_expression_container()?,
                TokenKind::Host(HostKind::OpenParen) => Node::Block(self.parse_block()?),
                TokenKind::FragmentOpen => Node::Fragment(self.parse_fragment()?),
                TokenKind::ElementOpen => Node::Element(self.parse_element()?),
                _ => Node::Text(self.parse_text()?),
            };
            children.push(child);
        }

        Ok(children)
    }

    /// `{...}` among children: a lone template literal or comment inside the
    /// braces stands for itself.
    fn parse_expression_container(&mut self) -> Result<Node, ParseError> {
        self.trace("parse_expression_container");
        let block = self.parse_block()?;

        let mut significant = block.children.iter().filter(|c| !c.is_whitespace());
        let sole = match (significant.next(), significant.next()) {
            (Some(only), None) => Some(only.clone()),
            _ => None,
        };

        Ok(match sole {
            Some(BlockChild::Node(literal @ Node::TemplateLiteral(_))) => literal,
            Some(BlockChild::Token(comment))
                if comment.is(HostKind::Comment) || comment.is(HostKind::DocComment) =>
            {
                Node::Comment(Comment { comment })
            }
            _ => Node::ExpressionContainer(ExpressionContainer { expression: block }),
        })
    }

    fn parse_text(&mut self) -> Result<Text, ParseError> {
        self.trace("parse_text");

        if let Some(token) = self.cursor.current().filter(|t| t.is_line_break()) {
            let line = token.line;
            return Ok(Text {
                tokens: vec![self.take("text", line)?],
            });
        }

        let mut tokens = Vec::new();
        while let Some(token) = self.cursor.current() {
            if matches!(token.kind, TokenKind::FragmentOpen | TokenKind::ElementOpen)
                || token.is(HostKind::OpenCurly)
                || self.cursor.matches(&FRAGMENT_CLOSE)
                || self.cursor.matches(&ELEMENT_CLOSE)
            {
                break;
            }
            self.trace("parse_text");

            let line = token.line;
            if token.is(HostKind::OpenTag)
                || token.is(HostKind::OpenTagWithEcho)
                || self.cursor.matches(&PHP_OPEN)
            {
                return Err(self.error(ParseErrorKind::PhpTagInText { line }));
            }
            if token.is(HostKind::CloseTag) {
                return Err(self.error(ParseErrorKind::PhpCloseTagInText { line }));
            }
            if token.is(HostKind::Comment) || token.is(HostKind::DocComment) {
                self.split_comment()?;
            } else if token.is(HostKind::ConstantString) && token.text.starts_with('\'') {
                let error = phpx_lexer::LexError::UnescapedQuote {
                    line,
                    offset: token.offset,
                    snippet: String::new(),
                };
                return Err(self.lex_error(error));
            }

            tokens.push(self.take("text", line)?);
        }

        if tokens.last().is_some_and(Token::is_line_break) {
            tokens.pop();
            self.cursor.move_by(-1);
        }
        if tokens.is_empty() {
            return Err(self.unexpected(None));
        }

        Ok(Text { tokens })
    }

    /// A `//` or `#` comment in markup text swallowed the rest of the line,
    /// closing tags included. Keep the marker as text and lex the remainder
    /// again in its place.
    fn split_comment(&mut self) -> Result<(), ParseError> {
        let Some(comment) = self.cursor.current().cloned() else {
            return Ok(());
        };
        let marker_len = if comment.text.starts_with("//") {
            2
        } else if comment.text.starts_with('#') {
            1
        } else {
            return Err(self.error(ParseErrorKind::UnescapedComment { line: comment.line }));
        };

        if let Some(logger) = &self.logger {
            logger.debug(&Record::at("split_comment", self.cursor.index(), Some(&comment)));
        }

        let marker = Token::host(
            HostKind::Identifier,
            &comment.text[..marker_len],
            comment.line,
            comment.offset,
        );
        let rest = phpx_lexer::offset_tokenize(
            &comment.text[marker_len..],
            comment.offset + marker_len as u32,
            comment.line,
        )
        .map_err(|e| self.lex_error(e))?;

        let mut tokens = Vec::with_capacity(rest.len() + 1);
        tokens.push(marker);
        tokens.extend(rest);
        self.cursor.splice_at_cursor(tokens);
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Run a rule one nesting level deeper.
    fn nested<T>(
        &mut self,
        rule: fn(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= self.max_depth {
            return Err(self.error(ParseErrorKind::MaxDepthExceeded {
                limit: self.max_depth,
            }));
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.cursor.current().map(|t| t.kind)
    }

    /// Consume the current token; running out means `construct` never closed.
    fn take(&mut self, construct: &'static str, opened_at: u32) -> Result<Token, ParseError> {
        match self.cursor.advance() {
            Some(token) => Ok(token),
            None => Err(self.unterminated(construct, opened_at)),
        }
    }

    fn trace(&self, rule: &'static str) {
        if let Some(logger) = &self.logger {
            logger.debug(&Record::at(
                rule,
                self.cursor.index(),
                self.cursor.current(),
            ));
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        let line = self
            .cursor
            .current()
            .or_else(|| self.cursor.tokens().last())
            .map_or(1, |t| t.line);
        ParseError { kind, line }
    }

    fn unterminated(&self, construct: &'static str, opened_at: u32) -> ParseError {
        self.error(ParseErrorKind::Unterminated {
            construct,
            opened_at,
        })
    }

    fn unexpected(&self, expected: Option<&str>) -> ParseError {
        let (text, line) = match self.cursor.current() {
            Some(token) => (token.text.clone(), token.line),
            None => (
                "end of input".to_string(),
                self.cursor.tokens().last().map_or(1, |t| t.line),
            ),
        };
        self.error(ParseErrorKind::UnexpectedToken {
            index: self.cursor.index(),
            text,
            line,
            expected: expected.map(str::to_string),
        })
    }

    /// Lexer errors carry offsets into the whole source; rebuild the excerpt
    /// from it.
    fn lex_error(&self, error: phpx_lexer::LexError) -> ParseError {
        error.annotate(&self.cursor.source_text()).into()
    }
}

fn closer_for(kind: TokenKind) -> Option<HostKind> {
    match kind {
        TokenKind::Host(HostKind::OpenCurly | HostKind::DollarOpenCurlyBraces) => {
            Some(HostKind::CloseCurly)
        }
        TokenKind::Host(HostKind::OpenParen) => Some(HostKind::CloseParen),
        TokenKind::Host(HostKind::OpenBracket) => Some(HostKind::CloseBracket),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::testing::MemoryLogger;
    use phpx_lexer::LexError;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Vec<Node> {
        Parser::parse(source).unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        Parser::parse(source).unwrap_err()
    }

    fn only(source: &str) -> Node {
        let mut nodes = parse(source);
        assert_eq!(nodes.len(), 1, "expected a single node for {source:?}");
        nodes.remove(0)
    }

    fn element(source: &str) -> Element {
        match only(source) {
            Node::Element(element) => element,
            other => panic!("expected element, got {}", other.kind_name()),
        }
    }

    fn fragment(source: &str) -> Fragment {
        match only(source) {
            Node::Fragment(fragment) => fragment,
            other => panic!("expected fragment, got {}", other.kind_name()),
        }
    }

    fn attribute(item: &AttributeItem) -> &Attribute {
        match item {
            AttributeItem::Attribute(attribute) => attribute,
            other => panic!("expected attribute, got {other:?}"),
        }
    }

    fn attributes(element: &Element) -> Vec<&Attribute> {
        element
            .attributes
            .iter()
            .filter_map(|item| match item {
                AttributeItem::Attribute(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    fn text(node: &Node) -> String {
        match node {
            Node::Text(text) => text.text(),
            other => panic!("expected text, got {}", other.kind_name()),
        }
    }

    // =========================================================================
    // Host code
    // =========================================================================

    #[test]
    fn test_empty_source() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_plain_code_is_expressions() {
        let nodes = parse("$a = 1;");
        assert_eq!(nodes.len(), 6);
        assert!(nodes.iter().all(|n| matches!(n, Node::Expression(_))));
    }

    #[test]
    fn test_blocks_nest() {
        let nodes = parse("f([1, (2)])");
        assert_eq!(nodes.len(), 2);
        let Node::Block(call) = &nodes[1] else {
            panic!("expected block");
        };
        assert_eq!(call.opening.text, "(");
        assert_eq!(call.closing.text, ")");
        let BlockChild::Node(Node::Block(list)) = &call.children[0] else {
            panic!("expected nested block");
        };
        assert_eq!(list.opening.text, "[");
        assert!(matches!(&list.children[3], BlockChild::Node(Node::Block(_))));
    }

    #[test]
    fn test_comparison_is_not_markup() {
        let nodes = parse("$a < $b");
        assert_eq!(nodes.len(), 5);
        assert!(nodes.iter().all(|n| matches!(n, Node::Expression(_))));
    }

    #[test]
    fn test_element_inside_code() {
        let nodes = parse("return <br />;");
        assert_eq!(nodes.len(), 4);
        assert!(matches!(nodes[2], Node::Element(_)));
    }

    #[test]
    fn test_element_inside_block() {
        let nodes = parse("($ok ? <b>yes</b> : null)");
        let Node::Block(block) = &nodes[0] else {
            panic!("expected block");
        };
        assert!(block
            .children
            .iter()
            .any(|c| matches!(c, BlockChild::Node(Node::Element(_)))));
    }

    #[test]
    fn test_template_literal() {
        let Node::TemplateLiteral(literal) = only("`Hi ${$name}!`") else {
            panic!("expected template literal");
        };
        assert_eq!(literal.children.len(), 3);
        assert!(matches!(&literal.children[0], TemplatePart::Token(t) if t.text == "Hi "));
        assert!(matches!(&literal.children[1], TemplatePart::Block(b) if b.opening.text == "${"));
    }

    #[test]
    fn test_unterminated_block() {
        let err = parse_err("f(1,\n2");
        assert_eq!(
            err.kind,
            ParseErrorKind::Unterminated {
                construct: "block",
                opened_at: 1
            }
        );
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_unterminated_template_literal() {
        let err = parse_err("`abc");
        assert!(matches!(
            err.kind,
            ParseErrorKind::Unterminated {
                construct: "template literal",
                ..
            }
        ));
    }

    // =========================================================================
    // Elements and fragments
    // =========================================================================

    #[test]
    fn test_self_closing_element() {
        let br = element("<br />");
        assert_eq!(br.name.text, "br");
        assert!(br.self_closing);
        assert!(br.children.is_none());
    }

    #[test]
    fn test_empty_element() {
        let div = element("<div></div>");
        assert!(!div.self_closing);
        assert_eq!(div.children, Some(vec![]));
    }

    #[test]
    fn test_keyword_element_name() {
        assert_eq!(element("<header>x</header>").name.text, "header");
        assert_eq!(element("<use />").name.text, "use");
    }

    #[test]
    fn test_fragment_children() {
        let fragment = fragment("<>Hello, {$name ?? 'unnamed'}!</>");
        assert_eq!(fragment.children.len(), 3);
        assert_eq!(text(&fragment.children[0]), "Hello, ");
        assert!(matches!(fragment.children[1], Node::ExpressionContainer(_)));
        assert_eq!(text(&fragment.children[2]), "!");
    }

    #[test]
    fn test_nested_elements_with_line_breaks() {
        let div = element("<div>\n  <p>Hi</p>\n</div>");
        let children = div.children.unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(text(&children[0]), "\n  ");
        assert!(matches!(children[1], Node::Element(_)));
        assert_eq!(text(&children[2]), "\n");
    }

    #[test]
    fn test_trailing_line_break_split_from_text() {
        let p = element("<p>Hi\n</p>");
        let children = p.children.unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(text(&children[0]), "Hi");
        assert_eq!(text(&children[1]), "\n");
    }

    #[test]
    fn test_paren_child_is_block() {
        let p = element("<p>(1)</p>");
        assert!(matches!(p.children.unwrap()[0], Node::Block(_)));
    }

    #[test]
    fn test_closing_tag_mismatch() {
        let err = parse_err("<div></span>");
        assert_eq!(err.line, 1);
        assert_eq!(
            err.kind,
            ParseErrorKind::ClosingTagMismatch {
                expected: "div".into(),
                found: "</span>".into(),
                opened_at: 1
            }
        );
        assert!(err.to_string().contains("'div' at line 1"));
    }

    #[test]
    fn test_fragment_closer_inside_element() {
        let err = parse_err("<div></>");
        assert!(matches!(
            err.kind,
            ParseErrorKind::ClosingTagMismatch { ref found, .. } if found == "</>"
        ));
    }

    #[test]
    fn test_element_closer_inside_fragment() {
        let err = parse_err("<>x</p>");
        assert!(matches!(
            err.kind,
            ParseErrorKind::UnexpectedToken { expected: Some(ref e), .. } if e.contains("fragment")
        ));
    }

    #[test]
    fn test_unterminated_element_and_fragment() {
        assert!(matches!(
            parse_err("<div>text").kind,
            ParseErrorKind::Unterminated {
                construct: "element",
                ..
            }
        ));
        assert!(matches!(
            parse_err("<img src=\"x\"").kind,
            ParseErrorKind::Unterminated {
                construct: "element",
                ..
            }
        ));
        assert!(matches!(
            parse_err("<>text").kind,
            ParseErrorKind::Unterminated {
                construct: "fragment",
                ..
            }
        ));
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    #[test]
    fn test_attribute_values() {
        let img = element("<img src={$src} alt=\"An image\" disabled />");
        let attrs = attributes(&img);
        assert_eq!(attrs.len(), 3);

        assert_eq!(attrs[0].name_text(), "src");
        assert!(matches!(attrs[0].value, AttributeValue::Expression(_)));
        assert_eq!(attrs[0].assignment.as_ref().unwrap().text, "=");

        assert!(matches!(&attrs[1].value, AttributeValue::Literal(t) if t.text == "\"An image\""));

        assert_eq!(attrs[2].value, AttributeValue::True);
        assert!(attrs[2].assignment.is_none());
    }

    #[test]
    fn test_whitespace_kept_between_attributes() {
        let img = element("<img\n  a=\"1\"\n/>");
        assert!(matches!(&img.attributes[0], AttributeItem::Token(t) if t.text == "\n  "));
        assert_eq!(attribute(&img.attributes[1]).name_text(), "a");
    }

    #[test]
    fn test_hyphenated_and_namespaced_names() {
        let div = element("<div data-foo-bar={$x} xlink:href=\"#a\" />");
        let attrs = attributes(&div);
        assert_eq!(attrs[0].name_text(), "data-foo-bar");
        assert_eq!(attrs[0].name.len(), 5);
        assert_eq!(attrs[1].name_text(), "xlink:href");
    }

    #[test]
    fn test_bare_attribute_before_close() {
        let div = element("<div data-foo></div>");
        assert_eq!(attributes(&div)[0].value, AttributeValue::True);
    }

    #[test]
    fn test_spread_blocks() {
        let img = element("<img {$loading} src=\"about:blank\" {...$props} />");
        let spreads: Vec<_> = img
            .attributes
            .iter()
            .filter(|a| matches!(a, AttributeItem::Spread(_)))
            .collect();
        assert_eq!(spreads.len(), 2);
    }

    #[test]
    fn test_class_attribute_rejected() {
        let err = parse_err("<div class=\"x\"></div>");
        assert_eq!(
            err.kind,
            ParseErrorKind::ReservedAttribute {
                name: "class".into()
            }
        );
        assert_eq!(
            err.kind.to_string(),
            "Use `className` instead of `class`"
        );
    }

    #[test]
    fn test_attribute_missing_value() {
        let err = parse_err("<a href=$x></a>");
        assert!(matches!(
            err.kind,
            ParseErrorKind::UnexpectedToken { ref text, expected: Some(ref e), .. }
                if text == "$x" && e == "attribute \"value\" or {expression}"
        ));
    }

    #[test]
    fn test_attribute_missing_assignment() {
        let err = parse_err("<a href\"x\"></a>");
        assert!(matches!(
            err.kind,
            ParseErrorKind::UnexpectedToken { expected: Some(ref e), .. }
                if e == "\"=\" (attribute assignment)"
        ));
    }

    #[test]
    fn test_unexpected_attribute_token() {
        let err = parse_err("<a $x></a>");
        assert_eq!(
            err.kind.to_string(),
            "Unexpected token #3 => `$x` at line 1"
        );
    }

    // =========================================================================
    // Text, comments and expression containers
    // =========================================================================

    #[test]
    fn test_url_comment_in_text_is_split() {
        let p = element("<p>Visit https://example.com now</p>");
        let children = p.children.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(text(&children[0]), "Visit https://example.com now");
    }

    #[test]
    fn test_hash_in_text_is_split() {
        let f = fragment("<>Your # is {$number ?? 'not available'}!</>");
        assert_eq!(text(&f.children[0]), "Your # is ");
        assert!(matches!(f.children[1], Node::ExpressionContainer(_)));
    }

    #[test]
    fn test_block_comment_in_text_rejected() {
        let err = parse_err("<p>a /* b */ c</p>");
        assert_eq!(err.kind, ParseErrorKind::UnescapedComment { line: 1 });
    }

    #[test]
    fn test_php_tag_in_text_rejected() {
        let err = parse_err("<title>[<?=$todayFormatted?>]</title>");
        assert_eq!(err.kind, ParseErrorKind::PhpTagInText { line: 1 });
        assert_eq!(
            err.kind.to_string(),
            "Unexpected PHP opening tag on line 1"
        );
    }

    #[test]
    fn test_php_close_tag_in_text_rejected() {
        let err = parse_err("<p>a ?> b</p>");
        assert_eq!(err.kind, ParseErrorKind::PhpCloseTagInText { line: 1 });
        assert_eq!(
            err.kind.to_string(),
            "Unexpected PHP closing tag on line 1"
        );
    }

    #[test]
    fn test_quote_pair_in_text_rejected() {
        let err = parse_err("<p>It's Bob's</p>");
        assert_eq!(
            err.kind,
            ParseErrorKind::Lex(LexError::UnescapedQuote {
                line: 1,
                offset: 5,
                snippet: "<p>It's Bob's</p>\n-----^".into(),
            })
        );
    }

    #[test]
    fn test_quote_in_text_comment_rejected() {
        let err = parse_err("<p>see http://x.y/it's</p>");
        assert!(matches!(
            err.kind,
            ParseErrorKind::Lex(LexError::UnescapedQuote { line: 1, offset: 20, .. })
        ));
    }

    #[test]
    fn test_expression_container_line_comment() {
        let p = element("<p>{// note\n}</p>");
        let children = p.children.unwrap();
        assert_eq!(children.len(), 1);
        assert!(matches!(&children[0], Node::Comment(c) if c.comment.text == "// note"));
    }

    #[test]
    fn test_expression_container_template_literal() {
        let p = element("<p>{`Hi ${$n}`}</p>");
        assert!(matches!(p.children.unwrap()[0], Node::TemplateLiteral(_)));
    }

    #[test]
    fn test_expression_container_comment() {
        let p = element("<p>{ /* note */ }</p>");
        let children = p.children.unwrap();
        assert!(matches!(&children[0], Node::Comment(c) if c.comment.text == "/* note */"));
    }

    #[test]
    fn test_expression_container_with_element() {
        let f = fragment("<>{$count < 0 ? <p>Hello</p> : null}</>");
        let Node::ExpressionContainer(container) = &f.children[0] else {
            panic!("expected expression container");
        };
        assert!(container
            .expression
            .children
            .iter()
            .any(|c| matches!(c, BlockChild::Node(Node::Element(_)))));
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    #[test]
    fn test_max_depth() {
        let tokens = phpx_lexer::tokenize("((((1))))").unwrap();
        let err = Parser::new(TokenCursor::new(tokens))
            .with_max_depth(3)
            .parse_program()
            .unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MaxDepthExceeded { limit: 3 });
    }

    #[test]
    fn test_depth_within_limit() {
        let tokens = phpx_lexer::tokenize("((1))").unwrap();
        let nodes = Parser::new(TokenCursor::new(tokens))
            .with_max_depth(2)
            .parse_program()
            .unwrap();
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_logger_receives_rules() {
        let logger = Arc::new(MemoryLogger::default());
        let tokens = phpx_lexer::tokenize("<p>{$a}</p>").unwrap();
        Parser::new(TokenCursor::new(tokens))
            .with_logger(logger.clone())
            .parse_program()
            .unwrap();

        let rules = logger.rules.lock().unwrap();
        assert_eq!(rules[0], "parse");
        assert!(rules.contains(&"parse_element"));
        assert!(rules.contains(&"parse_expression_container"));
    }

    #[test]
    fn test_lex_error_surfaces_as_parse_error() {
        let err = parse_err("<p>It's</p>");
        assert!(matches!(err.kind, ParseErrorKind::Lex(LexError::UnescapedQuote { .. })));
        assert_eq!(err.line, 1);
    }
}
