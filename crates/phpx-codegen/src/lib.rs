//! PHPX Code Generator
//!
//! Compiles PHPX source into plain PHP. Markup becomes array literals and
//! everything else is written back unchanged.
//!
//! ```text
//! source → tokenize() → Parser → Vec<Node> → Generator → PHP
//! ```
//!
//! ```
//! let php = phpx_codegen::compile("<?php $p = <p>Hi, {$name}!</p>;").unwrap();
//! assert_eq!(php, "<?php $p = ['$', 'p', null, ['Hi, ', ($name), '!']];");
//! ```

pub mod formatter;
pub mod generate;

use std::sync::Arc;

use phpx_lexer::LexError;
use phpx_parser::ast::Node;
use phpx_parser::{Logger, ParseError, ParseErrorKind, Parser, TokenCursor, DEFAULT_MAX_DEPTH};

pub use formatter::{BareLiteralFormatter, Formatter, LiteralFormatter, PragmaFormatter};
pub use generate::Generator;

/// Code generation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodegenError {
    #[error("Unknown node kind `{kind}` in {context}")]
    UnknownNodeKind {
        kind: &'static str,
        context: &'static str,
    },

    #[error("Unknown attribute assignment `{text}`")]
    UnknownAssignment { text: String },

    #[error("Unsupported attribute expression `{text}`, only a single variable can be spread by name")]
    UnsupportedAttributeExpression { text: String },
}

/// Any error from compiling source text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(ParseError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl From<ParseError> for CompileError {
    fn from(error: ParseError) -> Self {
        match error.kind {
            ParseErrorKind::Lex(error) => CompileError::Lex(error),
            _ => CompileError::Parse(error),
        }
    }
}

/// Source to PHP, with a configurable output shape.
///
/// A compiler holds no per-call state and can be shared between threads.
pub struct Compiler {
    formatter: Box<dyn Formatter>,
    logger: Option<Arc<dyn Logger>>,
    max_depth: usize,
}

impl Default for Compiler {
    fn default() -> Self {
        Self {
            formatter: Box::new(LiteralFormatter),
            logger: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Receive a record for every parse and generation step.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn compile(&self, source: &str) -> Result<String, CompileError> {
        let nodes = self.parse(source)?;
        self.compile_nodes(&nodes)
    }

    /// Tokenize and parse with this compiler's depth limit and logger.
    pub fn parse(&self, source: &str) -> Result<Vec<Node>, CompileError> {
        let tokens = phpx_lexer::tokenize(source)?;
        let mut parser = Parser::new(TokenCursor::new(tokens)).with_max_depth(self.max_depth);
        if let Some(logger) = &self.logger {
            parser = parser.with_logger(Arc::clone(logger));
        }
        Ok(parser.parse_program()?)
    }

    /// Generate PHP for an already parsed program.
    pub fn compile_nodes(&self, nodes: &[Node]) -> Result<String, CompileError> {
        let mut generator = Generator::new(self.formatter.as_ref());
        if let Some(logger) = &self.logger {
            generator = generator.with_logger(logger.as_ref());
        }
        Ok(generator.generate(nodes)?)
    }
}

/// Compile PHPX source with the default formatter.
pub fn compile(source: &str) -> Result<String, CompileError> {
    Compiler::new().compile(source)
}
