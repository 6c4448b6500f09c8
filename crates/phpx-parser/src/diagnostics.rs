//! Debug trace of parser and generator steps.
//!
//! The pipeline never logs on its own. A [`Logger`] handed to the parser or
//! compiler receives one [`Record`] per dispatch or generation step; without
//! one, nothing is recorded.

use phpx_lexer::Token;

/// One step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Grammar or generation rule taking the step, e.g. `parse_element`.
    pub rule: &'static str,
    /// Cursor index, when the step is driven by the token stream.
    pub index: Option<usize>,
    pub line: Option<u32>,
    pub text: Option<&'a str>,
}

impl<'a> Record<'a> {
    pub fn new(rule: &'static str) -> Self {
        Self {
            rule,
            index: None,
            line: None,
            text: None,
        }
    }

    /// A record for the token under the cursor.
    pub fn at(rule: &'static str, index: usize, token: Option<&'a Token>) -> Self {
        Self {
            rule,
            index: Some(index),
            line: token.map(|t| t.line),
            text: token.map(|t| t.text.as_str()),
        }
    }
}

/// Sink for [`Record`]s.
pub trait Logger: Send + Sync {
    fn debug(&self, record: &Record<'_>);
}

/// Forwards records to `tracing` at debug level under the `phpx` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, record: &Record<'_>) {
        tracing::debug!(
            target: "phpx",
            index = ?record.index,
            line = ?record.line,
            text = ?record.text,
            "{}",
            record.rule
        );
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Collects rule names for assertions.
    #[derive(Default)]
    pub struct MemoryLogger {
        pub rules: Mutex<Vec<&'static str>>,
    }

    impl Logger for MemoryLogger {
        fn debug(&self, record: &Record<'_>) {
            if let Ok(mut rules) = self.rules.lock() {
                rules.push(record.rule);
            }
        }
    }
}
