//! Parse error types.

use thiserror::Error;
use vine_diagnostic::{Diagnostic, LineIndex, Location};
use vine_ir::Span;
use vine_lexer::LexError;

/// A parse failure. Parsing stops at the first one.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    incomplete: bool,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        ParseError {
            message: message.into(),
            span,
            incomplete: false,
        }
    }

    /// An error caused by input ending before the construct was closed.
    pub fn incomplete(message: impl Into<String>, span: Span) -> Self {
        ParseError {
            incomplete: true,
            ..ParseError::new(message, span)
        }
    }

    /// Whether more input could turn this into a valid program.
    ///
    /// The REPL keeps reading lines while this holds.
    pub fn is_incomplete(&self) -> bool {
        self.incomplete
    }

    pub fn to_diagnostic(&self, file: &str, source: &str) -> Diagnostic {
        let (line, column) = LineIndex::new(source).span_start(source, self.span);
        Diagnostic::parser(self.message.clone()).with_location(Location::new(file, line, column))
    }
}

/// Any failure turning source text into a syntax tree.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SyntaxError {
    pub fn is_incomplete(&self) -> bool {
        match self {
            SyntaxError::Lex(err) => err.is_incomplete(),
            SyntaxError::Parse(err) => err.is_incomplete(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            SyntaxError::Lex(err) => err.span,
            SyntaxError::Parse(err) => err.span,
        }
    }

    pub fn to_diagnostic(&self, file: &str, source: &str) -> Diagnostic {
        match self {
            SyntaxError::Lex(err) => err.to_diagnostic(file, source),
            SyntaxError::Parse(err) => err.to_diagnostic(file, source),
        }
    }
}
