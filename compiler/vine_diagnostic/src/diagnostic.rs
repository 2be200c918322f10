use std::fmt;
use std::sync::Arc;

/// The phase that produced a diagnostic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Lexer,
    Parser,
    Interpreter,
    Generic,
}

impl DiagnosticKind {
    /// Label used in the rendered header, e.g. `Parser Error`.
    pub const fn label(self) -> &'static str {
        match self {
            DiagnosticKind::Lexer => "Lexer Error",
            DiagnosticKind::Parser => "Parser Error",
            DiagnosticKind::Interpreter => "Interpreter Error",
            DiagnosticKind::Generic => "Error",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolved source position. Lines and columns are 1-based; columns count
/// characters, not bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Location {
            file: file.into(),
            line,
            column,
        }
    }
}

/// A reportable failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: Option<Location>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub fn lexer(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Lexer, message)
    }

    pub fn parser(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Parser, message)
    }

    pub fn interpreter(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Interpreter, message)
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Generic, message)
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn file(&self) -> Option<&str> {
        self.location.as_ref().map(|loc| &*loc.file)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "[Line {}, Column {}] ", loc.line, loc.column)?;
        }
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn render_with_location() {
        let diag = Diagnostic::interpreter("variable x is not defined")
            .with_location(Location::new("main.vine", 3, 9));
        assert_eq!(
            diag.to_string(),
            "[Line 3, Column 9] Interpreter Error: variable x is not defined"
        );
        assert_eq!(diag.file(), Some("main.vine"));
    }

    #[test]
    fn render_without_location() {
        let diag = Diagnostic::generic("cannot read file");
        assert_eq!(diag.to_string(), "Error: cannot read file");
        assert_eq!(diag.file(), None);
    }

    #[test]
    fn kind_labels() {
        assert_eq!(DiagnosticKind::Lexer.label(), "Lexer Error");
        assert_eq!(DiagnosticKind::Parser.to_string(), "Parser Error");
    }
}
