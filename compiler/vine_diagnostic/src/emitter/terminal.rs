//! Terminal Emitter
//!
//! Human-readable diagnostic output with optional ANSI color support.

use std::io::{self, Write};

use crate::{Diagnostic, LineIndex};

use super::DiagnosticEmitter;

/// ANSI color codes for terminal output.
mod colors {
    pub const ERROR: &str = "\x1b[1;31m"; // Bold red
    pub const BOLD: &str = "\x1b[1m";
    pub const SECONDARY: &str = "\x1b[1;34m"; // Bold blue
    pub const RESET: &str = "\x1b[0m";
}

/// Color output mode for terminal emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Automatically detect based on terminal capabilities.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Resolve to a boolean; `is_tty` only matters for `Auto`.
    pub fn should_use_colors(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Source text the emitter can quote under a diagnostic.
struct SourceSnippet {
    path: String,
    text: String,
    index: LineIndex,
}

/// Terminal emitter with optional color support.
///
/// With a source attached, diagnostics located in that file also show the
/// offending line and a caret under the reported column.
pub struct TerminalEmitter<W: Write> {
    writer: W,
    colors: bool,
    source: Option<SourceSnippet>,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn with_color_mode(writer: W, mode: ColorMode, is_tty: bool) -> Self {
        TerminalEmitter {
            writer,
            colors: mode.should_use_colors(is_tty),
            source: None,
        }
    }

    /// Attach the text of `path` for snippet rendering.
    #[must_use]
    pub fn with_source(mut self, path: &str, text: &str) -> Self {
        self.source = Some(SourceSnippet {
            path: path.to_owned(),
            text: text.to_owned(),
            index: LineIndex::new(text),
        });
        self
    }

    /// Consume the emitter, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_colored(&mut self, text: &str, color: &str) {
        if self.colors {
            let _ = write!(self.writer, "{color}{text}{}", colors::RESET);
        } else {
            let _ = write!(self.writer, "{text}");
        }
    }

    fn write_snippet(&mut self, line: u32, column: u32) {
        let Some(snippet) = &self.source else {
            return;
        };
        let Some(text) = snippet.index.line_text(&snippet.text, line) else {
            return;
        };
        let text = text.to_owned();
        let gutter = line.to_string();
        let pad = " ".repeat(gutter.len());
        let caret_pad = " ".repeat(column.saturating_sub(1) as usize);

        let _ = writeln!(self.writer, "{pad} |");
        let _ = writeln!(self.writer, "{gutter} | {text}");
        let _ = write!(self.writer, "{pad} | {caret_pad}");
        self.write_colored("^", colors::ERROR);
        let _ = writeln!(self.writer);
    }
}

impl TerminalEmitter<io::Stderr> {
    /// Create a terminal emitter for stderr.
    pub fn stderr(mode: ColorMode, is_tty: bool) -> Self {
        Self::with_color_mode(io::stderr(), mode, is_tty)
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        if let Some(loc) = &diagnostic.location {
            let _ = write!(self.writer, "[Line {}, Column {}] ", loc.line, loc.column);
        }
        self.write_colored(diagnostic.kind.label(), colors::ERROR);
        if self.colors {
            let _ = writeln!(
                self.writer,
                ": {}{}{}",
                colors::BOLD,
                diagnostic.message,
                colors::RESET
            );
        } else {
            let _ = writeln!(self.writer, ": {}", diagnostic.message);
        }

        let Some(loc) = &diagnostic.location else {
            return;
        };
        if !loc.file.is_empty() {
            let _ = write!(self.writer, "  --> ");
            let arrow_target = format!("{}:{}:{}", loc.file, loc.line, loc.column);
            self.write_colored(&arrow_target, colors::SECONDARY);
            let _ = writeln!(self.writer);
        }
        let same_file = self
            .source
            .as_ref()
            .is_some_and(|snippet| snippet.path == *loc.file);
        if same_file {
            let (line, column) = (loc.line, loc.column);
            self.write_snippet(line, column);
        }
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}
