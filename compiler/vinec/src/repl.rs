//! Interactive read-eval-print loop.
//!
//! One session environment lives across inputs, so bindings persist. Input
//! keeps accumulating under the continuation prompt while the parser reports
//! it as incomplete, and a blank line submits whatever is buffered.

use std::io::{self, BufRead, Write};

use vine_diagnostic::emitter::{ColorMode, DiagnosticEmitter, TerminalEmitter};
use vine_diagnostic::Diagnostic;
use vine_eval::{EnvRef, Interpreter};

pub const PROMPT: &str = "vine> ";
pub const CONTINUATION_PROMPT: &str = "...   ";

/// File name diagnostics from REPL input are located in.
pub const REPL_FILE: &str = "<repl>";

const HELP: &str = "\
REPL commands:
  .help          show this help
  .exit, .quit   leave the REPL
  .clear         clear the screen
  .env           list the session's bindings
  .reset         start a fresh session

Input ending inside an open block, bracket or string continues on the
next line; a blank line submits it.
";

/// What to do after a line of input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Control {
    Continue,
    Exit,
}

pub struct Repl<R, W> {
    input: R,
    output: W,
    interp: Interpreter,
    env: EnvRef,
    buffer: String,
    color: ColorMode,
    is_tty: bool,
}

impl<R: BufRead, W: Write> Repl<R, W> {
    pub fn new(input: R, output: W, interp: Interpreter) -> Self {
        let env = Self::session_env(&interp);
        Repl {
            input,
            output,
            interp,
            env,
            buffer: String::new(),
            color: ColorMode::Never,
            is_tty: false,
        }
    }

    #[must_use]
    pub fn with_color(mut self, mode: ColorMode, is_tty: bool) -> Self {
        self.color = mode;
        self.is_tty = is_tty;
        self
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }

    /// Consume the REPL, returning the output writer.
    pub fn into_output(self) -> W {
        self.output
    }

    fn session_env(interp: &Interpreter) -> EnvRef {
        interp.new_root(interp.context(REPL_FILE, ""))
    }

    /// Print the banner and loop until end of input or `.exit`.
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "vine {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(self.output, "Type .help for help, .exit to quit.")?;
        loop {
            let prompt = if self.buffer.is_empty() {
                PROMPT
            } else {
                CONTINUATION_PROMPT
            };
            write!(self.output, "{prompt}")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(());
            }
            if self.feed(line.trim_end_matches(['\n', '\r']))? == Control::Exit {
                return Ok(());
            }
        }
    }

    /// Handle one line of input.
    fn feed(&mut self, line: &str) -> io::Result<Control> {
        let trimmed = line.trim();
        if self.buffer.is_empty() {
            if trimmed.is_empty() {
                return Ok(Control::Continue);
            }
            if trimmed.starts_with('.') {
                return self.command(trimmed);
            }
        } else if trimmed.is_empty() {
            let source = std::mem::take(&mut self.buffer);
            self.submit(&source, false)?;
            return Ok(Control::Continue);
        }

        self.buffer.push_str(line);
        self.buffer.push('\n');
        let source = self.buffer.clone();
        if self.submit(&source, true)? {
            self.buffer.clear();
        }
        Ok(Control::Continue)
    }

    /// Parse and run `source`. With `wait_for_more`, incomplete input is
    /// left buffered and `false` is returned.
    fn submit(&mut self, source: &str, wait_for_more: bool) -> io::Result<bool> {
        let program = match vine_parse::parse_source(source, self.interp.interner()) {
            Ok(program) => program,
            Err(err) if wait_for_more && err.is_incomplete() => return Ok(false),
            Err(err) => {
                self.report(&err.to_diagnostic(REPL_FILE, source));
                return Ok(true);
            }
        };

        let context = self.interp.context(REPL_FILE, source);
        match self.interp.eval_safe(&program, &self.env, &context) {
            Ok(value) if value.is_nil() => {}
            Ok(value) => writeln!(self.output, "{value}")?,
            Err(err) => self.report(&err.to_diagnostic()),
        }
        Ok(true)
    }

    fn report(&mut self, diagnostic: &Diagnostic) {
        let mut emitter =
            TerminalEmitter::with_color_mode(&mut self.output, self.color, self.is_tty);
        emitter.emit(diagnostic);
        emitter.flush();
    }

    fn command(&mut self, command: &str) -> io::Result<Control> {
        match command {
            ".exit" | ".quit" => return Ok(Control::Exit),
            ".help" => write!(self.output, "{HELP}")?,
            ".clear" => write!(self.output, "\x1b[H\x1b[2J")?,
            ".env" => self.print_env()?,
            ".reset" => {
                let old = std::mem::replace(&mut self.env, Self::session_env(&self.interp));
                self.interp.arena().release(old);
                self.buffer.clear();
                writeln!(self.output, "session reset")?;
            }
            _ => {
                writeln!(self.output, "unknown command: {command}")?;
                writeln!(self.output, "Type .help for help.")?;
            }
        }
        Ok(Control::Continue)
    }

    fn print_env(&mut self) -> io::Result<()> {
        let arena = self.interp.arena();
        let mut bindings: Vec<(&str, String, bool)> = arena
            .bindings(&self.env)
            .into_iter()
            .map(|(name, value)| {
                let constant = arena.is_const(&self.env, name);
                (self.interp.interner().lookup(name), value.to_string(), constant)
            })
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(b.0));

        for (name, value, constant) in bindings {
            let keyword = if constant { "cst" } else { "let" };
            writeln!(self.output, "{keyword} {name} = {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use vine_eval::{buffer_handler, InterpreterBuilder, SharedPrintHandler};

    /// Run `input` through a REPL, returning (REPL output, printed output).
    fn session(input: &str) -> (String, String) {
        let printer: SharedPrintHandler = buffer_handler();
        let interp = InterpreterBuilder::new()
            .print_handler(Arc::clone(&printer))
            .build();
        let mut repl = Repl::new(input.as_bytes(), Vec::new(), interp);
        repl.run().unwrap();
        let output = String::from_utf8(repl.into_output()).unwrap();
        (output, printer.output())
    }

    /// REPL output with the banner and prompts stripped.
    fn replies(input: &str) -> String {
        let (output, _) = session(input);
        output
            .lines()
            .skip(2)
            .map(|mut line| {
                while let Some(rest) = line
                    .strip_prefix(PROMPT)
                    .or_else(|| line.strip_prefix(CONTINUATION_PROMPT))
                {
                    line = rest;
                }
                line
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn bindings_persist() {
        assert_eq!(replies("let a = 2\na * 21\n"), "42");
    }

    #[test]
    fn nil_is_not_echoed() {
        assert_eq!(replies("let a = nil\na\n"), "");
    }

    #[test]
    fn print_goes_to_handler() {
        let (_, printed) = session("print(\"hi\", 1)\n");
        assert_eq!(printed, "hi 1\n");
    }

    #[test]
    fn multiline_block() {
        let (output, printed) = session("for let i = 0; i < 3; i++:\nprint(i)\nend\n");
        assert!(output.contains(CONTINUATION_PROMPT));
        assert_eq!(printed, "0\n1\n2\n");
    }

    #[test]
    fn open_bracket_continues() {
        assert_eq!(replies("let a = [1,\n2]\nlen(a)\n"), "2");
    }

    #[test]
    fn blank_line_submits_incomplete_input() {
        let out = replies("if true:\n\n1\n");
        assert!(out.contains("Parser Error"), "{out}");
        assert!(out.ends_with('1'), "{out}");
    }

    #[test]
    fn error_keeps_session() {
        let out = replies("let a = 1\nb\na\n");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "[Line 1, Column 1] Interpreter Error: variable b is not defined");
        assert_eq!(lines.last(), Some(&"1"));
    }

    #[test]
    fn exit_stops_reading() {
        assert_eq!(replies("1\n.exit\n2\n"), "1");
        assert_eq!(replies(".quit\n2\n"), "");
    }

    #[test]
    fn env_lists_bindings() {
        let out = replies("let b = \"x\"\ncst a = [1, 2]\n.env\n");
        assert!(out.contains("cst a = [1, 2]\nlet b = x"), "{out}");
    }

    #[test]
    fn reset_forgets_bindings() {
        let out = replies("let a = 1\n.reset\nlet a = 2\na\n");
        assert!(out.contains("session reset"));
        assert!(out.ends_with('2'), "{out}");
    }

    #[test]
    fn unknown_command() {
        assert!(replies(".frob\n").starts_with("unknown command: .frob"));
    }

    #[test]
    fn help_and_clear() {
        assert!(replies(".help\n").contains(".reset"));
        assert!(replies(".clear\n").contains("\x1b[2J"));
    }
}
