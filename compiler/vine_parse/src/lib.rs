//! Recursive descent parser for vine.
//!
//! Statements are dispatched through a [`HandlerTable`] keyed by their
//! leading token, so new statement forms can be plugged in with
//! [`Parser::register_stmt_handler`]. Expressions use a fixed precedence
//! chain. Parsing stops at the first error.

mod cursor;
mod error;
mod grammar;
mod handlers;

pub use cursor::Cursor;
pub use error::{ParseError, SyntaxError};
pub use handlers::{HandlerTable, StmtHandler};

use smallvec::SmallVec;
use vine_ir::ast::{Program, Stmt};
use vine_ir::{StringInterner, TokenKind, TokenList};
use vine_stack::ensure_sufficient_stack;

/// Parser state.
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    handlers: HandlerTable,
    /// Inside a `to`/`catch` block, where a trailing `to` or `catch` after
    /// a call continues the enclosing chain.
    in_chain_link: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser with the built-in statement handlers registered.
    pub fn new(tokens: &'a TokenList, interner: &'a StringInterner) -> Self {
        let mut parser = Parser {
            cursor: Cursor::new(tokens, interner),
            handlers: HandlerTable::new(),
            in_chain_link: false,
        };
        grammar::register_builtin_handlers(&mut parser);
        parser
    }

    /// Add a statement handler, tried after those already registered for
    /// the same leading token.
    pub fn register_stmt_handler(&mut self, kind: &TokenKind, handler: StmtHandler) {
        self.handlers.register(kind, handler);
    }

    pub fn cursor(&self) -> &Cursor<'a> {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor<'a> {
        &mut self.cursor
    }

    /// Parse the whole token stream.
    pub fn parse_program(mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        while !self.cursor.is_at_end() {
            body.push(self.parse_stmt()?);
        }
        Ok(Program { body })
    }

    /// Parse one statement and an optional trailing `;`.
    pub fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        ensure_sufficient_stack(|| {
            let stmt = self.dispatch_stmt()?;
            self.cursor.eat(&TokenKind::Semicolon);
            Ok(stmt)
        })
    }

    fn dispatch_stmt(&mut self) -> Result<Stmt, ParseError> {
        let kind = self.cursor.current_kind();
        let candidates: SmallVec<[StmtHandler; 2]> =
            self.handlers.lookup(&kind).iter().copied().collect();
        for handler in candidates {
            if let Some(stmt) = handler(self)? {
                return Ok(stmt);
            }
        }
        self.parse_expr_stmt()
    }
}

/// Parse a token list with the default handlers.
pub fn parse(tokens: &TokenList, interner: &StringInterner) -> Result<Program, ParseError> {
    Parser::new(tokens, interner).parse_program()
}

/// Lex and parse source text.
#[tracing::instrument(level = "debug", skip_all, fields(bytes = source.len()))]
pub fn parse_source(source: &str, interner: &StringInterner) -> Result<Program, SyntaxError> {
    let tokens = vine_lexer::lex(source, interner)?;
    let program = parse(&tokens, interner)?;
    tracing::debug!(
        tokens = tokens.len(),
        statements = program.body.len(),
        "parsed source"
    );
    Ok(program)
}
