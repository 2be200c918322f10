//! Statement handler table.
//!
//! Statements are dispatched on their leading token. Each token kind maps to
//! an ordered list of handlers; a handler returns `Ok(None)` to decline
//! without consuming input, and the next one is tried. When every handler
//! declines (or none is registered) the statement is parsed as an
//! expression.

use std::mem::{discriminant, Discriminant};

use rustc_hash::FxHashMap;
use vine_ir::ast::Stmt;
use vine_ir::TokenKind;

use crate::{ParseError, Parser};

/// A statement parser keyed on its leading token.
pub type StmtHandler = fn(&mut Parser<'_>) -> Result<Option<Stmt>, ParseError>;

#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: FxHashMap<Discriminant<TokenKind>, Vec<StmtHandler>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        HandlerTable::default()
    }

    /// Append a handler for statements starting with `kind`. Literal
    /// payloads in `kind` are ignored.
    pub fn register(&mut self, kind: &TokenKind, handler: StmtHandler) {
        self.handlers
            .entry(discriminant(kind))
            .or_default()
            .push(handler);
    }

    /// Handlers for `kind`, in registration order.
    pub fn lookup(&self, kind: &TokenKind) -> &[StmtHandler] {
        self.handlers
            .get(&discriminant(kind))
            .map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
