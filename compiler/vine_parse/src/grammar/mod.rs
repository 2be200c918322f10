//! Grammar productions.
//!
//! - `stmt.rs`: the built-in statement handlers
//! - `expr.rs`: assignment and the binary/prefix precedence chain
//! - `postfix.rs`: calls, member access, indexing, continuation chains
//! - `primary.rs`: literals, identifiers, array/object literals, lambdas

mod expr;
mod postfix;
mod primary;
mod stmt;

use vine_ir::ast::Block;
use vine_ir::{Name, Span, TokenKind};

use crate::{ParseError, Parser};

pub(crate) use stmt::register_builtin_handlers;

impl Parser<'_> {
    /// Statements up to, but not including, one of `terminators`.
    pub fn parse_block_until(&mut self, terminators: &[TokenKind]) -> Result<Block, ParseError> {
        let mut stmts = Vec::new();
        while !self.cursor.check_any(terminators) {
            if self.cursor.is_at_end() {
                return Err(self.cursor.unexpected(&describe_all(terminators)));
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(Block::new(stmts))
    }

    /// `: statements end`
    pub fn parse_body(&mut self) -> Result<Block, ParseError> {
        self.cursor.expect(&TokenKind::Colon)?;
        let block = self.parse_block_until(&[TokenKind::End])?;
        self.cursor.expect(&TokenKind::End)?;
        Ok(block)
    }

    /// A function body. Chain context does not leak into nested functions.
    fn parse_fn_body(&mut self) -> Result<Block, ParseError> {
        let outer = std::mem::replace(&mut self.in_chain_link, false);
        let body = self.parse_body();
        self.in_chain_link = outer;
        body
    }

    /// `(a, b, c)`; parameter names must be distinct.
    fn parse_params(&mut self) -> Result<Vec<Name>, ParseError> {
        self.cursor.expect(&TokenKind::LParen)?;
        let params = self.parse_comma_list(&TokenKind::RParen, |p| {
            let span = p.cursor.current_span();
            p.cursor.expect_ident().map(|name| (name, span))
        })?;
        let mut names: Vec<Name> = Vec::with_capacity(params.len());
        for (name, span) in params {
            if names.contains(&name) {
                let text = self.cursor.interner().lookup(name);
                return Err(ParseError::new(format!("duplicate parameter {text}"), span));
            }
            names.push(name);
        }
        Ok(names)
    }

    /// Items separated by commas up to `close`, which is consumed. A
    /// trailing comma is allowed.
    fn parse_comma_list<T>(
        &mut self,
        close: &TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        let mut items = Vec::new();
        loop {
            if self.cursor.eat(close) {
                return Ok(items);
            }
            items.push(item(self)?);
            if !self.cursor.eat(&TokenKind::Comma) {
                self.cursor.expect(close)?;
                return Ok(items);
            }
        }
    }

    /// Span from `start` through the last consumed token.
    #[inline]
    fn span_from(&self, start: Span) -> Span {
        start.merge(self.cursor.previous_span())
    }
}

fn describe_all(kinds: &[TokenKind]) -> String {
    let names: Vec<String> = kinds.iter().map(|k| format!("`{}`", k.describe())).collect();
    match names.as_slice() {
        [] => "statement".to_owned(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {last}", init.join(", ")),
    }
}
