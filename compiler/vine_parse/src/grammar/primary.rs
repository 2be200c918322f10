//! Primary expressions.

use std::sync::Arc;

use vine_ir::ast::{Expr, ExprKind, FnDecl, Property};
use vine_ir::TokenKind;

use crate::{ParseError, Parser};

impl Parser<'_> {
    pub(crate) fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = *self.cursor.current();
        let start = token.span;
        let kind = match token.kind {
            TokenKind::Int(value) => ExprKind::Int(value),
            TokenKind::Float(value) => ExprKind::Float(value),
            TokenKind::Str(name) => ExprKind::Str(Arc::from(self.cursor.interner().lookup(name))),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Nil => ExprKind::Nil,
            TokenKind::Ident(name) => ExprKind::Ident(name),
            TokenKind::LParen => {
                self.cursor.advance();
                let inner = self.parse_expr()?;
                self.cursor.expect(&TokenKind::RParen)?;
                return Ok(Expr::new(inner.kind, self.span_from(start)));
            }
            TokenKind::LBracket => {
                self.cursor.advance();
                let items = self.parse_comma_list(&TokenKind::RBracket, Self::parse_expr)?;
                return Ok(Expr::new(ExprKind::Array(items), self.span_from(start)));
            }
            TokenKind::LBrace => {
                self.cursor.advance();
                let props = self.parse_comma_list(&TokenKind::RBrace, Self::parse_property)?;
                return Ok(Expr::new(ExprKind::Object(props), self.span_from(start)));
            }
            TokenKind::Fn => return self.parse_lambda(),
            _ => return Err(self.cursor.unexpected("expression")),
        };
        self.cursor.advance();
        Ok(Expr::new(kind, start))
    }

    /// `key: value` where the key is a name, string or number.
    fn parse_property(&mut self) -> Result<Property, ParseError> {
        let start = self.cursor.current_span();
        let key: Arc<str> = match self.cursor.current_kind() {
            TokenKind::Ident(name) | TokenKind::Str(name) => {
                Arc::from(self.cursor.interner().lookup(name))
            }
            TokenKind::Int(value) => Arc::from(value.to_string()),
            TokenKind::Float(value) => Arc::from(value.to_string()),
            _ => return Err(self.cursor.unexpected("property key")),
        };
        self.cursor.advance();
        self.cursor.expect(&TokenKind::Colon)?;
        let value = self.parse_expr()?;
        Ok(Property {
            key,
            value,
            span: self.span_from(start),
        })
    }

    /// `fn(params): body end`
    fn parse_lambda(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.expect(&TokenKind::Fn)?;
        let params = self.parse_params()?;
        let body = self.parse_fn_body()?;
        let span = self.span_from(start);
        let decl = FnDecl {
            name: None,
            params,
            body,
            is_task: false,
            span,
        };
        Ok(Expr::new(ExprKind::Lambda(Arc::new(decl)), span))
    }
}
