//! Postfix forms: calls, member access, mounts, indexing, suffix updates
//! and continuation chains.

use std::sync::Arc;

use vine_ir::ast::{ChainLink, Expr, ExprKind, TaskChain, UpdateOp};
use vine_ir::{Name, TokenKind};

use crate::{ParseError, Parser};

impl Parser<'_> {
    /// `(`, `[`, `++` and `--` only continue an expression on the same line.
    pub(crate) fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            let same_line = !self.cursor.newline_before();
            expr = match self.cursor.current_kind() {
                TokenKind::LParen if same_line => {
                    self.cursor.advance();
                    let args = self.parse_comma_list(&TokenKind::RParen, Self::parse_expr)?;
                    let span = self.span_from(expr.span);
                    let call = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                    if !self.in_chain_link
                        && self.cursor.check_any(&[TokenKind::To, TokenKind::Catch])
                    {
                        self.parse_chain(call)?
                    } else {
                        call
                    }
                }
                TokenKind::Dot => {
                    self.cursor.advance();
                    if self.cursor.eat(&TokenKind::LParen) {
                        let body = self.parse_expr()?;
                        self.cursor.expect(&TokenKind::RParen)?;
                        let span = self.span_from(expr.span);
                        Expr::new(
                            ExprKind::Mount {
                                object: Box::new(expr),
                                body: Box::new(body),
                            },
                            span,
                        )
                    } else {
                        let property = self.cursor.expect_ident()?;
                        let span = self.span_from(expr.span);
                        Expr::new(
                            ExprKind::Member {
                                object: Box::new(expr),
                                property,
                            },
                            span,
                        )
                    }
                }
                TokenKind::LBracket if same_line => {
                    self.cursor.advance();
                    let index = self.parse_expr()?;
                    self.cursor.expect(&TokenKind::RBracket)?;
                    let span = self.span_from(expr.span);
                    Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    )
                }
                TokenKind::PlusPlus if same_line => self.suffix_update(expr, UpdateOp::Inc)?,
                TokenKind::MinusMinus if same_line => self.suffix_update(expr, UpdateOp::Dec)?,
                _ => return Ok(expr),
            };
        }
    }

    fn suffix_update(&mut self, operand: Expr, op: UpdateOp) -> Result<Expr, ParseError> {
        let ExprKind::Ident(target) = operand.kind else {
            return Err(ParseError::new(
                format!("operand of `{}` must be a variable", op.as_symbol()),
                operand.span,
            ));
        };
        self.cursor.advance();
        Ok(Expr::new(
            ExprKind::Update {
                op,
                prefix: false,
                target,
            },
            self.span_from(operand.span),
        ))
    }

    /// `call to (r): ... [to (r2): ...] [catch (e): ...] end`
    fn parse_chain(&mut self, call: Expr) -> Result<Expr, ParseError> {
        let mut links = Vec::new();
        while self.cursor.check(&TokenKind::To) {
            links.push(self.parse_chain_link(&[TokenKind::To, TokenKind::Catch, TokenKind::End])?);
        }
        let catch = if self.cursor.check(&TokenKind::Catch) {
            Some(self.parse_chain_link(&[TokenKind::End])?)
        } else {
            None
        };
        self.cursor.expect(&TokenKind::End)?;
        let span = self.span_from(call.span);
        Ok(Expr::new(
            ExprKind::Chain(Arc::new(TaskChain { call, links, catch })),
            span,
        ))
    }

    /// `to`/`catch` keyword, optional parameter, `:` and the block.
    fn parse_chain_link(&mut self, terminators: &[TokenKind]) -> Result<ChainLink, ParseError> {
        let start = self.cursor.advance().span;
        let param = self.parse_link_param()?;
        self.cursor.expect(&TokenKind::Colon)?;
        let outer = std::mem::replace(&mut self.in_chain_link, true);
        let body = self.parse_block_until(terminators);
        self.in_chain_link = outer;
        Ok(ChainLink {
            param,
            body: body?,
            span: self.span_from(start),
        })
    }

    /// `(name)`, `()`, `name` or nothing.
    fn parse_link_param(&mut self) -> Result<Option<Name>, ParseError> {
        if self.cursor.eat(&TokenKind::LParen) {
            if self.cursor.eat(&TokenKind::RParen) {
                return Ok(None);
            }
            let name = self.cursor.expect_ident()?;
            self.cursor.expect(&TokenKind::RParen)?;
            return Ok(Some(name));
        }
        if let TokenKind::Ident(name) = self.cursor.current_kind() {
            self.cursor.advance();
            return Ok(Some(name));
        }
        Ok(None)
    }
}
