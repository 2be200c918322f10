//! Built-in statement handlers.

use std::sync::Arc;

use vine_ir::ast::{
    is_simple_body, Else, Expose, Expr, ExprKind, FnDecl, ForHead, ForStmt, Stmt, StmtKind,
    SwitchCase, UseDecl, UseMode, UseSpecifier,
};
use vine_ir::{Span, TokenKind};

use crate::{ParseError, Parser};

type HandlerResult = Result<Option<Stmt>, ParseError>;

pub(crate) fn register_builtin_handlers(parser: &mut Parser<'_>) {
    parser.register_stmt_handler(&TokenKind::Let, let_stmt);
    parser.register_stmt_handler(&TokenKind::Cst, let_stmt);
    parser.register_stmt_handler(&TokenKind::Fn, fn_stmt);
    parser.register_stmt_handler(&TokenKind::Task, task_stmt);
    parser.register_stmt_handler(&TokenKind::If, if_stmt);
    parser.register_stmt_handler(&TokenKind::For, for_stmt);
    parser.register_stmt_handler(&TokenKind::Switch, switch_stmt);
    parser.register_stmt_handler(&TokenKind::Return, return_stmt);
    parser.register_stmt_handler(&TokenKind::Break, break_stmt);
    parser.register_stmt_handler(&TokenKind::Continue, continue_stmt);
    parser.register_stmt_handler(&TokenKind::Use, use_stmt);
    parser.register_stmt_handler(&TokenKind::Expose, expose_stmt);
}

fn let_stmt(p: &mut Parser<'_>) -> HandlerResult {
    p.parse_let().map(Some)
}

/// Declines `fn (` so the expression parser sees a lambda.
fn fn_stmt(p: &mut Parser<'_>) -> HandlerResult {
    if matches!(p.cursor.peek_kind(), TokenKind::LParen) {
        return Ok(None);
    }
    let start = p.cursor.current_span();
    p.parse_named_fn(start, false).map(Some)
}

fn task_stmt(p: &mut Parser<'_>) -> HandlerResult {
    let start = p.cursor.advance().span;
    if !p.cursor.check(&TokenKind::Fn) {
        return Err(p.cursor.unexpected("`fn` after `task`"));
    }
    p.parse_named_fn(start, true).map(Some)
}

fn if_stmt(p: &mut Parser<'_>) -> HandlerResult {
    let start = p.cursor.advance().span;
    p.parse_if_rest(start).map(Some)
}

fn for_stmt(p: &mut Parser<'_>) -> HandlerResult {
    let start = p.cursor.advance().span;
    let head = if p.range_head_ahead() {
        p.cursor.eat(&TokenKind::Let);
        let binding = p.cursor.expect_ident()?;
        p.cursor.expect(&TokenKind::In)?;
        let iterable = p.parse_expr()?;
        ForHead::Range { binding, iterable }
    } else {
        p.parse_counted_head()?
    };
    let body = p.parse_body()?;
    let simple_body = is_simple_body(&body.stmts);
    let stmt = ForStmt {
        head,
        body,
        simple_body,
    };
    Ok(Some(Stmt::new(
        StmtKind::For(Box::new(stmt)),
        p.span_from(start),
    )))
}

fn switch_stmt(p: &mut Parser<'_>) -> HandlerResult {
    let start = p.cursor.advance().span;
    let test = p.parse_expr()?;
    p.cursor.expect(&TokenKind::Colon)?;

    let mut cases = Vec::new();
    let mut seen_default = false;
    loop {
        match p.cursor.current_kind() {
            TokenKind::Case => {
                let case_span = p.cursor.advance().span;
                if seen_default {
                    return Err(ParseError::new("case after default", case_span));
                }
                let mut tests = vec![p.parse_expr()?];
                while p.cursor.eat(&TokenKind::Comma) {
                    tests.push(p.parse_expr()?);
                }
                p.cursor.expect(&TokenKind::Colon)?;
                let body = p.parse_block_until(&[TokenKind::Case, TokenKind::Default, TokenKind::End])?;
                cases.push(SwitchCase {
                    tests,
                    body,
                    span: p.span_from(case_span),
                });
            }
            TokenKind::Default => {
                let default_span = p.cursor.advance().span;
                if seen_default {
                    return Err(ParseError::new("duplicate default case", default_span));
                }
                seen_default = true;
                p.cursor.expect(&TokenKind::Colon)?;
                let body = p.parse_block_until(&[TokenKind::Case, TokenKind::Default, TokenKind::End])?;
                cases.push(SwitchCase {
                    tests: vec![Expr::new(ExprKind::Nil, default_span)],
                    body,
                    span: p.span_from(default_span),
                });
            }
            TokenKind::End => {
                p.cursor.advance();
                break;
            }
            _ => return Err(p.cursor.unexpected("`case`, `default` or `end`")),
        }
    }

    Ok(Some(Stmt::new(
        StmtKind::Switch { test, cases },
        p.span_from(start),
    )))
}

fn return_stmt(p: &mut Parser<'_>) -> HandlerResult {
    let start = p.cursor.advance().span;
    let value = if p.at_stmt_end() {
        None
    } else {
        Some(p.parse_expr()?)
    };
    Ok(Some(Stmt::new(StmtKind::Return(value), p.span_from(start))))
}

fn break_stmt(p: &mut Parser<'_>) -> HandlerResult {
    let span = p.cursor.advance().span;
    Ok(Some(Stmt::new(StmtKind::Break, span)))
}

fn continue_stmt(p: &mut Parser<'_>) -> HandlerResult {
    let span = p.cursor.advance().span;
    Ok(Some(Stmt::new(StmtKind::Continue, span)))
}

fn use_stmt(p: &mut Parser<'_>) -> HandlerResult {
    let start = p.cursor.advance().span;
    let source: Arc<str> = match p.cursor.current_kind() {
        TokenKind::Str(name) | TokenKind::Ident(name) => {
            p.cursor.advance();
            Arc::from(p.cursor.interner().lookup(name))
        }
        _ => return Err(p.cursor.unexpected("module name")),
    };

    let mode = if p.cursor.eat(&TokenKind::As) {
        UseMode::Alias(p.cursor.expect_ident()?)
    } else if p.cursor.eat(&TokenKind::Pick) {
        if p.cursor.eat(&TokenKind::LParen) {
            UseMode::Pick(p.parse_comma_list(&TokenKind::RParen, Parser::parse_use_specifier)?)
        } else {
            UseMode::Pick(vec![p.parse_use_specifier()?])
        }
    } else {
        UseMode::All
    };

    Ok(Some(Stmt::new(
        StmtKind::Use(UseDecl { source, mode }),
        p.span_from(start),
    )))
}

fn expose_stmt(p: &mut Parser<'_>) -> HandlerResult {
    let start = p.cursor.advance().span;
    let exposed = match p.cursor.current_kind() {
        TokenKind::Let | TokenKind::Cst => Expose::Decl(Box::new(p.parse_let()?)),
        TokenKind::Fn => {
            let fn_start = p.cursor.current_span();
            Expose::Decl(Box::new(p.parse_named_fn(fn_start, false)?))
        }
        TokenKind::Task => match task_stmt(p)? {
            Some(decl) => Expose::Decl(Box::new(decl)),
            None => return Err(p.cursor.unexpected("declaration")),
        },
        TokenKind::Ident(name) => {
            p.cursor.advance();
            let value = if p.cursor.eat(&TokenKind::Assign) {
                Some(p.parse_expr()?)
            } else {
                None
            };
            Expose::Name { name, value }
        }
        _ => return Err(p.cursor.unexpected("declaration or name to expose")),
    };
    Ok(Some(Stmt::new(StmtKind::Expose(exposed), p.span_from(start))))
}

impl Parser<'_> {
    /// `let name [= value]` or `cst name = value`.
    pub fn parse_let(&mut self) -> Result<Stmt, ParseError> {
        let start = self.cursor.current_span();
        let constant = match self.cursor.current_kind() {
            TokenKind::Let => false,
            TokenKind::Cst => true,
            _ => return Err(self.cursor.unexpected("`let` or `cst`")),
        };
        self.cursor.advance();
        let name = self.cursor.expect_ident()?;
        let value = if self.cursor.eat(&TokenKind::Assign) {
            self.parse_expr()?
        } else if constant {
            return Err(self.cursor.unexpected("`=`"));
        } else {
            Expr::new(ExprKind::Nil, self.cursor.previous_span())
        };
        Ok(Stmt::new(
            StmtKind::Let {
                name,
                value,
                constant,
            },
            self.span_from(start),
        ))
    }

    /// `fn name[(params)]: body end` with the cursor on `fn`.
    fn parse_named_fn(&mut self, start: Span, is_task: bool) -> Result<Stmt, ParseError> {
        self.cursor.expect(&TokenKind::Fn)?;
        let name = self.cursor.expect_ident()?;
        let params = if self.cursor.check(&TokenKind::LParen) {
            self.parse_params()?
        } else {
            Vec::new()
        };
        let body = self.parse_fn_body()?;
        let span = self.span_from(start);
        let decl = FnDecl {
            name: Some(name),
            params,
            body,
            is_task,
            span,
        };
        Ok(Stmt::new(StmtKind::Fn(Arc::new(decl)), span))
    }

    /// Everything after `if`. An `else if` shares the outer `end`.
    fn parse_if_rest(&mut self, start: Span) -> Result<Stmt, ParseError> {
        let test = self.parse_expr()?;
        self.cursor.expect(&TokenKind::Colon)?;
        let then = self.parse_block_until(&[TokenKind::Else, TokenKind::End])?;

        let otherwise = if self.cursor.check(&TokenKind::Else) {
            let else_span = self.cursor.advance().span;
            if self.cursor.eat(&TokenKind::If) {
                let nested = self.parse_if_rest(else_span)?;
                return Ok(Stmt::new(
                    StmtKind::If {
                        test,
                        then,
                        otherwise: Some(Else::If(Box::new(nested))),
                    },
                    self.span_from(start),
                ));
            }
            self.cursor.eat(&TokenKind::Colon);
            Some(Else::Block(self.parse_block_until(&[TokenKind::End])?))
        } else {
            None
        };

        self.cursor.expect(&TokenKind::End)?;
        Ok(Stmt::new(
            StmtKind::If {
                test,
                then,
                otherwise,
            },
            self.span_from(start),
        ))
    }

    /// `[let] name in` ahead of the cursor.
    fn range_head_ahead(&self) -> bool {
        let offset = usize::from(self.cursor.check(&TokenKind::Let));
        matches!(self.cursor.nth(offset).kind, TokenKind::Ident(_))
            && matches!(self.cursor.nth(offset + 1).kind, TokenKind::In)
    }

    /// `init; test; update` with each part optional.
    fn parse_counted_head(&mut self) -> Result<ForHead, ParseError> {
        let init = if self.cursor.check(&TokenKind::Semicolon) {
            None
        } else if self.cursor.check_any(&[TokenKind::Let, TokenKind::Cst]) {
            Some(Box::new(self.parse_let()?))
        } else {
            let expr = self.parse_expr()?;
            let span = expr.span;
            Some(Box::new(Stmt::new(StmtKind::Expr(expr), span)))
        };
        self.cursor.expect(&TokenKind::Semicolon)?;

        let test = if self.cursor.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.cursor.expect(&TokenKind::Semicolon)?;

        let update = if self.cursor.check(&TokenKind::Colon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        Ok(ForHead::Counted { init, test, update })
    }

    /// `name [as alias]`
    fn parse_use_specifier(&mut self) -> Result<UseSpecifier, ParseError> {
        let remote = self.cursor.expect_ident()?;
        let local = if self.cursor.eat(&TokenKind::As) {
            Some(self.cursor.expect_ident()?)
        } else {
            None
        };
        Ok(UseSpecifier { remote, local })
    }

    /// No expression follows on this line.
    fn at_stmt_end(&self) -> bool {
        self.cursor.newline_before()
            || self.cursor.check_any(&[
                TokenKind::End,
                TokenKind::Semicolon,
                TokenKind::Eof,
                TokenKind::Case,
                TokenKind::Default,
                TokenKind::Else,
            ])
    }

    pub(crate) fn parse_expr_stmt(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_expr()?;
        let span = expr.span;
        Ok(Stmt::new(StmtKind::Expr(expr), span))
    }
}
