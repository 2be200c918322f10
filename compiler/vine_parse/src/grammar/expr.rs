//! Expression entry point and the operator precedence chain.
//!
//! Lowest to highest: assignment, `or`, `and`, equality, comparison,
//! additive, multiplicative, prefix. Postfix and primary forms live in
//! their own modules.

use vine_ir::ast::{AssignOp, BinaryOp, Expr, ExprKind, LogicalOp, UnaryOp, UpdateOp};
use vine_ir::TokenKind;
use vine_stack::ensure_sufficient_stack;

use crate::{ParseError, Parser};

impl<'a> Parser<'a> {
    /// Parse an expression, including assignment.
    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        ensure_sufficient_stack(|| self.parse_assignment())
    }

    /// Right associative; the target must be a name, member or index.
    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let target = self.parse_or()?;
        let Some(op) = self.match_assign_op() else {
            return Ok(target);
        };
        if !matches!(
            target.kind,
            ExprKind::Ident(_) | ExprKind::Member { .. } | ExprKind::Index { .. }
        ) {
            return Err(ParseError::new("invalid assignment target", target.span));
        }
        self.cursor.advance();
        let value = self.parse_expr()?;
        let span = target.span.merge(value.span);
        Ok(Expr::new(
            ExprKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        ))
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.cursor.check_any(&[TokenKind::Or, TokenKind::PipePipe]) {
            self.cursor.advance();
            let right = self.parse_and()?;
            left = logical(LogicalOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;
        while self.cursor.check_any(&[TokenKind::And, TokenKind::AmpAmp]) {
            self.cursor.advance();
            let right = self.parse_equality()?;
            left = logical(LogicalOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_comparison, Self::match_equality_op)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_additive, Self::match_comparison_op)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_multiplicative, Self::match_additive_op)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_prefix, Self::match_multiplicative_op)
    }

    /// Left-associative loop over one precedence level.
    fn parse_binary_level(
        &mut self,
        operand: fn(&mut Parser<'a>) -> Result<Expr, ParseError>,
        matcher: fn(&Parser<'a>) -> Option<BinaryOp>,
    ) -> Result<Expr, ParseError> {
        let mut left = operand(self)?;
        while let Some(op) = matcher(self) {
            self.cursor.advance();
            let right = operand(self)?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        ensure_sufficient_stack(|| {
            let start = self.cursor.current_span();
            let kind = match self.cursor.current_kind() {
                TokenKind::Minus => self.prefix_unary(UnaryOp::Neg)?,
                TokenKind::Bang => self.prefix_unary(UnaryOp::Not)?,
                TokenKind::PlusPlus => self.prefix_update(UpdateOp::Inc)?,
                TokenKind::MinusMinus => self.prefix_update(UpdateOp::Dec)?,
                TokenKind::Typeof => {
                    self.cursor.advance();
                    ExprKind::Typeof(Box::new(self.parse_prefix()?))
                }
                TokenKind::Wait => {
                    self.cursor.advance();
                    ExprKind::Wait(Box::new(self.parse_prefix()?))
                }
                _ => return self.parse_postfix(),
            };
            Ok(Expr::new(kind, self.span_from(start)))
        })
    }

    fn prefix_unary(&mut self, op: UnaryOp) -> Result<ExprKind, ParseError> {
        self.cursor.advance();
        let operand = self.parse_prefix()?;
        Ok(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn prefix_update(&mut self, op: UpdateOp) -> Result<ExprKind, ParseError> {
        self.cursor.advance();
        let operand = self.parse_prefix()?;
        let ExprKind::Ident(target) = operand.kind else {
            return Err(ParseError::new(
                format!("operand of `{}` must be a variable", op.as_symbol()),
                operand.span,
            ));
        };
        Ok(ExprKind::Update {
            op,
            prefix: true,
            target,
        })
    }

    fn match_assign_op(&self) -> Option<AssignOp> {
        match self.cursor.current_kind() {
            TokenKind::Assign => Some(AssignOp::Assign),
            TokenKind::PlusAssign => Some(AssignOp::Add),
            TokenKind::MinusAssign => Some(AssignOp::Sub),
            TokenKind::StarAssign => Some(AssignOp::Mul),
            TokenKind::SlashAssign => Some(AssignOp::Div),
            _ => None,
        }
    }

    fn match_equality_op(&self) -> Option<BinaryOp> {
        match self.cursor.current_kind() {
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::NotEq),
            _ => None,
        }
    }

    fn match_comparison_op(&self) -> Option<BinaryOp> {
        match self.cursor.current_kind() {
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::LtEq => Some(BinaryOp::LtEq),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::GtEq => Some(BinaryOp::GtEq),
            _ => None,
        }
    }

    /// A `-` at the start of a line begins a new statement.
    fn match_additive_op(&self) -> Option<BinaryOp> {
        match self.cursor.current_kind() {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus if !self.cursor.newline_before() => Some(BinaryOp::Sub),
            _ => None,
        }
    }

    fn match_multiplicative_op(&self) -> Option<BinaryOp> {
        match self.cursor.current_kind() {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Rem),
            _ => None,
        }
    }
}

fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}
