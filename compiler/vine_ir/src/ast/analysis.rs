//! Static checks the evaluator relies on for scope reuse.

use super::{Expr, ExprKind, Stmt, StmtKind};

/// Whether any statement declares a name directly in the enclosing scope.
pub fn block_declares(stmts: &[Stmt]) -> bool {
    stmts
        .iter()
        .any(|stmt| {
            matches!(
                stmt.kind,
                StmtKind::Let { .. } | StmtKind::Fn(_) | StmtKind::Use(_) | StmtKind::Expose(_)
            )
        })
}

/// Whether a loop body can share one scope across all iterations.
///
/// A body qualifies when it contains only expression statements and the
/// flow statements `return`, `break` and `continue`, and none of its
/// expressions build a lambda or a task chain.
pub fn is_simple_body(stmts: &[Stmt]) -> bool {
    stmts.iter().all(|stmt| match &stmt.kind {
        StmtKind::Expr(expr) => expr_is_simple(expr),
        StmtKind::Return(value) => value.as_ref().map_or(true, expr_is_simple),
        StmtKind::Break | StmtKind::Continue => true,
        StmtKind::Let { .. }
        | StmtKind::Fn(_)
        | StmtKind::If { .. }
        | StmtKind::For(_)
        | StmtKind::Switch { .. }
        | StmtKind::Use(_)
        | StmtKind::Expose(_) => false,
    })
}

fn expr_is_simple(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Nil
        | ExprKind::Ident(_)
        | ExprKind::Update { .. } => true,
        ExprKind::Lambda(_) | ExprKind::Chain(_) => false,
        ExprKind::Array(items) => items.iter().all(expr_is_simple),
        ExprKind::Object(props) => props.iter().all(|p| expr_is_simple(&p.value)),
        ExprKind::Unary { operand, .. } => expr_is_simple(operand),
        ExprKind::Typeof(inner) | ExprKind::Wait(inner) => expr_is_simple(inner),
        ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
            expr_is_simple(left) && expr_is_simple(right)
        }
        ExprKind::Assign { target, value, .. } => expr_is_simple(target) && expr_is_simple(value),
        ExprKind::Call { callee, args } => expr_is_simple(callee) && args.iter().all(expr_is_simple),
        ExprKind::Member { object, .. } => expr_is_simple(object),
        ExprKind::Mount { object, body } => expr_is_simple(object) && expr_is_simple(body),
        ExprKind::Index { object, index } => expr_is_simple(object) && expr_is_simple(index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AssignOp, Block, FnDecl, UpdateOp};
    use crate::{Name, Span};
    use std::sync::Arc;

    fn expr(kind: ExprKind) -> Expr {
        Expr::new(kind, Span::DUMMY)
    }

    fn stmt(kind: StmtKind) -> Stmt {
        Stmt::new(kind, Span::DUMMY)
    }

    #[test]
    fn counter_body_is_simple() {
        let body = vec![
            stmt(StmtKind::Expr(expr(ExprKind::Assign {
                op: AssignOp::Add,
                target: Box::new(expr(ExprKind::Ident(Name::EMPTY))),
                value: Box::new(expr(ExprKind::Int(1))),
            }))),
            stmt(StmtKind::Expr(expr(ExprKind::Update {
                op: UpdateOp::Inc,
                prefix: false,
                target: Name::EMPTY,
            }))),
            stmt(StmtKind::Break),
        ];
        assert!(is_simple_body(&body));
    }

    #[test]
    fn declaration_is_not_simple() {
        let body = vec![stmt(StmtKind::Let {
            name: Name::EMPTY,
            value: expr(ExprKind::Nil),
            constant: false,
        })];
        assert!(!is_simple_body(&body));
        assert!(block_declares(&body));
    }

    #[test]
    fn lambda_argument_is_not_simple() {
        let lambda = Arc::new(FnDecl {
            name: None,
            params: vec![],
            body: Block::default(),
            is_task: false,
            span: Span::DUMMY,
        });
        let body = vec![stmt(StmtKind::Expr(expr(ExprKind::Call {
            callee: Box::new(expr(ExprKind::Ident(Name::EMPTY))),
            args: vec![expr(ExprKind::Lambda(lambda))],
        })))];
        assert!(!is_simple_body(&body));
        assert!(!block_declares(&body));
    }
}
