//! Syntax tree.
//!
//! Produced once per parse and never mutated afterwards. Nodes own their
//! children; function bodies and task continuation chains sit behind `Arc`
//! because closures and task threads keep them alive past the parse.

mod analysis;
mod operators;

pub use analysis::{block_declares, is_simple_body};
pub use operators::{AssignOp, BinaryOp, LogicalOp, UnaryOp, UpdateOp};

use std::sync::Arc;

use crate::{Name, Span};

/// A parsed source file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
}

/// Statements between a block opener and its closing keyword.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    /// Whether the block binds names directly (`let`, `cst`, `fn`, `use`, `expose`).
    pub declares: bool,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        let declares = block_declares(&stmts);
        Block { stmts, declares }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    /// `let name = value` / `cst name = value`
    Let {
        name: Name,
        value: Expr,
        constant: bool,
    },
    /// `fn name(params): ... end`, optionally `task`-flagged
    Fn(Arc<FnDecl>),
    If {
        test: Expr,
        then: Block,
        otherwise: Option<Else>,
    },
    For(Box<ForStmt>),
    Switch {
        test: Expr,
        cases: Vec<SwitchCase>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Use(UseDecl),
    Expose(Expose),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Else {
    Block(Block),
    If(Box<Stmt>),
}

/// Function or lambda declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct FnDecl {
    /// `None` for lambdas.
    pub name: Option<Name>,
    pub params: Vec<Name>,
    pub body: Block,
    pub is_task: bool,
    pub span: Span,
}

impl FnDecl {
    #[inline]
    pub fn is_lambda(&self) -> bool {
        self.name.is_none()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ForStmt {
    pub head: ForHead,
    pub body: Block,
    /// Body has no declarations, nested control flow, functions, switch or
    /// task constructs and can run directly in the loop header scope.
    pub simple_body: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ForHead {
    /// `for init; test; update:`
    Counted {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Expr>,
    },
    /// `for [let] binding in iterable:`
    Range { binding: Name, iterable: Expr },
}

/// One `case` arm. A `default:` arm is a case whose only test is `nil`.
#[derive(Clone, Debug, PartialEq)]
pub struct SwitchCase {
    pub tests: Vec<Expr>,
    pub body: Block,
    pub span: Span,
}

impl SwitchCase {
    pub fn is_default(&self) -> bool {
        matches!(self.tests.as_slice(), [Expr { kind: ExprKind::Nil, .. }])
    }
}

/// `use "source" ...`
#[derive(Clone, Debug, PartialEq)]
pub struct UseDecl {
    pub source: Arc<str>,
    pub mode: UseMode,
}

#[derive(Clone, Debug, PartialEq)]
pub enum UseMode {
    /// Bare `use`: every exported member.
    All,
    /// `as alias`
    Alias(Name),
    /// `pick a` / `pick (a as b, c)`
    Pick(Vec<UseSpecifier>),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UseSpecifier {
    pub remote: Name,
    pub local: Option<Name>,
}

impl UseSpecifier {
    /// The name bound in the importing scope.
    #[inline]
    pub fn local_name(&self) -> Name {
        self.local.unwrap_or(self.remote)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expose {
    /// `expose fn ...`, `expose let ...`, `expose cst ...`
    Decl(Box<Stmt>),
    /// `expose name` or `expose name = value`
    Name { name: Name, value: Option<Expr> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Bool(bool),
    Nil,
    Ident(Name),
    Array(Vec<Expr>),
    Object(Vec<Property>),
    Lambda(Arc<FnDecl>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `++x`, `x++`, `--x`, `x--`
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Name,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `object.property`
    Member {
        object: Box<Expr>,
        property: Name,
    },
    /// `object.(expr)`: evaluate `expr` with `object` mounted as a fallback scope
    Mount {
        object: Box<Expr>,
        body: Box<Expr>,
    },
    /// `object[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Typeof(Box<Expr>),
    Wait(Box<Expr>),
    /// `call to (r): ... catch (e): ... end`
    Chain(Arc<TaskChain>),
}

/// Object literal entry. Keys are normalized to their text.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub key: Arc<str>,
    pub value: Expr,
    pub span: Span,
}

/// A task call with its continuation blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskChain {
    pub call: Expr,
    pub links: Vec<ChainLink>,
    pub catch: Option<ChainLink>,
}

/// One `to (param): ...` or `catch (param): ...` block.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainLink {
    pub param: Option<Name>,
    pub body: Block,
    pub span: Span,
}
