//! Expression nodes. Every node carries the resolved `Type` the parser
//! assigned it and the `(line, column)` of its leading token, since this
//! compiler carries no byte-offset spans and reports diagnostics by
//! line/column directly.

use pudlc_util::Symbol;

use crate::ty::Type;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Xor,
    /// Expression-dialect-only: `lhs = rhs`, where `lhs` must be a `Var`.
    Assign,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub line: u32,
    pub column: u32,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type, line: u32, column: u32) -> Self {
        Expr { kind, ty, line, column }
    }
}

/// One binding in a `var`-expression: `var TYPE id ('=' expr)? (',' id
/// ('=' expr)?)* in expr`. Missing initializers default to `0.0` at codegen
/// time.
#[derive(Clone, Debug, PartialEq)]
pub struct VarBinding {
    pub name: Symbol,
    pub init: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    IntLit(i32),
    FloatLit(f32),
    BoolLit(bool),
    Var(Symbol),
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Symbol, Vec<Expr>),

    // Expression-dialect-only constructs.
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        else_: Box<Expr>,
    },
    For {
        var: Symbol,
        start: Box<Expr>,
        end: Box<Expr>,
        step: Option<Box<Expr>>,
        body: Box<Expr>,
    },
    VarExpr {
        bindings: Vec<VarBinding>,
        body: Box<Expr>,
    },
}
