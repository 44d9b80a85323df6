//! Top-level items: function definitions, prototypes, externs, and
//! (expression dialect) bare top-level expressions.

use pudlc_util::Symbol;

use crate::expr::Expr;
use crate::stmt::Stmt;
use crate::ty::Type;

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Symbol,
    pub ty: Type,
    pub line: u32,
    pub column: u32,
}

/// What kind of operator (if any) a `Prototype` declares — expression
/// dialect only: `def prototype expression` may be a plain function, a
/// `unary <op>`, or a `binary <op> [precedence]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrototypeKind {
    Id,
    Unary,
    Binary,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Prototype {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub kind: PrototypeKind,
    /// Only meaningful when `kind == Binary`; `None` falls back to the
    /// module-global default precedence table.
    pub precedence: Option<i32>,
    pub line: u32,
    pub column: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub body: Stmt,
    /// `true` for a `def`-introduced expression-dialect function (always
    /// `f64`-valued, params as entry-block allocas), `false` for a
    /// `func`-introduced typed-dialect one. The two parsers never produce
    /// the other dialect's functions, so this is set once at construction
    /// and never inferred structurally.
    pub is_expression_dialect: bool,
    pub line: u32,
    pub column: u32,
}

/// A single unit's worth of items, in source order.
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    FunctionDef(FunctionDef),
    Prototype(Prototype),
    Extern(Prototype),
    /// Expression dialect only; the anonymous `__anon_expr` wrapper name is
    /// applied by the driver/codegen, not carried here.
    TopLevelExpr(Expr),
}
