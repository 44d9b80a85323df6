//! Typed AST shared by both Pudl dialects and by code generation. Split out
//! of the parser crate so the driver's `--print-ir`-adjacent tooling and the
//! code generator can depend on node shapes without pulling in parsing
//! machinery.

mod expr;
mod item;
mod stmt;
mod ty;

pub use expr::{BinOp, Expr, ExprKind, UnOp, VarBinding};
pub use item::{FunctionDef, Item, Param, Prototype, PrototypeKind};
pub use stmt::{Stmt, StmtKind};
pub use ty::Type;
