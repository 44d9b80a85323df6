//! Recursive-descent parsers for both Pudl front ends, plus the
//! operator-precedence table shared across one expression-dialect session.
//! Each parser owns its `Lexer` and `Handler` directly rather than
//! threading them through a caller-held borrow — see `pudlc_lex::Lexer`'s
//! doc comment for why the handler is passed by value, not reference.

mod expr_dialect;
mod precedence;
mod typed;

pub use expr_dialect::{ExprParser, NextItem};
pub use precedence::PrecedenceTable;
pub use typed::TypedParser;
