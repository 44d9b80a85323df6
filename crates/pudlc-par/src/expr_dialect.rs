//! Parser for the Kaleidoscope-style expression dialect. Unlike the typed
//! dialect, name resolution (`locals`/shadow-stack) happens at code
//! generation time, not here — this parser only builds the AST and tracks
//! the one thing that must survive across top-level items in a REPL
//! session: the `binary`/`unary` operator-precedence table.

use pudlc_ast::{
    BinOp, Expr, ExprKind, FunctionDef, Item, Param, Prototype, PrototypeKind, Stmt, StmtKind,
    Type, VarBinding,
};
use pudlc_lex::{Lexer, Token, TokenKind};
use pudlc_util::{Handler, Symbol};

use crate::precedence::PrecedenceTable;

/// Result of asking for the next top-level item: distinguishes end-of-input
/// from "this item failed to parse, caller should keep going". On any parse
/// error the parser consumes one token and continues.
pub enum NextItem {
    Item(Item),
    Eof,
}

pub struct ExprParser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    handler: Handler,
    precedence: PrecedenceTable,
}

impl<'src> ExprParser<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(source);
        let current = lexer.lex(&mut handler);
        ExprParser {
            lexer,
            current,
            handler,
            precedence: PrecedenceTable::new(),
        }
    }

    pub fn into_handler(self) -> Handler {
        self.handler
    }

    pub fn has_errors(&self) -> bool {
        self.handler.has_errors()
    }

    /// Diagnostics accumulated so far, without consuming the parser — the
    /// REPL driver calls this after each [`Self::next_item`] to report a
    /// failed item's diagnostics immediately instead of waiting for EOF.
    pub fn diagnostics(&self) -> &[pudlc_util::Diagnostic] {
        self.handler.diagnostics()
    }

    /// Parses source until no items remain, skipping `;` and recovering
    /// from an erroring item by skipping one token. Used by
    /// tests and by a purely-batch entry point; the REPL driver instead
    /// calls [`Self::next_item`] once per loop iteration so it can act
    /// between items (JIT-add a `def`, reinitialize the module, and so on).
    pub fn parse_all(&mut self) -> Vec<Item> {
        let mut items = Vec::new();
        loop {
            match self.next_item() {
                NextItem::Item(item) => items.push(item),
                NextItem::Eof => break,
            }
        }
        items
    }

    pub fn next_item(&mut self) -> NextItem {
        loop {
            if self.at_eof() {
                return NextItem::Eof;
            }
            if matches!(self.current.kind, TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            let before = self.lexer_position_marker();
            tracing::debug!(line = before.0, column = before.1, "parsing top-level item");
            let item = match self.current.kind {
                TokenKind::Def => self.parse_def(),
                TokenKind::Extern => self.parse_extern(),
                _ => self.parse_top_level_expr(),
            };
            match item {
                Some(item) => {
                    tracing::debug!("finished parsing top-level item");
                    return NextItem::Item(item);
                }
                None => {
                    if self.lexer_position_marker() == before && !self.at_eof() {
                        self.advance();
                    }
                    continue;
                }
            }
        }
    }

    // -- token plumbing --

    fn advance(&mut self) -> Token {
        let next = self.lexer.lex(&mut self.handler);
        std::mem::replace(&mut self.current, next)
    }

    fn at_eof(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    /// A cheap proxy for "has the cursor moved", used by `next_item`'s
    /// one-token recovery so a production that fails without consuming
    /// anything still guarantees forward progress.
    fn lexer_position_marker(&self) -> (u32, u32) {
        (self.current.line, self.current.column)
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let (line, column) = (self.current.line, self.current.column);
        self.handler.error(message, line, column);
    }

    fn expect_token(&mut self, expected: &TokenKind, what: &str) -> bool {
        if std::mem::discriminant(&self.current.kind) == std::mem::discriminant(expected) {
            self.advance();
            true
        } else {
            let got = self.current.lexeme.clone();
            self.error_here(format!("expected {what} but given '{got}'"));
            false
        }
    }

    fn expect_ident(&mut self) -> Option<Symbol> {
        if let TokenKind::Ident(sym) = self.current.kind {
            self.advance();
            Some(sym)
        } else {
            self.error_here(format!(
                "expected identifier but given '{}'",
                self.current.lexeme
            ));
            None
        }
    }

    /// The canonical text of an operator-ish token, used both to recognize
    /// `binary <op>`/`unary <op>` declarations and to drive the
    /// precedence-climbing loop below. Anything that can't plausibly be an
    /// operator symbol (parens, identifiers, `in`/`then`/…) returns `None`.
    fn operator_symbol(&self) -> Option<&'static str> {
        Some(match self.current.kind {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Caret => "^",
            TokenKind::Bang => "!",
            TokenKind::Assign => "=",
            TokenKind::Colon => ":",
            _ => return None,
        })
    }

    fn expect_operator_symbol(&mut self) -> Option<&'static str> {
        match self.operator_symbol() {
            Some(sym) => {
                self.advance();
                Some(sym)
            }
            None => {
                self.error_here(format!(
                    "expected an operator symbol but given '{}'",
                    self.current.lexeme
                ));
                None
            }
        }
    }

    // -- top level --

    /// `def prototype expression`. The prototype's body is wrapped as a
    /// single `Return` statement so it fits the one `FunctionDef { body:
    /// Stmt }` shape shared with the typed dialect; `is_expression_dialect:
    /// true` tells codegen to lower the `Return`'s expression with the
    /// expression-dialect rules, not the typed dialect's return-cast rule.
    fn parse_def(&mut self) -> Option<Item> {
        self.advance(); // 'def'
        let proto = self.parse_prototype()?;
        if proto.kind == PrototypeKind::Binary {
            let op = proto.name.as_str().trim_start_matches("binary");
            self.precedence.set(op.to_string(), proto.precedence.unwrap_or(30));
        }
        let body_expr = self.parse_expression()?;
        let (line, column) = (proto.line, proto.column);
        let body = Stmt::new(StmtKind::Return(body_expr), line, column);
        Some(Item::FunctionDef(FunctionDef {
            name: proto.name,
            params: proto.params,
            return_type: Type::Float,
            body,
            is_expression_dialect: true,
            line,
            column,
        }))
    }

    fn parse_extern(&mut self) -> Option<Item> {
        self.advance(); // 'extern'
        let proto = self.parse_prototype()?;
        Some(Item::Extern(proto))
    }

    fn parse_top_level_expr(&mut self) -> Option<Item> {
        let expr = self.parse_expression()?;
        Some(Item::TopLevelExpr(expr))
    }

    /// `prototype := SYMBOL '(' idents ')' | 'binary' OP [INT] '(' idents ')'
    /// | 'unary' OP '(' idents ')'` — every parameter is untyped (`double`).
    fn parse_prototype(&mut self) -> Option<Prototype> {
        let (line, column) = (self.current.line, self.current.column);
        match self.current.kind {
            TokenKind::Binary => {
                self.advance();
                let op = self.expect_operator_symbol()?;
                let precedence = if let TokenKind::Int(n) = self.current.kind {
                    self.advance();
                    Some(n as i32)
                } else {
                    None
                };
                let params = self.parse_ident_params()?;
                if params.len() != 2 {
                    self.error_here("a 'binary' operator must declare exactly 2 parameters");
                    return None;
                }
                Some(Prototype {
                    name: Symbol::intern(&format!("binary{op}")),
                    params,
                    kind: PrototypeKind::Binary,
                    precedence,
                    line,
                    column,
                })
            }
            TokenKind::Unary => {
                self.advance();
                let op = self.expect_operator_symbol()?;
                let params = self.parse_ident_params()?;
                if params.len() != 1 {
                    self.error_here("a 'unary' operator must declare exactly 1 parameter");
                    return None;
                }
                Some(Prototype {
                    name: Symbol::intern(&format!("unary{op}")),
                    params,
                    kind: PrototypeKind::Unary,
                    precedence: None,
                    line,
                    column,
                })
            }
            TokenKind::Ident(name) => {
                self.advance();
                let params = self.parse_ident_params()?;
                Some(Prototype {
                    name,
                    params,
                    kind: PrototypeKind::Id,
                    precedence: None,
                    line,
                    column,
                })
            }
            _ => {
                self.error_here(format!(
                    "expected a prototype but given '{}'",
                    self.current.lexeme
                ));
                None
            }
        }
    }

    fn parse_ident_params(&mut self) -> Option<Vec<Param>> {
        if !self.expect_token(&TokenKind::LParen, "'('") {
            return None;
        }
        let mut params = Vec::new();
        while !matches!(self.current.kind, TokenKind::RParen) {
            let (line, column) = (self.current.line, self.current.column);
            let name = self.expect_ident()?;
            params.push(Param { name, ty: Type::Float, line, column });
        }
        if !self.expect_token(&TokenKind::RParen, "')'") {
            return None;
        }
        Some(params)
    }

    // -- expressions: precedence-climbing à la Kaleidoscope's ParseBinOpRHS --

    fn parse_expression(&mut self) -> Option<Expr> {
        let lhs = self.parse_unary()?;
        self.parse_bin_op_rhs(0, lhs)
    }

    fn parse_bin_op_rhs(&mut self, expr_prec: i32, mut lhs: Expr) -> Option<Expr> {
        loop {
            let Some(op) = self.operator_symbol() else {
                return Some(lhs);
            };
            let tok_prec = self.precedence.get(op);
            if tok_prec < expr_prec {
                return Some(lhs);
            }
            let (line, column) = (self.current.line, self.current.column);
            self.advance();

            let mut rhs = self.parse_unary()?;
            if let Some(next_op) = self.operator_symbol() {
                let next_prec = self.precedence.get(next_op);
                if tok_prec < next_prec {
                    rhs = self.parse_bin_op_rhs(tok_prec + 1, rhs)?;
                }
            }
            lhs = self.build_binary(op, lhs, rhs, line, column);
        }
    }

    fn build_binary(&mut self, op: &str, lhs: Expr, rhs: Expr, line: u32, column: u32) -> Expr {
        match op {
            "=" => {
                if !matches!(lhs.kind, ExprKind::Var(_)) {
                    self.handler
                        .error("destination of '=' must be a variable", line, column);
                }
                Expr::new(
                    ExprKind::Binary(BinOp::Assign, Box::new(lhs), Box::new(rhs)),
                    Type::Float,
                    line,
                    column,
                )
            }
            "+" => self.binary_node(BinOp::Add, lhs, rhs, line, column),
            "-" => self.binary_node(BinOp::Sub, lhs, rhs, line, column),
            "*" => self.binary_node(BinOp::Mul, lhs, rhs, line, column),
            "<" => self.binary_node(BinOp::Lt, lhs, rhs, line, column),
            other => {
                // Not a builtin: resolved as a user-defined `binary<op>` call.
                Expr::new(
                    ExprKind::Call(Symbol::intern(&format!("binary{other}")), vec![lhs, rhs]),
                    Type::Float,
                    line,
                    column,
                )
            }
        }
    }

    fn binary_node(&self, op: BinOp, lhs: Expr, rhs: Expr, line: u32, column: u32) -> Expr {
        Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), Type::Float, line, column)
    }

    /// Every unary operator in this dialect is user-defined (Kaleidoscope
    /// has no builtin unary operators, including `-`); a leading operator
    /// symbol that isn't the start of a primary expression is resolved as a
    /// call to `unary<op>`.
    fn parse_unary(&mut self) -> Option<Expr> {
        let (line, column) = (self.current.line, self.current.column);
        let starts_primary = matches!(
            self.current.kind,
            TokenKind::Ident(_)
                | TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::LParen
                | TokenKind::If
                | TokenKind::For
                | TokenKind::Var
        );
        if starts_primary || self.operator_symbol().is_none() {
            return self.parse_primary();
        }
        let op = self.expect_operator_symbol()?;
        let operand = self.parse_unary()?;
        Some(Expr::new(
            ExprKind::Call(Symbol::intern(&format!("unary{op}")), vec![operand]),
            Type::Float,
            line,
            column,
        ))
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let (line, column) = (self.current.line, self.current.column);
        match self.current.kind.clone() {
            TokenKind::Int(n) => {
                self.advance();
                Some(Expr::new(ExprKind::FloatLit(n as f32), Type::Float, line, column))
            }
            TokenKind::Float(f) => {
                self.advance();
                Some(Expr::new(ExprKind::FloatLit(f as f32), Type::Float, line, column))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                if !self.expect_token(&TokenKind::RParen, "')'") {
                    return None;
                }
                Some(inner)
            }
            TokenKind::Ident(name) => {
                self.advance();
                if matches!(self.current.kind, TokenKind::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if !matches!(self.current.kind, TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expression()?);
                            if matches!(self.current.kind, TokenKind::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    if !self.expect_token(&TokenKind::RParen, "')'") {
                        return None;
                    }
                    Some(Expr::new(ExprKind::Call(name, args), Type::Float, line, column))
                } else {
                    Some(Expr::new(ExprKind::Var(name), Type::Float, line, column))
                }
            }
            TokenKind::If => self.parse_if_expr(),
            TokenKind::For => self.parse_for_expr(),
            TokenKind::Var => self.parse_var_expr(),
            _ => {
                self.error_here(format!(
                    "expected an expression but given '{}'",
                    self.current.lexeme
                ));
                None
            }
        }
    }

    /// `if expr then expr else expr`
    fn parse_if_expr(&mut self) -> Option<Expr> {
        let (line, column) = (self.current.line, self.current.column);
        self.advance(); // 'if'
        let cond = self.parse_expression()?;
        if !self.expect_token(&TokenKind::Then, "'then'") {
            return None;
        }
        let then = self.parse_expression()?;
        if !self.expect_token(&TokenKind::Else, "'else'") {
            return None;
        }
        let else_ = self.parse_expression()?;
        Some(Expr::new(
            ExprKind::If {
                cond: Box::new(cond),
                then: Box::new(then),
                else_: Box::new(else_),
            },
            Type::Float,
            line,
            column,
        ))
    }

    /// `for id '=' expr ',' expr (',' expr)? in expr`
    fn parse_for_expr(&mut self) -> Option<Expr> {
        let (line, column) = (self.current.line, self.current.column);
        self.advance(); // 'for'
        let var = self.expect_ident()?;
        if !self.expect_token(&TokenKind::Assign, "'='") {
            return None;
        }
        let start = self.parse_expression()?;
        if !self.expect_token(&TokenKind::Comma, "','") {
            return None;
        }
        let end = self.parse_expression()?;
        let step = if matches!(self.current.kind, TokenKind::Comma) {
            self.advance();
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        if !self.expect_token(&TokenKind::In, "'in'") {
            return None;
        }
        let body = self.parse_expression()?;
        Some(Expr::new(
            ExprKind::For {
                var,
                start: Box::new(start),
                end: Box::new(end),
                step,
                body: Box::new(body),
            },
            Type::Float,
            line,
            column,
        ))
    }

    /// `var TYPE id ('=' expr)? (',' id ('=' expr)?)* in expr`. The leading
    /// `TYPE` is parsed and discarded — every binding is a `double` in this
    /// dialect regardless of which type keyword appears here.
    fn parse_var_expr(&mut self) -> Option<Expr> {
        let (line, column) = (self.current.line, self.current.column);
        self.advance(); // 'var'
        self.skip_type_keyword();

        let mut bindings = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let init = if matches!(self.current.kind, TokenKind::Assign) {
                self.advance();
                Some(self.parse_expression()?)
            } else {
                None
            };
            bindings.push(VarBinding { name, init });
            if matches!(self.current.kind, TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        if !self.expect_token(&TokenKind::In, "'in'") {
            return None;
        }
        let body = self.parse_expression()?;
        Some(Expr::new(
            ExprKind::VarExpr { bindings, body: Box::new(body) },
            Type::Float,
            line,
            column,
        ))
    }

    fn skip_type_keyword(&mut self) {
        if matches!(
            self.current.kind,
            TokenKind::TypeInt | TokenKind::TypeFloat | TokenKind::TypeBool | TokenKind::TypeAuto
        ) {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_def_and_call() {
        let mut parser = ExprParser::new("def foo(x) x + 1; foo(41);");
        let items = parser.parse_all();
        assert!(!parser.has_errors());
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Item::FunctionDef(_)));
        assert!(matches!(items[1], Item::TopLevelExpr(_)));
    }

    #[test]
    fn fibonacci_recursion_parses() {
        let mut parser =
            ExprParser::new("def fib(n) if n < 2 then n else fib(n-1)+fib(n-2); fib(10);");
        let items = parser.parse_all();
        assert!(!parser.has_errors());
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn custom_binary_operator_is_resolved_as_a_call() {
        let mut parser = ExprParser::new("def binary: 1 (x y) y; 1:2;");
        let items = parser.parse_all();
        assert!(!parser.has_errors());
        let Item::TopLevelExpr(expr) = &items[1] else {
            panic!("expected a top-level expression");
        };
        match &expr.kind {
            ExprKind::Call(name, args) => {
                assert_eq!(name.as_str(), "binary:");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected a call to binary:, got {other:?}"),
        }
    }

    #[test]
    fn precedence_declaration_affects_later_parses() {
        let mut parser = ExprParser::new("def binary* 50 (x y) x; 1 + 2 * 3;");
        let items = parser.parse_all();
        assert!(!parser.has_errors());
        let Item::TopLevelExpr(expr) = &items[1] else {
            panic!("expected a top-level expression");
        };
        // '*' now binds tighter than '+' by a wider margin but associativity
        // and grouping still put it on the right: 1 + (2 * 3).
        match &expr.kind {
            ExprKind::Binary(BinOp::Add, _, rhs) => {
                assert!(matches!(rhs.kind, ExprKind::Call(_, _)));
            }
            other => panic!("expected 1 + binary*(2, 3), got {other:?}"),
        }
    }

    #[test]
    fn var_expression_parses_bindings_and_body() {
        let mut parser = ExprParser::new("var auto x = 1, y = 2 in x + y;");
        let items = parser.parse_all();
        assert!(!parser.has_errors());
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn semicolons_between_items_are_skipped() {
        let mut parser = ExprParser::new(";;; 42 ;;;");
        let items = parser.parse_all();
        assert!(!parser.has_errors());
        assert_eq!(items.len(), 1);
    }
}
