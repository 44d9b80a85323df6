//! Recursive-descent parser for the C-like typed dialect, with the type
//! checker embedded directly in expression construction rather than run as
//! a separate pass.

use rustc_hash::FxHashMap;

use pudlc_ast::{
    BinOp, Expr, ExprKind, FunctionDef, Param, Stmt, StmtKind, Type, UnOp,
};
use pudlc_lex::{Lexer, Token, TokenKind};
use pudlc_util::{Handler, Symbol};

struct FunctionSignature {
    params: Vec<Type>,
    return_type: Type,
}

/// Parses one source file of the typed dialect into a list of
/// `FunctionDef`s. Scope (`locals`) is reset at each function boundary; the
/// module-level `functions` table persists for the whole parse so calls
/// (including recursive and forward calls within the same unit) resolve.
pub struct TypedParser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    handler: Handler,
    locals: FxHashMap<Symbol, Type>,
    functions: FxHashMap<Symbol, FunctionSignature>,
}

impl<'src> TypedParser<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(source);
        let current = lexer.lex(&mut handler);
        TypedParser {
            lexer,
            current,
            handler,
            locals: FxHashMap::default(),
            functions: FxHashMap::default(),
        }
    }

    pub fn into_handler(self) -> Handler {
        self.handler
    }

    pub fn has_errors(&self) -> bool {
        self.handler.has_errors()
    }

    /// `unit := function-def*`. Recovers from a bad top-level item by
    /// skipping to the next `func` keyword.
    pub fn parse_unit(&mut self) -> Vec<FunctionDef> {
        let mut items = Vec::new();
        while !self.at_eof() {
            match self.parse_function_def() {
                Some(def) => items.push(def),
                None => self.recover_to_sync_point(),
            }
        }
        items
    }

    fn recover_to_sync_point(&mut self) {
        while !self.at_eof() && !matches!(self.current.kind, TokenKind::Func) {
            self.advance();
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

    fn error_here(&mut self, message: impl Into<String>) {
        let (line, column) = (self.current.line, self.current.column);
        self.handler.error(message, line, column);
    }

    fn expect_token(&mut self, expected: &TokenKind, what: &str) -> bool {
        if std::mem::discriminant(&self.current.kind) == std::mem::discriminant(expected) {
            self.advance();
            true
        } else {
            let (line, column) = (self.current.line, self.current.column);
            let got = self.current.lexeme.clone();
            self.handler.error(
                format!("expected {what} but given '{got}'"),
                line,
                column,
            );
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

    fn parse_type_keyword(&mut self) -> Option<Type> {
        let ty = match self.current.kind {
            TokenKind::TypeInt => Type::Integer,
            TokenKind::TypeFloat => Type::Float,
            TokenKind::TypeBool => Type::Bool,
            TokenKind::TypeAuto => Type::Undefined,
            _ => {
                self.error_here(format!(
                    "expected a type but given '{}'",
                    self.current.lexeme
                ));
                return None;
            }
        };
        self.advance();
        Some(ty)
    }

    // -- top level --

    /// `function-def := 'func' SYMBOL ('(' params ')')? ':' TYPE statement`
    fn parse_function_def(&mut self) -> Option<FunctionDef> {
        let (line, column) = (self.current.line, self.current.column);
        if !self.expect_token(&TokenKind::Func, "'func'") {
            return None;
        }
        let name = self.expect_ident()?;
        tracing::debug!(name = %name, line, column, "parsing function definition");

        let params = if matches!(self.current.kind, TokenKind::LParen) {
            self.advance();
            let params = self.parse_params()?;
            if !self.expect_token(&TokenKind::RParen, "')'") {
                return None;
            }
            params
        } else {
            Vec::new()
        };

        if !self.expect_token(&TokenKind::Colon, "':'") {
            return None;
        }
        let return_type = self.parse_type_keyword()?;
        if return_type == Type::Undefined {
            self.error_here("function return type cannot be 'auto'");
            return None;
        }

        self.functions.insert(
            name,
            FunctionSignature {
                params: params.iter().map(|p| p.ty).collect(),
                return_type,
            },
        );

        self.locals.clear();
        for p in &params {
            self.locals.insert(p.name, p.ty);
        }

        let body = self.parse_statement()?;

        tracing::debug!(name = %name, "finished parsing function definition");
        Some(FunctionDef {
            name,
            params,
            return_type,
            body,
            is_expression_dialect: false,
            line,
            column,
        })
    }

    fn parse_params(&mut self) -> Option<Vec<Param>> {
        let mut params = Vec::new();
        if matches!(self.current.kind, TokenKind::RParen) {
            return Some(params);
        }
        loop {
            let (line, column) = (self.current.line, self.current.column);
            let ty = self.parse_type_keyword()?;
            let name = self.expect_ident()?;
            params.push(Param { name, ty, line, column });
            if matches!(self.current.kind, TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Some(params)
    }

    // -- statements --

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.current.kind {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::Print => self.parse_print(),
            TokenKind::Return => self.parse_return(),
            TokenKind::TypeInt | TokenKind::TypeFloat | TokenKind::TypeBool | TokenKind::TypeAuto => {
                self.parse_declaration()
            }
            TokenKind::Ident(_) => self.parse_assignment_or_call(),
            _ => {
                self.error_here(format!(
                    "expected a statement but given '{}'",
                    self.current.lexeme
                ));
                None
            }
        }
    }

    fn skip_optional_semicolon(&mut self) {
        if matches!(self.current.kind, TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn parse_block(&mut self) -> Option<Stmt> {
        let (line, column) = (self.current.line, self.current.column);
        self.advance(); // '{'
        let mut stmts = Vec::new();
        while !matches!(self.current.kind, TokenKind::RBrace) {
            if self.at_eof() {
                self.error_here("unterminated block, expected '}'");
                return None;
            }
            stmts.push(self.parse_statement()?);
        }
        self.advance(); // '}'
        Some(Stmt::new(StmtKind::Block(stmts), line, column))
    }

    fn parse_if(&mut self) -> Option<Stmt> {
        let (line, column) = (self.current.line, self.current.column);
        self.advance(); // 'if'
        let cond = self.parse_condition()?;
        let then = Box::new(self.parse_statement()?);
        let else_ = if matches!(self.current.kind, TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Some(Stmt::new(StmtKind::If { cond, then, else_ }, line, column))
    }

    fn parse_while(&mut self) -> Option<Stmt> {
        let (line, column) = (self.current.line, self.current.column);
        self.advance(); // 'while'
        let cond = self.parse_condition()?;
        let body = Box::new(self.parse_statement()?);
        Some(Stmt::new(StmtKind::While { cond, body }, line, column))
    }

    fn parse_do_while(&mut self) -> Option<Stmt> {
        let (line, column) = (self.current.line, self.current.column);
        self.advance(); // 'do'
        let body = Box::new(self.parse_statement()?);
        if !self.expect_token(&TokenKind::While, "'while'") {
            return None;
        }
        let cond = self.parse_condition()?;
        Some(Stmt::new(StmtKind::DoWhile { body, cond }, line, column))
    }

    fn parse_condition(&mut self) -> Option<Expr> {
        let cond = self.parse_expression()?;
        if cond.ty != Type::Bool {
            self.handler.error(
                format!("condition must be bool, found {}", cond.ty),
                cond.line,
                cond.column,
            );
        }
        Some(cond)
    }

    fn parse_print(&mut self) -> Option<Stmt> {
        let (line, column) = (self.current.line, self.current.column);
        self.advance(); // 'print'
        let expr = self.parse_expression()?;
        self.skip_optional_semicolon();
        Some(Stmt::new(StmtKind::Print(expr), line, column))
    }

    fn parse_return(&mut self) -> Option<Stmt> {
        let (line, column) = (self.current.line, self.current.column);
        self.advance(); // 'return'
        let expr = self.parse_expression()?;
        self.skip_optional_semicolon();
        Some(Stmt::new(StmtKind::Return(expr), line, column))
    }

    /// `declaration := TYPE SYMBOL '=' expression`
    fn parse_declaration(&mut self) -> Option<Stmt> {
        let (line, column) = (self.current.line, self.current.column);
        let declared = self.parse_type_keyword()?;
        let name = self.expect_ident()?;
        if !self.expect_token(&TokenKind::Assign, "'='") {
            return None;
        }
        let rhs = self.parse_expression()?;
        let ty = if declared == Type::Undefined {
            rhs.ty
        } else {
            declared
        };
        if !assignable(ty, rhs.ty) {
            self.handler.error(
                format!("cannot initialize {ty} variable with {} value", rhs.ty),
                rhs.line,
                rhs.column,
            );
        }
        self.locals.insert(name, ty);
        self.skip_optional_semicolon();
        Some(Stmt::new(StmtKind::Assign { name, ty, rhs }, line, column))
    }

    /// `assignment := SYMBOL '=' expression | call`; a bare call becomes an
    /// `ExprStmt`, code-generated for its side effects rather than dropped.
    fn parse_assignment_or_call(&mut self) -> Option<Stmt> {
        let (line, column) = (self.current.line, self.current.column);
        let name = self.expect_ident()?;

        if matches!(self.current.kind, TokenKind::LParen) {
            let call = self.parse_call(name, line, column)?;
            self.skip_optional_semicolon();
            return Some(Stmt::new(StmtKind::ExprStmt(call), line, column));
        }

        if !self.expect_token(&TokenKind::Assign, "'='") {
            return None;
        }
        let ty = match self.locals.get(&name) {
            Some(ty) => *ty,
            None => {
                self.handler
                    .error(format!("undefined variable '{name}'"), line, column);
                Type::Undefined
            }
        };
        let rhs = self.parse_expression()?;
        if ty != Type::Undefined && !assignable(ty, rhs.ty) {
            self.handler.error(
                format!("cannot assign {} value to {ty} variable", rhs.ty),
                rhs.line,
                rhs.column,
            );
        }
        self.skip_optional_semicolon();
        Some(Stmt::new(StmtKind::Assign { name, ty, rhs }, line, column))
    }

    // -- expressions: precedence-climbing, right-recursive --

    fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_lor()
    }

    /// `^` (logical xor) has no tier of its own in the grammar on its own;
    /// it sits alongside `||` here since both are logical-Bool operators at
    /// the loosest precedence.
    fn parse_lor(&mut self) -> Option<Expr> {
        let lhs = self.parse_land()?;
        let op = match self.current.kind {
            TokenKind::OrOr => BinOp::Or,
            TokenKind::Caret => BinOp::Xor,
            _ => return Some(lhs),
        };
        let (line, column) = (self.current.line, self.current.column);
        self.advance();
        let rhs = self.parse_lor()?;
        Some(self.build_logical(op, lhs, rhs, line, column))
    }

    fn parse_land(&mut self) -> Option<Expr> {
        let lhs = self.parse_cmpeq()?;
        if !matches!(self.current.kind, TokenKind::AndAnd) {
            return Some(lhs);
        }
        let (line, column) = (self.current.line, self.current.column);
        self.advance();
        let rhs = self.parse_land()?;
        Some(self.build_logical(BinOp::And, lhs, rhs, line, column))
    }

    fn parse_cmpeq(&mut self) -> Option<Expr> {
        let lhs = self.parse_cmp()?;
        let op = match self.current.kind {
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::NotEq => BinOp::Ne,
            _ => return Some(lhs),
        };
        let (line, column) = (self.current.line, self.current.column);
        self.advance();
        let rhs = self.parse_cmpeq()?;
        Some(self.build_relational(op, lhs, rhs, line, column))
    }

    fn parse_cmp(&mut self) -> Option<Expr> {
        let lhs = self.parse_add()?;
        let op = match self.current.kind {
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::LtEq => BinOp::Le,
            TokenKind::GtEq => BinOp::Ge,
            _ => return Some(lhs),
        };
        let (line, column) = (self.current.line, self.current.column);
        self.advance();
        let rhs = self.parse_cmp()?;
        Some(self.build_relational(op, lhs, rhs, line, column))
    }

    fn parse_add(&mut self) -> Option<Expr> {
        let lhs = self.parse_mul()?;
        let op = match self.current.kind {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            _ => return Some(lhs),
        };
        let (line, column) = (self.current.line, self.current.column);
        self.advance();
        let rhs = self.parse_add()?;
        Some(self.build_arithmetic(op, lhs, rhs, line, column))
    }

    fn parse_mul(&mut self) -> Option<Expr> {
        let lhs = self.parse_unary()?;
        let op = match self.current.kind {
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            _ => return Some(lhs),
        };
        let (line, column) = (self.current.line, self.current.column);
        self.advance();
        let rhs = self.parse_mul()?;
        Some(self.build_arithmetic(op, lhs, rhs, line, column))
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let (line, column) = (self.current.line, self.current.column);
        let op = match self.current.kind {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Bang => Some(UnOp::Not),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_factor();
        };
        self.advance();
        let sub = self.parse_factor()?;
        let ty = match op {
            UnOp::Neg => {
                if !sub.ty.is_numeric() {
                    self.handler.error(
                        format!("unary '-' requires a numeric operand, found {}", sub.ty),
                        line,
                        column,
                    );
                }
                sub.ty
            }
            UnOp::Not => {
                if sub.ty != Type::Bool {
                    self.handler.error(
                        format!("unary '!' requires a bool operand, found {}", sub.ty),
                        line,
                        column,
                    );
                }
                Type::Bool
            }
        };
        Some(Expr::new(ExprKind::Unary(op, Box::new(sub)), ty, line, column))
    }

    fn parse_factor(&mut self) -> Option<Expr> {
        let (line, column) = (self.current.line, self.current.column);
        match self.current.kind.clone() {
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                if !self.expect_token(&TokenKind::RParen, "')'") {
                    return None;
                }
                Some(inner)
            }
            TokenKind::Int(n) => {
                self.advance();
                Some(Expr::new(ExprKind::IntLit(n as i32), Type::Integer, line, column))
            }
            TokenKind::Float(f) => {
                self.advance();
                Some(Expr::new(ExprKind::FloatLit(f as f32), Type::Float, line, column))
            }
            TokenKind::True => {
                self.advance();
                Some(Expr::new(ExprKind::BoolLit(true), Type::Bool, line, column))
            }
            TokenKind::False => {
                self.advance();
                Some(Expr::new(ExprKind::BoolLit(false), Type::Bool, line, column))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if matches!(self.current.kind, TokenKind::LParen) {
                    self.parse_call(name, line, column)
                } else {
                    let ty = match self.locals.get(&name) {
                        Some(ty) => *ty,
                        None => {
                            self.handler.error(
                                format!("undefined variable '{name}'"),
                                line,
                                column,
                            );
                            Type::Undefined
                        }
                    };
                    Some(Expr::new(ExprKind::Var(name), ty, line, column))
                }
            }
            _ => {
                self.error_here(format!(
                    "expected an expression but given '{}'",
                    self.current.lexeme
                ));
                None
            }
        }
    }

    /// `call := SYMBOL '(' (expression (',' expression)*)? ')'`
    fn parse_call(&mut self, name: Symbol, line: u32, column: u32) -> Option<Expr> {
        self.advance(); // '('
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

        let return_type = match self.functions.get(&name) {
            Some(sig) => {
                if sig.params.len() != args.len() {
                    self.handler.error(
                        format!(
                            "function '{name}' expects {} argument(s), found {}",
                            sig.params.len(),
                            args.len()
                        ),
                        line,
                        column,
                    );
                }
                sig.return_type
            }
            None => {
                self.handler
                    .error(format!("undefined function '{name}'"), line, column);
                Type::Undefined
            }
        };
        Some(Expr::new(ExprKind::Call(name, args), return_type, line, column))
    }

    // -- type-checked node builders --

    fn build_logical(&mut self, op: BinOp, lhs: Expr, rhs: Expr, line: u32, column: u32) -> Expr {
        if lhs.ty != Type::Bool || rhs.ty != Type::Bool {
            self.handler.error(
                "logical operators require bool operands".to_string(),
                line,
                column,
            );
        }
        Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), Type::Bool, line, column)
    }

    fn build_relational(&mut self, op: BinOp, lhs: Expr, rhs: Expr, line: u32, column: u32) -> Expr {
        if lhs.ty == Type::Bool || rhs.ty == Type::Bool {
            self.handler
                .error("comparison rejects bool operands".to_string(), line, column);
        }
        Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), Type::Bool, line, column)
    }

    fn build_arithmetic(&mut self, op: BinOp, lhs: Expr, rhs: Expr, line: u32, column: u32) -> Expr {
        if lhs.ty == Type::Bool || rhs.ty == Type::Bool {
            self.handler
                .error("arithmetic rejects bool operands".to_string(), line, column);
            return Expr::new(
                ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)),
                Type::Undefined,
                line,
                column,
            );
        }
        let ty = Type::promote(lhs.ty, rhs.ty);
        Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), ty, line, column)
    }
}

fn assignable(declared: Type, given: Type) -> bool {
    (declared == Type::Bool) == (given == Type::Bool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> (Vec<FunctionDef>, bool) {
        let mut parser = TypedParser::new(src);
        let items = parser.parse_unit();
        let has_errors = parser.has_errors();
        (items, has_errors)
    }

    #[test]
    fn parses_minimal_function() {
        let (items, errors) = parse("func mast(): int { return 1 + 2 * 3; }");
        assert!(!errors);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].return_type, Type::Integer);
    }

    #[test]
    fn while_loop_accumulator_parses_without_errors() {
        let (items, errors) = parse(
            "func mast(): int { int x = 0; int i = 0; while i < 10 { x = x + i; i = i + 1; } return x; }",
        );
        assert!(!errors);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn bool_in_arithmetic_is_a_type_error() {
        let (_, errors) = parse("func mast(): int { bool b = 1 + 2; return 0; }");
        assert!(errors);
    }

    #[test]
    fn print_statement_parses() {
        let (items, errors) = parse("func mast(): int { print 3.5; return 0; }");
        assert!(!errors);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn bare_call_statement_is_expr_stmt() {
        let (items, errors) = parse(
            "func helper(): int { return 1; } func mast(): int { helper(); return 0; }",
        );
        assert!(!errors);
        let body = &items[1].body;
        match &body.kind {
            StmtKind::Block(stmts) => {
                assert!(matches!(stmts[0].kind, StmtKind::ExprStmt(_)));
            }
            _ => panic!("expected a block body"),
        }
    }

    #[test]
    fn undefined_variable_is_reported() {
        let (_, errors) = parse("func mast(): int { return y; }");
        assert!(errors);
    }

    #[test]
    fn arity_mismatch_is_reported() {
        let (_, errors) = parse(
            "func add(int a, int b): int { return a + b; } func mast(): int { return add(1); }",
        );
        assert!(errors);
    }

    #[test]
    fn auto_declaration_infers_type_from_initializer() {
        let (items, errors) = parse("func mast(): int { auto x = 3.5; return 0; }");
        assert!(!errors);
        let body = &items[0].body;
        match &body.kind {
            StmtKind::Block(stmts) => match &stmts[0].kind {
                StmtKind::Assign { ty, .. } => assert_eq!(*ty, Type::Float),
                _ => panic!("expected a declaration"),
            },
            _ => panic!("expected a block body"),
        }
    }

    #[test]
    fn xor_operator_type_checks_as_logical() {
        let (_, errors) = parse("func mast(): int { bool b = True ^ False; return 0; }");
        assert!(!errors);
    }
}
