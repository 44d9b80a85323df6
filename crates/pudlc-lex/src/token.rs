//! Token kinds (`Token { kind, lexeme, line, column }`).
//!
//! One enum covers both dialects: the typed dialect's `func`/`if`/`while`
//! keywords and the expression dialect's `def`/`extern`/`for`/`var` keywords
//! coexist here, since both parsers share a single lexer — there is no
//! benefit to two lexers, as the reserved-word set is a strict union and a
//! token the typed parser never produces is simply never consumed there.

use pudlc_util::Symbol;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Literals and identifiers.
    Ident(Symbol),
    Int(i64),
    Float(f64),
    True,
    False,

    // Typed-dialect statement keywords.
    Func,
    If,
    Else,
    Do,
    While,
    Return,
    Print,
    Read,

    // Expression-dialect keywords.
    Def,
    Extern,
    Then,
    For,
    In,
    Binary,
    Unary,
    Var,

    // Type keywords.
    TypeInt,
    TypeFloat,
    TypeBool,
    TypeAuto,

    // Operators.
    Plus,
    Minus,
    Star,
    Slash,
    AndAnd,
    OrOr,
    Caret, // logical xor
    Bang,  // logical not
    Assign,
    Lt,
    Gt,
    LtEq,
    GtEq,
    EqEq,
    NotEq,

    // Punctuation.
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Colon,

    Eof,
    /// Unrecognized or malformed lexeme; carries the offending text so the
    /// parser can surface it in a diagnostic and continue.
    Error(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32, column: u32) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

/// Maps an identifier's raw text onto a reserved-word token, if any.
/// Multi-character lexemes are never ambiguous with identifiers so this is
/// a simple table lookup, not a precedence question (unlike the operator
/// lexing in `lexer::operator`, where `==` must be preferred over `=`).
pub fn keyword_from_ident(text: &str) -> Option<TokenKind> {
    Some(match text {
        "func" => TokenKind::Func,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "do" => TokenKind::Do,
        "while" => TokenKind::While,
        "return" => TokenKind::Return,
        "print" => TokenKind::Print,
        "read" => TokenKind::Read,
        "def" => TokenKind::Def,
        "extern" => TokenKind::Extern,
        "then" => TokenKind::Then,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "binary" => TokenKind::Binary,
        "unary" => TokenKind::Unary,
        "var" => TokenKind::Var,
        "int" => TokenKind::TypeInt,
        "float" => TokenKind::TypeFloat,
        "bool" => TokenKind::TypeBool,
        "auto" => TokenKind::TypeAuto,
        "True" => TokenKind::True,
        "False" => TokenKind::False,
        _ => return None,
    })
}
