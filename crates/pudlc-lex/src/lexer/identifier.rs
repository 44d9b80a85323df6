use super::core::Lexer;
use crate::token::{keyword_from_ident, TokenKind};
use pudlc_util::Symbol;

impl<'src> Lexer<'src> {
    /// `[A-Za-z_][A-Za-z0-9_]*`, checked against the reserved word table;
    /// anything else becomes `TokenKind::Ident`.
    pub(super) fn lex_identifier(&mut self) -> TokenKind {
        let start = self.position();
        while self.current_char().is_ascii_alphanumeric() || self.current_char() == '_' {
            self.advance();
        }
        let text = self.token_text(start);
        keyword_from_ident(text).unwrap_or_else(|| TokenKind::Ident(Symbol::intern(text)))
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::Lexer;
    use crate::token::TokenKind;
    use pudlc_util::{Handler, Symbol};

    fn lex_one(src: &str) -> TokenKind {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(src);
        lexer.lex(&mut handler).kind
    }

    #[test]
    fn plain_identifier() {
        assert_eq!(lex_one("counter"), TokenKind::Ident(Symbol::intern("counter")));
    }

    #[test]
    fn identifier_with_underscore_and_digits() {
        assert_eq!(
            lex_one("_tmp_1"),
            TokenKind::Ident(Symbol::intern("_tmp_1"))
        );
    }

    #[test]
    fn statement_keywords() {
        for (text, expected) in [
            ("func", TokenKind::Func),
            ("if", TokenKind::If),
            ("else", TokenKind::Else),
            ("do", TokenKind::Do),
            ("while", TokenKind::While),
            ("return", TokenKind::Return),
            ("print", TokenKind::Print),
        ] {
            assert_eq!(lex_one(text), expected, "lexing {text:?}");
        }
    }

    #[test]
    fn expression_dialect_keywords() {
        for (text, expected) in [
            ("def", TokenKind::Def),
            ("extern", TokenKind::Extern),
            ("then", TokenKind::Then),
            ("for", TokenKind::For),
            ("in", TokenKind::In),
            ("binary", TokenKind::Binary),
            ("unary", TokenKind::Unary),
            ("var", TokenKind::Var),
        ] {
            assert_eq!(lex_one(text), expected, "lexing {text:?}");
        }
    }

    #[test]
    fn type_and_boolean_keywords() {
        for (text, expected) in [
            ("int", TokenKind::TypeInt),
            ("float", TokenKind::TypeFloat),
            ("bool", TokenKind::TypeBool),
            ("auto", TokenKind::TypeAuto),
            ("True", TokenKind::True),
            ("False", TokenKind::False),
        ] {
            assert_eq!(lex_one(text), expected, "lexing {text:?}");
        }
    }

    #[test]
    fn lowercase_true_false_are_identifiers_not_keywords() {
        // Only the capitalized forms are reserved.
        assert_eq!(lex_one("true"), TokenKind::Ident(Symbol::intern("true")));
        assert_eq!(lex_one("false"), TokenKind::Ident(Symbol::intern("false")));
    }
}
