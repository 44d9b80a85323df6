use super::core::Lexer;
use crate::token::TokenKind;
use pudlc_util::Handler;

impl<'src> Lexer<'src> {
    /// `[0-9]+` → integer; `[0-9]+.[0-9]*` or `.[0-9]+` → float. Dispatch
    /// already guarantees the cursor is on a digit, or on a `.` immediately
    /// followed by a digit.
    pub(super) fn lex_number(&mut self, handler: &mut Handler) -> TokenKind {
        let start = self.position();
        let (start_line, start_col) = (self.line(), self.column());

        while self.current_char().is_ascii_digit() {
            self.advance();
        }

        let mut is_float = false;
        if self.current_char() == '.' {
            is_float = true;
            self.advance();
            while self.current_char().is_ascii_digit() {
                self.advance();
            }
        }

        let text = self.token_text(start);
        if is_float {
            match text.parse::<f64>() {
                Ok(v) => TokenKind::Float(v),
                Err(_) => {
                    self.report_error(
                        handler,
                        format!("malformed float literal '{text}'"),
                        start_line,
                        start_col,
                    );
                    TokenKind::Error(text.to_string())
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(v) => TokenKind::Int(v),
                Err(_) => {
                    self.report_error(
                        handler,
                        format!("malformed integer literal '{text}'"),
                        start_line,
                        start_col,
                    );
                    TokenKind::Error(text.to_string())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::Lexer;
    use crate::token::TokenKind;
    use pudlc_util::Handler;

    fn lex_one(src: &str) -> TokenKind {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(src);
        lexer.lex(&mut handler).kind
    }

    #[test]
    fn plain_integer() {
        assert_eq!(lex_one("42"), TokenKind::Int(42));
    }

    #[test]
    fn zero() {
        assert_eq!(lex_one("0"), TokenKind::Int(0));
    }

    #[test]
    fn float_with_fraction() {
        assert_eq!(lex_one("3.5"), TokenKind::Float(3.5));
    }

    #[test]
    fn float_with_trailing_dot() {
        assert_eq!(lex_one("5."), TokenKind::Float(5.0));
    }

    #[test]
    fn float_with_leading_dot() {
        assert_eq!(lex_one(".5"), TokenKind::Float(0.5));
    }

    #[test]
    fn number_stops_before_trailing_identifier() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new("10x");
        assert_eq!(lexer.lex(&mut handler).kind, TokenKind::Int(10));
        assert!(matches!(lexer.lex(&mut handler).kind, TokenKind::Ident(_)));
    }
}
