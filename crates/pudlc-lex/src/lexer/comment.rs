use super::core::Lexer;

impl<'src> Lexer<'src> {
    /// Skips whitespace and `#`-to-end-of-line comments between tokens.
    /// Line/column tracking happens in `advance`.
    pub(super) fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.current_char() {
                c if c.is_whitespace() => self.advance(),
                '#' => {
                    while !self.is_at_end() && self.current_char() != '\n' {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::Lexer;
    use crate::token::TokenKind;
    use pudlc_util::Handler;

    fn tokens(src: &str) -> Vec<TokenKind> {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.lex(&mut handler);
            let done = tok.is_eof();
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn skips_leading_and_trailing_whitespace() {
        assert_eq!(tokens("  \t\n  42  \n"), vec![TokenKind::Int(42), TokenKind::Eof]);
    }

    #[test]
    fn skips_line_comment_to_newline() {
        assert_eq!(
            tokens("1 # a comment\n2"),
            vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Eof]
        );
    }

    #[test]
    fn comment_with_no_trailing_newline_reaches_eof() {
        assert_eq!(tokens("1 # trailing"), vec![TokenKind::Int(1), TokenKind::Eof]);
    }

    #[test]
    fn line_and_column_advance_past_comment() {
        let mut handler = Handler::new();
        let mut lexer = Lexer::new("# comment\nx");
        let tok = lexer.lex(&mut handler);
        assert_eq!(tok.line, 2);
        assert_eq!(tok.column, 1);
    }
}
