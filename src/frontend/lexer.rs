use crate::frontend::token::{self, Token};
use crate::lang::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("{line}:{col}: unexpected character '{ch}'")]
    UnexpectedChar { ch: char, line: usize, col: usize },

    #[error("{line}:{col}: integer literal out of range: {digits}")]
    IntegerOutOfRange {
        digits: String,
        line: usize,
        col: usize,
    },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { line, col, .. }
            | LexError::IntegerOutOfRange { line, col, .. } => Span::new(*line, *col),
        }
    }
}

/// Character-level scanner for SimpleLang.
///
/// Tokens are produced on demand by [`Lexer::next_token`]; once the input is
/// exhausted every further call yields `Token::Eof`.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        if ch == Some('\n') {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.pos += 1;
        ch
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.col)
    }

    /// Skips whitespace and `//` line comments.
    fn skip_trivia(&mut self) {
        loop {
            match (self.current(), self.peek()) {
                (Some(ch), _) if ch.is_whitespace() => {
                    self.advance();
                }
                (Some('/'), Some('/')) => {
                    while let Some(ch) = self.current() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_number(&mut self, start: Span) -> Result<Token, LexError> {
        let mut digits = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let value: i64 = digits.parse().map_err(|_| LexError::IntegerOutOfRange {
            digits: digits.clone(),
            line: start.line,
            col: start.col,
        })?;

        Ok(Token::IntLiteral(value))
    }

    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();
        while let Some(ch) = self.current() {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        token::keyword(&ident).unwrap_or(Token::Ident(ident))
    }

    fn read_operator(&mut self) -> Option<Token> {
        let ch = self.current()?;
        let next = self.peek();

        let (token, width) = match (ch, next) {
            ('<', Some('=')) => (Token::LtEq, 2),
            ('>', Some('=')) => (Token::GtEq, 2),
            ('=', Some('=')) => (Token::EqEq, 2),
            ('!', Some('=')) => (Token::NotEq, 2),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('!', _) => (Token::Bang, 1),
            ('=', _) => (Token::Assign, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('{', _) => (Token::LBrace, 1),
            ('}', _) => (Token::RBrace, 1),
            (';', _) => (Token::Semicolon, 1),
            (',', _) => (Token::Comma, 1),
            _ => return None,
        };

        for _ in 0..width {
            self.advance();
        }
        Some(token)
    }

    /// Scans and returns the next token.
    pub fn next_token(&mut self) -> Result<Spanned, LexError> {
        self.skip_trivia();
        let span = self.span();

        let token = match self.current() {
            None => Token::Eof,
            Some(ch) if ch.is_ascii_digit() => self.read_number(span)?,
            Some(ch) if ch.is_alphabetic() || ch == '_' => self.read_identifier(),
            Some(ch) => match self.read_operator() {
                Some(token) => token,
                None => {
                    return Err(LexError::UnexpectedChar {
                        ch,
                        line: span.line,
                        col: span.col,
                    });
                }
            },
        };

        Ok(Spanned { token, span })
    }

    /// Scans the whole input. The result always ends with exactly one `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();

        loop {
            let spanned = self.next_token()?;
            let at_end = matches!(spanned.token, Token::Eof);
            tokens.push(spanned);
            if at_end {
                break;
            }
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        lexer
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .filter(|t| !matches!(t, Token::Eof))
            .collect()
    }

    fn tokens_raw(source: &str) -> Vec<Spanned> {
        Lexer::new(source).tokenize().unwrap()
    }

    #[test]
    fn test_integer_literal() {
        assert_eq!(tokens("42"), vec![Token::IntLiteral(42)]);
    }

    #[test]
    fn test_booleans() {
        assert_eq!(
            tokens("true false"),
            vec![Token::BoolLiteral(true), Token::BoolLiteral(false)]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            tokens("int bool void if else while return"),
            vec![
                Token::Int,
                Token::Bool,
                Token::Void,
                Token::If,
                Token::Else,
                Token::While,
                Token::Return,
            ]
        );
    }

    #[test]
    fn test_keyword_vs_ident() {
        assert_eq!(
            tokens("int integer iff if_ x123 bar_baz"),
            vec![
                Token::Int,
                Token::Ident("integer".to_string()),
                Token::Ident("iff".to_string()),
                Token::Ident("if_".to_string()),
                Token::Ident("x123".to_string()),
                Token::Ident("bar_baz".to_string()),
            ]
        );
    }

    #[test]
    fn test_arithmetic_operators() {
        assert_eq!(
            tokens("+ - * / %"),
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Percent,
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            tokens("< > <= >= == !="),
            vec![
                Token::Lt,
                Token::Gt,
                Token::LtEq,
                Token::GtEq,
                Token::EqEq,
                Token::NotEq,
            ]
        );
    }

    #[test]
    fn test_two_char_operators_without_spaces() {
        // `<==` is `<=` then `=`; `!!x` is two bangs
        assert_eq!(
            tokens("<==!!x"),
            vec![
                Token::LtEq,
                Token::Assign,
                Token::Bang,
                Token::Bang,
                Token::Ident("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(
            tokens("&& || !"),
            vec![Token::AndAnd, Token::OrOr, Token::Bang]
        );
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(
            tokens("( ) { } ; , ="),
            vec![
                Token::LParen,
                Token::RParen,
                Token::LBrace,
                Token::RBrace,
                Token::Semicolon,
                Token::Comma,
                Token::Assign,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "// header\nint x = 10; // trailing\n// last line without newline";
        assert_eq!(
            tokens(source),
            vec![
                Token::Int,
                Token::Ident("x".to_string()),
                Token::Assign,
                Token::IntLiteral(10),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_single_slash_is_division() {
        assert_eq!(
            tokens("a / b"),
            vec![
                Token::Ident("a".to_string()),
                Token::Slash,
                Token::Ident("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        for source in ["", "   \n\t  ", "// only a comment"] {
            let toks = tokens_raw(source);
            assert_eq!(toks.len(), 1, "source {:?}", source);
            assert_eq!(toks[0].token, Token::Eof);
        }
    }

    #[test]
    fn test_exactly_one_eof() {
        let toks = tokens_raw("int main() { return 1; }");
        let eofs = toks.iter().filter(|s| s.token == Token::Eof).count();
        assert_eq!(eofs, 1);
        assert_eq!(toks.last().map(|s| &s.token), Some(&Token::Eof));
    }

    #[test]
    fn test_next_token_after_end_keeps_returning_eof() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token().unwrap().token, Token::Ident("x".to_string()));
        assert_eq!(lexer.next_token().unwrap().token, Token::Eof);
        assert_eq!(lexer.next_token().unwrap().token, Token::Eof);
    }

    #[test]
    fn test_spans() {
        let toks = tokens_raw("int x\n  = 5;");
        let spans: Vec<(usize, usize)> = toks.iter().map(|s| (s.span.line, s.span.col)).collect();
        assert_eq!(spans, vec![(1, 1), (1, 5), (2, 3), (2, 5), (2, 6), (2, 7)]);
    }

    #[test]
    fn test_formatting_does_not_change_tokens() {
        let compact = "int main(){int x=1;while(x<10){x=x*2;}return x;}";
        let spread = "
            // doubling loop
            int main ( ) {
                int x = 1;   // start
                while (x < 10) { x = x * 2; }
                return x;
            }
        ";
        assert_eq!(tokens(compact), tokens(spread));
    }

    #[test]
    fn test_unexpected_character_error() {
        let err = Lexer::new("int x = @;").tokenize().unwrap_err();
        assert_eq!(
            err,
            LexError::UnexpectedChar {
                ch: '@',
                line: 1,
                col: 9
            }
        );
        assert!(err.to_string().contains("unexpected character"));
    }

    #[test]
    fn test_lone_ampersand_and_pipe_are_errors() {
        assert!(matches!(
            Lexer::new("a & b").tokenize(),
            Err(LexError::UnexpectedChar { ch: '&', .. })
        ));
        assert!(matches!(
            Lexer::new("a | b").tokenize(),
            Err(LexError::UnexpectedChar { ch: '|', .. })
        ));
    }

    #[test]
    fn test_integer_out_of_range() {
        let err = Lexer::new("\n  99999999999999999999").tokenize().unwrap_err();
        assert!(matches!(err, LexError::IntegerOutOfRange { .. }));
        assert_eq!(err.span(), Span::new(2, 3));
    }

    #[test]
    fn test_max_integer_literal() {
        assert_eq!(
            tokens("9223372036854775807"),
            vec![Token::IntLiteral(i64::MAX)]
        );
    }
}
