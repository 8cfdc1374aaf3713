use crate::frontend::lexer::Spanned;
use crate::frontend::token::Token;

pub struct TokenDumper {
    pub color: bool,
    pub show_debug_repr: bool, // if false, prints the source lexeme instead
}

impl Default for TokenDumper {
    fn default() -> Self {
        Self {
            color: true,
            show_debug_repr: true,
        }
    }
}

impl TokenDumper {
    // ANSI colors
    const RESET: &'static str = "\x1b[0m";
    const DIM: &'static str = "\x1b[2m";
    const YEL: &'static str = "\x1b[33m";
    const CYN: &'static str = "\x1b[36m";
    const MAG: &'static str = "\x1b[35m";
    const BLU: &'static str = "\x1b[34m";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.show_debug_repr = false;
        self
    }

    pub fn dump(&self, tokens: &[Spanned]) {
        for s in tokens {
            println!("{}", self.format_one(s));
        }
    }

    pub fn format_one(&self, s: &Spanned) -> String {
        let kind = self.kind(&s.token);
        let colr = if self.color { self.color(&s.token) } else { "" };
        let reset = if self.color { Self::RESET } else { "" };

        let body = if self.show_debug_repr {
            format!("{:?}", s.token)
        } else {
            s.token.to_string()
        };

        format!(
            "[{:02}:{:02}] {}{:<8} {}{}",
            s.span.line, s.span.col, colr, kind, body, reset
        )
    }

    fn kind(&self, t: &Token) -> &'static str {
        use Token::*;
        match t {
            Eof => "EOF",

            // literals
            IntLiteral(_) => "INT",
            BoolLiteral(_) => "BOOL",

            // names
            Ident(_) => "IDENT",

            // structure
            LParen | RParen | LBrace | RBrace | Semicolon | Comma => "DELIM",
            Assign => "ASSIGN",

            // operators
            Plus | Minus | Star | Slash | Percent => "OP",
            EqEq | NotEq | Lt | LtEq | Gt | GtEq => "CMP",
            AndAnd | OrOr | Bang => "LOGIC",

            Int | Bool | Void | If | Else | While | Return => "KEYWORD",
        }
    }

    fn color(&self, t: &Token) -> &'static str {
        use Token::*;
        match t {
            Eof => Self::DIM,
            IntLiteral(_) | BoolLiteral(_) => Self::CYN,
            Ident(_) => Self::YEL,
            Plus | Minus | Star | Slash | Percent => Self::MAG,
            EqEq | NotEq | Lt | LtEq | Gt | GtEq | AndAnd | OrOr | Bang => Self::MAG,
            Int | Bool | Void | If | Else | While | Return => Self::BLU,
            _ => Self::RESET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;

    #[test]
    fn test_plain_debug_lines() {
        let tokens = Lexer::new("int x").tokenize().unwrap();
        let dumper = TokenDumper::new().no_color();
        let lines: Vec<String> = tokens.iter().map(|t| dumper.format_one(t)).collect();
        assert_eq!(
            lines,
            vec![
                "[01:01] KEYWORD  Int",
                "[01:05] IDENT    Ident(\"x\")",
                "[01:06] EOF      Eof",
            ]
        );
    }

    #[test]
    fn test_pretty_uses_lexemes() {
        let tokens = Lexer::new("a <= 10").tokenize().unwrap();
        let dumper = TokenDumper::new().no_color().pretty();
        assert_eq!(dumper.format_one(&tokens[1]), "[01:03] CMP      <=");
        assert_eq!(dumper.format_one(&tokens[2]), "[01:06] INT      10");
    }

    #[test]
    fn test_color_wraps_line() {
        let tokens = Lexer::new("42").tokenize().unwrap();
        let line = TokenDumper::new().format_one(&tokens[0]);
        assert!(line.contains(TokenDumper::CYN));
        assert!(line.ends_with(TokenDumper::RESET));
    }
}
