#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    IntLiteral(i64),
    BoolLiteral(bool),

    // Identifier (variable or function name)
    Ident(String),

    // Type keywords
    Int,
    Bool,
    Void,

    // Statement keywords
    If,
    Else,
    While,
    Return,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Comparison
    Lt,
    Gt,
    LtEq,
    GtEq,
    EqEq,
    NotEq,

    // Logic
    AndAnd,
    OrOr,
    Bang,

    // Delimiters
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    Semicolon, // ;
    Comma,     // ,
    Assign,    // =

    Eof,
}

/// The fixed, case-sensitive keyword table.
pub const KEYWORDS: [&str; 9] = [
    "int", "bool", "void", "if", "else", "while", "return", "true", "false",
];

/// Classifies an identifier against the keyword table.
///
/// `true` and `false` become boolean literals rather than keywords.
pub fn keyword(ident: &str) -> Option<Token> {
    let token = match ident {
        "int" => Token::Int,
        "bool" => Token::Bool,
        "void" => Token::Void,
        "if" => Token::If,
        "else" => Token::Else,
        "while" => Token::While,
        "return" => Token::Return,
        "true" => Token::BoolLiteral(true),
        "false" => Token::BoolLiteral(false),
        _ => return None,
    };
    Some(token)
}

impl Token {
    /// Returns true if this token starts a type (`int`, `bool`, `void`).
    pub fn is_type_keyword(&self) -> bool {
        matches!(self, Token::Int | Token::Bool | Token::Void)
    }

    /// Human-readable description used in parse errors.
    ///
    /// Tokens that carry a value name their kind as well, e.g.
    /// `identifier 'x'`; fixed tokens are quoted, e.g. `';'`.
    pub fn describe(&self) -> String {
        match self {
            Token::IntLiteral(n) => format!("integer literal {}", n),
            Token::BoolLiteral(b) => format!("boolean literal {}", b),
            Token::Ident(name) => format!("identifier '{}'", name),
            Token::Eof => "end of input".to_string(),
            other => format!("'{}'", other),
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::IntLiteral(n) => write!(f, "{}", n),
            Token::BoolLiteral(b) => write!(f, "{}", b),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Int => write!(f, "int"),
            Token::Bool => write!(f, "bool"),
            Token::Void => write!(f, "void"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::While => write!(f, "while"),
            Token::Return => write!(f, "return"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::LtEq => write!(f, "<="),
            Token::GtEq => write!(f, ">="),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::AndAnd => write!(f, "&&"),
            Token::OrOr => write!(f, "||"),
            Token::Bang => write!(f, "!"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::Assign => write!(f, "="),
            Token::Eof => write!(f, "EOF"),
        }
    }
}
