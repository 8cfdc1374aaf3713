use std::mem::discriminant;

use crate::frontend::lexer::Spanned;
use crate::frontend::parser_error::ParseError;
use crate::frontend::token::Token;
use crate::lang::{
    BinaryOp, Expr, ExprKind, FunctionDecl, Param, Program, Span, Stmt, StmtKind, Type, TypeName,
    UnaryOp,
};

/// Number of binary precedence levels, lowest (`||`) first.
const BINARY_LEVELS: usize = 6;

/// Deepest allowed nesting of blocks, parentheses, unary operators and
/// argument lists. Bounds the parser's own recursion.
pub const MAX_NESTING: usize = 64;

/// Deepest allowed expression tree. Every later stage walks expressions
/// recursively, so this bounds their recursion too.
pub const MAX_EXPR_DEPTH: usize = 256;

/// Maps a token to its binary operator at the given precedence level.
///
/// Levels, lowest to highest: `||`, `&&`, `== !=`, `< > <= >=`, `+ -`,
/// `* / %`. Unary operators and primaries sit above level 5.
fn binary_op_at(level: usize, token: &Token) -> Option<BinaryOp> {
    let op = match (level, token) {
        (0, Token::OrOr) => BinaryOp::Or,
        (1, Token::AndAnd) => BinaryOp::And,
        (2, Token::EqEq) => BinaryOp::Eq,
        (2, Token::NotEq) => BinaryOp::Ne,
        (3, Token::Lt) => BinaryOp::Lt,
        (3, Token::Gt) => BinaryOp::Gt,
        (3, Token::LtEq) => BinaryOp::Le,
        (3, Token::GtEq) => BinaryOp::Ge,
        (4, Token::Plus) => BinaryOp::Add,
        (4, Token::Minus) => BinaryOp::Sub,
        (5, Token::Star) => BinaryOp::Mul,
        (5, Token::Slash) => BinaryOp::Div,
        (5, Token::Percent) => BinaryOp::Mod,
        _ => return None,
    };
    Some(op)
}

/// Recursive-descent parser for SimpleLang.
///
/// The parser consumes the lexer's `Spanned` tokens and produces a `Program`,
/// a list of function declarations. It uses one token of lookahead, except
/// for telling an assignment (`x = ...`) from an expression statement, which
/// peeks one token further.
///
/// Scoping is not the parser's concern: blocks are plain statement lists and
/// the type checker opens the scopes.
pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    nesting: usize,
}

impl Parser {
    /// Creates a parser from lexer output.
    ///
    /// If the stream does not end with `Eof` (e.g. it was built by hand),
    /// one is appended after the last token.
    pub fn new(mut tokens: Vec<Spanned>) -> Self {
        let ends_with_eof = matches!(tokens.last(), Some(s) if s.token == Token::Eof);
        if !ends_with_eof {
            let span = tokens.last().map(|s| s.span).unwrap_or(Span::new(1, 1));
            tokens.push(Spanned {
                token: Token::Eof,
                span,
            });
        }
        Parser {
            tokens,
            pos: 0,
            nesting: 0,
        }
    }

    fn current(&self) -> &Spanned {
        // `new` guarantees a trailing Eof and `advance` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Peeks the current token kind without consuming it.
    fn peek(&self) -> &Token {
        &self.current().token
    }

    /// Peeks the token after the current one.
    fn peek_next(&self) -> &Token {
        let idx = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[idx].token
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    /// Consumes the current token and returns it. Stays put on `Eof`.
    fn advance(&mut self) -> Spanned {
        let spanned = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        spanned
    }

    /// True if the current token has the same kind as `expected`.
    fn check(&self, expected: &Token) -> bool {
        discriminant(self.peek()) == discriminant(expected)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.current_span())
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        self.error(format!(
            "expected {}, found {}",
            expected,
            self.peek().describe()
        ))
    }

    /// Consumes a token of the given kind or fails with expected/found.
    fn expect(&mut self, expected: &Token) -> Result<Spanned, ParseError> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&expected.describe()))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        match self.peek() {
            Token::Ident(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Ok((name, span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Parses a complete program: function declarations up to `Eof`.
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let span = self.current_span();
        let mut functions = Vec::new();

        while !self.check(&Token::Eof) {
            functions.push(self.parse_function()?);
        }

        Ok(Program { functions, span })
    }

    fn parse_type(&mut self) -> Result<TypeName, ParseError> {
        let ty = match self.peek() {
            Token::Int => Type::Int,
            Token::Bool => Type::Bool,
            Token::Void => Type::Void,
            _ => return Err(self.unexpected("type")),
        };
        let span = self.advance().span;
        Ok(TypeName { ty, span })
    }

    /// Parses a function declaration:
    ///
    /// ```text
    /// <type> <name> ( [<type> <name> {, <type> <name>}] ) { <stmt>* }
    /// ```
    fn parse_function(&mut self) -> Result<FunctionDecl, ParseError> {
        let return_type = self.parse_type()?;
        let (name, _) = self.expect_ident()?;

        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                let ty = self.parse_type()?;
                let (name, _) = self.expect_ident()?;
                params.push(Param { ty, name });

                if self.check(&Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;

        let body = self.parse_block()?;

        Ok(FunctionDecl {
            return_type,
            name,
            params,
            body,
            span: return_type.span,
        })
    }

    /// Parses `{ <stmt>* }`.
    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.enter("block")?;
        self.expect(&Token::LBrace)?;

        let mut stmts = Vec::new();
        while !self.check(&Token::RBrace) && !self.check(&Token::Eof) {
            stmts.push(self.parse_statement()?);
        }

        self.expect(&Token::RBrace)?;
        self.leave();
        Ok(stmts)
    }

    /// Dispatches on the current token: type keyword, `if`, `while`,
    /// `return`, `ident =`, or an expression statement.
    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            _ if self.peek().is_type_keyword() => self.parse_var_decl(),
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),
            Token::Return => self.parse_return(),
            Token::Ident(_) if matches!(self.peek_next(), Token::Assign) => {
                self.parse_assignment()
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_var_decl(&mut self) -> Result<Stmt, ParseError> {
        let ty = self.parse_type()?;
        let (name, _) = self.expect_ident()?;

        let init = if self.check(&Token::Assign) {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect(&Token::Semicolon)?;
        Ok(Stmt::new(StmtKind::VarDecl { ty, name, init }, ty.span))
    }

    fn parse_assignment(&mut self) -> Result<Stmt, ParseError> {
        let (name, span) = self.expect_ident()?;
        self.expect(&Token::Assign)?;
        let value = self.parse_expression()?;
        self.expect(&Token::Semicolon)?;
        Ok(Stmt::new(StmtKind::Assign { name, value }, span))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let span = self.expect(&Token::If)?.span;

        self.expect(&Token::LParen)?;
        let cond = self.parse_expression()?;
        self.expect(&Token::RParen)?;

        let then_branch = self.parse_block()?;

        let else_branch = if self.check(&Token::Else) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let span = self.expect(&Token::While)?.span;

        self.expect(&Token::LParen)?;
        let cond = self.parse_expression()?;
        self.expect(&Token::RParen)?;

        let body = self.parse_block()?;
        Ok(Stmt::new(StmtKind::While { cond, body }, span))
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let span = self.expect(&Token::Return)?.span;

        let value = if self.check(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.expect(&Token::Semicolon)?;
        Ok(Stmt::new(StmtKind::Return(value), span))
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_expression()?;
        self.expect(&Token::Semicolon)?;
        let span = expr.span;
        Ok(Stmt::new(StmtKind::Expr(expr), span))
    }

    // Expressions

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let (expr, _) = self.parse_binary(0)?;
        Ok(expr)
    }

    /// Opens one level of syntactic nesting (block, parenthesis, unary
    /// operator or call argument list).
    fn enter(&mut self, what: &str) -> Result<(), ParseError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error(format!("{} nested too deeply", what)));
        }
        self.nesting += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    /// Wraps a freshly built node, failing once its tree depth passes
    /// `MAX_EXPR_DEPTH`.
    fn node(&self, kind: ExprKind, span: Span, depth: usize) -> Result<(Expr, usize), ParseError> {
        if depth > MAX_EXPR_DEPTH {
            return Err(ParseError::new("expression nested too deeply", span));
        }
        Ok((Expr::new(kind, span), depth))
    }

    /// Left-associative precedence climbing over `BINARY_LEVELS`.
    ///
    /// Expression parsers return the parsed tree with its depth.
    fn parse_binary(&mut self, level: usize) -> Result<(Expr, usize), ParseError> {
        if level == BINARY_LEVELS {
            return self.parse_unary();
        }

        let (mut left, mut depth) = self.parse_binary(level + 1)?;

        while let Some(op) = binary_op_at(level, self.peek()) {
            let span = self.advance().span;
            let (right, right_depth) = self.parse_binary(level + 1)?;
            (left, depth) = self.node(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
                depth.max(right_depth) + 1,
            )?;
        }

        Ok((left, depth))
    }

    /// `!` and `-` apply to the next unary expression, so they chain.
    fn parse_unary(&mut self) -> Result<(Expr, usize), ParseError> {
        let op = match self.peek() {
            Token::Bang => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            _ => return self.parse_primary(),
        };
        self.enter("expression")?;
        let span = self.advance().span;
        let (operand, depth) = self.parse_unary()?;
        self.leave();

        self.node(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
            depth + 1,
        )
    }

    fn parse_primary(&mut self) -> Result<(Expr, usize), ParseError> {
        let span = self.current_span();

        match self.peek().clone() {
            Token::IntLiteral(n) => {
                self.advance();
                Ok((Expr::new(ExprKind::IntLiteral(n), span), 1))
            }
            Token::BoolLiteral(b) => {
                self.advance();
                Ok((Expr::new(ExprKind::BoolLiteral(b), span), 1))
            }
            Token::Ident(name) => {
                self.advance();
                if self.check(&Token::LParen) {
                    let (args, depth) = self.parse_call_args()?;
                    self.node(ExprKind::Call { name, args }, span, depth + 1)
                } else {
                    Ok((Expr::new(ExprKind::Variable(name), span), 1))
                }
            }
            Token::LParen => {
                self.enter("expression")?;
                self.advance();
                let parsed = self.parse_binary(0)?;
                self.expect(&Token::RParen)?;
                self.leave();
                Ok(parsed)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parses `( [expr {, expr}] )` after a callee name. Returns the
    /// arguments and the depth of the deepest one.
    fn parse_call_args(&mut self) -> Result<(Vec<Expr>, usize), ParseError> {
        self.enter("expression")?;
        self.expect(&Token::LParen)?;

        let mut args = Vec::new();
        let mut depth = 0;
        if !self.check(&Token::RParen) {
            loop {
                let (arg, arg_depth) = self.parse_binary(0)?;
                args.push(arg);
                depth = depth.max(arg_depth);
                if self.check(&Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        self.expect(&Token::RParen)?;
        self.leave();
        Ok((args, depth))
    }
}
