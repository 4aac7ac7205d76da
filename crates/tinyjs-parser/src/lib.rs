//! tinyjs parser
//!
//! Recursive descent parser that produces a [`Script`] from a token stream.
//! Binary operators are not AST nodes: `a + b` parses to a call of the
//! global binding `+`, which is how the interpreter's builtin bootstrap is
//! able to cover the whole operator surface with ordinary functions.

use smol_str::SmolStr;
use thiserror::Error;
use tinyjs_ast::{Block, Expr, ExprKind, Ident, Literal, Script, Spanned};
use tinyjs_lexer::{Lexer, LexerError, Span, Token, TokenKind};

/// Parser error type
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, found `{found}`")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected end of file - expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("invalid assignment target: only variables and fields can be assigned")]
    InvalidAssignmentTarget { span: Span },

    #[error(transparent)]
    Lex(#[from] LexerError),
}

impl ParseError {
    /// The source span the error points at, if it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::UnexpectedToken { span, .. } => Some(*span),
            ParseError::UnexpectedEof { .. } => None,
            ParseError::InvalidAssignmentTarget { span } => Some(*span),
            ParseError::Lex(err) => Some(err.span()),
        }
    }
}

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Parser state
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source_len: usize,
}

impl Parser {
    /// Create a new parser from source code. Fails on the first lex error.
    pub fn new(source: &str) -> ParseResult<Self> {
        let (tokens, lex_errors) = Lexer::new(source).tokenize();
        if let Some(err) = lex_errors.into_iter().next() {
            return Err(err.into());
        }
        Ok(Self {
            tokens,
            pos: 0,
            source_len: source.len(),
        })
    }

    /// Parse a whole script: instructions until end of input.
    pub fn parse_script(&mut self) -> ParseResult<Script> {
        let mut instrs = Vec::new();
        while self.peek().is_some() {
            instrs.push(self.parse_instr()?);
        }
        Ok(Script {
            body: Block::new(instrs, Span::new(0, self.source_len)),
        })
    }

    // ========================================================================
    // Instructions
    // ========================================================================

    fn parse_instr(&mut self) -> ParseResult<Expr> {
        match self.peek_kind() {
            Some(TokenKind::Var) => self.parse_var_declaration(),
            Some(TokenKind::If) => self.parse_if(),
            Some(TokenKind::Return) => self.parse_return(),
            Some(TokenKind::Function) => {
                let fun = self.parse_fun_literal()?;
                let named = matches!(&fun.kind, ExprKind::Fun { name: Some(_), .. });
                if named {
                    // `function f(..) {..}` is a statement; the semicolon
                    // is optional, matching the JavaScript surface.
                    self.eat(&TokenKind::Semi);
                } else {
                    self.expect_semi()?;
                }
                Ok(fun)
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect_semi()?;
                Ok(expr)
            }
        }
    }

    fn parse_var_declaration(&mut self) -> ParseResult<Expr> {
        let var_span = self.expect(TokenKind::Var, "`var`")?.span;
        let name = self.expect_ident("a variable name")?;
        self.expect(TokenKind::Eq, "`=`")?;
        let init = self.parse_expr()?;
        self.expect_semi()?;
        let span = var_span.merge(init.span);
        Ok(Expr::new(
            ExprKind::LocalVarAssignment {
                name: name.node,
                expr: Box::new(init),
                declaration: true,
            },
            span,
        ))
    }

    fn parse_if(&mut self) -> ParseResult<Expr> {
        let if_span = self.expect(TokenKind::If, "`if`")?.span;
        self.expect(TokenKind::LParen, "`(`")?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen, "`)`")?;
        let true_block = self.parse_block()?;
        let false_block = if self.eat(&TokenKind::Else) {
            self.parse_block()?
        } else {
            Block::empty(true_block.span)
        };
        let span = if_span.merge(false_block.span);
        Ok(Expr::new(
            ExprKind::If {
                condition: Box::new(condition),
                true_block,
                false_block,
            },
            span,
        ))
    }

    fn parse_return(&mut self) -> ParseResult<Expr> {
        let return_span = self.expect(TokenKind::Return, "`return`")?.span;
        if self.eat(&TokenKind::Semi) {
            return Ok(Expr::new(ExprKind::Return { expr: None }, return_span));
        }
        let value = self.parse_expr()?;
        self.expect_semi()?;
        let span = return_span.merge(value.span);
        Ok(Expr::new(
            ExprKind::Return {
                expr: Some(Box::new(value)),
            },
            span,
        ))
    }

    fn parse_block(&mut self) -> ParseResult<Block> {
        let open = self.expect(TokenKind::LBrace, "`{`")?.span;
        let mut instrs = Vec::new();
        while !matches!(self.peek_kind(), Some(TokenKind::RBrace)) {
            if self.peek().is_none() {
                return Err(ParseError::UnexpectedEof {
                    expected: "`}`".into(),
                });
            }
            instrs.push(self.parse_instr()?);
        }
        let close = self.expect(TokenKind::RBrace, "`}`")?.span;
        Ok(Block::new(instrs, open.merge(close)))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// assignment := postfix `=` assignment | equality
    fn parse_expr(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_equality()?;
        if !self.eat(&TokenKind::Eq) {
            return Ok(expr);
        }
        let value = self.parse_expr()?;
        let span = expr.span.merge(value.span);
        match expr.kind {
            ExprKind::LocalVarAccess { name } => Ok(Expr::new(
                ExprKind::LocalVarAssignment {
                    name,
                    expr: Box::new(value),
                    declaration: false,
                },
                span,
            )),
            ExprKind::FieldAccess { receiver, name } => Ok(Expr::new(
                ExprKind::FieldAssignment {
                    receiver,
                    name,
                    expr: Box::new(value),
                },
                span,
            )),
            _ => Err(ParseError::InvalidAssignmentTarget { span: expr.span }),
        }
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::EqEq) => "==",
                Some(TokenKind::NotEq) => "!=",
                _ => break,
            };
            let op_span = self.advance().expect("peeked").span;
            let rhs = self.parse_comparison()?;
            expr = desugar_binary(op, op_span, expr, rhs);
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Lt) => "<",
                Some(TokenKind::LtEq) => "<=",
                Some(TokenKind::Gt) => ">",
                Some(TokenKind::GtEq) => ">=",
                _ => break,
            };
            let op_span = self.advance().expect("peeked").span;
            let rhs = self.parse_additive()?;
            expr = desugar_binary(op, op_span, expr, rhs);
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => "+",
                Some(TokenKind::Minus) => "-",
                _ => break,
            };
            let op_span = self.advance().expect("peeked").span;
            let rhs = self.parse_multiplicative()?;
            expr = desugar_binary(op, op_span, expr, rhs);
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_postfix()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => "*",
                Some(TokenKind::Slash) => "/",
                Some(TokenKind::Percent) => "%",
                _ => break,
            };
            let op_span = self.advance().expect("peeked").span;
            let rhs = self.parse_postfix()?;
            expr = desugar_binary(op, op_span, expr, rhs);
        }
        Ok(expr)
    }

    /// postfix := primary (`(args)` | `.` ident `(args)` | `.` ident)*
    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check(&TokenKind::LParen) {
                let (args, close) = self.parse_args()?;
                let span = expr.span.merge(close);
                expr = Expr::new(
                    ExprKind::FunCall {
                        qualifier: Box::new(expr),
                        args,
                    },
                    span,
                );
            } else if self.eat(&TokenKind::Dot) {
                let name = self.expect_ident("a field or method name")?;
                if self.check(&TokenKind::LParen) {
                    let (args, close) = self.parse_args()?;
                    let span = expr.span.merge(close);
                    expr = Expr::new(
                        ExprKind::MethodCall {
                            receiver: Box::new(expr),
                            name: name.node,
                            args,
                        },
                        span,
                    );
                } else {
                    let span = expr.span.merge(name.span);
                    expr = Expr::new(
                        ExprKind::FieldAccess {
                            receiver: Box::new(expr),
                            name: name.node,
                        },
                        span,
                    );
                }
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = match self.peek() {
            Some(token) => token.clone(),
            None => {
                return Err(ParseError::UnexpectedEof {
                    expected: "an expression".into(),
                })
            }
        };
        match token.kind {
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Int(n)), token.span))
            }
            TokenKind::Minus => {
                // negative integer literal; there is no general unary minus
                self.advance();
                let next = self.expect_integer()?;
                let span = token.span.merge(next.span);
                let value = match next.kind {
                    TokenKind::Integer(n) => -n,
                    _ => unreachable!("expect_integer returned a non-integer"),
                };
                Ok(Expr::new(ExprKind::Literal(Literal::Int(value)), span))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Str(s)), token.span))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::new(ExprKind::LocalVarAccess { name }, token.span))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(expr)
            }
            TokenKind::Function => self.parse_fun_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            _ => Err(self.unexpected("an expression", &token)),
        }
    }

    /// `function name? ( params ) block`
    fn parse_fun_literal(&mut self) -> ParseResult<Expr> {
        let fun_span = self.expect(TokenKind::Function, "`function`")?.span;
        let name = match self.peek_kind() {
            Some(TokenKind::Identifier(_)) => Some(self.expect_ident("a function name")?),
            _ => None,
        };
        self.expect(TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.expect_ident("a parameter name")?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        let body = self.parse_block()?;
        let span = fun_span.merge(body.span);
        Ok(Expr::new(ExprKind::Fun { name, params, body }, span))
    }

    /// `{ name: expr, ... }`
    fn parse_object_literal(&mut self) -> ParseResult<Expr> {
        let open = self.expect(TokenKind::LBrace, "`{`")?.span;
        let mut init = Vec::new();
        if !self.check(&TokenKind::RBrace) {
            loop {
                let key = self.expect_ident("a field name")?;
                self.expect(TokenKind::Colon, "`:`")?;
                let value = self.parse_expr()?;
                init.push((key, value));
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
                // allow a trailing comma before the closing brace
                if self.check(&TokenKind::RBrace) {
                    break;
                }
            }
        }
        let close = self.expect(TokenKind::RBrace, "`}`")?.span;
        Ok(Expr::new(ExprKind::New { init }, open.merge(close)))
    }

    fn parse_args(&mut self) -> ParseResult<(Vec<Expr>, Span)> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let close = self.expect(TokenKind::RParen, "`)`")?.span;
        Ok((args, close))
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        match self.peek() {
            Some(token) if token.kind == kind => Ok(self.advance().expect("peeked")),
            Some(token) => {
                let token = token.clone();
                Err(self.unexpected(expected, &token))
            }
            None => Err(ParseError::UnexpectedEof {
                expected: expected.into(),
            }),
        }
    }

    fn expect_semi(&mut self) -> ParseResult<()> {
        self.expect(TokenKind::Semi, "`;`")?;
        Ok(())
    }

    fn expect_ident(&mut self, expected: &str) -> ParseResult<Ident> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Identifier(name),
                span,
            }) => {
                let ident = Spanned::new(name.clone(), *span);
                self.pos += 1;
                Ok(ident)
            }
            Some(token) => {
                let token = token.clone();
                Err(self.unexpected(expected, &token))
            }
            None => Err(ParseError::UnexpectedEof {
                expected: expected.into(),
            }),
        }
    }

    fn expect_integer(&mut self) -> ParseResult<Token> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Integer(_),
                ..
            }) => Ok(self.advance().expect("peeked")),
            Some(token) => {
                let token = token.clone();
                Err(self.unexpected("an integer literal", &token))
            }
            None => Err(ParseError::UnexpectedEof {
                expected: "an integer literal".into(),
            }),
        }
    }

    fn unexpected(&self, expected: &str, found: &Token) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: found.kind.to_string(),
            span: found.span,
        }
    }
}

/// Rewrite `lhs op rhs` into a call of the global operator binding.
fn desugar_binary(op: &str, op_span: Span, lhs: Expr, rhs: Expr) -> Expr {
    let span = lhs.span.merge(rhs.span);
    let qualifier = Expr::new(
        ExprKind::LocalVarAccess {
            name: SmolStr::new(op),
        },
        op_span,
    );
    Expr::new(
        ExprKind::FunCall {
            qualifier: Box::new(qualifier),
            args: vec![lhs, rhs],
        },
        span,
    )
}

/// Parse a source string into a script.
pub fn parse(source: &str) -> ParseResult<Script> {
    Parser::new(source)?.parse_script()
}
