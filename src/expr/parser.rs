//! Recursive-descent expression parser.
//!
//! One method per precedence level, lowest first:
//! conditional, `||`, `&&`, equality, relational (including `instanceof`
//! and `in`), additive, multiplicative, unary, postfix, primary.

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::{Lexer, Token, TokenKind};
use crate::error::{Result, TemplateError};
use crate::host::is_reserved;
use crate::value::Value;

/// Nesting limit for parenthesised and unary sub-expressions
const MAX_DEPTH: usize = 128;

/// Parse a complete expression
pub fn parse(source: &str) -> Result<Expr> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_conditional()?;
    if !parser.check(&TokenKind::Eof) {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn current(&self) -> &Token {
        // The lexer always terminates the stream with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            let token = self.current();
            Err(TemplateError::syntax(
                token.pos,
                format!("Expected {} but found {}", what, describe(&token.kind)),
            ))
        }
    }

    fn unexpected(&self) -> TemplateError {
        let token = self.current();
        TemplateError::syntax(token.pos, format!("Unexpected {}", describe(&token.kind)))
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(TemplateError::syntax(
                self.current().pos,
                "Expression nested too deeply",
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// `test ? consequent : alternate`
    fn parse_conditional(&mut self) -> Result<Expr> {
        self.enter()?;
        let test = self.parse_binary_or()?;
        let expr = if self.eat(&TokenKind::Question) {
            let consequent = self.parse_conditional()?;
            self.expect(&TokenKind::Colon, "':'")?;
            let alternate = self.parse_conditional()?;
            Expr::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            }
        } else {
            test
        };
        self.leave();
        Ok(expr)
    }

    /// Parse || (lowest precedence binary)
    fn parse_binary_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_binary_and()?;
        while self.eat(&TokenKind::OrOr) {
            let right = self.parse_binary_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_binary_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::AndAnd) {
            let right = self.parse_equality()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.current().kind {
                TokenKind::StrictEq => BinaryOp::StrictEq,
                TokenKind::StrictNe => BinaryOp::StrictNe,
                TokenKind::LooseEq => BinaryOp::LooseEq,
                TokenKind::LooseNe => BinaryOp::LooseNe,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }
    }

    fn parse_relational(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                TokenKind::InstanceOf => BinaryOp::InstanceOf,
                TokenKind::In => BinaryOp::In,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.current().kind {
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::TypeOf => UnaryOp::TypeOf,
            _ => return self.parse_postfix(),
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary()?;
        self.leave();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// Member access, computed access and calls
    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = if self.check(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            match self.current().kind {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.parse_property_name()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_conditional()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_list(&TokenKind::RParen, "')'")?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// `new Callee(args)`; the argument list is optional and the callee
    /// may be a member chain but not a call
    fn parse_new(&mut self) -> Result<Expr> {
        self.advance(); // Skip `new`
        self.enter()?;
        let mut constructor = if self.check(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            match self.current().kind {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.parse_property_name()?;
                    constructor = Expr::Member {
                        object: Box::new(constructor),
                        property,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_conditional()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    constructor = Expr::Index {
                        object: Box::new(constructor),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }

        let args = if self.eat(&TokenKind::LParen) {
            self.parse_list(&TokenKind::RParen, "')'")?
        } else {
            Vec::new()
        };
        self.leave();

        Ok(Expr::New {
            constructor: Box::new(constructor),
            args,
        })
    }

    /// Comma-separated expressions up to `close`; a trailing comma is allowed
    fn parse_list(&mut self, close: &TokenKind, what: &str) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(self.parse_conditional()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(close, what)?;
        Ok(items)
    }

    /// Any identifier or keyword may follow `.`
    fn parse_property_name(&mut self) -> Result<String> {
        let token = self.current().clone();
        let name = match &token.kind {
            TokenKind::Ident(name) => name.clone(),
            other => match keyword_text(other) {
                Some(word) => word.to_string(),
                None => {
                    return Err(TemplateError::syntax(
                        token.pos,
                        format!("Expected property name but found {}", describe(other)),
                    ))
                }
            },
        };
        self.advance();
        Ok(name)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.current().clone();
        let expr = match token.kind {
            TokenKind::Number(n) => Expr::Literal(Value::Number(n)),
            TokenKind::Str(s) => Expr::Literal(Value::String(s)),
            TokenKind::True => Expr::Literal(Value::Bool(true)),
            TokenKind::False => Expr::Literal(Value::Bool(false)),
            TokenKind::Null => Expr::Literal(Value::Null),
            TokenKind::Undefined => Expr::Literal(Value::Undefined),
            TokenKind::This => Expr::This,
            TokenKind::Ident(name) => {
                if is_reserved(&name) {
                    return Err(TemplateError::syntax(
                        token.pos,
                        format!("Unexpected reserved word '{}'", name),
                    ));
                }
                Expr::Ident(name)
            }
            TokenKind::At(name) => {
                if name != "index" {
                    return Err(TemplateError::syntax(
                        token.pos,
                        format!("Unknown directive '@{}'", name),
                    ));
                }
                Expr::LoopIndex
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_conditional()?;
                self.expect(&TokenKind::RParen, "')'")?;
                return Ok(inner);
            }
            TokenKind::LBracket => {
                self.advance();
                self.enter()?;
                let items = self.parse_list(&TokenKind::RBracket, "']'")?;
                self.leave();
                return Ok(Expr::Array(items));
            }
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(expr)
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn keyword_text(kind: &TokenKind) -> Option<&'static str> {
    let word = match kind {
        TokenKind::True => "true",
        TokenKind::False => "false",
        TokenKind::Null => "null",
        TokenKind::Undefined => "undefined",
        TokenKind::This => "this",
        TokenKind::New => "new",
        TokenKind::TypeOf => "typeof",
        TokenKind::InstanceOf => "instanceof",
        TokenKind::In => "in",
        _ => return None,
    };
    Some(word)
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Eof => "end of expression".to_string(),
        TokenKind::Number(n) => format!("number {}", n),
        TokenKind::Str(s) => format!("string {:?}", s),
        TokenKind::Ident(name) => format!("identifier '{}'", name),
        TokenKind::At(name) => format!("'@{}'", name),
        other => match keyword_text(other) {
            Some(word) => format!("'{}'", word),
            None => format!("{:?}", other),
        },
    }
}
