//! Recursive-descent parser.
//!
//! Precedence, loosest first: `?:`, `||`, `&&`, comparisons, `+ -`,
//! `* / %`, unary `- !`, primaries.

use serde_json::Value;

use super::lexer::{Token, tokenize};
use super::{BinaryOp, Expr, Function, UnaryOp};
use crate::error::TransformCompileError;

/// Nesting limit for sub-expressions. Every operator in a chain such as
/// `a + b + c` counts as one level, since it nests the tree one level deeper.
pub(crate) const MAX_DEPTH: usize = 64;

pub(crate) fn parse(expression: &str) -> Result<Expr, TransformCompileError> {
    let tokens = tokenize(expression)?;
    Parser::new(tokens).parse()
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            index: 0,
            depth: 0,
        }
    }

    fn parse(mut self) -> Result<Expr, TransformCompileError> {
        let expr = self.parse_conditional()?;
        if let Some(token) = self.peek() {
            return Err(syntax(format!("unexpected trailing {}", describe(token))));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, context: &str) -> Result<(), TransformCompileError> {
        match self.consume() {
            Some(ref token) if token == expected => Ok(()),
            Some(token) => Err(syntax(format!(
                "expected {} {context}, found {}",
                describe(expected),
                describe(&token)
            ))),
            None => Err(syntax(format!(
                "expected {} {context}, found end of expression",
                describe(expected)
            ))),
        }
    }

    fn enter(&mut self) -> Result<(), TransformCompileError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(TransformCompileError::TooDeep { limit: MAX_DEPTH });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn leave_chain(&mut self, links: usize) {
        self.depth = self.depth.saturating_sub(links);
    }

    fn parse_conditional(&mut self) -> Result<Expr, TransformCompileError> {
        self.enter()?;
        let condition = self.parse_or()?;
        let expr = if self.eat(&Token::Question) {
            let then = self.parse_conditional()?;
            self.expect(&Token::Colon, "in conditional")?;
            let otherwise = self.parse_conditional()?;
            Expr::Conditional {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            }
        } else {
            condition
        };
        self.leave();
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, TransformCompileError> {
        let mut expr = self.parse_and()?;
        let mut links = 0;
        while self.eat(&Token::OrOr) {
            self.enter()?;
            links += 1;
            let rhs = self.parse_and()?;
            expr = Expr::Or(Box::new(expr), Box::new(rhs));
        }
        self.leave_chain(links);
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, TransformCompileError> {
        let mut expr = self.parse_comparison()?;
        let mut links = 0;
        while self.eat(&Token::AndAnd) {
            self.enter()?;
            links += 1;
            let rhs = self.parse_comparison()?;
            expr = Expr::And(Box::new(expr), Box::new(rhs));
        }
        self.leave_chain(links);
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expr, TransformCompileError> {
        let mut expr = self.parse_add_sub()?;
        let mut links = 0;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::NotEq,
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => break,
            };
            let _ = self.consume();
            self.enter()?;
            links += 1;
            let rhs = self.parse_add_sub()?;
            expr = binary(op, expr, rhs);
        }
        self.leave_chain(links);
        Ok(expr)
    }

    fn parse_add_sub(&mut self) -> Result<Expr, TransformCompileError> {
        let mut expr = self.parse_mul_div()?;
        let mut links = 0;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => break,
            };
            let _ = self.consume();
            self.enter()?;
            links += 1;
            let rhs = self.parse_mul_div()?;
            expr = binary(op, expr, rhs);
        }
        self.leave_chain(links);
        Ok(expr)
    }

    fn parse_mul_div(&mut self) -> Result<Expr, TransformCompileError> {
        let mut expr = self.parse_unary()?;
        let mut links = 0;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                Some(Token::Percent) => BinaryOp::Remainder,
                _ => break,
            };
            let _ = self.consume();
            self.enter()?;
            links += 1;
            let rhs = self.parse_unary()?;
            expr = binary(op, expr, rhs);
        }
        self.leave_chain(links);
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, TransformCompileError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Negate,
            Some(Token::Bang) => UnaryOp::Not,
            _ => return self.parse_primary(),
        };
        let _ = self.consume();
        self.enter()?;
        let operand = self.parse_unary()?;
        self.leave();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, TransformCompileError> {
        match self.consume() {
            Some(Token::Number(value)) => Ok(Expr::Literal(number_literal(value))),
            Some(Token::Str(text)) => Ok(Expr::Literal(Value::String(text))),
            Some(Token::Ident(name)) => {
                if self.eat(&Token::LParen) {
                    return self.parse_call(&name);
                }
                match name.as_str() {
                    "value" => Ok(Expr::Input),
                    "true" => Ok(Expr::Literal(Value::Bool(true))),
                    "false" => Ok(Expr::Literal(Value::Bool(false))),
                    "null" => Ok(Expr::Literal(Value::Null)),
                    _ => Err(TransformCompileError::UnknownIdentifier(name)),
                }
            }
            Some(Token::LParen) => {
                let expr = self.parse_conditional()?;
                self.expect(&Token::RParen, "to close '('")?;
                Ok(expr)
            }
            Some(Token::LBrace) => self.parse_map(),
            Some(token) => Err(syntax(format!("unexpected {}", describe(&token)))),
            None => Err(syntax("unexpected end of expression".to_string())),
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<Expr, TransformCompileError> {
        let function = Function::from_name(name)
            .ok_or_else(|| TransformCompileError::UnknownFunction(name.to_string()))?;
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.parse_conditional()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(&Token::RParen, &format!("to close {name}()"))?;
                break;
            }
        }
        function.check_arity(args.len())?;
        function.check_args(&args)?;
        Ok(Expr::Call { function, args })
    }

    fn parse_map(&mut self) -> Result<Expr, TransformCompileError> {
        let mut entries = Vec::new();
        if self.eat(&Token::RBrace) {
            return Ok(Expr::Map(entries));
        }
        loop {
            let key = match self.consume() {
                Some(Token::Str(key) | Token::Ident(key)) => key,
                Some(Token::Number(n)) => number_key(n),
                Some(token) => {
                    return Err(syntax(format!(
                        "map keys must be strings, found {}",
                        describe(&token)
                    )));
                }
                None => return Err(syntax("unterminated map literal".to_string())),
            };
            self.expect(&Token::Colon, "after map key")?;
            let value = self.parse_conditional()?;
            entries.push((key, value));
            if self.eat(&Token::Comma) {
                // trailing comma
                if self.eat(&Token::RBrace) {
                    break;
                }
                continue;
            }
            self.expect(&Token::RBrace, "to close map literal")?;
            break;
        }
        Ok(Expr::Map(entries))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn syntax(message: String) -> TransformCompileError {
    TransformCompileError::Syntax(message)
}

/// Integral literals become JSON integers so `1` renders as `1`, not `1.0`.
fn number_literal(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

fn number_key(value: f64) -> String {
    match number_literal(value) {
        Value::Number(n) => n.to_string(),
        _ => value.to_string(),
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("number {n}"),
        Token::Str(s) => format!("string '{s}'"),
        Token::Ident(name) => format!("identifier '{name}'"),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Star => "'*'".to_string(),
        Token::Slash => "'/'".to_string(),
        Token::Percent => "'%'".to_string(),
        Token::Bang => "'!'".to_string(),
        Token::EqEq => "'=='".to_string(),
        Token::NotEq => "'!='".to_string(),
        Token::Lt => "'<'".to_string(),
        Token::Le => "'<='".to_string(),
        Token::Gt => "'>'".to_string(),
        Token::Ge => "'>='".to_string(),
        Token::AndAnd => "'&&'".to_string(),
        Token::OrOr => "'||'".to_string(),
        Token::Question => "'?'".to_string(),
        Token::Colon => "':'".to_string(),
        Token::Comma => "','".to_string(),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::LBrace => "'{'".to_string(),
        Token::RBrace => "'}'".to_string(),
    }
}
