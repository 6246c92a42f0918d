use crate::error::ExprError;

use super::lexer::Token;

const MAX_DEPTH: usize = 64;

/// Namespaces whose members are called as plain functions (`base64.encode(x)`).
const NAMESPACES: [&str; 2] = ["base64", "json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    LooseEq,
    LooseNe,
    StrictEq,
    StrictNe,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
    Var(String),
    List(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    Method(Box<Expr>, String, Vec<Expr>),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

pub(super) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub(super) const fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parses a whole program: `[return] expr [;]`.
    pub(super) fn parse_program(mut self) -> Result<Expr, ExprError> {
        if matches!(self.peek(), Some(Token::Ident(name)) if name == "return") {
            self.advance();
        }
        if self.peek().is_none() {
            return Err(ExprError::Empty);
        }
        let expr = self.expression()?;
        while self.eat(&Token::Semicolon) {}
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(ExprError::UnexpectedToken {
                found: token.describe(),
                expected: "end of expression",
            }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos = self.pos.saturating_add(1);
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            return true;
        }
        false
    }

    fn expect(&mut self, expected: &Token, label: &'static str) -> Result<(), ExprError> {
        match self.advance() {
            Some(token) if &token == expected => Ok(()),
            Some(token) => Err(ExprError::UnexpectedToken {
                found: token.describe(),
                expected: label,
            }),
            None => Err(ExprError::UnexpectedEnd { expected: label }),
        }
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth = self.depth.saturating_add(1);
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep);
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Each node folded into a left-leaning chain adds one level to the tree.
    fn fold(&mut self, folds: &mut usize) -> Result<(), ExprError> {
        self.enter()?;
        *folds = folds.saturating_add(1);
        Ok(())
    }

    fn release(&mut self, folds: usize) {
        self.depth = self.depth.saturating_sub(folds);
    }

    fn expression(&mut self) -> Result<Expr, ExprError> {
        self.enter()?;
        let result = self.ternary();
        self.leave();
        result
    }

    fn ternary(&mut self) -> Result<Expr, ExprError> {
        let condition = self.or()?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        let then = self.expression()?;
        self.expect(&Token::Colon, "':'")?;
        let otherwise = self.expression()?;
        Ok(Expr::Ternary(
            Box::new(condition),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.and()?;
        let mut folds = 0;
        while self.eat(&Token::Or) {
            self.fold(&mut folds)?;
            let right = self.and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        self.release(folds);
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.equality()?;
        let mut folds = 0;
        while self.eat(&Token::And) {
            self.fold(&mut folds)?;
            let right = self.equality()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        self.release(folds);
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.comparison()?;
        let mut folds = 0;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::LooseEq,
                Some(Token::NotEq) => BinaryOp::LooseNe,
                Some(Token::StrictEq) => BinaryOp::StrictEq,
                Some(Token::StrictNotEq) => BinaryOp::StrictNe,
                _ => break,
            };
            self.advance();
            self.fold(&mut folds)?;
            let right = self.comparison()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.release(folds);
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.additive()?;
        let mut folds = 0;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            self.fold(&mut folds)?;
            let right = self.additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.release(folds);
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.multiplicative()?;
        let mut folds = 0;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            self.fold(&mut folds)?;
            let right = self.multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.release(folds);
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.unary()?;
        let mut folds = 0;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.advance();
            self.fold(&mut folds)?;
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.release(folds);
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::Not) {
            self.enter()?;
            let inner = self.unary();
            self.leave();
            return Ok(Expr::Not(Box::new(inner?)));
        }
        if self.eat(&Token::Minus) {
            self.enter()?;
            let inner = self.unary();
            self.leave();
            return Ok(Expr::Neg(Box::new(inner?)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.primary()?;
        let mut folds = 0;
        loop {
            if matches!(
                self.peek(),
                Some(Token::Dot | Token::LBracket | Token::LParen)
            ) {
                self.fold(&mut folds)?;
            }
            if self.eat(&Token::Dot) {
                let property = match self.advance() {
                    Some(Token::Ident(name)) => name,
                    Some(token) => {
                        return Err(ExprError::UnexpectedToken {
                            found: token.describe(),
                            expected: "property name",
                        });
                    }
                    None => {
                        return Err(ExprError::UnexpectedEnd {
                            expected: "property name",
                        });
                    }
                };
                expr = Expr::Member(Box::new(expr), property);
            } else if self.eat(&Token::LBracket) {
                let index = self.expression()?;
                self.expect(&Token::RBracket, "']'")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else if self.eat(&Token::LParen) {
                let args = self.arguments()?;
                expr = match expr {
                    Expr::Var(name) => Expr::Call(name, args),
                    Expr::Member(target, property) => match *target {
                        Expr::Var(namespace) if NAMESPACES.contains(&namespace.as_str()) => {
                            Expr::Call(format!("{}.{}", namespace, property), args)
                        }
                        other => Expr::Method(Box::new(other), property, args),
                    },
                    _ => {
                        return Err(ExprError::UnexpectedToken {
                            found: "(".to_owned(),
                            expected: "callable name",
                        });
                    }
                };
            } else {
                break;
            }
        }
        self.release(folds);
        Ok(expr)
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            self.expect(&Token::Comma, "',' or ')'")?;
        }
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let token = self.advance().ok_or(ExprError::UnexpectedEnd {
            expected: "a value",
        })?;
        match token {
            Token::Number(number) => Ok(Expr::Number(number)),
            Token::Str(text) => Ok(Expr::Str(text)),
            Token::Ident(name) => Ok(match name.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "null" => Expr::Null,
                "undefined" => Expr::Undefined,
                _ => Expr::Var(name),
            }),
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::LBracket => {
                let mut items = Vec::new();
                if self.eat(&Token::RBracket) {
                    return Ok(Expr::List(items));
                }
                loop {
                    items.push(self.expression()?);
                    if self.eat(&Token::RBracket) {
                        return Ok(Expr::List(items));
                    }
                    self.expect(&Token::Comma, "',' or ']'")?;
                }
            }
            Token::LBrace => self.object(),
            other => Err(ExprError::UnexpectedToken {
                found: other.describe(),
                expected: "a value",
            }),
        }
    }

    fn object(&mut self) -> Result<Expr, ExprError> {
        let mut fields = Vec::new();
        if self.eat(&Token::RBrace) {
            return Ok(Expr::Object(fields));
        }
        loop {
            let key = match self.advance() {
                Some(Token::Ident(name) | Token::Str(name)) => name,
                Some(token) => {
                    return Err(ExprError::UnexpectedToken {
                        found: token.describe(),
                        expected: "object key",
                    });
                }
                None => {
                    return Err(ExprError::UnexpectedEnd {
                        expected: "object key",
                    });
                }
            };
            let value = if self.eat(&Token::Colon) {
                self.expression()?
            } else {
                // shorthand `{ status }`
                Expr::Var(key.clone())
            };
            fields.push((key, value));
            if self.eat(&Token::RBrace) {
                return Ok(Expr::Object(fields));
            }
            self.expect(&Token::Comma, "',' or '}'")?;
            if self.eat(&Token::RBrace) {
                return Ok(Expr::Object(fields));
            }
        }
    }
}
