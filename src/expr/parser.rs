//! Recursive-descent parser for the restricted arithmetic grammar.
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := ('+' | '-') unary | atom
//! atom   := NUMBER | '(' expr ')'
//! NUMBER := DIGITS ['.' DIGITS?] | '.' DIGITS
//! ```
//!
//! Anything else, including `**`, `//`, implicit multiplication and empty
//! parentheses, is a syntax error.

use super::ast::ArithmeticNode;
use super::eval::EvalError;

/// Binary operator symbols the grammar accepts.
pub const BINARY_OPERATORS: [char; 4] = ['+', '-', '*', '/'];

/// Unary operator symbols the grammar accepts.
pub const UNARY_OPERATORS: [char; 2] = ['+', '-'];

/// Nesting limit for groups and unary chains.
const MAX_DEPTH: usize = 256;

/// Token limit. Operator chains build a tree as tall as they are long, and
/// both evaluation and drop recurse over that height.
const MAX_TOKENS: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Op(char),
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, EvalError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '(' => {
                tokens.push((i, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((i, Token::RParen));
                i += 1;
            }
            c if BINARY_OPERATORS.contains(&c) => {
                tokens.push((i, Token::Op(c)));
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i < chars.len() && chars[i] == '.' {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                if literal == "." {
                    return Err(EvalError::SyntaxError(format!(
                        "lone decimal point at position {}",
                        start
                    )));
                }
                let value = literal.parse::<f64>().map_err(|e| {
                    EvalError::SyntaxError(format!("invalid number '{}': {}", literal, e))
                })?;
                tokens.push((start, Token::Number(value)));
            }
            other => {
                return Err(EvalError::SyntaxError(format!(
                    "unexpected character '{}' at position {}",
                    other, i
                )));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::SyntaxError(format!(
                "expression nested deeper than {} levels",
                MAX_DEPTH
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expr(&mut self) -> Result<ArithmeticNode, EvalError> {
        let mut node = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let right = self.term()?;
            node = ArithmeticNode::binary(op, node, right);
        }
        Ok(node)
    }

    fn term(&mut self) -> Result<ArithmeticNode, EvalError> {
        let mut node = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let right = self.unary()?;
            node = ArithmeticNode::binary(op, node, right);
        }
        Ok(node)
    }

    fn unary(&mut self) -> Result<ArithmeticNode, EvalError> {
        if let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            if UNARY_OPERATORS.contains(&op) {
                self.pos += 1;
                self.enter()?;
                let operand = self.unary()?;
                self.leave();
                return Ok(ArithmeticNode::unary(op, operand));
            }
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<ArithmeticNode, EvalError> {
        match self.next() {
            Some((_, Token::Number(value))) => Ok(ArithmeticNode::Number(value)),
            Some((at, Token::LParen)) => {
                self.enter()?;
                let inner = self.expr()?;
                self.leave();
                match self.next() {
                    Some((_, Token::RParen)) => Ok(inner),
                    Some((pos, token)) => Err(EvalError::SyntaxError(format!(
                        "expected ')' to close '(' at position {}, found {} at position {}",
                        at,
                        describe(&token),
                        pos
                    ))),
                    None => Err(EvalError::SyntaxError(format!(
                        "unclosed '(' at position {}",
                        at
                    ))),
                }
            }
            Some((pos, token)) => Err(EvalError::SyntaxError(format!(
                "unexpected {} at position {}",
                describe(&token),
                pos
            ))),
            None => Err(EvalError::SyntaxError(
                "unexpected end of expression".to_string(),
            )),
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(v) => format!("number {}", v),
        Token::Op(c) => format!("'{}'", c),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
    }
}

/// Parse an expression into an [`ArithmeticNode`] tree.
pub fn parse(input: &str) -> Result<ArithmeticNode, EvalError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(EvalError::SyntaxError("empty expression".to_string()));
    }
    if tokens.len() > MAX_TOKENS {
        return Err(EvalError::SyntaxError(format!(
            "expression longer than {} tokens",
            MAX_TOKENS
        )));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let tree = parser.expr()?;

    if let Some((pos, token)) = parser.next() {
        return Err(EvalError::SyntaxError(format!(
            "unexpected {} at position {}",
            describe(&token),
            pos
        )));
    }

    Ok(tree)
}
