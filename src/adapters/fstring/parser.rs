// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template and expression parser.
//!
//! Templates are scanned character by character. When a `{` opens a field, a
//! recursive-descent expression parser takes over at that byte offset and stops
//! at the token that ends the expression (`=`, `!`, `:` or `}`); scanning then
//! resumes from there.
//!
//! Expression grammar, lowest precedence first:
//!
//! ```text
//! expression  := or_test ["if" or_test "else" expression]
//! or_test     := and_test ("or" and_test)*
//! and_test    := not_test ("and" not_test)*
//! not_test    := "not" not_test | comparison
//! comparison  := arith (comp_op arith)*
//! arith       := term (("+" | "-") term)*
//! term        := factor (("*" | "/" | "//" | "%") factor)*
//! factor      := ("-" | "+" | "~") factor | power
//! power       := postfix ["**" factor]
//! postfix     := atom (call | subscript | "." NAME)*
//! atom        := NAME | NUMBER | STRING+ | "True" | "False" | "None"
//!              | "(" expression ")" | "(" generator ")" | list | list_comp
//! ```

use super::ast::{
    BinaryOp, BoolOp, Clause, CompareOp, Conversion, Expr, Field, Part, Template, UnaryOp,
};
use super::escape;
use super::lexer::{Lexer, Spanned, Token};
use super::value::Value;
use crate::domain::EvalError;

/// Open brackets allowed inside one field, counting the field's own brace.
const MAX_BRACKET_NESTING: usize = 200;

/// Recursion allowed through nested subexpressions of one field.
const MAX_EXPRESSION_DEPTH: usize = 1000;

/// Fields may nest inside a format spec, but the spec of a nested field may
/// not hold fields of its own.
const MAX_FIELD_NESTING: usize = 2;

/// Stack kept free before recursing, and the amount grown when it runs short.
pub(super) const RED_ZONE: usize = 100 * 1024;
pub(super) const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Parses a template body.
///
/// When `raw` is false, literal text has its backslash escapes decoded.
pub fn parse_template(src: &str, raw: bool) -> Result<Template, EvalError> {
    let scanner = Scanner { src, raw };
    let (parts, _) = scanner.parse_parts(0, 0)?;
    Ok(Template { parts })
}

struct Scanner<'a> {
    src: &'a str,
    raw: bool,
}

impl<'a> Scanner<'a> {
    fn char_at(&self, pos: usize) -> Option<char> {
        self.src.get(pos..)?.chars().next()
    }

    fn skip_whitespace(&self, mut pos: usize) -> usize {
        while let Some(c) = self.char_at(pos).filter(|c| c.is_whitespace()) {
            pos += c.len_utf8();
        }
        pos
    }

    /// Scans literal text and fields from `pos`.
    ///
    /// `spec_depth` is 0 at the top level and counts the format specs enclosing
    /// `pos` otherwise. Inside a format spec the scan stops at the unmatched `}`
    /// and returns its offset; at the top level it runs to the end of the input.
    fn parse_parts(
        &self,
        mut pos: usize,
        spec_depth: usize,
    ) -> Result<(Vec<Part>, usize), EvalError> {
        let in_spec = spec_depth > 0;
        let mut parts = Vec::new();
        let mut literal = String::new();

        while let Some(c) = self.char_at(pos) {
            match c {
                '{' if !in_spec && self.char_at(pos + 1) == Some('{') => {
                    literal.push('{');
                    pos += 2;
                }
                '{' if spec_depth >= MAX_FIELD_NESTING => {
                    return Err(EvalError::syntax("f-string: expressions nested too deeply"));
                }
                '{' => {
                    self.flush(&mut literal, &mut parts)?;
                    let (field, next) = self.parse_field(pos + 1, spec_depth + 1)?;
                    parts.push(Part::Field(field));
                    pos = next;
                }
                '}' if in_spec => {
                    self.flush(&mut literal, &mut parts)?;
                    return Ok((parts, pos));
                }
                '}' if self.char_at(pos + 1) == Some('}') => {
                    literal.push('}');
                    pos += 2;
                }
                '}' => return Err(EvalError::syntax("f-string: single '}' is not allowed")),
                c => {
                    literal.push(c);
                    pos += c.len_utf8();
                }
            }
        }

        if in_spec {
            return Err(EvalError::syntax("f-string: expecting '}'"));
        }
        self.flush(&mut literal, &mut parts)?;
        Ok((parts, pos))
    }

    fn flush(&self, literal: &mut String, parts: &mut Vec<Part>) -> Result<(), EvalError> {
        if literal.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(literal);
        let text = if self.raw { text } else { escape::decode(&text)? };
        parts.push(Part::Literal(text));
        Ok(())
    }

    /// Parses a field whose expression starts at `start`, just after the `{`.
    /// `level` is 1 for a top-level field and 2 for a field inside a spec.
    /// Returns the field and the offset just after its closing `}`.
    fn parse_field(&self, start: usize, level: usize) -> Result<(Field, usize), EvalError> {
        let mut parser = Parser::new(self.src, start)?;

        match parser.current.token {
            Token::RBrace | Token::Colon | Token::Bang | Token::Assign => {
                let c = self.char_at(parser.current.start).unwrap_or('}');
                return Err(EvalError::syntax(format!(
                    "f-string: valid expression required before '{}'",
                    c
                )));
            }
            Token::Eof => return Err(EvalError::syntax("f-string: expecting '}'")),
            _ => {}
        }

        let expr = parser.parse_expression()?;

        let mut pos = parser.current.start;
        let mut debug_text = None;
        match parser.current.token {
            Token::Assign => {
                pos = self.skip_whitespace(parser.current.end);
                debug_text = Some(self.src[start..pos].to_string());
            }
            Token::Bang | Token::Colon | Token::RBrace => {}
            Token::Comma => {
                return Err(EvalError::syntax("tuples are not supported in expressions"))
            }
            _ => return Err(EvalError::syntax("f-string: expecting '}'")),
        }

        let mut conversion = None;
        if self.char_at(pos) == Some('!') {
            conversion = Some(match self.char_at(pos + 1) {
                Some('s') => Conversion::Str,
                Some('r') => Conversion::Repr,
                Some('a') => Conversion::Ascii,
                None | Some('}' | ':') => {
                    return Err(EvalError::syntax("f-string: missing conversion character"))
                }
                Some(other) => {
                    return Err(EvalError::syntax(format!(
                        "f-string: invalid conversion character '{}': expected 's', 'r', or 'a'",
                        other
                    )))
                }
            });
            pos += 2;
        }

        let mut spec = None;
        match self.char_at(pos) {
            Some(':') => {
                let (parts, end) = self.parse_parts(pos + 1, level)?;
                spec = Some(Template { parts });
                pos = end + 1;
            }
            Some('}') => pos += 1,
            _ => return Err(EvalError::syntax("f-string: expecting '}'")),
        }

        Ok((
            Field {
                expr,
                debug_text,
                conversion,
                spec,
            },
            pos,
        ))
    }
}

struct Parser<'a> {
    src: &'a str,
    lexer: Lexer<'a>,
    current: Spanned,
    depth: usize,
    brackets: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, pos: usize) -> Result<Self, EvalError> {
        let mut lexer = Lexer::new(src, pos);
        let current = lexer.next_token()?;
        Ok(Self {
            src,
            lexer,
            current,
            depth: 0,
            // The field's own brace.
            brackets: 1,
        })
    }

    /// Runs a parse step one level deeper, growing the stack if needed.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        if self.depth >= MAX_EXPRESSION_DEPTH {
            return Err(EvalError::syntax("expression nested too deeply"));
        }
        self.depth += 1;
        let result = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || parse(self));
        self.depth -= 1;
        result
    }

    /// Runs a parse step inside a bracket that has just been opened.
    fn bracketed<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        if self.brackets >= MAX_BRACKET_NESTING {
            return Err(EvalError::syntax("too many nested parentheses"));
        }
        self.brackets += 1;
        let result = parse(self);
        self.brackets -= 1;
        result
    }

    /// Moves to the next token and returns the one just passed.
    fn advance(&mut self) -> Result<Spanned, EvalError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn check(&self, token: &Token) -> bool {
        &self.current.token == token
    }

    fn eat(&mut self, token: &Token) -> Result<bool, EvalError> {
        if self.check(token) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), EvalError> {
        if self.eat(&token)? {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_name(&mut self) -> Result<String, EvalError> {
        match &self.current.token {
            Token::Name(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected("a name")),
        }
    }

    fn unexpected(&self, expected: &str) -> EvalError {
        let found = match self.current.token {
            Token::Eof => "end of expression".to_string(),
            _ => format!("'{}'", &self.src[self.current.start..self.current.end]),
        };
        EvalError::syntax(format!("expected {} but found {}", expected, found))
    }

    fn parse_expression(&mut self) -> Result<Expr, EvalError> {
        self.nested(Self::parse_conditional)
    }

    fn parse_conditional(&mut self) -> Result<Expr, EvalError> {
        let body = self.parse_or()?;
        if self.eat(&Token::If)? {
            let test = self.parse_or()?;
            self.expect(Token::Else, "'else'")?;
            let orelse = self.parse_expression()?;
            return Ok(Expr::Conditional {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            });
        }
        Ok(body)
    }

    fn parse_or(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or)? {
            let right = self.parse_and()?;
            left = Expr::BoolOp {
                op: BoolOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_not()?;
        while self.eat(&Token::And)? {
            let right = self.parse_not()?;
            left = Expr::BoolOp {
                op: BoolOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, EvalError> {
        if self.eat(&Token::Not)? {
            let operand = self.nested(Self::parse_not)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, EvalError> {
        let first = self.parse_arith()?;
        let mut rest = Vec::new();

        loop {
            let op = match self.current.token {
                Token::Lt => CompareOp::Lt,
                Token::Le => CompareOp::Le,
                Token::Gt => CompareOp::Gt,
                Token::Ge => CompareOp::Ge,
                Token::EqEq => CompareOp::Eq,
                Token::NotEq => CompareOp::NotEq,
                Token::In => CompareOp::In,
                Token::Not => {
                    self.advance()?;
                    if !self.check(&Token::In) {
                        return Err(self.unexpected("'in'"));
                    }
                    CompareOp::NotIn
                }
                Token::Is => {
                    self.advance()?;
                    if self.check(&Token::Not) {
                        CompareOp::IsNot
                    } else {
                        rest.push((CompareOp::Is, self.parse_arith()?));
                        continue;
                    }
                }
                _ => break,
            };
            self.advance()?;
            rest.push((op, self.parse_arith()?));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn parse_arith(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.current.token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }
    }

    fn parse_term(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.current.token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::DoubleSlash => BinaryOp::FloorDiv,
                Token::Percent => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_factor()?;
            left = binary(op, left, right);
        }
    }

    fn parse_factor(&mut self) -> Result<Expr, EvalError> {
        let op = match self.current.token {
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Pos,
            Token::Tilde => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        self.advance()?;
        let operand = self.nested(Self::parse_factor)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> Result<Expr, EvalError> {
        let base = self.parse_postfix()?;
        if self.eat(&Token::DoubleStar)? {
            let exponent = self.nested(Self::parse_factor)?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.current.token {
                Token::LParen => {
                    self.advance()?;
                    let (args, kwargs) = self.bracketed(Self::parse_args)?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                        kwargs,
                    };
                }
                Token::LBracket => {
                    self.advance()?;
                    expr = self.bracketed(|parser| parser.parse_subscript(expr))?;
                }
                Token::Dot => {
                    self.advance()?;
                    let name = self.expect_name()?;
                    if self.eat(&Token::LParen)? {
                        let (args, kwargs) = self.bracketed(Self::parse_args)?;
                        expr = Expr::MethodCall {
                            receiver: Box::new(expr),
                            method: name,
                            args,
                            kwargs,
                        };
                    } else {
                        expr = Expr::Attribute {
                            value: Box::new(expr),
                            name,
                        };
                    }
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Parses call arguments after the opening parenthesis.
    #[allow(clippy::type_complexity)]
    fn parse_args(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), EvalError> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();

        while !self.check(&Token::RParen) {
            let expr = self.parse_expression()?;

            if self.check(&Token::Assign) {
                let Expr::Name(name) = expr else {
                    return Err(EvalError::syntax(
                        "expression cannot contain assignment, perhaps you meant \"==\"?",
                    ));
                };
                self.advance()?;
                let value = self.parse_expression()?;
                kwargs.push((name, value));
            } else if self.check(&Token::For) {
                if !args.is_empty() || !kwargs.is_empty() {
                    return Err(EvalError::syntax("Generator expression must be parenthesized"));
                }
                let clauses = self.parse_clauses()?;
                if !self.check(&Token::RParen) {
                    return Err(EvalError::syntax("Generator expression must be parenthesized"));
                }
                args.push(Expr::Comprehension {
                    element: Box::new(expr),
                    clauses,
                });
            } else {
                if !kwargs.is_empty() {
                    return Err(EvalError::syntax(
                        "positional argument follows keyword argument",
                    ));
                }
                args.push(expr);
            }

            if !self.eat(&Token::Comma)? {
                break;
            }
        }

        self.expect(Token::RParen, "')'")?;
        Ok((args, kwargs))
    }

    /// Parses an index or slice after the opening bracket.
    fn parse_subscript(&mut self, value: Expr) -> Result<Expr, EvalError> {
        let lower = if self.check(&Token::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };

        if !self.eat(&Token::Colon)? {
            let Some(index) = lower else {
                return Err(self.unexpected("an index"));
            };
            self.expect(Token::RBracket, "']'")?;
            return Ok(Expr::Subscript {
                value: Box::new(value),
                index,
            });
        }

        let upper = if self.check(&Token::Colon) || self.check(&Token::RBracket) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        let step = if self.eat(&Token::Colon)? && !self.check(&Token::RBracket) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        self.expect(Token::RBracket, "']'")?;

        Ok(Expr::Slice {
            value: Box::new(value),
            lower,
            upper,
            step,
        })
    }

    fn parse_clauses(&mut self) -> Result<Vec<Clause>, EvalError> {
        let mut clauses = Vec::new();
        while self.eat(&Token::For)? {
            let target = self.expect_name()?;
            self.expect(Token::In, "'in'")?;
            let iter = self.parse_or()?;
            let mut conditions = Vec::new();
            while self.eat(&Token::If)? {
                conditions.push(self.parse_or()?);
            }
            clauses.push(Clause {
                target,
                iter,
                conditions,
            });
        }
        Ok(clauses)
    }

    fn parse_atom(&mut self) -> Result<Expr, EvalError> {
        let spanned = self.advance()?;
        match spanned.token {
            Token::Name(name) => Ok(Expr::Name(name)),
            Token::Int(i) => Ok(Expr::Literal(Value::Int(i))),
            Token::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            Token::Str(mut s) => {
                while let Token::Str(next) = &self.current.token {
                    s.push_str(next);
                    self.advance()?;
                }
                Ok(Expr::Literal(Value::Str(s)))
            }
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::None => Ok(Expr::Literal(Value::None)),
            Token::LParen => self.bracketed(Self::parse_parenthesized),
            Token::LBracket => self.bracketed(Self::parse_list),
            Token::LBrace => Err(EvalError::syntax(
                "dict and set displays are not supported",
            )),
            Token::Eof => Err(EvalError::syntax("unexpected end of expression")),
            _ => Err(EvalError::syntax(format!(
                "invalid syntax at '{}'",
                &self.src[spanned.start..spanned.end]
            ))),
        }
    }

    /// Parses the rest of a parenthesized expression or generator after `(`.
    fn parse_parenthesized(&mut self) -> Result<Expr, EvalError> {
        if self.check(&Token::RParen) {
            return Err(EvalError::syntax("tuples are not supported in expressions"));
        }
        let inner = self.parse_expression()?;
        if self.check(&Token::For) {
            let clauses = self.parse_clauses()?;
            self.expect(Token::RParen, "')'")?;
            return Ok(Expr::Comprehension {
                element: Box::new(inner),
                clauses,
            });
        }
        if self.check(&Token::Comma) {
            return Err(EvalError::syntax("tuples are not supported in expressions"));
        }
        self.expect(Token::RParen, "')'")?;
        Ok(inner)
    }

    /// Parses the rest of a list display or comprehension after `[`.
    fn parse_list(&mut self) -> Result<Expr, EvalError> {
        let mut items = Vec::new();
        if self.eat(&Token::RBracket)? {
            return Ok(Expr::List(items));
        }
        let first = self.parse_expression()?;
        if self.check(&Token::For) {
            let clauses = self.parse_clauses()?;
            self.expect(Token::RBracket, "']'")?;
            return Ok(Expr::Comprehension {
                element: Box::new(first),
                clauses,
            });
        }
        items.push(first);
        while self.eat(&Token::Comma)? {
            if self.check(&Token::RBracket) {
                break;
            }
            items.push(self.parse_expression()?);
        }
        self.expect(Token::RBracket, "']'")?;
        Ok(Expr::List(items))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
