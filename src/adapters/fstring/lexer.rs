// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tokenizer for expressions inside replacement fields.
//!
//! The lexer is pulled one token at a time and never reads past the token it
//! returns. The template parser depends on this: after an expression ends at
//! `:` it reads the format spec from the byte offset right after the colon.

use super::escape;
use crate::domain::EvalError;

/// An expression token.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Identifier
    Name(String),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal, escapes already decoded
    Str(String),

    // Keywords
    /// `if`
    If,
    /// `else`
    Else,
    /// `and`
    And,
    /// `or`
    Or,
    /// `not`
    Not,
    /// `in`
    In,
    /// `is`
    Is,
    /// `for`
    For,
    /// `True`
    True,
    /// `False`
    False,
    /// `None`
    None,

    // Punctuation
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `!` not followed by `=`
    Bang,
    /// `=` not followed by `=`
    Assign,

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    DoubleStar,
    /// `/`
    Slash,
    /// `//`
    DoubleSlash,
    /// `%`
    Percent,
    /// `~`
    Tilde,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,

    /// End of input
    Eof,
}

/// A token with its byte range in the source.
#[derive(Clone, Debug, PartialEq)]
pub struct Spanned {
    /// The token
    pub token: Token,
    /// Offset of the first byte
    pub start: usize,
    /// Offset one past the last byte
    pub end: usize,
}

/// Pull-based tokenizer over a source string.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer that starts at byte offset `pos`.
    pub fn new(src: &'a str, pos: usize) -> Self {
        Self { src, pos }
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Lexes the next token.
    pub fn next_token(&mut self) -> Result<Spanned, EvalError> {
        self.skip_whitespace();
        let start = self.pos;

        let Some(c) = self.peek_char() else {
            return Ok(Spanned {
                token: Token::Eof,
                start,
                end: start,
            });
        };

        let token = if c.is_alphabetic() || c == '_' {
            self.lex_word()?
        } else if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).is_some_and(|d| d.is_ascii_digit()))
        {
            self.lex_number()?
        } else if c == '\'' || c == '"' {
            self.lex_string(false)?
        } else {
            self.lex_operator()?
        };

        Ok(Spanned {
            token,
            start,
            end: self.pos,
        })
    }

    fn lex_word(&mut self) -> Result<Token, EvalError> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let word = &self.src[start..self.pos];

        if matches!(self.peek_char(), Some('\'' | '"')) {
            match word {
                "r" | "R" => return self.lex_string(true),
                "f" | "F" | "rf" | "fr" | "Rf" | "fR" | "RF" | "FR" => {
                    return Err(EvalError::syntax(
                        "nested f-string literals are not supported",
                    ))
                }
                "b" | "B" | "rb" | "br" => {
                    return Err(EvalError::syntax("bytes literals are not supported"))
                }
                _ => {}
            }
        }

        Ok(match word {
            "if" => Token::If,
            "else" => Token::Else,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "in" => Token::In,
            "is" => Token::Is,
            "for" => Token::For,
            "True" => Token::True,
            "False" => Token::False,
            "None" => Token::None,
            "lambda" | "yield" | "await" | "async" | "del" | "import" | "from" | "class"
            | "def" | "return" | "global" | "nonlocal" | "pass" | "raise" | "while"
            | "with" | "try" | "except" | "finally" | "assert" | "break" | "continue"
            | "elif" | "as" => {
                return Err(EvalError::syntax(format!(
                    "'{}' is not supported in expressions",
                    word
                )))
            }
            _ => Token::Name(word.to_string()),
        })
    }

    fn lex_number(&mut self) -> Result<Token, EvalError> {
        let start = self.pos;

        if self.peek_char() == Some('0') {
            let radix = match self.peek_char_at(1) {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.pos += 2;
                let digits_start = self.pos;
                while self
                    .peek_char()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    self.bump();
                }
                let digits = self.src[digits_start..self.pos].replace('_', "");
                return i64::from_str_radix(&digits, radix)
                    .map(Token::Int)
                    .map_err(|_| {
                        EvalError::syntax(format!(
                            "invalid integer literal '{}'",
                            &self.src[start..self.pos]
                        ))
                    });
            }
        }

        let mut is_float = false;
        self.eat_digits();
        if self.peek_char() == Some('.') {
            is_float = true;
            self.bump();
            self.eat_digits();
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let sign_offset = usize::from(matches!(self.peek_char_at(1), Some('+' | '-')));
            if self
                .peek_char_at(1 + sign_offset)
                .is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                self.pos += 1 + sign_offset;
                self.eat_digits();
            }
        }
        if let Some(c) = self.peek_char().filter(|c| c.is_alphabetic()) {
            return Err(EvalError::syntax(format!(
                "invalid decimal literal '{}{}'",
                &self.src[start..self.pos],
                c
            )));
        }

        let text = &self.src[start..self.pos];
        if text.starts_with('_') || text.ends_with('_') || text.contains("__") {
            return Err(EvalError::syntax(format!("invalid decimal literal '{}'", text)));
        }
        let digits = text.replace('_', "");
        if is_float {
            digits
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| EvalError::syntax(format!("invalid float literal '{}'", text)))
        } else {
            digits.parse::<i64>().map(Token::Int).map_err(|_| {
                EvalError::syntax(format!("integer literal '{}' is too large", text))
            })
        }
    }

    fn eat_digits(&mut self) {
        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_digit() || c == '_')
        {
            self.bump();
        }
    }

    fn lex_string(&mut self, raw: bool) -> Result<Token, EvalError> {
        let quote = self.bump().unwrap_or('\'');
        let triple = self.peek_char() == Some(quote) && self.peek_char_at(1) == Some(quote);
        if triple {
            self.pos += 2;
        }

        let body_start = self.pos;
        loop {
            let Some(c) = self.bump() else {
                return Err(EvalError::syntax("unterminated string literal"));
            };
            match c {
                '\\' => {
                    // The escaped character never closes the literal.
                    if self.bump().is_none() {
                        return Err(EvalError::syntax("unterminated string literal"));
                    }
                }
                '\n' if !triple => {
                    return Err(EvalError::syntax("unterminated string literal"));
                }
                c if c == quote => {
                    if !triple {
                        break;
                    }
                    if self.peek_char() == Some(quote) && self.peek_char_at(1) == Some(quote) {
                        self.pos += 2;
                        break;
                    }
                }
                _ => {}
            }
        }

        let close_len = if triple { 3 } else { 1 };
        let body = &self.src[body_start..self.pos - close_len];
        let value = if raw {
            body.to_string()
        } else {
            escape::decode(body)?
        };
        Ok(Token::Str(value))
    }

    fn lex_operator(&mut self) -> Result<Token, EvalError> {
        let c = self.bump().unwrap_or('\0');
        let next = self.peek_char();

        let (token, extra) = match (c, next) {
            ('*', Some('*')) => (Token::DoubleStar, 1),
            ('/', Some('/')) => (Token::DoubleSlash, 1),
            ('=', Some('=')) => (Token::EqEq, 1),
            ('!', Some('=')) => (Token::NotEq, 1),
            ('<', Some('=')) => (Token::Le, 1),
            ('>', Some('=')) => (Token::Ge, 1),
            ('(', _) => (Token::LParen, 0),
            (')', _) => (Token::RParen, 0),
            ('[', _) => (Token::LBracket, 0),
            (']', _) => (Token::RBracket, 0),
            ('{', _) => (Token::LBrace, 0),
            ('}', _) => (Token::RBrace, 0),
            (',', _) => (Token::Comma, 0),
            (':', _) => (Token::Colon, 0),
            ('.', _) => (Token::Dot, 0),
            ('!', _) => (Token::Bang, 0),
            ('=', _) => (Token::Assign, 0),
            ('+', _) => (Token::Plus, 0),
            ('-', _) => (Token::Minus, 0),
            ('*', _) => (Token::Star, 0),
            ('/', _) => (Token::Slash, 0),
            ('%', _) => (Token::Percent, 0),
            ('~', _) => (Token::Tilde, 0),
            ('<', _) => (Token::Lt, 0),
            ('>', _) => (Token::Gt, 0),
            (other, _) => {
                return Err(EvalError::syntax(format!(
                    "invalid character '{}' in expression",
                    other
                )))
            }
        };
        self.pos += extra;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src, 0);
        let mut out = Vec::new();
        loop {
            let spanned = lexer.next_token().unwrap();
            if spanned.token == Token::Eof {
                return out;
            }
            out.push(spanned.token);
        }
    }

    #[test]
    fn test_names_and_keywords() {
        assert_eq!(
            tokens("a if not b else None"),
            vec![
                Token::Name("a".to_string()),
                Token::If,
                Token::Not,
                Token::Name("b".to_string()),
                Token::Else,
                Token::None,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("1 2.5 .5 1e3 0x1f 0b101 1_000"),
            vec![
                Token::Int(1),
                Token::Float(2.5),
                Token::Float(0.5),
                Token::Float(1000.0),
                Token::Int(31),
                Token::Int(5),
                Token::Int(1000),
            ]
        );
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(Lexer::new("1abc", 0).next_token().unwrap_err().is_syntax());
        assert!(Lexer::new("99999999999999999999", 0)
            .next_token()
            .unwrap_err()
            .is_syntax());
        assert!(Lexer::new("0xzz", 0).next_token().is_err());
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            tokens(r#"'a' "b\n" r'c\n' """d"e""""#),
            vec![
                Token::Str("a".to_string()),
                Token::Str("b\n".to_string()),
                Token::Str("c\\n".to_string()),
                Token::Str("d\"e".to_string()),
            ]
        );
    }

    #[test]
    fn test_escaped_quote_does_not_close() {
        assert_eq!(tokens(r"'it\'s'"), vec![Token::Str("it's".to_string())]);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(Lexer::new("'abc", 0).next_token().unwrap_err().is_syntax());
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokens("** // == != <= >= ! = < > ~ %"),
            vec![
                Token::DoubleStar,
                Token::DoubleSlash,
                Token::EqEq,
                Token::NotEq,
                Token::Le,
                Token::Ge,
                Token::Bang,
                Token::Assign,
                Token::Lt,
                Token::Gt,
                Token::Tilde,
                Token::Percent,
            ]
        );
    }

    #[test]
    fn test_bang_before_conversion() {
        assert_eq!(
            tokens("a!r"),
            vec![
                Token::Name("a".to_string()),
                Token::Bang,
                Token::Name("r".to_string()),
            ]
        );
    }

    #[test]
    fn test_spans_and_offset_start() {
        let mut lexer = Lexer::new("{ab:.2f}", 1);
        let name = lexer.next_token().unwrap();
        assert_eq!(name.token, Token::Name("ab".to_string()));
        assert_eq!((name.start, name.end), (1, 3));
        let colon = lexer.next_token().unwrap();
        assert_eq!(colon.token, Token::Colon);
        assert_eq!(colon.end, 4);
    }

    #[test]
    fn test_unsupported() {
        assert!(Lexer::new("f'x'", 0).next_token().is_err());
        assert!(Lexer::new("lambda", 0).next_token().is_err());
        assert!(Lexer::new("$", 0).next_token().is_err());
    }
}
