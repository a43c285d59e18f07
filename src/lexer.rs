use crate::error::{SyntaxError, SyntaxErrorKind};

/// One lexical unit of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Literal(char),
    Dot,
    Star,
    Plus,
    Question,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Pipe,
    Escape(char),
    Eof,
}

impl Token {
    /// The character this token was scanned from.
    ///
    /// Used where a metacharacter loses its meaning, e.g. inside a class.
    pub fn as_char(self) -> Option<char> {
        match self {
            Token::Literal(c) | Token::Escape(c) => Some(c),
            Token::Dot => Some('.'),
            Token::Star => Some('*'),
            Token::Plus => Some('+'),
            Token::Question => Some('?'),
            Token::LeftParen => Some('('),
            Token::RightParen => Some(')'),
            Token::LeftBracket => Some('['),
            Token::RightBracket => Some(']'),
            Token::LeftBrace => Some('{'),
            Token::RightBrace => Some('}'),
            Token::Pipe => Some('|'),
            Token::Eof => None,
        }
    }
}

/// Scans a pattern one token at a time.
///
/// The lexer only tracks a cursor; it knows nothing about classes or
/// repetition bounds, those are the parser's business.
pub struct Lexer<'a> {
    pattern: &'a str,
    pos: usize,
    start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(pattern: &'a str) -> Self {
        Self {
            pattern,
            pos: 0,
            start: 0,
        }
    }

    /// Byte offset where the most recently returned token begins.
    pub fn token_start(&self) -> usize {
        self.start
    }

    fn peek(&self) -> Option<char> {
        self.pattern[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Return the next token and move past it.
    ///
    /// Once the pattern is exhausted every call yields `Token::Eof`.
    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.start = self.pos;
        let Some(ch) = self.advance() else {
            return Ok(Token::Eof);
        };
        let token = match ch {
            '.' => Token::Dot,
            '*' => Token::Star,
            '+' => Token::Plus,
            '?' => Token::Question,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '[' => Token::LeftBracket,
            ']' => Token::RightBracket,
            '{' => Token::LeftBrace,
            '}' => Token::RightBrace,
            '|' => Token::Pipe,
            '\\' => match self.advance() {
                Some(escaped) => Token::Escape(escaped),
                None => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::DanglingEscape,
                        self.start,
                    ))
                }
            },
            c => Token::Literal(c),
        };
        Ok(token)
    }
}
