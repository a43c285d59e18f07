use crate::ast::{Ast, CharClass, ClassMember, RegexNode, MAX_REPEAT};
use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::lexer::{Lexer, Token};

/// Knobs that change what the parser accepts.
#[derive(Debug, Clone, Copy)]
pub struct ParserConfig {
    /// Deepest group nesting accepted before giving up.
    pub nest_limit: u32,
    /// Whether `()` and empty alternatives such as `a||b` are allowed.
    pub allow_empty: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            nest_limit: 250,
            allow_empty: true,
        }
    }
}

/// Parser for regular expressions.
///
/// The `Parser` pulls tokens from a [`Lexer`] with one token of lookahead.
/// It also hands out capture group IDs, starting at 1 for every call to
/// [`Parser::parse`].
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    offset: usize,
    next_group_id: usize,
    depth: u32,
    config: ParserConfig,
}

/// Parse `pattern` with the default configuration.
pub fn parse(pattern: &str) -> Result<Ast, SyntaxError> {
    Parser::new(pattern).parse()
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given pattern.
    pub fn new(pattern: &'a str) -> Self {
        Self::with_config(pattern, ParserConfig::default())
    }

    pub fn with_config(pattern: &'a str, config: ParserConfig) -> Self {
        Self {
            lexer: Lexer::new(pattern),
            current: Token::Eof,
            offset: 0,
            next_group_id: 1,
            depth: 0,
            config,
        }
    }

    fn error(&self, kind: SyntaxErrorKind, offset: usize) -> SyntaxError {
        SyntaxError::new(kind, offset)
    }

    /// Allocate a new group ID for capturing groups.
    fn alloc_group_id(&mut self) -> usize {
        let id = self.next_group_id;
        self.next_group_id += 1;
        id
    }

    /// Move to the next token.
    fn bump(&mut self) -> Result<(), SyntaxError> {
        self.current = self.lexer.next_token()?;
        self.offset = self.lexer.token_start();
        Ok(())
    }

    /// Entry point for parsing a regex pattern.
    ///
    /// Example:
    /// - Pattern: `a|b` → Alternation(Literal('a'), Literal('b'))
    pub fn parse(&mut self) -> Result<Ast, SyntaxError> {
        self.next_group_id = 1;
        self.depth = 0;
        self.bump()?;

        let root = self.parse_alternation()?;
        // Alternation only stops at `)` or the end of the pattern.
        if self.current == Token::RightParen {
            return Err(self.error(SyntaxErrorKind::UnmatchedCloseParen, self.offset));
        }
        Ok(Ast {
            root,
            group_count: self.next_group_id - 1,
        })
    }

    /// Parse alternation (`|`) in the pattern.
    ///
    /// Example:
    /// - Pattern: `a|b|c` → Alternation(a, Alternation(b, c))
    /// - Pattern: `abc`   → Concat(a, Concat(b, c))
    fn parse_alternation(&mut self) -> Result<RegexNode, SyntaxError> {
        let mut branch_start = self.offset;
        let mut branches = vec![self.parse_concat()?];
        let mut empty_at = matches!(branches[0], RegexNode::Empty).then_some(branch_start);

        while self.current == Token::Pipe {
            self.bump()?;
            branch_start = self.offset;
            let branch = self.parse_concat()?;
            if empty_at.is_none() && matches!(branch, RegexNode::Empty) {
                empty_at = Some(branch_start);
            }
            branches.push(branch);
        }

        if let Some(offset) = empty_at {
            if branches.len() > 1 && !self.config.allow_empty {
                return Err(self.error(SyntaxErrorKind::EmptyAlternative, offset));
            }
        }
        Ok(RegexNode::alternation(branches))
    }

    /// Parse a sequence of quantified atoms (concatenation).
    ///
    /// An empty sequence becomes `Empty`.
    ///
    /// Example:
    /// - Pattern: `a(b|c)d` → Concat(a, Concat(Group, d))
    fn parse_concat(&mut self) -> Result<RegexNode, SyntaxError> {
        let mut items = Vec::new();
        loop {
            match self.current {
                Token::Pipe | Token::RightParen | Token::Eof => break,
                _ => items.push(self.parse_quantified()?),
            }
        }
        Ok(RegexNode::concat(items))
    }

    /// Parse an atom followed by at most one repetition operator.
    ///
    /// Example:
    /// - Pattern: `a*`     → Quantifier { Literal('a'), min: 0, max: None }
    /// - Pattern: `b+`     → Quantifier { Literal('b'), min: 1, max: None }
    /// - Pattern: `c?`     → Quantifier { Literal('c'), min: 0, max: Some(1) }
    /// - Pattern: `d{2,5}` → Quantifier { Literal('d'), min: 2, max: Some(5) }
    fn parse_quantified(&mut self) -> Result<RegexNode, SyntaxError> {
        let atom = self.parse_atom()?;
        let (min, max) = match self.current {
            Token::Star => (0, None),
            Token::Plus => (1, None),
            Token::Question => (0, Some(1)),
            Token::LeftBrace => {
                let (min, max) = self.parse_bounds()?;
                return Ok(RegexNode::repeat(atom, min, max));
            }
            _ => return Ok(atom),
        };
        self.bump()?;
        Ok(RegexNode::repeat(atom, min, max))
    }

    /// Parse `{m}`, `{m,}` or `{m,n}`, starting at the `{`.
    fn parse_bounds(&mut self) -> Result<(u32, Option<u32>), SyntaxError> {
        let open = self.offset;
        self.bump()?;

        let min = self
            .parse_number(open)?
            .ok_or_else(|| self.error(SyntaxErrorKind::InvalidRepetition, self.offset))?;
        let max = match self.current {
            Token::RightBrace => Some(min),
            Token::Literal(',') => {
                self.bump()?;
                if self.current == Token::RightBrace {
                    None
                } else {
                    let max = self.parse_number(open)?.ok_or_else(|| {
                        self.error(SyntaxErrorKind::InvalidRepetition, self.offset)
                    })?;
                    Some(max)
                }
            }
            _ => return Err(self.error(SyntaxErrorKind::InvalidRepetition, self.offset)),
        };

        if self.current != Token::RightBrace {
            return Err(self.error(SyntaxErrorKind::InvalidRepetition, self.offset));
        }
        self.bump()?;

        if matches!(max, Some(max) if max < min) {
            return Err(self.error(SyntaxErrorKind::InvalidRepetition, open));
        }
        Ok((min, max))
    }

    /// Read a run of decimal digits, or `None` if there are none.
    fn parse_number(&mut self, open: usize) -> Result<Option<u32>, SyntaxError> {
        let mut value: Option<u32> = None;
        while let Token::Literal(c @ '0'..='9') = self.current {
            let digit = c as u32 - '0' as u32;
            let next = value.unwrap_or(0) * 10 + digit;
            if next > MAX_REPEAT {
                return Err(self.error(SyntaxErrorKind::RepetitionTooLarge, open));
            }
            value = Some(next);
            self.bump()?;
        }
        Ok(value)
    }

    /// Parse a single atom: group, char class, escape, dot or literal.
    ///
    /// Examples:
    /// - Pattern: `(abc)` → Group { id, node: Concat(a, Concat(b, c)) }
    /// - Pattern: `[a-c]` → CharClass { members: [Range('a', 'c')], negated: false }
    /// - Pattern: `\*`    → Literal('*')
    /// - Pattern: `.`     → Dot
    /// - Pattern: `]`     → Literal(']')
    fn parse_atom(&mut self) -> Result<RegexNode, SyntaxError> {
        let node = match self.current {
            Token::Literal(c) | Token::Escape(c) => RegexNode::Literal(c),
            Token::Dot => RegexNode::Dot,
            Token::LeftParen => return self.parse_group(),
            Token::LeftBracket => return self.parse_char_class(),
            Token::RightBracket => RegexNode::Literal(']'),
            Token::RightBrace => RegexNode::Literal('}'),
            Token::Star | Token::Plus | Token::Question | Token::LeftBrace => {
                return Err(self.error(SyntaxErrorKind::MissingRepeatOperand, self.offset));
            }
            Token::Pipe | Token::RightParen | Token::Eof => return Ok(RegexNode::Empty),
        };
        self.bump()?;
        Ok(node)
    }

    /// Parse a capturing group. The ID is taken before the body is parsed,
    /// so `((a)b)` numbers the outer group 1 and the inner group 2.
    fn parse_group(&mut self) -> Result<RegexNode, SyntaxError> {
        let open = self.offset;
        if self.depth >= self.config.nest_limit {
            let limit = self.config.nest_limit;
            return Err(self.error(SyntaxErrorKind::NestLimitExceeded { limit }, open));
        }
        self.depth += 1;
        self.bump()?;

        let id = self.alloc_group_id();
        let node = self.parse_alternation()?;
        if self.current != Token::RightParen {
            return Err(self.error(SyntaxErrorKind::UnmatchedOpenParen, open));
        }
        if matches!(node, RegexNode::Empty) && !self.config.allow_empty {
            return Err(self.error(SyntaxErrorKind::EmptyAlternative, open));
        }
        self.bump()?;
        self.depth -= 1;

        Ok(RegexNode::Group {
            id,
            node: Box::new(node),
        })
    }

    /// Parse a character class, e.g. `[abc]`, `[^a-z]` or `[]a]`.
    ///
    /// Metacharacters lose their meaning inside the brackets. A `]` right
    /// after the opening `[` (or `[^`) is a member, and a `-` at either
    /// end is a literal dash.
    fn parse_char_class(&mut self) -> Result<RegexNode, SyntaxError> {
        let open = self.offset;
        self.bump()?;

        let negated = self.current == Token::Literal('^');
        if negated {
            self.bump()?;
        }

        let mut members = Vec::new();
        loop {
            if self.current == Token::RightBracket && !members.is_empty() {
                break;
            }
            let Some(lo) = self.current.as_char() else {
                return Err(self.error(SyntaxErrorKind::UnterminatedClass, open));
            };
            let lo_offset = self.offset;
            self.bump()?;

            if self.current != Token::Literal('-') {
                members.push(ClassMember::Char(lo));
                continue;
            }
            self.bump()?;

            match self.current {
                Token::Eof => return Err(self.error(SyntaxErrorKind::UnterminatedClass, open)),
                Token::RightBracket => {
                    members.push(ClassMember::Char(lo));
                    members.push(ClassMember::Char('-'));
                }
                token => {
                    let Some(hi) = token.as_char() else {
                        return Err(self.error(SyntaxErrorKind::UnterminatedClass, open));
                    };
                    if lo > hi {
                        return Err(self.error(SyntaxErrorKind::InvalidRange { lo, hi }, lo_offset));
                    }
                    members.push(ClassMember::Range(lo, hi));
                    self.bump()?;
                }
            }
        }
        self.bump()?;

        Ok(RegexNode::CharClass(CharClass { negated, members }))
    }
}
