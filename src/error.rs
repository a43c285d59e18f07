use thiserror::Error;

/// An error produced while compiling a pattern.
///
/// `offset` is the byte offset into the pattern at which the problem was
/// detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub offset: usize,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("unclosed group")]
    UnmatchedOpenParen,
    #[error("unopened group")]
    UnmatchedCloseParen,
    #[error("unterminated character class")]
    UnterminatedClass,
    #[error("incomplete escape sequence")]
    DanglingEscape,
    #[error("invalid class range {lo:?}-{hi:?}")]
    InvalidRange { lo: char, hi: char },
    #[error("empty alternative")]
    EmptyAlternative,
    #[error("repetition operator missing expression")]
    MissingRepeatOperand,
    #[error("invalid repetition bounds")]
    InvalidRepetition,
    #[error("repetition bound exceeds {}", crate::ast::MAX_REPEAT)]
    RepetitionTooLarge,
    #[error("group nesting exceeds limit of {limit}")]
    NestLimitExceeded { limit: u32 },
}

/// An error that aborted a single search.
///
/// The compiled pattern stays usable after either of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("backtrack limit of {limit} exceeded")]
    BacktrackLimitExceeded { limit: usize },
    #[error("backtracking stack exceeded {limit} entries")]
    StackOverflow { limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display_includes_offset() {
        let err = SyntaxError::new(SyntaxErrorKind::UnterminatedClass, 3);
        assert_eq!(err.to_string(), "unterminated character class at offset 3");
    }

    #[test]
    fn umbrella_is_transparent() {
        let err: Error = RuntimeError::StackOverflow { limit: 8 }.into();
        assert_eq!(err.to_string(), "backtracking stack exceeded 8 entries");
        let kind = SyntaxErrorKind::InvalidRange { lo: 'z', hi: 'a' };
        let err: Error = SyntaxError::new(kind, 1).into();
        assert_eq!(err.to_string(), "invalid class range 'z'-'a' at offset 1");
    }
}
