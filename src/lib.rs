//! A small backtracking regular expression engine.
//!
//! Patterns are scanned by the [`lexer`], turned into a tree by the
//! [`parser`] and run by the [`matcher`]. Supported syntax: literals, `.`,
//! `|`, `*`, `+`, `?`, `{m,n}`, bracket classes and capturing groups.
//!
//! ```
//! let re = backtrack_grep::compile("(a)(b)?").unwrap();
//! let m = backtrack_grep::find(&re, "xa", 0).unwrap();
//! assert_eq!(m.get("xa", 1), Some("a"));
//! assert_eq!(m.group(2), None);
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod matcher;
pub mod parser;
mod regex;

pub use error::{Error, RuntimeError, SyntaxError, SyntaxErrorKind};
pub use matcher::{MatchResult, Span};
pub use regex::{Matches, Regex, RegexBuilder};

/// Compile `pattern` with default options.
pub fn compile(pattern: &str) -> Result<Regex, SyntaxError> {
    Regex::new(pattern)
}

pub fn is_match(pattern: &Regex, subject: &str) -> Result<bool, RuntimeError> {
    pattern.is_match(subject)
}

/// Leftmost match in `subject` at or after byte offset `start`.
pub fn find(pattern: &Regex, subject: &str, start: usize) -> Result<MatchResult, RuntimeError> {
    pattern.find_at(subject, start)
}

pub fn destroy(pattern: Regex) {
    pattern.destroy()
}

/// Compile `pattern` and test it against `input` in one go.
pub fn matches(input: &str, pattern: &str) -> Result<bool, Error> {
    let regex = compile(pattern)?;
    Ok(regex.is_match(input)?)
}
