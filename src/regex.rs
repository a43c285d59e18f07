use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::ast::Ast;
use crate::error::{RuntimeError, SyntaxError};
use crate::matcher::{MatchConfig, MatchResult, Matcher};
use crate::parser::{Parser, ParserConfig};

/// A compiled pattern.
///
/// The tree is never mutated after compilation, so a `Regex` can be shared
/// between threads and searched concurrently.
pub struct Regex {
    pattern: String,
    ast: Ast,
    config: MatchConfig,
}

impl Regex {
    /// Compile `pattern` with the default options, see [`RegexBuilder`].
    pub fn new(pattern: &str) -> Result<Regex, SyntaxError> {
        RegexBuilder::new().build(pattern)
    }

    /// The pattern this regex was compiled from.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Number of capture groups, not counting the implicit group 0.
    pub fn captures_len(&self) -> usize {
        self.ast.group_count
    }

    fn matcher(&self) -> Matcher<'_> {
        Matcher::new(&self.ast, self.config)
    }

    pub fn is_match(&self, subject: &str) -> Result<bool, RuntimeError> {
        Ok(self.find(subject)?.is_match())
    }

    /// Leftmost match in `subject`.
    pub fn find(&self, subject: &str) -> Result<MatchResult, RuntimeError> {
        self.find_at(subject, 0)
    }

    /// Leftmost match in `subject` starting at or after byte offset `start`.
    pub fn find_at(&self, subject: &str, start: usize) -> Result<MatchResult, RuntimeError> {
        self.matcher().execute(subject, start)
    }

    /// Match only at byte offset `pos`.
    pub fn match_at(&self, subject: &str, pos: usize) -> Result<MatchResult, RuntimeError> {
        self.matcher().match_at(subject, pos)
    }

    /// Successive non-overlapping matches in `subject`.
    ///
    /// Iteration stops after the first error.
    pub fn find_iter<'r, 's>(&'r self, subject: &'s str) -> Matches<'r, 's> {
        Matches {
            regex: self,
            subject,
            pos: 0,
            done: false,
        }
    }

    /// Release the compiled pattern.
    pub fn destroy(self) {
        debug!("releasing pattern {:?}", self.pattern);
    }
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Regex").field(&self.pattern).finish()
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl FromStr for Regex {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Regex, SyntaxError> {
        Regex::new(s)
    }
}

/// Iterator returned by [`Regex::find_iter`].
pub struct Matches<'r, 's> {
    regex: &'r Regex,
    subject: &'s str,
    pos: usize,
    done: bool,
}

impl Iterator for Matches<'_, '_> {
    type Item = Result<MatchResult, RuntimeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = match self.regex.find_at(self.subject, self.pos) {
            Ok(result) => result,
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };
        let Some(span) = result.span() else {
            self.done = true;
            return None;
        };

        self.pos = if span.is_empty() {
            // Step over one character so an empty match is not found again.
            match self.subject[span.end..].chars().next() {
                Some(ch) => span.end + ch.len_utf8(),
                None => {
                    self.done = true;
                    span.end
                }
            }
        } else {
            span.end
        };
        Some(Ok(result))
    }
}

/// A builder for a [`Regex`] to allow configuring options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexBuilder {
    parser: ParserConfig,
    matcher: MatchConfig,
}

impl RegexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pattern` with the options set so far.
    pub fn build(&self, pattern: &str) -> Result<Regex, SyntaxError> {
        let ast = Parser::with_config(pattern, self.parser).parse()?;
        debug!(
            "compiled pattern {:?} with {} capture groups",
            pattern, ast.group_count
        );
        Ok(Regex {
            pattern: pattern.to_owned(),
            ast,
            config: self.matcher,
        })
    }

    /// How many times a search may backtrack from one start offset before
    /// it fails with [`RuntimeError::BacktrackLimitExceeded`]. The count
    /// starts over at each offset of the unanchored scan.
    ///
    /// Default is `1_000_000`.
    pub fn backtrack_limit(&mut self, limit: usize) -> &mut Self {
        self.matcher.backtrack_limit = limit;
        self
    }

    /// How many pending backtrack points a search may hold before it fails
    /// with [`RuntimeError::StackOverflow`]. Each iteration of an open-ended
    /// repetition holds one, so this bounds how far `.*` can run.
    ///
    /// Default is `1_000_000`.
    pub fn max_stack(&mut self, limit: usize) -> &mut Self {
        self.matcher.max_stack = limit;
        self
    }

    /// Deepest group nesting the parser accepts. Default is 250.
    pub fn nest_limit(&mut self, limit: u32) -> &mut Self {
        self.parser.nest_limit = limit;
        self
    }

    /// Whether `()` and empty alternatives like `a||b` compile to
    /// zero-width matches (the default) or are rejected.
    pub fn allow_empty(&mut self, yes: bool) -> &mut Self {
        self.parser.allow_empty = yes;
        self
    }

    /// Whether `.` matches `\n`. Default is `true`.
    pub fn dot_matches_new_line(&mut self, yes: bool) -> &mut Self {
        self.matcher.dot_matches_new_line = yes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyntaxErrorKind;
    use crate::matcher::Span;

    fn spans(regex: &Regex, subject: &str) -> Vec<(usize, usize)> {
        regex
            .find_iter(subject)
            .map(|result| {
                let span = result.unwrap().span().unwrap();
                (span.start, span.end)
            })
            .collect()
    }

    #[test]
    fn find_iter_non_overlapping() {
        let regex = Regex::new("a+").unwrap();
        assert_eq!(spans(&regex, "aa-a--aaa"), vec![(0, 2), (3, 4), (6, 9)]);
    }

    #[test]
    fn find_iter_empty_matches() {
        let regex = Regex::new("x*").unwrap();
        assert_eq!(
            spans(&regex, "aéx"),
            vec![(0, 0), (1, 1), (3, 4), (4, 4)]
        );
        assert_eq!(spans(&regex, ""), vec![(0, 0)]);
    }

    #[test]
    fn find_iter_stops_on_error() {
        let regex = RegexBuilder::new().max_stack(2).build("a*").unwrap();
        let results: Vec<_> = regex.find_iter("aaaa").collect();
        assert_eq!(results, vec![Err(RuntimeError::StackOverflow { limit: 2 })]);
    }

    #[test]
    fn builder_options() {
        let strict = RegexBuilder::new().allow_empty(false).build("a||b");
        assert_eq!(
            strict.unwrap_err().kind,
            SyntaxErrorKind::EmptyAlternative
        );

        let regex = RegexBuilder::new()
            .dot_matches_new_line(false)
            .build("a.b")
            .unwrap();
        assert!(!regex.is_match("a\nb").unwrap());
        assert!(regex.is_match("a-b").unwrap());

        let nested = RegexBuilder::new().nest_limit(1).build("((a))");
        assert!(nested.is_err());
    }

    #[test]
    fn accessors() {
        let regex: Regex = "(a)(b(c))".parse().unwrap();
        assert_eq!(regex.as_str(), "(a)(b(c))");
        assert_eq!(regex.to_string(), "(a)(b(c))");
        assert_eq!(regex.captures_len(), 3);
        assert_eq!(format!("{:?}", regex), "Regex(\"(a)(b(c))\")");

        let result = regex.find("xabc").unwrap();
        assert_eq!(result.group(3), Some(Span::new(3, 4)));
        assert_eq!(
            result.groups(),
            &[Some(Span::new(1, 2)), Some(Span::new(2, 4)), Some(Span::new(3, 4))]
        );
        regex.destroy();
    }

    #[test]
    fn match_at_does_not_search() {
        let regex = Regex::new("b+").unwrap();
        assert!(!regex.match_at("abb", 0).unwrap().is_match());
        assert_eq!(regex.match_at("abb", 1).unwrap().span(), Some(Span::new(1, 3)));
    }
}
