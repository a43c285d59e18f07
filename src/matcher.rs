use std::iter;
use std::ops::Range;
use std::rc::Rc;

use log::{debug, trace};

use crate::ast::{Ast, RegexNode};
use crate::error::RuntimeError;

pub const DEFAULT_BACKTRACK_LIMIT: usize = 1_000_000;
pub const DEFAULT_MAX_STACK: usize = 1_000_000;

/// Limits and policies applied while searching.
#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    /// Backtracks allowed per start offset before giving up.
    pub backtrack_limit: usize,
    /// Pending choice points allowed at once. Every repetition that can
    /// stop early leaves one behind, so this also caps how many times a
    /// single `*`, `+` or `{m,}` can iterate.
    pub max_stack: usize,
    pub dot_matches_new_line: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            backtrack_limit: DEFAULT_BACKTRACK_LIMIT,
            max_stack: DEFAULT_MAX_STACK,
            dot_matches_new_line: true,
        }
    }
}

/// A half-open byte range `[start, end)` of the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Outcome of one search.
///
/// Index 0 holds the overall match, indexes `1..=N` hold the capture
/// groups. A group that took no part in the match is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    groups: Vec<Option<Span>>,
}

impl MatchResult {
    fn no_match(group_count: usize) -> Self {
        Self {
            groups: vec![None; group_count + 1],
        }
    }

    pub fn is_match(&self) -> bool {
        self.groups[0].is_some()
    }

    pub fn span(&self) -> Option<Span> {
        self.groups[0]
    }

    pub fn start(&self) -> Option<usize> {
        self.span().map(|span| span.start)
    }

    pub fn end(&self) -> Option<usize> {
        self.span().map(|span| span.end)
    }

    /// Span of group `index`; 0 is the whole match.
    pub fn group(&self, index: usize) -> Option<Span> {
        self.groups.get(index).copied().flatten()
    }

    /// Text of group `index` within `subject`, which must be the string
    /// that was searched.
    pub fn get<'s>(&self, subject: &'s str, index: usize) -> Option<&'s str> {
        self.group(index).and_then(|span| subject.get(span.range()))
    }

    /// Number of explicit capture groups, not counting the whole match.
    pub fn group_count(&self) -> usize {
        self.groups.len() - 1
    }

    /// Spans of the explicit capture groups, in ID order.
    pub fn groups(&self) -> &[Option<Span>] {
        &self.groups[1..]
    }
}

/// What is still left to match, as a persistent stack so choice points can
/// hold on to it cheaply.
type Next<'r> = Option<Rc<Cont<'r>>>;

struct Cont<'r> {
    frame: Frame<'r>,
    next: Next<'r>,
}

#[derive(Clone, Copy)]
enum Frame<'r> {
    Node(&'r RegexNode),
    CloseGroup {
        id: usize,
        start: usize,
    },
    /// Repetition in progress: `count` iterations done, the last one
    /// started at `last`.
    Repeat {
        node: &'r RegexNode,
        min: u32,
        max: Option<u32>,
        count: u32,
        last: usize,
    },
}

fn push<'r>(frame: Frame<'r>, next: Next<'r>) -> Next<'r> {
    Some(Rc::new(Cont { frame, next }))
}

struct Choice<'r> {
    pos: usize,
    next: Next<'r>,
    trail_len: usize,
}

/// Runs a compiled pattern against subjects.
///
/// Holds no per-search state, so one matcher can serve any number of
/// searches, from any number of threads.
pub struct Matcher<'r> {
    ast: &'r Ast,
    config: MatchConfig,
}

impl<'r> Matcher<'r> {
    pub fn new(ast: &'r Ast, config: MatchConfig) -> Self {
        Self { ast, config }
    }

    /// Search `subject` for the leftmost match starting at or after
    /// `start`.
    ///
    /// A `start` past the end yields no match; one inside a multi-byte
    /// character moves forward to the next character boundary.
    pub fn execute(&self, subject: &str, start: usize) -> Result<MatchResult, RuntimeError> {
        if start > subject.len() {
            return Ok(MatchResult::no_match(self.ast.group_count));
        }
        let mut start = start;
        while !subject.is_char_boundary(start) {
            start += 1;
        }

        let mut search = Search::new(subject, self.ast.group_count, self.config);
        let offsets = subject[start..]
            .char_indices()
            .map(|(i, _)| start + i)
            .chain(iter::once(subject.len()));
        for offset in offsets {
            trace!("trying match at offset {}", offset);
            if let Some(end) = search.run(&self.ast.root, offset)? {
                return Ok(search.into_result(offset, end));
            }
        }
        Ok(MatchResult::no_match(self.ast.group_count))
    }

    /// Try to match at exactly `pos`, without moving forward on failure.
    pub fn match_at(&self, subject: &str, pos: usize) -> Result<MatchResult, RuntimeError> {
        if !subject.is_char_boundary(pos) {
            return Ok(MatchResult::no_match(self.ast.group_count));
        }
        let mut search = Search::new(subject, self.ast.group_count, self.config);
        match search.run(&self.ast.root, pos)? {
            Some(end) => Ok(search.into_result(pos, end)),
            None => Ok(MatchResult::no_match(self.ast.group_count)),
        }
    }
}

/// Bookkeeping for one call to `execute` or `match_at`.
struct Search<'r, 's> {
    subject: &'s str,
    config: MatchConfig,
    slots: Vec<Option<Span>>,
    /// Previous values of overwritten slots, unwound on backtrack.
    trail: Vec<(usize, Option<Span>)>,
    stack: Vec<Choice<'r>>,
    backtracks: usize,
}

impl<'r, 's> Search<'r, 's> {
    fn new(subject: &'s str, group_count: usize, config: MatchConfig) -> Self {
        Self {
            subject,
            config,
            slots: vec![None; group_count + 1],
            trail: Vec::new(),
            stack: Vec::new(),
            backtracks: 0,
        }
    }

    fn into_result(mut self, start: usize, end: usize) -> MatchResult {
        self.slots[0] = Some(Span::new(start, end));
        MatchResult { groups: self.slots }
    }

    /// Anchored match of `root` at `start`. Returns the end offset.
    fn run(&mut self, root: &'r RegexNode, start: usize) -> Result<Option<usize>, RuntimeError> {
        self.stack.clear();
        self.trail.clear();
        self.backtracks = 0;
        self.slots.iter_mut().for_each(|slot| *slot = None);

        let mut pos = start;
        let mut next = push(Frame::Node(root), None);
        loop {
            let Some(cont) = next else {
                return Ok(Some(pos));
            };
            let stepped = self.step(cont.frame, pos, cont.next.clone())?;
            let resumed = match stepped {
                Some(state) => Some(state),
                None => self.backtrack()?,
            };
            match resumed {
                Some((p, n)) => {
                    pos = p;
                    next = n;
                }
                None => return Ok(None),
            }
        }
    }

    /// Advance past one frame. `None` means this path failed.
    fn step(
        &mut self,
        frame: Frame<'r>,
        pos: usize,
        rest: Next<'r>,
    ) -> Result<Option<(usize, Next<'r>)>, RuntimeError> {
        let node = match frame {
            Frame::Node(node) => node,
            Frame::CloseGroup { id, start } => {
                self.set_slot(id, Span::new(start, pos));
                return Ok(Some((pos, rest)));
            }
            Frame::Repeat {
                node,
                min,
                max,
                count,
                last,
            } => return self.step_repeat(node, min, max, count, last, pos, rest),
        };

        let state = match node {
            RegexNode::Empty => Some((pos, rest)),
            RegexNode::Literal(c) => self.advance_if(pos, |ch| ch == *c).map(|p| (p, rest)),
            RegexNode::Dot => {
                let dot_nl = self.config.dot_matches_new_line;
                self.advance_if(pos, |ch| dot_nl || ch != '\n').map(|p| (p, rest))
            }
            RegexNode::CharClass(class) => {
                self.advance_if(pos, |ch| class.matches(ch)).map(|p| (p, rest))
            }
            RegexNode::Concat(left, right) => {
                let next = push(Frame::Node(left), push(Frame::Node(right), rest));
                Some((pos, next))
            }
            RegexNode::Alternation(left, right) => {
                self.push_choice(pos, push(Frame::Node(right), rest.clone()))?;
                Some((pos, push(Frame::Node(left), rest)))
            }
            RegexNode::Quantifier { node, min, max } => {
                let repeat = Frame::Repeat {
                    node: node.as_ref(),
                    min: *min,
                    max: *max,
                    count: 0,
                    last: pos,
                };
                Some((pos, push(repeat, rest)))
            }
            RegexNode::Group { id, node } => {
                let close = Frame::CloseGroup { id: *id, start: pos };
                Some((pos, push(Frame::Node(node), push(close, rest))))
            }
        };
        Ok(state)
    }

    /// Greedy repetition: take another iteration if allowed, leaving a
    /// choice point that resumes with the rest of the pattern instead.
    #[allow(clippy::too_many_arguments)]
    fn step_repeat(
        &mut self,
        node: &'r RegexNode,
        min: u32,
        max: Option<u32>,
        count: u32,
        last: usize,
        pos: usize,
        rest: Next<'r>,
    ) -> Result<Option<(usize, Next<'r>)>, RuntimeError> {
        let again = |rest: Next<'r>| {
            let repeat = Frame::Repeat {
                node,
                min,
                max,
                count: count + 1,
                last: pos,
            };
            push(Frame::Node(node), push(repeat, rest))
        };

        if count < min {
            return Ok(Some((pos, again(rest))));
        }
        // An iteration past the minimum that consumed nothing would loop
        // forever.
        if max == Some(count) || (count > 0 && pos == last) {
            return Ok(Some((pos, rest)));
        }
        self.push_choice(pos, rest.clone())?;
        Ok(Some((pos, again(rest))))
    }

    fn advance_if(&self, pos: usize, accept: impl FnOnce(char) -> bool) -> Option<usize> {
        let ch = self.subject[pos..].chars().next()?;
        accept(ch).then(|| pos + ch.len_utf8())
    }

    fn set_slot(&mut self, id: usize, span: Span) {
        // Without a pending choice point nothing can unwind this write.
        if !self.stack.is_empty() {
            self.trail.push((id, self.slots[id]));
        }
        self.slots[id] = Some(span);
    }

    fn push_choice(&mut self, pos: usize, next: Next<'r>) -> Result<(), RuntimeError> {
        if self.stack.len() >= self.config.max_stack {
            debug!("search aborted: more than {} choice points", self.config.max_stack);
            return Err(RuntimeError::StackOverflow {
                limit: self.config.max_stack,
            });
        }
        self.stack.push(Choice {
            pos,
            next,
            trail_len: self.trail.len(),
        });
        Ok(())
    }

    /// Resume from the most recent choice point, restoring the captures it
    /// saw.
    fn backtrack(&mut self) -> Result<Option<(usize, Next<'r>)>, RuntimeError> {
        let Some(choice) = self.stack.pop() else {
            return Ok(None);
        };
        self.backtracks += 1;
        if self.backtracks > self.config.backtrack_limit {
            debug!("search aborted: more than {} backtracks", self.config.backtrack_limit);
            return Err(RuntimeError::BacktrackLimitExceeded {
                limit: self.config.backtrack_limit,
            });
        }
        for (id, old) in self.trail.drain(choice.trail_len..).rev() {
            self.slots[id] = old;
        }
        Ok(Some((choice.pos, choice.next)))
    }
}
