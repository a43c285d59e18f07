use std::fmt;
use std::mem;

/// Largest bound accepted inside `{m,n}`.
pub const MAX_REPEAT: u32 = 1000;

/// A compiled pattern: the tree plus the number of capture groups in it.
///
/// `group_count` always covers every group ID in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    pub(crate) root: RegexNode,
    pub(crate) group_count: usize,
}

impl Ast {
    /// Wrap a hand-built tree. The group count is the largest group ID
    /// found in it, so unused IDs below it are reported as unset.
    pub fn new(root: RegexNode) -> Self {
        let mut group_count = 0;
        let mut stack = vec![&root];
        while let Some(node) = stack.pop() {
            if let RegexNode::Group { id, .. } = node {
                group_count = group_count.max(*id);
            }
            stack.extend(node.children());
        }
        Self { root, group_count }
    }

    pub fn root(&self) -> &RegexNode {
        &self.root
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }
}

/// A node of the pattern tree.
///
/// Every parent owns its children. Chains of `Concat` and `Alternation`
/// nest to the right: `abc` is `Concat(a, Concat(b, c))`, so a long
/// pattern gives a deep tree. Cloning, comparing, formatting and dropping
/// all walk it with an explicit stack.
pub enum RegexNode {
    /// Matches the empty string, e.g. the pattern `""` or the body of `()`.
    Empty,
    Literal(char),
    Dot,
    Alternation(Box<RegexNode>, Box<RegexNode>),
    Concat(Box<RegexNode>, Box<RegexNode>),
    /// `max` of `None` means unbounded.
    Quantifier {
        node: Box<RegexNode>,
        min: u32,
        max: Option<u32>,
    },
    CharClass(CharClass),
    Group {
        id: usize,
        node: Box<RegexNode>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    pub negated: bool,
    pub members: Vec<ClassMember>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassMember {
    Char(char),
    /// Inclusive on both ends.
    Range(char, char),
}

impl CharClass {
    pub fn matches(&self, ch: char) -> bool {
        let found = self.members.iter().any(|member| match *member {
            ClassMember::Char(c) => c == ch,
            ClassMember::Range(lo, hi) => lo <= ch && ch <= hi,
        });
        found != self.negated
    }
}

impl RegexNode {
    /// Fold `nodes` into a right-nested `Concat` chain.
    ///
    /// An empty list yields `Empty`, a single node is returned as is.
    pub fn concat(nodes: Vec<RegexNode>) -> RegexNode {
        Self::fold_right(nodes, RegexNode::Concat)
    }

    /// Fold `branches` into a right-nested `Alternation` chain, keeping
    /// their order.
    pub fn alternation(branches: Vec<RegexNode>) -> RegexNode {
        Self::fold_right(branches, RegexNode::Alternation)
    }

    fn fold_right(
        nodes: Vec<RegexNode>,
        join: fn(Box<RegexNode>, Box<RegexNode>) -> RegexNode,
    ) -> RegexNode {
        let mut iter = nodes.into_iter().rev();
        let Some(last) = iter.next() else {
            return RegexNode::Empty;
        };
        iter.fold(last, |acc, node| join(Box::new(node), Box::new(acc)))
    }

    pub fn repeat(node: RegexNode, min: u32, max: Option<u32>) -> RegexNode {
        RegexNode::Quantifier {
            node: Box::new(node),
            min,
            max,
        }
    }

    /// Direct children, left to right.
    pub fn children(&self) -> impl Iterator<Item = &RegexNode> {
        let (first, second) = match self {
            RegexNode::Empty
            | RegexNode::Literal(_)
            | RegexNode::Dot
            | RegexNode::CharClass(_) => (None, None),
            RegexNode::Alternation(left, right) | RegexNode::Concat(left, right) => {
                (Some(&**left), Some(&**right))
            }
            RegexNode::Quantifier { node, .. } | RegexNode::Group { node, .. } => {
                (Some(&**node), None)
            }
        };
        first.into_iter().chain(second)
    }

    /// Copy of this node with its children replaced by `Empty`.
    fn shallow_clone(&self) -> RegexNode {
        match self {
            RegexNode::Empty => RegexNode::Empty,
            RegexNode::Literal(c) => RegexNode::Literal(*c),
            RegexNode::Dot => RegexNode::Dot,
            RegexNode::CharClass(class) => RegexNode::CharClass(class.clone()),
            RegexNode::Alternation(..) => {
                RegexNode::Alternation(Box::new(RegexNode::Empty), Box::new(RegexNode::Empty))
            }
            RegexNode::Concat(..) => {
                RegexNode::Concat(Box::new(RegexNode::Empty), Box::new(RegexNode::Empty))
            }
            RegexNode::Quantifier { min, max, .. } => {
                RegexNode::repeat(RegexNode::Empty, *min, *max)
            }
            RegexNode::Group { id, .. } => RegexNode::Group {
                id: *id,
                node: Box::new(RegexNode::Empty),
            },
        }
    }

    /// Whether the two nodes agree on everything but their children.
    fn shallow_eq(&self, other: &RegexNode) -> bool {
        match (self, other) {
            (RegexNode::Empty, RegexNode::Empty)
            | (RegexNode::Dot, RegexNode::Dot)
            | (RegexNode::Alternation(..), RegexNode::Alternation(..))
            | (RegexNode::Concat(..), RegexNode::Concat(..)) => true,
            (RegexNode::Literal(a), RegexNode::Literal(b)) => a == b,
            (RegexNode::CharClass(a), RegexNode::CharClass(b)) => a == b,
            (
                RegexNode::Quantifier { min, max, .. },
                RegexNode::Quantifier {
                    min: other_min,
                    max: other_max,
                    ..
                },
            ) => min == other_min && max == other_max,
            (RegexNode::Group { id, .. }, RegexNode::Group { id: other_id, .. }) => id == other_id,
            _ => false,
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(
            self,
            RegexNode::Empty | RegexNode::Literal(_) | RegexNode::Dot | RegexNode::CharClass(_)
        )
    }

    /// True when dropping this node would recurse more than one level.
    fn has_grandchildren(&self) -> bool {
        match self {
            RegexNode::Empty
            | RegexNode::Literal(_)
            | RegexNode::Dot
            | RegexNode::CharClass(_) => false,
            RegexNode::Alternation(left, right) | RegexNode::Concat(left, right) => {
                !left.is_leaf() || !right.is_leaf()
            }
            RegexNode::Quantifier { node, .. } | RegexNode::Group { node, .. } => !node.is_leaf(),
        }
    }
}

impl Clone for RegexNode {
    fn clone(&self) -> Self {
        enum Work<'a> {
            Visit(&'a RegexNode),
            Build(&'a RegexNode),
        }

        let mut work = vec![Work::Visit(self)];
        let mut built: Vec<RegexNode> = Vec::new();
        while let Some(item) = work.pop() {
            match item {
                Work::Visit(node) if node.is_leaf() => built.push(node.shallow_clone()),
                Work::Visit(node) => {
                    work.push(Work::Build(node));
                    // Reversed so the left child is built first.
                    let children: Vec<_> = node.children().collect();
                    work.extend(children.into_iter().rev().map(Work::Visit));
                }
                Work::Build(node) => {
                    let mut copy = node.shallow_clone();
                    match copy {
                        RegexNode::Alternation(ref mut left, ref mut right)
                        | RegexNode::Concat(ref mut left, ref mut right) => {
                            **right = built.pop().unwrap_or(RegexNode::Empty);
                            **left = built.pop().unwrap_or(RegexNode::Empty);
                        }
                        RegexNode::Quantifier { ref mut node, .. }
                        | RegexNode::Group { ref mut node, .. } => {
                            **node = built.pop().unwrap_or(RegexNode::Empty);
                        }
                        _ => {}
                    }
                    built.push(copy);
                }
            }
        }
        built.pop().unwrap_or(RegexNode::Empty)
    }
}

impl PartialEq for RegexNode {
    fn eq(&self, other: &RegexNode) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if !a.shallow_eq(b) {
                return false;
            }
            stack.extend(a.children().zip(b.children()));
        }
        true
    }
}

impl Eq for RegexNode {}

impl fmt::Debug for RegexNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        enum Piece<'a> {
            Open(&'a RegexNode),
            Close(&'a RegexNode),
            Comma,
        }

        let mut stack = vec![Piece::Open(self)];
        while let Some(piece) = stack.pop() {
            match piece {
                Piece::Comma => f.write_str(", ")?,
                Piece::Close(RegexNode::Quantifier { min, max, .. }) => {
                    write!(f, ", min: {}, max: {:?})", min, max)?
                }
                Piece::Close(_) => f.write_str(")")?,
                Piece::Open(node) => {
                    match node {
                        RegexNode::Empty => f.write_str("Empty")?,
                        RegexNode::Literal(c) => write!(f, "Literal({:?})", c)?,
                        RegexNode::Dot => f.write_str("Dot")?,
                        RegexNode::CharClass(class) => write!(f, "{:?}", class)?,
                        RegexNode::Alternation(..) => f.write_str("Alternation(")?,
                        RegexNode::Concat(..) => f.write_str("Concat(")?,
                        RegexNode::Quantifier { .. } => f.write_str("Quantifier(")?,
                        RegexNode::Group { id, .. } => write!(f, "Group({}, ", id)?,
                    }
                    if node.is_leaf() {
                        continue;
                    }
                    stack.push(Piece::Close(node));
                    let children: Vec<_> = node.children().collect();
                    for (i, child) in children.into_iter().enumerate().rev() {
                        stack.push(Piece::Open(child));
                        if i > 0 {
                            stack.push(Piece::Comma);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

// Long concatenations build trees as deep as the pattern is long, so
// teardown walks the tree with an explicit stack instead of recursing.
impl Drop for RegexNode {
    fn drop(&mut self) {
        if !self.has_grandchildren() {
            return;
        }

        let mut stack = vec![mem::replace(self, RegexNode::Empty)];
        while let Some(mut node) = stack.pop() {
            match node {
                RegexNode::Empty
                | RegexNode::Literal(_)
                | RegexNode::Dot
                | RegexNode::CharClass(_) => {}
                RegexNode::Alternation(ref mut left, ref mut right)
                | RegexNode::Concat(ref mut left, ref mut right) => {
                    stack.push(mem::replace(&mut **left, RegexNode::Empty));
                    stack.push(mem::replace(&mut **right, RegexNode::Empty));
                }
                RegexNode::Quantifier { ref mut node, .. }
                | RegexNode::Group { ref mut node, .. } => {
                    stack.push(mem::replace(&mut **node, RegexNode::Empty));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(c: char) -> RegexNode {
        RegexNode::Literal(c)
    }

    #[test]
    fn concat_nests_right() {
        let node = RegexNode::concat(vec![lit('a'), lit('b'), lit('c')]);
        let expect = RegexNode::Concat(
            Box::new(lit('a')),
            Box::new(RegexNode::Concat(Box::new(lit('b')), Box::new(lit('c')))),
        );
        assert_eq!(node, expect);
    }

    #[test]
    fn fold_of_one_and_none() {
        assert_eq!(RegexNode::alternation(vec![lit('x')]), lit('x'));
        assert_eq!(RegexNode::concat(vec![]), RegexNode::Empty);
    }

    #[test]
    fn class_membership() {
        let class = CharClass {
            negated: false,
            members: vec![ClassMember::Range('a', 'f'), ClassMember::Char('_')],
        };
        assert!(class.matches('c'));
        assert!(class.matches('_'));
        assert!(!class.matches('g'));

        let negated = CharClass {
            negated: true,
            ..class
        };
        assert!(!negated.matches('a'));
        assert!(negated.matches('z'));
    }

    #[test]
    fn dropping_a_deep_tree_does_not_overflow() {
        let mut node = lit('x');
        for _ in 0..200_000 {
            node = RegexNode::Concat(Box::new(lit('a')), Box::new(node));
        }
        drop(node);

        let mut node = lit('x');
        for _ in 0..200_000 {
            node = RegexNode::Group {
                id: 1,
                node: Box::new(node),
            };
        }
        drop(node);
    }

    fn deep_concat(depth: usize) -> RegexNode {
        let mut node = lit('x');
        for _ in 0..depth {
            node = RegexNode::Concat(Box::new(lit('a')), Box::new(node));
        }
        node
    }

    #[test]
    fn clone_compare_and_format_a_deep_tree() {
        let node = deep_concat(200_000);
        let copy = node.clone();
        assert!(copy == node);
        assert!(copy != deep_concat(199_999));

        let text = format!("{:?}", copy);
        assert!(text.starts_with("Concat(Literal('a'), Concat("));
        assert!(text.ends_with("Literal('x')))"));

        let ast = Ast::new(copy);
        assert_eq!(ast.clone().root(), &node);
    }

    #[test]
    fn debug_format() {
        let node = RegexNode::Group {
            id: 2,
            node: Box::new(RegexNode::Alternation(
                Box::new(RegexNode::repeat(lit('a'), 1, None)),
                Box::new(RegexNode::Dot),
            )),
        };
        assert_eq!(
            format!("{:?}", node),
            "Group(2, Alternation(Quantifier(Literal('a'), min: 1, max: None), Dot))"
        );
    }

    #[test]
    fn ast_new_counts_groups() {
        let root = RegexNode::concat(vec![
            RegexNode::Group {
                id: 4,
                node: Box::new(lit('a')),
            },
            RegexNode::Group {
                id: 1,
                node: Box::new(lit('b')),
            },
        ]);
        assert_eq!(Ast::new(root).group_count(), 4);
        assert_eq!(Ast::new(lit('a')).group_count(), 0);
    }
}
