use anyhow::Result;
use backtrack_grep::{
    compile, destroy, find, is_match, matches, Error, Regex, RegexBuilder, RuntimeError, Span,
    SyntaxErrorKind,
};

#[test]
fn literal_concatenation() -> Result<()> {
    let re = compile("abc")?;
    let m = find(&re, "xxabcxx", 0)?;
    assert_eq!(m.span(), Some(Span::new(2, 5)));
    assert_eq!(m.span().map(|s| s.len()), Some(3));
    assert_eq!(m.group_count(), 0);
    Ok(())
}

#[test]
fn leftmost_alternative_wins() -> Result<()> {
    let re = compile("a|ab")?;
    let m = find(&re, "ab", 0)?;
    assert_eq!(m.span(), Some(Span::new(0, 1)));
    Ok(())
}

#[test]
fn greedy_dot_star() -> Result<()> {
    let re = compile("a.*c")?;
    assert_eq!(find(&re, "axcxc", 0)?.span(), Some(Span::new(0, 5)));
    assert_eq!(find(&re, "axbxcxc", 0)?.span(), Some(Span::new(0, 7)));
    Ok(())
}

#[test]
fn star_matches_empty_subject() -> Result<()> {
    let re = compile("a*")?;
    let m = find(&re, "", 0)?;
    assert!(m.is_match());
    assert_eq!(m.span(), Some(Span::new(0, 0)));
    Ok(())
}

#[test]
fn unset_group() -> Result<()> {
    let re = compile("(a)(b)?")?;
    let m = find(&re, "a", 0)?;
    assert_eq!(m.get("a", 1), Some("a"));
    assert_eq!(m.group(2), None);
    Ok(())
}

#[test]
fn nested_groups_number_outer_first() -> Result<()> {
    let re = compile("((a)b)")?;
    let m = find(&re, "ab", 0)?;
    assert_eq!(m.group(1), Some(Span::new(0, 2)));
    assert_eq!(m.group(2), Some(Span::new(0, 1)));
    Ok(())
}

#[test]
fn compiling_twice_is_deterministic() -> Result<()> {
    let subjects = ["", "abcabc", "xx(ab)yy", "aaaaab", "zzz"];
    for pattern in ["(a|ab)(c|bcd)?", "[a-c]+(b)", "a*?", "x{2,}"] {
        let first = compile(pattern);
        let second = compile(pattern);
        match (first, second) {
            (Ok(first), Ok(second)) => {
                for subject in subjects {
                    assert_eq!(find(&first, subject, 0)?, find(&second, subject, 0)?);
                }
            }
            (first, second) => assert_eq!(first.err(), second.err()),
        }
    }
    Ok(())
}

#[test]
fn malformed_patterns() {
    let kind = |pattern: &str| compile(pattern).map(|_| ()).unwrap_err().kind;
    assert_eq!(kind("(a"), SyntaxErrorKind::UnmatchedOpenParen);
    assert_eq!(kind("a)"), SyntaxErrorKind::UnmatchedCloseParen);
    assert_eq!(kind("[a-"), SyntaxErrorKind::UnterminatedClass);
    assert_eq!(kind("ab\\"), SyntaxErrorKind::DanglingEscape);
    assert_eq!(kind("[b-a]"), SyntaxErrorKind::InvalidRange { lo: 'b', hi: 'a' });
}

#[test]
fn empty_group_policy() -> Result<()> {
    let re = compile("a()b")?;
    let m = find(&re, "ab", 0)?;
    assert_eq!(m.group(1), Some(Span::new(1, 1)));

    let re = compile("a||b")?;
    assert_eq!(find(&re, "xb", 0)?.span(), Some(Span::new(0, 0)));

    let strict = RegexBuilder::new().allow_empty(false).build("a()b");
    assert_eq!(
        strict.map(|_| ()).unwrap_err().kind,
        SyntaxErrorKind::EmptyAlternative
    );
    Ok(())
}

#[test]
fn runtime_error_leaves_pattern_usable() -> Result<()> {
    let re = RegexBuilder::new().backtrack_limit(500).build("(a|a)*b")?;
    let subject = "a".repeat(25);
    assert_eq!(
        re.find(&subject),
        Err(RuntimeError::BacktrackLimitExceeded { limit: 500 })
    );
    assert!(is_match(&re, "aab")?);
    Ok(())
}

#[test]
fn start_offset_skips_earlier_matches() -> Result<()> {
    let re = compile("a(b)")?;
    let m = find(&re, "ab-ab", 1)?;
    assert_eq!(m.start(), Some(3));
    assert_eq!(m.group(1), Some(Span::new(4, 5)));
    assert!(!find(&re, "ab", 3)?.is_match());
    Ok(())
}

#[test]
fn one_shot_helper() {
    assert_eq!(matches("hello world", "wor"), Ok(true));
    assert_eq!(matches("hello", "z|y"), Ok(false));
    assert!(matches!(matches("x", "(x"), Err(Error::Syntax(_))));
}

#[test]
fn shared_between_threads() -> Result<()> {
    let re = compile("[0-9]+")?;
    let subjects = ["abc123", "9", "none", "x42y"];
    let expected = [Some(Span::new(3, 6)), Some(Span::new(0, 1)), None, Some(Span::new(1, 3))];

    let re = &re;
    std::thread::scope(|scope| {
        let handles: Vec<_> = subjects
            .iter()
            .map(|subject| scope.spawn(move || re.find(subject).map(|m| m.span())))
            .collect();
        for (handle, expect) in handles.into_iter().zip(expected) {
            assert_eq!(handle.join().unwrap(), Ok(expect));
        }
    });
    Ok(())
}

#[test]
fn destroy_releases_pattern() -> Result<()> {
    let re: Regex = compile("(x)")?;
    assert!(re.is_match("x")?);
    destroy(re);
    Ok(())
}

#[test]
fn long_pattern_compiles_and_drops() -> Result<()> {
    let pattern = "a".repeat(100_000);
    let re = compile(&pattern)?;
    let m = re.find(&pattern)?;
    assert_eq!(m.span(), Some(Span::new(0, pattern.len())));

    let copy = re.ast().clone();
    assert!(&copy == re.ast());
    assert!(format!("{:?}", copy).starts_with("Ast { root: Concat(Literal('a'), "));
    Ok(())
}
