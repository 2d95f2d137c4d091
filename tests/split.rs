use regex_scanner::{DfaMatcher, Matcher, EMPTY};

use crate::util::{compile, splits};

#[test]
fn separators() {
    assert_eq!("ab/c//d/", splits(" ", "ab c  d"));
    assert_eq!("ab/c//d//", splits(" ", "ab c  d "));
    assert_eq!("a/b/", splits(",+", "a,,,b"));
}

#[test]
fn empty_separator() {
    assert_eq!("/a/b/ /c/ / /d//", splits("", "ab c  d"));
    assert_eq!("/", splits("", ""));
}

#[test]
fn separator_at_the_ends() {
    assert_eq!("/-//", splits("[[:alpha:]]", "a-b"));
    assert_eq!("//", splits("[[:alpha:]]", "a"));
    assert_eq!("-/", splits("[[:alpha:]]", "-"));
}

#[test]
fn accepts() {
    let mut m = DfaMatcher::new(compile(",|;", ""), "a,b;c");
    let accepts: Vec<usize> = m.split_iter().map(|t| t.accept).collect();
    assert_eq!(vec![1, 2, EMPTY], accepts);
    // Nothing is left after the final segment.
    assert_eq!(0, m.split());
}
