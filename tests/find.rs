use regex_scanner::{DfaMatcher, Input, Matcher};

use crate::util::{compile, finds};

#[test]
fn words() {
    assert_eq!(vec!["an", "apple", "a", "day"], finds(r"\w+", "an apple a day", ""));
    assert_eq!(vec!["apple"], finds("apple", "an apple a day", ""));
    assert!(finds("pear", "an apple a day", "").is_empty());
}

#[test]
fn literal_prefix() {
    // A near miss, then a prefix that straddles a refill.
    let text = "xxabdxxabcabc".to_string();
    let mut m = DfaMatcher::new(compile("abc", ""), text);
    m.buffer(2);
    let firsts: Vec<usize> = m.find_iter().map(|t| t.first).collect();
    assert_eq!(vec![7, 10], firsts);

    assert_eq!(vec!["ab", "ac"], finds("ab|ac", "xxabyyac", ""));
    assert_eq!(vec!["a1", "a22"], finds("a[0-9]+", "aa1ba22", ""));
}

#[test]
fn empty_matches() {
    // Without N, empty matches are skipped.
    assert!(finds(r"\b", "a a", "").is_empty());

    let mut m = DfaMatcher::with_options(compile(r"\b", ""), "a a", "N").unwrap();
    let firsts: Vec<usize> = m.find_iter().map(|t| t.first).collect();
    assert_eq!(vec![0, 1, 2], firsts);

    assert_eq!(vec!["aa", "a"], finds("a*", "baab a", ""));
}

#[test]
fn nullable_empty_input() {
    let mut m = DfaMatcher::with_options(compile("a*", ""), "", "N").unwrap();
    assert_eq!(1, m.find());
    assert_eq!(0, m.size());
    assert_eq!(0, m.find());

    let mut m = DfaMatcher::new(compile("a*", ""), "");
    assert_eq!(0, m.find());
}

#[test]
fn lines() {
    let input = Input::from("one\ntwo\nthree\n");
    let mut m = DfaMatcher::new(compile("(?m)^t.*$", ""), input);
    let toks: Vec<(usize, Vec<u8>)> = m.find_iter().map(|t| (t.lineno, t.text)).collect();
    assert_eq!(vec![(2, b"two".to_vec()), (3, b"three".to_vec())], toks);
}

#[test]
fn negative_patterns() {
    assert_eq!(vec!["bc"], finds(r"(?^a\w*)|\w+", "abc bc", ""));
}
