use regex_scanner::{DfaMatcher, Matcher};

use crate::util::{compile, finds, matcher, scans};

#[test]
fn longest_match_and_priority() {
    assert_eq!(vec![1, 3, 1], scans(r"[a-z]+|if|\s", "if x"));
    assert_eq!(vec![1, 1], scans("ab{2,3}", "abbabbb"));
    assert_eq!(vec![2, 3], scans(r"[0-9]+\.[0-9]+|[0-9]+|\.", "12.x"));
    assert_eq!(vec![1], scans(r"[0-9]+\.[0-9]+|[0-9]+|\.", "12.5"));
    assert_eq!(Vec::<usize>::new(), scans("a", "b"));
}

#[test]
fn lazy_quantifiers() {
    assert_eq!(vec![1, 1, 1, 1], scans("a*?a", "aaaa"));
    assert_eq!(vec![1, 1, 2], scans("a*?|b", "aab"));
    assert_eq!(vec![1, 1, 1], scans("(a|b)??a", "aaba"));
    assert_eq!(vec![1, 1], scans("a??b?a", "aba"));
    assert_eq!(vec![1], scans("a??b?b", "abb"));
    assert_eq!(vec![1, 1], scans("(a|bb)*?abb", "abbbbabb"));
    assert_eq!(vec![1, 1], scans("a+?a", "aaaa"));
    assert_eq!(vec![1, 2], scans("ab*?|b", "ab"));
    assert_eq!(vec![1, 1, 1, 2], scans("(a|b)*?a|c?", "bbaaac"));
    assert_eq!(vec![1, 2], scans("ABB*?|ab+?|A|a", "ABab"));
}

#[test]
fn lazy_quantifiers_across_alternatives() {
    // An accept of one subpattern does not stop a lazy loop in another.
    assert_eq!(vec!["axxb"], finds("a|a.*?b", "axxb", ""));

    let mut m = matcher(r#"".*?"|"|[a-z]"#, br#""ab"c""x""#, "");
    let toks: Vec<(usize, Vec<u8>)> = m.scan_iter().map(|t| (t.accept, t.text)).collect();
    assert_eq!(
        vec![
            (1, br#""ab""#.to_vec()),
            (3, b"c".to_vec()),
            (1, br#""""#.to_vec()),
            (3, b"x".to_vec()),
            (2, br#"""#.to_vec()),
        ],
        toks,
    );
}

#[test]
fn leftmost_longest() {
    let mut m = matcher("ab|xy", b"abxy", "");
    let spans: Vec<(usize, usize, usize)> = m
        .scan_iter()
        .map(|t| (t.accept, t.first, t.first + t.text.len()))
        .collect();
    assert_eq!(vec![(1, 0, 2), (2, 2, 4)], spans);

    let mut m = matcher("a?z", b"azz", "");
    let texts: Vec<Vec<u8>> = m.scan_iter().map(|t| t.text).collect();
    assert_eq!(vec![b"az".to_vec(), b"z".to_vec()], texts);

    // A greedy loop followed by the same byte still takes all of the input.
    let mut m = matcher("a*a", b"aaaa", "");
    assert_eq!(1, m.scan());
    assert_eq!(b"aaaa", m.text());
    assert_eq!(4, m.size());
    assert_eq!(0, m.scan());
}

#[test]
fn lookaheads() {
    let mut m = matcher("a(?=bc)|ab(?=d)|bc|d", b"abcdabd", "");
    let toks: Vec<(usize, Vec<u8>)> = m.scan_iter().map(|t| (t.accept, t.text)).collect();
    assert_eq!(
        vec![
            (1, b"a".to_vec()),
            (3, b"bc".to_vec()),
            (4, b"d".to_vec()),
            (2, b"ab".to_vec()),
            (4, b"d".to_vec()),
        ],
        toks,
    );
    assert_eq!(vec![1, 2, 1], scans("ab|a(?=[ab])", "abaab"));

    // When the lookahead can start inside the loop before it, the match
    // ends where the lookahead last started.
    let mut m = matcher("a*(?=ab)|a|b", b"aaab", "");
    let toks: Vec<(usize, Vec<u8>)> = m.scan_iter().map(|t| (t.accept, t.text)).collect();
    assert_eq!(vec![(1, b"aaa".to_vec()), (3, b"b".to_vec())], toks);
}

#[test]
fn anchors() {
    assert_eq!(vec![1, 5, 2, 4, 3], scans(r"\<a\>|\<a|a\>|a|-", "a-aaa"));
    assert_eq!(vec![1, 2, 1], scans("(?m)^a$|\n", "a\na"));
}

#[test]
fn negative_patterns() {
    assert_eq!(
        vec![2, 3, 3, 2, 3, 2],
        scans(r"(?^ab)|\w+| ", "aa ab abab ababba"),
    );
}

#[test]
fn indentation() {
    let regex = r"(?m)^[ \t]+|[ \t]+\i|[ \t]*\j|a|[ \n]";
    assert_eq!(
        vec![4, 5, 2, 4, 5, 1, 4, 5, 2, 4, 5, 3, 3],
        scans(regex, "a\n  a\n  a\n    a\n"),
    );

    let mut m = DfaMatcher::new(compile(regex, ""), "a\n  a\n");
    let mut deepest = 0;
    while m.scan() != 0 {
        deepest = deepest.max(m.stops().len());
    }
    assert_eq!(1, deepest);
    assert!(m.stops().is_empty());
}

#[test]
fn positions() {
    let mut m = matcher(r"\w+|\s+", b"one two\n  three", "");
    let toks: Vec<(usize, usize, usize)> =
        m.scan_iter().map(|t| (t.first, t.lineno, t.columno)).collect();
    assert_eq!(
        vec![(0, 1, 0), (3, 1, 3), (4, 1, 4), (7, 1, 7), (10, 2, 2)],
        toks,
    );
}

#[test]
fn custom_escape() {
    let pat = compile("%(%x41%xFF%)", "e=%");
    let mut m = DfaMatcher::new(pat, &b"(A\xFF)"[..]);
    assert_eq!(1, m.scan());
    assert_eq!(&b"(A\xFF)"[..], m.text());
}

#[test]
fn case_insensitive() {
    let pat = compile("select|[a-z]+", "i");
    let mut m = DfaMatcher::new(pat, "SeLeCT");
    assert_eq!(1, m.scan());
    assert_eq!(6, m.size());
}

#[test]
fn long_tokens() {
    let text = "x".repeat(20_000) + " y";
    let mut m = DfaMatcher::new(compile(r"\w+|\s", ""), text);
    m.buffer(7);
    let sizes: Vec<usize> = m.scan_iter().map(|t| t.text.len()).collect();
    assert_eq!(vec![20_000, 1, 1], sizes);
}

#[test]
fn unicode() {
    let mut m = DfaMatcher::new(compile(r"\p{Greek}+|\s", "u"), "αβγ δ");
    let toks: Vec<(usize, String)> = m
        .scan_iter()
        .map(|t| (t.accept, String::from_utf8(t.text).unwrap()))
        .collect();
    assert_eq!(
        vec![(1, "αβγ".to_string()), (2, " ".to_string()), (1, "δ".to_string())],
        toks,
    );

    let mut m = DfaMatcher::new(compile(".", "u"), "é");
    assert_eq!(1, m.scan());
    assert_eq!(2, m.size());
    let mut m = DfaMatcher::new(compile(".", ""), "é");
    assert_eq!(1, m.scan());
    assert_eq!(1, m.size());
}
