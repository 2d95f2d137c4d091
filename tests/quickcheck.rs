use ::quickcheck::quickcheck;
use regex_scanner::{DfaMatcher, Matcher, Pattern, Token};

use crate::util::{compile, matcher};

/// Map arbitrary bytes onto a small alphabet, so that patterns match often.
fn text(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().map(|&b| b"ab \n"[usize::from(b % 4)]).collect()
}

fn scan_with_block(regex: &str, input: &[u8], blk: usize) -> Vec<Token> {
    let mut m = DfaMatcher::new(compile(regex, ""), input.to_vec());
    m.buffer(blk);
    m.scan_iter().collect()
}

const REGEXES: &[&str] = &[
    r"[a-z]+|[0-9]+|\s",
    r"a*?b|(ab)+(?=c)",
    r"(?m)^\w+$|\<x|y\>",
    r"(?^#.*)|[^#\n]+|\n",
    r"(?m)^[ \t]+|[ \t]+\i|[ \t]*\j|\S",
    r"x{2,5}?|y{3}",
];

quickcheck! {
    fn scan_covers_input(bytes: Vec<u8>) -> bool {
        let input = text(&bytes);
        let mut m = matcher(r"[ab]+|[ \n]+", &input, "");
        let mut seen = vec![];
        while m.scan() != 0 {
            seen.extend_from_slice(m.text());
        }
        seen == input
    }

    fn split_then_join(bytes: Vec<u8>) -> bool {
        let input = text(&bytes);
        let mut m = matcher(" ", &input, "");
        let segments: Vec<Vec<u8>> = m.split_iter().map(|t| t.text).collect();
        segments.join(&b' ') == input
    }

    fn find_counts_bytes(bytes: Vec<u8>) -> bool {
        let input = text(&bytes);
        let mut m = matcher("b", &input, "");
        m.find_iter().count() == input.iter().filter(|&&b| b == b'b').count()
    }

    fn block_size_is_invisible(bytes: Vec<u8>, blk: u8) -> bool {
        let input = text(&bytes);
        let regex = r"(?m)^a+|b*?a|\w+(?=\n)|\s";
        let expected = scan_with_block(regex, &input, 0);
        expected == scan_with_block(regex, &input, usize::from(blk % 8) + 1)
    }

    fn find_terminates(bytes: Vec<u8>) -> bool {
        let mut m = DfaMatcher::with_options(
            compile(r"\w+|\b", ""),
            bytes.clone(),
            "N",
        )
        .unwrap();
        m.find_iter().count() <= 2 * bytes.len() + 2
    }

    fn compile_is_deterministic(i: u8) -> bool {
        let regex = REGEXES[usize::from(i) % REGEXES.len()];
        compile(regex, "").table() == compile(regex, "").table()
    }

    fn loaded_table_counts(i: u8) -> bool {
        let regex = REGEXES[usize::from(i) % REGEXES.len()];
        let pat = compile(regex, "");
        let loaded = Pattern::from_table(pat.table().unwrap().to_vec()).unwrap();
        loaded.nodes() == pat.nodes() && loaded.edges() == pat.edges()
    }
}
