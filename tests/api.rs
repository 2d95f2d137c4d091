use std::{error::Error, io, sync::Arc};

use regex_scanner::{
    DfaMatcher, ErrorKind, Fsm, Input, Matcher, Pattern, Source, Tokens,
};

use crate::util::compile;

// [0-9]+, assembled by hand.
static DIGITS: [u32; 5] = [
    0x3039_0002, 0x00FF_FFFF,
    0xFF00_0001, 0x3039_0002, 0x00FF_FFFF,
];

// [0-9]+, written the way generated FSM code drives a matcher.
fn digits(m: &mut dyn Fsm) {
    while let Some(b'0'..=b'9') = m.next_byte() {
        m.take(1);
    }
}

fn count(m: &mut dyn Matcher) -> usize {
    let mut n = 0;
    while m.scan() != 0 {
        n += 1;
    }
    n
}

#[test]
fn static_table() {
    let pat = Pattern::from_table(&DIGITS[..]).unwrap();
    assert_eq!(1, pat.size());
    assert_eq!(2, pat.nodes());
    assert_eq!(2, pat.edges());
    let mut m = DfaMatcher::new(pat, "123a");
    assert_eq!(1, m.scan());
    assert_eq!(b"123", m.text());
    assert_eq!(0, m.scan());
}

#[test]
fn fsm_code() {
    let pat = Pattern::from_fsm(digits);
    assert!(pat.table().is_none());
    assert!(pat.write_table(io::sink()).is_err());
    let mut m = DfaMatcher::new(pat, "42x7");
    assert_eq!(1, m.find());
    assert_eq!(b"42", m.text());
    assert_eq!(1, m.find());
    assert_eq!(b"7", m.text());
    assert_eq!(0, m.find());
}

#[test]
fn trait_objects() {
    let mut m = DfaMatcher::new(compile(r"\w+|\s", ""), "a b c");
    assert_eq!(5, count(&mut m));

    let mut m = DfaMatcher::new(compile(r"\w+", ""), "a b c");
    let dynm: &mut dyn Matcher = &mut m;
    let firsts: Vec<usize> = Tokens::find(dynm).map(|t| t.first).collect();
    assert_eq!(vec![0, 2, 4], firsts);

    let mut boxed: Box<dyn Matcher> =
        Box::new(DfaMatcher::new(compile("[0-9]+", ""), "12"));
    assert!(boxed.matches());
    assert_eq!(1, boxed.accept());
    assert_eq!(b"12", boxed.text());
}

struct OneByte {
    bytes: Vec<u8>,
    pos: usize,
}

impl Source for OneByte {
    fn fill(&mut self, buf: &mut [u8]) -> usize {
        match self.bytes.get(self.pos) {
            Some(&b) => {
                buf[0] = b;
                self.pos += 1;
                1
            }
            None => 0,
        }
    }
}

#[test]
fn inputs() {
    let pat = Arc::new(compile(r"[a-z]+|\n", ""));
    let source = OneByte { bytes: b"ab\ncd".to_vec(), pos: 0 };
    let mut m = DfaMatcher::new(Arc::clone(&pat), Input::from_source(source));
    let lines: Vec<usize> = m.scan_iter().map(|t| t.lineno).collect();
    assert_eq!(vec![1, 1, 2], lines);

    let rdr = io::Cursor::new(b"xyz\n".to_vec());
    m.input(Input::from_reader(rdr));
    assert_eq!(2, m.scan_iter().count());
    assert!(m.hit_end());
    assert!(m.at_end());
}

#[test]
fn unput() {
    let mut m = DfaMatcher::new(compile("[a-z]", ""), "ab");
    assert_eq!(1, m.scan());
    m.unput(b'z');
    let texts: Vec<Vec<u8>> = m.scan_iter().map(|t| t.text).collect();
    assert_eq!(vec![b"z".to_vec(), b"b".to_vec()], texts);
}

#[test]
fn reset_options() {
    let mut m = DfaMatcher::new(compile("a*", ""), "baab");
    let err = m.reset("x").unwrap_err();
    assert_eq!(&ErrorKind::InvalidOption("x".to_string()), err.kind());

    assert_eq!(1, m.find());
    assert_eq!(b"aa", m.text());
    m.reset("N").unwrap();
    m.reset("N").unwrap();
    assert!(m.options().get_nullable());
    // The position is kept.
    assert_eq!(1, m.find());
    assert_eq!(3, m.first());
    assert_eq!(0, m.size());
}

#[test]
fn reset_then_same_input() -> Result<(), Box<dyn Error>> {
    let text = "abc 12\nx";
    let mut m = DfaMatcher::new(Pattern::new(r"[a-z]+|[0-9]+|\s")?, text);
    let first: Vec<_> = m.scan_iter().collect();
    assert_eq!(5, first.len());
    for _ in 0..2 {
        m.reset("")?;
        m.input(Input::from(text));
        let again: Vec<_> = m.scan_iter().collect();
        assert_eq!(first, again);
    }
    let last = &first[4];
    assert_eq!(b"x", &last.text[..]);
    assert_eq!((7, 2, 0), (last.first, last.lineno, last.columno));
    Ok(())
}
