use regex_syntax::{
    hir::{
        Class as HirClass, ClassBytes, ClassBytesRange, ClassUnicode,
        ClassUnicodeRange, HirKind,
    },
    utf8::Utf8Sequences,
};

use crate::util::alphabet::ByteSet;

/// A character class under construction.
///
/// In byte mode a class is a set of bytes. In Unicode mode it is a set of
/// scalar values, which is lowered to alternatives of UTF-8 byte sequences
/// once the class is complete.
#[derive(Clone, Debug)]
pub(crate) enum Class {
    Bytes(ClassBytes),
    Unicode(ClassUnicode),
}

const ALNUM: &[(u8, u8)] = &[(b'0', b'9'), (b'A', b'Z'), (b'a', b'z')];
const ALPHA: &[(u8, u8)] = &[(b'A', b'Z'), (b'a', b'z')];
const ASCII: &[(u8, u8)] = &[(0x00, 0x7F)];
const BLANK: &[(u8, u8)] = &[(b'\t', b'\t'), (b' ', b' ')];
const CNTRL: &[(u8, u8)] = &[(0x00, 0x1F), (0x7F, 0x7F)];
const DIGIT: &[(u8, u8)] = &[(b'0', b'9')];
const GRAPH: &[(u8, u8)] = &[(b'!', b'~')];
const LOWER: &[(u8, u8)] = &[(b'a', b'z')];
const PRINT: &[(u8, u8)] = &[(b' ', b'~')];
const PUNCT: &[(u8, u8)] =
    &[(b'!', b'/'), (b':', b'@'), (b'[', b'`'), (b'{', b'~')];
const SPACE: &[(u8, u8)] = &[(b'\t', b'\r'), (b' ', b' ')];
const UPPER: &[(u8, u8)] = &[(b'A', b'Z')];
const WORD: &[(u8, u8)] = &[(b'0', b'9'), (b'A', b'Z'), (b'_', b'_'), (b'a', b'z')];
const XDIGIT: &[(u8, u8)] = &[(b'0', b'9'), (b'A', b'F'), (b'a', b'f')];

/// Look up an ASCII class by its POSIX name. Names are matched without
/// regard to case, so both `[:alpha:]` and `\p{Alpha}` work.
fn posix(name: &str) -> Option<&'static [(u8, u8)]> {
    let ranges = match &*name.to_ascii_lowercase() {
        "alnum" => ALNUM,
        "alpha" => ALPHA,
        "ascii" => ASCII,
        "blank" => BLANK,
        "cntrl" => CNTRL,
        "digit" => DIGIT,
        "graph" => GRAPH,
        "lower" => LOWER,
        "print" => PRINT,
        "punct" => PUNCT,
        "space" => SPACE,
        "upper" => UPPER,
        "word" => WORD,
        "xdigit" => XDIGIT,
        _ => return None,
    };
    Some(ranges)
}

/// Ask regex-syntax for the Unicode class denoted by `regex`, which must be
/// a single class expression such as `\p{Greek}` or `\w`.
fn unicode(regex: &str) -> Option<ClassUnicode> {
    let hir = regex_syntax::ParserBuilder::new()
        .unicode(true)
        .build()
        .parse(regex)
        .ok()?;
    match hir.into_kind() {
        HirKind::Class(HirClass::Unicode(cls)) => Some(cls),
        // A class with a single member is simplified to a literal.
        HirKind::Literal(lit) => {
            let s = core::str::from_utf8(&lit.0).ok()?;
            let mut chars = s.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            Some(ClassUnicode::new(vec![ClassUnicodeRange::new(c, c)]))
        }
        _ => None,
    }
}

impl Class {
    /// An empty class in the given mode.
    pub(crate) fn empty(unicode: bool) -> Class {
        if unicode {
            Class::Unicode(ClassUnicode::empty())
        } else {
            Class::Bytes(ClassBytes::empty())
        }
    }

    /// The class of everything: all bytes, or all scalar values.
    pub(crate) fn any(unicode: bool) -> Class {
        let mut cls = Class::empty(unicode);
        cls.negate();
        cls
    }

    /// A class from inclusive ASCII byte ranges.
    pub(crate) fn ascii(ranges: &[(u8, u8)], unicode: bool) -> Class {
        if unicode {
            Class::Unicode(ClassUnicode::new(ranges.iter().map(|&(s, e)| {
                ClassUnicodeRange::new(char::from(s), char::from(e))
            })))
        } else {
            Class::Bytes(ClassBytes::new(
                ranges.iter().map(|&(s, e)| ClassBytesRange::new(s, e)),
            ))
        }
    }

    /// The class of a single character. In byte mode a non-ASCII character
    /// contributes each byte of its UTF-8 encoding.
    pub(crate) fn char(c: char, unicode: bool) -> Class {
        Class::range(c, c, unicode)
    }

    /// The class of an inclusive range of characters. Byte mode supports
    /// only ranges of single bytes; `None` is returned otherwise.
    pub(crate) fn try_range(start: char, end: char, unicode: bool) -> Option<Class> {
        if unicode {
            return Some(Class::range(start, end, true));
        }
        let (s, e) = (u32::from(start), u32::from(end));
        if s > 0xFF || e > 0xFF {
            return None;
        }
        Some(Class::Bytes(ClassBytes::new(vec![ClassBytesRange::new(
            s as u8, e as u8,
        )])))
    }

    fn range(start: char, end: char, unicode: bool) -> Class {
        if unicode {
            return Class::Unicode(ClassUnicode::new(vec![
                ClassUnicodeRange::new(start, end),
            ]));
        }
        if start == end && !start.is_ascii() {
            let mut buf = [0; 4];
            let bytes = start.encode_utf8(&mut buf).as_bytes();
            return Class::Bytes(ClassBytes::new(
                bytes.iter().map(|&b| ClassBytesRange::new(b, b)),
            ));
        }
        let (s, e) = (u32::from(start).min(0xFF), u32::from(end).min(0xFF));
        Class::Bytes(ClassBytes::new(vec![ClassBytesRange::new(
            s as u8, e as u8,
        )]))
    }

    /// A single raw byte. In Unicode mode, bytes above `0x7F` are taken to
    /// be the scalar value with that number.
    pub(crate) fn byte(b: u8, unicode: bool) -> Class {
        if unicode {
            Class::char(char::from(b), true)
        } else {
            Class::Bytes(ClassBytes::new(vec![ClassBytesRange::new(b, b)]))
        }
    }

    /// Resolve a class name as used by `[:name:]` and `\p{name}`.
    ///
    /// POSIX names are always available. Any other name is looked up in the
    /// Unicode tables, which requires Unicode mode.
    pub(crate) fn named(name: &str, unicode: bool) -> Option<Class> {
        if let Some(ranges) = posix(name) {
            return Some(Class::ascii(ranges, unicode));
        }
        if !unicode || name.is_empty() || name.contains(|c: char| c == '}' || c == '\\') {
            return None;
        }
        unicode_lookup(&format!(r"\p{{{}}}", name))
    }

    /// Resolve a class escape such as `\d` or `\w` (given by its letter, in
    /// lowercase). In Unicode mode digits, spaces, word characters and the
    /// letter cases use their Unicode definitions.
    pub(crate) fn perl(letter: u8, unicode: bool) -> Option<Class> {
        let ascii = match letter {
            b'd' => DIGIT,
            b's' => SPACE,
            b'w' => WORD,
            b'l' => LOWER,
            b'u' => UPPER,
            b'h' => BLANK,
            _ => return None,
        };
        if unicode {
            let regex = match letter {
                b'd' => r"\d",
                b's' => r"\s",
                b'w' => r"\w",
                b'l' => r"\p{Ll}",
                b'u' => r"\p{Lu}",
                _ => return Some(Class::ascii(ascii, true)),
            };
            if let Some(cls) = unicode_lookup(regex) {
                return Some(cls);
            }
        }
        Some(Class::ascii(ascii, unicode))
    }

    pub(crate) fn union(&mut self, other: &Class) {
        match (self, other) {
            (Class::Bytes(a), Class::Bytes(b)) => a.union(b),
            (Class::Unicode(a), Class::Unicode(b)) => a.union(b),
            // Classes are always built in a single mode.
            _ => {}
        }
    }

    pub(crate) fn negate(&mut self) {
        match self {
            Class::Bytes(cls) => cls.negate(),
            Class::Unicode(cls) => cls.negate(),
        }
    }

    /// Apply simple case folding. Without the Unicode case tables, only
    /// ASCII letters are folded in Unicode mode.
    pub(crate) fn case_fold(&mut self) {
        match self {
            Class::Bytes(cls) => cls.case_fold_simple(),
            Class::Unicode(cls) => {
                if cls.try_case_fold_simple().is_err() {
                    let mut extra = ClassUnicode::empty();
                    for r in cls.ranges() {
                        for c in r.start()..=r.end() {
                            if c.is_ascii_alphabetic() {
                                let o = if c.is_ascii_lowercase() {
                                    c.to_ascii_uppercase()
                                } else {
                                    c.to_ascii_lowercase()
                                };
                                extra.push(ClassUnicodeRange::new(o, o));
                            }
                            if c > '\x7F' {
                                break;
                            }
                        }
                    }
                    cls.union(&extra);
                }
            }
        }
    }

    /// Remove `\n` from this class, as required for `.` without `s`.
    pub(crate) fn remove_newline(&mut self, unicode: bool) {
        let mut nl = Class::byte(b'\n', unicode);
        nl.negate();
        match (self, nl) {
            (Class::Bytes(a), Class::Bytes(b)) => a.intersect(&b),
            (Class::Unicode(a), Class::Unicode(b)) => a.intersect(&b),
            _ => {}
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        match self {
            Class::Bytes(cls) => cls.ranges().is_empty(),
            Class::Unicode(cls) => cls.ranges().is_empty(),
        }
    }

    /// Lower this class into alternatives of byte set sequences. In byte
    /// mode there is exactly one alternative of length one. In Unicode mode
    /// every UTF-8 sequence is an alternative, except that all single-byte
    /// sequences are merged into one set.
    pub(crate) fn lower(&self) -> Vec<Vec<ByteSet>> {
        match self {
            Class::Bytes(cls) => {
                let mut set = ByteSet::empty();
                for r in cls.ranges() {
                    set.add_all(r.start(), r.end());
                }
                vec![vec![set]]
            }
            Class::Unicode(cls) => {
                let mut ascii = ByteSet::empty();
                let mut seqs = vec![];
                for r in cls.ranges() {
                    for seq in Utf8Sequences::new(r.start(), r.end()) {
                        let ranges = seq.as_slice();
                        if ranges.len() == 1 {
                            ascii.add_all(ranges[0].start, ranges[0].end);
                            continue;
                        }
                        seqs.push(
                            ranges
                                .iter()
                                .map(|r| ByteSet::range(r.start, r.end))
                                .collect(),
                        );
                    }
                }
                if !ascii.is_empty() {
                    seqs.insert(0, vec![ascii]);
                }
                seqs
            }
        }
    }
}

fn unicode_lookup(regex: &str) -> Option<Class> {
    unicode(regex).map(Class::Unicode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byte_set(cls: &Class) -> ByteSet {
        let mut lowered = cls.lower();
        assert_eq!(1, lowered.len());
        let mut seq = lowered.pop().unwrap();
        assert_eq!(1, seq.len());
        seq.pop().unwrap()
    }

    #[test]
    fn posix_names() {
        let cls = Class::named("alpha", false).unwrap();
        let set = byte_set(&cls);
        assert!(set.contains(b'q'));
        assert!(!set.contains(b'1'));
        assert!(Class::named("XDigit", false).is_some());
        assert!(Class::named("Greek", false).is_none());
        assert!(Class::named("nope", true).is_none());
    }

    #[test]
    fn negate_bytes() {
        let mut cls = Class::perl(b'd', false).unwrap();
        cls.negate();
        let set = byte_set(&cls);
        assert!(set.contains(b'a'));
        assert!(set.contains(0xFF));
        assert!(!set.contains(b'7'));
    }

    #[test]
    fn fold_bytes() {
        let mut cls = Class::char('k', false);
        cls.case_fold();
        let set = byte_set(&cls);
        assert!(set.contains(b'K'));
        assert_eq!(2, set.len());
    }

    #[test]
    fn non_ascii_char_in_byte_mode() {
        let cls = Class::char('é', false);
        let set = byte_set(&cls);
        assert!(set.contains(0xC3));
        assert!(set.contains(0xA9));
        assert_eq!(2, set.len());
    }

    #[test]
    fn unicode_dot() {
        let mut cls = Class::Unicode(ClassUnicode::new(vec![
            ClassUnicodeRange::new('\0', char::MAX),
        ]));
        cls.remove_newline(true);
        let lowered = cls.lower();
        assert!(!lowered[0][0].contains(b'\n'));
        assert!(lowered[0][0].contains(b'a'));
        assert!(lowered.iter().skip(1).all(|seq| seq.len() > 1));
    }

    #[cfg(feature = "unicode")]
    #[test]
    fn unicode_names() {
        let cls = Class::named("Greek", true).unwrap();
        let lowered = cls.lower();
        assert!(lowered.iter().all(|seq| seq.len() >= 2));
        assert!(Class::named("Greek", false).is_none());
    }
}
