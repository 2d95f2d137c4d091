/*!
Matchers run compiled patterns over an input.

The [`Matcher`] trait is the capability interface shared by matchers: it
scans, finds and splits, and reports the matched text and where it is. The
[`DfaMatcher`] implements it for a compiled [`Pattern`](crate::Pattern).

A scan, find or split returns an accept index: `0` for no match, `1..` for the
subpattern that matched, [`EMPTY`] for the final segment of a split and
[`REDO`] for a negative pattern when the `A` option is set.
*/

pub use self::{
    dfa::DfaMatcher,
    fsm::{Fsm, FsmCode},
};

use crate::{
    error::{Error, Result},
    input::Input,
};

mod dfa;
pub(crate) mod fsm;

/// The accept index of the last segment of a split, which is not followed
/// by a separator.
pub const EMPTY: usize = usize::MAX;

/// The accept index of a negative pattern `(?^X)`, returned only when the
/// `A` option is set.
pub const REDO: usize = usize::MAX - 1;

/// Options that change how a matcher treats matches.
///
/// | letter | method |
/// |---|---|
/// | `A` | [`Options::accept_redo`] |
/// | `N` | [`Options::nullable`] |
/// | `T=n` | [`Options::tab_size`] |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Options {
    accept_redo: bool,
    nullable: bool,
    tab_size: usize,
}

impl Default for Options {
    fn default() -> Options {
        Options::new()
    }
}

impl Options {
    pub fn new() -> Options {
        Options { accept_redo: false, nullable: false, tab_size: 8 }
    }

    /// Parse an options string such as `"AN;T=4"`.
    pub fn parse(options: &str) -> Result<Options> {
        let mut opts = Options::new();
        let bytes = options.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let letter = bytes[i];
            i += 1;
            match letter {
                b';' | b',' | b' ' | b'\t' => {}
                b'A' => opts.accept_redo = true,
                b'N' => opts.nullable = true,
                b'T' => {
                    if bytes.get(i) != Some(&b'=') {
                        return Err(Error::option(&options[i - 1..]));
                    }
                    let start = i + 1;
                    let end = bytes[start..]
                        .iter()
                        .position(|b| !b.is_ascii_digit())
                        .map_or(bytes.len(), |n| start + n);
                    match options[start..end].parse::<usize>() {
                        Ok(n) if n > 0 => opts.tab_size = n,
                        _ => return Err(Error::option(&options[i - 1..end])),
                    }
                    i = end;
                }
                _ => {
                    let rest = &options[i - 1..];
                    let opt = rest
                        .chars()
                        .next()
                        .map_or(rest, |c| &rest[..c.len_utf8()]);
                    return Err(Error::option(opt));
                }
            }
        }
        Ok(opts)
    }

    /// Return `REDO` for negative patterns instead of skipping the text they
    /// match (`A`).
    pub fn accept_redo(mut self, yes: bool) -> Options {
        self.accept_redo = yes;
        self
    }

    /// Allow `scan` and `find` to return empty matches (`N`).
    pub fn nullable(mut self, yes: bool) -> Options {
        self.nullable = yes;
        self
    }

    /// Set the tab size used for columns and indentation (`T=n`).
    pub fn tab_size(mut self, n: usize) -> Options {
        self.tab_size = n.max(1);
        self
    }

    pub fn get_accept_redo(&self) -> bool {
        self.accept_redo
    }

    pub fn get_nullable(&self) -> bool {
        self.nullable
    }

    pub fn get_tab_size(&self) -> usize {
        self.tab_size
    }
}

/// A match, copied out of a matcher.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    /// The accept index.
    pub accept: usize,
    /// The matched text, or the segment for splits.
    pub text: Vec<u8>,
    /// The absolute byte offset of the text.
    pub first: usize,
    /// The line number of the start of the text, starting at 1.
    pub lineno: usize,
    /// The column of the start of the text, starting at 0.
    pub columno: usize,
}

/// A matcher: something that scans, finds and splits input with a pattern.
///
/// Matchers keep their position in the input between calls. After a
/// successful call, the accessors describe the text that was matched (or
/// the segment that was split off).
pub trait Matcher {
    /// Apply an options string and clear any match state. The position in
    /// the input is kept.
    fn reset(&mut self, options: &str) -> Result<()>;

    /// Start over on a new input.
    fn input(&mut self, input: Input);

    /// Match a pattern right at the current position. Returns 0 when nothing
    /// matches there, including at the end of the input.
    fn scan(&mut self) -> usize;

    /// Search for the next match, skipping input that does not match.
    fn find(&mut self) -> usize;

    /// Return the text up to the next match of the pattern, which is used as
    /// a separator. The last segment has the accept index [`EMPTY`].
    fn split(&mut self) -> usize;

    /// Match the pattern against all of the remaining input. On success,
    /// [`Matcher::accept`] is the subpattern that matched.
    fn matches(&mut self) -> bool;

    /// The accept index of the last call.
    fn accept(&self) -> usize;

    /// The matched text.
    fn text(&self) -> &[u8];

    /// The length of the matched text.
    fn size(&self) -> usize;

    /// The line number of the start of the match, starting at 1.
    fn lineno(&self) -> usize;

    /// The column of the start of the match, starting at 0.
    fn columno(&self) -> usize;

    /// The absolute byte offset of the start of the match.
    fn first(&self) -> usize;

    /// The absolute byte offset of the end of the match.
    fn last(&self) -> usize;

    /// Returns true when no input follows the match.
    fn at_end(&mut self) -> bool;

    /// Returns true when the end of the input has been read.
    fn hit_end(&self) -> bool;

    /// Returns true when the match starts at the beginning of a line.
    fn at_bol(&self) -> bool;

    /// Put a byte back into the input, right after the match.
    fn unput(&mut self, byte: u8);

    /// Make the next match extend the current one.
    fn more(&mut self);

    /// Shorten the match to its first `n` bytes, giving back the rest.
    fn less(&mut self, n: usize);

    /// Iterate over the tokens returned by repeated calls to `scan`.
    fn scan_iter(&mut self) -> Tokens<'_, Self>
    where
        Self: Sized,
    {
        Tokens::scan(self)
    }

    /// Iterate over the tokens returned by repeated calls to `find`.
    fn find_iter(&mut self) -> Tokens<'_, Self>
    where
        Self: Sized,
    {
        Tokens::find(self)
    }

    /// Iterate over the segments returned by repeated calls to `split`.
    fn split_iter(&mut self) -> Tokens<'_, Self>
    where
        Self: Sized,
    {
        Tokens::split(self)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Method {
    Scan,
    Find,
    Split,
}

/// An iterator over the tokens of a matcher. It stops at the first call
/// that returns 0, and after the final segment of a split.
///
/// The constructors also accept trait objects:
///
/// ```
/// use regex_scanner::{DfaMatcher, Matcher, Tokens};
///
/// # fn example() -> Result<(), regex_scanner::Error> {
/// let mut m = DfaMatcher::new(regex_scanner::Pattern::new(r"\w+")?, "a bc");
/// let dynm: &mut dyn Matcher = &mut m;
/// let words: Vec<Vec<u8>> = Tokens::find(dynm).map(|t| t.text).collect();
/// assert_eq!(vec![b"a".to_vec(), b"bc".to_vec()], words);
/// # Ok(()) }; example().unwrap()
/// ```
#[derive(Debug)]
pub struct Tokens<'m, M: ?Sized> {
    matcher: &'m mut M,
    method: Method,
    done: bool,
}

impl<'m, M: Matcher + ?Sized> Tokens<'m, M> {
    pub fn scan(matcher: &'m mut M) -> Tokens<'m, M> {
        Tokens { matcher, method: Method::Scan, done: false }
    }

    pub fn find(matcher: &'m mut M) -> Tokens<'m, M> {
        Tokens { matcher, method: Method::Find, done: false }
    }

    pub fn split(matcher: &'m mut M) -> Tokens<'m, M> {
        Tokens { matcher, method: Method::Split, done: false }
    }
}

impl<'m, M: Matcher + ?Sized> Iterator for Tokens<'m, M> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        let accept = match self.method {
            Method::Scan => self.matcher.scan(),
            Method::Find => self.matcher.find(),
            Method::Split => self.matcher.split(),
        };
        if accept == 0 {
            self.done = true;
            return None;
        }
        if accept == EMPTY {
            self.done = true;
        }
        Some(Token {
            accept,
            text: self.matcher.text().to_vec(),
            first: self.matcher.first(),
            lineno: self.matcher.lineno(),
            columno: self.matcher.columno(),
        })
    }
}
