use std::{mem, sync::Arc};

use memchr::{memchr, memmem};

use crate::{
    buffer::{Buffer, Got},
    error::Result,
    input::Input,
    matcher::{
        fsm::{self, Fsm},
        Matcher, Options, EMPTY, REDO,
    },
    pattern::{Pattern, Program},
    util::look::Look,
};

/// The kind of call a match is made for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Method {
    Scan,
    Find,
    Split,
    Match,
}

/// Where the match loop continues.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Step {
    /// Start a new match at the end of the last one.
    Scan,
    /// Run the program at the current offset, which may have moved on.
    Find,
    /// Run the program again, e.g. to force a pending dedent.
    Redo,
}

/// A matcher that runs a compiled pattern over a buffered input.
///
/// # Example
///
/// ```
/// use regex_scanner::{DfaMatcher, Matcher, Pattern};
///
/// # fn example() -> Result<(), regex_scanner::Error> {
/// let pat = Pattern::new(r"[a-z]+|[0-9]+|\s+")?;
/// let mut m = DfaMatcher::new(pat, "abc 123");
/// let accepts: Vec<usize> = m.scan_iter().map(|t| t.accept).collect();
/// assert_eq!(vec![1, 3, 2], accepts);
/// # Ok(()) }; example().unwrap()
/// ```
#[derive(Debug)]
pub struct DfaMatcher {
    pattern: Arc<Pattern>,
    options: Options,
    buffer: Buffer,
    /// The accept index of the last match.
    cap: usize,
    /// The length of the last match.
    len: usize,
    /// Where each lookahead started, relative to the start of the match.
    lap: Vec<Option<usize>>,
    /// Whether the match started at the beginning of a line.
    bol: bool,
    /// Whether an empty match is acceptable.
    nul: bool,
    /// Set by a forced dedent, which ends the run.
    forced: bool,
    /// Whether indentation was measured in this match.
    mark: bool,
    /// The measured indentation column.
    col: usize,
    /// The indent stops, ascending.
    stops: Vec<usize>,
    /// The number of pending dedents.
    ded: usize,
    /// Saved indent stops.
    stack: Vec<Vec<usize>>,
}

impl DfaMatcher {
    /// Create a matcher for a pattern over an input.
    pub fn new<P, I>(pattern: P, input: I) -> DfaMatcher
    where
        P: Into<Arc<Pattern>>,
        I: Into<Input>,
    {
        DfaMatcher {
            pattern: pattern.into(),
            options: Options::new(),
            buffer: Buffer::new(input.into()),
            cap: 0,
            len: 0,
            lap: vec![],
            bol: false,
            nul: false,
            forced: false,
            mark: false,
            col: 0,
            stops: vec![],
            ded: 0,
            stack: vec![],
        }
    }

    /// Create a matcher with an options string, see [`Options`].
    pub fn with_options<P, I>(
        pattern: P,
        input: I,
        options: &str,
    ) -> Result<DfaMatcher>
    where
        P: Into<Arc<Pattern>>,
        I: Into<Input>,
    {
        let mut m = DfaMatcher::new(pattern, input);
        m.reset(options)?;
        Ok(m)
    }

    /// Set the options of this matcher.
    pub fn set_options(&mut self, options: Options) {
        self.options = options;
        self.buffer.set_tab(options.get_tab_size());
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// The pattern this matcher runs.
    pub fn pattern(&self) -> &Arc<Pattern> {
        &self.pattern
    }

    /// Replace the pattern, keeping the input and the position in it.
    pub fn set_pattern<P: Into<Arc<Pattern>>>(&mut self, pattern: P) {
        self.pattern = pattern.into();
    }

    /// Set the number of bytes read from the input at a time. A size of 0
    /// reads as much as fits, and 1 suits interactive input.
    pub fn buffer(&mut self, blk: usize) {
        self.buffer.set_block(blk);
    }

    /// Force or clear the beginning-of-line state for the next match.
    pub fn set_bol(&mut self, yes: bool) {
        self.buffer.got = if yes { Got::Byte(b'\n') } else { Got::Unk };
    }

    /// Read a single byte as the matched text. Returns `None` at the end of
    /// the input.
    pub fn read_byte(&mut self) -> Option<u8> {
        self.begin_text();
        let b = self.buffer.get()?;
        self.len = 1;
        let pos = self.buffer.pos;
        self.buffer.set_current(pos);
        Some(b)
    }

    /// Read all of the remaining input as the matched text.
    pub fn rest(&mut self) -> &[u8] {
        self.begin_text();
        self.buffer.fill_all();
        let end = self.buffer.end;
        self.len = end - self.buffer.txt;
        self.buffer.set_current(end);
        self.text()
    }

    /// Skip the input up to and including the next `byte`, which becomes the
    /// matched text. Returns false when the input ends first.
    pub fn skip(&mut self, byte: u8) -> bool {
        self.begin_text();
        let found = self.buffer.skip(byte);
        self.len = self.buffer.cur - self.buffer.txt;
        found
    }

    /// The current indent stops, ascending.
    pub fn stops(&self) -> &[usize] {
        &self.stops
    }

    /// The last indent stop, or 0.
    pub fn last_stop(&self) -> usize {
        self.stops.last().copied().unwrap_or(0)
    }

    /// Add an indent stop at column `n`.
    pub fn insert_stop(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        if let Err(i) = self.stops.binary_search(&n) {
            self.stops.insert(i, n);
        }
    }

    /// Remove the indent stop at column `n`.
    pub fn delete_stop(&mut self, n: usize) {
        if let Ok(i) = self.stops.binary_search(&n) {
            self.stops.remove(i);
        }
    }

    pub fn clear_stops(&mut self) {
        self.stops.clear();
    }

    /// Save the indent stops and start without any.
    pub fn push_stops(&mut self) {
        self.stack.push(mem::take(&mut self.stops));
    }

    /// Restore the indent stops saved last.
    pub fn pop_stops(&mut self) {
        self.stops = self.stack.pop().unwrap_or_default();
    }

    fn begin_text(&mut self) {
        self.cap = 0;
        self.len = 0;
        let cur = self.buffer.cur;
        self.buffer.txt = cur;
        self.buffer.pos = cur;
    }

    fn clear(&mut self) {
        self.cap = 0;
        self.len = 0;
        self.lap.clear();
        self.bol = false;
        self.nul = false;
        self.forced = false;
        self.mark = false;
        self.col = 0;
        self.stops.clear();
        self.ded = 0;
        self.stack.clear();
    }

    fn run(&mut self, method: Method) -> usize {
        self.len = 0;
        let mut step = Step::Scan;
        loop {
            match step {
                Step::Scan => {
                    let cur = self.buffer.cur;
                    self.buffer.txt = cur;
                    self.mark = false;
                    self.buffer.ind = self.buffer.pos;
                    self.col = 0;
                    if self.ded == 0 && self.buffer.hit_end() && self.stops.is_empty() {
                        if method == Method::Split
                            && !self.buffer.at_bob()
                            && self.cap != 0
                            && self.cap != EMPTY
                        {
                            self.cap = EMPTY;
                            return EMPTY;
                        }
                        self.cap = 0;
                        return 0;
                    }
                    step = Step::Find;
                }
                Step::Find => {
                    self.bol = self.buffer.at_bol()
                        || (!self.stops.is_empty() && self.buffer.at_end());
                    step = Step::Redo;
                }
                Step::Redo => {
                    self.lap.clear();
                    self.cap = 0;
                    self.nul = method == Method::Match;
                    self.forced = false;
                    self.execute();
                    match self.finish(method) {
                        Some(next) => step = next,
                        None => return self.cap,
                    }
                }
            }
        }
    }

    fn execute(&mut self) {
        let pattern = Arc::clone(&self.pattern);
        match *pattern.program() {
            Program::Table(ref words) => fsm::execute(words, self),
            Program::Fsm(code) => code(self),
        }
    }

    /// Settle the outcome of a run: update the indent stops, then accept,
    /// reject or retry the match. Returns where to continue, or `None` to
    /// return the accept index.
    fn finish(&mut self, method: Method) -> Option<Step> {
        if self.mark {
            let top = self.stops.last().copied();
            if self.col > 0 && top.map_or(true, |top| top < self.col) {
                self.stops.push(self.col);
            } else if top.map_or(false, |top| top > self.col) {
                let mut n = self.stops.len() - 1;
                while n > 0 && self.stops[n - 1] > self.col {
                    n -= 1;
                }
                self.ded += self.stops.len() - n;
                self.stops.truncate(n);
                // Realign a stop that does not match any earlier indent.
                if n > 0 {
                    self.stops[n - 1] = self.col;
                }
            }
        }
        if self.ded > 0 {
            if self.col == 0 && self.bol {
                self.ded += self.stops.len();
                self.stops.clear();
                self.buffer.pos = self.buffer.ind;
                self.bol = false;
                return Some(Step::Redo);
            }
            self.ded -= 1;
        }

        if method == Method::Split {
            return self.finish_split();
        }

        if self.cap == 0 {
            self.buffer.cur = self.buffer.txt;
            if method == Method::Find {
                let (pos, cur) = (self.buffer.pos, self.buffer.cur);
                if pos == cur + 1 {
                    if self.advance() {
                        self.buffer.txt = self.buffer.cur;
                        return Some(Step::Find);
                    }
                } else if pos > cur && self.advance() {
                    return Some(Step::Scan);
                }
            }
        }
        self.len = self.buffer.cur - self.buffer.txt;
        if self.len == 0 && !self.nul {
            let cur = self.buffer.cur;
            self.buffer.pos = cur;
            if self.buffer.at_end() {
                let bob = self.buffer.at_bob();
                self.buffer.set_current(cur);
                if !self.options.get_nullable() || !bob {
                    self.cap = 0;
                }
            } else if method == Method::Find {
                self.buffer.set_current(cur + 1);
                if self.cap == 0 || !self.options.get_nullable() {
                    return Some(Step::Scan);
                }
            } else {
                self.buffer.set_current(cur);
                self.cap = 0;
            }
        } else if self.len == 0 && self.buffer.cur == self.buffer.end {
            if self.cap == REDO && !self.options.get_accept_redo() {
                self.cap = 0;
            }
        } else {
            let cur = self.buffer.cur;
            self.buffer.set_current(cur);
            if self.len > 0 && self.cap == REDO && !self.options.get_accept_redo() {
                self.len = 0;
                if method != Method::Match {
                    return Some(Step::Scan);
                }
                self.cap = 0;
            }
        }
        None
    }

    fn finish_split(&mut self) -> Option<Step> {
        let b = &mut self.buffer;
        if self.cap == 0 || (b.cur == b.txt && !b.at_bob()) {
            if !b.hit_end() && (b.txt + self.len < b.end || b.peek().is_some()) {
                self.len += 1;
                let next = b.txt + self.len;
                b.set_current(next);
                return Some(Step::Redo);
            }
            if b.got != Got::Eob {
                self.cap = EMPTY;
                let pos = b.pos;
                b.set_current(pos);
                b.got = Got::Eob;
            }
            return None;
        }
        if b.offset(b.cur) == 0 && b.at_bob() && b.at_end() {
            self.cap = EMPTY;
        }
        let cur = b.cur;
        b.set_current(cur);
        None
    }

    /// Move the start of a `find` one byte further, or straight to the next
    /// occurrence of the pattern's literal prefix. Returns false when the
    /// input ends first.
    fn advance(&mut self) -> bool {
        let pattern = Arc::clone(&self.pattern);
        let prefix = pattern.prefix();
        let mut loc = self.buffer.cur + 1;
        if prefix.is_empty() {
            self.buffer.set_current(loc);
            return true;
        }
        loop {
            let end = self.buffer.end;
            if loc < end {
                let hay = self.buffer.slice(loc, end);
                let found = if prefix.len() == 1 {
                    memchr(prefix[0], hay)
                } else {
                    memmem::find(hay, prefix)
                };
                if let Some(i) = found {
                    self.buffer.set_current(loc + i);
                    return true;
                }
            }
            // Keep enough bytes to find a prefix that straddles the refill.
            let keep = (prefix.len() - 1).min(end.saturating_sub(loc));
            let next = end - keep;
            self.buffer.set_current(next);
            self.buffer.txt = next;
            if !self.buffer.fill() {
                let end = self.buffer.end;
                self.buffer.set_current(end);
                self.buffer.txt = end;
                return false;
            }
            loc = self.buffer.cur;
        }
    }

    /// Measure the indentation up to the current offset.
    fn newline(&mut self) {
        self.mark = true;
        let tab = self.options.get_tab_size();
        while self.buffer.ind < self.buffer.pos {
            let b = self.buffer.slice(self.buffer.ind, self.buffer.ind + 1)[0];
            self.col = if b == b'\t' { (self.col / tab + 1) * tab } else { self.col + 1 };
            self.buffer.ind += 1;
        }
    }

    fn indent(&mut self) -> bool {
        self.newline();
        self.col > 0 && self.stops.last().map_or(true, |&top| top < self.col)
    }

    fn dedent(&mut self) -> bool {
        self.newline();
        self.stops.last().map_or(false, |&top| top > self.col)
    }
}

impl Fsm for DfaMatcher {
    fn take(&mut self, index: u16) {
        self.cap = usize::from(index);
        self.buffer.cur = self.buffer.pos;
    }

    fn redo(&mut self) {
        self.cap = REDO;
        self.buffer.cur = self.buffer.pos;
    }

    fn head(&mut self, lookahead: u16) {
        let n = usize::from(lookahead);
        if self.lap.len() <= n {
            self.lap.resize(n + 1, None);
        }
        self.lap[n] = Some(self.buffer.pos - self.buffer.txt);
    }

    fn tail(&mut self, lookahead: u16) {
        if let Some(&Some(k)) = self.lap.get(usize::from(lookahead)) {
            self.buffer.cur = self.buffer.txt + k;
        }
    }

    fn look(&mut self, look: Look) -> bool {
        if self.forced {
            return false;
        }
        match look {
            Look::Dedent if self.ded > 0 => {
                self.nul = true;
                self.forced = true;
                true
            }
            Look::Indent => self.bol && self.indent(),
            Look::Dedent => self.bol && self.dedent(),
            _ => {
                let bob = self.buffer.at_start();
                let before = self.buffer.prev();
                let after = self.buffer.peek();
                look.is_match(bob, before, after)
            }
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        if self.forced {
            return None;
        }
        self.buffer.get()
    }
}

impl Matcher for DfaMatcher {
    fn reset(&mut self, options: &str) -> Result<()> {
        let options = Options::parse(options)?;
        self.set_options(options);
        self.clear();
        Ok(())
    }

    fn input(&mut self, input: Input) {
        self.buffer.reset(input);
        self.clear();
    }

    fn scan(&mut self) -> usize {
        self.run(Method::Scan)
    }

    fn find(&mut self) -> usize {
        self.run(Method::Find)
    }

    fn split(&mut self) -> usize {
        self.run(Method::Split)
    }

    fn matches(&mut self) -> bool {
        let cap = self.run(Method::Match);
        if cap != 0 && self.buffer.at_end() {
            return true;
        }
        self.cap = 0;
        false
    }

    fn accept(&self) -> usize {
        self.cap
    }

    fn text(&self) -> &[u8] {
        let txt = self.buffer.txt;
        self.buffer.slice(txt, txt + self.len)
    }

    fn size(&self) -> usize {
        self.len
    }

    fn lineno(&self) -> usize {
        self.buffer.lineno()
    }

    fn columno(&self) -> usize {
        self.buffer.columno()
    }

    fn first(&self) -> usize {
        self.buffer.offset(self.buffer.txt)
    }

    fn last(&self) -> usize {
        self.first() + self.len
    }

    fn at_end(&mut self) -> bool {
        self.buffer.at_end()
    }

    fn hit_end(&self) -> bool {
        self.buffer.hit_end()
    }

    fn at_bol(&self) -> bool {
        self.buffer.at_bol()
    }

    fn unput(&mut self, byte: u8) {
        self.buffer.unput(byte);
    }

    fn more(&mut self) {
        self.buffer.cur = self.buffer.txt;
    }

    fn less(&mut self, n: usize) {
        if n < self.len {
            self.len = n;
            let loc = self.buffer.txt + n;
            self.buffer.set_current(loc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(regex: &str) -> Arc<Pattern> {
        Arc::new(Pattern::new(regex).unwrap())
    }

    fn scan_all(m: &mut DfaMatcher) -> Vec<(usize, String)> {
        m.scan_iter()
            .map(|t| (t.accept, String::from_utf8(t.text).unwrap()))
            .collect()
    }

    #[test]
    fn find_prefix_across_refills() {
        let mut m = DfaMatcher::new(pattern("abc"), "xxabcxxabc");
        m.buffer(1);
        let found: Vec<usize> = m.find_iter().map(|t| t.first).collect();
        assert_eq!(vec![2, 7], found);
    }

    #[test]
    fn read_skip_rest() {
        let mut m = DfaMatcher::new(pattern("x"), "ab;cd");
        assert_eq!(Some(b'a'), m.read_byte());
        assert_eq!(b"a", m.text());
        assert!(m.skip(b';'));
        assert_eq!(b"b;", m.text());
        assert_eq!(1, m.first());
        assert_eq!(b"cd", m.rest());
        assert_eq!(None, m.read_byte());
        assert!(m.at_end());
    }

    #[test]
    fn less_and_more() {
        let mut m = DfaMatcher::new(pattern(r"[a-z]+|\s"), "hello world");
        assert_eq!(1, m.scan());
        assert_eq!(b"hello", m.text());
        m.less(2);
        assert_eq!(b"he", m.text());
        assert_eq!(1, m.scan());
        assert_eq!(b"llo", m.text());
        m.more();
        assert_eq!(2, m.scan());
        assert_eq!(b"llo ", m.text());
        assert_eq!(2, m.first());
        assert_eq!(6, m.last());
    }

    #[test]
    fn whole_input() {
        let mut m = DfaMatcher::new(pattern("[a-z]+"), "abc");
        assert!(m.matches());
        assert_eq!(1, m.accept());
        m.input(Input::from("ab1"));
        assert!(!m.matches());
        assert_eq!(0, m.accept());
    }

    #[test]
    fn accept_redo() {
        let pat = pattern(r"(?^ab)|\w+| ");
        let mut m = DfaMatcher::new(Arc::clone(&pat), "ab aa");
        let accepts: Vec<usize> = scan_all(&mut m).into_iter().map(|t| t.0).collect();
        assert_eq!(vec![3, 2], accepts);

        let mut m = DfaMatcher::with_options(pat, "ab aa", "A").unwrap();
        assert_eq!(
            vec![(REDO, "ab".to_string()), (3, " ".to_string()), (2, "aa".to_string())],
            scan_all(&mut m),
        );
    }

    #[test]
    fn tab_size() {
        let pat = pattern("x|\t");
        let mut m = DfaMatcher::new(Arc::clone(&pat), "\tx");
        assert_eq!(2, m.scan());
        assert_eq!(1, m.scan());
        assert_eq!(8, m.columno());

        let mut m = DfaMatcher::with_options(pat, "\tx", "T=4").unwrap();
        m.scan();
        m.scan();
        assert_eq!(4, m.columno());
        assert!(DfaMatcher::with_options(pattern("x"), "", "T=x").is_err());
    }

    #[test]
    fn forced_bol() {
        let pat = pattern("(?m)^a|a");
        let mut m = DfaMatcher::new(Arc::clone(&pat), "aa");
        assert_eq!(vec![1, 2], m.scan_iter().map(|t| t.accept).collect::<Vec<_>>());

        let mut m = DfaMatcher::new(pat, "aa");
        assert_eq!(1, m.scan());
        m.set_bol(true);
        assert_eq!(1, m.scan());
    }

    #[test]
    fn indent_stops() {
        let mut m = DfaMatcher::new(pattern("x"), "");
        m.insert_stop(4);
        m.insert_stop(2);
        m.insert_stop(4);
        m.insert_stop(0);
        assert_eq!(&[2, 4], m.stops());
        m.delete_stop(2);
        assert_eq!(4, m.last_stop());
        m.push_stops();
        assert!(m.stops().is_empty());
        m.insert_stop(8);
        m.pop_stops();
        assert_eq!(&[4], m.stops());
        m.clear_stops();
        assert_eq!(0, m.last_stop());
    }

    #[test]
    fn shared_pattern() {
        let pat = pattern(r"\w+");
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let pat = Arc::clone(&pat);
                std::thread::spawn(move || {
                    let text = format!("w{} and more", i);
                    DfaMatcher::new(pat, text).find_iter().count()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(3, h.join().unwrap());
        }
    }
}
