/*!
The growable input window of a matcher.

The buffer holds the bytes of the current match and everything read ahead of
it. Bytes before the current match are discarded when more room is needed,
and the line, column and offset counters are advanced past them, so that
positions can still be reported relative to the whole input.
*/

use memchr::{memchr, memchr_iter, memrchr};

use crate::input::Input;

/// The default read size and the unit the buffer grows by.
pub(crate) const BLOCK: usize = 4096;

/// What is known about the byte before the current match.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Got {
    Byte(u8),
    /// The match starts at the beginning of the input.
    Bob,
    /// Unknown, e.g. after `set_bol(false)`.
    Unk,
    /// The final split segment was returned.
    Eob,
}

impl Got {
    fn byte(self) -> Option<u8> {
        match self {
            Got::Byte(b) => Some(b),
            _ => None,
        }
    }
}

/// A buffer over an input.
///
/// The cursors always satisfy `txt <= cur <= end`, `txt <= pos <= end` and
/// `ind <= end`:
///
/// * `txt` is the start of the current match,
/// * `cur` is the end of the current match,
/// * `pos` is the next byte to read,
/// * `end` is the end of the bytes read so far,
/// * `ind` is how far indentation has been measured.
#[derive(Debug)]
pub(crate) struct Buffer {
    input: Input,
    buf: Vec<u8>,
    pub(crate) txt: usize,
    pub(crate) cur: usize,
    pub(crate) pos: usize,
    pub(crate) end: usize,
    pub(crate) ind: usize,
    pub(crate) got: Got,
    eof: bool,
    /// The read size, or 0 to read as much as fits.
    blk: usize,
    /// The absolute offset of `buf[0]`.
    num: usize,
    /// The line number at `buf[0]`.
    lno: usize,
    /// The column at `buf[0]`.
    cno: usize,
    /// The last discarded byte.
    last: Option<u8>,
    /// The tab size used to count columns.
    tab: usize,
}

impl Buffer {
    pub(crate) fn new(input: Input) -> Buffer {
        Buffer {
            input,
            buf: vec![0; 2 * BLOCK],
            txt: 0,
            cur: 0,
            pos: 0,
            end: 0,
            ind: 0,
            got: Got::Bob,
            eof: false,
            blk: 0,
            num: 0,
            lno: 1,
            cno: 0,
            last: None,
            tab: 8,
        }
    }

    /// Start over on a new input, keeping the allocation.
    pub(crate) fn reset(&mut self, input: Input) {
        let (blk, tab) = (self.blk, self.tab);
        let buf = std::mem::take(&mut self.buf);
        *self = Buffer { buf, blk, tab, ..Buffer::new(input) };
    }

    /// Set the read size. A size of 0 reads as much as fits, and a size of 1
    /// suits interactive input.
    pub(crate) fn set_block(&mut self, blk: usize) {
        self.blk = blk;
    }

    pub(crate) fn set_tab(&mut self, tab: usize) {
        self.tab = tab.max(1);
    }

    /// The bytes from `start` to the end of what has been read.
    pub(crate) fn slice(&self, start: usize, end: usize) -> &[u8] {
        &self.buf[start..end]
    }

    /// Read the next byte, or `None` at the end of the input. The cursor
    /// does not move past the end.
    pub(crate) fn get(&mut self) -> Option<u8> {
        if self.pos >= self.end && !self.fill() {
            return None;
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Some(b)
    }

    /// Return the next byte without reading it.
    pub(crate) fn peek(&mut self) -> Option<u8> {
        if self.pos >= self.end && !self.fill() {
            return None;
        }
        Some(self.buf[self.pos])
    }

    /// The byte before the read cursor, if known.
    pub(crate) fn prev(&self) -> Option<u8> {
        if self.pos > self.txt {
            Some(self.buf[self.pos - 1])
        } else {
            self.got.byte()
        }
    }

    /// Returns true when the read cursor is at the very beginning of the
    /// input.
    pub(crate) fn at_start(&self) -> bool {
        self.pos == self.txt && self.got == Got::Bob
    }

    /// Read more input into the free space after `end`. Returns false at the
    /// end of the input.
    pub(crate) fn fill(&mut self) -> bool {
        if self.eof {
            return false;
        }
        let want = if self.blk > 0 { self.blk } else { BLOCK };
        if self.buf.len() - self.end < want {
            self.grow(want);
        }
        let limit = if self.blk > 0 {
            self.end + self.blk
        } else {
            self.buf.len()
        };
        let n = self.input.fill(&mut self.buf[self.end..limit]);
        if n == 0 {
            self.eof = true;
            return false;
        }
        self.end += n;
        true
    }

    /// Read all of the remaining input.
    pub(crate) fn fill_all(&mut self) {
        while self.fill() {}
    }

    /// Make room for at least `need` more bytes after `end`. Bytes before
    /// `txt` are discarded first, and the capacity is doubled if that is not
    /// enough.
    pub(crate) fn grow(&mut self, need: usize) {
        if self.buf.len() - self.end >= need {
            return;
        }
        if self.txt > 0 {
            let gone = &self.buf[..self.txt];
            self.lno += memchr_iter(b'\n', gone).count();
            self.cno = match memrchr(b'\n', gone) {
                Some(i) => column(0, &gone[i + 1..], self.tab),
                None => column(self.cno, gone, self.tab),
            };
            self.last = gone.last().copied();
            let shift = self.txt;
            self.buf.copy_within(shift..self.end, 0);
            self.num += shift;
            self.txt = 0;
            self.cur -= shift;
            self.pos -= shift;
            self.end -= shift;
            self.ind = self.ind.saturating_sub(shift);
            trace!("buffer: discarded {} bytes, offset now {}", shift, self.num);
        }
        let mut len = self.buf.len().max(BLOCK);
        while len - self.end < need {
            len *= 2;
        }
        if len > self.buf.len() {
            trace!("buffer: growing from {} to {} bytes", self.buf.len(), len);
            self.buf.resize(len, 0);
        }
    }

    /// Move both the match end and the read cursor to `loc`, and remember
    /// the byte before it. Moving to the start of the input clears `Bob`, so
    /// that an empty match there is not repeated.
    pub(crate) fn set_current(&mut self, loc: usize) {
        self.cur = loc;
        self.pos = loc;
        self.got = if loc > 0 {
            Got::Byte(self.buf[loc - 1])
        } else {
            self.last.map_or(Got::Unk, Got::Byte)
        };
    }

    /// Put a byte back so that it is read next, right after the current
    /// match.
    pub(crate) fn unput(&mut self, b: u8) {
        self.grow(1);
        self.buf.copy_within(self.cur..self.end, self.cur + 1);
        self.buf[self.cur] = b;
        self.end += 1;
        self.pos = self.cur;
        if self.ind > self.cur {
            self.ind += 1;
        }
    }

    /// Skip past the next occurrence of `byte`, starting at the read cursor.
    /// Returns false if the input ends first, in which case everything was
    /// skipped.
    pub(crate) fn skip(&mut self, byte: u8) -> bool {
        loop {
            if let Some(i) = memchr(byte, &self.buf[self.pos..self.end]) {
                let loc = self.pos + i + 1;
                self.set_current(loc);
                return true;
            }
            self.pos = self.end;
            if !self.fill() {
                let end = self.end;
                self.set_current(end);
                return false;
            }
        }
    }

    pub(crate) fn at_bob(&self) -> bool {
        self.got == Got::Bob
    }

    pub(crate) fn at_bol(&self) -> bool {
        matches!(self.got, Got::Bob | Got::Byte(b'\n'))
    }

    /// Returns true when the end of the input was hit by the read cursor.
    pub(crate) fn hit_end(&self) -> bool {
        self.pos >= self.end && self.eof
    }

    /// Returns true when no bytes follow the read cursor.
    pub(crate) fn at_end(&mut self) -> bool {
        self.pos >= self.end && (self.eof || self.peek().is_none())
    }

    /// The absolute offset of `loc`.
    pub(crate) fn offset(&self, loc: usize) -> usize {
        self.num + loc
    }

    /// The line number of the start of the current match.
    pub(crate) fn lineno(&self) -> usize {
        self.lno + memchr_iter(b'\n', &self.buf[..self.txt]).count()
    }

    /// The column of the start of the current match. Tabs advance to the
    /// next tab stop and UTF-8 sequences count as one column.
    pub(crate) fn columno(&self) -> usize {
        let before = &self.buf[..self.txt];
        match memrchr(b'\n', before) {
            Some(i) => column(0, &before[i + 1..], self.tab),
            None => column(self.cno, before, self.tab),
        }
    }
}

/// The column reached from column `col` after the given bytes.
pub(crate) fn column(mut col: usize, bytes: &[u8], tab: usize) -> usize {
    let tab = tab.max(1);
    for &b in bytes.iter() {
        if b == b'\t' {
            col = (col / tab + 1) * tab;
        } else if b & 0xC0 != 0x80 {
            col += 1;
        }
    }
    col
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_and_peek() {
        let mut buf = Buffer::new(Input::from("ab"));
        assert!(buf.at_start());
        assert_eq!(Some(b'a'), buf.peek());
        assert_eq!(Some(b'a'), buf.get());
        assert_eq!(Some(b'a'), buf.prev());
        assert_eq!(Some(b'b'), buf.get());
        assert_eq!(None, buf.get());
        assert_eq!(2, buf.pos);
        assert!(buf.hit_end());
        assert!(buf.at_end());
    }

    #[test]
    fn compaction_keeps_counters() {
        let text = "line\n".repeat(4 * BLOCK);
        let mut buf = Buffer::new(Input::from(text.clone()));
        let mut n = 0;
        while buf.get().is_some() {
            n += 1;
            if n % 100 == 0 {
                // Pretend a match ended here, so earlier bytes can go.
                let pos = buf.pos;
                buf.set_current(pos);
                buf.txt = pos;
            }
        }
        assert_eq!(text.len(), n);
        assert!(buf.offset(0) > 0);
        let txt = buf.txt;
        assert_eq!(buf.offset(txt), 4 * 5 * BLOCK - (n % 100));
        assert_eq!(1 + text[..buf.offset(txt)].matches('\n').count(), buf.lineno());
        assert!(buf.buf.len() <= 4 * BLOCK);
    }

    #[test]
    fn growth_keeps_match() {
        let text = "x".repeat(3 * BLOCK);
        let mut buf = Buffer::new(Input::from(text));
        while buf.get().is_some() {}
        assert_eq!(0, buf.txt);
        assert_eq!(3 * BLOCK, buf.end);
        assert!(buf.slice(0, buf.end).iter().all(|&b| b == b'x'));
    }

    #[test]
    fn columns() {
        assert_eq!(8, column(0, b"\t", 8));
        assert_eq!(8, column(3, b"\t", 8));
        assert_eq!(11, column(0, b"\tabc", 8));
        assert_eq!(4, column(0, b"a\t", 4));
        assert_eq!(2, column(0, "\u{e9}\u{e9}".as_bytes(), 8));

        let mut buf = Buffer::new(Input::from("ab\n\tcd"));
        while buf.get().is_some() {}
        buf.txt = 5;
        assert_eq!(2, buf.lineno());
        assert_eq!(9, buf.columno());
        buf.set_tab(4);
        assert_eq!(5, buf.columno());
    }

    #[test]
    fn unput_and_skip() {
        let mut buf = Buffer::new(Input::from("abc;def"));
        buf.get();
        buf.set_current(1);
        buf.unput(b'z');
        assert_eq!(Some(b'z'), buf.get());
        assert_eq!(Some(b'b'), buf.get());
        assert!(buf.skip(b';'));
        assert_eq!(5, buf.cur);
        assert_eq!(Some(b'd'), buf.peek());
        assert!(!buf.skip(b';'));
        assert!(buf.at_end());
    }

    #[test]
    fn context() {
        let mut buf = Buffer::new(Input::from("a\nb"));
        assert!(buf.at_bob());
        assert!(buf.at_bol());
        buf.get();
        buf.get();
        buf.set_current(2);
        buf.txt = 2;
        assert!(!buf.at_bob());
        assert!(buf.at_bol());
        buf.set_current(1);
        assert!(!buf.at_bol());
        assert_eq!(Some(b'a'), buf.prev());
    }
}
