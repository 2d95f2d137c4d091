/*!
Sources of input bytes for matchers.
*/

use std::{fmt, io};

/// A supplier of input bytes.
///
/// `fill` copies as many bytes as are available into `buf`, up to its
/// length, and returns the number copied. Returning 0 means that the input is
/// exhausted; a matcher never calls `fill` again after that.
pub trait Source: Send {
    fn fill(&mut self, buf: &mut [u8]) -> usize;
}

/// The input of a matcher.
///
/// An `Input` can be made from strings and byte strings, owned or static,
/// and from any `io::Read`:
///
/// ```
/// use regex_scanner::Input;
///
/// let a = Input::from("some text");
/// let b = Input::from(vec![b'x'; 10]);
/// let c = Input::from_reader(std::io::Cursor::new(b"bytes".to_vec()));
/// let d = Input::empty();
/// # drop((a, b, c, d));
/// ```
pub struct Input {
    source: Option<Box<dyn Source>>,
}

impl Input {
    /// An input without any bytes.
    pub fn empty() -> Input {
        Input { source: None }
    }

    /// An input that reads from `rdr`. Interrupted reads are retried, and
    /// any other I/O error ends the input.
    pub fn from_reader<R: io::Read + Send + 'static>(rdr: R) -> Input {
        Input::from_source(Reader(rdr))
    }

    /// An input drawing bytes from a custom source.
    pub fn from_source<S: Source + 'static>(source: S) -> Input {
        Input { source: Some(Box::new(source)) }
    }

    /// Copy bytes into `buf`, returning 0 at the end of the input.
    pub(crate) fn fill(&mut self, buf: &mut [u8]) -> usize {
        if buf.is_empty() {
            return 0;
        }
        match self.source {
            Some(ref mut source) => {
                let n = source.fill(buf);
                if n == 0 {
                    self.source = None;
                }
                n
            }
            None => 0,
        }
    }
}

impl Default for Input {
    fn default() -> Input {
        Input::empty()
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Input")
            .field("exhausted", &self.source.is_none())
            .finish()
    }
}

/// Bytes held in memory, consumed front to back.
struct Bytes<T> {
    bytes: T,
    pos: usize,
}

impl<T: AsRef<[u8]> + Send> Source for Bytes<T> {
    fn fill(&mut self, buf: &mut [u8]) -> usize {
        let rest = &self.bytes.as_ref()[self.pos..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        n
    }
}

struct Reader<R>(R);

impl<R: io::Read + Send> Source for Reader<R> {
    fn fill(&mut self, buf: &mut [u8]) -> usize {
        loop {
            match self.0.read(buf) {
                Ok(n) => return n,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(_err) => {
                    debug!("input read failed, ending input: {}", _err);
                    return 0;
                }
            }
        }
    }
}

impl From<&'static str> for Input {
    fn from(s: &'static str) -> Input {
        Input::from_source(Bytes { bytes: s.as_bytes(), pos: 0 })
    }
}

impl From<String> for Input {
    fn from(s: String) -> Input {
        Input::from_source(Bytes { bytes: s.into_bytes(), pos: 0 })
    }
}

impl From<&'static [u8]> for Input {
    fn from(bytes: &'static [u8]) -> Input {
        Input::from_source(Bytes { bytes, pos: 0 })
    }
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Input {
        Input::from_source(Bytes { bytes, pos: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mut input: Input, chunk: usize) -> Vec<u8> {
        let mut out = vec![];
        let mut buf = vec![0; chunk];
        loop {
            let n = input.fill(&mut buf);
            if n == 0 {
                return out;
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    #[test]
    fn strings() {
        assert_eq!(b"hello".to_vec(), drain(Input::from("hello"), 2));
        assert_eq!(b"hello".to_vec(), drain(Input::from("hello".to_string()), 9));
        assert_eq!(b"\xFF\x00".to_vec(), drain(Input::from(&b"\xFF\x00"[..]), 1));
        assert!(drain(Input::empty(), 4).is_empty());
    }

    struct Flaky {
        interrupted: bool,
    }

    impl io::Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::new(io::ErrorKind::Interrupted, "again"));
            }
            if buf.is_empty() {
                return Ok(0);
            }
            buf[0] = b'z';
            Err(io::Error::new(io::ErrorKind::Other, "broken"))
        }
    }

    #[test]
    fn reader_errors() {
        let input = Input::from_reader(Flaky { interrupted: false });
        assert!(drain(input, 4).is_empty());
    }
}
