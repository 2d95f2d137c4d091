use core::{ascii, fmt, str};

/// A type that wraps a single byte with a convenient fmt::Debug impl that
/// escapes the byte.
pub(crate) struct DebugByte(pub(crate) u8);

impl fmt::Debug for DebugByte {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // 10 bytes is enough to cover any output from ascii::escape_default.
        let mut bytes = [0u8; 10];
        let mut len = 0;
        for (i, mut b) in ascii::escape_default(self.0).enumerate() {
            // capitalize \xab to \xAB
            if i >= 2 && b'a' <= b && b <= b'f' {
                b -= 32;
            }
            bytes[len] = b;
            len += 1;
        }
        // escape_default only ever yields ASCII.
        match str::from_utf8(&bytes[..len]) {
            Ok(s) => f.write_str(s),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Escape a byte for use inside a double quoted DOT label.
pub(crate) fn dot_byte(b: u8) -> String {
    match b {
        b'"' => r#"\""#.to_string(),
        _ => format!("{:?}", DebugByte(b)).replace('\\', r"\\"),
    }
}
