/*!
Parsing of the regex syntax and of pattern option strings.

The parser produces a syntax tree over a table of leaves. Each leaf is a byte
set, a zero-width assertion or a marker used by lookahead and negative
patterns. Nothing here knows about positions or automata.
*/

pub(crate) use self::parse::parse;

use crate::error::{Error, Result};

pub(crate) mod ast;
mod class;
mod parse;

/// The syntax options that modifiers like `(?i)` can change locally.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Flags {
    pub(crate) case_insensitive: bool,
    pub(crate) multi_line: bool,
    pub(crate) dot_matches_new_line: bool,
    pub(crate) ignore_whitespace: bool,
    pub(crate) quotes: bool,
    pub(crate) unicode: bool,
}

impl Flags {
    /// Set or clear the flag denoted by a modifier letter. Returns false if
    /// the letter is not a modifier.
    pub(crate) fn set(&mut self, letter: u8, yes: bool) -> bool {
        match letter {
            b'i' => self.case_insensitive = yes,
            b'm' => self.multi_line = yes,
            b's' => self.dot_matches_new_line = yes,
            b'x' => self.ignore_whitespace = yes,
            b'q' => self.quotes = yes,
            b'u' => self.unicode = yes,
            _ => return false,
        }
        true
    }
}

/// The configuration used to compile a pattern.
///
/// A configuration is usually built from an options string, as in
/// `Pattern::compile(regex, "imx")`, but every option also has a builder
/// method:
///
/// | letter | method |
/// |---|---|
/// | `b` | [`Config::bracket_escapes(false)`](Config::bracket_escapes) |
/// | `e=C` | [`Config::escape`] (`e=` alone disables escapes) |
/// | `f=FILE,..` | [`Config::files`] |
/// | `i` | [`Config::case_insensitive`] |
/// | `m` | [`Config::multi_line`] |
/// | `n=NAME` | [`Config::name`] |
/// | `o` | [`Config::fsm_code`] |
/// | `q` | [`Config::quotes`] |
/// | `s` | [`Config::dot_matches_new_line`] |
/// | `u` | [`Config::unicode`] |
/// | `x` | [`Config::ignore_whitespace`] |
///
/// Valued options end at a `;`, e.g. `"e=%;n=lexer;f=lexer.rs,lexer.gv"`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub(crate) flags: Flags,
    pub(crate) escape: Option<u8>,
    pub(crate) bracket_escapes: bool,
    pub(crate) name: Option<String>,
    pub(crate) fsm_code: bool,
    pub(crate) files: Vec<String>,
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

impl Config {
    /// Return a new default configuration: byte mode, `\` escapes, no
    /// modifiers and no output files.
    pub fn new() -> Config {
        Config {
            flags: Flags::default(),
            escape: Some(b'\\'),
            bracket_escapes: true,
            name: None,
            fsm_code: false,
            files: vec![],
        }
    }

    /// Parse an options string.
    pub fn parse(options: &str) -> Result<Config> {
        let mut config = Config::new();
        let bytes = options.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let letter = bytes[i];
            i += 1;
            match letter {
                b';' | b',' | b' ' | b'\t' => continue,
                b'b' => config.bracket_escapes = false,
                b'o' => config.fsm_code = true,
                b'e' | b'n' | b'f' => {
                    if bytes.get(i) != Some(&b'=') {
                        return Err(Error::option(&options[i - 1..]));
                    }
                    i += 1;
                    let end = bytes[i..]
                        .iter()
                        .position(|&b| b == b';')
                        .map_or(bytes.len(), |n| i + n);
                    let value = &options[i..end];
                    match letter {
                        b'e' => {
                            // Only the escape character itself belongs to the
                            // value; option letters may follow it directly.
                            match value.as_bytes().first() {
                                None => config.escape = None,
                                Some(&c) if c.is_ascii() => {
                                    config.escape = Some(c);
                                    i += 1;
                                    continue;
                                }
                                Some(_) => return Err(Error::option(value)),
                            }
                        }
                        b'n' => config.name = Some(value.to_string()),
                        _ => {
                            config.files.extend(
                                value
                                    .split(',')
                                    .filter(|f| !f.is_empty())
                                    .map(|f| f.to_string()),
                            );
                        }
                    }
                    i = end;
                }
                _ => {
                    if !config.flags.set(letter, true) {
                        let rest = &options[i - 1..];
                        let opt = rest.chars().next().map_or(rest, |c| {
                            &rest[..c.len_utf8()]
                        });
                        return Err(Error::option(opt));
                    }
                }
            }
        }
        Ok(config)
    }

    /// Enable or disable case insensitive matching (`i`).
    pub fn case_insensitive(mut self, yes: bool) -> Config {
        self.flags.case_insensitive = yes;
        self
    }

    /// Make `^` and `$` match at line boundaries (`m`).
    pub fn multi_line(mut self, yes: bool) -> Config {
        self.flags.multi_line = yes;
        self
    }

    /// Make `.` match `\n` too (`s`).
    pub fn dot_matches_new_line(mut self, yes: bool) -> Config {
        self.flags.dot_matches_new_line = yes;
        self
    }

    /// Ignore whitespace and `#` comments in the regex (`x`).
    pub fn ignore_whitespace(mut self, yes: bool) -> Config {
        self.flags.ignore_whitespace = yes;
        self
    }

    /// Treat `"..."` as a literal string (`q`).
    pub fn quotes(mut self, yes: bool) -> Config {
        self.flags.quotes = yes;
        self
    }

    /// Match UTF-8 encoded characters instead of bytes in `.`, classes and
    /// `\p{..}` (`u`).
    pub fn unicode(mut self, yes: bool) -> Config {
        self.flags.unicode = yes;
        self
    }

    /// Whether escapes are recognized inside bracket lists. Disabled by `b`.
    pub fn bracket_escapes(mut self, yes: bool) -> Config {
        self.bracket_escapes = yes;
        self
    }

    /// Set the escape character, or `None` to disable escapes (`e=C`).
    pub fn escape(mut self, escape: Option<u8>) -> Config {
        self.escape = escape;
        self
    }

    /// The name used for generated tables and code (`n=NAME`).
    pub fn name(mut self, name: &str) -> Config {
        self.name = Some(name.to_string());
        self
    }

    /// Generate FSM code rather than a table when exporting `.rs` files
    /// (`o`).
    pub fn fsm_code(mut self, yes: bool) -> Config {
        self.fsm_code = yes;
        self
    }

    /// Add a file to export to (`f=FILE`). The extension selects the format:
    /// `.rs` for Rust source and `.gv` for a Graphviz graph.
    pub fn file(mut self, path: &str) -> Config {
        self.files.push(path.to_string());
        self
    }

    /// Return the configured name, defaulting to `FSM`.
    pub fn get_name(&self) -> &str {
        self.name.as_deref().unwrap_or("FSM")
    }

    /// Return the configured export files.
    pub fn get_files(&self) -> &[String] {
        &self.files
    }

    pub fn get_unicode(&self) -> bool {
        self.flags.unicode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parse_letters() {
        let config = Config::parse("imsx").unwrap();
        assert!(config.flags.case_insensitive);
        assert!(config.flags.multi_line);
        assert!(config.flags.dot_matches_new_line);
        assert!(config.flags.ignore_whitespace);
        assert!(!config.flags.quotes);
        assert_eq!(Some(b'\\'), config.escape);
    }

    #[test]
    fn parse_values() {
        let config = Config::parse("e=%i;n=lexer;f=a.rs,b.gv").unwrap();
        assert_eq!(Some(b'%'), config.escape);
        assert!(config.flags.case_insensitive);
        assert_eq!("lexer", config.get_name());
        assert_eq!(&["a.rs".to_string(), "b.gv".to_string()], config.get_files());

        let config = Config::parse("e=;q").unwrap();
        assert_eq!(None, config.escape);
        assert!(config.flags.quotes);

        let config = Config::parse("e=").unwrap();
        assert_eq!(None, config.escape);
    }

    #[test]
    fn parse_errors() {
        let err = Config::parse("iw").unwrap_err();
        assert_eq!(&ErrorKind::InvalidOption("w".to_string()), err.kind());
        assert!(Config::parse("n").is_err());
        assert!(Config::parse("é").is_err());
    }
}
