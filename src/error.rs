use std::error;
use std::fmt;
use std::result;

pub type Result<T> = result::Result<T, Error>;

/// An error that occurred while compiling a pattern, parsing an options
/// string or loading a precompiled table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Error {
    kind: ErrorKind,
}

/// The kind of error that occurred.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The regex could not be compiled. The offset is the byte position in
    /// the regex at which the problem was detected.
    MalformedPattern { offset: usize, reason: Reason },
    /// An options string contained an option that is not recognized, or an
    /// option value that is not valid.
    InvalidOption(String),
    /// A precompiled instruction table is not well formed. The offset is the
    /// index of the first offending word.
    InvalidTable { offset: usize },
}

/// The reason a regex is malformed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Reason {
    MismatchedParens,
    MismatchedBrackets,
    MismatchedBraces,
    MismatchedQuotation,
    EmptyExpression,
    EmptyClass,
    InvalidClass,
    InvalidClassRange,
    InvalidEscape,
    InvalidAnchor,
    InvalidRepeat,
    InvalidQuantifier,
    InvalidModifier,
    InvalidSyntax,
    InvalidLookahead,
    UndefinedName,
    Unsupported,
    ExceedsLimits,
}

impl Error {
    /// Return the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Return the offset in the regex at which this error occurred, if this
    /// is a pattern error.
    pub fn offset(&self) -> Option<usize> {
        match self.kind {
            ErrorKind::MalformedPattern { offset, .. } => Some(offset),
            ErrorKind::InvalidTable { offset } => Some(offset),
            ErrorKind::InvalidOption(_) => None,
        }
    }

    /// Return the reason a regex failed to compile, if this is a pattern
    /// error.
    pub fn reason(&self) -> Option<Reason> {
        match self.kind {
            ErrorKind::MalformedPattern { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub(crate) fn malformed(offset: usize, reason: Reason) -> Error {
        Error { kind: ErrorKind::MalformedPattern { offset, reason } }
    }

    pub(crate) fn option(option: &str) -> Error {
        Error { kind: ErrorKind::InvalidOption(option.to_string()) }
    }

    pub(crate) fn table(offset: usize) -> Error {
        Error { kind: ErrorKind::InvalidTable { offset } }
    }
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ErrorKind::MalformedPattern { offset, reason } => {
                write!(f, "{} at position {}", reason, offset)
            }
            ErrorKind::InvalidOption(ref opt) => {
                write!(f, "invalid option '{}'", opt)
            }
            ErrorKind::InvalidTable { offset } => {
                write!(f, "invalid instruction table at word {}", offset)
            }
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match *self {
            Reason::MismatchedParens => "mismatched ( )",
            Reason::MismatchedBrackets => "mismatched [ ]",
            Reason::MismatchedBraces => "mismatched { }",
            Reason::MismatchedQuotation => r"mismatched quotation or \Q..\E",
            Reason::EmptyExpression => "empty (sub)expression",
            Reason::EmptyClass => "empty character class",
            Reason::InvalidClass => "invalid character class",
            Reason::InvalidClassRange => "invalid character class range",
            Reason::InvalidEscape => "invalid escape",
            Reason::InvalidAnchor => "invalid anchor or boundary",
            Reason::InvalidRepeat => "invalid repeat, e.g. {n,m} with n>m",
            Reason::InvalidQuantifier => "invalid lazy or possessive quantifier",
            Reason::InvalidModifier => "invalid (?ismux:) modifier",
            Reason::InvalidSyntax => "invalid regex syntax",
            Reason::InvalidLookahead => "invalid lookahead or negative pattern",
            Reason::UndefinedName => "undefined class name",
            Reason::Unsupported => "unsupported regex feature",
            Reason::ExceedsLimits => "regex exceeds complexity limits",
        };
        f.write_str(msg)
    }
}

/// A non-fatal problem found while compiling a pattern.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Diagnostic {
    /// The subpattern with this (1-based) index can never be the accepted
    /// alternative, because an earlier alternative always wins.
    UnreachableSubpattern { index: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Diagnostic::UnreachableSubpattern { index } => {
                write!(f, "subpattern {} is never matched", index)
            }
        }
    }
}
