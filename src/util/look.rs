/// A zero-width assertion.
///
/// The DFA builder turns every assertion into a meta edge. The match engine
/// tests it at the current offset, looking at the byte before and the byte
/// after it. The declaration order is the order in which a state's meta edges
/// are tried.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Look {
    /// `\A`: the beginning of the input.
    StartText = 1,
    /// `^` in multi-line mode: the beginning of the input or the position
    /// after a `\n`.
    StartLine = 2,
    /// `\<`: a non-word byte (or the beginning of the input) before and a word
    /// byte after.
    WordStart = 3,
    /// `\>`: a word byte before and a non-word byte (or the end of the input)
    /// after.
    WordEnd = 4,
    /// `\b`: a word byte on exactly one side.
    WordBoundary = 5,
    /// `\B`: word bytes on both sides or on neither.
    NotWordBoundary = 6,
    /// `$` in multi-line mode: the end of the input or the position before a
    /// `\n`.
    EndLine = 7,
    /// `\z`: the end of the input.
    EndText = 8,
    /// `\i`: at the beginning of a line, the indentation column is beyond the
    /// current indent stop.
    Indent = 9,
    /// `\j`: at the beginning of a line, the indentation column is before the
    /// current indent stop, or a dedent is pending.
    Dedent = 10,
}

impl Look {
    const ALL: [Look; 10] = [
        Look::StartText,
        Look::StartLine,
        Look::WordStart,
        Look::WordEnd,
        Look::WordBoundary,
        Look::NotWordBoundary,
        Look::EndLine,
        Look::EndText,
        Look::Indent,
        Look::Dedent,
    ];

    /// Return the assertion with the given meta code, as used in encoded
    /// instructions.
    pub fn from_code(code: u8) -> Option<Look> {
        Look::ALL.get(usize::from(code).checked_sub(1)?).copied()
    }

    /// Return the meta code of this assertion, which is always in `1..=10`.
    pub fn as_code(self) -> u8 {
        self as u8
    }

    /// The name of this assertion as it is written in a regex.
    pub fn as_str(self) -> &'static str {
        match self {
            Look::StartText => r"\A",
            Look::StartLine => "^",
            Look::WordStart => r"\<",
            Look::WordEnd => r"\>",
            Look::WordBoundary => r"\b",
            Look::NotWordBoundary => r"\B",
            Look::EndLine => "$",
            Look::EndText => r"\z",
            Look::Indent => r"\i",
            Look::Dedent => r"\j",
        }
    }

    /// Returns true when this assertion holds between the bytes `before` and
    /// `after`. `None` stands for the start (or end) of the input, and `bob`
    /// says whether the offset is the very beginning of the input.
    ///
    /// Indentation depends on matcher state rather than on neighboring
    /// bytes, so `Indent` and `Dedent` are never true here.
    pub(crate) fn is_match(
        self,
        bob: bool,
        before: Option<u8>,
        after: Option<u8>,
    ) -> bool {
        let word_before = before.map_or(false, is_word_byte);
        let word_after = after.map_or(false, is_word_byte);
        match self {
            Look::StartText => bob,
            Look::StartLine => bob || before == Some(b'\n'),
            Look::WordStart => !word_before && word_after,
            Look::WordEnd => word_before && !word_after,
            Look::WordBoundary => word_before != word_after,
            Look::NotWordBoundary => word_before == word_after,
            Look::EndLine => after.map_or(true, |b| b == b'\n'),
            Look::EndText => after.is_none(),
            Look::Indent | Look::Dedent => false,
        }
    }
}

/// Returns true if and only if the given byte is an ASCII word byte.
pub(crate) fn is_word_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

/// LookSet is a memory-efficient set of assertions.
///
/// The DFA builder records which assertions are already known to hold at the
/// current offset, so that following meta edges always makes progress.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub(crate) struct LookSet {
    bits: u16,
}

impl LookSet {
    pub(crate) fn empty() -> LookSet {
        LookSet { bits: 0 }
    }

    pub(crate) fn insert(self, look: Look) -> LookSet {
        LookSet { bits: self.bits | (1 << look.as_code()) }
    }

    pub(crate) fn contains(self, look: Look) -> bool {
        self.bits & (1 << look.as_code()) != 0
    }

    /// Iterate over the assertions in this set, in declaration order.
    pub(crate) fn iter(self) -> impl Iterator<Item = Look> {
        Look::ALL.iter().copied().filter(move |&look| self.contains(look))
    }
}

impl core::fmt::Debug for LookSet {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_set().entries(self.iter().map(Look::as_str)).finish()
    }
}
