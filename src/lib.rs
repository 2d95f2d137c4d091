/*!
This crate compiles regular expressions into compact DFA programs and runs
them as a scanner, a searcher and a splitter over buffered byte streams.

A [`Pattern`] is a regex whose top-level alternatives are subpatterns. It is
compiled directly from the positions of the regex into a deterministic
automaton, which is encoded as a table of 32-bit instruction words. A
[`DfaMatcher`] runs that table over an [`Input`] and reports the 1-based index
of the subpattern that matched, so a single pattern serves as the rules of a
lexer:

```
use regex_scanner::{DfaMatcher, Matcher, Pattern};

# fn example() -> Result<(), regex_scanner::Error> {
let pat = Pattern::new(r"[a-z]+|[0-9]+|\s+")?;
let mut m = DfaMatcher::new(pat, "let x 42");
let mut tokens = vec![];
loop {
    match m.scan() {
        0 => break,
        accept => tokens.push((accept, m.text().to_vec())),
    }
}
assert_eq!(
    vec![
        (1, b"let".to_vec()),
        (3, b" ".to_vec()),
        (1, b"x".to_vec()),
        (3, b" ".to_vec()),
        (2, b"42".to_vec()),
    ],
    tokens,
);
# Ok(()) }; example().unwrap()
```

# Syntax

Beyond the usual regex syntax, patterns support lazy quantifiers (`*?`,
`+?`, `??`, `{n,m}?`), trailing lookaheads `X(?=Y)`, negative patterns
`(?^X)` whose matches are skipped, and the indentation anchors `\i` and `\j`,
which match at an increase and a decrease of the indentation of a line. The
syntax options, such as `i` for case insensitive matching, are given as an
options string to [`Pattern::compile`] or through a [`Config`].

# Matching

The [`Matcher`] trait provides the match methods:

* [`Matcher::scan`] matches right at the current position,
* [`Matcher::find`] searches for the next match,
* [`Matcher::split`] returns the text between matches,
* [`Matcher::matches`] checks that the whole input matches.

The first three return the index of the subpattern that matched, or `0` when
there is no match. The iterators returned by
[`Matcher::scan_iter`], [`Matcher::find_iter`] and [`Matcher::split_iter`]
produce owned [`Token`]s.

# Precompiled patterns

A compiled pattern can be written as Rust source with
[`Pattern::write_table`] or [`Pattern::write_fsm`], and loaded again without
compiling anything with [`Pattern::from_table`] or [`Pattern::from_fsm`].

# Crate features

* **unicode** (enabled by default) - Enables Unicode classes such as
  `\p{Greek}` and Unicode case folding.
* **logging** - Emits compile statistics and diagnostics through the `log`
  crate.
*/

#![deny(missing_debug_implementations)]

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("regex-scanner currently not supported on non-{32,64}");

pub use crate::{
    error::{Diagnostic, Error, ErrorKind, Reason, Result},
    input::{Input, Source},
    matcher::{
        DfaMatcher, Fsm, FsmCode, Matcher, Options, Token, Tokens, EMPTY,
        REDO,
    },
    pattern::{Builder, Pattern},
    syntax::Config,
    util::look::Look,
};

#[macro_use]
mod macros;

mod buffer;
mod dfa;
mod error;
mod follow;
mod input;
pub mod matcher;
mod pattern;
mod syntax;
mod util;
