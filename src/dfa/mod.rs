/*!
The DFA built from the follow relation of a regex, and its encodings.

A [`Dfa`] is an intermediate value: the pattern compiler determinizes the
positions of a regex into one, assembles it into instruction words and then
drops it. The instruction words are the only representation the match engine
ever sees. They can also be printed as a Rust table, as Rust code or as a
Graphviz graph.
*/

use crate::util::look::Look;

pub(crate) use self::determinize::Determinizer;

pub(crate) mod codegen;
mod determinize;
pub(crate) mod encode;
pub(crate) mod opcode;

/// The identifier of a DFA state. The start state is always `0`.
pub(crate) type StateID = usize;

/// A single DFA state.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct State {
    /// The subpattern this state accepts, or `0`.
    pub(crate) accept: u16,
    /// When set, the accept is a negative pattern: the matched text is
    /// skipped instead of returned.
    pub(crate) redo: bool,
    /// Lookaheads that start when this state is entered.
    pub(crate) heads: Vec<u16>,
    /// Lookaheads that end when this state is entered. The match ends where
    /// the lookahead started.
    pub(crate) tails: Vec<u16>,
    /// Meta edges, tried in order before any byte is read.
    pub(crate) looks: Vec<(Look, StateID)>,
    /// Byte edges as ascending, non-overlapping inclusive ranges.
    pub(crate) ranges: Vec<(u8, u8, StateID)>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Dfa {
    pub(crate) states: Vec<State>,
    /// Whether each subpattern is accepted by some state, by zero-based
    /// subpattern index.
    pub(crate) reachable: Vec<bool>,
}

impl Dfa {
    /// The total number of meta and byte edges.
    pub(crate) fn edges(&self) -> usize {
        self.states.iter().map(|s| s.looks.len() + s.ranges.len()).sum()
    }
}
