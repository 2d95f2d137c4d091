use core::ops::Range;

use crate::util::{alphabet::ByteSet, look::Look};

/// The syntax tree of a regex.
///
/// The tree refers to its leaves by index into the leaf table of the
/// enclosing [`Parsed`]. Lookahead and negative patterns have already been
/// lowered into marker leaves by the parser, so the tree only has to express
/// sequencing, choice and repetition.
#[derive(Clone, Debug)]
pub(crate) enum Ast {
    /// Matches the empty string.
    Empty,
    /// A single leaf, by index.
    Leaf(usize),
    Concat(Vec<Ast>),
    Alternate(Vec<Ast>),
    Repeat(Box<Repeat>),
}

#[derive(Clone, Debug)]
pub(crate) struct Repeat {
    pub(crate) ast: Ast,
    pub(crate) min: u32,
    /// `None` means unbounded.
    pub(crate) max: Option<u32>,
    /// The offset of the quantifier in the regex.
    pub(crate) offset: usize,
}

/// A leaf of the syntax tree. Every leaf becomes one position per iteration
/// of the repeats around it.
#[derive(Clone, Debug)]
pub(crate) struct Leaf {
    pub(crate) kind: LeafKind,
    /// The innermost lazy quantifier whose body contains this leaf.
    pub(crate) lazy: Option<u16>,
}

#[derive(Clone, Debug)]
pub(crate) enum LeafKind {
    /// Consumes one byte from the set.
    Bytes(ByteSet),
    /// A zero-width assertion.
    Look(Look),
    /// Marks where the lookahead with this id starts.
    Head(u16),
    /// Marks where the lookahead with this id ends.
    Tail(u16),
    /// Ends a negative pattern.
    Redo,
}

impl Leaf {
    /// Returns true when this leaf consumes no input.
    pub(crate) fn is_zero_width(&self) -> bool {
        !matches!(self.kind, LeafKind::Bytes(_))
    }

    pub(crate) fn bytes(&self) -> Option<&ByteSet> {
        match self.kind {
            LeafKind::Bytes(ref set) => Some(set),
            _ => None,
        }
    }
}

/// A top-level alternative of a regex, also known as a subpattern.
#[derive(Clone, Debug)]
pub(crate) struct Alternative {
    pub(crate) ast: Ast,
    /// Where the alternative is in the regex.
    pub(crate) span: Range<usize>,
}

/// The result of parsing a regex.
#[derive(Clone, Debug)]
pub(crate) struct Parsed {
    pub(crate) alternatives: Vec<Alternative>,
    pub(crate) leaves: Vec<Leaf>,
    pub(crate) lookaheads: usize,
}
