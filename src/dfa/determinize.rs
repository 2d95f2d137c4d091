use std::{
    collections::{BTreeSet, HashMap, HashSet},
    rc::Rc,
};

use crate::{
    dfa::{Dfa, State, StateID},
    error::{Error, Reason, Result},
    follow::{Follow, Position},
    syntax::ast::{LeafKind, Parsed},
    util::{
        alphabet::{ByteClassSet, ByteSet},
        look::{Look, LookSet},
    },
};

/// The largest number of DFA states. State ids are encoded in 16 bits.
const STATE_LIMIT: usize = 0xFFFE;

/// A determinizer converts the positions of a regex into a DFA.
///
/// Every DFA state corresponds to a closed set of positions plus the labels
/// derived from it. States are discovered depth first from the start state,
/// and identical builder states are shared through a cache.
#[derive(Debug)]
pub(crate) struct Determinizer<'a> {
    parsed: &'a Parsed,
    follow: &'a Follow,
    dfa: Dfa,
    /// The builder state of every DFA state, by state id.
    builder_states: Vec<Rc<BuilderState>>,
    /// A map from builder state to DFA state id.
    cache: HashMap<Rc<BuilderState>, StateID>,
}

/// The state of the DFA while it is being built.
///
/// Two builder states are the same DFA state exactly when they are equal,
/// which includes their labels and the assertions already known to hold.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct BuilderState {
    /// The closed (and trimmed) positions, in ascending order.
    positions: Vec<Position>,
    /// True when no input has been consumed since the start state, i.e. this
    /// is the start state or one of its meta successors.
    zero: bool,
    /// Assertions known to hold at the current offset.
    known: LookSet,
    accept: u16,
    redo: bool,
    heads: Vec<u16>,
    tails: Vec<u16>,
}

impl<'a> Determinizer<'a> {
    pub(crate) fn new(parsed: &'a Parsed, follow: &'a Follow) -> Determinizer<'a> {
        Determinizer {
            parsed,
            follow,
            dfa: Dfa::default(),
            builder_states: vec![],
            cache: HashMap::new(),
        }
    }

    /// Build the DFA. The start state has id `0`.
    pub(crate) fn build(mut self) -> Result<Dfa> {
        let kernel = self.tag_all(None, self.follow.start.iter().copied());
        let start = self.close(kernel, true, LookSet::empty(), None);
        let (start_id, _) = self.add_state(start)?;
        let mut uncompiled = vec![start_id];
        while let Some(id) = uncompiled.pop() {
            let state = Rc::clone(&self.builder_states[id]);
            for look in self.looks(&state).iter() {
                let next = self.meta_successor(&state, look);
                let (next_id, is_new) = self.add_state(next)?;
                if is_new {
                    uncompiled.push(next_id);
                }
                self.dfa.states[id].looks.push((look, next_id));
            }
            let mut ranges: Vec<(u8, u8, StateID)> = vec![];
            for (lo, hi) in self.byte_classes(&state) {
                let kernel = self.byte_kernel(&state, lo);
                if kernel.is_empty() {
                    continue;
                }
                let next = self.close(kernel, false, LookSet::empty(), None);
                let (next_id, is_new) = self.add_state(next)?;
                if is_new {
                    uncompiled.push(next_id);
                }
                if let Some(last) = ranges.last_mut() {
                    if u16::from(last.1) + 1 == u16::from(lo) && last.2 == next_id
                    {
                        last.1 = hi;
                        continue;
                    }
                }
                ranges.push((lo, hi, next_id));
            }
            self.dfa.states[id].ranges = ranges;
        }
        let mut reachable = vec![false; self.parsed.alternatives.len()];
        for state in self.dfa.states.iter() {
            if state.accept > 0 {
                reachable[usize::from(state.accept) - 1] = true;
            }
        }
        self.dfa.reachable = reachable;
        Ok(self.dfa)
    }

    fn add_state(&mut self, state: BuilderState) -> Result<(StateID, bool)> {
        if let Some(&id) = self.cache.get(&state) {
            return Ok((id, false));
        }
        let id = self.dfa.states.len();
        if id >= STATE_LIMIT {
            return Err(Error::malformed(0, Reason::ExceedsLimits));
        }
        trace!(
            "state {}: {:?} accept={} known={:?}",
            id,
            state.positions,
            state.accept,
            state.known,
        );
        self.dfa.states.push(State {
            accept: state.accept,
            redo: state.redo,
            heads: state.heads.clone(),
            tails: state.tails.clone(),
            looks: vec![],
            ranges: vec![],
        });
        let state = Rc::new(state);
        self.builder_states.push(Rc::clone(&state));
        self.cache.insert(state, id);
        Ok((id, true))
    }

    fn leaf_kind(&self, p: Position) -> &LeafKind {
        &self.parsed.leaves[usize::from(p.loc())].kind
    }

    /// The followers of `p`, tagged with the lazy quantifiers they belong
    /// to.
    fn followers(&self, p: Position) -> Vec<Position> {
        self.tag_all(Some(p), self.follow.get(p))
    }

    /// Tag the positions that follow `p`, or that start the regex when `p`
    /// is `None`.
    ///
    /// A position inside a lazy body carries that body's tag. Every other
    /// position inherits the tag of `p`, so the tag flows from a lazy body
    /// through what follows it up to the accept positions. A position that
    /// is reached by skipping a nullable lazy body is tagged as if it left
    /// that body.
    fn tag_all(
        &self,
        p: Option<Position>,
        set: impl Iterator<Item = Position>,
    ) -> Vec<Position> {
        let set = set.collect::<Vec<_>>();
        let bodies =
            set.iter().filter_map(|&q| self.in_lazy(q)).collect::<Vec<_>>();
        set.iter()
            .map(|&q| {
                if let Some(q) = self.in_lazy(q) {
                    return q;
                }
                if let Some(p) = p.filter(|p| p.lazy() != 0) {
                    return q.with_lazy(p.lazy());
                }
                let skipped = bodies
                    .iter()
                    .find(|&&b| self.follow.get(b).any(|f| f == q));
                match skipped {
                    Some(b) => q.with_lazy(b.lazy()),
                    None => q,
                }
            })
            .collect()
    }

    /// Tag `p` with the lazy quantifier around its leaf, if there is one.
    fn in_lazy(&self, p: Position) -> Option<Position> {
        if p.is_accept() {
            return None;
        }
        let lazy = self.parsed.leaves[usize::from(p.loc())].lazy?;
        Some(p.with_lazy(lazy))
    }

    /// The bytes a position consumes, if it is a consuming position.
    fn bytes(&self, p: Position) -> Option<&ByteSet> {
        if p.is_accept() || p.is_anchor() {
            return None;
        }
        self.parsed.leaves[usize::from(p.loc())].bytes()
    }

    /// Close a set of positions over markers and known assertions, then trim
    /// and label it. For meta successors, `prev` is the source state, whose
    /// accept positions do not count again.
    fn close(
        &self,
        kernel: Vec<Position>,
        zero: bool,
        known: LookSet,
        prev: Option<&BuilderState>,
    ) -> BuilderState {
        let mut positions = BTreeSet::new();
        let mut heads = BTreeSet::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<(Position, Option<u16>, bool)> =
            kernel.into_iter().map(|p| (p, None, false)).collect();
        while let Some((p, tail, redo)) = stack.pop() {
            if !seen.insert((p, tail, redo)) {
                continue;
            }
            if p.is_accept() {
                let mut accept = p;
                if let Some(n) = tail {
                    accept = accept.with_iter(n + 1);
                }
                positions.insert(accept.ticked(redo || p.is_ticked()));
                continue;
            }
            let (tail, redo) = match *self.leaf_kind(p) {
                LeafKind::Bytes(_) => {
                    positions.insert(p);
                    continue;
                }
                LeafKind::Look(look) => {
                    if !known.contains(look) {
                        positions.insert(p);
                        continue;
                    }
                    (tail, redo)
                }
                LeafKind::Head(n) => {
                    heads.insert(n);
                    (tail, redo)
                }
                LeafKind::Tail(n) => (Some(n), redo),
                LeafKind::Redo => (tail, true),
            };
            for q in self.followers(p) {
                stack.push((q, tail, redo));
            }
        }

        // A lazy quantifier stops as soon as a match through it can accept.
        if !zero {
            let done = positions
                .iter()
                .filter(|p| p.is_accept() && p.lazy() != 0)
                .map(|p| p.lazy())
                .collect::<BTreeSet<_>>();
            if !done.is_empty() {
                positions.retain(|p| p.is_accept() || !done.contains(&p.lazy()));
            }
        }

        let accepts = positions
            .iter()
            .filter(|p| p.is_accept())
            .filter(|p| prev.map_or(true, |s| s.positions.binary_search(p).is_err()))
            .copied()
            .collect::<Vec<_>>();
        let accept = accepts.iter().map(|p| p.loc()).min().unwrap_or(0);
        let winners = accepts.iter().filter(|p| p.loc() == accept);
        let redo = accept > 0 && winners.clone().all(|p| p.is_ticked());
        let tails = winners
            .filter_map(|p| p.tail())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        BuilderState {
            positions: positions.into_iter().collect(),
            zero,
            known,
            accept,
            redo,
            heads: heads.into_iter().collect(),
            tails,
        }
    }

    /// The kinds of assertions this state still has to test, in order.
    fn looks(&self, state: &BuilderState) -> LookSet {
        let mut looks = LookSet::empty();
        for &p in state.positions.iter().filter(|p| p.is_anchor()) {
            if let LeafKind::Look(look) = *self.leaf_kind(p) {
                looks = looks.insert(look);
            }
        }
        looks
    }

    /// The state reached when `look` holds: its positions are passed, and
    /// everything else stays as it is.
    fn meta_successor(&self, state: &BuilderState, look: Look) -> BuilderState {
        let mut kernel = vec![];
        for &p in state.positions.iter() {
            let passed = p.is_anchor()
                && matches!(*self.leaf_kind(p), LeafKind::Look(l) if l == look);
            if passed {
                kernel.extend(self.followers(p));
            } else {
                kernel.push(p);
            }
        }
        self.close(kernel, state.zero, state.known.insert(look), Some(state))
    }

    /// The byte equivalence classes of the consuming positions of a state.
    fn byte_classes(&self, state: &BuilderState) -> Vec<(u8, u8)> {
        let mut classes = ByteClassSet::empty();
        for &p in state.positions.iter() {
            if let Some(set) = self.bytes(p) {
                classes.add_set(set);
            }
        }
        classes.classes()
    }

    /// The followers of all consuming positions that accept `byte`.
    fn byte_kernel(&self, state: &BuilderState, byte: u8) -> Vec<Position> {
        let mut kernel = vec![];
        for &p in state.positions.iter() {
            if self.bytes(p).map_or(false, |set| set.contains(byte)) {
                kernel.extend(self.followers(p));
            }
        }
        kernel
    }
}
