/*!
Computes the positions of a parsed regex and the follow relation between
them.

This is the classic construction of a DFA directly from a regex: every leaf
occurrence is a position, and `follow(p)` is the set of positions that can
come right after `p` in some match. Bounded repeats are unrolled, with every
copy after the first getting its own iteration index, so that the copies of a
leaf are distinct positions.
*/

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::{Error, Reason, Result},
    syntax::ast::{Ast, Parsed, Repeat},
};

pub(crate) use self::position::Position;

mod position;

/// The start positions and follow relation of a regex.
#[derive(Clone, Debug)]
pub(crate) struct Follow {
    /// The positions a match can begin with, including the accept position
    /// of every subpattern that matches the empty string.
    pub(crate) start: BTreeSet<Position>,
    map: BTreeMap<Position, BTreeSet<Position>>,
}

impl Follow {
    pub(crate) fn build(parsed: &Parsed) -> Result<Follow> {
        let mut builder = Builder { parsed, map: BTreeMap::new(), iters: 0 };
        let mut start = BTreeSet::new();
        for (i, alt) in parsed.alternatives.iter().enumerate() {
            let summary = builder.walk(&alt.ast, 0)?;
            let accept = Position::accept((i + 1) as u16);
            for &p in summary.last.iter() {
                builder.map.entry(p.pos()).or_default().insert(accept);
            }
            start.extend(summary.first);
            if summary.nullable {
                start.insert(accept);
            }
        }
        trace!(
            "follow: {} start positions, {} followed positions, {} iterations",
            start.len(),
            builder.map.len(),
            builder.iters,
        );
        Ok(Follow { start, map: builder.map })
    }

    /// The positions following `p`, ignoring its flags and lazy tag.
    pub(crate) fn get(&self, p: Position) -> impl Iterator<Item = Position> + '_ {
        self.map.get(&p.pos()).into_iter().flat_map(|set| set.iter().copied())
    }
}

/// The first and last positions of a subexpression and whether it matches
/// the empty string.
struct Summary {
    first: BTreeSet<Position>,
    last: BTreeSet<Position>,
    nullable: bool,
}

impl Summary {
    fn empty() -> Summary {
        Summary { first: BTreeSet::new(), last: BTreeSet::new(), nullable: true }
    }
}

struct Builder<'a> {
    parsed: &'a Parsed,
    map: BTreeMap<Position, BTreeSet<Position>>,
    iters: usize,
}

impl<'a> Builder<'a> {
    fn walk(&mut self, ast: &Ast, iter: u16) -> Result<Summary> {
        match *ast {
            Ast::Empty => Ok(Summary::empty()),
            Ast::Leaf(i) => {
                let leaf = &self.parsed.leaves[i];
                let p = Position::leaf(i as u16)
                    .with_iter(iter)
                    .anchor(leaf.is_zero_width());
                let set: BTreeSet<Position> = Some(p).into_iter().collect();
                Ok(Summary { first: set.clone(), last: set, nullable: false })
            }
            Ast::Concat(ref items) => {
                let mut acc = Summary::empty();
                for item in items.iter() {
                    let next = self.walk(item, iter)?;
                    acc = self.concat(acc, next);
                }
                Ok(acc)
            }
            Ast::Alternate(ref alts) => {
                let mut acc = Summary {
                    first: BTreeSet::new(),
                    last: BTreeSet::new(),
                    nullable: false,
                };
                for alt in alts.iter() {
                    let next = self.walk(alt, iter)?;
                    acc.first.extend(next.first);
                    acc.last.extend(next.last);
                    acc.nullable |= next.nullable;
                }
                Ok(acc)
            }
            Ast::Repeat(ref rep) => self.repeat(rep, iter),
        }
    }

    /// Unroll `X{min,max}` into `min` mandatory copies followed by either a
    /// looping copy (no maximum) or `max - min` optional copies.
    fn repeat(&mut self, rep: &Repeat, iter: u16) -> Result<Summary> {
        let mut acc = Summary::empty();
        let mut copies = 0;
        match rep.max {
            None => {
                for _ in 1..rep.min {
                    let next = self.copy(rep, iter, &mut copies)?;
                    acc = self.concat(acc, next);
                }
                let mut next = self.copy(rep, iter, &mut copies)?;
                for &p in next.last.iter() {
                    let entry = self.map.entry(p.pos()).or_default();
                    entry.extend(next.first.iter().copied());
                }
                next.nullable |= rep.min == 0;
                acc = self.concat(acc, next);
            }
            Some(max) => {
                for _ in 0..rep.min {
                    let next = self.copy(rep, iter, &mut copies)?;
                    acc = self.concat(acc, next);
                }
                for _ in rep.min..max {
                    let mut next = self.copy(rep, iter, &mut copies)?;
                    next.nullable = true;
                    acc = self.concat(acc, next);
                }
            }
        }
        Ok(acc)
    }

    /// Walk one copy of a repeated expression. Only the first copy reuses
    /// the iteration of the repeat itself.
    fn copy(
        &mut self,
        rep: &Repeat,
        iter: u16,
        copies: &mut u32,
    ) -> Result<Summary> {
        let it = if *copies == 0 { iter } else { self.fresh(rep.offset)? };
        *copies += 1;
        self.walk(&rep.ast, it)
    }

    fn concat(&mut self, a: Summary, b: Summary) -> Summary {
        for &p in a.last.iter() {
            let entry = self.map.entry(p.pos()).or_default();
            entry.extend(b.first.iter().copied());
        }
        let mut first = a.first;
        if a.nullable {
            first.extend(b.first.iter().copied());
        }
        let mut last = b.last;
        if b.nullable {
            last.extend(a.last);
        }
        Summary { first, last, nullable: a.nullable && b.nullable }
    }

    fn fresh(&mut self, offset: usize) -> Result<u16> {
        self.iters += 1;
        if self.iters > 0xFFFF {
            return Err(Error::malformed(offset, Reason::ExceedsLimits));
        }
        Ok(self.iters as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{parse, Config};

    fn build(regex: &str) -> Follow {
        let parsed = parse(regex, &Config::new()).unwrap();
        Follow::build(&parsed).unwrap()
    }

    fn follows(follow: &Follow, p: Position) -> Vec<Position> {
        follow.get(p).collect()
    }

    #[test]
    fn concat_and_star() {
        // a b* c
        let follow = build("ab*c");
        let (a, b, c) = (Position::leaf(0), Position::leaf(1), Position::leaf(2));
        assert_eq!(vec![a], follow.start.iter().copied().collect::<Vec<_>>());
        assert_eq!(vec![b, c], follows(&follow, a));
        assert_eq!(vec![b, c], follows(&follow, b));
        assert_eq!(vec![Position::accept(1)], follows(&follow, c));
    }

    #[test]
    fn nullable_alternatives() {
        let follow = build("a?|b");
        let start = follow.start.iter().copied().collect::<Vec<_>>();
        assert_eq!(
            vec![Position::leaf(0), Position::leaf(1), Position::accept(1)],
            start,
        );
    }

    #[test]
    fn bounded_repeat_copies() {
        // a{2,3}: copies at iterations 0, 1 and 2, the last one optional.
        let follow = build("a{2,3}");
        let a0 = Position::leaf(0);
        let a1 = a0.with_iter(1);
        let a2 = a0.with_iter(2);
        assert_eq!(vec![a1], follows(&follow, a0));
        assert_eq!(vec![a2, Position::accept(1)], follows(&follow, a1));
        assert_eq!(vec![Position::accept(1)], follows(&follow, a2));
    }

    #[test]
    fn unbounded_repeat_copies() {
        // a{2,}: one plain copy then a looping copy.
        let follow = build("a{2,}");
        let a0 = Position::leaf(0);
        let a1 = a0.with_iter(1);
        assert_eq!(vec![a1], follows(&follow, a0));
        assert_eq!(vec![a1, Position::accept(1)], follows(&follow, a1));
    }

    #[test]
    fn anchors_are_positions() {
        let follow = build(r"\ba");
        let b = Position::leaf(0).anchor(true);
        assert_eq!(vec![b], follow.start.iter().copied().collect::<Vec<_>>());
        assert_eq!(vec![Position::leaf(1)], follows(&follow, b));
    }

    #[test]
    fn iteration_limit() {
        let parsed = parse("(a{1000}){1000}", &Config::new()).unwrap();
        let err = Follow::build(&parsed).unwrap_err();
        assert_eq!(Some(Reason::ExceedsLimits), err.reason());
    }
}
