use core::fmt;

/// A position in a regex: an occurrence of a leaf in a particular copy of
/// the repeats around it, or the accept marker of a subpattern.
///
/// A position packs its identity and its flags into a single `u64`:
///
/// * bits 0-15 hold the location: a leaf index, or the subpattern index of
///   an accept position.
/// * bits 16-31 hold the iteration of the repeat copy the leaf occurs in. For
///   accept positions they hold one more than the lookahead that closes the
///   subpattern, or 0.
/// * bit 44 marks an accept position reached through a negative pattern.
/// * bit 46 marks a zero-width position.
/// * bit 47 marks an accept position.
/// * bits 48-63 hold the lazy quantifier the position is inside, or 0.
///
/// Positions order by their raw value, so sets of positions have a
/// canonical order.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct Position(u64);

impl Position {
    const ITER_SHIFT: u32 = 16;
    const TICKED: u64 = 1 << 44;
    const ANCHOR: u64 = 1 << 46;
    const ACCEPT: u64 = 1 << 47;
    const LAZY_SHIFT: u32 = 48;

    /// The position of a leaf.
    pub(crate) fn leaf(loc: u16) -> Position {
        Position(u64::from(loc))
    }

    /// The accept position of the subpattern with the given index.
    pub(crate) fn accept(index: u16) -> Position {
        Position(Position::ACCEPT | u64::from(index))
    }

    /// The leaf index or subpattern index.
    pub(crate) fn loc(self) -> u16 {
        self.0 as u16
    }

    pub(crate) fn iter(self) -> u16 {
        (self.0 >> Position::ITER_SHIFT) as u16
    }

    pub(crate) fn with_iter(self, iter: u16) -> Position {
        let cleared = self.0 & !(0xFFFF << Position::ITER_SHIFT);
        Position(cleared | (u64::from(iter) << Position::ITER_SHIFT))
    }

    /// The position without its flags and lazy tag. This is how positions
    /// are looked up in the follow relation.
    pub(crate) fn pos(self) -> Position {
        Position(self.0 & 0xFFFF_FFFF)
    }

    pub(crate) fn is_accept(self) -> bool {
        self.0 & Position::ACCEPT != 0
    }

    pub(crate) fn is_anchor(self) -> bool {
        self.0 & Position::ANCHOR != 0
    }

    pub(crate) fn anchor(self, yes: bool) -> Position {
        self.flag(Position::ANCHOR, yes)
    }

    pub(crate) fn is_ticked(self) -> bool {
        self.0 & Position::TICKED != 0
    }

    pub(crate) fn ticked(self, yes: bool) -> Position {
        self.flag(Position::TICKED, yes)
    }

    /// The lazy quantifier this position is inside or was reached through,
    /// or 0.
    pub(crate) fn lazy(self) -> u16 {
        (self.0 >> Position::LAZY_SHIFT) as u16
    }

    pub(crate) fn with_lazy(self, lazy: u16) -> Position {
        let cleared = self.0 & !(0xFFFF << Position::LAZY_SHIFT);
        Position(cleared | (u64::from(lazy) << Position::LAZY_SHIFT))
    }

    /// For an accept position, the lookahead that closes its subpattern.
    pub(crate) fn tail(self) -> Option<u16> {
        self.iter().checked_sub(1)
    }

    fn flag(self, bit: u64, yes: bool) -> Position {
        if yes {
            Position(self.0 | bit)
        } else {
            Position(self.0 & !bit)
        }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_accept() {
            write!(f, "#{}", self.loc())?;
            if let Some(tail) = self.tail() {
                write!(f, "/{}", tail)?;
            }
            if self.is_ticked() {
                write!(f, "^")?;
            }
        } else {
            write!(f, "{}", self.loc())?;
            if self.iter() > 0 {
                write!(f, ".{}", self.iter())?;
            }
            if self.is_anchor() {
                write!(f, "@")?;
            }
        }
        if self.lazy() > 0 {
            write!(f, "?{}", self.lazy())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let p = Position::leaf(7).with_iter(3).anchor(true).with_lazy(2);
        assert_eq!(7, p.loc());
        assert_eq!(3, p.iter());
        assert_eq!(2, p.lazy());
        assert!(p.is_anchor());
        assert!(!p.is_accept());
        assert_eq!(Position::leaf(7).with_iter(3), p.pos());
        assert_eq!(p, p.anchor(false).anchor(true));
    }

    #[test]
    fn accept() {
        let p = Position::accept(4);
        assert!(p.is_accept());
        assert_eq!(4, p.loc());
        assert_eq!(None, p.tail());
        let p = p.with_iter(1).ticked(true);
        assert_eq!(Some(0), p.tail());
        assert!(p.is_ticked());
        assert_eq!("#4/0^", format!("{:?}", p));
        assert_eq!("#4/0^?2", format!("{:?}", p.with_lazy(2)));
        assert_eq!(4, p.with_lazy(2).loc());
    }

    #[test]
    fn order() {
        // Tagged positions order after untagged ones and accept positions
        // after leaf positions.
        assert!(Position::leaf(9) < Position::leaf(1).with_lazy(1));
        assert!(Position::leaf(9).with_iter(9) < Position::accept(0));
    }
}
