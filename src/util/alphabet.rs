/// A simple set of bytes that is reasonably cheap to copy and allocation free.
///
/// Every consuming leaf of a parsed regex carries one of these.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub(crate) struct ByteSet {
    bits: [u128; 2],
}

impl ByteSet {
    /// Create an empty set of bytes.
    pub(crate) fn empty() -> ByteSet {
        ByteSet { bits: [0; 2] }
    }

    /// Create a set with a single byte.
    pub(crate) fn single(byte: u8) -> ByteSet {
        let mut set = ByteSet::empty();
        set.add(byte);
        set
    }

    /// Create a set from an inclusive range of bytes.
    pub(crate) fn range(start: u8, end: u8) -> ByteSet {
        let mut set = ByteSet::empty();
        set.add_all(start, end);
        set
    }

    /// Add a byte to this set.
    ///
    /// If the given byte already belongs to this set, then this is a no-op.
    pub(crate) fn add(&mut self, byte: u8) {
        let bucket = byte / 128;
        let bit = byte % 128;
        self.bits[bucket as usize] |= 1 << bit;
    }

    /// Add an inclusive range of bytes.
    pub(crate) fn add_all(&mut self, start: u8, end: u8) {
        for b in start..=end {
            self.add(b);
        }
    }

    /// Add the other case of every ASCII letter in this set.
    pub(crate) fn fold_ascii_case(&mut self) {
        for b in b'A'..=b'Z' {
            if self.contains(b) || self.contains(b.to_ascii_lowercase()) {
                self.add(b);
                self.add(b.to_ascii_lowercase());
            }
        }
    }

    /// Return true if and only if the given byte is in this set.
    pub(crate) fn contains(&self, byte: u8) -> bool {
        let bucket = byte / 128;
        let bit = byte % 128;
        self.bits[bucket as usize] & (1 << bit) > 0
    }

    /// Returns an iterator over all contiguous ranges of bytes in this set.
    pub(crate) fn iter_ranges(&self) -> ByteSetRangeIter<'_> {
        ByteSetRangeIter { set: self, b: 0 }
    }

    /// Return true if and only if this set is empty.
    pub(crate) fn is_empty(&self) -> bool {
        self.bits == [0, 0]
    }

    /// Return the number of bytes in this set.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        (self.bits[0].count_ones() + self.bits[1].count_ones()) as usize
    }
}

impl core::fmt::Debug for ByteSet {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use crate::util::escape::DebugByte;

        let mut fmtd = f.debug_set();
        for (start, end) in self.iter_ranges() {
            if start == end {
                fmtd.entry(&DebugByte(start));
            } else {
                fmtd.entry(&format_args!(
                    "{:?}-{:?}",
                    DebugByte(start),
                    DebugByte(end)
                ));
            }
        }
        fmtd.finish()
    }
}

#[derive(Debug)]
pub(crate) struct ByteSetRangeIter<'a> {
    set: &'a ByteSet,
    b: usize,
}

impl<'a> Iterator for ByteSetRangeIter<'a> {
    type Item = (u8, u8);

    fn next(&mut self) -> Option<(u8, u8)> {
        while self.b <= 255 {
            let start = self.b as u8;
            self.b += 1;
            if !self.set.contains(start) {
                continue;
            }

            let mut end = start;
            while self.b <= 255 && self.set.contains(self.b as u8) {
                end = self.b as u8;
                self.b += 1;
            }
            return Some((start, end));
        }
        None
    }
}

/// A partitioning of all bytes into contiguous equivalence classes.
///
/// While a DFA state is built, the byte sets of all of its consuming
/// positions are added to one of these. Every byte in a resulting class
/// selects exactly the same positions, so a single successor per class is
/// enough. Like the classes used elsewhere, these are not minimal: `[ac]`
/// yields the classes for `a`, `b` and `c` separately.
#[derive(Clone, Debug)]
pub(crate) struct ByteClassSet(ByteSet);

impl ByteClassSet {
    /// Create a new set of byte classes where all bytes are part of the same
    /// equivalence class.
    pub(crate) fn empty() -> Self {
        ByteClassSet(ByteSet::empty())
    }

    /// Indicate the the range of byte given (inclusive) can discriminate a
    /// match between it and all other bytes outside of the range.
    pub(crate) fn set_range(&mut self, start: u8, end: u8) {
        debug_assert!(start <= end);
        if start > 0 {
            self.0.add(start - 1);
        }
        self.0.add(end);
    }

    /// Add the contiguous ranges in the set given to this byte class set.
    pub(crate) fn add_set(&mut self, set: &ByteSet) {
        for (start, end) in set.iter_ranges() {
            self.set_range(start, end);
        }
    }

    /// Return the inclusive byte range of every equivalence class, in
    /// ascending order.
    pub(crate) fn classes(&self) -> Vec<(u8, u8)> {
        let mut classes = vec![];
        let mut start = 0u8;
        for b in 0..=255u8 {
            if b == 255 || self.0.contains(b) {
                classes.push((start, b));
                start = b.wrapping_add(1);
            }
        }
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_classes() {
        let mut set = ByteClassSet::empty();
        set.set_range(b'a', b'z');
        assert_eq!(
            set.classes(),
            vec![(0, b'a' - 1), (b'a', b'z'), (b'z' + 1, 255)],
        );

        let mut set = ByteClassSet::empty();
        set.set_range(0, 2);
        set.set_range(4, 6);
        assert_eq!(set.classes(), vec![(0, 2), (3, 3), (4, 6), (7, 255)]);
    }

    #[test]
    fn full_byte_classes() {
        let mut set = ByteClassSet::empty();
        for i in 0..256u16 {
            set.set_range(i as u8, i as u8);
        }
        assert_eq!(set.classes().len(), 256);
        assert_eq!(ByteClassSet::empty().classes(), vec![(0, 255)]);
    }

    #[test]
    fn classes_from_sets() {
        let mut set = ByteClassSet::empty();
        set.add_set(&ByteSet::range(b'b', b'd'));
        let mut gm = ByteSet::range(b'g', b'm');
        gm.add(b'z');
        set.add_set(&gm);
        assert_eq!(
            set.classes(),
            vec![
                (0, b'a'),
                (b'b', b'd'),
                (b'e', b'f'),
                (b'g', b'm'),
                (b'n', b'y'),
                (b'z', b'z'),
                (b'{', 255),
            ],
        );
    }

    #[test]
    fn set_ranges() {
        let mut set = ByteSet::empty();
        set.add_all(b'0', b'9');
        set.add(b'_');
        set.add(255);
        let ranges = set.iter_ranges().collect::<Vec<_>>();
        assert_eq!(ranges, vec![(b'0', b'9'), (b'_', b'_'), (255, 255)]);
        assert!(set.contains(b'5'));
        assert!(!set.contains(b'a'));

        let mut set = ByteSet::single(b'q');
        set.fold_ascii_case();
        assert!(set.contains(b'Q'));
        let ranges = set.iter_ranges().collect::<Vec<_>>();
        assert_eq!(ranges, vec![(b'Q', b'Q'), (b'q', b'q')]);
    }
}
