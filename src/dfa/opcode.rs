/*!
The instruction words a compiled pattern is made of.

A program is a sequence of blocks, one per DFA state, each terminated by
`HALT`. The start state's block is at offset 0. Every instruction is a single
`u32`:

| instruction | encoding |
|---|---|
| `GOTO lo-hi t` | `lo << 24 \| hi << 16 \| t` |
| `LOOK m t` | `0xFF000000 \| code(m) << 16 \| t` |
| `TAKE i` | `0xFF000000 \| i` |
| `REDO` | `0xFF00FFFF` |
| `TAIL n` | `0xFF7E0000 \| n` |
| `HEAD n` | `0xFF7F0000 \| n` |
| `HALT` | `0x00FFFFFF` |

Within a block the instructions are laid out as
`[TAKE|REDO] TAIL* HEAD* LOOK* GOTO* HALT`, with the `GOTO` ranges ascending.
*/

use crate::{
    error::{Error, Result},
    util::look::Look,
};

/// The largest 16 bit operand. As a `TAKE` operand it denotes `REDO`.
pub(crate) const IMAX: u16 = 0xFFFF;

/// The block terminator.
pub(crate) const HALT: u32 = 0x00FF_FFFF;

const META: u32 = 0xFF00_0000;
const META_MASK: u32 = 0xFF80_0000;
const TAIL: u32 = 0x7E;
const HEAD: u32 = 0x7F;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Instruction {
    /// Read a byte in `lo..=hi` and continue at `target`.
    Goto { lo: u8, hi: u8, target: u16 },
    /// Continue at `target` without reading a byte if `look` holds.
    Look { look: Look, target: u16 },
    /// Record a match of subpattern `i` ending at the current offset.
    Take(u16),
    /// Record a match of a negative pattern.
    Redo,
    /// The lookahead `n` ends here.
    Tail(u16),
    /// The lookahead `n` starts here.
    Head(u16),
    Halt,
}

impl Instruction {
    pub(crate) fn encode(self) -> u32 {
        match self {
            Instruction::Goto { lo, hi, target } => {
                u32::from(lo) << 24 | u32::from(hi) << 16 | u32::from(target)
            }
            Instruction::Look { look, target } => {
                META | u32::from(look.as_code()) << 16 | u32::from(target)
            }
            Instruction::Take(i) => META | u32::from(i),
            Instruction::Redo => META | u32::from(IMAX),
            Instruction::Tail(n) => META | TAIL << 16 | u32::from(n),
            Instruction::Head(n) => META | HEAD << 16 | u32::from(n),
            Instruction::Halt => HALT,
        }
    }

    /// Decode a word, or return `None` if it is not a valid instruction.
    pub(crate) fn decode(word: u32) -> Option<Instruction> {
        if word == HALT {
            return Some(Instruction::Halt);
        }
        let operand = word as u16;
        if is_meta(word) {
            let code = (word >> 16) & 0x7F;
            return match code {
                0 if operand == IMAX => Some(Instruction::Redo),
                0 if operand > 0 => Some(Instruction::Take(operand)),
                0 => None,
                TAIL => Some(Instruction::Tail(operand)),
                HEAD => Some(Instruction::Head(operand)),
                _ => {
                    let look = Look::from_code(code as u8)?;
                    Some(Instruction::Look { look, target: operand })
                }
            };
        }
        let (lo, hi) = ((word >> 24) as u8, (word >> 16) as u8);
        if lo > hi || operand == IMAX {
            return None;
        }
        Some(Instruction::Goto { lo, hi, target: operand })
    }

    /// The block offset this instruction jumps to, if any.
    pub(crate) fn target(self) -> Option<u16> {
        match self {
            Instruction::Goto { target, .. } | Instruction::Look { target, .. } => {
                Some(target)
            }
            _ => None,
        }
    }
}

/// Returns true when the word is a meta instruction, i.e. anything but a
/// `GOTO` or `HALT`.
pub(crate) fn is_meta(word: u32) -> bool {
    word & META_MASK == META
}

/// Node and edge counts of a table.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Stats {
    pub(crate) nodes: usize,
    pub(crate) edges: usize,
}

/// A read-only view of a program's words.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Table<'a>(pub(crate) &'a [u32]);

impl<'a> Table<'a> {
    /// Check that every word decodes, that every jump lands on the start of
    /// a block and that the last block is terminated.
    pub(crate) fn validate(self) -> Result<()> {
        let words = self.0;
        if words.last() != Some(&HALT) {
            return Err(Error::table(words.len()));
        }
        let mut starts = vec![false; words.len()];
        let mut block = true;
        let mut decoded = Vec::with_capacity(words.len());
        for (offset, &word) in words.iter().enumerate() {
            starts[offset] = block;
            let inst = Instruction::decode(word).ok_or_else(|| Error::table(offset))?;
            block = inst == Instruction::Halt;
            decoded.push(inst);
        }
        for (offset, inst) in decoded.into_iter().enumerate() {
            if let Some(target) = inst.target() {
                let target = usize::from(target);
                if target >= words.len() || !starts[target] {
                    return Err(Error::table(offset));
                }
            }
        }
        Ok(())
    }

    /// Count the blocks and the edges of the table by decoding it.
    pub(crate) fn stats(self) -> Stats {
        let mut stats = Stats::default();
        for &word in self.0.iter() {
            match Instruction::decode(word) {
                Some(Instruction::Halt) => stats.nodes += 1,
                Some(Instruction::Goto { .. }) | Some(Instruction::Look { .. }) => {
                    stats.edges += 1
                }
                _ => {}
            }
        }
        stats
    }

    /// The instructions of the block at `offset`, up to and including its
    /// `HALT`.
    pub(crate) fn block(self, offset: usize) -> impl Iterator<Item = Instruction> + 'a {
        let words = self.0.get(offset..).unwrap_or(&[]);
        let mut done = false;
        words.iter().map_while(move |&w| {
            if done {
                return None;
            }
            let inst = Instruction::decode(w)?;
            done = inst == Instruction::Halt;
            Some(inst)
        })
    }

    /// The offsets of all blocks, in order.
    pub(crate) fn blocks(self) -> Vec<usize> {
        let mut starts = vec![];
        let mut block = true;
        for (offset, &word) in self.0.iter().enumerate() {
            if block {
                starts.push(offset);
            }
            block = word == HALT;
        }
        starts
    }
}
