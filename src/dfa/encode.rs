use crate::{
    dfa::{
        opcode::{Instruction, IMAX},
        Dfa,
    },
    error::{Error, Reason, Result},
};

/// The largest number of words in a table. Block offsets must stay below
/// `IMAX`, which is reserved.
const WORD_LIMIT: usize = (IMAX - 1) as usize;

/// Assemble a DFA into instruction words.
///
/// Blocks are emitted in state order with targets written as state ids. Once
/// every block offset is known, the recorded jumps are patched to point at
/// block offsets instead.
pub(crate) fn assemble(dfa: &Dfa) -> Result<Vec<u32>> {
    let mut words: Vec<u32> = vec![];
    let mut offsets = Vec::with_capacity(dfa.states.len());
    let mut patches = vec![];
    for state in dfa.states.iter() {
        offsets.push(words.len());
        if state.accept > 0 {
            let take = if state.redo {
                Instruction::Redo
            } else {
                Instruction::Take(state.accept)
            };
            words.push(take.encode());
        }
        for &n in state.tails.iter() {
            words.push(Instruction::Tail(n).encode());
        }
        for &n in state.heads.iter() {
            words.push(Instruction::Head(n).encode());
        }
        for &(look, target) in state.looks.iter() {
            patches.push(words.len());
            let target = target as u16;
            words.push(Instruction::Look { look, target }.encode());
        }
        for &(lo, hi, target) in state.ranges.iter() {
            patches.push(words.len());
            let target = target as u16;
            words.push(Instruction::Goto { lo, hi, target }.encode());
        }
        words.push(Instruction::Halt.encode());
        if words.len() > WORD_LIMIT {
            return Err(Error::malformed(0, Reason::ExceedsLimits));
        }
    }
    for &i in patches.iter() {
        let id = (words[i] & 0xFFFF) as usize;
        words[i] = (words[i] & !0xFFFF) | offsets[id] as u32;
    }
    debug!(
        "assembled {} states into {} words ({} jumps)",
        dfa.states.len(),
        words.len(),
        patches.len(),
    );
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dfa::{opcode::Table, State},
        util::look::Look,
    };

    #[test]
    fn block_layout() {
        let dfa = Dfa {
            states: vec![
                State {
                    looks: vec![(Look::WordStart, 2)],
                    ranges: vec![(b'a', b'c', 1), (b'x', b'x', 2)],
                    ..State::default()
                },
                State {
                    accept: 1,
                    tails: vec![0],
                    heads: vec![1],
                    ..State::default()
                },
                State { accept: 2, redo: true, ..State::default() },
            ],
            reachable: vec![true, true],
        };
        let words = assemble(&dfa).unwrap();
        let expected = vec![
            Instruction::Look { look: Look::WordStart, target: 8 },
            Instruction::Goto { lo: b'a', hi: b'c', target: 4 },
            Instruction::Goto { lo: b'x', hi: b'x', target: 8 },
            Instruction::Halt,
            Instruction::Take(1),
            Instruction::Tail(0),
            Instruction::Head(1),
            Instruction::Halt,
            Instruction::Redo,
            Instruction::Halt,
        ];
        let got = words
            .iter()
            .map(|&w| Instruction::decode(w).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(expected, got);
        assert!(Table(&words).validate().is_ok());
        assert_eq!(3, Table(&words).stats().nodes);
        assert_eq!(dfa.edges(), Table(&words).stats().edges);
    }
}
