use crate::{dfa::opcode::Instruction, util::look::Look};

/// The runtime interface of a compiled program.
///
/// Both the table interpreter and generated FSM code drive a matcher
/// through this trait. A program calls the actions of the state it is in,
/// then tests the state's assertions in order, and finally reads the next
/// byte to pick a transition. It returns when no transition applies.
pub trait Fsm {
    /// Record a match of subpattern `index` ending at the current offset.
    fn take(&mut self, index: u16);
    /// Record a match of a negative pattern ending at the current offset.
    fn redo(&mut self);
    /// Remember the current offset as the start of lookahead `lookahead`.
    fn head(&mut self, lookahead: u16);
    /// End the match where lookahead `lookahead` started.
    fn tail(&mut self, lookahead: u16);
    /// Returns true when the assertion holds at the current offset.
    fn look(&mut self, look: Look) -> bool;
    /// Read the next byte, or `None` at the end of the input.
    fn next_byte(&mut self) -> Option<u8>;
}

/// Generated FSM code, as written by `Pattern::write_fsm`.
pub type FsmCode = fn(&mut dyn Fsm);

/// Run an instruction table. The table must be valid.
pub(crate) fn execute(words: &[u32], m: &mut dyn Fsm) {
    let mut pc = 0;
    'blocks: loop {
        let mut read = false;
        let mut byte = None;
        loop {
            let inst = match words.get(pc).and_then(|&w| Instruction::decode(w)) {
                Some(inst) => inst,
                None => return,
            };
            pc += 1;
            match inst {
                Instruction::Take(i) => m.take(i),
                Instruction::Redo => m.redo(),
                Instruction::Tail(n) => m.tail(n),
                Instruction::Head(n) => m.head(n),
                Instruction::Look { look, target } => {
                    if m.look(look) {
                        pc = usize::from(target);
                        continue 'blocks;
                    }
                }
                Instruction::Goto { lo, hi, target } => {
                    if !read {
                        read = true;
                        byte = m.next_byte();
                    }
                    match byte {
                        None => return,
                        // Ranges ascend, so no later range can match.
                        Some(b) if b < lo => return,
                        Some(b) if b <= hi => {
                            pc = usize::from(target);
                            continue 'blocks;
                        }
                        Some(_) => {}
                    }
                }
                Instruction::Halt => {
                    if !read {
                        let _ = m.next_byte();
                    }
                    return;
                }
            }
        }
    }
}
