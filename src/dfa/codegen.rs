/*!
Printing of instruction tables as Rust source and as Graphviz graphs.
*/

use std::io::{self, Write};

use crate::{
    dfa::opcode::{Instruction, Table},
    util::escape::dot_byte,
};

/// Write the table as a Rust `static` array named `REFLEX_CODE_<NAME>`.
pub(crate) fn write_table<W: Write>(
    mut wtr: W,
    name: &str,
    words: &[u32],
) -> io::Result<()> {
    writeln!(
        wtr,
        "pub static REFLEX_CODE_{}: [u32; {}] = [",
        name.to_uppercase(),
        words.len(),
    )?;
    for chunk in words.chunks(6) {
        write!(wtr, "   ")?;
        for &word in chunk.iter() {
            write!(wtr, " 0x{:08X},", word)?;
        }
        writeln!(wtr)?;
    }
    writeln!(wtr, "];")?;
    Ok(())
}

/// Write the table as a Rust function named `reflex_code_<name>` that
/// drives an `Fsm` exactly the way the table interpreter does.
pub(crate) fn write_fsm<W: Write>(
    mut wtr: W,
    name: &str,
    words: &[u32],
) -> io::Result<()> {
    let table = Table(words);
    writeln!(
        wtr,
        "pub fn reflex_code_{}(m: &mut dyn regex_scanner::Fsm) {{",
        name.to_lowercase(),
    )?;
    writeln!(wtr, "    #[allow(unused_imports)]")?;
    writeln!(wtr, "    use regex_scanner::Look;")?;
    writeln!(wtr, "    let mut pc: usize = 0;")?;
    writeln!(wtr, "    loop {{")?;
    writeln!(wtr, "        pc = match pc {{")?;
    for offset in table.blocks() {
        writeln!(wtr, "            {} => {{", offset)?;
        let mut looks = vec![];
        let mut ranges = vec![];
        for inst in table.block(offset) {
            match inst {
                Instruction::Take(i) => writeln!(wtr, "                m.take({});", i)?,
                Instruction::Redo => writeln!(wtr, "                m.redo();")?,
                Instruction::Tail(n) => writeln!(wtr, "                m.tail({});", n)?,
                Instruction::Head(n) => writeln!(wtr, "                m.head({});", n)?,
                Instruction::Look { look, target } => looks.push((look, target)),
                Instruction::Goto { lo, hi, target } => ranges.push((lo, hi, target)),
                Instruction::Halt => {}
            }
        }
        let mut indent = "                ";
        if !looks.is_empty() {
            for (i, (look, target)) in looks.iter().enumerate() {
                let keyword = if i == 0 { "if" } else { "} else if" };
                writeln!(
                    wtr,
                    "                {} m.look(Look::{:?}) {{",
                    keyword, look,
                )?;
                writeln!(wtr, "                    {}", target)?;
            }
            writeln!(wtr, "                }} else {{")?;
            indent = "                    ";
        }
        if ranges.is_empty() {
            writeln!(wtr, "{}let _ = m.next_byte();", indent)?;
            writeln!(wtr, "{}return;", indent)?;
        } else {
            writeln!(wtr, "{}match m.next_byte() {{", indent)?;
            for &(lo, hi, target) in ranges.iter() {
                if lo == hi {
                    writeln!(wtr, "{}    Some(0x{:02X}) => {},", indent, lo, target)?;
                } else {
                    writeln!(
                        wtr,
                        "{}    Some(0x{:02X}..=0x{:02X}) => {},",
                        indent, lo, hi, target,
                    )?;
                }
            }
            writeln!(wtr, "{}    _ => return,", indent)?;
            writeln!(wtr, "{}}}", indent)?;
        }
        if !looks.is_empty() {
            writeln!(wtr, "                }}")?;
        }
        writeln!(wtr, "            }}")?;
    }
    writeln!(wtr, "            _ => return,")?;
    writeln!(wtr, "        }};")?;
    writeln!(wtr, "    }}")?;
    writeln!(wtr, "}}")?;
    Ok(())
}

/// Write the table as a Graphviz digraph. Accepting nodes are drawn with a
/// double border and meta edges are dashed.
pub(crate) fn write_graphviz<W: Write>(
    mut wtr: W,
    name: &str,
    words: &[u32],
) -> io::Result<()> {
    let table = Table(words);
    writeln!(wtr, "digraph {} {{", name)?;
    writeln!(wtr, "  rankdir=LR;")?;
    writeln!(wtr, "  concentrate=true;")?;
    writeln!(wtr, "  node [fontname=\"ArialNarrow\"];")?;
    writeln!(wtr, "  edge [fontname=\"Courier\"];")?;
    writeln!(wtr, "  init [root=true,peripheries=0,label=\"{}\"];", name)?;
    writeln!(wtr, "  init -> N0;")?;
    for offset in table.blocks() {
        let mut label = offset.to_string();
        let mut accepting = false;
        let mut edges = vec![];
        for inst in table.block(offset) {
            match inst {
                Instruction::Take(i) => {
                    accepting = true;
                    label.push_str(&format!("\\n[{}]", i));
                }
                Instruction::Redo => {
                    accepting = true;
                    label.push_str("\\n[redo]");
                }
                Instruction::Tail(n) => label.push_str(&format!("\\n{}>", n)),
                Instruction::Head(n) => label.push_str(&format!("\\n<{}", n)),
                Instruction::Look { look, target } => {
                    let text = look.as_str().replace('\\', "\\\\");
                    edges.push((target, text, true));
                }
                Instruction::Goto { lo, hi, target } => {
                    let text = if lo == hi {
                        dot_byte(lo)
                    } else {
                        format!("{}-{}", dot_byte(lo), dot_byte(hi))
                    };
                    edges.push((target, text, false));
                }
                Instruction::Halt => {}
            }
        }
        let peripheries = if accepting { 2 } else { 1 };
        writeln!(
            wtr,
            "  N{} [label=\"{}\",peripheries={}];",
            offset, label, peripheries,
        )?;
        for (target, text, meta) in edges {
            let style = if meta { ",style=dashed" } else { "" };
            writeln!(
                wtr,
                "  N{} -> N{} [label=\"{}\"{}];",
                offset, target, text, style,
            )?;
        }
    }
    writeln!(wtr, "}}")?;
    Ok(())
}
