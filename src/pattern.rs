use std::{
    borrow::Cow,
    fmt,
    fs::File,
    io::{self, BufWriter},
    ops::Range,
    time::{Duration, Instant},
};

use crate::{
    dfa::{
        codegen,
        encode,
        opcode::{Instruction, Table},
        Determinizer,
    },
    error::{Diagnostic, Result},
    follow::Follow,
    matcher::FsmCode,
    syntax::{self, Config},
};

/// The longest literal prefix used to speed up `find`.
const PREFIX_LIMIT: usize = 255;

/// A compiled pattern.
///
/// A pattern is a regex made of one or more subpatterns (its top-level
/// alternatives), compiled into a DFA program. A matcher reports which
/// subpattern matched as a 1-based index, with earlier subpatterns taking
/// priority over later ones when both match the same text.
///
/// A pattern is never mutated once built, so it can be shared between any
/// number of matchers and threads, usually through an `Arc<Pattern>`.
///
/// # Example
///
/// ```
/// use regex_scanner::Pattern;
///
/// # fn example() -> Result<(), regex_scanner::Error> {
/// let pat = Pattern::new(r"[a-z]+|[0-9]+|\s")?;
/// assert_eq!(3, pat.size());
/// assert_eq!("[0-9]+", pat.subpattern(2));
/// assert!(pat.reachable(3));
/// # Ok(()) }; example().unwrap()
/// ```
#[derive(Clone, Debug)]
pub struct Pattern {
    regex: String,
    config: Config,
    program: Program,
    spans: Vec<Range<usize>>,
    reachable: Vec<bool>,
    lookaheads: usize,
    prefix: Vec<u8>,
    stats: Stats,
    diagnostics: Vec<Diagnostic>,
}

/// The executable form of a pattern.
#[derive(Clone)]
pub(crate) enum Program {
    /// Instruction words, interpreted by the matcher.
    Table(Cow<'static, [u32]>),
    /// Generated code that drives the matcher directly.
    Fsm(FsmCode),
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Program::Table(ref words) => {
                f.debug_tuple("Table").field(&words.len()).finish()
            }
            Program::Fsm(_) => f.debug_tuple("Fsm").finish(),
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Stats {
    nodes: usize,
    edges: usize,
    words: usize,
    parse_time: Duration,
    nodes_time: Duration,
    edges_time: Duration,
    words_time: Duration,
}

impl Pattern {
    /// Compile a regex with the default configuration.
    pub fn new(regex: &str) -> Result<Pattern> {
        Builder::new().build(regex)
    }

    /// Compile a regex with an options string, such as `"imx"` or
    /// `"e=%;n=lexer"`. See [`Config`] for the options.
    pub fn compile(regex: &str, options: &str) -> Result<Pattern> {
        Builder::new().configure(Config::parse(options)?).build(regex)
    }

    /// Return a builder for configuring the compilation of a pattern.
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Load a precompiled instruction table, for example one written by
    /// [`Pattern::write_table`].
    ///
    /// The table is checked before it is used. Since the regex is not known,
    /// [`Pattern::subpattern`] returns empty strings for loaded tables.
    pub fn from_table<T>(words: T) -> Result<Pattern>
    where
        T: Into<Cow<'static, [u32]>>,
    {
        let words = words.into();
        Table(&words).validate()?;
        let counts = Table(&words).stats();
        let mut size = 0;
        let mut lookaheads = 0;
        let mut taken = vec![];
        for &word in words.iter() {
            match Instruction::decode(word) {
                Some(Instruction::Take(i)) => {
                    let i = usize::from(i);
                    size = size.max(i);
                    taken.push(i);
                }
                Some(Instruction::Head(n)) | Some(Instruction::Tail(n)) => {
                    lookaheads = lookaheads.max(usize::from(n) + 1);
                }
                _ => {}
            }
        }
        let mut reachable = vec![false; size];
        for i in taken {
            reachable[i - 1] = true;
        }
        let prefix = literal_prefix(&words);
        Ok(Pattern {
            regex: String::new(),
            config: Config::new(),
            spans: vec![0..0; size],
            reachable,
            lookaheads,
            prefix,
            stats: Stats {
                nodes: counts.nodes,
                edges: counts.edges,
                words: words.len(),
                ..Stats::default()
            },
            diagnostics: vec![],
            program: Program::Table(words),
        })
    }

    /// Load generated FSM code, for example a function written by
    /// [`Pattern::write_fsm`].
    ///
    /// Nothing is known about the pattern the code was generated from, so
    /// the pattern has no subpatterns, statistics or literal prefix.
    pub fn from_fsm(code: FsmCode) -> Pattern {
        Pattern {
            regex: String::new(),
            config: Config::new(),
            program: Program::Fsm(code),
            spans: vec![],
            reachable: vec![],
            lookaheads: 0,
            prefix: vec![],
            stats: Stats::default(),
            diagnostics: vec![],
        }
    }

    /// The regex this pattern was compiled from.
    pub fn regex(&self) -> &str {
        &self.regex
    }

    /// The configuration this pattern was compiled with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The number of subpatterns.
    pub fn size(&self) -> usize {
        self.spans.len()
    }

    /// The text of the subpattern with the given 1-based index, or an empty
    /// string if there is no such subpattern.
    pub fn subpattern(&self, index: usize) -> &str {
        index
            .checked_sub(1)
            .and_then(|i| self.spans.get(i))
            .and_then(|span| self.regex.get(span.clone()))
            .unwrap_or("")
    }

    /// Returns true when the subpattern with the given 1-based index can be
    /// matched. A subpattern is unreachable when every string it matches is
    /// also matched by an earlier subpattern.
    pub fn reachable(&self, index: usize) -> bool {
        index
            .checked_sub(1)
            .and_then(|i| self.reachable.get(i))
            .copied()
            .unwrap_or(false)
    }

    /// The number of lookaheads `(?=X)` in the pattern.
    pub fn lookaheads(&self) -> usize {
        self.lookaheads
    }

    /// The non-fatal problems found while compiling this pattern.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The number of DFA states.
    pub fn nodes(&self) -> usize {
        self.stats.nodes
    }

    /// The number of DFA edges, counting byte ranges and assertions.
    pub fn edges(&self) -> usize {
        self.stats.edges
    }

    /// The number of instruction words.
    pub fn words(&self) -> usize {
        self.stats.words
    }

    /// Time spent parsing the regex and computing its follow relation.
    pub fn parse_time(&self) -> Duration {
        self.stats.parse_time
    }

    /// Time spent building the DFA.
    pub fn nodes_time(&self) -> Duration {
        self.stats.nodes_time
    }

    /// Time spent analyzing the DFA's edges for reachability.
    pub fn edges_time(&self) -> Duration {
        self.stats.edges_time
    }

    /// Time spent assembling the instruction words.
    pub fn words_time(&self) -> Duration {
        self.stats.words_time
    }

    /// The instruction words of this pattern, unless it was loaded from FSM
    /// code.
    pub fn table(&self) -> Option<&[u32]> {
        match self.program {
            Program::Table(ref words) => Some(words),
            Program::Fsm(_) => None,
        }
    }

    pub(crate) fn program(&self) -> &Program {
        &self.program
    }

    /// The bytes every match must begin with.
    pub(crate) fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Write the instruction table as Rust source:
    /// `pub static REFLEX_CODE_<NAME>: [u32; N]`.
    pub fn write_table<W: io::Write>(&self, wtr: W) -> io::Result<()> {
        codegen::write_table(wtr, self.config.get_name(), self.require_table()?)
    }

    /// Write the program as a Rust function
    /// `pub fn reflex_code_<name>(m: &mut dyn regex_scanner::Fsm)` that can
    /// be loaded with [`Pattern::from_fsm`].
    pub fn write_fsm<W: io::Write>(&self, wtr: W) -> io::Result<()> {
        codegen::write_fsm(wtr, self.config.get_name(), self.require_table()?)
    }

    /// Write the DFA as a Graphviz digraph.
    pub fn write_graphviz<W: io::Write>(&self, wtr: W) -> io::Result<()> {
        codegen::write_graphviz(wtr, self.config.get_name(), self.require_table()?)
    }

    /// Write every file named by the `f=` option. Files ending in `.gv` get
    /// a Graphviz digraph, and files ending in `.rs` get the table, or the
    /// FSM code when the `o` option is set.
    pub fn export(&self) -> io::Result<()> {
        for path in self.config.get_files() {
            let wtr = || -> io::Result<BufWriter<File>> {
                Ok(BufWriter::new(File::create(path)?))
            };
            if path.ends_with(".gv") {
                self.write_graphviz(wtr()?)?;
            } else if path.ends_with(".rs") {
                if self.config.fsm_code {
                    self.write_fsm(wtr()?)?;
                } else {
                    self.write_table(wtr()?)?;
                }
            } else {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unsupported export file type: {}", path),
                ));
            }
            debug!("exported pattern to {}", path);
        }
        Ok(())
    }

    fn require_table(&self) -> io::Result<&[u32]> {
        self.table().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::Other,
                "pattern was loaded from FSM code and has no table",
            )
        })
    }
}

/// A builder for compiling patterns with a non-default configuration.
///
/// # Example
///
/// ```
/// use regex_scanner::{Config, Pattern};
///
/// # fn example() -> Result<(), regex_scanner::Error> {
/// let pat = Pattern::builder()
///     .configure(Config::new().case_insensitive(true).name("words"))
///     .build(r"\w+")?;
/// assert_eq!("words", pat.config().get_name());
/// # Ok(()) }; example().unwrap()
/// ```
#[derive(Clone, Debug, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Builder {
        Builder { config: Config::new() }
    }

    /// Replace the configuration of this builder.
    pub fn configure(&mut self, config: Config) -> &mut Builder {
        self.config = config;
        self
    }

    /// Compile the given regex.
    pub fn build(&self, regex: &str) -> Result<Pattern> {
        let mut stats = Stats::default();

        let timer = Instant::now();
        let parsed = syntax::parse(regex, &self.config)?;
        let follow = Follow::build(&parsed)?;
        stats.parse_time = timer.elapsed();

        let timer = Instant::now();
        let dfa = Determinizer::new(&parsed, &follow).build()?;
        stats.nodes_time = timer.elapsed();

        let timer = Instant::now();
        let mut diagnostics = vec![];
        for (i, &reachable) in dfa.reachable.iter().enumerate() {
            if !reachable {
                let diag = Diagnostic::UnreachableSubpattern { index: i + 1 };
                warn!("{}: {:?}", diag, parsed.alternatives[i].span);
                diagnostics.push(diag);
            }
        }
        stats.nodes = dfa.states.len();
        stats.edges = dfa.edges();
        stats.edges_time = timer.elapsed();

        let timer = Instant::now();
        let words = encode::assemble(&dfa)?;
        let prefix = literal_prefix(&words);
        stats.words = words.len();
        stats.words_time = timer.elapsed();

        debug!(
            "compiled {:?}: {} nodes, {} edges, {} words, prefix {:?} \
             (parse {:?}, nodes {:?}, edges {:?}, words {:?})",
            regex,
            stats.nodes,
            stats.edges,
            stats.words,
            String::from_utf8_lossy(&prefix),
            stats.parse_time,
            stats.nodes_time,
            stats.edges_time,
            stats.words_time,
        );
        Ok(Pattern {
            regex: regex.to_string(),
            config: self.config.clone(),
            program: Program::Table(Cow::Owned(words)),
            spans: parsed.alternatives.iter().map(|alt| alt.span.clone()).collect(),
            reachable: dfa.reachable,
            lookaheads: parsed.lookaheads,
            prefix,
            stats,
            diagnostics,
        })
    }
}

/// Follow the chain of blocks from the start block as long as each one
/// neither accepts nor asserts anything and has a single one-byte edge.
fn literal_prefix(words: &[u32]) -> Vec<u8> {
    let table = Table(words);
    let mut prefix = vec![];
    let mut offset = 0;
    while prefix.len() < PREFIX_LIMIT {
        let mut next = None;
        let mut count = 0;
        for inst in table.block(offset) {
            match inst {
                Instruction::Goto { lo, hi, target } if lo == hi => {
                    next = Some((lo, target));
                    count += 1;
                }
                Instruction::Halt => {}
                _ => return prefix,
            }
        }
        match next {
            Some((byte, target)) if count == 1 => {
                prefix.push(byte);
                offset = usize::from(target);
            }
            _ => break,
        }
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix() {
        let pat = Pattern::new("abc[0-9]|abd").unwrap();
        assert_eq!(b"ab", pat.prefix());
        let pat = Pattern::new("a*b").unwrap();
        assert!(pat.prefix().is_empty());
        let pat = Pattern::new(r"\<ab").unwrap();
        assert!(pat.prefix().is_empty());
        let pat = Pattern::new("(ab)+x|y").unwrap();
        assert!(pat.prefix().is_empty());
        let pat = Pattern::new("ab|ac").unwrap();
        assert_eq!(b"a", pat.prefix());
        let pat = Pattern::new("x(ab)+c").unwrap();
        assert_eq!(b"xab", pat.prefix());
    }

    #[test]
    fn unreachable() {
        let pat = Pattern::new("[a-z]+|if|[0-9]").unwrap();
        assert!(pat.reachable(1));
        assert!(!pat.reachable(2));
        assert!(pat.reachable(3));
        assert!(!pat.reachable(0));
        assert!(!pat.reachable(4));
        assert_eq!(
            &[Diagnostic::UnreachableSubpattern { index: 2 }],
            pat.diagnostics(),
        );
    }

    #[test]
    fn loaded_table() {
        let pat = Pattern::new("ab|c(?=d)").unwrap();
        let words = pat.table().unwrap().to_vec();
        let loaded = Pattern::from_table(words).unwrap();
        assert_eq!(pat.nodes(), loaded.nodes());
        assert_eq!(pat.edges(), loaded.edges());
        assert_eq!(pat.words(), loaded.words());
        assert_eq!(2, loaded.size());
        assert_eq!(1, loaded.lookaheads());
        assert_eq!("", loaded.subpattern(1));
    }
}
