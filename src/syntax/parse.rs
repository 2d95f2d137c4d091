use crate::{
    error::{Error, Reason, Result},
    syntax::{
        ast::{Alternative, Ast, Leaf, LeafKind, Parsed, Repeat},
        class::Class,
        Config, Flags,
    },
    util::{alphabet::ByteSet, look::Look},
};

/// The largest number of leaves, lookaheads, lazy quantifiers or repeat
/// counts a regex may have. Positions store these in 16 bits.
const LIMIT: usize = 0xFFFF;

/// Parse a regex into its top-level alternatives and leaf table.
pub(crate) fn parse(regex: &str, config: &Config) -> Result<Parsed> {
    Parser::new(regex, config).parse()
}

/// What a construct requires of the items that follow it in the same
/// alternative. Ordered from least to most restrictive.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
enum Trailing {
    /// Anything may follow.
    Any,
    /// Only zero-width items may follow: `$` without `m`, `\i` and `\j`.
    ZeroWidth,
    /// Nothing may follow: lookahead and negative patterns.
    Nothing,
}

#[derive(Debug)]
struct Node {
    ast: Ast,
    /// True when the node can never consume input.
    zero_width: bool,
    trailing: Trailing,
}

impl Node {
    fn new(ast: Ast, zero_width: bool) -> Node {
        Node { ast, zero_width, trailing: Trailing::Any }
    }
}

/// A scalar denoted by an escape or a literal character.
#[derive(Clone, Copy, Debug)]
enum Value {
    /// A raw byte, from `\xHH`, `\0`, `\cX` and the control escapes.
    Byte(u8),
    Char(char),
}

impl Value {
    fn as_char(self) -> char {
        match self {
            Value::Byte(b) => char::from(b),
            Value::Char(c) => c,
        }
    }
}

/// An item of a bracket list.
enum Item {
    Value(Value),
    Class(Class),
}

struct Parser<'r> {
    regex: &'r str,
    bytes: &'r [u8],
    pos: usize,
    flags: Flags,
    escape: Option<u8>,
    bracket_escapes: bool,
    leaves: Vec<Leaf>,
    lookaheads: usize,
    lazies: usize,
    in_lookahead: bool,
}

impl<'r> Parser<'r> {
    fn new(regex: &'r str, config: &Config) -> Parser<'r> {
        Parser {
            regex,
            bytes: regex.as_bytes(),
            pos: 0,
            flags: config.flags,
            escape: config.escape,
            bracket_escapes: config.bracket_escapes,
            leaves: vec![],
            lookaheads: 0,
            lazies: 0,
            in_lookahead: false,
        }
    }

    fn parse(mut self) -> Result<Parsed> {
        let branches = self.branches(true)?;
        if self.pos < self.bytes.len() {
            // The only thing that stops a top-level branch early is a ')'.
            return Err(Error::malformed(self.pos, Reason::MismatchedParens));
        }
        if branches.len() >= LIMIT {
            return Err(Error::malformed(0, Reason::ExceedsLimits));
        }
        let alternatives = branches
            .into_iter()
            .map(|(node, span)| Alternative { ast: node.ast, span })
            .collect();
        Ok(Parsed {
            alternatives,
            leaves: self.leaves,
            lookaheads: self.lookaheads,
        })
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume and return the next character of the regex.
    fn bump(&mut self) -> Option<char> {
        let c = self.regex[self.pos..].chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn is_escape(&self, c: char) -> bool {
        self.escape.map_or(false, |e| c.is_ascii() && c as u8 == e)
    }

    fn error(&self, offset: usize, reason: Reason) -> Error {
        Error::malformed(offset, reason)
    }

    /// In free-spacing mode, skip whitespace and `#` comments.
    fn skip_space(&mut self) {
        if !self.flags.ignore_whitespace {
            return;
        }
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else if b == b'#' {
                while let Some(b) = self.peek() {
                    self.pos += 1;
                    if b == b'\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn leaf(&mut self, offset: usize, kind: LeafKind) -> Result<Ast> {
        if self.leaves.len() >= LIMIT {
            return Err(self.error(offset, Reason::ExceedsLimits));
        }
        self.leaves.push(Leaf { kind, lazy: None });
        Ok(Ast::Leaf(self.leaves.len() - 1))
    }

    fn look(&mut self, offset: usize, look: Look) -> Result<Node> {
        let ast = self.leaf(offset, LeafKind::Look(look))?;
        Ok(Node::new(ast, true))
    }

    /// Parse alternatives separated by `|`, up to a `)` or the end of the
    /// regex. Each alternative is returned with its span.
    fn branches(
        &mut self,
        leading: bool,
    ) -> Result<Vec<(Node, core::ops::Range<usize>)>> {
        let mut branches = vec![];
        let mut empty = None;
        loop {
            let start = self.pos;
            let (node, items) = self.concat(leading)?;
            if items == 0 && empty.is_none() {
                empty = Some(start);
            }
            branches.push((node, start..self.pos));
            if !self.eat(b'|') {
                break;
            }
        }
        if let Some(offset) = empty {
            if branches.len() > 1 {
                return Err(self.error(offset, Reason::EmptyExpression));
            }
        }
        Ok(branches)
    }

    /// Combine alternatives into a single node.
    fn alternate(branches: Vec<(Node, core::ops::Range<usize>)>) -> Node {
        let zero_width = branches.iter().all(|(n, _)| n.zero_width);
        let trailing = branches
            .iter()
            .map(|(n, _)| n.trailing)
            .max()
            .unwrap_or(Trailing::Any);
        let mut asts: Vec<Ast> =
            branches.into_iter().map(|(n, _)| n.ast).collect();
        let ast = if asts.len() == 1 {
            asts.pop().unwrap_or(Ast::Empty)
        } else {
            Ast::Alternate(asts)
        };
        Node { ast, zero_width, trailing }
    }

    /// Parse a sequence of quantified atoms. `leading` says whether nothing
    /// consuming precedes this sequence in its alternative. Also returns the
    /// number of items, modifiers and comments excluded.
    fn concat(&mut self, leading: bool) -> Result<(Node, usize)> {
        let mut leading = leading;
        let mut items = vec![];
        let mut zero_width = true;
        let mut trailing = Trailing::Any;
        loop {
            self.skip_space();
            match self.peek() {
                None | Some(b'|') | Some(b')') => break,
                _ => {}
            }
            let start = self.pos;
            let leaf_start = self.leaves.len();
            let node = match self.atom(leading)? {
                None => continue,
                Some(node) => node,
            };
            let node = self.quantifiers(node, leaf_start)?;
            match trailing {
                Trailing::Nothing => {
                    return Err(self.error(start, Reason::InvalidLookahead));
                }
                Trailing::ZeroWidth if !node.zero_width => {
                    return Err(self.error(start, Reason::InvalidAnchor));
                }
                _ => {}
            }
            trailing = trailing.max(node.trailing);
            if !node.zero_width {
                leading = false;
                zero_width = false;
            }
            items.push(node.ast);
        }
        let count = items.len();
        let ast = match count {
            0 => Ast::Empty,
            1 => items.pop().unwrap_or(Ast::Empty),
            _ => Ast::Concat(items),
        };
        Ok((Node { ast, zero_width, trailing }, count))
    }

    /// Parse any quantifiers following an atom. Leaves created since
    /// `leaf_start` belong to the atom, and are tagged when a quantifier is
    /// lazy.
    fn quantifiers(&mut self, mut node: Node, leaf_start: usize) -> Result<Node> {
        let mut quantified = false;
        loop {
            self.skip_space();
            let start = self.pos;
            let (min, max) = match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    (0, None)
                }
                Some(b'+') => {
                    self.pos += 1;
                    (1, None)
                }
                Some(b'?') => {
                    self.pos += 1;
                    (0, Some(1))
                }
                Some(b'{') => match self.repeat_range()? {
                    None => break,
                    Some(range) => range,
                },
                _ => break,
            };
            if quantified {
                return Err(self.error(start, Reason::InvalidQuantifier));
            }
            match node.trailing {
                Trailing::Any => {}
                Trailing::ZeroWidth => {
                    return Err(self.error(start, Reason::InvalidAnchor));
                }
                Trailing::Nothing => {
                    return Err(self.error(start, Reason::InvalidLookahead));
                }
            }
            if self.eat(b'?') {
                self.lazies += 1;
                if self.lazies >= LIMIT {
                    return Err(self.error(start, Reason::ExceedsLimits));
                }
                let id = self.lazies as u16;
                for leaf in self.leaves[leaf_start..].iter_mut() {
                    if leaf.lazy.is_none() {
                        leaf.lazy = Some(id);
                    }
                }
            } else if self.peek() == Some(b'+') {
                // Possessive quantifiers are not supported.
                return Err(self.error(self.pos, Reason::InvalidQuantifier));
            }
            node.ast = Ast::Repeat(Box::new(Repeat {
                ast: node.ast,
                min,
                max,
                offset: start,
            }));
            quantified = true;
        }
        Ok(node)
    }

    /// Parse `{n}`, `{n,}`, `{n,m}` or `{,m}` at the current `{`. Returns
    /// `None`, consuming nothing, when the brace does not start a repeat.
    fn repeat_range(&mut self) -> Result<Option<(u32, Option<u32>)>> {
        let start = self.pos;
        match self.peek_at(1) {
            Some(b) if b.is_ascii_digit() || b == b',' => {}
            _ => return Ok(None),
        }
        self.pos += 1;
        let min = self.number(start)?;
        let max = if self.eat(b',') {
            self.number(start)?
        } else {
            Some(min.unwrap_or(0))
        };
        match self.peek() {
            Some(b'}') => self.pos += 1,
            None => return Err(self.error(start, Reason::MismatchedBraces)),
            Some(_) => return Err(self.error(self.pos, Reason::InvalidRepeat)),
        }
        let min = min.unwrap_or(0);
        if let Some(max) = max {
            if min > max {
                return Err(self.error(start, Reason::InvalidRepeat));
            }
        }
        Ok(Some((min, max)))
    }

    fn number(&mut self, start: usize) -> Result<Option<u32>> {
        let mut n: Option<u32> = None;
        while let Some(b) = self.peek().filter(u8::is_ascii_digit) {
            self.pos += 1;
            let v = n.unwrap_or(0) * 10 + u32::from(b - b'0');
            if v as usize > LIMIT {
                return Err(self.error(start, Reason::ExceedsLimits));
            }
            n = Some(v);
        }
        Ok(n)
    }

    /// Parse a single atom. Returns `None` for constructs that produce
    /// nothing, such as `(?i)` and comments.
    fn atom(&mut self, leading: bool) -> Result<Option<Node>> {
        let start = self.pos;
        let c = match self.bump() {
            None => return Ok(None),
            Some(c) => c,
        };
        if self.is_escape(c) {
            return self.escape(start);
        }
        let node = match c {
            '(' => return self.group(start, leading),
            '[' => self.bracket(start)?,
            '.' => {
                let mut cls = Class::any(self.flags.unicode);
                if !self.flags.dot_matches_new_line {
                    cls.remove_newline(self.flags.unicode);
                }
                self.class_node(start, cls)?
            }
            '^' if self.flags.multi_line => self.look(start, Look::StartLine)?,
            '^' => {
                if !leading {
                    return Err(self.error(start, Reason::InvalidAnchor));
                }
                self.look(start, Look::StartText)?
            }
            '$' if self.flags.multi_line => self.look(start, Look::EndLine)?,
            '$' => {
                let mut node = self.look(start, Look::EndText)?;
                node.trailing = Trailing::ZeroWidth;
                node
            }
            '*' | '+' | '?' => {
                return Err(self.error(start, Reason::InvalidQuantifier));
            }
            '{' => {
                self.pos = start;
                if self.repeat_range()?.is_some() {
                    return Err(self.error(start, Reason::InvalidQuantifier));
                }
                self.pos = start + 1;
                self.literal(start, Value::Char('{'))?
            }
            '"' if self.flags.quotes => self.quotation(start)?,
            c => self.literal(start, Value::Char(c))?,
        };
        Ok(Some(node))
    }

    fn group(&mut self, start: usize, leading: bool) -> Result<Option<Node>> {
        enum Kind {
            Group,
            Lookahead,
            Negative,
        }

        let saved = self.flags;
        let mut kind = Kind::Group;
        if self.eat(b'?') {
            match self.peek() {
                Some(b'#') => {
                    while let Some(b) = self.peek() {
                        self.pos += 1;
                        if b == b')' {
                            return Ok(None);
                        }
                    }
                    return Err(self.error(start, Reason::MismatchedParens));
                }
                Some(b':') => self.pos += 1,
                Some(b'=') => {
                    self.pos += 1;
                    kind = Kind::Lookahead;
                }
                Some(b'^') => {
                    self.pos += 1;
                    kind = Kind::Negative;
                }
                Some(b'!') | Some(b'<') => {
                    return Err(self.error(start, Reason::Unsupported));
                }
                _ => {
                    if self.modifiers()? {
                        // (?imsx) applies to the rest of the enclosing group.
                        return Ok(None);
                    }
                }
            }
        }
        let node = match kind {
            Kind::Group => {
                let branches = self.branches(leading)?;
                Parser::alternate(branches)
            }
            Kind::Lookahead => {
                if self.in_lookahead {
                    return Err(self.error(start, Reason::InvalidLookahead));
                }
                if self.lookaheads >= LIMIT {
                    return Err(self.error(start, Reason::ExceedsLimits));
                }
                let id = self.lookaheads as u16;
                self.lookaheads += 1;
                let head = self.leaf(start, LeafKind::Head(id))?;
                self.in_lookahead = true;
                let branches = self.branches(false);
                self.in_lookahead = false;
                let body = Parser::alternate(branches?);
                let tail = self.leaf(self.pos, LeafKind::Tail(id))?;
                Node {
                    ast: Ast::Concat(vec![head, body.ast, tail]),
                    zero_width: false,
                    trailing: Trailing::Nothing,
                }
            }
            Kind::Negative => {
                let body = Parser::alternate(self.branches(leading)?);
                let redo = self.leaf(self.pos, LeafKind::Redo)?;
                Node {
                    ast: Ast::Concat(vec![body.ast, redo]),
                    zero_width: body.zero_width,
                    trailing: Trailing::Nothing,
                }
            }
        };
        if !self.eat(b')') {
            return Err(self.error(start, Reason::MismatchedParens));
        }
        self.flags = saved;
        Ok(Some(node))
    }

    /// Parse the modifiers of `(?imsqux-imsqux)` or `(?imsqux-imsqux:`.
    /// Returns true if the modifiers were closed by `)`, and false if they
    /// were closed by `:` and a scoped group follows.
    fn modifiers(&mut self) -> Result<bool> {
        let mut yes = true;
        loop {
            match self.peek() {
                Some(b')') => {
                    self.pos += 1;
                    return Ok(true);
                }
                Some(b':') => {
                    self.pos += 1;
                    return Ok(false);
                }
                Some(b'-') if yes => {
                    self.pos += 1;
                    yes = false;
                }
                Some(b) => {
                    if !self.flags.set(b, yes) {
                        return Err(
                            self.error(self.pos, Reason::InvalidModifier)
                        );
                    }
                    self.pos += 1;
                }
                None => {
                    return Err(self.error(self.pos, Reason::MismatchedParens))
                }
            }
        }
    }

    /// Parse the escape sequence following an escape character.
    fn escape(&mut self, start: usize) -> Result<Option<Node>> {
        let c = match self.bump() {
            None => return Err(self.error(start, Reason::InvalidEscape)),
            Some(c) => c,
        };
        let node = match c {
            'A' => self.look(start, Look::StartText)?,
            'z' | 'Z' => self.look(start, Look::EndText)?,
            'b' => self.look(start, Look::WordBoundary)?,
            'B' => self.look(start, Look::NotWordBoundary)?,
            '<' => self.look(start, Look::WordStart)?,
            '>' => self.look(start, Look::WordEnd)?,
            'i' | 'j' => {
                let look = if c == 'i' { Look::Indent } else { Look::Dedent };
                let mut node = self.look(start, look)?;
                node.trailing = Trailing::ZeroWidth;
                node
            }
            'Q' => self.quoted()?,
            'u' if self.peek() == Some(b'{') => {
                let value = self.hex_braced(start)?;
                self.literal(start, value)?
            }
            'p' | 'P' => {
                let cls = self.property(start, c == 'P')?;
                self.class_node(start, cls)?
            }
            'd' | 's' | 'w' | 'l' | 'u' | 'h' | 'D' | 'S' | 'W' | 'L' | 'U'
            | 'H' => {
                let cls = self.perl(start, c)?;
                self.class_node(start, cls)?
            }
            '1'..='9' => return Err(self.error(start, Reason::Unsupported)),
            c => {
                let value = self.escape_value(start, c)?;
                self.literal(start, value)?
            }
        };
        Ok(Some(node))
    }

    /// Resolve an escaped character that denotes a single scalar: control
    /// escapes, hex, octal and escaped punctuation.
    fn escape_value(&mut self, start: usize, c: char) -> Result<Value> {
        let b = match c {
            'a' => 0x07,
            'e' => 0x1B,
            'f' => 0x0C,
            'n' => b'\n',
            'r' => b'\r',
            't' => b'\t',
            'v' => 0x0B,
            '0' => {
                let mut v = 0u32;
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            self.pos += 1;
                            v = v * 8 + u32::from(d - b'0');
                        }
                        _ => break,
                    }
                }
                v as u8
            }
            'x' => {
                if self.peek() == Some(b'{') {
                    return self.hex_braced(start);
                }
                let hex = self.regex.get(self.pos..self.pos + 2);
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    None => return Err(self.error(start, Reason::InvalidEscape)),
                    Some(b) => {
                        self.pos += 2;
                        b
                    }
                }
            }
            'c' => match self.bump() {
                Some(c) if c.is_ascii() && !c.is_ascii_control() => {
                    (c as u8) & 0x1F
                }
                _ => return Err(self.error(start, Reason::InvalidEscape)),
            },
            c if c.is_ascii_alphanumeric() => {
                return Err(self.error(start, Reason::InvalidEscape));
            }
            c => return Ok(Value::Char(c)),
        };
        Ok(Value::Byte(b))
    }

    /// Parse `{H..}` of `\x{H..}` or `\u{H..}`.
    fn hex_braced(&mut self, start: usize) -> Result<Value> {
        self.pos += 1;
        let end = match self.regex[self.pos..].find('}') {
            None => return Err(self.error(start, Reason::MismatchedBraces)),
            Some(n) => self.pos + n,
        };
        let c = u32::from_str_radix(&self.regex[self.pos..end], 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(start, Reason::InvalidEscape))?;
        self.pos = end + 1;
        Ok(Value::Char(c))
    }

    /// Parse the name of `\p{Name}`, `\pL`, `\P{Name}` or `\PL`.
    fn property(&mut self, start: usize, negated: bool) -> Result<Class> {
        let name = if self.eat(b'{') {
            let end = match self.regex[self.pos..].find('}') {
                None => {
                    return Err(self.error(start, Reason::MismatchedBraces))
                }
                Some(n) => self.pos + n,
            };
            let name = &self.regex[self.pos..end];
            self.pos = end + 1;
            name
        } else {
            let at = self.pos;
            match self.bump() {
                Some(c) if c.is_ascii_alphabetic() => &self.regex[at..self.pos],
                _ => return Err(self.error(start, Reason::InvalidEscape)),
            }
        };
        let mut cls = Class::named(name, self.flags.unicode)
            .ok_or_else(|| self.error(start, Reason::UndefinedName))?;
        if self.flags.case_insensitive {
            cls.case_fold();
        }
        if negated {
            cls.negate();
        }
        Ok(cls)
    }

    /// Resolve `\d`, `\s`, `\w`, `\l`, `\u`, `\h` and their negations.
    fn perl(&mut self, start: usize, c: char) -> Result<Class> {
        let letter = c.to_ascii_lowercase() as u8;
        let mut cls = Class::perl(letter, self.flags.unicode)
            .ok_or_else(|| self.error(start, Reason::InvalidEscape))?;
        if self.flags.case_insensitive && (letter == b'l' || letter == b'u') {
            cls.case_fold();
        }
        if c.is_ascii_uppercase() {
            cls.negate();
        }
        Ok(cls)
    }

    /// Parse a bracket list. The opening `[` has been consumed.
    fn bracket(&mut self, start: usize) -> Result<Node> {
        let unicode = self.flags.unicode;
        let negated = self.eat(b'^');
        let mut cls = Class::empty(unicode);
        let mut first = true;
        loop {
            let item_start = self.pos;
            let c = match self.bump() {
                None => {
                    return Err(self.error(start, Reason::MismatchedBrackets))
                }
                Some(c) => c,
            };
            if c == ']' && !first {
                break;
            }
            first = false;
            match self.bracket_item(item_start, c)? {
                Item::Class(k) => {
                    if self.peek() == Some(b'-')
                        && self.peek_at(1).map_or(false, |b| b != b']')
                    {
                        return Err(
                            self.error(self.pos, Reason::InvalidClassRange)
                        );
                    }
                    cls.union(&k);
                }
                Item::Value(lo) => {
                    if self.peek() == Some(b'-')
                        && self.peek_at(1).map_or(false, |b| b != b']')
                    {
                        self.pos += 1;
                        let hi_start = self.pos;
                        let hc = match self.bump() {
                            None => {
                                return Err(self
                                    .error(start, Reason::MismatchedBrackets))
                            }
                            Some(hc) => hc,
                        };
                        let hi = match self.bracket_item(hi_start, hc)? {
                            Item::Value(hi) => hi,
                            Item::Class(_) => {
                                return Err(self.error(
                                    hi_start,
                                    Reason::InvalidClassRange,
                                ))
                            }
                        };
                        let (lo, hi) = (lo.as_char(), hi.as_char());
                        if lo > hi {
                            return Err(
                                self.error(item_start, Reason::InvalidClassRange)
                            );
                        }
                        let range = Class::try_range(lo, hi, unicode)
                            .ok_or_else(|| {
                                self.error(item_start, Reason::InvalidClassRange)
                            })?;
                        cls.union(&range);
                    } else {
                        let single = match lo {
                            Value::Byte(b) => Class::byte(b, unicode),
                            Value::Char(c) => Class::char(c, unicode),
                        };
                        cls.union(&single);
                    }
                }
            }
        }
        if self.flags.case_insensitive {
            cls.case_fold();
        }
        if negated {
            cls.negate();
        }
        self.class_node(start, cls)
    }

    /// Parse one item of a bracket list, whose first character `c` has been
    /// consumed.
    fn bracket_item(&mut self, start: usize, c: char) -> Result<Item> {
        if c == '[' && self.peek() == Some(b':') {
            if let Some(n) = self.regex[self.pos + 1..].find(":]") {
                let name = &self.regex[self.pos + 1..self.pos + 1 + n];
                let (negated, name) = match name.strip_prefix('^') {
                    Some(name) => (true, name),
                    None => (false, name),
                };
                let mut cls = Class::named(name, self.flags.unicode)
                    .ok_or_else(|| self.error(start, Reason::InvalidClass))?;
                if negated {
                    cls.negate();
                }
                self.pos += n + 3;
                return Ok(Item::Class(cls));
            }
        }
        if !self.bracket_escapes || !self.is_escape(c) {
            return Ok(Item::Value(Value::Char(c)));
        }
        let e = match self.bump() {
            None => return Err(self.error(start, Reason::MismatchedBrackets)),
            Some(e) => e,
        };
        match e {
            'd' | 's' | 'w' | 'l' | 'u' | 'h' | 'D' | 'S' | 'W' | 'L' | 'U'
            | 'H'
                if !(e == 'u' && self.peek() == Some(b'{')) =>
            {
                Ok(Item::Class(self.perl(start, e)?))
            }
            'u' => Ok(Item::Value(self.hex_braced(start)?)),
            'p' | 'P' => Ok(Item::Class(self.property(start, e == 'P')?)),
            'b' => Ok(Item::Value(Value::Byte(0x08))),
            'A' | 'z' | 'Z' | 'B' | '<' | '>' | 'i' | 'j' | 'Q' | 'E' => {
                Err(self.error(start, Reason::InvalidEscape))
            }
            e => Ok(Item::Value(self.escape_value(start, e)?)),
        }
    }

    /// Parse `"..."`. The opening quote has been consumed.
    fn quotation(&mut self, start: usize) -> Result<Node> {
        let mut items = vec![];
        loop {
            let at = self.pos;
            let c = match self.bump() {
                None => {
                    return Err(self.error(start, Reason::MismatchedQuotation))
                }
                Some(c) => c,
            };
            let c = if c == '"' {
                break;
            } else if self.is_escape(c) && self.peek() == Some(b'"') {
                self.pos += 1;
                '"'
            } else {
                c
            };
            items.push(self.literal(at, Value::Char(c))?.ast);
        }
        Ok(Parser::sequence(items))
    }

    /// Parse `\Q...\E`. The `\Q` has been consumed. A missing `\E` quotes
    /// the rest of the regex.
    fn quoted(&mut self) -> Result<Node> {
        let mut items = vec![];
        loop {
            let at = self.pos;
            let c = match self.bump() {
                None => break,
                Some(c) => c,
            };
            if self.is_escape(c) && self.peek() == Some(b'E') {
                self.pos += 1;
                break;
            }
            items.push(self.literal(at, Value::Char(c))?.ast);
        }
        Ok(Parser::sequence(items))
    }

    fn sequence(mut items: Vec<Ast>) -> Node {
        let ast = match items.len() {
            0 => Ast::Empty,
            1 => items.pop().unwrap_or(Ast::Empty),
            _ => Ast::Concat(items),
        };
        Node::new(ast, false)
    }

    /// A literal scalar, folded when case insensitive.
    fn literal(&mut self, offset: usize, value: Value) -> Result<Node> {
        let unicode = self.flags.unicode;
        let fold = self.flags.case_insensitive;
        match value {
            Value::Byte(b) if !unicode => {
                let mut set = ByteSet::single(b);
                if fold {
                    set.fold_ascii_case();
                }
                Ok(Node::new(self.leaf(offset, LeafKind::Bytes(set))?, false))
            }
            value => {
                let c = value.as_char();
                if fold && (unicode || c.is_ascii()) {
                    let mut cls = Class::char(c, unicode);
                    cls.case_fold();
                    return self.class_node(offset, cls);
                }
                let mut buf = [0; 4];
                let mut items = vec![];
                for &b in c.encode_utf8(&mut buf).as_bytes() {
                    items.push(self.leaf(offset, LeafKind::Bytes(ByteSet::single(b)))?);
                }
                Ok(Parser::sequence(items))
            }
        }
    }

    /// Lower a complete class to leaves.
    fn class_node(&mut self, offset: usize, cls: Class) -> Result<Node> {
        if cls.is_empty() {
            return Err(self.error(offset, Reason::EmptyClass));
        }
        let mut alts = vec![];
        for seq in cls.lower() {
            let mut items = vec![];
            for set in seq {
                items.push(self.leaf(offset, LeafKind::Bytes(set))?);
            }
            alts.push(Parser::sequence(items).ast);
        }
        let ast = if alts.len() == 1 {
            alts.pop().unwrap_or(Ast::Empty)
        } else {
            Ast::Alternate(alts)
        };
        Ok(Node::new(ast, false))
    }
}
