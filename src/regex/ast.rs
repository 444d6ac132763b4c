//! Expression tree produced by the pattern parser.
//!
//! Leaves are [`Matcher`]s, the same values the NFA later attaches to its
//! transitions; inner nodes add grouping, repetition, concatenation and
//! alternation on top. The tree owns its children outright. The parser
//! keeps its own context stack, so nodes carry no back references.

use std::fmt;

/// A parsed pattern: the root expression plus the two anchor flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    pub root: ExprKind,
    /// Set by a leading `^`; the match may not skip a prefix of the input.
    pub anchor_start: bool,
    /// Set by a trailing unescaped `$`; the match may not skip a suffix.
    pub anchor_end: bool,
}

/// Regular expression kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    /// A leaf consuming zero or one byte (e.g. `a`, `.`, `[^a-z]`).
    Lit(Matcher),
    /// A bracketed subexpression; `<...>` captures, `(...)` only delimits.
    Group { expr: Box<ExprKind>, capturing: bool },
    /// Zero or more (`*`).
    Star { expr: Box<ExprKind>, greedy: bool },
    /// One or more (`+`).
    Plus { expr: Box<ExprKind>, greedy: bool },
    /// Zero or one (`?`).
    Optional { expr: Box<ExprKind>, greedy: bool },
    /// Counted repetition (`{m}`, `{m,}`, `{m,n}`).
    Repeat {
        expr: Box<ExprKind>,
        min: usize,
        /// Meaningless when `unbounded`.
        max: usize,
        unbounded: bool,
        greedy: bool,
    },
    /// Sequential composition of two or more expressions.
    Concat(Vec<ExprKind>),
    /// Alternation between two or more expressions.
    Alt(Vec<ExprKind>),
}

/// A leaf matcher, shared between the tree and the NFA's transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Consumes nothing and always matches.
    Epsilon,
    /// Consumes one byte equal to the payload.
    Char(u8),
    /// Consumes any one byte (`.`).
    Any,
    /// Consumes one byte inside (or, negated, outside) a set of intervals.
    Class(CharClass),
}

/// A `[...]` byte set as a list of inclusive intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharClass {
    pub negated: bool,
    pub intervals: Vec<(u8, u8)>,
}

impl ExprKind {
    /// Binding strength used for parenthesization; smaller binds tighter.
    pub(crate) fn priority(&self) -> usize {
        match self {
            ExprKind::Lit(_) | ExprKind::Group { .. } => 0,
            ExprKind::Star { .. }
            | ExprKind::Plus { .. }
            | ExprKind::Optional { .. }
            | ExprKind::Repeat { .. } => 1,
            ExprKind::Concat(_) => 2,
            ExprKind::Alt(_) => 3,
        }
    }

    /// True iff the expression accepts the empty string.
    pub fn accept_epsilon(&self) -> bool {
        match self {
            ExprKind::Lit(matcher) => matcher.is_epsilon(),
            ExprKind::Group { expr, .. } => expr.accept_epsilon(),
            ExprKind::Star { .. } | ExprKind::Optional { .. } => true,
            ExprKind::Plus { expr, .. } => expr.accept_epsilon(),
            ExprKind::Repeat { expr, min, .. } => *min == 0 || expr.accept_epsilon(),
            ExprKind::Concat(children) => children.iter().all(ExprKind::accept_epsilon),
            ExprKind::Alt(children) => children.iter().any(ExprKind::accept_epsilon),
        }
    }
}

impl Ast {
    /// True iff the pattern accepts the empty string, ignoring anchors.
    pub fn accept_epsilon(&self) -> bool {
        self.root.accept_epsilon()
    }
}

impl Matcher {
    /// Number of bytes consumed on a match: 0 for epsilon, 1 otherwise.
    pub fn width(&self) -> usize {
        match self {
            Matcher::Epsilon => 0,
            Matcher::Char(_) | Matcher::Any | Matcher::Class(_) => 1,
        }
    }

    /// Whether the matcher accepts the head of `rest`.
    pub fn matches(&self, rest: &[u8]) -> bool {
        match self {
            Matcher::Epsilon => true,
            Matcher::Char(byte) => rest.first() == Some(byte),
            Matcher::Any => !rest.is_empty(),
            Matcher::Class(class) => rest.first().is_some_and(|byte| class.contains(*byte)),
        }
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self, Matcher::Epsilon)
    }
}

impl CharClass {
    /// Membership test; `negated` flips the interval lookup.
    pub fn contains(&self, byte: u8) -> bool {
        let hit = self.intervals.iter().any(|&(lo, hi)| lo <= byte && byte <= hi);
        self.negated ^ hit
    }

    /// Sorts the intervals and merges overlapping or adjacent ones, after
    /// swapping any interval written high-to-low. The result is the unique
    /// minimal sorted disjoint cover of the original set.
    pub(crate) fn normalize(&mut self) {
        if self.intervals.is_empty() {
            return;
        }
        for interval in &mut self.intervals {
            if interval.0 > interval.1 {
                *interval = (interval.1, interval.0);
            }
        }
        self.intervals.sort_unstable();

        let mut merged = 0;
        for i in 1..self.intervals.len() {
            let (lo, hi) = self.intervals[i];
            if lo <= self.intervals[merged].1.saturating_add(1) {
                self.intervals[merged].1 = self.intervals[merged].1.max(hi);
            } else {
                merged += 1;
                self.intervals[merged] = (lo, hi);
            }
        }
        self.intervals.truncate(merged + 1);
    }

    /// The single byte this class matches, if it is not negated and covers
    /// exactly one.
    pub(crate) fn as_single(&self) -> Option<u8> {
        match self.intervals.as_slice() {
            [(lo, hi)] if lo == hi && !self.negated => Some(*lo),
            _ => None,
        }
    }
}

// Bytes the printer escapes, kept sorted for binary search. A superset of
// the metacharacters; the parser maps any escaped byte back to itself.
const ESCAPED: &[u8] = br##"!"#$%&'()*+,-./:;<=>?@[\]^{|}"##;

fn write_byte(f: &mut fmt::Formatter<'_>, byte: u8) -> fmt::Result {
    if ESCAPED.binary_search(&byte).is_ok() {
        write!(f, "\\")?;
    }
    write!(f, "{}", byte as char)
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        if self.negated {
            write!(f, "^")?;
        }
        for &(lo, hi) in &self.intervals {
            write_byte(f, lo)?;
            if lo != hi {
                write!(f, "-")?;
                write_byte(f, hi)?;
            }
        }
        write!(f, "]")
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Epsilon => Ok(()),
            Matcher::Char(byte) => write_byte(f, *byte),
            Matcher::Any => write!(f, "."),
            Matcher::Class(class) => write!(f, "{class}"),
        }
    }
}

impl ExprKind {
    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, child: &ExprKind) -> fmt::Result {
        let parens = child.priority() > self.priority();
        if parens {
            write!(f, "({child})")
        } else {
            write!(f, "{child}")
        }
    }
}

/// Prints the expression back in pattern syntax. Parsing the output of a
/// normalized tree yields that tree again.
impl fmt::Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprKind::Lit(matcher) => write!(f, "{matcher}"),
            ExprKind::Group { expr, capturing } => {
                write!(f, "{}", if *capturing { '<' } else { '(' })?;
                write!(f, "{expr}")?;
                write!(f, "{}", if *capturing { '>' } else { ')' })
            }
            ExprKind::Star { expr, greedy } => {
                self.fmt_child(f, expr)?;
                write!(f, "*{}", if *greedy { "" } else { "?" })
            }
            ExprKind::Plus { expr, greedy } => {
                self.fmt_child(f, expr)?;
                write!(f, "+{}", if *greedy { "" } else { "?" })
            }
            ExprKind::Optional { expr, greedy } => {
                // A greedy quantifier child needs parentheses, otherwise the
                // printed `?` would read back as its lazy suffix.
                let ambiguous = matches!(
                    **expr,
                    ExprKind::Star { greedy: true, .. }
                        | ExprKind::Plus { greedy: true, .. }
                        | ExprKind::Optional { greedy: true, .. }
                        | ExprKind::Repeat { greedy: true, .. }
                );
                if ambiguous {
                    write!(f, "({expr})")?;
                } else {
                    self.fmt_child(f, expr)?;
                }
                write!(f, "?{}", if *greedy { "" } else { "?" })
            }
            ExprKind::Repeat {
                expr,
                min,
                max,
                unbounded,
                greedy,
            } => {
                self.fmt_child(f, expr)?;
                write!(f, "{{{min}")?;
                if *unbounded {
                    write!(f, ",")?;
                } else if min != max {
                    write!(f, ",{max}")?;
                }
                write!(f, "}}{}", if *greedy { "" } else { "?" })
            }
            ExprKind::Concat(children) => {
                for child in children {
                    self.fmt_child(f, child)?;
                }
                Ok(())
            }
            ExprKind::Alt(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i != 0 {
                        write!(f, "|")?;
                    }
                    self.fmt_child(f, child)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.anchor_start {
            write!(f, "^")?;
        }
        write!(f, "{}", self.root)?;
        if self.anchor_end {
            write!(f, "$")?;
        }
        Ok(())
    }
}
