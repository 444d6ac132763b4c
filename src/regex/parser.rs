//! Pattern parser.
//!
//! A single pass over the pattern bytes drives a stack of group frames.
//! Each frame holds the alternation branches finished so far and the
//! concatenation sequence of the branch being built; quantifiers rewrite
//! the last element of that sequence in place. Closing a non-capturing
//! group splices its body straight into the parent sequence, so `(...)`
//! never survives into the tree.

use super::{
    ast::{Ast, CharClass, ExprKind, Matcher},
    error::{BracketError, ParseError, SyntaxError},
};

impl Ast {
    /// Parses a pattern into an unnormalized tree.
    ///
    /// Call [`Ast::normalize`] afterwards for the simplified form the
    /// matching examples in this crate assume.
    pub fn parse(pattern: &str) -> Result<Ast, ParseError> {
        Parser::new(pattern).parse()
    }
}

pub(crate) struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    /// Offset of `input` within the original pattern (1 after a stripped
    /// `^` anchor), so errors report positions the caller recognizes.
    base: usize,
    frames: Vec<Frame>,
    /// Whether a `?` at this point is the lazy suffix of the quantifier
    /// that was just applied rather than a fresh `?` quantifier.
    lazy_ok: bool,
}

/// One open group (or the pattern itself, for the bottom entry).
struct Frame {
    /// `None` for the bottom frame; otherwise whether the group captures.
    capturing: Option<bool>,
    /// Completed `|` branches.
    alts: Vec<ExprKind>,
    /// Concatenation sequence of the branch currently being built.
    seq: Vec<ExprKind>,
}

impl Frame {
    fn new(capturing: Option<bool>) -> Self {
        Self {
            capturing,
            alts: Vec::new(),
            seq: Vec::new(),
        }
    }

    /// Folds the frame into a single expression.
    fn finish(mut self) -> ExprKind {
        let branch = seq_to_expr(std::mem::take(&mut self.seq));
        if self.alts.is_empty() {
            branch
        } else {
            self.alts.push(branch);
            ExprKind::Alt(self.alts)
        }
    }
}

fn seq_to_expr(mut seq: Vec<ExprKind>) -> ExprKind {
    match seq.len() {
        0 => ExprKind::Lit(Matcher::Epsilon),
        1 => seq.pop().expect("length checked"),
        _ => ExprKind::Concat(seq),
    }
}

impl<'a> Parser<'a> {
    pub(crate) fn new(pattern: &'a str) -> Self {
        Self {
            input: pattern.as_bytes(),
            pos: 0,
            base: 0,
            frames: Vec::new(),
            lazy_ok: false,
        }
    }

    pub(crate) fn parse(mut self) -> Result<Ast, ParseError> {
        let (body, anchor_start, anchor_end) = strip_anchors(self.input);
        self.input = body;
        self.base = usize::from(anchor_start);
        self.frames.push(Frame::new(None));

        while let Some(byte) = self.bump() {
            match byte {
                b'\\' => {
                    let literal = self
                        .bump()
                        .ok_or_else(|| self.err(SyntaxError::DanglingEscape))?;
                    self.push_atom(ExprKind::Lit(Matcher::Char(literal)));
                }
                b'[' => {
                    let matcher = self.class()?;
                    self.push_atom(ExprKind::Lit(matcher));
                }
                b']' => return Err(self.err(SyntaxError::StrayClassClose)),
                b'{' => self.repeat()?,
                b'}' => return Err(self.err(SyntaxError::StrayRepeatClose)),
                b'(' | b'<' => {
                    self.frames.push(Frame::new(Some(byte == b'<')));
                    self.lazy_ok = false;
                }
                b')' | b'>' => self.close_group(byte)?,
                b'*' => self.quantify(|expr| ExprKind::Star {
                    expr: Box::new(expr),
                    greedy: true,
                }),
                b'+' => self.quantify(|expr| ExprKind::Plus {
                    expr: Box::new(expr),
                    greedy: true,
                }),
                b'?' if self.lazy_ok => self.apply_lazy(),
                b'?' => self.quantify(|expr| ExprKind::Optional {
                    expr: Box::new(expr),
                    greedy: true,
                }),
                b'|' => {
                    let frame = self.top();
                    let branch = seq_to_expr(std::mem::take(&mut frame.seq));
                    frame.alts.push(branch);
                    self.lazy_ok = false;
                }
                b'.' => self.push_atom(ExprKind::Lit(Matcher::Any)),
                _ => self.push_atom(ExprKind::Lit(Matcher::Char(byte))),
            }
        }

        if self.frames.len() > 1 {
            return Err(ParseError::Unbalanced(BracketError::Unclosed));
        }
        let root = self
            .frames
            .pop()
            .expect("parser keeps the bottom frame")
            .finish();
        Ok(Ast {
            root,
            anchor_start,
            anchor_end,
        })
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.input.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        byte
    }

    /// Position of the byte most recently consumed, in pattern coordinates.
    fn err(&self, kind: SyntaxError) -> ParseError {
        ParseError::Syntax(kind, self.base + self.pos.saturating_sub(1))
    }

    fn top(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("parser keeps the bottom frame")
    }

    /// Concatenates an atom. A lone epsilon in the sequence is a
    /// placeholder left behind by an empty non-capturing group; the next
    /// atom takes its place instead of concatenating after it.
    fn push_atom(&mut self, atom: ExprKind) {
        let seq = &mut self.top().seq;
        if let [placeholder @ ExprKind::Lit(Matcher::Epsilon)] = seq.as_mut_slice() {
            *placeholder = atom;
        } else {
            seq.push(atom);
        }
        self.lazy_ok = false;
    }

    /// Wraps the last element of the current sequence (an implicit epsilon
    /// when there is none) in a quantifier.
    fn quantify(&mut self, wrap: impl FnOnce(ExprKind) -> ExprKind) {
        let seq = &mut self.top().seq;
        let inner = seq.pop().unwrap_or(ExprKind::Lit(Matcher::Epsilon));
        seq.push(wrap(inner));
        self.lazy_ok = true;
    }

    /// Clears the greedy flag of the quantifier that was just applied.
    fn apply_lazy(&mut self) {
        match self.top().seq.last_mut() {
            Some(
                ExprKind::Star { greedy, .. }
                | ExprKind::Plus { greedy, .. }
                | ExprKind::Optional { greedy, .. }
                | ExprKind::Repeat { greedy, .. },
            ) => *greedy = false,
            _ => unreachable!("lazy suffix only allowed directly after a quantifier"),
        }
        self.lazy_ok = false;
    }

    fn close_group(&mut self, closing: u8) -> Result<(), ParseError> {
        if self.frames.len() == 1 {
            return Err(ParseError::Unbalanced(BracketError::ExtraClose));
        }
        let frame = self.frames.pop().expect("length checked");
        let capturing = frame.capturing.expect("non-bottom frame is a group");
        if capturing != (closing == b'>') {
            return Err(ParseError::Unbalanced(BracketError::Mismatched));
        }
        let body = frame.finish();
        let expr = if capturing {
            ExprKind::Group {
                expr: Box::new(body),
                capturing: true,
            }
        } else {
            body
        };
        self.push_atom(expr);
        Ok(())
    }

    /// Parses a `[...]` class; the opening `[` has been consumed. Collapses
    /// to a plain character when the normalized class covers one byte.
    fn class(&mut self) -> Result<Matcher, ParseError> {
        let mut class = CharClass::default();
        // A `-` has been consumed and awaits its upper endpoint.
        let mut open_range = false;
        // The previous entry completed an `x-y` range.
        let mut after_range = false;
        let mut leading = true;

        loop {
            let Some(byte) = self.bump() else {
                return Err(self.err(SyntaxError::ClassUnclosed));
            };
            let escaped = byte == b'\\';
            let byte = if escaped {
                self.bump()
                    .ok_or_else(|| self.err(SyntaxError::DanglingEscape))?
            } else {
                byte
            };

            if !escaped {
                match byte {
                    b']' => {
                        if open_range {
                            return Err(self.err(SyntaxError::ClassDash));
                        }
                        break;
                    }
                    b'[' => return Err(self.err(SyntaxError::ClassNested)),
                    b'^' if leading => {
                        class.negated = true;
                        leading = false;
                        continue;
                    }
                    b'-' => {
                        if class.intervals.is_empty() || open_range || after_range {
                            return Err(self.err(SyntaxError::ClassDash));
                        }
                        open_range = true;
                        continue;
                    }
                    _ => {}
                }
            }

            if open_range {
                let interval = class
                    .intervals
                    .last_mut()
                    .expect("a range extends the previous entry");
                interval.1 = byte;
                open_range = false;
                after_range = true;
            } else {
                class.intervals.push((byte, byte));
                after_range = false;
            }
            leading = false;
        }

        class.normalize();
        if class.intervals.is_empty() {
            return Err(self.err(SyntaxError::ClassEmpty));
        }
        Ok(match class.as_single() {
            Some(byte) => Matcher::Char(byte),
            None => Matcher::Class(class),
        })
    }

    /// Parses `{m}`, `{m,}` or `{m,n}` bounds (the `{` has been consumed)
    /// and wraps the last sequence element in the resulting repetition.
    /// Spaces between the digits are ignored.
    fn repeat(&mut self) -> Result<(), ParseError> {
        let mut min = 0usize;
        let mut max = 0usize;
        let mut saw_comma = false;
        let mut saw_min_digit = false;
        let mut saw_max_digit = false;

        loop {
            let Some(byte) = self.bump() else {
                return Err(self.err(SyntaxError::RepeatUnclosed));
            };
            match byte {
                b'}' => break,
                b',' if saw_comma => return Err(self.err(SyntaxError::RepeatComma)),
                b',' => saw_comma = true,
                b'0'..=b'9' => {
                    let digit = usize::from(byte - b'0');
                    if saw_comma {
                        saw_max_digit = true;
                        max = max * 10 + digit;
                    } else {
                        saw_min_digit = true;
                        min = min * 10 + digit;
                    }
                }
                b' ' => {}
                b'\\' => return Err(self.err(SyntaxError::RepeatEscape)),
                other => return Err(self.err(SyntaxError::RepeatUnexpected(other as char))),
            }
        }

        if !saw_min_digit {
            return Err(self.err(SyntaxError::RepeatMissingMin));
        }
        let (max, unbounded) = if !saw_comma {
            (min, false)
        } else if saw_max_digit {
            if max < min {
                return Err(self.err(SyntaxError::RepeatRange));
            }
            (max, false)
        } else {
            (0, true)
        };

        let seq = &mut self.top().seq;
        let inner = seq.pop().unwrap_or(ExprKind::Lit(Matcher::Epsilon));
        seq.push(ExprKind::Repeat {
            expr: Box::new(inner),
            min,
            max,
            unbounded,
            greedy: true,
        });
        self.lazy_ok = true;
        Ok(())
    }
}

/// Splits the anchors off the pattern. A trailing `$` anchors only when it
/// is not escaped, which an odd run of preceding backslashes decides.
fn strip_anchors(input: &[u8]) -> (&[u8], bool, bool) {
    let mut body = input;
    let anchor_start = body.first() == Some(&b'^');
    if anchor_start {
        body = &body[1..];
    }
    let mut anchor_end = false;
    if body.last() == Some(&b'$') {
        let backslashes = body[..body.len() - 1]
            .iter()
            .rev()
            .take_while(|&&byte| byte == b'\\')
            .count();
        if backslashes % 2 == 0 {
            anchor_end = true;
            body = &body[..body.len() - 1];
        }
    }
    (body, anchor_start, anchor_end)
}
