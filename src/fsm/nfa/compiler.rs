//! Thompson construction with capture annotations.
//!
//! Every node is expanded between a `(begin, end)` state pair together
//! with the sets of capture groups opening on entry and closing on exit.
//! Quantifiers encode greediness purely through edge insertion order: the
//! backtracking evaluator walks edges in that order, so whichever of the
//! loop edge and the exit edge comes first is preferred.

use std::collections::BTreeSet;

use crate::regex::{Ast, ExprKind, Matcher, ParseError};

use super::model::{Nfa, StateId};

impl From<&Ast> for Nfa {
    fn from(ast: &Ast) -> Self {
        Compiler::new().compile(ast)
    }
}

impl Nfa {
    /// Parses, normalizes, builds and reduces in one step.
    pub fn compile(pattern: &str) -> Result<Nfa, ParseError> {
        let mut ast = Ast::parse(pattern)?;
        ast.normalize();
        let mut nfa = Nfa::from(&ast);
        nfa.reduce();
        Ok(nfa)
    }
}

pub(crate) struct Compiler {
    nfa: Nfa,
}

impl Compiler {
    pub(crate) fn new() -> Self {
        Self { nfa: Nfa::new() }
    }

    pub(crate) fn compile(mut self, ast: &Ast) -> Nfa {
        let begin = self.nfa.new_state();
        let end = self.nfa.new_state();
        self.nfa.states[begin].initial = true;
        self.nfa.states[end].fin = true;

        // Group 0 spans the whole expression.
        let root_marks = BTreeSet::from([0]);
        self.expr(&ast.root, begin, end, &root_marks, &root_marks);

        // Self-loops let the match float away from either end of the
        // input. They go in last so the expression's own edges are tried
        // first and the match stays leftmost.
        let none = BTreeSet::new();
        if !ast.anchor_start {
            self.nfa.add_transition(Matcher::Any, begin, begin, &none, &none);
        }
        if !ast.anchor_end {
            self.nfa.add_transition(Matcher::Any, end, end, &none, &none);
        }

        #[cfg(debug_assertions)]
        self.nfa.check();
        self.nfa
    }

    fn eps(
        &mut self,
        from: StateId,
        to: StateId,
        opens: &BTreeSet<usize>,
        closes: &BTreeSet<usize>,
    ) {
        self.nfa
            .add_transition(Matcher::Epsilon, from, to, opens, closes);
    }

    fn expr(
        &mut self,
        expr: &ExprKind,
        begin: StateId,
        end: StateId,
        opens: &BTreeSet<usize>,
        closes: &BTreeSet<usize>,
    ) {
        let none = BTreeSet::new();
        match expr {
            ExprKind::Lit(matcher) => {
                self.nfa
                    .add_transition(matcher.clone(), begin, end, opens, closes);
            }
            ExprKind::Concat(children) => {
                // Chain through fresh connector states; the first child
                // receives the opens, the last the closes.
                let mut current = begin;
                let last = children.len() - 1;
                for (i, child) in children.iter().enumerate() {
                    let next = if i != last { self.nfa.new_state() } else { end };
                    let opens = if i == 0 { opens } else { &none };
                    let closes = if i == last { closes } else { &none };
                    self.expr(child, current, next, opens, closes);
                    current = next;
                }
            }
            ExprKind::Alt(children) => {
                for child in children {
                    self.expr(child, begin, end, opens, closes);
                }
            }
            ExprKind::Group { expr, capturing } => {
                if *capturing {
                    let group = self.nfa.new_group();
                    let mut opens = opens.clone();
                    opens.insert(group);
                    let mut closes = closes.clone();
                    closes.insert(group);
                    self.expr(expr, begin, end, &opens, &closes);
                } else {
                    self.expr(expr, begin, end, opens, closes);
                }
            }
            ExprKind::Star { expr, greedy } => {
                self.star(expr, *greedy, begin, end, opens, closes);
            }
            ExprKind::Plus { expr, greedy } => {
                self.plus(expr, *greedy, begin, end, opens, closes);
            }
            ExprKind::Optional { expr, greedy } => {
                if *greedy {
                    self.expr(expr, begin, end, opens, closes);
                    self.eps(begin, end, opens, closes);
                } else {
                    self.eps(begin, end, opens, closes);
                    self.expr(expr, begin, end, opens, closes);
                }
            }
            ExprKind::Repeat {
                expr,
                min,
                max,
                unbounded,
                greedy,
            } => {
                self.repeat(expr, *min, *max, *unbounded, *greedy, begin, end, opens, closes);
            }
        }
    }

    fn star(
        &mut self,
        child: &ExprKind,
        greedy: bool,
        begin: StateId,
        end: StateId,
        opens: &BTreeSet<usize>,
        closes: &BTreeSet<usize>,
    ) {
        let none = BTreeSet::new();
        if child.accept_epsilon() {
            // A single middle state would loop the child onto itself with
            // zero width; keep entry and exit apart instead.
            let before = self.nfa.new_state();
            let after = self.nfa.new_state();
            if greedy {
                self.eps(begin, before, opens, &none);
                self.eps(begin, end, opens, closes);
            } else {
                self.eps(begin, end, opens, closes);
                self.eps(begin, before, opens, &none);
            }
            self.expr(child, before, after, &none, &none);
            if greedy {
                self.eps(after, before, &none, &none);
                self.eps(after, end, &none, closes);
            } else {
                self.eps(after, end, &none, closes);
                self.eps(after, before, &none, &none);
            }
        } else {
            let mid = self.nfa.new_state();
            self.eps(begin, mid, opens, &none);
            if greedy {
                self.expr(child, mid, mid, &none, &none);
                self.eps(mid, end, &none, closes);
            } else {
                self.eps(mid, end, &none, closes);
                self.expr(child, mid, mid, &none, &none);
            }
        }
    }

    fn plus(
        &mut self,
        child: &ExprKind,
        greedy: bool,
        begin: StateId,
        end: StateId,
        opens: &BTreeSet<usize>,
        closes: &BTreeSet<usize>,
    ) {
        let none = BTreeSet::new();
        let before = self.nfa.new_state();
        let after = self.nfa.new_state();
        self.eps(begin, before, opens, &none);
        self.expr(child, before, after, &none, &none);
        if greedy {
            self.eps(after, before, &none, &none);
            self.eps(after, end, &none, closes);
        } else {
            self.eps(after, end, &none, closes);
            self.eps(after, before, &none, &none);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn repeat(
        &mut self,
        child: &ExprKind,
        min: usize,
        max: usize,
        unbounded: bool,
        greedy: bool,
        begin: StateId,
        end: StateId,
        opens: &BTreeSet<usize>,
        closes: &BTreeSet<usize>,
    ) {
        let none = BTreeSet::new();
        let exact = !unbounded && min == max;

        // Unroll all but the last of the mandatory copies. Only copy 0
        // carries the opening marks.
        let mut current = begin;
        let mut copy = 0;
        if min != 0 {
            while copy < min - 1 {
                let next = self.nfa.new_state();
                let opens = if copy == 0 { opens } else { &none };
                self.expr(child, current, next, opens, &none);
                current = next;
                copy += 1;
            }
        }

        if exact {
            if min != 0 {
                let opens = if copy == 0 { opens } else { &none };
                self.expr(child, current, end, opens, closes);
            } else {
                self.eps(begin, end, opens, closes);
            }
        } else if unbounded {
            if min == 0 {
                // The rewriter lowers `{0,}` to a star; an unoptimized tree
                // still takes the plain single-state loop.
                let mid = self.nfa.new_state();
                self.eps(begin, mid, opens, &none);
                if greedy {
                    self.expr(child, mid, mid, &none, &none);
                    self.eps(mid, end, &none, closes);
                } else {
                    self.eps(mid, end, &none, closes);
                    self.expr(child, mid, mid, &none, &none);
                }
            } else if min == 1 {
                self.plus(child, greedy, begin, end, opens, closes);
            } else {
                let last = self.nfa.new_state();
                self.expr(child, current, last, &none, &none);
                if greedy {
                    self.eps(last, current, &none, &none);
                    self.eps(last, end, &none, closes);
                } else {
                    self.eps(last, end, &none, closes);
                    self.eps(last, current, &none, &none);
                }
            }
        } else {
            // Bounded, not exact: unroll to `max` copies with an optional
            // exit at every boundary past `min`.
            while copy < max - 1 {
                let next = self.nfa.new_state();
                let opens = if copy == 0 { opens } else { &none };
                if greedy {
                    self.expr(child, current, next, opens, &none);
                    if copy >= min {
                        self.eps(current, end, opens, closes);
                    }
                } else {
                    if copy >= min {
                        self.eps(current, end, opens, closes);
                    }
                    self.expr(child, current, next, opens, &none);
                }
                current = next;
                copy += 1;
            }
            let opens = if copy == 0 { opens } else { &none };
            if greedy {
                self.expr(child, current, end, opens, closes);
                self.eps(current, end, opens, closes);
            } else {
                self.eps(current, end, opens, closes);
                self.expr(child, current, end, opens, closes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nfa(pattern: &str) -> Nfa {
        Nfa::from(&Ast::parse(pattern).expect("parse should succeed"))
    }

    #[test]
    fn group_ids_count_from_one() {
        assert_eq!(nfa("ab").group_count(), 1);
        assert_eq!(nfa("<a>").group_count(), 2);
        assert_eq!(nfa("<a><b>").group_count(), 3);
        assert_eq!(nfa("<a<b>>").group_count(), 3);
    }

    #[test]
    fn unrolled_copies_allocate_their_own_groups() {
        assert_eq!(nfa("<a>{3}").group_count(), 4);
        assert_eq!(nfa("<a>*").group_count(), 2);
    }

    #[test]
    fn construction_passes_check() {
        for pattern in ["", "a", "a|b", "a*b+c?", "<a|bc>{2,4}", "^a{3,}$", "[a-z]."] {
            nfa(pattern).check();
        }
    }

    #[test]
    fn anchors_drop_the_boundary_loops() {
        // Anchored patterns have two fewer transitions (the two Any
        // self-loops on the boundary states).
        let free = nfa("a");
        let anchored = nfa("^a$");
        assert_eq!(free.matchers.len(), anchored.matchers.len() + 2);
    }
}
