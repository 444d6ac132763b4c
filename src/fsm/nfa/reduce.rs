//! NFA state reduction.
//!
//! Not a minimization: two cheap passes that drop unreachable and dead-end
//! states and fuse chains held together by a single unmarked epsilon
//! transition. Capture-marked edges are preserved verbatim, and splices
//! keep the forward edge order intact so greedy/lazy preference survives.

use std::mem;

use super::model::{Nfa, StateId};

impl Nfa {
    /// Removes states and returns how many went away. One call runs one
    /// backward and one forward pass; callers wanting a fixed point can
    /// iterate until this returns 0.
    pub fn reduce(&mut self) -> usize {
        let before = self.states.len();
        self.merge_backward();
        self.merge_forward();
        #[cfg(debug_assertions)]
        self.check();
        before - self.states.len()
    }

    /// Walks states in reverse index order; a non-initial state reached by
    /// nothing is removed, and one reached by a single unmarked epsilon is
    /// fused into its predecessor.
    fn merge_backward(&mut self) {
        let mut i = self.states.len();
        while i > 0 {
            i -= 1;
            let state = &self.states[i];
            if state.initial {
                continue;
            }
            if state.rtransitions.is_empty() {
                self.remove_state(i, i);
                continue;
            }
            if state.rtransitions.len() != 1 {
                continue;
            }
            let edge = state.rtransitions[0].clone();
            if !self.matchers[edge.matcher].is_epsilon() || edge.marks.is_some() {
                continue;
            }
            let pred = edge.state;
            if pred == i {
                continue;
            }
            // Replace the predecessor's edge into `i` with the whole
            // outgoing list of `i`, at the same position.
            let moved = mem::take(&mut self.states[i].transitions);
            let pos = self.states[pred]
                .transitions
                .iter()
                .position(|t| t.matcher == edge.matcher && t.state == i)
                .expect("incoming edge must have a forward half");
            self.states[pred].transitions.splice(pos..=pos, moved);
            self.remove_state(i, pred);
        }
    }

    /// The forward mirror image: dead ends go away, and a state whose only
    /// exit is a single unmarked epsilon is fused into its successor.
    fn merge_forward(&mut self) {
        let mut i = self.states.len();
        while i > 0 {
            i -= 1;
            let state = &self.states[i];
            if state.fin {
                continue;
            }
            if state.transitions.is_empty() {
                self.remove_state(i, i);
                continue;
            }
            if state.transitions.len() != 1 {
                continue;
            }
            let edge = state.transitions[0].clone();
            if !self.matchers[edge.matcher].is_epsilon() || edge.marks.is_some() {
                continue;
            }
            let succ = edge.state;
            if succ == i {
                continue;
            }
            let moved = mem::take(&mut self.states[i].rtransitions);
            let pos = self.states[succ]
                .rtransitions
                .iter()
                .position(|r| r.matcher == edge.matcher && r.state == i)
                .expect("outgoing edge must have a reverse half");
            self.states[succ].rtransitions.remove(pos);
            self.states[succ].rtransitions.extend(moved);
            self.remove_state(i, succ);
        }
    }

    /// Drops state `i` and patches every stored index: references above
    /// `i` shift down, references to `i` are redirected to `j`.
    fn remove_state(&mut self, i: StateId, j: StateId) {
        self.states.remove(i);
        let isolated = i == j;
        let j = if j > i { j - 1 } else { j };
        for state in &mut self.states {
            for edge in state
                .transitions
                .iter_mut()
                .chain(state.rtransitions.iter_mut())
            {
                debug_assert!(
                    !(isolated && edge.state == i),
                    "removed state is still referenced"
                );
                if edge.state > i {
                    edge.state -= 1;
                } else if edge.state == i {
                    edge.state = j;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::regex::Ast;
    use crate::Nfa;

    fn build(pattern: &str) -> Nfa {
        Nfa::from(&Ast::parse(pattern).expect("parse should succeed"))
    }

    #[test]
    fn reduction_shrinks_quantifier_plumbing() {
        let mut nfa = build("a*b*");
        let before = nfa.state_count();
        let removed = nfa.reduce();
        assert!(removed > 0);
        assert_eq!(nfa.state_count(), before - removed);
        nfa.check();
    }

    #[test]
    fn verdicts_survive_reduction() {
        let cases = [
            ("a*b*", &["", "ab", "aabb", "ba", "abab"][..]),
            ("(a|b)+c", &["c", "ac", "abc", "bac", "ab"][..]),
            ("<a+>b{2,3}", &["abb", "abbb", "ab", "aabb", "abbbb"][..]),
            ("^a?$", &["", "a", "aa"][..]),
        ];
        for (pattern, inputs) in cases {
            let plain = build(pattern);
            let mut reduced = build(pattern);
            while reduced.reduce() > 0 {}
            for input in inputs {
                assert_eq!(
                    plain.powerset(input),
                    reduced.powerset(input),
                    "powerset diverged for {pattern:?} on {input:?}"
                );
                let a = plain.simulate(input);
                let b = reduced.simulate(input);
                assert_eq!(a.is_some(), b.is_some(), "{pattern:?} on {input:?}");
                if let (Some(a), Some(b)) = (a, b) {
                    assert_eq!(a.get(0), b.get(0), "{pattern:?} on {input:?}");
                }
            }
        }
    }

    #[test]
    fn marked_edges_survive() {
        let mut nfa = build("<a*>");
        while nfa.reduce() > 0 {}
        nfa.check();
        let captures = nfa.simulate("aa").expect("should match");
        assert_eq!(captures.get(1), Some(0..2));
    }
}
