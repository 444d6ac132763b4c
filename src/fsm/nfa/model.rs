//! NFA representation.
//!
//! States are stored in a vector and referred to by index, because the
//! reducer removes states and renumbers the rest. Every transition owns
//! one matcher in the automaton's pool and records it by index as well;
//! the pool outlives every evaluation. Each edge is mirrored: the source
//! state lists it forwards, the target state lists it backwards, and both
//! halves share one capture-mark allocation.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::regex::Matcher;

pub(crate) type StateId = usize;
pub(crate) type MatcherId = usize;

/// A nondeterministic finite automaton with capture-group annotations.
pub struct Nfa {
    pub(crate) states: Vec<State>,
    /// Owning pool, one matcher per transition ever added.
    pub(crate) matchers: Vec<Matcher>,
    /// Number of capture groups including the implicit group 0.
    pub(crate) group_count: usize,
}

pub(crate) struct State {
    pub(crate) initial: bool,
    pub(crate) fin: bool,
    /// Outgoing edges in insertion order. The order is semantically
    /// significant: it encodes greedy versus lazy preference.
    pub(crate) transitions: Vec<HalfEdge>,
    /// Incoming edges, mirroring the forward lists; used by the reducer.
    pub(crate) rtransitions: Vec<HalfEdge>,
}

/// One direction of an edge: `state` is the target when stored forwards
/// and the source when stored backwards.
#[derive(Clone)]
pub(crate) struct HalfEdge {
    pub(crate) matcher: MatcherId,
    pub(crate) state: StateId,
    pub(crate) marks: Option<Rc<CaptureMarks>>,
}

/// Capture groups whose span opens or closes when the edge is taken.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct CaptureMarks {
    pub(crate) opens: Vec<usize>,
    pub(crate) closes: Vec<usize>,
}

pub(crate) fn marks_shared(
    a: &Option<Rc<CaptureMarks>>,
    b: &Option<Rc<CaptureMarks>>,
) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

impl Nfa {
    pub(crate) fn new() -> Self {
        Self {
            states: Vec::new(),
            matchers: Vec::new(),
            group_count: 1,
        }
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub(crate) fn new_state(&mut self) -> StateId {
        self.states.push(State {
            initial: false,
            fin: false,
            transitions: Vec::new(),
            rtransitions: Vec::new(),
        });
        self.states.len() - 1
    }

    /// Allocates the next capture group index.
    pub(crate) fn new_group(&mut self) -> usize {
        let group = self.group_count;
        self.group_count += 1;
        group
    }

    /// Adds an edge carrying `matcher` (moved into the pool) and the given
    /// capture marks. Nothing is allocated for markless edges.
    pub(crate) fn add_transition(
        &mut self,
        matcher: Matcher,
        from: StateId,
        to: StateId,
        opens: &BTreeSet<usize>,
        closes: &BTreeSet<usize>,
    ) {
        let marks = if opens.is_empty() && closes.is_empty() {
            None
        } else {
            Some(Rc::new(CaptureMarks {
                opens: opens.iter().copied().collect(),
                closes: closes.iter().copied().collect(),
            }))
        };
        let matcher_id = self.matchers.len();
        self.matchers.push(matcher);
        self.states[from].transitions.push(HalfEdge {
            matcher: matcher_id,
            state: to,
            marks: marks.clone(),
        });
        self.states[to].rtransitions.push(HalfEdge {
            matcher: matcher_id,
            state: from,
            marks,
        });
    }

    /// Verifies internal consistency, panicking on violation. Every forward
    /// edge must have exactly one mirrored reverse half and vice versa,
    /// every matcher reference must point into the pool, and every capture
    /// mark must name a group below `group_count` and never be empty.
    pub fn check(&self) {
        for (id, state) in self.states.iter().enumerate() {
            for edge in &state.transitions {
                assert!(edge.state < self.states.len(), "transition target out of range");
                assert!(edge.matcher < self.matchers.len(), "matcher outside the pool");
                let mirrored = self.states[edge.state]
                    .rtransitions
                    .iter()
                    .filter(|r| {
                        r.matcher == edge.matcher
                            && r.state == id
                            && marks_shared(&r.marks, &edge.marks)
                    })
                    .count();
                assert_eq!(mirrored, 1, "forward edge without its reverse half");
                self.check_marks(&edge.marks);
            }
            for edge in &state.rtransitions {
                assert!(edge.state < self.states.len(), "reverse source out of range");
                assert!(edge.matcher < self.matchers.len(), "matcher outside the pool");
                let mirrored = self.states[edge.state]
                    .transitions
                    .iter()
                    .filter(|t| {
                        t.matcher == edge.matcher
                            && t.state == id
                            && marks_shared(&t.marks, &edge.marks)
                    })
                    .count();
                assert_eq!(mirrored, 1, "reverse edge without its forward half");
                self.check_marks(&edge.marks);
            }
        }
    }

    fn check_marks(&self, marks: &Option<Rc<CaptureMarks>>) {
        if let Some(marks) = marks {
            assert!(
                !marks.opens.is_empty() || !marks.closes.is_empty(),
                "capture marks must name at least one group"
            );
            for &group in marks.opens.iter().chain(&marks.closes) {
                assert!(group < self.group_count, "capture group out of range");
            }
        }
    }
}
