//! Graphviz rendering of an automaton, for eyeballing constructions.

use std::fmt::Write;

use crate::regex::Matcher;

use super::model::{HalfEdge, Nfa};

impl Nfa {
    /// Converts the NFA to the graphviz dot language format.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph nfa {\n\trankdir = LR;\n\n");
        for (id, state) in self.states.iter().enumerate() {
            let shape = if state.fin { "doublecircle" } else { "circle" };
            let _ = writeln!(out, "\t{id} [shape = {shape}];");
            if state.initial {
                let _ = writeln!(out, "\tstart [shape = none]; start -> {id};");
            }
        }
        out.push('\n');
        for (id, state) in self.states.iter().enumerate() {
            for edge in &state.transitions {
                let _ = writeln!(
                    out,
                    "\t{} -> {} [label = \"{}\"];",
                    id,
                    edge.state,
                    self.edge_label(edge)
                );
            }
        }
        out.push('}');
        out
    }

    fn edge_label(&self, edge: &HalfEdge) -> String {
        let mut label = match &self.matchers[edge.matcher] {
            Matcher::Epsilon => "eps".to_string(),
            matcher => matcher.to_string().replace('\\', "\\\\").replace('"', "\\\""),
        };
        if let Some(marks) = &edge.marks {
            if !marks.opens.is_empty() {
                let _ = write!(label, " o:{:?}", marks.opens);
            }
            if !marks.closes.is_empty() {
                let _ = write!(label, " c:{:?}", marks.closes);
            }
        }
        label
    }
}
