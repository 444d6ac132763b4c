pub use nfa::{Captures, Nfa};

mod nfa;
