//! A regular expression engine built on capture-annotated Thompson NFAs.
//!
//! A pattern is parsed into an [`Ast`], optionally normalized, lowered into
//! an [`Nfa`] whose transitions carry capture-group annotations, and then
//! evaluated either by backtracking simulation (which records capture
//! spans) or by powerset construction (which decides membership only):
//!
//! ```
//! use remora::Nfa;
//!
//! let nfa = Nfa::compile(r"<[a-z.]+>@<[a-z.]+>").unwrap();
//! assert!(nfa.powerset("john.doe@example.com"));
//!
//! let captures = nfa.simulate("john.doe@example.com").unwrap();
//! assert_eq!(captures.text("john.doe@example.com", 1), Some("john.doe"));
//! assert_eq!(captures.text("john.doe@example.com", 2), Some("example.com"));
//! ```
//!
//! Patterns and inputs are treated as sequences of single-byte characters.
//! Groups written `<...>` capture; groups written `(...)` only delimit.

pub use fsm::{Captures, Nfa};
pub use regex::{Ast, BracketError, CharClass, ExprKind, Matcher, ParseError, SyntaxError};

mod fsm;
mod regex;
