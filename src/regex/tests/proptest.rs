//! Property tests over generated pattern strings.
//!
//! Patterns are assembled compositionally (atoms, classes, quantifier
//! suffixes, groups, alternation) so every generated string is valid by
//! construction; inputs come from the same small alphabet the atoms use,
//! which keeps accidental matches common enough to be interesting.

use proptest::{collection, option, prelude::*};
use proptest_derive::Arbitrary;

use crate::regex::Ast;
use crate::Nfa;

#[derive(Debug, Clone, Copy, Arbitrary)]
enum QuantKind {
    Star,
    Plus,
    Question,
}

fn quantifier() -> impl Strategy<Value = String> {
    let lazy = |q: String, lazy: bool| if lazy { format!("{q}?") } else { q };
    prop_oneof![
        3 => (any::<QuantKind>(), any::<bool>()).prop_map(move |(kind, is_lazy)| {
            let base = match kind {
                QuantKind::Star => "*",
                QuantKind::Plus => "+",
                QuantKind::Question => "?",
            };
            lazy(base.to_string(), is_lazy)
        }),
        1 => (0usize..=3, any::<bool>())
            .prop_map(move |(n, is_lazy)| lazy(format!("{{{n}}}"), is_lazy)),
        1 => (0usize..=2, any::<bool>())
            .prop_map(move |(n, is_lazy)| lazy(format!("{{{n},}}"), is_lazy)),
        1 => (0usize..=2, 0usize..=2, any::<bool>())
            .prop_map(move |(min, extra, is_lazy)| {
                lazy(format!("{{{min},{}}}", min + extra), is_lazy)
            }),
    ]
}

fn class() -> impl Strategy<Value = String> {
    let item = prop::sample::select(vec![
        "a", "b", "c", "x", "0", "a-c", "0-9", "c-a", r"\-", r"\]", r"\^",
    ]);
    (any::<bool>(), collection::vec(item, 1..=3)).prop_map(|(negated, items)| {
        format!(
            "[{}{}]",
            if negated { "^" } else { "" },
            items.concat()
        )
    })
}

fn atom() -> impl Strategy<Value = String> {
    prop_oneof![
        5 => prop::sample::select(vec!["a", "b", "c", "0", "."]).prop_map(str::to_string),
        1 => prop::sample::select(vec![r"\*", r"\\", r"\a", r"\$"]).prop_map(str::to_string),
        2 => class(),
    ]
}

fn pattern() -> impl Strategy<Value = String> {
    let leaf = (atom(), option::of(quantifier())).prop_map(|(atom, quant)| match quant {
        Some(quant) => format!("{atom}{quant}"),
        None => atom,
    });
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            collection::vec(inner.clone(), 1..=3).prop_map(|parts| parts.concat()),
            collection::vec(inner.clone(), 2..=3).prop_map(|parts| parts.join("|")),
            (inner, any::<bool>(), option::of(quantifier())).prop_map(
                |(body, capturing, quant)| {
                    let grouped = if capturing {
                        format!("<{body}>")
                    } else {
                        format!("({body})")
                    };
                    match quant {
                        Some(quant) => format!("{grouped}{quant}"),
                        None => grouped,
                    }
                }
            ),
        ]
    })
}

fn anchored_pattern() -> impl Strategy<Value = String> {
    (any::<bool>(), pattern(), any::<bool>()).prop_map(|(start, body, end)| {
        format!(
            "{}{}{}",
            if start { "^" } else { "" },
            body,
            if end { "$" } else { "" }
        )
    })
}

fn input() -> impl Strategy<Value = String> {
    collection::vec(prop::sample::select(vec!['a', 'b', 'c', 'x', '0']), 0..=6)
        .prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    /// Every generated pattern parses.
    #[test]
    fn generated_patterns_parse(pattern in anchored_pattern()) {
        Ast::parse(&pattern).unwrap();
    }

    /// Printing a normalized tree and parsing it back reproduces the tree,
    /// and printing is a fixed point from then on.
    #[test]
    fn print_parse_roundtrip(pattern in anchored_pattern()) {
        let mut ast = Ast::parse(&pattern).unwrap();
        ast.normalize();
        let printed = ast.to_string();

        let mut reparsed = Ast::parse(&printed).unwrap();
        reparsed.normalize();
        prop_assert_eq!(&reparsed, &ast, "printed form: {}", printed);
        prop_assert_eq!(reparsed.to_string(), printed);
    }

    #[test]
    fn normalize_is_idempotent(pattern in anchored_pattern()) {
        let mut once = Ast::parse(&pattern).unwrap();
        once.normalize();
        let mut twice = once.clone();
        twice.normalize();
        prop_assert_eq!(once, twice);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The raw and the normalized-and-reduced pipelines accept the same
    /// language, both evaluators agree with each other, and group 0 spans
    /// the same bytes either way.
    #[test]
    fn pipelines_and_evaluators_agree(
        pattern in anchored_pattern(),
        text in input(),
    ) {
        let raw = Ast::parse(&pattern).unwrap();
        let plain = Nfa::from(&raw);

        let mut normalized = raw.clone();
        normalized.normalize();
        let mut reduced = Nfa::from(&normalized);
        while reduced.reduce() > 0 {}

        let plain_captures = plain.simulate(&text);
        let reduced_captures = reduced.simulate(&text);

        prop_assert_eq!(plain_captures.is_some(), plain.powerset(&text));
        prop_assert_eq!(reduced_captures.is_some(), reduced.powerset(&text));
        prop_assert_eq!(plain_captures.is_some(), reduced_captures.is_some());
        if let (Some(plain_captures), Some(reduced_captures)) =
            (&plain_captures, &reduced_captures)
        {
            prop_assert_eq!(plain_captures.get(0), reduced_captures.get(0));
        }

        if text.is_empty() {
            prop_assert_eq!(plain_captures.is_some(), raw.accept_epsilon());
        }
    }
}
