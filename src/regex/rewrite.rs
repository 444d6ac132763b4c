//! Tree normalization.
//!
//! A post-order walk flattens nested concatenations and alternations,
//! lowers counted repetitions onto the simpler quantifiers, and fuses
//! directly nested quantifiers. One walk reaches a fixed point:
//! `normalize` is idempotent and preserves the recognized language.

use super::ast::{Ast, ExprKind, Matcher};

impl Ast {
    /// Rewrites the tree into its normal form.
    pub fn normalize(&mut self) {
        let root = std::mem::replace(&mut self.root, ExprKind::Lit(Matcher::Epsilon));
        self.root = normalize(root);
    }
}

pub(crate) fn normalize(expr: ExprKind) -> ExprKind {
    let expr = match expr {
        ExprKind::Group { expr, capturing } => ExprKind::Group {
            expr: Box::new(normalize(*expr)),
            capturing,
        },
        ExprKind::Star { expr, greedy } => ExprKind::Star {
            expr: Box::new(normalize(*expr)),
            greedy,
        },
        ExprKind::Plus { expr, greedy } => ExprKind::Plus {
            expr: Box::new(normalize(*expr)),
            greedy,
        },
        ExprKind::Optional { expr, greedy } => ExprKind::Optional {
            expr: Box::new(normalize(*expr)),
            greedy,
        },
        ExprKind::Repeat {
            expr,
            min,
            max,
            unbounded,
            greedy,
        } => ExprKind::Repeat {
            expr: Box::new(normalize(*expr)),
            min,
            max,
            unbounded,
            greedy,
        },
        ExprKind::Concat(children) => {
            ExprKind::Concat(children.into_iter().map(normalize).collect())
        }
        ExprKind::Alt(children) => ExprKind::Alt(children.into_iter().map(normalize).collect()),
        leaf @ ExprKind::Lit(_) => leaf,
    };
    fuse(collapse_epsilon(lower_repeat(flatten(expr))))
}

/// A quantifier over a bare epsilon matches exactly the empty string, so
/// it reduces to the epsilon itself. Capturing groups are left alone.
fn collapse_epsilon(expr: ExprKind) -> ExprKind {
    match &expr {
        ExprKind::Star { expr: child, .. }
        | ExprKind::Plus { expr: child, .. }
        | ExprKind::Optional { expr: child, .. }
        | ExprKind::Repeat { expr: child, .. }
            if matches!(**child, ExprKind::Lit(Matcher::Epsilon)) =>
        {
            ExprKind::Lit(Matcher::Epsilon)
        }
        _ => expr,
    }
}

/// Splices a Concat child into a Concat parent (and Alt into Alt),
/// preserving child order. Children are already normalized, so one level
/// of splicing suffices. Epsilon is the identity of concatenation, so
/// lowered `{0}` leftovers drop out of a Concat here; an epsilon branch
/// of an Alt stays, it makes the branch match the empty string.
fn flatten(expr: ExprKind) -> ExprKind {
    match expr {
        ExprKind::Concat(children) => {
            let mut flat = Vec::with_capacity(children.len());
            for child in children {
                match child {
                    ExprKind::Concat(inner) => flat.extend(inner),
                    ExprKind::Lit(Matcher::Epsilon) => {}
                    other => flat.push(other),
                }
            }
            match flat.len() {
                0 => ExprKind::Lit(Matcher::Epsilon),
                1 => flat.pop().expect("length checked"),
                _ => ExprKind::Concat(flat),
            }
        }
        ExprKind::Alt(children) => {
            let mut flat = Vec::with_capacity(children.len());
            for child in children {
                match child {
                    ExprKind::Alt(inner) => flat.extend(inner),
                    other => flat.push(other),
                }
            }
            ExprKind::Alt(flat)
        }
        other => other,
    }
}

/// Lowers counted repetitions: `{n}{m}` multiplies onto the grandchild,
/// `{0,}`/`{1,}` become Star/Plus carrying the repetition's greedy flag,
/// `{0}` vanishes into an epsilon and `{1}` into the bare child.
fn lower_repeat(expr: ExprKind) -> ExprKind {
    let ExprKind::Repeat {
        expr: child,
        mut min,
        mut max,
        unbounded,
        greedy,
    } = expr
    else {
        return expr;
    };

    let exact = !unbounded && min == max;
    let child = match *child {
        ExprKind::Repeat {
            expr: grandchild,
            min: inner_min,
            max: inner_max,
            unbounded: false,
            ..
        } if exact && inner_min == inner_max => {
            min *= inner_min;
            max = min;
            *grandchild
        }
        other => other,
    };

    if unbounded && min <= 1 {
        let expr = Box::new(child);
        return if min == 0 {
            ExprKind::Star { expr, greedy }
        } else {
            ExprKind::Plus { expr, greedy }
        };
    }
    if !unbounded && min == max {
        if min == 0 {
            return ExprKind::Lit(Matcher::Epsilon);
        }
        if min == 1 {
            return child;
        }
    }
    ExprKind::Repeat {
        expr: Box::new(child),
        min,
        max,
        unbounded,
        greedy,
    }
}

/// Fuses directly nested Star/Plus/Optional pairs until none applies,
/// re-examining the new root after every step.
fn fuse(mut expr: ExprKind) -> ExprKind {
    loop {
        match fuse_once(expr) {
            Ok(fused) => expr = fused,
            Err(done) => return done,
        }
    }
}

/// One fusion step; `Err` returns the expression unchanged.
fn fuse_once(expr: ExprKind) -> Result<ExprKind, ExprKind> {
    match expr {
        ExprKind::Star { expr: inner, greedy: outer } => match *inner {
            ExprKind::Star { expr, greedy } => Ok(ExprKind::Star {
                expr,
                greedy: outer & greedy,
            }),
            // Star over Plus keeps the outer preference.
            ExprKind::Plus { expr, .. } => Ok(ExprKind::Star {
                expr,
                greedy: outer,
            }),
            ExprKind::Optional { expr, greedy } => Ok(ExprKind::Star {
                expr,
                greedy: outer & greedy,
            }),
            other => Err(ExprKind::Star {
                expr: Box::new(other),
                greedy: outer,
            }),
        },
        ExprKind::Plus { expr: inner, greedy: outer } => match *inner {
            ExprKind::Plus { expr, greedy } => Ok(ExprKind::Plus {
                expr,
                greedy: outer | greedy,
            }),
            // Plus over Star keeps the inner preference.
            ExprKind::Star { expr, greedy } => Ok(ExprKind::Star { expr, greedy }),
            ExprKind::Optional { expr, greedy } if outer || !greedy => Ok(ExprKind::Star {
                expr,
                greedy: outer & greedy,
            }),
            other => Err(ExprKind::Plus {
                expr: Box::new(other),
                greedy: outer,
            }),
        },
        ExprKind::Optional { expr: inner, greedy: outer } => match *inner {
            ExprKind::Optional { expr, greedy } => Ok(ExprKind::Optional {
                expr,
                greedy: outer & greedy,
            }),
            ExprKind::Star { expr, greedy } => Ok(ExprKind::Star {
                expr,
                greedy: outer & greedy,
            }),
            ExprKind::Plus { expr, greedy } if !outer || greedy => Ok(ExprKind::Star {
                expr,
                greedy: outer & greedy,
            }),
            other => Err(ExprKind::Optional {
                expr: Box::new(other),
                greedy: outer,
            }),
        },
        other => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(pattern: &str) -> ExprKind {
        let mut ast = Ast::parse(pattern).expect("parse should succeed");
        ast.normalize();
        ast.root
    }

    fn lit(byte: u8) -> ExprKind {
        ExprKind::Lit(Matcher::Char(byte))
    }

    #[test]
    fn concat_flattens() {
        assert_eq!(
            normalized("(ab)c"),
            ExprKind::Concat(vec![lit(b'a'), lit(b'b'), lit(b'c')])
        );
    }

    #[test]
    fn alt_flattens() {
        assert_eq!(
            normalized("(a|b)|c"),
            ExprKind::Alt(vec![lit(b'a'), lit(b'b'), lit(b'c')])
        );
    }

    #[test]
    fn repeat_zero_is_epsilon() {
        assert_eq!(normalized("a{0}"), ExprKind::Lit(Matcher::Epsilon));
    }

    #[test]
    fn lowered_epsilons_drop_out_of_concatenations() {
        assert_eq!(
            normalized("a{0}b"),
            ExprKind::Lit(Matcher::Char(b'b'))
        );
        assert_eq!(
            normalized("a{0}b{0}c"),
            ExprKind::Lit(Matcher::Char(b'c'))
        );
        assert_eq!(
            normalized("a{0}b{0}"),
            ExprKind::Lit(Matcher::Epsilon)
        );
        // An epsilon alternation branch is meaningful and stays.
        assert_eq!(
            normalized("a|"),
            ExprKind::Alt(vec![
                ExprKind::Lit(Matcher::Char(b'a')),
                ExprKind::Lit(Matcher::Epsilon)
            ])
        );
    }

    #[test]
    fn quantified_epsilon_collapses() {
        assert_eq!(normalized("*"), ExprKind::Lit(Matcher::Epsilon));
        assert_eq!(normalized("a()*"), ExprKind::Lit(Matcher::Char(b'a')));
        assert_eq!(
            normalized("b(a{0})*"),
            ExprKind::Lit(Matcher::Char(b'b'))
        );
        // A capturing group around an epsilon is not touched.
        assert!(matches!(normalized("<>"), ExprKind::Group { .. }));
    }

    #[test]
    fn repeat_one_is_the_child() {
        assert_eq!(normalized("a{1}"), lit(b'a'));
        assert_eq!(normalized("a{1,1}"), lit(b'a'));
    }

    #[test]
    fn nested_exact_repeats_multiply() {
        assert_eq!(
            normalized("a{2}{3}"),
            ExprKind::Repeat {
                expr: Box::new(lit(b'a')),
                min: 6,
                max: 6,
                unbounded: false,
                greedy: true
            }
        );
    }

    #[test]
    fn unbounded_repeats_lower_to_star_and_plus() {
        assert_eq!(
            normalized("a{0,}"),
            ExprKind::Star {
                expr: Box::new(lit(b'a')),
                greedy: true
            }
        );
        assert_eq!(
            normalized("a{1,}?"),
            ExprKind::Plus {
                expr: Box::new(lit(b'a')),
                greedy: false
            }
        );
    }

    #[test]
    fn bounded_repeat_survives() {
        assert_eq!(
            normalized("a{2,4}"),
            ExprKind::Repeat {
                expr: Box::new(lit(b'a')),
                min: 2,
                max: 4,
                unbounded: false,
                greedy: true
            }
        );
    }

    #[test]
    fn star_of_star_is_star() {
        assert_eq!(
            normalized("(a*)*"),
            ExprKind::Star {
                expr: Box::new(lit(b'a')),
                greedy: true
            }
        );
    }

    #[test]
    fn fusion_cascades_to_a_single_quantifier() {
        assert_eq!(
            normalized("((a*)*)*"),
            ExprKind::Star {
                expr: Box::new(lit(b'a')),
                greedy: true
            }
        );
    }

    #[test]
    fn fusion_greedy_policies() {
        // Star over Star: both must be greedy for the result to be.
        assert!(matches!(
            normalized("(a*?)*"),
            ExprKind::Star { greedy: false, .. }
        ));
        // Plus over Plus: either greedy keeps the result greedy.
        assert!(matches!(
            normalized("(a+?)+"),
            ExprKind::Plus { greedy: true, .. }
        ));
        // Plus over Star keeps the inner flag.
        assert!(matches!(
            normalized("(a*?)+"),
            ExprKind::Star { greedy: false, .. }
        ));
        assert!(matches!(
            normalized("(a*)+?"),
            ExprKind::Star { greedy: true, .. }
        ));
        // Star over Plus keeps the outer flag.
        assert!(matches!(
            normalized("(a+?)*"),
            ExprKind::Star { greedy: true, .. }
        ));
    }

    #[test]
    fn optional_plus_fusion_is_conditional() {
        // Greedy Optional over greedy Plus fuses to a Star.
        assert!(matches!(
            normalized("(a+)?"),
            ExprKind::Star { greedy: true, .. }
        ));
        // Lazy Plus under a greedy Optional does not fuse.
        assert!(matches!(
            normalized("(a+?)?"),
            ExprKind::Optional { greedy: true, .. }
        ));
        // Plus over Optional: greedy outer fuses.
        assert!(matches!(
            normalized("(a?)+"),
            ExprKind::Star { greedy: true, .. }
        ));
        // Lazy Plus over greedy Optional does not fuse.
        assert!(matches!(
            normalized("(a?)+?"),
            ExprKind::Plus { greedy: false, .. }
        ));
    }

    #[test]
    fn capturing_group_blocks_fusion() {
        assert!(matches!(
            normalized("<a*>*"),
            ExprKind::Star { .. }
        ));
        let ExprKind::Star { expr, .. } = normalized("<a*>*") else {
            panic!("expected a star");
        };
        assert!(matches!(*expr, ExprKind::Group { .. }));
    }

    #[test]
    fn normalize_is_idempotent() {
        for pattern in ["(ab)c|d", "((a*)?)+", "a{2}{3}b{0}", "<a|b>*c{1,3}?", "a{0,}{1}"] {
            let mut once = Ast::parse(pattern).expect("parse should succeed");
            once.normalize();
            let mut twice = once.clone();
            twice.normalize();
            assert_eq!(once, twice, "pattern {pattern:?}");
        }
    }

    #[test]
    fn normalize_preserves_epsilon_acceptance() {
        for pattern in ["a*", "a{0}", "a{1,}", "(a|)b*", "a{2,4}", "<>"] {
            let raw = Ast::parse(pattern).expect("parse should succeed");
            let mut norm = raw.clone();
            norm.normalize();
            assert_eq!(raw.accept_epsilon(), norm.accept_epsilon(), "{pattern:?}");
        }
    }
}
