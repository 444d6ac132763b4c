use thiserror::Error;

/// Errors surfaced while parsing a pattern. Both kinds are fatal; no
/// partial [`Ast`](super::Ast) is ever returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// An ill-formed token, carrying the byte offset it was found at.
    #[error("syntax error at offset {1}: {0}")]
    Syntax(SyntaxError, usize),
    /// Group opens and closes do not pair up.
    #[error("unbalanced brackets: {0}")]
    Unbalanced(BracketError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("unmatched `]`")]
    StrayClassClose,
    #[error("unmatched `}}`")]
    StrayRepeatClose,
    #[error("dangling `\\` at end of pattern")]
    DanglingEscape,
    #[error("character class never closed")]
    ClassUnclosed,
    #[error("unescaped `[` inside a character class")]
    ClassNested,
    #[error("character class matches nothing")]
    ClassEmpty,
    #[error("`-` at a forbidden position in a character class")]
    ClassDash,
    #[error("repetition bounds never closed")]
    RepeatUnclosed,
    #[error("unexpected `{0}` in repetition bounds")]
    RepeatUnexpected(char),
    #[error("escape inside repetition bounds")]
    RepeatEscape,
    #[error("second `,` in repetition bounds")]
    RepeatComma,
    #[error("repetition bounds missing a minimum")]
    RepeatMissingMin,
    #[error("maximum repetitions less than minimum")]
    RepeatRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BracketError {
    #[error("more closing brackets than opening")]
    ExtraClose,
    #[error("capturing and non-capturing brackets paired incorrectly")]
    Mismatched,
    #[error("group never closed")]
    Unclosed,
}
