#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Declare one classifier rule.
///
/// `cues` lists the keyword cues the pattern cannot match without; rules are
/// skipped when the clause lacks any of them (see `classify/cues.rs`).
#[macro_export]
macro_rules! rule {
    (
        name: $name:expr,
        kind: $kind:expr,
        pattern: $pat:literal
        $(, cues: $cues:expr)?
        $(,)?
    ) => {{
        $crate::RuleSpec {
            name: std::borrow::Cow::Borrowed($name),
            kind: $kind,
            pattern: std::borrow::Cow::Borrowed($pat),
            cues: { $crate::Cue::empty() $(| $cues)? },
        }
    }};
}
