use crate::classify::{rules, Cue, RuleTable, RuleTrace};
use crate::cite::{resolve, Citation, TraversalContext};
use crate::normalize::normalize;
use crate::walk::{WalkOptions, WalkOutput, Walker};
use crate::{Actions, ContentTree};
use once_cell::sync::Lazy;
use std::time::{Duration, Instant};

static DEFAULT_RULES: Lazy<RuleTable> =
    Lazy::new(|| RuleTable::compile(rules::get()).expect("built-in rule table compiles"));

/// The built-in rule table, compiled on first use and shared afterwards.
pub fn default_rules() -> &'static RuleTable {
    &DEFAULT_RULES
}

/// Classify one clause with the built-in rules.
///
/// # Example
/// ```
/// use billdiff::{classify, ActionKind};
///
/// let actions = classify("by striking \u{201C}Attorney General\u{201D} and inserting \u{201C}Secretary\u{201D}");
/// assert_eq!(actions[&ActionKind::StrikeText]["to_replace"], "Secretary");
/// ```
pub fn classify(text: &str) -> Actions {
    default_rules().classify(&normalize(text))
}

/// Extra details returned by [`classify_verbose`] and [`classify_verbose_with`].
///
/// Meant for rule debugging: which rules the cues let through, which matched,
/// and what the resolver made of the clause on its own (no ancestors).
#[derive(Debug, Clone)]
pub struct ClassifyDetails {
    pub text: String,
    pub normalized: String,
    pub cues: Cue,
    /// Every rule of the table, in table order.
    pub rules: Vec<RuleTrace>,
    pub actions: Actions,
    pub citations: Vec<Citation>,
    pub elapsed: Duration,
}

pub fn classify_verbose(text: &str) -> ClassifyDetails {
    classify_verbose_with(default_rules(), text)
}

pub fn classify_verbose_with(rules: &RuleTable, text: &str) -> ClassifyDetails {
    let start = Instant::now();
    let normalized = normalize(text);
    let cues = Cue::scan(&normalized);
    let traces = rules.explain(&normalized);
    let actions = rules.classify(&normalized);
    let citations = resolve(text, &mut TraversalContext::new());

    ClassifyDetails {
        text: text.to_string(),
        normalized,
        cues,
        rules: traces,
        actions,
        citations,
        elapsed: start.elapsed(),
    }
}

/// Walk one bill against `code` with the built-in rules.
pub fn apply_bill(code: &ContentTree, bill: &ContentTree, options: WalkOptions) -> WalkOutput {
    Walker::new(default_rules(), code, options).walk(bill)
}
