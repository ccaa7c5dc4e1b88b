//! Rule compilation and indexing.
//!
//! This is the *static* side of classification: an ordered list of
//! [`RuleSpec`]s is compiled into a [`RuleTable`] once, and the table is then
//! shared (read-only) by every clause of every bill.
//!
//! The table keeps two views of the same rules:
//!
//! - `rules`: every compiled rule in declaration order.
//! - `by_kind`: for each [`ActionKind`], the ids of its rules in declaration
//!   order. This is the order the first-match-wins cascade walks.
//!
//! ## Rule table format
//!
//! External tables are JSON, an ordered list of `(kind, [pattern, ...])`
//! pairs:
//!
//! ```text
//! [
//!   ["STRIKE-TEXT", ["striking \"(?P<to_remove_text>[^\"]+)\" and inserting ...", "..."]],
//!   ["REDESIGNATE", ["..."]]
//! ]
//! ```
//!
//! A kind may appear more than once; later entries append to its list.
//!
//! ## Invariants
//!
//! - `RuleId` is an index into `RuleTable::rules`.
//! - Every named capture of a rule is in its kind's field vocabulary
//!   ([`ActionKind::fields`]); compilation rejects anything else.

use super::cues::Cue;
use crate::action::field;
use crate::error::{Error, Result};
use crate::{ActionKind, Actions, CapturedFields};
use regex::Regex;
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::trace;

/// Rule identifier (index into the table's rule vector).
pub type RuleId = usize;

/// An uncompiled rule, as declared with `rule!` or loaded from JSON.
#[derive(Debug, Clone)]
pub struct RuleSpec {
    pub name: Cow<'static, str>,
    pub kind: ActionKind,
    pub pattern: Cow<'static, str>,
    /// Cues the pattern cannot match without. Empty means always on.
    pub cues: Cue,
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: Cow<'static, str>,
    pub kind: ActionKind,
    pub regex: Regex,
    pub cues: Cue,
}

/// What one rule did on one clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A required cue was missing; the pattern never ran.
    Gated,
    Missed,
    Matched,
    /// An earlier rule of the same kind had already matched.
    NotTried,
}

#[derive(Debug, Clone)]
pub struct RuleTrace {
    pub name: String,
    pub kind: ActionKind,
    pub verdict: Verdict,
}

#[derive(Deserialize)]
struct TableEntry(ActionKind, Vec<String>);

/// Compiled, ordered rule set.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<CompiledRule>,
    by_kind: BTreeMap<ActionKind, Vec<RuleId>>,
}

impl RuleTable {
    /// Compile `specs`, keeping their order.
    pub fn compile(specs: Vec<RuleSpec>) -> Result<Self> {
        let mut rules = Vec::with_capacity(specs.len());
        let mut by_kind: BTreeMap<ActionKind, Vec<RuleId>> = BTreeMap::new();

        for spec in specs {
            let ids = by_kind.entry(spec.kind).or_default();
            let index = ids.len();

            let regex = Regex::new(&spec.pattern).map_err(|source| Error::RulePattern {
                kind: spec.kind,
                index,
                source,
            })?;
            let allowed = spec.kind.fields();
            if let Some(name) = regex.capture_names().flatten().find(|name| !allowed.contains(name)) {
                return Err(Error::UnknownCapture { kind: spec.kind, index, name: name.to_string() });
            }

            ids.push(rules.len());
            rules.push(CompiledRule { name: spec.name, kind: spec.kind, regex, cues: spec.cues });
        }

        Ok(RuleTable { rules, by_kind })
    }

    /// Load an external table. External rules carry no cues, so they are
    /// always tried.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<TableEntry> = serde_json::from_str(json)?;
        let mut specs = Vec::new();
        for TableEntry(kind, patterns) in entries {
            for pattern in patterns {
                let name = format!("{kind}#{}", specs.iter().filter(|s: &&RuleSpec| s.kind == kind).count());
                specs.push(RuleSpec { name: Cow::Owned(name), kind, pattern: Cow::Owned(pattern), cues: Cue::empty() });
            }
        }
        Self::compile(specs)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules of `kind`, in the order they are tried.
    pub fn rules_for(&self, kind: ActionKind) -> impl Iterator<Item = &CompiledRule> {
        self.by_kind.get(&kind).into_iter().flatten().map(|&id| &self.rules[id])
    }

    /// Classify one normalized clause.
    ///
    /// For each kind the first matching rule wins and its named captures
    /// become the kind's fields. `EFFECTIVE-DATE` additionally keeps the whole
    /// matched span under `full_match`. No match yields an empty map.
    pub fn classify(&self, text: &str) -> Actions {
        let cues = Cue::scan(text);
        let mut actions = Actions::new();

        for (&kind, ids) in &self.by_kind {
            for &id in ids {
                let rule = &self.rules[id];
                if !cues.contains(rule.cues) {
                    continue;
                }
                let Some(caps) = rule.regex.captures(text) else {
                    continue;
                };

                let mut fields = CapturedFields::new();
                for name in rule.regex.capture_names().flatten() {
                    if let Some(m) = caps.name(name) {
                        fields.insert(name.to_string(), m.as_str().to_string());
                    }
                }
                if kind == ActionKind::EffectiveDate {
                    if let Some(span) = caps.get(0) {
                        fields.insert(field::FULL_MATCH.to_string(), span.as_str().to_string());
                    }
                }

                trace!(rule = %rule.name, %kind, ?fields, "rule matched");
                actions.insert(kind, fields);
                break;
            }
        }

        actions
    }

    /// Per-rule account of [`classify`](Self::classify) on `text`, in table
    /// order. Slower; meant for reports.
    pub fn explain(&self, text: &str) -> Vec<RuleTrace> {
        let cues = Cue::scan(text);
        let mut traces = Vec::with_capacity(self.rules.len());

        for ids in self.by_kind.values() {
            let mut won = false;
            for &id in ids {
                let rule = &self.rules[id];
                let verdict = if won {
                    Verdict::NotTried
                } else if !cues.contains(rule.cues) {
                    Verdict::Gated
                } else if rule.regex.is_match(text) {
                    won = true;
                    Verdict::Matched
                } else {
                    Verdict::Missed
                };
                traces.push(RuleTrace { name: rule.name.to_string(), kind: rule.kind, verdict });
            }
        }

        traces
    }
}
