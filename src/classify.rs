//! Clause classification.
//!
//! Maps one normalized clause to the amendment actions it expresses. The
//! engine is a fixed cascade of regular expressions, not a model: what it
//! recognizes, and which reading wins when two rules overlap, is entirely a
//! matter of rule order.
//!
//! ```text
//! rules (ordered, per kind) ──┐
//!                             │  RuleTable::compile         (table.rs)
//!                             └──────────────┬─────────────
//!                                            │
//! clause ── Cue::scan ───────────────────────┼─ skip rules whose cues are absent
//!          (cues.rs)                         │
//!                                            v
//!                          per kind: first matching rule wins
//!                                            │
//!                                            v
//!                            BTreeMap<ActionKind, CapturedFields>
//! ```
//!
//! ## Ordering contract
//!
//! Within one kind, rules are tried in declaration order and the first match
//! wins. General catch-alls must follow every special case that shares their
//! vocabulary, otherwise they shadow them silently. Across kinds there is no
//! ordering: several kinds can match the same clause, and callers decide
//! which ones to act on (see [`ActionKind::shadowed_by`]).
//!
//! ## Responsibilities by module
//!
//! - `cues.rs`: cheap keyword scan used to gate rules.
//! - `table.rs`: compiled rule table, JSON loading, capture validation.
//! - `rules.rs`: the built-in, documented rule list.

#[path = "classify/cues.rs"]
mod cues;
#[path = "classify/rules.rs"]
pub(crate) mod rules;
#[path = "classify/table.rs"]
mod table;

pub use cues::Cue;
pub use table::{CompiledRule, RuleId, RuleSpec, RuleTable, RuleTrace, Verdict};

use crate::ActionKind;

impl ActionKind {
    /// Kinds that, when matched on the same clause, make this one redundant.
    ///
    /// `AmendMultiple` is a pure marker and never dispatched at all; this
    /// covers the cases where two mutating rules read the same words.
    pub fn shadowed_by(self) -> &'static [ActionKind] {
        match self {
            ActionKind::StrikeText => &[ActionKind::StrikeEnd],
            ActionKind::StrikeSection => &[ActionKind::ReplaceSection],
            ActionKind::InsertSectionAfter => &[ActionKind::ReplaceSection],
            ActionKind::InsertEnd => &[ActionKind::InsertTextEnd, ActionKind::InsertSectionEnd],
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::field;
    use crate::api::default_rules;
    use crate::normalize::normalize;
    use std::borrow::Cow;

    fn classify(text: &str) -> crate::Actions {
        default_rules().classify(&normalize(text))
    }

    #[test]
    fn strike_and_insert_scenario() {
        let actions = classify(
            "Section 101(a) of title 5, United States Code, is amended by striking \"Attorney General\" and inserting \"Secretary\".",
        );
        let fields = &actions[&ActionKind::StrikeText];
        assert_eq!(fields[field::TO_REMOVE_TEXT], "Attorney General");
        assert_eq!(fields[field::TO_REPLACE], "Secretary");
        assert!(!fields.contains_key(field::EACH_PLACE));
    }

    #[test]
    fn examples_matching() {
        // (expected kind, clause)
        let cases: Vec<(ActionKind, &str)> = vec![
            (ActionKind::AmendMultiple, "Section 1395 of title 42, United States Code, is amended--"),
            (ActionKind::AmendMultiple, "Paragraphs (1) and (2) of subsection (a) are each amended—"),
            (ActionKind::StrikeText, "by striking \"shall\" each place it appears and inserting \"may\""),
            (ActionKind::StrikeText, "by striking \"or\";"),
            (ActionKind::StrikeEnd, "by striking the period at the end and inserting \"; and\""),
            (ActionKind::StrikeEnd, "by striking \"and\" at the end;"),
            (ActionKind::InsertTextAfter, "by inserting \", or fee\" after \"tax\""),
            (ActionKind::InsertTextBefore, "by inserting \"annual\" before \"report\" each place it appears"),
            (ActionKind::InsertTextEnd, "by inserting \"or the Secretary\" at the end"),
            (ActionKind::InsertEnd, "by adding at the end the following:"),
            (ActionKind::InsertSectionEnd, "by adding at the end the following new paragraph:"),
            (ActionKind::InsertSectionEnd, "by adding at the end of subsection (b) the following:"),
            (ActionKind::InsertSectionAfter, "by inserting after paragraph (2) the following:"),
            (ActionKind::StrikeSection, "by striking paragraph (3);"),
            (ActionKind::StrikeSection, "by striking paragraphs (3) and (4) and redesignating paragraph (5) as paragraph (3)"),
            (ActionKind::ReplaceSection, "by striking subsection (b) and inserting the following:"),
            (ActionKind::ReplaceSection, "by amending paragraph (2) to read as follows:"),
            (ActionKind::ReplaceSection, "Section 5 of such title is amended to read as follows:"),
            (ActionKind::Redesignate, "by redesignating paragraph (3) as paragraph (4)"),
            (ActionKind::Redesignate, "by redesignating paragraphs (3) and (4) as paragraphs (4) and (5), respectively"),
            (ActionKind::Repeal, "Section 7 of such Act is repealed."),
            (ActionKind::Repeal, "by repealing subsection (c)"),
            (ActionKind::EffectiveDate, "The amendments made by this section shall take effect 180 days after the date of enactment of this Act."),
            (ActionKind::EffectiveDate, "This Act shall take effect on the date of the enactment of this Act."),
            (ActionKind::TermDefinition, "the term \"covered entity\" means a person"),
            (ActionKind::ShortTitle, "This Act may be cited as the \"Safe Harbor Act of 2024\"."),
        ];

        for (expected, input) in cases {
            let actions = classify(input);
            assert!(actions.contains_key(&expected), "expected {expected} for '{input}', got {actions:?}");
        }
    }

    #[test]
    fn unmatched_text_is_empty_not_an_error() {
        assert!(classify("The Congress finds the following:").is_empty());
        assert!(classify("").is_empty());
    }

    #[test]
    fn effective_date_keeps_full_span() {
        let actions = classify("The amendments shall take effect 90 days after the date of enactment of this Act.");
        let fields = &actions[&ActionKind::EffectiveDate];
        assert_eq!(fields[field::AMOUNT], "90");
        assert_eq!(fields[field::UNIT], "days");
        assert_eq!(fields[field::FULL_MATCH], "shall take effect 90 days after the date of enactment");
    }

    #[test]
    fn catch_all_strike_does_not_shadow_specific_forms() {
        let actions = classify("by striking \"Secretary\" each place it appears and inserting \"Administrator\"");
        let fields = &actions[&ActionKind::StrikeText];
        assert_eq!(fields[field::TO_REPLACE], "Administrator");
        assert!(fields.contains_key(field::EACH_PLACE));
    }

    #[test]
    fn several_kinds_can_match_one_clause() {
        let actions = classify("Section 2 is amended by striking subsection (b) and inserting the following:");
        assert!(actions.contains_key(&ActionKind::ReplaceSection));
        assert!(!actions.contains_key(&ActionKind::StrikeSection));

        let actions = classify("by adding at the end the following: \"Such term includes tribes.\"");
        assert!(actions.contains_key(&ActionKind::InsertTextEnd));
        assert!(actions.contains_key(&ActionKind::InsertEnd));
        assert!(ActionKind::InsertEnd.shadowed_by().contains(&ActionKind::InsertTextEnd));
    }

    #[test]
    fn swapping_two_overlapping_rules_is_observable() {
        let specific = RuleSpec {
            name: Cow::Borrowed("strike and insert"),
            kind: ActionKind::StrikeText,
            pattern: Cow::Borrowed(r#"striking "(?P<to_remove_text>[^"]+)" and inserting "(?P<to_replace>[^"]*)""#),
            cues: Cue::empty(),
        };
        let general = RuleSpec {
            name: Cow::Borrowed("strike"),
            kind: ActionKind::StrikeText,
            pattern: Cow::Borrowed(r#"striking "(?P<to_remove_text>[^"]+)""#),
            cues: Cue::empty(),
        };
        let text = "by striking \"Attorney General\" and inserting \"Secretary\"";

        let right = RuleTable::compile(vec![specific.clone(), general.clone()]).unwrap();
        let wrong = RuleTable::compile(vec![general, specific]).unwrap();

        let a = right.classify(text);
        let b = wrong.classify(text);
        assert_eq!(a[&ActionKind::StrikeText].get(field::TO_REPLACE).map(String::as_str), Some("Secretary"));
        assert_eq!(b[&ActionKind::StrikeText].get(field::TO_REPLACE), None);
        assert_ne!(a, b);

        // Same table, same input, same answer.
        assert_eq!(right.classify(text), right.classify(text));
    }

    #[test]
    fn cue_gating_never_changes_results() {
        let ungated: Vec<RuleSpec> =
            rules::get().into_iter().map(|spec| RuleSpec { cues: Cue::empty(), ..spec }).collect();
        let ungated = RuleTable::compile(ungated).unwrap();

        let corpus = [
            "Section 101(a) of title 5, United States Code, is amended by striking \"Attorney General\" and inserting \"Secretary\".",
            "by striking the period at the end and inserting \"; and\"",
            "by inserting \"annual\" before \"report\"",
            "by adding at the end the following new subsection:",
            "by redesignating paragraph (3) as paragraph (4)",
            "Section 7 is repealed.",
            "shall take effect 1 year after the date of enactment",
            "This Act may be cited as the \"Example Act\".",
            "The term \"State\" means each of the several States",
            "in subsection (a)—",
        ];
        for text in corpus {
            let text = normalize(text);
            assert_eq!(default_rules().classify(&text), ungated.classify(&text), "gating changed '{text}'");
        }
    }
}
