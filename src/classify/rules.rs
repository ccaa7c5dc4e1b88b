//! Built-in classifier rules.
//!
//! Rules run against *normalized* clauses: straight quotes, em-dashes with no
//! surrounding spaces, single spaces. Within each kind the order below is the
//! order they are tried; the comment on each rule says what it must stay
//! ahead of (or behind).
//!
//! Shared fragments, spelled out inline because patterns are literals:
//!
//! - level word: `(?:sub)?(?:section|paragraph|clause|item)` covers all eight
//!   levels from section to subitem.
//! - chain: `(?:[0-9]+[A-Za-z0-9-]*(?:\([A-Za-z0-9]+\))*|(?:\([A-Za-z0-9]+\))+)`,
//!   e.g. `(a)(1)(B)` or `1395(b)`.

use crate::classify::{Cue, RuleSpec};
use crate::ActionKind;

fn rules_amend_multiple() -> Vec<RuleSpec> {
    vec![rule! {
        name: "amended followed by a list",
        kind: ActionKind::AmendMultiple,
        pattern: r#"(?i)\b(?:is|are)\s+(?:further\s+|each\s+)?amended\s*(?:—|:|as\s+follows)"#,
        cues: Cue::AMEND,
    }]
}

fn rules_strike_text() -> Vec<RuleSpec> {
    vec![
        // Most specific first: the catch-all at the bottom would otherwise
        // eat the each-place clause and drop the replacement.
        rule! {
            name: "strike each place and insert",
            kind: ActionKind::StrikeText,
            pattern: r#"(?i)\bstriking\s+"(?P<to_remove_text>[^"]+)"\s+(?P<each_place>each\s+place\s+(?:it|such\s+term|that\s+term)\s+appears)(?:\s+in\s+[^"]*?)?\s*,?\s+and\s+inserting\s+(?:in\s+lieu\s+thereof\s+)?"(?P<to_replace>[^"]*)""#,
            cues: Cue::STRIKING | Cue::INSERTING,
        },
        rule! {
            name: "strike and insert",
            kind: ActionKind::StrikeText,
            pattern: r#"(?i)\bstriking\s+"(?P<to_remove_text>[^"]+)"\s*,?\s+and\s+inserting\s+(?:in\s+lieu\s+thereof\s+)?"(?P<to_replace>[^"]*)""#,
            cues: Cue::STRIKING | Cue::INSERTING,
        },
        rule! {
            name: "strike each place",
            kind: ActionKind::StrikeText,
            pattern: r#"(?i)\bstriking\s+"(?P<to_remove_text>[^"]+)"\s+(?P<each_place>each\s+place\s+(?:it|such\s+term|that\s+term)\s+appears)"#,
            cues: Cue::STRIKING,
        },
        // Catch-all. Requires the quote to close the clause so it stays off
        // "striking "x" at the end" and "striking "x" and inserting ...".
        rule! {
            name: "strike",
            kind: ActionKind::StrikeText,
            pattern: r#"(?i)\bstriking\s+"(?P<to_remove_text>[^"]+)"\s*(?:[;.,—]|$)"#,
            cues: Cue::STRIKING,
        },
    ]
}

fn rules_strike_end() -> Vec<RuleSpec> {
    vec![
        rule! {
            name: "strike at the end and insert",
            kind: ActionKind::StrikeEnd,
            pattern: r#"(?i)\bstriking\s+(?:the\s+)?(?P<to_remove_text>period|semicolon|comma|colon|"[^"]+")\s+at\s+the\s+end(?:\s+(?:thereof|of\s+[^"]+?))?\s*,?\s+and\s+inserting\s+"(?P<to_replace>[^"]*)""#,
            cues: Cue::STRIKING | Cue::INSERTING | Cue::AT_THE_END,
        },
        rule! {
            name: "strike at the end",
            kind: ActionKind::StrikeEnd,
            pattern: r#"(?i)\bstriking\s+(?:the\s+)?(?P<to_remove_text>period|semicolon|comma|colon|"[^"]+")\s+at\s+the\s+end\b"#,
            cues: Cue::STRIKING | Cue::AT_THE_END,
        },
    ]
}

fn rules_insert_text() -> Vec<RuleSpec> {
    vec![
        // each-place variants ahead of the plain ones, for both directions.
        rule! {
            name: "insert after each place",
            kind: ActionKind::InsertTextAfter,
            pattern: r#"(?i)\binserting\s+"(?P<to_insert_text>[^"]+)"\s+(?:immediately\s+)?after\s+"(?P<anchor_text>[^"]+)"\s+(?P<each_place>each\s+place\s+(?:it|such\s+term|that\s+term)\s+appears)"#,
            cues: Cue::INSERTING,
        },
        rule! {
            name: "insert after",
            kind: ActionKind::InsertTextAfter,
            pattern: r#"(?i)\binserting\s+"(?P<to_insert_text>[^"]+)"\s+(?:immediately\s+)?after\s+"(?P<anchor_text>[^"]+)""#,
            cues: Cue::INSERTING,
        },
        rule! {
            name: "insert before each place",
            kind: ActionKind::InsertTextBefore,
            pattern: r#"(?i)\binserting\s+"(?P<to_insert_text>[^"]+)"\s+(?:immediately\s+)?before\s+"(?P<anchor_text>[^"]+)"\s+(?P<each_place>each\s+place\s+(?:it|such\s+term|that\s+term)\s+appears)"#,
            cues: Cue::INSERTING,
        },
        rule! {
            name: "insert before",
            kind: ActionKind::InsertTextBefore,
            pattern: r#"(?i)\binserting\s+"(?P<to_insert_text>[^"]+)"\s+(?:immediately\s+)?before\s+"(?P<anchor_text>[^"]+)""#,
            cues: Cue::INSERTING,
        },
        rule! {
            name: "insert text at the end",
            kind: ActionKind::InsertTextEnd,
            pattern: r#"(?i)\binserting\s+"(?P<to_insert_text>[^"]+)"\s+at\s+the\s+end\b"#,
            cues: Cue::INSERTING | Cue::AT_THE_END,
        },
        rule! {
            name: "add quoted text at the end",
            kind: ActionKind::InsertTextEnd,
            pattern: r#"(?i)\badding\s+at\s+the\s+end\s+(?:thereof\s+)?(?:the\s+following\s*:?\s*)?"(?P<to_insert_text>[^"]+)""#,
            cues: Cue::ADDING | Cue::AT_THE_END,
        },
    ]
}

fn rules_insert_blocks() -> Vec<RuleSpec> {
    vec![
        // Bare "the following:" only. "the following new paragraph" belongs
        // to INSERT-SECTION-END below.
        rule! {
            name: "add the following at the end",
            kind: ActionKind::InsertEnd,
            pattern: r#"(?i)\badding\s+at\s+the\s+end\s+(?:thereof\s+)?the\s+following\s*(?:[:—]|$)"#,
            cues: Cue::ADDING | Cue::AT_THE_END | Cue::FOLLOWING,
        },
        rule! {
            name: "add new level at the end",
            kind: ActionKind::InsertSectionEnd,
            pattern: r#"(?i)\badding\s+at\s+the\s+end\s+(?:thereof\s+)?the\s+following\s+new\s+(?:sub)?(?:section|paragraph|clause|item)s?\b"#,
            cues: Cue::ADDING | Cue::AT_THE_END | Cue::FOLLOWING,
        },
        rule! {
            name: "add at the end of target",
            kind: ActionKind::InsertSectionEnd,
            pattern: r#"(?i)\b(?:inserting|adding)\s+at\s+the\s+end\s+of\s+(?P<target>(?:sub)?(?:section|paragraph|clause|item)\s+(?:[0-9]+[A-Za-z0-9-]*(?:\([A-Za-z0-9]+\))*|(?:\([A-Za-z0-9]+\))+))\s*,?\s+the\s+following"#,
            cues: Cue::AT_THE_END | Cue::FOLLOWING,
        },
        rule! {
            name: "insert after target",
            kind: ActionKind::InsertSectionAfter,
            pattern: r#"(?i)\b(?:inserting|adding)\s+after\s+(?P<target>(?:sub)?(?:section|paragraph|clause|item)\s+(?:[0-9]+[A-Za-z0-9-]*(?:\([A-Za-z0-9]+\))*|(?:\([A-Za-z0-9]+\))+))\s*,?\s+(?:the\s+following|as\s+follows)"#,
        },
    ]
}

fn rules_sections() -> Vec<RuleSpec> {
    vec![
        // Terminated so "striking subsection (b) and inserting the following"
        // stays a replacement; "and redesignating" is allowed to follow.
        rule! {
            name: "strike target",
            kind: ActionKind::StrikeSection,
            pattern: r#"(?i)\bstriking\s+(?P<target>(?:sub)?(?:section|paragraph|clause|item)s?\s+(?:[0-9]+[A-Za-z0-9-]*(?:\([A-Za-z0-9]+\))*|(?:\([A-Za-z0-9]+\))+)(?:(?:\s*,\s*(?:and\s+)?|\s+and\s+)(?:[0-9]+[A-Za-z0-9-]*(?:\([A-Za-z0-9]+\))*|(?:\([A-Za-z0-9]+\))+))*)\s*(?:[;.,—]|$|and\s+redesignating\b)"#,
            cues: Cue::STRIKING,
        },
        rule! {
            name: "strike target and insert the following",
            kind: ActionKind::ReplaceSection,
            pattern: r#"(?i)\bstriking\s+(?P<target>(?:sub)?(?:section|paragraph|clause|item)\s+(?:[0-9]+[A-Za-z0-9-]*(?:\([A-Za-z0-9]+\))*|(?:\([A-Za-z0-9]+\))+))\s*,?\s+and\s+inserting\s+(?:in\s+lieu\s+thereof\s+)?the\s+following"#,
            cues: Cue::STRIKING | Cue::INSERTING | Cue::FOLLOWING,
        },
        rule! {
            name: "amend target to read",
            kind: ActionKind::ReplaceSection,
            pattern: r#"(?i)\bamending\s+(?P<target>(?:sub)?(?:section|paragraph|clause|item)\s+(?:[0-9]+[A-Za-z0-9-]*(?:\([A-Za-z0-9]+\))*|(?:\([A-Za-z0-9]+\))+))\s+to\s+read\s+as\s+follows"#,
            cues: Cue::AMEND,
        },
        // No target: the clause's own citation is replaced.
        rule! {
            name: "amended to read",
            kind: ActionKind::ReplaceSection,
            pattern: r#"(?i)\b(?:is|are)\s+amended\s+to\s+read\s+as\s+follows"#,
            cues: Cue::AMEND,
        },
        rule! {
            name: "redesignate",
            kind: ActionKind::Redesignate,
            pattern: r#"(?i)\bredesignating\s+(?P<target>(?:sub)?(?:section|paragraph|clause|item)s?\s+(?:[0-9]+[A-Za-z0-9-]*(?:\([A-Za-z0-9]+\))*|(?:\([A-Za-z0-9]+\))+)(?:(?:\s*,\s*(?:and\s+)?|\s+and\s+)(?:[0-9]+[A-Za-z0-9-]*(?:\([A-Za-z0-9]+\))*|(?:\([A-Za-z0-9]+\))+))*)\s+as\s+(?P<redesignation>(?:sub)?(?:section|paragraph|clause|item)s?\s+(?:[0-9]+[A-Za-z0-9-]*(?:\([A-Za-z0-9]+\))*|(?:\([A-Za-z0-9]+\))+)(?:(?:\s*,\s*(?:and\s+)?|\s+and\s+)(?:[0-9]+[A-Za-z0-9-]*(?:\([A-Za-z0-9]+\))*|(?:\([A-Za-z0-9]+\))+))*)"#,
            cues: Cue::REDESIGNATING,
        },
        // Explicit target before the bare "is repealed" form.
        rule! {
            name: "repeal target",
            kind: ActionKind::Repeal,
            pattern: r#"(?i)\brepealing\s+(?P<target>(?:sub)?(?:section|paragraph|clause|item)s?\s+(?:[0-9]+[A-Za-z0-9-]*(?:\([A-Za-z0-9]+\))*|(?:\([A-Za-z0-9]+\))+)(?:(?:\s*,\s*(?:and\s+)?|\s+and\s+)(?:[0-9]+[A-Za-z0-9-]*(?:\([A-Za-z0-9]+\))*|(?:\([A-Za-z0-9]+\))+))*)"#,
            cues: Cue::REPEAL,
        },
        rule! {
            name: "is repealed",
            kind: ActionKind::Repeal,
            pattern: r#"(?i)\b(?:is|are)\s+(?:hereby\s+)?repealed\b"#,
            cues: Cue::REPEAL,
        },
    ]
}

fn rules_metadata() -> Vec<RuleSpec> {
    vec![
        // Longer number words lead the alternation ("one hundred eighty"
        // before "one").
        rule! {
            name: "effective after a period",
            kind: ActionKind::EffectiveDate,
            pattern: r#"(?i)\b(?:shall\s+)?take\s+effect\s+(?:on\s+the\s+date\s+that\s+is\s+|beginning\s+)?(?P<amount>\d+|one\s+hundred\s+(?:eighty|twenty)|forty-five|thirty|sixty|ninety|twenty|fifteen|twelve|eighteen|eleven|ten|one|two|three|four|five|six|seven|eight|nine)\s+(?P<unit>days?|months?|years?)\s+after\s+the\s+date\s+of\s+(?:the\s+)?enactment"#,
            cues: Cue::EFFECT,
        },
        rule! {
            name: "effective on enactment",
            kind: ActionKind::EffectiveDate,
            pattern: r#"(?i)\b(?:shall\s+)?take\s+effect\s+on\s+the\s+date\s+of\s+(?:the\s+)?enactment"#,
            cues: Cue::EFFECT,
        },
        rule! {
            name: "the term means",
            kind: ActionKind::TermDefinition,
            pattern: r#"(?i)\bterms?\s+"(?P<term>[^"]+)"\s+(?:means|has\s+the\s+meaning|includes)"#,
            cues: Cue::TERM,
        },
        rule! {
            name: "quoted means",
            kind: ActionKind::TermDefinition,
            pattern: r#"(?i)"(?P<term>[^"]+)"\s+means\b"#,
        },
        rule! {
            name: "may be cited as",
            kind: ActionKind::ShortTitle,
            pattern: r#"(?i)\bthis\s+(?:Act|title|subtitle)\s+may\s+be\s+cited\s+as\s+(?:the\s+)?"(?P<short_title>[^"]+)""#,
            cues: Cue::CITED,
        },
    ]
}

/// The built-in rule list, in evaluation order.
pub fn get() -> Vec<RuleSpec> {
    let mut rules = Vec::new();
    rules.extend(rules_amend_multiple());
    rules.extend(rules_strike_text());
    rules.extend(rules_strike_end());
    rules.extend(rules_insert_text());
    rules.extend(rules_insert_blocks());
    rules.extend(rules_sections());
    rules.extend(rules_metadata());
    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_rule() {
        let rules = get();
        for kind in ActionKind::ALL {
            assert!(rules.iter().any(|r| r.kind == kind), "no rule for {kind}");
        }
    }

    #[test]
    fn cues_are_literal_in_their_patterns() {
        for rule in get() {
            let pattern = rule.pattern.to_ascii_lowercase().replace(r"\s+", " ");
            for cue in rule.cues.iter() {
                let stem = cue.stem().unwrap();
                assert!(pattern.contains(stem), "rule '{}' gated on '{stem}' it never spells", rule.name);
            }
        }
    }
}
