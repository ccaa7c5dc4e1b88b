//! Amendment actions: the closed set of kinds and their captured fields.

use crate::cite::Citation;
use crate::{NodeId, VersionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named captures of one matched rule, keyed by field name.
pub type CapturedFields = BTreeMap<String, String>;

/// Classifier output for one clause. Several kinds may match at once.
pub type Actions = BTreeMap<ActionKind, CapturedFields>;

/// Fixed capture-group vocabulary. Rule patterns may only use these names.
pub mod field {
    pub const TO_REMOVE_TEXT: &str = "to_remove_text";
    pub const TO_REPLACE: &str = "to_replace";
    pub const TO_INSERT_TEXT: &str = "to_insert_text";
    pub const ANCHOR_TEXT: &str = "anchor_text";
    pub const TARGET: &str = "target";
    pub const REDESIGNATION: &str = "redesignation";
    pub const EACH_PLACE: &str = "each_place";
    pub const AMOUNT: &str = "amount";
    pub const UNIT: &str = "unit";
    pub const FULL_MATCH: &str = "full_match";
    pub const TERM: &str = "term";
    pub const SHORT_TITLE: &str = "short_title";
    /// Derived, never captured: calendar date an effective-date clause lands on.
    pub const EFFECTIVE_ON: &str = "effective_on";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum ActionKind {
    /// "is amended—" / "is amended as follows": children carry the edits.
    AmendMultiple,
    StrikeText,
    /// "striking the period at the end and inserting ..."
    StrikeEnd,
    InsertTextAfter,
    InsertTextBefore,
    InsertTextEnd,
    InsertEnd,
    InsertSectionAfter,
    InsertSectionEnd,
    StrikeSection,
    ReplaceSection,
    Redesignate,
    Repeal,
    EffectiveDate,
    TermDefinition,
    ShortTitle,
}

impl ActionKind {
    pub const ALL: [ActionKind; 16] = [
        ActionKind::AmendMultiple,
        ActionKind::StrikeText,
        ActionKind::StrikeEnd,
        ActionKind::InsertTextAfter,
        ActionKind::InsertTextBefore,
        ActionKind::InsertTextEnd,
        ActionKind::InsertEnd,
        ActionKind::InsertSectionAfter,
        ActionKind::InsertSectionEnd,
        ActionKind::StrikeSection,
        ActionKind::ReplaceSection,
        ActionKind::Redesignate,
        ActionKind::Repeal,
        ActionKind::EffectiveDate,
        ActionKind::TermDefinition,
        ActionKind::ShortTitle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::AmendMultiple => "AMEND-MULTIPLE",
            ActionKind::StrikeText => "STRIKE-TEXT",
            ActionKind::StrikeEnd => "STRIKE-END",
            ActionKind::InsertTextAfter => "INSERT-TEXT-AFTER",
            ActionKind::InsertTextBefore => "INSERT-TEXT-BEFORE",
            ActionKind::InsertTextEnd => "INSERT-TEXT-END",
            ActionKind::InsertEnd => "INSERT-END",
            ActionKind::InsertSectionAfter => "INSERT-SECTION-AFTER",
            ActionKind::InsertSectionEnd => "INSERT-SECTION-END",
            ActionKind::StrikeSection => "STRIKE-SECTION",
            ActionKind::ReplaceSection => "REPLACE-SECTION",
            ActionKind::Redesignate => "REDESIGNATE",
            ActionKind::Repeal => "REPEAL",
            ActionKind::EffectiveDate => "EFFECTIVE-DATE",
            ActionKind::TermDefinition => "TERM-DEFINITION",
            ActionKind::ShortTitle => "SHORT-TITLE",
        }
    }

    /// Capture names a rule of this kind is allowed to use.
    pub fn fields(self) -> &'static [&'static str] {
        use field::*;
        match self {
            ActionKind::AmendMultiple => &[],
            ActionKind::StrikeText => &[TO_REMOVE_TEXT, TO_REPLACE, EACH_PLACE],
            ActionKind::StrikeEnd => &[TO_REMOVE_TEXT, TO_REPLACE],
            ActionKind::InsertTextAfter | ActionKind::InsertTextBefore => &[ANCHOR_TEXT, TO_INSERT_TEXT, EACH_PLACE],
            ActionKind::InsertTextEnd => &[TO_INSERT_TEXT],
            ActionKind::InsertEnd
            | ActionKind::InsertSectionAfter
            | ActionKind::InsertSectionEnd
            | ActionKind::StrikeSection
            | ActionKind::ReplaceSection
            | ActionKind::Repeal => &[TARGET],
            ActionKind::Redesignate => &[TARGET, REDESIGNATION],
            ActionKind::EffectiveDate => &[AMOUNT, UNIT, FULL_MATCH],
            ActionKind::TermDefinition => &[TERM],
            ActionKind::ShortTitle => &[SHORT_TITLE],
        }
    }

    /// Whether a matched action of this kind edits the code tree.
    pub fn mutates(self) -> bool {
        !matches!(
            self,
            ActionKind::AmendMultiple | ActionKind::EffectiveDate | ActionKind::TermDefinition | ActionKind::ShortTitle
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified action, tied to the bill node it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub captured_fields: CapturedFields,
    pub source_node_id: NodeId,
}

impl Action {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.captured_fields.get(name).map(String::as_str)
    }
}

/// Audit record of what the engine saw at one bill node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub source_node_id: NodeId,
    pub version_id: VersionId,
    pub actions: Actions,
    pub citations: Vec<Citation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_display() {
        for kind in ActionKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }

    #[test]
    fn metadata_kinds_do_not_mutate() {
        let mutating: Vec<ActionKind> = ActionKind::ALL.into_iter().filter(|k| k.mutates()).collect();
        assert_eq!(mutating.len(), 12);
        assert!(!ActionKind::AmendMultiple.mutates());
    }
}
