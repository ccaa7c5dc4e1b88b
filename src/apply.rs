//! Mutation appliers.
//!
//! One applier per mutating [`ActionKind`]. Each reads the code through the
//! walk's [`OverlayView`], writes its changes back into it, and returns the
//! [`DiffRecord`]s those changes produced. A failed lookup or a payload that
//! does not fit the target is an [`ApplyError`] for that one action only.
//!
//! ## Responsibilities by module
//!
//! - `text.rs`: in-place text edits (strike, insert before/after/at end).
//! - `section.rs`: structural edits (strike, repeal, replace, splice quoted
//!   blocks).
//! - `redesignate.rs`: label changes.

#[path = "apply/redesignate.rs"]
mod redesignate;
#[path = "apply/section.rs"]
mod section;
#[path = "apply/text.rs"]
mod text;

use crate::cite::{target_paths, Citation};
use crate::error::ApplyError;
use crate::overlay::{DiffRecord, OverlayView};
use crate::tree::CodeLookup;
use crate::{Action, ActionKind, ContentNode, ContentTree, NodeId};

/// Where an action points and which bill node it came from.
#[derive(Debug, Clone, Copy)]
pub struct Clause<'b> {
    /// Effective citation of the bill node.
    pub citation: &'b Citation,
    pub bill: &'b ContentTree,
    pub source: NodeId,
}

impl Clause<'_> {
    /// Code paths the action addresses: its `target` capture resolved
    /// against the citation, or the citation itself.
    fn paths(&self, action: &Action) -> Vec<String> {
        match action.field(crate::action::field::TARGET) {
            Some(target) => target_paths(self.citation, target),
            None => vec![self.citation.path.clone()],
        }
    }

    fn first_path(&self, action: &Action) -> String {
        self.paths(action).into_iter().next().unwrap_or_else(|| self.citation.path.clone())
    }
}

/// Run the applier for `action.kind`.
pub fn apply<L: CodeLookup + ?Sized>(
    view: &mut OverlayView<'_, L>,
    clause: &Clause<'_>,
    action: &Action,
) -> Result<Vec<DiffRecord>, ApplyError> {
    match action.kind {
        ActionKind::StrikeText => text::strike_text(view, clause, action),
        ActionKind::StrikeEnd => text::strike_end(view, clause, action),
        ActionKind::InsertTextAfter => text::insert_text(view, clause, action, text::Placement::After),
        ActionKind::InsertTextBefore => text::insert_text(view, clause, action, text::Placement::Before),
        ActionKind::InsertTextEnd => text::insert_text_end(view, clause, action),
        ActionKind::InsertEnd => section::insert_end(view, clause, action),
        ActionKind::InsertSectionAfter => section::insert_section_after(view, clause, action),
        ActionKind::InsertSectionEnd => section::insert_section_end(view, clause, action),
        ActionKind::StrikeSection | ActionKind::Repeal => section::strike_section(view, clause, action),
        ActionKind::ReplaceSection => section::replace_section(view, clause, action),
        ActionKind::Redesignate => redesignate::redesignate(view, clause, action),
        ActionKind::AmendMultiple | ActionKind::EffectiveDate | ActionKind::TermDefinition | ActionKind::ShortTitle => {
            Ok(Vec::new())
        }
    }
}

fn required<'a>(action: &'a Action, name: &'static str) -> Result<&'a str, ApplyError> {
    action.field(name).ok_or(ApplyError::MissingField(name))
}

/// Text field an edit lands in. Heading when it holds `needle`, else body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Heading,
    Body,
}

impl Field {
    fn pick(node: &ContentNode, needle: &str) -> Option<Field> {
        if node.heading.as_deref().is_some_and(|h| text::occurs(h, needle)) {
            Some(Field::Heading)
        } else if node.body_text.as_deref().is_some_and(|b| text::occurs(b, needle)) {
            Some(Field::Body)
        } else {
            None
        }
    }

    fn get(self, node: &ContentNode) -> &str {
        match self {
            Field::Heading => node.heading.as_deref().unwrap_or(""),
            Field::Body => node.body(),
        }
    }

    fn set(self, node: &mut ContentNode, value: String) {
        match self {
            Field::Heading => node.heading = Some(value),
            Field::Body => node.body_text = Some(value),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::tree::{NodeKind, NodeSpec, TreeBuilder};
    use crate::{Action, ActionKind, CapturedFields, Citation, ContentTree, NodeId, VersionId};

    /// Title 5, section 101 with subsection (a) and paragraphs (1)..(5),
    /// plus subsection (b).
    pub fn code() -> ContentTree {
        let mut b = TreeBuilder::new(VersionId(1), "/us/usc");
        let t = b.add(None, NodeSpec::new(NodeKind::Title).label("5"));
        let s = b.add(Some(t), NodeSpec::new(NodeKind::Section).label("101").heading("Attorney General duties"));
        let a = b.add(
            Some(s),
            NodeSpec::new(NodeKind::Subsection)
                .label("(a)")
                .body("The Attorney General shall report to the Attorney General's office; and"),
        );
        for n in 1..=5 {
            b.add(Some(a), NodeSpec::new(NodeKind::Paragraph).label(&format!("({n})")).body(&format!("item {n}")));
        }
        b.add(Some(s), NodeSpec::new(NodeKind::Subsection).label("(b)").body("Fees of $5 (or more) apply."));
        b.build()
    }

    /// A bill clause node with an optional quoted block of paragraphs.
    pub fn bill(block: &[(&str, &str)]) -> (ContentTree, NodeId) {
        let mut b = TreeBuilder::new(VersionId(1), "/bill").starting_at(1000);
        let clause = b.add(None, NodeSpec::new(NodeKind::Paragraph).label("(1)").body("clause"));
        if !block.is_empty() {
            let qb = b.add(Some(clause), NodeSpec::new(NodeKind::QuotedBlock));
            for (label, body) in block {
                b.add(Some(qb), NodeSpec::new(NodeKind::Paragraph).label(label).body(body));
            }
        }
        (b.build(), clause)
    }

    pub fn cite(path: &str) -> Citation {
        Citation::complete(path, path.to_string())
    }

    pub fn action(kind: ActionKind, fields: &[(&str, &str)]) -> Action {
        let captured_fields: CapturedFields = fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Action { kind, captured_fields, source_node_id: NodeId(1000) }
    }
}
