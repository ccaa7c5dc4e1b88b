//! Structural edits.
//!
//! Nothing is ever removed from the code tree. Striking blanks the text
//! fields of the target and everything below it; inserting clones bill
//! content into new nodes whose `order` falls between the anchor and its
//! next sibling.
//!
//! ```text
//! siblings:   (1)@0      (2)@65536                 (3)@131072
//! insert 2 after (2):           (2a)@87381 (2b)@109226
//! ```

use super::text::append_text;
use super::Clause;
use crate::error::ApplyError;
use crate::overlay::{DiffRecord, OverlayView};
use crate::tree::{path_segment, CodeLookup, NodeKind, ORDER_STRIDE};
use crate::{Action, ContentNode, ContentTree, NodeId};

/// The quoted block a clause carries: a child of the clause node, or else
/// the sibling right after it.
fn quoted_block<'b>(clause: &Clause<'b>) -> Result<&'b ContentNode, ApplyError> {
    let bill = clause.bill;
    if let Some(block) = bill.child_nodes(clause.source).find(|n| n.kind == NodeKind::QuotedBlock) {
        return Ok(block);
    }
    let siblings: Vec<&ContentNode> = match bill.get(clause.source).and_then(|n| n.parent_id) {
        Some(parent) => bill.child_nodes(parent).collect(),
        None => bill.roots().collect(),
    };
    siblings
        .iter()
        .position(|n| n.id == clause.source)
        .and_then(|i| siblings.get(i + 1))
        .filter(|n| n.kind == NodeKind::QuotedBlock)
        .copied()
        .ok_or(ApplyError::NoQuotedBlock(clause.source))
}

/// Top-level nodes of a block. A block without children stands for a single
/// node; its leading enumerator, if any, becomes the label.
fn block_items(bill: &ContentTree, block: &ContentNode) -> Vec<ContentNode> {
    let children: Vec<ContentNode> = bill.child_nodes(block.id).cloned().collect();
    if !children.is_empty() {
        return children;
    }
    let mut item = block.clone();
    item.kind = NodeKind::Other;
    if let Some(caps) = regex!(r"^\s*(\([A-Za-z0-9]+\))\s*").captures(block.body()) {
        item.display_label = Some(caps[1].to_string());
        item.body_text = Some(block.body()[caps[0].len()..].to_string());
    }
    vec![item]
}

/// Flattened text of a block, for text-only insertions.
fn block_text(bill: &ContentTree, block: &ContentNode) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let mut stack = vec![block];
    while let Some(node) = stack.pop() {
        parts.extend(node.heading.as_deref());
        parts.extend(node.body_text.as_deref());
        let children: Vec<&ContentNode> = bill.child_nodes(node.id).collect();
        stack.extend(children.into_iter().rev());
    }
    parts.iter().map(|p| p.trim()).filter(|p| !p.is_empty()).collect::<Vec<_>>().join(" ")
}

/// `count` orders strictly between `low` and `high`.
fn orders_between(anchor: NodeId, low: Option<u64>, high: Option<u64>, count: usize) -> Result<Vec<u64>, ApplyError> {
    let n = count as u64;
    match (low, high) {
        (None, None) => Ok((0..n).map(|i| i * ORDER_STRIDE).collect()),
        (Some(lo), None) => Ok((1..=n).map(|i| lo + i * ORDER_STRIDE).collect()),
        (low, Some(hi)) => {
            let lo = low.unwrap_or(0);
            let step = hi.saturating_sub(lo) / (n + 1);
            if step == 0 {
                return Err(ApplyError::OrderExhausted { anchor, count });
            }
            Ok((1..=n).map(|i| lo + i * step).collect())
        }
    }
}

/// Copy a bill subtree under `parent_path`, depth first.
fn clone_subtree<L: CodeLookup + ?Sized>(
    view: &mut OverlayView<'_, L>,
    bill: &ContentTree,
    source: &ContentNode,
    parent: Option<NodeId>,
    parent_path: &str,
    order: u64,
    out: &mut Vec<DiffRecord>,
) {
    let id = view.allocate_id();
    let segment = path_segment(source.kind, source.display_label.as_deref(), order / ORDER_STRIDE);
    let citation_path = format!("{parent_path}/{segment}");
    out.push(view.insert(ContentNode {
        id,
        parent_id: parent,
        order,
        kind: source.kind,
        heading: source.heading.clone(),
        body_text: source.body_text.clone(),
        display_label: source.display_label.clone(),
        citation_path: citation_path.clone(),
        version_id: view.version_id(),
    }));

    let children: Vec<&ContentNode> = bill.child_nodes(source.id).collect();
    for (i, child) in children.into_iter().enumerate() {
        clone_subtree(view, bill, child, Some(id), &citation_path, i as u64 * ORDER_STRIDE, out);
    }
}

/// Clone the clause's block as siblings right after `anchor`.
fn splice_after<L: CodeLookup + ?Sized>(
    view: &mut OverlayView<'_, L>,
    clause: &Clause<'_>,
    anchor: &ContentNode,
) -> Result<Vec<DiffRecord>, ApplyError> {
    let items = block_items(clause.bill, quoted_block(clause)?);
    let next = match anchor.parent_id {
        Some(parent) => view.children(parent).into_iter().map(|n| n.order).find(|&o| o > anchor.order),
        None => None,
    };
    let orders = orders_between(anchor.id, Some(anchor.order), next, items.len())?;
    let parent_path = anchor.citation_path.rsplit_once('/').map(|(p, _)| p).unwrap_or("");

    let mut out = Vec::new();
    for (item, order) in items.iter().zip(orders) {
        clone_subtree(view, clause.bill, item, anchor.parent_id, parent_path, order, &mut out);
    }
    Ok(out)
}

/// Clone the clause's block as the last children of `parent`.
fn splice_at_end<L: CodeLookup + ?Sized>(
    view: &mut OverlayView<'_, L>,
    clause: &Clause<'_>,
    parent: &ContentNode,
) -> Result<Vec<DiffRecord>, ApplyError> {
    let items = block_items(clause.bill, quoted_block(clause)?);
    let last = view.children(parent.id).last().map(|n| n.order);
    let orders = orders_between(parent.id, last, None, items.len())?;

    let mut out = Vec::new();
    for (item, order) in items.iter().zip(orders) {
        clone_subtree(view, clause.bill, item, Some(parent.id), &parent.citation_path, order, &mut out);
    }
    Ok(out)
}

/// `InsertSectionAfter`.
pub(super) fn insert_section_after<L: CodeLookup + ?Sized>(
    view: &mut OverlayView<'_, L>,
    clause: &Clause<'_>,
    action: &Action,
) -> Result<Vec<DiffRecord>, ApplyError> {
    let anchor = view.find(&clause.first_path(action))?;
    splice_after(view, clause, &anchor)
}

/// `InsertSectionEnd`: "insert at end" is insert after the last child.
pub(super) fn insert_section_end<L: CodeLookup + ?Sized>(
    view: &mut OverlayView<'_, L>,
    clause: &Clause<'_>,
    action: &Action,
) -> Result<Vec<DiffRecord>, ApplyError> {
    let parent = view.find(&clause.first_path(action))?;
    splice_at_end(view, clause, &parent)
}

/// `InsertEnd`: enumerated blocks become new children, plain ones are
/// appended as text.
pub(super) fn insert_end<L: CodeLookup + ?Sized>(
    view: &mut OverlayView<'_, L>,
    clause: &Clause<'_>,
    action: &Action,
) -> Result<Vec<DiffRecord>, ApplyError> {
    let block = quoted_block(clause)?;
    let enumerated = clause.bill.child_nodes(block.id).any(|n| n.display_label.is_some());
    if enumerated {
        return insert_section_end(view, clause, action);
    }
    let text = block_text(clause.bill, block);
    if text.is_empty() {
        return Err(ApplyError::NoQuotedBlock(clause.source));
    }
    append_text(view, &clause.first_path(action), &text)
}

/// `StrikeSection` and `Repeal`: blank every target and its descendants.
///
/// Every target is looked up before anything is written, so a bad target
/// leaves the view untouched.
pub(super) fn strike_section<L: CodeLookup + ?Sized>(
    view: &mut OverlayView<'_, L>,
    clause: &Clause<'_>,
    action: &Action,
) -> Result<Vec<DiffRecord>, ApplyError> {
    let targets = clause.paths(action).iter().map(|p| view.find(p)).collect::<Result<Vec<_>, _>>()?;
    let mut out = Vec::new();
    for target in targets {
        out.extend(strike_subtree(view, target.id));
    }
    Ok(out)
}

fn strike_subtree<L: CodeLookup + ?Sized>(view: &mut OverlayView<'_, L>, id: NodeId) -> Vec<DiffRecord> {
    let mut ids = vec![id];
    ids.extend(view.descendants(id).into_iter().map(|n| n.id));
    ids.into_iter().filter_map(|id| view.strike(id)).collect()
}

/// `ReplaceSection`: strike the target, then splice the block in after it.
pub(super) fn replace_section<L: CodeLookup + ?Sized>(
    view: &mut OverlayView<'_, L>,
    clause: &Clause<'_>,
    action: &Action,
) -> Result<Vec<DiffRecord>, ApplyError> {
    let anchor = view.find(&clause.first_path(action))?;
    quoted_block(clause)?;
    let mut out = strike_subtree(view, anchor.id);
    out.extend(splice_after(view, clause, &anchor)?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::field;
    use crate::apply::fixtures::{action, bill, cite, code};
    use crate::apply::{apply, Clause};
    use crate::tree::{NodeSpec, TreeBuilder};
    use crate::{ActionKind, Citation, VersionId};

    struct Run {
        diffs: Result<Vec<DiffRecord>, ApplyError>,
        inserted: Vec<ContentNode>,
    }

    fn run(path: &str, kind: ActionKind, fields: &[(&str, &str)], block: &[(&str, &str)]) -> Run {
        let code = code();
        let (bill, source) = bill(block);
        let citation: Citation = cite(path);
        let clause = Clause { citation: &citation, bill: &bill, source };
        let mut view = OverlayView::new(&code, VersionId(1), VersionId(2));
        let diffs = apply(&mut view, &clause, &action(kind, fields));
        Run { diffs, inserted: view.finish() }
    }

    #[test]
    fn strike_section_blanks_target_and_descendants_only() {
        let code = code();
        let out = run("/us/usc/t5/s101/a", ActionKind::StrikeSection, &[], &[]);
        let diffs = out.diffs.unwrap();
        let a = code.nodes_at("/us/usc/t5/s101/a")[0].id;
        let mut expected = vec![a];
        expected.extend(code.find_descendants(a).iter().map(|n| n.id));

        let touched: Vec<NodeId> = diffs.iter().map(|d| d.target_node_id).collect();
        assert_eq!(touched, expected);
        assert!(diffs.iter().all(|d| {
            d.heading.as_deref() == Some("") && d.body_text.as_deref() == Some("") && d.display_label.as_deref() == Some("")
        }));
        assert!(!touched.contains(&code.nodes_at("/us/usc/t5/s101/b")[0].id));
        assert!(!touched.contains(&code.nodes_at("/us/usc/t5/s101")[0].id));
    }

    #[test]
    fn strike_section_targets_are_checked_first() {
        let out = run(
            "/us/usc/t5/s101/a/3",
            ActionKind::StrikeSection,
            &[(field::TARGET, "paragraphs (3) and (9)")],
            &[],
        );
        assert_eq!(out.diffs, Err(ApplyError::TargetMissing { path: "/us/usc/t5/s101/a/9".into() }));

        let out = run("/us/usc/t5/s101/a/3", ActionKind::Repeal, &[(field::TARGET, "paragraphs (3) and (4)")], &[]);
        assert_eq!(out.diffs.unwrap().len(), 2);
    }

    #[test]
    fn insert_after_takes_orders_between_siblings() {
        let out = run(
            "/us/usc/t5/s101/a/2",
            ActionKind::InsertSectionAfter,
            &[(field::TARGET, "paragraph (2)")],
            &[("(2A)", "new one"), ("(2B)", "new two")],
        );
        assert_eq!(out.diffs.unwrap().len(), 2);
        let paths: Vec<&str> = out.inserted.iter().map(|n| n.citation_path.as_str()).collect();
        assert_eq!(paths, vec!["/us/usc/t5/s101/a/2A", "/us/usc/t5/s101/a/2B"]);
        let orders: Vec<u64> = out.inserted.iter().map(|n| n.order).collect();
        assert!(orders[0] > ORDER_STRIDE && orders[0] < orders[1] && orders[1] < 2 * ORDER_STRIDE);
        assert_eq!(out.inserted[0].body_text.as_deref(), Some("new one"));
    }

    #[test]
    fn insert_at_end_follows_last_child() {
        let out = run("/us/usc/t5/s101/a", ActionKind::InsertSectionEnd, &[], &[("(6)", "six")]);
        assert_eq!(out.inserted.len(), 1);
        assert_eq!(out.inserted[0].citation_path, "/us/usc/t5/s101/a/6");
        assert_eq!(out.inserted[0].order, 5 * ORDER_STRIDE);

        let out = run("/us/usc/t5/s101/a", ActionKind::InsertSectionEnd, &[], &[]);
        assert!(matches!(out.diffs, Err(ApplyError::NoQuotedBlock(_))));
    }

    #[test]
    fn insert_end_splices_enumerated_blocks_and_appends_plain_ones() {
        let out = run("/us/usc/t5/s101/a", ActionKind::InsertEnd, &[], &[("(6)", "six")]);
        assert_eq!(out.diffs.unwrap().len(), 1);
        assert_eq!(out.inserted.len(), 1);
        assert_eq!(out.inserted[0].citation_path, "/us/usc/t5/s101/a/6");

        // Block as the clause's next sibling, text only.
        let code = code();
        let mut b = TreeBuilder::new(VersionId(1), "/bill").starting_at(1000);
        let source = b.add(None, NodeSpec::new(NodeKind::Paragraph).label("(1)").body("by adding at the end the following:"));
        b.add(None, NodeSpec::new(NodeKind::QuotedBlock).body("or the Secretary"));
        let bill = b.build();
        let citation = cite("/us/usc/t5/s101/a/2");
        let clause = Clause { citation: &citation, bill: &bill, source };
        let mut view = OverlayView::new(&code, VersionId(1), VersionId(2));

        let diffs = apply(&mut view, &clause, &action(ActionKind::InsertEnd, &[])).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].body_text.as_deref(), Some("item 2 or the Secretary"));
        assert!(view.finish().is_empty());

        let out = run("/us/usc/t5/s101/a/2", ActionKind::InsertEnd, &[], &[]);
        assert!(matches!(out.diffs, Err(ApplyError::NoQuotedBlock(_))));
    }

    #[test]
    fn ambiguous_targets_are_left_alone() {
        let mut b = TreeBuilder::new(VersionId(1), "/us/usc");
        let t = b.add(None, NodeSpec::new(NodeKind::Title).label("5"));
        let s = b.add(Some(t), NodeSpec::new(NodeKind::Section).label("101"));
        b.add(Some(s), NodeSpec::new(NodeKind::Subsection).label("(a)").body("First text."));
        b.add(Some(s), NodeSpec::new(NodeKind::Subsection).label("(a)").body("Second text."));
        let code = b.build();

        let (bill, source) = bill(&[]);
        let citation = cite("/us/usc/t5/s101/a");
        let clause = Clause { citation: &citation, bill: &bill, source };
        let mut view = OverlayView::new(&code, VersionId(1), VersionId(2));
        let ambiguous = Err(ApplyError::TargetAmbiguous { path: "/us/usc/t5/s101/a".into(), count: 2 });

        assert_eq!(apply(&mut view, &clause, &action(ActionKind::StrikeSection, &[])), ambiguous);
        let strike = action(ActionKind::StrikeText, &[(field::TO_REMOVE_TEXT, "text"), (field::TO_REPLACE, "words")]);
        assert_eq!(apply(&mut view, &clause, &strike), ambiguous);

        let bodies: Vec<String> = view.children(s).iter().map(|n| n.body().to_string()).collect();
        assert_eq!(bodies, vec!["First text.", "Second text."]);
        assert!(!view.children(s).iter().any(|n| view.is_struck(n.id)));
    }

    #[test]
    fn replace_strikes_then_splices() {
        let out = run(
            "/us/usc/t5/s101",
            ActionKind::ReplaceSection,
            &[(field::TARGET, "subsection (b)")],
            &[("(b)", "Fees are waived.")],
        );
        let diffs = out.diffs.unwrap();
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].body_text.as_deref(), Some(""));
        assert_eq!(diffs[1].body_text.as_deref(), Some("Fees are waived."));
        assert_eq!(out.inserted[0].citation_path, "/us/usc/t5/s101/b");
    }

    #[test]
    fn orders_run_out() {
        assert_eq!(
            orders_between(NodeId(1), Some(10), Some(12), 2),
            Err(ApplyError::OrderExhausted { anchor: NodeId(1), count: 2 })
        );
        assert_eq!(orders_between(NodeId(1), Some(10), Some(13), 2).unwrap(), vec![11, 12]);
    }
}
