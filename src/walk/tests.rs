use super::*;
use crate::api::default_rules;
use crate::cite::TraversalContext;
use crate::overlay::DiffOverlay;
use crate::tree::{NodeSpec, TreeBuilder};
use crate::NodeId;

const BASE: VersionId = VersionId(1);
const NEXT: VersionId = VersionId(2);

fn code() -> ContentTree {
    let mut b = TreeBuilder::new(BASE, "/us/usc");
    let t5 = b.add(None, NodeSpec::new(NodeKind::Title).label("5"));
    let s101 = b.add(Some(t5), NodeSpec::new(NodeKind::Section).label("101").heading("Reports"));
    b.add(Some(s101), NodeSpec::new(NodeKind::Subsection).label("(a)").body("The Attorney General shall report annually."));
    b.add(Some(s101), NodeSpec::new(NodeKind::Subsection).label("(b)").body("The Attorney General may delegate."));
    b.add(Some(t5), NodeSpec::new(NodeKind::Section).label("1395").body("Payment rules apply."));

    let t42 = b.add(None, NodeSpec::new(NodeKind::Title).label("42"));
    let s1395 = b.add(Some(t42), NodeSpec::new(NodeKind::Section).label("1395"));
    b.add(Some(s1395), NodeSpec::new(NodeKind::Subsection).label("(a)").body("General rule."));
    let sb = b.add(Some(s1395), NodeSpec::new(NodeKind::Subsection).label("(b)").body("Exception."));
    b.add(Some(sb), NodeSpec::new(NodeKind::Paragraph).label("(1)").body("Detail."));
    b.add(Some(s1395), NodeSpec::new(NodeKind::Subsection).label("(c)").body("Other."));
    b.build()
}

fn id_at(code: &ContentTree, path: &str) -> NodeId {
    code.nodes_at(path)[0].id
}

/// A bill whose root clause has the given children, each a plain paragraph.
fn bill(root: &str, children: &[&str]) -> ContentTree {
    let mut b = TreeBuilder::new(VersionId(100), "/bill").starting_at(1000);
    let r = b.add(None, NodeSpec::new(NodeKind::Section).label("SEC. 2.").body(root));
    for (i, text) in children.iter().enumerate() {
        b.add(Some(r), NodeSpec::new(NodeKind::Paragraph).label(&format!("({})", i + 1)).body(text));
    }
    b.build()
}

fn walk(code: &ContentTree, bill: &ContentTree) -> WalkOutput {
    Walker::new(default_rules(), code, WalkOptions::new(BASE, NEXT)).walk(bill)
}

fn snapshot(out: &WalkOutput) -> String {
    serde_json::to_string(&(&out.diffs, &out.records, &out.inserted)).unwrap()
}

#[test]
fn strike_and_insert_in_a_cited_subsection() {
    let code = code();
    let bill = bill(
        "Section 101(a) of title 5, United States Code, is amended by striking \"Attorney General\" and inserting \"Secretary\".",
        &[],
    );
    let out = walk(&code, &bill);

    assert_eq!(out.diffs.len(), 1);
    assert_eq!(out.diffs[0].target_node_id, id_at(&code, "/us/usc/t5/s101/a"));
    assert_eq!(out.diffs[0].version_id, NEXT);
    assert_eq!(out.diffs[0].body_text.as_deref(), Some("The Secretary shall report annually."));
    assert!(out.diffs[0].heading.is_none());

    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].citations[0].path, "/us/usc/t5/s101/a");
    assert!(out.records[0].actions.contains_key(&ActionKind::StrikeText));
}

#[test]
fn children_resolve_against_the_amended_section() {
    let code = code();
    let bill = bill(
        "Section 1395 of title 42, United States Code, is amended--",
        &["by striking subsection (b); and", "by redesignating subsection (c) as subsection (b)."],
    );
    let out = walk(&code, &bill);

    let struck: Vec<NodeId> = out.diffs.iter().filter(|d| d.body_text.as_deref() == Some("")).map(|d| d.target_node_id).collect();
    assert_eq!(struck, vec![id_at(&code, "/us/usc/t42/s1395/b"), id_at(&code, "/us/usc/t42/s1395/b/1")]);

    let relabeled = out.diffs.iter().find(|d| d.target_node_id == id_at(&code, "/us/usc/t42/s1395/c")).unwrap();
    assert_eq!(relabeled.display_label.as_deref(), Some("(b)"));

    let paths: Vec<&str> = out.records.iter().flat_map(|r| r.citations.iter().map(|c| c.path.as_str())).collect();
    assert_eq!(paths, vec!["/us/usc/t42/s1395", "/us/usc/t42/s1395/b", "/us/usc/t42/s1395/c"]);
    assert!(out.records.iter().all(|r| r.citations.iter().all(|c| c.complete && c.is_anchored())));
}

#[test]
fn per_bill_contexts_do_not_leak_between_bills() {
    let code = code();
    let bill_a = bill(
        "Section 101(b) of title 5, United States Code, is amended by striking \"may\" and inserting \"shall\".",
        &[],
    );
    let bill_b = bill("Section 1395 of such title is amended by striking \"Payment\" and inserting \"Billing\".", &[]);
    let walker = Walker::new(default_rules(), &code, WalkOptions::new(BASE, NEXT));

    let sequential: Vec<String> = [&bill_a, &bill_b].iter().map(|b| snapshot(&walker.walk(b))).collect();

    let walker_ref = &walker;
    let threaded: Vec<String> = std::thread::scope(|s| {
        let handles: Vec<_> = [&bill_a, &bill_b]
            .into_iter()
            .map(|b| s.spawn(move || snapshot(&walker_ref.walk(b))))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(sequential, threaded);
    assert!(walker.walk(&bill_b).diffs.is_empty());

    // One context for both: bill B now picks up title 5 from bill A.
    let mut shared = TraversalContext::new();
    let leaked: Vec<String> = [&bill_a, &bill_b].iter().map(|b| snapshot(&walker.walk_with_context(b, &mut shared))).collect();
    assert_eq!(leaked[0], sequential[0]);
    assert_ne!(leaked[1], sequential[1]);
}

#[test]
fn edits_to_one_node_compose() {
    let code = code();
    let bill = bill(
        "Section 101(a) of title 5, United States Code, is amended--",
        &[
            "by striking \"Attorney General\" and inserting \"Secretary\"; and",
            "by striking \"annually\" and inserting \"quarterly\".",
        ],
    );
    let out = walk(&code, &bill);
    assert_eq!(out.diffs.len(), 2);
    assert_eq!(out.diffs[1].body_text.as_deref(), Some("The Secretary shall report quarterly."));

    let store = DiffOverlay::new();
    store.append(out.diffs.clone());
    let folded = store.materialize(NEXT);
    let a = id_at(&code, "/us/usc/t5/s101/a");
    assert_eq!(folded[&a].body_text.as_deref(), Some("The Secretary shall report quarterly."));

    let mut node = code.get(a).unwrap().clone();
    folded[&a].apply_to(&mut node);
    assert_eq!(node.body(), "The Secretary shall report quarterly.");
}

#[test]
fn quoted_blocks_are_spliced_not_walked() {
    let code = code();
    let mut b = TreeBuilder::new(VersionId(100), "/bill").starting_at(1000);
    let root = b.add(
        None,
        NodeSpec::new(NodeKind::Section)
            .label("SEC. 3.")
            .body("Section 101 of title 5, United States Code, is amended by adding at the end the following new subsection:"),
    );
    let block = b.add(Some(root), NodeSpec::new(NodeKind::QuotedBlock));
    b.add(
        Some(block),
        NodeSpec::new(NodeKind::Subsection).label("(c)").body("by striking \"Attorney General\" and inserting \"Secretary\"."),
    );
    let out = walk(&code, &b.build());

    assert_eq!(out.metrics.quoted_blocks_skipped, 1);
    assert_eq!(out.metrics.actions_dispatched, 1);
    assert_eq!(out.inserted.len(), 1);
    assert_eq!(out.inserted[0].citation_path, "/us/usc/t5/s101/c");
    assert_eq!(out.inserted[0].parent_id, Some(id_at(&code, "/us/usc/t5/s101")));
    assert_eq!(out.diffs.len(), 1);
    assert_eq!(out.diffs[0].display_label.as_deref(), Some("(c)"));
}

#[test]
fn each_of_the_following_hands_edits_to_children() {
    let code = code();
    let bill = bill(
        "Section 101 of title 5, United States Code, is amended by striking \"Attorney General\" and inserting \"Secretary\" in each of the following:",
        &["Subsection (a).", "Subsection (b)."],
    );
    let out = walk(&code, &bill);
    let bodies: Vec<&str> = out.diffs.iter().filter_map(|d| d.body_text.as_deref()).collect();
    assert_eq!(bodies, vec!["The Secretary shall report annually.", "The Secretary may delegate."]);
    assert!(out.diffs.iter().all(|d| d.heading.is_none()));
}

#[test]
fn effective_dates_are_recorded_not_applied() {
    let code = code();
    let bill = bill("This Act shall take effect 90 days after the date of enactment of this Act.", &[]);
    let enacted = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let out = Walker::new(default_rules(), &code, WalkOptions::new(BASE, NEXT).enacted_on(enacted)).walk(&bill);

    assert!(out.diffs.is_empty());
    assert_eq!(out.metrics.unresolved, 0);
    let fields = &out.records[0].actions[&ActionKind::EffectiveDate];
    assert_eq!(fields[field::EFFECTIVE_ON], "2024-03-31");
}

#[test]
fn clause_failures_stay_local() {
    let code = code();
    let out = walk(&code, &bill("by striking \"Attorney General\" and inserting \"Secretary\".", &[]));
    assert_eq!(out.metrics.unresolved, 1);
    assert_eq!(out.metrics.actions_dispatched, 0);

    let out = walk(
        &code,
        &bill(
            "Section 101(z) of title 5, United States Code, is amended by striking \"x\" and inserting \"y\".",
            &["Section 101(b) of title 5, United States Code, is amended by striking \"may\" and inserting \"must\"."],
        ),
    );
    assert_eq!(out.metrics.actions_failed, 1);
    assert_eq!(out.metrics.actions_dispatched, 2);
    assert_eq!(out.diffs.len(), 1);
    assert_eq!(out.diffs[0].body_text.as_deref(), Some("The Attorney General must delegate."));
}

/// Delegates to a tree but panics on lookups of one path.
struct PanicsAt<'a> {
    inner: &'a ContentTree,
    path: &'static str,
}

impl CodeLookup for PanicsAt<'_> {
    fn find_by_citation_path(&self, path: &str, base_version: VersionId) -> Vec<&ContentNode> {
        if path == self.path {
            panic!("index corrupted at {path}");
        }
        self.inner.find_by_citation_path(path, base_version)
    }

    fn find_descendants(&self, id: NodeId) -> Vec<&ContentNode> {
        self.inner.find_descendants(id)
    }

    fn children(&self, id: NodeId) -> Vec<&ContentNode> {
        self.inner.children(id)
    }

    fn node(&self, id: NodeId) -> Option<&ContentNode> {
        self.inner.node(id)
    }

    fn next_node_id(&self) -> NodeId {
        self.inner.next_node_id()
    }
}

#[test]
fn a_panicking_action_fails_alone() {
    let code = code();
    let lookup = PanicsAt { inner: &code, path: "/us/usc/t5/s101/b" };
    let bill = bill(
        "Amendments.",
        &[
            "Section 101(a) of title 5, United States Code, is amended by striking \"Attorney General\" and inserting \"Secretary\".",
            "Section 101(b) of title 5, United States Code, is amended by striking \"may\" and inserting \"shall\".",
            "Section 1395 of title 5, United States Code, is amended by striking \"Payment\" and inserting \"Billing\".",
        ],
    );
    let out = Walker::new(default_rules(), &lookup, WalkOptions::new(BASE, NEXT)).walk(&bill);

    assert_eq!(out.metrics.actions_dispatched, 3);
    assert_eq!(out.metrics.actions_failed, 1);
    let touched: Vec<NodeId> = out.diffs.iter().map(|d| d.target_node_id).collect();
    assert_eq!(touched, vec![id_at(&code, "/us/usc/t5/s101/a"), id_at(&code, "/us/usc/t5/s1395")]);
    assert_eq!(out.diffs[1].body_text.as_deref(), Some("Billing rules apply."));
    assert_eq!(out.records.len(), 3);
}
