//! Bill traversal.
//!
//! Walks a bill's content tree depth first, pre-order, and turns each clause
//! into code edits:
//!
//! ```text
//! bill node ── normalize ── RuleTable::classify ──┐
//!     │                                           │
//!     └──────── resolve (raw text) ───────────────┼─ effective citation
//!                                                 │    own complete
//!                                                 │    | own partial merged onto nearest ancestor
//!                                                 │    | ancestor's, inherited
//!                                                 v
//!                                       apply (per mutating kind)
//!                                                 │
//!                                                 v
//!                                     OverlayView -> DiffRecords
//! ```
//!
//! Quoted blocks are never visited: they are payload, consumed by whichever
//! clause above them inserts them.
//!
//! Ancestors are passed down as an explicit slice of [`Frame`]s in document
//! order. A clause ending in "each of the following" hands its text edits to
//! the children below it instead of applying them itself.
//!
//! Nothing a single clause does can fail the walk: unresolvable citations,
//! applier errors and applier panics are logged and counted in
//! [`WalkMetrics`].

#[path = "walk/metrics.rs"]
mod metrics;

pub use metrics::WalkMetrics;

use crate::action::field;
use crate::apply::{apply, Clause};
use crate::cite::{resolve, Citation, NodePath, TraversalContext};
use crate::effective_date::effective_on;
use crate::error::{panic_message, ApplyError};
use crate::normalize::normalize;
use crate::overlay::{DiffRecord, OverlayView};
use crate::tree::{CodeLookup, NodeKind};
use crate::{Action, ActionKind, ActionRecord, Actions, ContentNode, ContentTree, RuleTable, VersionId};
use chrono::NaiveDate;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Version of the code the bill amends.
    pub base_version: VersionId,
    /// Version the produced records belong to.
    pub version_id: VersionId,
    /// Enactment date, for resolving effective-date clauses.
    pub enacted_on: Option<NaiveDate>,
}

impl WalkOptions {
    pub fn new(base_version: VersionId, version_id: VersionId) -> Self {
        WalkOptions { base_version, version_id, enacted_on: None }
    }

    pub fn enacted_on(mut self, date: NaiveDate) -> Self {
        self.enacted_on = Some(date);
        self
    }
}

/// Everything one walk produced.
#[derive(Debug, Clone, Default)]
pub struct WalkOutput {
    /// In append order. Later records for a node build on earlier ones.
    pub diffs: Vec<DiffRecord>,
    /// Nodes created by insertions, in creation order.
    pub inserted: Vec<ContentNode>,
    /// One per bill node that matched at least one rule.
    pub records: Vec<ActionRecord>,
    pub metrics: WalkMetrics,
}

/// What an ancestor hands down to its subtree.
#[derive(Debug, Clone, Default)]
struct Frame {
    citation: Option<Citation>,
    /// Text edits deferred to the children ("... in each of the following").
    deferred: Vec<Action>,
}

struct WalkState<'v, L: CodeLookup + ?Sized> {
    view: OverlayView<'v, L>,
    diffs: Vec<DiffRecord>,
    records: Vec<ActionRecord>,
    metrics: WalkMetrics,
}

pub struct Walker<'a, L: CodeLookup + ?Sized> {
    rules: &'a RuleTable,
    lookup: &'a L,
    options: WalkOptions,
}

impl<'a, L: CodeLookup + ?Sized> Walker<'a, L> {
    pub fn new(rules: &'a RuleTable, lookup: &'a L, options: WalkOptions) -> Self {
        Walker { rules, lookup, options }
    }

    /// Walk one bill with a fresh traversal context.
    pub fn walk(&self, bill: &ContentTree) -> WalkOutput {
        let mut ctx = TraversalContext::new();
        self.walk_with_context(bill, &mut ctx)
    }

    /// Walk with a caller-owned context. Reusing one context across bills
    /// carries `last_title` over from one to the next.
    pub fn walk_with_context(&self, bill: &ContentTree, ctx: &mut TraversalContext) -> WalkOutput {
        let start = Instant::now();
        let mut state = WalkState {
            view: OverlayView::new(self.lookup, self.options.base_version, self.options.version_id),
            diffs: Vec::new(),
            records: Vec::new(),
            metrics: WalkMetrics::default(),
        };

        let mut path = NodePath::new();
        for (i, root) in bill.roots().enumerate() {
            path.push(i);
            self.visit(bill, root, &mut path, &[], ctx, &mut state);
            path.pop();
        }

        let WalkState { view, diffs, records, mut metrics } = state;
        let inserted = view.finish();
        metrics.nodes_inserted = inserted.len();
        metrics.diffs_emitted = diffs.len();
        metrics.total = start.elapsed();
        debug!(?metrics, "walk finished");

        WalkOutput { diffs, inserted, records, metrics }
    }

    fn visit(
        &self,
        bill: &ContentTree,
        node: &ContentNode,
        path: &mut NodePath,
        ancestors: &[Frame],
        ctx: &mut TraversalContext,
        state: &mut WalkState<'a, L>,
    ) {
        if node.kind == NodeKind::QuotedBlock {
            state.metrics.quoted_blocks_skipped += 1;
            return;
        }
        state.metrics.nodes_visited += 1;

        let frame = self.process(node, path, ancestors, bill, ctx, state);

        let mut frames = ancestors.to_vec();
        frames.push(frame);
        for (i, child) in bill.child_nodes(node.id).enumerate() {
            path.push(i);
            self.visit(bill, child, path, &frames, ctx, state);
            path.pop();
        }
    }

    /// Classify, resolve and dispatch one node. Returns the frame its
    /// children see.
    fn process(
        &self,
        node: &ContentNode,
        path: &[usize],
        ancestors: &[Frame],
        bill: &ContentTree,
        ctx: &mut TraversalContext,
        state: &mut WalkState<'a, L>,
    ) -> Frame {
        let inherited = ancestors
            .iter()
            .rev()
            .find_map(|f| f.citation.clone())
            .or_else(|| ctx.lookup_ancestor_citation(path).cloned());

        let body = node.body();
        if body.trim().is_empty() {
            return Frame { citation: inherited, deferred: Vec::new() };
        }

        let text = normalize(body);
        let mut actions = self.rules.classify(&text);
        state.metrics.clauses_classified += 1;

        let citations = resolve(body, ctx);
        let effective = effective_citation(&citations, inherited.as_ref());
        if let Some(citation) = &effective {
            ctx.record(path, citation.clone());
        }

        let mutating: Vec<ActionKind> = dispatchable(&actions);
        let mut deferred = Vec::new();

        if !mutating.is_empty() && defers_to_children(&text) {
            deferred = mutating.iter().map(|&kind| to_action(kind, &actions, node)).collect();
        } else if !mutating.is_empty() {
            let batch: Vec<Action> = mutating.iter().map(|&kind| to_action(kind, &actions, node)).collect();
            self.dispatch(node, effective.as_ref(), &batch, bill, state);
        } else if let Some(inherited) = ancestors.iter().rev().find(|f| !f.deferred.is_empty()) {
            self.dispatch(node, effective.as_ref(), &inherited.deferred, bill, state);
        }

        if let (Some(enacted), Some(fields)) = (self.options.enacted_on, actions.get_mut(&ActionKind::EffectiveDate)) {
            if let Some(date) = effective_on(fields, enacted) {
                fields.insert(field::EFFECTIVE_ON.to_string(), date.to_string());
            }
        }

        if !actions.is_empty() {
            let citations = citations
                .iter()
                .map(|c| match (c.complete, inherited.as_ref()) {
                    (false, Some(anchor)) => c.merge_onto(anchor),
                    _ => c.clone(),
                })
                .collect();
            state.records.push(ActionRecord {
                source_node_id: node.id,
                version_id: self.options.version_id,
                actions,
                citations,
            });
        }

        Frame { citation: effective, deferred }
    }

    fn dispatch(
        &self,
        node: &ContentNode,
        citation: Option<&Citation>,
        actions: &[Action],
        bill: &ContentTree,
        state: &mut WalkState<'a, L>,
    ) {
        let Some(citation) = citation else {
            debug!(node = %node.id, text = node.body(), "no citation for clause, skipping");
            state.metrics.unresolved += 1;
            return;
        };

        for action in actions {
            let clause = Clause { citation, bill, source: action.source_node_id };
            state.metrics.actions_dispatched += 1;
            let applied = catch_unwind(AssertUnwindSafe(|| apply(&mut state.view, &clause, action)))
                .unwrap_or_else(|payload| Err(ApplyError::Panicked(panic_message(payload.as_ref()))));
            match applied {
                Ok(diffs) => state.diffs.extend(diffs),
                Err(err) => {
                    state.metrics.actions_failed += 1;
                    match err {
                        ApplyError::TargetMissing { .. } => {
                            debug!(%err, kind = %action.kind, path = %citation.path, fields = ?action.captured_fields, "action skipped")
                        }
                        _ => {
                            warn!(%err, kind = %action.kind, path = %citation.path, fields = ?action.captured_fields, "action failed")
                        }
                    }
                }
            }
        }
    }
}

/// Own complete citation, else own partial merged onto the ancestor's, else
/// the ancestor's.
fn effective_citation(own: &[Citation], ancestor: Option<&Citation>) -> Option<Citation> {
    if let Some(complete) = own.iter().find(|c| c.complete) {
        return Some(complete.clone());
    }
    match (own.first(), ancestor) {
        (Some(partial), Some(anchor)) => Some(partial.merge_onto(anchor)),
        (None, Some(anchor)) => Some(anchor.clone()),
        _ => None,
    }
}

/// Mutating kinds to dispatch, in kind order, minus the ones a more specific
/// match on the same clause makes redundant.
fn dispatchable(actions: &Actions) -> Vec<ActionKind> {
    actions
        .keys()
        .copied()
        .filter(|kind| kind.mutates())
        .filter(|kind| !kind.shadowed_by().iter().any(|s| actions.contains_key(s)))
        .collect()
}

fn defers_to_children(text: &str) -> bool {
    regex!(r#"(?i)\b(?:in\s+)?each\s+of\s+the\s+following\b[^"]*$"#).is_match(text)
}

fn to_action(kind: ActionKind, actions: &Actions, node: &ContentNode) -> Action {
    Action { kind, captured_fields: actions.get(&kind).cloned().unwrap_or_default(), source_node_id: node.id }
}

#[cfg(test)]
#[path = "walk/tests.rs"]
mod tests;
