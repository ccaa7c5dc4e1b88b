//! Walk metrics.
//!
//! Counters collected while walking one bill. They are cheap enough to gather
//! unconditionally and are surfaced by the CLI report and the per-bill log
//! line of a batch run.
//!
//! ## Design notes
//!
//! - `unresolved` counts nodes that carried mutating actions but no
//!   computable citation. Nodes without actions are not counted.
//! - `actions_failed` is a subset of `actions_dispatched`.

use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkMetrics {
    /// Total elapsed time for [`Walker::walk`](super::Walker::walk).
    pub total: Duration,
    /// Bill nodes visited (quoted-block subtrees excluded).
    pub nodes_visited: usize,
    /// Nodes whose body text went through the classifier.
    pub clauses_classified: usize,
    /// Quoted-block roots passed over.
    pub quoted_blocks_skipped: usize,
    /// Nodes with mutating actions and no citation.
    pub unresolved: usize,
    /// Actions handed to an applier.
    pub actions_dispatched: usize,
    /// Dispatched actions whose applier returned an error or panicked.
    pub actions_failed: usize,
    pub diffs_emitted: usize,
    pub nodes_inserted: usize,
}

impl WalkMetrics {
    /// Fold another bill's counters into this one.
    pub fn absorb(&mut self, other: &WalkMetrics) {
        self.total += other.total;
        self.nodes_visited += other.nodes_visited;
        self.clauses_classified += other.clauses_classified;
        self.quoted_blocks_skipped += other.quoted_blocks_skipped;
        self.unresolved += other.unresolved;
        self.actions_dispatched += other.actions_dispatched;
        self.actions_failed += other.actions_failed;
        self.diffs_emitted += other.diffs_emitted;
        self.nodes_inserted += other.nodes_inserted;
    }
}
